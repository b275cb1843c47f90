use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use yrpc_client::{HeartbeatConfig, HeartbeatMonitor, RetryPolicy, RpcClient};
use yrpc_registry::{MemoryStore, Registry, StoreRegistry};
use yrpc_server::{RpcServer, ServiceConfig};

const HELLO_INTERFACE: &str = "com.acme.HelloYrpc";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Provider and consumer share one in-process registry here; a real
    // deployment would point both at the same coordination store instead.
    let registry: Arc<dyn Registry> = Arc::new(StoreRegistry::new(Arc::new(MemoryStore::new())));

    {
        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let server = Arc::new(
            RpcServer::builder()
                .registry_instance(registry.clone())
                .build()
                .unwrap(),
        );

        server
            .publish(
                ServiceConfig::new(HELLO_INTERFACE)
                    .method("sayHi", |inv| async move {
                        let msg: String = inv.arg(0)?;
                        Ok(inv.reply(&format!("hi consumer:{}", msg))?)
                    })
                    .method("sum", |inv| async move {
                        let values: Vec<i64> = inv.arg(0)?;
                        Ok(inv.reply(&values.iter().sum::<i64>())?)
                    }),
            )
            .await
            .unwrap();

        let _server_task = tokio::spawn({
            let server = server.clone();
            async move {
                let _ = server.serve_with_listener(listener).await;
            }
        });
    }

    {
        // Wait briefly for server to start
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        let client = RpcClient::builder()
            .registry_instance(registry)
            .build()
            .unwrap();

        HeartbeatMonitor::new(&client, HeartbeatConfig::default()).spawn();

        let hello = client
            .service(HELLO_INTERFACE)
            .retry(RetryPolicy::new(3, Duration::from_millis(500)));

        let reply: String = hello
            .invoke("sayHi")
            .arg(&"hi")
            .unwrap()
            .call()
            .await
            .unwrap();
        println!("Result from sayHi(): {:?}", reply);

        let total: i64 = hello
            .invoke("sum")
            .arg(&vec![1i64, 2, 3])
            .unwrap()
            .call()
            .await
            .unwrap();
        println!("Result from sum(): {:?}", total);
    }
}
