use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use yrpc::serial::SerializeKind;
use yrpc_client::{CallError, RetryPolicy, RpcClient};
use yrpc_registry::{
    DiscoveryError, LoadBalancer, MemoryStore, Registry, RoundRobin, StoreRegistry,
};
use yrpc_server::{RpcServer, ServiceConfig};

const IFACE: &str = "com.acme.HelloYrpc";

fn hello_service() -> ServiceConfig {
    ServiceConfig::new(IFACE)
        .method("sayHi", |inv| async move {
            let msg: String = inv.arg(0)?;
            Ok(inv.reply(&format!("hi consumer:{}", msg))?)
        })
        .method("explode", |_inv| async move { Err("boom".into()) })
}

fn memory_registry() -> Arc<dyn Registry> {
    Arc::new(StoreRegistry::new(Arc::new(MemoryStore::new())))
}

/// Publishes the hello service and serves it on an ephemeral port.
async fn start_hello_server(registry: Arc<dyn Registry>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = Arc::new(
        RpcServer::builder()
            .registry_instance(registry)
            .build()
            .unwrap(),
    );
    server.publish(hello_service()).await.unwrap();

    tokio::spawn(async move {
        let _ = server.serve_with_listener(listener).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    addr
}

#[tokio::test]
async fn say_hi_round_trip() {
    let registry = memory_registry();
    start_hello_server(registry.clone()).await;

    let client = RpcClient::builder()
        .registry_instance(registry)
        .build()
        .unwrap();

    let hello = client.service(IFACE);
    let reply: String = hello.invoke("sayHi").arg(&"hi").unwrap().call().await.unwrap();
    assert_eq!(reply, "hi consumer:hi");
}

#[tokio::test]
async fn bincode_consumer_talks_to_the_same_provider() {
    let registry = memory_registry();
    start_hello_server(registry.clone()).await;

    let client = RpcClient::builder()
        .registry_instance(registry)
        .serialize(SerializeKind::Bincode)
        .build()
        .unwrap();

    let reply: String = client
        .service(IFACE)
        .invoke("sayHi")
        .arg(&"hi")
        .unwrap()
        .call()
        .await
        .unwrap();
    assert_eq!(reply, "hi consumer:hi");
}

#[tokio::test]
async fn remote_exception_is_re_raised_verbatim() {
    let registry = memory_registry();
    start_hello_server(registry.clone()).await;

    let client = RpcClient::builder()
        .registry_instance(registry)
        .build()
        .unwrap();

    let result: Result<String, _> = client.service(IFACE).invoke("explode").call().await;
    match result {
        Err(CallError::Remote(msg)) => assert_eq!(msg, "boom"),
        other => panic!("expected remote error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn unknown_method_is_service_not_found_and_connection_survives() {
    let registry = memory_registry();
    start_hello_server(registry.clone()).await;

    let client = RpcClient::builder()
        .registry_instance(registry)
        .build()
        .unwrap();
    let hello = client.service(IFACE);

    let result: Result<String, _> = hello.invoke("sayGoodbye").call().await;
    assert!(matches!(result, Err(CallError::ServiceNotFound(_))));

    // The miss was an application outcome; the same connection still works.
    let reply: String = hello.invoke("sayHi").arg(&"hi").unwrap().call().await.unwrap();
    assert_eq!(reply, "hi consumer:hi");
}

#[tokio::test]
async fn unresolvable_service_is_a_discovery_error() {
    let registry = memory_registry();
    let client = RpcClient::builder()
        .registry_instance(registry)
        .build()
        .unwrap();

    let result: Result<String, _> = client.service("com.acme.Ghost").invoke("anything").call().await;
    assert!(matches!(
        result,
        Err(CallError::Discovery(DiscoveryError::NoProviders { .. }))
    ));
}

#[tokio::test]
async fn silent_provider_times_out() {
    // A listener that accepts and reads but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
                });
            }
        }
    });

    let registry = memory_registry();
    registry.register(IFACE, "default", addr).await.unwrap();

    let client = RpcClient::builder()
        .registry_instance(registry)
        .call_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let result: Result<String, _> = client
        .service(IFACE)
        .invoke("sayHi")
        .arg(&"hi")
        .unwrap()
        .call()
        .await;
    assert!(matches!(result, Err(CallError::Timeout(_))));
}

#[tokio::test]
async fn garbage_frames_cost_only_that_connection() {
    let registry = memory_registry();
    let addr = start_hello_server(registry.clone()).await;

    // Foreign traffic: the server must drop this connection without replying.
    let mut foreign = TcpStream::connect(addr).await.unwrap();
    foreign.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    let mut buf = [0u8; 64];
    assert_eq!(foreign.read(&mut buf).await.unwrap(), 0);

    // Real consumers are unaffected.
    let client = RpcClient::builder()
        .registry_instance(registry)
        .build()
        .unwrap();
    let reply: String = client
        .service(IFACE)
        .invoke("sayHi")
        .arg(&"hi")
        .unwrap()
        .call()
        .await
        .unwrap();
    assert_eq!(reply, "hi consumer:hi");
}

/// Registry stub returning a fixed, ordered candidate list, so retry tests
/// can script exactly which address each resolution lands on.
struct FixedRegistry {
    addrs: Vec<SocketAddr>,
}

#[async_trait::async_trait]
impl Registry for FixedRegistry {
    async fn register(&self, _: &str, _: &str, _: SocketAddr) -> Result<(), DiscoveryError> {
        Ok(())
    }

    async fn register_consumer(&self, _: &str, _: &str, _: SocketAddr) -> Result<(), DiscoveryError> {
        Ok(())
    }

    async fn lookup(&self, _: &str, _: &str) -> Result<Vec<SocketAddr>, DiscoveryError> {
        Ok(self.addrs.clone())
    }

    async fn subscribe(
        &self,
        _: &str,
        _: &str,
        _: yrpc_registry::AddressListener,
    ) -> Result<(), DiscoveryError> {
        Ok(())
    }
}

/// Counts every selection, i.e. every RESOLVE the pipeline performs.
struct CountingBalancer {
    inner: RoundRobin,
    selections: AtomicUsize,
}

impl LoadBalancer for CountingBalancer {
    fn select(&self, candidates: &[SocketAddr]) -> Option<SocketAddr> {
        self.selections.fetch_add(1, Ordering::SeqCst);
        self.inner.select(candidates)
    }
}

#[tokio::test]
async fn retry_reresolves_and_succeeds_on_the_third_attempt() {
    // Two reserved-then-closed ports refuse connections; the third is live.
    let dead1 = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let a = l.local_addr().unwrap();
        drop(l);
        a
    };
    let dead2 = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let a = l.local_addr().unwrap();
        drop(l);
        a
    };
    let live = start_hello_server(memory_registry()).await;

    let balancer = Arc::new(CountingBalancer {
        inner: RoundRobin::new(),
        selections: AtomicUsize::new(0),
    });
    let client = RpcClient::builder()
        .registry_instance(Arc::new(FixedRegistry {
            addrs: vec![dead1, dead2, live],
        }))
        .load_balancer(balancer.clone())
        .build()
        .unwrap();

    let reply: String = client
        .service(IFACE)
        .retry(RetryPolicy::new(3, Duration::from_millis(20)))
        .invoke("sayHi")
        .arg(&"hi")
        .unwrap()
        .call()
        .await
        .unwrap();

    assert_eq!(reply, "hi consumer:hi");
    assert_eq!(balancer.selections.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn without_retry_the_first_connection_error_surfaces() {
    let dead = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let a = l.local_addr().unwrap();
        drop(l);
        a
    };

    let balancer = Arc::new(CountingBalancer {
        inner: RoundRobin::new(),
        selections: AtomicUsize::new(0),
    });
    let client = RpcClient::builder()
        .registry_instance(Arc::new(FixedRegistry { addrs: vec![dead] }))
        .load_balancer(balancer.clone())
        .build()
        .unwrap();

    let result: Result<String, _> = client
        .service(IFACE)
        .invoke("sayHi")
        .arg(&"hi")
        .unwrap()
        .call()
        .await;
    assert!(matches!(result, Err(CallError::Connection(_))));
    assert_eq!(balancer.selections.load(Ordering::SeqCst), 1);
}
