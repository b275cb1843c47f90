use crate::{
    CallError, ChannelPool, ClientConfig, PendingCalls, RetryPolicy, ServiceReference,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::timeout;
use tracing::{debug, warn};
use yrpc::envelope::{Envelope, EnvelopeCodec};
use yrpc::message::{ResponseCode, RpcRequest, RpcResponse};
use yrpc::serial::{CompressKind, SerializeKind, encode_payload};
use yrpc_registry::{
    LoadBalancer, ProviderDirectory, Registry, RegistryConfig, RoundRobin,
};

/// The consumer runtime. One instance per logical service mesh; cloning is
/// cheap and shares the pool, pending table, and directory.
///
/// All per-call state is explicit: the request travels as an argument, the
/// pending entry is keyed by the request id, and nothing is stashed in
/// task-local storage, so a call may hop execution contexts freely between
/// send and completion.
#[derive(Clone)]
pub struct RpcClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    directory: Arc<ProviderDirectory>,
    pool: Arc<ChannelPool>,
    pending: Arc<PendingCalls>,
    next_request_id: AtomicU64,
    consumer_marked: Mutex<HashSet<(String, String)>>,
}

impl RpcClient {
    pub fn builder() -> RpcClientBuilder {
        RpcClientBuilder::new()
    }

    /// Returns a call handle for one remote interface, inheriting the
    /// client's group, timeout, and serializer defaults.
    pub fn service(&self, interface: impl Into<String>) -> ServiceReference {
        ServiceReference::new(self.clone(), interface.into())
    }

    /// The directory backing resolution for this client. Shared with the
    /// heartbeat monitor so health verdicts feed straight into selection.
    pub fn directory(&self) -> Arc<ProviderDirectory> {
        self.inner.directory.clone()
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub(crate) fn pool(&self) -> Arc<ChannelPool> {
        self.inner.pool.clone()
    }

    pub(crate) fn pending(&self) -> Arc<PendingCalls> {
        self.inner.pending.clone()
    }

    /// Allocates a request id. Ids are unique for this client's lifetime,
    /// shared between calls and heartbeat probes.
    pub(crate) fn next_request_id(&self) -> u64 {
        self.inner.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Runs the full pipeline for one call, looping back to resolution on
    /// retryable failures while the policy has attempts left.
    pub(crate) async fn invoke(
        &self,
        interface: &str,
        group: &str,
        method: &str,
        param_types: Vec<String>,
        args: Vec<Vec<u8>>,
        call_timeout: std::time::Duration,
        retry: RetryPolicy,
    ) -> Result<Vec<u8>, CallError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let outcome = self
                .attempt(
                    interface,
                    group,
                    method,
                    param_types.clone(),
                    args.clone(),
                    call_timeout,
                )
                .await;

            match outcome {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < retry.attempts => {
                    warn!(
                        %interface,
                        %method,
                        attempt,
                        error = %e,
                        "call attempt failed, retrying"
                    );
                    tokio::time::sleep(retry.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One pass of RESOLVE, ACQUIRE, SEND, WAIT.
    async fn attempt(
        &self,
        interface: &str,
        group: &str,
        method: &str,
        param_types: Vec<String>,
        args: Vec<Vec<u8>>,
        call_timeout: std::time::Duration,
    ) -> Result<Vec<u8>, CallError> {
        let addr = self.inner.directory.resolve(interface, group).await?;
        let channel = self.inner.pool.get_channel(addr).await?;

        self.mark_consumer(interface, group, channel.local_addr())
            .await;

        let request = RpcRequest {
            interface: interface.to_string(),
            method: method.to_string(),
            param_types,
            args,
            group: group.to_string(),
        };
        let payload = encode_payload(self.inner.config.serialize, self.inner.config.compress, &request)?;

        let request_id = self.next_request_id();
        let envelope = Envelope::request(
            request_id,
            self.inner.config.serialize.tag(),
            self.inner.config.compress.tag(),
            payload,
        );

        // Register before the bytes can hit the wire: a response racing the
        // registration would otherwise have nowhere to land.
        let reply = self.inner.pending.register(request_id);

        if let Err(e) = channel.send(EnvelopeCodec::encode_to_vec(&envelope)) {
            self.inner.pending.expire(request_id);
            return Err(e);
        }

        let response = match timeout(call_timeout, reply).await {
            Ok(Ok(outcome)) => outcome?,
            Ok(Err(_sender_dropped)) => return Err(CallError::ChannelClosed),
            Err(_elapsed) => {
                // The entry must go even on timeout, or the table grows
                // without bound and a late response would find a stale slot.
                self.inner.pending.expire(request_id);
                return Err(CallError::Timeout(call_timeout));
            }
        };

        Self::unwrap_response(response)
    }

    /// Maps an application-level response onto the caller's result. Remote
    /// exceptions and missing registrations are outcomes, not transport
    /// failures, and are never retried.
    fn unwrap_response(response: RpcResponse) -> Result<Vec<u8>, CallError> {
        match response.code {
            ResponseCode::Success => Ok(response.body.unwrap_or_default()),
            ResponseCode::NotFound => Err(CallError::ServiceNotFound(
                response.message.unwrap_or_else(|| "unknown service".to_string()),
            )),
            ResponseCode::Fail => Err(CallError::Remote(
                response.message.unwrap_or_else(|| "remote call failed".to_string()),
            )),
        }
    }

    /// Records this consumer under the observability tree, once per
    /// `(interface, group)`. Best effort only.
    async fn mark_consumer(&self, interface: &str, group: &str, local: std::net::SocketAddr) {
        let first = self
            .inner
            .consumer_marked
            .lock()
            .expect("consumer-mark lock")
            .insert((interface.to_string(), group.to_string()));
        if !first {
            return;
        }

        if let Err(e) = self
            .inner
            .directory
            .registry()
            .register_consumer(interface, group, local)
            .await
        {
            debug!(%interface, %group, error = %e, "consumer registration skipped");
        }
    }
}

/// Fluent construction for [`RpcClient`].
///
/// The registry is mandatory and validated here, so a malformed connect
/// string fails the process at startup rather than the first call.
pub struct RpcClientBuilder {
    connect_string: Option<String>,
    registry: Option<Arc<dyn Registry>>,
    balancer: Arc<dyn LoadBalancer>,
    config: ClientConfig,
}

impl Default for RpcClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcClientBuilder {
    pub fn new() -> Self {
        Self {
            connect_string: None,
            registry: None,
            balancer: Arc::new(RoundRobin::new()),
            config: ClientConfig::default(),
        }
    }

    /// Selects the registry backend by connect string, e.g. `"memory://"`.
    pub fn registry(mut self, connect_string: impl Into<String>) -> Self {
        self.connect_string = Some(connect_string.into());
        self
    }

    /// Uses an already-built registry, typically one shared with an
    /// in-process server or backed by an external coordination store.
    pub fn registry_instance(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn load_balancer(mut self, balancer: Arc<dyn LoadBalancer>) -> Self {
        self.balancer = balancer;
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.config.group = group.into();
        self
    }

    pub fn serialize(mut self, serialize: SerializeKind) -> Self {
        self.config.serialize = serialize;
        self
    }

    pub fn compress(mut self, compress: CompressKind) -> Self {
        self.config.compress = compress;
        self
    }

    pub fn call_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<RpcClient, CallError> {
        let registry = match (self.registry, self.connect_string) {
            (Some(registry), _) => registry,
            (None, Some(connect_string)) => RegistryConfig::parse(&connect_string)?.build()?,
            (None, None) => {
                return Err(CallError::Discovery(
                    yrpc_registry::DiscoveryError::BadConnectString(
                        "no registry configured".to_string(),
                    ),
                ));
            }
        };

        let pending = Arc::new(PendingCalls::new());
        Ok(RpcClient {
            inner: Arc::new(ClientInner {
                pool: Arc::new(ChannelPool::new(
                    pending.clone(),
                    self.config.connect_timeout,
                )),
                directory: Arc::new(ProviderDirectory::new(registry, self.balancer)),
                pending,
                next_request_id: AtomicU64::new(1),
                consumer_marked: Mutex::new(HashSet::new()),
                config: self.config,
            }),
        })
    }
}
