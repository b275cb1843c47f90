use crate::{DispatchTable, ServiceConfig};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use yrpc::envelope::{Envelope, EnvelopeCodec, EnvelopeStreamDecoder, MessageType};
use yrpc::message::{RpcRequest, RpcResponse};
use yrpc::serial::{CompressKind, SerializeKind, decode_payload, encode_payload};
use yrpc_registry::{DiscoveryError, Registry, RegistryConfig};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The provider runtime: a TCP accept loop in front of a [`DispatchTable`],
/// plus registry publication of every published service.
///
/// Per connection, one writer task drains an mpsc queue onto the socket and
/// the read loop feeds the stream decoder. Requests are dispatched each on
/// their own task, so one slow handler never stalls the frames behind it;
/// responses may interleave, correlation is the echoed request id.
pub struct RpcServer {
    table: Arc<DispatchTable>,
    registry: Option<Arc<dyn Registry>>,
    advertise: Option<SocketAddr>,
    bound: OnceLock<SocketAddr>,
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcServer {
    /// A server with no registry attached; consumers must be pointed at it
    /// by other means. Most deployments want [`RpcServer::builder`].
    pub fn new() -> Self {
        Self {
            table: Arc::new(DispatchTable::new()),
            registry: None,
            advertise: None,
            bound: OnceLock::new(),
        }
    }

    pub fn builder() -> RpcServerBuilder {
        RpcServerBuilder::new()
    }

    pub fn table(&self) -> Arc<DispatchTable> {
        self.table.clone()
    }

    /// Publishes a service: inserts it into the dispatch table and, once
    /// the listening address is known, announces it in the registry.
    pub async fn publish(&self, service: ServiceConfig) -> Result<(), BoxError> {
        let interface = service.interface_name().to_string();
        let group = service.group_name().to_string();
        self.table.insert(service);

        if let Some(addr) = self.announce_addr() {
            self.announce(&interface, &group, addr).await?;
        }
        Ok(())
    }

    /// Binds to `addr` and serves until the process ends.
    pub async fn serve<A: ToSocketAddrs>(self: Arc<Self>, addr: A) -> Result<(), BoxError> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_with_listener(listener).await
    }

    /// Serves on a pre-bound listener. This is the ephemeral-port entry
    /// point: bind `127.0.0.1:0` yourself, read `local_addr`, then hand the
    /// listener over.
    pub async fn serve_with_listener(self: Arc<Self>, listener: TcpListener) -> Result<(), BoxError> {
        let address = listener.local_addr()?;
        let _ = self.bound.set(address);

        // Everything published before serve gets announced now that the
        // address is known. Re-announcement is idempotent at the registry.
        if let Some(addr) = self.announce_addr() {
            for (interface, group) in self.table.published() {
                self.announce(&interface, &group, addr).await?;
            }
        }

        info!(%address, "server running");
        loop {
            let (socket, peer) = listener.accept().await?;
            debug!(%peer, "client connected");
            tokio::spawn(Self::handle_connection(socket, peer, self.table.clone()));
        }
    }

    fn announce_addr(&self) -> Option<SocketAddr> {
        self.advertise.or_else(|| self.bound.get().copied())
    }

    async fn announce(
        &self,
        interface: &str,
        group: &str,
        addr: SocketAddr,
    ) -> Result<(), BoxError> {
        if let Some(registry) = &self.registry {
            registry.register(interface, group, addr).await?;
        }
        Ok(())
    }

    async fn handle_connection(socket: TcpStream, peer: SocketAddr, table: Arc<DispatchTable>) {
        let (mut read_half, write_half) = socket.into_split();
        let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();
        tokio::spawn(Self::writer_task(write_half, rx, peer));

        let mut decoder = EnvelopeStreamDecoder::new();
        let mut buf = [0u8; 8 * 1024];

        loop {
            let n = match read_half.read(&mut buf).await {
                Ok(0) => {
                    debug!(%peer, "client disconnected");
                    return;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!(%peer, error = %e, "read failed, dropping connection");
                    return;
                }
            };

            for result in decoder.read_bytes(&buf[..n]) {
                match result {
                    Ok(envelope) => match envelope.message_type {
                        MessageType::HeartbeatRequest => {
                            trace!(%peer, request_id = envelope.request_id, "heartbeat");
                            let pong = Envelope::heartbeat_response(envelope.request_id);
                            let _ = tx.send(EnvelopeCodec::encode_to_vec(&pong));
                        }
                        MessageType::Request => {
                            // Frames are decoded in arrival order; handlers
                            // run concurrently and may answer out of order.
                            tokio::spawn(Self::dispatch_request(
                                table.clone(),
                                envelope,
                                tx.clone(),
                            ));
                        }
                        MessageType::Response | MessageType::HeartbeatResponse => {
                            warn!(%peer, "consumer sent a response envelope to a provider; ignoring");
                        }
                    },
                    Err(e) => {
                        // Framing violation: this connection is done, but
                        // only this connection.
                        error!(%peer, error = %e, "protocol error, dropping connection");
                        return;
                    }
                }
            }
        }
    }

    async fn writer_task(
        mut write_half: OwnedWriteHalf,
        mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
        peer: SocketAddr,
    ) {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = write_half.write_all(&frame).await {
                debug!(%peer, error = %e, "write failed, stopping writer");
                break;
            }
        }
    }

    /// Runs one request through the table and queues the response, echoing
    /// the request id and the consumer's codec tags.
    async fn dispatch_request(
        table: Arc<DispatchTable>,
        envelope: Envelope,
        tx: mpsc::UnboundedSender<Vec<u8>>,
    ) {
        // Replies reuse the request's serializer when it is known; a request
        // with an unknown tag still deserves a readable error, so fall back
        // to JSON for the reply itself.
        let serialize =
            SerializeKind::from_tag(envelope.serialize_tag).unwrap_or(SerializeKind::Json);
        let compress = CompressKind::from_tag(envelope.compress_tag).unwrap_or(CompressKind::None);

        let response = match decode_payload::<RpcRequest>(
            envelope.serialize_tag,
            envelope.compress_tag,
            &envelope.payload,
        ) {
            Ok(request) => {
                trace!(
                    interface = %request.interface,
                    method = %request.method,
                    request_id = envelope.request_id,
                    "dispatching"
                );
                table.dispatch(request, serialize).await
            }
            Err(e) => {
                warn!(request_id = envelope.request_id, error = %e, "malformed request payload");
                RpcResponse::failure(format!("malformed request: {}", e))
            }
        };

        let payload = match encode_payload(serialize, compress, &response) {
            Ok(payload) => payload,
            Err(e) => {
                error!(request_id = envelope.request_id, error = %e, "response encode failed");
                return;
            }
        };

        let reply = Envelope::response(
            envelope.request_id,
            serialize.tag(),
            compress.tag(),
            payload,
        );
        let _ = tx.send(EnvelopeCodec::encode_to_vec(&reply));
    }
}

/// Fluent construction for [`RpcServer`]. Registry configuration is
/// validated here, at startup.
pub struct RpcServerBuilder {
    connect_string: Option<String>,
    registry: Option<Arc<dyn Registry>>,
    advertise: Option<SocketAddr>,
}

impl Default for RpcServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcServerBuilder {
    pub fn new() -> Self {
        Self {
            connect_string: None,
            registry: None,
            advertise: None,
        }
    }

    /// Selects the registry backend by connect string, e.g. `"memory://"`.
    pub fn registry(mut self, connect_string: impl Into<String>) -> Self {
        self.connect_string = Some(connect_string.into());
        self
    }

    /// Uses an already-built registry, typically shared with in-process
    /// consumers or backed by an external coordination store.
    pub fn registry_instance(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Overrides the address announced to the registry. Without this the
    /// server announces the address it actually bound.
    pub fn advertise(mut self, addr: SocketAddr) -> Self {
        self.advertise = Some(addr);
        self
    }

    pub fn build(self) -> Result<RpcServer, DiscoveryError> {
        let registry = match (self.registry, self.connect_string) {
            (Some(registry), _) => Some(registry),
            (None, Some(connect_string)) => Some(RegistryConfig::parse(&connect_string)?.build()?),
            (None, None) => None,
        };

        Ok(RpcServer {
            table: Arc::new(DispatchTable::new()),
            registry,
            advertise: self.advertise,
            bound: OnceLock::new(),
        })
    }
}
