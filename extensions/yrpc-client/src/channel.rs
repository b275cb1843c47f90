use crate::{CallError, PendingCalls};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};
use yrpc::envelope::{EnvelopeStreamDecoder, MessageType};
use yrpc::message::RpcResponse;
use yrpc::serial::decode_payload;

/// One live connection to a provider.
///
/// A channel owns two tasks: a writer draining an mpsc queue onto the
/// socket, and a reader feeding inbound bytes through the stream decoder
/// and resolving pending calls. Cloning a channel clones handles, not the
/// connection; the pool and every in-flight call share the same underlying
/// socket. When either task exits the channel flips to closed, which is the
/// signal the pool uses to stop handing it out.
#[derive(Clone)]
pub struct Channel {
    addr: SocketAddr,
    local_addr: SocketAddr,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    closed: Arc<AtomicBool>,
}

impl Channel {
    /// Connects and spawns the writer/reader tasks. Responses and heartbeat
    /// answers read from this connection resolve entries in `pending`.
    pub async fn connect(
        addr: SocketAddr,
        pending: Arc<PendingCalls>,
    ) -> Result<Self, std::io::Error> {
        let stream = TcpStream::connect(addr).await?;
        let local_addr = stream.local_addr()?;
        let (read_half, write_half) = stream.into_split();

        let (outbound, outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(Self::writer_task(write_half, outbound_rx, closed.clone(), addr));
        tokio::spawn(Self::reader_task(read_half, pending, closed.clone(), addr));

        debug!(%addr, %local_addr, "channel established");
        Ok(Self {
            addr,
            local_addr,
            outbound,
            closed,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Queues one encoded envelope for the writer task.
    pub fn send(&self, frame: Vec<u8>) -> Result<(), CallError> {
        if self.is_closed() {
            return Err(CallError::ChannelClosed);
        }
        self.outbound
            .send(frame)
            .map_err(|_| CallError::ChannelClosed)
    }

    async fn writer_task(
        mut write_half: OwnedWriteHalf,
        mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
        closed: Arc<AtomicBool>,
        addr: SocketAddr,
    ) {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = write_half.write_all(&frame).await {
                warn!(%addr, error = %e, "channel write failed");
                break;
            }
        }
        closed.store(true, Ordering::Release);
    }

    async fn reader_task(
        mut read_half: OwnedReadHalf,
        pending: Arc<PendingCalls>,
        closed: Arc<AtomicBool>,
        addr: SocketAddr,
    ) {
        let mut decoder = EnvelopeStreamDecoder::new();
        let mut buf = [0u8; 8 * 1024];

        'read: loop {
            let n = match read_half.read(&mut buf).await {
                Ok(0) => {
                    debug!(%addr, "provider closed the connection");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!(%addr, error = %e, "channel read failed");
                    break;
                }
            };

            for result in decoder.read_bytes(&buf[..n]) {
                match result {
                    Ok(envelope) => match envelope.message_type {
                        MessageType::Response => {
                            match decode_payload::<RpcResponse>(
                                envelope.serialize_tag,
                                envelope.compress_tag,
                                &envelope.payload,
                            ) {
                                Ok(response) => pending.complete(envelope.request_id, response),
                                Err(e) => pending
                                    .fail(envelope.request_id, CallError::Serialization(e)),
                            }
                        }
                        MessageType::HeartbeatResponse => {
                            trace!(%addr, request_id = envelope.request_id, "heartbeat answered");
                            // Probes carry no payload; an empty success
                            // resolves the waiting prober.
                            pending.complete(envelope.request_id, RpcResponse::success(Vec::new()));
                        }
                        MessageType::Request | MessageType::HeartbeatRequest => {
                            warn!(%addr, "provider sent a request envelope to a consumer; ignoring");
                        }
                    },
                    Err(e) => {
                        // Framing is untrusted from here on; drop the connection.
                        error!(%addr, error = %e, "protocol error, closing channel");
                        break 'read;
                    }
                }
            }
        }

        closed.store(true, Ordering::Release);
    }
}
