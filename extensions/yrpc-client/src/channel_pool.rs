use crate::{CallError, Channel, PendingCalls};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Connection cache keyed by provider address.
///
/// Acquisition is double-checked per address: the outer map lock only hands
/// out the per-address slot, and the slot's own async mutex serializes the
/// connect. Two tasks racing on a cold address therefore produce exactly one
/// connect attempt, with the loser reusing the winner's channel. A failed
/// connect leaves the slot empty, so the address stays retryable; nothing is
/// poisoned by one refused connection.
pub struct ChannelPool {
    pending: Arc<PendingCalls>,
    connect_timeout: Duration,
    slots: Mutex<HashMap<SocketAddr, Arc<tokio::sync::Mutex<Option<Channel>>>>>,
}

impl ChannelPool {
    pub fn new(pending: Arc<PendingCalls>, connect_timeout: Duration) -> Self {
        Self {
            pending,
            connect_timeout,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live channel for `addr`, connecting if the cache has no
    /// open one. Closed channels found in the slot are replaced in place.
    pub async fn get_channel(&self, addr: SocketAddr) -> Result<Channel, CallError> {
        let slot = {
            let mut slots = self.slots.lock().expect("pool lock");
            slots.entry(addr).or_default().clone()
        };

        let mut guard = slot.lock().await;
        if let Some(channel) = guard.as_ref() {
            if !channel.is_closed() {
                return Ok(channel.clone());
            }
            debug!(%addr, "cached channel is closed, reconnecting");
        }

        let channel = match timeout(
            self.connect_timeout,
            Channel::connect(addr, self.pending.clone()),
        )
        .await
        {
            Ok(Ok(channel)) => channel,
            Ok(Err(e)) => return Err(CallError::Connection(e)),
            Err(_) => {
                return Err(CallError::Connection(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", addr),
                )));
            }
        };

        *guard = Some(channel.clone());
        Ok(channel)
    }

    /// Drops the cached channel for `addr`, if any. Used when a heartbeat
    /// declares the provider dead; in-flight calls keep their clone of the
    /// channel handle and resolve (or time out) independently.
    pub async fn evict(&self, addr: SocketAddr) {
        let slot = {
            let slots = self.slots.lock().expect("pool lock");
            slots.get(&addr).cloned()
        };

        if let Some(slot) = slot {
            let mut guard = slot.lock().await;
            if guard.take().is_some() {
                info!(%addr, "channel evicted from pool");
            }
        }
    }
}
