use crate::RpcClient;
use futures::future::join_all;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use yrpc::envelope::{Envelope, EnvelopeCodec};

/// Cadence and patience of the liveness prober.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(2),
        }
    }
}

/// Periodic liveness probing of every provider the directory knows.
///
/// One failed probe demotes an address: its channel is evicted and the
/// directory stops selecting it. Demoted addresses keep getting probed, and
/// one successful answer restores them. This is advisory health tracking
/// shared with live traffic; a false negative costs candidates for a few
/// intervals, never correctness.
pub struct HeartbeatMonitor {
    client: RpcClient,
    config: HeartbeatConfig,
}

impl HeartbeatMonitor {
    pub fn new(client: &RpcClient, config: HeartbeatConfig) -> Self {
        Self {
            client: client.clone(),
            config,
        }
    }

    /// Starts the probe loop on its own task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.interval);
            loop {
                interval.tick().await;
                self.probe_all().await;
            }
        })
    }

    /// One probe round over every known provider, concurrently. Public so
    /// callers (and tests) can drive rounds without the timer.
    pub async fn probe_all(&self) {
        let directory = self.client.directory();
        let providers = directory.known_providers();
        if providers.is_empty() {
            return;
        }

        let probes = providers.into_iter().map(|addr| async move {
            let healthy = self.probe(addr).await;
            (addr, healthy)
        });

        for (addr, healthy) in join_all(probes).await {
            if healthy {
                directory.mark_healthy(addr);
            } else {
                self.client.pool().evict(addr).await;
                directory.mark_unhealthy(addr);
            }
        }
    }

    async fn probe(&self, addr: SocketAddr) -> bool {
        let channel = match self.client.pool().get_channel(addr).await {
            Ok(channel) => channel,
            Err(e) => {
                debug!(%addr, error = %e, "heartbeat connect failed");
                return false;
            }
        };

        let request_id = self.client.next_request_id();
        let reply = self.client.pending().register(request_id);

        let frame = EnvelopeCodec::encode_to_vec(&Envelope::heartbeat_request(request_id));
        if channel.send(frame).is_err() {
            self.client.pending().expire(request_id);
            return false;
        }

        match timeout(self.config.timeout, reply).await {
            Ok(Ok(Ok(_response))) => true,
            Ok(_resolved_with_error) => false,
            Err(_elapsed) => {
                self.client.pending().expire(request_id);
                false
            }
        }
    }
}
