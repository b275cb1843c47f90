//! Tokio-based consumer runtime for yrpc.
//!
//! Every remote call runs the same pipeline: resolve a provider address
//! through the directory, acquire a pooled channel, register the call in the
//! pending table, write the encoded envelope, then suspend until the reader
//! task completes the call or the deadline expires. Connection and timeout
//! failures loop back to resolution when the call carries a retry policy.
//!
//! The reader task owned by each channel is the only place inbound frames
//! are decoded; callers never block it, they only await their own pending
//! entry. Heartbeat probes share the same pool, pending table, and id space
//! as ordinary calls.

mod call_error;
mod channel;
mod channel_pool;
mod client_config;
mod heartbeat;
mod pending_calls;
mod retry_policy;
mod rpc_client;
mod service_reference;

pub use call_error::CallError;
pub use channel::Channel;
pub use channel_pool::ChannelPool;
pub use client_config::ClientConfig;
pub use heartbeat::{HeartbeatConfig, HeartbeatMonitor};
pub use pending_calls::{CallOutcome, PendingCalls};
pub use retry_policy::RetryPolicy;
pub use rpc_client::{RpcClient, RpcClientBuilder};
pub use service_reference::{CallBuilder, ServiceReference};
