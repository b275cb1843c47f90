//! Tokio-based provider runtime for yrpc.
//!
//! Implementations are published as [`ServiceConfig`]s: an interface name, a
//! group, and a map of method handlers bound at registration time. The serve
//! loop decodes request envelopes per connection in arrival order, dispatches
//! each on its own task, and echoes the request id on every response so the
//! consumer can correlate. Application failures, including missing
//! registrations, travel back as responses; only framing violations cost the
//! connection.

mod dispatch_table;
mod invocation;
mod rpc_server;
mod service_config;

pub use dispatch_table::DispatchTable;
pub use invocation::Invocation;
pub use rpc_server::{BoxError, RpcServer, RpcServerBuilder};
pub use service_config::{MethodHandler, ServiceConfig};
