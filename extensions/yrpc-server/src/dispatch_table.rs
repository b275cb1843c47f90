use crate::{Invocation, ServiceConfig};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;
use yrpc::message::{RpcRequest, RpcResponse};
use yrpc::serial::SerializeKind;

/// Name-keyed lookup from `(interface, group)` to the published
/// implementation.
///
/// Every outcome here is a response, never a dropped connection: an absent
/// interface, a group mismatch, an unknown method, and a handler panic by
/// proxy (its error) all encode back to the consumer with a precise
/// diagnostic and the original request id upstream of this table.
pub struct DispatchTable {
    services: RwLock<HashMap<String, HashMap<String, ServiceConfig>>>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTable {
    pub fn new() -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, service: ServiceConfig) {
        debug!(
            interface = service.interface_name(),
            group = service.group_name(),
            "service published"
        );
        self.services
            .write()
            .expect("dispatch lock")
            .entry(service.interface_name().to_string())
            .or_default()
            .insert(service.group_name().to_string(), service);
    }

    /// Snapshot of every published `(interface, group)` pair, for registry
    /// announcement.
    pub fn published(&self) -> Vec<(String, String)> {
        let services = self.services.read().expect("dispatch lock");
        services
            .iter()
            .flat_map(|(interface, groups)| {
                groups
                    .keys()
                    .map(|group| (interface.clone(), group.clone()))
            })
            .collect()
    }

    /// Runs one decoded request to an application-level response.
    pub async fn dispatch(&self, request: RpcRequest, serialize: SerializeKind) -> RpcResponse {
        let handler = {
            let services = self.services.read().expect("dispatch lock");
            let Some(groups) = services.get(&request.interface) else {
                return RpcResponse::not_found(format!(
                    "no provider for interface {}",
                    request.interface
                ));
            };
            let Some(service) = groups.get(&request.group) else {
                return RpcResponse::not_found(format!(
                    "interface {} has no group {}",
                    request.interface, request.group
                ));
            };
            match service.handler(&request.method) {
                Some(handler) => handler,
                None => {
                    return RpcResponse::not_found(format!(
                        "interface {} has no method {}",
                        request.interface, request.method
                    ));
                }
            }
        };

        match handler(Invocation::new(request, serialize)).await {
            Ok(body) => RpcResponse::success(body),
            Err(e) => RpcResponse::failure(e.to_string()),
        }
    }
}
