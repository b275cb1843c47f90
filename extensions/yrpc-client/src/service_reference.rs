use crate::{CallError, RetryPolicy, RpcClient};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::type_name;
use std::time::Duration;

/// A call handle for one remote interface.
///
/// This is the consumer's stand-in for a generated proxy: it knows the
/// interface's full name and per-reference policy, and builds method-call
/// descriptors without ever needing the concrete trait at the call site.
///
/// ```no_run
/// # async fn demo(client: yrpc_client::RpcClient) -> Result<(), yrpc_client::CallError> {
/// let hello = client.service("com.acme.HelloYrpc");
/// let reply: String = hello.invoke("sayHi").arg(&"hi")?.call().await?;
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct ServiceReference {
    client: RpcClient,
    interface: String,
    group: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ServiceReference {
    pub(crate) fn new(client: RpcClient, interface: String) -> Self {
        let group = client.config().group.clone();
        let timeout = client.config().call_timeout;
        Self {
            client,
            interface,
            group,
            timeout,
            retry: RetryPolicy::none(),
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables retry for calls made through this reference. Retryable
    /// failures re-resolve and try again up to `policy.attempts` total.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Starts a method-call descriptor. Arguments are appended with
    /// [`CallBuilder::arg`], then dispatched with [`CallBuilder::call`].
    pub fn invoke(&self, method: impl Into<String>) -> CallBuilder<'_> {
        CallBuilder {
            reference: self,
            method: method.into(),
            param_types: Vec::new(),
            args: Vec::new(),
        }
    }
}

/// Accumulates one call's arguments, each serialized eagerly with the
/// client's configured serializer, alongside its type descriptor.
pub struct CallBuilder<'a> {
    reference: &'a ServiceReference,
    method: String,
    param_types: Vec<String>,
    args: Vec<Vec<u8>>,
}

impl CallBuilder<'_> {
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, CallError> {
        self.args
            .push(self.reference.client.config().serialize.to_bytes(&value)?);
        self.param_types.push(type_name::<T>().to_string());
        Ok(self)
    }

    /// Sends the call and decodes the return value.
    pub async fn call<R: DeserializeOwned>(self) -> Result<R, CallError> {
        let reference = self.reference;
        let body = reference
            .client
            .invoke(
                &reference.interface,
                &reference.group,
                &self.method,
                self.param_types,
                self.args,
                reference.timeout,
                reference.retry,
            )
            .await?;

        Ok(reference.client.config().serialize.from_bytes(&body)?)
    }
}
