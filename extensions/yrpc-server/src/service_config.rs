use crate::Invocation;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed async method handler. The returned bytes are the already-serialized
/// reply body; errors become `Fail` responses carrying the error's text.
pub type MethodHandler = Arc<
    dyn Fn(
            Invocation,
        ) -> Pin<
            Box<
                dyn Future<Output = Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>>
                    + Send,
            >,
        > + Send
        + Sync,
>;

/// One published service: an interface name, a group, and the method
/// dispatch map bound at registration time.
///
/// The map is frozen once the config is published; dispatch is a plain
/// name lookup with no runtime reflection anywhere.
#[derive(Clone)]
pub struct ServiceConfig {
    interface: String,
    group: String,
    methods: HashMap<String, MethodHandler>,
}

impl ServiceConfig {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            group: "default".to_string(),
            methods: HashMap::new(),
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Binds one method name to a handler.
    ///
    /// ```no_run
    /// # use yrpc_server::ServiceConfig;
    /// let service = ServiceConfig::new("com.acme.HelloYrpc").method("sayHi", |inv| async move {
    ///     let msg: String = inv.arg(0)?;
    ///     Ok(inv.reply(&format!("hi consumer:{}", msg))?)
    /// });
    /// ```
    pub fn method<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>>
            + Send
            + 'static,
    {
        self.methods.insert(
            name.into(),
            Arc::new(move |invocation| Box::pin(handler(invocation))),
        );
        self
    }

    pub fn interface_name(&self) -> &str {
        &self.interface
    }

    pub fn group_name(&self) -> &str {
        &self.group
    }

    pub(crate) fn handler(&self, method: &str) -> Option<MethodHandler> {
        self.methods.get(method).cloned()
    }
}
