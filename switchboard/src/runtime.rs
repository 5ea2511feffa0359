//! Runtime assembly: bus + application + optional gateway.

use crate::bus::MessageBus;
use crate::cluster::ClusterDelegate;
use crate::component::Application;
use crate::error::RuntimeError;
use crate::gateway::GatewayRouter;
use std::sync::Arc;
use std::time::Duration;

/// A fully assembled runtime instance.
pub struct Runtime {
    name: String,
    bus: Arc<MessageBus>,
    application: Application,
    gateway: Option<GatewayRouter>,
    cluster: Option<Arc<dyn ClusterDelegate>>,
}

impl Runtime {
    /// Start building a runtime.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Runtime name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared message bus.
    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }

    /// The application deploying this runtime's plugins.
    pub fn application(&self) -> &Application {
        &self.application
    }

    /// Mutable access to the application, for queueing plugins and
    /// installing the batch.
    pub fn application_mut(&mut self) -> &mut Application {
        &mut self.application
    }

    /// The gateway router, when one was configured.
    pub fn gateway(&self) -> Option<&GatewayRouter> {
        self.gateway.as_ref()
    }

    /// The cluster collaborator, when one was supplied.
    pub fn cluster(&self) -> Option<&Arc<dyn ClusterDelegate>> {
        self.cluster.as_ref()
    }
}

/// Builder for [`Runtime`] with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = Runtime::builder()
///     .name("edge")
///     .gateway_root("/api/s")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    name: Option<String>,
    gateway_root: Option<String>,
    reply_wait: Option<Duration>,
    cluster: Option<Arc<dyn ClusterDelegate>>,
}

impl RuntimeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            name: None,
            gateway_root: None,
            reply_wait: None,
            cluster: None,
        }
    }

    /// Set the runtime name (required).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mount a dynamic gateway under this root path.
    pub fn gateway_root(mut self, root: impl Into<String>) -> Self {
        self.gateway_root = Some(root.into());
        self
    }

    /// Override the bus's default bounded reply wait.
    pub fn reply_wait(mut self, wait: Duration) -> Self {
        self.reply_wait = Some(wait);
        self
    }

    /// Attach the cluster collaborator.
    pub fn cluster(mut self, cluster: Arc<dyn ClusterDelegate>) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Build the runtime.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidConfiguration` if required fields are
    /// missing or invalid.
    pub fn build(self) -> Result<Runtime, RuntimeError> {
        let name = self
            .name
            .ok_or_else(|| RuntimeError::InvalidConfiguration("name is required".to_string()))?;

        if let Some(root) = &self.gateway_root {
            if !root.starts_with('/') {
                return Err(RuntimeError::InvalidConfiguration(format!(
                    "gateway root must be an absolute path, got [{}]",
                    root
                )));
            }
        }

        let bus = Arc::new(match self.reply_wait {
            Some(wait) => MessageBus::with_default_wait(wait),
            None => MessageBus::new(),
        });
        let gateway = self
            .gateway_root
            .map(|root| GatewayRouter::new(bus.clone(), root));
        let application = Application::new(name.clone());

        tracing::info!(
            "Runtime created: name={}, gateway={}",
            name,
            gateway.is_some()
        );

        Ok(Runtime {
            name,
            bus,
            application,
            gateway,
            cluster: self.cluster,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
