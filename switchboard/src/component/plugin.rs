//! Plugin trait and deployment hooks.

use crate::component::PluginContext;
use crate::error::{ConfigError, PluginError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Typed plugin configuration: deserialization plus a validation hook.
///
/// `parse` is the configuration gate the coordinator runs before a plugin
/// starts — a raw document that fails either step keeps the plugin out of
/// `Running`.
pub trait PluginConfig: DeserializeOwned {
    /// Validate the deserialized configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Deserialize and validate a raw configuration document.
    fn parse(raw: &Value) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_value(raw.clone()).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// A deployable unit with a lifecycle and a context handoff.
///
/// Exactly one plugin instance exists per deployment. Lifecycle phases for
/// one instance never run concurrently — the coordinator drives one phase
/// at a time.
#[async_trait]
pub trait Plugin: Send {
    /// Stable plugin name; keys the application's context lookup.
    fn name(&self) -> &str;

    /// Validate and apply the raw configuration document.
    ///
    /// Called inside `Starting`, before the start hook. An error here
    /// transitions the deployment to `Failed` without invoking
    /// [`Plugin::on_start`].
    fn configure(&mut self, config: &Value) -> Result<(), ConfigError>;

    /// Receive a context. Called with the pre-context before start and
    /// with the enriched post-context after a successful start; the plugin
    /// keeps its copy and may add entries during startup.
    fn setup(&mut self, context: PluginContext);

    /// Snapshot of the context this plugin currently holds.
    fn context(&self) -> PluginContext;

    /// Async start hook. Success moves the deployment to `Running`,
    /// failure to `Failed`.
    async fn on_start(&mut self) -> Result<(), PluginError>;

    /// Async stop hook. Best effort: a failure is logged by the
    /// coordinator and does not block the transition to `Stopped`.
    async fn on_stop(&mut self) -> Result<(), PluginError>;
}

/// Deployment hook injecting contexts around a plugin's start.
///
/// All methods have pass-through defaults; orchestrating applications
/// override [`DeployHook::enrich_post_context`] to publish extra entries
/// that later plugins and the install-completed callback can read.
pub trait DeployHook: Send + Sync {
    /// Inject the pre-context before the plugin starts.
    fn on_pre_deploy(&self, plugin: &mut dyn Plugin, pre_context: PluginContext) {
        plugin.setup(pre_context);
    }

    /// Inject the post-context after the plugin started successfully.
    fn on_post_deploy(&self, plugin: &mut dyn Plugin, post_context: PluginContext) {
        plugin.setup(self.enrich_post_context(post_context));
    }

    /// Enrich the post-context before it is handed back to the plugin.
    /// Default: identity.
    fn enrich_post_context(&self, post_context: PluginContext) -> PluginContext {
        post_context
    }
}

/// The default hook: plain pass-through on every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDeployHook;

impl DeployHook for DefaultDeployHook {}
