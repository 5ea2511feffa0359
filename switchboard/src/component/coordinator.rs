//! Lifecycle coordinator: deployment phases and batch installation.
//!
//! The coordinator owns the start/stop sequence of a deployment. Phases
//! for one deployment are strictly sequential — the next phase is only
//! scheduled after the previous phase's completion signal — and every
//! failure is confined to the failing deployment, never crashing siblings
//! or the host.

use crate::component::{ComponentState, ContextLookup, DefaultDeployHook, DeployHook, Plugin,
                       PluginContext};
use crate::error::{InstallError, LifecycleError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One plugin instance plus its deployment state and raw configuration.
pub struct Deployment {
    plugin: Box<dyn Plugin>,
    config: Value,
    state: ComponentState,
}

impl Deployment {
    /// Wrap a plugin and its raw configuration document.
    pub fn new(plugin: Box<dyn Plugin>, config: Value) -> Self {
        Self {
            plugin,
            config,
            state: ComponentState::Created,
        }
    }

    /// The plugin's name.
    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// The deployed plugin.
    pub fn plugin(&self) -> &dyn Plugin {
        self.plugin.as_ref()
    }

    fn transition(&mut self, next: ComponentState) -> Result<(), LifecycleError> {
        if !self.state.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(
            "Deployment [{}] transition {:?} -> {:?}",
            self.plugin.name(),
            self.state,
            next
        );
        self.state = next;
        Ok(())
    }

    fn fail(&mut self) {
        // Failed is reachable from every non-terminal state.
        if self.state.can_transition_to(ComponentState::Failed) {
            self.state = ComponentState::Failed;
        }
    }
}

/// Drives deployment phases, threading contexts through the deploy hook.
pub struct LifecycleCoordinator {
    hook: Arc<dyn DeployHook>,
}

impl LifecycleCoordinator {
    /// A coordinator with the default pass-through hook.
    pub fn new() -> Self {
        Self {
            hook: Arc::new(DefaultDeployHook),
        }
    }

    /// A coordinator with a custom deploy hook.
    pub fn with_hook(hook: Arc<dyn DeployHook>) -> Self {
        Self { hook }
    }

    /// Start a deployment.
    ///
    /// `Created → Starting`; the configuration gate runs first and a
    /// rejected configuration transitions to `Failed` without invoking the
    /// start hook. On a validated configuration the pre-context is
    /// injected, the start hook runs, and success lands in `Running` with
    /// the enriched post-context handed back to the plugin.
    pub async fn start(
        &self,
        deployment: &mut Deployment,
        pre_context: PluginContext,
    ) -> Result<(), LifecycleError> {
        deployment.transition(ComponentState::Starting)?;

        if let Err(e) = deployment.plugin.configure(&deployment.config) {
            tracing::warn!(
                "Deployment [{}] rejected by configuration gate: {}",
                deployment.plugin.name(),
                e
            );
            deployment.fail();
            return Err(e.into());
        }

        self.hook.on_pre_deploy(deployment.plugin.as_mut(), pre_context);

        if let Err(e) = deployment.plugin.on_start().await {
            tracing::warn!(
                "Deployment [{}] failed to start: {}",
                deployment.plugin.name(),
                e
            );
            deployment.fail();
            return Err(LifecycleError::Start(e));
        }

        deployment.transition(ComponentState::Running)?;

        // Post-context: what the plugin holds after start (its pre-context
        // plus anything it added), threaded through the hook's enrichment.
        let post_context = deployment.plugin.context();
        self.hook
            .on_post_deploy(deployment.plugin.as_mut(), post_context);

        tracing::info!("Deployment [{}] is running", deployment.plugin.name());
        Ok(())
    }

    /// Stop a deployment. Stop hooks are best effort: a failure is logged
    /// and the deployment still reaches `Stopped`.
    pub async fn stop(&self, deployment: &mut Deployment) -> Result<(), LifecycleError> {
        deployment.transition(ComponentState::Stopping)?;

        if let Err(e) = deployment.plugin.on_stop().await {
            tracing::warn!(
                "Stop hook failed for [{}] (ignored): {}",
                deployment.plugin.name(),
                e
            );
        }

        deployment.transition(ComponentState::Stopped)?;
        tracing::info!("Deployment [{}] stopped", deployment.plugin.name());
        Ok(())
    }
}

impl Default for LifecycleCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Install-completed callback signature.
type InstallCallback = Box<dyn FnOnce(&ContextLookup) + Send>;

/// An application deploying a batch of plugins.
///
/// The application owns every plugin's post-context. The
/// install-completed callback observes the batch only after *all* plugins
/// deployed — partial completion is not observable to it. When a plugin
/// fails, the whole batch is reported failed; plugins that already started
/// are not rolled back, and their contexts stay retrievable through
/// [`Application::contexts`] for diagnostics.
pub struct Application {
    name: String,
    coordinator: LifecycleCoordinator,
    deployments: Vec<Deployment>,
    pre_contexts: HashMap<String, PluginContext>,
    contexts: ContextLookup,
    on_install_completed: Option<InstallCallback>,
}

impl Application {
    /// Create an application with the default deploy hook.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_coordinator(name, LifecycleCoordinator::new())
    }

    /// Create an application with a custom deploy hook.
    pub fn with_hook(name: impl Into<String>, hook: Arc<dyn DeployHook>) -> Self {
        Self::with_coordinator(name, LifecycleCoordinator::with_hook(hook))
    }

    fn with_coordinator(name: impl Into<String>, coordinator: LifecycleCoordinator) -> Self {
        Self {
            name: name.into(),
            coordinator,
            deployments: Vec::new(),
            pre_contexts: HashMap::new(),
            contexts: ContextLookup::new(),
            on_install_completed: None,
        }
    }

    /// Application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a plugin with an empty pre-context.
    pub fn add_plugin(&mut self, plugin: Box<dyn Plugin>, config: Value) {
        self.deployments.push(Deployment::new(plugin, config));
    }

    /// Queue a plugin with a pre-context supplied by the application.
    pub fn add_plugin_with_context(
        &mut self,
        plugin: Box<dyn Plugin>,
        config: Value,
        pre_context: PluginContext,
    ) {
        self.pre_contexts
            .insert(plugin.name().to_string(), pre_context);
        self.deployments.push(Deployment::new(plugin, config));
    }

    /// Register the callback invoked once the whole batch deployed.
    pub fn on_install_completed<F>(&mut self, callback: F)
    where
        F: FnOnce(&ContextLookup) + Send + 'static,
    {
        self.on_install_completed = Some(Box::new(callback));
    }

    /// Deploy every queued plugin, in order.
    ///
    /// # Errors
    ///
    /// Returns `InstallError` naming the first plugin that failed. Later
    /// plugins are not attempted; earlier ones keep running.
    pub async fn install(&mut self) -> Result<(), InstallError> {
        for deployment in self.deployments.iter_mut() {
            let name = deployment.name().to_string();
            let pre_context = self.pre_contexts.remove(&name).unwrap_or_default();

            match self.coordinator.start(deployment, pre_context).await {
                Ok(()) => {
                    self.contexts.insert(name, deployment.plugin.context());
                }
                Err(source) => {
                    tracing::warn!("Application [{}] install failed at [{}]", self.name, name);
                    return Err(InstallError {
                        plugin: name,
                        source,
                    });
                }
            }
        }

        if let Some(callback) = self.on_install_completed.take() {
            callback(&self.contexts);
        }
        tracing::info!(
            "Application [{}] installed {} plugin(s)",
            self.name,
            self.deployments.len()
        );
        Ok(())
    }

    /// Stop running deployments in reverse install order, best effort.
    pub async fn shutdown(&mut self) {
        for deployment in self.deployments.iter_mut().rev() {
            if deployment.state().is_running() {
                if let Err(e) = self.coordinator.stop(deployment).await {
                    tracing::warn!("Shutdown of [{}] failed: {}", deployment.name(), e);
                }
            }
        }
    }

    /// Post-contexts recorded so far, keyed by plugin name.
    pub fn contexts(&self) -> &ContextLookup {
        &self.contexts
    }

    /// The batch's deployments, in install order.
    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }
}
