//! Component lifecycle: states, contexts, plugins, and the coordinator.

mod context;
mod coordinator;
mod plugin;
mod state;

pub use context::{keys, ContextLookup, PluginContext};
pub use coordinator::{Application, Deployment, LifecycleCoordinator};
pub use plugin::{DefaultDeployHook, DeployHook, Plugin, PluginConfig};
pub use state::ComponentState;
