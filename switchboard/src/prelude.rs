//! Convenience re-exports for consumers of the runtime.

pub use crate::bus::{BusMessage, MessageBus};
pub use crate::cluster::{ClusterDelegate, ClusterNode};
pub use crate::component::{
    keys, Application, ComponentState, ContextLookup, DefaultDeployHook, DeployHook, Deployment,
    LifecycleCoordinator, Plugin, PluginConfig, PluginContext,
};
pub use crate::dispatch::{
    ActionBinding, ActionContract, ActionRegistry, Dispatcher, HandlerOutcome, ParamKind,
    ParamSpec, ReplySlot, ServiceHandler,
};
pub use crate::error::{
    BusError, ClusterError, ConfigError, DispatchError, EnvelopeError, ErrorCode, GatewayError,
    HandlerError, InstallError, LifecycleError, PluginError, RegistryError, RuntimeError,
};
pub use crate::event::{codec, Envelope, ErrorMessage, EventAction, EventStatus};
pub use crate::gateway::{
    DiscoveryRecord, GatewayRouter, RouteEntry, RouteTable, ServiceKind, ServiceLocation,
    ServiceStatus,
};
pub use crate::runtime::{Runtime, RuntimeBuilder};
