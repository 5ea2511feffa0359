//! Action registry: the address-local action → invoker table.
//!
//! Rust has no runtime reflection to map action tokens onto trait methods,
//! so handlers register explicitly: each [`ServiceHandler`] supplies a
//! static table of `{contract, invoker}` pairs built at construction time.
//! The invoker is a type-erased closure that receives the bound parameter
//! values and returns a [`HandlerOutcome`].
//!
//! # Architecture
//!
//! ```text
//! BusMessage { action: "CREATE", body: {...} }
//!   ↓
//! registry.resolve(CREATE) → ActionBinding
//!   ↓
//! binding.contract().bind(payload) → Vec<Value>   (coerced parameters)
//!   ↓
//! binding.invoke(params) → HandlerOutcome         (value/empty/fail/async/stream)
//! ```

use crate::dispatch::{ActionContract, HandlerOutcome};
use crate::error::RegistryError;
use crate::event::EventAction;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Type-erased handler invoker.
///
/// Receives parameter values bound in contract declaration order.
pub type InvokerFn = Arc<dyn Fn(Vec<Value>) -> HandlerOutcome + Send + Sync>;

/// One contract plus the invoker it dispatches to.
pub struct ActionBinding {
    contract: ActionContract,
    invoker: InvokerFn,
}

impl ActionBinding {
    /// Bind a contract to its invoker closure.
    pub fn new<F>(contract: ActionContract, invoker: F) -> Self
    where
        F: Fn(Vec<Value>) -> HandlerOutcome + Send + Sync + 'static,
    {
        Self {
            contract,
            invoker: Arc::new(invoker),
        }
    }

    /// The static contract metadata.
    pub fn contract(&self) -> &ActionContract {
        &self.contract
    }

    /// Invoke the handler with bound parameter values.
    pub fn invoke(&self, params: Vec<Value>) -> HandlerOutcome {
        (self.invoker)(params)
    }
}

impl std::fmt::Debug for ActionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionBinding")
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

/// A handler object that declares its action bindings.
///
/// The explicit-table replacement for annotation scanning: implementors
/// hand the registry everything it needs in one call.
///
/// # Example
///
/// ```rust,ignore
/// struct DeviceService;
///
/// impl ServiceHandler for DeviceService {
///     fn bindings(&self) -> Vec<ActionBinding> {
///         vec![ActionBinding::new(
///             ActionContract::new(EventAction::Create)
///                 .param(ParamSpec::required("id", ParamKind::Integer)),
///             |params| HandlerOutcome::value(create_device(&params[0])),
///         )]
///     }
/// }
/// ```
pub trait ServiceHandler: Send + Sync + 'static {
    /// The static action table for this handler.
    fn bindings(&self) -> Vec<ActionBinding>;
}

/// Registry mapping action tokens to bindings for one address.
///
/// Built once at registration time, immutable afterwards, shared read-only
/// across all dispatch calls.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    bindings: HashMap<EventAction, ActionBinding>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Build a registry from a handler's declared bindings.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateAction` if two contracts declare
    /// the same action token — a programmer error, fatal at startup, never
    /// surfaced at request time.
    pub fn from_handler(handler: &dyn ServiceHandler) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for binding in handler.bindings() {
            registry.insert(binding)?;
        }
        Ok(registry)
    }

    /// Insert a single binding.
    pub fn insert(&mut self, binding: ActionBinding) -> Result<(), RegistryError> {
        let action = binding.contract().action().clone();
        if self.bindings.contains_key(&action) {
            return Err(RegistryError::DuplicateAction(action.to_string()));
        }
        tracing::debug!("Registering action contract [{}]", action);
        self.bindings.insert(action, binding);
        Ok(())
    }

    /// Resolve the binding for an action token.
    pub fn resolve(&self, action: &EventAction) -> Option<&ActionBinding> {
        self.bindings.get(action)
    }

    /// Whether a contract exists for an action.
    pub fn has_action(&self, action: &EventAction) -> bool {
        self.bindings.contains_key(action)
    }

    /// Number of registered contracts.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry has no contracts.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
