//! Action dispatch: contracts, registry, outcome normalization.

mod contract;
mod dispatcher;
mod outcome;
mod registry;
mod reply;

pub use contract::{ActionContract, ParamKind, ParamSpec};
pub use dispatcher::Dispatcher;
pub use outcome::{DeferredReply, HandlerOutcome, StreamReply};
pub use registry::{ActionBinding, ActionRegistry, InvokerFn, ServiceHandler};
pub use reply::ReplySlot;
