//! # Switchboard
//!
//! A modular application runtime: independently-deployable components
//! (plugins) communicate exclusively through asynchronous, addressed
//! envelope-carrying messages, and HTTP requests for dynamically-registered
//! backend services are routed without static configuration.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ GatewayRouter                                               │
//! │   discovery records → live route table → HTTP forwarding    │
//! ├─────────────────────────────────────────────────────────────┤
//! │ MessageBus                                                  │
//! │   address → Dispatcher, bounded-wait request/reply          │
//! ├──────────────────────────┬──────────────────────────────────┤
//! │ Dispatcher               │ LifecycleCoordinator             │
//! │  • ActionRegistry        │  • ComponentState machine        │
//! │  • parameter binding     │  • configuration gate            │
//! │  • outcome normalization │  • deploy hooks + contexts       │
//! ├──────────────────────────┴──────────────────────────────────┤
//! │ Envelope protocol                                           │
//! │   status / action / payload / error, strict + lenient codec │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchboard::prelude::*;
//!
//! let bus = MessageBus::new();
//! bus.register("svc.device", &DeviceService)?;
//!
//! let reply = bus.request("svc.device", BusMessage::new(
//!     codec::encode(&Envelope::initial_with(EventAction::Create, payload)),
//! )).await?;
//! ```
//!
//! ## Delivery contract
//!
//! Every inbound message produces exactly one reply envelope, sent exactly
//! once; unknown actions resolve to a distinguished failure, never a
//! silent drop. Delivery itself is best effort, at-most-once, with no
//! persistence — the transports underneath are external collaborators.

#![deny(missing_docs)]

pub mod bus;
pub mod cluster;
pub mod component;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod gateway;
pub mod prelude;
pub mod runtime;

pub use bus::{BusMessage, MessageBus};
pub use dispatch::Dispatcher;
pub use event::{Envelope, EventAction, EventStatus};
pub use gateway::GatewayRouter;
pub use runtime::{Runtime, RuntimeBuilder};
