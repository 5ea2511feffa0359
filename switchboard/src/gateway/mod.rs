//! Dynamic HTTP gateway: discovery records, route table, router.

mod record;
mod route;
mod router;

pub use record::{priority_order, DiscoveryRecord, ServiceKind, ServiceLocation, ServiceStatus};
pub use route::{RouteEntry, RouteTable};
pub use router::GatewayRouter;
