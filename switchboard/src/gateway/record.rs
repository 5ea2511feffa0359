//! Service-discovery records and route priority computation.

use crate::error::GatewayError;
use serde_json::Value;
use std::collections::BTreeSet;

/// Availability of a discovered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    /// The service announced itself available.
    Up,

    /// The service went away; its routes are disabled, not removed.
    Down,
}

impl ServiceStatus {
    /// Wire token for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Up => "UP",
            ServiceStatus::Down => "DOWN",
        }
    }
}

/// Kind of backend a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// A plain HTTP endpoint.
    Http,

    /// A service consuming envelope messages on a bus address.
    EventMessage,
}

impl ServiceKind {
    /// Wire token for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Http => "http-endpoint",
            ServiceKind::EventMessage => "eventbus-message-service",
        }
    }
}

/// Location metadata of a discovered service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLocation {
    /// Mount root the service wants its routes under, e.g. `/device`.
    pub root: String,

    /// Bus address the gateway forwards matched requests to.
    pub address: String,

    /// Physical host, informational.
    pub host: Option<String>,

    /// Physical port, informational.
    pub port: Option<u16>,
}

impl ServiceLocation {
    /// A bus-addressed location with no physical endpoint metadata.
    pub fn new(root: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            address: address.into(),
            host: None,
            port: None,
        }
    }
}

/// A service-discovery lifecycle notification.
///
/// Records arrive as a stream; the router keys its working set by
/// `(name, location)` so a later re-UP of the same record re-enables its
/// existing route slots.
#[derive(Debug, Clone)]
pub struct DiscoveryRecord {
    /// Service name, used for logging and identity.
    pub name: String,

    /// Whether the service came up or went down.
    pub status: ServiceStatus,

    /// Backend kind.
    pub kind: ServiceKind,

    /// Where the service lives.
    pub location: ServiceLocation,

    /// Opaque metadata attached by the announcing side.
    pub metadata: Option<Value>,

    /// Equivalent mount paths in addition to the primary root.
    pub alternative_paths: Option<BTreeSet<String>>,
}

impl DiscoveryRecord {
    /// A minimal UP record for a bus-addressed service.
    pub fn up(name: impl Into<String>, root: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ServiceStatus::Up,
            kind: ServiceKind::EventMessage,
            location: ServiceLocation::new(root, address),
            metadata: None,
            alternative_paths: None,
        }
    }

    /// The same record with status `Down`.
    pub fn down(mut self) -> Self {
        self.status = ServiceStatus::Down;
        self
    }

    /// Route priority of this record, derived from path specificity.
    pub fn order(&self) -> i32 {
        priority_order(&self.location.root)
    }

    /// Compute the set of mount paths for this record: the primary root
    /// plus any alternative paths, each combined under the gateway root,
    /// sorted in descending lexicographic order so more specific paths
    /// register (and therefore match) before less specific ones sharing a
    /// prefix.
    ///
    /// # Errors
    ///
    /// `GatewayError::MalformedRecord` when the record has no name or a
    /// root that is not an absolute path.
    pub fn mount_paths(&self, gateway_root: &str) -> Result<Vec<String>, GatewayError> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::MalformedRecord {
                name: "<unnamed>".to_string(),
                reason: "record has no name".to_string(),
            });
        }

        let mut roots: Vec<&str> = match &self.alternative_paths {
            Some(paths) if !paths.is_empty() => paths.iter().map(String::as_str).collect(),
            _ => vec![self.location.root.as_str()],
        };
        // The primary root always mounts, alternatives come on top of it.
        if !roots.contains(&self.location.root.as_str()) {
            roots.push(self.location.root.as_str());
        }

        let mut paths = Vec::with_capacity(roots.len());
        for root in roots {
            let normalized = normalize_path(root).ok_or_else(|| GatewayError::MalformedRecord {
                name: self.name.clone(),
                reason: format!("invalid mount root [{}]", root),
            })?;
            paths.push(combine_path(gateway_root, &normalized));
        }

        paths.sort_by(|a, b| b.cmp(a));
        paths.dedup();
        Ok(paths)
    }
}

/// Route priority derived monotonically from path specificity: longer,
/// deeper roots get a numerically higher order, so the most specific
/// registered path wins for a given request.
pub fn priority_order(root: &str) -> i32 {
    match normalize_path(root) {
        Some(normalized) => normalized.len() as i32,
        None => 0,
    }
}

/// Normalize a mount root: must be absolute, no trailing slash remains.
/// Returns `None` for anything that cannot mount.
fn normalize_path(path: &str) -> Option<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() || !trimmed.starts_with('/') {
        return None;
    }
    let stripped = trimmed.trim_end_matches('/');
    if stripped.is_empty() {
        // The bare root "/" is valid and stays as-is.
        return Some("/".to_string());
    }
    Some(stripped.to_string())
}

/// Join two path fragments with exactly one separator.
fn combine_path(base: &str, tail: &str) -> String {
    let base = base.trim_end_matches('/');
    let tail = tail.trim_start_matches('/');
    if tail.is_empty() {
        return if base.is_empty() { "/".to_string() } else { base.to_string() };
    }
    format!("{}/{}", base, tail)
}
