//! Action tokens naming the operation a handler performs.

use serde::{Deserialize, Serialize};

/// String token identifying the intent of a message.
///
/// Actions are the dispatch key: a handler declares one contract per action
/// token, and the dispatcher resolves incoming messages by exact token
/// match. Well-known tokens cover the standard CRUD-and-control vocabulary;
/// anything else round-trips through `Other`.
///
/// # Parsing
///
/// Parsing never fails: tokens are upper-cased, blank input maps to
/// `Unknown`, and unrecognized tokens become `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventAction {
    /// Initialize a resource or subsystem.
    Init,

    /// Create a resource.
    Create,

    /// Replace a resource.
    Update,

    /// Partially modify a resource.
    Patch,

    /// Delete a resource.
    Remove,

    /// Fetch a single resource.
    GetOne,

    /// Fetch a collection.
    GetList,

    /// Health/status probe.
    Monitor,

    /// One-way notification.
    Notify,

    /// Synchronize state with a peer.
    Sync,

    /// Reply produced on behalf of another action (see
    /// [`Envelope::reply_error`](crate::event::Envelope::reply_error)).
    Reply,

    /// Unresolvable intent; also the action of lenient-decode fallbacks.
    Unknown,

    /// Any other token. Always upper-case, never one of the known tokens.
    Other(String),
}

impl EventAction {
    /// Wire token for this action.
    pub fn as_str(&self) -> &str {
        match self {
            EventAction::Init => "INIT",
            EventAction::Create => "CREATE",
            EventAction::Update => "UPDATE",
            EventAction::Patch => "PATCH",
            EventAction::Remove => "REMOVE",
            EventAction::GetOne => "GET_ONE",
            EventAction::GetList => "GET_LIST",
            EventAction::Monitor => "MONITOR",
            EventAction::Notify => "NOTIFY",
            EventAction::Sync => "SYNC",
            EventAction::Reply => "REPLY",
            EventAction::Unknown => "UNKNOWN",
            EventAction::Other(token) => token,
        }
    }

    /// Parse a wire token.
    ///
    /// Input is upper-cased first. Blank input maps to `Unknown`; tokens
    /// that are not part of the known vocabulary become `Other`.
    pub fn parse(token: &str) -> Self {
        let token = token.trim().to_uppercase();
        match token.as_str() {
            "" => EventAction::Unknown,
            "INIT" => EventAction::Init,
            "CREATE" => EventAction::Create,
            "UPDATE" => EventAction::Update,
            "PATCH" => EventAction::Patch,
            "REMOVE" => EventAction::Remove,
            "GET_ONE" => EventAction::GetOne,
            "GET_LIST" => EventAction::GetList,
            "MONITOR" => EventAction::Monitor,
            "NOTIFY" => EventAction::Notify,
            "SYNC" => EventAction::Sync,
            "REPLY" => EventAction::Reply,
            "UNKNOWN" => EventAction::Unknown,
            _ => EventAction::Other(token),
        }
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventAction {
    fn from(token: &str) -> Self {
        EventAction::parse(token)
    }
}

// Manual Serialize/Deserialize: actions travel as plain strings.
impl Serialize for EventAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Ok(EventAction::parse(&token))
    }
}
