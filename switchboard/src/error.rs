//! Error types for the switchboard runtime.

use crate::component::ComponentState;
use thiserror::Error;

/// Logical error codes carried by failure envelopes.
///
/// Codes travel over the wire as `SCREAMING_SNAKE_CASE` tokens and drive the
/// gateway's HTTP status mapping. Unknown tokens decode as `UnknownError`
/// rather than failing the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A request parameter is missing or cannot be coerced.
    InvalidArgument,

    /// The envelope document itself is malformed.
    InvalidMessage,

    /// No service or action is registered for the request.
    ServiceNotFound,

    /// The backend did not answer in time or is out of service.
    ServiceUnavailable,

    /// The handler ran and reported a failure.
    ServiceError,

    /// A bounded wait elapsed.
    TimeoutError,

    /// Anything that carries no more specific code.
    UnknownError,
}

impl ErrorCode {
    /// Wire token for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::InvalidMessage => "INVALID_MESSAGE",
            ErrorCode::ServiceNotFound => "SERVICE_NOT_FOUND",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::ServiceError => "SERVICE_ERROR",
            ErrorCode::TimeoutError => "TIMEOUT_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Parse a wire token. Unknown tokens map to `UnknownError`.
    pub fn parse(token: &str) -> Self {
        match token {
            "INVALID_ARGUMENT" => ErrorCode::InvalidArgument,
            "INVALID_MESSAGE" => ErrorCode::InvalidMessage,
            "SERVICE_NOT_FOUND" => ErrorCode::ServiceNotFound,
            "SERVICE_UNAVAILABLE" => ErrorCode::ServiceUnavailable,
            "SERVICE_ERROR" => ErrorCode::ServiceError,
            "TIMEOUT_ERROR" => ErrorCode::TimeoutError,
            _ => ErrorCode::UnknownError,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while decoding an envelope document in strict mode.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The document is not a JSON object.
    #[error("Invalid envelope document: {0}")]
    InvalidFormat(String),

    /// A required field is absent.
    #[error("Missing required envelope field: {0}")]
    MissingField(&'static str),

    /// The status token is not one of the known statuses.
    #[error("Invalid status token: {0}")]
    InvalidStatus(String),

    /// `error` must be present exactly when the status is `FAILED`, and
    /// `data` and `error` are mutually exclusive.
    #[error("Inconsistent envelope: {0}")]
    Inconsistent(&'static str),
}

impl EnvelopeError {
    /// Logical code for failure envelopes derived from this error.
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::InvalidMessage
    }
}

/// A failure reported by a handler, either synchronously or through an
/// asynchronous completion. Both paths surface to the caller identically.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HandlerError {
    /// Logical error code surfaced to the caller.
    pub code: ErrorCode,

    /// Human-readable failure description.
    pub message: String,
}

impl HandlerError {
    /// Create a handler error with an explicit code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a `ServiceError`-coded failure.
    pub fn service(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceError, message)
    }
}

/// Errors raised while registering action contracts.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two contracts on the same handler declare the same action token.
    /// This is a programmer error and is fatal at startup.
    #[error("Duplicate action contract: {0}")]
    DuplicateAction(String),
}

/// Errors raised while dispatching a message to a handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No contract matches the requested action.
    #[error("Unknown action [{action}] on address [{address}]")]
    UnknownAction {
        /// The unmatched action token.
        action: String,
        /// The address whose registry was consulted.
        address: String,
    },

    /// A required parameter is absent from the payload.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// A parameter value could not be coerced to its declared kind.
    #[error("Parameter [{name}] is not a valid {expected}")]
    ParameterType {
        /// The parameter name from the contract.
        name: String,
        /// The declared kind that coercion targeted.
        expected: &'static str,
    },

    /// The handler reported a failure.
    #[error("Handler failed: {0}")]
    Handler(#[from] HandlerError),
}

impl DispatchError {
    /// Logical code for failure envelopes derived from this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            DispatchError::UnknownAction { .. } => ErrorCode::ServiceNotFound,
            DispatchError::MissingParameter(_) => ErrorCode::InvalidArgument,
            DispatchError::ParameterType { .. } => ErrorCode::InvalidArgument,
            DispatchError::Handler(e) => e.code,
        }
    }
}

/// Errors raised by the configuration validation gate.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The raw configuration document does not deserialize to the
    /// component's typed configuration.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The typed configuration deserialized but failed validation.
    #[error("Configuration rejected: {0}")]
    Rejected(String),
}

/// Errors raised by plugin start/stop hooks.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The async start hook failed.
    #[error("Plugin start failed: {0}")]
    StartFailed(String),

    /// The stop hook failed. Logged by the coordinator, never fatal.
    #[error("Plugin stop failed: {0}")]
    StopFailed(String),
}

/// Errors raised by the lifecycle coordinator.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The requested phase is not reachable from the current state.
    #[error("Invalid lifecycle transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// State the deployment was in.
        from: ComponentState,
        /// State the phase tried to enter.
        to: ComponentState,
    },

    /// Configuration validation failed; the component never starts.
    #[error("Configuration gate failed: {0}")]
    Config(#[from] ConfigError),

    /// The plugin's start hook failed.
    #[error("Start hook failed: {0}")]
    Start(#[source] PluginError),
}

/// Batch installation failure reported to the orchestrating application.
#[derive(Debug, Error)]
#[error("Install failed at plugin [{plugin}]: {source}")]
pub struct InstallError {
    /// Name of the plugin that failed to deploy.
    pub plugin: String,

    /// The underlying lifecycle failure.
    #[source]
    pub source: LifecycleError,
}

/// Errors raised by the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// No consumer is registered on the target address.
    #[error("No consumer registered on address [{0}]")]
    AddressNotFound(String),

    /// The bounded wait elapsed before a reply arrived.
    #[error("No reply from action [{action}] from [{address}]")]
    NoReply {
        /// Target address the request was sent to.
        address: String,
        /// Action token of the request.
        action: String,
    },
}

impl BusError {
    /// Logical code for failure envelopes derived from this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            BusError::AddressNotFound(_) => ErrorCode::ServiceNotFound,
            BusError::NoReply { .. } => ErrorCode::ServiceUnavailable,
        }
    }
}

/// Errors raised while turning a discovery record into routes.
///
/// These never escape the discovery subscription: the router logs them and
/// treats the record as a no-op.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The record cannot produce a valid mount path.
    #[error("Malformed discovery record [{name}]: {reason}")]
    MalformedRecord {
        /// Record name, for the log line.
        name: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors raised by the cluster collaborator.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The cluster backend cannot be reached.
    #[error("Cluster unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while assembling a runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A required builder field is missing or invalid.
    #[error("Invalid runtime configuration: {0}")]
    InvalidConfiguration(String),
}
