// Error types for the mirror runtime.

use std::fmt;

use mirror_ffi::{FieldKind, MirrorErrorCode};

/// Rich error type for registry, accessor, codec and protocol operations.
#[derive(Debug)]
pub enum MirrorError {
    TypeNotFound(String),
    FieldNotFound { type_name: String, field: String },
    /// Requested access kind differs from the field's declared kind.
    TypeMismatch { expected: FieldKind, found: FieldKind },
    /// The instance is not of the concrete type the descriptor was registered for.
    InstanceMismatch(String),
    /// The field is described but has no bound accessor (Custom kind).
    NoAccessor(String),
    /// No live object with this id in the object table.
    ObjectNotFound(u32),
    InvalidJson(String),
    Io(std::io::Error),
    NotConnected,
    NotStarted,
    Transport(String),
    Config(String),
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorError::TypeNotFound(name) => write!(f, "Type not found: {name}"),
            MirrorError::FieldNotFound { type_name, field } => {
                write!(f, "Field not found: {type_name}.{field}")
            }
            MirrorError::TypeMismatch { expected, found } => write!(
                f,
                "Type mismatch: expected {}, found {}",
                expected.name(),
                found.name()
            ),
            MirrorError::InstanceMismatch(name) => {
                write!(f, "Instance is not a {name}")
            }
            MirrorError::NoAccessor(field) => write!(f, "Field has no accessor: {field}"),
            MirrorError::ObjectNotFound(id) => write!(f, "Object not found: {id}"),
            MirrorError::InvalidJson(msg) => write!(f, "Invalid JSON: {msg}"),
            MirrorError::Io(err) => write!(f, "I/O error: {err}"),
            MirrorError::NotConnected => write!(f, "Not connected"),
            MirrorError::NotStarted => write!(f, "Not started"),
            MirrorError::Transport(msg) => write!(f, "Transport error: {msg}"),
            MirrorError::Config(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for MirrorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MirrorError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MirrorError {
    fn from(err: std::io::Error) -> Self {
        MirrorError::Io(err)
    }
}

impl From<serde_json::Error> for MirrorError {
    fn from(err: serde_json::Error) -> Self {
        MirrorError::InvalidJson(err.to_string())
    }
}

/// Convenience alias used throughout the runtime.
pub type MirrorResult<T> = Result<T, MirrorError>;

impl MirrorError {
    /// Render the `{"error": "..."}` payload used by every protocol failure.
    pub fn to_payload(&self) -> String {
        error_payload(&self.to_string())
    }
}

/// Build an error payload from a plain message.
pub fn error_payload(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// Extract the message from an `{"error": "..."}` payload, if it is one.
pub fn payload_error(payload: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    value.get("error")?.as_str().map(str::to_owned)
}

impl From<&MirrorError> for MirrorErrorCode {
    fn from(err: &MirrorError) -> Self {
        match err {
            MirrorError::TypeNotFound(_) => MirrorErrorCode::TypeNotFound,
            MirrorError::FieldNotFound { .. } => MirrorErrorCode::FieldNotFound,
            MirrorError::TypeMismatch { .. } => MirrorErrorCode::TypeMismatch,
            MirrorError::InstanceMismatch(_) => MirrorErrorCode::InstanceMismatch,
            MirrorError::NoAccessor(_) => MirrorErrorCode::NoAccessor,
            MirrorError::ObjectNotFound(_) => MirrorErrorCode::ObjectNotFound,
            MirrorError::InvalidJson(_) => MirrorErrorCode::InvalidJson,
            MirrorError::Io(_) => MirrorErrorCode::IoError,
            MirrorError::NotConnected => MirrorErrorCode::NotConnected,
            MirrorError::NotStarted => MirrorErrorCode::NotStarted,
            MirrorError::Transport(_) => MirrorErrorCode::TransportError,
            MirrorError::Config(_) => MirrorErrorCode::ConfigError,
        }
    }
}
