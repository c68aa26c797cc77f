//! # Replication Error Types
//!
//! All errors that can occur in the engine, the manager and the objects they
//! drive. Every error is logged where it happens before it is returned, so
//! callers that do not care may drop it.

use replica_core::{Guid, StreamError};
use thiserror::Error;

/// Errors that can occur during replication.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// An operation ran before `init` succeeded.
    #[error("engine not initialized ({context})")]
    NotInitialized {
        /// Name of the operation that was refused.
        context: &'static str,
    },

    /// `init` was called on an initialized engine.
    #[error("engine already initialized")]
    AlreadyInitialized,

    /// An initialization hook reported failure.
    #[error("initialization failed: {0}")]
    InitFailed(&'static str),

    /// No constructor is registered under this class name.
    #[error("class not found: {0}")]
    ClassNotFound(String),

    /// An object with this identifier already exists.
    #[error("object already exists: {0}")]
    ObjectAlreadyExists(Guid),

    /// No object with this identifier exists.
    #[error("object not found: {0}")]
    ObjectNotFound(Guid),

    /// The wire class name disagrees with the local object's class.
    #[error("class name mismatch for {guid}: local {local}, remote {remote}")]
    ClassNameMismatch {
        /// Object identifier.
        guid: Guid,
        /// Class of the local object.
        local: String,
        /// Class advertised on the wire.
        remote: String,
    },

    /// No function is registered under this name.
    #[error("function not found: {0}")]
    FunctionNotFound(String),

    /// The operation is not allowed in the current mode.
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),

    /// An event or command tag is outside the known range.
    #[error("protocol violation: unknown {kind} tag {tag}")]
    ProtocolViolation {
        /// `"event"` or `"command"`.
        kind: &'static str,
        /// The offending tag byte.
        tag: u8,
    },

    /// A command batch came from a peer that is not connected.
    #[error("unknown peer: {0}")]
    UnknownPeer(Guid),

    /// A byte stream could not be read or written.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Result type for replication operations.
pub type NetworkResult<T> = Result<T, NetworkError>;
