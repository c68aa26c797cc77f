//! # Stream Error Types
//!
//! All errors that can occur while reading or patching a byte stream.

use thiserror::Error;

/// Errors raised by [`InputStream`](crate::InputStream) and the codecs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// A read asked for more bytes than the buffer still holds.
    #[error("unexpected end of stream: requested {requested} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes requested by the read.
        requested: usize,
        /// Bytes left after the cursor.
        remaining: usize,
    },

    /// The cursor was moved outside of the buffer.
    #[error("invalid stream position {pos} (buffer length {len})")]
    InvalidPosition {
        /// Requested position.
        pos: usize,
        /// Buffer length at the time of the move.
        len: usize,
    },

    /// A string payload did not carry its trailing terminator byte.
    #[error("string payload is missing its terminator")]
    MissingTerminator,

    /// A string payload was not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    /// A length does not fit into the 32-bit size prefix.
    #[error("length {0} does not fit into a 32-bit size prefix")]
    SizeOverflow(usize),

    /// A sequence payload length is not a multiple of its element width.
    #[error("sequence payload of {len} bytes is not a multiple of element size {element}")]
    MisalignedSequence {
        /// Payload length in bytes.
        len: usize,
        /// Element width in bytes.
        element: usize,
    },
}

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
