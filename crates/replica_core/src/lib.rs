//! # Replica Core
//!
//! Byte-level foundation of the Replica replication layer:
//! - [`Buffer`] / [`SharedBuffer`] growable storage with a lockable form
//! - [`InputStream`] / [`OutputStream`] cursors with size back-patching
//! - [`Encode`] / [`Decode`] fixed-layout codecs for every wire value
//!
//! ## Architecture Rules
//!
//! 1. **Bytes in, bytes out** - nothing here knows about sockets
//! 2. **Remote input is untrusted** - every read is bounds-checked and
//!    returns a [`StreamError`] instead of panicking
//! 3. **Fixed layouts** - integers are little-endian, composite values are
//!    `#[repr(C)]` plain old data
//!
//! ## Example
//!
//! ```rust
//! use replica_core::{Buffer, Decode, Encode, Guid, InputStream, OutputStream};
//!
//! let mut buffer = Buffer::new();
//! let mut out = OutputStream::new(&mut buffer);
//! Guid::new(1, 0, 0, 0).encode(&mut out).unwrap();
//! "Foo".encode(&mut out).unwrap();
//!
//! let mut input = InputStream::new(buffer.as_slice());
//! assert_eq!(Guid::decode(&mut input).unwrap(), Guid::new(1, 0, 0, 0));
//! assert_eq!(String::decode(&mut input).unwrap(), "Foo");
//! assert!(input.is_eof());
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod codec;
pub mod error;
pub mod stream;
pub mod types;

pub use buffer::{Buffer, SharedBuffer};
pub use codec::{Decode, Encode, Integral};
pub use error::{StreamError, StreamResult};
pub use stream::{size_prefix, InputStream, OutputStream};
pub use types::{Guid, Header, Vec3};
