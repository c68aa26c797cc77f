//! # Byte Streams
//!
//! Cursor-based readers and writers over byte storage.
//!
//! ## Design
//!
//! - [`InputStream`] borrows a byte slice and never copies. Every read is
//!   bounds-checked and returns [`StreamError::UnexpectedEof`] instead of
//!   reading past the end.
//! - [`OutputStream`] borrows a [`Buffer`] and *inserts* at its cursor. The
//!   cursor starts at the buffer end, so a fresh stream appends. Moving the
//!   cursor back lets a caller write a size prefix in front of bytes it has
//!   already produced.

use crate::buffer::Buffer;
use crate::error::{StreamError, StreamResult};

/// Converts a byte length to the 32-bit size prefix used on the wire.
pub fn size_prefix(len: usize) -> StreamResult<u32> {
    u32::try_from(len).map_err(|_| StreamError::SizeOverflow(len))
}

/// Read cursor over a borrowed byte slice.
#[derive(Clone, Copy, Debug)]
pub struct InputStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> InputStream<'a> {
    /// Creates a stream positioned at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position.
    #[inline]
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Moves the cursor. Positions past the end are rejected.
    pub fn set_pos(&mut self, pos: usize) -> StreamResult<()> {
        if pos > self.data.len() {
            return Err(StreamError::InvalidPosition {
                pos,
                len: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Returns true once every byte has been consumed.
    #[inline]
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Bytes left after the cursor.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Total length of the underlying slice.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying slice is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reads exactly `count` bytes and advances the cursor.
    pub fn read(&mut self, count: usize) -> StreamResult<&'a [u8]> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(StreamError::UnexpectedEof {
                requested: count,
                remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    /// Reads a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> StreamResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read(N)?);
        Ok(out)
    }

    /// Advances the cursor by `count` bytes.
    pub fn skip(&mut self, count: usize) -> StreamResult<()> {
        self.read(count).map(|_| ())
    }
}

/// Write cursor over a borrowed [`Buffer`].
#[derive(Debug)]
pub struct OutputStream<'a> {
    buffer: &'a mut Buffer,
    pos: usize,
}

impl<'a> OutputStream<'a> {
    /// Creates a stream positioned at the end of `buffer`.
    pub fn new(buffer: &'a mut Buffer) -> Self {
        let pos = buffer.len();
        Self { buffer, pos }
    }

    /// Current cursor position.
    #[inline]
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Moves the cursor. Positions past the end are rejected.
    pub fn set_pos(&mut self, pos: usize) -> StreamResult<()> {
        if pos > self.buffer.len() {
            return Err(StreamError::InvalidPosition {
                pos,
                len: self.buffer.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Moves the cursor to the end of the buffer.
    pub fn seek_end(&mut self) {
        self.pos = self.buffer.len();
    }

    /// Current buffer length.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Inserts `bytes` at the cursor and advances past them.
    pub fn write(&mut self, bytes: &[u8]) {
        self.buffer.insert(self.pos, bytes);
        self.pos += bytes.len();
    }

    /// Runs `body`, then inserts a 32-bit size prefix in front of everything
    /// it wrote. The cursor ends after the prefixed block.
    pub fn write_size_prefixed<F>(&mut self, body: F) -> StreamResult<()>
    where
        F: FnOnce(&mut Self) -> StreamResult<()>,
    {
        let start = self.pos;
        body(self)?;
        let end = self.pos;
        let size = size_prefix(end - start)?;
        self.pos = start;
        self.write(&size.to_le_bytes());
        self.pos = end + 4;
        Ok(())
    }

    /// Borrows the bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }
}
