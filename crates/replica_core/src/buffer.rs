//! # Byte Buffers
//!
//! Growable byte storage used for every frame the replication layer builds.
//!
//! ## Design
//!
//! - [`Buffer`] is plain owned storage with append and mid-buffer insert
//! - [`SharedBuffer`] wraps a buffer in a `parking_lot::Mutex` for
//!   producer/consumer hand-off between threads
//!
//! The lock is advisory in the sense that it protects the bytes only. Callers
//! that need a consistent view across several operations must hold the guard
//! for the whole critical section.

use parking_lot::{Mutex, MutexGuard};

/// Growable byte buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Creates an empty buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of bytes stored.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no bytes are stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the allocated capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Removes all bytes, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Resizes the buffer, zero-filling any new bytes.
    pub fn resize(&mut self, size: usize) {
        self.data.resize(size, 0);
    }

    /// Reserves room for at least `additional` more bytes.
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    /// Returns the stored bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the stored bytes mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Appends bytes at the end of the buffer.
    #[inline]
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Inserts bytes at `position`, shifting the tail.
    ///
    /// # Panics
    ///
    /// Panics if `position` is greater than the buffer length.
    pub fn insert(&mut self, position: usize, bytes: &[u8]) {
        assert!(
            position <= self.data.len(),
            "insert position {position} past buffer end {}",
            self.data.len()
        );
        if position == self.data.len() {
            self.data.extend_from_slice(bytes);
        } else {
            self.data.splice(position..position, bytes.iter().copied());
        }
    }

    /// Moves the bytes out, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    /// Consumes the buffer and returns its bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
        }
    }
}

/// A [`Buffer`] guarded by a lock.
///
/// Used for the engine's replication frame and for every peer's event log.
#[derive(Debug, Default)]
pub struct SharedBuffer {
    inner: Mutex<Buffer>,
}

impl SharedBuffer {
    /// Creates an empty shared buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty shared buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Buffer::with_capacity(capacity)),
        }
    }

    /// Acquires the lock. The buffer is unlocked when the guard drops.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.inner.lock()
    }

    /// Appends bytes under the lock.
    pub fn append(&self, bytes: &[u8]) {
        self.inner.lock().append(bytes);
    }

    /// Copies the current contents under the lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.inner.lock().as_slice().to_vec()
    }

    /// Drains the current contents under the lock.
    pub fn take(&self) -> Vec<u8> {
        self.inner.lock().take()
    }

    /// Returns the current length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_insert() {
        let mut buffer = Buffer::new();
        buffer.append(&[1, 2, 5]);
        buffer.insert(2, &[3, 4]);
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4, 5]);

        buffer.insert(5, &[6]);
        buffer.insert(0, &[0]);
        assert_eq!(buffer.as_slice(), &[0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    #[should_panic(expected = "past buffer end")]
    fn test_insert_past_end_panics() {
        let mut buffer = Buffer::new();
        buffer.insert(1, &[1]);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut buffer = Buffer::with_capacity(64);
        buffer.append(&[0xAA; 32]);
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= 64);
    }

    #[test]
    fn test_shared_buffer_take_drains() {
        let shared = SharedBuffer::new();
        shared.append(&[1, 2]);
        shared.append(&[3]);
        assert_eq!(shared.snapshot(), vec![1, 2, 3]);
        assert_eq!(shared.take(), vec![1, 2, 3]);
        assert!(shared.is_empty());
    }

    #[test]
    fn test_shared_buffer_across_threads() {
        let shared = std::sync::Arc::new(SharedBuffer::new());
        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let shared = std::sync::Arc::clone(&shared);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let mut guard = shared.lock();
                        guard.append(&[i, i]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let bytes = shared.snapshot();
        assert_eq!(bytes.len(), 800);
        // Pairs are never torn apart by a concurrent writer
        for pair in bytes.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }
}
