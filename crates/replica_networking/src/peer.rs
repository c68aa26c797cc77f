//! # Remote Peers
//!
//! A remote peer is an identifier plus the log of events queued for it.
//!
//! ## Design
//!
//! - Peers are handed out as `Arc<RemotePeer>`, so a handle stays valid
//!   after the manager's peer-list lock is released
//! - The event log has its own lock, independent of the peer list

use replica_core::{Guid, SharedBuffer};

/// A connected remote engine.
#[derive(Debug)]
pub struct RemotePeer {
    guid: Guid,
    events: SharedBuffer,
}

impl RemotePeer {
    /// Creates a peer with an empty event log.
    #[must_use]
    pub fn new(guid: Guid) -> Self {
        Self::with_capacity(guid, 0)
    }

    /// Creates a peer whose event log starts with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(guid: Guid, capacity: usize) -> Self {
        Self {
            guid,
            events: SharedBuffer::with_capacity(capacity),
        }
    }

    /// Peer identifier.
    #[inline]
    #[must_use]
    pub fn guid(&self) -> Guid {
        self.guid
    }

    /// Appends already encoded events in one locked append.
    pub fn push_encoded(&self, bytes: &[u8]) {
        self.events.append(bytes);
    }

    /// The event log. Lock it to read a consistent view.
    #[must_use]
    pub fn events(&self) -> &SharedBuffer {
        &self.events
    }

    /// Drains the event log, returning everything queued so far.
    pub fn take_events(&self) -> Vec<u8> {
        self.events.take()
    }
}
