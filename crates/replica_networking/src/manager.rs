//! # Peer Manager
//!
//! Tracks connected remote engines, fans events out to their logs and
//! demultiplexes inbound command batches.
//!
//! ## Design
//!
//! - One `parking_lot::Mutex` guards the peer list; each operation holds it
//!   only for its own critical section
//! - Peers are `Arc`s, so handles outlive the list lock
//! - Hooks run after the list lock is released
//!
//! ```text
//! transport ──bytes──▶ process_response ──Command──▶ CommandHandler
//!                                          │
//!                       ◀──response bytes──┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use replica_core::{Buffer, Guid, InputStream, OutputStream};

use crate::command::Command;
use crate::error::{NetworkError, NetworkResult};
use crate::event::Event;
use crate::logging::{report, Logger};
use crate::peer::RemotePeer;

/// Overridable manager callbacks. Every method has a no-op default.
///
/// No manager lock is held while a hook runs, so a hook may call back into
/// its own manager.
pub trait ManagerHooks: Send + Sync {
    /// Called by [`Manager::init`]. Returning false fails initialization.
    fn on_init(&self) -> bool {
        true
    }

    /// Called by [`Manager::shutdown`].
    fn on_shutdown(&self) {}

    /// A new peer was added.
    fn on_remote_engine_connected(&self, _peer: &Arc<RemotePeer>) {}

    /// A peer was removed.
    fn on_remote_engine_disconnected(&self, _peer: &Arc<RemotePeer>) {}
}

impl ManagerHooks for () {}

/// Receives each command of a batch decoded by [`Manager::process_response`].
pub trait CommandHandler {
    /// Handles one command from `peer`, optionally writing a response.
    ///
    /// An error aborts the rest of the batch.
    fn handle_command(
        &mut self,
        peer: &Arc<RemotePeer>,
        command: Command,
        out: &mut OutputStream<'_>,
    ) -> NetworkResult<()>;
}

/// Registry of remote engines.
pub struct Manager {
    peers: Mutex<Vec<Arc<RemotePeer>>>,
    hooks: Box<dyn ManagerHooks>,
    logger: Arc<dyn Logger>,
    initialized: AtomicBool,
    events_frame_capacity: usize,
}

impl Manager {
    /// Creates a manager with no hooks.
    #[must_use]
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_hooks(Box::new(()), logger)
    }

    /// Creates a manager with custom hooks.
    #[must_use]
    pub fn with_hooks(hooks: Box<dyn ManagerHooks>, logger: Arc<dyn Logger>) -> Self {
        Self {
            peers: Mutex::new(Vec::new()),
            hooks,
            logger,
            initialized: AtomicBool::new(false),
            events_frame_capacity: 0,
        }
    }

    /// Sets the initial capacity of each new peer's event log.
    #[must_use]
    pub fn with_events_frame_capacity(mut self, capacity: usize) -> Self {
        self.events_frame_capacity = capacity;
        self
    }

    /// Runs the init hook.
    pub fn init(&self) -> NetworkResult<()> {
        if !self.hooks.on_init() {
            report!(self.logger, ERROR, "manager initialization hook failed");
            return Err(NetworkError::InitFailed("manager hook"));
        }
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    /// Runs the shutdown hook and forgets every peer without firing
    /// disconnect hooks.
    pub fn shutdown(&self) {
        self.hooks.on_shutdown();
        self.peers.lock().clear();
        self.initialized.store(false, Ordering::Release);
    }

    /// Returns true between `init` and `shutdown`.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Registers a peer on first contact. Calling again with the same
    /// identifier returns the existing peer and fires no hook.
    pub fn remote_engine_connected(&self, guid: Guid) -> Arc<RemotePeer> {
        let peer = {
            let mut peers = self.peers.lock();
            if let Some(existing) = peers.iter().find(|peer| peer.guid() == guid) {
                return Arc::clone(existing);
            }
            let peer = Arc::new(RemotePeer::with_capacity(guid, self.events_frame_capacity));
            peers.push(Arc::clone(&peer));
            peer
        };

        report!(self.logger, INFO, "remote engine {guid} connected");
        self.hooks.on_remote_engine_connected(&peer);
        peer
    }

    /// Removes a peer. Returns false if it was not connected.
    pub fn remote_engine_disconnected(&self, guid: Guid) -> bool {
        let removed = {
            let mut peers = self.peers.lock();
            let index = peers.iter().position(|peer| peer.guid() == guid);
            index.map(|index| peers.remove(index))
        };

        match removed {
            Some(peer) => {
                report!(self.logger, INFO, "remote engine {guid} disconnected");
                self.hooks.on_remote_engine_disconnected(&peer);
                true
            }
            None => false,
        }
    }

    /// Looks up a peer.
    #[must_use]
    pub fn find_remote_engine(&self, guid: Guid) -> Option<Arc<RemotePeer>> {
        self.peers
            .lock()
            .iter()
            .find(|peer| peer.guid() == guid)
            .cloned()
    }

    /// Snapshot of the peer list.
    #[must_use]
    pub fn remote_engines(&self) -> Vec<Arc<RemotePeer>> {
        self.peers.lock().clone()
    }

    /// Number of connected peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.lock().len()
    }

    /// Appends one copy of `event` to every peer's log, in list order.
    pub fn broadcast_event(&self, event: &Event) -> NetworkResult<()> {
        let mut encoded = Buffer::new();
        if let Err(err) = event.serialize(&mut OutputStream::new(&mut encoded)) {
            report!(self.logger, ERROR, "failed to encode {:?} event: {err}", event.event_type());
            return Err(err.into());
        }

        let peers = self.peers.lock();
        for peer in peers.iter() {
            peer.push_encoded(encoded.as_slice());
        }
        Ok(())
    }

    /// Decodes a command batch from `peer` and hands each command to
    /// `handler`. Returns the bytes the handler wrote.
    ///
    /// An unknown peer is refused before anything is decoded. An unknown
    /// command tag aborts the batch; commands before it have already run.
    pub fn process_response(
        &self,
        peer: Guid,
        input: &[u8],
        handler: &mut dyn CommandHandler,
    ) -> NetworkResult<Buffer> {
        let Some(remote) = self.find_remote_engine(peer) else {
            report!(self.logger, ERROR, "access denied: command batch from unknown peer {peer}");
            return Err(NetworkError::UnknownPeer(peer));
        };

        let mut output = Buffer::new();
        let mut out = OutputStream::new(&mut output);
        let mut input = InputStream::new(input);
        while !input.is_eof() {
            let command = match Command::deserialize(&mut input) {
                Ok(command) => command,
                Err(err) => {
                    report!(self.logger, ERROR, "command batch from {peer} aborted: {err}");
                    return Err(err);
                }
            };
            let command_type = command.command_type();
            if let Err(err) = handler.handle_command(&remote, command, &mut out) {
                report!(
                    self.logger,
                    ERROR,
                    "command {command_type:?} from {peer} failed, batch aborted: {err}"
                );
                return Err(err);
            }
        }
        Ok(output)
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("peers", &self.peer_count())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
