//! # Replication Engine
//!
//! Owns the live object set of one side of a connection, rebuilds its
//! replication frame every tick and applies frames and event logs coming
//! from peers.
//!
//! ## Replication Frame
//!
//! ```text
//! repeated per object whose role carries Authority or RemoteAuthority:
//!   identifier          16 bytes
//!   class name          string
//!   object data size    u32 (= N)
//!   object data         N bytes, the object's property block
//! ```
//!
//! ## Roles
//!
//! | spawn | mode | owner is this engine | role |
//! |---|---|---|---|
//! | dynamic | client | yes | Proxy, RemoteAuthority |
//! | dynamic | client | no | Proxy, RemoteProxy |
//! | dynamic | server | yes | Authority, RemoteProxy |
//! | dynamic | server | no | Authority, RemoteAuthority |
//! | static | client | - | Proxy, RemoteProxy |
//! | static | server | - | Authority, RemoteProxy |
//!
//! A server only accepts object updates for objects whose role carries
//! RemoteAuthority, i.e. objects it delegated to a client.

use std::sync::Arc;

use replica_core::{
    Buffer, Decode, Encode, Guid, InputStream, OutputStream, SharedBuffer, StreamResult,
};

use crate::class_registry::ClassRegistry;
use crate::command::Command;
use crate::config::{Mode, NetworkConfig};
use crate::error::{NetworkError, NetworkResult};
use crate::event::Event;
use crate::function::{FunctionKey, Params};
use crate::logging::{report, Logger};
use crate::manager::{CommandHandler, Manager};
use crate::object::Object;
use crate::peer::RemotePeer;
use crate::role::Role;

/// Overridable engine callbacks. Every method has a no-op default.
pub trait EngineHooks: Send {
    /// Called by [`Engine::init`] before the manager starts. Returning
    /// false fails initialization.
    fn on_init(&mut self, _mode: Mode) -> bool {
        true
    }

    /// Called by [`Engine::shutdown`] before objects are cleared.
    fn on_shutdown(&mut self) {}

    /// Called after each tick's replication frame is built.
    fn on_tick(&mut self, _objects: &mut [Object], _dt: f32) {}

    /// A dynamic spawn (or an implicit spawn from a snapshot) completed.
    fn on_object_created(&mut self, _object: &Object) {}

    /// A dynamic removal completed.
    fn on_object_removed(&mut self, _object: &Object) {}
}

impl EngineHooks for () {}

/// Role given to an object spawned at runtime for `owner`.
#[must_use]
pub const fn dynamic_role(mode: Mode, owned_by_self: bool) -> Role {
    match mode {
        Mode::Client => Role::new(false, owned_by_self),
        Mode::Server => Role::new(true, !owned_by_self),
    }
}

/// Role given to a statically spawned object.
#[must_use]
pub const fn static_role(mode: Mode) -> Role {
    match mode {
        Mode::Client => Role::PROXY_REMOTE_PROXY,
        Mode::Server => Role::AUTHORITY_REMOTE_PROXY,
    }
}

/// One side of a replicated world.
pub struct Engine {
    guid: Guid,
    mode: Mode,
    initialized: bool,
    config: NetworkConfig,
    objects: Vec<Object>,
    replication_frame: SharedBuffer,
    manager: Arc<Manager>,
    classes: Arc<ClassRegistry>,
    hooks: Box<dyn EngineHooks>,
    logger: Arc<dyn Logger>,
}

impl Engine {
    /// Creates an uninitialized engine with default settings.
    #[must_use]
    pub fn new(
        guid: Guid,
        manager: Arc<Manager>,
        classes: Arc<ClassRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let config = NetworkConfig {
            guid,
            ..NetworkConfig::default()
        };
        Self::from_config(config, manager, classes, Box::new(()), logger)
    }

    /// Creates an uninitialized engine from a configuration.
    #[must_use]
    pub fn from_config(
        config: NetworkConfig,
        manager: Arc<Manager>,
        classes: Arc<ClassRegistry>,
        hooks: Box<dyn EngineHooks>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            guid: config.guid,
            mode: config.mode,
            initialized: false,
            replication_frame: SharedBuffer::with_capacity(config.replication_frame_capacity),
            config,
            objects: Vec::new(),
            manager,
            classes,
            hooks,
            logger,
        }
    }

    /// Replaces the hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Box<dyn EngineHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Engine identifier.
    #[inline]
    #[must_use]
    pub fn guid(&self) -> Guid {
        self.guid
    }

    /// Current mode. Meaningful once initialized.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns true between a successful `init` and `shutdown`.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Configuration the engine was built from.
    #[must_use]
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// The attached manager.
    #[must_use]
    pub fn manager(&self) -> &Arc<Manager> {
        &self.manager
    }

    /// The class factory spawns resolve through.
    #[must_use]
    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    /// The frame built by the last tick. Lock it for a consistent read.
    #[must_use]
    pub fn replication_frame(&self) -> &SharedBuffer {
        &self.replication_frame
    }

    /// Live objects in spawn order.
    #[must_use]
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Looks up an object.
    #[must_use]
    pub fn object(&self, guid: Guid) -> Option<&Object> {
        self.objects.iter().find(|object| object.guid() == guid)
    }

    /// Looks up an object mutably.
    pub fn object_mut(&mut self, guid: Guid) -> Option<&mut Object> {
        self.objects.iter_mut().find(|object| object.guid() == guid)
    }

    /// Starts the engine in `mode`, then its manager.
    pub fn init(&mut self, mode: Mode) -> NetworkResult<()> {
        if self.initialized {
            report!(self.logger, WARN, "engine {} already initialized", self.guid);
            return Err(NetworkError::AlreadyInitialized);
        }

        self.mode = mode;
        if !self.hooks.on_init(mode) {
            report!(self.logger, ERROR, "engine {} initialization hook failed", self.guid);
            return Err(NetworkError::InitFailed("engine hook"));
        }
        self.manager.init()?;

        self.initialized = true;
        report!(self.logger, INFO, "engine {} initialized as {mode}", self.guid);
        Ok(())
    }

    /// Stops the engine. Objects are dropped without removal events.
    pub fn shutdown(&mut self) -> NetworkResult<()> {
        self.check_initialized("shutdown")?;

        self.hooks.on_shutdown();
        self.objects.clear();
        self.replication_frame.lock().clear();
        self.manager.shutdown();
        self.initialized = false;
        report!(self.logger, INFO, "engine {} shut down", self.guid);
        Ok(())
    }

    /// Rebuilds the replication frame, then runs the tick hook.
    ///
    /// If an object fails to serialize, the frame keeps the entries before
    /// it and the hook does not run.
    pub fn tick(&mut self, dt: f32) -> NetworkResult<()> {
        self.check_initialized("tick")?;

        {
            let mut frame = self.replication_frame.lock();
            frame.clear();
            for object in self.objects.iter().filter(|o| o.role().is_replicated()) {
                let start = frame.len();
                let written = write_object_entry(object, &mut OutputStream::new(&mut frame));
                if let Err(err) = written {
                    frame.resize(start);
                    report!(
                        self.logger,
                        ERROR,
                        "failed to serialize {} {}: {err}",
                        object.class_name(),
                        object.guid()
                    );
                    return Err(err.into());
                }
            }
        }

        self.hooks.on_tick(&mut self.objects, dt);
        Ok(())
    }

    /// Applies a replication frame received from a peer.
    ///
    /// Per-object problems are logged and the object is skipped by length.
    /// A malformed entry header aborts the frame.
    pub fn replicate(&mut self, frame: &[u8]) -> NetworkResult<()> {
        self.check_initialized("replicate")?;

        let mut input = InputStream::new(frame);
        while !input.is_eof() {
            let (guid, class_name, data) = match read_object_entry(&mut input) {
                Ok(entry) => entry,
                Err(err) => {
                    report!(self.logger, ERROR, "replication frame aborted: {err}");
                    return Err(err.into());
                }
            };
            self.apply_object_entry(guid, &class_name, data);
        }
        Ok(())
    }

    fn apply_object_entry(&mut self, guid: Guid, class_name: &str, data: &[u8]) {
        let Some(index) = self.objects.iter().position(|o| o.guid() == guid) else {
            match self.mode {
                Mode::Server => {
                    report!(self.logger, ERROR, "replicate: object {guid} ({class_name}) not found");
                }
                Mode::Client => self.spawn_from_snapshot(guid, class_name, data),
            }
            return;
        };

        let object = &mut self.objects[index];
        if object.class_name() != class_name {
            let mismatch = NetworkError::ClassNameMismatch {
                guid,
                local: object.class_name().to_owned(),
                remote: class_name.to_owned(),
            };
            report!(self.logger, WARN, "replicate: {mismatch}");
            return;
        }
        if self.mode == Mode::Server && !object.role().has_remote_authority() {
            report!(
                self.logger,
                DEBUG,
                "replicate: update for {guid} ignored, no remote authority"
            );
            return;
        }
        if let Err(err) = object.deserialize(&mut InputStream::new(data), &*self.logger) {
            report!(self.logger, WARN, "replicate: property block for {guid} unreadable: {err}");
        }
    }

    // A snapshot can introduce an object before its create event arrives.
    fn spawn_from_snapshot(&mut self, guid: Guid, class_name: &str, data: &[u8]) {
        let Ok(index) = self.spawn(guid, class_name, static_role(self.mode)) else {
            return;
        };
        let object = &mut self.objects[index];
        if let Err(err) = object.deserialize(&mut InputStream::new(data), &*self.logger) {
            report!(self.logger, WARN, "replicate: property block for {guid} unreadable: {err}");
        }
        self.hooks.on_object_created(&self.objects[index]);
    }

    /// Applies an event log received from a peer.
    ///
    /// An unknown event tag aborts the rest of the log.
    pub fn replicate_events(&mut self, log: &[u8]) -> NetworkResult<()> {
        self.check_initialized("replicate_events")?;

        let mut input = InputStream::new(log);
        while !input.is_eof() {
            let event = match Event::deserialize(&mut input) {
                Ok(event) => event,
                Err(err) => {
                    report!(self.logger, ERROR, "event log aborted: {err}");
                    return Err(err);
                }
            };
            self.apply_event(event);
        }
        Ok(())
    }

    fn apply_event(&mut self, event: Event) {
        match event {
            Event::CreateObject {
                guid,
                owner,
                class_name,
            } => {
                if self.mode == Mode::Server {
                    report!(self.logger, ERROR, "access denied: peer requested CreateObject {guid}");
                    return;
                }
                // Failures are logged inside
                let _ = self.create_object_dynamic(guid, owner, &class_name);
            }
            Event::RemoveObject { guid } => {
                if self.mode == Mode::Server {
                    report!(self.logger, ERROR, "access denied: peer requested RemoveObject {guid}");
                    return;
                }
                let _ = self.remove_object_dynamic(guid);
            }
            Event::ExecFunctionRemote {
                guid,
                function,
                params,
            } => {
                let result = match self.object_mut(guid) {
                    Some(object) => object.exec_function(&function, &params),
                    None => Err(NetworkError::ObjectNotFound(guid)),
                };
                if let Err(err) = result {
                    report!(self.logger, DEBUG, "remote call {function} on {guid} ignored: {err}");
                }
            }
        }
    }

    /// Spawns an object with the fixed static role for this mode. A server
    /// also tells every peer.
    pub fn create_object_static(&mut self, guid: Guid, class_name: &str) -> NetworkResult<()> {
        self.check_initialized("create_object_static")?;

        self.spawn(guid, class_name, static_role(self.mode))?;
        if self.mode == Mode::Server {
            self.broadcast(&Event::CreateObject {
                guid,
                owner: self.guid,
                class_name: class_name.to_owned(),
            })?;
        }
        Ok(())
    }

    /// Erases an object. A server also tells every peer.
    pub fn remove_object_static(&mut self, guid: Guid) -> NetworkResult<()> {
        self.check_initialized("remove_object_static")?;

        self.take_object(guid)?;
        if self.mode == Mode::Server {
            self.broadcast(&Event::RemoveObject { guid })?;
        }
        Ok(())
    }

    /// Spawns an object owned by `owner`. The role is derived from the
    /// mode and ownership, never chosen by the caller.
    pub fn create_object_dynamic(
        &mut self,
        guid: Guid,
        owner: Guid,
        class_name: &str,
    ) -> NetworkResult<()> {
        self.check_initialized("create_object_dynamic")?;

        let role = dynamic_role(self.mode, owner == self.guid);
        let index = self.spawn(guid, class_name, role)?;
        self.hooks.on_object_created(&self.objects[index]);
        if self.mode == Mode::Server {
            self.broadcast(&Event::CreateObject {
                guid,
                owner,
                class_name: class_name.to_owned(),
            })?;
        }
        Ok(())
    }

    /// Removes an object and fires the removed hook. A server also tells
    /// every peer.
    pub fn remove_object_dynamic(&mut self, guid: Guid) -> NetworkResult<()> {
        self.check_initialized("remove_object_dynamic")?;

        let object = self.take_object(guid)?;
        self.hooks.on_object_removed(&object);
        if self.mode == Mode::Server {
            self.broadcast(&Event::RemoveObject { guid })?;
        }
        Ok(())
    }

    /// Asks every peer to run `function` on its copy of `guid`. Does not
    /// run it locally.
    pub fn exec_function_remote(
        &self,
        guid: Guid,
        function: &str,
        params: &[u8],
    ) -> NetworkResult<()> {
        self.check_initialized("exec_function_remote")?;

        self.broadcast(&Event::ExecFunctionRemote {
            guid,
            function: function.to_owned(),
            params: params.to_vec(),
        })
    }

    /// Typed form of [`Engine::exec_function_remote`].
    pub fn call_remote<P: Params>(
        &self,
        guid: Guid,
        key: FunctionKey<P>,
        params: &P,
    ) -> NetworkResult<()> {
        let bytes = key.pack(params)?;
        self.exec_function_remote(guid, key.name(), &bytes)
    }

    /// Spawns the configured player class for `player`, owned by that
    /// player. Server only.
    pub fn player_join_game(&mut self, player: Guid) -> NetworkResult<()> {
        self.check_initialized("player_join_game")?;
        self.require_server("player_join_game")?;

        let class_name = self.config.player_class.clone();
        self.create_object_dynamic(player, player, &class_name)?;
        report!(self.logger, INFO, "player {player} joined");
        Ok(())
    }

    /// Removes `player`'s object. Server only.
    pub fn player_quit_game(&mut self, player: Guid) -> NetworkResult<()> {
        self.check_initialized("player_quit_game")?;
        self.require_server("player_quit_game")?;

        self.remove_object_dynamic(player)?;
        report!(self.logger, INFO, "player {player} quit");
        Ok(())
    }

    /// Runs a command batch from `peer` with this engine as the handler.
    pub fn process_response(&mut self, peer: Guid, input: &[u8]) -> NetworkResult<Buffer> {
        self.check_initialized("process_response")?;

        let manager = Arc::clone(&self.manager);
        manager.process_response(peer, input, self)
    }

    fn check_initialized(&self, context: &'static str) -> NetworkResult<()> {
        if self.initialized {
            return Ok(());
        }
        report!(self.logger, ERROR, "engine not initialized ({context})");
        Err(NetworkError::NotInitialized { context })
    }

    fn require_server(&self, context: &'static str) -> NetworkResult<()> {
        if self.mode == Mode::Server {
            return Ok(());
        }
        report!(self.logger, ERROR, "access denied: {context} is server only");
        Err(NetworkError::PermissionDenied(context))
    }

    fn spawn(&mut self, guid: Guid, class_name: &str, role: Role) -> NetworkResult<usize> {
        if self.object(guid).is_some() {
            report!(self.logger, ERROR, "spawn: object {guid} already exists");
            return Err(NetworkError::ObjectAlreadyExists(guid));
        }
        let Some(object) = self.classes.construct(class_name, guid, role) else {
            report!(self.logger, ERROR, "spawn: class {class_name} not found");
            return Err(NetworkError::ClassNotFound(class_name.to_owned()));
        };

        report!(self.logger, DEBUG, "spawned {class_name} {guid} as {role:?}");
        self.objects.push(object);
        Ok(self.objects.len() - 1)
    }

    fn take_object(&mut self, guid: Guid) -> NetworkResult<Object> {
        let Some(index) = self.objects.iter().position(|o| o.guid() == guid) else {
            report!(self.logger, ERROR, "remove: object {guid} not found");
            return Err(NetworkError::ObjectNotFound(guid));
        };
        let object = self.objects.remove(index);
        report!(self.logger, DEBUG, "removed {} {guid}", object.class_name());
        Ok(object)
    }

    fn broadcast(&self, event: &Event) -> NetworkResult<()> {
        self.manager.broadcast_event(event)
    }
}

impl CommandHandler for Engine {
    fn handle_command(
        &mut self,
        peer: &Arc<RemotePeer>,
        command: Command,
        out: &mut OutputStream<'_>,
    ) -> NetworkResult<()> {
        match command {
            Command::Ping => Command::Pong.serialize(out)?,
            Command::Pong => report!(self.logger, DEBUG, "pong from {}", peer.guid()),
            Command::EventsFrameRequest => {
                Command::EventsFrameReceive(peer.take_events()).serialize(out)?;
            }
            Command::EventsFrameReceive(log) => self.replicate_events(&log)?,
            Command::ReplicationFrameRequest => {
                Command::ReplicationFrameReceive(self.replication_frame.snapshot())
                    .serialize(out)?;
            }
            Command::ReplicationFrameReceive(frame) => self.replicate(&frame)?,
        }
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("guid", &self.guid)
            .field("mode", &self.mode)
            .field("initialized", &self.initialized)
            .field("objects", &self.objects.len())
            .finish_non_exhaustive()
    }
}

fn write_object_entry(object: &Object, out: &mut OutputStream<'_>) -> StreamResult<()> {
    object.guid().encode(out)?;
    object.class_name().encode(out)?;
    out.write_size_prefixed(|out| object.serialize(out))
}

fn read_object_entry<'a>(input: &mut InputStream<'a>) -> StreamResult<(Guid, String, &'a [u8])> {
    let guid = Guid::decode(input)?;
    let class_name = String::decode(input)?;
    let size = u32::decode(input)? as usize;
    Ok((guid, class_name, input.read(size)?))
}
