//! # Loopback Link
//!
//! Runs a server engine and a client engine in one process and moves
//! command batches between them directly, standing in for a transport.
//!
//! ```text
//! step(dt):
//! 1. server.tick, client.tick          rebuild both replication frames
//! 2. client -> server                  Ping, EventsFrameRequest,
//!                                      ReplicationFrameRequest,
//!                                      ReplicationFrameReceive{client frame}
//! 3. server -> client                  Pong, EventsFrameReceive{log},
//!                                      ReplicationFrameReceive{server frame}
//! ```

use std::sync::Arc;

use replica_core::{Buffer, OutputStream};
use replica_networking::{
    ClassRegistry, Command, ConfigError, Engine, Logger, Manager, Mode, NetworkConfig,
    NetworkError, NetworkResult,
};
use thiserror::Error;

use crate::schemas::register_classes;

/// Failure while setting up or running a loopback session.
#[derive(Error, Debug)]
pub enum LoopbackError {
    /// Configuration could not be loaded.
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    /// An engine operation failed.
    #[error("network: {0}")]
    Network(#[from] NetworkError),
    /// Both ends were configured with the same mode.
    #[error("expected a server and a client, got two {0} engines")]
    ModeMismatch(Mode),
}

/// Byte counts for one [`LoopbackLink::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Step number, starting at 1.
    pub step: u64,
    /// Bytes the client sent.
    pub request_bytes: usize,
    /// Bytes the server answered with.
    pub response_bytes: usize,
    /// Live objects on the server after the step.
    pub server_objects: usize,
    /// Live objects on the client after the step.
    pub client_objects: usize,
}

/// Builds and initializes an engine with every sample class registered.
pub fn engine_from_config(
    config: NetworkConfig,
    logger: Arc<dyn Logger>,
) -> NetworkResult<Engine> {
    let classes = ClassRegistry::new();
    register_classes(&classes);
    let manager = Manager::new(Arc::clone(&logger))
        .with_events_frame_capacity(config.events_frame_capacity);

    let mode = config.mode;
    let mut engine = Engine::from_config(
        config,
        Arc::new(manager),
        Arc::new(classes),
        Box::new(()),
        logger,
    );
    engine.init(mode)?;
    Ok(engine)
}

/// An in-process server/client pair.
#[derive(Debug)]
pub struct LoopbackLink {
    server: Engine,
    client: Engine,
    steps: u64,
}

impl LoopbackLink {
    /// Connects two initialized engines, one per mode.
    pub fn new(server: Engine, client: Engine) -> Result<Self, LoopbackError> {
        if server.mode() != Mode::Server || client.mode() != Mode::Client {
            return Err(LoopbackError::ModeMismatch(server.mode()));
        }

        server.manager().remote_engine_connected(client.guid());
        client.manager().remote_engine_connected(server.guid());
        Ok(Self {
            server,
            client,
            steps: 0,
        })
    }

    /// The server end.
    #[must_use]
    pub fn server(&self) -> &Engine {
        &self.server
    }

    /// The server end, mutably.
    pub fn server_mut(&mut self) -> &mut Engine {
        &mut self.server
    }

    /// The client end.
    #[must_use]
    pub fn client(&self) -> &Engine {
        &self.client
    }

    /// The client end, mutably.
    pub fn client_mut(&mut self) -> &mut Engine {
        &mut self.client
    }

    /// Spawns the client's player object on the server.
    pub fn join(&mut self) -> NetworkResult<()> {
        let player = self.client.guid();
        self.server.player_join_game(player)
    }

    /// Ticks both engines and runs one request/response exchange.
    pub fn step(&mut self, dt: f32) -> NetworkResult<StepStats> {
        self.server.tick(dt)?;
        self.client.tick(dt)?;

        let request = self.client_request()?;
        let response = self
            .server
            .process_response(self.client.guid(), request.as_slice())?;
        self.client
            .process_response(self.server.guid(), response.as_slice())?;

        self.steps += 1;
        Ok(StepStats {
            step: self.steps,
            request_bytes: request.len(),
            response_bytes: response.len(),
            server_objects: self.server.objects().len(),
            client_objects: self.client.objects().len(),
        })
    }

    /// Disconnects the pair and shuts both engines down.
    pub fn close(mut self) -> NetworkResult<()> {
        self.server
            .manager()
            .remote_engine_disconnected(self.client.guid());
        self.client
            .manager()
            .remote_engine_disconnected(self.server.guid());
        self.client.shutdown()?;
        self.server.shutdown()
    }

    fn client_request(&self) -> NetworkResult<Buffer> {
        let frame = self.client.replication_frame().snapshot();
        let mut request = Buffer::new();
        let mut out = OutputStream::new(&mut request);
        for command in [
            Command::Ping,
            Command::EventsFrameRequest,
            Command::ReplicationFrameRequest,
            Command::ReplicationFrameReceive(frame),
        ] {
            command.serialize(&mut out)?;
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{CHARACTER_ACTOR, LOCATION, TREE_ACTOR};
    use replica_core::{Guid, Vec3};
    use replica_networking::{MemoryLogger, Role};

    const SERVER: Guid = Guid::new(1, 0, 0, 0);
    const CLIENT: Guid = Guid::new(2, 0, 0, 0);

    fn link() -> LoopbackLink {
        let logger: Arc<dyn Logger> = Arc::new(MemoryLogger::new());
        let server = engine_from_config(
            NetworkConfig {
                guid: SERVER,
                mode: Mode::Server,
                ..NetworkConfig::default()
            },
            Arc::clone(&logger),
        )
        .unwrap();
        let client = engine_from_config(
            NetworkConfig {
                guid: CLIENT,
                ..NetworkConfig::default()
            },
            logger,
        )
        .unwrap();
        LoopbackLink::new(server, client).unwrap()
    }

    #[test]
    fn test_modes_checked() {
        let logger: Arc<dyn Logger> = Arc::new(MemoryLogger::new());
        let a = engine_from_config(NetworkConfig::default(), Arc::clone(&logger)).unwrap();
        let b = engine_from_config(NetworkConfig::default(), logger).unwrap();
        assert!(matches!(
            LoopbackLink::new(a, b),
            Err(LoopbackError::ModeMismatch(Mode::Client))
        ));
    }

    #[test]
    fn test_step_delivers_world() {
        let mut link = link();
        let tree = Guid::new(50, 0, 0, 0);
        link.server_mut().create_object_static(tree, TREE_ACTOR).unwrap();

        let stats = link.step(1.0 / 60.0).unwrap();
        assert_eq!(stats.step, 1);
        assert_eq!(stats.client_objects, 1);
        assert!(stats.response_bytes > stats.request_bytes);
        assert_eq!(link.client().object(tree).unwrap().role(), Role::PROXY_REMOTE_PROXY);
    }

    #[test]
    fn test_player_moves_reach_server() {
        let mut link = link();
        link.join().unwrap();
        link.step(1.0 / 60.0).unwrap();

        let player = link.client_mut().object_mut(CLIENT).unwrap();
        assert_eq!(player.class_name(), CHARACTER_ACTOR);
        assert_eq!(player.role(), Role::PROXY_REMOTE_AUTHORITY);
        player.set(LOCATION, Vec3::new(4.0, 0.0, 4.0));

        // One step to build the client frame, the server applies it in the same exchange
        link.step(1.0 / 60.0).unwrap();
        assert_eq!(
            link.server().object(CLIENT).unwrap().get(LOCATION),
            Some(&Vec3::new(4.0, 0.0, 4.0))
        );
    }

    #[test]
    fn test_close_shuts_down_both() {
        let link = link();
        link.close().unwrap();
    }
}
