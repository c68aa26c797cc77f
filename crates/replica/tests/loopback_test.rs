//! Integration test for a full server/client session over the loopback link.

use std::sync::Arc;

use replica::loopback::{engine_from_config, LoopbackLink};
use replica::schemas::{
    HEIGHTMAP, HEIGHTMAP_SIZE_X, LANDSCAPE_ACTOR, LOCATION, MOB_ACTOR, TELEPORT, VELOCITY,
};
use replica_core::{Guid, Vec3};
use replica_networking::{Level, Logger, MemoryLogger, Mode, NetworkConfig, Role};

const SERVER_CONFIG: &str = r#"
mode = "server"
tick_rate = 30
player_class = "PawnActor"

[guid]
a = 1
b = 0
c = 0
d = 0
"#;

fn session() -> (LoopbackLink, Arc<MemoryLogger>) {
    let memory = Arc::new(MemoryLogger::new());
    let logger: Arc<dyn Logger> = memory.clone();

    let server_config = NetworkConfig::from_toml_str(SERVER_CONFIG).unwrap();
    assert_eq!(server_config.mode, Mode::Server);
    let client_config = NetworkConfig {
        guid: Guid::new(2, 0, 0, 0),
        mode: Mode::Client,
        ..server_config.clone()
    };

    let server = engine_from_config(server_config, Arc::clone(&logger)).unwrap();
    let client = engine_from_config(client_config, logger).unwrap();
    (LoopbackLink::new(server, client).unwrap(), memory)
}

#[test]
fn test_session_lifecycle() {
    let (mut link, log) = session();
    let dt = link.server().config().tick_interval();
    let player = link.client().guid();

    let landscape = Guid::new(10, 0, 0, 0);
    let mob = Guid::new(11, 0, 0, 0);
    {
        let server = link.server_mut();
        server.create_object_static(landscape, LANDSCAPE_ACTOR).unwrap();
        server.create_object_static(mob, MOB_ACTOR).unwrap();
        let terrain = server.object_mut(landscape).unwrap();
        terrain.set(HEIGHTMAP_SIZE_X, 2);
        terrain.set(HEIGHTMAP, vec![1, 2, 3, 4]);
        server.object_mut(mob).unwrap().set(VELOCITY, 2.5);
    }
    link.join().unwrap();

    let stats = link.step(dt).unwrap();
    assert_eq!(stats.server_objects, 3);
    assert_eq!(stats.client_objects, 3);

    let client = link.client();
    assert_eq!(client.object(player).unwrap().class_name(), "PawnActor");
    assert_eq!(
        client.object(player).unwrap().role(),
        Role::PROXY_REMOTE_AUTHORITY
    );
    assert_eq!(
        client.object(landscape).unwrap().get(HEIGHTMAP),
        Some(&vec![1, 2, 3, 4])
    );
    assert_eq!(client.object(mob).unwrap().get(VELOCITY), Some(&2.5));

    // Server-side change is visible after the next exchange
    link.server_mut()
        .object_mut(mob)
        .unwrap()
        .set(LOCATION, Vec3::new(0.0, 0.0, 9.0));
    link.step(dt).unwrap();
    assert_eq!(
        link.client().object(mob).unwrap().get(LOCATION),
        Some(&Vec3::new(0.0, 0.0, 9.0))
    );

    assert_eq!(log.count(Level::ERROR), 0);

    link.server_mut().player_quit_game(player).unwrap();
    let stats = link.step(dt).unwrap();
    assert_eq!(stats.client_objects, 2);
    assert!(link.client().object(player).is_none());
    // The client's last frame still carried the player, the server drops it
    assert!(log.contains(Level::ERROR, "not found"));

    link.close().unwrap();
}

#[test]
fn test_remote_call_on_pawn_is_ignored() {
    // PawnActor registers no Teleport, the call is dropped without error
    let (mut link, log) = session();
    let dt = link.server().config().tick_interval();
    let player = link.client().guid();
    link.join().unwrap();
    link.step(dt).unwrap();

    link.server()
        .call_remote(player, TELEPORT, &(Vec3::ONE,))
        .unwrap();
    link.step(dt).unwrap();

    assert!(log.contains(Level::DEBUG, "remote call Teleport"));
    assert_eq!(log.count(Level::ERROR), 0);
}

#[test]
fn test_client_cannot_spawn_players() {
    let (mut link, log) = session();
    let player = link.client().guid();
    assert!(link.client_mut().player_join_game(player).is_err());
    assert!(log.contains(Level::ERROR, "server only"));
}
