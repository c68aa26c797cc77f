//! # Replica Loopback
//!
//! Runs a server and a client in one process for a fixed number of ticks
//! and logs what each side sees.
//!
//! ```bash
//! replica_loopback                       # defaults, 300 ticks
//! replica_loopback server.toml 600       # server config, tick count
//! RUST_LOG=replica=debug replica_loopback
//! ```

use std::env;
use std::process;
use std::sync::Arc;

use replica::loopback::{engine_from_config, LoopbackError, LoopbackLink};
use replica::schemas::{
    DIRECTION, HEIGHTMAP, HEIGHTMAP_SIZE_X, HEIGHTMAP_SIZE_Y, LANDSCAPE_ACTOR, LOCATION,
    MOB_ACTOR, TELEPORT, TREE_ACTOR, TYPE, VELOCITY,
};
use replica_core::{Guid, Vec3};
use replica_networking::{Logger, Mode, NetworkConfig, TracingLogger};

const DEFAULT_TICKS: u64 = 300;
const MOBS: u32 = 8;
const TREES: u32 = 16;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if let Err(err) = run(&args) {
        tracing::error!("loopback failed: {err}");
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), LoopbackError> {
    let mut server_config = match args.get(1) {
        Some(path) => NetworkConfig::load(path)?,
        None => NetworkConfig::default(),
    };
    server_config.mode = Mode::Server;
    if server_config.guid.is_nil() {
        server_config.guid = Guid::new(1, 0, 0, 0);
    }
    let ticks = args
        .get(2)
        .and_then(|count| count.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    let client_config = NetworkConfig {
        guid: Guid::new(2, 0, 0, 0),
        mode: Mode::Client,
        ..server_config.clone()
    };
    let dt = server_config.tick_interval();

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
    let server = engine_from_config(server_config, Arc::clone(&logger))?;
    let client = engine_from_config(client_config, logger)?;
    let mut link = LoopbackLink::new(server, client)?;

    populate(&mut link)?;
    link.join()?;

    for tick in 0..ticks {
        move_mobs(&mut link, dt);
        if tick % 120 == 60 {
            // Remote calls never run locally, so apply it on the server too
            let player = link.client().guid();
            let target = Vec3::new(tick as f32, 0.0, 0.0);
            if let Some(object) = link.server_mut().object_mut(player) {
                object.call(TELEPORT, &(target,))?;
            }
            link.server().call_remote(player, TELEPORT, &(target,))?;
        }

        let stats = link.step(dt)?;
        if stats.step % 60 == 0 {
            tracing::info!(
                "step {}: sent {} B, received {} B, server {} objects, client {} objects",
                stats.step,
                stats.request_bytes,
                stats.response_bytes,
                stats.server_objects,
                stats.client_objects
            );
        }
    }

    let player = link.client().guid();
    if let Some(location) = link.client().object(player).and_then(|o| o.get(LOCATION)) {
        tracing::info!("player ended at {location:?}");
    }
    link.close()?;
    Ok(())
}

fn populate(link: &mut LoopbackLink) -> Result<(), LoopbackError> {
    let server = link.server_mut();

    let landscape = Guid::new(100, 0, 0, 0);
    server.create_object_static(landscape, LANDSCAPE_ACTOR)?;
    if let Some(object) = server.object_mut(landscape) {
        object.set(HEIGHTMAP_SIZE_X, 16);
        object.set(HEIGHTMAP_SIZE_Y, 16);
        object.set(HEIGHTMAP, (0..=255).collect());
    }

    for i in 0..TREES {
        let guid = Guid::new(200 + i, 0, 0, 0);
        server.create_object_static(guid, TREE_ACTOR)?;
        if let Some(object) = server.object_mut(guid) {
            object.set(LOCATION, Vec3::new(i as f32 * 4.0, 0.0, 10.0));
        }
    }

    for i in 0..MOBS {
        let guid = Guid::new(300 + i, 0, 0, 0);
        server.create_object_static(guid, MOB_ACTOR)?;
        if let Some(object) = server.object_mut(guid) {
            object.set(TYPE, "Wolf".to_string());
            object.set(VELOCITY, 1.0 + i as f32 * 0.5);
            object.set(DIRECTION, Vec3::new(1.0, 0.0, 0.0));
        }
    }
    Ok(())
}

fn move_mobs(link: &mut LoopbackLink, dt: f32) {
    for i in 0..MOBS {
        let Some(mob) = link.server_mut().object_mut(Guid::new(300 + i, 0, 0, 0)) else {
            continue;
        };
        let speed = mob.get(VELOCITY).copied().unwrap_or_default();
        let direction = mob.get(DIRECTION).copied().unwrap_or_default();
        if let Some(location) = mob.get_mut(LOCATION) {
            *location = *location + direction * (speed * dt);
        }
    }
}
