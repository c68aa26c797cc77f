//! Benchmark for replication frame building and application.
//!
//! Run with: cargo bench --package replica_networking --bench replication_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use replica_core::{Guid, Vec3};
use replica_networking::{
    ClassRegistry, Engine, Event, Manager, MemoryLogger, Mode, Object, PropertyKey, Role,
};

const OBJECTS: u32 = 500;

const LOCATION: PropertyKey<Vec3> = PropertyKey::new("Location");
const HEALTH: PropertyKey<u32> = PropertyKey::new("Health");
const NAME: PropertyKey<String> = PropertyKey::new("Name");

fn mob(guid: Guid, role: Role) -> Object {
    let mut object = Object::new("Mob", guid, role);
    object.register_property(LOCATION, Vec3::ZERO);
    object.register_property(HEALTH, 100);
    object.register_property(NAME, "Mob".to_string());
    object
}

fn engine(guid: Guid, mode: Mode) -> Engine {
    let classes = ClassRegistry::new();
    classes.register_class("Mob", mob);
    let logger = Arc::new(MemoryLogger::new());
    let manager = Arc::new(Manager::new(logger.clone()));
    let mut engine = Engine::new(guid, manager, Arc::new(classes), logger);
    engine.init(mode).unwrap();
    engine
}

fn populated_server() -> Engine {
    let mut server = engine(Guid::new(1, 0, 0, 0), Mode::Server);
    for i in 0..OBJECTS {
        let guid = Guid::new(i + 100, 0, 0, 0);
        server.create_object_static(guid, "Mob").unwrap();
        server
            .object_mut(guid)
            .unwrap()
            .set(LOCATION, Vec3::new(i as f32, 0.0, 1.0));
    }
    server
}

fn benchmark_tick(c: &mut Criterion) {
    let mut server = populated_server();

    c.bench_function("tick_500_objects", |b| {
        b.iter(|| {
            server.tick(black_box(1.0 / 60.0)).unwrap();
            black_box(server.replication_frame().len())
        });
    });
}

fn benchmark_replicate(c: &mut Criterion) {
    let mut server = populated_server();
    server.tick(1.0 / 60.0).unwrap();
    let frame = server.replication_frame().snapshot();

    // Objects already exist, so every iteration is a pure update
    let mut client = engine(Guid::new(2, 0, 0, 0), Mode::Client);
    client.replicate(&frame).unwrap();

    c.bench_function("replicate_500_objects", |b| {
        b.iter(|| client.replicate(black_box(&frame)).unwrap());
    });
}

fn benchmark_broadcast(c: &mut Criterion) {
    let server = engine(Guid::new(1, 0, 0, 0), Mode::Server);
    let peers: Vec<_> = (0..32)
        .map(|i| server.manager().remote_engine_connected(Guid::new(i + 10, 0, 0, 0)))
        .collect();
    let event = Event::RemoveObject {
        guid: Guid::new(100, 0, 0, 0),
    };

    c.bench_function("broadcast_event_32_peers", |b| {
        b.iter(|| {
            server.manager().broadcast_event(black_box(&event)).unwrap();
            for peer in &peers {
                black_box(peer.take_events());
            }
        });
    });
}

criterion_group!(
    benches,
    benchmark_tick,
    benchmark_replicate,
    benchmark_broadcast
);
criterion_main!(benches);
