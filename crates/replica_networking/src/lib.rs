//! # Replica Networking
//!
//! Object replication between one server and its clients. Transport
//! agnostic: the crate produces and consumes byte buffers and leaves moving
//! them to the embedder.
//!
//! ## Architecture
//!
//! - **Objects**: identified instances of a registered class carrying named
//!   [`Property`] values and callable [`Function`]s
//! - **Engine**: owns the object set, builds a replication frame every tick
//!   and applies frames and event logs received from peers
//! - **Manager**: tracks remote peers, fans events out into per-peer logs
//!   and demultiplexes command batches into a [`CommandHandler`]
//!
//! ## Authority Model
//!
//! ```text
//! SERVER                                CLIENT
//!   | owns everything it spawned          |
//!   |--- CreateObject / RemoveObject ---->|  events: server -> client only
//!   |--- replication frame -------------->|
//!   |<-- replication frame ---------------|  only objects the server
//!   |                                     |  delegated to this client
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use replica_core::Guid;
//! use replica_networking::{
//!     ClassRegistry, Engine, Manager, Mode, Object, PropertyKey, Role, TracingLogger,
//! };
//!
//! const HEALTH: PropertyKey<u32> = PropertyKey::new("Health");
//!
//! fn monster(guid: Guid, role: Role) -> Object {
//!     let mut object = Object::new("Monster", guid, role);
//!     object.register_property(HEALTH, 100);
//!     object
//! }
//!
//! let classes = Arc::new(ClassRegistry::new());
//! classes.register_class("Monster", monster);
//!
//! let logger = Arc::new(TracingLogger);
//! let manager = Arc::new(Manager::new(logger.clone()));
//! let mut server = Engine::new(Guid::new(1, 0, 0, 0), manager, classes, logger);
//! server.init(Mode::Server).unwrap();
//! server.create_object_static(Guid::new(7, 0, 0, 0), "Monster").unwrap();
//! server.tick(1.0 / 60.0).unwrap();
//! assert!(!server.replication_frame().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod class_registry;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod function;
pub mod logging;
pub mod manager;
pub mod object;
pub mod peer;
pub mod property;
pub mod registry;
pub mod role;

pub use class_registry::{ClassRegistry, ObjectConstructor};
pub use command::{Command, CommandType};
pub use config::{ConfigError, Mode, NetworkConfig, DEFAULT_FRAME_CAPACITY, DEFAULT_TICK_RATE};
pub use engine::{dynamic_role, static_role, Engine, EngineHooks};
pub use error::{NetworkError, NetworkResult};
pub use event::{Event, EventType};
pub use function::{Function, FunctionHandler, FunctionKey, Params};
pub use logging::{Logger, MemoryLogger, TracingLogger};
pub use manager::{CommandHandler, Manager, ManagerHooks};
pub use object::Object;
pub use peer::RemotePeer;
pub use property::{Property, PropertyKey, PropertyType, Replicated};
pub use registry::{Named, Registry};
pub use role::Role;

pub use tracing::Level;
