//! # Entity Schemas
//!
//! Sample replicated classes. Each class is a constructor that registers its
//! properties and functions on a fresh [`Object`]; "inheritance" is a call to
//! the parent's registration helper first.
//!
//! ```text
//! Scene
//! Actor (Scale, Location)
//! ├── PawnActor
//! ├── CharacterActor          + Teleport(Vec3)
//! ├── CustomActor (Type)
//! │   ├── TreeActor
//! │   └── MobActor            + Velocity, Direction
//! ├── WaterActor              + WaterHeight, HeightmapSizeX/Y
//! └── LandscapeActor          + HeightmapSizeX/Y, HeightmapPixelFormat, Heightmap
//! ```

use replica_core::{Guid, Vec3};
use replica_networking::{ClassRegistry, FunctionKey, Object, ObjectConstructor, PropertyKey, Role};

/// Class name of [`scene`].
pub const SCENE: &str = "Scene";
/// Class name of [`actor`].
pub const ACTOR: &str = "Actor";
/// Class name of [`pawn_actor`].
pub const PAWN_ACTOR: &str = "PawnActor";
/// Class name of [`character_actor`].
pub const CHARACTER_ACTOR: &str = "CharacterActor";
/// Class name of [`custom_actor`].
pub const CUSTOM_ACTOR: &str = "CustomActor";
/// Class name of [`tree_actor`].
pub const TREE_ACTOR: &str = "TreeActor";
/// Class name of [`mob_actor`].
pub const MOB_ACTOR: &str = "MobActor";
/// Class name of [`water_actor`].
pub const WATER_ACTOR: &str = "WaterActor";
/// Class name of [`landscape_actor`].
pub const LANDSCAPE_ACTOR: &str = "LandscapeActor";

/// Actor scale.
pub const SCALE: PropertyKey<Vec3> = PropertyKey::new("Scale");
/// Actor location.
pub const LOCATION: PropertyKey<Vec3> = PropertyKey::new("Location");
/// Free-form subtype of a custom actor.
pub const TYPE: PropertyKey<String> = PropertyKey::new("Type");
/// Mob speed in units per second.
pub const VELOCITY: PropertyKey<f32> = PropertyKey::new("Velocity");
/// Mob heading.
pub const DIRECTION: PropertyKey<Vec3> = PropertyKey::new("Direction");
/// Water surface height.
pub const WATER_HEIGHT: PropertyKey<f32> = PropertyKey::new("WaterHeight");
/// Heightmap width in samples.
pub const HEIGHTMAP_SIZE_X: PropertyKey<u32> = PropertyKey::new("HeightmapSizeX");
/// Heightmap depth in samples.
pub const HEIGHTMAP_SIZE_Y: PropertyKey<u32> = PropertyKey::new("HeightmapSizeY");
/// Pixel format identifier of [`HEIGHTMAP`].
pub const HEIGHTMAP_PIXEL_FORMAT: PropertyKey<u32> = PropertyKey::new("HeightmapPixelFormat");
/// Raw heightmap samples.
pub const HEIGHTMAP: PropertyKey<Vec<u8>> = PropertyKey::new("Heightmap");

/// Moves a character to a new location.
pub const TELEPORT: FunctionKey<(Vec3,)> = FunctionKey::new("Teleport");

const CLASSES: [(&str, ObjectConstructor); 9] = [
    (SCENE, scene),
    (ACTOR, actor),
    (PAWN_ACTOR, pawn_actor),
    (CHARACTER_ACTOR, character_actor),
    (CUSTOM_ACTOR, custom_actor),
    (TREE_ACTOR, tree_actor),
    (MOB_ACTOR, mob_actor),
    (WATER_ACTOR, water_actor),
    (LANDSCAPE_ACTOR, landscape_actor),
];

/// Registers every sample class. Returns how many names were new.
pub fn register_classes(registry: &ClassRegistry) -> usize {
    CLASSES
        .iter()
        .filter(|(name, constructor)| registry.register_class(name, *constructor))
        .count()
}

/// Root container. Carries no state of its own.
pub fn scene(guid: Guid, role: Role) -> Object {
    Object::new(SCENE, guid, role)
}

/// A placed object with a transform.
pub fn actor(guid: Guid, role: Role) -> Object {
    let mut object = Object::new(ACTOR, guid, role);
    register_actor(&mut object);
    object
}

/// An actor a player can possess.
pub fn pawn_actor(guid: Guid, role: Role) -> Object {
    let mut object = Object::new(PAWN_ACTOR, guid, role);
    register_actor(&mut object);
    object
}

/// The class spawned for each joining player.
pub fn character_actor(guid: Guid, role: Role) -> Object {
    let mut object = Object::new(CHARACTER_ACTOR, guid, role);
    register_actor(&mut object);
    object.register_function(TELEPORT, |object, (location,)| {
        object.set(LOCATION, location);
    });
    object
}

/// An actor tagged with a free-form type.
pub fn custom_actor(guid: Guid, role: Role) -> Object {
    let mut object = Object::new(CUSTOM_ACTOR, guid, role);
    register_custom_actor(&mut object, "");
    object
}

/// Static vegetation.
pub fn tree_actor(guid: Guid, role: Role) -> Object {
    let mut object = Object::new(TREE_ACTOR, guid, role);
    register_custom_actor(&mut object, "Tree");
    object
}

/// A moving creature.
pub fn mob_actor(guid: Guid, role: Role) -> Object {
    let mut object = Object::new(MOB_ACTOR, guid, role);
    register_custom_actor(&mut object, "");
    object.register_property(VELOCITY, 0.0);
    object.register_property(DIRECTION, Vec3::ZERO);
    object
}

/// A water plane.
pub fn water_actor(guid: Guid, role: Role) -> Object {
    let mut object = Object::new(WATER_ACTOR, guid, role);
    register_actor(&mut object);
    object.register_property(WATER_HEIGHT, 0.0);
    object.register_property(HEIGHTMAP_SIZE_X, 0);
    object.register_property(HEIGHTMAP_SIZE_Y, 0);
    object
}

/// Terrain described by a heightmap.
pub fn landscape_actor(guid: Guid, role: Role) -> Object {
    let mut object = Object::new(LANDSCAPE_ACTOR, guid, role);
    register_actor(&mut object);
    object.register_property(HEIGHTMAP_SIZE_X, 0);
    object.register_property(HEIGHTMAP_SIZE_Y, 0);
    object.register_property(HEIGHTMAP_PIXEL_FORMAT, 0);
    object.register_property(HEIGHTMAP, Vec::new());
    object
}

fn register_actor(object: &mut Object) {
    object.register_property(SCALE, Vec3::ONE);
    object.register_property(LOCATION, Vec3::ZERO);
}

fn register_custom_actor(object: &mut Object, kind: &str) {
    register_actor(object);
    object.register_property(TYPE, kind.to_string());
}
