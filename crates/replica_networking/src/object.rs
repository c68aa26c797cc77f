//! # Replicated Objects
//!
//! An object is an identifier, a role, a class name and two registries: one
//! for properties and one for functions.
//!
//! ## Property Block Layout
//!
//! ```text
//! properties size       u32 (= M)
//! repeated until M bytes consumed:
//!   name                string
//!   type tag            u8
//!   [element type tag]  u8, only if type tag == Vector
//!   entry size          u32 (= K)
//!   payload             K bytes
//! ```
//!
//! Each entry and the block as a whole can be skipped by length, so peers
//! with different schemas for the same class stay in sync.

use replica_core::{Decode, Encode, Guid, InputStream, OutputStream, StreamResult};

use crate::error::{NetworkError, NetworkResult};
use crate::function::{Function, FunctionKey, Params};
use crate::logging::{report, Logger};
use crate::property::{Property, PropertyKey, PropertyType, Replicated};
use crate::registry::{Named, Registry};
use crate::role::Role;

/// A replicated object.
#[derive(Debug)]
pub struct Object {
    guid: Guid,
    role: Role,
    class_name: String,
    properties: Registry<Property>,
    functions: Registry<Function>,
}

impl Object {
    /// Creates an object with empty registries.
    pub fn new(class_name: impl Into<String>, guid: Guid, role: Role) -> Self {
        Self {
            guid,
            role,
            class_name: class_name.into(),
            properties: Registry::new(),
            functions: Registry::new(),
        }
    }

    /// Object identifier.
    #[inline]
    #[must_use]
    pub fn guid(&self) -> Guid {
        self.guid
    }

    /// Authority role.
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Registered class name.
    #[inline]
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Registers a property with its initial value. Returns false if the
    /// name is taken.
    pub fn register_property<T: Replicated>(&mut self, key: PropertyKey<T>, value: T) -> bool {
        self.properties.register(Property::new(key.name(), value))
    }

    /// Registers a function handler. Returns false if the name is taken.
    pub fn register_function<P, F>(&mut self, key: FunctionKey<P>, handler: F) -> bool
    where
        P: Params + 'static,
        F: Fn(&mut Object, P) + Send + Sync + 'static,
    {
        self.functions.register(Function::new(key.name(), handler))
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Looks up a property by name, mutably.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    /// Iterates properties in serialization order.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Iterates functions in name order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    /// Reads a property value.
    #[must_use]
    pub fn get<T: Replicated>(&self, key: PropertyKey<T>) -> Option<&T> {
        self.properties.get(key.name())?.get()
    }

    /// Borrows a property value mutably.
    pub fn get_mut<T: Replicated>(&mut self, key: PropertyKey<T>) -> Option<&mut T> {
        self.properties.get_mut(key.name())?.get_mut()
    }

    /// Writes a property value. Returns false if no property of that name
    /// and type exists.
    pub fn set<T: Replicated>(&mut self, key: PropertyKey<T>, value: T) -> bool {
        self.properties
            .get_mut(key.name())
            .is_some_and(|property| property.set(value))
    }

    /// Runs a function with a packed parameter buffer.
    pub fn exec_function(&mut self, name: &str, params: &[u8]) -> NetworkResult<()> {
        let handler = self
            .functions
            .get(name)
            .map(Function::handler)
            .ok_or_else(|| NetworkError::FunctionNotFound(name.to_owned()))?;
        handler(self, &mut InputStream::new(params))?;
        Ok(())
    }

    /// Runs a function locally with typed arguments.
    pub fn call<P: Params>(&mut self, key: FunctionKey<P>, params: &P) -> NetworkResult<()> {
        let bytes = key.pack(params)?;
        self.exec_function(key.name(), &bytes)
    }

    /// Writes the property block.
    pub fn serialize(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        out.write_size_prefixed(|out| {
            for property in self.properties.iter() {
                property.name().encode(out)?;
                (property.property_type() as u8).encode(out)?;
                if let Some(element) = property.element_type() {
                    (element as u8).encode(out)?;
                }
                out.write_size_prefixed(|out| property.serialize(out))?;
            }
            Ok(())
        })
    }

    /// Applies a property block.
    ///
    /// Entries with an unknown name or a mismatched type are skipped by
    /// length and reported as warnings. The cursor always ends at the block
    /// boundary on success.
    pub fn deserialize(
        &mut self,
        input: &mut InputStream<'_>,
        logger: &dyn Logger,
    ) -> StreamResult<()> {
        let size = u32::decode(input)? as usize;
        let mut block = InputStream::new(input.read(size)?);

        while !block.is_eof() {
            let name = String::decode(&mut block)?;
            let tag = u8::decode(&mut block)?;
            let element = if tag == PropertyType::Vector as u8 {
                Some(u8::decode(&mut block)?)
            } else {
                None
            };
            let entry_size = u32::decode(&mut block)? as usize;
            let payload = block.read(entry_size)?;

            match self.properties.get_mut(&name) {
                Some(property) if property.matches(tag, element) => {
                    if let Err(err) = property.deserialize(&mut InputStream::new(payload)) {
                        report!(
                            logger,
                            WARN,
                            "{} {}: property {name} unreadable, skipped: {err}",
                            self.class_name,
                            self.guid
                        );
                    }
                }
                Some(property) => report!(
                    logger,
                    WARN,
                    "{} {}: property {name} type mismatch (local {:?}/{:?}, remote {tag}/{element:?}), skipped",
                    self.class_name,
                    self.guid,
                    property.property_type(),
                    property.element_type()
                ),
                None => report!(
                    logger,
                    WARN,
                    "{} {}: unknown property {name}, skipped",
                    self.class_name,
                    self.guid
                ),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryLogger;
    use replica_core::{Buffer, Vec3};
    use tracing::Level;

    const INT8: PropertyKey<i8> = PropertyKey::new("Int8");
    const UINT8: PropertyKey<u8> = PropertyKey::new("UInt8");
    const INT16: PropertyKey<i16> = PropertyKey::new("Int16");
    const UINT16: PropertyKey<u16> = PropertyKey::new("UInt16");
    const INT32: PropertyKey<i32> = PropertyKey::new("Int32");
    const UINT32: PropertyKey<u32> = PropertyKey::new("UInt32");
    const FLOAT: PropertyKey<f32> = PropertyKey::new("Float");
    const DOUBLE: PropertyKey<f64> = PropertyKey::new("Double");
    const TEXT: PropertyKey<String> = PropertyKey::new("Text");
    const BYTES: PropertyKey<Vec<u8>> = PropertyKey::new("Bytes");
    const WORDS: PropertyKey<Vec<i32>> = PropertyKey::new("Words");
    const LOCATION: PropertyKey<Vec3> = PropertyKey::new("Location");
    const OWNER: PropertyKey<Guid> = PropertyKey::new("Owner");
    const TELEPORT: FunctionKey<(Vec3,)> = FunctionKey::new("Teleport");

    fn everything(guid: Guid) -> Object {
        let mut object = Object::new("Everything", guid, Role::AUTHORITY_REMOTE_PROXY);
        object.register_property(INT8, 0);
        object.register_property(UINT8, 0);
        object.register_property(INT16, 0);
        object.register_property(UINT16, 0);
        object.register_property(INT32, 0);
        object.register_property(UINT32, 0);
        object.register_property(FLOAT, 0.0);
        object.register_property(DOUBLE, 0.0);
        object.register_property(TEXT, String::new());
        object.register_property(BYTES, Vec::new());
        object.register_property(WORDS, Vec::new());
        object.register_property(LOCATION, Vec3::ZERO);
        object.register_property(OWNER, Guid::NIL);
        object
    }

    fn block_of(object: &Object) -> Vec<u8> {
        let mut buffer = Buffer::new();
        object.serialize(&mut OutputStream::new(&mut buffer)).unwrap();
        buffer.into_vec()
    }

    #[test]
    fn test_all_property_types_round_trip() {
        let mut source = everything(Guid::new(1, 0, 0, 0));
        source.set(INT8, -8);
        source.set(UINT8, 8);
        source.set(INT16, -1600);
        source.set(UINT16, 1600);
        source.set(INT32, -320_000);
        source.set(UINT32, 320_000);
        source.set(FLOAT, 1.25);
        source.set(DOUBLE, -2.5e10);
        source.set(TEXT, "Landscape".to_string());
        source.set(BYTES, vec![0, 127, 255]);
        source.set(WORDS, vec![-1, 0, i32::MAX]);
        source.set(LOCATION, Vec3::new(1.0, -2.0, 3.5));
        source.set(OWNER, Guid::new(9, 8, 7, 6));

        let bytes = block_of(&source);
        let mut target = everything(Guid::new(1, 0, 0, 0));
        let logger = MemoryLogger::new();
        let mut input = InputStream::new(&bytes);
        target.deserialize(&mut input, &logger).unwrap();

        assert!(input.is_eof());
        assert!(logger.entries().is_empty());
        assert_eq!(target.get(INT8), Some(&-8));
        assert_eq!(target.get(UINT8), Some(&8));
        assert_eq!(target.get(INT16), Some(&-1600));
        assert_eq!(target.get(UINT16), Some(&1600));
        assert_eq!(target.get(INT32), Some(&-320_000));
        assert_eq!(target.get(UINT32), Some(&320_000));
        assert_eq!(target.get(FLOAT).map(|v| v.to_bits()), Some(1.25f32.to_bits()));
        assert_eq!(target.get(DOUBLE).map(|v| v.to_bits()), Some((-2.5e10f64).to_bits()));
        assert_eq!(target.get(TEXT).map(String::as_str), Some("Landscape"));
        assert_eq!(target.get(BYTES), Some(&vec![0, 127, 255]));
        assert_eq!(target.get(WORDS), Some(&vec![-1, 0, i32::MAX]));
        assert_eq!(target.get(LOCATION), Some(&Vec3::new(1.0, -2.0, 3.5)));
        assert_eq!(target.get(OWNER), Some(&Guid::new(9, 8, 7, 6)));
    }

    #[test]
    fn test_block_layout() {
        let mut object = Object::new("Tiny", Guid::NIL, Role::AUTHORITY_REMOTE_PROXY);
        object.register_property(UINT16, 0x0102);
        let bytes = block_of(&object);

        let mut expected = Vec::new();
        // name(4 + 7) + tag(1) + size(4) + payload(2)
        expected.extend_from_slice(&18u32.to_le_bytes());
        expected.extend_from_slice(&7u32.to_le_bytes());
        expected.extend_from_slice(b"UInt16\0");
        expected.push(PropertyType::UInt16 as u8);
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&[0x02, 0x01]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_vector_entry_carries_element_tag() {
        let mut object = Object::new("Tiny", Guid::NIL, Role::AUTHORITY_REMOTE_PROXY);
        object.register_property(BYTES, vec![5, 6]);
        let bytes = block_of(&object);
        // size(4) + name(4 + 6) puts the tags at offset 14
        assert_eq!(bytes[14], PropertyType::Vector as u8);
        assert_eq!(bytes[15], PropertyType::UInt8 as u8);
    }

    #[test]
    fn test_type_mismatch_skipped_others_applied() {
        let mut source = Object::new("Mob", Guid::NIL, Role::AUTHORITY_REMOTE_PROXY);
        source.register_property(PropertyKey::<f32>::new("Velocity"), 4.0);
        source.register_property(PropertyKey::<u32>::new("Health"), 77);
        source.register_property(LOCATION, Vec3::new(1.0, 1.0, 1.0));
        let bytes = block_of(&source);

        // Same names, but Health is a u16 locally
        let mut target = Object::new("Mob", Guid::NIL, Role::PROXY_REMOTE_PROXY);
        target.register_property(PropertyKey::<f32>::new("Velocity"), 0.0);
        target.register_property(PropertyKey::<u16>::new("Health"), 1);
        target.register_property(LOCATION, Vec3::ZERO);

        let mut framed = bytes.clone();
        framed.extend_from_slice(&[0xAB, 0xCD]);
        let logger = MemoryLogger::new();
        let mut input = InputStream::new(&framed);
        target.deserialize(&mut input, &logger).unwrap();

        assert_eq!(input.pos(), bytes.len());
        assert_eq!(target.get(PropertyKey::<f32>::new("Velocity")), Some(&4.0));
        assert_eq!(target.get(PropertyKey::<u16>::new("Health")), Some(&1));
        assert_eq!(target.get(LOCATION), Some(&Vec3::new(1.0, 1.0, 1.0)));
        assert!(logger.contains(Level::WARN, "Health type mismatch"));
    }

    #[test]
    fn test_unknown_property_skipped() {
        let mut source = Object::new("Tree", Guid::NIL, Role::AUTHORITY_REMOTE_PROXY);
        source.register_property(PropertyKey::<String>::new("Type"), "Oak".to_string());
        source.register_property(PropertyKey::<u32>::new("Age"), 300);
        let bytes = block_of(&source);

        let mut target = Object::new("Tree", Guid::NIL, Role::PROXY_REMOTE_PROXY);
        target.register_property(PropertyKey::<u32>::new("Age"), 0);
        let logger = MemoryLogger::new();
        target
            .deserialize(&mut InputStream::new(&bytes), &logger)
            .unwrap();

        assert_eq!(target.get(PropertyKey::<u32>::new("Age")), Some(&300));
        assert!(logger.contains(Level::WARN, "unknown property Type"));
    }

    #[test]
    fn test_truncated_block_is_error() {
        let object = everything(Guid::NIL);
        let bytes = block_of(&object);
        let mut target = everything(Guid::NIL);
        let result = target.deserialize(
            &mut InputStream::new(&bytes[..bytes.len() - 1]),
            &MemoryLogger::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut object = Object::new("Actor", Guid::NIL, Role::PROXY_REMOTE_PROXY);
        assert!(object.register_property(LOCATION, Vec3::ONE));
        assert!(!object.register_property(LOCATION, Vec3::ZERO));
        assert_eq!(object.get(LOCATION), Some(&Vec3::ONE));
        assert!(object.register_function(TELEPORT, |_, _| {}));
        assert!(!object.register_function(TELEPORT, |_, _| {}));
    }

    #[test]
    fn test_exec_function_unpacks_and_runs() {
        let mut object = Object::new("Actor", Guid::NIL, Role::AUTHORITY_REMOTE_PROXY);
        object.register_property(LOCATION, Vec3::ZERO);
        object.register_function(TELEPORT, |object, (target,)| {
            object.set(LOCATION, target);
        });

        let params = TELEPORT.pack(&(Vec3::new(5.0, 6.0, 7.0),)).unwrap();
        object.exec_function("Teleport", &params).unwrap();
        assert_eq!(object.get(LOCATION), Some(&Vec3::new(5.0, 6.0, 7.0)));

        object.call(TELEPORT, &(Vec3::ONE,)).unwrap();
        assert_eq!(object.get(LOCATION), Some(&Vec3::ONE));
    }

    #[test]
    fn test_exec_function_miss_and_bad_params() {
        let mut object = Object::new("Actor", Guid::NIL, Role::AUTHORITY_REMOTE_PROXY);
        object.register_function(TELEPORT, |_, _| {});
        assert_eq!(
            object.exec_function("Jump", &[]),
            Err(NetworkError::FunctionNotFound("Jump".to_string()))
        );
        assert!(matches!(
            object.exec_function("Teleport", &[1, 2, 3]),
            Err(NetworkError::Stream(_))
        ));
    }
}
