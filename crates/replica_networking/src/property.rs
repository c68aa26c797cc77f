//! # Replicated Properties
//!
//! A property is a named, typed value stored inside its owning object.
//!
//! ## Design
//!
//! - Values live in the object's own storage as `Box<dyn Any>`-style erased
//!   slots, so there is no back-pointer from a property to its owner
//! - [`PropertyKey`] pairs a name with a static type for registration and
//!   typed access; a lookup with the wrong type returns `None`
//! - [`Property::serialize`] writes only the payload; names, type tags and
//!   size prefixes are framed by the object

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use replica_core::{Decode, Encode, Guid, InputStream, Integral, OutputStream, StreamResult, Vec3};

use crate::registry::Named;

/// Wire type tag of a property.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// `i8`
    Int8 = 0,
    /// `u8`
    UInt8 = 1,
    /// `i16`
    Int16 = 2,
    /// `u16`
    UInt16 = 3,
    /// `i32`
    Int32 = 4,
    /// `u32`
    UInt32 = 5,
    /// `f32`
    Float = 6,
    /// `f64`
    Double = 7,
    /// NUL-terminated string
    String = 8,
    /// Homogeneous integral sequence, followed by an element tag
    Vector = 9,
    /// Three `f32` components
    Vec3 = 10,
    /// 128-bit identifier
    Guid = 11,
}

impl PropertyType {
    /// Converts a raw tag, if known.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Int8),
            1 => Some(Self::UInt8),
            2 => Some(Self::Int16),
            3 => Some(Self::UInt16),
            4 => Some(Self::Int32),
            5 => Some(Self::UInt32),
            6 => Some(Self::Float),
            7 => Some(Self::Double),
            8 => Some(Self::String),
            9 => Some(Self::Vector),
            10 => Some(Self::Vec3),
            11 => Some(Self::Guid),
            _ => None,
        }
    }
}

/// A value type that can be stored in a property.
pub trait Replicated: Encode + Decode + Send + Sync + 'static {
    /// Wire type tag.
    const TYPE: PropertyType;
    /// Element tag for sequences.
    const ELEMENT: Option<PropertyType> = None;
}

macro_rules! impl_replicated {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl Replicated for $ty {
                const TYPE: PropertyType = PropertyType::$tag;
            }
        )*
    };
}

impl_replicated! {
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec3 => Vec3,
    Guid => Guid,
}

impl<T: Integral + Replicated> Replicated for Vec<T> {
    const TYPE: PropertyType = PropertyType::Vector;
    const ELEMENT: Option<PropertyType> = Some(T::TYPE);
}

/// Type-erased property storage.
trait Slot: Send + Sync {
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()>;
    fn decode(&mut self, input: &mut InputStream<'_>) -> StreamResult<()>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Replicated> Slot for T {
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        Encode::encode(self, out)
    }

    fn decode(&mut self, input: &mut InputStream<'_>) -> StreamResult<()> {
        *self = <T as Decode>::decode(input)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Typed handle naming a property.
pub struct PropertyKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PropertyKey<T> {
    /// Creates a key.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Property name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for PropertyKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PropertyKey<T> {}

impl<T> fmt::Debug for PropertyKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyKey({})", self.name)
    }
}

/// A named, typed value owned by an object.
pub struct Property {
    name: String,
    property_type: PropertyType,
    element_type: Option<PropertyType>,
    value: Box<dyn Slot>,
}

impl Property {
    /// Creates a property holding `value`.
    pub fn new<T: Replicated>(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            property_type: T::TYPE,
            element_type: T::ELEMENT,
            value: Box::new(value),
        }
    }

    /// Wire type tag.
    #[inline]
    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// Element tag, for sequences.
    #[inline]
    #[must_use]
    pub fn element_type(&self) -> Option<PropertyType> {
        self.element_type
    }

    /// Returns true if raw wire tags describe this property's type exactly.
    #[must_use]
    pub fn matches(&self, tag: u8, element: Option<u8>) -> bool {
        tag == self.property_type as u8 && element == self.element_type.map(|e| e as u8)
    }

    /// Writes the payload only.
    pub fn serialize(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        self.value.encode(out)
    }

    /// Replaces the value with one read from `input`. On error the old
    /// value is kept.
    pub fn deserialize(&mut self, input: &mut InputStream<'_>) -> StreamResult<()> {
        self.value.decode(input)
    }

    /// Borrows the value if it has type `T`.
    #[must_use]
    pub fn get<T: Replicated>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref()
    }

    /// Mutably borrows the value if it has type `T`.
    pub fn get_mut<T: Replicated>(&mut self) -> Option<&mut T> {
        self.value.as_any_mut().downcast_mut()
    }

    /// Replaces the value. Returns false if `T` is not the stored type.
    pub fn set<T: Replicated>(&mut self, value: T) -> bool {
        match self.get_mut::<T>() {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl Named for Property {
    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("type", &self.property_type)
            .field("element", &self.element_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_core::Buffer;

    #[test]
    fn test_tags_match_wire_values() {
        assert_eq!(PropertyType::Int8 as u8, 0);
        assert_eq!(PropertyType::Vector as u8, 9);
        assert_eq!(PropertyType::Guid as u8, 11);
        for tag in 0..=11u8 {
            assert_eq!(PropertyType::from_u8(tag).map(|t| t as u8), Some(tag));
        }
        assert!(PropertyType::from_u8(12).is_none());
    }

    #[test]
    fn test_vector_carries_element_type() {
        let property = Property::new("Heightmap", vec![1u8, 2, 3]);
        assert_eq!(property.property_type(), PropertyType::Vector);
        assert_eq!(property.element_type(), Some(PropertyType::UInt8));
        assert!(property.matches(9, Some(1)));
        assert!(!property.matches(9, Some(5)));
        assert!(!property.matches(9, None));
    }

    #[test]
    fn test_typed_access() {
        let mut property = Property::new("Velocity", 1.5f32);
        assert_eq!(property.get::<f32>(), Some(&1.5));
        assert!(property.get::<f64>().is_none());
        assert!(property.set(3.0f32));
        assert!(!property.set(3u32));
        assert_eq!(property.get::<f32>(), Some(&3.0));
    }

    #[test]
    fn test_payload_only_serialization() {
        let property = Property::new("Type", String::from("Oak"));
        let mut buffer = Buffer::new();
        property.serialize(&mut OutputStream::new(&mut buffer)).unwrap();
        assert_eq!(buffer.as_slice(), &[4, 0, 0, 0, b'O', b'a', b'k', 0]);

        let mut other = Property::new("Type", String::new());
        other
            .deserialize(&mut InputStream::new(buffer.as_slice()))
            .unwrap();
        assert_eq!(other.get::<String>().map(String::as_str), Some("Oak"));
    }

    #[test]
    fn test_failed_decode_keeps_value() {
        let mut property = Property::new("HeightmapSizeX", 64u32);
        assert!(property.deserialize(&mut InputStream::new(&[1, 2])).is_err());
        assert_eq!(property.get::<u32>(), Some(&64));
    }
}
