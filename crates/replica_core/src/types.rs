//! Fixed-layout value types shared by every peer.
//!
//! These are the canonical representations used on the wire.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 128-bit identifier made of four 32-bit components.
///
/// Identifies an object within one engine and a peer within one manager.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Guid {
    /// First component.
    pub a: u32,
    /// Second component.
    pub b: u32,
    /// Third component.
    pub c: u32,
    /// Fourth component.
    pub d: u32,
}

impl Guid {
    /// The all-zero identifier.
    pub const NIL: Self = Self::new(0, 0, 0, 0);

    /// Creates an identifier from its components.
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { a, b, c, d }
    }

    /// Returns true for the all-zero identifier.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        self.a == 0 && self.b == 0 && self.c == 0 && self.d == 0
    }

    /// Converts to array.
    #[must_use]
    pub const fn to_array(self) -> [u32; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

impl From<[u32; 4]> for Guid {
    fn from(parts: [u32; 4]) -> Self {
        Self::new(parts[0], parts[1], parts[2], parts[3])
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}-{:08x}-{:08x}-{:08x}", self.a, self.b, self.c, self.d)
    }
}

/// 3D vector, used for locations, scales and directions.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All components set to one
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Transport framing header.
///
/// Echoes the sender's identifier and carries the size of the packet that
/// follows. The replication core never parses it; transports do.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Header {
    /// Sender identifier.
    pub guid: Guid,
    /// Size of the payload following the header.
    pub packet_size: u32,
}

impl Header {
    /// Encoded size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a header for a payload of `len` bytes.
    ///
    /// Returns `None` if `len` does not fit into 32 bits.
    #[must_use]
    pub fn for_payload(guid: Guid, len: usize) -> Option<Self> {
        Some(Self {
            guid,
            packet_size: u32::try_from(len).ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<Guid>(), 16);
        assert_eq!(std::mem::size_of::<Vec3>(), 12);
        assert_eq!(Header::SIZE, 20);
    }

    #[test]
    fn test_guid_display_and_nil() {
        let guid = Guid::new(1, 0, 0, 0xff);
        assert_eq!(guid.to_string(), "00000001-00000000-00000000-000000ff");
        assert!(!guid.is_nil());
        assert!(Guid::NIL.is_nil());
        assert_eq!(Guid::from([1, 0, 0, 0xff]), guid);
    }

    #[test]
    fn test_vec3_ops() {
        let v = Vec3::new(1.0, 2.0, 2.0);
        assert_eq!(v.length(), 3.0);
        assert_eq!(v + Vec3::ONE, Vec3::new(2.0, 3.0, 3.0));
        assert_eq!(v - v, Vec3::ZERO);
        assert_eq!(v * 2.0, Vec3::new(2.0, 4.0, 4.0));
    }

    #[test]
    fn test_header_for_payload() {
        let header = Header::for_payload(Guid::new(1, 2, 3, 4), 64).unwrap();
        assert_eq!(header.packet_size, 64);
        assert_eq!(header.guid.d, 4);
    }
}
