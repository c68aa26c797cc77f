//! # Codecs
//!
//! Fixed-layout encode/decode for every value that crosses the wire.
//!
//! ## Layouts
//!
//! | value | bytes |
//! |---|---|
//! | integers, `f32`, `f64` | little-endian, native width |
//! | [`Guid`] | 4 x `u32` (16) |
//! | [`Vec3`] | 3 x `f32` (12) |
//! | [`Header`] | [`Guid`] + `u32` packet size (20) |
//! | `String` | `u32` length including the terminator, bytes, `0` |
//! | `Vec<T: Integral>` | `u32` byte length, little-endian elements |
//!
//! Composite values are written component by component, so the byte order
//! never depends on the host.

use bytemuck::Pod;

use crate::error::{StreamError, StreamResult};
use crate::stream::{size_prefix, InputStream, OutputStream};
use crate::types::{Guid, Header, Vec3};

/// A value that can be written to an [`OutputStream`].
pub trait Encode {
    /// Writes the value at the stream cursor.
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()>;
}

/// A value that can be read from an [`InputStream`].
pub trait Decode: Sized {
    /// Reads a value at the stream cursor.
    fn decode(input: &mut InputStream<'_>) -> StreamResult<Self>;
}

macro_rules! impl_number_codec {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Encode for $ty {
                #[inline]
                fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
                    out.write(&self.to_le_bytes());
                    Ok(())
                }
            }

            impl Decode for $ty {
                #[inline]
                fn decode(input: &mut InputStream<'_>) -> StreamResult<Self> {
                    Ok(<$ty>::from_le_bytes(input.read_array()?))
                }
            }
        )*
    };
}

impl_number_codec!(i8, u8, i16, u16, i32, u32, f32, f64);

impl Encode for str {
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        let len = size_prefix(self.len() + 1)?;
        len.encode(out)?;
        out.write(self.as_bytes());
        out.write(&[0]);
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        self.as_str().encode(out)
    }
}

impl Decode for String {
    fn decode(input: &mut InputStream<'_>) -> StreamResult<Self> {
        let len = u32::decode(input)? as usize;
        let bytes = input.read(len)?;
        let (terminator, text) = bytes.split_last().ok_or(StreamError::MissingTerminator)?;
        if *terminator != 0 {
            return Err(StreamError::MissingTerminator);
        }
        std::str::from_utf8(text)
            .map(str::to_owned)
            .map_err(|_| StreamError::InvalidUtf8)
    }
}

/// Fixed-width integer that may appear in a homogeneous sequence.
pub trait Integral: Pod + Encode + Decode {}

impl Integral for i8 {}
impl Integral for u8 {}
impl Integral for i16 {}
impl Integral for u16 {}
impl Integral for i32 {}
impl Integral for u32 {}

impl<T: Integral> Encode for [T] {
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        size_prefix(std::mem::size_of_val(self))?.encode(out)?;
        self.iter().try_for_each(|value| value.encode(out))
    }
}

impl<T: Integral> Encode for Vec<T> {
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        self.as_slice().encode(out)
    }
}

impl<T: Integral> Decode for Vec<T> {
    fn decode(input: &mut InputStream<'_>) -> StreamResult<Self> {
        let len = u32::decode(input)? as usize;
        let element = std::mem::size_of::<T>();
        if len % element != 0 {
            return Err(StreamError::MisalignedSequence { len, element });
        }
        let mut elements = InputStream::new(input.read(len)?);
        let mut values = Vec::with_capacity(len / element);
        while !elements.is_eof() {
            values.push(T::decode(&mut elements)?);
        }
        Ok(values)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    #[inline]
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        self.iter().try_for_each(|value| value.encode(out))
    }
}

impl<T: Decode + Pod, const N: usize> Decode for [T; N] {
    fn decode(input: &mut InputStream<'_>) -> StreamResult<Self> {
        let mut values = [<T as bytemuck::Zeroable>::zeroed(); N];
        for value in &mut values {
            *value = T::decode(input)?;
        }
        Ok(values)
    }
}

impl Encode for Guid {
    #[inline]
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        bytemuck::cast::<Self, [u32; 4]>(*self).encode(out)
    }
}

impl Decode for Guid {
    #[inline]
    fn decode(input: &mut InputStream<'_>) -> StreamResult<Self> {
        Ok(bytemuck::cast(<[u32; 4]>::decode(input)?))
    }
}

impl Encode for Vec3 {
    #[inline]
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        bytemuck::cast::<Self, [f32; 3]>(*self).encode(out)
    }
}

impl Decode for Vec3 {
    #[inline]
    fn decode(input: &mut InputStream<'_>) -> StreamResult<Self> {
        Ok(bytemuck::cast(<[f32; 3]>::decode(input)?))
    }
}

impl Encode for Header {
    fn encode(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        self.guid.encode(out)?;
        self.packet_size.encode(out)
    }
}

impl Decode for Header {
    fn decode(input: &mut InputStream<'_>) -> StreamResult<Self> {
        Ok(Self {
            guid: Guid::decode(input)?,
            packet_size: u32::decode(input)?,
        })
    }
}
