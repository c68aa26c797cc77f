//! # Remote Functions
//!
//! A function is a named handler bound to its owning object. Arguments travel
//! as a packed parameter buffer encoded with the stream codecs.
//!
//! ## Design
//!
//! - [`Params`] packs and unpacks argument tuples of up to four values
//! - [`FunctionKey`] pairs a name with its parameter tuple type, so callers
//!   and handlers agree on the layout at compile time
//! - Handlers receive the owning object as `&mut Object` at call time
//!   instead of holding a pointer to it

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use replica_core::{Buffer, Decode, Encode, InputStream, OutputStream, StreamResult};

use crate::object::Object;
use crate::registry::Named;

/// Type-erased handler: unpacks its arguments and runs against the owner.
pub type FunctionHandler =
    Arc<dyn Fn(&mut Object, &mut InputStream<'_>) -> StreamResult<()> + Send + Sync>;

/// Boxes a closure as a [`FunctionHandler`].
pub fn erase<F>(handler: F) -> FunctionHandler
where
    F: Fn(&mut Object, &mut InputStream<'_>) -> StreamResult<()> + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// An argument pack.
pub trait Params: Sized {
    /// Writes every argument in order.
    fn pack(&self, out: &mut OutputStream<'_>) -> StreamResult<()>;

    /// Reads every argument in order.
    fn unpack(input: &mut InputStream<'_>) -> StreamResult<Self>;
}

impl Params for () {
    fn pack(&self, _out: &mut OutputStream<'_>) -> StreamResult<()> {
        Ok(())
    }

    fn unpack(_input: &mut InputStream<'_>) -> StreamResult<Self> {
        Ok(())
    }
}

macro_rules! impl_params {
    ($($name:ident),+) => {
        impl<$($name: Encode + Decode),+> Params for ($($name,)+) {
            #[allow(non_snake_case)]
            fn pack(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
                let ($($name,)+) = self;
                $($name.encode(out)?;)+
                Ok(())
            }

            fn unpack(input: &mut InputStream<'_>) -> StreamResult<Self> {
                Ok(($($name::decode(input)?,)+))
            }
        }
    };
}

impl_params!(A);
impl_params!(A, B);
impl_params!(A, B, C);
impl_params!(A, B, C, D);

/// Typed handle naming a function and its argument tuple.
pub struct FunctionKey<P> {
    name: &'static str,
    _marker: PhantomData<fn(P)>,
}

impl<P: Params> FunctionKey<P> {
    /// Creates a key.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Function name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Packs arguments into a parameter buffer.
    pub fn pack(&self, params: &P) -> StreamResult<Vec<u8>> {
        let mut buffer = Buffer::new();
        params.pack(&mut OutputStream::new(&mut buffer))?;
        Ok(buffer.into_vec())
    }
}

impl<P> Clone for FunctionKey<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for FunctionKey<P> {}

impl<P> fmt::Debug for FunctionKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionKey({})", self.name)
    }
}

/// A named handler registered on an object.
pub struct Function {
    name: String,
    handler: FunctionHandler,
}

impl Function {
    /// Wraps a typed handler.
    pub fn new<P, F>(name: impl Into<String>, handler: F) -> Self
    where
        P: Params + 'static,
        F: Fn(&mut Object, P) + Send + Sync + 'static,
    {
        Self::from_handler(
            name,
            erase(move |object, input| {
                let params = P::unpack(input)?;
                handler(object, params);
                Ok(())
            }),
        )
    }

    /// Wraps an already erased handler.
    pub fn from_handler(name: impl Into<String>, handler: FunctionHandler) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    /// Shared handle to the handler, callable while the owner is borrowed.
    #[must_use]
    pub fn handler(&self) -> FunctionHandler {
        Arc::clone(&self.handler)
    }
}

impl Named for Function {
    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
