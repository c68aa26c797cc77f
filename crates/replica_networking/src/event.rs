//! # Events
//!
//! Lifecycle and RPC notifications appended to each peer's event log.
//!
//! ## Wire Format
//!
//! ```text
//! tag   u8
//! CreateObject        guid, owner guid, class name
//! RemoveObject        guid
//! ExecFunctionRemote  guid, function name, u32 length + parameter bytes
//! ```
//!
//! Payloads carry no length in front of the tag, so an unknown tag cannot
//! be skipped and aborts the batch.

use replica_core::{Decode, Encode, Guid, InputStream, OutputStream, StreamResult};

use crate::error::{NetworkError, NetworkResult};

/// Event tag.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Spawn an object on the receiving side.
    CreateObject = 0,
    /// Remove an object on the receiving side.
    RemoveObject = 1,
    /// Run a function on the receiving side's copy of an object.
    ExecFunctionRemote = 2,
}

impl EventType {
    /// One past the highest valid tag. Never transmitted.
    pub const MAX_VALUE: u8 = 3;

    /// Converts a raw tag, if known.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::CreateObject),
            1 => Some(Self::RemoveObject),
            2 => Some(Self::ExecFunctionRemote),
            _ => None,
        }
    }
}

/// A decoded event. Payloads are owned copies of the wire bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Spawn `guid` of class `class_name`, owned by `owner`.
    CreateObject {
        /// Object identifier.
        guid: Guid,
        /// Identifier of the owning peer.
        owner: Guid,
        /// Registered class name.
        class_name: String,
    },
    /// Remove `guid`.
    RemoveObject {
        /// Object identifier.
        guid: Guid,
    },
    /// Run `function` on `guid` with packed `params`.
    ExecFunctionRemote {
        /// Object identifier.
        guid: Guid,
        /// Function name.
        function: String,
        /// Packed argument bytes.
        params: Vec<u8>,
    },
}

type EventDecoder = fn(&mut InputStream<'_>) -> StreamResult<Event>;

const DECODERS: [EventDecoder; EventType::MAX_VALUE as usize] = [
    decode_create_object,
    decode_remove_object,
    decode_exec_function_remote,
];

fn decode_create_object(input: &mut InputStream<'_>) -> StreamResult<Event> {
    Ok(Event::CreateObject {
        guid: Guid::decode(input)?,
        owner: Guid::decode(input)?,
        class_name: String::decode(input)?,
    })
}

fn decode_remove_object(input: &mut InputStream<'_>) -> StreamResult<Event> {
    Ok(Event::RemoveObject {
        guid: Guid::decode(input)?,
    })
}

fn decode_exec_function_remote(input: &mut InputStream<'_>) -> StreamResult<Event> {
    Ok(Event::ExecFunctionRemote {
        guid: Guid::decode(input)?,
        function: String::decode(input)?,
        params: Vec::<u8>::decode(input)?,
    })
}

impl Event {
    /// Tag of this event.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::CreateObject { .. } => EventType::CreateObject,
            Self::RemoveObject { .. } => EventType::RemoveObject,
            Self::ExecFunctionRemote { .. } => EventType::ExecFunctionRemote,
        }
    }

    /// Writes the tag and payload.
    pub fn serialize(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        (self.event_type() as u8).encode(out)?;
        match self {
            Self::CreateObject {
                guid,
                owner,
                class_name,
            } => {
                guid.encode(out)?;
                owner.encode(out)?;
                class_name.encode(out)
            }
            Self::RemoveObject { guid } => guid.encode(out),
            Self::ExecFunctionRemote {
                guid,
                function,
                params,
            } => {
                guid.encode(out)?;
                function.encode(out)?;
                params.encode(out)
            }
        }
    }

    /// Reads one tagged event.
    ///
    /// A tag at or above [`EventType::MAX_VALUE`] is a protocol violation.
    pub fn deserialize(input: &mut InputStream<'_>) -> NetworkResult<Self> {
        let tag = u8::decode(input)?;
        let decoder = DECODERS
            .get(usize::from(tag))
            .ok_or(NetworkError::ProtocolViolation { kind: "event", tag })?;
        Ok(decoder(input)?)
    }
}
