//! # Commands
//!
//! Request/response messages exchanged between a transport and a manager.
//!
//! ## Wire Format
//!
//! ```text
//! tag   u8
//! Ping, Pong, EventsFrameRequest, ReplicationFrameRequest   (no payload)
//! EventsFrameReceive, ReplicationFrameReceive               u32 length + bytes
//! ```

use replica_core::{Decode, Encode, InputStream, OutputStream, StreamResult};

use crate::error::{NetworkError, NetworkResult};

/// Command tag.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandType {
    /// Liveness probe.
    Ping = 0,
    /// Answer to [`CommandType::Ping`].
    Pong = 1,
    /// Ask the peer for the events queued for us.
    EventsFrameRequest = 2,
    /// Carries an event log.
    EventsFrameReceive = 3,
    /// Ask the peer for its replication frame.
    ReplicationFrameRequest = 4,
    /// Carries a replication frame.
    ReplicationFrameReceive = 5,
}

impl CommandType {
    /// One past the highest valid tag. Never transmitted.
    pub const MAX_VALUE: u8 = 6;

    /// Converts a raw tag, if known.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ping),
            1 => Some(Self::Pong),
            2 => Some(Self::EventsFrameRequest),
            3 => Some(Self::EventsFrameReceive),
            4 => Some(Self::ReplicationFrameRequest),
            5 => Some(Self::ReplicationFrameReceive),
            _ => None,
        }
    }
}

/// A decoded command. Frame payloads are owned copies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Liveness probe.
    Ping,
    /// Answer to a ping.
    Pong,
    /// Ask for our queued events.
    EventsFrameRequest,
    /// An event log.
    EventsFrameReceive(Vec<u8>),
    /// Ask for a replication frame.
    ReplicationFrameRequest,
    /// A replication frame.
    ReplicationFrameReceive(Vec<u8>),
}

type CommandDecoder = fn(&mut InputStream<'_>) -> StreamResult<Command>;

const DECODERS: [CommandDecoder; CommandType::MAX_VALUE as usize] = [
    decode_ping,
    decode_pong,
    decode_events_frame_request,
    decode_events_frame_receive,
    decode_replication_frame_request,
    decode_replication_frame_receive,
];

fn decode_ping(_: &mut InputStream<'_>) -> StreamResult<Command> {
    Ok(Command::Ping)
}

fn decode_pong(_: &mut InputStream<'_>) -> StreamResult<Command> {
    Ok(Command::Pong)
}

fn decode_events_frame_request(_: &mut InputStream<'_>) -> StreamResult<Command> {
    Ok(Command::EventsFrameRequest)
}

fn decode_events_frame_receive(input: &mut InputStream<'_>) -> StreamResult<Command> {
    Ok(Command::EventsFrameReceive(Vec::decode(input)?))
}

fn decode_replication_frame_request(_: &mut InputStream<'_>) -> StreamResult<Command> {
    Ok(Command::ReplicationFrameRequest)
}

fn decode_replication_frame_receive(input: &mut InputStream<'_>) -> StreamResult<Command> {
    Ok(Command::ReplicationFrameReceive(Vec::decode(input)?))
}

impl Command {
    /// Tag of this command.
    #[must_use]
    pub fn command_type(&self) -> CommandType {
        match self {
            Self::Ping => CommandType::Ping,
            Self::Pong => CommandType::Pong,
            Self::EventsFrameRequest => CommandType::EventsFrameRequest,
            Self::EventsFrameReceive(_) => CommandType::EventsFrameReceive,
            Self::ReplicationFrameRequest => CommandType::ReplicationFrameRequest,
            Self::ReplicationFrameReceive(_) => CommandType::ReplicationFrameReceive,
        }
    }

    /// Writes the tag and payload.
    pub fn serialize(&self, out: &mut OutputStream<'_>) -> StreamResult<()> {
        (self.command_type() as u8).encode(out)?;
        match self {
            Self::EventsFrameReceive(frame) | Self::ReplicationFrameReceive(frame) => {
                frame.encode(out)
            }
            Self::Ping | Self::Pong | Self::EventsFrameRequest | Self::ReplicationFrameRequest => {
                Ok(())
            }
        }
    }

    /// Reads one tagged command.
    ///
    /// A tag at or above [`CommandType::MAX_VALUE`] is a protocol violation.
    pub fn deserialize(input: &mut InputStream<'_>) -> NetworkResult<Self> {
        let tag = u8::decode(input)?;
        let decoder = DECODERS
            .get(usize::from(tag))
            .ok_or(NetworkError::ProtocolViolation {
                kind: "command",
                tag,
            })?;
        Ok(decoder(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_core::Buffer;

    #[test]
    fn test_tags_and_sentinel() {
        assert_eq!(CommandType::Ping as u8, 0);
        assert_eq!(CommandType::ReplicationFrameReceive as u8, 5);
        assert!(CommandType::from_u8(CommandType::MAX_VALUE).is_none());
        for tag in 0..CommandType::MAX_VALUE {
            assert_eq!(CommandType::from_u8(tag).map(|t| t as u8), Some(tag));
        }
    }

    #[test]
    fn test_batch_round_trip() {
        let commands = vec![
            Command::Ping,
            Command::EventsFrameReceive(vec![1, 2, 3]),
            Command::ReplicationFrameRequest,
            Command::ReplicationFrameReceive(Vec::new()),
        ];
        let mut buffer = Buffer::new();
        let mut out = OutputStream::new(&mut buffer);
        for command in &commands {
            command.serialize(&mut out).unwrap();
        }
        assert_eq!(
            buffer.as_slice(),
            &[0, 3, 3, 0, 0, 0, 1, 2, 3, 4, 5, 0, 0, 0, 0]
        );

        let mut input = InputStream::new(buffer.as_slice());
        let mut decoded = Vec::new();
        while !input.is_eof() {
            decoded.push(Command::deserialize(&mut input).unwrap());
        }
        assert_eq!(decoded, commands);
    }

    #[test]
    fn test_unknown_tag_is_protocol_violation() {
        assert_eq!(
            Command::deserialize(&mut InputStream::new(&[0xFF])),
            Err(NetworkError::ProtocolViolation {
                kind: "command",
                tag: 0xFF
            })
        );
    }
}
