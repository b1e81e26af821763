// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::fmt;

use byteorder::{BigEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::{ByteArray, DecodeError, EncodeError};

/// Protocol name is fixed to `MQTT` in the 3.1.1 standard.
pub const PROTOCOL_NAME: &str = "MQTT";

/// Serialize an in-memory value into the network byte stream.
///
/// Bytes are appended to `buf`; the number of bytes written is returned.
pub trait EncodePacket {
    /// Append the wire form of this value to `buf`.
    ///
    /// # Errors
    ///
    /// Returns error if the value violates a protocol rule or does not fit
    /// the wire format.
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError>;
}

/// Parse an in-memory value out of the network byte stream.
pub trait DecodePacket: Sized {
    /// Read the wire form of this value from `ba`.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are malformed or the array runs out.
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError>;
}

/// Quality of service level for message delivery.
#[repr(u8)]
#[derive(
    Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum QoS {
    /// At most once delivery, no acknowledgement.
    #[default]
    AtMostOnce = 0,

    /// At least once delivery, acknowledged with a PublishAck packet.
    AtLeastOnce = 1,

    /// Exactly once delivery, the four-way release handshake.
    ExactOnce = 2,
}

impl QoS {
    /// Get byte length in packet.
    #[must_use]
    #[inline]
    pub const fn bytes() -> usize {
        1
    }
}

impl TryFrom<u8> for QoS {
    type Error = DecodeError;

    /// The value 3 is reserved by the standard and MUST NOT be used.
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactOnce),
            _ => Err(DecodeError::ProtocolViolation),
        }
    }
}

/// Revision level of the protocol spoken by the client.
///
/// This crate speaks MQTT 3.1.1 only, so a single level is representable
/// and every other byte on the wire is rejected.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolLevel {
    /// MQTT 3.1.1
    #[default]
    V311 = 4,
}

impl ProtocolLevel {
    /// Get byte length in packet.
    #[must_use]
    #[inline]
    pub const fn bytes() -> usize {
        1
    }
}

impl TryFrom<u8> for ProtocolLevel {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            4 => Ok(Self::V311),
            _ => Err(DecodeError::ProtocolViolation),
        }
    }
}

impl EncodePacket for ProtocolLevel {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        buf.push(*self as u8);
        Ok(Self::bytes())
    }
}

/// Packet identifier, two bytes on the wire.
///
/// Links a request packet to its acknowledgement.
#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PacketId(u16);

impl PacketId {
    /// Create a new `PacketId`.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get inner u16 value.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Get byte length in packet.
    #[must_use]
    #[inline]
    pub const fn bytes() -> usize {
        2
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for PacketId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl EncodePacket for PacketId {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        buf.write_u16::<BigEndian>(self.0)?;
        Ok(Self::bytes())
    }
}

impl DecodePacket for PacketId {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        Ok(Self(ba.read_u16()?))
    }
}
