// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::byte_array::ByteArrayError;
use crate::var_int::VarIntError;

/// Errors met while serializing a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// Field values in the packet violate the protocol.
    ///
    /// Examples are a will flag without a will topic, a password without
    /// a username, or an empty subscribe topic list.
    InvalidPacket,

    /// A length-prefixed string or binary field exceeds 65535 bytes.
    StringTooLong,

    /// The encoded packet body exceeds the Remaining Length maximum.
    PayloadTooLarge,

    /// Failed to write to the output sink.
    IoError,
}

impl From<std::io::Error> for EncodeError {
    fn from(_e: std::io::Error) -> Self {
        Self::IoError
    }
}

impl From<VarIntError> for EncodeError {
    fn from(_e: VarIntError) -> Self {
        Self::PayloadTooLarge
    }
}

/// Errors met while parsing a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended in the middle of a field.
    ///
    /// This is the only recoverable decode error: the caller may read more
    /// bytes from its transport and retry.
    Truncated,

    /// The Remaining Length field did not terminate within four bytes.
    MalformedLength,

    /// Packet type is 0 or 15, both reserved by the standard.
    ReservedPacketType,

    /// Reserved flag bits in the fixed header do not match the values
    /// required for the packet type, or the header's type does not match
    /// the packet being decoded.
    MalformedFixedHeader,

    /// A string field is not well-formed UTF-8.
    BadUtf8,

    /// The packet body declared more bytes than its fields consume.
    TrailingBytes,

    /// A cross-field rule of the standard is violated.
    ///
    /// Covers invalid connect flag combinations, a reserved `QoS` value,
    /// an unknown subscribe return code, an empty topic list and similar
    /// malformed content with a well-formed frame around it.
    ProtocolViolation,
}

impl From<ByteArrayError> for DecodeError {
    fn from(e: ByteArrayError) -> Self {
        match e {
            ByteArrayError::OutOfRange => Self::Truncated,
            ByteArrayError::InvalidString => Self::BadUtf8,
        }
    }
}

impl From<std::string::FromUtf8Error> for DecodeError {
    fn from(_e: std::string::FromUtf8Error) -> Self {
        Self::BadUtf8
    }
}
