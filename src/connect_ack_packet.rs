// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::{
    ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, FixedHeader, PacketType,
    VarIntError,
};

/// Result of a connection attempt, byte 2 of the ConnectAck variable
/// header.
///
/// A server that answers with a nonzero code MUST then close the network
/// connection [MQTT-3.2.2-5].
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectReturnCode {
    /// Connection accepted.
    #[default]
    Accepted = 0,

    /// The server does not support the protocol level the client asked
    /// for.
    UnacceptableProtocolVersion = 1,

    /// The client identifier is well formed but not allowed by the
    /// server.
    IdentifierRejected = 2,

    /// The MQTT service is unavailable on this server.
    ServerUnavailable = 3,

    /// The data in the username or password is malformed.
    BadUsernameOrPassword = 4,

    /// The client is not authorized to connect.
    NotAuthorized = 5,

    /// Values 6-255 are reserved by the standard.
    Reserved = 6,
}

impl From<u8> for ConnectReturnCode {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Accepted,
            1 => Self::UnacceptableProtocolVersion,
            2 => Self::IdentifierRejected,
            3 => Self::ServerUnavailable,
            4 => Self::BadUsernameOrPassword,
            5 => Self::NotAuthorized,
            _ => Self::Reserved,
        }
    }
}

/// First packet sent from the server to the client, answering a Connect
/// packet.
///
/// Layout after the fixed header:
/// ```txt
///  7                       0
/// +-------------------------+
/// | Ack flags               |
/// +-------------------------+
/// | Return code             |
/// +-------------------------+
/// ```
///
/// Bit 0 of the ack flags is the session-present flag; bits 7-1 are
/// reserved and ignored on decode. There is no payload.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct ConnectAckPacket {
    /// The server already holds session state for this client id.
    ///
    /// Always false when the client connected with clean session, and
    /// MUST be false when the return code is nonzero [MQTT-3.2.2-4].
    session_present: bool,

    /// Result of the connection attempt.
    return_code: ConnectReturnCode,
}

impl ConnectAckPacket {
    /// Create a new connect ack packet.
    ///
    /// A nonzero return code forces the session-present flag off, as the
    /// standard requires.
    #[must_use]
    pub fn new(mut session_present: bool, return_code: ConnectReturnCode) -> Self {
        if return_code != ConnectReturnCode::Accepted {
            session_present = false;
        }
        Self {
            session_present,
            return_code,
        }
    }

    /// Update return code.
    pub fn set_return_code(&mut self, return_code: ConnectReturnCode) -> &mut Self {
        self.return_code = return_code;
        self
    }

    /// Get current return code.
    #[must_use]
    pub const fn return_code(&self) -> ConnectReturnCode {
        self.return_code
    }

    /// Update session-present flag.
    pub fn set_session_present(&mut self, session_present: bool) -> &mut Self {
        self.session_present = session_present;
        self
    }

    /// Get current session-present flag.
    #[must_use]
    pub const fn session_present(&self) -> bool {
        self.session_present
    }

    /// Number of bytes the encoded packet occupies.
    ///
    /// # Errors
    ///
    /// Never fails for this packet; the signature matches the other packet
    /// types.
    pub fn bytes(&self) -> Result<usize, VarIntError> {
        let fixed_header = FixedHeader::new(PacketType::ConnectAck, Self::body_bytes())?;
        Ok(fixed_header.bytes() + fixed_header.remaining_length())
    }

    // ack flags + return code
    const fn body_bytes() -> usize {
        2
    }
}

impl EncodePacket for ConnectAckPacket {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        let old_len = buf.len();

        let fixed_header = FixedHeader::new(PacketType::ConnectAck, Self::body_bytes())?;
        fixed_header.encode(buf)?;

        buf.push(u8::from(self.session_present));
        buf.push(self.return_code as u8);

        Ok(buf.len() - old_len)
    }
}

impl DecodePacket for ConnectAckPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        if fixed_header.packet_type() != PacketType::ConnectAck {
            return Err(DecodeError::MalformedFixedHeader);
        }

        let remaining_length = fixed_header.remaining_length();
        if remaining_length < Self::body_bytes() {
            return Err(DecodeError::Truncated);
        }
        if remaining_length > Self::body_bytes() {
            return Err(DecodeError::TrailingBytes);
        }

        // Bits 7-1 of the ack flags are reserved; only bit 0 carries
        // information.
        let ack_flags = ba.read_byte()?;
        let session_present = ack_flags & 0b0000_0001 == 0b0000_0001;
        let return_code = ConnectReturnCode::from(ba.read_byte()?);

        Ok(Self {
            session_present,
            return_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        let buf: Vec<u8> = vec![0x20, 0x02, 0x00, 0x00];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectAckPacket::decode(&mut ba).unwrap();
        assert!(!packet.session_present());
        assert_eq!(packet.return_code(), ConnectReturnCode::Accepted);
    }

    #[test]
    fn test_encode() {
        let packet = ConnectAckPacket::new(false, ConnectReturnCode::Accepted);
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf, &[0x20, 0x02, 0x00, 0x00]);
    }

    #[test]
    fn test_reserved_ack_flag_bits_ignored() {
        // Decoding any flags byte gives the same result as decoding its
        // lowest bit alone.
        for flags in [0x02_u8, 0x7e, 0xfe] {
            let with_reserved = [0x20, 0x02, flags | 0x01, 0x00];
            let plain = [0x20, 0x02, 0x01, 0x00];
            let mut ba = ByteArray::new(&with_reserved);
            let a = ConnectAckPacket::decode(&mut ba).unwrap();
            let mut ba = ByteArray::new(&plain);
            let b = ConnectAckPacket::decode(&mut ba).unwrap();
            assert_eq!(a, b);
            assert!(a.session_present());
        }
    }

    #[test]
    fn test_reserved_return_codes() {
        for code in [6_u8, 42, 255] {
            let buf = [0x20, 0x02, 0x00, code];
            let mut ba = ByteArray::new(&buf);
            let packet = ConnectAckPacket::decode(&mut ba).unwrap();
            assert_eq!(packet.return_code(), ConnectReturnCode::Reserved);
        }
    }

    #[test]
    fn test_nonzero_code_clears_session_present() {
        let packet = ConnectAckPacket::new(true, ConnectReturnCode::ServerUnavailable);
        assert!(!packet.session_present());
    }
}
