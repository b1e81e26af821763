// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::{
    ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, FixedHeader, PacketType,
    VarIntError,
};

/// The Disconnect packet is the final packet a client sends.
///
/// It announces a clean shutdown: on receipt the server discards the will
/// message without publishing it and closes the connection. No variable
/// header, no payload; the remaining length MUST be zero.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct DisconnectPacket;

impl DisconnectPacket {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Number of bytes the encoded packet occupies.
    ///
    /// # Errors
    ///
    /// Never fails for this packet; the signature matches the other packet
    /// types.
    pub fn bytes(&self) -> Result<usize, VarIntError> {
        let fixed_header = FixedHeader::new(PacketType::Disconnect, 0)?;
        Ok(fixed_header.bytes())
    }
}

impl EncodePacket for DisconnectPacket {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        // No variable header, no payload.
        let fixed_header = FixedHeader::new(PacketType::Disconnect, 0)?;
        fixed_header.encode(buf)
    }
}

impl DecodePacket for DisconnectPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        if fixed_header.packet_type() != PacketType::Disconnect {
            Err(DecodeError::MalformedFixedHeader)
        } else if fixed_header.remaining_length() != 0 {
            Err(DecodeError::ProtocolViolation)
        } else {
            Ok(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let packet = DisconnectPacket::new();
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf, &[0xe0, 0x00]);

        let mut ba = ByteArray::new(&buf);
        assert_eq!(DisconnectPacket::decode(&mut ba).unwrap(), packet);
    }

    #[test]
    fn test_decode_nonzero_length() {
        let buf = [0xe0, 0x02, 0x00, 0x00];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(
            DisconnectPacket::decode(&mut ba),
            Err(DecodeError::ProtocolViolation)
        );
    }
}
