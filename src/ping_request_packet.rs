// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::{
    ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, FixedHeader, PacketType,
    VarIntError,
};

/// The PingRequest packet tells the server the client is still alive.
///
/// Clients send it when no other packet has gone out within the keep
/// alive interval. It has no variable header and no payload; the
/// remaining length MUST be zero.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct PingRequestPacket;

impl PingRequestPacket {
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
        let fixed_header = FixedHeader::new(PacketType::PingRequest, 0)?;
        Ok(fixed_header.bytes())
    }
}

impl EncodePacket for PingRequestPacket {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        // No variable header, no payload.
        let fixed_header = FixedHeader::new(PacketType::PingRequest, 0)?;
        fixed_header.encode(buf)
    }
}

impl DecodePacket for PingRequestPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        if fixed_header.packet_type() != PacketType::PingRequest {
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
        let packet = PingRequestPacket::new();
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf, &[0xc0, 0x00]);

        let mut ba = ByteArray::new(&buf);
        assert_eq!(PingRequestPacket::decode(&mut ba).unwrap(), packet);
    }

    #[test]
    fn test_decode_nonzero_length() {
        let buf = [0xc0, 0x01, 0x00];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(
            PingRequestPacket::decode(&mut ba),
            Err(DecodeError::ProtocolViolation)
        );
    }
}
