// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::{
    ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, FixedHeader, PacketId,
    PacketType, QoS, VarIntError,
};

/// Server verdict on one subscription request.
///
/// Wire values are 0, 1 and 2 for a granted maximum `QoS` and `0x80` for
/// failure; everything else is malformed [MQTT-3.9.3-2].
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscribeAck {
    /// Subscription accepted, with the maximum `QoS` the server grants.
    QoS(QoS),

    /// Subscription refused.
    #[default]
    Failed,
}

impl SubscribeAck {
    /// Get byte length in packet.
    #[must_use]
    #[inline]
    pub const fn bytes() -> usize {
        1
    }
}

/// Reply to a Subscribe packet.
///
/// Layout after the fixed header:
/// ```txt
/// +---------------------------+
/// | Packet id                 |
/// |                           |
/// +---------------------------+
/// | Return code 0             |
/// +---------------------------+
/// | Return code 1             |
/// +---------------------------+
/// | Return code N ...         |
/// +---------------------------+
/// ```
///
/// Return codes answer the filters of the Subscribe packet in order, one
/// each, so the list is never empty.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubscribeAckPacket {
    /// Packet id of the Subscribe packet this acknowledges.
    packet_id: PacketId,

    /// One verdict per requested filter, in request order.
    acknowledgements: Vec<SubscribeAck>,
}

impl SubscribeAckPacket {
    /// Create a subscribe ack packet with a single `ack`.
    #[must_use]
    pub fn new(packet_id: PacketId, ack: SubscribeAck) -> Self {
        Self {
            packet_id,
            acknowledgements: vec![ack],
        }
    }

    /// Create a subscribe ack packet with multiple `acknowledgements`.
    #[must_use]
    pub fn with_vec(packet_id: PacketId, acknowledgements: Vec<SubscribeAck>) -> Self {
        Self {
            packet_id,
            acknowledgements,
        }
    }

    /// Update packet id.
    pub fn set_packet_id(&mut self, packet_id: PacketId) -> &mut Self {
        self.packet_id = packet_id;
        self
    }

    /// Get current packet id.
    #[must_use]
    #[inline]
    pub const fn packet_id(&self) -> PacketId {
        self.packet_id
    }

    /// Get current acknowledgements.
    #[must_use]
    pub fn acknowledgements(&self) -> &[SubscribeAck] {
        &self.acknowledgements
    }

    fn get_fixed_header(&self) -> Result<FixedHeader, VarIntError> {
        let remaining_length =
            PacketId::bytes() + SubscribeAck::bytes() * self.acknowledgements.len();
        FixedHeader::new(PacketType::SubscribeAck, remaining_length)
    }

    /// Number of bytes the encoded packet occupies.
    ///
    /// # Errors
    ///
    /// Returns error if the packet body is too large for the wire format.
    pub fn bytes(&self) -> Result<usize, VarIntError> {
        let fixed_header = self.get_fixed_header()?;
        Ok(fixed_header.bytes() + fixed_header.remaining_length())
    }
}

impl EncodePacket for SubscribeAckPacket {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        // One return code per requested filter, so none at all is invalid.
        if self.acknowledgements.is_empty() {
            return Err(EncodeError::InvalidPacket);
        }
        let old_len = buf.len();

        let fixed_header = self.get_fixed_header()?;
        fixed_header.encode(buf)?;

        self.packet_id.encode(buf)?;
        for ack in &self.acknowledgements {
            let byte = match *ack {
                SubscribeAck::QoS(qos) => qos as u8,
                SubscribeAck::Failed => 0b1000_0000,
            };
            buf.push(byte);
        }

        Ok(buf.len() - old_len)
    }
}

impl DecodePacket for SubscribeAckPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        if fixed_header.packet_type() != PacketType::SubscribeAck {
            return Err(DecodeError::MalformedFixedHeader);
        }

        let packet_id = PacketId::decode(ba)?;

        let mut acknowledgements = Vec::new();
        let mut consumed = PacketId::bytes();
        while consumed < fixed_header.remaining_length() {
            let byte = ba.read_byte()?;
            consumed += SubscribeAck::bytes();
            let ack = match byte {
                0x00 => SubscribeAck::QoS(QoS::AtMostOnce),
                0x01 => SubscribeAck::QoS(QoS::AtLeastOnce),
                0x02 => SubscribeAck::QoS(QoS::ExactOnce),
                0x80 => SubscribeAck::Failed,
                _ => {
                    log::error!("subscribe_ack: unknown return code {byte:#04x}");
                    return Err(DecodeError::ProtocolViolation);
                }
            };
            acknowledgements.push(ack);
        }

        if acknowledgements.is_empty() {
            return Err(DecodeError::ProtocolViolation);
        }

        Ok(Self {
            packet_id,
            acknowledgements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let packet =
            SubscribeAckPacket::new(PacketId::new(1), SubscribeAck::QoS(QoS::AtLeastOnce));
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf, &[0x90, 0x03, 0x00, 0x01, 0x01]);
    }

    #[test]
    fn test_round_trip_mixed_verdicts() {
        let packet = SubscribeAckPacket::with_vec(
            PacketId::new(21),
            vec![
                SubscribeAck::QoS(QoS::ExactOnce),
                SubscribeAck::Failed,
                SubscribeAck::QoS(QoS::AtMostOnce),
            ],
        );
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf, &[0x90, 0x05, 0x00, 0x15, 0x02, 0x80, 0x00]);

        let mut ba = ByteArray::new(&buf);
        assert_eq!(SubscribeAckPacket::decode(&mut ba).unwrap(), packet);
    }

    #[test]
    fn test_decode_unknown_return_code() {
        for byte in [0x03, 0x41, 0x81, 0xff] {
            let buf = [0x90, 0x03, 0x00, 0x01, byte];
            let mut ba = ByteArray::new(&buf);
            assert_eq!(
                SubscribeAckPacket::decode(&mut ba),
                Err(DecodeError::ProtocolViolation),
                "return code {byte:#04x}"
            );
        }
    }

    #[test]
    fn test_decode_empty_list() {
        let buf = [0x90, 0x02, 0x00, 0x01];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(
            SubscribeAckPacket::decode(&mut ba),
            Err(DecodeError::ProtocolViolation)
        );
    }
}
