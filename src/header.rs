// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::{ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, QoS, VarInt, VarIntError};

/// Type of a control packet, the upper nibble of the first byte on the wire.
///
/// The Publish variant carries the three flag bits of its lower nibble,
/// since they belong to the packet rather than to the type. For every other
/// type the lower nibble is reserved and fixed by the standard
/// [MQTT-2.2.2-1].
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum PacketType {
    /// Client request to connect to the server
    #[default]
    Connect,

    /// Server reply to a connect request
    ConnectAck,

    /// Application message with its header flags
    Publish {
        /// This packet is a re-delivery of an earlier attempt.
        dup: bool,
        /// Delivery guarantee for this message.
        qos: QoS,
        /// Store the message on the server for future subscribers.
        retain: bool,
    },

    /// Publish acknowledgement, `QoS` 1
    PublishAck,

    /// Publish received, first reply of the `QoS` 2 handshake
    PublishReceived,

    /// Publish release, second step of the `QoS` 2 handshake
    PublishRelease,

    /// Publish complete, final step of the `QoS` 2 handshake
    PublishComplete,

    /// Client subscribe request
    Subscribe,

    /// Subscribe acknowledgement
    SubscribeAck,

    /// Client unsubscribe request
    Unsubscribe,

    /// Unsubscribe acknowledgement
    UnsubscribeAck,

    /// Client ping request
    PingRequest,

    /// Server ping response
    PingResponse,

    /// Client is disconnecting cleanly
    Disconnect,
}

impl PacketType {
    /// Get byte length in packet.
    #[must_use]
    #[inline]
    pub const fn bytes() -> usize {
        1
    }
}

impl From<PacketType> for u8 {
    fn from(packet_type: PacketType) -> Self {
        let type_bits: u8 = match packet_type {
            PacketType::Connect => 1,
            PacketType::ConnectAck => 2,
            PacketType::Publish { .. } => 3,
            PacketType::PublishAck => 4,
            PacketType::PublishReceived => 5,
            PacketType::PublishRelease => 6,
            PacketType::PublishComplete => 7,
            PacketType::Subscribe => 8,
            PacketType::SubscribeAck => 9,
            PacketType::Unsubscribe => 10,
            PacketType::UnsubscribeAck => 11,
            PacketType::PingRequest => 12,
            PacketType::PingResponse => 13,
            PacketType::Disconnect => 14,
        };

        let flag_bits: u8 = match packet_type {
            PacketType::Publish { dup, qos, retain } => {
                let dup = if dup { 0b0000_1000 } else { 0b0000_0000 };
                let qos = (qos as u8) << 1;
                let retain = u8::from(retain);
                dup | qos | retain
            }
            // The lower nibble of PUBREL, SUBSCRIBE and UNSUBSCRIBE is
            // reserved and MUST be 0b0010 [MQTT-3.6.1-1], [MQTT-3.8.1-1],
            // [MQTT-3.10.1-1].
            PacketType::PublishRelease | PacketType::Subscribe | PacketType::Unsubscribe => {
                0b0000_0010
            }
            _ => 0b0000_0000,
        };

        (type_bits << 4) | flag_bits
    }
}

impl TryFrom<u8> for PacketType {
    type Error = DecodeError;

    /// Parse the packet type and its flag nibble from the first byte.
    ///
    /// # Errors
    ///
    /// Returns `ReservedPacketType` for types 0 and 15, and
    /// `MalformedFixedHeader` when reserved flag bits do not hold the value
    /// the standard fixes for the type [MQTT-2.2.2-2].
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        let type_bits = (v & 0b1111_0000) >> 4;
        let flag = v & 0b0000_1111;

        let expect_flag = |packet_type: Self, expected: u8| {
            if flag == expected {
                Ok(packet_type)
            } else {
                log::error!("header: invalid flag nibble {flag:#06b} for {packet_type:?}");
                Err(DecodeError::MalformedFixedHeader)
            }
        };

        match type_bits {
            0 | 15 => Err(DecodeError::ReservedPacketType),
            1 => expect_flag(Self::Connect, 0b0000_0000),
            2 => expect_flag(Self::ConnectAck, 0b0000_0000),
            3 => {
                let dup = flag & 0b0000_1000 == 0b0000_1000;
                let retain = flag & 0b0000_0001 == 0b0000_0001;
                // A reserved qos value in the header is a violation of the
                // Publish packet rules, not a malformed nibble.
                let qos = QoS::try_from((flag & 0b0000_0110) >> 1)?;
                Ok(Self::Publish { dup, qos, retain })
            }
            4 => expect_flag(Self::PublishAck, 0b0000_0000),
            5 => expect_flag(Self::PublishReceived, 0b0000_0000),
            6 => expect_flag(Self::PublishRelease, 0b0000_0010),
            7 => expect_flag(Self::PublishComplete, 0b0000_0000),
            8 => expect_flag(Self::Subscribe, 0b0000_0010),
            9 => expect_flag(Self::SubscribeAck, 0b0000_0000),
            10 => expect_flag(Self::Unsubscribe, 0b0000_0010),
            11 => expect_flag(Self::UnsubscribeAck, 0b0000_0000),
            12 => expect_flag(Self::PingRequest, 0b0000_0000),
            13 => expect_flag(Self::PingResponse, 0b0000_0000),
            14 => expect_flag(Self::Disconnect, 0b0000_0000),
            _ => unreachable!("type_bits is a four bit value"),
        }
    }
}

/// Fixed header part of a control packet, at least two bytes.
///
/// ```txt
///  7 6 5 4 3 2 1 0
/// +-------+-------+
/// | Type  | Flags |
/// +-------+-------+
/// | Remaining Len |
/// +-------+-------+
/// ```
///
/// The remaining length counts the bytes of variable header and payload
/// that follow the fixed header.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedHeader {
    packet_type: PacketType,
    remaining_length: VarInt,
}

impl FixedHeader {
    /// Create a new fixed header with `packet_type` and `remaining_length`.
    ///
    /// # Errors
    ///
    /// Returns error if `remaining_length` does not fit the wire encoding.
    pub fn new(packet_type: PacketType, remaining_length: usize) -> Result<Self, VarIntError> {
        let remaining_length = VarInt::from(remaining_length)?;
        Ok(Self {
            packet_type,
            remaining_length,
        })
    }

    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    #[must_use]
    pub const fn remaining_length(&self) -> usize {
        self.remaining_length.value()
    }

    /// Get byte length in packet.
    #[must_use]
    pub const fn bytes(&self) -> usize {
        PacketType::bytes() + self.remaining_length.bytes()
    }
}

impl DecodePacket for FixedHeader {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let flag = ba.read_byte()?;
        let packet_type = PacketType::try_from(flag)?;
        let remaining_length = VarInt::decode(ba)?;

        Ok(Self {
            packet_type,
            remaining_length,
        })
    }
}

impl EncodePacket for FixedHeader {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        buf.push(self.packet_type.into());
        self.remaining_length.encode(buf)?;
        Ok(self.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let mut buf = Vec::new();
        let fixed_header = FixedHeader::new(PacketType::PingResponse, 0).unwrap();
        assert_eq!(fixed_header.encode(&mut buf).unwrap(), 2);
        assert_eq!(&buf, &[0xd0, 0x00]);
    }

    #[test]
    fn test_decode_publish() {
        let buf = [
            0x30, 0x13, 0x00, 0x05, 0x68, 0x65, 0x6c, 0x6c, 0x6f, 0x48, 0x65, 0x6c, 0x6c, 0x6f,
            0x2c, 0x20, 0x77, 0x6f, 0x72,
        ];
        let mut ba = ByteArray::new(&buf);
        let fixed_header = FixedHeader::decode(&mut ba).unwrap();
        assert_eq!(
            fixed_header.packet_type(),
            PacketType::Publish {
                dup: false,
                qos: QoS::AtMostOnce,
                retain: false
            }
        );
        assert_eq!(fixed_header.remaining_length(), 19);
    }

    #[test]
    fn test_reserved_packet_types() {
        for byte in 0x00..=0x0f_u8 {
            assert_eq!(
                PacketType::try_from(byte),
                Err(DecodeError::ReservedPacketType),
                "byte {byte:#04x}"
            );
        }
        for byte in 0xf0..=0xff_u8 {
            assert_eq!(
                PacketType::try_from(byte),
                Err(DecodeError::ReservedPacketType),
                "byte {byte:#04x}"
            );
        }
    }

    #[test]
    fn test_reserved_flag_nibbles() {
        // Zero nibble required.
        for byte in [0x11, 0x2f, 0x41, 0x52, 0x74, 0x98, 0xb1, 0xc4, 0xd8, 0xe1] {
            assert_eq!(
                PacketType::try_from(byte),
                Err(DecodeError::MalformedFixedHeader),
                "byte {byte:#04x}"
            );
        }
        // 0b0010 nibble required.
        for byte in [0x60, 0x63, 0x80, 0x86, 0xa0, 0xaf] {
            assert_eq!(
                PacketType::try_from(byte),
                Err(DecodeError::MalformedFixedHeader),
                "byte {byte:#04x}"
            );
        }
        assert_eq!(PacketType::try_from(0x62), Ok(PacketType::PublishRelease));
        assert_eq!(PacketType::try_from(0x82), Ok(PacketType::Subscribe));
        assert_eq!(PacketType::try_from(0xa2), Ok(PacketType::Unsubscribe));
    }

    #[test]
    fn test_publish_qos_reserved() {
        // qos bits 0b11 in a Publish header
        assert_eq!(
            PacketType::try_from(0x36),
            Err(DecodeError::ProtocolViolation)
        );
    }

    #[test]
    fn test_publish_flags_round_trip() {
        for byte in [0x30, 0x31, 0x32, 0x34, 0x38, 0x3d] {
            let packet_type = PacketType::try_from(byte).unwrap();
            assert_eq!(u8::from(packet_type), byte);
        }
    }
}
