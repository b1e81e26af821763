// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::{
    ByteArray, ConnectAckPacket, ConnectPacket, DecodeError, DecodePacket, DisconnectPacket,
    EncodeError, EncodePacket, FixedHeader, PacketType, PingRequestPacket, PingResponsePacket,
    PublishAckPacket, PublishCompletePacket, PublishPacket, PublishReceivedPacket,
    PublishReleasePacket, SubscribeAckPacket, SubscribePacket, UnsubscribeAckPacket,
    UnsubscribePacket, VarIntError,
};

/// A single control packet, one variant per packet type.
///
/// This is the top of the codec: [`Packet::decode`] turns the front of a
/// byte buffer into a value of this type, and [`EncodePacket::encode`]
/// turns a value back into bytes. Both directions go through the packet
/// structs the variants carry.
#[derive(Clone, Debug, PartialEq)]
pub enum Packet {
    /// Client request to connect to the server
    Connect(ConnectPacket),

    /// Server reply to a connect request
    ConnectAck(ConnectAckPacket),

    /// Application message
    Publish(PublishPacket),

    /// Publish acknowledgement, `QoS` 1
    PublishAck(PublishAckPacket),

    /// Publish received, first reply of the `QoS` 2 handshake
    PublishReceived(PublishReceivedPacket),

    /// Publish release, second step of the `QoS` 2 handshake
    PublishRelease(PublishReleasePacket),

    /// Publish complete, final step of the `QoS` 2 handshake
    PublishComplete(PublishCompletePacket),

    /// Client subscribe request
    Subscribe(SubscribePacket),

    /// Subscribe acknowledgement
    SubscribeAck(SubscribeAckPacket),

    /// Client unsubscribe request
    Unsubscribe(UnsubscribePacket),

    /// Unsubscribe acknowledgement
    UnsubscribeAck(UnsubscribeAckPacket),

    /// Client ping request
    PingRequest(PingRequestPacket),

    /// Server ping response
    PingResponse(PingResponsePacket),

    /// Client is disconnecting cleanly
    Disconnect(DisconnectPacket),
}

impl Packet {
    /// Control packet type of this value.
    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        match self {
            Self::Connect(_) => PacketType::Connect,
            Self::ConnectAck(_) => PacketType::ConnectAck,
            Self::Publish(publish) => PacketType::Publish {
                dup: publish.dup(),
                qos: publish.qos(),
                retain: publish.retain(),
            },
            Self::PublishAck(_) => PacketType::PublishAck,
            Self::PublishReceived(_) => PacketType::PublishReceived,
            Self::PublishRelease(_) => PacketType::PublishRelease,
            Self::PublishComplete(_) => PacketType::PublishComplete,
            Self::Subscribe(_) => PacketType::Subscribe,
            Self::SubscribeAck(_) => PacketType::SubscribeAck,
            Self::Unsubscribe(_) => PacketType::Unsubscribe,
            Self::UnsubscribeAck(_) => PacketType::UnsubscribeAck,
            Self::PingRequest(_) => PacketType::PingRequest,
            Self::PingResponse(_) => PacketType::PingResponse,
            Self::Disconnect(_) => PacketType::Disconnect,
        }
    }

    /// Number of bytes the encoded packet occupies.
    ///
    /// # Errors
    ///
    /// Returns error if the packet body is too large for the wire format.
    pub fn bytes(&self) -> Result<usize, VarIntError> {
        match self {
            Self::Connect(packet) => packet.bytes(),
            Self::ConnectAck(packet) => packet.bytes(),
            Self::Publish(packet) => packet.bytes(),
            Self::PublishAck(packet) => packet.bytes(),
            Self::PublishReceived(packet) => packet.bytes(),
            Self::PublishRelease(packet) => packet.bytes(),
            Self::PublishComplete(packet) => packet.bytes(),
            Self::Subscribe(packet) => packet.bytes(),
            Self::SubscribeAck(packet) => packet.bytes(),
            Self::Unsubscribe(packet) => packet.bytes(),
            Self::UnsubscribeAck(packet) => packet.bytes(),
            Self::PingRequest(packet) => packet.bytes(),
            Self::PingResponse(packet) => packet.bytes(),
            Self::Disconnect(packet) => packet.bytes(),
        }
    }

    /// Decode one control packet from the front of `buf`.
    ///
    /// On success returns the packet and the number of bytes consumed, so
    /// a caller framing a byte stream can drop the consumed prefix and
    /// call again with the rest.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if `buf` does not yet hold a
    /// complete packet; the caller may retry after reading more bytes.
    /// Every other error means the stream is corrupt and the connection
    /// must be closed.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), DecodeError> {
        let mut ba = ByteArray::new(buf);
        let fixed_header = FixedHeader::decode(&mut ba)?;
        if ba.remaining_bytes() < fixed_header.remaining_length() {
            return Err(DecodeError::Truncated);
        }

        // Bound the reader to this packet so that a field running past the
        // declared remaining length cannot eat into the next packet.
        let consumed = ba.offset() + fixed_header.remaining_length();
        let mut ba = ByteArray::new(&buf[..consumed]);

        let packet = match fixed_header.packet_type() {
            PacketType::Connect => Self::Connect(ConnectPacket::decode(&mut ba)?),
            PacketType::ConnectAck => Self::ConnectAck(ConnectAckPacket::decode(&mut ba)?),
            PacketType::Publish { .. } => Self::Publish(PublishPacket::decode(&mut ba)?),
            PacketType::PublishAck => Self::PublishAck(PublishAckPacket::decode(&mut ba)?),
            PacketType::PublishReceived => {
                Self::PublishReceived(PublishReceivedPacket::decode(&mut ba)?)
            }
            PacketType::PublishRelease => {
                Self::PublishRelease(PublishReleasePacket::decode(&mut ba)?)
            }
            PacketType::PublishComplete => {
                Self::PublishComplete(PublishCompletePacket::decode(&mut ba)?)
            }
            PacketType::Subscribe => Self::Subscribe(SubscribePacket::decode(&mut ba)?),
            PacketType::SubscribeAck => Self::SubscribeAck(SubscribeAckPacket::decode(&mut ba)?),
            PacketType::Unsubscribe => Self::Unsubscribe(UnsubscribePacket::decode(&mut ba)?),
            PacketType::UnsubscribeAck => {
                Self::UnsubscribeAck(UnsubscribeAckPacket::decode(&mut ba)?)
            }
            PacketType::PingRequest => Self::PingRequest(PingRequestPacket::decode(&mut ba)?),
            PacketType::PingResponse => Self::PingResponse(PingResponsePacket::decode(&mut ba)?),
            PacketType::Disconnect => Self::Disconnect(DisconnectPacket::decode(&mut ba)?),
        };

        // Every field is decoded; whatever the remaining length still
        // covers is junk.
        if ba.remaining_bytes() != 0 {
            return Err(DecodeError::TrailingBytes);
        }

        Ok((packet, consumed))
    }
}

impl EncodePacket for Packet {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        match self {
            Self::Connect(packet) => packet.encode(buf),
            Self::ConnectAck(packet) => packet.encode(buf),
            Self::Publish(packet) => packet.encode(buf),
            Self::PublishAck(packet) => packet.encode(buf),
            Self::PublishReceived(packet) => packet.encode(buf),
            Self::PublishRelease(packet) => packet.encode(buf),
            Self::PublishComplete(packet) => packet.encode(buf),
            Self::Subscribe(packet) => packet.encode(buf),
            Self::SubscribeAck(packet) => packet.encode(buf),
            Self::Unsubscribe(packet) => packet.encode(buf),
            Self::UnsubscribeAck(packet) => packet.encode(buf),
            Self::PingRequest(packet) => packet.encode(buf),
            Self::PingResponse(packet) => packet.encode(buf),
            Self::Disconnect(packet) => packet.encode(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ConnectFlags, ConnectReturnCode, PacketId, QoS, SubscribeAck, SubscribeTopic,
    };

    fn sample_packets() -> Vec<Packet> {
        let mut connect = ConnectPacket::new("shrike-test").unwrap();
        let mut flags = ConnectFlags::default();
        flags.set_has_username(true).set_has_password(true);
        connect.set_connect_flags(flags);
        connect.set_username("user").unwrap();
        connect.set_password(b"secret").unwrap();

        let mut publish_qos1 = PublishPacket::new("a/b", QoS::AtLeastOnce, b"payload").unwrap();
        publish_qos1.set_packet_id(PacketId::new(10));

        vec![
            Packet::Connect(connect),
            Packet::ConnectAck(ConnectAckPacket::new(true, ConnectReturnCode::Accepted)),
            Packet::Publish(PublishPacket::new("a/b", QoS::AtMostOnce, b"m").unwrap()),
            Packet::Publish(publish_qos1),
            Packet::PublishAck(PublishAckPacket::new(PacketId::new(10))),
            Packet::PublishReceived(PublishReceivedPacket::new(PacketId::new(11))),
            Packet::PublishRelease(PublishReleasePacket::new(PacketId::new(11))),
            Packet::PublishComplete(PublishCompletePacket::new(PacketId::new(11))),
            Packet::Subscribe(SubscribePacket::with_topics(
                PacketId::new(12),
                vec![
                    SubscribeTopic::new("a/+", QoS::AtLeastOnce).unwrap(),
                    SubscribeTopic::new("b/#", QoS::ExactOnce).unwrap(),
                ],
            )),
            Packet::SubscribeAck(SubscribeAckPacket::with_vec(
                PacketId::new(12),
                vec![SubscribeAck::QoS(QoS::AtLeastOnce), SubscribeAck::Failed],
            )),
            Packet::Unsubscribe(UnsubscribePacket::with_topics(&["a/+", "b/#"], PacketId::new(13)).unwrap()),
            Packet::UnsubscribeAck(UnsubscribeAckPacket::new(PacketId::new(13))),
            Packet::PingRequest(PingRequestPacket::new()),
            Packet::PingResponse(PingResponsePacket::new()),
            Packet::Disconnect(DisconnectPacket::new()),
        ]
    }

    #[test]
    fn test_round_trip_every_type() {
        for packet in sample_packets() {
            let mut buf = Vec::new();
            let written = packet.encode(&mut buf).unwrap();
            assert_eq!(written, buf.len());
            assert_eq!(packet.bytes().unwrap(), buf.len());

            let (decoded, consumed) = Packet::decode(&buf).unwrap();
            assert_eq!(consumed, buf.len(), "{:?}", packet.packet_type());
            assert_eq!(decoded, packet);
        }
    }

    #[test]
    fn test_every_prefix_is_truncated() {
        for packet in sample_packets() {
            let mut buf = Vec::new();
            packet.encode(&mut buf).unwrap();
            for cut in 0..buf.len() {
                assert_eq!(
                    Packet::decode(&buf[..cut]),
                    Err(DecodeError::Truncated),
                    "{:?} cut at {cut}",
                    packet.packet_type()
                );
            }
        }
    }

    #[test]
    fn test_stream_framing() {
        let mut buf = Vec::new();
        let ping = Packet::PingRequest(PingRequestPacket::new());
        let publish =
            Packet::Publish(PublishPacket::new("t", QoS::AtMostOnce, b"data").unwrap());
        ping.encode(&mut buf).unwrap();
        publish.encode(&mut buf).unwrap();

        let (first, consumed) = Packet::decode(&buf).unwrap();
        assert_eq!(first, ping);
        let (second, rest) = Packet::decode(&buf[consumed..]).unwrap();
        assert_eq!(second, publish);
        assert_eq!(consumed + rest, buf.len());
    }

    #[test]
    fn test_reserved_packet_types() {
        assert_eq!(
            Packet::decode(&[0x00, 0x00]),
            Err(DecodeError::ReservedPacketType)
        );
        assert_eq!(
            Packet::decode(&[0xf0, 0x00]),
            Err(DecodeError::ReservedPacketType)
        );
    }

    #[test]
    fn test_malformed_remaining_length() {
        assert_eq!(
            Packet::decode(&[0x30, 0xff, 0xff, 0xff, 0xff, 0x00]),
            Err(DecodeError::MalformedLength)
        );
    }

    #[test]
    fn test_trailing_bytes() {
        // A Connect packet whose remaining length covers two extra bytes.
        let mut connect = Vec::new();
        ConnectPacket::new("c")
            .unwrap()
            .encode(&mut connect)
            .unwrap();
        connect[1] += 2;
        connect.extend_from_slice(&[0xaa, 0xbb]);
        assert_eq!(Packet::decode(&connect), Err(DecodeError::TrailingBytes));
    }

    #[test]
    fn test_body_cannot_reach_next_packet() {
        // The subscribe topic length points past the declared remaining
        // length, into bytes that belong to the following packet.
        let mut buf = vec![0x82, 0x05, 0x00, 0x01, 0x00, 0x04, 0x61];
        buf.extend_from_slice(&[0xc0, 0x00]);
        assert_eq!(Packet::decode(&buf), Err(DecodeError::Truncated));
    }
}
