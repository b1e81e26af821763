// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::io::Write;

use bytes::BytesMut;

use crate::{
    ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, FixedHeader, PacketId,
    PacketType, QoS, StringData, VarIntError,
};

/// The Publish packet carries an application message between client and
/// server, in either direction.
///
/// Layout after the fixed header:
/// ```txt
///  7                     0
/// +-----------------------+
/// | Topic name length     |
/// |                       |
/// +-----------------------+
/// | Topic name ...        |
/// +-----------------------+
/// | Packet id (QoS 1, 2)  |
/// |                       |
/// +-----------------------+
/// | Payload ...           |
/// +-----------------------+
/// ```
///
/// The dup, qos and retain flags live in the lower nibble of the fixed
/// header. The packet identifier is on the wire only when qos is 1 or 2,
/// and the payload is whatever is left of the declared remaining length,
/// possibly nothing.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PublishPacket {
    /// This packet re-delivers an earlier attempt. MUST be false for
    /// `QoS` 0 messages [MQTT-3.3.1-2].
    dup: bool,

    /// Delivery guarantee for this message.
    qos: QoS,

    /// Ask the server to keep the message for future subscribers of the
    /// topic. A retained message with an empty payload clears the stored
    /// one.
    retain: bool,

    /// Topic the message is published to.
    topic: StringData,

    /// Identifier linking this packet to its acknowledgement. Present
    /// exactly when qos is 1 or 2.
    packet_id: Option<PacketId>,

    /// Application payload, opaque to the codec.
    payload: BytesMut,
}

impl PublishPacket {
    /// Create a new publish packet.
    ///
    /// # Errors
    ///
    /// Returns error if `topic` is too long.
    pub fn new(topic: &str, qos: QoS, payload: &[u8]) -> Result<Self, EncodeError> {
        Ok(Self {
            dup: false,
            qos,
            retain: false,
            topic: StringData::from(topic)?,
            packet_id: None,
            payload: BytesMut::from(payload),
        })
    }

    /// Update `retain` flag.
    pub fn set_retain(&mut self, retain: bool) -> &mut Self {
        self.retain = retain;
        self
    }

    /// Get current `retain` flag.
    #[must_use]
    pub const fn retain(&self) -> bool {
        self.retain
    }

    /// Update `dup` flag.
    ///
    /// # Errors
    ///
    /// Returns error when setting `dup` on a `QoS` 0 packet.
    pub fn set_dup(&mut self, dup: bool) -> Result<&mut Self, EncodeError> {
        if dup && self.qos == QoS::AtMostOnce {
            return Err(EncodeError::InvalidPacket);
        }
        self.dup = dup;
        Ok(self)
    }

    /// Get current `dup` flag.
    #[must_use]
    pub const fn dup(&self) -> bool {
        self.dup
    }

    /// Update `QoS` value.
    ///
    /// Dropping to `QoS` 0 clears the packet identifier and the dup flag,
    /// neither of which exists at that level.
    pub fn set_qos(&mut self, qos: QoS) -> &mut Self {
        if qos == QoS::AtMostOnce {
            self.packet_id = None;
            self.dup = false;
        }
        self.qos = qos;
        self
    }

    /// Get current `QoS` value.
    #[must_use]
    pub const fn qos(&self) -> QoS {
        self.qos
    }

    /// Update packet id. Meaningful only when qos is 1 or 2.
    pub fn set_packet_id(&mut self, packet_id: PacketId) -> &mut Self {
        self.packet_id = Some(packet_id);
        self
    }

    /// Get current packet id, if the `QoS` level carries one.
    #[must_use]
    pub const fn packet_id(&self) -> Option<PacketId> {
        self.packet_id
    }

    /// Update topic.
    ///
    /// # Errors
    ///
    /// Returns error if `topic` is too long.
    pub fn set_topic(&mut self, topic: &str) -> Result<&mut Self, EncodeError> {
        self.topic = StringData::from(topic)?;
        Ok(self)
    }

    /// Get current topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        self.topic.as_ref()
    }

    /// Get the application payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Append bytes to the application payload.
    pub fn append(&mut self, payload_parts: &[u8]) {
        self.payload.extend_from_slice(payload_parts);
    }

    fn validate(&self) -> Result<(), EncodeError> {
        if self.dup && self.qos == QoS::AtMostOnce {
            return Err(EncodeError::InvalidPacket);
        }
        // The wire carries a packet id exactly when qos > 0.
        if (self.qos == QoS::AtMostOnce) != self.packet_id.is_none() {
            return Err(EncodeError::InvalidPacket);
        }
        Ok(())
    }

    fn get_fixed_header(&self) -> Result<FixedHeader, VarIntError> {
        let mut remaining_length = self.topic.bytes() + self.payload.len();
        if self.qos != QoS::AtMostOnce {
            remaining_length += PacketId::bytes();
        }

        let packet_type = PacketType::Publish {
            dup: self.dup,
            qos: self.qos,
            retain: self.retain,
        };
        FixedHeader::new(packet_type, remaining_length)
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

impl EncodePacket for PublishPacket {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        self.validate()?;
        let old_len = buf.len();

        let fixed_header = self.get_fixed_header()?;
        fixed_header.encode(buf)?;

        // Variable header
        self.topic.encode(buf)?;
        if let Some(packet_id) = self.packet_id {
            packet_id.encode(buf)?;
        }

        // Payload
        buf.write_all(&self.payload)?;

        Ok(buf.len() - old_len)
    }
}

impl DecodePacket for PublishPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        let PacketType::Publish { dup, qos, retain } = fixed_header.packet_type() else {
            return Err(DecodeError::MalformedFixedHeader);
        };

        // The DUP flag MUST be 0 for all QoS 0 messages [MQTT-3.3.1-2].
        if dup && qos == QoS::AtMostOnce {
            return Err(DecodeError::ProtocolViolation);
        }

        let topic = StringData::decode(ba)?;
        let packet_id = if qos == QoS::AtMostOnce {
            None
        } else {
            Some(PacketId::decode(ba)?)
        };

        // The payload is whatever the remaining length has left over.
        let mut consumed = topic.bytes();
        if packet_id.is_some() {
            consumed += PacketId::bytes();
        }
        let Some(payload_len) = fixed_header.remaining_length().checked_sub(consumed) else {
            log::error!(
                "publish: remaining length {} shorter than variable header {consumed}",
                fixed_header.remaining_length()
            );
            return Err(DecodeError::Truncated);
        };
        let payload = BytesMut::from(ba.read_bytes(payload_len)?);

        Ok(Self {
            dup,
            qos,
            retain,
            topic,
            packet_id,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_qos0() {
        let mut packet = PublishPacket::new("a/b", QoS::AtMostOnce, &[0xde, 0xad]).unwrap();
        packet.set_retain(false);
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf, &[0x30, 0x07, 0x00, 0x03, 0x61, 0x2f, 0x62, 0xde, 0xad]);
    }

    #[test]
    fn test_decode_qos0_has_no_packet_id() {
        let buf = [0x30, 0x07, 0x00, 0x03, 0x61, 0x2f, 0x62, 0xde, 0xad];
        let mut ba = ByteArray::new(&buf);
        let packet = PublishPacket::decode(&mut ba).unwrap();
        assert_eq!(packet.topic(), "a/b");
        assert_eq!(packet.packet_id(), None);
        assert_eq!(packet.payload(), &[0xde, 0xad]);
    }

    #[test]
    fn test_encode_qos1_empty_payload() {
        let mut packet = PublishPacket::new("x", QoS::AtLeastOnce, &[]).unwrap();
        packet.set_packet_id(PacketId::new(7));
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf, &[0x32, 0x05, 0x00, 0x01, 0x78, 0x00, 0x07]);

        let mut ba = ByteArray::new(&buf);
        let decoded = PublishPacket::decode(&mut ba).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.packet_id(), Some(PacketId::new(7)));
        assert!(decoded.payload().is_empty());
    }

    #[test]
    fn test_decode_dup_on_qos0() {
        let buf = [0x38, 0x07, 0x00, 0x03, 0x61, 0x2f, 0x62, 0xde, 0xad];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(
            PublishPacket::decode(&mut ba),
            Err(DecodeError::ProtocolViolation)
        );
    }

    #[test]
    fn test_encode_missing_packet_id() {
        let packet = PublishPacket::new("t", QoS::AtLeastOnce, b"m").unwrap();
        let mut buf = Vec::new();
        assert_eq!(packet.encode(&mut buf), Err(EncodeError::InvalidPacket));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_set_qos_clears_packet_id() {
        let mut packet = PublishPacket::new("t", QoS::ExactOnce, b"m").unwrap();
        packet.set_packet_id(PacketId::new(3));
        packet.set_qos(QoS::AtMostOnce);
        assert_eq!(packet.packet_id(), None);

        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        let mut ba = ByteArray::new(&buf);
        assert_eq!(PublishPacket::decode(&mut ba).unwrap(), packet);
    }
}
