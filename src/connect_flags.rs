// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::{ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, QoS};

/// Flag byte in the Connect packet variable header.
///
/// ```txt
///         7               6              5          4-3          2            1             0
/// +---------------+---------------+-------------+----------+-----------+---------------+----------+
/// | Username Flag | Password Flag | Will Retain | Will QoS | Will Flag | Clean Session | Reserved |
/// +---------------+---------------+-------------+----------+-----------+---------------+----------+
/// ```
///
/// The flag bits announce which optional payload fields follow, so they are
/// coupled: a password needs a username, and the will qos/retain bits mean
/// nothing without the will flag. Bit 0 is reserved and MUST be zero on the
/// wire [MQTT-3.1.2-3].
#[allow(clippy::struct_excessive_bools)]
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectFlags {
    /// A username is present in the payload.
    has_username: bool,

    /// A password is present in the payload. Requires `has_username`.
    has_password: bool,

    /// Retain the will message when it is published.
    will_retain: bool,

    /// `QoS` level for publishing the will message.
    will_qos: QoS,

    /// A will topic and will message are present in the payload.
    ///
    /// The server stores the will message and publishes it when the client
    /// connection closes without a Disconnect packet.
    will: bool,

    /// Discard any previous session state on both sides and start clean.
    clean_session: bool,
}

impl ConnectFlags {
    /// Get byte length in packet.
    #[must_use]
    #[inline]
    pub const fn bytes() -> usize {
        1
    }

    /// Update `has_username` flag.
    pub fn set_has_username(&mut self, has_username: bool) -> &mut Self {
        self.has_username = has_username;
        self
    }

    /// Get current `has_username` flag.
    #[must_use]
    #[inline]
    pub const fn has_username(&self) -> bool {
        self.has_username
    }

    /// Update `has_password` flag.
    pub fn set_has_password(&mut self, has_password: bool) -> &mut Self {
        self.has_password = has_password;
        self
    }

    /// Get current `has_password` flag.
    #[must_use]
    #[inline]
    pub const fn has_password(&self) -> bool {
        self.has_password
    }

    /// Update will-retain flag.
    pub fn set_will_retain(&mut self, will_retain: bool) -> &mut Self {
        self.will_retain = will_retain;
        self
    }

    /// Get current will-retain flag.
    #[must_use]
    #[inline]
    pub const fn will_retain(&self) -> bool {
        self.will_retain
    }

    /// Update will-qos value.
    pub fn set_will_qos(&mut self, qos: QoS) -> &mut Self {
        self.will_qos = qos;
        self
    }

    /// Get current will-qos value.
    #[must_use]
    #[inline]
    pub const fn will_qos(&self) -> QoS {
        self.will_qos
    }

    /// Update will flag.
    ///
    /// Clearing the will flag also clears the will-qos and will-retain
    /// fields, as the standard requires them zero in that case.
    pub fn set_will(&mut self, will: bool) -> &mut Self {
        if !will {
            self.will_qos = QoS::AtMostOnce;
            self.will_retain = false;
        }
        self.will = will;
        self
    }

    /// Get current will flag.
    #[must_use]
    #[inline]
    pub const fn will(&self) -> bool {
        self.will
    }

    /// Update clean-session flag.
    pub fn set_clean_session(&mut self, clean_session: bool) -> &mut Self {
        self.clean_session = clean_session;
        self
    }

    /// Get current clean-session flag.
    #[must_use]
    #[inline]
    pub const fn clean_session(&self) -> bool {
        self.clean_session
    }

    /// Check the coupled-bit rules before the flags go on the wire.
    ///
    /// # Errors
    ///
    /// Returns error if the will-qos or will-retain fields are set without
    /// the will flag, or a password is announced without a username.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if !self.will && (self.will_qos != QoS::AtMostOnce || self.will_retain) {
            return Err(EncodeError::InvalidPacket);
        }
        if !self.has_username && self.has_password {
            return Err(EncodeError::InvalidPacket);
        }
        Ok(())
    }
}

impl Default for ConnectFlags {
    fn default() -> Self {
        Self {
            has_username: false,
            has_password: false,
            will_retain: false,
            will_qos: QoS::AtMostOnce,
            will: false,
            clean_session: true,
        }
    }
}

impl EncodePacket for ConnectFlags {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        let mut flags: u8 = 0b0000_0000;
        if self.has_username {
            flags |= 0b1000_0000;
        }
        if self.has_password {
            flags |= 0b0100_0000;
        }
        if self.will_retain {
            flags |= 0b0010_0000;
        }
        flags |= (self.will_qos as u8) << 3;
        if self.will {
            flags |= 0b0000_0100;
        }
        if self.clean_session {
            flags |= 0b0000_0010;
        }
        buf.push(flags);

        Ok(Self::bytes())
    }
}

impl DecodePacket for ConnectFlags {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let flags = ba.read_byte()?;

        // The reserved bit MUST be zero [MQTT-3.1.2-3].
        if flags & 0b0000_0001 != 0b0000_0000 {
            return Err(DecodeError::ProtocolViolation);
        }

        let has_username = flags & 0b1000_0000 == 0b1000_0000;
        let has_password = flags & 0b0100_0000 == 0b0100_0000;
        let will_retain = flags & 0b0010_0000 == 0b0010_0000;
        let will_qos = QoS::try_from((flags & 0b0001_1000) >> 3)?;
        let will = flags & 0b0000_0100 == 0b0000_0100;
        let clean_session = flags & 0b0000_0010 == 0b0000_0010;

        // If the Will Flag is zero, Will QoS and Will Retain MUST be zero
        // [MQTT-3.1.2-13], [MQTT-3.1.2-15].
        if !will && (will_qos != QoS::AtMostOnce || will_retain) {
            return Err(DecodeError::ProtocolViolation);
        }

        // If the User Name Flag is zero, the Password Flag MUST be zero
        // [MQTT-3.1.2-22].
        if !has_username && has_password {
            return Err(DecodeError::ProtocolViolation);
        }

        Ok(Self {
            has_username,
            has_password,
            will_retain,
            will_qos,
            will,
            clean_session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_byte(byte: u8) -> Result<ConnectFlags, DecodeError> {
        let buf = [byte];
        let mut ba = ByteArray::new(&buf);
        ConnectFlags::decode(&mut ba)
    }

    #[test]
    fn test_round_trip() {
        let mut flags = ConnectFlags::default();
        flags
            .set_has_username(true)
            .set_has_password(true)
            .set_will(true)
            .set_will_qos(QoS::AtLeastOnce)
            .set_will_retain(true);

        let mut buf = Vec::new();
        flags.encode(&mut buf).unwrap();
        assert_eq!(&buf, &[0b1110_1110]);

        let mut ba = ByteArray::new(&buf);
        assert_eq!(ConnectFlags::decode(&mut ba).unwrap(), flags);
    }

    #[test]
    fn test_reserved_bit_rejected() {
        assert_eq!(decode_byte(0b0000_0001), Err(DecodeError::ProtocolViolation));
        assert_eq!(decode_byte(0b0000_0011), Err(DecodeError::ProtocolViolation));
    }

    #[test]
    fn test_password_requires_username() {
        assert_eq!(decode_byte(0b0100_0000), Err(DecodeError::ProtocolViolation));
        assert!(decode_byte(0b1100_0000).is_ok());
    }

    #[test]
    fn test_will_bits_require_will_flag() {
        // will-qos 1 without will flag
        assert_eq!(decode_byte(0b0000_1000), Err(DecodeError::ProtocolViolation));
        // will-retain without will flag
        assert_eq!(decode_byte(0b0010_0000), Err(DecodeError::ProtocolViolation));
        // will-qos 3 is always invalid
        assert_eq!(decode_byte(0b0001_1100), Err(DecodeError::ProtocolViolation));
        assert!(decode_byte(0b0000_1100).is_ok());
    }

    #[test]
    fn test_validate() {
        let mut flags = ConnectFlags::default();
        flags.set_will_qos(QoS::ExactOnce);
        assert_eq!(flags.validate(), Err(EncodeError::InvalidPacket));

        let mut flags = ConnectFlags::default();
        flags.set_has_password(true);
        assert_eq!(flags.validate(), Err(EncodeError::InvalidPacket));

        let mut flags = ConnectFlags::default();
        flags.set_will(true).set_will_qos(QoS::ExactOnce);
        assert!(flags.validate().is_ok());
    }
}
