// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::{
    BinaryData, ByteArray, ConnectFlags, DecodeError, DecodePacket, EncodeError, EncodePacket,
    FixedHeader, PacketType, ProtocolLevel, StringData, U16Data, VarIntError, PROTOCOL_NAME,
};

/// The Connect packet is the first packet a client sends after the network
/// connection is established.
///
/// Layout after the fixed header:
/// ```txt
///  7                          0
/// +----------------------------+
/// | Protocol name length       |
/// |                            |
/// +----------------------------+
/// | Protocol name "MQTT"       |
/// +----------------------------+
/// | Protocol level             |
/// +----------------------------+
/// | Connect flags              |
/// +----------------------------+
/// | Keep alive                 |
/// |                            |
/// +----------------------------+
/// | Client id                  |
/// +----------------------------+
/// | Will topic (optional)      |
/// +----------------------------+
/// | Will message (optional)    |
/// +----------------------------+
/// | Username (optional)        |
/// +----------------------------+
/// | Password (optional)        |
/// +----------------------------+
/// ```
///
/// Each optional field is present exactly when its bit in the connect
/// flags is set; the flags are decoded first and guard the rest of the
/// payload.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectPacket {
    protocol_level: ProtocolLevel,

    connect_flags: ConnectFlags,

    /// Longest silent interval, in seconds, the client promises to the
    /// server. Zero disables the keep alive mechanism.
    keep_alive: U16Data,

    /// Identifies the session on the server side. May be empty, in which
    /// case the server assigns an identifier of its own.
    client_id: StringData,

    /// Topic the will message is published to. Present iff the will flag
    /// is set.
    will_topic: Option<StringData>,

    /// Payload of the will message. Present iff the will flag is set.
    will_message: Option<BinaryData>,

    /// Present iff the username flag is set.
    username: Option<StringData>,

    /// Present iff the password flag is set.
    password: Option<BinaryData>,
}

impl ConnectPacket {
    /// Create a new connect packet with `client_id` and a keep alive of
    /// 60 seconds.
    ///
    /// # Errors
    ///
    /// Returns error if `client_id` is too long.
    pub fn new(client_id: &str) -> Result<Self, EncodeError> {
        Ok(Self {
            keep_alive: U16Data::new(60),
            client_id: StringData::from(client_id)?,
            ..Self::default()
        })
    }

    /// Get current protocol level.
    #[must_use]
    #[inline]
    pub const fn protocol_level(&self) -> ProtocolLevel {
        self.protocol_level
    }

    /// Update connect flags.
    pub fn set_connect_flags(&mut self, flags: ConnectFlags) -> &mut Self {
        self.connect_flags = flags;
        self
    }

    /// Get current connect flags.
    #[must_use]
    #[inline]
    pub const fn connect_flags(&self) -> &ConnectFlags {
        &self.connect_flags
    }

    /// Update keep alive value in seconds.
    pub fn set_keep_alive(&mut self, keep_alive: u16) -> &mut Self {
        self.keep_alive = U16Data::new(keep_alive);
        self
    }

    /// Get current keep alive value.
    #[must_use]
    #[inline]
    pub const fn keep_alive(&self) -> u16 {
        self.keep_alive.value()
    }

    /// Update client id.
    ///
    /// # Errors
    ///
    /// Returns error if `client_id` is too long.
    pub fn set_client_id(&mut self, client_id: &str) -> Result<&mut Self, EncodeError> {
        self.client_id = StringData::from(client_id)?;
        Ok(self)
    }

    /// Get current client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.client_id.as_ref()
    }

    /// Update will topic. The will flag must be set for the field to be
    /// emitted.
    ///
    /// # Errors
    ///
    /// Returns error if `topic` is too long.
    pub fn set_will_topic(&mut self, topic: &str) -> Result<&mut Self, EncodeError> {
        self.will_topic = Some(StringData::from(topic)?);
        Ok(self)
    }

    /// Get current will topic.
    #[must_use]
    pub fn will_topic(&self) -> Option<&str> {
        self.will_topic.as_ref().map(AsRef::as_ref)
    }

    /// Update will message. The will flag must be set for the field to be
    /// emitted.
    ///
    /// # Errors
    ///
    /// Returns error if `message` is too long.
    pub fn set_will_message(&mut self, message: &[u8]) -> Result<&mut Self, EncodeError> {
        self.will_message = Some(BinaryData::from_slice(message)?);
        Ok(self)
    }

    /// Get current will message.
    #[must_use]
    pub fn will_message(&self) -> Option<&[u8]> {
        self.will_message.as_ref().map(AsRef::as_ref)
    }

    /// Update username. The username flag must be set for the field to be
    /// emitted.
    ///
    /// # Errors
    ///
    /// Returns error if `username` is too long.
    pub fn set_username(&mut self, username: &str) -> Result<&mut Self, EncodeError> {
        self.username = Some(StringData::from(username)?);
        Ok(self)
    }

    /// Get current username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_ref().map(AsRef::as_ref)
    }

    /// Update password. The password flag must be set for the field to be
    /// emitted.
    ///
    /// # Errors
    ///
    /// Returns error if `password` is too long.
    pub fn set_password(&mut self, password: &[u8]) -> Result<&mut Self, EncodeError> {
        self.password = Some(BinaryData::from_slice(password)?);
        Ok(self)
    }

    /// Get current password.
    #[must_use]
    pub fn password(&self) -> Option<&[u8]> {
        self.password.as_ref().map(AsRef::as_ref)
    }

    /// Every flag bit must agree with the presence of its payload field,
    /// otherwise encode and decode would disagree about the layout.
    fn validate(&self) -> Result<(), EncodeError> {
        self.connect_flags.validate()?;
        if self.connect_flags.will() != (self.will_topic.is_some() && self.will_message.is_some())
        {
            return Err(EncodeError::InvalidPacket);
        }
        if !self.connect_flags.will() && (self.will_topic.is_some() || self.will_message.is_some())
        {
            return Err(EncodeError::InvalidPacket);
        }
        if self.connect_flags.has_username() != self.username.is_some() {
            return Err(EncodeError::InvalidPacket);
        }
        if self.connect_flags.has_password() != self.password.is_some() {
            return Err(EncodeError::InvalidPacket);
        }
        Ok(())
    }

    fn get_fixed_header(&self) -> Result<FixedHeader, VarIntError> {
        let mut remaining_length = 2
            + PROTOCOL_NAME.len()
            + ProtocolLevel::bytes()
            + ConnectFlags::bytes()
            + U16Data::bytes()
            + self.client_id.bytes();

        if let Some(will_topic) = &self.will_topic {
            remaining_length += will_topic.bytes();
        }
        if let Some(will_message) = &self.will_message {
            remaining_length += will_message.bytes();
        }
        if let Some(username) = &self.username {
            remaining_length += username.bytes();
        }
        if let Some(password) = &self.password {
            remaining_length += password.bytes();
        }

        FixedHeader::new(PacketType::Connect, remaining_length)
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

impl EncodePacket for ConnectPacket {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        self.validate()?;
        let old_len = buf.len();

        let fixed_header = self.get_fixed_header()?;
        fixed_header.encode(buf)?;

        // Variable header
        StringData::from(PROTOCOL_NAME)?.encode(buf)?;
        self.protocol_level.encode(buf)?;
        self.connect_flags.encode(buf)?;
        self.keep_alive.encode(buf)?;

        // Payload
        self.client_id.encode(buf)?;
        if let Some(will_topic) = &self.will_topic {
            will_topic.encode(buf)?;
        }
        if let Some(will_message) = &self.will_message {
            will_message.encode(buf)?;
        }
        if let Some(username) = &self.username {
            username.encode(buf)?;
        }
        if let Some(password) = &self.password {
            password.encode(buf)?;
        }

        Ok(buf.len() - old_len)
    }
}

impl DecodePacket for ConnectPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        if fixed_header.packet_type() != PacketType::Connect {
            return Err(DecodeError::MalformedFixedHeader);
        }

        let protocol_name = StringData::decode(ba)?;
        if protocol_name.as_ref() != PROTOCOL_NAME {
            log::error!("connect: unexpected protocol name {protocol_name}");
            return Err(DecodeError::ProtocolViolation);
        }

        let protocol_level = ProtocolLevel::try_from(ba.read_byte()?)?;

        // The flag coupling rules are checked inside ConnectFlags::decode.
        let connect_flags = ConnectFlags::decode(ba)?;
        let keep_alive = U16Data::decode(ba)?;
        let client_id = StringData::decode(ba)?;

        let will_topic = if connect_flags.will() {
            Some(StringData::decode(ba)?)
        } else {
            None
        };
        let will_message = if connect_flags.will() {
            Some(BinaryData::decode(ba)?)
        } else {
            None
        };
        let username = if connect_flags.has_username() {
            Some(StringData::decode(ba)?)
        } else {
            None
        };
        let password = if connect_flags.has_password() {
            Some(BinaryData::decode(ba)?)
        } else {
            None
        };

        Ok(Self {
            protocol_level,
            connect_flags,
            keep_alive,
            client_id,
            will_topic,
            will_message,
            username,
            password,
        })
    }
}
