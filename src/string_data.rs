// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::fmt;
use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::{utils, ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket};

/// An UTF-8 encoded string, prefixed with its byte length.
///
/// ```text
/// +-------------------+
/// | String Length     |
/// |                   |
/// +-------------------+
/// | String bytes ...  |
/// +-------------------+
/// ```
///
/// The length prefix is a two byte integer, so the string is limited to
/// 65535 bytes. The character data MUST be well-formed UTF-8 [MQTT-1.5.3];
/// ill-formed bytes on the wire make the whole packet malformed. An empty
/// string is valid.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct StringData(String);

impl StringData {
    /// Create an empty string data.
    #[must_use]
    pub const fn new() -> Self {
        Self(String::new())
    }

    /// Convert a string slice into string data.
    ///
    /// # Errors
    ///
    /// Returns error if `s` is longer than 65535 bytes.
    pub fn from(s: &str) -> Result<Self, EncodeError> {
        utils::validate_two_bytes_data(s.as_bytes())?;
        Ok(Self(s.to_string()))
    }

    /// Get byte length in packet, including the length prefix.
    #[must_use]
    pub fn bytes(&self) -> usize {
        2 + self.0.len()
    }

    /// Returns true if the string is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Clear the string.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Display for StringData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for StringData {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl DecodePacket for StringData {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let len = ba.read_u16()?;
        let s = ba.read_string(usize::from(len))?;
        Ok(Self(s))
    }
}

impl EncodePacket for StringData {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        // Length is validated at construction.
        #[allow(clippy::cast_possible_truncation)]
        let len = self.0.len() as u16;
        buf.write_u16::<BigEndian>(len)?;
        buf.write_all(self.0.as_bytes())?;
        Ok(self.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let s = StringData::from("topic/one").unwrap();
        let mut buf = Vec::new();
        assert_eq!(s.encode(&mut buf).unwrap(), 11);
        assert_eq!(&buf[..2], &[0x00, 0x09]);

        let mut ba = ByteArray::new(&buf);
        assert_eq!(StringData::decode(&mut ba).unwrap(), s);
    }

    #[test]
    fn test_empty_string() {
        let s = StringData::new();
        let mut buf = Vec::new();
        assert_eq!(s.encode(&mut buf).unwrap(), 2);
        assert_eq!(&buf, &[0x00, 0x00]);

        let mut ba = ByteArray::new(&buf);
        assert!(StringData::decode(&mut ba).unwrap().is_empty());
    }

    #[test]
    fn test_too_long() {
        let s = "a".repeat(65536);
        assert_eq!(StringData::from(&s), Err(EncodeError::StringTooLong));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let buf = [0x00, 0x02, 0xc3, 0x28];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(StringData::decode(&mut ba), Err(DecodeError::BadUtf8));
    }

    #[test]
    fn test_decode_truncated() {
        let buf = [0x00, 0x05, 0x61, 0x62];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(StringData::decode(&mut ba), Err(DecodeError::Truncated));
    }
}
