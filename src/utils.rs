// Copyright (c) 2024 Shrike Developers. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::EncodeError;

/// A two byte length prefix can address at most 65535 bytes of data.
///
/// # Errors
///
/// Returns error if `data` is too long for the prefix.
pub(crate) fn validate_two_bytes_data(data: &[u8]) -> Result<(), EncodeError> {
    if data.len() > usize::from(u16::MAX) {
        Err(EncodeError::StringTooLong)
    } else {
        Ok(())
    }
}

/// Generate a random alphanumeric client identifier of `len` characters.
///
/// Clients without a stable device identity usually connect with a random
/// identifier and the clean session flag set.
#[must_use]
pub fn random_client_id(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_two_bytes_data() {
        assert!(validate_two_bytes_data(&[]).is_ok());
        assert!(validate_two_bytes_data(&[0x61; 65535]).is_ok());
        assert_eq!(
            validate_two_bytes_data(&[0x61; 65536]),
            Err(EncodeError::StringTooLong)
        );
    }

    #[test]
    fn test_random_client_id() {
        let client_id = random_client_id(12);
        assert_eq!(client_id.len(), 12);
        assert!(client_id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
