// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::EncodeError;

/// Generate a random alphanumeric string, useful for assigning a client
/// identifier when a CONNECT packet supplies an empty one.
#[must_use]
pub fn random_string(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Check that a length-prefixed field (string or binary data) fits in the
/// 16-bit length prefix used throughout the wire format.
///
/// # Errors
///
/// Returns error if `data` is longer than 65,535 bytes.
#[inline]
pub fn validate_two_bytes_data(data: &[u8]) -> Result<(), EncodeError> {
    if data.len() > u16::MAX as usize {
        Err(EncodeError::TooManyData)
    } else {
        Ok(())
    }
}

/// Check that a UTF-8 string fits in the 16-bit length prefix.
///
/// This crate does not otherwise validate topic names or client
/// identifiers: any Rust `&str` (already guaranteed valid UTF-8) is
/// acceptable wire content so long as its encoded length fits.
///
/// # Errors
///
/// Returns error if `s` is longer than 65,535 bytes.
#[inline]
pub fn validate_utf8_string(s: &str) -> Result<(), EncodeError> {
    validate_two_bytes_data(s.as_bytes())
}
