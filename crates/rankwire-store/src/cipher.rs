//! Obfuscation for persisted blobs
//!
//! # Threat model
//!
//! This is **not** encryption in any cryptographic sense. The key is derived
//! from a constant compiled into every client, so anyone with the binary can
//! reproduce it. The XOR stream and base64 armour only stop a player from
//! opening a rating file in a text editor and bumping the number; integrity is
//! enforced separately by the record checksum. Do not store anything secret
//! behind this codec.
//!
//! # Key derivation
//!
//! The key starts as [`KEY_SEED`]. Its SHA-256 digest is hex-encoded and the
//! first [`SUFFIX_LEN`] characters are appended; the next digest is taken over
//! the previous digest, and so on until the key is at least [`MIN_KEY_LEN`]
//! characters long.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

/// Constant the obfuscation key is derived from
pub const KEY_SEED: &str = "rankwire/rating-store/obfuscation-seed/v1";

/// Minimum derived key length in characters
pub const MIN_KEY_LEN: usize = 256;

/// Hex characters taken from each digest
pub const SUFFIX_LEN: usize = 16;

static KEY: LazyLock<Vec<u8>> = LazyLock::new(derive_key);

/// Derive the obfuscation key
pub fn derive_key() -> Vec<u8> {
    let mut key = String::from(KEY_SEED);
    let mut state = String::from(KEY_SEED);
    while key.len() < MIN_KEY_LEN {
        let digest = hex::encode(Sha256::digest(state.as_bytes()));
        key.push_str(&digest[..SUFFIX_LEN]);
        state = digest;
    }
    key.into_bytes()
}

fn xor_with_key(bytes: &mut [u8]) {
    let key = KEY.as_slice();
    for (i, b) in bytes.iter_mut().enumerate() {
        *b ^= key[i % key.len()];
    }
}

/// XOR with the derived key, then base64
pub fn encode(plaintext: &str) -> String {
    let mut bytes = plaintext.as_bytes().to_vec();
    xor_with_key(&mut bytes);
    STANDARD.encode(bytes)
}

/// Reverse [`encode`]
///
/// Returns `None` for text outside the base64 alphabet, bad padding, or a
/// result that is not UTF-8.
pub fn decode(text: &str) -> Option<String> {
    let mut bytes = STANDARD.decode(text.trim_end_matches(['\n', '\r'])).ok()?;
    xor_with_key(&mut bytes);
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_length_and_prefix() {
        let key = derive_key();
        assert!(key.len() >= MIN_KEY_LEN);
        assert!(key.len() < MIN_KEY_LEN + SUFFIX_LEN);
        assert!(key.starts_with(KEY_SEED.as_bytes()));
        assert_eq!(key, derive_key());
    }

    #[test]
    fn test_roundtrip() {
        let text = "version:1\nplayer:p1:1500:0:0:0:0:0:0:0:-";
        let encoded = encode(text);
        assert_ne!(encoded, text);
        assert!(!encoded.contains("player"));
        assert_eq!(decode(&encoded).as_deref(), Some(text));
    }

    #[test]
    fn test_roundtrip_longer_than_key() {
        let text = "x".repeat(MIN_KEY_LEN * 3 + 7);
        assert_eq!(decode(&encode(&text)), Some(text));
    }

    #[test]
    fn test_roundtrip_empty() {
        assert_eq!(encode(""), "");
        assert_eq!(decode(""), Some(String::new()));
    }

    #[test]
    fn test_decode_rejects_bad_alphabet() {
        assert_eq!(decode("not*base64"), None);
    }

    #[test]
    fn test_decode_rejects_bad_padding() {
        let encoded = encode("abcd");
        let truncated = &encoded[..encoded.len() - 1];
        assert_eq!(decode(truncated), None);
    }

    #[test]
    fn test_decode_tolerates_trailing_newline() {
        let encoded = format!("{}\n", encode("abc"));
        assert_eq!(decode(&encoded).as_deref(), Some("abc"));
    }
}
