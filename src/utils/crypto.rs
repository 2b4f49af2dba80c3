//! Key generation, hashing, and webhook signature utilities

use crate::utils::error::{MeterError, Result};
use hmac::{digest::KeyInit as HmacKeyInit, Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Brand prefix carried by every issued API key.
pub const API_KEY_PREFIX: &str = "mg_";

/// Generate a new API key with the brand prefix
pub fn generate_api_key() -> String {
    let random_part: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    format!("{}{}", API_KEY_PREFIX, random_part)
}

/// Hash an API key for storage; only the hash is ever persisted
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Short displayable prefix used to identify a key in dashboards
pub fn extract_api_key_prefix(api_key: &str) -> String {
    if api_key.len() >= 12 {
        format!("{}...{}", &api_key[..7], &api_key[api_key.len() - 4..])
    } else {
        api_key.to_string()
    }
}

/// Create an HMAC-SHA256 signature over a payload
pub fn create_hmac_signature(secret: &str, data: &[u8]) -> Result<String> {
    let mut mac = <HmacSha256 as HmacKeyInit>::new_from_slice(secret.as_bytes())
        .map_err(|e| MeterError::Crypto(format!("Invalid HMAC key: {}", e)))?;

    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify an HMAC-SHA256 signature in constant time
pub fn verify_hmac_signature(secret: &str, data: &[u8], signature: &str) -> Result<bool> {
    let expected = create_hmac_signature(secret, data)?;
    Ok(constant_time_eq(&expected, signature))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.bytes().zip(b.bytes()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_carry_brand_prefix() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 32);
    }

    #[test]
    fn test_hash_is_stable_and_hex() {
        let key = "mg_abcdefghijklmnopqrstuvwxyz123456";
        let h1 = hash_api_key(key);
        let h2 = hash_api_key(key);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_prefix_extraction() {
        let key = "mg_abcdefghijklmnopqrstuvwxyz123456";
        let prefix = extract_api_key_prefix(key);
        assert!(prefix.starts_with("mg_abcd"));
        assert!(prefix.ends_with("3456"));
    }

    #[test]
    fn test_hmac_roundtrip() {
        let sig = create_hmac_signature("secret", b"payload").unwrap();
        assert!(verify_hmac_signature("secret", b"payload", &sig).unwrap());
        assert!(!verify_hmac_signature("secret", b"tampered", &sig).unwrap());
        assert!(!verify_hmac_signature("other", b"payload", &sig).unwrap());
    }
}
