//! API token generation and hashing.
//!
//! # Invariants
//! - Plaintext tokens are shown once and never persisted.
//! - `hash_token` is the only way a token is turned into a lookup key.

use sha2::{Digest, Sha256};

pub const TOKEN_PREFIX: &str = "bd_";
const TOKEN_BYTES: usize = 32;

/// Generates a fresh random API token (`bd_` + 64 hex chars).
pub fn generate_token() -> Result<String, getrandom::Error> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut bytes)?;
    let body: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    Ok(format!("{TOKEN_PREFIX}{body}"))
}

/// Returns the SHA-256 hex digest stored for `token`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cheap shape check run before touching storage.
pub fn looks_like_token(token: &str) -> bool {
    token
        .strip_prefix(TOKEN_PREFIX)
        .is_some_and(|rest| rest.len() == TOKEN_BYTES * 2 && rest.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::{generate_token, hash_token, looks_like_token};

    #[test]
    fn generated_tokens_are_unique_and_well_formed() {
        let first = generate_token().unwrap();
        let second = generate_token().unwrap();
        assert_ne!(first, second);
        assert!(looks_like_token(&first));
        assert!(!looks_like_token("bd_short"));
        assert!(!looks_like_token("not-a-token"));
    }

    #[test]
    fn hash_is_stable_hex_sha256() {
        let digest = hash_token("bd_example");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_token(" bd_example "));
        assert_ne!(digest, hash_token("bd_other"));
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
