//! Deterministic record identity
//!
//! A record's primary key is the first 16 bytes of SHA-256 over its ordered
//! key fields joined by `:`, rendered as 32 lowercase hex characters.

use sha2::{Digest, Sha256};

/// Length of an identity in hex characters
pub const IDENTITY_LEN: usize = 32;

/// Compute the identity of an ordered tuple of key fields
pub fn record_identity<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            hasher.update(b":");
        }
        hasher.update(field.as_ref().as_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(&digest[..IDENTITY_LEN / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_shape() {
        let id = record_identity(["call1", "user1", "1735700000000"]);
        assert_eq!(id.len(), IDENTITY_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_identity_is_sha256_prefix() {
        // sha256("abc") = ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad
        assert_eq!(record_identity(["abc"]), "ba7816bf8f01cfea414140de5dae2223");
        assert_eq!(record_identity(["a", "bc"]), record_identity(["a:bc"]));
    }

    #[test]
    fn test_identity_stable() {
        let fields = ["app", "2025-01-01", "audio_minutes", "global"];
        assert_eq!(record_identity(fields), record_identity(fields));
        assert_eq!(
            record_identity(fields),
            record_identity(fields.iter().map(|s| s.to_string()))
        );
    }

    #[test]
    fn test_identity_sensitive_to_every_field() {
        let base = ["call1", "user1", "1000"];
        let id = record_identity(base);
        for i in 0..base.len() {
            let mut changed = base;
            changed[i] = "other";
            assert_ne!(record_identity(changed), id, "field {i}");
        }
        assert_ne!(record_identity(["user1", "call1", "1000"]), id);
    }
}
