use argon2::Argon2;
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;
use tracing::error;

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 64;

/// Derives the fixed-length digest from `(plain, salt)`. The hex salt
/// string itself is the KDF salt input, so stored salts verify as-is.
fn derive(plain: &str, salt: &str) -> anyhow::Result<[u8; DIGEST_LEN]> {
    let mut out = [0u8; DIGEST_LEN];
    Argon2::default()
        .hash_password_into(plain.as_bytes(), salt.as_bytes(), &mut out)
        .map_err(|e| {
            error!(error = %e, "argon2 derivation error");
            anyhow::anyhow!(e.to_string())
        })?;
    Ok(out)
}

/// Hashes a password with a fresh random salt. Returns `(salt, hash)`,
/// both hex-encoded; the pair is always stored together.
pub fn hash_password(plain: &str) -> anyhow::Result<(String, String)> {
    let mut salt_bytes = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = hex::encode(salt_bytes);
    let digest = derive(plain, &salt)?;
    Ok((salt, hex::encode(digest)))
}

/// Re-derives and compares in constant time. Unequal lengths short-circuit
/// to false; digest length is fixed, so that leaks nothing.
pub fn verify_password(plain: &str, salt: &str, hash: &str) -> anyhow::Result<bool> {
    let stored = hex::decode(hash).map_err(|e| {
        error!(error = %e, "stored hash is not valid hex");
        anyhow::anyhow!(e.to_string())
    })?;
    let derived = derive(plain, salt)?;
    if stored.len() != derived.len() {
        return Ok(false);
    }
    Ok(derived.ct_eq(&stored).into())
}

/// Credential pair verified against when a login targets an unknown email,
/// keeping that path in the same timing class as a real mismatch.
pub fn dummy_credentials() -> &'static (String, String) {
    lazy_static! {
        static ref DUMMY: (String, String) =
            hash_password("kinchaku-dummy-password").expect("static dummy hash");
    }
    &DUMMY
}

/// The KDF is deliberately slow; run it off the async worker threads.
pub async fn hash_password_blocking(plain: String) -> anyhow::Result<(String, String)> {
    tokio::task::spawn_blocking(move || hash_password(&plain)).await?
}

pub async fn verify_password_blocking(
    plain: String,
    salt: String,
    hash: String,
) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &salt, &hash)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "correct horse battery staple";
        let (salt, hash) = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &salt, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let (salt, hash) = hash_password("right-password").expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &salt, &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_rejects_foreign_salt() {
        let (_, hash) = hash_password("some-password").expect("hash");
        let (other_salt, _) = hash_password("some-password").expect("hash");
        assert!(!verify_password("some-password", &other_salt, &hash).expect("verify"));
    }

    #[test]
    fn salt_is_fresh_per_call() {
        let (salt_a, hash_a) = hash_password("same-password").expect("hash");
        let (salt_b, hash_b) = hash_password("same-password").expect("hash");
        assert_ne!(salt_a, salt_b);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn encoded_lengths_are_fixed() {
        let (salt, hash) = hash_password("any-password").expect("hash");
        assert_eq!(salt.len(), SALT_LEN * 2);
        assert_eq!(hash.len(), DIGEST_LEN * 2);
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "00ff", "not-hex-at-all").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn blocking_wrappers_roundtrip() {
        let (salt, hash) = hash_password_blocking("offloaded-password".into())
            .await
            .expect("hash");
        assert!(
            verify_password_blocking("offloaded-password".into(), salt, hash)
                .await
                .expect("verify")
        );
    }
}
