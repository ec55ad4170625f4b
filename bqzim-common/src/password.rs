//! Password hashing and verification
//!
//! # Format
//!
//! - `password_salt`: 32 hex characters (16 random bytes)
//! - `password_hash`: `pbkdf2_sha256$<iterations>$<64 hex chars>`
//!
//! The digest is PBKDF2-HMAC-SHA256 of the password keyed with the hex salt
//! string. The iteration count is stored with the hash so it can be raised
//! later without invalidating existing accounts.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Algorithm tag stored in front of every hash
pub const ALGORITHM: &str = "pbkdf2_sha256";

/// Iteration count used for new hashes
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Salt length in random bytes (hex-encoded to twice this)
const SALT_BYTES: usize = 16;

/// Encoded hash plus the salt it was computed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    pub hash: String,
    pub salt: String,
}

/// Hash a password with a fresh random salt
///
/// # Examples
///
/// ```
/// use bqzim_common::password::{hash_password, verify_password};
///
/// let hashed = hash_password("correct horse");
/// assert!(hashed.hash.starts_with("pbkdf2_sha256$"));
/// assert!(verify_password("correct horse", &hashed.hash, &hashed.salt));
/// assert!(!verify_password("wrong horse", &hashed.hash, &hashed.salt));
/// ```
pub fn hash_password(password: &str) -> HashedPassword {
    let mut salt_bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = to_hex(&salt_bytes);

    HashedPassword {
        hash: encode_hash(password, &salt, DEFAULT_ITERATIONS),
        salt,
    }
}

/// Compute the encoded hash for a known salt and iteration count
pub fn encode_hash(password: &str, salt: &str, iterations: u32) -> String {
    let digest = derive(password, salt, iterations);
    format!("{}${}${}", ALGORITHM, iterations, to_hex(&digest))
}

/// Check a password against a stored hash and salt
///
/// Returns false for malformed stored hashes rather than erroring; a
/// corrupt row must not authenticate anyone.
pub fn verify_password(password: &str, encoded: &str, salt: &str) -> bool {
    let mut parts = encoded.splitn(3, '$');
    let (Some(algorithm), Some(iterations), Some(expected)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }

    let actual = to_hex(&derive(password, salt, iterations));
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Burn the same CPU time as a real verification
///
/// Used when the username does not exist so the response time does not
/// reveal whether an account is present.
pub fn dummy_verify(password: &str) {
    let _ = derive(password, "00000000000000000000000000000000", DEFAULT_ITERATIONS);
}

fn derive(password: &str, salt: &str, iterations: u32) -> [u8; 32] {
    let mut digest = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut digest);
    digest
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
