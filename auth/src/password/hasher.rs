use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::PasswordError;

/// Salt length in bytes.
pub const SALT_LENGTH: usize = 32;

/// Derived key length in bytes.
pub const KEY_LENGTH: usize = 32;

/// PBKDF2 iteration count.
pub const ITERATIONS: u32 = 100_000;

/// Password hashing implementation.
///
/// Derives keys with PBKDF2-HMAC-SHA256 and encodes the result as lower-case
/// hex `salt || key`, the format stored in the user directory.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher configured with 100 000 iterations
    pub fn new() -> Self {
        Self {
            iterations: ITERATIONS,
        }
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Hex encoded `salt || derived key` (128 characters)
    ///
    /// # Errors
    /// * `HashingFailed` - The operating system RNG could not produce a salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        let key = self.derive(password, &salt);

        let mut encoded = hex::encode(salt);
        encoded.push_str(&hex::encode(key));
        Ok(encoded)
    }

    /// Verify a password against a stored hash.
    ///
    /// Malformed stored values never match.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `encoded` - Stored hex `salt || key`
    ///
    /// # Returns
    /// True if the password matches, false otherwise
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let Some((salt, stored_key)) = Self::decode(encoded) else {
            return false;
        };

        let key = self.derive(password, &salt);
        key[..].ct_eq(&stored_key[..]).into()
    }

    fn derive(&self, password: &str, salt: &[u8]) -> [u8; KEY_LENGTH] {
        let mut key = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.iterations, &mut key);
        key
    }

    fn decode(encoded: &str) -> Option<([u8; SALT_LENGTH], [u8; KEY_LENGTH])> {
        if encoded.len() != 2 * (SALT_LENGTH + KEY_LENGTH) || !encoded.is_ascii() {
            return None;
        }

        let (salt_hex, key_hex) = encoded.split_at(2 * SALT_LENGTH);

        let mut salt = [0u8; SALT_LENGTH];
        let mut key = [0u8; KEY_LENGTH];
        hex::decode_to_slice(salt_hex, &mut salt).ok()?;
        hex::decode_to_slice(key_hex, &mut key).ok()?;

        Some((salt, key))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
