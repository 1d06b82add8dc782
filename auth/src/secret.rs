use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::password::PasswordError;

/// Entropy of generated one-time secrets, in bytes.
pub const SECRET_BYTES: usize = 32;

/// Generate a high-entropy, URL-safe one-time secret (e.g. a password reset token).
///
/// # Returns
/// 43 character base64url string without padding
///
/// # Errors
/// * `HashingFailed` - The operating system RNG is unavailable
pub fn generate_url_safe_secret() -> Result<String, PasswordError> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
