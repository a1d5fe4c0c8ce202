//! Short URL hash generation.

use base64::Engine as _;

/// Length of random bytes before base64 encoding.
const HASH_LENGTH_BYTES: usize = 9;

/// Generates a random short URL hash.
///
/// Uses `getrandom` for entropy and encodes the result as URL-safe base64
/// without padding, producing a 12-character hash.
///
/// # Errors
///
/// Returns an error if the system random number generator fails.
pub fn generate_hash() -> Result<String, getrandom::Error> {
    let mut buffer = [0u8; HASH_LENGTH_BYTES];
    getrandom::fill(&mut buffer)?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}
