use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// The size of a session token in bytes.
pub const SESSION_TOKEN_SIZE: usize = 32;

/// Length of an encoded token: 32 bytes in unpadded base64.
const ENCODED_TOKEN_LEN: usize = 43;

/// Generates a new random session token.
///
/// # Returns
///
/// A URL-safe base64-encoded token.
pub fn generate_session_token() -> String {
    let mut token = [0u8; SESSION_TOKEN_SIZE];
    OsRng.fill_bytes(&mut token);
    general_purpose::URL_SAFE_NO_PAD.encode(token)
}

/// Returns the storage key for a token, or `None` if the token is malformed.
///
/// Only well-formed tokens are hashed, so garbage cookies never reach the store.
pub fn session_token_digest(token: &str) -> Option<String> {
    if token.len() != ENCODED_TOKEN_LEN {
        return None;
    }

    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(token).ok()?;
    if bytes.len() != SESSION_TOKEN_SIZE {
        return None;
    }

    Some(hex::encode(Sha256::digest(&bytes)))
}
