use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

/// The size of the CSRF token in bytes.
const CSRF_TOKEN_SIZE: usize = 32;

/// Generates a new random CSRF token.
///
/// # Returns
///
/// A URL-safe base64-encoded CSRF token.
pub fn generate_csrf_token() -> String {
    let mut token = [0u8; CSRF_TOKEN_SIZE];
    OsRng.fill_bytes(&mut token);
    general_purpose::URL_SAFE_NO_PAD.encode(token)
}

/// Compares the cookie and header copies of the token in constant time.
pub fn tokens_match(cookie_token: &str, header_token: &str) -> bool {
    if cookie_token.is_empty() || cookie_token.len() != header_token.len() {
        return false;
    }
    cookie_token.as_bytes().ct_eq(header_token.as_bytes()).into()
}
