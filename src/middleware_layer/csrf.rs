use axum::{
    body::Body,
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{crypto::csrf::tokens_match, error::AppError};

/// Name of the cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "csrf_token";
/// Header the client echoes the CSRF token in.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Double-submit CSRF check for state-changing requests.
///
/// The token cookie is readable by the page's scripts, which copy it into
/// the `x-csrf-token` header. A cross-site form cannot read the cookie.
pub async fn verify_csrf(
    cookies: Cookies,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == Method::GET
        || req.method() == Method::HEAD
        || req.method() == Method::OPTIONS
    {
        return Ok(next.run(req).await);
    }

    let cookie_token = cookies
        .get(CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Csrf("missing token cookie".to_string()))?;

    let header_token = req
        .headers()
        .get(CSRF_HEADER)
        .ok_or_else(|| AppError::Csrf("missing token header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Csrf("malformed token header".to_string()))?;

    if !tokens_match(&cookie_token, header_token) {
        return Err(AppError::Csrf("token mismatch".to_string()));
    }

    Ok(next.run(req).await)
}
