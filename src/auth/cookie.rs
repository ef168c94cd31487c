//! Session cookie encoding
//!
//! The session token travels in a single cookie:
//!
//! ```text
//! paseto=<token>; Path=/; Expires=<HTTP-date>; HttpOnly; Secure; SameSite=Strict
//! ```
//!
//! Clearing the cookie only tells the browser to drop it. The token itself
//! stays valid until it expires.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use chrono::{DateTime, Utc};

/// Name of the session cookie
pub const SESSION_COOKIE_NAME: &str = "paseto";

/// IMF-fixdate, as required for the `Expires` attribute
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Reads and writes the session cookie
pub struct SessionCookieCodec;

impl SessionCookieCodec {
    /// Append a `Set-Cookie` header carrying `token` until `expires_at`
    pub fn write(
        headers: &mut HeaderMap,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), InvalidHeaderValue> {
        let cookie = Self::encode(token, expires_at);
        headers.append(SET_COOKIE, HeaderValue::from_str(&cookie)?);
        Ok(())
    }

    /// Append a `Set-Cookie` header that makes the browser discard the session cookie
    pub fn clear(headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        let cookie = format!("{}; Max-Age=0", Self::encode("", DateTime::<Utc>::UNIX_EPOCH));
        headers.append(SET_COOKIE, HeaderValue::from_str(&cookie)?);
        Ok(())
    }

    /// Read the session token from the request's `Cookie` headers
    ///
    /// Returns `None` when the cookie is absent or empty.
    pub fn read(headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (name.trim() == SESSION_COOKIE_NAME).then(|| value.trim())
            })
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn encode(token: &str, expires_at: DateTime<Utc>) -> String {
        format!(
            "{}={}; Path=/; Expires={}; HttpOnly; Secure; SameSite=Strict",
            SESSION_COOKIE_NAME,
            token,
            expires_at.format(HTTP_DATE_FORMAT)
        )
    }
}
