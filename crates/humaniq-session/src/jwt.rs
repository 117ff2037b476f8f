//! Peeking at a JWT's expiry without verifying it.
//!
//! The client can't verify signatures (it has no key) and doesn't need
//! to: the API does that on every call. Reading the `exp` claim only
//! lets the startup check skip a round trip that is certain to fail.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

#[derive(serde::Deserialize)]
struct Claims {
    exp: Option<u64>,
}

/// The `exp` claim (seconds since the Unix epoch) of a JWT.
///
/// Returns `None` for anything that isn't a three-part JWT with a JSON
/// payload carrying a numeric `exp`.
pub fn expires_at(token: &str) -> Option<u64> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()?.exp
}

/// `true` only when the token is a JWT whose `exp` is at or before `now`.
///
/// Opaque tokens and JWTs without `exp` are never considered expired;
/// the server gets the final say on those.
pub fn is_expired(token: &str, now: SystemTime) -> bool {
    let Some(exp) = expires_at(token) else {
        return false;
    };
    let now = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    exp <= now
}

#[cfg(test)]
pub(crate) fn token_with_exp(exp: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload =
        URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"1","exp":{exp}}}"#));
    format!("{header}.{payload}.signature")
}
