//! `Set-Cookie` decoding and encoding.
//!
//! The service hands tokens back as raw `Set-Cookie` headers rather than
//! response fields, and the cookie of interest is identified only by a name
//! prefix (the suffix is deployment-specific). Two prefixes matter:
//! [`SESSION_COOKIE_PREFIX`] for the final application session token and
//! [`OAUTH_NONCE_COOKIE_PREFIX`] for the nonce binding the start-OAuth step
//! to its completion.

use crate::error::{Result, SightError};

/// Name prefix of the session-identity cookie (`user-<deployment-hash>`).
pub const SESSION_COOKIE_PREFIX: &str = "user-";

/// Name prefix of the OAuth nonce cookie (`oauth-nonce-<suffix>`).
pub const OAUTH_NONCE_COOKIE_PREFIX: &str = "oauth-nonce-";

/// One parsed `Set-Cookie` header.
///
/// Only the attributes the pipeline cares about are structured; anything
/// else in the raw header is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub expires: Option<String>,
    pub http_only: bool,
    pub secure: bool,
}

impl Cookie {
    /// Parse a raw `Set-Cookie` header, keeping the pair whose name starts
    /// with `required_name_prefix`.
    ///
    /// The value is everything after the first `=` so base64-like values
    /// with embedded `=` survive intact.
    ///
    /// # Errors
    ///
    /// `MissingCookie` when no segment matches the prefix, `CookieParse`
    /// when the header is empty.
    pub fn decode(raw: &str, required_name_prefix: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(SightError::CookieParse("empty cookie header".into()));
        }

        let mut cookie = Self {
            name: String::new(),
            value: String::new(),
            path: None,
            expires: None,
            http_only: false,
            secure: false,
        };

        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = match segment.split_once('=') {
                Some((k, v)) => (k.trim(), v),
                None => (segment, ""),
            };

            if key.eq_ignore_ascii_case("Path") {
                cookie.path = Some(value.to_string());
            } else if key.eq_ignore_ascii_case("Expires") {
                cookie.expires = Some(value.to_string());
            } else if key.eq_ignore_ascii_case("HttpOnly") {
                cookie.http_only = true;
            } else if key.eq_ignore_ascii_case("Secure") {
                cookie.secure = true;
            } else if key.starts_with(required_name_prefix) {
                cookie.name = key.to_string();
                cookie.value = value.to_string();
            }
        }

        if cookie.name.is_empty() {
            return Err(SightError::MissingCookie {
                prefix: required_name_prefix.to_string(),
            });
        }

        Ok(cookie)
    }

    /// Render back to `Set-Cookie` shape. `decode(encode(c))` reproduces `c`.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(expires) = &self.expires {
            out.push_str("; Expires=");
            out.push_str(expires);
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }

    /// The `name=value` pair to send back in a `Cookie` request header.
    #[must_use]
    pub fn header_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Scan a list of raw `Set-Cookie` headers for the first cookie matching
/// `prefix`.
pub fn find_by_prefix(raw_cookies: &[String], prefix: &str) -> Result<Cookie> {
    raw_cookies
        .iter()
        .find_map(|raw| Cookie::decode(raw, prefix).ok())
        .ok_or_else(|| SightError::MissingCookie {
            prefix: prefix.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_session_cookie_with_attributes() {
        let raw = "user-646f=AbC123==; Path=/; Expires=Wed, 21 Oct 2026 07:28:00 GMT; HttpOnly; Secure";
        let cookie = Cookie::decode(raw, SESSION_COOKIE_PREFIX).unwrap();
        assert_eq!(cookie.name, "user-646f");
        // embedded '=' padding must survive
        assert_eq!(cookie.value, "AbC123==");
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert!(cookie.http_only);
        assert!(cookie.secure);
    }

    #[test]
    fn round_trip_is_idempotent() {
        let raw = "user-abc=tok; Path=/; HttpOnly; Secure";
        let cookie = Cookie::decode(raw, SESSION_COOKIE_PREFIX).unwrap();
        let encoded = cookie.encode();
        let again = Cookie::decode(&encoded, SESSION_COOKIE_PREFIX).unwrap();
        assert_eq!(cookie, again);
        assert_eq!(encoded, again.encode());
    }

    #[test]
    fn missing_prefix_is_an_error() {
        let raw = "csrf-token=xyz; Path=/";
        let err = Cookie::decode(raw, SESSION_COOKIE_PREFIX).unwrap_err();
        assert!(matches!(err, SightError::MissingCookie { .. }));
    }

    #[test]
    fn empty_header_is_a_parse_error() {
        let err = Cookie::decode("  ", SESSION_COOKIE_PREFIX).unwrap_err();
        assert!(matches!(err, SightError::CookieParse(_)));
    }

    #[test]
    fn find_by_prefix_scans_past_unrelated_cookies() {
        let raws = vec![
            "S8_SESSION=abc; Path=/".to_string(),
            "oauth-nonce-77=n0nce; Path=/; Secure".to_string(),
        ];
        let nonce = find_by_prefix(&raws, OAUTH_NONCE_COOKIE_PREFIX).unwrap();
        assert_eq!(nonce.name, "oauth-nonce-77");
        assert_eq!(nonce.value, "n0nce");

        let missing = find_by_prefix(&raws, SESSION_COOKIE_PREFIX);
        assert!(missing.is_err());
    }
}
