//! Access token expiry evaluation.
//!
//! Tokens are JWTs. Only the payload segment is decoded; the signature is the
//! backend's business. Anything that cannot be decoded into a payload with an
//! integer `exp` claim is treated as already expired.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::credential::AccessToken;

/// Safety margin applied by [`is_usable`].
pub const DEFAULT_EXPIRY_MARGIN: Duration = Duration::seconds(30);

/// The claims this crate depends on. Other claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecodedClaims {
    /// Expiry as epoch seconds.
    pub exp: i64,
    /// Subject (usually the user id or email).
    #[serde(default)]
    pub sub: Option<String>,
}

impl DecodedClaims {
    /// Returns the expiry as a UTC timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Why a token could not be decoded.
///
/// Never surfaced past [`is_usable`]; exposed through [`decode_claims`] for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedCredential {
    /// The token does not have three dot-separated segments.
    #[error("token is not a three-segment JWT")]
    Shape,

    /// The payload segment is not valid base64url.
    #[error("payload is not valid base64url")]
    Encoding,

    /// The payload is not a JSON object with an integer `exp` claim.
    #[error("payload claims are invalid: {0}")]
    Claims(String),
}

/// Decode the payload claims of a JWT without verifying its signature.
pub fn decode_claims(token: &str) -> Result<DecodedClaims, MalformedCredential> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(MalformedCredential::Shape);
    };

    // Some issuers pad their segments even though JWTs should not be padded.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| MalformedCredential::Encoding)?;

    serde_json::from_slice(&bytes).map_err(|e| MalformedCredential::Claims(e.to_string()))
}

/// Returns true if the token is still usable at `now`, leaving `margin` to
/// spare.
pub fn is_usable_at(token: &AccessToken, now: DateTime<Utc>, margin: Duration) -> bool {
    match decode_claims(token.as_str()) {
        Ok(claims) => claims.exp > (now + margin).timestamp(),
        Err(err) => {
            tracing::trace!(error = %err, "access token is malformed; treating as expired");
            false
        }
    }
}

/// Returns true if the token is still usable now, with the default margin.
pub fn is_usable(token: &AccessToken) -> bool {
    is_usable_at(token, Utc::now(), DEFAULT_EXPIRY_MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> AccessToken {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload);
        AccessToken::new(format!("{header}.{payload}.c2lnbmF0dXJl"))
    }

    fn token_expiring_at(exp: i64) -> AccessToken {
        token_with_payload(&format!(r#"{{"sub":"coach@example.com","exp":{exp}}}"#))
    }

    #[test]
    fn future_token_is_usable() {
        let now = Utc::now();
        let token = token_expiring_at((now + Duration::hours(1)).timestamp());
        assert!(is_usable_at(&token, now, DEFAULT_EXPIRY_MARGIN));
    }

    #[test]
    fn token_expired_an_hour_ago_is_unusable() {
        let now = Utc::now();
        let token = token_expiring_at((now - Duration::hours(1)).timestamp());
        assert!(!is_usable_at(&token, now, DEFAULT_EXPIRY_MARGIN));
    }

    #[test]
    fn token_inside_margin_is_unusable() {
        let now = Utc::now();
        let token = token_expiring_at((now + Duration::seconds(10)).timestamp());
        assert!(!is_usable_at(&token, now, Duration::seconds(30)));
        assert!(is_usable_at(&token, now, Duration::zero()));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let now = Utc::now();
        let token = token_expiring_at((now + Duration::minutes(5)).timestamp());
        let first = is_usable_at(&token, now, DEFAULT_EXPIRY_MARGIN);
        for _ in 0..10 {
            assert_eq!(is_usable_at(&token, now, DEFAULT_EXPIRY_MARGIN), first);
        }
    }

    #[test]
    fn malformed_tokens_fail_closed() {
        let now = Utc::now();
        let full = token_expiring_at((now + Duration::hours(1)).timestamp());
        let truncated = AccessToken::new(&full.as_str()[..full.as_str().len() / 2]);

        for token in [
            AccessToken::new(""),
            AccessToken::new("not-a-jwt"),
            AccessToken::new("a.b"),
            AccessToken::new("a.b.c.d"),
            AccessToken::new("header.!!!notbase64!!!.sig"),
            truncated,
            token_with_payload("not json"),
            token_with_payload(r#"{"sub":"no-expiry"}"#),
            token_with_payload(r#"{"exp":"soon"}"#),
            token_with_payload("[1,2,3]"),
        ] {
            assert!(!is_usable_at(&token, now, DEFAULT_EXPIRY_MARGIN));
        }
    }

    #[test]
    fn decode_reports_reason() {
        assert_eq!(decode_claims("abc"), Err(MalformedCredential::Shape));
        assert_eq!(decode_claims("a.%%%.c"), Err(MalformedCredential::Encoding));
        assert!(matches!(
            decode_claims(token_with_payload("{}").as_str()),
            Err(MalformedCredential::Claims(_))
        ));
    }

    #[test]
    fn decode_extracts_subject_and_expiry() {
        let token = token_expiring_at(1_900_000_000);
        let claims = decode_claims(token.as_str()).unwrap();
        assert_eq!(claims.exp, 1_900_000_000);
        assert_eq!(claims.sub.as_deref(), Some("coach@example.com"));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_900_000_000);
    }

    #[test]
    fn padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":4000000000}"#);
        let token = AccessToken::new(format!("{header}.{payload}.sig"));
        assert!(is_usable(&token));
    }
}
