//! Local decoding of the backend's signed bearer tokens.
//!
//! Tokens are `header.payload.signature`, each part base64url encoded. Only
//! the payload is read. The signature is NOT verified here: the backend that
//! issued the token is the only party holding the key, and it checks the
//! signature on every request. Claims decoded by this module are therefore
//! hints for the UI (who to show as signed in, when to stop trying), never
//! proof of identity.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Malformed token: expected header.payload.signature")]
    Malformed,

    #[error("Token payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token payload has no subject identifier")]
    MissingSubject,
}

/// Opaque identifier of the signed-in user.
///
/// The backend emits numeric ids, but nothing on the client does arithmetic
/// with them, so both JSON strings and integers are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => UserId(s),
            Raw::Signed(n) => UserId(n.to_string()),
            Raw::Unsigned(n) => UserId(n.to_string()),
        })
    }
}

/// Claims carried in the token payload.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    /// Subject identifier
    pub id: UserId,
    /// Account email (the backend's JWT subject)
    pub sub: Option<String>,
    /// Expiry, epoch seconds
    pub exp: i64,
    pub iat: Option<i64>,
}

// Wire shape; `id` is optional here so its absence gets a precise error
#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    id: Option<UserId>,
    #[serde(default)]
    sub: Option<String>,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
}

impl TokenClaims {
    /// Expired once `exp` is strictly in the past; the expiry second itself
    /// still counts as valid
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp < now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Expiry as a timestamp, for display
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Decode the payload of a token without verifying its signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(TokenError::Malformed);
    }

    // Some encoders keep the padding; base64url in JWTs normally drops it
    let payload = URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('='))?;
    let raw: RawClaims = serde_json::from_slice(&payload)?;

    Ok(TokenClaims {
        id: raw.id.ok_or(TokenError::MissingSubject)?,
        sub: raw.sub,
        exp: raw.exp,
        iat: raw.iat,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use chrono::Utc;

    /// Build an unsigned token around the given payload
    pub fn make_token(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    pub fn valid_token(id: &str) -> String {
        make_token(serde_json::json!({ "id": id, "exp": Utc::now().timestamp() + 3600 }))
    }

    pub fn expired_token(id: &str) -> String {
        make_token(serde_json::json!({ "id": id, "exp": Utc::now().timestamp() - 60 }))
    }
}
