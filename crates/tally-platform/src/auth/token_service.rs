//! Token Service
//!
//! JWT bearer token generation and validation (HS256), binding a token to a
//! principal's email. Tokens are self-contained: verification never needs a
//! registry lookup.
//!
//! The reference configuration sets no expiry, issuer, or issued-at claims,
//! but the verification paths for them are live infrastructure and each
//! failure kind maps to a distinct outward response.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::shared::error::{Result, TallyError};

/// Claims embedded in a bearer token.
///
/// Only `email` is always present. `iat` is kept as a raw JSON value so that
/// a malformed (non-numeric) claim is classified as an issued-at failure
/// rather than a generic decode error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Owning principal's email
    pub email: String,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<serde_json::Value>,
}

/// Token verification failure kinds.
///
/// A typed result instead of exception branching; the outward status mapping
/// lives in one place (`From<TokenError> for TallyError`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token or invalid signature: {message}")]
    Invalid { message: String },

    #[error("token has expired")]
    Expired,

    #[error("token issuer is not valid")]
    InvalidIssuer,

    #[error("token issued-at claim is not valid")]
    InvalidIssuedAt,
}

impl TokenError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }
}

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HS256 signing secret; must come from a secure external mechanism,
    /// never source code
    pub secret: String,

    /// Optional issuer claim; when set, verification requires a matching iss
    pub issuer: Option<String>,

    /// Optional token lifetime; when set, tokens carry an exp claim
    pub expiry_secs: Option<i64>,

    /// Whether issued tokens carry an iat claim
    pub include_issued_at: bool,

    /// Clock-skew leeway in seconds for time-based claims
    pub leeway_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: None,
            expiry_secs: None,
            include_issued_at: false,
            leeway_secs: 60,
        }
    }
}

/// Token issue/verify service, fixed to HMAC-SHA256
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self { config, encoding_key, decoding_key }
    }

    /// Issue a compact signed token embedding the email as a claim
    pub fn issue(&self, email: &str) -> Result<String> {
        let now = Utc::now();

        let claims = TokenClaims {
            email: email.to_string(),
            exp: self
                .config
                .expiry_secs
                .map(|secs| (now + Duration::seconds(secs)).timestamp()),
            iss: self.config.issuer.clone(),
            iat: self
                .config
                .include_issued_at
                .then(|| serde_json::Value::from(now.timestamp())),
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TallyError::Internal { message: format!("Failed to encode JWT: {}", e) })
    }

    /// Validate a token's signature and claims, returning the embedded email
    pub fn verify(&self, token: &str) -> std::result::Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = self.config.leeway_secs;
        if let Some(ref issuer) = self.config.issuer {
            validation.set_issuer(&[issuer]);
        }

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
                jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => {
                    TokenError::InvalidIssuer
                }
                _ => TokenError::invalid(e.to_string()),
            }
        })?;

        // jsonwebtoken does not validate iat; a non-numeric or future value
        // fails here with its own kind
        if let Some(ref iat) = data.claims.iat {
            let ts = iat.as_i64().ok_or(TokenError::InvalidIssuedAt)?;
            if ts > Utc::now().timestamp() + self.config.leeway_secs as i64 {
                return Err(TokenError::InvalidIssuedAt);
            }
        }

        debug!(email = %data.claims.email, "Token verified");
        Ok(data.claims.email)
    }
}

/// Extract the bearer token from an Authorization header value.
///
/// The prefix must be exactly `"Bearer "`: case-sensitive, single space,
/// no trimming.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with(secret: &str) -> TokenService {
        TokenService::new(TokenConfig { secret: secret.to_string(), ..Default::default() })
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let svc = service_with("test-secret");
        let token = svc.issue("a@b.com").unwrap();
        assert_eq!(svc.verify(&token).unwrap(), "a@b.com");
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issuer = service_with("secret-one");
        let verifier = service_with("secret-two");

        let token = issuer.issue("a@b.com").unwrap();
        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid { .. })));
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let svc = service_with("test-secret");
        let token = svc.issue("a@b.com").unwrap();

        // Swap the payload segment for one claiming a different email
        let other = svc.issue("evil@b.com").unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        parts[1] = other_parts[1];
        let tampered = parts.join(".");

        assert!(matches!(svc.verify(&tampered), Err(TokenError::Invalid { .. })));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let svc = service_with("test-secret");
        assert!(matches!(svc.verify("not-a-jwt"), Err(TokenError::Invalid { .. })));
    }

    #[test]
    fn test_expired_token() {
        let svc = TokenService::new(TokenConfig {
            secret: "test-secret".to_string(),
            expiry_secs: Some(-3600),
            leeway_secs: 0,
            ..Default::default()
        });

        let token = svc.issue("a@b.com").unwrap();
        assert_eq!(svc.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_unexpired_token_with_expiry_claim() {
        let svc = TokenService::new(TokenConfig {
            secret: "test-secret".to_string(),
            expiry_secs: Some(3600),
            ..Default::default()
        });

        let token = svc.issue("a@b.com").unwrap();
        assert_eq!(svc.verify(&token).unwrap(), "a@b.com");
    }

    #[test]
    fn test_issuer_mismatch() {
        let issuer = TokenService::new(TokenConfig {
            secret: "test-secret".to_string(),
            issuer: Some("other-service".to_string()),
            ..Default::default()
        });
        let verifier = TokenService::new(TokenConfig {
            secret: "test-secret".to_string(),
            issuer: Some("tally".to_string()),
            ..Default::default()
        });

        let token = issuer.issue("a@b.com").unwrap();
        assert_eq!(verifier.verify(&token), Err(TokenError::InvalidIssuer));
    }

    #[test]
    fn test_missing_issuer_claim_when_required() {
        let issuer = service_with("test-secret");
        let verifier = TokenService::new(TokenConfig {
            secret: "test-secret".to_string(),
            issuer: Some("tally".to_string()),
            ..Default::default()
        });

        let token = issuer.issue("a@b.com").unwrap();
        assert_eq!(verifier.verify(&token), Err(TokenError::InvalidIssuer));
    }

    #[test]
    fn test_future_issued_at_is_rejected() {
        let svc = TokenService::new(TokenConfig {
            secret: "test-secret".to_string(),
            leeway_secs: 0,
            ..Default::default()
        });

        let claims = TokenClaims {
            email: "a@b.com".to_string(),
            exp: None,
            iss: None,
            iat: Some(serde_json::Value::from(Utc::now().timestamp() + 86400)),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_eq!(svc.verify(&token), Err(TokenError::InvalidIssuedAt));
    }

    #[test]
    fn test_non_numeric_issued_at_is_rejected() {
        let svc = service_with("test-secret");

        let claims = TokenClaims {
            email: "a@b.com".to_string(),
            exp: None,
            iss: None,
            iat: Some(serde_json::Value::from("yesterday")),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_eq!(svc.verify(&token), Err(TokenError::InvalidIssuedAt));
    }

    #[test]
    fn test_valid_issued_at_passes() {
        let svc = TokenService::new(TokenConfig {
            secret: "test-secret".to_string(),
            include_issued_at: true,
            ..Default::default()
        });

        let token = svc.issue("a@b.com").unwrap();
        assert_eq!(svc.verify(&token).unwrap(), "a@b.com");
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("Bearer"), None);
    }
}
