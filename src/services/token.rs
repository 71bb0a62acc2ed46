//! Admin session tokens
//!
//! Compact HS256 JSON Web Tokens: `base64url(header).base64url(claims).base64url(mac)`,
//! unpadded. Only HS256 is accepted on verification.

use crate::models::Admin;
use chrono::Utc;
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// Token verification errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Identity carried by a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Admin ID
    pub sub: i64,
    pub email: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Issues and verifies admin tokens with a shared secret
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, ttl_seconds: i64) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl_seconds,
        }
    }

    /// Lifetime of newly issued tokens
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a token for `admin`, valid from now for the configured TTL.
    pub fn issue(&self, admin: &Admin) -> String {
        self.issue_at(admin, Utc::now().timestamp())
    }

    pub(crate) fn issue_at(&self, admin: &Admin, now: i64) -> String {
        let claims = Claims {
            sub: admin.id,
            email: admin.email.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> String {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        // Serializing plain structs of strings and integers cannot fail.
        let header_json = serde_json::to_vec(&header).unwrap_or_default();
        let claims_json = serde_json::to_vec(claims).unwrap_or_default();

        let signing_input = format!(
            "{}.{}",
            BASE64URL_NOPAD.encode(&header_json),
            BASE64URL_NOPAD.encode(&claims_json)
        );
        let Some(mac) = self.mac(signing_input.as_bytes()) else {
            return String::new();
        };
        let signature = mac.finalize().into_bytes();

        format!("{}.{}", signing_input, BASE64URL_NOPAD.encode(&signature))
    }

    /// Check a token's structure, algorithm, signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub(crate) fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = BASE64URL_NOPAD
            .decode(signature_b64.as_bytes())
            .map_err(|_| TokenError::Malformed)?;
        let signing_input = format!("{}.{}", header_b64, claims_b64);
        self.mac(signing_input.as_bytes())
            .ok_or(TokenError::InvalidSignature)?
            .verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims = decode_segment(claims_b64)?;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Keyed MAC over `data`. HMAC accepts keys of any length, so this is
    /// always `Some` in practice.
    fn mac(&self, data: &[u8]) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(data);
        Some(mac)
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = BASE64URL_NOPAD
        .decode(segment.as_bytes())
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NOW: i64 = 1_700_000_000;

    fn admin() -> Admin {
        let mut admin = Admin::new("admin@example.com".to_string(), None, "hash".to_string());
        admin.id = 7;
        admin
    }

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", 3600)
    }

    #[test]
    fn test_issue_then_verify() {
        let token = codec().issue_at(&admin(), NOW);
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));

        let claims = codec().verify_at(&token, NOW + 10).expect("valid token");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + 3600);
    }

    #[test]
    fn test_header_is_hs256_jwt() {
        let token = codec().issue_at(&admin(), NOW);
        let header_b64 = token.split('.').next().unwrap();
        let header: serde_json::Value =
            serde_json::from_slice(&BASE64URL_NOPAD.decode(header_b64.as_bytes()).unwrap())
                .unwrap();
        assert_eq!(header, serde_json::json!({"alg": "HS256", "typ": "JWT"}));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = codec().issue_at(&admin(), NOW);
        assert_eq!(codec().verify_at(&token, NOW + 3600), Err(TokenError::Expired));
        assert_eq!(codec().verify_at(&token, NOW + 9999), Err(TokenError::Expired));
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_wrapping() {
        let codec = TokenCodec::new("test-secret", i64::MAX);
        let token = codec.issue_at(&admin(), NOW);
        let claims = codec.verify_at(&token, NOW + 10).expect("valid token");
        assert_eq!(claims.exp, i64::MAX);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = codec().issue_at(&admin(), NOW);
        let other = TokenCodec::new("another-secret", 3600);
        assert_eq!(other.verify_at(&token, NOW), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let token = codec().issue_at(&admin(), NOW);
        let parts: Vec<&str> = token.split('.').collect();
        let forged = Claims {
            sub: 1,
            email: "attacker@example.com".to_string(),
            iat: NOW,
            exp: NOW + 100_000,
        };
        let forged_b64 = BASE64URL_NOPAD.encode(&serde_json::to_vec(&forged).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], forged_b64, parts[2]);

        assert_eq!(codec().verify_at(&tampered, NOW), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let header = BASE64URL_NOPAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = BASE64URL_NOPAD.encode(br#"{"sub":1,"email":"a@b.c","iat":0,"exp":9999999999}"#);
        let token = format!("{}.{}.", header, claims);

        assert_eq!(
            codec().verify_at(&token, NOW),
            Err(TokenError::UnsupportedAlgorithm("none".to_string()))
        );
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.##", "e30.e30.e30"] {
            assert!(codec().verify_at(token, NOW).is_err(), "accepted {:?}", token);
        }
        assert_eq!(codec().verify_at("a.b", NOW), Err(TokenError::Malformed));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", codec());
        assert!(!debug.contains("test-secret"));
    }

    proptest! {
        #[test]
        fn prop_flipping_any_signature_char_invalidates(idx in 0usize..43) {
            let token = codec().issue_at(&admin(), NOW);
            let (head, sig) = token.rsplit_once('.').unwrap();
            let mut sig: Vec<char> = sig.chars().collect();
            let i = idx % sig.len();
            sig[i] = if sig[i] == 'A' { 'B' } else { 'A' };
            let tampered = format!("{}.{}", head, sig.into_iter().collect::<String>());
            prop_assert!(codec().verify_at(&tampered, NOW).is_err());
        }

        #[test]
        fn prop_valid_until_exp(offset in 0i64..3600) {
            let token = codec().issue_at(&admin(), NOW);
            prop_assert!(codec().verify_at(&token, NOW + offset).is_ok());
        }
    }
}
