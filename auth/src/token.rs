use std::collections::HashMap;

use chrono::Duration;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;

/// Issues and verifies time-bounded signed identity tokens.
///
/// Verification is deliberately lossy: a bad signature, a malformed token and
/// an expired token all come back as `None`.
pub struct TokenService {
    jwt_handler: JwtHandler,
    default_ttl: Duration,
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Arguments
    /// * `jwt_handler` - Configured signing handler
    /// * `default_ttl` - Lifetime applied when `issue` gets no explicit ttl
    pub fn new(jwt_handler: JwtHandler, default_ttl: Duration) -> Self {
        Self {
            jwt_handler,
            default_ttl,
        }
    }

    /// Default token lifetime.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a signed token for `subject` carrying `payload`.
    ///
    /// # Arguments
    /// * `subject` - Subject identifier stored in `sub`
    /// * `payload` - Service specific claims
    /// * `ttl` - Token lifetime, the configured default when `None`
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn issue<P: Serialize>(
        &self,
        subject: impl ToString,
        payload: P,
        ttl: Option<Duration>,
    ) -> Result<String, JwtError> {
        let claims = Claims::new(
            subject,
            payload,
            Utc::now(),
            ttl.unwrap_or(self.default_ttl),
        );
        self.jwt_handler.encode(&claims)
    }

    /// Verify a token and return its claims.
    ///
    /// # Returns
    /// Decoded claims, or `None` when the token is forged, malformed or expired
    pub fn verify<P: DeserializeOwned>(&self, token: &str) -> Option<Claims<P>> {
        let claims = match self.jwt_handler.decode::<Claims<P>>(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                return None;
            }
        };

        if claims.is_expired(Utc::now().timestamp()) {
            tracing::debug!(exp = claims.exp, "Token rejected at expiration instant");
            return None;
        }

        Some(claims)
    }

    /// Extract the subject of a valid token.
    pub fn extract_subject(&self, token: &str) -> Option<String> {
        self.verify::<HashMap<String, serde_json::Value>>(token)
            .map(|claims| claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Identity {
        email: String,
        role: String,
        full_name: String,
    }

    fn service() -> TokenService {
        TokenService::new(JwtHandler::new(SECRET), Duration::minutes(30))
    }

    fn identity() -> Identity {
        Identity {
            email: "alice@s.edu".to_string(),
            role: "student".to_string(),
            full_name: "Alice".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();

        let token = tokens.issue("user123", identity(), None).unwrap();
        let claims: Claims<Identity> = tokens.verify(&token).expect("token should verify");

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.payload, identity());
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_explicit_ttl_overrides_default() {
        let tokens = service();

        let token = tokens
            .issue("user123", identity(), Some(Duration::minutes(5)))
            .unwrap();
        let claims: Claims<Identity> = tokens.verify(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }

    #[test]
    fn test_zero_ttl_is_rejected_immediately() {
        let tokens = service();

        let token = tokens
            .issue("user123", identity(), Some(Duration::zero()))
            .unwrap();

        assert!(tokens.verify::<Identity>(&token).is_none());
        assert!(tokens.extract_subject(&token).is_none());
    }

    #[test]
    fn test_negative_ttl_is_rejected() {
        let tokens = service();

        let token = tokens
            .issue("user123", identity(), Some(Duration::hours(-1)))
            .unwrap();

        assert!(tokens.verify::<Identity>(&token).is_none());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let other = TokenService::new(
            JwtHandler::new(b"another_secret_key_at_least_32_bytes"),
            Duration::minutes(30),
        );

        let token = other.issue("user123", identity(), None).unwrap();

        assert!(service().verify::<Identity>(&token).is_none());
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let tokens = service();

        for token in ["", "abc", "a.b.c", "invalid.token.here", "...."] {
            assert!(tokens.verify::<Identity>(token).is_none(), "{token}");
        }
    }

    #[test]
    fn test_single_bit_mutation_is_rejected() {
        let tokens = service();
        let token = tokens.issue("user123", identity(), None).unwrap();
        let bytes = token.as_bytes();

        for position in 0..bytes.len() {
            for bit in 0..8 {
                let mut mutated = bytes.to_vec();
                mutated[position] ^= 1 << bit;

                let Ok(mutated) = String::from_utf8(mutated) else {
                    continue;
                };

                assert!(
                    tokens.verify::<Identity>(&mutated).is_none(),
                    "mutation at byte {position} bit {bit} was accepted"
                );
            }
        }
    }

    #[test]
    fn test_payload_mismatch_is_rejected() {
        let tokens = service();

        #[derive(Serialize)]
        struct Partial {
            email: String,
        }

        let token = tokens
            .issue(
                "user123",
                Partial {
                    email: "alice@s.edu".to_string(),
                },
                None,
            )
            .unwrap();

        assert!(tokens.verify::<Identity>(&token).is_none());
        assert_eq!(tokens.extract_subject(&token), Some("user123".to_string()));
    }

    #[test]
    fn test_extract_subject() {
        let tokens = service();
        let token = tokens.issue("user123", identity(), None).unwrap();

        assert_eq!(tokens.extract_subject(&token), Some("user123".to_string()));
        assert_eq!(tokens.extract_subject("garbage"), None);
    }
}
