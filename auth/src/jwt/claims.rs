use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// JWT claims: the registered claims every token carries plus a service
/// defined payload flattened into the same JSON object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims<P> {
    /// Subject (user identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Service specific fields
    #[serde(flatten)]
    pub payload: P,
}

impl<P> Claims<P> {
    /// Create claims valid from `issued_at` for `ttl`.
    ///
    /// # Arguments
    /// * `subject` - Unique subject identifier
    /// * `payload` - Service specific fields
    /// * `issued_at` - Issuance instant
    /// * `ttl` - Lifetime of the token
    ///
    /// # Returns
    /// Claims with sub, iat and exp set
    pub fn new(
        subject: impl ToString,
        payload: P,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            payload,
        }
    }

    /// Check if the token is expired at `current_timestamp`.
    ///
    /// A token stops being valid at its expiration instant.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Profile {
        email: String,
        role: String,
    }

    fn profile() -> Profile {
        Profile {
            email: "alice@s.edu".to_string(),
            role: "student".to_string(),
        }
    }

    #[test]
    fn test_new_claims() {
        let now = Utc::now();
        let claims = Claims::new("user123", profile(), now, Duration::minutes(30));

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 30 * 60);
        assert_eq!(claims.payload, profile());
    }

    #[test]
    fn test_payload_is_flattened() {
        let claims = Claims::new("user123", profile(), Utc::now(), Duration::minutes(1));

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sub"], "user123");
        assert_eq!(json["email"], "alice@s.edu");
        assert_eq!(json["role"], "student");
        assert!(json.get("payload").is_none());

        let loose: Claims<HashMap<String, serde_json::Value>> =
            serde_json::from_value(json).unwrap();
        assert_eq!(loose.sub, "user123");
        assert_eq!(loose.payload["role"], "student");
    }

    #[test]
    fn test_is_expired() {
        let claims = Claims {
            sub: "user123".to_string(),
            iat: 900,
            exp: 1000,
            payload: (),
        };

        assert!(!claims.is_expired(999));
        assert!(claims.is_expired(1000)); // Exactly at expiration
        assert!(claims.is_expired(1001));
    }

    #[test]
    fn test_zero_ttl_is_expired_at_issuance() {
        let now = Utc::now();
        let claims = Claims::new("user123", profile(), now, Duration::zero());

        assert!(claims.is_expired(now.timestamp()));
    }
}
