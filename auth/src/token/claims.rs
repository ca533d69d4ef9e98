use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by a session token.
///
/// A signed, time-bounded assertion of identity: subject id, username,
/// issued-at and expiry timestamps (Unix seconds). Verified statelessly;
/// there is no server-side session record behind a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Username at issuance time
    pub username: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Create claims for a user session expiring after `validity`.
    pub fn new(subject: impl ToString, username: impl ToString, validity: Duration) -> Self {
        Self::issued_at(subject, username, Utc::now(), validity)
    }

    /// Create claims with an explicit issuance instant.
    pub fn issued_at(
        subject: impl ToString,
        username: impl ToString,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Self {
        Self {
            sub: subject.to_string(),
            username: username.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + validity).timestamp(),
        }
    }

    /// Check whether the claims are expired at `current_timestamp`.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_claims() {
        let claims = SessionClaims::new("user123", "alice", Duration::hours(1));

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn test_is_expired() {
        let issued = DateTime::from_timestamp(1000, 0).unwrap();
        let claims = SessionClaims::issued_at("user123", "alice", issued, Duration::seconds(60));

        assert!(!claims.is_expired(1059));
        assert!(!claims.is_expired(1060)); // Exactly at expiration
        assert!(claims.is_expired(1061));
    }
}
