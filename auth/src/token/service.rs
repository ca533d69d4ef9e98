use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::SessionClaims;
use super::errors::TokenError;

/// Session token issuer and validator.
///
/// Signs tokens with HS256 under a server-held secret and a fixed validity
/// window. Verification is pure: no I/O, no store lookup, so any number of
/// instances sharing the secret validate each other's tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validity: Duration,
}

impl TokenService {
    /// Create a new token service.
    ///
    /// # Arguments
    /// * `secret` - Signing key (should be at least 32 bytes for HS256)
    /// * `validity` - Lifetime of issued tokens
    ///
    /// # Security Notes
    /// - Store the secret in environment variables or a vault, never in code
    /// - Rotate the secret periodically; rotation invalidates outstanding tokens
    pub fn new(secret: &[u8], validity: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            validity,
        }
    }

    /// Issue a signed session token for a user.
    ///
    /// # Arguments
    /// * `subject` - User identifier placed in the `sub` claim
    /// * `username` - Username at issuance time
    ///
    /// # Returns
    /// Compact signed token string
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: &str, username: &str) -> Result<String, TokenError> {
        let claims = SessionClaims::new(subject, username, self.validity);
        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Arguments
    /// * `token` - Compact token string
    ///
    /// # Errors
    /// * `Expired` - Token is past its expiry
    /// * `Invalid` - Signature does not match or the structure is malformed
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let validation = Validation::new(self.algorithm);

        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new(SECRET, Duration::hours(1));

        let token = service.issue("user123", "alice").expect("Failed to issue");
        assert!(!token.is_empty());

        let claims = service.verify(&token).expect("Failed to verify");
        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn test_verify_expired_token() {
        // Negative validity puts the expiry well beyond the validation leeway
        let service = TokenService::new(SECRET, Duration::hours(-2));

        let token = service.issue("user123", "alice").expect("Failed to issue");
        let result = service.verify(&token);

        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let issuer = TokenService::new(SECRET, Duration::hours(1));
        let other = TokenService::new(b"another_secret_at_least_32_bytes!!", Duration::hours(1));

        let token = issuer.issue("user123", "alice").expect("Failed to issue");
        let result = other.verify(&token);

        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_verify_tampered_token() {
        let service = TokenService::new(SECRET, Duration::hours(1));

        let token = service.issue("user123", "alice").expect("Failed to issue");
        // Flip a character inside the payload segment
        let mut tampered: Vec<char> = token.chars().collect();
        let payload_start = token.find('.').unwrap() + 1;
        tampered[payload_start] = if tampered[payload_start] == 'A' { 'B' } else { 'A' };
        let tampered: String = tampered.into_iter().collect();

        assert!(matches!(
            service.verify(&tampered),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_verify_malformed_token() {
        let service = TokenService::new(SECRET, Duration::hours(1));

        assert!(matches!(
            service.verify("not.a.token"),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(service.verify(""), Err(TokenError::Invalid(_))));
    }
}
