use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::Hmac;
use hmac::Mac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Size of the random CSRF secret in bytes.
const SECRET_SIZE: usize = 32;

/// Anti-forgery token service implementing the double-submit-cookie pattern.
///
/// A pair consists of a random secret and a verifier derived from it with
/// HMAC-SHA256 under a server-held key. The secret travels in an HttpOnly
/// cookie the browser returns automatically; the verifier travels in a
/// script-readable cookie and must be echoed back in a request header. A
/// third-party origin can trigger the cookie but cannot read it, so it can
/// never produce the matching header.
///
/// Verification is self-contained: nothing is persisted server-side, and the
/// keyed derivation means a verifier cannot be forged without the secret.
pub struct CsrfTokenService {
    key: Vec<u8>,
}

/// A CSRF secret and its derived verifier, both base64url-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfTokenPair {
    /// Random secret, delivered only in an HttpOnly cookie
    pub secret: String,
    /// Derived verifier, delivered in a readable cookie and echoed in a header
    pub token: String,
}

impl CsrfTokenService {
    /// Create a new CSRF token service with the given HMAC key.
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    /// Generate a fresh secret and its derived verifier.
    pub fn issue(&self) -> CsrfTokenPair {
        let mut bytes = [0u8; SECRET_SIZE];
        OsRng.fill_bytes(&mut bytes);
        let secret = URL_SAFE_NO_PAD.encode(bytes);
        let token = self.derive(&secret);

        CsrfTokenPair { secret, token }
    }

    /// Recompute the verifier for an existing secret.
    pub fn derive(&self, secret: &str) -> String {
        let mut mac = self.mac();
        mac.update(secret.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Check that a header-supplied verifier belongs to a cookie-supplied
    /// secret.
    ///
    /// Comparison is constant-time. Malformed input is a mismatch, never an
    /// error.
    pub fn validate(&self, secret: &str, token: &str) -> bool {
        let Ok(token_bytes) = URL_SAFE_NO_PAD.decode(token) else {
            return false;
        };

        let mut mac = self.mac();
        mac.update(secret.as_bytes());
        mac.verify_slice(&token_bytes).is_ok()
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.key).expect("HMAC key construction cannot fail")
    }
}
