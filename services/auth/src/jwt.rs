//! Token codec for signing and verifying bearer tokens
//!
//! Tokens are HS256 JWTs carrying the user id, issue and expiry times and a
//! random token id, so two tokens issued for the same user in the same second
//! never collide. The codec is stateless: liveness is decided by the session
//! store, the codec only answers "was this minted with our secret".

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Minimum accepted secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Token codec errors
#[derive(Error, Debug)]
pub enum TokenError {
    /// The signing secret is unusable
    #[error("JWT secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    /// Signature or structure did not verify
    #[error("malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// Unique token ID
    pub jti: Uuid,
}

/// Signs and verifies bearer tokens with a shared secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Initialize a codec from the shared secret
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::WeakSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is enforced against the session store and the service clock
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(TokenCodec {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Generate a token for `user_id` expiring at `now + ttl`
    pub fn generate(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let expires_at = now + ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((token, expires_at))
    }

    /// Decode the claims, failing on any signature or structure problem
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// True iff the token is well-formed and signed with our secret
    pub fn validate_signature(&self, token: &str) -> bool {
        self.decode(token).is_ok()
    }

    /// Extract the user id without consulting any store
    pub fn extract_user_id(&self, token: &str) -> Result<Uuid, TokenError> {
        Ok(self.decode(token)?.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_rejects_short_secret() {
        assert!(matches!(
            TokenCodec::new(b"short"),
            Err(TokenError::WeakSecret)
        ));
    }

    #[test]
    fn test_generate_embeds_user_and_expiry() {
        let codec = TokenCodec::new(SECRET).unwrap();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let (token, expires_at) = codec.generate(user_id, now, Duration::hours(24)).unwrap();
        let claims = codec.decode(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp, expires_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert_eq!(codec.extract_user_id(&token).unwrap(), user_id);
    }

    #[test]
    fn test_tokens_are_unique_for_identical_inputs() {
        let codec = TokenCodec::new(SECRET).unwrap();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let (a, _) = codec.generate(user_id, now, Duration::hours(1)).unwrap();
        let (b, _) = codec.generate(user_id, now, Duration::hours(1)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token_still_has_valid_signature() {
        let codec = TokenCodec::new(SECRET).unwrap();
        let issued = Utc::now() - Duration::days(10);
        let (token, _) = codec
            .generate(Uuid::new_v4(), issued, Duration::hours(1))
            .unwrap();
        assert!(codec.validate_signature(&token));
    }

    #[test]
    fn test_validate_signature_fails_closed() {
        let codec = TokenCodec::new(SECRET).unwrap();
        let other = TokenCodec::new(b"another-secret-another-secret-xyz").unwrap();
        let (token, _) = codec
            .generate(Uuid::new_v4(), Utc::now(), Duration::hours(1))
            .unwrap();

        assert!(!other.validate_signature(&token));
        assert!(!codec.validate_signature(""));
        assert!(!codec.validate_signature("not.a.jwt"));
        assert!(!codec.validate_signature("Bearer something"));

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(!codec.validate_signature(&tampered));

        assert!(matches!(
            codec.extract_user_id("garbage"),
            Err(TokenError::Malformed(_))
        ));
    }
}
