//! Stateless session tokens: HS256 JWTs carrying `{ username, exp }`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::db::models::Identity;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    username: String,
    exp: i64,
}

/// Why a token was refused. Callers outside this module only ever see
/// `AppError::InvalidToken`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token could not be decoded")]
    Malformed,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and checks session tokens with one process-wide key.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        let secret = config
            .secret_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Internal("no token signing key configured".into()))?;
        Ok(Self::from_secret(secret.as_bytes(), config.token_ttl()))
    }

    pub fn from_secret(secret: &[u8], default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `validate_at`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn issue(&self, identity: &Identity, ttl: Duration) -> AppResult<String> {
        self.issue_at(identity, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity: &Identity,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal(format!("token lifetime {} is out of range", ttl)))?;
        let claims = Claims {
            username: identity.username.clone(),
            exp: expires_at.timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Check signature and expiry, returning the username claim.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        if data.claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(data.claims.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::identity;
    use chrono::TimeZone;

    fn service() -> TokenService {
        TokenService::from_secret(b"test-signing-key", Duration::minutes(120))
    }

    fn alice() -> Identity {
        identity("alice", Utc::now())
    }

    #[test]
    fn issued_token_validates_to_username() {
        let tokens = service();
        let token = tokens.issue(&alice(), tokens.default_ttl()).unwrap();
        assert_eq!(tokens.validate(&token).unwrap(), "alice");
    }

    #[test]
    fn token_fails_once_ttl_has_elapsed() {
        let tokens = service();
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let ttl = Duration::minutes(120);
        let token = tokens.issue_at(&alice(), ttl, issued).unwrap();

        let just_before = issued + ttl - Duration::seconds(1);
        assert_eq!(tokens.validate_at(&token, just_before).unwrap(), "alice");

        assert_eq!(
            tokens.validate_at(&token, issued + ttl),
            Err(TokenError::Expired)
        );
        assert_eq!(
            tokens.validate_at(&token, issued + ttl + Duration::minutes(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn expired_token_fails_against_wall_clock() {
        let tokens = service();
        let long_ago = Utc::now() - Duration::hours(5);
        let token = tokens
            .issue_at(&alice(), Duration::minutes(120), long_ago)
            .unwrap();
        assert_eq!(tokens.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let tokens = service();
        let token = tokens.issue(&alice(), Duration::minutes(5)).unwrap();

        let sig_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.into_bytes();
        bytes[sig_start] = if bytes[sig_start] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_eq!(tokens.validate(&tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn unrepresentable_expiry_is_an_error() {
        let tokens = service();
        let err = tokens
            .issue(&alice(), Duration::minutes(10_000_000_000_000))
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        let err = tokens
            .issue_at(&alice(), Duration::MAX, Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let other = TokenService::from_secret(b"someone-else", Duration::minutes(5));
        let token = other.issue(&alice(), Duration::minutes(5)).unwrap();
        assert_eq!(service().validate(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service();
        assert_eq!(tokens.validate("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(tokens.validate(""), Err(TokenError::Malformed));
    }

    #[test]
    fn new_requires_signing_key() {
        let config = AuthConfig::default();
        assert!(TokenService::new(&config).is_err());

        let mut config = AuthConfig::default();
        config.ensure_secret_key();
        let tokens = TokenService::new(&config).unwrap();
        assert_eq!(tokens.default_ttl(), Duration::minutes(120));
    }
}
