use std::sync::Arc;

use crate::db::models::Identity;
use crate::error::{AppError, AppResult};
use crate::store::IdentityStore;

/// One-way password hashing with verification.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> AppResult<String>;

    /// True when `plaintext` matches `hash`. Malformed hashes never match.
    fn verify(&self, plaintext: &str, hash: &str) -> bool;

    /// Spend the same effort as a real `verify` without a stored hash.
    fn verify_dummy(&self, plaintext: &str);
}

pub struct BcryptHasher {
    cost: u32,
    /// Verified against when the username is unknown, so both failure paths
    /// do the same amount of work.
    dummy_hash: String,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> AppResult<Self> {
        let dummy_hash = bcrypt::hash("murmur-dummy-password", cost)
            .map_err(|e| AppError::Internal(format!("bcrypt: {}", e)))?;
        Ok(Self { cost, dummy_hash })
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> AppResult<String> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| AppError::Internal(format!("bcrypt: {}", e)))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        // bcrypt compares digests in constant time
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }

    fn verify_dummy(&self, plaintext: &str) {
        let _ = bcrypt::verify(plaintext, &self.dummy_hash);
    }
}

/// Username/password verification over the identity store.
pub struct CredentialStore {
    identities: Arc<dyn IdentityStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl CredentialStore {
    pub fn new(identities: Arc<dyn IdentityStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { identities, hasher }
    }

    pub fn hasher(&self) -> &dyn PasswordHasher {
        self.hasher.as_ref()
    }

    /// Resolve an identity by username without any password check.
    pub async fn lookup(&self, username: &str) -> AppResult<Option<Identity>> {
        Ok(self.identities.find_by_username(username).await?)
    }

    /// Check a username/password pair.
    ///
    /// Unknown username and wrong password are indistinguishable to the
    /// caller: both are `AppError::CouldNotVerify`.
    pub async fn verify(&self, username: &str, plaintext: &str) -> AppResult<Identity> {
        match self.lookup(username).await? {
            Some(identity) if self.hasher.verify(plaintext, &identity.password_hash) => {
                Ok(identity)
            }
            Some(_) => Err(AppError::CouldNotVerify),
            None => {
                self.hasher.verify_dummy(plaintext);
                Err(AppError::CouldNotVerify)
            }
        }
    }
}
