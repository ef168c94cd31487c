//! Password hashing and verification using bcrypt

use std::sync::OnceLock;
use thiserror::Error;

/// Minimum password length in the default policy
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 5;

/// Plaintext behind the decoy hash checked for unknown accounts
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("password is shorter than {min} characters")]
    TooShort { min: usize },

    #[error("password does not match")]
    Mismatch,

    #[error("password hashing failed: {0}")]
    HashingFailure(String),
}

/// bcrypt hasher with a minimum-length policy
///
/// Hashes are bcrypt MCF strings (`$2b$<cost>$...`) so the cost travels with
/// the hash and verification needs no configuration.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    min_length: usize,
    cost: u32,
    /// Hash at `cost`, built on first use by [`PasswordHasher::reject_unknown`]
    decoy: OnceLock<Option<String>>,
}

impl PasswordHasher {
    pub fn new(min_length: usize, cost: u32) -> Self {
        Self {
            min_length,
            cost,
            decoy: OnceLock::new(),
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password using bcrypt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        self.check_length(password)?;

        bcrypt::hash(password, self.cost)
            .map_err(|e| PasswordError::HashingFailure(e.to_string()))
    }

    /// Verify a candidate password against a stored hash
    pub fn validate(&self, stored_hash: &str, candidate: &str) -> Result<(), PasswordError> {
        // Reject before paying for a bcrypt round.
        self.check_length(candidate)?;

        match bcrypt::verify(candidate, stored_hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PasswordError::Mismatch),
            Err(e) => Err(PasswordError::HashingFailure(e.to_string())),
        }
    }

    /// Reject a login for an account that does not exist
    ///
    /// Runs the same checks and one bcrypt verification at the configured
    /// cost, so the outcome and its latency match a wrong password.
    pub fn reject_unknown(&self, candidate: &str) -> PasswordError {
        if let Err(e) = self.check_length(candidate) {
            return e;
        }

        let decoy = self
            .decoy
            .get_or_init(|| bcrypt::hash(DECOY_PASSWORD, self.cost).ok());
        match decoy {
            Some(hash) => {
                let _ = bcrypt::verify(candidate, hash);
            }
            None => tracing::warn!(cost = self.cost, "Failed to build decoy password hash"),
        }

        PasswordError::Mismatch
    }

    #[cfg(test)]
    pub(crate) fn decoy_ready(&self) -> bool {
        matches!(self.decoy.get(), Some(Some(_)))
    }

    fn check_length(&self, password: &str) -> Result<(), PasswordError> {
        if password.chars().count() < self.min_length {
            return Err(PasswordError::TooShort {
                min: self.min_length,
            });
        }
        Ok(())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PASSWORD_LENGTH, bcrypt::DEFAULT_COST)
    }
}
