use bcrypt::BcryptError;

use crate::config::SecurityConfig;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] BcryptError),
}

/// bcrypt wrapper with a configurable work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::from_config(&SecurityConfig::default())
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.bcrypt_cost)
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Salted bcrypt hash of `plaintext` at this hasher's cost.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Check `plaintext` against a stored hash using the cost recorded in the hash.
    ///
    /// Hashes that do not parse yield `Ok(false)`.
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
        match bcrypt::verify(plaintext, hash) {
            Ok(matches) => Ok(matches),
            Err(
                BcryptError::InvalidHash(_)
                | BcryptError::InvalidPrefix(_)
                | BcryptError::InvalidCost(_)
                | BcryptError::CostNotAllowed(_)
                | BcryptError::InvalidSaltLen(_)
                | BcryptError::InvalidBase64(_),
            ) => {
                tracing::debug!("stored password hash is malformed");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}
