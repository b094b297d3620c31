use std::collections::BTreeMap;
use bcrypt::{hash, verify};
use crate::errors::{StoreError, StoreResult};

/// bcrypt only reads this many bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// On-disk shape of the credential file: username -> bcrypt hash.
pub type Credentials = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password_hash: String,  // never the plain password
}

impl User {
    pub fn with_password(username: &str, password: &str, cost: u32) -> StoreResult<Self> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(StoreError::PasswordTooLong(password.len()));
        }
        Ok(Self {
            username: username.to_string(),
            password_hash: hash(password.as_bytes(), cost)?,
        })
    }

    pub fn verify(&self, password: &str) -> StoreResult<bool> {
        Ok(verify(password.as_bytes(), &self.password_hash)?)
    }
}
