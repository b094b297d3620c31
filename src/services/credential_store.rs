use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;
use crate::errors::{StoreError, StoreResult};
use crate::models::{Credentials, User, MAX_PASSWORD_BYTES};

/// Username -> bcrypt hash mapping kept in a single JSON file.
///
/// Every call reads the whole file; every successful signup replaces it
/// through a temporary file in the same directory followed by a rename, so a
/// crash mid-write leaves the previous contents intact. Signups inside this
/// process are serialised; separate processes sharing the file are not.
pub struct CredentialStore {
    path: PathBuf,
    bcrypt_cost: u32,
    write_lock: Arc<Mutex<()>>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>, bcrypt_cost: u32) -> Self {
        Self {
            path: path.into(),
            bcrypt_cost,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty mapping when the file does not exist yet.
    pub fn load(&self) -> StoreResult<Credentials> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Credentials::new()),
            Err(source) => {
                return Err(StoreError::Io { path: self.path.clone(), source });
            }
        };

        serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, credentials: &Credentials) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir.clone(), source })?;

        let body = serde_json::to_vec_pretty(credentials).map_err(StoreError::Serialize)?;
        let io_error = |source| StoreError::Io { path: self.path.clone(), source };

        let mut temp = NamedTempFile::new_in(&dir).map_err(io_error)?;
        temp.write_all(&body).map_err(io_error)?;
        temp.as_file().sync_all().map_err(io_error)?;
        temp.persist(&self.path).map_err(|source| StoreError::Persist {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!("Wrote {} credentials to {}", credentials.len(), self.path.display());
        Ok(())
    }

    /// False when the username is taken; the store is left untouched.
    pub fn signup(&self, username: &str, password: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut credentials = self.load()?;
        if credentials.contains_key(username) {
            tracing::info!("Signup rejected, username already exists: {}", username);
            return Ok(false);
        }

        let user = User::with_password(username, password, self.bcrypt_cost)?;
        credentials.insert(user.username, user.password_hash);
        self.save(&credentials)?;

        tracing::info!("Created account: {}", username);
        Ok(true)
    }

    /// Passwords longer than bcrypt reads never match, and neither do
    /// stored values that are not bcrypt hashes.
    pub fn login(&self, username: &str, password: &str) -> StoreResult<bool> {
        let credentials = self.load()?;
        let Some(password_hash) = credentials.get(username) else {
            return Ok(false);
        };
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        let user = User {
            username: username.to_string(),
            password_hash: password_hash.clone(),
        };
        match user.verify(password) {
            Err(StoreError::Hash(e)) => {
                tracing::warn!("Stored credential for {} is not a bcrypt hash: {}", username, e);
                Ok(false)
            }
            result => result,
        }
    }
}

impl Clone for CredentialStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            bcrypt_cost: self.bcrypt_cost,
            write_lock: self.write_lock.clone(),
        }
    }
}
