use std::fmt;
use std::fs;
use std::io::{self, Write as _};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::abs_path::AbsPathBuf;

/// Opaque bearer token issued by the login endpoint.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value of the session cookie used by the file transfer endpoint.
    pub fn cookie(&self) -> String {
        format!("JWT={}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Credential(********)")
    }
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Could not find credential file : {0}")]
    NotFound(AbsPathBuf),
    #[error("Could not read credential file : {path}")]
    ReadError {
        path: AbsPathBuf,
        #[source]
        source: io::Error,
    },
}

/// Stores a single credential as the whole content of one file.
///
/// Nothing is cached in memory; every `load` reads the file again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialStore {
    path: AbsPathBuf,
}

impl CredentialStore {
    pub fn new(path: AbsPathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &AbsPathBuf {
        &self.path
    }

    /// Replaces the stored credential.
    ///
    /// The token goes to a temporary file next to the target first, which is then renamed
    /// over it. A failed write leaves the previous credential intact.
    pub fn save(&self, credential: &Credential) -> io::Result<()> {
        let dir = self.path.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Credential path has no parent directory : {}", self.path),
            )
        })?;
        dir.create_dir_all()?;
        let mut file = NamedTempFile::new_in(dir.as_ref())?;
        file.write_all(credential.as_str().as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(self.path.as_ref()).map_err(|err| err.error)?;
        log::debug!("Saved credential to {}", self.path);
        Ok(())
    }

    /// Returns the raw content of the credential file.
    pub fn load(&self) -> Result<Credential, CredentialError> {
        if !self.path.exists() {
            return Err(CredentialError::NotFound(self.path.clone()));
        }
        match fs::read_to_string(self.path.as_ref()) {
            Ok(token) => Ok(Credential(token)),
            Err(source) => Err(CredentialError::ReadError {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn remove_pretty(&self, cnsl: &mut dyn io::Write) -> crate::Result<bool> {
        self.path.remove_file_pretty(None, cnsl)
    }
}
