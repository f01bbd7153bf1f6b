//! File-backed token storage.

use crate::credential::Credential;
use crate::error::{ClientError, Result};
use crate::providers::TokenStorage;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persists the token as the sole content of one file.
///
/// On unix the file is created with mode `0600`.
#[derive(Clone, Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    /// Store the token at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the token file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, action: &str, error: &std::io::Error) -> ClientError {
        ClientError::Storage(format!(
            "failed to {action} {}: {error}",
            self.path.display()
        ))
    }
}

impl TokenStorage for FileTokenStorage {
    async fn load(&self) -> Result<Option<Credential>> {
        match tokio::fs::read_to_string(&self.path).await {
            // An empty file holds no token
            Ok(contents) => Ok(Credential::parse(&contents).ok()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_error("read", &e)),
        }
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error("create directory for", &e))?;
        }

        tokio::fs::write(&self.path, credential.secret())
            .await
            .map_err(|e| self.storage_error("write", &e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.storage_error("restrict permissions of", &e))?;
        }

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("remove", &e)),
        }
    }
}
