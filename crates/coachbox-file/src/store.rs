//! JSON file credential store.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use coachbox_core::error::StorageError;
use coachbox_core::{Credential, CredentialStore, Result};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// On-disk document. The keys are fixed; nothing else is written.
#[derive(Serialize, Deserialize)]
struct StoredCredential {
    access_token: String,
    refresh_token: String,
    token_type: String,
}

/// A credential store persisted as a single JSON file.
///
/// Writes go to a uniquely named temp file which is then renamed over the
/// target, so readers see either the old or the new credential and never a
/// mix. Writers serialize on an exclusive lock on a sibling `.lock` file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl FileCredentialStore {
    /// Create a store backed by the file at `path`. The file need not exist.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the path of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Run `f` while holding the writer lock.
    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| io_error(&lock_path, e))?;

        lock_file
            .lock_exclusive()
            .map_err(|e| io_error(&lock_path, e))?;

        // The lock is released when `lock_file` drops.
        f()
    }

    fn write_atomic(&self, contents: &[u8]) -> Result<()> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "credentials".to_string());
        let temp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        let mut file = File::create(&temp_path).map_err(|e| io_error(&temp_path, e))?;

        #[cfg(unix)]
        {
            let mut perms = file
                .metadata()
                .map_err(|e| io_error(&temp_path, e))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(|e| io_error(&temp_path, e))?;
        }

        file.write_all(contents)
            .and_then(|_| file.sync_all())
            .map_err(|e| io_error(&temp_path, e))?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(io_error(&self.path, e).into());
        }

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&self.path, e).into()),
        };

        let stored: StoredCredential =
            serde_json::from_slice(&contents).map_err(|e| StorageError::Corrupt {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(Some(Credential::new(
            stored.access_token,
            stored.refresh_token,
            stored.token_type,
        )))
    }

    #[instrument(skip(self, credential), fields(path = %self.path.display()))]
    fn set(&self, credential: &Credential) -> Result<()> {
        let stored = StoredCredential {
            access_token: credential.access_token().as_str().to_string(),
            refresh_token: credential.refresh_token().as_str().to_string(),
            token_type: credential.token_type().to_string(),
        };

        let json = serde_json::to_vec_pretty(&stored).map_err(|e| StorageError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        self.with_lock(|| self.write_atomic(&json))?;

        debug!("Stored credential");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<()> {
        self.with_lock(|| match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Cleared credential");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path, e).into()),
        })
    }
}
