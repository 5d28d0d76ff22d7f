//! On-disk persistence of the signed-in session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::session::SessionInfo;

/// File name of the persisted session inside the data directory.
const SESSION_FILE: &str = "session.json";

/// JSON file holding the current token pair.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/profile-tree/session.json`, if the platform has a data dir.
    pub fn default_location() -> Option<Self> {
        dirs::data_local_dir().map(|dir| Self::new(dir.join("profile-tree").join(SESSION_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session. Missing or unreadable files yield `None`.
    pub fn load(&self) -> Option<SessionInfo> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt session file");
                None
            }
        }
    }

    /// Store `session`, or delete the file when `None`.
    pub fn save(&self, session: Option<&SessionInfo>) -> io::Result<()> {
        let Some(session) = session else {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            };
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(session).map_err(io::Error::other)?;
        fs::write(&self.path, json)?;
        restrict_permissions(&self.path)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session() -> SessionInfo {
        SessionInfo {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
        }
    }

    #[test]
    fn save_then_load_returns_session() {
        let dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(dir.path().join("nested").join("session.json"));
        storage.save(Some(&session())).unwrap();
        assert_eq!(storage.load(), Some(session()));
    }

    #[test]
    fn saving_none_deletes_file() {
        let dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(dir.path().join("session.json"));
        storage.save(Some(&session())).unwrap();
        storage.save(None).unwrap();
        assert!(!storage.path().exists());
        assert_eq!(storage.load(), None);
    }

    #[test]
    fn deleting_missing_file_is_ok() {
        let dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(dir.path().join("session.json"));
        assert!(storage.save(None).is_ok());
    }

    #[test]
    fn corrupt_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(SessionStorage::new(path).load(), None);
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(dir.path().join("session.json"));
        storage.save(Some(&session())).unwrap();
        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
