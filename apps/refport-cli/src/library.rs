//! JSON library file backing the CLI's record store

use std::fs;
use std::path::{Path, PathBuf};

use refport_core::{InMemoryStore, InterchangeError, Result};
use tracing::debug;

/// A store loaded from, and saved back to, one JSON file
pub struct Library {
    path: PathBuf,
    pub store: InMemoryStore,
}

fn io_error(path: &Path, e: impl std::fmt::Display) -> InterchangeError {
    InterchangeError::Io {
        message: format!("{}: {}", path.display(), e),
    }
}

impl Library {
    /// Open `path`, starting empty when the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let store = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
            serde_json::from_str(&content).map_err(|e| InterchangeError::Store {
                message: format!("{}: {}", path.display(), e),
            })?
        } else {
            debug!(path = %path.display(), "starting a new library");
            InMemoryStore::new()
        };
        Ok(Self { path, store })
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.store).map_err(|e| InterchangeError::Store {
            message: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(|e| io_error(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refport_core::{CanonicalReference, RecordStore, ReferenceType};

    #[test]
    fn test_open_save_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");

        let mut library = Library::open(&path).unwrap();
        assert!(library.store.is_empty());
        library
            .store
            .create(&CanonicalReference::new(ReferenceType::Book, "Kept"))
            .unwrap();
        library.save().unwrap();

        let reopened = Library::open(&path).unwrap();
        assert_eq!(reopened.store, library.store);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Library::open(&path),
            Err(InterchangeError::Store { .. })
        ));
    }
}
