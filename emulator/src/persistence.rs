//! Loading and saving memory banks.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::SAVE_FILE_NAME;
use crate::memory::{MemoryBank, ParseMemoryError};
use crate::processor::Processor;
use crate::session::Session;

/// Where memory files live
pub trait Storage {
    /// Read a whole file
    ///
    /// # Errors
    ///
    /// Fails if the file does not exist or can't be read.
    fn read(&self, path: &Utf8Path) -> std::io::Result<String>;

    /// Create or replace a file
    ///
    /// # Errors
    ///
    /// Fails if the file can't be written.
    fn write(&mut self, path: &Utf8Path, content: &str) -> std::io::Result<()>;

    fn exists(&self, path: &Utf8Path) -> bool;
}

/// Files of the real filesystem, relative paths being resolved from a root
/// directory
#[derive(Debug, Clone)]
pub struct NativeStorage {
    root: Utf8PathBuf,
}

impl NativeStorage {
    #[must_use]
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// Rooted at the current working directory
    ///
    /// # Errors
    ///
    /// Fails if the working directory is unavailable or is not valid UTF-8.
    pub fn from_env() -> std::io::Result<Self> {
        let root = std::env::current_dir()?;
        let root = Utf8PathBuf::try_from(root).map_err(|e| e.into_io_error())?;
        Ok(Self { root })
    }

    fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        self.root.join(path)
    }
}

impl Storage for NativeStorage {
    fn read(&self, path: &Utf8Path) -> std::io::Result<String> {
        std::fs::read_to_string(self.resolve(path))
    }

    fn write(&mut self, path: &Utf8Path, content: &str) -> std::io::Result<()> {
        std::fs::write(self.resolve(path), content)
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        self.resolve(path).exists()
    }
}

/// Files kept in a map
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    files: HashMap<Utf8PathBuf, String>,
}

impl InMemoryStorage {
    #[must_use]
    pub const fn new(files: HashMap<Utf8PathBuf, String>) -> Self {
        Self { files }
    }

    #[must_use]
    pub fn get(&self, path: &Utf8Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }
}

impl Storage for InMemoryStorage {
    fn read(&self, path: &Utf8Path) -> std::io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"))
    }

    fn write(&mut self, path: &Utf8Path, content: &str) -> std::io::Result<()> {
        self.files.insert(path.to_owned(), content.to_owned());
        Ok(())
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        self.files.contains_key(path)
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("could not access {path}: {inner}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        inner: std::io::Error,
    },

    #[error("could not read memory from {path}: {inner}")]
    Parse {
        path: Utf8PathBuf,

        /// Content of the file, to point at the error
        content: String,

        #[source]
        inner: ParseMemoryError,
    },
}

/// Read a memory bank from a file
///
/// # Errors
///
/// Fails if the file can't be read or does not hold a valid memory bank.
#[tracing::instrument(skip(storage))]
pub fn load<S: Storage + ?Sized>(
    storage: &S,
    path: &Utf8Path,
) -> Result<MemoryBank, PersistenceError> {
    let content = storage.read(path).map_err(|inner| PersistenceError::Io {
        path: path.to_owned(),
        inner,
    })?;

    match content.parse() {
        Ok(memory) => {
            debug!("Memory loaded");
            Ok(memory)
        }
        Err(inner) => Err(PersistenceError::Parse {
            path: path.to_owned(),
            content,
            inner,
        }),
    }
}

/// Write a memory bank to a file
///
/// # Errors
///
/// Fails if the file can't be written.
#[tracing::instrument(skip(storage, memory))]
pub fn save<S: Storage + ?Sized>(
    storage: &mut S,
    path: &Utf8Path,
    memory: &MemoryBank,
) -> Result<(), PersistenceError> {
    storage
        .write(path, &memory.serialize())
        .map_err(|inner| PersistenceError::Io {
            path: path.to_owned(),
            inner,
        })?;
    info!(%path, "Memory saved");
    Ok(())
}

/// First `saved-ram-N` name not taken yet, counting from 1
#[must_use]
pub fn free_file_name<S: Storage + ?Sized>(storage: &S) -> Utf8PathBuf {
    (1..)
        .map(|i| Utf8PathBuf::from(format!("{SAVE_FILE_NAME}{i}")))
        .find(|path| !storage.exists(path))
        .unwrap_or_else(|| Utf8PathBuf::from(SAVE_FILE_NAME))
}

/// Save to a fresh file, which becomes the current file
///
/// # Errors
///
/// Fails if the file can't be written. The current file is left unchanged
/// then.
pub fn save_to_new_file<P, S>(
    session: &mut Session<P>,
    storage: &mut S,
) -> Result<Utf8PathBuf, PersistenceError>
where
    P: Processor,
    S: Storage + ?Sized,
{
    let path = free_file_name(storage);
    save(storage, &path, &session.memory)?;
    session.current_file = Some(path.clone());
    Ok(path)
}

/// Save to the current file, or to a fresh one if there is none
///
/// # Errors
///
/// Fails if the file can't be written.
pub fn save_to_current_file<P, S>(
    session: &Session<P>,
    storage: &mut S,
) -> Result<Utf8PathBuf, PersistenceError>
where
    P: Processor,
    S: Storage + ?Sized,
{
    let path = session
        .current_file
        .clone()
        .unwrap_or_else(|| free_file_name(storage));
    save(storage, &path, &session.memory)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::keys::ExitFlag;
    use crate::processor::Sequencer;
    use crate::word::{Address, AddressSpace, Word};

    fn session(memory: MemoryBank) -> Session<Sequencer> {
        Session::new(memory, Sequencer::default(), ExitFlag::new())
    }

    #[test]
    fn load_save_test() {
        let mut memory = MemoryBank::new();
        memory.set(Address::new(AddressSpace::Data, 3), Word::from_int(0x2a).unwrap());

        let mut storage = InMemoryStorage::default();
        save(&mut storage, Utf8Path::new("prog"), &memory).unwrap();
        assert_eq!(storage.get(Utf8Path::new("prog")), Some(memory.serialize().as_str()));

        let loaded = load(&storage, Utf8Path::new("prog")).unwrap();
        assert_eq!(loaded, memory);
    }

    #[test]
    fn load_errors_test() {
        let mut storage = InMemoryStorage::default();
        let err = load(&storage, Utf8Path::new("missing")).unwrap_err();
        assert!(matches!(err, PersistenceError::Io { .. }));

        storage.write(Utf8Path::new("garbage"), "01x").unwrap();
        let err = load(&storage, Utf8Path::new("garbage")).unwrap_err();
        match err {
            PersistenceError::Parse { path, content, inner } => {
                assert_eq!(path, "garbage");
                assert_eq!(content, "01x");
                assert_eq!(inner.offset, 2);
            }
            PersistenceError::Io { .. } => panic!("expected a parse error"),
        }
    }

    #[test]
    fn free_file_name_test() {
        let mut storage = InMemoryStorage::default();
        assert_eq!(free_file_name(&storage), "saved-ram-1");

        storage.write(Utf8Path::new("saved-ram-1"), "").unwrap();
        storage.write(Utf8Path::new("saved-ram-3"), "").unwrap();
        assert_eq!(free_file_name(&storage), "saved-ram-2");
    }

    #[test]
    fn save_to_new_file_test() {
        let mut storage = InMemoryStorage::default();
        let mut session = session(MemoryBank::new());

        let path = save_to_new_file(&mut session, &mut storage).unwrap();
        assert_eq!(path, "saved-ram-1");
        assert_eq!(session.current_file.as_deref(), Some(Utf8Path::new("saved-ram-1")));

        let path = save_to_new_file(&mut session, &mut storage).unwrap();
        assert_eq!(path, "saved-ram-2");
        assert_eq!(session.current_file.as_deref(), Some(Utf8Path::new("saved-ram-2")));
    }

    #[test]
    fn save_to_current_file_test() {
        let mut storage = InMemoryStorage::default();
        let session = session(MemoryBank::new());

        // Without a current file, a new one is picked but not remembered
        let path = save_to_current_file(&session, &mut storage).unwrap();
        assert_eq!(path, "saved-ram-1");
        assert_eq!(session.current_file, None);

        let session = session.with_current_file("mine".into());
        let path = save_to_current_file(&session, &mut storage).unwrap();
        assert_eq!(path, "mine");
        assert!(storage.exists(Utf8Path::new("mine")));
    }
}
