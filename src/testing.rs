//! In-memory collaborator doubles used by tests throughout the crate. Not
//! part of the public build-time API; compiled only under `#[cfg(test)]`.

#![cfg(test)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use camino::{Utf8Path, Utf8PathBuf};

use crate::collaborators::Filesystem;

/// A `Filesystem` double backed by in-memory maps, so tests exercise the
/// real materialization/generation logic without touching disk.
#[derive(Debug, Default)]
pub struct InMemoryFilesystem {
    files: RefCell<BTreeMap<Utf8PathBuf, Vec<u8>>>,
    executable: RefCell<BTreeSet<Utf8PathBuf>>,
    directories: RefCell<BTreeSet<Utf8PathBuf>>,
}

impl InMemoryFilesystem {
    pub fn new() -> Self {
        InMemoryFilesystem::default()
    }
}

impl Filesystem for InMemoryFilesystem {
    fn exists(&self, path: &Utf8Path) -> bool {
        self.files.borrow().contains_key(path) || self.directories.borrow().contains(path)
    }

    fn create_directory(&self, path: &Utf8Path) -> std::io::Result<()> {
        let mut dirs = self.directories.borrow_mut();
        let mut current = Utf8PathBuf::new();
        for component in path.components() {
            current.push(component.as_str());
            dirs.insert(current.clone());
        }
        Ok(())
    }

    fn read(&self, path: &Utf8Path) -> std::io::Result<Vec<u8>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
    }

    fn write(&self, path: &Utf8Path, contents: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            self.create_directory(parent)?;
        }
        self.files.borrow_mut().insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn is_executable(&self, path: &Utf8Path) -> bool {
        self.executable.borrow().contains(path)
    }

    fn set_executable(&self, path: &Utf8Path) -> std::io::Result<()> {
        self.executable.borrow_mut().insert(path.to_path_buf());
        Ok(())
    }

    fn find_executable(&self, name: &str, search_paths: &[Utf8PathBuf]) -> Option<Utf8PathBuf> {
        for dir in search_paths {
            let candidate = dir.join(name);
            if self.exists(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn current_directory(&self) -> std::io::Result<Utf8PathBuf> {
        Ok(Utf8PathBuf::from("/workspace"))
    }
}
