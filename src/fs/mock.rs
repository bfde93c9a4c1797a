// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, executable: bool },
    Dir(BTreeSet<String>), // child names
}

/// In-memory filesystem for discovery tests.
///
/// Paths are used verbatim; relative trees are rooted at `.`.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("."), MockEntry::Dir(BTreeSet::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert_file(path.as_ref(), content.into(), false);
    }

    pub fn add_executable(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert_file(path.as_ref(), content.into(), true);
    }

    fn insert_file(&self, path: &Path, content: Vec<u8>, executable: bool) {
        let mut files = self.files.lock().unwrap_or_else(|p| p.into_inner());
        files.insert(path.to_path_buf(), MockEntry::File { content, executable });
        Self::link_to_parent(&mut files, path);
    }

    fn link_to_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if parent == path {
            return;
        }

        if !files.contains_key(parent) {
            files.insert(parent.to_path_buf(), MockEntry::Dir(BTreeSet::new()));
            Self::link_to_parent(files, parent);
        }

        if let (Some(MockEntry::Dir(children)), Some(name)) =
            (files.get_mut(parent), path.file_name().and_then(|n| n.to_str()))
        {
            children.insert(name.to_string());
        }
    }
}

impl MockFileSystem {
    fn lookup<T>(&self, path: &Path, f: impl FnOnce(Option<&MockEntry>) -> T) -> T {
        let files = self.files.lock().unwrap_or_else(|p| p.into_inner());
        f(files.get(path))
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.lookup(path, |entry| match entry {
            Some(MockEntry::File { content, .. }) => String::from_utf8(content.clone())
                .map_err(|e| anyhow!("{} is not UTF-8: {e}", path.display())),
            Some(MockEntry::Dir(_)) => Err(anyhow!("{} is a directory", path.display())),
            None => Err(anyhow!("{} not found", path.display())),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.lookup(path, |entry| entry.is_some())
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lookup(path, |entry| matches!(entry, Some(MockEntry::Dir(_))))
    }

    fn is_executable(&self, path: &Path) -> bool {
        self.lookup(path, |entry| {
            matches!(entry, Some(MockEntry::File { executable: true, .. }))
        })
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.lookup(path, |entry| match entry {
            Some(MockEntry::Dir(children)) => Ok(children.iter().map(|c| path.join(c)).collect()),
            _ => Err(anyhow!("{} is not a directory", path.display())),
        })
    }
}
