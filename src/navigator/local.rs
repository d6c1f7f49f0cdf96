use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::model::{DirectoryEntry, PathRef, sort_entries};
use crate::navigator::Lister;

pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Local folders; hidden entries are never shown.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalLister {
    include_files: bool,
}

impl LocalLister {
    pub(crate) fn with_files() -> Self {
        Self {
            include_files: true,
        }
    }

    pub(crate) fn dirs_only() -> Self {
        Self {
            include_files: false,
        }
    }
}

fn local_path(at: &PathRef) -> Result<&Path, Error> {
    match at {
        PathRef::Local(path) => Ok(path),
        PathRef::Remote { .. } => Err(Error::InvalidUserInput(format!(
            "{at} is not a local path"
        ))),
    }
}

impl Lister for LocalLister {
    fn list(&self, at: &PathRef) -> Result<Vec<DirectoryEntry>, Error> {
        let dir = local_path(at)?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                continue;
            }
            // follows symlinks so a linked folder can be entered
            let is_dir = entry.path().is_dir();
            if is_dir {
                entries.push(DirectoryEntry::dir(name));
            } else if self.include_files {
                entries.push(DirectoryEntry::file(name));
            }
        }
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn create_dir(&self, at: &PathRef) -> Result<(), Error> {
        fs::create_dir_all(local_path(at)?)?;
        Ok(())
    }
}

pub(crate) fn resolve_local_start(preferred: Option<&Path>) -> PathBuf {
    if let Some(dir) = preferred.filter(|dir| dir.is_dir()) {
        return dir.to_path_buf();
    }
    if let Some(home) = dirs::home_dir() {
        return home;
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Hidden files and folders below `dir`, depth first.
pub(crate) fn find_hidden(dir: &Path) -> Vec<PathBuf> {
    fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let hidden = is_hidden(&entry.file_name().to_string_lossy());
            if hidden {
                found.push(path.clone());
            }
            // contents of a hidden folder go with it
            if !hidden && entry.file_type().is_ok_and(|t| t.is_dir()) {
                walk(&path, found);
            }
        }
    }
    let mut found = Vec::new();
    walk(dir, &mut found);
    found
}
