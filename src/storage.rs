use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::Error;
use crate::flags::FlagStore;

const APP_DIR: &str = "rclone-menu";

pub(crate) fn default_flags_path() -> Result<PathBuf> {
    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_DIR);
        dir.push("flags.json");
        return Ok(dir);
    }
    let mut fallback = std::env::current_dir().context("current dir")?;
    fallback.push("rclone-menu-flags.json");
    Ok(fallback)
}

pub(crate) fn default_log_path() -> Result<PathBuf> {
    if let Some(mut dir) = dirs::data_local_dir() {
        dir.push(APP_DIR);
        dir.push("rclone-menu.log");
        return Ok(dir);
    }
    let mut fallback = std::env::current_dir().context("current dir")?;
    fallback.push("rclone-menu.log");
    Ok(fallback)
}

/// Outcome of opening the flag file, so callers can tell the user
/// what happened on first run.
#[derive(Debug)]
pub(crate) enum Loaded {
    Existing(FlagStore),
    Created(FlagStore),
    /// Defaults could not be written; they are still usable in memory.
    Unsaved(FlagStore, Error),
}

#[cfg(test)]
impl Loaded {
    pub(crate) fn into_store(self) -> FlagStore {
        match self {
            Loaded::Existing(store) | Loaded::Created(store) | Loaded::Unsaved(store, _) => store,
        }
    }
}

pub(crate) fn load_flag_store(path: &Path) -> Result<Loaded, Error> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let store = FlagStore::with_defaults();
            return Ok(match save_flag_store(path, &store) {
                Ok(()) => Loaded::Created(store),
                Err(err) => Loaded::Unsaved(store, err),
            });
        }
        Err(err) => {
            return Err(Error::ConfigCorrupt {
                path: path.to_path_buf(),
                reason: err.to_string(),
            });
        }
    };
    let mut store: FlagStore =
        serde_json::from_str(&content).map_err(|err| Error::ConfigCorrupt {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    store.normalize();
    Ok(Loaded::Existing(store))
}

/// Rewrites the whole document; there are no partial writes.
pub(crate) fn save_flag_store(path: &Path, store: &FlagStore) -> Result<(), Error> {
    let write_error = |source: io::Error| Error::ConfigWriteError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let mut content = serde_json::to_string_pretty(store).map_err(|err| write_error(err.into()))?;
    content.push('\n');
    fs::write(path, content).map_err(write_error)
}
