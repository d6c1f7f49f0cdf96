use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::App;
use crate::app::constants::HIDDEN_PREVIEW_LIMIT;
use crate::command::{CopyOptions, build_copy_command};
use crate::console::{confirm, dim, heading, success_line, warn_line};
use crate::error::Error;
use crate::model::{EntryKind, PathRef, RemoteRef, Selection};
use crate::navigator::local::{LocalLister, find_hidden};
use crate::navigator::{NavOptions, navigate};
use crate::rclone::listing::RemoteLister;

/// One `rclone copy`. With `files`, `source` is the folder the names are
/// relative to and the names go to stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Transfer {
    pub(crate) source: String,
    pub(crate) destination: String,
    pub(crate) files: Option<Vec<String>>,
}

/// Folders land in `<destination>/<name>`. Loose files go straight into the
/// destination: one at a time when overwriting, else batched.
pub(crate) fn plan_transfers(
    selection: &Selection,
    destination: &PathRef,
    overwrite: bool,
) -> Vec<Transfer> {
    let into = |path: &PathRef| match path.name() {
        Some(name) => destination.join(&name),
        None => destination.clone(),
    };
    match selection {
        Selection::Location(dir) => vec![Transfer {
            source: dir.to_arg(),
            destination: into(dir).to_arg(),
            files: None,
        }],
        Selection::Entries { base, entries } => {
            let mut plan: Vec<_> = entries
                .iter()
                .filter(|entry| entry.kind == EntryKind::Directory)
                .map(|entry| Transfer {
                    source: entry.path.to_arg(),
                    destination: destination.join(&entry.name).to_arg(),
                    files: None,
                })
                .collect();
            let files: Vec<_> = entries
                .iter()
                .filter(|entry| entry.kind == EntryKind::File)
                .collect();
            if files.len() > 1 && !overwrite {
                plan.push(Transfer {
                    source: base.to_arg(),
                    destination: destination.to_arg(),
                    files: Some(files.iter().map(|entry| entry.name.clone()).collect()),
                });
            } else {
                plan.extend(files.iter().map(|entry| Transfer {
                    source: entry.path.to_arg(),
                    destination: destination.to_arg(),
                    files: None,
                }));
            }
            plan
        }
    }
}

fn selected_local_dirs(selection: &Selection) -> Vec<PathBuf> {
    let dirs: Vec<&PathRef> = match selection {
        Selection::Location(dir) => vec![dir],
        Selection::Entries { entries, .. } => entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Directory)
            .map(|entry| &entry.path)
            .collect(),
    };
    dirs.into_iter()
        .filter_map(|path| match path {
            PathRef::Local(dir) => Some(dir.clone()),
            PathRef::Remote { .. } => None,
        })
        .collect()
}

fn shown_name(path: &Path, dir: &Path) -> String {
    let base = dir.parent().unwrap_or(dir);
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

impl App {
    pub(crate) fn upload(&mut self, overwrite: bool) -> Result<()> {
        self.prompt.say(&heading("Choose what to upload:"));
        let start = self.local_start();
        let selection = navigate(
            &mut *self.prompt,
            &LocalLister::with_files(),
            start,
            NavOptions::sources(),
        )?;
        let remote = self.pick_remote("Choose the destination remote:")?;
        self.prompt.say(&heading("Choose the destination folder:"));
        let destination = self.pick_remote_folder(&remote, NavOptions::destination())?;
        let exclude_hidden = !self.include_hidden(&selection)?;
        let plan = plan_transfers(&selection, &destination, overwrite);
        self.run_transfers(&plan, overwrite, exclude_hidden)
    }

    pub(crate) fn download(&mut self, overwrite: bool) -> Result<()> {
        let remote = self.pick_remote("Choose the remote to download from:")?;
        self.prompt.say(&heading("Choose what to download:"));
        let selection = navigate(
            &mut *self.prompt,
            &RemoteLister::with_files(&*self.runner),
            PathRef::remote_root(&remote.name),
            NavOptions::sources(),
        )?;
        self.prompt.say(&heading("Choose the local destination folder:"));
        let start = self.local_start();
        let destination = navigate(
            &mut *self.prompt,
            &LocalLister::dirs_only(),
            start,
            NavOptions::destination(),
        )?;
        let Selection::Location(destination) = destination else {
            return Err(Error::InvalidUserInput("pick one destination folder".to_string()).into());
        };
        let plan = plan_transfers(&selection, &destination, overwrite);
        self.run_transfers(&plan, overwrite, false)
    }

    pub(super) fn pick_remote_folder(
        &mut self,
        remote: &RemoteRef,
        options: NavOptions,
    ) -> Result<PathRef> {
        let selection = navigate(
            &mut *self.prompt,
            &RemoteLister::dirs_only(&*self.runner),
            PathRef::remote_root(&remote.name),
            options,
        )?;
        match selection {
            Selection::Location(folder) => Ok(folder),
            Selection::Entries { .. } => {
                Err(Error::InvalidUserInput("pick one folder".to_string()).into())
            }
        }
    }

    /// Asks about hidden items inside the selected local folders. With none
    /// there is nothing to ask and nothing to exclude.
    fn include_hidden(&mut self, selection: &Selection) -> Result<bool> {
        let mut hidden = Vec::new();
        for dir in selected_local_dirs(selection) {
            hidden.extend(find_hidden(&dir).into_iter().map(|path| shown_name(&path, &dir)));
        }
        if hidden.is_empty() {
            return Ok(true);
        }
        self.prompt.say(&warn_line(&format!(
            "Found {} hidden file(s) or folder(s):",
            hidden.len()
        )));
        for name in hidden.iter().take(HIDDEN_PREVIEW_LIMIT) {
            self.prompt.say(&format!("  {name}"));
        }
        if hidden.len() > HIDDEN_PREVIEW_LIMIT {
            self.prompt.say(&dim(&format!(
                "  ... and {} more",
                hidden.len() - HIDDEN_PREVIEW_LIMIT
            )));
        }
        Ok(confirm(&mut *self.prompt, "Include hidden files?", false)?)
    }

    fn run_transfers(
        &mut self,
        plan: &[Transfer],
        overwrite: bool,
        exclude_hidden: bool,
    ) -> Result<()> {
        for transfer in plan {
            let options = CopyOptions {
                overwrite,
                exclude_hidden,
                files_from_stdin: transfer.files.is_some(),
            };
            let args = build_copy_command(&transfer.source, &transfer.destination, options);
            let stdin = transfer.files.as_ref().map(|names| names.join("\n") + "\n");
            self.run_tool(&args, stdin.as_deref()).with_context(|| {
                format!("copy {} to {}", transfer.source, transfer.destination)
            })?;
        }
        self.prompt.say(&success_line("Transfer complete."));
        Ok(())
    }
}
