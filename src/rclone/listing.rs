use crate::error::Error;
use crate::model::{DirectoryEntry, PathRef, sort_entries};
use crate::navigator::Lister;
use crate::rclone::{ProcessRunner, args};

/// `lsf` marks directories with a trailing slash.
pub(crate) fn parse_lsf(output: &str) -> Vec<DirectoryEntry> {
    let mut entries: Vec<_> = output
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.strip_suffix('/') {
            Some(dir) => DirectoryEntry::dir(dir),
            None => DirectoryEntry::file(line),
        })
        .collect();
    sort_entries(&mut entries);
    entries
}

/// `lsd` prints size, date, time and count before the name; the name may
/// itself contain spaces.
pub(crate) fn parse_lsd(output: &str) -> Vec<DirectoryEntry> {
    let mut entries: Vec<_> = output
        .lines()
        .filter_map(|line| {
            let mut rest = line.trim_start();
            for _ in 0..4 {
                let end = rest.find(char::is_whitespace)?;
                rest = rest[end..].trim_start();
            }
            let name = rest.trim_end();
            (!name.is_empty()).then(|| DirectoryEntry::dir(name))
        })
        .collect();
    sort_entries(&mut entries);
    entries
}

pub(crate) struct RemoteLister<'a> {
    runner: &'a dyn ProcessRunner,
    dirs_only: bool,
}

impl<'a> RemoteLister<'a> {
    pub(crate) fn with_files(runner: &'a dyn ProcessRunner) -> Self {
        Self {
            runner,
            dirs_only: false,
        }
    }

    pub(crate) fn dirs_only(runner: &'a dyn ProcessRunner) -> Self {
        Self {
            runner,
            dirs_only: true,
        }
    }
}

impl Lister for RemoteLister<'_> {
    fn list(&self, at: &PathRef) -> Result<Vec<DirectoryEntry>, Error> {
        if matches!(at, PathRef::Local(_)) {
            return Err(Error::InvalidUserInput(format!("{at} is not a remote path")));
        }
        if self.dirs_only {
            let output = self.runner.capture(&args(["lsd".to_string(), at.to_arg()]))?;
            Ok(parse_lsd(&output))
        } else {
            let output = self.runner.capture(&args(["lsf".to_string(), at.to_arg()]))?;
            Ok(parse_lsf(&output))
        }
    }

    /// The folder is created by the copy that targets it.
    fn create_dir(&self, _at: &PathRef) -> Result<(), Error> {
        Ok(())
    }
}
