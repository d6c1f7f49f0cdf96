use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirectoryEntry {
    pub(crate) name: String,
    pub(crate) kind: EntryKind,
}

impl DirectoryEntry {
    pub(crate) fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub(crate) fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    pub(crate) fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Directories first, then files, each case-insensitively by name.
pub(crate) fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

/// A location the navigator can stand on: a local directory or a path
/// inside a configured remote (`remote:some/dir`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathRef {
    Local(PathBuf),
    Remote { remote: String, path: String },
}

impl PathRef {
    pub(crate) fn remote_root(remote: &str) -> Self {
        PathRef::Remote {
            remote: remote.trim_end_matches(':').to_string(),
            path: String::new(),
        }
    }

    pub(crate) fn join(&self, name: &str) -> Self {
        let name = name.trim_end_matches('/');
        match self {
            PathRef::Local(dir) => PathRef::Local(dir.join(name)),
            PathRef::Remote { remote, path } => {
                let path = if path.is_empty() {
                    name.to_string()
                } else {
                    format!("{}/{name}", path.trim_end_matches('/'))
                };
                PathRef::Remote {
                    remote: remote.clone(),
                    path,
                }
            }
        }
    }

    /// Last path component; `None` at a remote root or a filesystem root.
    pub(crate) fn name(&self) -> Option<String> {
        match self {
            PathRef::Local(dir) => dir.file_name().map(|n| n.to_string_lossy().into_owned()),
            PathRef::Remote { path, .. } => path
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    /// The form passed to the external tool as one argument.
    pub(crate) fn to_arg(&self) -> String {
        match self {
            PathRef::Local(dir) => dir.to_string_lossy().into_owned(),
            PathRef::Remote { remote, path } => format!("{remote}:{path}"),
        }
    }
}

impl fmt::Display for PathRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_arg())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectedEntry {
    pub(crate) name: String,
    pub(crate) path: PathRef,
    pub(crate) kind: EntryKind,
}

/// What the navigator hands back once it reaches its terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selection {
    /// The cursor itself (or a freshly created child folder).
    Location(PathRef),
    /// Entries picked by index, all children of `base`.
    Entries {
        base: PathRef,
        entries: Vec<SelectedEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteRef {
    pub(crate) name: String,
    pub(crate) remote_type: Option<String>,
}

impl RemoteRef {
    pub(crate) fn is_type(&self, remote_type: &str) -> bool {
        self.remote_type.as_deref() == Some(remote_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backend {
    Http,
    WebDav,
    Ftp,
    Sftp,
}

impl Backend {
    pub(crate) const ALL: [Backend; 4] =
        [Backend::Http, Backend::WebDav, Backend::Ftp, Backend::Sftp];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Backend::Http => "http",
            Backend::WebDav => "webdav",
            Backend::Ftp => "ftp",
            Backend::Sftp => "sftp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub(crate) user: String,
    pub(crate) pass: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_join_builds_rclone_paths() {
        let root = PathRef::remote_root("gdrive:");
        assert_eq!(root.to_arg(), "gdrive:");
        let docs = root.join("docs/");
        assert_eq!(docs.to_arg(), "gdrive:docs");
        assert_eq!(docs.join("a b.txt").to_arg(), "gdrive:docs/a b.txt");
    }

    #[test]
    fn name_is_last_component() {
        assert_eq!(PathRef::remote_root("mega").name(), None);
        assert_eq!(
            PathRef::remote_root("mega").join("a").join("b c").name().as_deref(),
            Some("b c")
        );
        assert_eq!(PathRef::Local(PathBuf::from("/home/me")).name().as_deref(), Some("me"));
        assert_eq!(PathRef::Local(PathBuf::from("/")).name(), None);
    }

    #[test]
    fn local_join_appends_component() {
        let base = PathRef::Local(PathBuf::from("/home/me"));
        assert_eq!(base.join("b/"), PathRef::Local(PathBuf::from("/home/me/b")));
    }

    #[test]
    fn sort_entries_puts_directories_first() {
        let mut entries = vec![
            DirectoryEntry::file("Zeta.txt"),
            DirectoryEntry::dir("beta"),
            DirectoryEntry::file("alpha.txt"),
            DirectoryEntry::dir("Alpha"),
        ];
        sort_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "beta", "alpha.txt", "Zeta.txt"]);
    }
}
