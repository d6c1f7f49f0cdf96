//! Argument vectors for every rclone invocation that moves or serves data.
//! Nothing here touches a shell; each value stays one argument.

use crate::error::Error;
use crate::flags::ResolvedFlag;
use crate::model::{Backend, Credentials};

pub(crate) const SHARED_WITH_ME_FLAG: &str = "--drive-shared-with-me";
pub(crate) const HIDDEN_EXCLUDES: [&str; 2] = [".*", ".*/**"];

fn push_flags(args: &mut Vec<String>, flags: &[ResolvedFlag]) {
    for (flag, value) in flags {
        args.push(flag.clone());
        if let Some(value) = value {
            args.push(value.clone());
        }
    }
}

pub(crate) fn build_serve_command(
    target: &str,
    backend: Backend,
    address: &str,
    credentials: Option<&Credentials>,
    flags: &[ResolvedFlag],
) -> Vec<String> {
    let mut args = vec![
        "serve".to_string(),
        backend.as_str().to_string(),
        target.to_string(),
        "--addr".to_string(),
        address.to_string(),
    ];
    if let Some(credentials) = credentials {
        args.extend([
            "--user".to_string(),
            credentials.user.clone(),
            "--pass".to_string(),
            credentials.pass.clone(),
        ]);
    }
    push_flags(&mut args, flags);
    args
}

/// The shared instance always carries the shared-with-me switch.
pub(crate) fn with_shared_drive_flag(mut flags: Vec<ResolvedFlag>) -> Vec<ResolvedFlag> {
    if !flags.iter().any(|(flag, _)| flag == SHARED_WITH_ME_FLAG) {
        flags.push((SHARED_WITH_ME_FLAG.to_string(), None));
    }
    flags
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CopyOptions {
    /// Re-copy files even when size and time match.
    pub(crate) overwrite: bool,
    pub(crate) exclude_hidden: bool,
    /// File names arrive on stdin, relative to the source folder.
    pub(crate) files_from_stdin: bool,
}

pub(crate) fn build_copy_command(
    source: &str,
    destination: &str,
    options: CopyOptions,
) -> Vec<String> {
    let mut args = vec![
        "copy".to_string(),
        source.to_string(),
        destination.to_string(),
        "--progress".to_string(),
    ];
    if options.overwrite {
        args.push("--ignore-times".to_string());
    }
    if options.exclude_hidden {
        for pattern in HIDDEN_EXCLUDES {
            args.push("--exclude".to_string());
            args.push(pattern.to_string());
        }
    }
    if options.files_from_stdin {
        args.push("--files-from".to_string());
        args.push("-".to_string());
    }
    args
}

pub(crate) fn build_sync_command(source: &str, destination: &str) -> Vec<String> {
    vec![
        "sync".to_string(),
        source.to_string(),
        destination.to_string(),
        "--progress".to_string(),
    ]
}

/// Hands out serve ports for one session. A remote with a shared companion
/// takes two consecutive ports; nothing is handed out twice.
#[derive(Debug, Clone)]
pub(crate) struct PortAllocator {
    next: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PortPair {
    pub(crate) personal: u16,
    pub(crate) shared: Option<u16>,
}

impl PortAllocator {
    pub(crate) fn new(base: u16) -> Self {
        Self { next: Some(base) }
    }

    pub(crate) fn allocate(&mut self, with_shared: bool) -> Result<PortPair, Error> {
        let exhausted = || {
            Error::InvalidUserInput("no free port numbers left above the base port".to_string())
        };
        let personal = self.next.ok_or_else(exhausted)?;
        let shared = if with_shared {
            Some(personal.checked_add(1).ok_or_else(exhausted)?)
        } else {
            None
        };
        let last = shared.unwrap_or(personal);
        self.next = last.checked_add(1);
        Ok(PortPair { personal, shared })
    }
}

pub(crate) fn address(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(name: &str, value: Option<&str>) -> ResolvedFlag {
        (name.to_string(), value.map(str::to_string))
    }

    #[test]
    fn serve_command_keeps_flag_order_and_values_separate() {
        let credentials = Credentials {
            user: "me".to_string(),
            pass: "p w".to_string(),
        };
        let args = build_serve_command(
            "My Drive:",
            Backend::WebDav,
            "192.168.1.5:8080",
            Some(&credentials),
            &[flag("--vfs-cache-mode", Some("writes")), flag("--read-only", None)],
        );
        assert_eq!(
            args,
            [
                "serve",
                "webdav",
                "My Drive:",
                "--addr",
                "192.168.1.5:8080",
                "--user",
                "me",
                "--pass",
                "p w",
                "--vfs-cache-mode",
                "writes",
                "--read-only",
            ]
        );
    }

    #[test]
    fn serve_command_without_credentials_has_no_auth() {
        let args = build_serve_command("/srv", Backend::Http, "0.0.0.0:80", None, &[]);
        assert_eq!(args, ["serve", "http", "/srv", "--addr", "0.0.0.0:80"]);
    }

    #[test]
    fn shared_flag_is_added_once() {
        let flags = with_shared_drive_flag(vec![flag("--fast-list", None)]);
        assert_eq!(flags.last(), Some(&flag(SHARED_WITH_ME_FLAG, None)));
        let again = with_shared_drive_flag(flags.clone());
        assert_eq!(again, flags);
    }

    #[test]
    fn copy_direction_swap_changes_only_endpoints() {
        let options = CopyOptions {
            overwrite: true,
            exclude_hidden: true,
            files_from_stdin: false,
        };
        let upload = build_copy_command("/home/me/docs", "mega:backup/docs", options);
        let download = build_copy_command("mega:backup/docs", "/home/me/docs", options);
        assert_eq!(upload[0], "copy");
        assert_eq!(upload[1], download[2]);
        assert_eq!(upload[2], download[1]);
        assert_eq!(upload[3..], download[3..]);
        assert_eq!(
            upload[3..],
            ["--progress", "--ignore-times", "--exclude", ".*", "--exclude", ".*/**"]
        );
    }

    #[test]
    fn batched_copy_reads_names_from_stdin() {
        let options = CopyOptions {
            files_from_stdin: true,
            ..CopyOptions::default()
        };
        let args = build_copy_command("/tmp", "mega:", options);
        assert_eq!(args, ["copy", "/tmp", "mega:", "--progress", "--files-from", "-"]);
    }

    #[test]
    fn shared_companion_shifts_the_next_remote() {
        let mut ports = PortAllocator::new(8080);
        let drive = ports.allocate(true).unwrap();
        assert_eq!(drive, PortPair { personal: 8080, shared: Some(8081) });
        let mega = ports.allocate(false).unwrap();
        assert_eq!(mega.personal, 8082);
        assert_eq!(ports.allocate(false).unwrap().personal, 8083);
    }

    #[test]
    fn ports_do_not_wrap_around() {
        let mut ports = PortAllocator::new(u16::MAX);
        assert!(ports.allocate(true).is_err());
        let mut ports = PortAllocator::new(u16::MAX);
        assert_eq!(ports.allocate(false).unwrap().personal, u16::MAX);
        assert!(ports.allocate(false).is_err());
    }

    #[test]
    fn addresses_bracket_ipv6_hosts() {
        assert_eq!(address("127.0.0.1", 8080), "127.0.0.1:8080");
        assert_eq!(address("::1", 8080), "[::1]:8080");
    }
}
