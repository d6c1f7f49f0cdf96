use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::path::PathBuf;

use anyhow::Result;

use crate::app::logging::LogLevel;
use crate::model::Credentials;
use crate::storage::{default_flags_path, default_log_path};

pub(crate) const DEFAULT_PORT: u16 = 8080;
pub(crate) const DEFAULT_PROGRAM: &str = "rclone";

const ENV_RCLONE: &str = "RCLONE_MENU_RCLONE";
const ENV_PORT: &str = "RCLONE_MENU_PORT";
const ENV_HOST: &str = "RCLONE_MENU_HOST";
const ENV_USER: &str = "RCLONE_MENU_USER";
const ENV_PASS: &str = "RCLONE_MENU_PASS";
const ENV_LOCAL_DIR: &str = "RCLONE_MENU_LOCAL_DIR";
const ENV_FLAGS_FILE: &str = "RCLONE_MENU_FLAGS_FILE";
const ENV_LOG_FILE: &str = "RCLONE_MENU_LOG_FILE";
const ENV_LOG_LEVEL: &str = "RCLONE_MENU_LOG_LEVEL";

/// Everything read from the environment, once, at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) program: String,
    pub(crate) port: u16,
    pub(crate) host: String,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) local_dir: Option<PathBuf>,
    pub(crate) flags_path: PathBuf,
    pub(crate) log_path: PathBuf,
    pub(crate) log_level: LogLevel,
    /// Problems found while reading, reported once logging is up.
    pub(crate) warnings: Vec<String>,
}

/// Values given on the command line win over the environment.
#[derive(Debug, Clone, Default)]
pub(crate) struct Overrides {
    pub(crate) flags_file: Option<PathBuf>,
    pub(crate) port: Option<u16>,
}

impl Settings {
    pub(crate) fn from_env(overrides: &Overrides) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides, detect_local_ip)
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
        detect_host: impl FnOnce() -> Option<IpAddr>,
    ) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut warnings = Vec::new();

        let port = match (overrides.port, get(ENV_PORT)) {
            (Some(port), _) => port,
            (None, Some(raw)) => match raw.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => {
                    warnings.push(format!(
                        "{ENV_PORT}={raw} is not a valid port, using {DEFAULT_PORT}"
                    ));
                    DEFAULT_PORT
                }
            },
            (None, None) => DEFAULT_PORT,
        };

        let log_level = match get(ENV_LOG_LEVEL) {
            Some(raw) => LogLevel::parse(&raw).unwrap_or_else(|| {
                warnings.push(format!("{ENV_LOG_LEVEL}={raw} is not a log level, using info"));
                LogLevel::Info
            }),
            None => LogLevel::Info,
        };

        let credentials = match (get(ENV_USER), lookup(ENV_PASS)) {
            (Some(user), Some(pass)) => Some(Credentials { user, pass }),
            (Some(_), None) => {
                warnings.push(format!("{ENV_USER} is set without {ENV_PASS}, ignoring it"));
                None
            }
            _ => None,
        };

        let host = get(ENV_HOST)
            .or_else(|| detect_host().map(|ip| ip.to_string()))
            .unwrap_or_else(|| Ipv4Addr::LOCALHOST.to_string());

        let flags_path = match overrides
            .flags_file
            .clone()
            .or_else(|| get(ENV_FLAGS_FILE).map(|p| expand_tilde(&p)))
        {
            Some(path) => path,
            None => default_flags_path()?,
        };
        let log_path = match get(ENV_LOG_FILE) {
            Some(path) => expand_tilde(&path),
            None => default_log_path()?,
        };

        Ok(Self {
            program: get(ENV_RCLONE).unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
            port,
            host,
            credentials,
            local_dir: get(ENV_LOCAL_DIR).map(|p| expand_tilde(&p)),
            flags_path,
            log_path,
            log_level,
            warnings,
        })
    }
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// The address other machines on the LAN reach us at. Connecting a UDP
/// socket sends nothing; it only asks the OS which interface it would use.
pub(crate) fn detect_local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(("10.255.255.255", 1)).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)], overrides: &Overrides) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned(), overrides, || None).unwrap()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let s = settings(&[], &Overrides::default());
        assert_eq!(s.program, "rclone");
        assert_eq!(s.port, DEFAULT_PORT);
        assert_eq!(s.host, "127.0.0.1");
        assert_eq!(s.credentials, None);
        assert_eq!(s.log_level, LogLevel::Info);
        assert!(
            s.flags_path.ends_with("flags.json")
                || s.flags_path.ends_with("rclone-menu-flags.json")
        );
        assert!(s.warnings.is_empty());
    }

    #[test]
    fn environment_values_are_read() {
        let s = settings(
            &[
                (ENV_PORT, "9000"),
                (ENV_HOST, "0.0.0.0"),
                (ENV_USER, "me"),
                (ENV_PASS, "secret"),
                (ENV_FLAGS_FILE, "/tmp/flags.json"),
                (ENV_LOG_LEVEL, "debug"),
                (ENV_RCLONE, "/opt/rclone"),
            ],
            &Overrides::default(),
        );
        assert_eq!(s.port, 9000);
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.program, "/opt/rclone");
        assert_eq!(
            s.credentials,
            Some(Credentials {
                user: "me".to_string(),
                pass: "secret".to_string()
            })
        );
        assert_eq!(s.flags_path, PathBuf::from("/tmp/flags.json"));
        assert_eq!(s.log_level, LogLevel::Debug);
    }

    #[test]
    fn invalid_port_falls_back_with_warning() {
        let s = settings(&[(ENV_PORT, "eighty")], &Overrides::default());
        assert_eq!(s.port, DEFAULT_PORT);
        assert_eq!(s.warnings.len(), 1);
        let s = settings(&[(ENV_PORT, "0")], &Overrides::default());
        assert_eq!(s.port, DEFAULT_PORT);
    }

    #[test]
    fn command_line_overrides_win() {
        let overrides = Overrides {
            flags_file: Some(PathBuf::from("/etc/flags.json")),
            port: Some(7000),
        };
        let s = settings(&[(ENV_PORT, "9000"), (ENV_FLAGS_FILE, "/tmp/f.json")], &overrides);
        assert_eq!(s.port, 7000);
        assert_eq!(s.flags_path, PathBuf::from("/etc/flags.json"));
    }

    #[test]
    fn user_without_password_is_ignored() {
        let s = settings(&[(ENV_USER, "me")], &Overrides::default());
        assert_eq!(s.credentials, None);
        assert!(s.warnings[0].contains(ENV_PASS));
    }

    #[test]
    fn tilde_paths_expand_to_home() {
        let expanded = expand_tilde("~/backups");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("backups"));
        }
        assert_eq!(expand_tilde("/srv/~x"), PathBuf::from("/srv/~x"));
    }

    #[test]
    fn detected_host_is_used_before_loopback() {
        let s = Settings::from_lookup(
            |_| None,
            &Overrides::default(),
            || Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))),
        )
        .unwrap();
        assert_eq!(s.host, "192.168.1.20");
    }
}
