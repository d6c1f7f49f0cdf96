use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Datelike;

use crate::app::App;
use crate::app::constants::{
    LOG_MAX_ENTRIES, LOG_PARSE_FORMAT, LOG_RETENTION_DAYS, LOG_SEPARATOR, LOG_TIMESTAMP_FORMAT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only line log. Writing never fails the caller.
#[derive(Debug, Clone)]
pub(crate) struct Logger {
    path: Option<PathBuf>,
    threshold: LogLevel,
}

impl Logger {
    pub(crate) fn new(path: PathBuf, threshold: LogLevel) -> Self {
        Self {
            path: Some(path),
            threshold,
        }
    }

    #[cfg(test)]
    pub(crate) fn disabled() -> Self {
        Self {
            path: None,
            threshold: LogLevel::Error,
        }
    }

    pub(crate) fn log(&self, level: LogLevel, message: &str) {
        let Some(path) = &self.path else {
            return;
        };
        if level < self.threshold {
            return;
        }
        let timestamp = chrono::Local::now().format(LOG_TIMESTAMP_FORMAT);
        let line = format!("{timestamp}{LOG_SEPARATOR}{level}{LOG_SEPARATOR}{message}");
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{line}");
        }
    }
}

impl App {
    pub(crate) fn log_debug(&self, message: &str) {
        self.log.log(LogLevel::Debug, message);
    }

    pub(crate) fn log_info(&self, message: &str) {
        self.log.log(LogLevel::Info, message);
    }

    pub(crate) fn log_warn(&self, message: &str) {
        self.log.log(LogLevel::Warn, message);
    }

    pub(crate) fn log_error(&self, message: &str) {
        self.log.log(LogLevel::Error, message);
    }
}

pub(crate) fn prune_log_file(path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    let now = chrono::Local::now().naive_local();
    let cutoff = now - chrono::Duration::days(LOG_RETENTION_DAYS);
    let current_year = now.year();
    let mut kept = Vec::new();
    for line in content.lines() {
        let Some((timestamp, _)) = line.split_once(LOG_SEPARATOR) else {
            continue;
        };
        let Ok(mut parsed) = chrono::NaiveDateTime::parse_from_str(
            &format!("{current_year}-{timestamp}"),
            LOG_PARSE_FORMAT,
        ) else {
            continue;
        };
        // lines from late December read in January belong to last year
        if parsed > now {
            match chrono::NaiveDateTime::parse_from_str(
                &format!("{}-{timestamp}", current_year - 1),
                LOG_PARSE_FORMAT,
            ) {
                Ok(previous) => parsed = previous,
                Err(_) => continue,
            }
        }
        if parsed >= cutoff {
            kept.push(line);
        }
    }
    if kept.len() > LOG_MAX_ENTRIES {
        kept.drain(..kept.len() - LOG_MAX_ENTRIES);
    }
    if kept.is_empty() {
        let _ = fs::remove_file(path);
    } else {
        let _ = fs::write(path, kept.join("\n") + "\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(days_ago: i64, message: &str) -> String {
        let at = chrono::Local::now().naive_local() - chrono::Duration::days(days_ago);
        format!(
            "{}{LOG_SEPARATOR}INFO{LOG_SEPARATOR}{message}",
            at.format(LOG_TIMESTAMP_FORMAT)
        )
    }

    #[test]
    fn prune_log_file_removes_old_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.log");
        let old = stamped(LOG_RETENTION_DAYS + 1, "old");
        let recent = stamped(1, "recent");
        fs::write(&path, format!("{old}\ngarbage\n{recent}\n")).unwrap();
        prune_log_file(&path);
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("old"));
        assert!(!content.contains("garbage"));
        assert!(content.contains("recent"));
    }

    #[test]
    fn prune_removes_file_when_nothing_is_left() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.log");
        fs::write(&path, stamped(LOG_RETENTION_DAYS + 2, "stale") + "\n").unwrap();
        prune_log_file(&path);
        assert!(!path.exists());
    }

    #[test]
    fn logger_respects_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("menu.log");
        let logger = Logger::new(path.clone(), LogLevel::Info);
        logger.log(LogLevel::Debug, "hidden detail");
        logger.log(LogLevel::Info, "rclone listremotes");
        logger.log(LogLevel::Error, "copy failed");
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("hidden detail"));
        assert!(content.contains(" | INFO | rclone listremotes"));
        assert!(content.contains(" | ERROR | copy failed"));
    }

    #[test]
    fn level_names_parse() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
        assert!(LogLevel::Debug < LogLevel::Error);
    }
}
