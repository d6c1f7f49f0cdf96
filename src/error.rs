use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("{program} not found. Please install it and make sure it is on your PATH.")]
    ToolNotFound { program: String },

    #[error("`{command}` failed ({status}){}", stderr_suffix(.stderr))]
    ToolInvocationFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("flag configuration at {} is unreadable: {reason}", .path.display())]
    ConfigCorrupt { path: PathBuf, reason: String },

    #[error("could not write flag configuration to {}: {source}", .path.display())]
    ConfigWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidUserInput(String),

    #[error("cancelled")]
    Cancelled,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Finds the taxonomy error behind an `anyhow` chain, if there is one.
pub(crate) fn classify(err: &anyhow::Error) -> Option<&Error> {
    err.chain().find_map(|cause| cause.downcast_ref::<Error>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn invocation_failure_includes_stderr_when_present() {
        let err = Error::ToolInvocationFailed {
            command: "rclone lsf gdrive:".to_string(),
            status: "exit status: 3".to_string(),
            stderr: "directory not found\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`rclone lsf gdrive:` failed (exit status: 3): directory not found"
        );
        let quiet = Error::ToolInvocationFailed {
            command: "rclone copy a b".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "  ".to_string(),
        };
        assert_eq!(quiet.to_string(), "`rclone copy a b` failed (exit status: 1)");
    }

    #[test]
    fn classify_sees_through_context() {
        let result: Result<(), Error> = Err(Error::Cancelled);
        let err = result.context("pick remote").unwrap_err();
        assert!(matches!(classify(&err), Some(Error::Cancelled)));
        let plain = anyhow::anyhow!("something else");
        assert!(classify(&plain).is_none());
    }
}
