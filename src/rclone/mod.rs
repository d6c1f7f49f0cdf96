use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::Error;

#[cfg(test)]
use std::collections::{HashMap, VecDeque};

pub(crate) mod listing;
pub(crate) mod remotes;

const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Every call into the external tool goes through here. Arguments are
/// always a vector, never a shell string.
pub(crate) trait ProcessRunner: Send + Sync {
    fn program(&self) -> &str;

    /// Runs to completion and returns stdout.
    fn capture(&self, args: &[String]) -> Result<String, Error>;

    /// Runs attached to the terminal, optionally feeding `stdin`, until the
    /// child exits or `cancel` fires (the child is then killed).
    fn run(&self, args: &[String], stdin: Option<&str>, cancel: &CancelToken) -> Result<(), Error>;
}

pub(crate) fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("'{arg}'")
            } else {
                arg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

#[derive(Debug, Clone)]
pub(crate) struct RcloneRunner {
    program: String,
}

impl RcloneRunner {
    pub(crate) fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn spawn_error(&self, err: io::Error, args: &[String]) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            Error::ToolNotFound {
                program: self.program.clone(),
            }
        } else {
            Error::ToolInvocationFailed {
                command: display_command(&self.program, args),
                status: "could not start".to_string(),
                stderr: err.to_string(),
            }
        }
    }
}

impl ProcessRunner for RcloneRunner {
    fn program(&self) -> &str {
        &self.program
    }

    fn capture(&self, args: &[String]) -> Result<String, Error> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| self.spawn_error(err, args))?;
        if !output.status.success() {
            return Err(Error::ToolInvocationFailed {
                command: display_command(&self.program, args),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run(&self, args: &[String], stdin: Option<&str>, cancel: &CancelToken) -> Result<(), Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .spawn()
            .map_err(|err| self.spawn_error(err, args))?;
        let _guard = cancel.track_child();

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                let written = pipe.write_all(input.as_bytes());
                drop(pipe);
                if let Err(err) = written {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(err.into());
                }
            }
        }

        loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Cancelled);
            }
            match child.try_wait()? {
                Some(status) if status.success() => return Ok(()),
                Some(status) => {
                    return Err(Error::ToolInvocationFailed {
                        command: display_command(&self.program, args),
                        status: status.to_string(),
                        stderr: String::new(),
                    });
                }
                None => std::thread::sleep(CHILD_POLL_INTERVAL),
            }
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MockRunner {
    outputs: std::sync::Mutex<HashMap<String, Result<String, String>>>,
    run_failures: std::sync::Mutex<HashMap<String, String>>,
    runs: std::sync::Mutex<Vec<(Vec<String>, Option<String>)>>,
    captures: std::sync::Mutex<VecDeque<Vec<String>>>,
    missing: std::sync::Mutex<bool>,
}

#[cfg(test)]
impl MockRunner {
    pub(crate) fn set_output(&self, args: &[&str], result: Result<&str, &str>) {
        self.outputs.lock().unwrap().insert(
            args.join(" "),
            result.map(str::to_string).map_err(str::to_string),
        );
    }

    /// Any `run` whose first argument matches fails with `stderr`.
    pub(crate) fn fail_runs_of(&self, subcommand: &str, stderr: &str) {
        self.run_failures
            .lock()
            .unwrap()
            .insert(subcommand.to_string(), stderr.to_string());
    }

    pub(crate) fn set_missing(&self, missing: bool) {
        *self.missing.lock().unwrap() = missing;
    }

    pub(crate) fn runs(&self) -> Vec<(Vec<String>, Option<String>)> {
        self.runs.lock().unwrap().clone()
    }

    pub(crate) fn capture_count(&self, subcommand: &str) -> usize {
        self.captures
            .lock()
            .unwrap()
            .iter()
            .filter(|args| args.first().is_some_and(|first| first == subcommand))
            .count()
    }
}

#[cfg(test)]
impl ProcessRunner for MockRunner {
    fn program(&self) -> &str {
        "rclone"
    }

    fn capture(&self, args: &[String]) -> Result<String, Error> {
        if *self.missing.lock().unwrap() {
            return Err(Error::ToolNotFound {
                program: "rclone".to_string(),
            });
        }
        self.captures.lock().unwrap().push_back(args.to_vec());
        match self.outputs.lock().unwrap().get(&args.join(" ")) {
            Some(Ok(out)) => Ok(out.clone()),
            Some(Err(stderr)) => Err(Error::ToolInvocationFailed {
                command: display_command("rclone", args),
                status: "exit status: 1".to_string(),
                stderr: stderr.clone(),
            }),
            None => Ok(String::new()),
        }
    }

    fn run(&self, args: &[String], stdin: Option<&str>, cancel: &CancelToken) -> Result<(), Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.runs
            .lock()
            .unwrap()
            .push((args.to_vec(), stdin.map(str::to_string)));
        let failure = args
            .first()
            .and_then(|first| self.run_failures.lock().unwrap().get(first).cloned());
        match failure {
            Some(stderr) => Err(Error::ToolInvocationFailed {
                command: display_command("rclone", args),
                status: "exit status: 1".to_string(),
                stderr,
            }),
            None => Ok(()),
        }
    }
}
