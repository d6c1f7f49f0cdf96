use anyhow::{Context, Result};

use crate::app::App;
use crate::app::constants::LOCAL_REMOTE_TYPE;
use crate::command::{PortAllocator, address, build_serve_command, with_shared_drive_flag};
use crate::console::{confirm, error_line, heading, success_line};
use crate::error::Error;
use crate::flags::{DRIVE_REMOTE_TYPE, ResolvedFlag};
use crate::model::{Backend, Credentials, RemoteRef, Selection};
use crate::navigator::local::LocalLister;
use crate::navigator::{NavOptions, navigate};
use crate::rclone::display_command;
use crate::tasks::{first_failure, run_group};

/// One `rclone serve` process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServeJob {
    pub(crate) label: String,
    pub(crate) url: String,
    pub(crate) args: Vec<String>,
}

impl App {
    pub(crate) fn serve_remote(&mut self) -> Result<()> {
        let remotes = self.pick_remotes("Choose remote(s) to serve:")?;
        let backend = self.pick_backend()?;
        let credentials = self.serve_credentials()?;
        let mut ports = PortAllocator::new(self.settings.port);
        let mut jobs = Vec::new();
        for remote in &remotes {
            jobs.extend(self.plan_remote(remote, backend, credentials.as_ref(), &mut ports)?);
        }
        self.run_serve_jobs(&jobs)
    }

    pub(crate) fn serve_local(&mut self) -> Result<()> {
        self.prompt.say(&heading("Choose the local folder to serve:"));
        let start = self.local_start();
        let selection = navigate(
            &mut *self.prompt,
            &LocalLister::dirs_only(),
            start,
            NavOptions::existing_directory(),
        )?;
        let Selection::Location(folder) = selection else {
            return Err(Error::InvalidUserInput("pick a single folder to serve".to_string()).into());
        };
        let backend = self.pick_backend()?;
        let credentials = self.serve_credentials()?;
        let flags = self.flag_store().resolve(LOCAL_REMOTE_TYPE, false);
        let port = PortAllocator::new(self.settings.port).allocate(false)?.personal;
        let addr = address(&self.settings.host, port);
        let job = ServeJob {
            label: folder.to_string(),
            url: url(backend, &addr),
            args: build_serve_command(
                &folder.to_arg(),
                backend,
                &addr,
                credentials.as_ref(),
                &flags,
            ),
        };
        self.run_serve_jobs(&[job])
    }

    /// Jobs for one remote: the remote itself and, for drive remotes whose
    /// owner agrees, an instance for items shared with them.
    fn plan_remote(
        &mut self,
        remote: &RemoteRef,
        backend: Backend,
        credentials: Option<&Credentials>,
        ports: &mut PortAllocator,
    ) -> Result<Vec<ServeJob>> {
        let Some(remote_type) = remote.remote_type.clone() else {
            self.log_warn(&format!("type of {} is unknown, serving without flags", remote.name));
            let port = ports.allocate(false)?.personal;
            return Ok(vec![self.serve_job(&remote.name, backend, port, credentials, vec![])]);
        };

        let with_shared = remote.is_type(DRIVE_REMOTE_TYPE)
            && confirm(
                &mut *self.prompt,
                &format!("Also serve the files shared with you on {}?", remote.name),
                true,
            )?;
        let pair = ports.allocate(with_shared)?;
        let flags = self.flag_store().resolve(&remote_type, false);
        let mut jobs = vec![self.serve_job(
            &remote.name,
            backend,
            pair.personal,
            credentials,
            flags,
        )];

        if let Some(shared_port) = pair.shared {
            let target = self
                .catalog
                .shared_companion(&*self.runner, &remote.name)
                .context("list configured remotes")?
                .unwrap_or_else(|| remote.name.clone());
            let flags = with_shared_drive_flag(self.flag_store().resolve(&remote_type, true));
            let mut job = self.serve_job(&target, backend, shared_port, credentials, flags);
            job.label = format!("{} (shared with me)", remote.name);
            jobs.push(job);
        }
        Ok(jobs)
    }

    fn serve_job(
        &self,
        remote: &str,
        backend: Backend,
        port: u16,
        credentials: Option<&Credentials>,
        flags: Vec<ResolvedFlag>,
    ) -> ServeJob {
        let addr = address(&self.settings.host, port);
        ServeJob {
            label: remote.to_string(),
            url: url(backend, &addr),
            args: build_serve_command(&format!("{remote}:"), backend, &addr, credentials, &flags),
        }
    }

    /// Credentials from the environment, or asked for. An empty user name
    /// serves without authentication.
    pub(super) fn serve_credentials(&mut self) -> Result<Option<Credentials>> {
        if let Some(credentials) = &self.settings.credentials {
            self.log_debug(&format!("using configured serve user {}", credentials.user));
            return Ok(Some(credentials.clone()));
        }
        let user = self
            .prompt
            .ask("User name for clients (empty for no login):")?
            .trim()
            .to_string();
        if user.is_empty() {
            return Ok(None);
        }
        loop {
            let pass = self.prompt.ask_secret("Password:")?;
            if !pass.is_empty() {
                return Ok(Some(Credentials { user, pass }));
            }
            self.prompt.say(&error_line("A password is required when a user name is set."));
        }
    }

    /// Starts every job on its own thread and returns once all have exited.
    fn run_serve_jobs(&mut self, jobs: &[ServeJob]) -> Result<()> {
        let program = self.runner.program().to_string();
        for job in jobs {
            self.log_info(&display_command(&program, &job.args));
            self.prompt
                .say(&success_line(&format!("Serving {} at {}", job.label, job.url)));
        }
        self.prompt.say("Press Ctrl+C to stop.");

        let runner = &*self.runner;
        let cancel = &self.cancel;
        let results = run_group(jobs, |job| runner.run(&job.args, None, cancel));
        for (job, result) in jobs.iter().zip(&results) {
            match result {
                Ok(()) => self.log_info(&format!("serving {} stopped", job.label)),
                Err(Error::Cancelled) => self.log_info(&format!("serving {} cancelled", job.label)),
                Err(err) => {
                    self.log_error(&format!("serving {} failed: {err}", job.label));
                    self.prompt.say(&error_line(&format!("{}: {err}", job.label)));
                }
            }
        }
        first_failure(results).context("serve")
    }
}

fn url(backend: Backend, addr: &str) -> String {
    match backend {
        Backend::Http => format!("http://{addr}"),
        Backend::WebDav => format!("http://{addr} (WebDAV)"),
        Backend::Ftp => format!("ftp://{addr}"),
        Backend::Sftp => format!("sftp://{addr}"),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::app::testing::{app, settings};
    use crate::error::{Error, classify};
    use crate::flags::FlagStore;
    use crate::model::Credentials;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn with_flags(dir: &std::path::Path) {
        let path = dir.join("config").join("flags.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            r#"{"flags":{"drive":{"--vfs-cache-mode":"full"},"mega":{"--vfs-cache-mode":"writes","--fast-list":""},"local":{"--read-only":null}}}"#,
        )
        .unwrap();
    }

    #[test]
    fn drive_with_shared_companion_then_mega() {
        let dir = tempfile::tempdir().unwrap();
        with_flags(dir.path());
        // remotes 1,2 -> gdrive, mega; backend 2 -> webdav; no login; serve shared
        let (mut app, prompt, runner) = app(settings(dir.path()), &["1,2", "2", "", "y"]);
        runner.set_output(&["listremotes"], Ok("gdrive:\ngdrive-shared:\nmega:\n"));
        runner.set_output(
            &["config", "dump"],
            Ok(r#"{"gdrive":{"type":"drive"},"gdrive-shared":{"type":"drive"},"mega":{"type":"mega"}}"#),
        );
        app.serve_remote().unwrap();

        let mut runs: Vec<_> = runner.runs().into_iter().map(|(args, _)| args).collect();
        runs.sort();
        let mut expected = vec![
            args(&["serve", "webdav", "gdrive:", "--addr", "192.168.1.5:8080"]),
            args(&[
                "serve",
                "webdav",
                "gdrive-shared:",
                "--addr",
                "192.168.1.5:8081",
                "--vfs-cache-mode",
                "full",
                "--drive-shared-with-me",
            ]),
            args(&[
                "serve",
                "webdav",
                "mega:",
                "--addr",
                "192.168.1.5:8082",
                "--vfs-cache-mode",
                "writes",
                "--fast-list",
            ]),
        ];
        expected.sort();
        assert_eq!(runs, expected);
        assert!(prompt.printed("Serving gdrive (shared with me)"));
    }

    #[test]
    fn declining_shared_instance_keeps_ports_consecutive() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, runner) = app(settings(dir.path()), &["1,2", "1", "", "n"]);
        runner.set_output(&["listremotes"], Ok("gdrive:\nmega:\n"));
        runner.set_output(
            &["config", "dump"],
            Ok(r#"{"gdrive":{"type":"drive"},"mega":{"type":"mega"}}"#),
        );
        app.serve_remote().unwrap();
        let ports: Vec<_> = runner
            .runs()
            .into_iter()
            .map(|(args, _)| args[4].clone())
            .collect();
        assert_eq!(ports.len(), 2);
        assert!(ports.contains(&"192.168.1.5:8080".to_string()));
        assert!(ports.contains(&"192.168.1.5:8081".to_string()));
    }

    #[test]
    fn drive_without_companion_uses_same_remote_with_shared_switch() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, runner) = app(settings(dir.path()), &["1", "1", "", ""]);
        runner.set_output(&["listremotes"], Ok("gdrive:\n"));
        runner.set_output(&["config", "dump"], Ok(r#"{"gdrive":{"type":"drive"}}"#));
        app.serve_remote().unwrap();
        let shared = runner
            .runs()
            .into_iter()
            .map(|(args, _)| args)
            .find(|args| args.contains(&"192.168.1.5:8081".to_string()))
            .unwrap();
        assert_eq!(shared[2], "gdrive:");
        assert_eq!(shared.last().map(String::as_str), Some("--drive-shared-with-me"));
    }

    #[test]
    fn configured_credentials_skip_the_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.credentials = Some(Credentials {
            user: "me".to_string(),
            pass: "pw".to_string(),
        });
        let (mut app, prompt, runner) = app(settings, &["1", "3"]);
        runner.set_output(&["listremotes"], Ok("mega:\n"));
        runner.set_output(&["config", "dump"], Ok(r#"{"mega":{"type":"mega"}}"#));
        app.serve_remote().unwrap();
        let (args, _) = &runner.runs()[0];
        assert_eq!(args[1], "ftp");
        assert_eq!(args[5..9], ["--user", "me", "--pass", "pw"]);
        assert_eq!(prompt.remaining(), 0);
    }

    #[test]
    fn asked_credentials_require_a_password() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, prompt, _) = app(settings(dir.path()), &["alice", "", "s3cret"]);
        let credentials = app.serve_credentials().unwrap();
        assert_eq!(
            credentials,
            Some(Credentials {
                user: "alice".to_string(),
                pass: "s3cret".to_string()
            })
        );
        assert!(prompt.printed("password is required"));
    }

    #[test]
    fn failed_serve_is_reported_and_returned() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, prompt, runner) = app(settings(dir.path()), &["1", "1", ""]);
        runner.set_output(&["listremotes"], Ok("mega:\n"));
        runner.set_output(&["config", "dump"], Ok(r#"{"mega":{"type":"mega"}}"#));
        runner.fail_runs_of("serve", "address already in use");
        let err = app.serve_remote().unwrap_err();
        assert!(matches!(classify(&err), Some(Error::ToolInvocationFailed { .. })));
        assert!(prompt.printed("address already in use"));
        assert_eq!(*app.flag_store(), FlagStore::with_defaults());
    }

    #[test]
    fn serve_local_uses_local_flags() {
        let dir = tempfile::tempdir().unwrap();
        with_flags(dir.path());
        fs::create_dir(dir.path().join("music")).unwrap();
        // open "config" would be first; entries: config/, music/
        let (mut app, _, runner) = app(settings(dir.path()), &["2", ".", "1", ""]);
        app.serve_local().unwrap();
        let (args, _) = &runner.runs()[0];
        assert_eq!(args[0..2], ["serve", "http"]);
        assert!(args[2].ends_with("music"));
        assert_eq!(args[3..], ["--addr", "192.168.1.5:8080", "--read-only"]);
    }
}
