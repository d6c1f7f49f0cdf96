use anyhow::{Context, Result};

use crate::app::App;
use crate::console::{choose_many, choose_one, error_line, heading, success_line, warn_line};
use crate::error::Error;
use crate::flags::FlagStore;
use crate::model::{Backend, PathRef, RemoteRef};
use crate::rclone::display_command;
use crate::rclone::remotes::check_tool;
use crate::storage::{Loaded, load_flag_store, save_flag_store};

impl App {
    pub(crate) fn check_tool(&self) -> Result<()> {
        self.log_debug(&format!("checking for {}", self.runner.program()));
        check_tool(&*self.runner).map_err(|err| {
            self.log_error(&err.to_string());
            err
        })?;
        Ok(())
    }

    /// Runs one long-lived rclone command attached to the terminal.
    pub(super) fn run_tool(&mut self, args: &[String], stdin: Option<&str>) -> Result<(), Error> {
        let shown = display_command(self.runner.program(), args);
        self.log_info(&shown);
        self.prompt.say(&warn_line(&format!("$ {shown}")));
        let result = self.runner.run(args, stdin, &self.cancel);
        match &result {
            Ok(()) => self.log_debug(&format!("finished: {shown}")),
            Err(Error::Cancelled) => self.log_info(&format!("cancelled: {shown}")),
            Err(err) => self.log_error(&err.to_string()),
        }
        result
    }

    /// Loads the flag file on first use. An unreadable file is reported and
    /// replaced in memory by the defaults; the file itself is left alone.
    pub(crate) fn flag_store(&mut self) -> &mut FlagStore {
        if self.flags.is_none() {
            let store = match load_flag_store(&self.flags_path) {
                Ok(Loaded::Existing(store)) => store,
                Ok(Loaded::Created(store)) => {
                    self.log_info(&format!(
                        "created default flag file at {}",
                        self.flags_path.display()
                    ));
                    store
                }
                Ok(Loaded::Unsaved(store, err)) => {
                    self.log_error(&err.to_string());
                    self.prompt.say(&error_line(&err.to_string()));
                    store
                }
                Err(err) => {
                    self.log_error(&err.to_string());
                    self.prompt.say(&error_line(&format!("{err}; using defaults")));
                    FlagStore::with_defaults()
                }
            };
            self.flags = Some(store);
        }
        self.flags.get_or_insert_with(FlagStore::with_defaults)
    }

    /// Writes the in-memory store back. A failure is reported, the
    /// in-memory change stays.
    pub(super) fn save_flags(&mut self) -> bool {
        let Some(store) = &self.flags else {
            return true;
        };
        match save_flag_store(&self.flags_path, store) {
            Ok(()) => {
                self.log_info(&format!("saved flags to {}", self.flags_path.display()));
                self.prompt.say(&success_line("Configuration saved."));
                true
            }
            Err(err) => {
                self.log_error(&err.to_string());
                self.prompt.say(&error_line(&err.to_string()));
                false
            }
        }
    }

    fn remote_names(&mut self) -> Result<Vec<String>> {
        let names = self
            .catalog
            .names(&*self.runner)
            .context("list configured remotes")?;
        if names.is_empty() {
            return Err(Error::InvalidUserInput(
                "no rclone remotes are configured; run `rclone config` first".to_string(),
            )
            .into());
        }
        Ok(names)
    }

    pub(super) fn pick_remote(&mut self, message: &str) -> Result<RemoteRef> {
        let names = self.remote_names()?;
        self.prompt.say(&heading(message));
        let index = choose_one(&mut *self.prompt, &names, "Remote number:")?;
        Ok(self.catalog.remote_ref(&*self.runner, &names[index]))
    }

    pub(super) fn pick_remotes(&mut self, message: &str) -> Result<Vec<RemoteRef>> {
        let names = self.remote_names()?;
        self.prompt.say(&heading(message));
        let picked = choose_many(&mut *self.prompt, &names, "Remote numbers (e.g. 1 or 1,3):")?;
        Ok(picked
            .into_iter()
            .map(|index| self.catalog.remote_ref(&*self.runner, &names[index]))
            .collect())
    }

    pub(super) fn pick_backend(&mut self) -> Result<Backend> {
        self.prompt.say(&heading("Choose backend:"));
        let names: Vec<_> = Backend::ALL.iter().map(|b| b.as_str()).collect();
        let index = choose_one(&mut *self.prompt, &names, "Backend number:")?;
        Ok(Backend::ALL[index])
    }

    pub(super) fn local_start(&self) -> PathRef {
        PathRef::Local(crate::navigator::local::resolve_local_start(
            self.settings.local_dir.as_deref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::app::testing::{app, settings};
    use crate::error::{Error, classify};

    #[test]
    fn first_access_creates_default_flag_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let path = settings.flags_path.clone();
        let (mut app, _, _) = app(settings, &[]);
        assert!(app.flag_store().flag_set("drive").is_some());
        assert!(path.exists());
    }

    #[test]
    fn corrupt_flag_file_falls_back_to_defaults_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        fs::create_dir_all(settings.flags_path.parent().unwrap()).unwrap();
        fs::write(&settings.flags_path, "{ not json").unwrap();
        let path = settings.flags_path.clone();
        let (mut app, prompt, _) = app(settings, &[]);
        assert!(app.flag_store().flag_set("mega").is_some());
        assert!(prompt.printed("unreadable"));
        assert_eq!(fs::read_to_string(path).unwrap(), "{ not json");
    }

    #[test]
    fn missing_tool_is_reported_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _, runner) = app(settings(dir.path()), &[]);
        runner.set_missing(true);
        let err = app.check_tool().unwrap_err();
        assert!(matches!(classify(&err), Some(Error::ToolNotFound { .. })));
    }

    #[test]
    fn no_remotes_is_a_clear_error() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, runner) = app(settings(dir.path()), &[]);
        runner.set_output(&["listremotes"], Ok(""));
        let err = app.pick_remote("Choose remote:").unwrap_err();
        assert!(err.to_string().contains("rclone config"));
    }

    #[test]
    fn picked_remote_carries_its_type() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, runner) = app(settings(dir.path()), &["2", "1"]);
        runner.set_output(&["listremotes"], Ok("mega:\ngdrive:\n"));
        runner.set_output(&["config", "dump"], Ok(r#"{"gdrive":{"type":"drive"}}"#));
        let remote = app.pick_remote("Choose remote:").unwrap();
        assert_eq!(remote.name, "mega");
        assert_eq!(remote.remote_type, None);
        assert!(app.pick_remote("Choose remote:").unwrap().is_type("drive"));
        assert_eq!(runner.capture_count("listremotes"), 1);
    }
}
