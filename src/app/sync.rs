use anyhow::{Context, Result};

use crate::app::App;
use crate::command::build_sync_command;
use crate::console::{confirm, heading, success_line, warn_line};
use crate::navigator::NavOptions;

impl App {
    /// Makes a remote folder identical to another one. Files only present
    /// at the destination are deleted, so the user confirms first.
    pub(crate) fn sync(&mut self) -> Result<()> {
        let source_remote = self.pick_remote("Choose the source remote:")?;
        self.prompt.say(&heading("Choose the source folder:"));
        let source = self.pick_remote_folder(&source_remote, NavOptions::existing_directory())?;
        let destination_remote = self.pick_remote("Choose the destination remote:")?;
        self.prompt.say(&heading("Choose the destination folder:"));
        let destination = self.pick_remote_folder(&destination_remote, NavOptions::destination())?;

        self.prompt.say(&format!("Sync {source} -> {destination}"));
        self.prompt.say(&warn_line(
            "Files at the destination that are not in the source will be deleted.",
        ));
        if !confirm(&mut *self.prompt, "Continue?", false)? {
            self.log_info(&format!("sync {source} -> {destination} declined"));
            self.prompt.say("Nothing was changed.");
            return Ok(());
        }
        let args = build_sync_command(&source.to_arg(), &destination.to_arg());
        self.run_tool(&args, None)
            .with_context(|| format!("sync {source} to {destination}"))?;
        self.prompt.say(&success_line("Sync complete."));
        Ok(())
    }
}
