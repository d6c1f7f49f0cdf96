use anyhow::Result;

use crate::app::App;
use crate::app::constants::{
    MENU_ADD_TYPE, MENU_DELETE_FLAG, MENU_DELETE_TYPE, MENU_EXIT, MENU_SET_FLAG, MENU_VIEW,
};
use crate::console::{ask_non_empty, choose_one, dim, error_line, heading, warn_line};
use crate::flags::split_flag_input;

const MENU: [&str; 6] = [
    MENU_VIEW,
    MENU_ADD_TYPE,
    MENU_DELETE_TYPE,
    MENU_SET_FLAG,
    MENU_DELETE_FLAG,
    MENU_EXIT,
];

impl App {
    /// Edits the flag store until the user picks Exit. Each change is
    /// written out right away.
    pub(crate) fn config_menu(&mut self) -> Result<()> {
        loop {
            self.prompt.say("");
            self.prompt.say(&heading("Flag configuration"));
            let choice = choose_one(&mut *self.prompt, &MENU, "Choice:")?;
            match MENU[choice] {
                MENU_VIEW => self.view_flags(),
                MENU_ADD_TYPE => self.add_remote_type()?,
                MENU_DELETE_TYPE => self.delete_remote_type()?,
                MENU_SET_FLAG => self.set_flag()?,
                MENU_DELETE_FLAG => self.delete_flag()?,
                _ => return Ok(()),
            }
        }
    }

    fn view_flags(&mut self) {
        let mut lines = Vec::new();
        let store = self.flag_store();
        if store.is_empty() {
            lines.push(dim("No remote types configured."));
        }
        for remote_type in store.remote_types() {
            lines.push(heading(&format!("{remote_type}:")));
            match store.flag_set(remote_type) {
                Some(set) if !set.is_empty() => {
                    for (flag, value) in set.iter() {
                        match value {
                            Some(value) => lines.push(format!("  {flag} {value}")),
                            None => lines.push(format!("  {flag}")),
                        }
                    }
                }
                _ => lines.push(dim("  (no flags)")),
            }
        }
        for line in lines {
            self.prompt.say(&line);
        }
    }

    fn ask_remote_type(&mut self) -> Result<String> {
        Ok(ask_non_empty(&mut *self.prompt, "Remote type (e.g. drive, mega):")?.to_lowercase())
    }

    /// Picks among the configured types; `None` when there are none.
    fn choose_remote_type(&mut self) -> Result<Option<String>> {
        let types: Vec<String> = self.flag_store().remote_types().map(str::to_string).collect();
        if types.is_empty() {
            self.prompt.say(&warn_line("No remote types configured."));
            return Ok(None);
        }
        let index = choose_one(&mut *self.prompt, &types, "Remote type number:")?;
        Ok(types.into_iter().nth(index))
    }

    fn add_remote_type(&mut self) -> Result<()> {
        let remote_type = self.ask_remote_type()?;
        if self.flag_store().add_remote_type(&remote_type) {
            self.save_flags();
        } else {
            self.prompt
                .say(&warn_line(&format!("'{remote_type}' is already configured.")));
        }
        Ok(())
    }

    fn delete_remote_type(&mut self) -> Result<()> {
        let Some(remote_type) = self.choose_remote_type()? else {
            return Ok(());
        };
        if self.flag_store().delete_remote_type(&remote_type) {
            self.save_flags();
        }
        Ok(())
    }

    /// Accepts `--flag`, `--flag=value`, or the value on its own line.
    fn set_flag(&mut self) -> Result<()> {
        let remote_type = self.ask_remote_type()?;
        let flag = ask_non_empty(
            &mut *self.prompt,
            "Flag (e.g. --vfs-cache-mode or --vfs-cache-mode=full):",
        )?;
        if !flag.starts_with('-') {
            self.prompt
                .say(&error_line("Invalid choice: flags start with '-' or '--'"));
            return Ok(());
        }
        let value = if flag.contains('=') {
            String::new()
        } else {
            self.prompt.ask("Value (empty for none):")?
        };
        let (flag, value) = split_flag_input(&flag, &value);
        self.flag_store().add_or_update(&remote_type, &flag, value);
        self.save_flags();
        Ok(())
    }

    fn delete_flag(&mut self) -> Result<()> {
        let Some(remote_type) = self.choose_remote_type()? else {
            return Ok(());
        };
        let flags: Vec<String> = self
            .flag_store()
            .flag_set(&remote_type)
            .map(|set| set.keys().map(str::to_string).collect())
            .unwrap_or_default();
        if flags.is_empty() {
            self.prompt
                .say(&warn_line(&format!("'{remote_type}' has no flags.")));
            return Ok(());
        }
        let index = choose_one(&mut *self.prompt, &flags, "Flag number:")?;
        if self.flag_store().delete_flag(&remote_type, &flags[index]) {
            self.save_flags();
        }
        Ok(())
    }
}
