use std::path::PathBuf;
use std::sync::Arc;

use crate::app::logging::{Logger, prune_log_file};
use crate::cancel::CancelToken;
use crate::console::Prompt;
use crate::flags::FlagStore;
use crate::rclone::ProcessRunner;
use crate::rclone::remotes::RemoteCatalog;
use crate::settings::Settings;

pub(crate) mod constants;
mod config_menu;
mod helpers;
pub(crate) mod logging;
mod serve;
mod sync;
mod transfer;

/// One interactive session: the capabilities every workflow needs plus the
/// per-run caches (flag store, remote catalog).
pub(crate) struct App {
    pub(crate) settings: Settings,
    prompt: Box<dyn Prompt>,
    runner: Arc<dyn ProcessRunner>,
    flags_path: PathBuf,
    flags: Option<FlagStore>,
    catalog: RemoteCatalog,
    log: Logger,
    cancel: CancelToken,
}

impl App {
    pub(crate) fn new(
        settings: Settings,
        prompt: Box<dyn Prompt>,
        runner: Arc<dyn ProcessRunner>,
        cancel: CancelToken,
    ) -> Self {
        prune_log_file(&settings.log_path);
        let log = Logger::new(settings.log_path.clone(), settings.log_level);
        let app = Self {
            flags_path: settings.flags_path.clone(),
            settings,
            prompt,
            runner,
            flags: None,
            catalog: RemoteCatalog::default(),
            log,
            cancel,
        };
        for warning in &app.settings.warnings {
            app.log_warn(warning);
        }
        app
    }

    #[cfg(test)]
    pub(crate) fn for_test(
        settings: Settings,
        prompt: Box<dyn Prompt>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            flags_path: settings.flags_path.clone(),
            settings,
            prompt,
            runner,
            flags: None,
            catalog: RemoteCatalog::default(),
            log: Logger::disabled(),
            cancel: CancelToken::new(),
        }
    }
}
