use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

mod app;
mod cancel;
mod command;
mod console;
mod error;
mod flags;
mod model;
mod navigator;
mod rclone;
mod settings;
mod storage;
mod tasks;

use app::App;
use app::constants::{CANCELLED_MESSAGE, EXIT_CANCELLED, EXIT_TOOL_NOT_FOUND};
use cancel::{CancelToken, install_interrupt_handler};
use console::{TerminalPrompt, error_line};
use error::{Error, classify};
use rclone::RcloneRunner;
use settings::{Overrides, Settings};

/// Menus around rclone: browse local folders and remotes, back up and
/// restore, serve remotes over HTTP/WebDAV/FTP/SFTP, and keep per-remote-type
/// flags in one JSON file.
#[derive(Parser)]
#[command(name = "rclone-menu", version, about)]
struct Cli {
    /// Flag configuration file (overrides RCLONE_MENU_FLAGS_FILE)
    #[arg(long, global = true, value_name = "PATH")]
    flags_file: Option<PathBuf>,

    /// Base port for serving (overrides RCLONE_MENU_PORT)
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Serve one or more remotes on the local network
    ServeRemote,
    /// Serve a local folder on the local network
    ServeLocal,
    /// Copy local files or folders to a remote
    Upload {
        /// Copy even when size and modification time match
        #[arg(long)]
        overwrite: bool,
    },
    /// Copy files or folders from a remote to this machine
    Download {
        /// Copy even when size and modification time match
        #[arg(long)]
        overwrite: bool,
    },
    /// Make one remote folder identical to another
    Sync,
    /// View and edit the stored rclone flags
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::SUCCESS;
    };
    let overrides = Overrides {
        flags_file: cli.flags_file,
        port: cli.port,
    };
    let cancel = CancelToken::new();
    match run(command, &overrides, &cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => exit_for(&err, &cancel),
    }
}

fn run(command: Commands, overrides: &Overrides, cancel: &CancelToken) -> Result<()> {
    let settings = Settings::from_env(overrides)?;
    for warning in &settings.warnings {
        eprintln!("{}", console::warn_line(warning));
    }
    install_interrupt_handler(cancel.clone(), |token| {
        if token.claim_notice() {
            println!();
            println!("{CANCELLED_MESSAGE}");
        }
        std::process::exit(EXIT_CANCELLED);
    })?;
    let runner = Arc::new(RcloneRunner::new(settings.program.clone()));
    let prompt = Box::new(TerminalPrompt::new(cancel.clone()));
    let mut app = App::new(settings, prompt, runner, cancel.clone());
    app.log_info(&format!("starting {command:?}"));
    app.check_tool()?;

    let result = match command {
        Commands::ServeRemote => app.serve_remote(),
        Commands::ServeLocal => app.serve_local(),
        Commands::Upload { overwrite } => app.upload(overwrite),
        Commands::Download { overwrite } => app.download(overwrite),
        Commands::Sync => app.sync(),
        Commands::Config => app.config_menu(),
    };
    if let Err(err) = &result {
        match classify(err) {
            Some(Error::Cancelled) => app.log_info("cancelled by user"),
            _ => app.log_error(&format!("{err:#}")),
        }
    }
    result
}

#[derive(Debug, PartialEq, Eq)]
enum Report {
    Notice(String),
    Failure(String),
}

/// Exit status for a failed run and the one message to show for it. A
/// cancellation notice already printed by the interrupt handler is not
/// repeated.
fn exit_report(err: &anyhow::Error, cancel: &CancelToken) -> (u8, Option<Report>) {
    match classify(err) {
        Some(Error::Cancelled) => {
            let notice = cancel
                .claim_notice()
                .then(|| Report::Notice(CANCELLED_MESSAGE.to_string()));
            (EXIT_CANCELLED as u8, notice)
        }
        Some(not_found @ Error::ToolNotFound { .. }) => (
            EXIT_TOOL_NOT_FOUND as u8,
            Some(Report::Failure(format!("Error: {not_found}"))),
        ),
        _ => (1, Some(Report::Failure(format!("Error: {err:#}")))),
    }
}

fn exit_for(err: &anyhow::Error, cancel: &CancelToken) -> ExitCode {
    let (code, report) = exit_report(err, cancel);
    match report {
        Some(Report::Notice(message)) => println!("{message}"),
        Some(Report::Failure(message)) => eprintln!("{}", error_line(&message)),
        None => {}
    }
    ExitCode::from(code)
}
