//! # gomoq
//!
//! Generates [pegomock](https://github.com/petergtz/pegomock) style mocks for
//! Go interfaces.
//!
//! ```text
//! gomoq generate example.com/app/display Display
//! gomoq generate --output-dir fakes -m store.go
//! gomoq watch -r
//! gomoq remove -r --dry-run
//! ```
//!
//! Interfaces are read either by running a small reflection program with
//! `go run` or, with `--use-experimental-model-gen` and for single source
//! files, by parsing the Go sources directly. Every generated file starts
//! with [`MARKER`], which is how `remove` recognises them.
//!
//! An optional `gomoq.toml` in the working directory changes the defaults,
//! see [`Config`].

pub mod cli;
mod config;
mod destination;
mod error;
mod filehandling;
mod remove;
mod watch;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crossbeam::channel::{bounded, Receiver};
use log::info;

pub use config::{Config, CONFIG_FILE};
pub use destination::{Destination, DestinationArgs, DestinationResolver};
pub use error::GomoqError;
pub use filehandling::{
    generate_mock_files, generate_with, select_extractor, write_if_changed, GenerateSettings,
    GenerationReport,
};
pub use gomoq_gen::{is_generated, MARKER};
pub use remove::{find_generated_files, remove, RemoveOptions, RemoveReport};
pub use watch::{
    create_list_files_if_necessary, parse_list_file, watched_dirs, MockFileUpdater, WatchHandle,
    Watcher, LIST_FILE,
};

use cli::{Cli, Command};

/// Runs one command line in the process' working directory.
pub fn run(cli: Cli) -> Result<(), GomoqError> {
    let work_dir = std::env::current_dir().map_err(|err| GomoqError::io(".", err))?;
    run_in(cli, &work_dir)
}

pub fn run_in(cli: Cli, work_dir: &Path) -> Result<(), GomoqError> {
    let config = Config::load(work_dir)?;
    let command = cli.command;

    if let Some(settings) = command.generate_settings(work_dir.to_path_buf()) {
        let report = generate_mock_files(&settings, &config, &mut io::stdout().lock())?;
        info!(
            "{} files written, {} unchanged",
            report.written.len(),
            report.unchanged.len()
        );
        return Ok(());
    }

    if let Some(options) = command.remove_options(work_dir.to_path_buf()) {
        let stdin = io::stdin();
        let mut stdout = io::stdout().lock();
        let report = remove(&options, &mut stdout, &mut stdin.lock(), |path| {
            std::fs::remove_file(path)
        })?;
        stdout
            .flush()
            .map_err(|err| GomoqError::io("<stdout>", err))?;
        info!(
            "{} removed, {} kept",
            report.removed.len(),
            report.skipped.len()
        );
        return Ok(());
    }

    if let Command::Watch { recursive, dirs } = command {
        let targets = if dirs.is_empty() {
            vec![work_dir.to_path_buf()]
        } else {
            dirs.iter().map(|dir| work_dir.join(dir)).collect()
        };
        let (shutdown_tx, shutdown_rx) = bounded(1);
        ctrlc::set_handler(move || {
            let _ = shutdown_tx.try_send(());
        })?;
        watch(targets, recursive, config, shutdown_rx)?;
    }
    Ok(())
}

/// Bootstraps the list files of `targets` and regenerates their mocks until
/// `shutdown` receives a message or disconnects. A run in progress is
/// finished first.
pub fn watch(
    targets: Vec<PathBuf>,
    recursive: bool,
    config: Config,
    shutdown: Receiver<()>,
) -> Result<(), GomoqError> {
    create_list_files_if_necessary(&targets)?;

    let interval = config.watch_interval();
    let mut updater = MockFileUpdater::new(targets, recursive, move |dir: &Path, args: &[String]| {
        let settings = GenerateSettings {
            work_dir: dir.to_path_buf(),
            args: args.to_vec(),
            ..Default::default()
        };
        generate_mock_files(&settings, &config, &mut io::sink())
    });

    info!("watching every {}ms", interval.as_millis());
    Watcher::spawn(interval, shutdown, move || {
        updater.update();
    })
    .join();
    info!("watch stopped");
    Ok(())
}
