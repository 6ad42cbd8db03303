use std::path::{Path, PathBuf};

mod check;
mod convert;
mod init;
mod list;
mod show;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use kinship::{Config, ImportReport, Store, storage::file};
use tracing::instrument;

/// Configuration file looked up in the working directory.
const CONFIG_FILE: &str = "kinship.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file [default: ./kinship.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = || load_config(self.config.as_deref());
        match self.command {
            Command::Check(command) => command.run(&config()?),
            Command::List(command) => command.run(&config()?),
            Command::Show(command) => command.run(&config()?),
            Command::Convert(command) => command.run(&config()?),
            Command::Init(command) => {
                let path = self
                    .config
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
                command.run(&path)
            }
        }
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Decode files and report problems
    ///
    /// Exits with status 2 if any file had malformed lines, invalid UTF-8 or
    /// incomplete relations.
    Check(check::Command),

    /// List the persons, families and relations found in files
    List(list::Command),

    /// Show one person with their families and relations
    Show(show::Command),

    /// Merge files into one document with fresh identifiers
    Convert(convert::Command),

    /// Write a default configuration file
    Init(init::Command),
}

/// Loads the configuration.
///
/// An explicit path must load. Without one, `kinship.toml` in the working
/// directory is used if present and defaults otherwise.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return Config::load(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        tracing::debug!("no {CONFIG_FILE} found, using defaults");
        return Ok(Config::default());
    }

    Ok(Config::load(path).unwrap_or_else(|e| {
        tracing::warn!("ignoring {CONFIG_FILE}: {e}");
        Config::default()
    }))
}

/// Imports every file into one fresh store, in the order given.
#[instrument(level = "debug", skip(config))]
fn load_store(paths: &[PathBuf], config: &Config) -> anyhow::Result<(Store, Vec<ImportReport>)> {
    let mut store = Store::new(config);
    let mut reports = Vec::with_capacity(paths.len());

    for path in paths {
        let report = file::import_file(&mut store, path, config)
            .with_context(|| format!("failed to import {}", path.display()))?;
        if !report.is_clean() {
            tracing::warn!(
                malformed_lines = report.malformed_lines.len(),
                skipped_families = report.skipped_families,
                skipped_relations = report.skipped_relations,
                "{} has problems, run 'kin check' for details",
                path.display()
            );
        }
        reports.push(report);
    }

    Ok((store, reports))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn explicit_config_must_exist() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_config_is_loaded() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("custom.toml");
        std::fs::write(&path, "_version = \"1\"\nsource = \"custom\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.source, "custom");
    }

    #[test]
    fn load_store_merges_files_in_order() {
        let tmp = tempdir().unwrap();
        let first = tmp.path().join("first.ged");
        let second = tmp.path().join("second.ged");
        std::fs::write(&first, "0 @I1@ INDI\n1 NAME Ada /Lovelace/\n").unwrap();
        std::fs::write(&second, "0 @I1@ INDI\n1 NAME Charles /Babbage/\n").unwrap();

        let (store, reports) = load_store(&[first, second], &Config::default()).unwrap();

        assert_eq!(store.person_count(), 2);
        assert_eq!(reports.len(), 2);
        let names: Vec<_> = store.persons().map(|(_, p)| p.full_name()).collect();
        assert_eq!(names, ["Ada Lovelace", "Charles Babbage"]);
    }

    #[test]
    fn load_store_fails_on_missing_file() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("missing.ged");

        let error = load_store(&[missing], &Config::default()).unwrap_err();

        assert!(error.to_string().contains("failed to import"));
    }
}
