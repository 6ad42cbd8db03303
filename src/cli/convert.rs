use std::{io::Write, path::PathBuf};

use anyhow::Context;
use kinship::{Config, gedcom, storage::file};
use tracing::instrument;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Interchange files to merge, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Write the merged document here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Command {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let (store, reports) = super::load_store(&self.files, config)?;

        if let Some(path) = &self.output {
            file::save(&store, path, config)
                .with_context(|| format!("failed to write {}", path.display()))?;
        } else {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            gedcom::write(&store, config, &mut handle)?;
            handle.flush()?;
        }

        let imported: usize = reports.iter().map(|report| report.persons.len()).sum();
        tracing::info!(
            files = self.files.len(),
            persons = imported,
            families = store.family_count(),
            relations = store.relations().len(),
            "converted"
        );

        Ok(())
    }
}
