//! `kin`: inspect and convert GEDCOM-style genealogy files.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
