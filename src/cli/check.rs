use std::{path::PathBuf, process};

use anyhow::Context;
use kinship::{Config, ImportReport, Store, storage::file};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Interchange files to check
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Only print files with problems
    #[arg(long, short)]
    quiet: bool,
}

impl Command {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut problems = 0;

        for path in &self.files {
            // One store per file so counts and line numbers are per file.
            let mut store = Store::new(config);
            let report = file::import_file(&mut store, path, config)
                .with_context(|| format!("failed to read {}", path.display()))?;

            if report.is_clean() {
                if !self.quiet {
                    println!("{} {}", "✓".success(), summarize(path, &report));
                }
                continue;
            }

            problems += 1;
            println!("{} {}", "✗".warning(), summarize(path, &report));
            for issue in issues(&report) {
                println!("    {}", issue.dim());
            }
        }

        if problems > 0 {
            eprintln!(
                "{}",
                format!("{problems} of {} file(s) have problems", self.files.len()).warning()
            );
            process::exit(2);
        }

        Ok(())
    }
}

fn summarize(path: &std::path::Path, report: &ImportReport) -> String {
    format!(
        "{}: {} persons, {} families, {} relations",
        path.display(),
        report.persons.len(),
        report.families.len(),
        report.relations
    )
}

/// One line per problem found while importing.
fn issues(report: &ImportReport) -> Vec<String> {
    let mut issues = Vec::new();
    if let Some(error) = report.encoding_error {
        issues.push(error.to_string());
    }
    issues.extend(report.malformed_lines.iter().map(ToString::to_string));
    if report.skipped_families > 0 {
        issues.push(format!(
            "{} family record(s) skipped: no known parent or child",
            report.skipped_families
        ));
    }
    if report.skipped_relations > 0 {
        issues.push(format!(
            "{} relation(s) skipped: missing type or unknown person",
            report.skipped_relations
        ));
    }
    issues
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::tempdir;

    use super::*;

    fn report_for(text: &[u8]) -> ImportReport {
        let mut store = Store::default();
        kinship::gedcom::import(&mut store, text, &Config::default())
    }

    #[test]
    fn clean_file_has_no_issues() {
        let report = report_for(b"0 @I1@ INDI\n1 NAME Ada /Lovelace/\n0 TRLR\n");

        assert!(issues(&report).is_empty());
        assert_eq!(
            summarize(Path::new("ada.ged"), &report),
            "ada.ged: 1 persons, 0 families, 0 relations"
        );
    }

    #[test]
    fn every_problem_is_listed() {
        let report = report_for(
            b"0 @I1@ INDI\n1 NAME Ren\xE9 /Dupont/\nnot a line\n0 @R1@ RELA\n1 TYPE sibling\n",
        );

        let issues = issues(&report);

        assert_eq!(issues.len(), 3);
        assert!(issues[0].contains("UTF-8"));
        assert!(issues[1].starts_with("line 3:"));
        assert!(issues[2].starts_with("1 relation(s) skipped"));
    }

    #[test]
    fn family_without_known_persons_is_an_issue() {
        let report = report_for(b"0 @F1@ FAM\n1 HUSB @NOBODY@\n1 CHIL @GHOST@\n");

        assert_eq!(
            issues(&report),
            ["1 family record(s) skipped: no known parent or child"]
        );
    }

    #[test]
    fn clean_files_pass() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("clean.ged");
        std::fs::write(&path, "0 @I1@ INDI\n1 NAME Ada /Lovelace/\n").unwrap();

        let command = Command {
            files: vec![path],
            quiet: true,
        };

        command.run(&Config::default()).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let command = Command {
            files: vec![tmp.path().join("absent.ged")],
            quiet: false,
        };

        assert!(command.run(&Config::default()).is_err());
    }
}
