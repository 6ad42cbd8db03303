use std::path::PathBuf;

use kinship::{PersonId, Store};
use serde_json::{Value, json};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Interchange files to read
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Also list families
    #[arg(long)]
    families: bool,

    /// Also list relations
    #[arg(long)]
    relations: bool,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Command {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &kinship::Config) -> anyhow::Result<()> {
        let (store, _) = super::load_store(&self.files, config)?;

        match self.output {
            OutputFormat::Json => {
                let output = to_json(&store, self.families, self.relations);
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                if store.is_empty() {
                    println!("No records found.");
                    return Ok(());
                }

                println!("{}", "Persons".heading());
                render_table(
                    &["ID", "Name", "Sex", "Birth", "Death", "Place"],
                    person_rows(&store),
                );

                if self.families {
                    println!("\n{}", "Families".heading());
                    render_table(&["ID", "Parent 1", "Parent 2", "Children"], family_rows(&store));
                }

                if self.relations {
                    println!("\n{}", "Relations".heading());
                    render_table(&["#", "Type", "Person", "Person", "Note"], relation_rows(&store));
                }
            }
        }

        Ok(())
    }
}

/// `"3 Ada Lovelace"`, or just the ID if the person is gone.
fn label(store: &Store, id: PersonId) -> String {
    store
        .person(id)
        .map_or_else(|| id.to_string(), |person| format!("{id} {}", person.full_name()))
}

fn person_rows(store: &Store) -> Vec<Vec<String>> {
    store
        .persons()
        .map(|(id, person)| {
            vec![
                id.to_string(),
                person.full_name(),
                person.sex.clone(),
                person.birth.clone(),
                person.death.clone(),
                person.place.clone(),
            ]
        })
        .collect()
}

fn family_rows(store: &Store) -> Vec<Vec<String>> {
    store
        .families()
        .map(|(id, family)| {
            let parent = |slot: Option<PersonId>| {
                slot.map_or_else(|| "-".to_string(), |id| label(store, id))
            };
            let children = family
                .children()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                id.to_string(),
                parent(family.parent1()),
                parent(family.parent2()),
                children,
            ]
        })
        .collect()
}

fn relation_rows(store: &Store) -> Vec<Vec<String>> {
    store
        .relations()
        .iter()
        .enumerate()
        .map(|(index, relation)| {
            let [first, second] = relation.persons();
            vec![
                (index + 1).to_string(),
                relation.kind().to_string(),
                label(store, first),
                label(store, second),
                relation.note().replace('\n', " "),
            ]
        })
        .collect()
}

fn to_json(store: &Store, families: bool, relations: bool) -> Value {
    let persons: Vec<_> = store
        .persons()
        .map(|(id, person)| {
            let mut value = json!(person);
            value["id"] = json!(id);
            value
        })
        .collect();

    let mut output = json!({ "persons": persons });

    if families {
        output["families"] = store
            .families()
            .map(|(id, family)| {
                json!({
                    "id": id,
                    "parents": family.parents(),
                    "children": family.children(),
                })
            })
            .collect();
    }

    if relations {
        output["relations"] = json!(store.relations());
    }

    output
}

fn render_table(headers: &[&str], rows: Vec<Vec<String>>) {
    // Column widths, in characters.
    let widths = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            rows.iter()
                .map(|row| row[idx].chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
        })
        .collect::<Vec<_>>();

    for (header, width) in headers.iter().zip(&widths) {
        print!("{header:<width$}  ");
    }
    println!();

    for width in &widths {
        print!("{:-<width$}  ", "");
    }
    println!();

    for row in rows {
        for (value, width) in row.iter().zip(&widths) {
            print!("{value:<width$}  ");
        }
        println!();
    }
}
