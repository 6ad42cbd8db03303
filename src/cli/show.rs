use std::{path::PathBuf, process};

use kinship::{Config, Person, PersonId, Store};
use serde_json::{Value, json};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
#[command(about = "Display one person with their families and relations")]
pub struct Command {
    /// Person ID, or an exact given, family or full name
    token: String,

    /// Interchange files to read
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Command {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let (store, _) = super::load_store(&self.files, config)?;

        let Some((id, person)) = store
            .resolve_person_token(&self.token)
            .and_then(|id| store.person(id).map(|person| (id, person)))
        else {
            eprintln!("No person matches '{}'", self.token);
            process::exit(1);
        };

        match self.output {
            OutputFormat::Pretty => output_pretty(&store, id, person),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&to_json(&store, id, person))?);
            }
        }

        Ok(())
    }
}

fn name(store: &Store, id: PersonId) -> String {
    store
        .person(id)
        .map_or_else(|| format!("#{id}"), Person::full_name)
}

/// Parents of the person, from every family they are a child of.
fn parents(store: &Store, id: PersonId) -> Vec<PersonId> {
    store
        .families_of(id)
        .filter(|(_, family)| family.children().contains(&id))
        .flat_map(|(_, family)| family.parents().into_iter().flatten())
        .collect()
}

/// Families where the person is a parent: the other parent and the children.
fn partnerships(store: &Store, id: PersonId) -> Vec<(Option<PersonId>, Vec<PersonId>)> {
    store
        .families_of(id)
        .filter(|(_, family)| family.parents().contains(&Some(id)))
        .map(|(_, family)| {
            let partner = family
                .parents()
                .into_iter()
                .flatten()
                .find(|&parent| parent != id);
            (partner, family.children().to_vec())
        })
        .collect()
}

fn output_pretty(store: &Store, id: PersonId, person: &Person) {
    println!("# {id} {}", person.full_name().heading());

    let details = [
        ("Sex", &person.sex),
        ("Born", &person.birth),
        ("Died", &person.death),
        ("Place", &person.place),
    ];
    if details.iter().any(|(_, value)| !value.is_empty()) {
        println!("\n{}", "Details".dim());
        for (label, value) in details {
            if !value.is_empty() {
                println!("  {label:<6} {value}");
            }
        }
    }

    if !person.note.is_empty() {
        println!("\n{}", "Note".dim());
        for line in person.note.lines() {
            println!("  {line}");
        }
    }

    let parents = parents(store, id);
    if !parents.is_empty() {
        println!("\n{}", "Parents".dim());
        for parent in parents {
            println!("  • {} ({parent})", name(store, parent));
        }
    }

    for (partner, children) in partnerships(store, id) {
        let heading = partner.map_or_else(
            || "Family".to_string(),
            |partner| format!("Family with {} ({partner})", name(store, partner)),
        );
        println!("\n{}", heading.dim());
        if children.is_empty() {
            println!("  no children");
        }
        for child in children {
            println!("  • {} ({child})", name(store, child));
        }
    }

    let relations: Vec<_> = store.relations_of(id).collect();
    if !relations.is_empty() {
        println!("\n{}", "Relations".dim());
        for relation in relations {
            let other = relation.other(id).unwrap_or(id);
            print!("  • {}: {} ({other})", relation.kind(), name(store, other));
            if relation.note().is_empty() {
                println!();
            } else {
                println!(" {}", format!("[{}]", relation.note().replace('\n', " ")).dim());
            }
        }
    }
}

fn to_json(store: &Store, id: PersonId, person: &Person) -> Value {
    let mut output = json!(person);
    output["id"] = json!(id);
    output["parents"] = json!(parents(store, id));
    output["families"] = partnerships(store, id)
        .into_iter()
        .map(|(partner, children)| json!({ "partner": partner, "children": children }))
        .collect();
    output["relations"] = store
        .relations_of(id)
        .map(|relation| {
            json!({
                "kind": relation.kind(),
                "with": relation.other(id).unwrap_or(id),
                "note": relation.note(),
            })
        })
        .collect();
    output
}

#[cfg(test)]
mod tests {
    use kinship::RelationKind;

    use super::*;

    struct Sample {
        store: Store,
        john: PersonId,
        jane: PersonId,
        tom: PersonId,
    }

    fn sample() -> Sample {
        let mut store = Store::default();
        let john = store.create_person(Person::new("John", "Smith"));
        let jane = store.create_person(Person::new("Jane", "Doe"));
        let tom = store.create_person(Person::new("Tom", "Smith"));
        store
            .create_or_extend_family(Some(john), Some(jane), tom)
            .unwrap();
        store
            .add_relation(RelationKind::new("marriage").unwrap(), john, jane, "")
            .unwrap();
        Sample {
            store,
            john,
            jane,
            tom,
        }
    }

    #[test]
    fn child_sees_both_parents() {
        let Sample {
            store,
            john,
            jane,
            tom,
        } = sample();

        assert_eq!(parents(&store, tom), [john, jane]);
        assert!(partnerships(&store, tom).is_empty());
    }

    #[test]
    fn parent_sees_partner_and_children() {
        let Sample {
            store,
            john,
            jane,
            tom,
        } = sample();

        assert_eq!(partnerships(&store, jane), [(Some(john), vec![tom])]);
    }

    #[test]
    fn json_lists_relations_from_the_persons_side() {
        let Sample {
            store, john, jane, ..
        } = sample();
        let person = store.person(jane).unwrap();

        let output = to_json(&store, jane, person);

        assert_eq!(output["id"], 2);
        assert_eq!(output["family_name"], "Doe");
        assert_eq!(output["relations"][0]["kind"], "marriage");
        assert_eq!(output["relations"][0]["with"], json!(john));
        assert_eq!(output["families"][0]["children"], json!([3]));
    }
}
