//! Stores survive a trip through interchange text up to identifier renumbering.

use std::collections::BTreeSet;

use kinship::{Config, Person, PersonId, RelationKind, Store, gedcom};

fn kind(tag: &str) -> RelationKind {
    RelationKind::new(tag).unwrap()
}

/// A small three-generation tree. Every full name is unique.
fn sample_store() -> Store {
    let mut store = Store::default();
    let mut add = |given: &str, family: &str| store.create_person(Person::new(given, family));

    let william = add("William", "King");
    let ada = add("Ada", "Lovelace");
    let byron = add("Byron", "King");
    let annabella = add("Annabella", "King");
    let ralph = add("Ralph", "King");
    let stranger = add("Mary", "Somerville");

    store
        .update_person(
            ada,
            kinship::PersonUpdate {
                sex: Some("F".to_string()),
                birth: Some("10 DEC 1815".to_string()),
                death: Some("27 NOV 1852".to_string()),
                place: Some("London".to_string()),
                note: Some("Wrote the first program.\nTranslated Menabrea.".to_string()),
                ..kinship::PersonUpdate::default()
            },
        )
        .unwrap();

    for child in [byron, annabella, ralph] {
        store
            .create_or_extend_family(Some(william), Some(ada), child)
            .unwrap();
    }
    store
        .create_or_extend_family(None, Some(annabella), stranger)
        .unwrap();

    store
        .add_relation(kind("marriage"), william, ada, "8 JUL 1835")
        .unwrap();
    store.add_relation(kind("sibling"), byron, ralph, "").unwrap();

    store
}

fn name(store: &Store, id: PersonId) -> String {
    store.person(id).unwrap().full_name()
}

fn persons(store: &Store) -> Vec<Person> {
    let mut persons: Vec<Person> = store.persons().map(|(_, p)| p.clone()).collect();
    persons.sort_by_key(Person::full_name);
    persons
}

/// Families as parent names (in slot order) and child names.
fn families(store: &Store) -> BTreeSet<(Option<String>, Option<String>, Vec<String>)> {
    store
        .families()
        .map(|(_, family)| {
            (
                family.parent1().map(|id| name(store, id)),
                family.parent2().map(|id| name(store, id)),
                family.children().iter().map(|&id| name(store, id)).collect(),
            )
        })
        .collect()
}

fn relations(store: &Store) -> Vec<(String, String, String, String)> {
    store
        .relations()
        .iter()
        .map(|relation| {
            let [first, second] = relation.persons();
            (
                relation.kind().to_string(),
                name(store, first),
                name(store, second),
                relation.note().to_string(),
            )
        })
        .collect()
}

#[test]
fn decode_of_encode_is_isomorphic() {
    let config = Config::default();
    let mut original = sample_store();
    // Leave a gap in the identifiers so the copy is renumbered.
    let temporary = original.create_person(Person::new("Temporary", "Person"));
    original.delete_person(temporary).unwrap();
    original.create_person(Person::new("Late", "Arrival"));

    let text = gedcom::encode(&original, &config);
    let mut copy = Store::new(&config);
    let report = gedcom::import(&mut copy, text.as_bytes(), &config);

    assert!(report.is_clean(), "{report:?}");
    assert_eq!(persons(&copy), persons(&original));
    assert_eq!(families(&copy), families(&original));
    assert_eq!(relations(&copy), relations(&original));

    let late = copy.resolve_person_token("Late Arrival").unwrap();
    assert_eq!(late.get(), 7);
}

#[test]
fn encoding_is_stable_for_dense_identifiers() {
    let config = Config::default();
    let original = sample_store();
    let text = gedcom::encode(&original, &config);

    let mut copy = Store::new(&config);
    gedcom::import(&mut copy, text.as_bytes(), &config);

    assert_eq!(gedcom::encode(&copy, &config), text);
}

#[test]
fn importing_twice_creates_separate_records() {
    let config = Config::default();
    let text = gedcom::encode(&sample_store(), &config);

    let mut store = Store::new(&config);
    gedcom::import(&mut store, text.as_bytes(), &config);
    gedcom::import(&mut store, text.as_bytes(), &config);

    // Persons always get fresh identifiers, so the second copy forms its own
    // families.
    assert_eq!(store.person_count(), 12);
    assert_eq!(store.family_count(), 4);
    assert_eq!(store.relations().len(), 4);
}

#[test]
fn note_whitespace_round_trips() {
    let config = Config::default();
    let mut original = Store::new(&config);
    let padded = original.create_person(Person::new("Ada", "Lovelace").with_note("a  \nb"));
    let indented = original.create_person(
        Person::new("Michael", "Faraday").with_note("Letters:\n  to Babbage\n  to Faraday"),
    );
    original
        .add_relation(kind("colleague"), padded, indented, "met  twice\n   in London")
        .unwrap();

    let text = gedcom::encode(&original, &config);
    let mut copy = Store::new(&config);
    let report = gedcom::import(&mut copy, text.as_bytes(), &config);

    assert!(report.is_clean(), "{report:?}");
    assert_eq!(persons(&copy), persons(&original));
    assert_eq!(relations(&copy), relations(&original));
    assert_eq!(copy.person(report.persons[0]).unwrap().note, "a  \nb");
}

#[test]
fn cascade_delete_then_round_trip() {
    let config = Config::default();
    let mut original = sample_store();
    let ada = original.resolve_person_token("ada").unwrap();
    original.delete_person(ada).unwrap();

    let text = gedcom::encode(&original, &config);
    let mut copy = Store::new(&config);
    gedcom::import(&mut copy, text.as_bytes(), &config);

    assert!(copy.resolve_person_token("Ada Lovelace").is_none());
    assert_eq!(families(&copy), families(&original));
    assert_eq!(relations(&copy), relations(&original));
    assert_eq!(
        relations(&copy),
        [(
            "sibling".to_string(),
            "Byron King".to_string(),
            "Ralph King".to_string(),
            String::new()
        )]
    );
}
