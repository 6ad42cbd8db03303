//! Encodes a large generated store and imports the text into a fresh store.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use kinship::{Config, Person, RelationKind, Store, gedcom};

/// Married couples with two children each.
fn preseed_store(couples: usize) -> Store {
    let mut store = Store::default();
    let marriage = RelationKind::new(RelationKind::MARRIAGE).unwrap();

    for i in 0..couples {
        let father = store.create_person(
            Person::new(format!("Father{i}"), format!("Family{i}"))
                .with_sex("M")
                .with_birth("1 JAN 1900"),
        );
        let mother = store.create_person(
            Person::new(format!("Mother{i}"), format!("Family{i}"))
                .with_sex("F")
                .with_note("first line\nsecond line"),
        );
        for child in 0..2 {
            let child = store.create_person(Person::new(
                format!("Child{i}_{child}"),
                format!("Family{i}"),
            ));
            store
                .create_or_extend_family(Some(father), Some(mother), child)
                .unwrap();
        }
        store
            .add_relation(marriage.clone(), father, mother, "")
            .unwrap();
    }

    store
}

fn round_trip(c: &mut Criterion) {
    let config = Config::default();
    let store = preseed_store(500);
    let text = gedcom::encode(&store, &config);

    c.bench_function("encode", |b| b.iter(|| gedcom::encode(&store, &config)));

    c.bench_function("import", |b| {
        b.iter_batched(
            || Store::new(&config),
            |mut store| gedcom::import(&mut store, text.as_bytes(), &config),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, round_trip);
criterion_main!(benches);
