//! In-memory genealogical records with GEDCOM-style interchange.
//!
//! People, parent/child families and pairwise relations live in a [`Store`],
//! which enforces identity and deduplication invariants. The
//! [`storage::gedcom`] codec writes a store out as line-oriented interchange
//! text and reads such text back as brand-new records.

pub mod domain;
pub use domain::{
    Config, Family, FamilyId, History, Person, PersonFields, PersonId, PersonUpdate, Relation,
    RelationKind, Store, StoreError,
};

pub mod storage;
pub use storage::{ImportReport, gedcom};
