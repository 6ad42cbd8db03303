//! Domain models for genealogical records.
//!
//! This module contains the record types (persons, families and relations),
//! the [`Store`] that owns them, the mutation history and configuration.

mod ids;
pub use ids::{FamilyId, ParseIdError, PersonId};

/// Person records.
pub mod person;
pub use person::{Person, PersonFields, PersonUpdate};

/// Parent/child family records.
pub mod family;
pub use family::{Family, ParentKey};

/// Pairwise relations between persons.
pub mod relation;
pub use relation::{InvalidRelationKind, Relation, RelationKind, RelationVocabulary};

/// Timestamped log of store mutations.
pub mod history;
pub use history::{Event, History, HistoryEntry};

mod config;
pub use config::Config;

mod store;
pub use store::{FamilyLink, RelationOutcome, Store, StoreError};
