//! In-memory record store.
//!
//! The [`Store`] knows nothing about files or interchange text. It owns the
//! person, family and relation tables and keeps them consistent:
//!
//! - identifiers are assigned monotonically and never reused
//! - at most one family exists per unordered parent pair
//! - deleting a person leaves no dangling reference anywhere
//!
//! Every mutation is a single synchronous step. Callers sharing a store
//! between threads must serialize mutations themselves (one exclusive lock
//! around the whole store).

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::instrument;

use super::{
    Config, Event, Family, FamilyId, History, ParentKey, Person, PersonFields, PersonId,
    PersonUpdate, Relation, RelationKind, RelationVocabulary, person::normalize_name,
};

/// Errors returned by store operations.
///
/// A failed operation never leaves a partial write behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The person to update or delete does not exist.
    #[error("person {0} not found")]
    NotFound(PersonId),
    /// A family or relation referenced a person that does not exist.
    #[error("unknown person {0}")]
    UnknownPerson(PersonId),
    /// A family needs at least one parent or one child.
    #[error("a family needs at least one parent or child")]
    EmptyFamily,
}

/// Result of [`Store::create_or_extend_family`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyLink {
    /// The family the child now belongs to.
    pub family: FamilyId,
    /// Whether the family was created by this call.
    pub created: bool,
    /// Whether the child was appended (`false` if it was already present).
    pub child_added: bool,
}

/// Result of [`Store::add_relation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationOutcome {
    /// Position of the new relation in insertion order.
    pub index: usize,
    /// For a dissolution, how many union relations were removed first.
    /// `None` for any other kind.
    pub dissolved_unions: Option<usize>,
}

/// Owner of all persons, families and relations of one session.
#[derive(Debug)]
pub struct Store {
    persons: BTreeMap<PersonId, Person>,
    families: BTreeMap<FamilyId, Family>,

    /// Lookup from unordered parent pair to the single family for that pair.
    family_index: HashMap<ParentKey, FamilyId>,

    /// Relations in insertion order.
    relations: Vec<Relation>,

    next_person_id: PersonId,
    next_family_id: FamilyId,

    vocabulary: RelationVocabulary,
    history: History,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Store {
    /// Creates an empty store using the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            persons: BTreeMap::new(),
            families: BTreeMap::new(),
            family_index: HashMap::new(),
            relations: Vec::new(),
            next_person_id: PersonId::FIRST,
            next_family_id: FamilyId::FIRST,
            vocabulary: config.relation_vocabulary(),
            history: History::new(config.history_limit),
        }
    }

    /// Adds a person and returns its new identifier.
    ///
    /// All attribute values are stored trimmed.
    #[instrument(level = "debug", skip(self))]
    pub fn create_person(&mut self, fields: PersonFields) -> PersonId {
        let id = self.next_person_id;
        self.next_person_id = id.next();

        let person = fields.trimmed();
        let name = person.full_name();
        self.persons.insert(id, person);

        tracing::debug!(%id, "person created");
        self.history.record(Event::PersonCreated { id, name });
        id
    }

    /// Merges a partial update into an existing person.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no person has this identifier.
    #[instrument(level = "debug", skip(self))]
    pub fn update_person(&mut self, id: PersonId, update: PersonUpdate) -> Result<(), StoreError> {
        let person = self.persons.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        update.apply_to(person);
        self.history.record(Event::PersonUpdated { id });
        Ok(())
    }

    /// Deletes a person and every reference to them.
    ///
    /// The person is cleared from family parent slots and child lists,
    /// families left with neither parents nor children are deleted, and every
    /// relation involving the person is removed. A family whose remaining
    /// parent pair now equals another family's pair is merged into that
    /// family, so the one-family-per-pair rule still holds.
    ///
    /// Returns the deleted record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] without changing anything if no
    /// person has this identifier.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_person(&mut self, id: PersonId) -> Result<Person, StoreError> {
        let person = self.persons.remove(&id).ok_or(StoreError::NotFound(id))?;

        let affected: Vec<FamilyId> = self
            .families
            .iter()
            .filter(|(_, family)| family.involves(id))
            .map(|(family_id, _)| *family_id)
            .collect();

        let mut families_removed = 0;
        for family_id in affected {
            let Some(family) = self.families.get_mut(&family_id) else {
                continue;
            };

            let old_key = family.key();
            family.remove_person(id);
            let new_key = family.key();

            if family.is_empty() {
                self.families.remove(&family_id);
                self.family_index.remove(&old_key);
                families_removed += 1;
                tracing::debug!(family = %family_id, "empty family removed");
                continue;
            }

            if old_key != new_key {
                self.family_index.remove(&old_key);
                if self.rekey_family(family_id, new_key) {
                    families_removed += 1;
                }
            }
        }

        let before = self.relations.len();
        self.relations.retain(|relation| !relation.involves(id));
        let relations_removed = before - self.relations.len();

        self.history.record(Event::PersonDeleted {
            id,
            name: person.full_name(),
            families_removed,
            relations_removed,
        });

        Ok(person)
    }

    /// Files a family under a new parent key, merging it into the family that
    /// already owns that key if there is one.
    ///
    /// Returns `true` if the family was merged away.
    fn rekey_family(&mut self, family_id: FamilyId, key: ParentKey) -> bool {
        match self.family_index.get(&key).copied() {
            Some(existing) if existing != family_id => {
                let Some(merged) = self.families.remove(&family_id) else {
                    return false;
                };
                if let Some(target) = self.families.get_mut(&existing) {
                    for &child in merged.children() {
                        target.add_child(child);
                    }
                }
                tracing::debug!(from = %family_id, into = %existing, "families merged");
                true
            }
            _ => {
                self.family_index.insert(key, family_id);
                false
            }
        }
    }

    /// Resolves a user-supplied token to a person.
    ///
    /// A token made only of digits is an identifier and resolves only if that
    /// person exists. Anything else is a name: it must equal, ignoring case,
    /// the person's "given family" name, the given name alone, or the family
    /// name alone. Substrings never match. If several persons match, the one
    /// with the lowest identifier wins.
    #[must_use]
    pub fn resolve_person_token(&self, token: &str) -> Option<PersonId> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        if token.bytes().all(|b| b.is_ascii_digit()) {
            let id = token.parse::<PersonId>().ok()?;
            return self.persons.contains_key(&id).then_some(id);
        }

        let needle = normalize_name(token);

        self.persons
            .iter()
            .find(|(_, person)| person.is_named(&needle))
            .map(|(id, _)| *id)
    }

    /// Adds a child to the family of a parent pair, creating the family if
    /// needed.
    ///
    /// The pair is unordered and an absent parent (`None`) is part of it. If
    /// the child is already in the family nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownPerson`] without changing anything if the
    /// child or a present parent does not exist.
    #[instrument(level = "debug", skip(self))]
    pub fn create_or_extend_family(
        &mut self,
        parent1: Option<PersonId>,
        parent2: Option<PersonId>,
        child: PersonId,
    ) -> Result<FamilyLink, StoreError> {
        self.require_person(child)?;
        self.require_parents(parent1, parent2)?;

        let (family_id, created) = self.family_for(parent1, parent2);
        let child_added = self
            .families
            .get_mut(&family_id)
            .is_some_and(|family| family.add_child(child));

        let event = if child_added {
            Event::ChildAdded {
                family: family_id,
                child,
            }
        } else {
            Event::ChildAlreadyPresent {
                family: family_id,
                child,
            }
        };
        self.history.record(event);

        Ok(FamilyLink {
            family: family_id,
            created,
            child_added,
        })
    }

    /// Returns the family of a parent pair, creating a childless one if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyFamily`] if both parents are absent, or
    /// [`StoreError::UnknownPerson`] if a present parent does not exist.
    #[instrument(level = "debug", skip(self))]
    pub fn ensure_family(
        &mut self,
        parent1: Option<PersonId>,
        parent2: Option<PersonId>,
    ) -> Result<FamilyId, StoreError> {
        if parent1.is_none() && parent2.is_none() {
            return Err(StoreError::EmptyFamily);
        }
        self.require_parents(parent1, parent2)?;
        Ok(self.family_for(parent1, parent2).0)
    }

    /// Looks up the family for a pair or creates it. Returns whether it was
    /// created.
    fn family_for(
        &mut self,
        parent1: Option<PersonId>,
        parent2: Option<PersonId>,
    ) -> (FamilyId, bool) {
        let key = ParentKey::new(parent1, parent2);
        if let Some(&existing) = self.family_index.get(&key) {
            return (existing, false);
        }

        let id = self.next_family_id;
        self.next_family_id = id.next();
        self.families.insert(id, Family::new(parent1, parent2));
        self.family_index.insert(key, id);

        tracing::debug!(%id, "family created");
        self.history.record(Event::FamilyCreated {
            id,
            parents: [parent1, parent2],
        });
        (id, true)
    }

    /// Records a relation between two persons.
    ///
    /// If `kind` is a dissolution, every union relation between the same two
    /// persons (in either order) is removed first and the history records
    /// whether anything was removed. Adding a second union for a pair that
    /// already has one is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownPerson`] without changing anything if
    /// either person does not exist.
    #[instrument(level = "debug", skip(self))]
    pub fn add_relation(
        &mut self,
        kind: RelationKind,
        first: PersonId,
        second: PersonId,
        note: &str,
    ) -> Result<RelationOutcome, StoreError> {
        self.require_person(first)?;
        self.require_person(second)?;

        let dissolved_unions = if self.vocabulary.is_dissolution(&kind) {
            let vocabulary = &self.vocabulary;
            let before = self.relations.len();
            self.relations.retain(|relation| {
                !(vocabulary.is_union(relation.kind()) && relation.connects(first, second))
            });
            let removed = before - self.relations.len();
            self.history.record(Event::UnionsDissolved {
                persons: [first, second],
                removed,
            });
            Some(removed)
        } else {
            None
        };

        self.history.record(Event::RelationAdded {
            kind: kind.clone(),
            persons: [first, second],
        });
        self.relations
            .push(Relation::new(kind, first, second, note));

        Ok(RelationOutcome {
            index: self.relations.len() - 1,
            dissolved_unions,
        })
    }

    /// Removes every record and resets both identifier counters.
    ///
    /// The history is kept.
    pub fn clear(&mut self) {
        self.persons.clear();
        self.families.clear();
        self.family_index.clear();
        self.relations.clear();
        self.next_person_id = PersonId::FIRST;
        self.next_family_id = FamilyId::FIRST;
        self.history.record(Event::Cleared);
    }

    pub(crate) fn record(&mut self, event: Event) {
        self.history.record(event);
    }

    fn require_person(&self, id: PersonId) -> Result<(), StoreError> {
        if self.persons.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::UnknownPerson(id))
        }
    }

    fn require_parents(
        &self,
        parent1: Option<PersonId>,
        parent2: Option<PersonId>,
    ) -> Result<(), StoreError> {
        parent1
            .into_iter()
            .chain(parent2)
            .try_for_each(|parent| self.require_person(parent))
    }
}

impl Store {
    /// Retrieves a person by identifier.
    #[must_use]
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.get(&id)
    }

    /// All persons in ascending identifier order.
    pub fn persons(&self) -> impl Iterator<Item = (PersonId, &Person)> {
        self.persons.iter().map(|(id, person)| (*id, person))
    }

    /// Retrieves a family by identifier.
    #[must_use]
    pub fn family(&self, id: FamilyId) -> Option<&Family> {
        self.families.get(&id)
    }

    /// All families in ascending identifier order.
    pub fn families(&self) -> impl Iterator<Item = (FamilyId, &Family)> {
        self.families.iter().map(|(id, family)| (*id, family))
    }

    /// The family of an unordered parent pair, if one exists.
    #[must_use]
    pub fn find_family(
        &self,
        parent1: Option<PersonId>,
        parent2: Option<PersonId>,
    ) -> Option<FamilyId> {
        self.family_index
            .get(&ParentKey::new(parent1, parent2))
            .copied()
    }

    /// Families in which the person is a parent or a child.
    pub fn families_of(&self, person: PersonId) -> impl Iterator<Item = (FamilyId, &Family)> {
        self.families().filter(move |(_, family)| family.involves(person))
    }

    /// All relations in insertion order.
    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Relations the person takes part in.
    pub fn relations_of(&self, person: PersonId) -> impl Iterator<Item = &Relation> {
        self.relations
            .iter()
            .filter(move |relation| relation.involves(person))
    }

    /// The identifier the next created person will receive.
    #[must_use]
    pub const fn next_person_id(&self) -> PersonId {
        self.next_person_id
    }

    /// Number of persons.
    #[must_use]
    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    /// Number of families.
    #[must_use]
    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Whether the store holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.families.is_empty() && self.relations.is_empty()
    }

    /// The mutation log, newest first.
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }
}
