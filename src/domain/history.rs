use std::{
    collections::{VecDeque, vec_deque},
    fmt,
};

use chrono::{DateTime, Utc};

use super::{FamilyId, PersonId, RelationKind};

/// Number of entries kept when no limit is configured.
pub const DEFAULT_LIMIT: usize = 1000;

/// A store mutation worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A person was created.
    PersonCreated {
        /// The new identifier.
        id: PersonId,
        /// Full name at creation.
        name: String,
    },
    /// A person's attributes were changed.
    PersonUpdated {
        /// The updated person.
        id: PersonId,
    },
    /// A person was deleted along with every reference to them.
    PersonDeleted {
        /// The deleted identifier.
        id: PersonId,
        /// Full name before deletion.
        name: String,
        /// Families deleted or merged away because of the cascade.
        families_removed: usize,
        /// Relations deleted because of the cascade.
        relations_removed: usize,
    },
    /// A new family was created.
    FamilyCreated {
        /// The new identifier.
        id: FamilyId,
        /// Parent slots, in order.
        parents: [Option<PersonId>; 2],
    },
    /// A child was appended to a family.
    ChildAdded {
        /// The family.
        family: FamilyId,
        /// The child.
        child: PersonId,
    },
    /// A child was already part of the family, nothing changed.
    ChildAlreadyPresent {
        /// The family.
        family: FamilyId,
        /// The child.
        child: PersonId,
    },
    /// A dissolution was recorded; `removed` union relations were dropped.
    UnionsDissolved {
        /// The two persons.
        persons: [PersonId; 2],
        /// How many union relations were removed (possibly none).
        removed: usize,
    },
    /// A relation was recorded.
    RelationAdded {
        /// The relation's type tag.
        kind: RelationKind,
        /// The two persons.
        persons: [PersonId; 2],
    },
    /// Interchange text was imported.
    Imported {
        /// Persons created.
        persons: usize,
        /// Families created or extended.
        families: usize,
        /// Relations created.
        relations: usize,
    },
    /// Every record was removed and the counters reset.
    Cleared,
}

fn slot(parent: Option<PersonId>) -> String {
    parent.map_or_else(|| "0".to_string(), |id| id.to_string())
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PersonCreated { id, name } => write!(f, "person {id} created: {name}"),
            Self::PersonUpdated { id } => write!(f, "person {id} updated"),
            Self::PersonDeleted {
                id,
                name,
                families_removed,
                relations_removed,
            } => write!(
                f,
                "person {id} deleted: {name} ({families_removed} families and \
                 {relations_removed} relations removed)"
            ),
            Self::FamilyCreated { id, parents } => write!(
                f,
                "family {id} created: parents ({}, {})",
                slot(parents[0]),
                slot(parents[1])
            ),
            Self::ChildAdded { family, child } => {
                write!(f, "child {child} added to family {family}")
            }
            Self::ChildAlreadyPresent { family, child } => {
                write!(f, "child {child} already in family {family}")
            }
            Self::UnionsDissolved {
                persons: [a, b],
                removed: 0,
            } => write!(f, "no union between {a} and {b} to dissolve"),
            Self::UnionsDissolved {
                persons: [a, b],
                removed,
            } => write!(f, "dissolved {removed} union relation(s) between {a} and {b}"),
            Self::RelationAdded {
                kind,
                persons: [a, b],
            } => write!(f, "relation '{kind}' recorded between {a} and {b}"),
            Self::Imported {
                persons,
                families,
                relations,
            } => write!(
                f,
                "imported {persons} persons, {families} families and {relations} relations"
            ),
            Self::Cleared => f.write_str("all records cleared"),
        }
    }
}

/// One timestamped [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// When the event happened.
    pub at: DateTime<Utc>,
    /// What happened.
    pub event: Event,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%Y-%m-%d %H:%M:%S"), self.event)
    }
}

/// Bounded log of store mutations, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl History {
    /// Creates an empty history keeping at most `limit` entries.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    pub(crate) fn record(&mut self, event: Event) {
        self.entries.push_front(HistoryEntry {
            at: Utc::now(),
            event,
        });
        self.entries.truncate(self.limit);
    }

    /// Entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// The most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Number of entries kept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryEntry;
    type IntoIter = vec_deque::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> PersonId {
        PersonId::from_raw(n).unwrap()
    }

    #[test]
    fn newest_entry_comes_first() {
        let mut history = History::default();
        history.record(Event::PersonUpdated { id: id(1) });
        history.record(Event::PersonUpdated { id: id(2) });

        let ids: Vec<_> = history
            .iter()
            .map(|entry| entry.event.clone())
            .collect();
        assert_eq!(
            ids,
            vec![
                Event::PersonUpdated { id: id(2) },
                Event::PersonUpdated { id: id(1) }
            ]
        );
    }

    #[test]
    fn oldest_entries_are_dropped_past_the_limit() {
        let mut history = History::new(2);
        for n in 1..=5 {
            history.record(Event::PersonUpdated { id: id(n) });
        }

        assert_eq!(history.len(), 2);
        assert_eq!(
            history.latest().map(|entry| &entry.event),
            Some(&Event::PersonUpdated { id: id(5) })
        );
    }

    #[test]
    fn dissolution_message_says_whether_anything_was_removed() {
        let none = Event::UnionsDissolved {
            persons: [id(1), id(2)],
            removed: 0,
        };
        let some = Event::UnionsDissolved {
            persons: [id(1), id(2)],
            removed: 1,
        };
        assert_eq!(none.to_string(), "no union between 1 and 2 to dissolve");
        assert_eq!(
            some.to_string(),
            "dissolved 1 union relation(s) between 1 and 2"
        );
    }

    #[test]
    fn family_message_writes_absent_parent_as_zero() {
        let event = Event::FamilyCreated {
            id: FamilyId::FIRST,
            parents: [None, Some(id(4))],
        };
        assert_eq!(event.to_string(), "family 1 created: parents (0, 4)");
    }
}
