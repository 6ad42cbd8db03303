use serde::Serialize;

use super::PersonId;

/// The unordered pair of parents that identifies a family.
///
/// An absent parent takes part in the pair, so `{absent, X}` and `{X, Y}`
/// are different keys while `{X, Y}` and `{Y, X}` are the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParentKey(Option<PersonId>, Option<PersonId>);

impl ParentKey {
    /// Builds the key for two parent slots, in either order.
    #[must_use]
    pub fn new(first: Option<PersonId>, second: Option<PersonId>) -> Self {
        if first <= second {
            Self(first, second)
        } else {
            Self(second, first)
        }
    }

    /// Whether both parents are absent.
    #[must_use]
    pub const fn is_parentless(&self) -> bool {
        self.0.is_none() && self.1.is_none()
    }
}

/// A parent pair and their children.
///
/// The two parent slots keep the order they were given in, which is the order
/// they are written back out in; only the [`ParentKey`] ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Family {
    parents: [Option<PersonId>; 2],
    children: Vec<PersonId>,
}

impl Family {
    pub(crate) const fn new(parent1: Option<PersonId>, parent2: Option<PersonId>) -> Self {
        Self {
            parents: [parent1, parent2],
            children: Vec::new(),
        }
    }

    /// The first parent slot.
    #[must_use]
    pub const fn parent1(&self) -> Option<PersonId> {
        self.parents[0]
    }

    /// The second parent slot.
    #[must_use]
    pub const fn parent2(&self) -> Option<PersonId> {
        self.parents[1]
    }

    /// Both parent slots, in order.
    #[must_use]
    pub const fn parents(&self) -> [Option<PersonId>; 2] {
        self.parents
    }

    /// Children in the order they were added.
    #[must_use]
    pub fn children(&self) -> &[PersonId] {
        &self.children
    }

    /// The deduplication key of this family.
    #[must_use]
    pub fn key(&self) -> ParentKey {
        ParentKey::new(self.parents[0], self.parents[1])
    }

    /// Whether the person appears as a parent or a child.
    #[must_use]
    pub fn involves(&self, person: PersonId) -> bool {
        self.parents.contains(&Some(person)) || self.children.contains(&person)
    }

    /// A family with no parents and no children must not exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key().is_parentless() && self.children.is_empty()
    }

    /// Appends a child unless already present.
    ///
    /// Returns `true` if the child was added.
    pub(crate) fn add_child(&mut self, child: PersonId) -> bool {
        if self.children.contains(&child) {
            false
        } else {
            self.children.push(child);
            true
        }
    }

    /// Removes every reference to the person.
    pub(crate) fn remove_person(&mut self, person: PersonId) {
        for slot in &mut self.parents {
            if *slot == Some(person) {
                *slot = None;
            }
        }
        self.children.retain(|&child| child != person);
    }
}
