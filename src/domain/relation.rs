use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::Serialize;

use super::PersonId;

/// The type tag of a [`Relation`].
///
/// The vocabulary is open: any non-empty tag is accepted and stored as
/// given (trimmed). A few conventional tags are provided as constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationKind(NonEmptyString);

impl RelationKind {
    /// A marriage between two people.
    pub const MARRIAGE: &'static str = "marriage";
    /// An unmarried partnership.
    pub const COUPLE: &'static str = "couple";
    /// The end of a marriage or partnership.
    pub const DIVORCE: &'static str = "divorce";
    /// Two siblings.
    pub const SIBLING: &'static str = "sibling";
    /// An ancestor (first person) and a descendant (second person).
    pub const ANCESTOR: &'static str = "ancestor";

    /// Creates a relation kind from a tag.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRelationKind`] if the tag is empty or only whitespace.
    pub fn new(tag: impl Into<String>) -> Result<Self, InvalidRelationKind> {
        let tag = tag.into();
        NonEmptyString::new(tag.trim().to_string())
            .map(Self)
            .map_err(|_| InvalidRelationKind)
    }

    /// Returns the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Case-insensitive comparison with a tag.
    #[must_use]
    pub fn is(&self, tag: &str) -> bool {
        self.as_str().to_lowercase() == tag.to_lowercase()
    }
}

impl Deref for RelationKind {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = InvalidRelationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for RelationKind {
    type Error = InvalidRelationKind;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for RelationKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Error returned for an empty relation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("relation kind must not be empty")]
pub struct InvalidRelationKind;

/// A typed link between two persons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    kind: RelationKind,
    persons: [PersonId; 2],
    note: String,
}

impl Relation {
    pub(crate) fn new(kind: RelationKind, first: PersonId, second: PersonId, note: &str) -> Self {
        Self {
            kind,
            persons: [first, second],
            note: note.trim().to_string(),
        }
    }

    /// The relation's type tag.
    #[must_use]
    pub const fn kind(&self) -> &RelationKind {
        &self.kind
    }

    /// The two persons, in the order given at creation.
    #[must_use]
    pub const fn persons(&self) -> [PersonId; 2] {
        self.persons
    }

    /// Optional note; empty when none was given.
    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    /// Whether the person takes part in this relation.
    #[must_use]
    pub fn involves(&self, person: PersonId) -> bool {
        self.persons.contains(&person)
    }

    /// Whether this relation links exactly these two persons, in either order.
    #[must_use]
    pub fn connects(&self, first: PersonId, second: PersonId) -> bool {
        self.persons == [first, second] || self.persons == [second, first]
    }

    /// The other participant, if `person` takes part.
    #[must_use]
    pub fn other(&self, person: PersonId) -> Option<PersonId> {
        match self.persons {
            [a, b] if a == person => Some(b),
            [a, b] if b == person => Some(a),
            _ => None,
        }
    }
}

/// Which relation tags denote a union and which denote its dissolution.
///
/// Recording a dissolution removes union relations between the same pair.
/// Tags are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationVocabulary {
    unions: Vec<String>,
    dissolutions: Vec<String>,
}

impl Default for RelationVocabulary {
    fn default() -> Self {
        Self::new(
            [RelationKind::MARRIAGE, RelationKind::COUPLE],
            [RelationKind::DIVORCE],
        )
    }
}

impl RelationVocabulary {
    /// Builds a vocabulary from union and dissolution tags.
    #[must_use]
    pub fn new<U, D>(unions: U, dissolutions: D) -> Self
    where
        U: IntoIterator,
        U::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let normalise = |tag: &str| tag.trim().to_lowercase();
        Self {
            unions: unions.into_iter().map(|t| normalise(t.as_ref())).collect(),
            dissolutions: dissolutions
                .into_iter()
                .map(|t| normalise(t.as_ref()))
                .collect(),
        }
    }

    /// Whether the kind denotes an active union.
    #[must_use]
    pub fn is_union(&self, kind: &RelationKind) -> bool {
        self.unions.iter().any(|tag| kind.is(tag))
    }

    /// Whether the kind denotes the end of a union.
    #[must_use]
    pub fn is_dissolution(&self, kind: &RelationKind) -> bool {
        self.dissolutions.iter().any(|tag| kind.is(tag))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn id(n: usize) -> PersonId {
        PersonId::from_raw(n).unwrap()
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "whitespace")]
    fn rejects_empty_kind(tag: &str) {
        assert_eq!(RelationKind::new(tag), Err(InvalidRelationKind));
    }

    #[test]
    fn kind_is_trimmed_and_kept_verbatim() {
        let kind = RelationKind::new("  Godparent ").unwrap();
        assert_eq!(kind.as_str(), "Godparent");
        assert!(kind.is("godparent"));
    }

    #[test]
    fn connects_ignores_order() {
        let relation = Relation::new(RelationKind::new("sibling").unwrap(), id(1), id(2), "");
        assert!(relation.connects(id(2), id(1)));
        assert!(!relation.connects(id(1), id(3)));
        assert_eq!(relation.other(id(2)), Some(id(1)));
        assert_eq!(relation.other(id(3)), None);
    }

    #[test_case("marriage", true, false; "marriage is a union")]
    #[test_case("COUPLE", true, false; "union match ignores case")]
    #[test_case("divorce", false, true; "divorce dissolves")]
    #[test_case("sibling", false, false; "sibling is neither")]
    fn default_vocabulary(tag: &str, union: bool, dissolution: bool) {
        let vocabulary = RelationVocabulary::default();
        let kind = RelationKind::new(tag).unwrap();
        assert_eq!(vocabulary.is_union(&kind), union);
        assert_eq!(vocabulary.is_dissolution(&kind), dissolution);
    }
}
