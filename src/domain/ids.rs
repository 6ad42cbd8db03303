use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::Serialize;

/// Error returned when a string is not a valid record identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid record identifier '{0}': expected a positive integer")]
pub struct ParseIdError(String);

fn parse_non_zero(s: &str) -> Result<NonZeroUsize, ParseIdError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseIdError(s.to_string()));
    }
    trimmed
        .parse::<NonZeroUsize>()
        .map_err(|_| ParseIdError(s.to_string()))
}

/// Identifier of a [`Person`](super::Person) within one store.
///
/// Identifiers are assigned from 1 upwards and are never reused, even after
/// the person has been deleted. The value `0` is reserved for "absent" at the
/// text boundary and never names a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonId(NonZeroUsize);

impl PersonId {
    pub(crate) const FIRST: Self = Self(NonZeroUsize::MIN);

    /// Wraps a non-zero integer as a person identifier.
    #[must_use]
    pub const fn new(id: NonZeroUsize) -> Self {
        Self(id)
    }

    /// Converts a raw integer, mapping the `0` sentinel to `None`.
    #[must_use]
    pub const fn from_raw(id: usize) -> Option<Self> {
        match NonZeroUsize::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0.checked_add(1).expect("person ID overflow!"))
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PersonId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_non_zero(s).map(Self)
    }
}

/// Identifier of a [`Family`](super::Family) within one store.
///
/// Family identifiers use their own counter, independent of person
/// identifiers, with the same never-reused guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FamilyId(NonZeroUsize);

impl FamilyId {
    pub(crate) const FIRST: Self = Self(NonZeroUsize::MIN);

    /// Wraps a non-zero integer as a family identifier.
    #[must_use]
    pub const fn new(id: NonZeroUsize) -> Self {
        Self(id)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0.checked_add(1).expect("family ID overflow!"))
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FamilyId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_non_zero(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("1", 1; "single digit")]
    #[test_case("42", 42; "two digits")]
    #[test_case(" 7 ", 7; "surrounding whitespace")]
    #[test_case("007", 7; "leading zeros")]
    fn parses_person_id(input: &str, expected: usize) {
        let id: PersonId = input.parse().unwrap();
        assert_eq!(id.get(), expected);
    }

    #[test_case("0"; "zero is the absent sentinel")]
    #[test_case("-3"; "negative")]
    #[test_case("+3"; "explicit sign")]
    #[test_case("3a"; "trailing letters")]
    #[test_case(""; "empty")]
    fn rejects_invalid_person_id(input: &str) {
        assert!(input.parse::<PersonId>().is_err());
    }

    #[test]
    fn zero_maps_to_absent() {
        assert_eq!(PersonId::from_raw(0), None);
        assert_eq!(PersonId::from_raw(5).map(PersonId::get), Some(5));
    }

    #[test]
    fn next_is_monotonic() {
        assert_eq!(PersonId::FIRST.next().get(), 2);
        assert_eq!(FamilyId::FIRST.next().next().get(), 3);
    }
}
