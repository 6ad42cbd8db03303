use serde::Serialize;

/// The descriptive attributes of a person.
///
/// Every attribute is a free-form string; dates in particular are kept
/// verbatim and never interpreted as calendar dates. Empty strings mean
/// "unknown". The [`Store`](super::Store) keeps values trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Person {
    /// Given (first) name.
    pub given_name: String,
    /// Family name (surname).
    pub family_name: String,
    /// Short sex code, e.g. `M` or `F`. May be empty.
    pub sex: String,
    /// Birth date as entered.
    pub birth: String,
    /// Death date as entered.
    pub death: String,
    /// Place associated with the person.
    pub place: String,
    /// Free-text note. May span several lines.
    pub note: String,
}

/// Attributes used to create a new person.
///
/// This is the same shape as [`Person`]; the alias exists so call sites read
/// as "fields for creation" rather than "an existing record".
pub type PersonFields = Person;

impl Person {
    /// Creates a person with the given names and no other attributes.
    #[must_use]
    pub fn new(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        Self {
            given_name: given_name.into(),
            family_name: family_name.into(),
            ..Self::default()
        }
    }

    /// Sets the sex code.
    #[must_use]
    pub fn with_sex(mut self, sex: impl Into<String>) -> Self {
        self.sex = sex.into();
        self
    }

    /// Sets the birth date.
    #[must_use]
    pub fn with_birth(mut self, birth: impl Into<String>) -> Self {
        self.birth = birth.into();
        self
    }

    /// Sets the death date.
    #[must_use]
    pub fn with_death(mut self, death: impl Into<String>) -> Self {
        self.death = death.into();
        self
    }

    /// Sets the place.
    #[must_use]
    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = place.into();
        self
    }

    /// Sets the note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Given and family name separated by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
            .trim()
            .to_string()
    }

    /// Whether `needle` names this person exactly.
    ///
    /// `needle` must already be passed through [`normalize_name`]. It matches
    /// the full name, the given name alone, or the family name alone; partial
    /// matches never count.
    pub(crate) fn is_named(&self, needle: &str) -> bool {
        normalize_name(&self.full_name()) == needle
            || normalize_name(&self.given_name) == needle
            || normalize_name(&self.family_name) == needle
    }

    pub(crate) fn trimmed(self) -> Self {
        Self {
            given_name: self.given_name.trim().to_string(),
            family_name: self.family_name.trim().to_string(),
            sex: self.sex.trim().to_string(),
            birth: self.birth.trim().to_string(),
            death: self.death.trim().to_string(),
            place: self.place.trim().to_string(),
            note: self.note.trim().to_string(),
        }
    }
}

/// Lowercase with runs of whitespace collapsed to one space.
pub(crate) fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A partial update to a [`Person`].
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonUpdate {
    /// New given name.
    pub given_name: Option<String>,
    /// New family name.
    pub family_name: Option<String>,
    /// New sex code.
    pub sex: Option<String>,
    /// New birth date.
    pub birth: Option<String>,
    /// New death date.
    pub death: Option<String>,
    /// New place.
    pub place: Option<String>,
    /// New note.
    pub note: Option<String>,
}

impl PersonUpdate {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.given_name.is_none()
            && self.family_name.is_none()
            && self.sex.is_none()
            && self.birth.is_none()
            && self.death.is_none()
            && self.place.is_none()
            && self.note.is_none()
    }

    pub(crate) fn apply_to(self, person: &mut Person) {
        fn merge(slot: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *slot = value.trim().to_string();
            }
        }

        merge(&mut person.given_name, self.given_name);
        merge(&mut person.family_name, self.family_name);
        merge(&mut person.sex, self.sex);
        merge(&mut person.birth, self.birth);
        merge(&mut person.death, self.death);
        merge(&mut person.place, self.place);
        merge(&mut person.note, self.note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_skips_missing_parts() {
        assert_eq!(Person::new("Ada", "Lovelace").full_name(), "Ada Lovelace");
        assert_eq!(Person::new("Ada", "").full_name(), "Ada");
        assert_eq!(Person::new("", "Lovelace").full_name(), "Lovelace");
    }

    #[test]
    fn name_match_is_exact() {
        let person = Person::new("Jeanne", "Martin");
        assert!(person.is_named("jeanne"));
        assert!(person.is_named("martin"));
        assert!(person.is_named("jeanne martin"));
        assert!(!person.is_named("jean"));
        assert!(!person.is_named("jeanne mart"));
    }

    #[test]
    fn inner_whitespace_in_stored_names_is_collapsed() {
        let person = Person::new("Jean  Paul", "Sartre");
        assert!(person.is_named(&normalize_name("Jean  Paul")));
        assert!(person.is_named("jean paul sartre"));
        assert_eq!(normalize_name(" A\t B  "), "a b");
    }

    #[test]
    fn update_leaves_absent_fields_untouched() {
        let mut person = Person::new("Ada", "Lovelace")
            .with_sex("F")
            .with_birth("1815");
        let update = PersonUpdate {
            death: Some(" 1852 ".to_string()),
            ..PersonUpdate::default()
        };

        update.apply_to(&mut person);

        assert_eq!(person.death, "1852");
        assert_eq!(person.birth, "1815");
        assert_eq!(person.sex, "F");
        assert_eq!(person.given_name, "Ada");
    }

    #[test]
    fn update_can_clear_a_field() {
        let mut person = Person::new("Ada", "Lovelace").with_place("London");
        let update = PersonUpdate {
            place: Some(String::new()),
            ..PersonUpdate::default()
        };

        update.apply_to(&mut person);

        assert!(person.place.is_empty());
    }

    #[test]
    fn trimmed_strips_every_field() {
        let person = Person::new("  Ada ", " Lovelace")
            .with_sex(" F")
            .with_note("\n note \n")
            .trimmed();
        assert_eq!(person.given_name, "Ada");
        assert_eq!(person.family_name, "Lovelace");
        assert_eq!(person.sex, "F");
        assert_eq!(person.note, "note");
    }
}
