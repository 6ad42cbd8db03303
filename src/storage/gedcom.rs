//! Reading and writing GEDCOM-style interchange text.
//!
//! The format is line oriented. Every line is `<depth> [@ref@] <TAG> [data]`;
//! a depth-0 line opens a record and deeper lines describe it:
//!
//! ```text
//! 0 HEAD
//! 1 SOUR kinship
//! 1 CHAR UTF-8
//! 0 @I1@ INDI
//! 1 NAME Ada /Lovelace/
//! 1 SEX F
//! 1 BIRT
//! 2 DATE 10 DEC 1815
//! 0 @I2@ INDI
//! 1 NAME William /King/
//! 0 @F1@ FAM
//! 1 HUSB @I2@
//! 1 WIFE @I1@
//! 0 @R1@ RELA
//! 1 TYPE marriage
//! 1 REF @I1@
//! 1 REF @I2@
//! 0 TRLR
//! ```
//!
//! Decoding never fails: lines that do not fit the grammar are skipped and
//! reported, and invalid UTF-8 is replaced. Decoded records are merged into a
//! [`Store`] through its ordinary operations, so imported persons always get
//! fresh identifiers and families are deduplicated like any other.

use std::{borrow::Cow, collections::HashMap, fmt::Write as _, io};

use tracing::instrument;

use super::line::{MalformedReason, parse_line, reference_token, split_name};
use crate::domain::{Config, Event, FamilyId, PersonFields, PersonId, RelationKind, Store};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// A line that was skipped while decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line_no}: {reason}: '{line}'")]
pub struct MalformedLine {
    /// 1-based line number in the input.
    pub line_no: usize,
    /// The offending line.
    pub line: String,
    /// What was wrong with it.
    pub reason: MalformedReason,
}

/// The input was not valid UTF-8.
///
/// Decoding still completes; invalid sequences are replaced with U+FFFD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("input is not valid UTF-8 after byte {valid_up_to}, invalid sequences were replaced")]
pub struct EncodingError {
    /// Length of the longest valid prefix.
    pub valid_up_to: usize,
}

/// What an import added to the store, plus decoding diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// New persons, in document order.
    pub persons: Vec<PersonId>,
    /// Families created or extended, each listed once.
    pub families: Vec<FamilyId>,
    /// Number of relations added.
    pub relations: usize,
    /// Family records that named no known person at all.
    pub skipped_families: usize,
    /// Relation records without a type or without two known persons.
    pub skipped_relations: usize,
    /// Lines skipped by the decoder.
    pub malformed_lines: Vec<MalformedLine>,
    /// Set if the input had to be decoded lossily.
    pub encoding_error: Option<EncodingError>,
}

impl ImportReport {
    /// Total number of records touched.
    #[must_use]
    pub fn records(&self) -> usize {
        self.persons.len() + self.families.len() + self.relations
    }

    /// Whether the input decoded without any problem.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.malformed_lines.is_empty()
            && self.encoding_error.is_none()
            && self.skipped_families == 0
            && self.skipped_relations == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PersonRecord {
    xref: String,
    fields: PersonFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FamilyRecord {
    xref: String,
    husband: Option<String>,
    wife: Option<String>,
    children: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RelationRecord {
    kind: String,
    references: Vec<String>,
    note: String,
}

/// Interchange text decoded into records, not yet merged into a store.
///
/// Records keep the external `@ref@` tokens of the document; they are only
/// mapped to store identifiers by [`GedcomDocument::import_into`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GedcomDocument {
    persons: Vec<PersonRecord>,
    families: Vec<FamilyRecord>,
    relations: Vec<RelationRecord>,
    malformed_lines: Vec<MalformedLine>,
    encoding_error: Option<EncodingError>,
}

/// The record the decoder is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    None,
    Person(usize),
    Family(usize),
    Relation(usize),
}

/// An event line waiting for its nested `DATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingEvent {
    Birth,
    Death,
}

#[derive(Debug)]
struct Decoder {
    document: GedcomDocument,
    person_index: HashMap<String, usize>,
    family_index: HashMap<String, usize>,
    current: Current,
    pending: Option<PendingEvent>,
    /// Whether `CONT`/`CONC` lines extend the current record's note.
    in_note: bool,
}

impl GedcomDocument {
    /// Decodes interchange text.
    ///
    /// A leading byte-order mark is ignored.
    #[must_use]
    #[instrument(level = "debug", skip_all, fields(bytes = bytes.len()))]
    pub fn parse(bytes: &[u8]) -> Self {
        let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
        let (text, encoding_error) = match std::str::from_utf8(bytes) {
            Ok(text) => (Cow::Borrowed(text), None),
            Err(e) => {
                tracing::warn!(valid_up_to = e.valid_up_to(), "input is not valid UTF-8");
                (
                    String::from_utf8_lossy(bytes),
                    Some(EncodingError {
                        valid_up_to: e.valid_up_to(),
                    }),
                )
            }
        };

        let mut decoder = Decoder::new();
        for (index, raw) in text.lines().enumerate() {
            decoder.line(index + 1, raw);
        }

        let mut document = decoder.document;
        document.encoding_error = encoding_error;
        tracing::debug!(
            persons = document.persons.len(),
            families = document.families.len(),
            relations = document.relations.len(),
            malformed = document.malformed_lines.len(),
            "document decoded"
        );
        document
    }

    /// Number of person records.
    #[must_use]
    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    /// Number of family records.
    #[must_use]
    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Number of relation records.
    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Lines skipped by the decoder.
    #[must_use]
    pub fn malformed_lines(&self) -> &[MalformedLine] {
        &self.malformed_lines
    }

    /// Set if the input had to be decoded lossily.
    #[must_use]
    pub const fn encoding_error(&self) -> Option<EncodingError> {
        self.encoding_error
    }

    /// Merges the decoded records into a store.
    ///
    /// Persons are created first, in document order, with fresh identifiers.
    /// A missing given name becomes the configured placeholder and a missing
    /// family name becomes the configured prefix followed by the new person's
    /// identifier. Families are then attached through the store's family
    /// operations, so an existing family with the same parent pair is
    /// extended instead of duplicated. References to persons that are not in
    /// the document count as absent parents and are dropped from child lists;
    /// a family left with no known person is skipped and counted. Finally relations are added; a relation needs a type and exactly two
    /// known persons, otherwise it is skipped and counted.
    #[instrument(level = "debug", skip_all)]
    pub fn import_into(self, store: &mut Store, config: &Config) -> ImportReport {
        let mut report = ImportReport {
            malformed_lines: self.malformed_lines,
            encoding_error: self.encoding_error,
            ..ImportReport::default()
        };

        let ids = import_persons(self.persons, store, config, &mut report);
        for family in &self.families {
            import_family(family, &ids, store, &mut report);
        }
        for relation in self.relations {
            if import_relation(relation, &ids, store) {
                report.relations += 1;
            } else {
                report.skipped_relations += 1;
            }
        }

        store.record(Event::Imported {
            persons: report.persons.len(),
            families: report.families.len(),
            relations: report.relations,
        });
        tracing::info!(
            persons = report.persons.len(),
            families = report.families.len(),
            relations = report.relations,
            skipped_families = report.skipped_families,
            skipped_relations = report.skipped_relations,
            malformed_lines = report.malformed_lines.len(),
            "import complete"
        );

        report
    }
}

/// Creates the persons and maps each document reference to its new ID.
fn import_persons(
    persons: Vec<PersonRecord>,
    store: &mut Store,
    config: &Config,
    report: &mut ImportReport,
) -> HashMap<String, PersonId> {
    let mut ids = HashMap::with_capacity(persons.len());
    for PersonRecord { xref, mut fields } in persons {
        if fields.given_name.trim().is_empty() {
            fields.given_name.clone_from(&config.unknown_given_name);
        }
        if fields.family_name.trim().is_empty() {
            fields.family_name = format!(
                "{}{}",
                config.placeholder_family_prefix,
                store.next_person_id()
            );
        }
        let id = store.create_person(fields);
        ids.insert(xref, id);
        report.persons.push(id);
    }
    ids
}

fn import_family(
    family: &FamilyRecord,
    ids: &HashMap<String, PersonId>,
    store: &mut Store,
    report: &mut ImportReport,
) {
    let resolve = |token: Option<&str>| token.and_then(|t| ids.get(t).copied());
    let husband = resolve(family.husband.as_deref());
    let wife = resolve(family.wife.as_deref());
    let children: Vec<PersonId> = family
        .children
        .iter()
        .filter_map(|child| ids.get(child).copied())
        .collect();

    if children.is_empty() {
        if husband.is_none() && wife.is_none() {
            tracing::debug!(xref = %family.xref, "skipping empty family");
            report.skipped_families += 1;
            return;
        }
        match store.ensure_family(husband, wife) {
            Ok(id) => push_unique(&mut report.families, id),
            Err(e) => tracing::warn!(xref = %family.xref, "family not imported: {e}"),
        }
        return;
    }

    for child in children {
        match store.create_or_extend_family(husband, wife, child) {
            Ok(link) => push_unique(&mut report.families, link.family),
            Err(e) => tracing::warn!(xref = %family.xref, "child not imported: {e}"),
        }
    }
}

/// Adds the relation if it has a type and exactly two known persons.
fn import_relation(
    relation: RelationRecord,
    ids: &HashMap<String, PersonId>,
    store: &mut Store,
) -> bool {
    let persons: Vec<PersonId> = relation
        .references
        .iter()
        .filter_map(|token| ids.get(token).copied())
        .collect();

    match (RelationKind::new(relation.kind), persons.as_slice()) {
        (Ok(kind), &[first, second]) if relation.references.len() == 2 => store
            .add_relation(kind, first, second, &relation.note)
            .is_ok(),
        _ => false,
    }
}

fn push_unique(families: &mut Vec<FamilyId>, id: FamilyId) {
    if !families.contains(&id) {
        families.push(id);
    }
}

impl Decoder {
    fn new() -> Self {
        Self {
            document: GedcomDocument::default(),
            person_index: HashMap::new(),
            family_index: HashMap::new(),
            current: Current::None,
            pending: None,
            in_note: false,
        }
    }

    fn malformed(&mut self, line_no: usize, raw: &str, reason: MalformedReason) {
        tracing::debug!(line_no, %reason, "skipping line");
        self.document.malformed_lines.push(MalformedLine {
            line_no,
            line: raw.to_string(),
            reason,
        });
    }

    fn line(&mut self, line_no: usize, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }

        let line = match parse_line(raw) {
            Ok(line) => line,
            Err(reason) => {
                self.malformed(line_no, raw, reason);
                return;
            }
        };

        if line.depth == 0 {
            self.pending = None;
            self.in_note = false;
            self.current = match (line.tag.as_str(), line.xref) {
                ("INDI", Some(xref)) => Current::Person(self.open_person(xref)),
                ("FAM", Some(xref)) => Current::Family(self.open_family(xref)),
                ("RELA", _) => {
                    self.document.relations.push(RelationRecord::default());
                    Current::Relation(self.document.relations.len() - 1)
                }
                _ => Current::None,
            };
            return;
        }

        if line.depth > 1 {
            self.nested(&line.tag, line.data);
            return;
        }

        self.pending = None;
        self.in_note = false;
        let result = match self.current {
            Current::None => Ok(()),
            Current::Person(index) => {
                self.person_attribute(index, &line.tag, line.data);
                Ok(())
            }
            Current::Family(index) => self.family_pointer(index, &line.tag, line.data),
            Current::Relation(index) => self.relation_attribute(index, &line.tag, line.data),
        };

        if let Err(reason) = result {
            self.malformed(line_no, raw, reason);
        }
    }

    /// Opens a person record. A reference seen before starts that record over.
    fn open_person(&mut self, xref: &str) -> usize {
        let record = PersonRecord {
            xref: xref.to_string(),
            fields: PersonFields::default(),
        };
        if let Some(&index) = self.person_index.get(xref) {
            self.document.persons[index] = record;
            return index;
        }
        self.document.persons.push(record);
        let index = self.document.persons.len() - 1;
        self.person_index.insert(xref.to_string(), index);
        index
    }

    fn open_family(&mut self, xref: &str) -> usize {
        let record = FamilyRecord {
            xref: xref.to_string(),
            ..FamilyRecord::default()
        };
        if let Some(&index) = self.family_index.get(xref) {
            self.document.families[index] = record;
            return index;
        }
        self.document.families.push(record);
        let index = self.document.families.len() - 1;
        self.family_index.insert(xref.to_string(), index);
        index
    }

    fn person_attribute(&mut self, index: usize, tag: &str, data: &str) {
        let person = &mut self.document.persons[index].fields;
        match tag {
            "NAME" => (person.given_name, person.family_name) = split_name(data),
            "SEX" => person.sex = data.trim().to_string(),
            "BIRT" => self.pending = Some(PendingEvent::Birth),
            "DEAT" => self.pending = Some(PendingEvent::Death),
            "PLAC" => person.place = data.trim().to_string(),
            "NOTE" => {
                person.note = data.to_string();
                self.in_note = true;
            }
            _ => {}
        }
    }

    fn family_pointer(
        &mut self,
        index: usize,
        tag: &str,
        data: &str,
    ) -> Result<(), MalformedReason> {
        let family = &mut self.document.families[index];
        let slot = match tag {
            "HUSB" => &mut family.husband,
            "WIFE" => &mut family.wife,
            "CHIL" => {
                family.children.push(reference_token(data)?.to_string());
                return Ok(());
            }
            _ => return Ok(()),
        };
        // A bad pointer leaves the slot absent.
        let token = reference_token(data);
        *slot = token.as_ref().ok().map(|token| (*token).to_string());
        token.map(|_| ())
    }

    fn relation_attribute(
        &mut self,
        index: usize,
        tag: &str,
        data: &str,
    ) -> Result<(), MalformedReason> {
        let relation = &mut self.document.relations[index];
        match tag {
            "TYPE" => relation.kind = data.trim().to_string(),
            "REF" => relation
                .references
                .push(reference_token(data)?.to_string()),
            "NOTE" => {
                relation.note = data.to_string();
                self.in_note = true;
            }
            _ => {}
        }
        Ok(())
    }

    /// Handles a line deeper than the record's attributes.
    fn nested(&mut self, tag: &str, data: &str) {
        match (tag, self.pending.take()) {
            ("DATE", Some(event)) => {
                if let Current::Person(index) = self.current {
                    let person = &mut self.document.persons[index].fields;
                    let date = data.trim().to_string();
                    match event {
                        PendingEvent::Birth => person.birth = date,
                        PendingEvent::Death => person.death = date,
                    }
                }
            }
            ("CONT" | "CONC", _) if self.in_note => {
                if let Some(note) = self.current_note() {
                    if tag == "CONT" {
                        note.push('\n');
                    }
                    note.push_str(data);
                }
            }
            _ => {}
        }
    }

    fn current_note(&mut self) -> Option<&mut String> {
        match self.current {
            Current::Person(index) => Some(&mut self.document.persons[index].fields.note),
            Current::Relation(index) => Some(&mut self.document.relations[index].note),
            Current::Family(_) | Current::None => None,
        }
    }
}

/// Decodes interchange text without touching any store.
#[must_use]
pub fn decode(bytes: &[u8]) -> GedcomDocument {
    GedcomDocument::parse(bytes)
}

/// Decodes interchange text and merges it into a store.
///
/// See [`GedcomDocument::import_into`] for how records are merged.
pub fn import(store: &mut Store, bytes: &[u8], config: &Config) -> ImportReport {
    GedcomDocument::parse(bytes).import_into(store, config)
}

/// Encodes the whole store as interchange text.
///
/// The output is deterministic: persons and families in ascending identifier
/// order, relations in insertion order.
///
/// # Panics
///
/// Never in practice; formatting into a `String` cannot fail.
#[must_use]
#[instrument(level = "debug", skip_all)]
pub fn encode(store: &Store, config: &Config) -> String {
    let mut out = String::new();
    write_document(&mut out, store, config).expect("writing to a String never fails");
    out
}

/// Encodes the whole store into a writer.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write<W: io::Write>(store: &Store, config: &Config, writer: &mut W) -> io::Result<()> {
    writer.write_all(encode(store, config).as_bytes())
}

fn write_document(out: &mut String, store: &Store, config: &Config) -> std::fmt::Result {
    line(out, 0, "HEAD", "")?;
    line(out, 1, "SOUR", &single_line(&config.source))?;
    line(out, 1, "CHAR", "UTF-8")?;

    for (id, person) in store.persons() {
        writeln!(out, "0 @I{id}@ INDI")?;
        let name = format!(
            "{} /{}/",
            single_line(&person.given_name).replace('/', " "),
            single_line(&person.family_name)
        );
        line(out, 1, "NAME", name.trim_start())?;
        if !person.sex.is_empty() {
            line(out, 1, "SEX", &single_line(&person.sex))?;
        }
        if !person.birth.is_empty() {
            line(out, 1, "BIRT", "")?;
            line(out, 2, "DATE", &single_line(&person.birth))?;
        }
        if !person.death.is_empty() {
            line(out, 1, "DEAT", "")?;
            line(out, 2, "DATE", &single_line(&person.death))?;
        }
        if !person.place.is_empty() {
            line(out, 1, "PLAC", &single_line(&person.place))?;
        }
        if !person.note.is_empty() {
            note(out, &person.note)?;
        }
    }

    for (id, family) in store.families() {
        writeln!(out, "0 @F{id}@ FAM")?;
        if let Some(parent) = family.parent1() {
            writeln!(out, "1 HUSB @I{parent}@")?;
        }
        if let Some(parent) = family.parent2() {
            writeln!(out, "1 WIFE @I{parent}@")?;
        }
        for child in family.children() {
            writeln!(out, "1 CHIL @I{child}@")?;
        }
    }

    for (index, relation) in store.relations().iter().enumerate() {
        let [first, second] = relation.persons();
        writeln!(out, "0 @R{}@ RELA", index + 1)?;
        line(out, 1, "TYPE", &single_line(relation.kind()))?;
        writeln!(out, "1 REF @I{first}@")?;
        writeln!(out, "1 REF @I{second}@")?;
        if !relation.note().is_empty() {
            note(out, relation.note())?;
        }
    }

    line(out, 0, "TRLR", "")
}

fn line(out: &mut String, depth: usize, tag: &str, data: &str) -> std::fmt::Result {
    if data.is_empty() {
        writeln!(out, "{depth} {tag}")
    } else {
        writeln!(out, "{depth} {tag} {data}")
    }
}

/// Writes a `NOTE` at depth 1 with one `CONT` line per extra line.
fn note(out: &mut String, text: &str) -> std::fmt::Result {
    let mut lines = text.lines();
    line(out, 1, "NOTE", lines.next().unwrap_or_default())?;
    for continuation in lines {
        line(out, 2, "CONT", continuation)?;
    }
    Ok(())
}

fn single_line(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r']) {
        Cow::Owned(value.split_whitespace().collect::<Vec<_>>().join(" "))
    } else {
        Cow::Borrowed(value)
    }
}
