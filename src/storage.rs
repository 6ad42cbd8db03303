//! Interchange text and file access.
//!
//! [`gedcom`] converts between a [`Store`](crate::Store) and GEDCOM-style
//! text; [`file`] adds thin helpers for reading and writing such text on disk.

pub mod file;
pub mod gedcom;
mod line;

pub use file::LoadError;
pub use gedcom::{EncodingError, GedcomDocument, ImportReport, MalformedLine};
pub use line::MalformedReason;
