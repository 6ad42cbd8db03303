//! Reading and writing interchange files on disk.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::instrument;

use super::gedcom::{self, ImportReport};
use crate::domain::{Config, Store};

/// Failure to read or write an interchange file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Any other I/O failure.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

impl LoadError {
    fn io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Reads a file's raw bytes.
///
/// # Errors
///
/// Returns [`LoadError::NotFound`] if the file does not exist, or
/// [`LoadError::Io`] if it cannot be read.
pub fn read(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|e| LoadError::io(path, e))
}

/// Imports an interchange file into a store.
///
/// # Errors
///
/// Returns an error only if the file cannot be read. Problems with the
/// content are listed in the returned report.
#[instrument(level = "debug", skip(store, config))]
pub fn import_file(
    store: &mut Store,
    path: &Path,
    config: &Config,
) -> Result<ImportReport, LoadError> {
    let bytes = read(path)?;
    Ok(gedcom::import(store, &bytes, config))
}

/// Writes the whole store to a file, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be created or written.
#[instrument(level = "debug", skip(store, config))]
pub fn save(store: &Store, path: &Path, config: &Config) -> Result<(), LoadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LoadError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| LoadError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    gedcom::write(store, config, &mut writer).map_err(|e| LoadError::io(path, e))?;
    writer.flush().map_err(|e| LoadError::io(path, e))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::domain::Person;

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.ged");

        let error = read(&path).unwrap_err();

        assert!(matches!(error, LoadError::NotFound(p) if p == path));
    }

    #[test]
    fn save_creates_directories_and_imports_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("tree.ged");
        let config = Config::default();

        let mut store = Store::default();
        store.create_person(Person::new("Ada", "Lovelace").with_sex("F"));
        save(&store, &path, &config).unwrap();

        let mut copy = Store::default();
        let report = import_file(&mut copy, &path, &config).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.persons.len(), 1);
        let ada = copy.person(report.persons[0]).unwrap();
        assert_eq!(ada.full_name(), "Ada Lovelace");
        assert_eq!(ada.sex, "F");
    }
}
