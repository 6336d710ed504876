//! Durable key-value media the persistence adapter writes through.
//!
//! A medium stores one text value per key and knows nothing about what the
//! text means. Two implementations ship with the crate:
//!
//! | Medium | Backing | Use |
//! |--------|---------|-----|
//! | [`FileMedium`] | `<dir>/<key>.json` files | Normal local persistence |
//! | [`MemoryMedium`] | In-process map | Ephemeral stores, tests |

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Text storage addressed by key.
///
/// `read` returns `Ok(None)` for a key that was never written. `write`
/// replaces the whole value; a reader must observe either the old or the
/// new value, never a mix.
pub trait KeyValueMedium {
    /// Fetch the value stored at `key`, if any.
    fn read(&self, key: &str) -> io::Result<Option<String>>;

    /// Replace the value stored at `key`.
    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;
}

// =============================================================================
// FileMedium
// =============================================================================

/// One JSON file per key inside a data directory.
///
/// Writes land in `<key>.json.tmp`, are flushed to disk and then renamed
/// over `<key>.json`.
#[derive(Debug, Clone)]
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    /// Use `dir` as the data directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key `{key}`"),
            ));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueMedium for FileMedium {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)
    }
}

// =============================================================================
// MemoryMedium
// =============================================================================

/// A map held in memory. Nothing outlives the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryMedium {
    entries: BTreeMap<String, String>,
}

impl MemoryMedium {
    /// An empty medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the raw value stored at `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of keys written so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueMedium for MemoryMedium {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_medium_missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let medium = FileMedium::open(dir.path()).unwrap();
        assert_eq!(medium.read("bands").unwrap(), None);
    }

    #[test]
    fn file_medium_overwrites_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = FileMedium::open(dir.path().join("nested")).unwrap();
        medium.write("tours", "[1]").unwrap();
        medium.write("tours", "[2]").unwrap();
        assert_eq!(medium.read("tours").unwrap().as_deref(), Some("[2]"));

        let names: Vec<String> = fs::read_dir(medium.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["tours.json".to_owned()]);
    }

    #[test]
    fn file_medium_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = FileMedium::open(dir.path()).unwrap();
        let err = medium.write("../escape", "x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(medium.read("").is_err());
    }

    #[test]
    fn memory_medium_round_trips() {
        let mut medium = MemoryMedium::new();
        assert!(medium.is_empty());
        assert_eq!(medium.read("bands").unwrap(), None);
        medium.write("bands", "[]").unwrap();
        assert_eq!(medium.get("bands"), Some("[]"));
        assert_eq!(medium.len(), 1);
    }
}
