//! Per-user uploaded file storage

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::UploadedFile;

/// Filesystem store for raw uploaded files, one directory per user
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get a user's uploads directory, creating it if needed
    pub fn user_dir(&self, user_id: &str) -> Result<PathBuf> {
        let dir = self.root.join(format!("user_{}", user_id));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Save uploaded bytes under the user's directory.
    ///
    /// A name collision is resolved by suffixing an incrementing counter
    /// before the extension, so filenames stay unique within the directory.
    pub fn save(&self, user_id: &str, filename: &str, data: &[u8]) -> Result<PathBuf> {
        let dir = self.user_dir(user_id)?;
        let mut path = dir.join(filename);

        let mut counter = 1;
        while path.exists() {
            path = dir.join(numbered_filename(filename, counter));
            counter += 1;
        }

        std::fs::write(&path, data)?;
        tracing::info!(user = user_id, file = %path.display(), "saved upload");
        Ok(path)
    }

    /// List the files in a user's directory
    pub fn list(&self, user_id: &str) -> Result<Vec<UploadedFile>> {
        let dir = self.user_dir(user_id)?;
        let mut files = Vec::new();

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                let metadata = entry.metadata()?;
                files.push(UploadedFile {
                    filename: entry.file_name().to_string_lossy().to_string(),
                    size: metadata.len(),
                    path,
                });
            }
        }

        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    /// Remove a single uploaded file
    pub fn remove(&self, user_id: &str, filename: &str) -> Result<()> {
        let path = self.user_dir(user_id)?.join(filename);
        std::fs::remove_file(path)?;
        Ok(())
    }

    /// Remove every file in a user's directory. Returns the number removed.
    pub fn clear(&self, user_id: &str) -> Result<usize> {
        let mut removed = 0;
        for file in self.list(user_id)? {
            std::fs::remove_file(&file.path)?;
            removed += 1;
        }
        tracing::info!(user = user_id, removed, "cleared uploads");
        Ok(removed)
    }
}

/// Insert `_<n>` before the extension: `report.pdf` -> `report_1.pdf`
fn numbered_filename(filename: &str, counter: u32) -> String {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());

    match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, counter, ext.to_string_lossy()),
        None => format!("{}_{}", stem, counter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_filenames_get_numbered_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let first = store.save("USR0001", "notes.txt", b"one").unwrap();
        let second = store.save("USR0001", "notes.txt", b"two").unwrap();
        let third = store.save("USR0001", "notes.txt", b"three").unwrap();

        assert_eq!(first.file_name().unwrap(), "notes.txt");
        assert_eq!(second.file_name().unwrap(), "notes_1.txt");
        assert_eq!(third.file_name().unwrap(), "notes_2.txt");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }

    #[test]
    fn list_reports_name_and_size_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        store.save("USR0001", "a.txt", b"aaaa").unwrap();
        store.save("USR0001", "b.txt", b"bb").unwrap();
        store.save("USR0002", "c.txt", b"c").unwrap();

        let files = store.list("USR0001").unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "a.txt");
        assert_eq!(files[0].size, 4);
        assert_eq!(files[1].filename, "b.txt");

        assert_eq!(store.list("USR0002").unwrap().len(), 1);
    }

    #[test]
    fn clear_empties_only_that_users_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        store.save("USR0001", "a.txt", b"a").unwrap();
        store.save("USR0001", "b.txt", b"b").unwrap();
        store.save("USR0002", "keep.txt", b"k").unwrap();

        assert_eq!(store.clear("USR0001").unwrap(), 2);
        assert!(store.list("USR0001").unwrap().is_empty());
        assert_eq!(store.list("USR0002").unwrap().len(), 1);
    }

    #[test]
    fn remove_deletes_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        store.save("USR0001", "a.txt", b"a").unwrap();
        store.remove("USR0001", "a.txt").unwrap();
        assert!(store.list("USR0001").unwrap().is_empty());
        assert!(store.remove("USR0001", "a.txt").is_err());
    }
}
