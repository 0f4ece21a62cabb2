//! Data file store: the only component that touches category files
//!
//! Reads return the raw module text. Writes take a pre-overwrite backup,
//! then swap the new text in through a sibling temp file and a rename.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::backup::BackupWriter;
use crate::category::Category;
use crate::error::DataError;

pub struct DataFileStore {
    data_dir: PathBuf,
    backups: BackupWriter,
    /// Serializes writes per category; last write still wins
    write_locks: HashMap<Category, Arc<Mutex<()>>>,
}

impl DataFileStore {
    pub fn new(data_dir: impl Into<PathBuf>, backups: BackupWriter) -> Self {
        let write_locks = Category::ALL
            .into_iter()
            .map(|c| (c, Arc::new(Mutex::new(()))))
            .collect();
        Self {
            data_dir: data_dir.into(),
            backups,
            write_locks,
        }
    }

    pub fn backups(&self) -> &BackupWriter {
        &self.backups
    }

    pub fn path_for(&self, category: Category) -> PathBuf {
        self.data_dir.join(category.file_name())
    }

    /// Full current text of the category's file
    pub async fn read_collection(&self, category: Category) -> Result<String, DataError> {
        let path = self.path_for(category);
        fs::read_to_string(&path).await.map_err(|e| {
            error!("Failed to read {}: {e}", category.file_name());
            if e.kind() == ErrorKind::NotFound {
                DataError::NotFound(format!("Data file {} not found", category.file_name()))
            } else {
                DataError::NotFound(format!("Cannot read {}: {e}", category.file_name()))
            }
        })
    }

    /// Back up the current file, then replace it with `text`
    ///
    /// Returns the backup name. A failed backup leaves the file untouched; a
    /// failed replace keeps the backup that was already taken.
    pub async fn write_collection(
        &self,
        category: Category,
        text: &str,
    ) -> Result<String, DataError> {
        let lock = self.write_locks[&category].clone();
        let _guard = lock.lock().await;

        let path = self.path_for(category);
        let backup = self.backups.backup(&path, category.base_name()).await?;

        replace_file(&path, text.as_bytes()).await.map_err(|e| {
            error!("Failed to write {}: {e}", category.file_name());
            DataError::Write(format!("cannot write {}: {e}", category.file_name()))
        })?;

        info!("Updated {}", category.file_name());
        Ok(backup)
    }
}

/// Write `contents` next to `path`, then rename over it
async fn replace_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "invalid data file path"))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let result = async {
        fs::write(&tmp, contents).await?;
        fs::rename(&tmp, path).await
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&tmp).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ORIGINAL: &str = "import type { Education } from '../types';\n\nexport const education: Education[] = [];\n";

    fn setup() -> (DataFileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(data_dir.join("education.ts"), ORIGINAL).unwrap();
        let store = DataFileStore::new(data_dir, BackupWriter::new(dir.path().join("backups")));
        (store, dir)
    }

    #[tokio::test]
    async fn test_read_collection() {
        let (store, _dir) = setup();
        let text = store.read_collection(Category::Education).await.unwrap();
        assert_eq!(text, ORIGINAL);
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let (store, _dir) = setup();
        let err = store.read_collection(Category::Skills).await.unwrap_err();
        assert!(matches!(err, DataError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_write_backs_up_then_replaces() {
        let (store, _dir) = setup();
        let backup = store
            .write_collection(Category::Education, "replaced\n")
            .await
            .unwrap();

        let current = store.read_collection(Category::Education).await.unwrap();
        assert_eq!(current, "replaced\n");

        let saved = std::fs::read_to_string(store.backups().backup_dir().join(&backup)).unwrap();
        assert_eq!(saved, ORIGINAL);
        assert!(backup.starts_with("education_"));
        assert!(backup.ends_with(".ts"));

        // No temp file left behind
        let leftovers: Vec<_> = std::fs::read_dir(store.path_for(Category::Education).parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_backup_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(data_dir.join("education.ts"), ORIGINAL).unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not dir").unwrap();
        let store = DataFileStore::new(&data_dir, BackupWriter::new(blocker.join("backups")));

        let err = store
            .write_collection(Category::Education, "replaced\n")
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Backup(_)));
        assert_eq!(std::fs::read_to_string(data_dir.join("education.ts")).unwrap(), ORIGINAL);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_backup_and_original() {
        let (store, _dir) = setup();
        let path = store.path_for(Category::Education);
        // A directory where the temp file would go makes the replace fail
        let tmp = path.with_file_name(".education.ts.tmp");
        std::fs::create_dir(&tmp).unwrap();

        let err = store
            .write_collection(Category::Education, "replaced\n")
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Write(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), ORIGINAL);

        let backups = store.backups().list("education").await.unwrap();
        assert_eq!(backups.len(), 1);
        let saved = std::fs::read_to_string(store.backups().backup_dir().join(&backups[0])).unwrap();
        assert_eq!(saved, ORIGINAL);

        // Nothing was written at the temp path
        assert!(tmp.is_dir());
        assert_eq!(std::fs::read_dir(&tmp).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("occupied");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        let err = replace_file(&target, b"new").await.unwrap_err();
        assert_ne!(err.kind(), ErrorKind::NotFound);
        assert!(!dir.path().join(".occupied.tmp").exists());
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn test_write_missing_file_fails_before_writing() {
        let (store, _dir) = setup();
        let err = store
            .write_collection(Category::Skills, "new\n")
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Backup(_)));
        assert!(!store.path_for(Category::Skills).exists());
    }

    #[tokio::test]
    async fn test_concurrent_writes_each_take_a_backup() {
        let (store, _dir) = setup();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .write_collection(Category::Education, &format!("write {i}\n"))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let backups = store.backups().list("education").await.unwrap();
        assert_eq!(backups.len(), 4);
        let current = store.read_collection(Category::Education).await.unwrap();
        assert!(current.starts_with("write "));
    }
}
