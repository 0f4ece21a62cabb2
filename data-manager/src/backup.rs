//! Backup writer: timestamped copies of data files taken before overwrites

use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use crate::error::DataError;

/// Upper bound on same-millisecond name collisions before giving up
const MAX_COLLISION_SUFFIX: u32 = 1000;

/// Writes immutable pre-overwrite copies into a backup directory
#[derive(Debug, Clone)]
pub struct BackupWriter {
    backup_dir: PathBuf,
}

impl BackupWriter {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copy `source` to `{base_name}_{timestamp}.{ext}` and return that name
    pub async fn backup(&self, source: &Path, base_name: &str) -> Result<String, DataError> {
        self.backup_at(source, base_name, Utc::now()).await
    }

    async fn backup_at(
        &self,
        source: &Path,
        base_name: &str,
        now: DateTime<Utc>,
    ) -> Result<String, DataError> {
        let content = fs::read(source).await.map_err(|e| {
            error!("Failed to read {} for backup: {e}", source.display());
            DataError::Backup(format!("cannot read {}: {e}", source.display()))
        })?;

        fs::create_dir_all(&self.backup_dir).await.map_err(|e| {
            error!("Failed to create backup dir {}: {e}", self.backup_dir.display());
            DataError::Backup(format!(
                "cannot create backup directory {}: {e}",
                self.backup_dir.display()
            ))
        })?;

        let stamp = format_timestamp(now);
        let ext = source.extension().and_then(|e| e.to_str()).unwrap_or("bak");

        for seq in 0..MAX_COLLISION_SUFFIX {
            let name = if seq == 0 {
                format!("{base_name}_{stamp}.{ext}")
            } else {
                format!("{base_name}_{stamp}-{seq}.{ext}")
            };
            let path = self.backup_dir.join(&name);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(f) => f,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    error!("Failed to create backup {}: {e}", path.display());
                    return Err(DataError::Backup(format!("cannot create {name}: {e}")));
                }
            };

            let written = async {
                file.write_all(&content).await?;
                file.sync_all().await
            }
            .await;
            if let Err(e) = written {
                error!("Failed to write backup {}: {e}", path.display());
                let _ = fs::remove_file(&path).await;
                return Err(DataError::Backup(format!("cannot write {name}: {e}")));
            }

            info!("Backup created: {name}");
            return Ok(name);
        }

        Err(DataError::Backup(format!(
            "too many backups for {base_name} at {stamp}"
        )))
    }

    /// Backups taken for `base_name`, oldest first
    pub async fn list(&self, base_name: &str) -> Result<Vec<String>, DataError> {
        let mut entries = match fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DataError::Backup(format!(
                    "cannot list {}: {e}",
                    self.backup_dir.display()
                )))
            }
        };

        let prefix = format!("{base_name}_");
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DataError::Backup(format!("cannot list backups: {e}")))?
        {
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(&prefix) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort_by_cached_key(|name| sort_key(&name[prefix.len()..]));
        Ok(names)
    }
}

/// ISO-8601 UTC with millisecond precision, `:` and `.` replaced by `-`
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// Order by timestamp, then by collision suffix
fn sort_key(stamped: &str) -> (String, u32) {
    let stem = stamped.rsplit_once('.').map_or(stamped, |(stem, _)| stem);
    match stem.rsplit_once("Z-") {
        Some((stamp, seq)) => (stamp.to_string(), seq.parse().unwrap_or(u32::MAX)),
        None => (stem.trim_end_matches('Z').to_string(), 0),
    }
}
