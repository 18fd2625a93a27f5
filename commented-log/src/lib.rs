//! Append-only record of the threads the bot has already answered.
//!
//! The file holds one thread id per line. It is read in full when opened and
//! only ever grows; nothing is rewritten in place.

use chorus_core::{CoreError, LogError};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CommentedLog {
    path: PathBuf,
    ids: HashSet<String>,
}

impl CommentedLog {
    /// Loads the log at `path`. A file that does not exist yet is an empty log.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No commented log at {}, starting empty", path.display());
                String::new()
            }
            Err(source) => {
                return Err(LogError::ReadFailed {
                    path: path.display().to_string(),
                    source,
                }
                .into())
            }
        };

        let ids: HashSet<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        info!("Loaded {} commented thread ids from {}", ids.len(), path.display());
        Ok(Self { path, ids })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Writes `id` as a new line, creating the file if needed, and remembers it.
    pub async fn append(&mut self, id: &str) -> Result<(), CoreError> {
        let id = id.trim();
        if id.is_empty() || id.contains(['\n', '\r']) {
            return Err(LogError::InvalidId { id: id.to_string() }.into());
        }

        let append_failed = |source| LogError::AppendFailed {
            path: self.path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(append_failed)?;
        file.write_all(format!("{}\n", id).as_bytes())
            .await
            .map_err(append_failed)?;
        file.flush().await.map_err(append_failed)?;

        self.ids.insert(id.to_string());
        debug!("Recorded thread {} in {}", id, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log_path() -> PathBuf {
        std::env::temp_dir().join(format!("chorus-log-{}.txt", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_log() {
        let path = temp_log_path();
        let log = CommentedLog::open(&path).await.unwrap();

        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_open_ignores_blank_lines_and_whitespace() {
        let path = temp_log_path();
        std::fs::write(&path, "t1\n\n  t2  \r\nt1\n").unwrap();

        let log = CommentedLog::open(&path).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.contains("t1"));
        assert!(log.contains("t2"));

        let mut ids: Vec<&str> = log.ids().collect();
        ids.sort();
        assert_eq!(ids, vec!["t1", "t2"]);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_append_writes_one_line_and_survives_reopen() {
        let path = temp_log_path();
        let mut log = CommentedLog::open(&path).await.unwrap();

        log.append("abc123").await.unwrap();
        assert!(log.contains("abc123"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc123\n");

        log.append("def456").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "abc123\ndef456\n"
        );

        let reopened = CommentedLog::open(&path).await.unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(reopened.contains("abc123"));
        assert!(reopened.contains("def456"));

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_append_rejects_invalid_ids() {
        let path = temp_log_path();
        let mut log = CommentedLog::open(&path).await.unwrap();

        for bad in ["", "   ", "a\nb"] {
            assert!(matches!(
                log.append(bad).await,
                Err(CoreError::Log(LogError::InvalidId { .. }))
            ));
        }
        assert!(log.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unreadable_path_is_an_error() {
        let dir = std::env::temp_dir();
        let result = CommentedLog::open(&dir).await;
        assert!(matches!(
            result,
            Err(CoreError::Log(LogError::ReadFailed { .. }))
        ));
    }
}
