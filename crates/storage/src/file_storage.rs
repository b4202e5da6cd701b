use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use super::{Backend, StorageError, StorageResult, TxReceipt};

/// Options for the file backend
#[derive(Debug, Clone)]
pub struct FileStorageOptions {
    /// Flush every write to disk before acknowledging it
    pub sync_write: bool,
    /// Upper bound on a single stored value
    pub max_value_size: usize,
}

impl Default for FileStorageOptions {
    fn default() -> Self {
        FileStorageOptions {
            sync_write: true,
            max_value_size: 1024 * 1024, // 1MB
        }
    }
}

/// A file-based backend storing one file per key.
///
/// Reads always go to disk so that writes made by other clients sharing the
/// directory are observed.
pub struct FileStorage {
    base_path: PathBuf,
    options: FileStorageOptions,
}

impl FileStorage {
    /// Create a new file storage instance, creating the base directory
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = base_path.into();

        if !path.exists() {
            fs::create_dir_all(&path).await?;
        }

        Ok(Self {
            base_path: path,
            options: FileStorageOptions::default(),
        })
    }

    /// Set storage options
    pub fn with_options(mut self, options: FileStorageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Keys are flat. `%`, path separators and a leading `.` are
    /// percent-escaped, so each key owns exactly one file inside the base
    /// directory and never a `.tmp-` name.
    fn get_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key == "." || key == ".." {
            return Err(StorageError::Other(format!("Invalid key: {:?}", key)));
        }
        Ok(self.base_path.join(escape_key(key)))
    }
}

fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for (i, c) in key.chars().enumerate() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            '\\' => escaped.push_str("%5C"),
            '.' if i == 0 => escaped.push_str("%2E"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[async_trait]
impl Backend for FileStorage {
    async fn is_available(&self) -> bool {
        match fs::metadata(&self.base_path).await {
            Ok(meta) => meta.is_dir(),
            Err(_) => false,
        }
    }

    async fn get_data(&self, key: &str) -> StorageResult<Vec<u8>> {
        if !self.is_available().await {
            return Err(StorageError::Unavailable(format!(
                "{} is not a directory", self.base_path.display()
            )));
        }

        let path = self.get_path(key)?;
        match fs::read(&path).await {
            Ok(data) => {
                trace!("Retrieved {} bytes for key: {}", data.len(), key);
                Ok(data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_data(&self, key: &str, value: &[u8]) -> StorageResult<TxReceipt> {
        if !self.is_available().await {
            return Err(StorageError::Unavailable(format!(
                "{} is not a directory", self.base_path.display()
            )));
        }
        if value.len() > self.options.max_value_size {
            return Err(StorageError::Other(format!(
                "Value for {} exceeds {} bytes", key, self.options.max_value_size
            )));
        }

        let path = self.get_path(key)?;

        // Write to a sibling file and rename so readers never see a torn value
        let tmp_path = self.base_path.join(format!(".tmp-{}", uuid::Uuid::new_v4()));
        let written = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(value).await?;
            if self.options.sync_write {
                file.sync_all().await?;
            }
            drop(file);
            fs::rename(&tmp_path, &path).await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                trace!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(e.into());
        }

        debug!("Stored {} bytes at key: {}", value.len(), key);
        Ok(TxReceipt::new(key, value.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_values_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).await.unwrap();

        assert!(storage.is_available().await);
        assert!(storage.get_data("proposal_keys").await.unwrap().is_empty());

        storage.set_data("proposal_keys", b"[\"a\"]").await.unwrap();
        assert_eq!(storage.get_data("proposal_keys").await.unwrap(), b"[\"a\"]");

        // A second instance over the same directory sees the write
        let other = FileStorage::new(dir.path()).await.unwrap();
        assert_eq!(other.get_data("proposal_keys").await.unwrap(), b"[\"a\"]");
    }

    #[tokio::test]
    async fn keys_cannot_escape_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("store")).await.unwrap();

        storage.set_data("../outside", b"x").await.unwrap();
        assert!(!dir.path().join("outside").exists());
        assert_eq!(storage.get_data("../outside").await.unwrap(), b"x");

        assert!(storage.set_data("..", b"x").await.is_err());
    }

    #[tokio::test]
    async fn missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("store");
        let storage = FileStorage::new(&base).await.unwrap();
        std::fs::remove_dir_all(&base).unwrap();

        assert!(!storage.is_available().await);
        assert!(matches!(storage.get_data("k").await, Err(StorageError::Unavailable(_))));
    }

    #[tokio::test]
    async fn oversized_values_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path())
            .await
            .unwrap()
            .with_options(FileStorageOptions { sync_write: false, max_value_size: 4 });

        assert!(storage.set_data("k", b"12345").await.is_err());
        assert!(storage.set_data("k", b"1234").await.is_ok());
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn escaped_keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).await.unwrap();

        storage.set_data("proposal_a/b", b"first").await.unwrap();
        storage.set_data("proposal_a%2Fb", b"second").await.unwrap();
        storage.set_data("proposal_a\\b", b"third").await.unwrap();

        assert_eq!(storage.get_data("proposal_a/b").await.unwrap(), b"first");
        assert_eq!(storage.get_data("proposal_a%2Fb").await.unwrap(), b"second");
        assert_eq!(storage.get_data("proposal_a\\b").await.unwrap(), b"third");
        assert_eq!(file_names(dir.path()).len(), 3);
    }

    #[tokio::test]
    async fn dot_keys_stay_out_of_temp_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).await.unwrap();

        storage.set_data(".tmp-x", b"value").await.unwrap();
        assert_eq!(storage.get_data(".tmp-x").await.unwrap(), b"value");
        assert!(file_names(dir.path()).iter().all(|name| !name.starts_with('.')));
    }

    #[tokio::test]
    async fn failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).await.unwrap();

        // A non-empty directory where the key file belongs makes the rename fail
        std::fs::create_dir(dir.path().join("blocked")).unwrap();
        std::fs::write(dir.path().join("blocked").join("inner"), b"x").unwrap();

        assert!(storage.set_data("blocked", b"value").await.is_err());
        assert_eq!(file_names(dir.path()), vec!["blocked".to_string()]);
    }
}
