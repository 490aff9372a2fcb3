// ABOUTME: Host filesystem capability consumed by the table manager and row store.
// ABOUTME: Defines the HostFs trait and LocalFs, its tokio-backed implementation.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// A single entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// The filesystem primitives the store is built on. Every primitive may fail
/// with an I/O error; `NotFound` and `AlreadyExists` kinds are meaningful to
/// callers and must be reported faithfully.
#[async_trait]
pub trait HostFs: Send + Sync {
    /// Create a single directory. Fails with `AlreadyExists` if present.
    async fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Create a directory and any missing parents. Succeeds if present.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// List the entries directly inside a directory, in host order. Entries
    /// whose names are not valid UTF-8 are left out.
    async fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create a new file with `contents`. Fails with `AlreadyExists` if the
    /// file exists. A failed write leaves no file behind.
    async fn write_new(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Atomically replace `path` with `contents`, staging through `staging`.
    /// On failure the previous content of `path` is untouched.
    async fn write_replace(&self, path: &Path, staging: &Path, contents: &[u8]) -> io::Result<()>;

    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    async fn is_dir(&self, path: &Path) -> io::Result<bool>;

    async fn exists(&self, path: &Path) -> io::Result<bool>;
}

/// Removes a file on drop unless disarmed. Keeps error paths from leaving
/// half-written files around.
struct RemoveOnDrop {
    path: PathBuf,
    armed: bool,
}

impl RemoveOnDrop {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// HostFs over the local filesystem via tokio::fs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostFs for LocalFs {
    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path).await
    }

    async fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut read_dir = fs::read_dir(path).await?;
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(
                        "skipping entry with non-UTF-8 name in {}: {}",
                        path.display(),
                        raw.to_string_lossy()
                    );
                    continue;
                }
            };
            let is_dir = entry.file_type().await?.is_dir();
            entries.push(DirEntry { name, is_dir });
        }
        Ok(entries)
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path).await
    }

    async fn write_new(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        let mut guard = RemoveOnDrop::new(path);

        file.write_all(contents).await?;
        file.sync_all().await?;

        guard.disarm();
        Ok(())
    }

    async fn write_replace(&self, path: &Path, staging: &Path, contents: &[u8]) -> io::Result<()> {
        let mut guard = RemoveOnDrop::new(staging);

        {
            let mut file = fs::File::create(staging).await?;
            file.write_all(contents).await?;
            file.sync_all().await?;
        }

        fs::rename(staging, path).await?;
        guard.disarm();
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path).await
    }

    async fn is_dir(&self, path: &Path) -> io::Result<bool> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        fs::try_exists(path).await
    }
}
