// ABOUTME: Test utilities for cardb-store, including an in-memory HostFs.
// ABOUTME: Used in tests to exercise the store without touching disk and to inject write failures.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use crate::fs::{DirEntry, HostFs};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    created: u64,
}

/// An in-memory filesystem tree.
///
/// Listings come back in creation order rather than name order, so callers
/// that need a stable order must impose one themselves. Writes can be made
/// to fail with `set_fail_writes` to exercise error paths.
#[derive(Debug)]
pub struct MemoryFs {
    entries: Mutex<BTreeMap<PathBuf, Entry>>,
    next_seq: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryFs {
    /// Create a tree containing only the directory `root` (and its ancestors).
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let fs = Self {
            entries: Mutex::new(BTreeMap::new()),
            next_seq: AtomicU64::new(0),
            fail_writes: AtomicBool::new(false),
        };
        {
            let mut entries = fs.lock();
            for ancestor in root.as_ref().ancestors() {
                let seq = fs.seq();
                entries.insert(
                    ancestor.to_path_buf(),
                    Entry {
                        node: Node::Dir,
                        created: seq,
                    },
                );
            }
        }
        fs
    }

    /// Make every subsequent write (write_new / write_replace) fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Place raw content at `path`, bypassing every check. For seeding
    /// corrupt rows in tests.
    pub fn put_raw(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let seq = self.seq();
        self.lock().insert(
            path.as_ref().to_path_buf(),
            Entry {
                node: Node::File(contents.as_ref().to_vec()),
                created: seq,
            },
        );
    }

    /// Raw content at `path`, if it is a file.
    pub fn get_raw(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().get(path.as_ref()) {
            Some(Entry {
                node: Node::File(contents),
                ..
            }) => Some(contents.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    fn check_writable(&self) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::other("injected write failure"));
        }
        Ok(())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

fn parent_is_dir(entries: &BTreeMap<PathBuf, Entry>, path: &Path) -> io::Result<()> {
    match path.parent().and_then(|parent| entries.get(parent)) {
        Some(Entry {
            node: Node::Dir, ..
        }) => Ok(()),
        _ => Err(not_found(path)),
    }
}

#[async_trait]
impl HostFs for MemoryFs {
    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        let seq = self.seq();
        let mut entries = self.lock();
        if entries.contains_key(path) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        parent_is_dir(&entries, path)?;
        entries.insert(
            path.to_path_buf(),
            Entry {
                node: Node::Dir,
                created: seq,
            },
        );
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let ancestors: Vec<&Path> = path.ancestors().collect();
        let mut entries = self.lock();
        for ancestor in ancestors.into_iter().rev() {
            match entries.get(ancestor) {
                Some(Entry {
                    node: Node::Dir, ..
                }) => {}
                Some(Entry {
                    node: Node::File(_),
                    ..
                }) => return Err(io::Error::from(io::ErrorKind::AlreadyExists)),
                None => {
                    let seq = self.seq();
                    entries.insert(
                        ancestor.to_path_buf(),
                        Entry {
                            node: Node::Dir,
                            created: seq,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    async fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let entries = self.lock();
        match entries.get(path) {
            Some(Entry {
                node: Node::Dir, ..
            }) => {}
            _ => return Err(not_found(path)),
        }

        let mut children: Vec<(u64, DirEntry)> = entries
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .filter_map(|(child, entry)| {
                let name = child.file_name()?.to_str()?.to_string();
                Some((
                    entry.created,
                    DirEntry {
                        name,
                        is_dir: matches!(entry.node, Node::Dir),
                    },
                ))
            })
            .collect();
        children.sort_by_key(|(created, _)| *created);
        Ok(children.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.lock().get(path) {
            Some(Entry {
                node: Node::File(contents),
                ..
            }) => Ok(contents.clone()),
            Some(_) => Err(io::Error::other(format!(
                "is a directory: {}",
                path.display()
            ))),
            None => Err(not_found(path)),
        }
    }

    async fn write_new(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.check_writable()?;
        let data = contents.to_vec();
        let seq = self.seq();
        let mut entries = self.lock();
        parent_is_dir(&entries, path)?;
        if entries.contains_key(path) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        entries.insert(
            path.to_path_buf(),
            Entry {
                node: Node::File(data),
                created: seq,
            },
        );
        Ok(())
    }

    async fn write_replace(&self, path: &Path, _staging: &Path, contents: &[u8]) -> io::Result<()> {
        self.check_writable()?;
        let data = contents.to_vec();
        let seq = self.seq();
        let mut entries = self.lock();
        parent_is_dir(&entries, path)?;
        let created = match entries.get(path) {
            Some(Entry {
                node: Node::Dir, ..
            }) => {
                return Err(io::Error::other(format!(
                    "is a directory: {}",
                    path.display()
                )));
            }
            Some(existing) => existing.created,
            None => seq,
        };
        entries.insert(
            path.to_path_buf(),
            Entry {
                node: Node::File(data),
                created,
            },
        );
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut entries = self.lock();
        match entries.get(path) {
            Some(Entry {
                node: Node::File(_),
                ..
            }) => {
                entries.remove(path);
                Ok(())
            }
            Some(_) => Err(io::Error::other(format!(
                "is a directory: {}",
                path.display()
            ))),
            None => Err(not_found(path)),
        }
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut entries = self.lock();
        match entries.get(path) {
            Some(Entry {
                node: Node::Dir, ..
            }) => {
                entries.retain(|candidate, _| !candidate.starts_with(path));
                Ok(())
            }
            _ => Err(not_found(path)),
        }
    }

    async fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(matches!(
            self.lock().get(path),
            Some(Entry {
                node: Node::Dir,
                ..
            })
        ))
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.lock().contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_follows_creation_order() {
        let mem = MemoryFs::with_root("/db");
        mem.create_dir(Path::new("/db/zeta")).await.unwrap();
        mem.create_dir(Path::new("/db/alpha")).await.unwrap();
        mem.write_new(Path::new("/db/zeta/b.json"), b"{}").await.unwrap();
        mem.write_new(Path::new("/db/zeta/a.json"), b"{}").await.unwrap();

        let names: Vec<String> = mem
            .list_entries(Path::new("/db"))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);

        let names: Vec<String> = mem
            .list_entries(Path::new("/db/zeta"))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["b.json", "a.json"]);
    }

    #[tokio::test]
    async fn writes_require_an_existing_parent() {
        let mem = MemoryFs::with_root("/db");
        let err = mem
            .write_new(Path::new("/db/missing/1.json"), b"{}")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn injected_failures_leave_tree_untouched() {
        let mem = MemoryFs::with_root("/db");
        mem.write_new(Path::new("/db/1.json"), b"old").await.unwrap();
        mem.set_fail_writes(true);

        assert!(
            mem.write_replace(Path::new("/db/1.json"), Path::new("/db/1.json.tmp"), b"new")
                .await
                .is_err()
        );
        assert_eq!(mem.get_raw("/db/1.json").as_deref(), Some(&b"old"[..]));
    }

    #[tokio::test]
    async fn remove_dir_all_drops_descendants_only() {
        let mem = MemoryFs::with_root("/db");
        mem.create_dir(Path::new("/db/posts")).await.unwrap();
        mem.create_dir(Path::new("/db/posts_archive")).await.unwrap();
        mem.write_new(Path::new("/db/posts/1.json"), b"{}").await.unwrap();

        mem.remove_dir_all(Path::new("/db/posts")).await.unwrap();

        assert!(!mem.exists(Path::new("/db/posts/1.json")).await.unwrap());
        assert!(!mem.exists(Path::new("/db/posts")).await.unwrap());
        assert!(mem.is_dir(Path::new("/db/posts_archive")).await.unwrap());
    }
}
