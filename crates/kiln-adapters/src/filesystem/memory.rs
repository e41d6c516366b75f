//! In-memory filesystem adapter for testing.
//!
//! Besides plain storage it can inject failures into individual operations,
//! which is how the writers' cleanup paths are exercised without real I/O
//! faults.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use uuid::Uuid;

use kiln_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{KilnError, KilnResult},
};

/// Working directory used to absolutize relative paths.
const MEMORY_CWD: &str = "/work";

/// In-memory filesystem for testing.
///
/// Clones share storage, so a test can hand one clone to a writer and
/// inspect the other.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
    faults: Faults,
}

#[derive(Debug, Default)]
struct Faults {
    write_containing: Option<String>,
    rename: bool,
    copy_after: Option<usize>,
}

impl MemoryFilesystem {
    /// Create a filesystem holding only `/` and the working directory.
    pub fn new() -> Self {
        let fs = Self {
            inner: Arc::new(RwLock::new(MemoryFilesystemInner::default())),
        };
        fs.write_inner().insert_dir_all(Path::new(MEMORY_CWD));
        fs
    }

    /// Make every `write_file` whose path contains `needle` fail.
    pub fn fail_writes_containing(&self, needle: impl Into<String>) {
        self.write_inner().faults.write_containing = Some(needle.into());
    }

    /// Make every `rename` fail, forcing the copy fallback.
    pub fn fail_renames(&self) {
        self.write_inner().faults.rename = true;
    }

    /// Make `copy_dir_all` fail after copying `files` files.
    pub fn fail_copy_after(&self, files: usize) {
        self.write_inner().faults.copy_after = Some(files);
    }

    /// Seed a file, creating its parents (testing helper).
    pub fn seed_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = path.as_ref();
        let mut inner = self.write_inner();
        if let Some(parent) = path.parent() {
            inner.insert_dir_all(parent);
        }
        inner.files.insert(path.to_path_buf(), content.to_string());
    }

    /// Read a file's content (testing helper).
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.read_inner().files.get(path.as_ref()).cloned()
    }

    /// All file paths, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.read_inner().files.keys().cloned().collect()
    }

    /// Every file and directory strictly below `root`, sorted.
    pub fn entries_under(&self, root: impl AsRef<Path>) -> Vec<PathBuf> {
        let root = root.as_ref();
        let inner = self.read_inner();
        let mut out: Vec<PathBuf> = inner
            .directories
            .iter()
            .chain(inner.files.keys())
            .filter(|p| p.starts_with(root) && p.as_path() != root)
            .cloned()
            .collect();
        out.sort();
        out
    }

    // A poisoned lock only means another test thread panicked; the data is
    // still usable.
    fn read_inner(&self) -> RwLockReadGuard<'_, MemoryFilesystemInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, MemoryFilesystemInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFilesystemInner {
    fn insert_dir_all(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    /// Move every entry under `from` to the same relative place under `to`.
    fn move_tree(&mut self, from: &Path, to: &Path) {
        let rebase = |p: &Path| to.join(p.strip_prefix(from).unwrap_or(p));

        let dirs: Vec<PathBuf> = self.directories.iter().filter(|p| p.starts_with(from)).cloned().collect();
        for dir in dirs {
            self.directories.remove(&dir);
            self.directories.insert(rebase(&dir));
        }

        let files: Vec<PathBuf> = self.files.keys().filter(|p| p.starts_with(from)).cloned().collect();
        for file in files {
            if let Some(content) = self.files.remove(&file) {
                self.files.insert(rebase(&file), content);
            }
        }
    }
}

impl Filesystem for MemoryFilesystem {
    fn absolutize(&self, path: &Path) -> KilnResult<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(Path::new(MEMORY_CWD).join(path))
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.read_inner().exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> KilnResult<()> {
        let mut inner = self.write_inner();
        if inner.files.contains_key(path) {
            return Err(fs_error(path, "a file is in the way"));
        }
        inner.insert_dir_all(path);
        Ok(())
    }

    fn create_staging_dir(&self, parent: &Path, prefix: &str) -> KilnResult<PathBuf> {
        let mut inner = self.write_inner();
        if !inner.directories.contains(parent) {
            return Err(fs_error(parent, "parent directory does not exist"));
        }
        let suffix = Uuid::new_v4().simple().to_string();
        let path = parent.join(format!("{prefix}{}", &suffix[..6]));
        inner.directories.insert(path.clone());
        Ok(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> KilnResult<()> {
        let mut inner = self.write_inner();

        if let Some(needle) = &inner.faults.write_containing {
            if path.to_string_lossy().contains(needle.as_str()) {
                return Err(fs_error(path, "injected write failure"));
            }
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(fs_error(path, "parent directory does not exist"));
            }
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_file(&self, path: &Path) -> KilnResult<String> {
        self.read_inner()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| fs_error(path, "no such file"))
    }

    fn rename(&self, from: &Path, to: &Path) -> KilnResult<()> {
        let mut inner = self.write_inner();
        if inner.faults.rename {
            return Err(fs_error(to, "injected rename failure"));
        }
        if !inner.exists(from) {
            return Err(fs_error(from, "no such file or directory"));
        }
        if inner.exists(to) {
            return Err(fs_error(to, "destination exists"));
        }
        inner.move_tree(from, to);
        Ok(())
    }

    fn copy_dir_all(&self, from: &Path, to: &Path) -> KilnResult<()> {
        let mut inner = self.write_inner();
        let limit = inner.faults.copy_after;

        let dirs: Vec<PathBuf> = inner.directories.iter().filter(|p| p.starts_with(from)).cloned().collect();
        for dir in dirs {
            let rel = dir.strip_prefix(from).unwrap_or(&dir).to_path_buf();
            inner.insert_dir_all(&to.join(rel));
        }

        let files: Vec<(PathBuf, String)> = inner
            .files
            .iter()
            .filter(|(p, _)| p.starts_with(from))
            .map(|(p, c)| (p.clone(), c.clone()))
            .collect();
        for (copied, (file, content)) in files.into_iter().enumerate() {
            if limit == Some(copied) {
                return Err(fs_error(to, "injected copy failure"));
            }
            let rel = file.strip_prefix(from).unwrap_or(&file);
            inner.files.insert(to.join(rel), content);
        }
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> KilnResult<()> {
        let mut inner = self.write_inner();
        if !inner.exists(path) {
            return Err(fs_error(path, "no such directory"));
        }
        inner.directories.retain(|p| !p.starts_with(path));
        inner.files.retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}

fn fs_error(path: &Path, reason: &str) -> KilnError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_moves_whole_tree() {
        let fs = MemoryFilesystem::new();
        fs.seed_file("/work/a/x/y.txt", "y");

        fs.rename(Path::new("/work/a"), Path::new("/work/b")).unwrap();

        assert!(!fs.exists(Path::new("/work/a")));
        assert_eq!(fs.contents("/work/b/x/y.txt").as_deref(), Some("y"));
    }

    #[test]
    fn copy_failure_leaves_partial_copy() {
        let fs = MemoryFilesystem::new();
        fs.seed_file("/work/a/1.txt", "1");
        fs.seed_file("/work/a/2.txt", "2");
        fs.fail_copy_after(1);

        assert!(fs.copy_dir_all(Path::new("/work/a"), Path::new("/work/b")).is_err());
        assert_eq!(fs.contents("/work/b/1.txt").as_deref(), Some("1"));
        assert!(fs.contents("/work/b/2.txt").is_none());
    }

    #[test]
    fn writes_need_a_parent() {
        let fs = MemoryFilesystem::new();
        assert!(fs.write_file(Path::new("/work/missing/f"), "x").is_err());
    }
}
