//! Virtual file tree.
//!
//! All files a generation run produces are staged here before anything
//! touches the disk. Keys are always normalized relative paths using `/`.
//!
//! Two modes exist:
//!
//! - **full**: every key is written when the tree is persisted (project
//!   creation).
//! - **tracked**: the tree starts from the files already on disk and records
//!   which paths were set or deleted, so only those hit the disk (invoking a
//!   plugin inside an existing project).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Content of a single staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes, written verbatim.
    Binary(Vec<u8>),
}

impl FileContent {
    /// Text view of the content, `None` for binary files.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Build content from raw bytes, keeping valid UTF-8 as text.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Binary(e.into_bytes()),
        }
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(b)
    }
}

/// Normalize a tree key: `\` becomes `/`, leading `/` and `./` segments are
/// dropped, empty and `.` segments are collapsed, and `..` removes the
/// segment before it. A `..` with nothing left to remove is dropped.
///
/// Absolute paths must be made relative to the project root *before* they
/// reach the tree (see `GeneratorApi::normalize_path`); this function only
/// guarantees the resulting key stays inside the root.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ChangeRecord {
    touched: BTreeSet<String>,
    deleted: BTreeSet<String>,
}

/// In-memory path → content map with optional change tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    files: BTreeMap<String, FileContent>,
    tracking: Option<ChangeRecord>,
}

impl FileTree {
    /// An empty tree in full mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// A change-tracked tree seeded with files that already exist on disk.
    ///
    /// Seeding does not count as a change.
    pub fn tracked<I, P, C>(existing: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<FileContent>,
    {
        let files = existing
            .into_iter()
            .map(|(p, c)| (normalize_path(p.as_ref()), c.into()))
            .collect();
        Self {
            files,
            tracking: Some(ChangeRecord::default()),
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.tracking.is_some()
    }

    pub fn set(&mut self, path: impl AsRef<str>, content: impl Into<FileContent>) {
        let key = normalize_path(path.as_ref());
        if let Some(record) = self.tracking.as_mut() {
            record.deleted.remove(&key);
            record.touched.insert(key.clone());
        }
        self.files.insert(key, content.into());
    }

    pub fn get(&self, path: impl AsRef<str>) -> Option<&FileContent> {
        self.files.get(&normalize_path(path.as_ref()))
    }

    /// Text content of a file, `None` if absent or binary.
    pub fn get_text(&self, path: impl AsRef<str>) -> Option<&str> {
        self.get(path).and_then(FileContent::as_text)
    }

    pub fn contains(&self, path: impl AsRef<str>) -> bool {
        self.files.contains_key(&normalize_path(path.as_ref()))
    }

    /// Remove a file, returning its previous content.
    pub fn delete(&mut self, path: impl AsRef<str>) -> Option<FileContent> {
        let key = normalize_path(path.as_ref());
        let removed = self.files.remove(&key);
        if let Some(record) = self.tracking.as_mut() {
            record.touched.remove(&key);
            if removed.is_some() {
                record.deleted.insert(key);
            }
        }
        removed
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileContent)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Snapshot of the current contents, used as the "before" state.
    pub fn snapshot(&self) -> BTreeMap<String, FileContent> {
        self.files.clone()
    }

    /// Re-key every entry through [`normalize_path`].
    ///
    /// Keys set through the tree API are already normalized; this exists for
    /// trees assembled by post-processors or deserialized from elsewhere.
    pub fn normalize_all(&mut self) {
        let files = std::mem::take(&mut self.files);
        self.files = files
            .into_iter()
            .map(|(k, v)| (normalize_path(&k), v))
            .collect();
    }

    /// Compute which paths must be written and removed.
    ///
    /// `before` is the pre-plugin snapshot, i.e. what exists on disk.
    pub fn write_set(&self, before: &BTreeMap<String, FileContent>) -> WriteSet {
        match &self.tracking {
            None => WriteSet {
                writes: self.files.keys().cloned().collect(),
                removes: before
                    .keys()
                    .filter(|k| !self.files.contains_key(*k))
                    .cloned()
                    .collect(),
            },
            Some(record) => WriteSet {
                writes: record
                    .touched
                    .iter()
                    .filter(|k| self.files.contains_key(*k))
                    .cloned()
                    .collect(),
                removes: record
                    .deleted
                    .iter()
                    .filter(|k| before.contains_key(*k))
                    .cloned()
                    .collect(),
            },
        }
    }

    /// Human-readable change report against a previous snapshot.
    pub fn diff(&self, before: &BTreeMap<String, FileContent>) -> ChangedFiles {
        let mut changes = ChangedFiles::default();
        for (path, content) in &self.files {
            match before.get(path) {
                None => changes.created.push(path.clone()),
                Some(old) if old != content => changes.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        changes.removed = before
            .keys()
            .filter(|k| !self.files.contains_key(*k))
            .cloned()
            .collect();
        changes
    }
}

/// Paths a persistence pass must touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    pub writes: Vec<String>,
    pub removes: Vec<String>,
}

/// Files created, modified or removed by a run, each list sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFiles {
    pub created: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
}

impl ChangedFiles {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.modified.len() + self.removed.len()
    }
}

impl fmt::Display for ChangedFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.created {
            writeln!(f, "  + {p}")?;
        }
        for p in &self.modified {
            writeln!(f, "  ~ {p}")?;
        }
        for p in &self.removed {
            writeln!(f, "  - {p}")?;
        }
        Ok(())
    }
}
