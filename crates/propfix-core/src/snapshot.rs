//! Immutable project snapshots: the whole-codebase state a conversion runs
//! against.
//!
//! A snapshot is an immutable mapping from document identity to document
//! text, with:
//! - Deterministic document ordering (sorted by path)
//! - Stable FileId assignment within a snapshot
//! - A snapshot id derived from the file inventory (content-addressed)
//!
//! A "successor" snapshot is produced by replacing one or more document
//! texts wholesale; snapshots are never mutated in place. The snapshot id is
//! the optimistic-concurrency token: edits computed against one id carry it
//! as a precondition and fail cleanly if applied against another.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;

use crate::patch::{ApplyContext, ContentHash, FileId, SnapshotId};

// ============================================================================
// Language Detection
// ============================================================================

/// Source languages a snapshot can inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// C# source files (.cs)
    CSharp,
    /// Unknown or unsupported language
    Unknown,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("cs") => Language::CSharp,
            _ => Language::Unknown,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::CSharp => write!(f, "csharp"),
            Language::Unknown => write!(f, "unknown"),
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

/// A single document in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Relative path from the workspace root (always forward slashes).
    pub path: String,
    /// Full document text.
    pub text: String,
    /// SHA-256 hash of the text.
    pub hash: ContentHash,
}

impl Document {
    fn new(path: String, text: String) -> Self {
        let hash = ContentHash::compute(text.as_bytes());
        Document { path, text, hash }
    }
}

// ============================================================================
// ProjectSnapshot
// ============================================================================

/// Immutable whole-project state: documents sorted by path, identified by a
/// content-derived snapshot id.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    id: SnapshotId,
    documents: Vec<Document>,
}

impl ProjectSnapshot {
    /// Build a snapshot from (path, text) pairs.
    ///
    /// Documents are sorted by path; FileIds are their indices in that
    /// order, so ids are deterministic for a given inventory.
    pub fn from_files(files: Vec<(String, String)>) -> Self {
        let mut documents: Vec<Document> = files
            .into_iter()
            .map(|(path, text)| Document::new(path, text))
            .collect();
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        let id = Self::derive_id(&documents);
        ProjectSnapshot { id, documents }
    }

    /// Load a snapshot from a directory, inventorying every C# file.
    ///
    /// Paths are stored relative to `root` with forward slashes.
    pub fn load_dir(root: &Path) -> io::Result<Self> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if Language::from_path(entry.path()) != Language::CSharp {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(io::Error::other)?
                .to_string_lossy()
                .replace('\\', "/");
            let text = fs::read_to_string(entry.path())?;
            files.push((relative, text));
        }
        debug!(root = %root.display(), files = files.len(), "loaded project snapshot");
        Ok(Self::from_files(files))
    }

    fn derive_id(documents: &[Document]) -> SnapshotId {
        let mut hasher = Sha256::new();
        for doc in documents {
            hasher.update(doc.path.as_bytes());
            hasher.update([0u8]);
            hasher.update(doc.hash.0.as_bytes());
            hasher.update([b'\n']);
        }
        let digest = hex::encode(hasher.finalize());
        SnapshotId::new(format!("snap_{}", &digest[..16]))
    }

    /// The snapshot id.
    pub fn id(&self) -> &SnapshotId {
        &self.id
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate documents with their FileIds, in path order.
    pub fn iter(&self) -> impl Iterator<Item = (FileId, &Document)> {
        self.documents
            .iter()
            .enumerate()
            .map(|(i, doc)| (FileId(i as u32), doc))
    }

    /// Look up the FileId for a path.
    pub fn file_id(&self, path: &str) -> Option<FileId> {
        self.documents
            .iter()
            .position(|d| d.path == path)
            .map(|i| FileId(i as u32))
    }

    /// Look up a document by FileId.
    pub fn document(&self, file_id: FileId) -> Option<&Document> {
        self.documents.get(file_id.0 as usize)
    }

    /// Produce the successor snapshot with the given document texts replaced.
    ///
    /// Every other document is shared unchanged; the inventory (paths and
    /// ordering, hence FileIds) is preserved, and a new id is derived.
    pub fn with_updated_texts(&self, updates: HashMap<FileId, String>) -> ProjectSnapshot {
        let documents: Vec<Document> = self
            .iter()
            .map(|(file_id, doc)| match updates.get(&file_id) {
                Some(text) => Document::new(doc.path.clone(), text.clone()),
                None => doc.clone(),
            })
            .collect();
        let id = Self::derive_id(&documents);
        ProjectSnapshot { id, documents }
    }

    /// Build an [`ApplyContext`] over this snapshot's contents.
    pub fn apply_context(&self) -> ApplyContext {
        let mut file_contents = HashMap::new();
        let mut file_hashes = HashMap::new();
        for (file_id, doc) in self.iter() {
            file_contents.insert(file_id, doc.text.clone());
            file_hashes.insert(file_id, doc.hash.clone());
        }
        ApplyContext {
            snapshot_id: self.id.clone(),
            file_contents,
            file_hashes,
        }
    }

    /// Write every document back under `root` (host persistence shim).
    pub fn write_to_dir(&self, root: &Path) -> io::Result<()> {
        for doc in &self.documents {
            let full = root.join(&doc.path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full, &doc.text)?;
        }
        debug!(root = %root.display(), files = self.documents.len(), "snapshot written");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
