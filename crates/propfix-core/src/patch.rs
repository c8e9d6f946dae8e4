//! Patch IR: hash-verified edits and atomic apply for conversion transactions.
//!
//! This module implements the core patch infrastructure for propfix:
//! - Span-anchored edits with content-hash verification
//! - Preconditions tied to a specific snapshot (optimistic concurrency)
//! - Conflict detection (overlapping spans, hash mismatches)
//! - Atomic apply semantics (all-or-nothing)
//! - Patch materialization (unified diff, JSON)

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::text::byte_offset_to_position;

// ============================================================================
// Core Types
// ============================================================================

/// Hash type for content verification (SHA-256, hex-encoded for JSON).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute the SHA-256 hash of the given bytes, hex-encoded.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies the exact project snapshot a patch is based on.
///
/// Derived from the snapshot's file inventory, so different document contents
/// produce different ids. Edits computed against one snapshot can never be
/// applied against another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub String);

impl SnapshotId {
    /// Create a new snapshot id with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        SnapshotId(id.into())
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable document identifier within a snapshot.
///
/// Assigned deterministically (documents sorted by path). Stable within a
/// snapshot and across successor snapshots that keep the same inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.0)
    }
}

/// Byte offsets into document content (snapshot-scoped).
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: u64,
    /// End byte offset (exclusive).
    pub end: u64,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(start <= end, "Span start ({}) must be <= end ({})", start, end);
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Check if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if this span contains a byte offset.
    pub fn contains_offset(&self, offset: u64) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Slice the spanned text out of `source`.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start as usize..self.end as usize]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Edit Operations
// ============================================================================

/// The kind of edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditKind {
    /// Delete the bytes in the span.
    Delete,
    /// Replace the bytes in the span with new text.
    Replace,
}

/// A single text change anchored in one document.
///
/// Every edit carries the hash of the bytes it expects to replace; a
/// mismatch at apply time means the snapshot moved underneath the operation
/// and the whole patch set fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Stable identifier for ordering.
    pub id: u32,
    /// The document this edit applies to.
    pub file_id: FileId,
    /// The kind of operation.
    pub kind: EditKind,
    /// The byte range to edit.
    pub span: Span,
    /// SHA-256 hash of the bytes in `span` before the edit.
    pub expected_before_hash: ContentHash,
    /// The new text (empty for Delete).
    pub text: String,
}

impl Edit {
    /// Create a Delete edit over `span`, verified against `content`.
    ///
    /// # Panics
    /// Panics if the span is empty; deletes must name a non-empty range.
    pub fn delete(id: u32, file_id: FileId, span: Span, content: &str) -> Self {
        assert!(!span.is_empty(), "Delete span must be non-empty, got {}", span);
        Edit {
            id,
            file_id,
            kind: EditKind::Delete,
            span,
            expected_before_hash: ContentHash::compute(span.text(content).as_bytes()),
            text: String::new(),
        }
    }

    /// Create a Replace edit over `span`, verified against `content`.
    pub fn replace(
        id: u32,
        file_id: FileId,
        span: Span,
        content: &str,
        text: impl Into<String>,
    ) -> Self {
        Edit {
            id,
            file_id,
            kind: EditKind::Replace,
            span,
            expected_before_hash: ContentHash::compute(span.text(content).as_bytes()),
            text: text.into(),
        }
    }
}

// ============================================================================
// Preconditions and Conflicts
// ============================================================================

/// Checks that must pass before any edit can apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precondition {
    /// The snapshot id must match the snapshot the edits were computed from.
    SnapshotIsCurrent(SnapshotId),

    /// Document content hash must match.
    FileHashMatches {
        file_id: FileId,
        content_hash: ContentHash,
    },

    /// Edits within each document must not overlap.
    NoOverlaps,
}

/// A detected conflict or invalidation that prevents apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conflict {
    /// Two edits have overlapping spans in the same document.
    OverlappingSpans {
        file_id: FileId,
        edit1_span: Span,
        edit2_span: Span,
    },

    /// The bytes at an edit's span no longer hash to the expected value.
    HashMismatch {
        file_id: FileId,
        span: Span,
        expected: ContentHash,
        actual: ContentHash,
    },

    /// An edit's span is out of bounds for the document.
    SpanOutOfBounds {
        file_id: FileId,
        span: Span,
        file_len: u64,
    },

    /// A precondition failed.
    PreconditionFailed {
        precondition: Precondition,
        reason: String,
    },

    /// Document not found in the apply context.
    FileMissing { file_id: FileId },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::OverlappingSpans {
                file_id,
                edit1_span,
                edit2_span,
            } => write!(
                f,
                "overlapping edits in {}: {} and {}",
                file_id, edit1_span, edit2_span
            ),
            Conflict::HashMismatch { file_id, span, .. } => {
                write!(f, "content changed under edit at {} {}", file_id, span)
            }
            Conflict::SpanOutOfBounds {
                file_id,
                span,
                file_len,
            } => write!(
                f,
                "edit span {} out of bounds for {} (len {})",
                span, file_id, file_len
            ),
            Conflict::PreconditionFailed { reason, .. } => {
                write!(f, "precondition failed: {}", reason)
            }
            Conflict::FileMissing { file_id } => write!(f, "document missing: {}", file_id),
        }
    }
}

// ============================================================================
// PatchSet
// ============================================================================

/// An ordered set of edits with preconditions, applied atomically.
///
/// A PatchSet represents a complete, self-contained conversion transaction:
/// either every edit applies, or none does. All edits are computed against
/// one snapshot before any commit (two-phase: compute, then apply).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchSet {
    /// The snapshot these edits were computed from.
    pub snapshot_id: SnapshotId,

    /// Preconditions that must pass before applying.
    pub preconditions: Vec<Precondition>,

    /// The edits to apply, in deterministic order.
    pub edits: Vec<Edit>,

    /// Mapping from FileId to document path (for materialization).
    pub file_paths: BTreeMap<FileId, String>,
}

impl PatchSet {
    /// Create a new empty PatchSet for the given snapshot.
    pub fn new(snapshot_id: SnapshotId) -> Self {
        PatchSet {
            snapshot_id,
            preconditions: Vec::new(),
            edits: Vec::new(),
            file_paths: BTreeMap::new(),
        }
    }

    /// Add a precondition.
    pub fn push_precondition(&mut self, precondition: Precondition) {
        self.preconditions.push(precondition);
    }

    /// Add an edit.
    pub fn push_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Register a file path mapping.
    pub fn register_file(&mut self, file_id: FileId, path: impl Into<String>) {
        self.file_paths.insert(file_id, path.into());
    }

    /// Whether this PatchSet contains any edits.
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Number of edits.
    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// Number of unique documents touched by edits.
    pub fn file_count(&self) -> usize {
        self.edits
            .iter()
            .map(|e| e.file_id)
            .collect::<std::collections::HashSet<_>>()
            .len()
    }

    /// Sort edits deterministically: by file path, then span start, then id.
    pub fn sort_edits(&mut self) {
        let paths = self.file_paths.clone();
        self.edits.sort_by(|a, b| {
            let path_a = paths.get(&a.file_id).map(String::as_str);
            let path_b = paths.get(&b.file_id).map(String::as_str);
            path_a
                .cmp(&path_b)
                .then(a.span.start.cmp(&b.span.start))
                .then(a.id.cmp(&b.id))
        });
    }

    /// Detect overlapping-span conflicts within this PatchSet.
    #[must_use]
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        let mut edits_by_file: HashMap<FileId, Vec<&Edit>> = HashMap::new();
        for edit in &self.edits {
            edits_by_file.entry(edit.file_id).or_default().push(edit);
        }

        for (file_id, edits) in edits_by_file {
            for i in 0..edits.len() {
                for j in (i + 1)..edits.len() {
                    if edits[i].span.overlaps(&edits[j].span) {
                        conflicts.push(Conflict::OverlappingSpans {
                            file_id,
                            edit1_span: edits[i].span,
                            edit2_span: edits[j].span,
                        });
                    }
                }
            }
        }

        conflicts
    }
}

// ============================================================================
// Atomic Apply
// ============================================================================

/// Result of attempting to apply a PatchSet.
#[derive(Debug, Clone)]
pub enum ApplyResult {
    /// All edits applied; carries the new content for each modified document.
    Success {
        modified_files: HashMap<FileId, String>,
    },

    /// Apply failed; no document was modified.
    Failed { conflicts: Vec<Conflict> },
}

/// Context for applying a PatchSet: the current snapshot's identity and
/// document contents.
pub struct ApplyContext {
    /// Current snapshot id.
    pub snapshot_id: SnapshotId,
    /// Document contents, keyed by FileId.
    pub file_contents: HashMap<FileId, String>,
    /// Document content hashes, keyed by FileId.
    pub file_hashes: HashMap<FileId, ContentHash>,
}

impl PatchSet {
    /// Apply this PatchSet atomically.
    ///
    /// Either every edit applies, or none do. Preconditions are verified
    /// first, then every edit's span and content hash; only when the whole
    /// set is clean are new document contents produced.
    ///
    /// Within each document, edits apply in reverse offset order so earlier
    /// spans stay valid.
    #[must_use]
    pub fn apply(&self, ctx: &ApplyContext) -> ApplyResult {
        let mut conflicts = Vec::new();

        for precondition in &self.preconditions {
            match precondition {
                Precondition::SnapshotIsCurrent(expected) => {
                    if expected != &ctx.snapshot_id {
                        conflicts.push(Conflict::PreconditionFailed {
                            precondition: precondition.clone(),
                            reason: format!(
                                "snapshot mismatch: expected {}, got {}",
                                expected, ctx.snapshot_id
                            ),
                        });
                    }
                }
                Precondition::FileHashMatches {
                    file_id,
                    content_hash,
                } => match ctx.file_hashes.get(file_id) {
                    Some(actual) if actual != content_hash => {
                        conflicts.push(Conflict::PreconditionFailed {
                            precondition: precondition.clone(),
                            reason: format!(
                                "content hash mismatch for {}: expected {}, got {}",
                                file_id, content_hash, actual
                            ),
                        });
                    }
                    Some(_) => {}
                    None => conflicts.push(Conflict::FileMissing { file_id: *file_id }),
                },
                Precondition::NoOverlaps => {
                    conflicts.extend(self.detect_conflicts());
                }
            }
        }

        // Verify every edit before touching anything.
        for edit in &self.edits {
            let content = match ctx.file_contents.get(&edit.file_id) {
                Some(c) => c,
                None => {
                    conflicts.push(Conflict::FileMissing {
                        file_id: edit.file_id,
                    });
                    continue;
                }
            };

            if edit.span.end as usize > content.len() {
                conflicts.push(Conflict::SpanOutOfBounds {
                    file_id: edit.file_id,
                    span: edit.span,
                    file_len: content.len() as u64,
                });
                continue;
            }

            let actual = ContentHash::compute(edit.span.text(content).as_bytes());
            if actual != edit.expected_before_hash {
                conflicts.push(Conflict::HashMismatch {
                    file_id: edit.file_id,
                    span: edit.span,
                    expected: edit.expected_before_hash.clone(),
                    actual,
                });
            }
        }

        if !conflicts.is_empty() {
            debug!(conflicts = conflicts.len(), "patch apply failed");
            return ApplyResult::Failed { conflicts };
        }

        let mut edits_by_file: HashMap<FileId, Vec<&Edit>> = HashMap::new();
        for edit in &self.edits {
            edits_by_file.entry(edit.file_id).or_default().push(edit);
        }

        let mut modified_files = HashMap::new();
        for (file_id, mut file_edits) in edits_by_file {
            let mut content = ctx.file_contents[&file_id].clone();

            // End-to-start keeps earlier spans valid.
            file_edits.sort_by(|a, b| b.span.start.cmp(&a.span.start));

            for edit in file_edits {
                let range = edit.span.start as usize..edit.span.end as usize;
                match edit.kind {
                    EditKind::Delete => content.replace_range(range, ""),
                    EditKind::Replace => content.replace_range(range, &edit.text),
                }
            }

            modified_files.insert(file_id, content);
        }

        debug!(
            files = modified_files.len(),
            edits = self.edits.len(),
            "patch applied"
        );
        ApplyResult::Success { modified_files }
    }
}

// ============================================================================
// Patch Materialization
// ============================================================================

/// A single edit as it appears in output (for JSON serialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputEdit {
    /// Workspace-relative document path.
    pub file: String,
    /// Byte range being replaced.
    pub span: Span,
    /// Original text (for verification).
    pub old_text: String,
    /// Replacement text.
    pub new_text: String,
    /// 1-indexed line number (for display).
    pub line: u32,
    /// 1-indexed column (for display).
    pub col: u32,
}

/// Materialized patch output: per-edit detail plus a unified diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedPatch {
    /// Individual edits (ordered by file, then span start).
    pub edits: Vec<OutputEdit>,
    /// Standard unified diff format.
    pub unified_diff: String,
}

impl PatchSet {
    /// Materialize this PatchSet to output format.
    ///
    /// Requires document contents to compute `old_text` and line/col.
    pub fn materialize(&self, file_contents: &HashMap<FileId, String>) -> MaterializedPatch {
        let mut sorted_edits: Vec<&Edit> = self.edits.iter().collect();
        sorted_edits.sort_by(|a, b| {
            let path_a = self.file_paths.get(&a.file_id).map(String::as_str);
            let path_b = self.file_paths.get(&b.file_id).map(String::as_str);
            path_a
                .cmp(&path_b)
                .then(a.span.start.cmp(&b.span.start))
                .then(a.id.cmp(&b.id))
        });

        let mut output_edits = Vec::new();
        for edit in sorted_edits {
            let path = self
                .file_paths
                .get(&edit.file_id)
                .cloned()
                .unwrap_or_else(|| edit.file_id.to_string());

            let (old_text, line, col) = match file_contents.get(&edit.file_id) {
                Some(content) if (edit.span.end as usize) <= content.len() => {
                    let (line, col) = byte_offset_to_position(content, edit.span.start as usize);
                    (edit.span.text(content).to_string(), line, col)
                }
                _ => (String::new(), 1, 1),
            };

            output_edits.push(OutputEdit {
                file: path,
                span: edit.span,
                old_text,
                new_text: edit.text.clone(),
                line,
                col,
            });
        }

        let unified_diff = crate::diff::generate_unified_diff(&output_edits);
        MaterializedPatch {
            edits: output_edits,
            unified_diff,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
