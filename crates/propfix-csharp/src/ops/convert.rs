//! The convert_method_to_property operation.
//!
//! Two-phase transaction over an immutable snapshot:
//!
//! 1. **Compute.** Resolve the target, check eligibility, collect every
//!    reference project-wide, and build one [`PatchSet`] holding the
//!    declaration rewrite plus a parenthesis deletion per call site, all
//!    guarded by snapshot and per-document hash preconditions.
//! 2. **Commit.** Apply the patch set atomically; either every document
//!    updates or none does, and the result is a successor snapshot. The
//!    input snapshot is never mutated.
//!
//! An ineligible target is a normal outcome, not an error: the caller gets
//! the reasons and the snapshot stays as it was.

use thiserror::Error;
use tracing::{debug, info};

use propfix_core::cancel::{Cancelled, CancellationToken};
use propfix_core::patch::{
    ApplyResult, Edit, FileId, MaterializedPatch, PatchSet, Precondition, Span,
};
use propfix_core::snapshot::ProjectSnapshot;
use propfix_core::types::{Location, ReferenceInfo, SymbolInfo};

use crate::eligibility::{self, Eligibility, IneligibleReason};
use crate::ops::ConvertOptions;
use crate::rewrite::reference_edit_spans;
use crate::symbols::{span_location, MethodSymbol, Reference, SymbolError, SymbolIndex};
use crate::transform::build_declaration_rewrite;
use propfix_cst::references::RefKind;

// ============================================================================
// Errors
// ============================================================================

/// Errors that abort a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// No method declaration under the cursor.
    #[error("no method declaration found at {file}:{line}:{col}")]
    SymbolNotFound { file: String, line: u32, col: u32 },

    /// The named file is not in the snapshot.
    #[error("file not found in snapshot: {path}")]
    FileNotFound { path: String },

    /// A document failed member scanning.
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// A reference site is not an empty invocation and cannot be rewritten
    /// as a property read.
    #[error("unsupported reference shape at {location}")]
    UnsupportedReference { location: Location },

    /// Another type declares a same-named parameterless member; bare call
    /// sites of either symbol are indistinguishable by name, so rewriting
    /// would corrupt the other type's callers.
    #[error("ambiguous symbol '{name}': a same-named member is declared at {location}")]
    AmbiguousSymbol { name: String, location: Location },

    /// References cross document boundaries and the cross-document path is
    /// disabled.
    #[error("references outside the declaring document: {}", files.join(", "))]
    CrossDocumentReferences { files: Vec<String> },

    /// A batch target is ineligible; the whole batch is abandoned.
    #[error("target at {location} cannot be converted: {}", reasons.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", "))]
    TargetIneligible {
        location: Location,
        reasons: Vec<IneligibleReason>,
    },

    /// The patch set failed to apply.
    #[error("apply failed: {}", conflicts.join("; "))]
    ApplyFailed { conflicts: Vec<String> },

    /// Cooperative cancellation.
    #[error("operation cancelled")]
    Cancelled(#[from] Cancelled),
}

impl From<ConvertError> for propfix_core::error::PropfixError {
    fn from(err: ConvertError) -> Self {
        use propfix_core::error::PropfixError;
        match err {
            ConvertError::SymbolNotFound { file, line, col } => {
                PropfixError::SymbolNotFound { file, line, col }
            }
            ConvertError::FileNotFound { path } => PropfixError::FileNotFound { path },
            ConvertError::Parse { file, message } => PropfixError::ParseError { file, message },
            ConvertError::UnsupportedReference { location } => {
                PropfixError::UnsupportedReference { location }
            }
            ConvertError::AmbiguousSymbol { name, location } => {
                PropfixError::AmbiguousSymbol { name, location }
            }
            ConvertError::CrossDocumentReferences { files } => {
                PropfixError::CrossDocumentReferences { files }
            }
            err @ ConvertError::TargetIneligible { .. } => PropfixError::ApplyError {
                message: err.to_string(),
            },
            err @ ConvertError::ApplyFailed { .. } => PropfixError::ApplyError {
                message: err.to_string(),
            },
            ConvertError::Cancelled(_) => PropfixError::InternalError {
                message: "operation cancelled".to_string(),
            },
        }
    }
}

impl From<SymbolError> for ConvertError {
    fn from(err: SymbolError) -> Self {
        match err {
            SymbolError::Parse { file, source } => ConvertError::Parse {
                file,
                message: source.to_string(),
            },
            SymbolError::Cancelled(c) => ConvertError::Cancelled(c),
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Edit statistics for one conversion.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConvertSummary {
    /// Total edits in the patch set.
    pub edit_count: usize,
    /// Documents touched.
    pub file_count: usize,
    /// Call sites rewritten (including sites inside the moved body).
    pub reference_count: usize,
}

/// What one successful conversion changed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConvertReport {
    /// The converted method.
    pub symbol: SymbolInfo,
    /// Every rewritten call site.
    pub references: Vec<ReferenceInfo>,
    /// Materialized edits plus unified diff.
    pub patch: MaterializedPatch,
    pub summary: ConvertSummary,
}

/// Outcome of a single conversion.
#[derive(Debug)]
pub enum ConvertOutcome {
    /// The conversion applied; carries the successor snapshot.
    Converted {
        report: Box<ConvertReport>,
        snapshot: ProjectSnapshot,
    },
    /// The target cannot become a property; nothing changed.
    Ineligible {
        symbol: SymbolInfo,
        reasons: Vec<IneligibleReason>,
    },
}

/// Result of an analyze pass: what a conversion would do.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalyzeReport {
    pub symbol: SymbolInfo,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<IneligibleReason>,
    pub references: Vec<ReferenceInfo>,
}

/// Result of a batch conversion.
#[derive(Debug)]
pub struct BatchReport {
    /// Per-target reports, in application order.
    pub reports: Vec<ConvertReport>,
    /// Snapshot after every conversion applied.
    pub snapshot: ProjectSnapshot,
}

// ============================================================================
// Operations
// ============================================================================

/// Convert the parameterless method at `location` into a property.
pub fn convert(
    snapshot: &ProjectSnapshot,
    location: &Location,
    options: &ConvertOptions,
    cancel: &CancellationToken,
) -> Result<ConvertOutcome, ConvertError> {
    let index = SymbolIndex::build(snapshot, cancel)?;
    let symbol = resolve_target(&index, snapshot, location)?;
    convert_symbol(&index, snapshot, &symbol, options, cancel)
}

/// Report what converting the method at `location` would change, without
/// applying anything.
pub fn analyze(
    snapshot: &ProjectSnapshot,
    location: &Location,
    cancel: &CancellationToken,
) -> Result<AnalyzeReport, ConvertError> {
    let index = SymbolIndex::build(snapshot, cancel)?;
    let symbol = resolve_target(&index, snapshot, location)?;
    let symbol_info = symbol_info(snapshot, &symbol);

    let (eligible, reasons) = match eligibility::check(&index, snapshot, &symbol) {
        Eligibility::Eligible => (true, Vec::new()),
        Eligibility::Ineligible { reasons } => (false, reasons),
    };
    let grouped = index.find_references(snapshot, &symbol, cancel)?;
    let references = grouped
        .iter()
        .map(|r| reference_info(snapshot, &symbol, r))
        .collect();
    Ok(AnalyzeReport {
        symbol: symbol_info,
        eligible,
        reasons,
        references,
    })
}

/// Convert several methods in one transaction.
///
/// Targets are resolved up front against the input snapshot, then applied
/// one at a time, each against the previous conversion's successor. Any
/// failure (including an ineligible target) abandons the whole batch; the
/// input snapshot is returned untouched to the caller in that case simply
/// by never being replaced.
pub fn convert_all(
    snapshot: &ProjectSnapshot,
    locations: &[Location],
    options: &ConvertOptions,
    cancel: &CancellationToken,
) -> Result<BatchReport, ConvertError> {
    // Stable application order regardless of argument order.
    let mut ordered: Vec<&Location> = locations.iter().collect();
    ordered.sort();

    // Resolve every target first so a bad location fails before any work.
    // Later conversions re-find their target by identity (file, type, name)
    // because column offsets shift as parentheses are deleted.
    let index = SymbolIndex::build(snapshot, cancel)?;
    let mut targets = Vec::new();
    for loc in &ordered {
        let symbol = resolve_target(&index, snapshot, loc)?;
        targets.push((loc, symbol));
    }

    let mut current = snapshot.clone();
    let mut reports = Vec::new();
    for (loc, target) in targets {
        cancel.check()?;
        let index = SymbolIndex::build(&current, cancel)?;
        let file_id = current
            .file_id(&target_path(snapshot, &target))
            .ok_or_else(|| ConvertError::FileNotFound {
                path: target_path(snapshot, &target),
            })?;
        let symbol = index
            .find_method(file_id, &target.decl.containing_type, &target.decl.name)
            .ok_or_else(|| ConvertError::SymbolNotFound {
                file: loc.file.clone(),
                line: loc.line,
                col: loc.col,
            })?;
        match convert_symbol(&index, &current, &symbol, options, cancel)? {
            ConvertOutcome::Converted { report, snapshot } => {
                reports.push(*report);
                current = snapshot;
            }
            ConvertOutcome::Ineligible { symbol, reasons } => {
                return Err(ConvertError::TargetIneligible {
                    location: symbol.location,
                    reasons,
                });
            }
        }
    }
    info!(conversions = reports.len(), "batch conversion complete");
    Ok(BatchReport {
        reports,
        snapshot: current,
    })
}

// ============================================================================
// Internals
// ============================================================================

fn resolve_target(
    index: &SymbolIndex,
    snapshot: &ProjectSnapshot,
    location: &Location,
) -> Result<MethodSymbol, ConvertError> {
    if snapshot.file_id(&location.file).is_none() {
        return Err(ConvertError::FileNotFound {
            path: location.file.clone(),
        });
    }
    index
        .resolve_method_at(snapshot, location)
        .ok_or_else(|| ConvertError::SymbolNotFound {
            file: location.file.clone(),
            line: location.line,
            col: location.col,
        })
}

fn convert_symbol(
    index: &SymbolIndex,
    snapshot: &ProjectSnapshot,
    symbol: &MethodSymbol,
    options: &ConvertOptions,
    cancel: &CancellationToken,
) -> Result<ConvertOutcome, ConvertError> {
    let info = symbol_info(snapshot, symbol);
    info!(symbol = %info.name, container = ?info.container, "converting method to property");

    if let Eligibility::Ineligible { reasons } = eligibility::check(index, snapshot, symbol) {
        debug!(symbol = %info.name, ?reasons, "target is ineligible");
        return Ok(ConvertOutcome::Ineligible {
            symbol: info,
            reasons,
        });
    }

    if let Some((file_id, span)) = index.find_conflicting_declaration(symbol) {
        let location = match snapshot.document(file_id) {
            Some(doc) => span_location(&doc.path, &doc.text, span),
            None => Location::new("<unknown>", 1, 1),
        };
        return Err(ConvertError::AmbiguousSymbol {
            name: symbol.decl.name.clone(),
            location,
        });
    }

    let grouped = index.find_references(snapshot, symbol, cancel)?;
    if !options.cross_document && !grouped.other.is_empty() {
        let files = grouped
            .other
            .keys()
            .filter_map(|id| snapshot.document(*id))
            .map(|d| d.path.clone())
            .collect();
        return Err(ConvertError::CrossDocumentReferences { files });
    }

    let declaring_doc = snapshot
        .document(symbol.file_id)
        .ok_or_else(|| ConvertError::FileNotFound {
            path: target_path(snapshot, symbol),
        })?;

    let mut patch = PatchSet::new(snapshot.id().clone());
    patch.push_precondition(Precondition::SnapshotIsCurrent(snapshot.id().clone()));
    patch.push_precondition(Precondition::NoOverlaps);

    let mut next_id = 0u32;

    // Declaration rewrite, with in-body call sites folded in.
    let declaring_raw: Vec<_> = grouped.declaring.iter().map(|r| r.raw).collect();
    let decl_rewrite = build_declaration_rewrite(&symbol.decl, &declaring_doc.text, &declaring_raw);
    patch.push_edit(Edit::replace(
        next_id,
        symbol.file_id,
        decl_rewrite.edit_span,
        &declaring_doc.text,
        decl_rewrite.replacement.clone(),
    ));
    next_id += 1;
    register_touched(&mut patch, snapshot, symbol.file_id);

    // Remaining call sites, document by document.
    let mut site_spans: Vec<(FileId, Vec<Span>)> = Vec::new();
    let declaring_spans = reference_edit_spans(&grouped.declaring, &decl_rewrite.consumed_refs)
        .map_err(|r| unsupported(snapshot, &r))?;
    site_spans.push((symbol.file_id, declaring_spans));
    for (&file_id, refs) in &grouped.other {
        cancel.check()?;
        let spans = reference_edit_spans(refs, &[]).map_err(|r| unsupported(snapshot, &r))?;
        site_spans.push((file_id, spans));
    }
    for (file_id, spans) in site_spans {
        let Some(doc) = snapshot.document(file_id) else {
            continue;
        };
        for span in spans {
            patch.push_edit(Edit::delete(next_id, file_id, span, &doc.text));
            next_id += 1;
        }
        if !patch.file_paths.contains_key(&file_id) {
            register_touched(&mut patch, snapshot, file_id);
        }
    }

    for file_id in patch.file_paths.keys().copied().collect::<Vec<_>>() {
        if let Some(doc) = snapshot.document(file_id) {
            patch.push_precondition(Precondition::FileHashMatches {
                file_id,
                content_hash: doc.hash.clone(),
            });
        }
    }
    patch.sort_edits();

    let ctx = snapshot.apply_context();
    let modified = match patch.apply(&ctx) {
        ApplyResult::Success { modified_files } => modified_files,
        ApplyResult::Failed { conflicts } => {
            return Err(ConvertError::ApplyFailed {
                conflicts: conflicts.iter().map(|c| c.to_string()).collect(),
            });
        }
    };

    let references: Vec<ReferenceInfo> = grouped
        .iter()
        .map(|r| reference_info(snapshot, symbol, r))
        .collect();
    let summary = ConvertSummary {
        edit_count: patch.edit_count(),
        file_count: patch.file_count(),
        reference_count: references.len(),
    };
    let materialized = patch.materialize(&ctx.file_contents);
    let successor = snapshot.with_updated_texts(modified);
    info!(
        edits = summary.edit_count,
        files = summary.file_count,
        snapshot = %successor.id(),
        "conversion applied"
    );

    Ok(ConvertOutcome::Converted {
        report: Box::new(ConvertReport {
            symbol: info,
            references,
            patch: materialized,
            summary,
        }),
        snapshot: successor,
    })
}

fn register_touched(patch: &mut PatchSet, snapshot: &ProjectSnapshot, file_id: FileId) {
    if let Some(doc) = snapshot.document(file_id) {
        patch.register_file(file_id, doc.path.clone());
    }
}

fn target_path(snapshot: &ProjectSnapshot, symbol: &MethodSymbol) -> String {
    snapshot
        .document(symbol.file_id)
        .map(|d| d.path.clone())
        .unwrap_or_default()
}

fn unsupported(snapshot: &ProjectSnapshot, reference: &Reference) -> ConvertError {
    let location = match snapshot.document(reference.file_id) {
        Some(doc) => span_location(&doc.path, &doc.text, reference.raw.name_span),
        None => Location::new("<unknown>", 1, 1),
    };
    ConvertError::UnsupportedReference { location }
}

fn symbol_info(snapshot: &ProjectSnapshot, symbol: &MethodSymbol) -> SymbolInfo {
    let location = match snapshot.document(symbol.file_id) {
        Some(doc) => span_location(&doc.path, &doc.text, symbol.decl.name_span),
        None => Location::new("<unknown>", 1, 1),
    };
    SymbolInfo {
        id: symbol.id(),
        name: symbol.decl.name.clone(),
        kind: "method".to_string(),
        location,
        container: Some(symbol.decl.containing_type.clone()),
    }
}

fn reference_info(
    snapshot: &ProjectSnapshot,
    symbol: &MethodSymbol,
    reference: &Reference,
) -> ReferenceInfo {
    let location = match snapshot.document(reference.file_id) {
        Some(doc) => span_location(&doc.path, &doc.text, reference.raw.name_span),
        None => Location::new("<unknown>", 1, 1),
    };
    ReferenceInfo {
        location,
        kind: match reference.raw.kind {
            RefKind::Invocation => "invocation".to_string(),
            RefKind::NameOnly => "name_only".to_string(),
        },
        in_declaring_document: reference.file_id == symbol.file_id,
    }
}
