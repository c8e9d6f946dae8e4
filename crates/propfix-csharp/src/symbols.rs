//! Project-wide symbol indexing and reference resolution.
//!
//! A [`SymbolIndex`] is built once per snapshot: every C# document is
//! tokenized and scanned into its member model, keyed by [`FileId`]. The
//! index answers three questions:
//!
//! - which method declaration sits under a cursor location,
//! - where is that method's name referenced across the project, and
//! - does any other type declare a member that collides with that name.
//!
//! Resolution is name- and arity-based, scoped by what the member scanner
//! can see. Occurrences inside declarations of same-named members or types
//! are excluded from reference scans rather than guessed at.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use propfix_core::cancel::{Cancelled, CancellationToken};
use propfix_core::patch::{FileId, Span};
use propfix_core::snapshot::{Language, ProjectSnapshot};
use propfix_core::text::{byte_offset_to_position, position_to_byte_offset};
use propfix_core::types::Location;

use propfix_cst::nodes::{parse_source, MethodDecl, ParseError, SourceModel};
use propfix_cst::references::{collect_name_references, RawReference};
use propfix_cst::tokenizer::{tokenize, Token};

// ============================================================================
// Errors
// ============================================================================

/// Errors from index construction.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("parse error in {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("operation cancelled")]
    Cancelled(#[from] Cancelled),
}

// ============================================================================
// Index
// ============================================================================

/// Per-document index entry: token stream plus member model.
#[derive(Debug)]
struct DocumentIndex {
    tokens: Vec<Token>,
    model: SourceModel,
}

/// A resolved method symbol: a declaration pinned to its document.
#[derive(Debug, Clone)]
pub struct MethodSymbol {
    pub file_id: FileId,
    pub decl: MethodDecl,
}

impl MethodSymbol {
    /// Stable symbol id within the snapshot: `file_id:byte_offset`.
    pub fn id(&self) -> String {
        format!("m{}:{}", self.file_id.0, self.decl.name_span.start)
    }
}

/// One reference occurrence, resolved to a document.
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    pub file_id: FileId,
    pub raw: RawReference,
}

/// References to a symbol, split by document.
///
/// The declaring document is kept apart because its call sites interact
/// with the declaration rewrite (a recursive call can sit inside the very
/// body being moved).
#[derive(Debug, Default)]
pub struct GroupedReferences {
    /// References in the symbol's own document.
    pub declaring: Vec<Reference>,
    /// References elsewhere, keyed by document for deterministic order.
    pub other: BTreeMap<FileId, Vec<Reference>>,
}

impl GroupedReferences {
    pub fn total(&self) -> usize {
        self.declaring.len() + self.other.values().map(Vec::len).sum::<usize>()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.declaring.iter().chain(self.other.values().flatten())
    }
}

/// Full-snapshot symbol index.
pub struct SymbolIndex {
    documents: BTreeMap<FileId, DocumentIndex>,
}

impl SymbolIndex {
    /// Parse every C# document in the snapshot.
    ///
    /// Fails on the first document that does not scan; a half-indexed
    /// project cannot give a trustworthy reference set.
    pub fn build(
        snapshot: &ProjectSnapshot,
        cancel: &CancellationToken,
    ) -> Result<SymbolIndex, SymbolError> {
        let mut documents = BTreeMap::new();
        for (file_id, doc) in snapshot.iter() {
            cancel.check()?;
            if Language::from_path(std::path::Path::new(&doc.path)) != Language::CSharp {
                continue;
            }
            let tokens = tokenize(&doc.text).map_err(|e| SymbolError::Parse {
                file: doc.path.clone(),
                source: ParseError::Scan(e),
            })?;
            let model = parse_source(&doc.text).map_err(|e| SymbolError::Parse {
                file: doc.path.clone(),
                source: e,
            })?;
            documents.insert(file_id, DocumentIndex { tokens, model });
        }
        debug!(documents = documents.len(), "symbol index built");
        Ok(SymbolIndex { documents })
    }

    /// Resolve the method declaration whose name identifier covers
    /// `location` (1-indexed line and byte column).
    pub fn resolve_method_at(
        &self,
        snapshot: &ProjectSnapshot,
        location: &Location,
    ) -> Option<MethodSymbol> {
        let file_id = snapshot.file_id(&location.file)?;
        let doc = snapshot.document(file_id)?;
        let offset = position_to_byte_offset(&doc.text, location.line, location.col) as u64;
        let index = self.documents.get(&file_id)?;
        index
            .model
            .methods
            .iter()
            .find(|m| m.name_span.contains_offset(offset) || m.name_span.end == offset)
            .map(|decl| MethodSymbol {
                file_id,
                decl: decl.clone(),
            })
    }

    /// Find a method by identity: document, containing type, and name.
    ///
    /// Used when a conversion must be re-located in a successor snapshot
    /// where byte offsets have shifted.
    pub fn find_method(
        &self,
        file_id: FileId,
        containing_type: &str,
        name: &str,
    ) -> Option<MethodSymbol> {
        let index = self.documents.get(&file_id)?;
        index
            .model
            .methods
            .iter()
            .find(|m| m.name == name && m.containing_type == containing_type)
            .map(|decl| MethodSymbol {
                file_id,
                decl: decl.clone(),
            })
    }

    /// Whether the method's containing type declares another member (method
    /// or property) with the same name.
    pub fn has_same_named_sibling(&self, symbol: &MethodSymbol) -> bool {
        let Some(index) = self.documents.get(&symbol.file_id) else {
            return false;
        };
        let methods = index
            .model
            .methods
            .iter()
            .filter(|m| {
                m.name == symbol.decl.name && m.containing_type == symbol.decl.containing_type
            })
            .count();
        let properties = index
            .model
            .properties
            .iter()
            .filter(|p| {
                p.name == symbol.decl.name && p.containing_type == symbol.decl.containing_type
            })
            .count();
        methods > 1 || properties > 0
    }

    /// Find a parameterless member outside the symbol's own type that
    /// shares its name.
    ///
    /// Reference scanning is lexical, so such a member makes every bare
    /// `Name()` site ambiguous: rewriting them would also strip the
    /// parentheses off calls to the other type's method. Returns the first
    /// conflicting declaration's name span.
    pub fn find_conflicting_declaration(&self, symbol: &MethodSymbol) -> Option<(FileId, Span)> {
        for (&file_id, index) in &self.documents {
            let same_type = |container: &str| {
                file_id == symbol.file_id && container == symbol.decl.containing_type
            };
            for m in &index.model.methods {
                if m.name == symbol.decl.name
                    && m.param_count == 0
                    && !same_type(&m.containing_type)
                {
                    return Some((file_id, m.name_span));
                }
            }
            for p in &index.model.properties {
                if p.name == symbol.decl.name && !same_type(&p.containing_type) {
                    return Some((file_id, p.name_span));
                }
            }
        }
        None
    }

    /// Find every reference to the symbol's name across the snapshot,
    /// grouped by document.
    ///
    /// `snapshot` must be the snapshot the index was built from; token
    /// spans index into its document texts.
    pub fn find_references(
        &self,
        snapshot: &ProjectSnapshot,
        symbol: &MethodSymbol,
        cancel: &CancellationToken,
    ) -> Result<GroupedReferences, Cancelled> {
        let mut grouped = GroupedReferences::default();
        for (&file_id, index) in &self.documents {
            cancel.check()?;
            let Some(doc) = snapshot.document(file_id) else {
                continue;
            };
            let skip = skip_spans(index, &symbol.decl.name);
            let raws =
                collect_name_references(&index.tokens, &doc.text, &symbol.decl.name, &skip);
            if raws.is_empty() {
                continue;
            }
            let refs: Vec<Reference> = raws
                .into_iter()
                .map(|raw| Reference { file_id, raw })
                .collect();
            if file_id == symbol.file_id {
                grouped.declaring = refs;
            } else {
                grouped.other.insert(file_id, refs);
            }
        }
        debug!(
            symbol = %symbol.decl.name,
            total = grouped.total(),
            "references collected"
        );
        Ok(grouped)
    }
}

/// Name spans that are declarations of `name`, never references:
/// same-named method and property declarations plus same-named type
/// declarations in this document.
fn skip_spans(index: &DocumentIndex, name: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    for m in &index.model.methods {
        if m.name == name {
            spans.push(m.name_span);
        }
    }
    for p in &index.model.properties {
        if p.name == name {
            spans.push(p.name_span);
        }
    }
    for t in &index.model.types {
        if t.name == name {
            spans.push(t.name_span);
        }
    }
    spans
}

/// Build a [`Location`] for a span inside a document.
pub fn span_location(path: &str, text: &str, span: Span) -> Location {
    let (line, col) = byte_offset_to_position(text, span.start as usize);
    Location::with_span(path, line, col, span.start, span.end)
}
