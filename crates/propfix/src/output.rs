//! JSON response envelopes for the CLI.
//!
//! Every command writes exactly one JSON object to stdout: a success
//! envelope, an "ineligible" envelope (a normal outcome, exit 0), or an
//! error envelope whose code doubles as the process exit code. Logs go to
//! stderr so stdout stays machine-readable.

use std::io::{self, Write};

use chrono::Utc;
use serde::Serialize;

use propfix_core::error::{OutputErrorCode, PropfixError};
use propfix_core::patch::MaterializedPatch;
use propfix_core::types::{Location, ReferenceInfo, SymbolInfo};
use propfix_csharp::eligibility::IneligibleReason;
use propfix_csharp::ops::convert::ConvertSummary;

/// Output schema version, bumped on breaking envelope changes.
pub const SCHEMA_VERSION: &str = "1";

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Serialize a response as pretty JSON followed by a newline.
pub fn emit_response<T: Serialize>(response: &T, out: &mut dyn Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(out, "{}", json)
}

// ============================================================================
// Success envelopes
// ============================================================================

/// One applied conversion inside a convert response.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub symbol: SymbolInfo,
    pub references: Vec<ReferenceInfo>,
    pub summary: ConvertSummary,
    pub patch: MaterializedPatch,
}

/// Response for the convert command.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResponse {
    /// "ok".
    pub status: String,
    pub schema_version: String,
    pub timestamp: String,
    /// Successor snapshot id.
    pub snapshot_id: String,
    pub conversions: Vec<ConversionResult>,
    /// Whether changes were written back to disk.
    pub applied: bool,
    /// Paths written, empty without `--apply`.
    pub modified_files: Vec<String>,
}

impl ConvertResponse {
    pub fn new(
        snapshot_id: impl Into<String>,
        conversions: Vec<ConversionResult>,
        applied: bool,
        modified_files: Vec<String>,
    ) -> Self {
        ConvertResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp: timestamp(),
            snapshot_id: snapshot_id.into(),
            conversions,
            applied,
            modified_files,
        }
    }
}

/// Response when the target method cannot become a property.
///
/// Exit code 0: nothing went wrong, the engine simply declines.
#[derive(Debug, Clone, Serialize)]
pub struct IneligibleResponse {
    /// "ineligible".
    pub status: String,
    pub schema_version: String,
    pub timestamp: String,
    pub symbol: SymbolInfo,
    pub reasons: Vec<IneligibleReason>,
}

impl IneligibleResponse {
    pub fn new(symbol: SymbolInfo, reasons: Vec<IneligibleReason>) -> Self {
        IneligibleResponse {
            status: "ineligible".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp: timestamp(),
            symbol,
            reasons,
        }
    }
}

/// Impact statistics for an analyze response.
#[derive(Debug, Clone, Serialize)]
pub struct Impact {
    pub reference_count: usize,
    pub file_count: usize,
}

/// Response for the analyze command.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    /// "ok".
    pub status: String,
    pub schema_version: String,
    pub timestamp: String,
    /// The analyzed snapshot's id.
    pub snapshot_id: String,
    pub symbol: SymbolInfo,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<IneligibleReason>,
    pub references: Vec<ReferenceInfo>,
    pub impact: Impact,
}

// ============================================================================
// Error envelope
// ============================================================================

/// Structured error detail inside an error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// Numeric error code; also the process exit code.
    pub code: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ErrorInfo {
    pub fn from_error(err: &PropfixError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();
        let (details, location) = match err {
            PropfixError::SymbolNotFound { file, line, col } => {
                (None, Some(Location::new(file.clone(), *line, *col)))
            }
            PropfixError::FileNotFound { path } => {
                (Some(serde_json::json!({ "path": path })), None)
            }
            PropfixError::ParseError { file, .. } => {
                (Some(serde_json::json!({ "file": file })), None)
            }
            PropfixError::UnsupportedReference { location } => (None, Some(location.clone())),
            PropfixError::AmbiguousSymbol { name, location } => (
                Some(serde_json::json!({ "name": name })),
                Some(location.clone()),
            ),
            PropfixError::CrossDocumentReferences { files } => {
                (Some(serde_json::json!({ "files": files })), None)
            }
            _ => (None, None),
        };
        ErrorInfo {
            code,
            message,
            details,
            location,
        }
    }
}

/// Top-level error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// "error".
    pub status: String,
    pub schema_version: String,
    pub timestamp: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn new(err: &PropfixError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp: timestamp(),
            error: ErrorInfo::from_error(err),
        }
    }
}
