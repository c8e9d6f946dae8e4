//! Error types and error code constants for propfix.
//!
//! This module provides a unified error type (`PropfixError`) that bridges
//! domain-specific errors from the conversion engine into a common format
//! suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! Exit codes mirror the output codes:
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (symbol not found, file not found, reference
//!   shapes the engine refuses to rewrite)
//! - `4`: Apply errors (snapshot drift, conflicting edits, policy blocks)
//! - `10`: Internal errors (bugs, unexpected state, cancellation)
//!
//! ## Design
//!
//! - **Unified type**: `PropfixError` is the single error type for CLI output
//! - **Bridging**: `impl From<X> for PropfixError` bridges domain errors
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes

use std::fmt;

use thiserror::Error;

pub use crate::types::Location;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (symbol not found, file not found, unsafe reference).
    ResolutionError = 3,
    /// Apply errors (snapshot drift, conflicting edits, policy blocks).
    ApplyError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// This is the canonical error type that all subsystem errors are converted
/// to before being rendered as JSON output.
#[derive(Debug, Error)]
pub enum PropfixError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Symbol not found at the specified location.
    #[error("no method declaration found at {file}:{line}:{col}")]
    SymbolNotFound { file: String, line: u32, col: u32 },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// A document failed member scanning.
    #[error("parse error in {file}: {message}")]
    ParseError { file: String, message: String },

    /// A reference site uses the symbol in a way the rewriter cannot
    /// safely rewrite (delegate-style use).
    #[error("unsupported reference shape at {location}")]
    UnsupportedReference { location: Location },

    /// Another type declares a same-named member, so call sites cannot be
    /// attributed to the target symbol by name.
    #[error("ambiguous symbol '{name}': a same-named member is declared at {location}")]
    AmbiguousSymbol { name: String, location: Location },

    /// References exist outside the declaring document and the
    /// cross-document rewrite path is disabled.
    #[error("references in other documents are not supported: {}", files.join(", "))]
    CrossDocumentReferences { files: Vec<String> },

    /// Failed to apply changes.
    #[error("apply error: {message}")]
    ApplyError { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&PropfixError> for OutputErrorCode {
    fn from(err: &PropfixError) -> Self {
        match err {
            PropfixError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            PropfixError::SymbolNotFound { .. } => OutputErrorCode::ResolutionError,
            PropfixError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            PropfixError::ParseError { .. } => OutputErrorCode::ResolutionError,
            PropfixError::UnsupportedReference { .. } => OutputErrorCode::ResolutionError,
            PropfixError::AmbiguousSymbol { .. } => OutputErrorCode::ResolutionError,
            PropfixError::CrossDocumentReferences { .. } => OutputErrorCode::ApplyError,
            PropfixError::ApplyError { .. } => OutputErrorCode::ApplyError,
            PropfixError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<PropfixError> for OutputErrorCode {
    fn from(err: PropfixError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl PropfixError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        PropfixError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a symbol not found error.
    pub fn symbol_not_found(file: impl Into<String>, line: u32, col: u32) -> Self {
        PropfixError::SymbolNotFound {
            file: file.into(),
            line,
            col,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        PropfixError::FileNotFound { path: path.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        PropfixError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
