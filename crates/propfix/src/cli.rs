//! Command implementations for the propfix binary.
//!
//! Each command loads the workspace into an immutable snapshot, runs the
//! operation, and emits a single JSON envelope on stdout. `convert` is a
//! dry run by default; `--apply` writes the successor snapshot's changed
//! documents back to disk.

use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use propfix_core::cancel::CancellationToken;
use propfix_core::error::PropfixError;
use propfix_core::snapshot::ProjectSnapshot;
use propfix_core::types::Location;

use propfix_csharp::ops::convert::{
    analyze, convert, convert_all, ConvertOutcome, ConvertReport,
};
use propfix_csharp::ops::ConvertOptions;

use crate::output::{
    emit_response, AnalyzeResponse, ConversionResult, ConvertResponse, Impact,
    IneligibleResponse, SCHEMA_VERSION,
};

/// Output format for the convert command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON envelope (default).
    Json,
    /// Unified diff only.
    Diff,
}

fn parse_location(at: &str) -> Result<Location, PropfixError> {
    Location::parse(at).ok_or_else(|| {
        PropfixError::invalid_args(format!(
            "invalid location '{}', expected path:line:col",
            at
        ))
    })
}

fn load_snapshot(root: &Path) -> Result<ProjectSnapshot, PropfixError> {
    let snapshot = ProjectSnapshot::load_dir(root)
        .map_err(|e| PropfixError::internal(format!("failed to read workspace: {}", e)))?;
    if snapshot.is_empty() {
        return Err(PropfixError::invalid_args(format!(
            "no C# documents under {}",
            root.display()
        )));
    }
    Ok(snapshot)
}

/// Write documents that differ between `before` and `after` back to disk.
fn write_changes(
    root: &Path,
    before: &ProjectSnapshot,
    after: &ProjectSnapshot,
) -> Result<Vec<String>, PropfixError> {
    let mut written = Vec::new();
    for (file_id, doc) in after.iter() {
        let unchanged = before
            .document(file_id)
            .is_some_and(|old| old.hash == doc.hash);
        if unchanged {
            continue;
        }
        let path = root.join(&doc.path);
        std::fs::write(&path, &doc.text).map_err(|e| PropfixError::ApplyError {
            message: format!("failed to write {}: {}", doc.path, e),
        })?;
        written.push(doc.path.clone());
    }
    info!(files = written.len(), "changes written");
    Ok(written)
}

/// `propfix convert --at <loc> [--at <loc>...] [--apply]`.
pub fn execute_convert(
    root: &Path,
    at: &[String],
    apply: bool,
    cross_document: bool,
    format: OutputFormat,
) -> Result<(), PropfixError> {
    let locations = at
        .iter()
        .map(|s| parse_location(s))
        .collect::<Result<Vec<_>, _>>()?;
    let snapshot = load_snapshot(root)?;
    let options = ConvertOptions { cross_document };
    let cancel = CancellationToken::new();

    let (reports, successor) = if let [location] = locations.as_slice() {
        match convert(&snapshot, location, &options, &cancel)? {
            ConvertOutcome::Converted { report, snapshot } => (vec![*report], snapshot),
            ConvertOutcome::Ineligible { symbol, reasons } => {
                let response = IneligibleResponse::new(symbol, reasons);
                emit_response(&response, &mut io::stdout())
                    .map_err(|e| PropfixError::internal(e.to_string()))?;
                return Ok(());
            }
        }
    } else {
        let batch = convert_all(&snapshot, &locations, &options, &cancel)?;
        (batch.reports, batch.snapshot)
    };

    let modified_files = if apply {
        write_changes(root, &snapshot, &successor)?
    } else {
        Vec::new()
    };

    match format {
        OutputFormat::Json => {
            let conversions = reports.into_iter().map(conversion_result).collect();
            let response = ConvertResponse::new(
                successor.id().to_string(),
                conversions,
                apply,
                modified_files,
            );
            emit_response(&response, &mut io::stdout())
                .map_err(|e| PropfixError::internal(e.to_string()))?;
        }
        OutputFormat::Diff => {
            let mut out = io::stdout();
            for report in &reports {
                out.write_all(report.patch.unified_diff.as_bytes())
                    .map_err(|e| PropfixError::internal(e.to_string()))?;
            }
        }
    }
    Ok(())
}

/// `propfix analyze --at <loc>`.
pub fn execute_analyze(root: &Path, at: &str) -> Result<(), PropfixError> {
    let location = parse_location(at)?;
    let snapshot = load_snapshot(root)?;
    let report = analyze(&snapshot, &location, &CancellationToken::new())?;

    let file_count = report
        .references
        .iter()
        .map(|r| r.location.file.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let response = AnalyzeResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        snapshot_id: snapshot.id().to_string(),
        symbol: report.symbol,
        eligible: report.eligible,
        reasons: report.reasons,
        impact: Impact {
            reference_count: report.references.len(),
            file_count,
        },
        references: report.references,
    };
    emit_response(&response, &mut io::stdout())
        .map_err(|e| PropfixError::internal(e.to_string()))?;
    Ok(())
}

fn conversion_result(report: ConvertReport) -> ConversionResult {
    ConversionResult {
        symbol: report.symbol,
        references: report.references,
        summary: report.summary,
        patch: report.patch,
    }
}
