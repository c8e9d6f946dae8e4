//! Unified diff generation utilities.
//!
//! Provides functions to generate standard unified diff format from edit
//! information.

use std::collections::BTreeMap;

use crate::patch::OutputEdit;

/// Generate a unified diff from edit information.
///
/// Groups edits by file (in path order) and produces standard unified diff
/// format. Each edit is shown as a single-line change at its location.
pub fn generate_unified_diff(edits: &[OutputEdit]) -> String {
    let mut by_file: BTreeMap<&str, Vec<&OutputEdit>> = BTreeMap::new();
    for edit in edits {
        by_file.entry(&edit.file).or_default().push(edit);
    }

    let mut diff = String::new();
    for (file, file_edits) in by_file {
        diff.push_str(&format!("--- a/{}\n", file));
        diff.push_str(&format!("+++ b/{}\n", file));

        for edit in file_edits {
            diff.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                edit.line, 1, edit.line, 1
            ));
            diff.push_str(&format!("-{}\n", edit.old_text));
            diff.push_str(&format!("+{}\n", edit.new_text));
        }
    }

    diff
}

// ============================================================================
// Tests
// ============================================================================
