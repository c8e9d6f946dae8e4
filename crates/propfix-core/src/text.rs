//! Text position utilities for byte offset and line:column conversions.
//!
//! Coordinate conventions:
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Line/column values of 0 are clamped to 1
//!
//! Columns count UTF-8 bytes. C# sources are overwhelmingly ASCII in the
//! positions that matter here (declaration heads and call sites), and the
//! patch IR is byte-offset based, so byte columns keep the two systems
//! aligned without a separate char-based family.

// ============================================================================
// Byte-based Conversions
// ============================================================================

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds the content length, returns the position at the end
/// of the content.
pub fn byte_offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, byte) in content.bytes().enumerate() {
        if i >= offset {
            break;
        }
        if byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Convert 1-indexed line and column to a byte offset.
///
/// If the position is beyond the content, returns the content length; a
/// column past the end of its line is clamped to the line end.
pub fn position_to_byte_offset(content: &str, line: u32, col: u32) -> usize {
    let line = line.max(1);
    let col = col.max(1);

    let bytes = content.as_bytes();
    let mut current_line = 1u32;
    let mut i = 0usize;

    while i < bytes.len() {
        if current_line == line {
            let line_end = bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|p| i + p)
                .unwrap_or(bytes.len());
            let offset_in_line = (col as usize).saturating_sub(1);
            return i + offset_in_line.min(line_end - i);
        }
        if bytes[i] == b'\n' {
            current_line += 1;
        }
        i += 1;
    }

    // Line past end of content.
    content.len()
}

// ============================================================================
// Tests
// ============================================================================
