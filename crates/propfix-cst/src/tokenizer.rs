//! Lossless tokenizer for C# source text.
//!
//! Produces the significant tokens of a document as byte spans over the
//! original text. Whitespace, comments, and preprocessor directives are
//! trivia: they are skipped for grammar purposes but never removed from the
//! text, so any rewrite expressed as span edits preserves formatting
//! exactly. The gaps between consecutive token spans are, by construction,
//! pure trivia.
//!
//! This is a member-level scanner, not a full C# lexer: every construct is
//! tokenized soundly (strings, verbatim/interpolated strings, char
//! literals, comments, nested braces), but multi-character operators other
//! than `=>` and `==` are emitted as single-character punctuation, which is
//! all the member grammar needs.

use propfix_core::patch::Span;
use thiserror::Error;

// ============================================================================
// Token model
// ============================================================================

/// The kind of a significant token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (keywords are classified by text).
    Ident,
    /// Numeric literal.
    Number,
    /// String literal (regular, verbatim, or interpolated).
    Str,
    /// Character literal.
    Char,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Semicolon,
    Comma,
    Dot,
    Colon,
    /// `=>`
    Arrow,
    /// `=`
    Assign,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// Any other operator character (or `==`).
    Punct,
}

/// A significant token: kind plus byte span into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Slice this token's text out of the source.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// Tokenizer errors. The scanner is permissive; only constructs that leave
/// it without a resynchronization point are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("unterminated {what} starting at byte {offset}")]
    Unterminated { what: &'static str, offset: u64 },
}

// ============================================================================
// Keyword classification
// ============================================================================

/// Member modifiers, including contextual ones (`async`, `partial`).
const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "abstract", "virtual", "override",
    "sealed", "extern", "unsafe", "new", "async", "partial", "readonly",
];

/// Whether `text` is a member modifier keyword.
pub fn is_modifier(text: &str) -> bool {
    MODIFIERS.contains(&text)
}

/// Whether `text` opens a type declaration.
pub fn is_type_keyword(text: &str) -> bool {
    matches!(text, "class" | "struct" | "interface")
}

// ============================================================================
// Scanner
// ============================================================================

/// Tokenize a document into significant tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScanError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,

            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let start = i;
                i += 2;
                loop {
                    if i + 1 >= bytes.len() {
                        return Err(ScanError::Unterminated {
                            what: "block comment",
                            offset: start as u64,
                        });
                    }
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }

            // Preprocessor directive: trivia to end of line.
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }

            b'"' => {
                let start = i;
                i = scan_regular_string(bytes, i)?;
                push(&mut tokens, TokenKind::Str, start, i);
            }

            b'@' => {
                let start = i;
                if bytes.get(i + 1) == Some(&b'"') {
                    i = scan_verbatim_string(bytes, i + 1, start)?;
                    push(&mut tokens, TokenKind::Str, start, i);
                } else if bytes.get(i + 1) == Some(&b'$') && bytes.get(i + 2) == Some(&b'"') {
                    i = scan_verbatim_string(bytes, i + 2, start)?;
                    push(&mut tokens, TokenKind::Str, start, i);
                } else if bytes.get(i + 1).is_some_and(|&b| is_ident_start(b)) {
                    // Verbatim identifier: @class
                    i += 2;
                    while i < bytes.len() && is_ident_continue(bytes[i]) {
                        i += 1;
                    }
                    push(&mut tokens, TokenKind::Ident, start, i);
                } else {
                    i += 1;
                    push(&mut tokens, TokenKind::Punct, start, i);
                }
            }

            b'$' => {
                let start = i;
                if bytes.get(i + 1) == Some(&b'"') {
                    i = scan_interpolated_string(bytes, i, start)?;
                    push(&mut tokens, TokenKind::Str, start, i);
                } else if bytes.get(i + 1) == Some(&b'@') && bytes.get(i + 2) == Some(&b'"') {
                    i = scan_verbatim_string(bytes, i + 2, start)?;
                    push(&mut tokens, TokenKind::Str, start, i);
                } else {
                    i += 1;
                    push(&mut tokens, TokenKind::Punct, start, i);
                }
            }

            b'\'' => {
                let start = i;
                i += 1;
                if bytes.get(i) == Some(&b'\\') {
                    i += 2; // escape plus escaped byte
                }
                while i < bytes.len() && bytes[i] != b'\'' && bytes[i] != b'\n' {
                    i += 1;
                }
                if i >= bytes.len() || bytes[i] != b'\'' {
                    return Err(ScanError::Unterminated {
                        what: "character literal",
                        offset: start as u64,
                    });
                }
                i += 1;
                push(&mut tokens, TokenKind::Char, start, i);
            }

            _ if is_ident_start(b) => {
                let start = i;
                i += 1;
                while i < bytes.len() && is_ident_continue(bytes[i]) {
                    i += 1;
                }
                push(&mut tokens, TokenKind::Ident, start, i);
            }

            _ if b.is_ascii_digit() => {
                let start = i;
                i += 1;
                while i < bytes.len() {
                    let c = bytes[i];
                    if is_ident_continue(c) {
                        i += 1;
                    } else if c == b'.' && bytes.get(i + 1).is_some_and(|d| d.is_ascii_digit()) {
                        i += 2;
                    } else {
                        break;
                    }
                }
                push(&mut tokens, TokenKind::Number, start, i);
            }

            b'=' => {
                let start = i;
                match bytes.get(i + 1) {
                    Some(&b'>') => {
                        i += 2;
                        push(&mut tokens, TokenKind::Arrow, start, i);
                    }
                    Some(&b'=') => {
                        i += 2;
                        push(&mut tokens, TokenKind::Punct, start, i);
                    }
                    _ => {
                        i += 1;
                        push(&mut tokens, TokenKind::Assign, start, i);
                    }
                }
            }

            _ => {
                let kind = match b {
                    b'(' => TokenKind::OpenParen,
                    b')' => TokenKind::CloseParen,
                    b'{' => TokenKind::OpenBrace,
                    b'}' => TokenKind::CloseBrace,
                    b'[' => TokenKind::OpenBracket,
                    b']' => TokenKind::CloseBracket,
                    b';' => TokenKind::Semicolon,
                    b',' => TokenKind::Comma,
                    b'.' => TokenKind::Dot,
                    b':' => TokenKind::Colon,
                    b'<' => TokenKind::Lt,
                    b'>' => TokenKind::Gt,
                    _ => TokenKind::Punct,
                };
                push(&mut tokens, kind, i, i + 1);
                i += 1;
            }
        }
    }

    Ok(tokens)
}

fn push(tokens: &mut Vec<Token>, kind: TokenKind, start: usize, end: usize) {
    tokens.push(Token {
        kind,
        span: Span::new(start as u64, end as u64),
    });
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scan a regular string literal starting at the opening quote.
/// Returns the offset just past the closing quote.
fn scan_regular_string(bytes: &[u8], start: usize) -> Result<usize, ScanError> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Ok(i + 1),
            b'\n' => break,
            _ => i += 1,
        }
    }
    Err(ScanError::Unterminated {
        what: "string literal",
        offset: start as u64,
    })
}

/// Scan a verbatim string whose opening quote is at `quote`; `""` is the
/// only escape. Returns the offset just past the closing quote.
fn scan_verbatim_string(bytes: &[u8], quote: usize, start: usize) -> Result<usize, ScanError> {
    let mut i = quote + 1;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                i += 2;
            } else {
                return Ok(i + 1);
            }
        } else {
            i += 1;
        }
    }
    Err(ScanError::Unterminated {
        what: "verbatim string",
        offset: start as u64,
    })
}

/// Scan an interpolated string (`$"..."`) starting at the `$`.
///
/// Interpolation holes are skipped with brace counting; nested regular
/// strings inside holes are skipped as strings. Returns the offset just
/// past the closing quote. Call sites inside interpolation holes are
/// opaque to the member grammar.
fn scan_interpolated_string(bytes: &[u8], start: usize, err_at: usize) -> Result<usize, ScanError> {
    let mut i = start + 2; // past $"
    let mut hole_depth = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if hole_depth == 0 => i += 2,
            b'{' if hole_depth == 0 && bytes.get(i + 1) == Some(&b'{') => i += 2,
            b'}' if hole_depth == 0 && bytes.get(i + 1) == Some(&b'}') => i += 2,
            b'{' => {
                hole_depth += 1;
                i += 1;
            }
            b'}' if hole_depth > 0 => {
                hole_depth -= 1;
                i += 1;
            }
            b'"' if hole_depth == 0 => return Ok(i + 1),
            b'"' => {
                // Nested string inside a hole.
                i = scan_regular_string(bytes, i)?;
            }
            _ => i += 1,
        }
    }
    Err(ScanError::Unterminated {
        what: "interpolated string",
        offset: err_at as u64,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .iter()
            .map(|t| t.text(source).to_string())
            .collect()
    }

    #[test]
    fn simple_method_head() {
        assert_eq!(
            kinds("int Foo()"),
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::OpenParen,
                TokenKind::CloseParen
            ]
        );
    }

    #[test]
    fn arrow_is_one_token() {
        let k = kinds("int Foo() => 42;");
        assert!(k.contains(&TokenKind::Arrow));
        assert_eq!(texts("a => b")[1], "=>");
    }

    #[test]
    fn equality_is_not_assign() {
        let k = kinds("a == b = c");
        assert_eq!(
            k,
            vec![
                TokenKind::Ident,
                TokenKind::Punct,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Ident
            ]
        );
    }

    #[test]
    fn comments_and_directives_are_trivia() {
        let source = "// comment\n#region X\nint /* inline */ Foo\n#endregion\n";
        assert_eq!(texts(source), vec!["int", "Foo"]);
    }

    #[test]
    fn strings_are_single_tokens() {
        let source = r#"Log("a (not) call { }");"#;
        let k = kinds(source);
        assert_eq!(
            k,
            vec![
                TokenKind::Ident,
                TokenKind::OpenParen,
                TokenKind::Str,
                TokenKind::CloseParen,
                TokenKind::Semicolon
            ]
        );
    }

    #[test]
    fn verbatim_string_with_quote_escape() {
        let source = "var s = @\"line \"\" one\";";
        let toks = tokenize(source).unwrap();
        let strs: Vec<&Token> = toks.iter().filter(|t| t.kind == TokenKind::Str).collect();
        assert_eq!(strs.len(), 1);
        assert_eq!(strs[0].text(source), "@\"line \"\" one\"");
    }

    #[test]
    fn interpolated_string_with_hole() {
        let source = "var s = $\"total {Total()} done\";";
        let toks = tokenize(source).unwrap();
        let strs: Vec<&Token> = toks.iter().filter(|t| t.kind == TokenKind::Str).collect();
        assert_eq!(strs.len(), 1);
        assert_eq!(strs[0].text(source), "$\"total {Total()} done\"");
    }

    #[test]
    fn char_literal_with_escape() {
        let source = "var c = '\\'';";
        let toks = tokenize(source).unwrap();
        assert!(toks.iter().any(|t| t.kind == TokenKind::Char));
    }

    #[test]
    fn verbatim_identifier() {
        assert_eq!(texts("int @class;"), vec!["int", "@class", ";"]);
    }

    #[test]
    fn numbers_with_suffixes_and_dots() {
        assert_eq!(texts("1_000 0xFF 3.14f"), vec!["1_000", "0xFF", "3.14f"]);
    }

    #[test]
    fn unterminated_block_comment_errors() {
        assert_eq!(
            tokenize("int x; /* open"),
            Err(ScanError::Unterminated {
                what: "block comment",
                offset: 7
            })
        );
    }

    #[test]
    fn unterminated_string_errors() {
        assert!(matches!(
            tokenize("var s = \"open\n"),
            Err(ScanError::Unterminated { .. })
        ));
    }

    #[test]
    fn spans_index_back_into_source() {
        let source = "  int  Foo ( ) ;";
        for tok in tokenize(source).unwrap() {
            // Every token's span slices cleanly out of the original text.
            assert!(!tok.text(source).is_empty());
            assert!(!tok.text(source).contains(' '));
        }
    }

    #[test]
    fn modifier_classification() {
        assert!(is_modifier("public"));
        assert!(is_modifier("async"));
        assert!(!is_modifier("void"));
        assert!(is_type_keyword("interface"));
        assert!(!is_type_keyword("enum"));
    }
}
