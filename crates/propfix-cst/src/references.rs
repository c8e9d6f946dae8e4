//! Name-reference scanning over token streams.
//!
//! Given a member name and the spans of its declarations, find every other
//! occurrence of that identifier in a document and classify its shape. The
//! scan is purely lexical; semantic filtering (same-symbol checks, skipping
//! constructor calls of same-named types) is the resolver's job and is fed
//! in through `skip_spans`.

use propfix_core::patch::Span;

use crate::tokenizer::{Token, TokenKind};

/// The syntactic shape of a name reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// The name followed by an empty argument list: `Foo()`.
    Invocation,
    /// The bare name in any other position (delegate conversion, `nameof`,
    /// attribute argument), or a call buried in an interpolated-string
    /// hole where no span edit can reach it.
    NameOnly,
}

/// One occurrence of the target name.
#[derive(Debug, Clone, Copy)]
pub struct RawReference {
    /// Span of the name identifier itself.
    pub name_span: Span,
    /// For invocations: span from the end of the name through the `)`,
    /// covering the parentheses and any trivia between name and `(`.
    pub suffix_span: Option<Span>,
    pub kind: RefKind,
}

/// Collect every occurrence of `name` outside `skip_spans`.
///
/// `skip_spans` carries the name spans of declarations (the method itself,
/// same-named members, type names); occurrences inside any of them are not
/// references. A call with a non-empty argument list names a different
/// overload and is skipped entirely, as is a `new Name(..)` constructor
/// call. A call inside an interpolated-string hole is reported as
/// [`RefKind::NameOnly`] because no span edit can reach it.
pub fn collect_name_references(
    tokens: &[Token],
    source: &str,
    name: &str,
    skip_spans: &[Span],
) -> Vec<RawReference> {
    let mut refs = Vec::new();
    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind == TokenKind::Str {
            let text = tok.text(source);
            if text.starts_with('$') || text.starts_with("@$") {
                interpolation_hole_calls(tok, text, name, &mut refs);
            }
            continue;
        }
        if tok.kind != TokenKind::Ident || tok.text(source) != name {
            continue;
        }
        if skip_spans.iter().any(|s| s.contains(&tok.span)) {
            continue;
        }
        // `new Name(..)` constructs a same-named type, never calls the member.
        if i > 0
            && tokens[i - 1].kind == TokenKind::Ident
            && tokens[i - 1].text(source) == "new"
        {
            continue;
        }

        match invocation_suffix(tokens, i) {
            InvocationShape::Empty { close } => refs.push(RawReference {
                name_span: tok.span,
                suffix_span: Some(Span::new(tok.span.end, tokens[close].span.end)),
                kind: RefKind::Invocation,
            }),
            // Arguments mean a different arity, which is a different symbol.
            InvocationShape::WithArgs => {}
            InvocationShape::NotACall => refs.push(RawReference {
                name_span: tok.span,
                suffix_span: None,
                kind: RefKind::NameOnly,
            }),
        }
    }
    refs
}

/// Occurrences of `name(` inside an interpolated string literal.
///
/// Interpolation holes are not tokenized, so a call in one cannot be
/// rewritten as a span edit; it is reported as a bare-name use instead,
/// which lets the caller refuse the conversion rather than leave the hole
/// invoking a member that no longer exists.
fn interpolation_hole_calls(tok: &Token, text: &str, name: &str, refs: &mut Vec<RawReference>) {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(pos) = text[from..].find(name) {
        let start = from + pos;
        let end = start + name.len();
        from = start + 1;
        if start > 0 && is_ident_byte(bytes[start - 1]) {
            continue;
        }
        if end < bytes.len() && is_ident_byte(bytes[end]) {
            continue;
        }
        let mut after = end;
        while after < bytes.len() && (bytes[after] == b' ' || bytes[after] == b'\t') {
            after += 1;
        }
        if bytes.get(after) == Some(&b'(') {
            refs.push(RawReference {
                name_span: Span::new(
                    tok.span.start + start as u64,
                    tok.span.start + end as u64,
                ),
                suffix_span: None,
                kind: RefKind::NameOnly,
            });
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

enum InvocationShape {
    Empty { close: usize },
    WithArgs,
    NotACall,
}

fn invocation_suffix(tokens: &[Token], name_idx: usize) -> InvocationShape {
    match tokens.get(name_idx + 1) {
        Some(t) if t.kind == TokenKind::OpenParen => match tokens.get(name_idx + 2) {
            Some(t) if t.kind == TokenKind::CloseParen => {
                InvocationShape::Empty { close: name_idx + 2 }
            }
            Some(_) => InvocationShape::WithArgs,
            None => InvocationShape::NotACall,
        },
        _ => InvocationShape::NotACall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn scan(source: &str, name: &str, skip: &[Span]) -> Vec<RawReference> {
        let tokens = tokenize(source).unwrap();
        collect_name_references(&tokens, source, name, skip)
    }

    #[test]
    fn empty_call_is_invocation() {
        let source = "var x = Foo();";
        let refs = scan(source, "Foo", &[]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, RefKind::Invocation);
        let suffix = refs[0].suffix_span.unwrap();
        assert_eq!(suffix.text(source), "()");
    }

    #[test]
    fn suffix_span_covers_trivia_before_parens() {
        let source = "var x = obj.Foo ();";
        let refs = scan(source, "Foo", &[]);
        assert_eq!(refs[0].suffix_span.unwrap().text(source), " ()");
    }

    #[test]
    fn call_with_arguments_is_skipped() {
        let source = "Foo(1); Foo();";
        let refs = scan(source, "Foo", &[]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name_span.text(source), "Foo");
        assert_eq!(refs[0].name_span.start, 8);
    }

    #[test]
    fn bare_name_is_name_only() {
        let source = "Func<int> f = Foo;";
        let refs = scan(source, "Foo", &[]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, RefKind::NameOnly);
        assert!(refs[0].suffix_span.is_none());
    }

    #[test]
    fn constructor_call_of_same_named_type_is_skipped() {
        let source = "var a = new Foo(); var b = Foo();";
        let refs = scan(source, "Foo", &[]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name_span.start, 27);
    }

    #[test]
    fn skip_spans_exclude_declarations() {
        let source = "int Foo() => Foo();";
        let decl_name = Span::new(4, 7);
        let refs = scan(source, "Foo", &[decl_name]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name_span.start, 13);
    }

    #[test]
    fn names_inside_strings_are_not_references() {
        let source = "var s = \"Foo()\"; Foo();";
        let refs = scan(source, "Foo", &[]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name_span.start, 17);
    }

    #[test]
    fn call_in_interpolation_hole_is_name_only() {
        let source = "var s = $\"v={Foo()}\";";
        let refs = scan(source, "Foo", &[]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, RefKind::NameOnly);
        assert_eq!(refs[0].name_span.text(source), "Foo");
    }

    #[test]
    fn bare_name_in_interpolated_string_is_not_a_reference() {
        // Only `Name(` in a hole blocks; plain text mentioning the name
        // does not.
        let source = "var s = $\"Foo is {1}\";";
        let refs = scan(source, "Foo", &[]);
        assert!(refs.is_empty());
    }

    #[test]
    fn longer_identifier_in_hole_is_ignored() {
        let source = "var s = $\"v={FooBar()}\";";
        let refs = scan(source, "Foo", &[]);
        assert!(refs.is_empty());
    }

    #[test]
    fn other_identifiers_are_ignored() {
        let source = "Food(); FooBar(); Foo();";
        let refs = scan(source, "Foo", &[]);
        assert_eq!(refs.len(), 1);
    }
}
