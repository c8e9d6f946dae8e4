//! Member-level syntax model for C# documents.
//!
//! [`parse_source`] scans a document's token stream and produces a
//! [`SourceModel`]: every method declaration (with its body shape and the
//! spans needed to rewrite it), every property signature, and every type
//! declaration name. The scanner is tolerant: constructs it does not model
//! (fields, events, operators, indexers, enums, records) are skipped by
//! balanced-token jumps without being recorded.
//!
//! Nodes are immutable values over the original text; all "editing" happens
//! downstream as span edits, so a node is never mutated in place.

use propfix_core::patch::Span;
use thiserror::Error;

use crate::tokenizer::{is_modifier, is_type_keyword, tokenize, ScanError, Token, TokenKind};

// ============================================================================
// Node types
// ============================================================================

/// The kind of type declaration containing a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
}

impl TypeKind {
    fn from_keyword(text: &str) -> Option<TypeKind> {
        match text {
            "class" => Some(TypeKind::Class),
            "struct" => Some(TypeKind::Struct),
            "interface" => Some(TypeKind::Interface),
            _ => None,
        }
    }
}

/// The body shape of a method declaration.
///
/// Exactly one of the three shapes holds for any declaration; the parser is
/// total over them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// Block body; span covers `{` through `}` inclusive.
    Block { body_span: Span },
    /// Expression body; span covers the expression after `=>`, exclusive of
    /// the terminating `;`.
    Expression { expr_span: Span },
    /// No body (abstract method or interface member), `;` terminated.
    None,
}

/// A method declaration node.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Member name.
    pub name: String,
    /// Span of the name identifier.
    pub name_span: Span,
    /// Span of the return type (from the end of the modifiers to the start
    /// of the name; includes trailing trivia).
    pub return_type_span: Span,
    /// Modifier keywords, in source order.
    pub modifiers: Vec<String>,
    /// Number of formal parameters.
    pub param_count: usize,
    /// Whether the method declares its own type parameters.
    pub is_generic: bool,
    /// Body shape (exactly one of block / expression / none).
    pub body: BodyShape,
    /// Span from `(` through `)` inclusive.
    pub parens_span: Span,
    /// Full declaration span, from the first modifier or return-type token
    /// through the body's `}` or the terminating `;`.
    pub decl_span: Span,
    /// Name of the containing type.
    pub containing_type: String,
    /// Kind of the containing type.
    pub containing_type_kind: TypeKind,
}

impl MethodDecl {
    /// Whether the declaration carries the `async` modifier.
    pub fn is_async(&self) -> bool {
        self.modifiers.iter().any(|m| m == "async")
    }

    /// The return type as written, trimmed of surrounding trivia.
    pub fn return_type_text<'a>(&self, source: &'a str) -> &'a str {
        self.return_type_span.text(source).trim()
    }

    /// Whether the return type is `void`.
    pub fn returns_void(&self, source: &str) -> bool {
        let text = self.return_type_text(source);
        text == "void" || text.starts_with("void ")
    }
}

/// Signature of an existing property declaration.
///
/// Recorded so that the resolver can tell properties apart from methods
/// (a property is never a conversion candidate) and exclude their name
/// identifiers from reference scans.
#[derive(Debug, Clone)]
pub struct PropertySig {
    pub name: String,
    pub name_span: Span,
    pub containing_type: String,
}

/// A type declaration name, recorded so reference scans can exclude
/// constructor-like uses of same-named types.
#[derive(Debug, Clone)]
pub struct TypeName {
    pub name: String,
    pub name_span: Span,
}

/// Everything the member scanner extracts from one document.
#[derive(Debug, Clone, Default)]
pub struct SourceModel {
    pub methods: Vec<MethodDecl>,
    pub properties: Vec<PropertySig>,
    pub types: Vec<TypeName>,
}

// ============================================================================
// Built property nodes
// ============================================================================

/// The get accessor of a built property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// `{ get <body> }` where `<body>` is the original block, verbatim.
    BlockGet { body: String },
    /// Property-level expression body; the expression stays in place in the
    /// document, so the rendered tail is empty.
    ExpressionGet,
    /// `{ get; }` for abstract/interface members.
    BodilessGet,
}

/// A property declaration built from an eligible method.
///
/// Carries exactly one get accessor and never a set accessor. Name, return
/// type, modifiers, and leading trivia are preserved in the document by
/// span arithmetic; the node only renders what changes after the name.
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: String,
    pub accessor: Accessor,
}

impl PropertyDecl {
    /// Render the text that replaces the method's parameter list and body,
    /// given the original trivia between `)` and the body (`lead`).
    pub fn render_tail(&self, lead: &str) -> String {
        match &self.accessor {
            Accessor::BlockGet { body } => format!("{}{{ get {} }}", lead, body),
            Accessor::ExpressionGet => String::new(),
            Accessor::BodilessGet => " { get; }".to_string(),
        }
    }
}

// ============================================================================
// Parse errors
// ============================================================================

/// Errors from member scanning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("unbalanced delimiters at byte {offset}")]
    Unbalanced { offset: u64 },
}

// ============================================================================
// Member scanner
// ============================================================================

/// Parse a document into its member model.
pub fn parse_source(source: &str) -> Result<SourceModel, ParseError> {
    let tokens = tokenize(source)?;
    let mut scanner = MemberScanner {
        source,
        tokens: &tokens,
        pos: 0,
        scopes: Vec::new(),
        model: SourceModel::default(),
    };
    scanner.run()?;
    Ok(scanner.model)
}

#[derive(Debug, Clone)]
enum Scope {
    Namespace,
    Type { name: String, kind: TypeKind },
}

struct MemberScanner<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    scopes: Vec<Scope>,
    model: SourceModel,
}

impl<'a> MemberScanner<'a> {
    fn run(&mut self) -> Result<(), ParseError> {
        while self.pos < self.tokens.len() {
            let tok = self.tokens[self.pos];
            if tok.kind == TokenKind::CloseBrace {
                self.scopes.pop();
                self.pos += 1;
                continue;
            }

            if let Some(Scope::Type { name, kind }) = self.scopes.last().cloned() {
                self.parse_member(&name, kind)?;
                continue;
            }

            match tok.kind {
                TokenKind::Ident => match tok.text(self.source) {
                    "namespace" => self.parse_namespace(),
                    "using" => self.skip_through(TokenKind::Semicolon),
                    "delegate" => self.skip_through(TokenKind::Semicolon),
                    "enum" => self.skip_enum()?,
                    kw if is_type_keyword(kw) => self.parse_type_header()?,
                    _ => self.pos += 1, // modifiers before a type keyword, etc.
                },
                TokenKind::OpenBracket => {
                    // Assembly/type-level attribute list.
                    let close = self.find_matching(
                        self.pos,
                        TokenKind::OpenBracket,
                        TokenKind::CloseBracket,
                    )?;
                    self.pos = close + 1;
                }
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    /// `namespace A.B {` or file-scoped `namespace A.B;`.
    fn parse_namespace(&mut self) {
        self.pos += 1;
        while self.pos < self.tokens.len() {
            match self.tokens[self.pos].kind {
                TokenKind::Ident | TokenKind::Dot => self.pos += 1,
                TokenKind::OpenBrace => {
                    self.scopes.push(Scope::Namespace);
                    self.pos += 1;
                    return;
                }
                TokenKind::Semicolon => {
                    // File-scoped namespace: no new brace scope.
                    self.pos += 1;
                    return;
                }
                _ => return,
            }
        }
    }

    /// `class|struct|interface Name<...> : Base, IFace where ... {`
    fn parse_type_header(&mut self) -> Result<(), ParseError> {
        let kind = TypeKind::from_keyword(self.tokens[self.pos].text(self.source))
            .expect("caller checked type keyword");
        self.pos += 1;

        let Some(&name_tok) = self.tokens.get(self.pos) else {
            return Ok(());
        };
        if name_tok.kind != TokenKind::Ident {
            return Ok(());
        }
        let name = name_tok.text(self.source).to_string();
        self.model.types.push(TypeName {
            name: name.clone(),
            name_span: name_tok.span,
        });
        self.pos += 1;

        // Skip generic parameters, base list, and constraints.
        while self.pos < self.tokens.len() {
            match self.tokens[self.pos].kind {
                TokenKind::OpenBrace => {
                    self.scopes.push(Scope::Type { name, kind });
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::Semicolon => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    /// Parse one member of the innermost type scope.
    fn parse_member(&mut self, type_name: &str, type_kind: TypeKind) -> Result<(), ParseError> {
        // Leading attributes stay outside the declaration span.
        while self.at_kind(TokenKind::OpenBracket) {
            let close =
                self.find_matching(self.pos, TokenKind::OpenBracket, TokenKind::CloseBracket)?;
            self.pos = close + 1;
        }

        let Some(&first) = self.tokens.get(self.pos) else {
            return Ok(());
        };

        if first.kind == TokenKind::Ident {
            match first.text(self.source) {
                kw if is_type_keyword(kw) => return self.parse_type_header(),
                "enum" => return self.skip_enum(),
                "delegate" => {
                    self.skip_through(TokenKind::Semicolon);
                    return Ok(());
                }
                "event" => {
                    self.skip_event()?;
                    return Ok(());
                }
                _ => {}
            }
        }

        let head_start = self.pos;
        while self.pos < self.tokens.len() {
            let tok = self.tokens[self.pos];
            match tok.kind {
                TokenKind::OpenParen => {
                    return self.parse_method_like(head_start, self.pos, type_name, type_kind);
                }
                TokenKind::OpenBrace => {
                    self.record_property(head_start, self.pos, type_name);
                    let close =
                        self.find_matching(self.pos, TokenKind::OpenBrace, TokenKind::CloseBrace)?;
                    self.pos = close + 1;
                    // Expression-bodied auto-property initializer or trailing `;`.
                    if self.at_kind(TokenKind::Assign) {
                        self.skip_balanced_through_semicolon();
                    } else if self.at_kind(TokenKind::Semicolon) {
                        self.pos += 1;
                    }
                    return Ok(());
                }
                TokenKind::Arrow => {
                    self.record_property(head_start, self.pos, type_name);
                    self.pos += 1;
                    self.skip_balanced_through_semicolon();
                    return Ok(());
                }
                TokenKind::Assign => {
                    // Field with initializer.
                    self.skip_balanced_through_semicolon();
                    return Ok(());
                }
                TokenKind::Semicolon => {
                    // Plain field declaration.
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::Lt => {
                    // Generic segment inside the head (return type or the
                    // method's own type parameters).
                    match self.find_matching_angle(self.pos) {
                        Some(close) => self.pos = close + 1,
                        None => self.pos += 1,
                    }
                }
                TokenKind::CloseBrace => return Ok(()), // malformed member; let run() pop
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    /// Classify and record a method-like member whose `(` is at `paren_open`.
    fn parse_method_like(
        &mut self,
        head_start: usize,
        paren_open: usize,
        type_name: &str,
        type_kind: TypeKind,
    ) -> Result<(), ParseError> {
        let paren_close =
            self.find_matching(paren_open, TokenKind::OpenParen, TokenKind::CloseParen)?;

        // Locate the name, stepping back over the method's own `<...>`.
        let mut is_generic = false;
        let mut name_idx = paren_open.checked_sub(1);
        if let Some(i) = name_idx {
            if self.tokens[i].kind == TokenKind::Gt {
                is_generic = true;
                name_idx = self.rfind_matching_angle(i, head_start).and_then(|lt| lt.checked_sub(1));
            }
        }
        let name_tok = match name_idx {
            Some(i) if i >= head_start && self.tokens[i].kind == TokenKind::Ident => self.tokens[i],
            _ => {
                // Operator, conversion, or something else we do not model.
                self.pos = paren_close + 1;
                self.skip_member_tail()?;
                return Ok(());
            }
        };
        let name_end = name_idx.expect("checked above");

        // Modifier prefix, then return type up to the name.
        let mut idx = head_start;
        let mut modifiers = Vec::new();
        while idx < name_end
            && self.tokens[idx].kind == TokenKind::Ident
            && is_modifier(self.tokens[idx].text(self.source))
        {
            modifiers.push(self.tokens[idx].text(self.source).to_string());
            idx += 1;
        }
        if idx >= name_end {
            // No return type: constructor (or malformed). Not a method.
            self.pos = paren_close + 1;
            self.skip_member_tail()?;
            return Ok(());
        }
        let return_type_span = Span::new(
            self.tokens[idx].span.start,
            name_tok.span.start,
        );

        let param_count = self.count_params(paren_open, paren_close);
        let parens_span = Span::new(
            self.tokens[paren_open].span.start,
            self.tokens[paren_close].span.end,
        );

        // Body shape: first of `{`, `=>`, `;` after the parameter list
        // (stepping over any `where` constraints).
        self.pos = paren_close + 1;
        let (body, decl_end) = loop {
            let Some(&tok) = self.tokens.get(self.pos) else {
                // Truncated declaration; drop it.
                return Ok(());
            };
            match tok.kind {
                TokenKind::OpenBrace => {
                    let close =
                        self.find_matching(self.pos, TokenKind::OpenBrace, TokenKind::CloseBrace)?;
                    let body_span =
                        Span::new(tok.span.start, self.tokens[close].span.end);
                    self.pos = close + 1;
                    break (BodyShape::Block { body_span }, body_span.end);
                }
                TokenKind::Arrow => {
                    self.pos += 1;
                    let Some((expr_span, semi_end)) = self.scan_expression_body() else {
                        return Ok(());
                    };
                    break (BodyShape::Expression { expr_span }, semi_end);
                }
                TokenKind::Semicolon => {
                    self.pos += 1;
                    break (BodyShape::None, tok.span.end);
                }
                TokenKind::CloseBrace => return Ok(()), // malformed; let run() pop
                _ => self.pos += 1,
            }
        };

        self.model.methods.push(MethodDecl {
            name: name_tok.text(self.source).to_string(),
            name_span: name_tok.span,
            return_type_span,
            modifiers,
            param_count,
            is_generic,
            body,
            parens_span,
            decl_span: Span::new(self.tokens[head_start].span.start, decl_end),
            containing_type: type_name.to_string(),
            containing_type_kind: type_kind,
        });
        Ok(())
    }

    /// Record a property signature whose head ends just before `end_idx`.
    fn record_property(&mut self, head_start: usize, end_idx: usize, type_name: &str) {
        let Some(i) = end_idx.checked_sub(1) else {
            return;
        };
        if i < head_start {
            return;
        }
        let tok = self.tokens[i];
        if tok.kind != TokenKind::Ident {
            return; // indexer (`this[..]`) or malformed
        }
        self.model.properties.push(PropertySig {
            name: tok.text(self.source).to_string(),
            name_span: tok.span,
            containing_type: type_name.to_string(),
        });
    }

    /// After a non-modeled member's `)`: skip to past its body or `;`.
    fn skip_member_tail(&mut self) -> Result<(), ParseError> {
        while let Some(&tok) = self.tokens.get(self.pos) {
            match tok.kind {
                TokenKind::OpenBrace => {
                    let close =
                        self.find_matching(self.pos, TokenKind::OpenBrace, TokenKind::CloseBrace)?;
                    self.pos = close + 1;
                    return Ok(());
                }
                TokenKind::Arrow => {
                    self.pos += 1;
                    self.skip_balanced_through_semicolon();
                    return Ok(());
                }
                TokenKind::Semicolon => {
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::CloseBrace => return Ok(()),
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    /// Scan an expression body after `=>`: returns (expression span, end of
    /// the terminating semicolon).
    fn scan_expression_body(&mut self) -> Option<(Span, u64)> {
        let first = self.pos;
        let mut depth = 0i32;
        while let Some(&tok) = self.tokens.get(self.pos) {
            match tok.kind {
                TokenKind::OpenParen | TokenKind::OpenBrace | TokenKind::OpenBracket => depth += 1,
                TokenKind::CloseParen | TokenKind::CloseBrace | TokenKind::CloseBracket => {
                    depth -= 1
                }
                TokenKind::Semicolon if depth == 0 => {
                    if self.pos == first {
                        return None; // `=> ;` is not a thing
                    }
                    let expr_span = Span::new(
                        self.tokens[first].span.start,
                        self.tokens[self.pos - 1].span.end,
                    );
                    let semi_end = tok.span.end;
                    self.pos += 1;
                    return Some((expr_span, semi_end));
                }
                _ => {}
            }
            self.pos += 1;
        }
        None
    }

    /// `enum X { ... }` — skip entirely.
    fn skip_enum(&mut self) -> Result<(), ParseError> {
        while let Some(&tok) = self.tokens.get(self.pos) {
            if tok.kind == TokenKind::OpenBrace {
                let close =
                    self.find_matching(self.pos, TokenKind::OpenBrace, TokenKind::CloseBrace)?;
                self.pos = close + 1;
                return Ok(());
            }
            self.pos += 1;
        }
        Ok(())
    }

    /// `event T Name;` or `event T Name { add {..} remove {..} }`.
    fn skip_event(&mut self) -> Result<(), ParseError> {
        while let Some(&tok) = self.tokens.get(self.pos) {
            match tok.kind {
                TokenKind::Semicolon => {
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::OpenBrace => {
                    let close =
                        self.find_matching(self.pos, TokenKind::OpenBrace, TokenKind::CloseBrace)?;
                    self.pos = close + 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    /// Skip to past the next `;` at delimiter depth zero.
    fn skip_balanced_through_semicolon(&mut self) {
        let mut depth = 0i32;
        while let Some(&tok) = self.tokens.get(self.pos) {
            match tok.kind {
                TokenKind::OpenParen | TokenKind::OpenBrace | TokenKind::OpenBracket => depth += 1,
                TokenKind::CloseParen | TokenKind::CloseBrace | TokenKind::CloseBracket => {
                    depth -= 1
                }
                TokenKind::Semicolon if depth <= 0 => {
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Skip to past the next token of `kind` (flat scan, used for `using`
    /// and `delegate` directives where no nesting occurs before the `;`).
    fn skip_through(&mut self, kind: TokenKind) {
        while let Some(&tok) = self.tokens.get(self.pos) {
            self.pos += 1;
            if tok.kind == kind {
                return;
            }
        }
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.tokens.get(self.pos).map(|t| t.kind) == Some(kind)
    }

    /// Find the index of the token matching `open` at `open_idx`.
    fn find_matching(
        &self,
        open_idx: usize,
        open: TokenKind,
        close: TokenKind,
    ) -> Result<usize, ParseError> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens.iter().enumerate().skip(open_idx) {
            if tok.kind == open {
                depth += 1;
            } else if tok.kind == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
        }
        Err(ParseError::Unbalanced {
            offset: self.tokens[open_idx].span.start,
        })
    }

    /// Find the `>` matching the `<` at `lt_idx` (forward).
    fn find_matching_angle(&self, lt_idx: usize) -> Option<usize> {
        let mut depth = 0i32;
        for (i, tok) in self.tokens.iter().enumerate().skip(lt_idx) {
            match tok.kind {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                // A generic segment never crosses these.
                TokenKind::Semicolon | TokenKind::OpenBrace | TokenKind::OpenParen => return None,
                _ => {}
            }
        }
        None
    }

    /// Find the `<` matching the `>` at `gt_idx` (backward, bounded).
    fn rfind_matching_angle(&self, gt_idx: usize, floor: usize) -> Option<usize> {
        let mut depth = 0i32;
        let mut i = gt_idx;
        loop {
            match self.tokens[i].kind {
                TokenKind::Gt => depth += 1,
                TokenKind::Lt => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
            if i == floor {
                return None;
            }
            i -= 1;
        }
    }

    /// Count formal parameters between `(` and `)` token indices.
    fn count_params(&self, paren_open: usize, paren_close: usize) -> usize {
        if paren_close == paren_open + 1 {
            return 0;
        }
        let mut depth = 0i32;
        let mut commas = 0usize;
        for tok in &self.tokens[paren_open + 1..paren_close] {
            match tok.kind {
                TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::Lt => depth += 1,
                TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::Gt => depth -= 1,
                TokenKind::Comma if depth == 0 => commas += 1,
                _ => {}
            }
        }
        commas + 1
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SourceModel {
        parse_source(source).unwrap()
    }

    mod method_parsing {
        use super::*;

        #[test]
        fn block_bodied_method() {
            let source = "class C\n{\n    int Foo() { return 10; }\n}\n";
            let model = parse(source);
            assert_eq!(model.methods.len(), 1);
            let m = &model.methods[0];
            assert_eq!(m.name, "Foo");
            assert_eq!(m.param_count, 0);
            assert!(!m.is_generic);
            assert_eq!(m.return_type_text(source), "int");
            assert_eq!(m.containing_type, "C");
            assert_eq!(m.containing_type_kind, TypeKind::Class);
            match m.body {
                BodyShape::Block { body_span } => {
                    assert_eq!(body_span.text(source), "{ return 10; }");
                }
                other => panic!("expected block body, got {:?}", other),
            }
            assert_eq!(m.decl_span.text(source), "int Foo() { return 10; }");
        }

        #[test]
        fn expression_bodied_method() {
            let source = "class C { static int Foo() => 9 * 7; }";
            let model = parse(source);
            let m = &model.methods[0];
            assert_eq!(m.modifiers, vec!["static"]);
            match m.body {
                BodyShape::Expression { expr_span } => {
                    assert_eq!(expr_span.text(source), "9 * 7");
                }
                other => panic!("expected expression body, got {:?}", other),
            }
            assert_eq!(m.decl_span.text(source), "static int Foo() => 9 * 7;");
        }

        #[test]
        fn abstract_method_has_no_body() {
            let source = "abstract class C { public abstract int Foo(); }";
            let model = parse(source);
            let m = &model.methods[0];
            assert_eq!(m.modifiers, vec!["public", "abstract"]);
            assert_eq!(m.body, BodyShape::None);
            assert_eq!(m.decl_span.text(source), "public abstract int Foo();");
        }

        #[test]
        fn interface_member() {
            let source = "interface IFoo { int Foo(); }";
            let model = parse(source);
            let m = &model.methods[0];
            assert_eq!(m.containing_type, "IFoo");
            assert_eq!(m.containing_type_kind, TypeKind::Interface);
            assert_eq!(m.body, BodyShape::None);
        }

        #[test]
        fn parameters_are_counted() {
            let source = "class C { int Add(int a, int b) => a + b; int Zero() => 0; \
                          void Complex(Dictionary<int, string> map) { } }";
            let model = parse(source);
            let arities: Vec<(String, usize)> = model
                .methods
                .iter()
                .map(|m| (m.name.clone(), m.param_count))
                .collect();
            assert_eq!(
                arities,
                vec![
                    ("Add".to_string(), 2),
                    ("Zero".to_string(), 0),
                    ("Complex".to_string(), 1)
                ]
            );
        }

        #[test]
        fn generic_method_is_flagged() {
            let source = "class C { T Identity<T>() => default; List<int> Items() => null; }";
            let model = parse(source);
            assert!(model.methods[0].is_generic);
            assert_eq!(model.methods[0].name, "Identity");
            // Generic return type does not make the method generic.
            assert!(!model.methods[1].is_generic);
            assert_eq!(model.methods[1].name, "Items");
            assert_eq!(model.methods[1].return_type_text(source), "List<int>");
        }

        #[test]
        fn async_modifier_detected() {
            let source = "class C { async Task<int> FetchAsync() { return null; } }";
            let model = parse(source);
            assert!(model.methods[0].is_async());
        }

        #[test]
        fn void_return_detected() {
            let source = "class C { void Run() { } int Voided() => 1; }";
            let model = parse(source);
            assert!(model.methods[0].returns_void(source));
            assert!(!model.methods[1].returns_void(source));
        }

        #[test]
        fn constructor_is_not_a_method() {
            let source = "class C { public C() { } int Foo() => 1; }";
            let model = parse(source);
            assert_eq!(model.methods.len(), 1);
            assert_eq!(model.methods[0].name, "Foo");
        }

        #[test]
        fn where_clause_is_stepped_over() {
            let source = "class C { T Make<T>() where T : new() { return new T(); } }";
            let model = parse(source);
            assert_eq!(model.methods.len(), 1);
            assert!(model.methods[0].is_generic);
            assert!(matches!(model.methods[0].body, BodyShape::Block { .. }));
        }

        #[test]
        fn attributes_stay_outside_decl_span() {
            let source = "class C { [Obsolete]\n    int Foo() => 1; }";
            let model = parse(source);
            assert_eq!(model.methods[0].decl_span.text(source), "int Foo() => 1;");
        }

        #[test]
        fn nested_type_members_attribute_to_inner_type() {
            let source = "class Outer { class Inner { int Foo() => 1; } int Bar() => 2; }";
            let model = parse(source);
            let owners: Vec<(String, String)> = model
                .methods
                .iter()
                .map(|m| (m.name.clone(), m.containing_type.clone()))
                .collect();
            assert_eq!(
                owners,
                vec![
                    ("Foo".to_string(), "Inner".to_string()),
                    ("Bar".to_string(), "Outer".to_string())
                ]
            );
        }
    }

    mod other_members {
        use super::*;

        #[test]
        fn properties_are_recorded_not_methods() {
            let source = "class C { int Total { get { return 1; } } int Count => 2; }";
            let model = parse(source);
            assert!(model.methods.is_empty());
            let names: Vec<&str> = model.properties.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["Total", "Count"]);
        }

        #[test]
        fn fields_and_events_are_skipped() {
            let source = "class C { int _x; int _y = 3; event Action Changed; int Foo() => _x; }";
            let model = parse(source);
            assert_eq!(model.methods.len(), 1);
            assert!(model.properties.is_empty());
        }

        #[test]
        fn type_names_are_recorded() {
            let source = "namespace N { class A { } struct B { } interface IC { } }";
            let model = parse(source);
            let names: Vec<&str> = model.types.iter().map(|t| t.name.as_str()).collect();
            assert_eq!(names, vec!["A", "B", "IC"]);
        }

        #[test]
        fn file_scoped_namespace() {
            let source = "namespace My.App;\n\nclass C { int Foo() => 1; }\n";
            let model = parse(source);
            assert_eq!(model.methods.len(), 1);
            assert_eq!(model.methods[0].containing_type, "C");
        }

        #[test]
        fn enums_and_delegates_are_skipped() {
            let source =
                "class C { enum E { A, B } delegate int Handler(); int Foo() => 1; }";
            let model = parse(source);
            assert_eq!(model.methods.len(), 1);
            assert_eq!(model.methods[0].name, "Foo");
        }

        #[test]
        fn method_bodies_do_not_leak_members() {
            // Statements inside bodies must not be parsed as members.
            let source = "class C { int Foo() { var x = new List<int>(); if (x.Count > 0) { } \
                          return x.Count; } int Bar() => 2; }";
            let model = parse(source);
            let names: Vec<&str> = model.methods.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names, vec!["Foo", "Bar"]);
        }
    }

    mod property_rendering {
        use super::*;

        #[test]
        fn block_get_wraps_body() {
            let p = PropertyDecl {
                name: "Foo".to_string(),
                accessor: Accessor::BlockGet {
                    body: "{ return 10; }".to_string(),
                },
            };
            assert_eq!(p.render_tail(" "), " { get { return 10; } }");
        }

        #[test]
        fn bodiless_get_renders_signature_form() {
            let p = PropertyDecl {
                name: "Foo".to_string(),
                accessor: Accessor::BodilessGet,
            };
            assert_eq!(p.render_tail(""), " { get; }");
        }

        #[test]
        fn expression_get_renders_nothing() {
            let p = PropertyDecl {
                name: "Foo".to_string(),
                accessor: Accessor::ExpressionGet,
            };
            assert_eq!(p.render_tail(" "), "");
        }
    }
}
