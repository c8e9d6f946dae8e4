//! Declaration rewriting: method form to property form.
//!
//! The transformer emits exactly one span edit per declaration. Everything
//! before the parameter list (attributes, modifiers, return type, name, and
//! all trivia between them) is outside the edit span and survives verbatim;
//! only the parameter list and what follows it are rewritten.
//!
//! Shapes:
//!
//! - block body: `int Foo() { return 10; }` becomes
//!   `int Foo { get { return 10; } }` (the original block nests inside a
//!   get accessor, byte for byte)
//! - expression body: `static int Foo() => 9 * 7;` becomes
//!   `static int Foo => 9 * 7;` (the parameter list is deleted, nothing
//!   else moves)
//! - no body: `public abstract int Foo();` becomes
//!   `public abstract int Foo { get; }`
//!
//! For the block shape the declaration's own body can contain recursive
//! calls to the method. Those sites are rewritten inside the replacement
//! text here, not as separate edits, so the patch set never carries two
//! overlapping edits.

use propfix_core::patch::Span;

use propfix_cst::nodes::{Accessor, BodyShape, MethodDecl, PropertyDecl};
use propfix_cst::references::{RawReference, RefKind};

/// The single edit that converts a declaration.
#[derive(Debug, Clone)]
pub struct DeclarationRewrite {
    /// Span in the original document to replace.
    pub edit_span: Span,
    /// Replacement text.
    pub replacement: String,
    /// Name spans of references that were folded into `replacement`
    /// (recursive calls inside a block body). The caller must not emit
    /// separate edits for these.
    pub consumed_refs: Vec<Span>,
}

/// Build the declaration edit for `decl`.
///
/// `declaring_refs` are the references found in the declaring document;
/// only those inside the declaration's own body are consumed here.
pub fn build_declaration_rewrite(
    decl: &MethodDecl,
    source: &str,
    declaring_refs: &[RawReference],
) -> DeclarationRewrite {
    match decl.body {
        BodyShape::Block { body_span } => {
            let (body, consumed) = rewrite_body_calls(source, body_span, declaring_refs);
            let lead = &source[decl.parens_span.end as usize..body_span.start as usize];
            let property = PropertyDecl {
                name: decl.name.clone(),
                accessor: Accessor::BlockGet { body },
            };
            DeclarationRewrite {
                edit_span: Span::new(decl.parens_span.start, decl.decl_span.end),
                replacement: property.render_tail(lead),
                consumed_refs: consumed,
            }
        }
        BodyShape::Expression { .. } => {
            let property = PropertyDecl {
                name: decl.name.clone(),
                accessor: Accessor::ExpressionGet,
            };
            DeclarationRewrite {
                edit_span: decl.parens_span,
                replacement: property.render_tail(""),
                consumed_refs: Vec::new(),
            }
        }
        BodyShape::None => {
            let property = PropertyDecl {
                name: decl.name.clone(),
                accessor: Accessor::BodilessGet,
            };
            DeclarationRewrite {
                edit_span: Span::new(decl.parens_span.start, decl.decl_span.end),
                replacement: property.render_tail(""),
                consumed_refs: Vec::new(),
            }
        }
    }
}

/// Copy the body text with invocation suffixes of in-body references
/// removed.
///
/// Deletions run in reverse offset order so earlier offsets stay valid.
fn rewrite_body_calls(
    source: &str,
    body_span: Span,
    declaring_refs: &[RawReference],
) -> (String, Vec<Span>) {
    let mut body = source[body_span.start as usize..body_span.end as usize].to_string();
    let mut in_body: Vec<&RawReference> = declaring_refs
        .iter()
        .filter(|r| r.kind == RefKind::Invocation && body_span.contains(&r.name_span))
        .collect();
    in_body.sort_by_key(|r| std::cmp::Reverse(r.name_span.start));

    let mut consumed = Vec::new();
    for r in &in_body {
        let suffix = r.suffix_span.expect("invocation always has a suffix span");
        let start = (suffix.start - body_span.start) as usize;
        let end = (suffix.end - body_span.start) as usize;
        body.replace_range(start..end, "");
        consumed.push(r.name_span);
    }
    (body, consumed)
}
