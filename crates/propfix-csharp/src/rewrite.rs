//! Call-site rewriting.
//!
//! Every invocation `Foo()` (or `Foo ()`) of a converted method loses its
//! parentheses, leaving the bare name behind as a property read. Each site
//! is one delete edit over its suffix span, which already covers any trivia
//! between the name and the `(`.
//!
//! A bare-name reference (delegate conversion, `nameof`, method group
//! argument) has no property-read equivalent that this engine can prove
//! safe, so it aborts the conversion instead of producing code that changes
//! meaning.

use propfix_core::patch::Span;

use crate::symbols::Reference;
use propfix_cst::references::RefKind;

/// Per-site deletion spans for a document's references.
///
/// `consumed` carries name spans already folded into the declaration edit;
/// those sites are skipped. Returns `Err` with the offending reference when
/// a site is not an empty invocation.
pub fn reference_edit_spans(
    refs: &[Reference],
    consumed: &[Span],
) -> Result<Vec<Span>, Reference> {
    let mut spans = Vec::new();
    for r in refs {
        if consumed.contains(&r.raw.name_span) {
            continue;
        }
        match r.raw.kind {
            RefKind::Invocation => {
                spans.push(r.raw.suffix_span.expect("invocation always has a suffix"));
            }
            RefKind::NameOnly => return Err(*r),
        }
    }
    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use propfix_core::patch::FileId;
    use propfix_cst::references::RawReference;

    fn invocation(name: Span, suffix: Span) -> Reference {
        Reference {
            file_id: FileId(0),
            raw: RawReference {
                name_span: name,
                suffix_span: Some(suffix),
                kind: RefKind::Invocation,
            },
        }
    }

    #[test]
    fn invocations_yield_suffix_deletions() {
        let refs = vec![
            invocation(Span::new(10, 13), Span::new(13, 15)),
            invocation(Span::new(30, 33), Span::new(33, 36)),
        ];
        let spans = reference_edit_spans(&refs, &[]).unwrap();
        assert_eq!(spans, vec![Span::new(13, 15), Span::new(33, 36)]);
    }

    #[test]
    fn consumed_sites_are_skipped() {
        let refs = vec![invocation(Span::new(10, 13), Span::new(13, 15))];
        let spans = reference_edit_spans(&refs, &[Span::new(10, 13)]).unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn name_only_reference_aborts() {
        let refs = vec![Reference {
            file_id: FileId(0),
            raw: RawReference {
                name_span: Span::new(5, 8),
                suffix_span: None,
                kind: RefKind::NameOnly,
            },
        }];
        let err = reference_edit_spans(&refs, &[]).unwrap_err();
        assert_eq!(err.raw.name_span, Span::new(5, 8));
    }
}
