//! Eligibility analysis for method-to-property conversion.
//!
//! A method becomes a property only when the property form can express the
//! same member: no parameters to carry, no type parameters, a real value to
//! get, and no same-named sibling the new property would collide with. The
//! check is cheap and runs before any reference scanning.

use std::fmt;

use serde::Serialize;

use propfix_core::snapshot::ProjectSnapshot;

use crate::symbols::{MethodSymbol, SymbolIndex};

/// Why a method cannot become a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    /// The method declares one or more parameters.
    HasParameters,
    /// The method declares its own type parameters.
    IsGeneric,
    /// The method carries the `async` modifier.
    IsAsync,
    /// The method returns `void`; a property must produce a value.
    ReturnsVoid,
    /// The containing type already has a same-named method or property.
    HasSiblingWithSameName,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            IneligibleReason::HasParameters => "method has parameters",
            IneligibleReason::IsGeneric => "method is generic",
            IneligibleReason::IsAsync => "method is async",
            IneligibleReason::ReturnsVoid => "method returns void",
            IneligibleReason::HasSiblingWithSameName => {
                "containing type has another member with the same name"
            }
        };
        f.write_str(msg)
    }
}

/// The outcome of a single eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible { reasons: Vec<IneligibleReason> },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Check whether `symbol` can be converted.
///
/// All applicable reasons are reported, not just the first, so a caller
/// surfacing the result does not make the user fix one blocker at a time.
pub fn check(
    index: &SymbolIndex,
    snapshot: &ProjectSnapshot,
    symbol: &MethodSymbol,
) -> Eligibility {
    let mut reasons = Vec::new();
    if symbol.decl.param_count > 0 {
        reasons.push(IneligibleReason::HasParameters);
    }
    if symbol.decl.is_generic {
        reasons.push(IneligibleReason::IsGeneric);
    }
    if symbol.decl.is_async() {
        reasons.push(IneligibleReason::IsAsync);
    }
    if let Some(doc) = snapshot.document(symbol.file_id) {
        if symbol.decl.returns_void(&doc.text) {
            reasons.push(IneligibleReason::ReturnsVoid);
        }
    }
    if index.has_same_named_sibling(symbol) {
        reasons.push(IneligibleReason::HasSiblingWithSameName);
    }
    if reasons.is_empty() {
        Eligibility::Eligible
    } else {
        Eligibility::Ineligible { reasons }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propfix_core::cancel::CancellationToken;
    use propfix_core::types::Location;

    fn check_one(source: &str, line: u32, col: u32) -> Eligibility {
        let snap = ProjectSnapshot::from_files(vec![("a.cs".to_string(), source.to_string())]);
        let idx = SymbolIndex::build(&snap, &CancellationToken::new()).unwrap();
        let sym = idx
            .resolve_method_at(&snap, &Location::new("a.cs", line, col))
            .unwrap();
        check(&idx, &snap, &sym)
    }

    #[test]
    fn parameterless_value_method_is_eligible() {
        let e = check_one("class C { int Foo() { return 10; } }", 1, 15);
        assert!(e.is_eligible());
    }

    #[test]
    fn parameters_block_conversion() {
        let e = check_one("class C { int Foo(int x) => x; }", 1, 15);
        assert_eq!(
            e,
            Eligibility::Ineligible {
                reasons: vec![IneligibleReason::HasParameters]
            }
        );
    }

    #[test]
    fn generic_method_is_blocked() {
        let e = check_one("class C { T Foo<T>() => default; }", 1, 13);
        assert_eq!(
            e,
            Eligibility::Ineligible {
                reasons: vec![IneligibleReason::IsGeneric]
            }
        );
    }

    #[test]
    fn async_method_is_blocked() {
        let e = check_one("class C { async Task<int> Foo() { return null; } }", 1, 27);
        assert_eq!(
            e,
            Eligibility::Ineligible {
                reasons: vec![IneligibleReason::IsAsync]
            }
        );
    }

    #[test]
    fn void_method_is_blocked() {
        let e = check_one("class C { void Foo() { } }", 1, 16);
        assert_eq!(
            e,
            Eligibility::Ineligible {
                reasons: vec![IneligibleReason::ReturnsVoid]
            }
        );
    }

    #[test]
    fn overloaded_method_is_blocked() {
        let e = check_one("class C { int Foo() => 1; int Foo(int x) => x; }", 1, 15);
        assert_eq!(
            e,
            Eligibility::Ineligible {
                reasons: vec![IneligibleReason::HasSiblingWithSameName]
            }
        );
    }

    #[test]
    fn all_reasons_are_reported() {
        let e = check_one("class C { async void Foo(int x) { } }", 1, 22);
        match e {
            Eligibility::Ineligible { reasons } => {
                assert_eq!(
                    reasons,
                    vec![
                        IneligibleReason::HasParameters,
                        IneligibleReason::IsAsync,
                        IneligibleReason::ReturnsVoid
                    ]
                );
            }
            Eligibility::Eligible => panic!("expected ineligible"),
        }
    }

    #[test]
    fn abstract_method_is_eligible() {
        let e = check_one("abstract class C { public abstract int Foo(); }", 1, 40);
        assert!(e.is_eligible());
    }
}
