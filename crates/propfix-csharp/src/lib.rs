//! C# method-to-property conversion engine.
//!
//! Pipeline, from text to patch:
//!
//! 1. [`symbols`] indexes every document in a snapshot and resolves a cursor
//!    location to a concrete method symbol, then finds its references
//!    project-wide.
//! 2. [`eligibility`] decides whether the method can become a property.
//! 3. [`transform`] builds the span edits that turn the declaration into a
//!    property, preserving all trivia.
//! 4. [`rewrite`] builds the span edits that strip `()` from every call site.
//! 5. [`ops::convert`] assembles the edits into one precondition-guarded
//!    patch set and applies it atomically across the snapshot.

pub mod eligibility;
pub mod ops;
pub mod rewrite;
pub mod symbols;
pub mod transform;
