//! Lossless syntax layer for C# documents.
//!
//! The crate tokenizes source text into spanned tokens (everything that is
//! not a token — whitespace, comments, preprocessor directives — survives
//! untouched in the original text), scans the token stream into a member
//! model, and classifies name references. All downstream rewriting is span
//! arithmetic over the original text, so round-tripping is exact by
//! construction.

pub mod nodes;
pub mod references;
pub mod tokenizer;

pub use nodes::{
    parse_source, Accessor, BodyShape, MethodDecl, ParseError, PropertyDecl, PropertySig,
    SourceModel, TypeKind, TypeName,
};
pub use references::{collect_name_references, RawReference, RefKind};
pub use tokenizer::{tokenize, ScanError, Token, TokenKind};
