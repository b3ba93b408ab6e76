//! A lossless parse tree for Ix source files.
//!
//! The parser is infallible: it is based on the `logos` crate for lexing
//! and the `rowan` crate for the concrete syntax tree (CST)
//! representation, and it always produces a tree covering every byte of
//! the input alongside a list of diagnostics.
//!
//! Two behaviors distinguish the Ix lexer and parser from a conventional
//! pipeline:
//!
//! - Statement terminators (`;`) are optional in Ix source. The
//!   [lexer][lexer::Lexer] inserts synthetic zero-length terminator
//!   tokens between adjacent tokens per a contextual insertion rule.
//! - At every decision point the parser checks an expected token set and
//!   quarantines any out-of-grammar run of tokens under an
//!   [`UnexpectedNode`][tree::SyntaxKind::UnexpectedNode], preserving the
//!   source while isolating the error.
//!
//! See [`SyntaxTree::parse`][tree::SyntaxTree::parse] for parsing Ix
//! source into a tree.

pub mod diagnostic;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod tree;

pub use diagnostic::Diagnostic;
pub use diagnostic::Label;
pub use diagnostic::Severity;
pub use diagnostic::Span;
pub use diagnostic::ToSpan;
pub use tree::IxLanguage;
pub use tree::SyntaxElement;
pub use tree::SyntaxKind;
pub use tree::SyntaxNode;
pub use tree::SyntaxNodeChildren;
pub use tree::SyntaxToken;
pub use tree::SyntaxTree;
