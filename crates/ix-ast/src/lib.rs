//! An abstract semantic model for Ix source files.
//!
//! The model decomposes a parsed [`SyntaxTree`][ix_grammar::SyntaxTree]
//! into owned values: a [`SourceUnit`] per file holding at most one
//! [`Class`] with its ordered [`Member`]s and an ordered list of
//! [`Method`]s, whose signatures and bodies decompose further into
//! [`Parameter`], [`Type`], [`Block`], [`Statement`], [`Conditional`],
//! [`Declaration`], and [`Expression`].
//!
//! Units merge into a [`UnitCollection`], which derives the cross-file
//! indices that drive emission: the resolved-types map (short name to
//! fully-qualified name) and the mangled-signature index.
//!
//! Construction never fails: structural violations set `invalid` flags
//! and the surrounding model is still produced.

mod collection;
mod method;
mod statement;
mod types;
mod unit;

pub use collection::SignatureRef;
pub use collection::UnitCollection;
pub use method::Method;
pub use method::Parameter;
pub use method::Signature;
pub use statement::Atom;
pub use statement::Block;
pub use statement::Complex;
pub use statement::Conditional;
pub use statement::Declaration;
pub use statement::Direction;
pub use statement::Expression;
pub use statement::Sigil;
pub use statement::Statement;
pub use types::Type;
pub use types::PRIMITIVE_TYPE_NAMES;
pub use unit::Class;
pub use unit::Member;
pub use unit::SourceUnit;
