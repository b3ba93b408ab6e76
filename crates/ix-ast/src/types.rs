//! Semantic representation of Ix types.

use ix_grammar::SyntaxKind;
use ix_grammar::SyntaxNode;

/// The names of the Ix primitive types.
pub const PRIMITIVE_TYPE_NAMES: &[&str] = &[
    "bool", "boolean", "byte", "char", "double", "float", "int", "integer", "long", "short",
    "signed", "string", "unsigned", "void",
];

/// Represents an Ix type annotation.
///
/// A type is a possibly dotted name plus the decorations that follow it:
/// `[]` (array), `*` (pointer), and `&` (reference). An empty name stands
/// for `void`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Type {
    /// The possibly dotted name of the type.
    pub name: String,
    /// Whether the type carries the `[]` array decoration.
    pub is_array: bool,
    /// Whether the type carries the `const` qualifier.
    pub is_const: bool,
    /// Whether the type carries the `*` pointer decoration.
    pub is_pointer: bool,
    /// Whether the type carries the `&` reference decoration.
    pub is_reference: bool,
}

impl Type {
    /// Creates the `void` type.
    pub fn void() -> Self {
        Self::default()
    }

    /// Creates a pointer to the named type.
    pub fn pointer_to(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_pointer: true,
            ..Self::default()
        }
    }

    /// Determines if the type names one of the fixed primitive types.
    pub fn is_primitive(&self) -> bool {
        PRIMITIVE_TYPE_NAMES.contains(&self.name.as_str())
    }

    /// Determines if the type name is fully qualified (contains a `.`).
    pub fn is_full_name(&self) -> bool {
        self.name.contains('.')
    }

    /// Extracts a type from a type annotation node.
    ///
    /// The node is expected to be a
    /// [`TypeNode`][ix_grammar::SyntaxKind::TypeNode].
    pub fn from_node(node: &SyntaxNode) -> Self {
        let mut ty = Self::default();

        for element in node.children_with_tokens() {
            let token = match element.into_token() {
                Some(token) => token,
                None => continue,
            };

            match token.kind() {
                SyntaxKind::ConstKeyword => ty.is_const = true,
                SyntaxKind::OpenBracket => ty.is_array = true,
                SyntaxKind::Asterisk => ty.is_pointer = true,
                SyntaxKind::Ampersand => ty.is_reference = true,
                SyntaxKind::Ident | SyntaxKind::Dot => ty.name.push_str(token.text()),
                kind if is_primitive_kind(kind) => ty.name.push_str(token.text()),
                _ => {}
            }
        }

        ty
    }
}

/// Determines if the kind is a primitive type keyword.
fn is_primitive_kind(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::BoolTypeKeyword
            | SyntaxKind::BooleanTypeKeyword
            | SyntaxKind::ByteTypeKeyword
            | SyntaxKind::CharTypeKeyword
            | SyntaxKind::DoubleTypeKeyword
            | SyntaxKind::FloatTypeKeyword
            | SyntaxKind::IntTypeKeyword
            | SyntaxKind::IntegerTypeKeyword
            | SyntaxKind::LongTypeKeyword
            | SyntaxKind::ShortTypeKeyword
            | SyntaxKind::SignedTypeKeyword
            | SyntaxKind::StringTypeKeyword
            | SyntaxKind::UnsignedTypeKeyword
            | SyntaxKind::VoidTypeKeyword
    )
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn primitives() {
        let ty = Type {
            name: "char".to_string(),
            ..Type::default()
        };
        assert!(ty.is_primitive());
        assert!(!ty.is_full_name());

        let ty = Type {
            name: "ix.base.String".to_string(),
            ..Type::default()
        };
        assert!(!ty.is_primitive());
        assert!(ty.is_full_name());
    }

    #[test]
    fn void() {
        let ty = Type::void();
        assert_eq!(ty.name, "");
        assert!(!ty.is_pointer);
    }
}
