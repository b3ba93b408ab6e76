//! Semantic representation of methods and their signatures.

use ix_grammar::SyntaxElement;
use ix_grammar::SyntaxKind;
use ix_grammar::SyntaxNode;

use super::statement::pieces_after;
use super::statement::Block;
use super::statement::Piece;
use super::types::Type;

/// Represents a method: its signature and its body block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// The normalized signature of the method.
    pub signature: Signature,
    /// The body of the method.
    pub body: Block,
}

impl Method {
    /// Extracts a method from a method node.
    ///
    /// The node is expected to be a
    /// [`MethodNode`][ix_grammar::SyntaxKind::MethodNode]. The owning
    /// unit's fully-qualified name supplies the return type of a
    /// constructor (a method named `new`).
    pub fn from_node(node: &SyntaxNode, unit_full_name: &str) -> Self {
        let signature = Signature::from_node(node, unit_full_name);
        let body = node
            .children()
            .find(|n| n.kind() == SyntaxKind::BlockNode)
            .map(|n| Block::from_node(&n))
            .unwrap_or_default();

        Self { signature, body }
    }
}

/// Represents the normalized view of a method header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// The access modifier.
    pub modifier: String,
    /// Whether the method is marked `const`.
    pub is_const: bool,
    /// Whether the method is class-scoped (marked with the `class`
    /// keyword).
    pub is_static: bool,
    /// The method name.
    pub name: String,
    /// The parameters, in declaration order.
    pub parameters: Vec<Parameter>,
    /// The return type.
    pub return_type: Type,
}

impl Signature {
    /// Extracts a signature from a method node.
    fn from_node(node: &SyntaxNode, unit_full_name: &str) -> Self {
        let mut modifier = String::new();
        let mut is_const = false;
        let mut is_static = false;
        let mut name = String::new();

        for token in node
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token)
        {
            match token.kind() {
                SyntaxKind::PublicKeyword
                | SyntaxKind::ProtectedKeyword
                | SyntaxKind::PrivateKeyword
                | SyntaxKind::FunctionKeyword => {
                    if modifier.is_empty() {
                        modifier = token.text().to_string();
                    }
                }
                SyntaxKind::ConstKeyword => is_const = true,
                SyntaxKind::ClassKeyword => is_static = true,
                SyntaxKind::Ident | SyntaxKind::NewKeyword if name.is_empty() => {
                    name = token.text().to_string();
                }
                _ => {}
            }
        }

        let parameters = node
            .children()
            .filter(|n| n.kind() == SyntaxKind::ParameterNode)
            .map(|n| Parameter::from_node(&n))
            .collect();

        // A constructor's return type is the owning unit's full name
        // with the pointer flag set.
        let return_type = if name == "new" {
            Type::pointer_to(unit_full_name)
        } else {
            node.children()
                .find(|n| n.kind() == SyntaxKind::TypeNode)
                .map(|n| Type::from_node(&n))
                .unwrap_or_else(Type::void)
        };

        Self {
            modifier,
            is_const,
            is_static,
            name,
            parameters,
            return_type,
        }
    }

    /// Computes the mangled function name of the signature for the given
    /// unit prefix.
    ///
    /// The name is `<prefix>__<method>` followed by `__<parameter>` for
    /// each declared parameter; the implicit `self` parameter never
    /// contributes a suffix.
    pub fn mangled_name(&self, prefix: &str) -> String {
        let mut mangled = format!("{prefix}__{name}", name = self.name);
        for parameter in &self.parameters {
            mangled.push_str("__");
            mangled.push_str(&parameter.name);
        }

        mangled
    }
}

/// Represents a method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// The parameter name.
    pub name: String,
    /// The parameter type.
    pub ty: Type,
    /// The default value token, if any.
    pub default_value: Option<String>,
}

impl Parameter {
    /// Extracts a parameter from a parameter node.
    pub(crate) fn from_node(node: &SyntaxNode) -> Self {
        let name = node
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token)
            .find(|t| t.kind() == SyntaxKind::Ident)
            .map(|t| t.text().to_string())
            .unwrap_or_default();

        let ty = node
            .children()
            .find(|n| n.kind() == SyntaxKind::TypeNode)
            .map(|n| Type::from_node(&n))
            .unwrap_or_else(Type::void);

        let default_value = pieces_after(node, SyntaxKind::Assignment)
            .into_iter()
            .find_map(|piece| match piece {
                Piece::Token(_, text) => Some(text),
                Piece::Group(_) => None,
            });

        Self {
            name,
            ty,
            default_value,
        }
    }
}

#[cfg(test)]
mod test {
    use ix_grammar::SyntaxTree;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Extracts the methods of the given source.
    fn methods_of(source: &str, full_name: &str) -> Vec<Method> {
        let (tree, diagnostics) = SyntaxTree::parse(source);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {diagnostics:?}"
        );
        tree.root()
            .children()
            .filter(|n| n.kind() == SyntaxKind::MethodNode)
            .map(|n| Method::from_node(&n, full_name))
            .collect()
    }

    #[test]
    fn constructor_return_type() {
        let methods = methods_of(
            "public new( name: string* )\n{\n}\n",
            "ix.base.Thing",
        );
        assert_eq!(methods.len(), 1);

        let signature = &methods[0].signature;
        assert_eq!(signature.modifier, "public");
        assert_eq!(signature.name, "new");
        assert_eq!(signature.return_type.name, "ix.base.Thing");
        assert!(signature.return_type.is_pointer);
        assert_eq!(signature.parameters.len(), 1);
        assert_eq!(signature.parameters[0].name, "name");
        assert_eq!(signature.parameters[0].ty.name, "string");
        assert!(signature.parameters[0].ty.is_pointer);
    }

    #[test]
    fn const_method_signature() {
        let methods = methods_of(
            "public const get( index: int = 0 ): char\n{\n}\n",
            "ix.base.Thing",
        );
        let signature = &methods[0].signature;
        assert!(signature.is_const);
        assert!(!signature.is_static);
        assert_eq!(signature.name, "get");
        assert_eq!(signature.return_type.name, "char");
        assert_eq!(signature.parameters[0].default_value.as_deref(), Some("0"));
    }

    #[test]
    fn static_method_signature() {
        let methods = methods_of(
            "public class instance(): Singleton*\n{\n}\n",
            "ix.base.Singleton",
        );
        let signature = &methods[0].signature;
        assert!(signature.is_static);
        assert_eq!(signature.name, "instance");
        assert_eq!(signature.return_type.name, "Singleton");
        assert!(signature.return_type.is_pointer);
    }

    #[test]
    fn mangling() {
        let methods = methods_of(
            "public convert( value: int, radix: int ): string*\n{\n}\n",
            "ix.base.Convert",
        );
        assert_eq!(
            methods[0].signature.mangled_name("ix_base_Convert"),
            "ix_base_Convert__convert__value__radix"
        );
    }
}
