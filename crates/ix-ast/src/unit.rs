//! Semantic representation of source units, classes, and members.

use std::path::Path;

use ix_grammar::Diagnostic;
use ix_grammar::SyntaxElement;
use ix_grammar::SyntaxKind;
use ix_grammar::SyntaxNode;
use ix_grammar::SyntaxTree;

use super::method::Method;
use super::statement::pieces_after;
use super::statement::Piece;
use super::types::Type;

/// Represents one Ix source file.
///
/// The package of a unit is the name of the file's immediate parent
/// directory and the unit name is the file's base name; the file's
/// contents supply the header lines, at most one class, and the methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// The dotted package name, derived from the parent directory.
    pub package: String,
    /// The short unit name, derived from the file base name.
    pub name: String,
    /// The file extension.
    pub extension: String,
    /// The copyright header lines, in source order.
    pub copyright_lines: Vec<String>,
    /// The license header lines, in source order.
    pub license_lines: Vec<String>,
    /// The class of the unit, if any.
    pub class: Option<Class>,
    /// The methods of the unit, in source order.
    pub methods: Vec<Method>,
    /// Whether a structural violation was encountered during
    /// construction.
    pub invalid: bool,
}

impl SourceUnit {
    /// Parses a source unit from the given path and source text.
    ///
    /// A unit is always produced; parse diagnostics are returned
    /// alongside it.
    pub fn parse(path: &Path, source: &str) -> (Self, Vec<Diagnostic>) {
        let (tree, diagnostics) = SyntaxTree::parse(source);
        (Self::from_tree(path, &tree), diagnostics)
    }

    /// Extracts a source unit from a parsed tree.
    ///
    /// The path supplies the package (parent directory name), the unit
    /// name (file base name), and the extension.
    pub fn from_tree(path: &Path, tree: &SyntaxTree) -> Self {
        let package = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = path
            .file_stem()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|extension| extension.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut unit = Self {
            package,
            name,
            extension,
            copyright_lines: Vec::new(),
            license_lines: Vec::new(),
            class: None,
            methods: Vec::new(),
            invalid: false,
        };

        let full_name = unit.full_name();
        for child in tree.root().children() {
            match child.kind() {
                SyntaxKind::CopyrightNode => {
                    unit.copyright_lines.push(header_line_text(&child));
                }
                SyntaxKind::LicenseNode => {
                    unit.license_lines.push(header_line_text(&child));
                }
                SyntaxKind::ClassDefinitionNode => {
                    // A unit has at most one class; a second marks the
                    // unit invalid and is dropped.
                    if unit.class.is_some() {
                        unit.invalid = true;
                    } else {
                        unit.class = Some(Class::from_node(&child));
                    }
                }
                SyntaxKind::MethodNode => {
                    unit.methods.push(Method::from_node(&child, &full_name));
                }
                SyntaxKind::UnexpectedNode => {
                    unit.invalid = true;
                }
                _ => {}
            }
        }

        unit
    }

    /// Gets the fully-qualified name of the unit (`package.name`).
    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{package}.{name}", package = self.package, name = self.name)
        }
    }

    /// Gets the mangled identifier prefix of the unit (the package with
    /// `.` replaced by `_`, followed by `_` and the unit name).
    pub fn prefix(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!(
                "{package}_{name}",
                package = self.package.replace('.', "_"),
                name = self.name
            )
        }
    }
}

/// Gets the text of a header line, excluding the leading keyword and the
/// terminating newline.
fn header_line_text(node: &SyntaxNode) -> String {
    let mut text = String::new();

    for token in node
        .children_with_tokens()
        .filter_map(SyntaxElement::into_token)
    {
        match token.kind() {
            SyntaxKind::CopyrightKeyword | SyntaxKind::LicenseKeyword => continue,
            SyntaxKind::Newline => break,
            _ => text.push_str(token.text()),
        }
    }

    text.trim().to_string()
}

/// Represents the class of a source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    /// The access modifier.
    pub modifier: String,
    /// The name of the extended class, if any.
    pub extends: Option<String>,
    /// The names of the implemented interfaces.
    pub interfaces: Vec<String>,
    /// The members of the class, in source order.
    pub members: Vec<Member>,
    /// Whether a structural violation was encountered during
    /// construction.
    pub invalid: bool,
}

impl Class {
    /// Extracts a class from a class definition node.
    pub fn from_node(node: &SyntaxNode) -> Self {
        let modifier = node
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token)
            .find(|t| {
                matches!(
                    t.kind(),
                    SyntaxKind::PublicKeyword
                        | SyntaxKind::ProtectedKeyword
                        | SyntaxKind::PrivateKeyword
                        | SyntaxKind::FunctionKeyword
                )
            })
            .map(|t| t.text().to_string())
            .unwrap_or_default();

        let extends = node
            .children()
            .find(|n| n.kind() == SyntaxKind::ExtendsClauseNode)
            .and_then(|n| clause_names(&n).into_iter().next());

        let interfaces = node
            .children()
            .find(|n| n.kind() == SyntaxKind::ImplementsClauseNode)
            .map(|n| clause_names(&n))
            .unwrap_or_default();

        let mut invalid = false;
        let mut members = Vec::new();
        for child in node.children() {
            match child.kind() {
                SyntaxKind::MemberNode => {
                    let member = Member::from_node(&child);
                    if member.name.is_empty() || member.ty.name.is_empty() {
                        invalid = true;
                    }
                    members.push(member);
                }
                SyntaxKind::UnexpectedNode => invalid = true,
                _ => {}
            }
        }

        Self {
            modifier,
            extends,
            interfaces,
            members,
            invalid,
        }
    }
}

/// Collects the dotted names of an inheritance clause.
fn clause_names(node: &SyntaxNode) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();

    for token in node
        .children_with_tokens()
        .filter_map(SyntaxElement::into_token)
    {
        match token.kind() {
            SyntaxKind::Ident | SyntaxKind::Dot => current.push_str(token.text()),
            SyntaxKind::Comma => {
                if !current.is_empty() {
                    names.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
    }

    if !current.is_empty() {
        names.push(current);
    }

    names
}

/// Represents a class member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Whether the member is per-instance (`@`) rather than class-scoped
    /// (`%`).
    pub is_instance: bool,
    /// The member name.
    pub name: String,
    /// The member type.
    pub ty: Type,
    /// The default value token, if any.
    pub default_value: Option<String>,
}

impl Member {
    /// Extracts a member from a member node.
    pub fn from_node(node: &SyntaxNode) -> Self {
        let mut is_instance = false;
        let mut name = String::new();

        for token in node
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token)
        {
            match token.kind() {
                SyntaxKind::At => is_instance = true,
                SyntaxKind::Percent => is_instance = false,
                SyntaxKind::Ident if name.is_empty() => {
                    name = token.text().to_string();
                }
                _ => {}
            }
        }

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
            is_instance,
            name,
            ty,
            default_value,
        }
    }
}
