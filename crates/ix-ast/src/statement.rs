//! Semantic representation of blocks, statements, and expressions.

use ix_grammar::SyntaxElement;
use ix_grammar::SyntaxKind;
use ix_grammar::SyntaxNode;

use super::types::Type;

/// Represents a brace-delimited block of statements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    /// The statements of the block, in source order.
    pub statements: Vec<Statement>,
}

impl Block {
    /// Extracts a block from a block node.
    ///
    /// The node is expected to be a
    /// [`BlockNode`][ix_grammar::SyntaxKind::BlockNode].
    pub fn from_node(node: &SyntaxNode) -> Self {
        let mut statements = Vec::new();

        for child in node.children() {
            match child.kind() {
                SyntaxKind::DeclarationStatementNode => {
                    statements.push(Statement::Declaration(Declaration::from_node(&child)));
                }
                SyntaxKind::ConditionalStatementNode => {
                    statements.push(complex_statement(&child));
                }
                SyntaxKind::ExpressionStatementNode => {
                    statements.push(expression_statement(&child));
                }
                _ => {}
            }
        }

        Self { statements }
    }
}

/// Represents a single statement.
///
/// A statement is classified by its leading token: `var` introduces a
/// declaration, a conditional keyword introduces a complex statement,
/// and `return` or anything that is not a keyword is an expression.
/// Statements led by any other keyword defy classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// A `var` declaration.
    Declaration(Declaration),
    /// An expression statement, optionally a `return`.
    Expression {
        /// Whether the statement was led by the `return` keyword.
        is_return: bool,
        /// The expression, if any.
        expression: Option<Expression>,
    },
    /// A conditional statement with a nested block.
    Complex(Complex),
    /// A statement that could not be classified.
    Unknown,
}

/// Represents a `var` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The declared name.
    pub name: String,
    /// The declared type.
    pub ty: Type,
    /// The initializer expression, if any.
    pub initializer: Option<Expression>,
}

impl Declaration {
    /// Extracts a declaration from a declaration statement node.
    fn from_node(node: &SyntaxNode) -> Self {
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

        let initializer = Expression::parse(&pieces_after(node, SyntaxKind::Assignment));

        Self {
            name,
            ty,
            initializer,
        }
    }
}

/// Represents a complex statement: a conditional and its nested block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complex {
    /// The conditional heading the statement.
    pub conditional: Conditional,
    /// The nested block.
    pub block: Block,
}

/// The binding direction of a foreach head.
///
/// `X as Y` binds variable `Y` to iterator `X`; `X in Y` binds variable
/// `X` to iterator `Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The `as` binding direction.
    As,
    /// The `in` binding direction.
    In,
}

/// Represents the conditional heading a complex statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditional {
    /// An `if` conditional.
    If(Option<Expression>),
    /// An `else` conditional; it has no head expression.
    Else,
    /// A `for` conditional.
    For(Option<Expression>),
    /// A `while` conditional.
    While(Option<Expression>),
    /// An `or` (else-if) conditional.
    Or(Option<Expression>),
    /// A `foreach` binding.
    Foreach {
        /// The bound variable name.
        variable: String,
        /// The iterated name.
        iterator: String,
        /// The binding direction.
        direction: Direction,
    },
}

/// Extracts a complex statement from a conditional statement node.
fn complex_statement(node: &SyntaxNode) -> Statement {
    let keyword = node
        .children_with_tokens()
        .filter_map(SyntaxElement::into_token)
        .map(|t| t.kind())
        .find(|k| {
            matches!(
                k,
                SyntaxKind::IfKeyword
                    | SyntaxKind::ElseKeyword
                    | SyntaxKind::ForKeyword
                    | SyntaxKind::ForeachKeyword
                    | SyntaxKind::WhileKeyword
                    | SyntaxKind::OrKeyword
            )
        });

    let head = node
        .children()
        .find(|n| n.kind() == SyntaxKind::ExpressionNode)
        .map(|n| pieces_of(&n))
        .unwrap_or_default();

    let block = node
        .children()
        .find(|n| n.kind() == SyntaxKind::BlockNode)
        .map(|n| Block::from_node(&n))
        .unwrap_or_default();

    let conditional = match keyword {
        Some(SyntaxKind::IfKeyword) => Conditional::If(Expression::parse(&head)),
        Some(SyntaxKind::ElseKeyword) => Conditional::Else,
        Some(SyntaxKind::ForKeyword) => Conditional::For(Expression::parse(&head)),
        Some(SyntaxKind::WhileKeyword) => Conditional::While(Expression::parse(&head)),
        Some(SyntaxKind::OrKeyword) => Conditional::Or(Expression::parse(&head)),
        Some(SyntaxKind::ForeachKeyword) => match foreach_binding(&head) {
            Some(conditional) => conditional,
            None => return Statement::Unknown,
        },
        _ => return Statement::Unknown,
    };

    Statement::Complex(Complex { conditional, block })
}

/// Extracts the binding of a foreach head.
///
/// `X as Y` binds variable `Y` to iterator `X`; `X in Y` binds variable
/// `X` to iterator `Y`.
fn foreach_binding(head: &[Piece]) -> Option<Conditional> {
    match head {
        [
            Piece::Token(SyntaxKind::Ident, first),
            Piece::Token(SyntaxKind::InKeyword, _),
            Piece::Token(SyntaxKind::Ident, second),
        ] => Some(Conditional::Foreach {
            variable: first.clone(),
            iterator: second.clone(),
            direction: Direction::In,
        }),
        [
            Piece::Token(SyntaxKind::Ident, first),
            Piece::Token(SyntaxKind::AsKeyword, _),
            Piece::Token(SyntaxKind::Ident, second),
        ] => Some(Conditional::Foreach {
            variable: second.clone(),
            iterator: first.clone(),
            direction: Direction::As,
        }),
        _ => None,
    }
}

/// Extracts an expression statement from an expression statement node.
fn expression_statement(node: &SyntaxNode) -> Statement {
    let pieces = pieces_of(node);

    match pieces.first() {
        Some(Piece::Token(SyntaxKind::ReturnKeyword, _)) => Statement::Expression {
            is_return: true,
            expression: Expression::parse(&pieces[1..]),
        },
        Some(Piece::Token(kind, _)) if is_keyword(*kind) => Statement::Unknown,
        _ => Statement::Expression {
            is_return: false,
            expression: Expression::parse(&pieces),
        },
    }
}

/// Represents an expression.
///
/// An expression is either a leaf value or an internal node with an
/// optional prefix operator, a left sub-expression, and optional infix
/// operator, right sub-expression, and postfix operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A leaf value.
    Leaf(Atom),
    /// An internal node.
    Node {
        /// The prefix operator, if any.
        prefix: Option<String>,
        /// The left sub-expression.
        left: Box<Expression>,
        /// The infix operator, if any.
        infix: Option<String>,
        /// The right sub-expression, if any.
        right: Option<Box<Expression>>,
        /// The postfix operator, if any.
        postfix: Option<String>,
    },
}

/// The member sigil qualifying a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    /// The `@` instance member sigil.
    Instance,
    /// The `%` class member sigil.
    Class,
}

/// Represents a leaf value of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// A literal token.
    Literal(String),
    /// A possibly qualified name with optional call arguments and
    /// subscript.
    Name {
        /// The member sigil, if any.
        sigil: Option<Sigil>,
        /// The selector path segments.
        path: Vec<String>,
        /// The call arguments, if the name is called.
        arguments: Option<Vec<Expression>>,
        /// The subscript expression, if the name is subscripted.
        subscript: Option<Box<Expression>>,
    },
    /// A parenthesized group.
    Group(Option<Box<Expression>>),
}

/// A significant element of a statement used by the expression parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// A significant token: its kind and verbatim text.
    Token(SyntaxKind, String),
    /// A parenthesized group.
    Group(Vec<Piece>),
}

/// Collects the significant pieces of a statement or expression node.
///
/// Trivia, statement terminators, and the parentheses delimiting nested
/// expression nodes are dropped; nested blocks and type annotations are
/// handled by their owners and are skipped here.
pub fn pieces_of(node: &SyntaxNode) -> Vec<Piece> {
    let mut pieces = Vec::new();

    for element in node.children_with_tokens() {
        match element {
            SyntaxElement::Node(n) => {
                if n.kind() == SyntaxKind::ExpressionNode {
                    pieces.push(Piece::Group(pieces_of(&n)));
                }
            }
            SyntaxElement::Token(t) => match t.kind() {
                kind if kind.is_trivia() => {}
                SyntaxKind::Stop
                | SyntaxKind::OpenParen
                | SyntaxKind::CloseParen
                | SyntaxKind::Unknown => {}
                kind => pieces.push(Piece::Token(kind, t.text().to_string())),
            },
        }
    }

    pieces
}

/// Collects the significant pieces following the first token of the
/// given kind.
pub(crate) fn pieces_after(node: &SyntaxNode, kind: SyntaxKind) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut seen = false;

    for element in node.children_with_tokens() {
        match element {
            SyntaxElement::Node(n) => {
                if seen && n.kind() == SyntaxKind::ExpressionNode {
                    pieces.push(Piece::Group(pieces_of(&n)));
                }
            }
            SyntaxElement::Token(t) => {
                if !seen {
                    seen = t.kind() == kind;
                    continue;
                }

                match t.kind() {
                    k if k.is_trivia() => {}
                    SyntaxKind::Stop | SyntaxKind::Unknown => {}
                    k => pieces.push(Piece::Token(k, t.text().to_string())),
                }
            }
        }
    }

    pieces
}

/// Determines if the kind is a keyword.
fn is_keyword(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::CopyrightKeyword
            | SyntaxKind::LicenseKeyword
            | SyntaxKind::ClassKeyword
            | SyntaxKind::InterfaceKeyword
            | SyntaxKind::PackageKeyword
            | SyntaxKind::IncludeKeyword
            | SyntaxKind::NamespaceKeyword
            | SyntaxKind::PublicKeyword
            | SyntaxKind::ProtectedKeyword
            | SyntaxKind::PrivateKeyword
            | SyntaxKind::FunctionKeyword
            | SyntaxKind::BreakKeyword
            | SyntaxKind::CaseKeyword
            | SyntaxKind::CatchKeyword
            | SyntaxKind::ConstKeyword
            | SyntaxKind::DefaultKeyword
            | SyntaxKind::ExtendsKeyword
            | SyntaxKind::ImplementsKeyword
            | SyntaxKind::ForKeyword
            | SyntaxKind::ForeachKeyword
            | SyntaxKind::LetKeyword
            | SyntaxKind::ReturnKeyword
            | SyntaxKind::SwitchKeyword
            | SyntaxKind::TryKeyword
            | SyntaxKind::VarKeyword
            | SyntaxKind::NewKeyword
            | SyntaxKind::IfKeyword
            | SyntaxKind::ElseKeyword
            | SyntaxKind::WhileKeyword
            | SyntaxKind::OrKeyword
            | SyntaxKind::AsKeyword
            | SyntaxKind::InKeyword
    )
}

/// Determines if the kind is a prefix operator.
fn is_prefix_op(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Exclamation
            | SyntaxKind::Minus
            | SyntaxKind::Tilde
            | SyntaxKind::Increment
            | SyntaxKind::Decrement
    )
}

/// Determines if the kind is an infix or assignment operator.
fn is_infix_op(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Assignment
            | SyntaxKind::PlusAssign
            | SyntaxKind::MinusAssign
            | SyntaxKind::StarAssign
            | SyntaxKind::SlashAssign
            | SyntaxKind::Equal
            | SyntaxKind::NotEqual
            | SyntaxKind::LessEqual
            | SyntaxKind::GreaterEqual
            | SyntaxKind::LogicalAnd
            | SyntaxKind::LogicalOr
            | SyntaxKind::Plus
            | SyntaxKind::Minus
            | SyntaxKind::Asterisk
            | SyntaxKind::Slash
            | SyntaxKind::Ampersand
            | SyntaxKind::Pipe
            | SyntaxKind::Caret
            | SyntaxKind::OpenAngle
            | SyntaxKind::CloseAngle
    )
}

impl Expression {
    /// Parses an expression from a list of pieces.
    ///
    /// Operator-led tails become right sub-expressions, so chains of
    /// infix operators associate to the right.
    ///
    /// Returns `None` when there are no pieces.
    pub fn parse(pieces: &[Piece]) -> Option<Self> {
        if pieces.is_empty() {
            return None;
        }

        let mut pos = 0;

        let prefix = match &pieces[0] {
            Piece::Token(kind, text) if is_prefix_op(*kind) && pieces.len() > 1 => {
                pos = 1;
                Some(text.clone())
            }
            _ => None,
        };

        let left = Box::new(parse_atom(pieces, &mut pos));

        let postfix = match pieces.get(pos) {
            Some(Piece::Token(kind, text))
                if matches!(kind, SyntaxKind::Increment | SyntaxKind::Decrement) =>
            {
                pos += 1;
                Some(text.clone())
            }
            _ => None,
        };

        let (infix, right) = match pieces.get(pos) {
            Some(Piece::Token(kind, text)) if is_infix_op(*kind) => {
                let infix = text.clone();
                pos += 1;
                (Some(infix), Self::parse(&pieces[pos..]).map(Box::new))
            }
            _ => (None, None),
        };

        if prefix.is_none() && infix.is_none() && right.is_none() && postfix.is_none() {
            Some(*left)
        } else {
            Some(Self::Node {
                prefix,
                left,
                infix,
                right,
                postfix,
            })
        }
    }
}

/// Parses a single atom starting at the given position.
fn parse_atom(pieces: &[Piece], pos: &mut usize) -> Expression {
    let piece = match pieces.get(*pos) {
        Some(piece) => piece,
        None => {
            return Expression::Leaf(Atom::Literal(String::new()));
        }
    };

    match piece {
        Piece::Group(inner) => {
            *pos += 1;
            Expression::Leaf(Atom::Group(Expression::parse(inner).map(Box::new)))
        }
        Piece::Token(kind, text) => match kind {
            SyntaxKind::Integer
            | SyntaxKind::HexInteger
            | SyntaxKind::StringLiteral
            | SyntaxKind::CharLiteral => {
                *pos += 1;
                Expression::Leaf(Atom::Literal(text.clone()))
            }
            SyntaxKind::At | SyntaxKind::Percent | SyntaxKind::Ident => parse_name(pieces, pos),
            _ => {
                *pos += 1;
                Expression::Leaf(Atom::Literal(text.clone()))
            }
        },
    }
}

/// Parses a possibly qualified name with optional call arguments and
/// subscript.
fn parse_name(pieces: &[Piece], pos: &mut usize) -> Expression {
    let sigil = match pieces.get(*pos) {
        Some(Piece::Token(SyntaxKind::At, _)) => {
            *pos += 1;
            Some(Sigil::Instance)
        }
        Some(Piece::Token(SyntaxKind::Percent, _)) => {
            *pos += 1;
            Some(Sigil::Class)
        }
        _ => None,
    };

    let mut path = Vec::new();
    if let Some(Piece::Token(SyntaxKind::Ident, text)) = pieces.get(*pos) {
        path.push(text.clone());
        *pos += 1;
    }

    // Selector chain: `.name` segments.
    while let (
        Some(Piece::Token(SyntaxKind::Dot, _)),
        Some(Piece::Token(SyntaxKind::Ident, text)),
    ) = (pieces.get(*pos), pieces.get(*pos + 1))
    {
        path.push(text.clone());
        *pos += 2;
    }

    let arguments = match pieces.get(*pos) {
        Some(Piece::Group(inner)) => {
            *pos += 1;
            Some(split_arguments(inner))
        }
        _ => None,
    };

    let subscript = match pieces.get(*pos) {
        Some(Piece::Token(SyntaxKind::OpenBracket, _)) => {
            let mut depth = 0;
            let start = *pos + 1;
            let mut end = start;
            for (offset, piece) in pieces[*pos..].iter().enumerate() {
                match piece {
                    Piece::Token(SyntaxKind::OpenBracket, _) => depth += 1,
                    Piece::Token(SyntaxKind::CloseBracket, _) => {
                        depth -= 1;
                        if depth == 0 {
                            end = *pos + offset;
                            break;
                        }
                    }
                    _ => {}
                }
            }

            if end > start || depth == 0 {
                let inner = &pieces[start..end.max(start)];
                *pos = end + 1;
                Expression::parse(inner).map(Box::new)
            } else {
                // Unterminated subscript; consume through the end.
                let inner = &pieces[start..];
                *pos = pieces.len();
                Expression::parse(inner).map(Box::new)
            }
        }
        _ => None,
    };

    Expression::Leaf(Atom::Name {
        sigil,
        path,
        arguments,
        subscript,
    })
}

/// Splits the pieces of a call argument group on commas.
fn split_arguments(pieces: &[Piece]) -> Vec<Expression> {
    let mut arguments = Vec::new();

    for part in pieces.split(|p| matches!(p, Piece::Token(SyntaxKind::Comma, _))) {
        if let Some(expression) = Expression::parse(part) {
            arguments.push(expression);
        }
    }

    arguments
}

#[cfg(test)]
mod test {
    use ix_grammar::SyntaxTree;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Parses the body block of a single-method source.
    fn body_of(source: &str) -> Block {
        let (tree, diagnostics) = SyntaxTree::parse(source);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {diagnostics:?}"
        );
        let block = tree
            .root()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::BlockNode)
            .expect("should have a block");
        Block::from_node(&block)
    }

    #[test]
    fn statement_classification() {
        let block = body_of(
            r#"public run()
{
    var total: int = 0
    total = add( total, 1 )
    if ( total > 0 ) { total-- }
    return total
    break
}
"#,
        );

        assert_eq!(block.statements.len(), 5);
        assert!(matches!(block.statements[0], Statement::Declaration(_)));
        assert!(matches!(
            block.statements[1],
            Statement::Expression {
                is_return: false,
                ..
            }
        ));
        assert!(matches!(block.statements[2], Statement::Complex(_)));
        assert!(matches!(
            block.statements[3],
            Statement::Expression {
                is_return: true,
                ..
            }
        ));
        assert!(matches!(block.statements[4], Statement::Unknown));
    }

    #[test]
    fn declaration_parts() {
        let block = body_of("public run()\n{\n var size: int = 10\n}\n");
        match &block.statements[0] {
            Statement::Declaration(declaration) => {
                assert_eq!(declaration.name, "size");
                assert_eq!(declaration.ty.name, "int");
                assert_eq!(
                    declaration.initializer,
                    Some(Expression::Leaf(Atom::Literal("10".to_string())))
                );
            }
            other => panic!("expected a declaration, found {other:?}"),
        }
    }

    #[test]
    fn foreach_bindings() {
        let block = body_of(
            r#"public run()
{
    foreach ( character in aString ) { }
    foreach ( aString as character ) { }
}
"#,
        );

        match &block.statements[0] {
            Statement::Complex(complex) => assert_eq!(
                complex.conditional,
                Conditional::Foreach {
                    variable: "character".to_string(),
                    iterator: "aString".to_string(),
                    direction: Direction::In,
                }
            ),
            other => panic!("expected a complex statement, found {other:?}"),
        }

        match &block.statements[1] {
            Statement::Complex(complex) => assert_eq!(
                complex.conditional,
                Conditional::Foreach {
                    variable: "character".to_string(),
                    iterator: "aString".to_string(),
                    direction: Direction::As,
                }
            ),
            other => panic!("expected a complex statement, found {other:?}"),
        }
    }

    #[test]
    fn assignment_expression_shape() {
        let block = body_of("public run()\n{\n @max = a\n}\n");
        match &block.statements[0] {
            Statement::Expression {
                expression: Some(Expression::Node {
                    prefix,
                    left,
                    infix,
                    right,
                    postfix,
                }),
                ..
            } => {
                assert_eq!(*prefix, None);
                assert_eq!(
                    **left,
                    Expression::Leaf(Atom::Name {
                        sigil: Some(Sigil::Instance),
                        path: vec!["max".to_string()],
                        arguments: None,
                        subscript: None,
                    })
                );
                assert_eq!(infix.as_deref(), Some("="));
                assert_eq!(
                    right.as_deref(),
                    Some(&Expression::Leaf(Atom::Name {
                        sigil: None,
                        path: vec!["a".to_string()],
                        arguments: None,
                        subscript: None,
                    }))
                );
                assert_eq!(*postfix, None);
            }
            other => panic!("expected an assignment, found {other:?}"),
        }
    }

    #[test]
    fn call_and_subscript() {
        let block = body_of("public run()\n{\n return @data[index]\n}\n");
        match &block.statements[0] {
            Statement::Expression {
                is_return: true,
                expression: Some(Expression::Leaf(Atom::Name {
                    sigil,
                    path,
                    arguments,
                    subscript,
                })),
            } => {
                assert_eq!(*sigil, Some(Sigil::Instance));
                assert_eq!(path, &["data".to_string()]);
                assert!(arguments.is_none());
                assert_eq!(
                    subscript.as_deref(),
                    Some(&Expression::Leaf(Atom::Name {
                        sigil: None,
                        path: vec!["index".to_string()],
                        arguments: None,
                        subscript: None,
                    }))
                );
            }
            other => panic!("expected a subscripted return, found {other:?}"),
        }
    }
}
