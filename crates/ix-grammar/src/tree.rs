//! Module for the concrete syntax tree (CST) representation.

use std::fmt;

use rowan::GreenNodeBuilder;

use super::grammar;
use super::lexer::Lexer;
use super::parser::Event;
use super::parser::Parser;
use super::Diagnostic;

/// Represents the kind of syntax element (node or token) in an Ix
/// concrete syntax tree (CST).
///
/// Nodes have at least one token child and represent a syntactic construct.
///
/// Tokens are terminal and represent any span of the source.
///
/// This enumeration is a union of all supported Ix tokens and nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    /// The token is unknown to Ix.
    Unknown,
    /// A whitespace token.
    Whitespace,
    /// A newline token.
    Newline,
    /// A comment token.
    Comment,
    /// A literal integer token.
    Integer,
    /// A literal hexadecimal integer token.
    HexInteger,
    /// A literal string token.
    StringLiteral,
    /// A literal character token.
    CharLiteral,
    /// A word token.
    Ident,
    /// The `copyright` header keyword token.
    CopyrightKeyword,
    /// The `license` header keyword token.
    LicenseKeyword,
    /// The `class` keyword token.
    ClassKeyword,
    /// The `interface` keyword token.
    InterfaceKeyword,
    /// The `package` keyword token.
    PackageKeyword,
    /// The `include` keyword token.
    IncludeKeyword,
    /// The `namespace` keyword token.
    NamespaceKeyword,
    /// The `public` keyword token.
    PublicKeyword,
    /// The `protected` keyword token.
    ProtectedKeyword,
    /// The `private` keyword token.
    PrivateKeyword,
    /// The `function` keyword token.
    FunctionKeyword,
    /// The `break` keyword token.
    BreakKeyword,
    /// The `case` keyword token.
    CaseKeyword,
    /// The `catch` keyword token.
    CatchKeyword,
    /// The `const` keyword token.
    ConstKeyword,
    /// The `default` keyword token.
    DefaultKeyword,
    /// The `extends` keyword token.
    ExtendsKeyword,
    /// The `implements` keyword token.
    ImplementsKeyword,
    /// The `for` keyword token.
    ForKeyword,
    /// The `foreach` keyword token.
    ForeachKeyword,
    /// The `let` keyword token.
    LetKeyword,
    /// The `return` keyword token.
    ReturnKeyword,
    /// The `switch` keyword token.
    SwitchKeyword,
    /// The `try` keyword token.
    TryKeyword,
    /// The `var` keyword token.
    VarKeyword,
    /// The `new` keyword token.
    NewKeyword,
    /// The `if` keyword token.
    IfKeyword,
    /// The `else` keyword token.
    ElseKeyword,
    /// The `while` keyword token.
    WhileKeyword,
    /// The `or` keyword token.
    OrKeyword,
    /// The `as` keyword token.
    AsKeyword,
    /// The `in` keyword token.
    InKeyword,
    /// The `bool` type keyword token.
    BoolTypeKeyword,
    /// The `boolean` type keyword token.
    BooleanTypeKeyword,
    /// The `byte` type keyword token.
    ByteTypeKeyword,
    /// The `char` type keyword token.
    CharTypeKeyword,
    /// The `double` type keyword token.
    DoubleTypeKeyword,
    /// The `float` type keyword token.
    FloatTypeKeyword,
    /// The `int` type keyword token.
    IntTypeKeyword,
    /// The `integer` type keyword token.
    IntegerTypeKeyword,
    /// The `long` type keyword token.
    LongTypeKeyword,
    /// The `short` type keyword token.
    ShortTypeKeyword,
    /// The `signed` type keyword token.
    SignedTypeKeyword,
    /// The `string` type keyword token.
    StringTypeKeyword,
    /// The `unsigned` type keyword token.
    UnsignedTypeKeyword,
    /// The `void` type keyword token.
    VoidTypeKeyword,
    /// The `{` symbol token.
    OpenBrace,
    /// The `}` symbol token.
    CloseBrace,
    /// The `(` symbol token.
    OpenParen,
    /// The `)` symbol token.
    CloseParen,
    /// The `[` symbol token.
    OpenBracket,
    /// The `]` symbol token.
    CloseBracket,
    /// The `<` symbol token.
    OpenAngle,
    /// The `>` symbol token.
    CloseAngle,
    /// The `:` symbol token.
    Colon,
    /// The `,` symbol token.
    Comma,
    /// The `;` statement terminator token.
    ///
    /// Synthetic terminators inserted by the lexer have empty text.
    Stop,
    /// The `.` symbol token.
    Dot,
    /// The `@` instance member sigil token.
    At,
    /// The `%` class member sigil token.
    Percent,
    /// The `=` symbol token.
    Assignment,
    /// The `+=` symbol token.
    PlusAssign,
    /// The `-=` symbol token.
    MinusAssign,
    /// The `*=` symbol token.
    StarAssign,
    /// The `/=` symbol token.
    SlashAssign,
    /// The `==` symbol token.
    Equal,
    /// The `!=` symbol token.
    NotEqual,
    /// The `<=` symbol token.
    LessEqual,
    /// The `>=` symbol token.
    GreaterEqual,
    /// The `&&` symbol token.
    LogicalAnd,
    /// The `||` symbol token.
    LogicalOr,
    /// The `+` symbol token.
    Plus,
    /// The `-` symbol token.
    Minus,
    /// The `*` symbol token.
    Asterisk,
    /// The `/` symbol token.
    Slash,
    /// The `&` symbol token.
    Ampersand,
    /// The `|` symbol token.
    Pipe,
    /// The `^` symbol token.
    Caret,
    /// The `~` symbol token.
    Tilde,
    /// The `!` symbol token.
    Exclamation,
    /// The `++` symbol token.
    Increment,
    /// The `--` symbol token.
    Decrement,
    /// The `\` symbol token.
    Backslash,

    /// Abandoned nodes are nodes that encountered errors.
    ///
    /// Children of abandoned nodes are re-parented to the parent of
    /// the abandoned node.
    ///
    /// As this is an internal implementation of error recovery,
    /// hide this variant from the documentation.
    #[doc(hidden)]
    Abandoned,
    /// Represents the Ix source file root node.
    RootNode,
    /// Represents a copyright header line node.
    CopyrightNode,
    /// Represents a license header line node.
    LicenseNode,
    /// Represents a class definition node.
    ClassDefinitionNode,
    /// Represents an `extends` clause node.
    ExtendsClauseNode,
    /// Represents an `implements` clause node.
    ImplementsClauseNode,
    /// Represents a class member node.
    MemberNode,
    /// Represents a method node.
    MethodNode,
    /// Represents a parameter node.
    ParameterNode,
    /// Represents a type annotation node.
    TypeNode,
    /// Represents a brace-delimited block node.
    BlockNode,
    /// Represents a `var` declaration statement node.
    DeclarationStatementNode,
    /// Represents a conditional (complex) statement node.
    ConditionalStatementNode,
    /// Represents an expression statement node.
    ExpressionStatementNode,
    /// Represents a parenthesized expression node.
    ExpressionNode,
    /// Represents tokens quarantined at a decision point because they
    /// were not in the expected set.
    UnexpectedNode,

    // WARNING: this must always be the last variant.
    /// The exclusive maximum syntax kind value.
    MAX,
}

impl SyntaxKind {
    /// Determines if the kind represents a node rather than a token.
    pub fn is_node(self) -> bool {
        matches!(
            self,
            Self::RootNode
                | Self::CopyrightNode
                | Self::LicenseNode
                | Self::ClassDefinitionNode
                | Self::ExtendsClauseNode
                | Self::ImplementsClauseNode
                | Self::MemberNode
                | Self::MethodNode
                | Self::ParameterNode
                | Self::TypeNode
                | Self::BlockNode
                | Self::DeclarationStatementNode
                | Self::ConditionalStatementNode
                | Self::ExpressionStatementNode
                | Self::ExpressionNode
                | Self::UnexpectedNode
        )
    }

    /// Determines if the kind is trivia (whitespace or comment).
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Newline | Self::Comment)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

/// Represents the Ix language for use with `rowan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IxLanguage;

impl rowan::Language for IxLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < SyntaxKind::MAX as u16);
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Represents a node in the concrete syntax tree.
pub type SyntaxNode = rowan::SyntaxNode<IxLanguage>;
/// Represents a token in the concrete syntax tree.
pub type SyntaxToken = rowan::SyntaxToken<IxLanguage>;
/// Represents an element (node or token) in the concrete syntax tree.
pub type SyntaxElement = rowan::SyntaxElement<IxLanguage>;
/// Represents node children in the concrete syntax tree.
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<IxLanguage>;

/// Represents an untyped concrete syntax tree.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SyntaxTree(SyntaxNode);

impl SyntaxTree {
    /// Parses Ix source to produce a syntax tree.
    ///
    /// A syntax tree is always returned, even for invalid Ix source files.
    ///
    /// Additionally, the list of diagnostics encountered during the parse
    /// is returned; if the list is empty, the source was syntactically
    /// well-formed.
    ///
    /// The text of the tree reproduces the source exactly: trivia,
    /// comments, and quarantined tokens are all kept, and the synthetic
    /// statement terminators inserted by the lexer are zero-length.
    pub fn parse(source: &str) -> (Self, Vec<Diagnostic>) {
        let mut parser = Parser::new(Lexer::new(source));
        grammar::source_file(&mut parser);
        let output = parser.finish();
        Self::build(source, output.events, output.diagnostics)
    }

    /// Builds the concrete syntax tree from a list of parser events.
    fn build(
        source: &str,
        events: Vec<Event>,
        diagnostics: Vec<Diagnostic>,
    ) -> (Self, Vec<Diagnostic>) {
        let mut builder = GreenNodeBuilder::default();

        for event in events {
            match event {
                Event::NodeStarted {
                    kind: SyntaxKind::Abandoned,
                } => {
                    // The node was abandoned, so all the descendants of the
                    // node will attach to the current node
                }
                Event::NodeStarted { kind } => builder.start_node(kind.into()),
                Event::NodeFinished => builder.finish_node(),
                Event::Token { kind, span } => {
                    builder.token(kind.into(), &source[span.start()..span.end()])
                }
            }
        }

        (Self(SyntaxNode::new_root(builder.finish())), diagnostics)
    }

    /// Gets the root syntax node of the tree.
    pub fn root(&self) -> &SyntaxNode {
        &self.0
    }

    /// Converts the tree into its root syntax node.
    pub fn into_syntax(self) -> SyntaxNode {
        self.0
    }
}

impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.text())
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    /// A small but representative source file.
    const SOURCE: &str = r#"Copyright 2021 Daniel Robert Bradley
License MIT

public class extends Object implements Stringify
{
    @data: char[]
    %count: int
}

public new( size: int )
{
    @data = allocate( size )
}

public const get( index: int ): char
{
    return @data[index]
}
"#;

    #[test]
    fn round_trip() {
        let (tree, diagnostics) = SyntaxTree::parse(SOURCE);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {diagnostics:?}"
        );
        assert_eq!(tree.to_string(), SOURCE);
    }

    #[test]
    fn round_trip_with_malformed_input() {
        let source = "public class { ??? @data: char } trailing garbage";
        let (tree, diagnostics) = SyntaxTree::parse(source);
        assert!(!diagnostics.is_empty());
        assert_eq!(tree.to_string(), source);
    }

    #[test]
    fn tree_shape() {
        let (tree, _) = SyntaxTree::parse(SOURCE);
        let root = tree.root();
        assert_eq!(root.kind(), SyntaxKind::RootNode);

        let kinds: Vec<_> = root.children().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            &[
                SyntaxKind::CopyrightNode,
                SyntaxKind::LicenseNode,
                SyntaxKind::ClassDefinitionNode,
                SyntaxKind::MethodNode,
                SyntaxKind::MethodNode,
            ]
        );

        let class = root
            .children()
            .find(|n| n.kind() == SyntaxKind::ClassDefinitionNode)
            .expect("should have a class");
        let members: Vec<_> = class
            .children()
            .filter(|n| n.kind() == SyntaxKind::MemberNode)
            .collect();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].text().to_string(), "@data: char[]");
    }

    #[test]
    fn unexpected_tokens_are_quarantined() {
        let source = "public class { 123 456 @data: char }";
        let (tree, diagnostics) = SyntaxTree::parse(source);
        assert_eq!(diagnostics.len(), 1);

        let class = tree
            .root()
            .children()
            .find(|n| n.kind() == SyntaxKind::ClassDefinitionNode)
            .expect("should have a class");
        let unexpected = class
            .descendants()
            .find(|n| n.kind() == SyntaxKind::UnexpectedNode)
            .expect("should have quarantined the unexpected tokens");
        assert_eq!(unexpected.text().to_string(), "123 456");

        // The member that follows the quarantined run still parses.
        let members: Vec<_> = class
            .children()
            .filter(|n| n.kind() == SyntaxKind::MemberNode)
            .collect();
        assert_eq!(members.len(), 1);
    }
}
