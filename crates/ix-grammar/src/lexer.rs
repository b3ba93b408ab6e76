//! Module for the lexer implementation.
//!
//! The lexer wraps a raw [`logos`] token stream with the contextual
//! behavior the Ix language requires: insertion of synthetic statement
//! terminators between adjacent tokens that would otherwise be ambiguous,
//! and suppression of that insertion inside free-form copyright and
//! license header lines.

use std::collections::VecDeque;

use logos::Logos;

use super::tree::SyntaxKind;
use super::Span;

/// Represents a set of tokens as a bitset.
///
/// As Rust does not currently support const functions in traits,
/// `TokenSet` operates on "raw" forms of tokens (i.e. `u8`).
///
/// This allows the sets to be created in const contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenSet(u128);

impl TokenSet {
    /// An empty token set.
    pub const EMPTY: Self = Self(0);

    /// Constructs a token set from a slice of tokens.
    pub const fn new(tokens: &[u8]) -> Self {
        let mut bits = 0u128;
        let mut i = 0;
        while i < tokens.len() {
            bits |= Self::mask(tokens[i]);
            i += 1;
        }
        Self(bits)
    }

    /// Unions two token sets together.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Checks if the token is contained in the set.
    pub const fn contains(&self, token: u8) -> bool {
        self.0 & Self::mask(token) != 0
    }

    /// Gets the count of tokens in the set.
    pub const fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the raw tokens in the set.
    pub fn iter(&self) -> impl Iterator<Item = u8> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }

            let token = u8::try_from(bits.trailing_zeros())
                .expect("the maximum token value should be less than 128");

            bits ^= bits & bits.overflowing_neg().0;
            Some(token)
        })
    }

    /// Masks the given token to a `u128`.
    const fn mask(token: u8) -> u128 {
        1u128 << (token as usize)
    }
}

/// A lexer callback that consumes a block comment through its closing
/// `*/`, or through the end of input when the comment is unterminated.
fn block_comment(lex: &mut logos::Lexer<'_, Token>) {
    let remainder = lex.remainder();
    match remainder.find("*/") {
        Some(offset) => lex.bump(offset + 2),
        None => lex.bump(remainder.len()),
    }
}

/// A lexer callback that consumes a quoted literal through its closing
/// delimiter, or through the end of input when the literal is
/// unterminated.
///
/// A backslash escapes the byte that follows it.
fn quoted_literal(lex: &mut logos::Lexer<'_, Token>, delimiter: u8) {
    let remainder = lex.remainder().as_bytes();
    let mut offset = 0;
    while offset < remainder.len() {
        let byte = remainder[offset];
        offset += 1;
        if byte == b'\\' {
            offset += 1;
        } else if byte == delimiter {
            break;
        }
    }

    lex.bump(offset.min(remainder.len()));
}

/// A lexer callback for string literals.
fn string_literal(lex: &mut logos::Lexer<'_, Token>) {
    quoted_literal(lex, b'"');
}

/// A lexer callback for character literals.
fn char_literal(lex: &mut logos::Lexer<'_, Token>) {
    quoted_literal(lex, b'\'');
}

/// Represents the coarse classification of a token.
///
/// Groups partition the token types by the kind of character run that
/// produced them; the fine-grained [`Token`] type drives parsing while the
/// group is useful for reporting and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenGroup {
    /// Horizontal whitespace and newlines.
    Whitespace,
    /// An opening bracket (`{`, `(`, `[`, `<`).
    Open,
    /// A closing bracket (`}`, `)`, `]`, `>`).
    Close,
    /// A symbolic token (operators, separators, sigils).
    Symbolic,
    /// An escape character.
    Escape,
    /// An alphanumeric token (keywords and words).
    Alphanumeric,
    /// A string literal.
    StringLiteral,
    /// A character literal.
    CharLiteral,
    /// A numeric literal.
    Numeric,
    /// A hexadecimal numeric literal.
    HexNumeric,
    /// A comment.
    Comment,
}

/// Represents an Ix token.
///
/// The statement terminator `;` is optional in Ix source; the [`Lexer`]
/// wrapper inserts synthetic zero-length [`Stop`][Token::Stop] tokens
/// between adjacent tokens per the insertion rule (see
/// [`Lexer`] for details).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Token {
    /// Contiguous horizontal whitespace.
    #[regex(r"[ \t\r]+")]
    Whitespace,

    /// A line break.
    #[regex(r"\r?\n")]
    Newline,

    /// A line comment.
    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    /// A block comment.
    ///
    /// An unterminated block comment extends through the end of input.
    #[token("/*", block_comment)]
    BlockComment,

    /// A documentation directive comment.
    #[regex(r"#[^\n]*", allow_greedy = true)]
    DocComment,

    /// A literal integer.
    #[regex(r"[0-9]+")]
    Integer,

    /// A literal hexadecimal integer.
    #[regex(r"0[xX][0-9a-fA-F]+")]
    HexInteger,

    /// A string literal.
    ///
    /// An unterminated string literal extends through the end of input.
    #[token("\"", string_literal)]
    StringLiteral,

    /// A character literal.
    ///
    /// An unterminated character literal extends through the end of input.
    #[token("'", char_literal)]
    CharLiteral,

    /// A word.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    /// The `copyright` header keyword.
    #[token("copyright")]
    #[token("Copyright")]
    CopyrightKeyword,
    /// The `license` header keyword.
    #[token("license")]
    #[token("License")]
    #[token("licence")]
    #[token("Licence")]
    LicenseKeyword,

    /// The `class` keyword.
    #[token("class")]
    ClassKeyword,
    /// The `interface` keyword.
    #[token("interface")]
    InterfaceKeyword,
    /// The `package` keyword.
    #[token("package")]
    PackageKeyword,
    /// The `include` keyword.
    #[token("include")]
    IncludeKeyword,
    /// The `namespace` keyword.
    #[token("namespace")]
    NamespaceKeyword,

    /// The `public` access modifier keyword.
    #[token("public")]
    PublicKeyword,
    /// The `protected` access modifier keyword.
    #[token("protected")]
    ProtectedKeyword,
    /// The `private` access modifier keyword.
    #[token("private")]
    PrivateKeyword,
    /// The `function` modifier keyword.
    #[token("function")]
    FunctionKeyword,

    /// The `break` keyword.
    #[token("break")]
    BreakKeyword,
    /// The `case` keyword.
    #[token("case")]
    CaseKeyword,
    /// The `catch` keyword.
    #[token("catch")]
    CatchKeyword,
    /// The `const` keyword.
    #[token("const")]
    ConstKeyword,
    /// The `default` keyword.
    #[token("default")]
    DefaultKeyword,
    /// The `extends` keyword.
    #[token("extends")]
    ExtendsKeyword,
    /// The `implements` keyword.
    #[token("implements")]
    ImplementsKeyword,
    /// The `for` keyword.
    #[token("for")]
    ForKeyword,
    /// The `foreach` keyword.
    #[token("foreach")]
    ForeachKeyword,
    /// The `let` keyword.
    #[token("let")]
    LetKeyword,
    /// The `return` keyword.
    #[token("return")]
    ReturnKeyword,
    /// The `switch` keyword.
    #[token("switch")]
    SwitchKeyword,
    /// The `try` keyword.
    #[token("try")]
    TryKeyword,
    /// The `var` keyword.
    #[token("var")]
    VarKeyword,
    /// The `new` keyword.
    #[token("new")]
    NewKeyword,
    /// The `if` keyword.
    #[token("if")]
    IfKeyword,
    /// The `else` keyword.
    #[token("else")]
    ElseKeyword,
    /// The `while` keyword.
    #[token("while")]
    WhileKeyword,
    /// The `or` keyword.
    #[token("or")]
    OrKeyword,

    /// The `as` foreach binding keyword.
    #[token("as")]
    AsKeyword,
    /// The `in` foreach binding keyword.
    #[token("in")]
    InKeyword,

    /// The `bool` primitive type keyword.
    #[token("bool")]
    BoolTypeKeyword,
    /// The `boolean` primitive type keyword.
    #[token("boolean")]
    BooleanTypeKeyword,
    /// The `byte` primitive type keyword.
    #[token("byte")]
    ByteTypeKeyword,
    /// The `char` primitive type keyword.
    #[token("char")]
    CharTypeKeyword,
    /// The `double` primitive type keyword.
    #[token("double")]
    DoubleTypeKeyword,
    /// The `float` primitive type keyword.
    #[token("float")]
    FloatTypeKeyword,
    /// The `int` primitive type keyword.
    #[token("int")]
    IntTypeKeyword,
    /// The `integer` primitive type keyword.
    #[token("integer")]
    IntegerTypeKeyword,
    /// The `long` primitive type keyword.
    #[token("long")]
    LongTypeKeyword,
    /// The `short` primitive type keyword.
    #[token("short")]
    ShortTypeKeyword,
    /// The `signed` primitive type keyword.
    #[token("signed")]
    SignedTypeKeyword,
    /// The `string` primitive type keyword.
    #[token("string")]
    StringTypeKeyword,
    /// The `unsigned` primitive type keyword.
    #[token("unsigned")]
    UnsignedTypeKeyword,
    /// The `void` primitive type keyword.
    #[token("void")]
    VoidTypeKeyword,

    /// The `{` symbol.
    #[token("{")]
    OpenBrace,
    /// The `}` symbol.
    #[token("}")]
    CloseBrace,
    /// The `(` symbol.
    #[token("(")]
    OpenParen,
    /// The `)` symbol.
    #[token(")")]
    CloseParen,
    /// The `[` symbol.
    #[token("[")]
    OpenBracket,
    /// The `]` symbol.
    #[token("]")]
    CloseBracket,
    /// The `<` symbol.
    #[token("<")]
    OpenAngle,
    /// The `>` symbol.
    #[token(">")]
    CloseAngle,

    /// The `:` symbol.
    #[token(":")]
    Colon,
    /// The `,` symbol.
    #[token(",")]
    Comma,
    /// The `;` statement terminator.
    ///
    /// Synthetic terminators produced by the insertion rule carry a
    /// zero-length span.
    #[token(";")]
    Stop,
    /// The `.` member selector symbol.
    #[token(".")]
    Dot,
    /// The `@` instance member sigil.
    #[token("@")]
    At,
    /// The `%` class member sigil.
    #[token("%")]
    Percent,

    /// The `=` symbol.
    #[token("=")]
    Assignment,
    /// The `+=` symbol.
    #[token("+=")]
    PlusAssign,
    /// The `-=` symbol.
    #[token("-=")]
    MinusAssign,
    /// The `*=` symbol.
    #[token("*=")]
    StarAssign,
    /// The `/=` symbol.
    #[token("/=")]
    SlashAssign,

    /// The `==` symbol.
    #[token("==")]
    Equal,
    /// The `!=` symbol.
    #[token("!=")]
    NotEqual,
    /// The `<=` symbol.
    #[token("<=")]
    LessEqual,
    /// The `>=` symbol.
    #[token(">=")]
    GreaterEqual,
    /// The `&&` symbol.
    #[token("&&")]
    LogicalAnd,
    /// The `||` symbol.
    #[token("||")]
    LogicalOr,

    /// The `+` symbol.
    #[token("+")]
    Plus,
    /// The `-` symbol.
    #[token("-")]
    Minus,
    /// The `*` symbol.
    #[token("*")]
    Asterisk,
    /// The `/` symbol.
    #[token("/")]
    Slash,
    /// The `&` symbol.
    #[token("&")]
    Ampersand,
    /// The `|` symbol.
    #[token("|")]
    Pipe,
    /// The `^` symbol.
    #[token("^")]
    Caret,
    /// The `~` symbol.
    #[token("~")]
    Tilde,

    /// The `!` prefix operator symbol.
    #[token("!")]
    Exclamation,
    /// The `++` symbol.
    #[token("++")]
    Increment,
    /// The `--` symbol.
    #[token("--")]
    Decrement,
    /// The `\` escape character.
    #[token("\\")]
    Backslash,

    // WARNING: this must always be the last variant.
    /// The exclusive maximum token value.
    MAX,
}

/// Asserts that Token can fit in a TokenSet.
const _: () = assert!(Token::MAX as u8 <= 128);

/// The set of access modifier keywords that may introduce a class or
/// method declaration.
pub const MODIFIERS: TokenSet = TokenSet::new(&[
    Token::PublicKeyword as u8,
    Token::ProtectedKeyword as u8,
    Token::PrivateKeyword as u8,
    Token::FunctionKeyword as u8,
]);

/// The set of primitive type keywords.
pub const PRIMITIVE_TYPES: TokenSet = TokenSet::new(&[
    Token::BoolTypeKeyword as u8,
    Token::BooleanTypeKeyword as u8,
    Token::ByteTypeKeyword as u8,
    Token::CharTypeKeyword as u8,
    Token::DoubleTypeKeyword as u8,
    Token::FloatTypeKeyword as u8,
    Token::IntTypeKeyword as u8,
    Token::IntegerTypeKeyword as u8,
    Token::LongTypeKeyword as u8,
    Token::ShortTypeKeyword as u8,
    Token::SignedTypeKeyword as u8,
    Token::StringTypeKeyword as u8,
    Token::UnsignedTypeKeyword as u8,
    Token::VoidTypeKeyword as u8,
]);

/// The set of general keywords.
pub const GENERAL_KEYWORDS: TokenSet = TokenSet::new(&[
    Token::BreakKeyword as u8,
    Token::CaseKeyword as u8,
    Token::CatchKeyword as u8,
    Token::ConstKeyword as u8,
    Token::DefaultKeyword as u8,
    Token::ExtendsKeyword as u8,
    Token::ImplementsKeyword as u8,
    Token::ForKeyword as u8,
    Token::ForeachKeyword as u8,
    Token::LetKeyword as u8,
    Token::ReturnKeyword as u8,
    Token::SwitchKeyword as u8,
    Token::TryKeyword as u8,
    Token::VarKeyword as u8,
    Token::NewKeyword as u8,
    Token::IfKeyword as u8,
    Token::ElseKeyword as u8,
    Token::WhileKeyword as u8,
    Token::OrKeyword as u8,
]);

/// The set of keywords that introduce a complex (conditional) statement.
pub const CONDITIONAL_KEYWORDS: TokenSet = TokenSet::new(&[
    Token::IfKeyword as u8,
    Token::ElseKeyword as u8,
    Token::ForKeyword as u8,
    Token::ForeachKeyword as u8,
    Token::WhileKeyword as u8,
    Token::OrKeyword as u8,
]);

/// The set of token types that may directly precede a synthetic stop.
const STOP_INSERTION_PREV: TokenSet = PRIMITIVE_TYPES.union(TokenSet::new(&[
    Token::Ident as u8,
    Token::Integer as u8,
    Token::HexInteger as u8,
    Token::CloseParen as u8,
    Token::CloseBracket as u8,
    Token::Increment as u8,
    Token::Decrement as u8,
]));

/// The set of token types that may directly follow a synthetic stop.
const STOP_INSERTION_NEXT: TokenSet = GENERAL_KEYWORDS.union(TokenSet::new(&[
    Token::CloseBrace as u8,
    Token::Exclamation as u8,
    Token::Ident as u8,
    Token::At as u8,
    Token::Percent as u8,
]));

impl Token {
    /// Converts the token into its syntax representation.
    pub fn into_syntax(self) -> SyntaxKind {
        match self {
            Self::Whitespace => SyntaxKind::Whitespace,
            Self::Newline => SyntaxKind::Newline,
            Self::LineComment | Self::BlockComment | Self::DocComment => SyntaxKind::Comment,
            Self::Integer => SyntaxKind::Integer,
            Self::HexInteger => SyntaxKind::HexInteger,
            Self::StringLiteral => SyntaxKind::StringLiteral,
            Self::CharLiteral => SyntaxKind::CharLiteral,
            Self::Ident => SyntaxKind::Ident,
            Self::CopyrightKeyword => SyntaxKind::CopyrightKeyword,
            Self::LicenseKeyword => SyntaxKind::LicenseKeyword,
            Self::ClassKeyword => SyntaxKind::ClassKeyword,
            Self::InterfaceKeyword => SyntaxKind::InterfaceKeyword,
            Self::PackageKeyword => SyntaxKind::PackageKeyword,
            Self::IncludeKeyword => SyntaxKind::IncludeKeyword,
            Self::NamespaceKeyword => SyntaxKind::NamespaceKeyword,
            Self::PublicKeyword => SyntaxKind::PublicKeyword,
            Self::ProtectedKeyword => SyntaxKind::ProtectedKeyword,
            Self::PrivateKeyword => SyntaxKind::PrivateKeyword,
            Self::FunctionKeyword => SyntaxKind::FunctionKeyword,
            Self::BreakKeyword => SyntaxKind::BreakKeyword,
            Self::CaseKeyword => SyntaxKind::CaseKeyword,
            Self::CatchKeyword => SyntaxKind::CatchKeyword,
            Self::ConstKeyword => SyntaxKind::ConstKeyword,
            Self::DefaultKeyword => SyntaxKind::DefaultKeyword,
            Self::ExtendsKeyword => SyntaxKind::ExtendsKeyword,
            Self::ImplementsKeyword => SyntaxKind::ImplementsKeyword,
            Self::ForKeyword => SyntaxKind::ForKeyword,
            Self::ForeachKeyword => SyntaxKind::ForeachKeyword,
            Self::LetKeyword => SyntaxKind::LetKeyword,
            Self::ReturnKeyword => SyntaxKind::ReturnKeyword,
            Self::SwitchKeyword => SyntaxKind::SwitchKeyword,
            Self::TryKeyword => SyntaxKind::TryKeyword,
            Self::VarKeyword => SyntaxKind::VarKeyword,
            Self::NewKeyword => SyntaxKind::NewKeyword,
            Self::IfKeyword => SyntaxKind::IfKeyword,
            Self::ElseKeyword => SyntaxKind::ElseKeyword,
            Self::WhileKeyword => SyntaxKind::WhileKeyword,
            Self::OrKeyword => SyntaxKind::OrKeyword,
            Self::AsKeyword => SyntaxKind::AsKeyword,
            Self::InKeyword => SyntaxKind::InKeyword,
            Self::BoolTypeKeyword => SyntaxKind::BoolTypeKeyword,
            Self::BooleanTypeKeyword => SyntaxKind::BooleanTypeKeyword,
            Self::ByteTypeKeyword => SyntaxKind::ByteTypeKeyword,
            Self::CharTypeKeyword => SyntaxKind::CharTypeKeyword,
            Self::DoubleTypeKeyword => SyntaxKind::DoubleTypeKeyword,
            Self::FloatTypeKeyword => SyntaxKind::FloatTypeKeyword,
            Self::IntTypeKeyword => SyntaxKind::IntTypeKeyword,
            Self::IntegerTypeKeyword => SyntaxKind::IntegerTypeKeyword,
            Self::LongTypeKeyword => SyntaxKind::LongTypeKeyword,
            Self::ShortTypeKeyword => SyntaxKind::ShortTypeKeyword,
            Self::SignedTypeKeyword => SyntaxKind::SignedTypeKeyword,
            Self::StringTypeKeyword => SyntaxKind::StringTypeKeyword,
            Self::UnsignedTypeKeyword => SyntaxKind::UnsignedTypeKeyword,
            Self::VoidTypeKeyword => SyntaxKind::VoidTypeKeyword,
            Self::OpenBrace => SyntaxKind::OpenBrace,
            Self::CloseBrace => SyntaxKind::CloseBrace,
            Self::OpenParen => SyntaxKind::OpenParen,
            Self::CloseParen => SyntaxKind::CloseParen,
            Self::OpenBracket => SyntaxKind::OpenBracket,
            Self::CloseBracket => SyntaxKind::CloseBracket,
            Self::OpenAngle => SyntaxKind::OpenAngle,
            Self::CloseAngle => SyntaxKind::CloseAngle,
            Self::Colon => SyntaxKind::Colon,
            Self::Comma => SyntaxKind::Comma,
            Self::Stop => SyntaxKind::Stop,
            Self::Dot => SyntaxKind::Dot,
            Self::At => SyntaxKind::At,
            Self::Percent => SyntaxKind::Percent,
            Self::Assignment => SyntaxKind::Assignment,
            Self::PlusAssign => SyntaxKind::PlusAssign,
            Self::MinusAssign => SyntaxKind::MinusAssign,
            Self::StarAssign => SyntaxKind::StarAssign,
            Self::SlashAssign => SyntaxKind::SlashAssign,
            Self::Equal => SyntaxKind::Equal,
            Self::NotEqual => SyntaxKind::NotEqual,
            Self::LessEqual => SyntaxKind::LessEqual,
            Self::GreaterEqual => SyntaxKind::GreaterEqual,
            Self::LogicalAnd => SyntaxKind::LogicalAnd,
            Self::LogicalOr => SyntaxKind::LogicalOr,
            Self::Plus => SyntaxKind::Plus,
            Self::Minus => SyntaxKind::Minus,
            Self::Asterisk => SyntaxKind::Asterisk,
            Self::Slash => SyntaxKind::Slash,
            Self::Ampersand => SyntaxKind::Ampersand,
            Self::Pipe => SyntaxKind::Pipe,
            Self::Caret => SyntaxKind::Caret,
            Self::Tilde => SyntaxKind::Tilde,
            Self::Exclamation => SyntaxKind::Exclamation,
            Self::Increment => SyntaxKind::Increment,
            Self::Decrement => SyntaxKind::Decrement,
            Self::Backslash => SyntaxKind::Backslash,
            Self::MAX => unreachable!(),
        }
    }

    /// Converts the token into its "raw" representation.
    pub fn into_raw(self) -> u8 {
        self as u8
    }

    /// Converts from a raw token into the token.
    pub fn from_raw(token: u8) -> Self {
        assert!(token < Self::MAX as u8, "invalid token value");
        unsafe { std::mem::transmute::<u8, Self>(token) }
    }

    /// Gets the group of the token.
    pub fn group(self) -> TokenGroup {
        match self {
            Self::Whitespace | Self::Newline => TokenGroup::Whitespace,
            Self::LineComment | Self::BlockComment | Self::DocComment => TokenGroup::Comment,
            Self::Integer => TokenGroup::Numeric,
            Self::HexInteger => TokenGroup::HexNumeric,
            Self::StringLiteral => TokenGroup::StringLiteral,
            Self::CharLiteral => TokenGroup::CharLiteral,
            Self::OpenBrace | Self::OpenParen | Self::OpenBracket | Self::OpenAngle => {
                TokenGroup::Open
            }
            Self::CloseBrace | Self::CloseParen | Self::CloseBracket | Self::CloseAngle => {
                TokenGroup::Close
            }
            Self::Backslash => TokenGroup::Escape,
            Self::Ident
            | Self::CopyrightKeyword
            | Self::LicenseKeyword
            | Self::ClassKeyword
            | Self::InterfaceKeyword
            | Self::PackageKeyword
            | Self::IncludeKeyword
            | Self::NamespaceKeyword
            | Self::PublicKeyword
            | Self::ProtectedKeyword
            | Self::PrivateKeyword
            | Self::FunctionKeyword
            | Self::BreakKeyword
            | Self::CaseKeyword
            | Self::CatchKeyword
            | Self::ConstKeyword
            | Self::DefaultKeyword
            | Self::ExtendsKeyword
            | Self::ImplementsKeyword
            | Self::ForKeyword
            | Self::ForeachKeyword
            | Self::LetKeyword
            | Self::ReturnKeyword
            | Self::SwitchKeyword
            | Self::TryKeyword
            | Self::VarKeyword
            | Self::NewKeyword
            | Self::IfKeyword
            | Self::ElseKeyword
            | Self::WhileKeyword
            | Self::OrKeyword
            | Self::AsKeyword
            | Self::InKeyword
            | Self::BoolTypeKeyword
            | Self::BooleanTypeKeyword
            | Self::ByteTypeKeyword
            | Self::CharTypeKeyword
            | Self::DoubleTypeKeyword
            | Self::FloatTypeKeyword
            | Self::IntTypeKeyword
            | Self::IntegerTypeKeyword
            | Self::LongTypeKeyword
            | Self::ShortTypeKeyword
            | Self::SignedTypeKeyword
            | Self::StringTypeKeyword
            | Self::UnsignedTypeKeyword
            | Self::VoidTypeKeyword => TokenGroup::Alphanumeric,
            Self::Colon
            | Self::Comma
            | Self::Stop
            | Self::Dot
            | Self::At
            | Self::Percent
            | Self::Assignment
            | Self::PlusAssign
            | Self::MinusAssign
            | Self::StarAssign
            | Self::SlashAssign
            | Self::Equal
            | Self::NotEqual
            | Self::LessEqual
            | Self::GreaterEqual
            | Self::LogicalAnd
            | Self::LogicalOr
            | Self::Plus
            | Self::Minus
            | Self::Asterisk
            | Self::Slash
            | Self::Ampersand
            | Self::Pipe
            | Self::Caret
            | Self::Tilde
            | Self::Exclamation
            | Self::Increment
            | Self::Decrement => TokenGroup::Symbolic,
            Self::MAX => unreachable!(),
        }
    }

    /// Describes the token.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Whitespace => "whitespace",
            Self::Newline => "newline",
            Self::LineComment | Self::BlockComment | Self::DocComment => "comment",
            Self::Integer => "integer",
            Self::HexInteger => "hexadecimal integer",
            Self::StringLiteral => "string",
            Self::CharLiteral => "character",
            Self::Ident => "word",
            Self::CopyrightKeyword => "`copyright` keyword",
            Self::LicenseKeyword => "`license` keyword",
            Self::ClassKeyword => "`class` keyword",
            Self::InterfaceKeyword => "`interface` keyword",
            Self::PackageKeyword => "`package` keyword",
            Self::IncludeKeyword => "`include` keyword",
            Self::NamespaceKeyword => "`namespace` keyword",
            Self::PublicKeyword => "`public` keyword",
            Self::ProtectedKeyword => "`protected` keyword",
            Self::PrivateKeyword => "`private` keyword",
            Self::FunctionKeyword => "`function` keyword",
            Self::BreakKeyword => "`break` keyword",
            Self::CaseKeyword => "`case` keyword",
            Self::CatchKeyword => "`catch` keyword",
            Self::ConstKeyword => "`const` keyword",
            Self::DefaultKeyword => "`default` keyword",
            Self::ExtendsKeyword => "`extends` keyword",
            Self::ImplementsKeyword => "`implements` keyword",
            Self::ForKeyword => "`for` keyword",
            Self::ForeachKeyword => "`foreach` keyword",
            Self::LetKeyword => "`let` keyword",
            Self::ReturnKeyword => "`return` keyword",
            Self::SwitchKeyword => "`switch` keyword",
            Self::TryKeyword => "`try` keyword",
            Self::VarKeyword => "`var` keyword",
            Self::NewKeyword => "`new` keyword",
            Self::IfKeyword => "`if` keyword",
            Self::ElseKeyword => "`else` keyword",
            Self::WhileKeyword => "`while` keyword",
            Self::OrKeyword => "`or` keyword",
            Self::AsKeyword => "`as` keyword",
            Self::InKeyword => "`in` keyword",
            Self::BoolTypeKeyword => "`bool` keyword",
            Self::BooleanTypeKeyword => "`boolean` keyword",
            Self::ByteTypeKeyword => "`byte` keyword",
            Self::CharTypeKeyword => "`char` keyword",
            Self::DoubleTypeKeyword => "`double` keyword",
            Self::FloatTypeKeyword => "`float` keyword",
            Self::IntTypeKeyword => "`int` keyword",
            Self::IntegerTypeKeyword => "`integer` keyword",
            Self::LongTypeKeyword => "`long` keyword",
            Self::ShortTypeKeyword => "`short` keyword",
            Self::SignedTypeKeyword => "`signed` keyword",
            Self::StringTypeKeyword => "`string` keyword",
            Self::UnsignedTypeKeyword => "`unsigned` keyword",
            Self::VoidTypeKeyword => "`void` keyword",
            Self::OpenBrace => "`{`",
            Self::CloseBrace => "`}`",
            Self::OpenParen => "`(`",
            Self::CloseParen => "`)`",
            Self::OpenBracket => "`[`",
            Self::CloseBracket => "`]`",
            Self::OpenAngle => "`<`",
            Self::CloseAngle => "`>`",
            Self::Colon => "`:`",
            Self::Comma => "`,`",
            Self::Stop => "`;`",
            Self::Dot => "`.`",
            Self::At => "`@`",
            Self::Percent => "`%`",
            Self::Assignment => "`=`",
            Self::PlusAssign => "`+=`",
            Self::MinusAssign => "`-=`",
            Self::StarAssign => "`*=`",
            Self::SlashAssign => "`/=`",
            Self::Equal => "`==`",
            Self::NotEqual => "`!=`",
            Self::LessEqual => "`<=`",
            Self::GreaterEqual => "`>=`",
            Self::LogicalAnd => "`&&`",
            Self::LogicalOr => "`||`",
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::Asterisk => "`*`",
            Self::Slash => "`/`",
            Self::Ampersand => "`&`",
            Self::Pipe => "`|`",
            Self::Caret => "`^`",
            Self::Tilde => "`~`",
            Self::Exclamation => "`!`",
            Self::Increment => "`++`",
            Self::Decrement => "`--`",
            Self::Backslash => "`\\`",
            Self::MAX => unreachable!(),
        }
    }

    /// Determines if the token is trivia that should be skipped over
    /// by the parser.
    ///
    /// Trivia tokens are still added to the concrete syntax tree.
    ///
    /// Newlines are not trivia: header lines and one-line constructs are
    /// newline-terminated, so the grammar consumes them explicitly.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::LineComment | Self::BlockComment | Self::DocComment
        )
    }
}

/// The result type for the lexer.
pub type LexerResult<T> = Result<T, ()>;

/// Determines whether a synthetic stop must be inserted between the
/// previous non-trivial token and the next token.
fn stop_between(last: Option<Token>, next: Token) -> bool {
    match last {
        Some(last) => {
            STOP_INSERTION_PREV.contains(last.into_raw())
                && STOP_INSERTION_NEXT.contains(next.into_raw())
        }
        None => false,
    }
}

/// Implements an Ix lexer.
///
/// A lexer produces a stream of tokens from an Ix source string.
///
/// On top of the raw token stream, the lexer maintains the type of the
/// last non-trivial token it produced and inserts a synthetic zero-length
/// [`Stop`][Token::Stop] token whenever the pair (last, next) matches the
/// statement terminator insertion rule. Insertion is suppressed from a
/// `copyright` or `license` keyword through the next newline, as header
/// lines are free-form.
#[allow(missing_debug_implementations)]
#[derive(Clone)]
pub struct Lexer<'a> {
    /// The underlying logos lexer.
    lexer: logos::Lexer<'a, Token>,
    /// Tokens ready to be returned, least recent first.
    ///
    /// Priming the queue may enqueue a synthetic stop ahead of the raw
    /// token that triggered it.
    queue: VecDeque<(LexerResult<Token>, Span)>,
    /// The type of the last non-trivial token produced.
    last: Option<Token>,
    /// Whether stop insertion is suppressed until the next newline.
    suppress_stops: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source string.
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Token::lexer(source),
            queue: VecDeque::new(),
            last: None,
            suppress_stops: false,
        }
    }

    /// Gets the source string of the given span.
    pub fn source(&self, span: Span) -> &'a str {
        &self.lexer.source()[span.start()..span.end()]
    }

    /// Gets the length of the source.
    pub fn source_len(&self) -> usize {
        self.lexer.source().len()
    }

    /// Gets the current span of the lexer.
    pub fn span(&self) -> Span {
        self.lexer.span().into()
    }

    /// Peeks at the next token.
    pub fn peek(&mut self) -> Option<(LexerResult<Token>, Span)> {
        self.prime();
        self.queue.front().copied()
    }

    /// Fills the queue with the next raw token, preceded by a synthetic
    /// stop when the insertion rule fires.
    fn prime(&mut self) {
        if !self.queue.is_empty() {
            return;
        }

        let result = match self.lexer.next() {
            Some(result) => result,
            None => return,
        };

        let span: Span = self.lexer.span().into();
        if let Ok(token) = result {
            match token {
                Token::Whitespace
                | Token::LineComment
                | Token::BlockComment
                | Token::DocComment => {}
                Token::Newline => {
                    self.suppress_stops = false;
                }
                _ => {
                    if !self.suppress_stops && stop_between(self.last, token) {
                        self.queue
                            .push_back((Ok(Token::Stop), Span::new(span.start(), 0)));
                    }

                    if matches!(token, Token::CopyrightKeyword | Token::LicenseKeyword) {
                        self.suppress_stops = true;
                    }

                    self.last = Some(token);
                }
            }
        }

        self.queue.push_back((result, span));
    }
}

impl Iterator for Lexer<'_> {
    type Item = (LexerResult<Token>, Span);

    fn next(&mut self) -> Option<Self::Item> {
        self.prime();
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    pub(crate) fn map(
        (t, s): (LexerResult<Token>, Span),
    ) -> (LexerResult<Token>, std::ops::Range<usize>) {
        (t, s.start()..s.end())
    }

    #[test]
    fn whitespace_and_newlines() {
        use Token::*;
        let lexer = Lexer::new(" \t\n \n");
        let tokens: Vec<_> = lexer.map(map).collect();
        assert_eq!(
            tokens,
            &[
                (Ok(Whitespace), 0..2),
                (Ok(Newline), 2..3),
                (Ok(Whitespace), 3..4),
                (Ok(Newline), 4..5),
            ],
            "produced tokens did not match the expected set"
        );
    }

    #[test]
    fn keywords_and_words() {
        use Token::*;
        let lexer = Lexer::new("class classes foreach foreaches int interior");
        let tokens: Vec<_> = lexer.filter(|(t, _)| *t != Ok(Whitespace)).map(map).collect();
        assert_eq!(
            tokens,
            &[
                (Ok(ClassKeyword), 0..5),
                (Ok(Ident), 6..13),
                // A word followed by a keyword recovers the missing terminator.
                (Ok(Stop), 14..14),
                (Ok(ForeachKeyword), 14..21),
                (Ok(Ident), 22..31),
                (Ok(IntTypeKeyword), 32..35),
                // A primitive followed by a word recovers the missing terminator.
                (Ok(Stop), 36..36),
                (Ok(Ident), 36..44),
            ],
        );
    }

    #[test]
    fn symbols() {
        use Token::*;
        let lexer = Lexer::new("{ } ( ) [ ] < > : , ; . == != <= >= && || += ++");
        let tokens: Vec<_> = lexer.filter(|(t, _)| *t != Ok(Whitespace)).map(map).collect();
        assert_eq!(
            tokens,
            &[
                (Ok(OpenBrace), 0..1),
                (Ok(CloseBrace), 2..3),
                (Ok(OpenParen), 4..5),
                (Ok(CloseParen), 6..7),
                (Ok(OpenBracket), 8..9),
                (Ok(CloseBracket), 10..11),
                (Ok(OpenAngle), 12..13),
                (Ok(CloseAngle), 14..15),
                (Ok(Colon), 16..17),
                (Ok(Comma), 18..19),
                (Ok(Stop), 20..21),
                (Ok(Dot), 22..23),
                (Ok(Equal), 24..26),
                (Ok(NotEqual), 27..29),
                (Ok(LessEqual), 30..32),
                (Ok(GreaterEqual), 33..35),
                (Ok(LogicalAnd), 36..38),
                (Ok(LogicalOr), 39..41),
                (Ok(PlusAssign), 42..44),
                (Ok(Increment), 45..47),
            ],
        );
    }

    #[test]
    fn stop_inserted_between_members() {
        use Token::*;
        let lexer = Lexer::new("@data: char[]\n%count: int\n}");
        let tokens: Vec<_> = lexer
            .filter(|(t, _)| !matches!(t, Ok(Whitespace) | Ok(Newline)))
            .map(map)
            .collect();
        assert_eq!(
            tokens,
            &[
                (Ok(At), 0..1),
                (Ok(Ident), 1..5),
                (Ok(Colon), 5..6),
                (Ok(CharTypeKeyword), 7..11),
                (Ok(OpenBracket), 11..12),
                (Ok(CloseBracket), 12..13),
                // `]` followed by `%` recovers the missing terminator.
                (Ok(Stop), 14..14),
                (Ok(Percent), 14..15),
                (Ok(Ident), 15..20),
                (Ok(Colon), 20..21),
                (Ok(IntTypeKeyword), 22..25),
                // `int` followed by `}` recovers the missing terminator.
                (Ok(Stop), 26..26),
                (Ok(CloseBrace), 26..27),
            ],
        );
    }

    #[test]
    fn stop_inserted_between_statements() {
        use Token::*;
        let lexer = Lexer::new("x = foo( a )\nreturn x");
        let tokens: Vec<_> = lexer
            .filter(|(t, _)| !matches!(t, Ok(Whitespace) | Ok(Newline)))
            .map(map)
            .collect();
        assert_eq!(
            tokens,
            &[
                (Ok(Ident), 0..1),
                (Ok(Assignment), 2..3),
                (Ok(Ident), 4..7),
                (Ok(OpenParen), 7..8),
                (Ok(Ident), 9..10),
                (Ok(CloseParen), 11..12),
                (Ok(Stop), 13..13),
                (Ok(ReturnKeyword), 13..19),
                (Ok(Ident), 20..21),
            ],
        );
    }

    #[test]
    fn no_stop_inside_foreach_head() {
        use Token::*;
        let lexer = Lexer::new("( character in aString )");
        let tokens: Vec<_> = lexer.filter(|(t, _)| *t != Ok(Whitespace)).map(map).collect();
        assert_eq!(
            tokens,
            &[
                (Ok(OpenParen), 0..1),
                (Ok(Ident), 2..11),
                (Ok(InKeyword), 12..14),
                (Ok(Ident), 15..22),
                (Ok(CloseParen), 23..24),
            ],
        );
    }

    #[test]
    fn no_stops_inside_header_lines() {
        use Token::*;
        let lexer = Lexer::new("Copyright 2021 Daniel Robert Bradley\nLicense MIT");
        let tokens: Vec<_> = lexer
            .filter(|(t, _)| !matches!(t, Ok(Whitespace) | Ok(Newline)))
            .map(map)
            .collect();
        assert_eq!(
            tokens,
            &[
                (Ok(CopyrightKeyword), 0..9),
                (Ok(Integer), 10..14),
                (Ok(Ident), 15..21),
                (Ok(Ident), 22..28),
                (Ok(Ident), 29..36),
                (Ok(LicenseKeyword), 37..44),
                (Ok(Ident), 45..48),
            ],
        );
    }

    #[test]
    fn synthetic_stops_are_zero_length() {
        let lexer = Lexer::new("a b; c");
        let stops: Vec<_> = lexer
            .filter(|(t, _)| *t == Ok(Token::Stop))
            .map(map)
            .collect();
        // One synthetic stop between `a` and `b`, one real stop after `b`,
        // and no stop before `c` because `;` is not a statement ender that
        // triggers insertion.
        assert_eq!(
            stops,
            &[(Ok(Token::Stop), 2..2), (Ok(Token::Stop), 3..4)],
        );
    }

    #[test]
    fn comments() {
        use Token::*;
        let lexer = Lexer::new("// line\n/* block\ncomment */\n# directive");
        let tokens: Vec<_> = lexer
            .filter(|(t, _)| !matches!(t, Ok(Whitespace) | Ok(Newline)))
            .map(map)
            .collect();
        assert_eq!(
            tokens,
            &[
                (Ok(LineComment), 0..7),
                (Ok(BlockComment), 8..27),
                (Ok(DocComment), 28..39),
            ],
        );
    }

    #[test]
    fn unterminated_literals_extend_to_end_of_input() {
        use Token::*;
        let lexer = Lexer::new("\"unterminated");
        let tokens: Vec<_> = lexer.map(map).collect();
        assert_eq!(tokens, &[(Ok(StringLiteral), 0..13)]);

        let lexer = Lexer::new("/* unterminated");
        let tokens: Vec<_> = lexer.map(map).collect();
        assert_eq!(tokens, &[(Ok(BlockComment), 0..15)]);
    }

    #[test]
    fn string_escapes() {
        use Token::*;
        let lexer = Lexer::new(r#""a \" b" 'c'"#);
        let tokens: Vec<_> = lexer.filter(|(t, _)| *t != Ok(Whitespace)).map(map).collect();
        assert_eq!(
            tokens,
            &[(Ok(StringLiteral), 0..8), (Ok(CharLiteral), 9..12)],
        );
    }

    #[test]
    fn numerics() {
        use Token::*;
        let lexer = Lexer::new("0 123 0x1F 0XaB");
        let tokens: Vec<_> = lexer.filter(|(t, _)| *t != Ok(Whitespace)).map(map).collect();
        assert_eq!(
            tokens,
            &[
                (Ok(Integer), 0..1),
                (Ok(Integer), 2..5),
                (Ok(HexInteger), 6..10),
                (Ok(HexInteger), 11..15),
            ],
        );
    }

    #[test]
    fn groups() {
        assert_eq!(Token::Whitespace.group(), TokenGroup::Whitespace);
        assert_eq!(Token::OpenParen.group(), TokenGroup::Open);
        assert_eq!(Token::CloseBracket.group(), TokenGroup::Close);
        assert_eq!(Token::At.group(), TokenGroup::Symbolic);
        assert_eq!(Token::ClassKeyword.group(), TokenGroup::Alphanumeric);
        assert_eq!(Token::Integer.group(), TokenGroup::Numeric);
        assert_eq!(Token::HexInteger.group(), TokenGroup::HexNumeric);
        assert_eq!(Token::BlockComment.group(), TokenGroup::Comment);
        assert_eq!(Token::Backslash.group(), TokenGroup::Escape);
    }
}
