//! Module for the Ix grammar functions.
//!
//! Each function parses one grammatical context. At every decision point
//! the allowed token set is checked and any out-of-grammar run is
//! quarantined under an `UnexpectedNode` (see [`Parser::quarantine`]) so
//! that parsing always terminates and the tree preserves the source.

use super::lexer::Token;
use super::lexer::TokenSet;
use super::lexer::CONDITIONAL_KEYWORDS;
use super::lexer::MODIFIERS;
use super::lexer::PRIMITIVE_TYPES;
use super::parser::expected_found;
use super::parser::expected_one_of;
use super::parser::unmatched;
use super::parser::Marker;
use super::parser::Parser;
use super::tree::SyntaxKind;
use super::Diagnostic;
use super::Span;

/// The set of header line keywords.
const HEADER_KEYWORDS: TokenSet = TokenSet::new(&[
    Token::CopyrightKeyword as u8,
    Token::LicenseKeyword as u8,
]);

/// The set of member sigils.
const MEMBER_SIGILS: TokenSet = TokenSet::new(&[Token::At as u8, Token::Percent as u8]);

/// The set of inheritance clause keywords.
const INHERIT_KEYWORDS: TokenSet = TokenSet::new(&[
    Token::ExtendsKeyword as u8,
    Token::ImplementsKeyword as u8,
]);

/// The set of tokens that may begin a type name.
const TYPE_NAME_SET: TokenSet = PRIMITIVE_TYPES.union(TokenSet::new(&[Token::Ident as u8]));

/// The set of tokens separating items at the root.
const ROOT_TRIVIAL_SET: TokenSet =
    TokenSet::new(&[Token::Newline as u8, Token::Stop as u8]);

/// The expected set at the root once the header has been passed.
const ROOT_BODY_SET: TokenSet = MODIFIERS.union(ROOT_TRIVIAL_SET);

/// The expected set at the root once a license line has been seen.
const ROOT_LICENSE_SET: TokenSet =
    ROOT_BODY_SET.union(TokenSet::new(&[Token::LicenseKeyword as u8]));

/// The expected set at the start of a source file.
const ROOT_HEADER_SET: TokenSet =
    ROOT_LICENSE_SET.union(TokenSet::new(&[Token::CopyrightKeyword as u8]));

/// The recovery set inside a class header.
const CLASS_HEADER_SET: TokenSet = INHERIT_KEYWORDS.union(TokenSet::new(&[
    Token::OpenBrace as u8,
    Token::Newline as u8,
    Token::Stop as u8,
]));

/// The recovery set inside a class block.
const MEMBER_RECOVERY_SET: TokenSet = MEMBER_SIGILS.union(TokenSet::new(&[
    Token::CloseBrace as u8,
    Token::Newline as u8,
    Token::Stop as u8,
]));

/// The recovery set inside a parameter list.
const PARAM_RECOVERY_SET: TokenSet = TokenSet::new(&[
    Token::Ident as u8,
    Token::Comma as u8,
    Token::CloseParen as u8,
    Token::Newline as u8,
]);

/// Tracks which items remain expected at the root.
///
/// Copyright lines come before license lines, which come before
/// declarations; once a later category is seen, earlier ones are no
/// longer in the expected set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RootPhase {
    /// Copyright lines, license lines, and declarations are expected.
    Copyright,
    /// License lines and declarations are expected.
    License,
    /// Only declarations are expected.
    Body,
}

impl RootPhase {
    /// Gets the expected token set and item names for the phase.
    fn expected(self) -> (TokenSet, &'static [&'static str]) {
        match self {
            Self::Copyright => (
                ROOT_HEADER_SET,
                &["copyright line", "license line", "class or method declaration"],
            ),
            Self::License => (
                ROOT_LICENSE_SET,
                &["license line", "class or method declaration"],
            ),
            Self::Body => (ROOT_BODY_SET, &["class or method declaration"]),
        }
    }
}

/// Splits a peek result into the parts of an expectation diagnostic.
fn found_parts(
    parser: &Parser<'_>,
    found: Option<(Token, Span)>,
) -> (Option<&'static str>, Span) {
    found
        .map(|(t, s)| (Some(t.describe()), s))
        .unwrap_or_else(|| (None, parser.span()))
}

/// Parses an Ix source file.
///
/// The root's expected set narrows as the header is passed.
pub fn source_file(parser: &mut Parser<'_>) {
    let root = parser.start();

    let mut phase = RootPhase::Copyright;
    loop {
        match parser.peek() {
            None => break,
            Some((Token::Newline | Token::Stop, _)) => {
                parser.next();
            }
            Some((Token::CopyrightKeyword, _)) if phase == RootPhase::Copyright => {
                let marker = parser.start();
                header_line(parser, marker, SyntaxKind::CopyrightNode);
            }
            Some((Token::LicenseKeyword, _)) if phase <= RootPhase::License => {
                phase = RootPhase::License;
                let marker = parser.start();
                header_line(parser, marker, SyntaxKind::LicenseNode);
            }
            Some((t, _)) if MODIFIERS.contains(t.into_raw()) => {
                phase = RootPhase::Body;
                let marker = parser.start();
                if let Err((marker, e)) = declaration(parser, marker) {
                    parser.diagnostic(e);
                    marker.abandon(parser);
                }
            }
            Some(_) => {
                let (allowed, expected) = phase.expected();
                parser.quarantine(allowed, expected);
            }
        }
    }

    // This call to `next` is important as `next` adds any remaining
    // buffered events
    assert!(parser.next().is_none(), "parser is not finished");
    root.complete(parser, SyntaxKind::RootNode);
}

/// Parses a copyright or license header line.
///
/// The line is free-form: every token through the terminating newline
/// becomes part of the node.
fn header_line(parser: &mut Parser<'_>, marker: Marker, kind: SyntaxKind) {
    parser.require_in(HEADER_KEYWORDS);

    while let Some((token, _)) = parser.peek() {
        parser.next();
        if token == Token::Newline {
            break;
        }
    }

    marker.complete(parser, kind);
}

/// Parses a modifier-led declaration: a class definition or a method.
fn declaration(parser: &mut Parser<'_>, marker: Marker) -> Result<(), (Marker, Diagnostic)> {
    parser.require_in(MODIFIERS);
    parser.skip_newlines();

    match parser.peek() {
        Some((Token::ClassKeyword, _)) => {
            // `modifier class name(` is a static method; anything else
            // following the `class` keyword is a class definition.
            match parser.peek2() {
                Some(peek2)
                    if matches!(
                        peek2.second.0,
                        Token::Ident | Token::NewKeyword | Token::ConstKeyword
                    ) =>
                {
                    method(parser, marker)
                }
                _ => class_definition(parser, marker),
            }
        }
        Some((Token::Ident | Token::NewKeyword | Token::ConstKeyword, _)) => {
            method(parser, marker)
        }
        found => {
            let (found, span) = found_parts(parser, found);
            Err((
                marker,
                expected_one_of(&["`class` keyword", "method name"], found, span),
            ))
        }
    }
}

/// Parses a class definition.
fn class_definition(parser: &mut Parser<'_>, marker: Marker) -> Result<(), (Marker, Diagnostic)> {
    parser.require(Token::ClassKeyword);

    // Class header: optional inheritance clauses through the open brace.
    let open_span = loop {
        match parser.peek() {
            Some((Token::ExtendsKeyword, _)) => {
                let m = parser.start();
                inherit_clause(parser, m, SyntaxKind::ExtendsClauseNode);
            }
            Some((Token::ImplementsKeyword, _)) => {
                let m = parser.start();
                inherit_clause(parser, m, SyntaxKind::ImplementsClauseNode);
            }
            Some((Token::Newline | Token::Stop, _)) => {
                parser.next();
            }
            Some((Token::OpenBrace, _)) => break parser.require(Token::OpenBrace),
            None => {
                return Err((marker, expected_found("`{`", None, parser.span())));
            }
            Some(_) => {
                if parser
                    .quarantine(CLASS_HEADER_SET, &["`extends`", "`implements`", "`{`"])
                    .is_none()
                {
                    return Err((marker, expected_found("`{`", None, parser.span())));
                }
            }
        }
    };

    // Class block: members through the close brace.
    loop {
        match parser.peek() {
            Some((Token::CloseBrace, _)) => {
                parser.next();
                break;
            }
            Some((Token::At | Token::Percent, _)) => {
                let m = parser.start();
                member(parser, m);
            }
            Some((Token::Newline | Token::Stop, _)) => {
                parser.next();
            }
            None => {
                parser.diagnostic(unmatched(
                    "`{`",
                    open_span,
                    "`}`",
                    "end of input",
                    parser.span(),
                ));
                break;
            }
            Some(_) => {
                parser.quarantine(
                    MEMBER_RECOVERY_SET,
                    &["instance member", "class member", "`}`"],
                );
            }
        }
    }

    marker.complete(parser, SyntaxKind::ClassDefinitionNode);
    Ok(())
}

/// Parses an `extends` or `implements` clause.
fn inherit_clause(parser: &mut Parser<'_>, marker: Marker, kind: SyntaxKind) {
    parser.require_in(INHERIT_KEYWORDS);

    while let Some((Token::Ident | Token::Dot | Token::Comma, _)) = parser.peek() {
        parser.next();
    }

    marker.complete(parser, kind);
}

/// Parses a class member.
fn member(parser: &mut Parser<'_>, marker: Marker) {
    parser.require_in(MEMBER_SIGILS);

    if let Err(e) = parser.expect_with_name(Token::Ident, "member name") {
        parser.diagnostic(e);
        marker.complete(parser, SyntaxKind::MemberNode);
        return;
    }

    match parser.expect(Token::Colon) {
        Ok(_) => type_expr(parser),
        Err(e) => {
            parser.diagnostic(e);
            marker.complete(parser, SyntaxKind::MemberNode);
            return;
        }
    }

    if parser.next_if(Token::Assignment) {
        // The default value is a one-liner: it ends at a terminator, at
        // the end of the line, or at the closing brace.
        loop {
            match parser.peek() {
                None => break,
                Some((Token::Stop, _)) => {
                    parser.next();
                    break;
                }
                Some((Token::Newline | Token::CloseBrace, _)) => break,
                Some((Token::OpenParen, _)) => {
                    let m = parser.start();
                    expression_group(parser, m);
                }
                Some(_) => {
                    parser.next();
                }
            }
        }
    }

    marker.complete(parser, SyntaxKind::MemberNode);
}

/// Parses a type annotation.
///
/// A type is a possibly dotted name followed by any run of the `[]`,
/// `*`, and `&` decorations; a leading `const` is accepted.
fn type_expr(parser: &mut Parser<'_>) {
    let marker = parser.start();

    parser.next_if(Token::ConstKeyword);

    match parser.peek() {
        Some((t, _)) if TYPE_NAME_SET.contains(t.into_raw()) => {
            parser.next();
            while parser.next_if(Token::Dot) {
                if !parser.next_if(Token::Ident) {
                    let found = parser.peek();
                    let (found, span) = found_parts(parser, found);
                    parser.diagnostic(expected_found("type name segment", found, span));
                    break;
                }
            }
        }
        found => {
            let (found, span) = found_parts(parser, found);
            parser.diagnostic(expected_found("type name", found, span));
        }
    }

    loop {
        match parser.peek() {
            Some((Token::OpenBracket, _)) => {
                parser.next();
                if let Err(e) = parser.expect(Token::CloseBracket) {
                    parser.diagnostic(e);
                    break;
                }
            }
            Some((Token::Asterisk | Token::Ampersand, _)) => {
                parser.next();
            }
            _ => break,
        }
    }

    marker.complete(parser, SyntaxKind::TypeNode);
}

/// Parses a method.
///
/// The modifier has already been consumed; the optional `class` (static)
/// and `const` markers precede the method name.
fn method(parser: &mut Parser<'_>, marker: Marker) -> Result<(), (Marker, Diagnostic)> {
    while matches!(
        parser.peek(),
        Some((Token::ClassKeyword | Token::ConstKeyword, _))
    ) {
        parser.next();
    }

    match parser.peek() {
        Some((Token::Ident | Token::NewKeyword, _)) => {
            parser.next();
        }
        found => {
            let (found, span) = found_parts(parser, found);
            return Err((marker, expected_found("method name", found, span)));
        }
    }

    parser.skip_newlines();
    let open_span = match parser.expect(Token::OpenParen) {
        Ok(span) => span,
        Err(e) => return Err((marker, e)),
    };

    loop {
        match parser.peek() {
            Some((Token::CloseParen, _)) => {
                parser.next();
                break;
            }
            Some((Token::Comma | Token::Newline | Token::Stop, _)) => {
                parser.next();
            }
            Some((Token::Ident, _)) => {
                let m = parser.start();
                parameter(parser, m);
            }
            None => {
                parser.diagnostic(unmatched(
                    "`(`",
                    open_span,
                    "`)`",
                    "end of input",
                    parser.span(),
                ));
                break;
            }
            Some(_) => {
                parser.quarantine(PARAM_RECOVERY_SET, &["parameter name", "`)`"]);
            }
        }
    }

    if parser.next_if(Token::Colon) {
        type_expr(parser);
    }

    parser.skip_newlines();
    match parser.peek() {
        Some((Token::OpenBrace, _)) => {
            let m = parser.start();
            block(parser, m);
        }
        found => {
            let (found, span) = found_parts(parser, found);
            parser.diagnostic(expected_found("`{`", found, span));
        }
    }

    marker.complete(parser, SyntaxKind::MethodNode);
    Ok(())
}

/// Parses a method parameter.
fn parameter(parser: &mut Parser<'_>, marker: Marker) {
    parser.require(Token::Ident);

    match parser.expect(Token::Colon) {
        Ok(_) => type_expr(parser),
        Err(e) => parser.diagnostic(e),
    }

    if parser.next_if(Token::Assignment) {
        loop {
            match parser.peek() {
                None => break,
                Some((Token::Comma | Token::CloseParen | Token::Newline, _)) => break,
                Some((Token::OpenParen, _)) => {
                    let m = parser.start();
                    expression_group(parser, m);
                }
                Some(_) => {
                    parser.next();
                }
            }
        }
    }

    marker.complete(parser, SyntaxKind::ParameterNode);
}

/// Parses a brace-delimited block of statements.
fn block(parser: &mut Parser<'_>, marker: Marker) {
    let open_span = parser.require(Token::OpenBrace);

    loop {
        match parser.peek() {
            Some((Token::CloseBrace, _)) => {
                parser.next();
                break;
            }
            Some((Token::Newline | Token::Stop, _)) => {
                parser.next();
            }
            None => {
                parser.diagnostic(unmatched(
                    "`{`",
                    open_span,
                    "`}`",
                    "end of input",
                    parser.span(),
                ));
                break;
            }
            Some(_) => {
                let m = parser.start();
                statement(parser, m);
            }
        }
    }

    marker.complete(parser, SyntaxKind::BlockNode);
}

/// Parses a single statement.
fn statement(parser: &mut Parser<'_>, marker: Marker) {
    match parser.peek() {
        Some((Token::VarKeyword, _)) => declaration_statement(parser, marker),
        Some((t, _)) if CONDITIONAL_KEYWORDS.contains(t.into_raw()) => {
            conditional_statement(parser, marker)
        }
        _ => expression_statement(parser, marker),
    }
}

/// Parses a `var` declaration statement.
fn declaration_statement(parser: &mut Parser<'_>, marker: Marker) {
    parser.require(Token::VarKeyword);

    if let Err(e) = parser.expect_with_name(Token::Ident, "declaration name") {
        parser.diagnostic(e);
        marker.complete(parser, SyntaxKind::DeclarationStatementNode);
        return;
    }

    if parser.next_if(Token::Colon) {
        type_expr(parser);
    }

    if parser.next_if(Token::Assignment) {
        loop {
            match parser.peek() {
                None => break,
                Some((Token::Stop, _)) => {
                    parser.next();
                    break;
                }
                Some((Token::Newline | Token::CloseBrace, _)) => break,
                Some((Token::OpenParen, _)) => {
                    let m = parser.start();
                    expression_group(parser, m);
                }
                Some(_) => {
                    parser.next();
                }
            }
        }
    }

    marker.complete(parser, SyntaxKind::DeclarationStatementNode);
}

/// Parses a conditional (complex) statement.
///
/// The head expression is optional: `else` has none.
fn conditional_statement(parser: &mut Parser<'_>, marker: Marker) {
    parser.require_in(CONDITIONAL_KEYWORDS);

    if let Some((Token::OpenParen, _)) = parser.peek() {
        let m = parser.start();
        expression_group(parser, m);
    }

    parser.skip_newlines();
    match parser.peek() {
        Some((Token::OpenBrace, _)) => {
            let m = parser.start();
            block(parser, m);
        }
        found => {
            let (found, span) = found_parts(parser, found);
            parser.diagnostic(expected_found("`{`", found, span));
        }
    }

    marker.complete(parser, SyntaxKind::ConditionalStatementNode);
}

/// Parses an expression statement.
///
/// The statement ends at a terminator, before the enclosing close brace,
/// or after a nested block completes.
fn expression_statement(parser: &mut Parser<'_>, marker: Marker) {
    loop {
        match parser.peek() {
            None => break,
            Some((Token::Stop, _)) => {
                parser.next();
                break;
            }
            Some((Token::CloseBrace, _)) => break,
            Some((Token::OpenParen, _)) => {
                let m = parser.start();
                expression_group(parser, m);
            }
            Some((Token::OpenBrace, _)) => {
                let m = parser.start();
                block(parser, m);
                break;
            }
            Some(_) => {
                parser.next();
            }
        }
    }

    marker.complete(parser, SyntaxKind::ExpressionStatementNode);
}

/// Parses a parenthesized expression group.
fn expression_group(parser: &mut Parser<'_>, marker: Marker) {
    let open_span = parser.require(Token::OpenParen);

    loop {
        match parser.peek() {
            Some((Token::CloseParen, _)) => {
                parser.next();
                break;
            }
            Some((Token::OpenParen, _)) => {
                let m = parser.start();
                expression_group(parser, m);
            }
            None => {
                parser.diagnostic(unmatched(
                    "`(`",
                    open_span,
                    "`)`",
                    "end of input",
                    parser.span(),
                ));
                break;
            }
            Some(_) => {
                parser.next();
            }
        }
    }

    marker.complete(parser, SyntaxKind::ExpressionNode);
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::tree::SyntaxKind;
    use crate::tree::SyntaxTree;

    #[test]
    fn static_method_is_not_a_class_definition() {
        let (tree, diagnostics) = SyntaxTree::parse("public class instance(): Singleton* { }");
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {diagnostics:?}"
        );

        let kinds: Vec<_> = tree.root().children().map(|n| n.kind()).collect();
        assert_eq!(kinds, &[SyntaxKind::MethodNode]);
    }

    #[test]
    fn copyright_after_license_is_unexpected() {
        let source = "License MIT\nCopyright 2021 X\n";
        let (tree, diagnostics) = SyntaxTree::parse(source);
        assert_eq!(diagnostics.len(), 1);
        assert!(tree
            .root()
            .children()
            .any(|n| n.kind() == SyntaxKind::UnexpectedNode));
        assert_eq!(tree.to_string(), source);
    }

    #[test]
    fn else_is_a_separate_statement() {
        let source = r#"public run()
{
    if ( a > b ) { @max = a }
    else { @max = b }
}
"#;
        let (tree, diagnostics) = SyntaxTree::parse(source);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {diagnostics:?}"
        );

        let block = tree
            .root()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::BlockNode)
            .expect("method should have a block");
        let statements: Vec<_> = block
            .children()
            .filter(|n| n.kind() == SyntaxKind::ConditionalStatementNode)
            .collect();
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn missing_member_type_keeps_parsing() {
        let source = "public class { @broken\n@ok: int }";
        let (tree, diagnostics) = SyntaxTree::parse(source);
        assert!(!diagnostics.is_empty());

        let members: Vec<_> = tree
            .root()
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::MemberNode)
            .collect();
        assert_eq!(members.len(), 2);
    }
}
