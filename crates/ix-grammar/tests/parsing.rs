//! Integration tests for parsing Ix source files.

use ix_grammar::lexer::Lexer;
use ix_grammar::lexer::Token;
use ix_grammar::SyntaxKind;
use ix_grammar::SyntaxTree;
use pretty_assertions::assert_eq;

/// A representative source file exercising every construct.
const SOURCE: &str = r#"Copyright 2021 Daniel Robert Bradley
License MIT

// A growable character buffer.
public class extends ix.base.Object implements Stringify, Comparable
{
    @data: char[]
    @length: int = 0
    %instances: int
}

public new( capacity: int )
{
    @data = allocate( capacity )
    %instances++
}

public const charAt( index: int ): char
{
    return @data[index]
}

public append( suffix: string* ): void
{
    var index: int = 0
    foreach ( character in suffix )
    {
        @data[index] = character
        index++
    }

    if ( index > @length )
    {
        @length = index
    }
    else
    {
        @length += 0
    }

    while ( !full() )
    {
        grow( @length * 2 )
    }
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
fn round_trip_is_preserved_under_malformed_input() {
    let sources = [
        "",
        "public",
        "public class",
        "public class {",
        "public class { @ }",
        "public broken( {",
        "copyright only a header line",
        "no header and no declaration at all",
        "public class { @a: int } stray tokens after",
    ];

    for source in sources {
        let (tree, _) = SyntaxTree::parse(source);
        assert_eq!(
            tree.to_string(),
            source,
            "round trip failed for source: {source:?}"
        );
    }
}

#[test]
fn every_construct_is_present() {
    let (tree, _) = SyntaxTree::parse(SOURCE);
    let kinds: Vec<_> = tree.root().children().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        &[
            SyntaxKind::CopyrightNode,
            SyntaxKind::LicenseNode,
            SyntaxKind::ClassDefinitionNode,
            SyntaxKind::MethodNode,
            SyntaxKind::MethodNode,
            SyntaxKind::MethodNode,
        ]
    );

    let class = tree
        .root()
        .children()
        .find(|n| n.kind() == SyntaxKind::ClassDefinitionNode)
        .expect("should have a class");
    assert!(class
        .children()
        .any(|n| n.kind() == SyntaxKind::ExtendsClauseNode));
    assert!(class
        .children()
        .any(|n| n.kind() == SyntaxKind::ImplementsClauseNode));
    assert_eq!(
        class
            .children()
            .filter(|n| n.kind() == SyntaxKind::MemberNode)
            .count(),
        3
    );
}

#[test]
fn statement_terminator_law() {
    // Adjacent statements without terminators receive exactly one
    // synthetic stop each; explicitly terminated statements receive
    // none.
    let with_stops = "a = 1; b = 2;";
    let synthetic: Vec<_> = Lexer::new(with_stops)
        .filter(|(t, s)| *t == Ok(Token::Stop) && s.is_empty())
        .collect();
    assert_eq!(synthetic.len(), 0);

    let without_stops = "a = 1\nb = 2";
    let synthetic: Vec<_> = Lexer::new(without_stops)
        .filter(|(t, s)| *t == Ok(Token::Stop) && s.is_empty())
        .collect();
    assert_eq!(synthetic.len(), 1);
}

#[test]
fn unexpected_runs_are_quarantined_once() {
    let (tree, diagnostics) = SyntaxTree::parse("interface Stringify { }\npublic class { }\n");
    assert_eq!(diagnostics.len(), 1);

    let unexpected: Vec<_> = tree
        .root()
        .children()
        .filter(|n| n.kind() == SyntaxKind::UnexpectedNode)
        .collect();
    assert_eq!(unexpected.len(), 1);
    assert_eq!(unexpected[0].text().to_string(), "interface Stringify { }");

    // The class after the quarantined run still parses.
    assert!(tree
        .root()
        .children()
        .any(|n| n.kind() == SyntaxKind::ClassDefinitionNode));
}
