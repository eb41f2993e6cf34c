use super::*;
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<Token> {
    tokenize(source)
        .unwrap_or_else(|e| panic!("tokenize failed: {e}"))
        .into_iter()
        .map(|t| t.token)
        .collect()
}

#[test]
fn function_declaration() {
    assert_eq!(
        kinds("function add(a, b) { return a + b; }"),
        vec![
            Token::Function,
            Token::Ident("add".into()),
            Token::LParen,
            Token::Ident("a".into()),
            Token::Comma,
            Token::Ident("b".into()),
            Token::RParen,
            Token::LBrace,
            Token::Return,
            Token::Ident("a".into()),
            Token::Plus,
            Token::Ident("b".into()),
            Token::Semicolon,
            Token::RBrace,
        ]
    );
}

#[test]
fn range_is_not_a_float() {
    assert_eq!(
        kinds("1..5"),
        vec![Token::Int(1), Token::DotDot, Token::Int(5)]
    );
    assert_eq!(kinds("1.5"), vec![Token::Float(1.5)]);
}

#[test]
fn comments_are_skipped() {
    let source = "# shell style\n// line\n/* block\n * comment */ x";
    assert_eq!(kinds(source), vec![Token::Ident("x".into())]);
}

#[test]
fn block_comments_end_at_the_first_close() {
    let source = "/* one */ a /* ** / * **/ b /**/ c /* x */ / d";
    assert_eq!(
        kinds(source),
        vec![
            Token::Ident("a".into()),
            Token::Ident("b".into()),
            Token::Ident("c".into()),
            Token::Slash,
            Token::Ident("d".into()),
        ]
    );
}

#[test]
fn unterminated_block_comment_is_an_error() {
    let err = tokenize("x = 1; /* never closed").unwrap_err();
    assert_eq!(err, LexError::UnterminatedComment { span: Span::new(7, 22) });
}

#[test]
fn literals_with_escapes() {
    assert_eq!(
        kinds(r#""a\tb\n" '\n' 'x' 0xff"#),
        vec![
            Token::Str("a\tb\n".into()),
            Token::Char('\n'),
            Token::Char('x'),
            Token::Int(255),
        ]
    );
}

#[test]
fn compound_operators_use_longest_match() {
    assert_eq!(
        kinds("a <<= 1; b++; c -> d ... e"),
        vec![
            Token::Ident("a".into()),
            Token::ShlEq,
            Token::Int(1),
            Token::Semicolon,
            Token::Ident("b".into()),
            Token::PlusPlus,
            Token::Semicolon,
            Token::Ident("c".into()),
            Token::Arrow,
            Token::Ident("d".into()),
            Token::Ellipsis,
            Token::Ident("e".into()),
        ]
    );
}

#[test]
fn keywords_are_not_identifiers() {
    assert_eq!(
        kinds("foreach of me"),
        vec![Token::Foreach, Token::Of, Token::Ident("me".into())]
    );
}

#[test]
fn spans_track_byte_offsets() {
    let tokens = tokenize("x = 10;").unwrap_or_default();
    assert_eq!(tokens[2].span, Span::new(4, 6));
}

#[test]
fn unexpected_character_is_reported() {
    let err = tokenize("x = $;").expect_err("`$` is not a token");
    assert!(matches!(err, LexError::UnexpectedCharacter { ref text, .. } if text == "$"));
    assert_eq!(err.span(), Span::new(4, 5));
}
