// tests/lexer_tests.rs

use sqlsift::lexer::{
    FloatToInteger, Lexer, RawToken, collapse_whitespace, float_to_punctuation,
};
use sqlsift::tree::TokenKind;

fn tokens(input: &str) -> Vec<RawToken> {
    Lexer::new(input).collect()
}

#[test]
fn test_select_statement_tokens() {
    let toks = tokens("SELECT a FROM t;");
    let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Keyword,
            TokenKind::Whitespace,
            TokenKind::Name,
            TokenKind::Whitespace,
            TokenKind::Keyword,
            TokenKind::Whitespace,
            TokenKind::Name,
            TokenKind::Punctuation,
        ]
    );
}

#[test]
fn test_keywords_are_case_insensitive() {
    for word in ["select", "Select", "SELECT", "sElEcT"] {
        let toks = tokens(word);
        assert_eq!(toks[0].kind, TokenKind::Keyword, "{}", word);
        assert_eq!(toks[0].text, word, "literal text is preserved");
    }
}

#[test]
fn test_input_is_trimmed() {
    let toks = tokens("   SELECT 1;   ");
    assert_eq!(toks.first().map(|t| t.kind), Some(TokenKind::Keyword));
    assert_eq!(toks.last().map(|t| t.kind), Some(TokenKind::Punctuation));
}

#[test]
fn test_whitespace_runs_are_single_tokens() {
    let toks = tokens("a  \n\t b");
    assert_eq!(toks.len(), 3);
    assert_eq!(toks[1].kind, TokenKind::Whitespace);
    assert_eq!(toks[1].text, "  \n\t ");
}

#[test]
fn test_collapse_whitespace_filter() {
    let tok = collapse_whitespace(RawToken::new(TokenKind::Whitespace, "  \n\t "));
    assert_eq!(tok, RawToken::new(TokenKind::Whitespace, " "));
    let name = collapse_whitespace(RawToken::new(TokenKind::Name, "a"));
    assert_eq!(name.text, "a");
}

#[test]
fn test_line_comment_includes_newline() {
    let toks = tokens("-- note\nSELECT");
    assert_eq!(toks[0], RawToken::new(TokenKind::LineComment, "-- note\n"));
    assert_eq!(toks[1].kind, TokenKind::Keyword);
}

#[test]
fn test_block_comment() {
    let toks = tokens("/* multi\nline */ SELECT");
    assert_eq!(
        toks[0],
        RawToken::new(TokenKind::BlockComment, "/* multi\nline */")
    );
}

#[test]
fn test_string_literal_keeps_quotes() {
    let toks = tokens("'hello world'");
    assert_eq!(toks, vec![RawToken::new(TokenKind::String, "'hello world'")]);
}

#[test]
fn test_doubled_quote_is_two_tokens() {
    let toks = tokens("'it''s'");
    assert_eq!(
        toks,
        vec![
            RawToken::new(TokenKind::String, "'it'"),
            RawToken::new(TokenKind::String, "'s'"),
        ]
    );
}

#[test]
fn test_numbers_come_out_float_shaped() {
    let toks = tokens("5 20.5 1.");
    assert_eq!(toks[0], RawToken::new(TokenKind::Float, "5"));
    assert_eq!(toks[2], RawToken::new(TokenKind::Float, "20.5"));
    assert_eq!(toks[4], RawToken::new(TokenKind::Float, "1."));
}

#[test]
fn test_bare_dot_is_float_shaped() {
    let toks = tokens("a.b");
    assert_eq!(
        toks,
        vec![
            RawToken::new(TokenKind::Name, "a"),
            RawToken::new(TokenKind::Float, "."),
            RawToken::new(TokenKind::Name, "b"),
        ]
    );
}

#[test]
fn test_float_to_integer_filter() {
    let filter = FloatToInteger::new();
    assert_eq!(
        filter.apply(RawToken::new(TokenKind::Float, "5")),
        RawToken::new(TokenKind::Integer, "5")
    );
    assert_eq!(
        filter.apply(RawToken::new(TokenKind::Float, "20.5")),
        RawToken::new(TokenKind::Float, "20.5")
    );
    assert_eq!(
        filter.apply(RawToken::new(TokenKind::Float, ".")),
        RawToken::new(TokenKind::Float, ".")
    );
}

#[test]
fn test_float_to_punctuation_filter() {
    assert_eq!(
        float_to_punctuation(RawToken::new(TokenKind::Float, ".")),
        RawToken::new(TokenKind::Punctuation, ".")
    );
    assert_eq!(
        float_to_punctuation(RawToken::new(TokenKind::Float, "20.5")),
        RawToken::new(TokenKind::Float, "20.5")
    );
}

#[test]
fn test_multi_char_operators() {
    let toks = tokens("a <= b <> c != d >= e");
    let ops: Vec<&str> = toks
        .iter()
        .filter(|t| t.kind == TokenKind::Operator)
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(ops, vec!["<=", "<>", "!=", ">="]);
}

#[test]
fn test_single_char_operators_and_punctuation() {
    let toks = tokens("(a+b)*c,d;");
    let kinds: Vec<(TokenKind, &str)> = toks.iter().map(|t| (t.kind, t.text.as_str())).collect();
    assert_eq!(
        kinds,
        vec![
            (TokenKind::Punctuation, "("),
            (TokenKind::Name, "a"),
            (TokenKind::Operator, "+"),
            (TokenKind::Name, "b"),
            (TokenKind::Punctuation, ")"),
            (TokenKind::Operator, "*"),
            (TokenKind::Name, "c"),
            (TokenKind::Punctuation, ","),
            (TokenKind::Name, "d"),
            (TokenKind::Punctuation, ";"),
        ]
    );
}

#[test]
fn test_minus_is_operator_not_comment() {
    let toks = tokens("a - b");
    assert_eq!(toks[2], RawToken::new(TokenKind::Operator, "-"));
}

#[test]
fn test_unknown_character_is_error_token() {
    let toks = tokens("a ? b");
    assert_eq!(toks[2], RawToken::new(TokenKind::Error, "?"));
}

#[test]
fn test_identifier_with_underscore_and_digits() {
    let toks = tokens("col_1 _private t$x");
    assert_eq!(toks[0], RawToken::new(TokenKind::Name, "col_1"));
    assert_eq!(toks[2], RawToken::new(TokenKind::Name, "_private"));
    assert_eq!(toks[4], RawToken::new(TokenKind::Name, "t$x"));
}
