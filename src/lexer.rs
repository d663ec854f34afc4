use crate::tree::TokenKind;
use regex::Regex;

/// A raw token from the tokenizer: a primitive category and the literal
/// source text. This is the entire contract between the token source and
/// the statement parser.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub kind: TokenKind,
    pub text: String,
}

impl RawToken {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        RawToken {
            kind,
            text: text.into(),
        }
    }
}

const KEYWORDS: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CROSS", "DELETE", "DESC", "DISTINCT",
    "ELSE", "END", "EXISTS", "FROM", "FULL", "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTO",
    "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER",
    "RIGHT", "SELECT", "SET", "THEN", "UNION", "UPDATE", "VALUES", "WHEN", "WHERE", "WITH",
];

/// SQL tokenizer.
///
/// Produces the raw shapes the stream filters expect: whitespace runs come
/// out verbatim, every number (and a bare `.`) comes out float-categorized,
/// and adjacent string literals stay separate tokens. Normalization is the
/// filter layer's job, not the tokenizer's.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        // Leading/trailing whitespace never reaches the parser.
        Lexer {
            input: input.trim().chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if pred(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_line_comment(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            result.push(ch);
            self.advance();
            if ch == '\n' {
                break;
            }
        }
        result
    }

    fn read_block_comment(&mut self) -> String {
        let mut result = String::from("/*");
        self.advance();
        self.advance();
        while let Some(ch) = self.current_char() {
            result.push(ch);
            self.advance();
            if ch == '/' && result.ends_with("*/") {
                break;
            }
        }
        result
    }

    fn read_string(&mut self) -> String {
        let mut result = String::from("'");
        self.advance();
        while let Some(ch) = self.current_char() {
            result.push(ch);
            self.advance();
            if ch == '\'' {
                break;
            }
        }
        // A doubled quote ('') closes this token and opens the next one;
        // the parser concatenates adjacent string literals back together.
        result
    }

    fn read_number(&mut self) -> String {
        let mut number = self.read_while(|c| c.is_ascii_digit());
        if self.current_char() == Some('.') {
            number.push('.');
            self.advance();
            number.push_str(&self.read_while(|c| c.is_ascii_digit()));
        }
        number
    }

    pub fn next_token(&mut self) -> Option<RawToken> {
        let ch = self.current_char()?;
        let token = match ch {
            c if c.is_whitespace() => {
                RawToken::new(TokenKind::Whitespace, self.read_while(char::is_whitespace))
            }
            '-' if self.peek_char(1) == Some('-') => {
                RawToken::new(TokenKind::LineComment, self.read_line_comment())
            }
            '/' if self.peek_char(1) == Some('*') => {
                RawToken::new(TokenKind::BlockComment, self.read_block_comment())
            }
            '\'' => RawToken::new(TokenKind::String, self.read_string()),
            // The tokenizer calls every number float-shaped, and the
            // qualifier dot in a.b along with them; the dialect filters
            // sort those shapes out downstream.
            c if c.is_ascii_digit() || c == '.' => {
                RawToken::new(TokenKind::Float, self.read_number())
            }
            '<' => self.read_operator(&["<=", "<>", "<"]),
            '>' => self.read_operator(&[">=", ">"]),
            '!' => self.read_operator(&["!=", "!"]),
            '|' => self.read_operator(&["||", "|"]),
            '=' | '+' | '-' | '*' | '/' | '%' | '^' => {
                self.advance();
                RawToken::new(TokenKind::Operator, ch.to_string())
            }
            '(' | ')' | ',' | ';' => {
                self.advance();
                RawToken::new(TokenKind::Punctuation, ch.to_string())
            }
            c if c.is_alphabetic() || c == '_' => {
                let word = self.read_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
                let kind = if KEYWORDS.contains(&word.to_ascii_uppercase().as_str()) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Name
                };
                RawToken::new(kind, word)
            }
            c => {
                self.advance();
                RawToken::new(TokenKind::Error, c.to_string())
            }
        };
        Some(token)
    }

    fn read_operator(&mut self, candidates: &[&str]) -> RawToken {
        for cand in candidates {
            let matched = cand
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_char(i) == Some(c));
            if matched {
                for _ in 0..cand.chars().count() {
                    self.advance();
                }
                return RawToken::new(TokenKind::Operator, *cand);
            }
        }
        let ch = self.current_char().unwrap_or('\0');
        self.advance();
        RawToken::new(TokenKind::Error, ch.to_string())
    }
}

impl Iterator for Lexer {
    type Item = RawToken;

    fn next(&mut self) -> Option<RawToken> {
        self.next_token()
    }
}

/// Collapses any whitespace run to a single space. Applied by the base
/// parser to every token stream, like the original blank-text filter.
pub fn collapse_whitespace(tok: RawToken) -> RawToken {
    if tok.kind == TokenKind::Whitespace && tok.text != " " {
        RawToken::new(TokenKind::Whitespace, " ")
    } else {
        tok
    }
}

/// Rewrites a float-categorized bare `.` into punctuation, so qualifier
/// dots reach the grammar as punctuation tokens.
pub fn float_to_punctuation(tok: RawToken) -> RawToken {
    if tok.kind == TokenKind::Float && tok.text == "." {
        RawToken::new(TokenKind::Punctuation, tok.text)
    } else {
        tok
    }
}

/// Rewrites integer-looking float-categorized literals into integers.
pub struct FloatToInteger {
    integer_shape: Regex,
}

impl FloatToInteger {
    pub fn new() -> Self {
        FloatToInteger {
            integer_shape: Regex::new(r"^\d+$").expect("static regex"),
        }
    }

    pub fn apply(&self, tok: RawToken) -> RawToken {
        if tok.kind == TokenKind::Float && self.integer_shape.is_match(tok.text.trim()) {
            RawToken::new(TokenKind::Integer, tok.text)
        } else {
            tok
        }
    }
}

impl Default for FloatToInteger {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn test_keywords_and_names() {
    let mut lexer = Lexer::new("SELECT col_a from T1");
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Keyword, "SELECT"))
    );
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Whitespace, " "))
    );
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Name, "col_a"))
    );
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Whitespace, " "))
    );
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Keyword, "from"))
    );
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Whitespace, " "))
    );
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Name, "T1"))
    );
    assert_eq!(lexer.next_token(), None);
}

#[test]
fn test_qualifier_dot_is_float_shaped() {
    let mut lexer = Lexer::new("a.b");
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Name, "a"))
    );
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Float, "."))
    );
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Name, "b"))
    );
}

#[test]
fn test_numbers_are_float_shaped() {
    let mut lexer = Lexer::new("5 20.5");
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Float, "5"))
    );
    lexer.next_token();
    assert_eq!(
        lexer.next_token(),
        Some(RawToken::new(TokenKind::Float, "20.5"))
    );
}
