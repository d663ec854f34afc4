//! Statement parser: consumes a raw token stream and builds one parse
//! tree per end-of-statement marker.
//!
//! There is no grammar file and no lookahead. The parser keeps a cursor
//! into the tree under construction (the "current group") and lets each
//! structurally significant token reshape the tree around that cursor:
//! opening a clause, merging a trailing run of siblings into an
//! expression group, retagging an ambiguous bracket, or walking up the
//! parent chain until an acceptable anchor clause is found. The per-token
//! rules live in [`crate::grammar`]; dialects extend them through the
//! [`Dialect`] trait.

use crate::grammar;
use crate::lexer::{Lexer, RawToken, collapse_whitespace};
use crate::tree::{NodeId, ParseTree, SqlStatement, TokenKind};

/// A fatal parse failure. Parsing never recovers; statements yielded
/// before the failure remain valid.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A required token-category handler is not implemented by the
    /// active dialect.
    UnhandledConstruct { kind: TokenKind, text: String },
    /// An ancestor walk ran off the statement root: the token has no
    /// acceptable anchor clause in the tree built so far.
    StructuralMismatch { kind: TokenKind, text: String },
    /// A rule needed the last non-trivial token of a group that has none.
    EmptyGroup { kind: TokenKind, text: String },
}

impl ParseError {
    pub(crate) fn unhandled(tok: &RawToken) -> Self {
        ParseError::UnhandledConstruct {
            kind: tok.kind,
            text: tok.text.clone(),
        }
    }

    pub(crate) fn structural(tok: &RawToken) -> Self {
        ParseError::StructuralMismatch {
            kind: tok.kind,
            text: tok.text.clone(),
        }
    }

    pub(crate) fn empty_group(tok: &RawToken) -> Self {
        ParseError::EmptyGroup {
            kind: tok.kind,
            text: tok.text.clone(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnhandledConstruct { kind, text } => write!(
                f,
                "no {:?} handler in this dialect (at '{}')",
                kind, text
            ),
            ParseError::StructuralMismatch { kind, text } => write!(
                f,
                "no enclosing clause accepts {:?} '{}'",
                kind, text
            ),
            ParseError::EmptyGroup { kind, text } => write!(
                f,
                "{:?} '{}' requires a preceding expression",
                kind, text
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// A grammar rule: reshapes the tree for one token and returns the new
/// current group.
pub type RuleFn = fn(&mut ParseTree, NodeId, RawToken) -> Result<NodeId, ParseError>;

/// Dialect extension surface.
///
/// The base grammar covers the keywords whose structural role is the same
/// everywhere. Everything context-sensitive about bare names, punctuation
/// and operators is dialect territory — the defaults fail fast so an
/// incomplete dialect is caught on first contact, not silently misparsed.
pub trait Dialect {
    /// Token-stream rewrite applied before rule dispatch (numeric shape
    /// normalization and the like). Whitespace collapsing has already
    /// happened by the time this runs.
    fn normalize(&self, tok: RawToken) -> RawToken {
        tok
    }

    /// Rule for a keyword, keyed by its uppercased literal. Consulted
    /// before the base table, so a dialect can both extend and override;
    /// `None` falls through.
    fn keyword_rule(&self, word: &str) -> Option<RuleFn> {
        let _ = word;
        None
    }

    /// Handles a bare name token (identifiers, aliases, qualifiers).
    fn on_name(
        &self,
        tree: &mut ParseTree,
        current: NodeId,
        tok: RawToken,
    ) -> Result<NodeId, ParseError> {
        let _ = (tree, current);
        Err(ParseError::unhandled(&tok))
    }

    /// Handles a punctuation token (brackets, commas, qualifier dots).
    fn on_punctuation(
        &self,
        tree: &mut ParseTree,
        current: NodeId,
        tok: RawToken,
    ) -> Result<NodeId, ParseError> {
        let _ = (tree, current);
        Err(ParseError::unhandled(&tok))
    }

    /// Handles an operator token (arithmetic, comparison, wildcard `*`).
    fn on_operator(
        &self,
        tree: &mut ParseTree,
        current: NodeId,
        tok: RawToken,
    ) -> Result<NodeId, ParseError> {
        let _ = (tree, current);
        Err(ParseError::unhandled(&tok))
    }
}

/// The statement parser. Stateless between calls; each [`parse`](Self::parse)
/// returns an independent lazy stream of statements.
pub struct SqlParser<D: Dialect> {
    dialect: D,
    end_marker: RawToken,
}

impl<D: Dialect> SqlParser<D> {
    pub fn new(dialect: D) -> Self {
        Self::with_end_marker(dialect, RawToken::new(TokenKind::Punctuation, ";"))
    }

    pub fn with_end_marker(dialect: D, end_marker: RawToken) -> Self {
        SqlParser { dialect, end_marker }
    }

    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Parses `sql` into a lazy sequence of statement trees, one per end
    /// marker plus a possible trailing unterminated statement.
    pub fn parse(&self, sql: &str) -> Statements<'_, D> {
        Statements {
            parser: self,
            lexer: Lexer::new(sql),
            tree: ParseTree::new(),
            current: None,
            done: false,
        }
    }

    fn apply(
        &self,
        tree: &mut ParseTree,
        current: NodeId,
        tok: RawToken,
    ) -> Result<NodeId, ParseError> {
        match tok.kind {
            TokenKind::Keyword => {
                let word = tok.text.to_ascii_uppercase();
                let rule = self
                    .dialect
                    .keyword_rule(&word)
                    .or_else(|| grammar::base_keyword_rule(&word));
                match rule {
                    Some(rule) => rule(tree, current, tok),
                    None => grammar::append_plain(tree, current, tok),
                }
            }
            TokenKind::Integer | TokenKind::Float => grammar::literal_number(tree, current, tok),
            TokenKind::String => grammar::literal_string(tree, current, tok),
            TokenKind::Name => self.dialect.on_name(tree, current, tok),
            TokenKind::Punctuation => self.dialect.on_punctuation(tree, current, tok),
            TokenKind::Operator => self.dialect.on_operator(tree, current, tok),
            _ => grammar::append_plain(tree, current, tok),
        }
    }
}

/// Lazy statement stream. Forward-only and finite; fuses after yielding
/// an error. Dropping it is cancellation.
pub struct Statements<'p, D: Dialect> {
    parser: &'p SqlParser<D>,
    lexer: Lexer,
    tree: ParseTree,
    current: Option<NodeId>,
    done: bool,
}

impl<'p, D: Dialect> Statements<'p, D> {
    fn take_tree(&mut self) -> SqlStatement {
        let finished = std::mem::replace(&mut self.tree, ParseTree::new());
        self.current = None;
        SqlStatement::from_tree(finished)
    }
}

impl<'p, D: Dialect> Iterator for Statements<'p, D> {
    type Item = Result<SqlStatement, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while let Some(raw) = self.lexer.next_token() {
            let tok = self.parser.dialect.normalize(collapse_whitespace(raw));
            if tok.kind == self.parser.end_marker.kind && tok.text == self.parser.end_marker.text {
                let root = self.tree.root();
                let marker = self.tree.new_leaf(tok.kind, tok.text);
                self.tree.append(root, marker);
                return Some(Ok(self.take_tree()));
            }
            let current = self.current.unwrap_or(self.tree.root());
            match self.parser.apply(&mut self.tree, current, tok) {
                Ok(next) => self.current = Some(next),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        // End of stream: unwind to the root and yield whatever substantial
        // content is left as an unterminated statement.
        self.done = true;
        let mut current = self.current.unwrap_or(self.tree.root());
        while let Some(up) = grammar::switch_to_parent(&mut self.tree, current) {
            current = up;
        }
        let root = self.tree.root();
        if self.tree.flatten(root, true, true).next().is_some() {
            return Some(Ok(self.take_tree()));
        }
        None
    }
}
