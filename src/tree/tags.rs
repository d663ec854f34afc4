/// Semantic category of a leaf token.
///
/// The raw categories are what the tokenizer produces; the derived
/// categories are assigned by the parser once the surrounding context
/// resolves what a token actually is (`a` in `a.b` is a qualifier, `*`
/// in a select list is a wildcard, and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Raw categories from the tokenizer
    /// Reserved word (`SELECT`, `FROM`, `AND`, ...)
    Keyword,
    /// Bare identifier-shaped word
    Name,
    /// Integer literal
    Integer,
    /// Float-shaped literal. The tokenizer also emits this for a bare `.`
    /// and for plain digit runs; dialect filters normalize those shapes.
    Float,
    /// String literal, quotes included
    String,
    /// Operator character(s) (`+`, `=`, `<>`, ...)
    Operator,
    /// Structural punctuation (`(`, `)`, `,`, `;`)
    Punctuation,
    /// Whitespace run
    Whitespace,
    /// `-- ...` comment, trailing newline included
    LineComment,
    /// `/* ... */` comment
    BlockComment,
    /// Character the tokenizer could not classify
    Error,

    // Derived categories assigned during parsing
    /// `=`, `!=`, `<>`, `<`, `<=`, `>`, `>=`
    ComparisonOperator,
    /// `AND`, `OR`, `NOT` once recognized as connectives
    LogicalOperator,
    /// The `.` joining a qualifier to a name
    QualifierOperator,
    /// The qualifier part of `schema.table` or `alias.column`
    QualifierName,
    /// Alias bound with or without `AS`
    AliasName,
    /// `*` used as a wildcard rather than multiplication
    AllColumns,
    /// The query name of a `WITH name AS (...)` entry
    WithQueryAlias,
}

impl TokenKind {
    /// Whitespace or comment — skipped by the backward scans.
    pub fn is_trivial(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

/// Semantic tag of a composite node.
///
/// A group's tag is revised in place as parsing resolves ambiguity: a
/// `RoundBracket` becomes a `SubQuery` once a SELECT shows up inside it,
/// an `In` becomes a `NotIn` when the preceding sibling is a NOT, and the
/// statement root starts untagged until its kind is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupTag {
    // Statement kinds (carried by the statement root)
    Select,
    SelectInto,
    Insert,
    InsertIntoSelect,

    // Clauses
    SelectClause,
    SelectIntoClause,
    FromClause,
    JoinOnClause,
    WhereClause,
    GroupByClause,
    HavingClause,
    OrderByClause,
    InsertIntoClause,
    UpdateSetClause,
    LimitClause,
    WithClause,

    // Identifiers
    Identifier,
    Function,
    ComputedIdentifier,
    SelectConstantIdentifier,
    WithIdentifier,

    // Brackets
    RoundBracket,
    ConditionGroup,
    ArgumentList,
    SubQuery,
    CollectionSet,

    // Conditions
    Condition,
    Comparison,
    In,
    NotIn,
    Like,
    NotLike,
    Between,
    NotBetween,
    Not,

    // Case expressions
    CaseExpression,
    WhenExpression,
    ThenExpression,
    ElseExpression,
}

impl GroupTag {
    /// True for the tags a completed statement root may carry.
    pub fn is_statement_kind(self) -> bool {
        matches!(
            self,
            GroupTag::Select | GroupTag::SelectInto | GroupTag::Insert | GroupTag::InsertIntoSelect
        )
    }
}
