//! Postgres dialect: the context-sensitive handlers the base grammar
//! leaves to dialects (bare names, punctuation, operators), the
//! postgres-only clauses (LIMIT, WITH), the numeric-shape stream filters,
//! and a statement type that knows its default catalog/schema and caches
//! its lineage.

use std::cell::OnceCell;

use crate::grammar::{self, append_leaf, append_plain, switch_to_parent, walk_to_tag};
use crate::lexer::{FloatToInteger, RawToken, float_to_punctuation};
use crate::lineage::{self, Datafield, Dataset};
use crate::parser::{Dialect, ParseError, RuleFn, SqlParser};
use crate::tree::node::Identifiers;
use crate::tree::{GroupTag, NodeId, ParseTree, SqlStatement, TokenKind};

/// Identifier tags the postgres statement collects beyond the base set.
const POSTGRES_IDENTIFIER_TAGS: &[GroupTag] = &[GroupTag::WithIdentifier];

pub struct PostgresDialect {
    float_to_integer: FloatToInteger,
}

impl PostgresDialect {
    pub fn new() -> Self {
        PostgresDialect {
            float_to_integer: FloatToInteger::new(),
        }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for PostgresDialect {
    fn normalize(&self, tok: RawToken) -> RawToken {
        float_to_punctuation(self.float_to_integer.apply(tok))
    }

    fn keyword_rule(&self, word: &str) -> Option<RuleFn> {
        let rule: RuleFn = match word {
            "LIMIT" => limit_clause,
            "WITH" => with_clause,
            _ => return None,
        };
        Some(rule)
    }

    fn on_name(
        &self,
        tree: &mut ParseTree,
        current: NodeId,
        mut tok: RawToken,
    ) -> Result<NodeId, ParseError> {
        let cur_tag = tree.group_tag(current);
        let parent_tag = tree.parent(current).and_then(|p| tree.group_tag(p));
        let last = tree.last_nontrivial(current);

        if last.is_some_and(|n| is_keyword(tree, n, "AS")) {
            // Alias following AS
            tok.kind = TokenKind::AliasName;
            append_leaf(tree, current, tok);
            return Ok(current);
        }
        if matches!(parent_tag, Some(GroupTag::SelectClause | GroupTag::FromClause))
            && alias_position(tree, cur_tag, last)
        {
            // Alias without AS: the group is complete and sits directly
            // under a select or from clause.
            tok.kind = TokenKind::AliasName;
            append_leaf(tree, current, tok);
            return Ok(current);
        }
        if parent_tag == Some(GroupTag::ComputedIdentifier)
            && cur_tag == Some(GroupTag::Identifier)
            && last.is_some_and(|n| tree.leaf_kind(n) == Some(TokenKind::Name))
        {
            // SELECT a.x+b.y some_alias: the alias belongs to the
            // computed identifier, not to its rightmost operand.
            let up = switch_to_parent(tree, current)
                .ok_or_else(|| ParseError::structural(&tok))?;
            return self.on_name(tree, up, tok);
        }
        if cur_tag == Some(GroupTag::SelectClause)
            && !last.is_some_and(|n| {
                matches!(
                    tree.leaf_kind(n),
                    Some(TokenKind::Keyword | TokenKind::Punctuation)
                )
            })
        {
            // SELECT CASE ... END some_alias
            let start = tree
                .last_nontrivial_index(current)
                .ok_or_else(|| ParseError::empty_group(&tok))?;
            let grp = tree.merge_suffix(current, GroupTag::ComputedIdentifier, start);
            tok.kind = TokenKind::AliasName;
            append_leaf(tree, grp, tok);
            return Ok(grp);
        }
        if cur_tag == Some(GroupTag::Identifier) {
            append_leaf(tree, current, tok);
            return Ok(current);
        }
        if cur_tag == Some(GroupTag::WithClause) {
            // WITH name AS (...)
            tok.kind = TokenKind::WithQueryAlias;
            let grp = tree.new_group(GroupTag::WithIdentifier);
            append_leaf(tree, grp, tok);
            tree.append(current, grp);
            return Ok(grp);
        }
        let grp = tree.new_group(GroupTag::Identifier);
        append_leaf(tree, grp, tok);
        tree.append(current, grp);
        Ok(grp)
    }

    fn on_punctuation(
        &self,
        tree: &mut ParseTree,
        current: NodeId,
        mut tok: RawToken,
    ) -> Result<NodeId, ParseError> {
        match tok.text.as_str() {
            "(" => {
                let bracket = tree.new_group(GroupTag::RoundBracket);
                append_leaf(tree, bracket, tok);
                if tree.group_tag(current) == Some(GroupTag::Identifier)
                    && tree
                        .last_nontrivial(current)
                        .is_some_and(|n| tree.leaf_kind(n) == Some(TokenKind::Name))
                {
                    // A bracket right after a bare name: function call.
                    tree.set_group_tag(current, GroupTag::Function);
                    tree.set_group_tag(bracket, GroupTag::ArgumentList);
                } else if matches!(
                    tree.group_tag(current),
                    Some(GroupTag::In | GroupTag::NotIn)
                ) {
                    // Literal list until a SELECT inside says otherwise.
                    tree.set_group_tag(bracket, GroupTag::CollectionSet);
                }
                tree.append(current, bracket);
                Ok(bracket)
            }
            ")" => {
                let cur = walk_to_tag(
                    tree,
                    current,
                    |g| {
                        matches!(
                            g,
                            GroupTag::RoundBracket
                                | GroupTag::ArgumentList
                                | GroupTag::SubQuery
                                | GroupTag::CollectionSet
                                | GroupTag::ConditionGroup
                        )
                    },
                    &tok,
                )?;
                append_leaf(tree, cur, tok.clone());
                if tree.group_tag(cur) == Some(GroupTag::RoundBracket) {
                    if let Some(parent) = tree
                        .parent(cur)
                        .filter(|&p| tree.group_tag(p) == Some(GroupTag::SelectClause))
                    {
                        // A plain bracket as a result column is a computed
                        // expression: (price * 2) AS doubled.
                        let start = tree
                            .last_nontrivial_index(parent)
                            .ok_or_else(|| ParseError::empty_group(&tok))?;
                        return Ok(tree.merge_suffix(parent, GroupTag::ComputedIdentifier, start));
                    }
                }
                if tree.group_tag(cur) != Some(GroupTag::SubQuery) {
                    return switch_to_parent(tree, cur)
                        .ok_or_else(|| ParseError::structural(&tok));
                }
                Ok(cur)
            }
            "." => {
                if let Some(last) = tree.last_nontrivial(current) {
                    if tree.leaf_kind(last).is_some() {
                        tree.set_leaf_kind(last, TokenKind::QualifierName);
                    }
                }
                tok.kind = TokenKind::QualifierOperator;
                append_leaf(tree, current, tok);
                Ok(current)
            }
            "," => {
                let mut cur = current;
                if matches!(
                    tree.group_tag(cur),
                    Some(
                        GroupTag::Identifier
                            | GroupTag::ComputedIdentifier
                            | GroupTag::SelectConstantIdentifier
                            | GroupTag::Function
                            | GroupTag::CaseExpression
                    )
                ) {
                    // Step out so the next name opens a fresh sibling.
                    cur = switch_to_parent(tree, cur)
                        .ok_or_else(|| ParseError::structural(&tok))?;
                } else if tree.group_tag(cur) == Some(GroupTag::SubQuery)
                    && tree
                        .parent(cur)
                        .is_some_and(|p| tree.group_tag(p) == Some(GroupTag::WithIdentifier))
                {
                    // Between with-queries: back out to the with clause.
                    cur = switch_to_parent(tree, cur)
                        .ok_or_else(|| ParseError::structural(&tok))?;
                    cur = switch_to_parent(tree, cur)
                        .ok_or_else(|| ParseError::structural(&tok))?;
                }
                append_leaf(tree, cur, tok);
                Ok(cur)
            }
            _ => append_plain(tree, current, tok),
        }
    }

    fn on_operator(
        &self,
        tree: &mut ParseTree,
        current: NodeId,
        mut tok: RawToken,
    ) -> Result<NodeId, ParseError> {
        match tok.text.as_str() {
            "*" => {
                let wildcard = tree.group_tag(current) == Some(GroupTag::SelectClause)
                    || (tree.group_tag(current) == Some(GroupTag::Identifier)
                        && tree.last_nontrivial(current).is_some_and(|n| {
                            tree.leaf_kind(n) == Some(TokenKind::QualifierOperator)
                        }));
                if wildcard {
                    // SELECT * or alias.*
                    tok.kind = TokenKind::AllColumns;
                    append_leaf(tree, current, tok);
                    Ok(current)
                } else {
                    grammar::setup_computed_identifier(tree, current, tok)
                }
            }
            "=" | "!=" | "<>" | "<" | "<=" | ">" | ">=" => {
                tok.kind = TokenKind::ComparisonOperator;
                let cur = walk_to_tag(
                    tree,
                    current,
                    |g| {
                        matches!(
                            g,
                            GroupTag::RoundBracket
                                | GroupTag::ConditionGroup
                                | GroupTag::JoinOnClause
                                | GroupTag::WhereClause
                                | GroupTag::HavingClause
                                | GroupTag::Not
                                | GroupTag::CaseExpression
                                | GroupTag::WhenExpression
                                | GroupTag::ThenExpression
                                | GroupTag::ElseExpression
                        )
                    },
                    &tok,
                )?;
                if tree.group_tag(cur) == Some(GroupTag::RoundBracket) {
                    tree.set_group_tag(cur, GroupTag::ConditionGroup);
                }
                let start = tree
                    .last_nontrivial_index(cur)
                    .ok_or_else(|| ParseError::empty_group(&tok))?;
                let cmp = tree.merge_suffix(cur, GroupTag::Comparison, start);
                append_leaf(tree, cmp, tok);
                Ok(cmp)
            }
            "+" | "-" | "/" | "%" | "^" => {
                grammar::setup_computed_identifier(tree, current, tok)
            }
            _ => append_plain(tree, current, tok),
        }
    }
}

fn is_keyword(tree: &ParseTree, id: NodeId, word: &str) -> bool {
    tree.leaf_kind(id) == Some(TokenKind::Keyword)
        && tree
            .leaf_text(id)
            .is_some_and(|t| t.eq_ignore_ascii_case(word))
}

/// True if the cursor group reads as a finished identifier-like item that
/// a bare trailing name may alias.
fn alias_position(tree: &ParseTree, cur_tag: Option<GroupTag>, last: Option<NodeId>) -> bool {
    match cur_tag {
        Some(GroupTag::Identifier) => {
            last.is_some_and(|n| tree.leaf_kind(n) == Some(TokenKind::Name))
        }
        Some(GroupTag::Function) => {
            last.is_some_and(|n| tree.group_tag(n) == Some(GroupTag::ArgumentList))
        }
        Some(GroupTag::SubQuery) => last.is_some_and(|n| {
            tree.leaf_kind(n) == Some(TokenKind::Punctuation)
                && tree.leaf_text(n) == Some(")")
        }),
        Some(GroupTag::ComputedIdentifier) => {
            !last.is_some_and(|n| tree.leaf_kind(n) == Some(TokenKind::Operator))
        }
        Some(GroupTag::SelectConstantIdentifier) => true,
        _ => false,
    }
}

/// LIMIT hangs off the statement (or subquery) itself, after every clause.
fn limit_clause(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let cur = walk_to_tag(
        tree,
        current,
        |g| {
            matches!(
                g,
                GroupTag::Select
                    | GroupTag::SelectInto
                    | GroupTag::InsertIntoSelect
                    | GroupTag::SubQuery
            )
        },
        &tok,
    )?;
    let clause = tree.new_group(GroupTag::LimitClause);
    append_leaf(tree, clause, tok);
    tree.append(cur, clause);
    Ok(clause)
}

/// WITH opens the common-table-expression clause at the bare root.
fn with_clause(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    if current == tree.root() && tree.statement_kind().is_none() {
        let clause = tree.new_group(GroupTag::WithClause);
        append_leaf(tree, clause, tok);
        tree.append(current, clause);
        return Ok(clause);
    }
    append_plain(tree, current, tok)
}

/// Parser for the postgres dialect. Yields [`PostgresStatement`]s that
/// resolve unqualified tables against the configured defaults.
pub struct PostgresParser {
    parser: SqlParser<PostgresDialect>,
    default_catalog: Option<String>,
    default_schema: Option<String>,
}

impl PostgresParser {
    pub fn new() -> Self {
        Self::with_defaults(None, None)
    }

    pub fn with_defaults(
        default_catalog: Option<String>,
        default_schema: Option<String>,
    ) -> Self {
        PostgresParser {
            parser: SqlParser::new(PostgresDialect::new()),
            default_catalog,
            default_schema,
        }
    }

    pub fn parse<'a>(
        &'a self,
        sql: &str,
    ) -> impl Iterator<Item = Result<PostgresStatement, ParseError>> + 'a {
        self.parser.parse(sql).map(move |result| {
            result.map(|statement| PostgresStatement {
                statement,
                default_catalog: self.default_catalog.clone(),
                default_schema: self.default_schema.clone(),
                datasets: OnceCell::new(),
                datafields: OnceCell::new(),
            })
        })
    }
}

impl Default for PostgresParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A frozen postgres statement with lazily computed, cached lineage.
#[derive(Debug)]
pub struct PostgresStatement {
    statement: SqlStatement,
    default_catalog: Option<String>,
    default_schema: Option<String>,
    datasets: OnceCell<Vec<Dataset>>,
    datafields: OnceCell<Vec<Datafield>>,
}

impl PostgresStatement {
    pub fn default_catalog(&self) -> Option<&str> {
        self.default_catalog.as_deref()
    }

    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    /// Identifier collection including with-query identifiers.
    pub fn identifiers(&self) -> Identifiers<'_> {
        self.statement.identifiers_with(POSTGRES_IDENTIFIER_TAGS)
    }

    /// Datasets read by the statement. Computed from the tree on first
    /// call and cached; the tree is frozen, so repeated calls return the
    /// identical list.
    pub fn datasets_involved(&self) -> &[Dataset] {
        self.datasets.get_or_init(|| {
            lineage::datasets(
                &self.statement,
                self.default_catalog.as_deref(),
                self.default_schema.as_deref(),
            )
        })
    }

    /// Datafields referenced by the statement, with qualifiers resolved
    /// against [`datasets_involved`](Self::datasets_involved). Cached
    /// like the datasets.
    pub fn datafields_involved(&self) -> &[Datafield] {
        self.datafields
            .get_or_init(|| lineage::datafields(&self.statement, self.datasets_involved()))
    }
}

impl std::ops::Deref for PostgresStatement {
    type Target = SqlStatement;

    fn deref(&self) -> &SqlStatement {
        &self.statement
    }
}
