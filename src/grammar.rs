//! The base grammar: one rule per structurally significant keyword plus
//! the shared literal rules.
//!
//! Every rule follows the same scheme. The incoming token knows which
//! ancestor tags can anchor it — FROM needs the select clause it follows,
//! AND needs an open condition context, END needs a case expression — so
//! the rule walks the cursor up the parent chain to the first acceptable
//! anchor and then acts there: open a clause sibling, merge the trailing
//! sibling run into an expression group, or retag an ambiguous bracket.
//! The acceptance sets encode SQL's fixed clause ordering; keeping them
//! consistent with each other is what correctness means here.

use crate::parser::{ParseError, RuleFn};
use crate::lexer::RawToken;
use crate::tree::{GroupTag, NodeId, ParseTree, TokenKind};

/// Base rule table, keyed by the uppercased keyword literal. `None` means
/// the keyword has no structural role and is appended where the cursor
/// stands (DISTINCT, BY, NULL, ASC, ...).
pub fn base_keyword_rule(word: &str) -> Option<RuleFn> {
    let rule: RuleFn = match word {
        "SELECT" => select_clause,
        "FROM" => from_clause,
        "WHERE" => where_clause,
        "GROUP" => group_by_clause,
        "HAVING" => having_clause,
        "ORDER" => order_by_clause,
        "JOIN" | "INNER" | "LEFT" | "RIGHT" | "FULL" | "OUTER" | "CROSS" => join_keyword,
        "ON" => on_clause,
        "AND" => and_operator,
        "OR" => or_operator,
        "IN" => in_condition,
        "LIKE" => like_condition,
        "BETWEEN" => between_condition,
        "IS" => is_condition,
        "AS" => as_alias,
        "INTO" => into_clause,
        "NOT" => not_operator,
        "CASE" => case_expression,
        "WHEN" => when_expression,
        "THEN" => then_expression,
        "ELSE" => else_expression,
        "END" => end_expression,
        "INSERT" => insert_statement,
        _ => return None,
    };
    Some(rule)
}

/// Moves the cursor to its parent, re-parenting a trailing whitespace
/// leaf so spacing stays between clauses rather than inside them.
/// `None` once the statement root is reached.
pub fn switch_to_parent(tree: &mut ParseTree, group: NodeId) -> Option<NodeId> {
    let parent = tree.parent(group)?;
    if let Some(ws) = tree.pop_trailing_whitespace(group) {
        tree.append(parent, ws);
    }
    Some(parent)
}

/// Walks up from `from` to the first ancestor whose tag satisfies
/// `accept`. Running off the statement root is a structural mismatch
/// pinned to the offending token.
pub fn walk_to_tag(
    tree: &mut ParseTree,
    from: NodeId,
    accept: impl Fn(GroupTag) -> bool,
    tok: &RawToken,
) -> Result<NodeId, ParseError> {
    let mut cur = from;
    loop {
        if let Some(tag) = tree.group_tag(cur) {
            if accept(tag) {
                return Ok(cur);
            }
        }
        cur = switch_to_parent(tree, cur).ok_or_else(|| ParseError::structural(tok))?;
    }
}

pub(crate) fn append_leaf(tree: &mut ParseTree, group: NodeId, tok: RawToken) -> NodeId {
    let leaf = tree.new_leaf(tok.kind, tok.text);
    tree.append(group, leaf);
    leaf
}

/// Fallback for tokens with no rule: append as a plain child, cursor
/// unchanged.
pub fn append_plain(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    append_leaf(tree, current, tok);
    Ok(current)
}

fn group_with_token(tree: &mut ParseTree, tag: GroupTag, tok: RawToken) -> NodeId {
    let group = tree.new_group(tag);
    append_leaf(tree, group, tok);
    group
}

/// SELECT: walk out to the statement root (closing an InsertIntoClause or
/// any trailing identifier context on the way) or stop at the nearest
/// open bracket. At the root the statement kind resolves; inside a
/// bracket, the bracket turns out to be a subquery.
pub fn select_clause(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let mut cur = current;
    while cur != tree.root()
        && !matches!(
            tree.group_tag(cur),
            Some(GroupTag::RoundBracket) | Some(GroupTag::CollectionSet)
        )
    {
        cur = switch_to_parent(tree, cur).ok_or_else(|| ParseError::structural(&tok))?;
    }
    let clause = group_with_token(tree, GroupTag::SelectClause, tok);
    if cur == tree.root() {
        match tree.statement_kind() {
            None => tree.set_statement_kind(GroupTag::Select),
            Some(GroupTag::Insert) => tree.set_statement_kind(GroupTag::InsertIntoSelect),
            _ => {}
        }
    } else {
        tree.set_group_tag(cur, GroupTag::SubQuery);
    }
    tree.append(cur, clause);
    Ok(clause)
}

/// INSERT: opens the insert-into clause at the statement root.
pub fn insert_statement(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let clause = group_with_token(tree, GroupTag::InsertIntoClause, tok);
    if current == tree.root() && tree.statement_kind().is_none() {
        tree.set_statement_kind(GroupTag::Insert);
    }
    tree.append(current, clause);
    Ok(clause)
}

fn open_clause_after(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
    tag: GroupTag,
    accept: impl Fn(GroupTag) -> bool,
) -> Result<NodeId, ParseError> {
    let anchor = walk_to_tag(tree, current, accept, &tok)?;
    let parent = switch_to_parent(tree, anchor).ok_or_else(|| ParseError::structural(&tok))?;
    let clause = group_with_token(tree, tag, tok);
    tree.append(parent, clause);
    Ok(clause)
}

pub fn from_clause(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    open_clause_after(tree, current, tok, GroupTag::FromClause, |g| {
        matches!(
            g,
            GroupTag::SelectClause | GroupTag::SelectIntoClause | GroupTag::UpdateSetClause
        )
    })
}

pub fn where_clause(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    open_clause_after(tree, current, tok, GroupTag::WhereClause, |g| {
        matches!(g, GroupTag::FromClause)
    })
}

pub fn group_by_clause(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    open_clause_after(tree, current, tok, GroupTag::GroupByClause, |g| {
        matches!(g, GroupTag::FromClause | GroupTag::WhereClause)
    })
}

/// HAVING does not require a preceding GROUP BY.
pub fn having_clause(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    open_clause_after(tree, current, tok, GroupTag::HavingClause, |g| {
        matches!(
            g,
            GroupTag::FromClause | GroupTag::WhereClause | GroupTag::GroupByClause
        )
    })
}

pub fn order_by_clause(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    open_clause_after(tree, current, tok, GroupTag::OrderByClause, |g| {
        matches!(
            g,
            GroupTag::FromClause
                | GroupTag::WhereClause
                | GroupTag::GroupByClause
                | GroupTag::HavingClause
        )
    })
}

/// JOIN and its modifiers stay inside the from clause they extend.
pub fn join_keyword(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let from = walk_to_tag(tree, current, |g| g == GroupTag::FromClause, &tok)?;
    append_leaf(tree, from, tok);
    Ok(from)
}

pub fn on_clause(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let from = walk_to_tag(tree, current, |g| g == GroupTag::FromClause, &tok)?;
    let clause = group_with_token(tree, GroupTag::JoinOnClause, tok);
    tree.append(from, clause);
    Ok(clause)
}

fn connective_anchor(g: GroupTag) -> bool {
    matches!(
        g,
        GroupTag::JoinOnClause
            | GroupTag::WhereClause
            | GroupTag::HavingClause
            | GroupTag::ConditionGroup
            | GroupTag::Between
            | GroupTag::NotBetween
            | GroupTag::CaseExpression
            | GroupTag::WhenExpression
            | GroupTag::ThenExpression
            | GroupTag::ElseExpression
    )
}

pub fn and_operator(
    tree: &mut ParseTree,
    current: NodeId,
    mut tok: RawToken,
) -> Result<NodeId, ParseError> {
    tok.kind = TokenKind::LogicalOperator;
    let mut cur = current;
    loop {
        cur = walk_to_tag(tree, cur, connective_anchor, &tok)?;
        // BETWEEN takes exactly one AND; a second one belongs to whatever
        // condition context encloses the between group.
        let is_between = matches!(
            tree.group_tag(cur),
            Some(GroupTag::Between | GroupTag::NotBetween)
        );
        if is_between && tree.has_direct_leaf(cur, TokenKind::LogicalOperator, "AND") {
            cur = switch_to_parent(tree, cur).ok_or_else(|| ParseError::structural(&tok))?;
            continue;
        }
        break;
    }
    append_leaf(tree, cur, tok);
    Ok(cur)
}

pub fn or_operator(
    tree: &mut ParseTree,
    current: NodeId,
    mut tok: RawToken,
) -> Result<NodeId, ParseError> {
    tok.kind = TokenKind::LogicalOperator;
    let cur = walk_to_tag(tree, current, connective_anchor, &tok)?;
    append_leaf(tree, cur, tok);
    Ok(cur)
}

fn condition_anchor(g: GroupTag) -> bool {
    matches!(
        g,
        GroupTag::JoinOnClause
            | GroupTag::WhereClause
            | GroupTag::HavingClause
            | GroupTag::Condition
            | GroupTag::RoundBracket
            | GroupTag::ConditionGroup
            | GroupTag::Not
            | GroupTag::CaseExpression
            | GroupTag::WhenExpression
            | GroupTag::ThenExpression
            | GroupTag::ElseExpression
    )
}

/// IN: promote the trailing operand into a condition group. LIKE, BETWEEN
/// and IS share this shape and just relabel the result.
pub fn in_condition(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let mut cur = walk_to_tag(tree, current, condition_anchor, &tok)?;
    if tree.group_tag(cur) == Some(GroupTag::RoundBracket) {
        tree.set_group_tag(cur, GroupTag::ConditionGroup);
    }
    if tree.group_tag(cur) == Some(GroupTag::Condition) {
        // An existing condition group here means a NOT was seen already.
        let negated = tree.last_nontrivial(cur).is_some_and(|n| {
            tree.leaf_kind(n) == Some(TokenKind::LogicalOperator)
                && tree.leaf_text(n).is_some_and(|t| t.eq_ignore_ascii_case("NOT"))
        });
        tree.set_group_tag(cur, if negated { GroupTag::NotIn } else { GroupTag::In });
    } else {
        let start = tree
            .last_nontrivial_index(cur)
            .ok_or_else(|| ParseError::empty_group(&tok))?;
        cur = tree.merge_suffix(cur, GroupTag::In, start);
    }
    append_leaf(tree, cur, tok);
    Ok(cur)
}

pub fn like_condition(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let cur = in_condition(tree, current, tok)?;
    let tag = if tree.group_tag(cur) == Some(GroupTag::In) {
        GroupTag::Like
    } else {
        GroupTag::NotLike
    };
    tree.set_group_tag(cur, tag);
    Ok(cur)
}

pub fn between_condition(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let cur = in_condition(tree, current, tok)?;
    let tag = if tree.group_tag(cur) == Some(GroupTag::In) {
        GroupTag::Between
    } else {
        GroupTag::NotBetween
    };
    tree.set_group_tag(cur, tag);
    Ok(cur)
}

pub fn is_condition(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let cur = in_condition(tree, current, tok)?;
    tree.set_group_tag(cur, GroupTag::Comparison);
    Ok(cur)
}

/// NOT either extends a trailing operand into a condition (`x NOT IN`) or
/// opens a free-standing negation (`IS NOT NULL`, `NOT (...)`).
pub fn not_operator(
    tree: &mut ParseTree,
    current: NodeId,
    mut tok: RawToken,
) -> Result<NodeId, ParseError> {
    tok.kind = TokenKind::LogicalOperator;
    let cur = walk_to_tag(
        tree,
        current,
        |g| {
            matches!(
                g,
                GroupTag::JoinOnClause
                    | GroupTag::WhereClause
                    | GroupTag::HavingClause
                    | GroupTag::ConditionGroup
                    | GroupTag::RoundBracket
                    | GroupTag::Comparison
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
    let operand = tree.last_nontrivial(cur).filter(|&n| {
        matches!(
            tree.group_tag(n),
            Some(GroupTag::Identifier | GroupTag::ComputedIdentifier | GroupTag::Function)
        )
    });
    match operand {
        Some(_) => {
            let start = tree
                .last_nontrivial_index(cur)
                .ok_or_else(|| ParseError::empty_group(&tok))?;
            let cond = tree.merge_suffix(cur, GroupTag::Condition, start);
            append_leaf(tree, cond, tok);
            Ok(cond)
        }
        None => {
            let grp = group_with_token(tree, GroupTag::Not, tok);
            tree.append(cur, grp);
            Ok(grp)
        }
    }
}

/// AS binds an alias to the nearest enclosing identifier-like group under
/// a select or from clause; directly inside a select clause it first
/// promotes the trailing expression (`CASE ... END AS alias`).
pub fn as_alias(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    if tree.group_tag(current) == Some(GroupTag::WithIdentifier) {
        return append_plain(tree, current, tok);
    }
    if tree.group_tag(current) == Some(GroupTag::SelectClause) {
        let start = tree
            .last_nontrivial_index(current)
            .ok_or_else(|| ParseError::empty_group(&tok))?;
        let grp = tree.merge_suffix(current, GroupTag::ComputedIdentifier, start);
        append_leaf(tree, grp, tok);
        return Ok(grp);
    }
    let mut cur = current;
    loop {
        let parent = tree.parent(cur).ok_or_else(|| ParseError::structural(&tok))?;
        if matches!(
            tree.group_tag(parent),
            Some(GroupTag::SelectClause | GroupTag::FromClause)
        ) {
            break;
        }
        cur = switch_to_parent(tree, cur).ok_or_else(|| ParseError::structural(&tok))?;
    }
    append_leaf(tree, cur, tok);
    Ok(cur)
}

/// INTO distinguishes `INSERT INTO` (already inside an insert clause)
/// from `SELECT ... INTO` (retag the statement, open the into clause).
pub fn into_clause(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let cur = walk_to_tag(
        tree,
        current,
        |g| matches!(g, GroupTag::InsertIntoClause | GroupTag::SelectClause),
        &tok,
    )?;
    if tree.group_tag(cur) == Some(GroupTag::InsertIntoClause) {
        return append_plain(tree, cur, tok);
    }
    if tree.parent(cur) == Some(tree.root()) {
        tree.set_statement_kind(GroupTag::SelectInto);
        let parent = switch_to_parent(tree, cur).ok_or_else(|| ParseError::structural(&tok))?;
        let clause = group_with_token(tree, GroupTag::SelectIntoClause, tok);
        tree.append(parent, clause);
        return Ok(clause);
    }
    // Nested select: nothing to retag, keep the token where it stands.
    append_plain(tree, cur, tok)
}

pub fn case_expression(
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
                GroupTag::SelectClause
                    | GroupTag::JoinOnClause
                    | GroupTag::WhereClause
                    | GroupTag::HavingClause
                    | GroupTag::ConditionGroup
                    | GroupTag::Condition
                    | GroupTag::RoundBracket
                    | GroupTag::Not
                    | GroupTag::CaseExpression
                    | GroupTag::WhenExpression
                    | GroupTag::ThenExpression
                    | GroupTag::ElseExpression
            )
        },
        &tok,
    )?;
    let grp = group_with_token(tree, GroupTag::CaseExpression, tok);
    tree.append(cur, grp);
    Ok(grp)
}

pub fn when_expression(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let case = walk_to_tag(tree, current, |g| g == GroupTag::CaseExpression, &tok)?;
    let grp = group_with_token(tree, GroupTag::WhenExpression, tok);
    tree.append(case, grp);
    Ok(grp)
}

pub fn then_expression(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let when = walk_to_tag(tree, current, |g| g == GroupTag::WhenExpression, &tok)?;
    let grp = group_with_token(tree, GroupTag::ThenExpression, tok);
    tree.append(when, grp);
    Ok(grp)
}

pub fn else_expression(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let case = walk_to_tag(tree, current, |g| g == GroupTag::CaseExpression, &tok)?;
    let grp = group_with_token(tree, GroupTag::ElseExpression, tok);
    tree.append(case, grp);
    Ok(grp)
}

/// END closes the innermost case expression and steps back out of it.
pub fn end_expression(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    let case = walk_to_tag(tree, current, |g| g == GroupTag::CaseExpression, &tok)?;
    append_leaf(tree, case, tok.clone());
    switch_to_parent(tree, case).ok_or_else(|| ParseError::structural(&tok))
}

fn expression_container(g: GroupTag) -> bool {
    matches!(
        g,
        GroupTag::ComputedIdentifier
            | GroupTag::SelectClause
            | GroupTag::JoinOnClause
            | GroupTag::WhereClause
            | GroupTag::GroupByClause
            | GroupTag::HavingClause
            | GroupTag::OrderByClause
            | GroupTag::RoundBracket
            | GroupTag::ConditionGroup
            | GroupTag::CollectionSet
            | GroupTag::Comparison
            | GroupTag::Between
            | GroupTag::NotBetween
            | GroupTag::Like
            | GroupTag::NotLike
            | GroupTag::Not
            | GroupTag::CaseExpression
            | GroupTag::WhenExpression
            | GroupTag::ThenExpression
            | GroupTag::ElseExpression
    )
}

/// Arithmetic: accumulate the trailing sibling run plus this operator
/// into a computed identifier, left to right. Operator precedence is not
/// modeled; explicit parentheses are the only grouping.
pub fn setup_computed_identifier(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    if tree.group_tag(current) == Some(GroupTag::SelectConstantIdentifier) {
        tree.set_group_tag(current, GroupTag::ComputedIdentifier);
    }
    let mut cur = walk_to_tag(tree, current, expression_container, &tok)?;
    if tree.group_tag(cur) != Some(GroupTag::ComputedIdentifier) {
        let start = tree
            .last_nontrivial_index(cur)
            .ok_or_else(|| ParseError::empty_group(&tok))?;
        cur = tree.merge_suffix(cur, GroupTag::ComputedIdentifier, start);
    }
    append_leaf(tree, cur, tok);
    Ok(cur)
}

/// A number directly in a select clause is a constant result column.
pub fn literal_number(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    if tree.group_tag(current) == Some(GroupTag::SelectClause) {
        let grp = group_with_token(tree, GroupTag::SelectConstantIdentifier, tok);
        tree.append(current, grp);
        return Ok(grp);
    }
    append_plain(tree, current, tok)
}

/// Strings get the constant-column treatment too; immediately adjacent
/// string literals concatenate into the preceding token (that is how a
/// doubled quote escape comes back together).
pub fn literal_string(
    tree: &mut ParseTree,
    current: NodeId,
    tok: RawToken,
) -> Result<NodeId, ParseError> {
    if tree.group_tag(current) == Some(GroupTag::SelectClause) {
        let grp = group_with_token(tree, GroupTag::SelectConstantIdentifier, tok);
        tree.append(current, grp);
        return Ok(grp);
    }
    if let Some(&last) = tree.children(current).last() {
        if tree.leaf_kind(last) == Some(TokenKind::String) {
            tree.push_leaf_text(last, &tok.text);
            return Ok(current);
        }
    }
    append_plain(tree, current, tok)
}
