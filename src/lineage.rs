//! Lineage extraction: a read-only walk over a frozen statement tree
//! collecting the datasets a statement reads and the datafields it
//! references, with column qualifiers resolved against dataset aliases.

use crate::tree::{GroupTag, NodeId, ParseTree, SqlStatement, TokenKind};

/// What a dataset record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// A plain table reference, possibly schema/catalog qualified.
    Table,
    /// A parenthesized SELECT used as a table.
    SubQuery,
    /// A named common table expression.
    WithQuery,
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DatasetKind::Table => "Dataset",
            DatasetKind::SubQuery => "Sub Query",
            DatasetKind::WithQuery => "With Query",
        })
    }
}

/// A table-like source the statement reads from.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub kind: DatasetKind,
    /// Table name, or the reconstructed query text for subqueries/CTEs.
    pub name: String,
    pub schema: Option<String>,
    pub catalog: Option<String>,
    pub alias: Option<String>,
    /// The identifier node this record was derived from.
    pub defined_at: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatafieldKind {
    /// A plain column reference.
    Column,
    /// An arithmetic/string expression result column or operand.
    Computed,
    /// A function call result.
    Function,
    /// A bare literal result column.
    Constant,
}

impl std::fmt::Display for DatafieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DatafieldKind::Column => "Datafield",
            DatafieldKind::Computed => "Computed Field",
            DatafieldKind::Function => "Function Field",
            DatafieldKind::Constant => "Constant Field",
        })
    }
}

/// A column-like value the statement projects or references.
#[derive(Debug, Clone, PartialEq)]
pub struct Datafield {
    pub kind: DatafieldKind,
    /// Column name or reconstructed expression text.
    pub name: String,
    pub alias: Option<String>,
    /// The qualifier as written (`u` in `u.x`).
    pub dataset_alias: Option<String>,
    /// Resolved dataset name, alias match taking priority over name match.
    pub dataset: Option<String>,
    pub dataset_kind: Option<DatasetKind>,
    pub schema: Option<String>,
    pub catalog: Option<String>,
    pub defined_at: NodeId,
}

const IDENTIFIER_EXTRA: &[GroupTag] = &[GroupTag::WithIdentifier];

/// Collects the datasets read by `stmt`, in document order.
pub fn datasets(
    stmt: &SqlStatement,
    default_catalog: Option<&str>,
    default_schema: Option<&str>,
) -> Vec<Dataset> {
    let tree = stmt.tree();
    let mut found = Vec::new();
    for id in stmt.identifiers_with(IDENTIFIER_EXTRA) {
        let parent_tag = tree.parent(id).and_then(|p| tree.group_tag(p));
        if !matches!(
            parent_tag,
            Some(GroupTag::FromClause | GroupTag::WithClause)
        ) {
            continue;
        }
        let dataset = match tree.group_tag(id) {
            Some(GroupTag::SubQuery) => {
                subquery_dataset(tree, id, default_catalog, default_schema)
            }
            Some(GroupTag::WithIdentifier) => {
                with_dataset(tree, id, default_catalog, default_schema)
            }
            _ => table_dataset(tree, id, default_catalog, default_schema),
        };
        found.push(dataset);
    }
    found
}

fn table_dataset(
    tree: &ParseTree,
    id: NodeId,
    default_catalog: Option<&str>,
    default_schema: Option<&str>,
) -> Dataset {
    let mut name = String::new();
    let mut alias = None;
    let mut qualifiers: Vec<String> = Vec::new();
    for &child in tree.children(id) {
        match tree.leaf_kind(child) {
            Some(TokenKind::Name) => name = tree.leaf_text(child).unwrap_or("").to_string(),
            Some(TokenKind::AliasName) => {
                alias = Some(tree.leaf_text(child).unwrap_or("").to_string());
            }
            Some(TokenKind::QualifierName) => {
                qualifiers.push(tree.leaf_text(child).unwrap_or("").to_string());
            }
            _ => {}
        }
    }
    // One qualifier is the schema, two are catalog.schema.
    let schema = qualifiers
        .last()
        .cloned()
        .or_else(|| default_schema.map(str::to_string));
    let catalog = if qualifiers.len() == 2 {
        Some(qualifiers[0].clone())
    } else {
        default_catalog.map(str::to_string)
    };
    Dataset {
        kind: DatasetKind::Table,
        name,
        schema,
        catalog,
        alias,
        defined_at: id,
    }
}

fn subquery_dataset(
    tree: &ParseTree,
    id: NodeId,
    default_catalog: Option<&str>,
    default_schema: Option<&str>,
) -> Dataset {
    let (name, alias) = text_until_alias(tree, id);
    Dataset {
        kind: DatasetKind::SubQuery,
        name,
        schema: default_schema.map(str::to_string),
        catalog: default_catalog.map(str::to_string),
        alias,
        defined_at: id,
    }
}

fn with_dataset(
    tree: &ParseTree,
    id: NodeId,
    default_catalog: Option<&str>,
    default_schema: Option<&str>,
) -> Dataset {
    let mut name = String::new();
    let mut alias = None;
    for &child in tree.children(id) {
        if tree.leaf_kind(child) == Some(TokenKind::WithQueryAlias) {
            alias = Some(tree.leaf_text(child).unwrap_or("").to_string());
        } else if tree.group_tag(child) == Some(GroupTag::SubQuery) {
            name = tree.text(child, false);
        }
    }
    Dataset {
        kind: DatasetKind::WithQuery,
        name,
        schema: default_schema.map(str::to_string),
        catalog: default_catalog.map(str::to_string),
        alias,
        defined_at: id,
    }
}

/// Collects the datafields referenced by `stmt`, resolving qualifiers
/// against `datasets` — by alias first, then by dataset name.
pub fn datafields(stmt: &SqlStatement, datasets: &[Dataset]) -> Vec<Datafield> {
    let tree = stmt.tree();
    let mut found = Vec::new();
    for id in stmt.identifiers_with(IDENTIFIER_EXTRA) {
        let parent_tag = tree.parent(id).and_then(|p| tree.group_tag(p));
        if parent_tag == Some(GroupTag::FromClause) {
            continue;
        }
        match tree.group_tag(id) {
            Some(GroupTag::Identifier) => {
                found.push(column_datafield(tree, id, datasets));
            }
            Some(
                tag @ (GroupTag::ComputedIdentifier
                | GroupTag::SelectConstantIdentifier
                | GroupTag::Function),
            ) => {
                let kind = match tag {
                    GroupTag::ComputedIdentifier => DatafieldKind::Computed,
                    GroupTag::Function => DatafieldKind::Function,
                    _ => DatafieldKind::Constant,
                };
                let (name, alias) = text_until_alias(tree, id);
                found.push(Datafield {
                    kind,
                    name,
                    alias,
                    dataset_alias: None,
                    dataset: None,
                    dataset_kind: None,
                    schema: None,
                    catalog: None,
                    defined_at: id,
                });
            }
            _ => {}
        }
    }
    found
}

fn column_datafield(tree: &ParseTree, id: NodeId, datasets: &[Dataset]) -> Datafield {
    let mut field = Datafield {
        kind: DatafieldKind::Column,
        name: String::new(),
        alias: None,
        dataset_alias: None,
        dataset: None,
        dataset_kind: None,
        schema: None,
        catalog: None,
        defined_at: id,
    };
    for &child in tree.children(id) {
        match tree.leaf_kind(child) {
            Some(TokenKind::Name | TokenKind::AllColumns) => {
                field.name = tree.leaf_text(child).unwrap_or("").to_string();
            }
            Some(TokenKind::AliasName) => {
                field.alias = Some(tree.leaf_text(child).unwrap_or("").to_string());
            }
            Some(TokenKind::QualifierName) => {
                field.dataset_alias = Some(tree.leaf_text(child).unwrap_or("").to_string());
            }
            _ => {}
        }
    }
    if let Some(qualifier) = field.dataset_alias.clone() {
        let matched = datasets
            .iter()
            .find(|d| d.alias.as_deref() == Some(qualifier.as_str()))
            .or_else(|| datasets.iter().find(|d| d.name == qualifier));
        if let Some(dataset) = matched {
            field.dataset = Some(dataset.name.clone());
            field.dataset_kind = Some(dataset.kind);
            field.schema = dataset.schema.clone();
            field.catalog = dataset.catalog.clone();
        }
    }
    field
}

/// Reconstructs a group's text up to its alias: everything before an AS
/// keyword or an alias-tagged child counts, comments excluded.
fn text_until_alias(tree: &ParseTree, id: NodeId) -> (String, Option<String>) {
    let mut text = String::new();
    let mut alias = None;
    let mut in_expression = true;
    for &child in tree.children(id) {
        if tree.leaf_kind(child) == Some(TokenKind::AliasName) {
            alias = Some(tree.leaf_text(child).unwrap_or("").to_string());
            in_expression = false;
        } else if tree.leaf_kind(child) == Some(TokenKind::Keyword)
            && tree
                .leaf_text(child)
                .is_some_and(|t| t.eq_ignore_ascii_case("AS"))
        {
            in_expression = false;
        }
        if in_expression {
            text.push_str(&tree.text(child, true));
        }
    }
    (text.trim().to_string(), alias)
}
