//! JSON rendering of lineage reports and a plain-text tree dump.
//!
//! Records are rendered through `serde_json` values so callers can embed
//! them in larger documents or print them directly. Output is
//! deterministic: record order is document order, key order is fixed by
//! the construction below.

use serde_json::{Value, json};

use crate::lineage::{Datafield, Dataset};
use crate::postgres::PostgresStatement;
use crate::tree::{NodeId, NodeRef, ParseTree, SqlStatement};

pub fn dataset_to_json(dataset: &Dataset) -> Value {
    json!({
        "type": dataset.kind.to_string(),
        "dataset": dataset.name,
        "schema": dataset.schema,
        "catalog": dataset.catalog,
        "alias": dataset.alias,
    })
}

pub fn datafield_to_json(field: &Datafield) -> Value {
    json!({
        "type": field.kind.to_string(),
        "datafield": field.name,
        "datafield_alias": field.alias,
        "dataset_alias": field.dataset_alias,
        "dataset": field.dataset,
        "dataset_type": field.dataset_kind.map(|k| k.to_string()),
        "schema": field.schema,
        "catalog": field.catalog,
    })
}

/// Full lineage report for one statement.
pub fn lineage_to_json(statement: &PostgresStatement) -> Value {
    let kind = statement
        .kind()
        .map(|k| format!("{:?}", k))
        .unwrap_or_default();
    json!({
        "statement": kind,
        "sql": statement.text(true),
        "datasets": statement
            .datasets_involved()
            .iter()
            .map(dataset_to_json)
            .collect::<Vec<_>>(),
        "datafields": statement
            .datafields_involved()
            .iter()
            .map(datafield_to_json)
            .collect::<Vec<_>>(),
    })
}

/// Compact JSON string.
pub fn to_json(value: &Value) -> String {
    value.to_string()
}

/// Pretty-printed JSON string.
pub fn to_json_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Indented one-node-per-line dump of a statement tree, for inspection.
pub fn render_tree(statement: &SqlStatement) -> String {
    let mut out = String::new();
    let kind = statement
        .kind()
        .map(|k| format!("{:?}", k))
        .unwrap_or_else(|| "Statement".to_string());
    out.push_str(&kind);
    out.push('\n');
    for &child in statement.tree().children(statement.root()) {
        render_node(statement.tree(), child, 1, &mut out);
    }
    out
}

fn render_node(tree: &ParseTree, id: NodeId, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    match tree.node(id) {
        NodeRef::Group { tag } => {
            match tag {
                Some(tag) => out.push_str(&format!("{:?}\n", tag)),
                None => out.push_str("Group\n"),
            }
            for &child in tree.children(id) {
                render_node(tree, child, depth + 1, out);
            }
        }
        NodeRef::Leaf { kind, text } => {
            out.push_str(&format!("{:?} <{}>\n", kind, text.escape_debug()));
        }
    }
}
