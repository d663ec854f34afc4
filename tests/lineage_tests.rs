// tests/lineage_tests.rs

use sqlsift::lineage::{DatafieldKind, DatasetKind};
use sqlsift::postgres::{PostgresParser, PostgresStatement};

fn parse_one(sql: &str) -> PostgresStatement {
    let parser = PostgresParser::new();
    let mut statements: Vec<_> = parser
        .parse(sql)
        .collect::<Result<Vec<_>, _>>()
        .expect("parse failed");
    assert_eq!(statements.len(), 1);
    statements.pop().unwrap()
}

#[test]
fn test_simple_select_lineage() {
    let stmt = parse_one("SELECT a, b FROM t;");

    let datasets = stmt.datasets_involved();
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].kind, DatasetKind::Table);
    assert_eq!(datasets[0].name, "t");
    assert_eq!(datasets[0].alias, None);
    assert_eq!(datasets[0].schema, None);
    assert_eq!(datasets[0].catalog, None);

    let fields = stmt.datafields_involved();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "a");
    assert_eq!(fields[1].name, "b");
    for field in fields {
        assert_eq!(field.kind, DatafieldKind::Column);
        assert_eq!(field.dataset_alias, None);
        assert_eq!(field.dataset, None);
    }
}

#[test]
fn test_alias_resolution() {
    let stmt = parse_one("SELECT u.x AS y FROM tbl u;");

    let fields = stmt.datafields_involved();
    assert_eq!(fields.len(), 1);
    let field = &fields[0];
    assert_eq!(field.kind, DatafieldKind::Column);
    assert_eq!(field.name, "x");
    assert_eq!(field.alias.as_deref(), Some("y"));
    assert_eq!(field.dataset_alias.as_deref(), Some("u"));
    assert_eq!(field.dataset.as_deref(), Some("tbl"));
    assert_eq!(field.dataset_kind, Some(DatasetKind::Table));
}

#[test]
fn test_alias_match_beats_name_match() {
    // The qualifier t2 is both an alias of tbl and the name of another
    // table; the alias wins.
    let stmt = parse_one("SELECT t2.v FROM tbl t2, t2 zz;");

    let datasets = stmt.datasets_involved();
    assert_eq!(datasets.len(), 2);
    assert_eq!(datasets[0].name, "tbl");
    assert_eq!(datasets[0].alias.as_deref(), Some("t2"));
    assert_eq!(datasets[1].name, "t2");
    assert_eq!(datasets[1].alias.as_deref(), Some("zz"));

    let fields = stmt.datafields_involved();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].dataset.as_deref(), Some("tbl"));
}

#[test]
fn test_name_match_when_no_alias_matches() {
    let stmt = parse_one("SELECT books.title FROM books;");
    let fields = stmt.datafields_involved();
    assert_eq!(fields[0].dataset_alias.as_deref(), Some("books"));
    assert_eq!(fields[0].dataset.as_deref(), Some("books"));
}

#[test]
fn test_schema_and_catalog_qualifiers() {
    let stmt = parse_one("SELECT a FROM cat.sch.t;");
    let datasets = stmt.datasets_involved();
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].name, "t");
    assert_eq!(datasets[0].schema.as_deref(), Some("sch"));
    assert_eq!(datasets[0].catalog.as_deref(), Some("cat"));
}

#[test]
fn test_default_schema_and_catalog() {
    let parser =
        PostgresParser::with_defaults(Some("warehouse".to_string()), Some("public".to_string()));
    let mut statements: Vec<_> = parser
        .parse("SELECT a FROM plain, abc.qualified;")
        .collect::<Result<Vec<_>, _>>()
        .expect("parse failed");
    let stmt = statements.pop().unwrap();

    let datasets = stmt.datasets_involved();
    assert_eq!(datasets.len(), 2);
    // No qualifier: both defaults apply.
    assert_eq!(datasets[0].name, "plain");
    assert_eq!(datasets[0].schema.as_deref(), Some("public"));
    assert_eq!(datasets[0].catalog.as_deref(), Some("warehouse"));
    // One qualifier overrides the schema, the catalog default stays.
    assert_eq!(datasets[1].name, "qualified");
    assert_eq!(datasets[1].schema.as_deref(), Some("abc"));
    assert_eq!(datasets[1].catalog.as_deref(), Some("warehouse"));
}

#[test]
fn test_subquery_dataset() {
    let stmt = parse_one("SELECT xyz.n FROM (SELECT n FROM base) xyz;");

    let datasets = stmt.datasets_involved();
    assert_eq!(datasets.len(), 2);
    assert_eq!(datasets[0].kind, DatasetKind::SubQuery);
    assert_eq!(datasets[0].name, "(SELECT n FROM base)");
    assert_eq!(datasets[0].alias.as_deref(), Some("xyz"));
    // The table read inside the subquery is reported as well.
    assert_eq!(datasets[1].kind, DatasetKind::Table);
    assert_eq!(datasets[1].name, "base");

    let fields = stmt.datafields_involved();
    let outer = fields
        .iter()
        .find(|f| f.dataset_alias.as_deref() == Some("xyz"))
        .expect("qualified field");
    assert_eq!(outer.dataset.as_deref(), Some("(SELECT n FROM base)"));
    assert_eq!(outer.dataset_kind, Some(DatasetKind::SubQuery));
}

#[test]
fn test_with_query_dataset() {
    let stmt = parse_one("WITH x AS (SELECT a FROM t) SELECT a FROM x;");

    let datasets = stmt.datasets_involved();
    assert_eq!(datasets.len(), 3);
    assert_eq!(datasets[0].kind, DatasetKind::WithQuery);
    assert_eq!(datasets[0].alias.as_deref(), Some("x"));
    assert_eq!(datasets[0].name, "(SELECT a FROM t)");
    assert_eq!(datasets[1].kind, DatasetKind::Table);
    assert_eq!(datasets[1].name, "t");
    assert_eq!(datasets[2].kind, DatasetKind::Table);
    assert_eq!(datasets[2].name, "x");
}

#[test]
fn test_computed_field() {
    let stmt = parse_one("SELECT 1+2 c FROM a;");
    let fields = stmt.datafields_involved();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].kind, DatafieldKind::Computed);
    assert_eq!(fields[0].name, "1+2");
    assert_eq!(fields[0].alias.as_deref(), Some("c"));
}

#[test]
fn test_function_field() {
    let stmt = parse_one("SELECT count(amount) total FROM sales;");
    let fields = stmt.datafields_involved();
    // The function result column plus the column it reads.
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].kind, DatafieldKind::Function);
    assert_eq!(fields[0].name, "count(amount)");
    assert_eq!(fields[0].alias.as_deref(), Some("total"));
    assert_eq!(fields[1].kind, DatafieldKind::Column);
    assert_eq!(fields[1].name, "amount");
}

#[test]
fn test_constant_field() {
    let stmt = parse_one("SELECT 'active' status FROM t;");
    let fields = stmt.datafields_involved();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].kind, DatafieldKind::Constant);
    assert_eq!(fields[0].name, "'active'");
    assert_eq!(fields[0].alias.as_deref(), Some("status"));
}

#[test]
fn test_qualified_star_field() {
    let stmt = parse_one("SELECT p.* FROM points p;");
    let fields = stmt.datafields_involved();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "*");
    assert_eq!(fields[0].dataset_alias.as_deref(), Some("p"));
    assert_eq!(fields[0].dataset.as_deref(), Some("points"));
}

#[test]
fn test_join_keys_are_datafields() {
    let stmt = parse_one("SELECT a.v FROM abc a JOIN pqr p ON a.z = p.z;");
    let fields = stmt.datafields_involved();
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["v", "z", "z"]);
    assert_eq!(fields[1].dataset.as_deref(), Some("abc"));
    assert_eq!(fields[2].dataset.as_deref(), Some("pqr"));
}

#[test]
fn test_from_clause_identifiers_are_not_datafields() {
    let stmt = parse_one("SELECT a FROM t;");
    let fields = stmt.datafields_involved();
    assert!(fields.iter().all(|f| f.name != "t"));
}

#[test]
fn test_lineage_is_idempotent() {
    let stmt = parse_one("SELECT u.x, count(y) n FROM tbl u GROUP BY u.x;");
    let first: Vec<_> = stmt.datasets_involved().to_vec();
    let second: Vec<_> = stmt.datasets_involved().to_vec();
    assert_eq!(first, second);

    let first: Vec<_> = stmt.datafields_involved().to_vec();
    let second: Vec<_> = stmt.datafields_involved().to_vec();
    assert_eq!(first, second);
}

#[test]
fn test_where_columns_are_datafields() {
    let stmt = parse_one("SELECT a FROM t WHERE b = 1 AND c IN (2, 3);");
    let fields = stmt.datafields_involved();
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}
