//! CLI support for sqlsift
//!
//! Provides programmatic access to the sqlsift CLI functionality so the
//! binary stays a thin argument-parsing shell.

use std::io;

use crate::output;
use crate::postgres::PostgresParser;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Parser error
    Parse(crate::ParseError),
    /// IO error
    Io(io::Error),
    /// No input provided
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Parse(e) => write!(f, "Parse error: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => {
                write!(f, "No input provided. Pass SQL as an argument or pipe it to stdin.")
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Parse(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::NoInput => None,
        }
    }
}

impl From<crate::ParseError> for CliError {
    fn from(e: crate::ParseError) -> Self {
        CliError::Parse(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

/// Options for the `lineage` subcommand.
pub struct LineageOptions {
    pub sql: String,
    pub pretty: bool,
    pub default_catalog: Option<String>,
    pub default_schema: Option<String>,
}

/// Parses every statement and renders the lineage reports as JSON, one
/// line (or pretty block) per statement.
pub fn execute_lineage(options: &LineageOptions) -> Result<String, CliError> {
    let parser = PostgresParser::with_defaults(
        options.default_catalog.clone(),
        options.default_schema.clone(),
    );
    let mut rendered = Vec::new();
    for statement in parser.parse(&options.sql) {
        let statement = statement?;
        let report = output::lineage_to_json(&statement);
        rendered.push(if options.pretty {
            output::to_json_pretty(&report)
        } else {
            output::to_json(&report)
        });
    }
    Ok(rendered.join("\n"))
}

/// Parses every statement and renders the parse trees.
pub fn execute_tree(sql: &str) -> Result<String, CliError> {
    let parser = PostgresParser::new();
    let mut rendered = Vec::new();
    for statement in parser.parse(sql) {
        let statement = statement?;
        rendered.push(output::render_tree(&statement));
    }
    Ok(rendered.join("\n"))
}
