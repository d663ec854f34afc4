use clap::{Parser as ClapParser, Subcommand};
use sqlsift::cli::{self, CliError, LineageOptions};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "sqlsift")]
#[command(about = "sqlsift - parse SQL into clause trees and extract dataset/column lineage")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parse tree of each statement
    Tree {
        /// SQL text (reads from stdin if not provided)
        sql: Option<String>,
    },

    /// Print dataset and datafield lineage of each statement as JSON
    Lineage {
        /// SQL text (reads from stdin if not provided)
        sql: Option<String>,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,

        /// Catalog assumed for tables without an explicit qualifier
        #[arg(long)]
        catalog: Option<String>,

        /// Schema assumed for tables without an explicit qualifier
        #[arg(long)]
        schema: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tree { sql } => run_tree(sql),
        Commands::Lineage {
            sql,
            pretty,
            catalog,
            schema,
        } => run_lineage(sql, pretty, catalog, schema),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn read_sql(arg: Option<String>) -> Result<String, CliError> {
    match arg {
        Some(sql) => Ok(sql),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Ok(buffer)
        }
        None => Err(CliError::NoInput),
    }
}

fn run_tree(sql: Option<String>) -> Result<String, CliError> {
    cli::execute_tree(&read_sql(sql)?)
}

fn run_lineage(
    sql: Option<String>,
    pretty: bool,
    catalog: Option<String>,
    schema: Option<String>,
) -> Result<String, CliError> {
    let options = LineageOptions {
        sql: read_sql(sql)?,
        pretty,
        default_catalog: catalog,
        default_schema: schema,
    };
    cli::execute_lineage(&options)
}
