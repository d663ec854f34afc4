pub mod cli;
pub mod grammar;
pub mod lexer;
pub mod lineage;
pub mod output;
pub mod parser;
pub mod postgres;
pub mod tree;

pub use lexer::{Lexer, RawToken};
pub use lineage::{Datafield, DatafieldKind, Dataset, DatasetKind};
pub use parser::{Dialect, ParseError, SqlParser, Statements};
pub use postgres::{PostgresDialect, PostgresParser, PostgresStatement};
pub use tree::{GroupTag, NodeId, NodeRef, ParseTree, SqlStatement, TokenKind};
