//! # Parse-tree model
//!
//! This module defines the tree the statement parser builds: leaf tokens
//! and composite token groups held in a per-statement arena.
//!
//! ## Architecture Overview
//!
//! - **[tags]** - The closed `TokenKind` and `GroupTag` enumerations
//! - **[node]** - The `ParseTree` arena, node handles, and the frozen
//!   `SqlStatement` wrapper
//!
//! ## Core Concepts
//!
//! ### Mutable tags on stable identity
//!
//! SQL is ambiguous until more context arrives, so a group's tag is
//! revised in place while its identity (the `NodeId`) stays put:
//!
//! ```text
//! (            -> RoundBracket
//! (SELECT      -> SubQuery
//! x IN (       -> CollectionSet
//! ```
//!
//! ### Upward walks without ownership cycles
//!
//! Every node records its parent as a plain arena index. The parser leans
//! on this constantly: each structurally significant keyword walks up the
//! parent chain to find the clause that accepts it. Groups own their
//! children; parent links never own anything.
//!
//! ### Splicing
//!
//! When a trailing run of siblings turns out to be a single expression
//! (`1 + 2` followed by an alias, say), the run is moved into a new group
//! spliced into the exact position the run occupied. Text reconstruction
//! is unaffected by any amount of regrouping.

pub mod node;
pub mod tags;

pub use node::{Flatten, Identifiers, NodeId, NodeRef, ParseTree, SqlStatement};
pub use tags::{GroupTag, TokenKind};
