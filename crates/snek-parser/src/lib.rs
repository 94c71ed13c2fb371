//! Snek parser crate.
//!
//! This crate turns a concrete syntax tree into the AST consumed by the
//! type checker. It includes:
//! - The [`TreeCursor`] interface over Lezer-style syntax trees
//! - An in-memory tree ([`SyntaxTree`]) and its builder
//! - AST definitions shared by the untyped and typed phases
//! - [`AstBuilder`], the cursor-to-AST conversion
//!
//! # Example
//!
//! ```
//! use snek_parser::{SyntaxTreeBuilder, build_program};
//!
//! let mut b = SyntaxTreeBuilder::new();
//! b.start_node("Script");
//! b.start_node("ExpressionStatement");
//! b.token("Number", "42");
//! b.finish_node();
//! b.finish_node();
//! let tree = b.finish().unwrap();
//!
//! let program = build_program(&mut tree.cursor()).unwrap();
//! assert_eq!(program.stmts.len(), 1);
//! ```

pub mod ast;
mod builder;
mod cursor;

pub use ast::Program;
pub use builder::AstBuilder;
pub use cursor::{SyntaxCursor, SyntaxNode, SyntaxTree, SyntaxTreeBuilder, TreeCursor};

use snek_core::ParseError;

/// Build the untyped AST from a cursor positioned on a `Script` node.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn build_program<C: TreeCursor>(cursor: &mut C) -> Result<Program, ParseError> {
    AstBuilder::new(cursor).build_program()
}
