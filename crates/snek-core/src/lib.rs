//! Core types shared by the snek crates.
//!
//! - [`Type`] and [`Literal`]: the value model of the language
//! - [`UnaryOp`] and [`BinaryOp`]: operators with their typing table
//! - [`Span`]: source locations
//! - [`error`]: the error taxonomy for every phase

pub mod error;
pub mod ops;
mod span;
pub mod types;

pub use error::{CodeGenError, DefinitionKind, ParseError, RuntimeTrap, SnekError, TypeError};
pub use ops::{BinaryOp, OperandRule, UnaryOp};
pub use span::Span;
pub use types::{CONSTRUCTOR, Literal, SELF_PARAM, Type};

/// Size of one machine word in bytes.
pub const WORD_SIZE: u32 = 4;
