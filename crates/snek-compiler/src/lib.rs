//! Snek compiler crate.
//!
//! Two phases turn an untyped [`Program`] into a WebAssembly text module:
//!
//! 1. [`TypeChecker`] validates the program and annotates every expression
//!    with its type
//! 2. [`CodeGenerator`] lowers the typed tree into a structured [`Module`],
//!    whose `Display` impl renders the module text
//!
//! # Example
//!
//! ```
//! use snek_compiler::{CompileOptions, compile};
//! use snek_parser::ast::{Expr, Program, Stmt};
//!
//! let program = Program::new().with_stmt(Stmt::expr(Expr::print(Expr::number(5))));
//! let module = compile(program, &CompileOptions::default()).unwrap();
//! let text = module.to_string();
//! assert!(text.contains("(call $print_num)"));
//! assert!(text.contains("(export \"_start\")"));
//! ```

pub mod checker;
pub mod codegen;
pub mod env;
pub mod helpers;
pub mod instr;
pub mod layout;
pub mod module;
pub mod options;

pub use checker::TypeChecker;
pub use codegen::CodeGenerator;
pub use instr::{Instr, NumericOp};
pub use module::{Function, Global, Import, ImportKind, Module};
pub use options::CompileOptions;

use snek_core::SnekError;
use snek_parser::Program;

/// Type check `program` and generate its module.
///
/// Code generation never runs on a program that failed checking.
#[tracing::instrument(skip_all)]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile(program: Program, options: &CompileOptions) -> Result<Module, SnekError> {
    let typed = TypeChecker::check(program)?;
    let module = CodeGenerator::generate(&typed, options)?;
    Ok(module)
}
