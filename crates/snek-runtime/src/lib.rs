//! Snek runtime crate.
//!
//! A small interpreter for the modules produced by `snek-compiler`, together
//! with the host side of the import ABI. It executes the structured
//! [`Module`](snek_compiler::Module) rather than parsing module text, so a
//! compiled program can be run and observed without an external engine.
//!
//! # Example
//!
//! ```
//! use snek_compiler::{CompileOptions, compile};
//! use snek_parser::ast::{Expr, Program, Stmt};
//! use snek_runtime::{RecordingHost, Vm, VmConfig};
//!
//! let program = Program::new().with_stmt(Stmt::expr(Expr::print(Expr::number(8))));
//! let options = CompileOptions::default();
//! let module = compile(program, &options).unwrap();
//!
//! let mut vm = Vm::new(&module, RecordingHost::new(), VmConfig::default());
//! assert_eq!(vm.run(&options.entry_export).unwrap(), Some(8));
//! assert_eq!(vm.host().lines, ["8"]);
//! ```

mod config;
pub mod host;
pub mod memory;
mod vm;

pub use config::VmConfig;
pub use host::{Host, HostFunction, RecordingHost, StdoutHost};
pub use memory::{Memory, PAGE_SIZE};
pub use vm::Vm;
