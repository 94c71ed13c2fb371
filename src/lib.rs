//! # snek
//!
//! A compiler for a statically typed Python subset (integers, booleans,
//! `None`, classes with fields and methods, functions, `if`/`while`) that
//! emits WebAssembly text.
//!
//! The pipeline runs in fixed phases, and the first error aborts it:
//!
//! 1. [`build_program`](snek_parser::build_program): syntax tree cursor to
//!    untyped AST ([`ParseError`])
//! 2. [`TypeChecker`]: validate and annotate types ([`TypeError`])
//! 3. [`CodeGenerator`]: lower to a [`Module`] ([`CodeGenError`])
//! 4. [`Vm`] (optional): run the module in-process ([`RuntimeTrap`])
//!
//! # Example
//!
//! ```
//! use snek::prelude::*;
//!
//! // x: int = 5
//! // print(x + 3)
//! let mut b = SyntaxTreeBuilder::new();
//! b.start_node("Script");
//! b.start_node("AssignStatement");
//! b.token("VariableName", "x");
//! b.start_node("TypeDef");
//! b.token(":", ":");
//! b.token("VariableName", "int");
//! b.finish_node();
//! b.token("AssignOp", "=");
//! b.token("Number", "5");
//! b.finish_node();
//! b.line_break();
//! b.start_node("ExpressionStatement");
//! b.start_node("CallExpression");
//! b.token("VariableName", "print");
//! b.start_node("ArgList");
//! b.token("(", "(");
//! b.start_node("BinaryExpression");
//! b.token("VariableName", "x");
//! b.token("ArithOp", "+");
//! b.token("Number", "3");
//! b.finish_node();
//! b.token(")", ")");
//! b.finish_node();
//! b.finish_node();
//! b.finish_node();
//! b.finish_node();
//! let tree = b.finish().unwrap();
//!
//! let options = CompileOptions::default();
//! let module = snek::compile_module(&mut tree.cursor(), &options).unwrap();
//! let (result, host) = snek::run(&module, &options, RecordingHost::new(), VmConfig::default()).unwrap();
//! assert_eq!(result, Some(8));
//! assert_eq!(host.lines, ["8"]);
//! ```

pub use snek_compiler::{
    CodeGenerator, CompileOptions, Function, Global, Import, ImportKind, Instr, Module,
    NumericOp, TypeChecker,
};
pub use snek_core::{
    BinaryOp, CodeGenError, Literal, ParseError, RuntimeTrap, SnekError, Span, Type, TypeError,
    UnaryOp,
};
pub use snek_parser::{Program, SyntaxCursor, SyntaxTree, SyntaxTreeBuilder, TreeCursor, ast};
pub use snek_runtime::{Host, HostFunction, RecordingHost, StdoutHost, Vm, VmConfig};

/// Everything needed to build a tree, compile it and run it.
pub mod prelude {
    pub use snek_compiler::{CompileOptions, Module};
    pub use snek_core::{SnekError, Type};
    pub use snek_parser::{SyntaxTree, SyntaxTreeBuilder, TreeCursor};
    pub use snek_runtime::{Host, RecordingHost, StdoutHost, Vm, VmConfig};
}

pub type Result<T> = std::result::Result<T, SnekError>;

/// Compile the tree under `cursor` to WebAssembly module text.
///
/// The cursor must be positioned on the `Script` node and is left there.
#[tracing::instrument(skip_all)]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile<C: TreeCursor>(cursor: &mut C, options: &CompileOptions) -> Result<String> {
    Ok(compile_module(cursor, options)?.to_string())
}

/// Compile the tree under `cursor` to a structured [`Module`].
pub fn compile_module<C: TreeCursor>(cursor: &mut C, options: &CompileOptions) -> Result<Module> {
    let program = snek_parser::build_program(cursor)?;
    compile_program(program, options)
}

/// Type check and generate an already built program.
pub fn compile_program(program: Program, options: &CompileOptions) -> Result<Module> {
    snek_compiler::compile(program, options)
}

/// Run the entry function of `module` against `host`.
///
/// Returns the entry result (present when the program ends with a bare
/// expression) and the host, so recorded output can be inspected.
#[tracing::instrument(skip_all)]
pub fn run<H: Host>(
    module: &Module,
    options: &CompileOptions,
    host: H,
    config: VmConfig,
) -> Result<(Option<i32>, H)> {
    let mut vm = Vm::new(module, host, config);
    let result = vm.run(&options.entry_export)?;
    Ok((result, vm.into_host()))
}
