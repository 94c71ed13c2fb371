//! Abstract syntax tree.
//!
//! The same tree serves as the untyped AST (produced by
//! [`AstBuilder`](crate::AstBuilder)) and the typed AST (returned by the type
//! checker with every [`Expr::ty`] filled in).

mod expr;
mod stmt;

pub use expr::{Builtin1, Builtin2, Expr, ExprKind, Name};
pub use stmt::{
    AssignStmt, AssignTarget, ClassDef, ElifArm, FuncDef, IfStmt, LocalVarDef, Param, ReturnStmt,
    Stmt, VarDef, WhileStmt, collect_var_defs,
};

use snek_core::Type;

/// A whole program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Top-level variable declarations, in order
    pub var_defs: Vec<VarDef>,
    pub func_defs: Vec<FuncDef>,
    pub class_defs: Vec<ClassDef>,
    /// The implicit entry body
    pub stmts: Vec<Stmt>,
    /// Type of the last top-level statement; filled in by the type checker
    pub ty: Option<Type>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, def: VarDef) -> Self {
        self.var_defs.push(def);
        self
    }

    pub fn with_func(mut self, def: FuncDef) -> Self {
        self.func_defs.push(def);
        self
    }

    pub fn with_class(mut self, def: ClassDef) -> Self {
        self.class_defs.push(def);
        self
    }

    pub fn with_stmt(mut self, stmt: Stmt) -> Self {
        self.stmts.push(stmt);
        self
    }

    /// Whether the entry body ends in a bare expression statement.
    pub fn ends_with_expr(&self) -> bool {
        matches!(self.stmts.last(), Some(Stmt::Expr(_)))
    }
}
