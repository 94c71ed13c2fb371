//! Statement and definition AST nodes.

use snek_core::{Literal, Span, Type};

use super::Expr;

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign(AssignStmt),
    If(IfStmt),
    While(WhileStmt),
    /// `pass`
    Pass(Span),
    Return(ReturnStmt),
    /// Bare expression statement
    Expr(Expr),
    /// Local variable declaration with initializer
    VarDef(LocalVarDef),
    /// Function definition; only valid at top level, where the builder hoists it
    FuncDef(FuncDef),
    /// Class definition; only valid at top level, where the builder hoists it
    ClassDef(ClassDef),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Pass(span) => *span,
            Stmt::Return(s) => s.span,
            Stmt::Expr(e) => e.span,
            Stmt::VarDef(s) => s.span,
            Stmt::FuncDef(f) => f.span,
            Stmt::ClassDef(c) => c.span,
        }
    }

    pub fn assign(name: &str, value: Expr) -> Self {
        Stmt::Assign(AssignStmt {
            target: AssignTarget::Name(name.to_string()),
            value,
            span: Span::default(),
        })
    }

    pub fn assign_field(object: Expr, field: &str, value: Expr) -> Self {
        Stmt::Assign(AssignStmt {
            target: AssignTarget::Field {
                object,
                field: field.to_string(),
            },
            value,
            span: Span::default(),
        })
    }

    pub fn var_def(name: &str, ty: Type, value: Expr) -> Self {
        Stmt::VarDef(LocalVarDef {
            name: name.to_string(),
            ty,
            value,
            span: Span::default(),
        })
    }

    pub fn ret(value: Expr) -> Self {
        Stmt::Return(ReturnStmt {
            value,
            span: Span::default(),
        })
    }

    pub fn while_loop(condition: Expr, body: Vec<Stmt>) -> Self {
        Stmt::While(WhileStmt {
            condition,
            body,
            span: Span::default(),
        })
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Name(String),
    /// `object.field = …`
    Field { object: Expr, field: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: AssignTarget,
    pub value: Expr,
    pub span: Span,
}

/// `if` with at most one `elif` and at most one `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub elif: Option<ElifArm>,
    pub else_body: Option<Vec<Stmt>>,
    pub span: Span,
}

impl IfStmt {
    pub fn new(condition: Expr, body: Vec<Stmt>) -> Self {
        Self {
            condition,
            body,
            elif: None,
            else_body: None,
            span: Span::default(),
        }
    }

    pub fn with_elif(mut self, condition: Expr, body: Vec<Stmt>) -> Self {
        self.elif = Some(ElifArm { condition, body });
        self
    }

    pub fn with_else(mut self, body: Vec<Stmt>) -> Self {
        self.else_body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElifArm {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    /// `return` without a value carries the `None` literal.
    pub value: Expr,
    pub span: Span,
}

/// `name: type = value` inside a body.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVarDef {
    pub name: String,
    pub ty: Type,
    pub value: Expr,
    pub span: Span,
}

/// `name: type = literal` at top level or in a class body.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub ty: Type,
    pub value: Literal,
    pub span: Span,
}

impl VarDef {
    pub fn new(name: &str, ty: Type, value: Literal) -> Self {
        Self {
            name: name.to_string(),
            ty,
            value,
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

impl Param {
    pub fn new(name: &str, ty: Type) -> Self {
        Self {
            name: name.to_string(),
            ty,
            span: Span::default(),
        }
    }
}

/// A function or method definition.
///
/// Methods list their receiver as an ordinary first parameter named `self`.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Type,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl FuncDef {
    pub fn new(name: &str, params: Vec<Param>, ret: Type, body: Vec<Stmt>) -> Self {
        Self {
            name: name.to_string(),
            params,
            ret,
            body,
            span: Span::default(),
        }
    }

    /// Names declared by `vardef` anywhere in the body, in order.
    ///
    /// Scoping is flat, so declarations nested inside `if`/`while` bodies
    /// belong to the function as well.
    pub fn declared_locals(&self) -> Vec<&LocalVarDef> {
        let mut out = Vec::new();
        collect_var_defs(&self.body, &mut out);
        out
    }
}

/// Collect every `vardef` in `stmts`, descending into nested bodies.
pub fn collect_var_defs<'a>(stmts: &'a [Stmt], out: &mut Vec<&'a LocalVarDef>) {
    for stmt in stmts {
        match stmt {
            Stmt::VarDef(def) => out.push(def),
            Stmt::If(if_stmt) => {
                collect_var_defs(&if_stmt.body, out);
                if let Some(elif) = &if_stmt.elif {
                    collect_var_defs(&elif.body, out);
                }
                if let Some(else_body) = &if_stmt.else_body {
                    collect_var_defs(else_body, out);
                }
            }
            Stmt::While(while_stmt) => collect_var_defs(&while_stmt.body, out),
            Stmt::Assign(_)
            | Stmt::Pass(_)
            | Stmt::Return(_)
            | Stmt::Expr(_)
            | Stmt::FuncDef(_)
            | Stmt::ClassDef(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    /// Field declarations in source order
    pub fields: Vec<VarDef>,
    /// Method definitions in source order
    pub methods: Vec<FuncDef>,
    pub span: Span,
}

impl ClassDef {
    pub fn new(name: &str, fields: Vec<VarDef>, methods: Vec<FuncDef>) -> Self {
        Self {
            name: name.to_string(),
            fields,
            methods,
            span: Span::default(),
        }
    }
}
