//! Expression AST nodes.
//!
//! Every [`Expr`] carries an optional [`Type`]. The AST builder leaves it
//! empty; the type checker fills it in and returns the same tree, which is
//! then the typed AST consumed by the code generator.

use snek_core::{BinaryOp, Literal, Span, Type, UnaryOp};

/// An expression with its (optional) inferred type.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Filled in by the type checker.
    pub ty: Option<Type>,
}

/// The shape of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// Identifier reference
    Name(Name),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Call of a free function
    Call { name: String, args: Vec<Expr> },
    /// One-argument built-in (`abs`)
    Builtin1 { func: Builtin1, arg: Box<Expr> },
    /// Two-argument built-in (`max`, `min`, `pow`)
    Builtin2 {
        func: Builtin2,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `ClassName()`
    Construct { class: String },
    /// `object.field`
    Field { object: Box<Expr>, field: String },
    /// `object.method(args…)`
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// `print(arg)`; the argument count is validated by the checker
    Print { args: Vec<Expr> },
}

/// What an identifier refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Name {
    /// The method receiver
    SelfRef,
    /// The reserved `none` / `None` name
    None,
    Plain(String),
}

impl Name {
    /// Classify an identifier as written in source.
    pub fn from_ident(ident: &str) -> Self {
        match ident {
            "self" => Name::SelfRef,
            "none" | "None" => Name::None,
            other => Name::Plain(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin1 {
    Abs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin2 {
    Max,
    Min,
    Pow,
}

impl Builtin1 {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "abs" => Some(Builtin1::Abs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin1::Abs => "abs",
        }
    }
}

impl Builtin2 {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "max" => Some(Builtin2::Max),
            "min" => Some(Builtin2::Min),
            "pow" => Some(Builtin2::Pow),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin2::Max => "max",
            Builtin2::Min => "min",
            Builtin2::Pow => "pow",
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }

    /// The inferred type, if the expression has been checked.
    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    // ------------------------------------------------------------------
    // Span-less constructors, for front ends and tests that build trees
    // directly.
    // ------------------------------------------------------------------

    pub fn number(value: i32) -> Self {
        Self::new(ExprKind::Literal(Literal::Number(value)), Span::default())
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(ExprKind::Literal(Literal::Bool(value)), Span::default())
    }

    pub fn none() -> Self {
        Self::new(ExprKind::Literal(Literal::None), Span::default())
    }

    /// An identifier; `self` and `None` are classified automatically.
    pub fn name(ident: &str) -> Self {
        Self::new(ExprKind::Name(Name::from_ident(ident)), Span::default())
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            Span::default(),
        )
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            Span::default(),
        )
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Self::new(
            ExprKind::Call {
                name: name.to_string(),
                args,
            },
            Span::default(),
        )
    }

    pub fn construct(class: &str) -> Self {
        Self::new(
            ExprKind::Construct {
                class: class.to_string(),
            },
            Span::default(),
        )
    }

    pub fn field(object: Expr, field: &str) -> Self {
        Self::new(
            ExprKind::Field {
                object: Box::new(object),
                field: field.to_string(),
            },
            Span::default(),
        )
    }

    pub fn method_call(object: Expr, method: &str, args: Vec<Expr>) -> Self {
        Self::new(
            ExprKind::MethodCall {
                object: Box::new(object),
                method: method.to_string(),
                args,
            },
            Span::default(),
        )
    }

    pub fn print(arg: Expr) -> Self {
        Self::new(ExprKind::Print { args: vec![arg] }, Span::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names() {
        assert_eq!(Name::from_ident("self"), Name::SelfRef);
        assert_eq!(Name::from_ident("None"), Name::None);
        assert_eq!(Name::from_ident("none"), Name::None);
        assert_eq!(Name::from_ident("x"), Name::Plain("x".to_string()));
    }

    #[test]
    fn builtins_by_name() {
        assert_eq!(Builtin1::from_name("abs"), Some(Builtin1::Abs));
        assert_eq!(Builtin2::from_name("pow"), Some(Builtin2::Pow));
        assert_eq!(Builtin2::from_name("print"), None);
        assert_eq!(Builtin2::Min.name(), "min");
    }

    #[test]
    fn constructors_start_untyped() {
        let e = Expr::binary(BinaryOp::Add, Expr::number(1), Expr::name("x"));
        assert!(e.ty().is_none());
        let ExprKind::Binary { right, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(right.kind, ExprKind::Name(Name::Plain("x".to_string())));
    }
}
