//! Expression checking.
//!
//! Every checked expression has its `ty` field set before its type is
//! returned.

use snek_core::{BinaryOp, OperandRule, Span, Type, TypeError, UnaryOp};
use snek_parser::ast::{Expr, ExprKind, Name};

use super::{Result, TypeChecker};

impl TypeChecker {
    pub(super) fn check_expr(&mut self, expr: &mut Expr) -> Result<Type> {
        self.resolve_construction(expr)?;
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::Literal(lit) => lit.ty(),
            ExprKind::Name(name) => self.check_name(name, span)?,
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand)?,
            ExprKind::Binary { op, left, right } => self.check_binary(*op, left, right, span)?,
            ExprKind::Call { name, args } => self.check_call(name, args, span)?,
            ExprKind::Builtin1 { func, arg } => {
                self.check_builtin_args(func.name(), [&mut **arg])?;
                Type::Int
            }
            ExprKind::Builtin2 { func, left, right } => {
                self.check_builtin_args(func.name(), [&mut **left, &mut **right])?;
                Type::Int
            }
            ExprKind::Construct { class } => self.check_construct(class, span)?,
            ExprKind::Field { object, field } => {
                let class = self.receiver_class(object)?;
                self.field_type(&class, field, span)?
            }
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => self.check_method_call(object, method, args, span)?,
            ExprKind::Print { args } => {
                if args.len() != 1 {
                    return Err(TypeError::PrintArity {
                        count: args.len(),
                        span,
                    });
                }
                self.check_expr(&mut args[0])?
            }
        };
        expr.ty = Some(ty.clone());
        Ok(ty)
    }

    /// Rewrite a call whose callee names a class into a construction.
    fn resolve_construction(&mut self, expr: &mut Expr) -> Result<()> {
        let ExprKind::Call { name, args } = &expr.kind else {
            return Ok(());
        };
        if !self.classes.contains(name) {
            return Ok(());
        }
        if !args.is_empty() {
            return Err(TypeError::ConstructorArguments {
                class: name.clone(),
                count: args.len(),
                span: expr.span,
            });
        }
        expr.kind = ExprKind::Construct {
            class: name.clone(),
        };
        Ok(())
    }

    fn check_name(&self, name: &Name, span: Span) -> Result<Type> {
        match name {
            Name::SelfRef => self
                .function
                .as_ref()
                .and_then(|f| f.class.as_deref())
                .map(Type::object)
                .ok_or(TypeError::SelfOutsideClass { span }),
            Name::None => Ok(Type::None),
            Name::Plain(name) => self.lookup(name, span),
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &mut Expr) -> Result<Type> {
        let (expected, result) = op.signature();
        let actual = self.check_expr(operand)?;
        if actual != expected {
            return Err(TypeError::UnsupportedOperand {
                op: op.as_str().to_string(),
                expected,
                actual,
                span: operand.span,
            });
        }
        Ok(result)
    }

    fn check_binary(
        &mut self,
        op: BinaryOp,
        left: &mut Expr,
        right: &mut Expr,
        span: Span,
    ) -> Result<Type> {
        let left_ty = self.check_expr(left)?;
        let right_ty = self.check_expr(right)?;
        match op.rule() {
            OperandRule::Uniform { operand, result } => {
                for (actual, side) in [(left_ty, &*left), (right_ty, &*right)] {
                    if actual != operand {
                        return Err(TypeError::UnsupportedOperand {
                            op: op.as_str().to_string(),
                            expected: operand,
                            actual,
                            span: side.span,
                        });
                    }
                }
                Ok(result)
            }
            OperandRule::SameType { result } => {
                if left_ty != right_ty {
                    return Err(TypeError::OperandMismatch {
                        op,
                        left: left_ty,
                        right: right_ty,
                        span,
                    });
                }
                Ok(result)
            }
        }
    }

    fn check_call(&mut self, name: &str, args: &mut [Expr], span: Span) -> Result<Type> {
        let sig = self
            .globals
            .func(name)
            .cloned()
            .ok_or_else(|| TypeError::UnknownFunction {
                name: name.to_string(),
                span,
            })?;
        self.check_args(name, &sig.params, args, span)?;
        Ok(sig.ret)
    }

    fn check_method_call(
        &mut self,
        object: &mut Expr,
        method: &str,
        args: &mut [Expr],
        span: Span,
    ) -> Result<Type> {
        let class = self.receiver_class(object)?;
        let sig = self
            .classes
            .class(&class, span)?
            .method(method)
            .cloned()
            .ok_or_else(|| TypeError::UnknownMethod {
                class: class.clone(),
                method: method.to_string(),
                span,
            })?;
        let callee = format!("{class}.{method}");
        // The receiver is the first declared parameter.
        self.check_args(&callee, sig.params.get(1..).unwrap_or_default(), args, span)?;
        Ok(sig.ret)
    }

    /// Argument count and exact argument types against `params`.
    fn check_args(
        &mut self,
        callee: &str,
        params: &[Type],
        args: &mut [Expr],
        span: Span,
    ) -> Result<()> {
        if args.len() != params.len() {
            return Err(TypeError::ArgumentCount {
                callee: callee.to_string(),
                expected: params.len(),
                actual: args.len(),
                span,
            });
        }
        for (index, (arg, expected)) in args.iter_mut().zip(params).enumerate() {
            let actual = self.check_expr(arg)?;
            if actual != *expected {
                return Err(TypeError::ArgumentType {
                    callee: callee.to_string(),
                    index,
                    expected: expected.clone(),
                    actual,
                    span: arg.span,
                });
            }
        }
        Ok(())
    }

    fn check_builtin_args<const N: usize>(
        &mut self,
        callee: &str,
        args: [&mut Expr; N],
    ) -> Result<()> {
        for (index, arg) in args.into_iter().enumerate() {
            let actual = self.check_expr(arg)?;
            if actual != Type::Int {
                return Err(TypeError::ArgumentType {
                    callee: callee.to_string(),
                    index,
                    expected: Type::Int,
                    actual,
                    span: arg.span,
                });
            }
        }
        Ok(())
    }

    /// `Class()`: the class must exist and its constructor, if any, must take
    /// no arguments beyond `self`.
    fn check_construct(&self, class: &str, span: Span) -> Result<Type> {
        let info = self.classes.class(class, span)?;
        let extra = info
            .constructor()
            .map_or(0, |sig| sig.params.len().saturating_sub(1));
        if extra > 0 {
            return Err(TypeError::ConstructorArguments {
                class: class.to_string(),
                count: extra,
                span,
            });
        }
        Ok(Type::object(class))
    }

    /// Check a receiver expression and return its class name.
    pub(super) fn receiver_class(&mut self, object: &mut Expr) -> Result<String> {
        match self.check_expr(object)? {
            Type::Object(class) => Ok(class),
            actual => Err(TypeError::NotAnObject {
                actual,
                span: object.span,
            }),
        }
    }

    /// Declared type of `class.field`.
    pub(super) fn field_type(&self, class: &str, field: &str, span: Span) -> Result<Type> {
        self.classes
            .class(class, span)?
            .field(field)
            .map(|f| f.ty.clone())
            .ok_or_else(|| TypeError::UnknownField {
                class: class.to_string(),
                field: field.to_string(),
                span,
            })
    }
}

#[cfg(test)]
mod tests {
    use snek_core::{BinaryOp, CONSTRUCTOR, Literal, Type, TypeError, UnaryOp};
    use snek_parser::ast::{ClassDef, Expr, ExprKind, FuncDef, Param, Program, Stmt, VarDef};

    use crate::checker::TypeChecker;

    fn check_expr(expr: Expr) -> Result<Type, TypeError> {
        let program = Program::new().with_stmt(Stmt::expr(expr));
        TypeChecker::check(program).map(|p| p.ty.unwrap_or(Type::None))
    }

    fn with_counter(stmts: Vec<Stmt>) -> Program {
        let inc = FuncDef::new(
            "add",
            vec![Param::new("self", Type::object("Counter")), Param::new("n", Type::Int)],
            Type::Int,
            vec![Stmt::ret(Expr::name("n"))],
        );
        let class = ClassDef::new(
            "Counter",
            vec![VarDef::new("value", Type::Int, Literal::Number(0))],
            vec![inc],
        );
        let mut program = Program::new()
            .with_class(class)
            .with_var(VarDef::new("c", Type::object("Counter"), Literal::None));
        program.stmts = stmts;
        program
    }

    #[test]
    fn arithmetic_requires_ints() {
        assert_eq!(
            check_expr(Expr::binary(BinaryOp::Add, Expr::number(1), Expr::number(2))),
            Ok(Type::Int)
        );
        assert_eq!(
            check_expr(Expr::binary(BinaryOp::Less, Expr::number(1), Expr::number(2))),
            Ok(Type::Bool)
        );
        let err = check_expr(Expr::binary(
            BinaryOp::Add,
            Expr::number(1),
            Expr::boolean(true),
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            TypeError::UnsupportedOperand {
                expected: Type::Int,
                actual: Type::Bool,
                ..
            }
        ));
    }

    #[test]
    fn equality_requires_identical_types() {
        assert_eq!(
            check_expr(Expr::binary(
                BinaryOp::Equal,
                Expr::boolean(true),
                Expr::boolean(false)
            )),
            Ok(Type::Bool)
        );
        assert!(matches!(
            check_expr(Expr::binary(
                BinaryOp::NotEqual,
                Expr::number(1),
                Expr::boolean(false)
            )),
            Err(TypeError::OperandMismatch { .. })
        ));
    }

    #[test]
    fn is_requires_none_operands() {
        assert_eq!(
            check_expr(Expr::binary(BinaryOp::Is, Expr::none(), Expr::name("None"))),
            Ok(Type::Bool)
        );
        assert!(check_expr(Expr::binary(BinaryOp::Is, Expr::number(0), Expr::none())).is_err());
    }

    #[test]
    fn unary_operators() {
        assert_eq!(check_expr(Expr::unary(UnaryOp::Not, Expr::boolean(true))), Ok(Type::Bool));
        assert_eq!(check_expr(Expr::unary(UnaryOp::Neg, Expr::number(3))), Ok(Type::Int));
        assert!(check_expr(Expr::unary(UnaryOp::Not, Expr::number(3))).is_err());
    }

    #[test]
    fn print_takes_the_argument_type() {
        assert_eq!(check_expr(Expr::print(Expr::boolean(true))), Ok(Type::Bool));
        let arity = Expr::new(
            ExprKind::Print { args: vec![] },
            snek_core::Span::default(),
        );
        assert!(matches!(
            check_expr(arity),
            Err(TypeError::PrintArity { count: 0, .. })
        ));
    }

    #[test]
    fn builtins_take_ints() {
        let max = Expr::new(
            ExprKind::Builtin2 {
                func: snek_parser::ast::Builtin2::Max,
                left: Box::new(Expr::number(1)),
                right: Box::new(Expr::boolean(true)),
            },
            snek_core::Span::default(),
        );
        assert!(matches!(
            check_expr(max),
            Err(TypeError::ArgumentType { index: 1, .. })
        ));
    }

    #[test]
    fn undefined_and_self_outside_class() {
        assert!(matches!(
            check_expr(Expr::name("ghost")),
            Err(TypeError::UndefinedName { .. })
        ));
        assert!(matches!(
            check_expr(Expr::name("self")),
            Err(TypeError::SelfOutsideClass { .. })
        ));
    }

    #[test]
    fn function_call_arguments() {
        let f = FuncDef::new(
            "f",
            vec![Param::new("a", Type::Int), Param::new("b", Type::Bool)],
            Type::Bool,
            vec![Stmt::ret(Expr::name("b"))],
        );
        let good = Program::new().with_func(f.clone()).with_stmt(Stmt::expr(Expr::call(
            "f",
            vec![Expr::number(1), Expr::boolean(true)],
        )));
        assert_eq!(TypeChecker::check(good).unwrap().ty, Some(Type::Bool));

        let count = Program::new()
            .with_func(f.clone())
            .with_stmt(Stmt::expr(Expr::call("f", vec![Expr::number(1)])));
        assert!(matches!(
            TypeChecker::check(count).unwrap_err(),
            TypeError::ArgumentCount {
                expected: 2,
                actual: 1,
                ..
            }
        ));

        let ty = Program::new().with_func(f).with_stmt(Stmt::expr(Expr::call(
            "f",
            vec![Expr::boolean(true), Expr::boolean(true)],
        )));
        assert!(matches!(
            TypeChecker::check(ty).unwrap_err(),
            TypeError::ArgumentType { index: 0, .. }
        ));

        assert!(matches!(
            check_expr(Expr::call("nope", vec![])),
            Err(TypeError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn method_call_excludes_receiver_from_arity() {
        let call = Expr::method_call(Expr::name("c"), "add", vec![Expr::number(2)]);
        let typed = TypeChecker::check(with_counter(vec![Stmt::expr(call)])).unwrap();
        assert_eq!(typed.ty, Some(Type::Int));

        let missing = Expr::method_call(Expr::name("c"), "add", vec![]);
        assert!(matches!(
            TypeChecker::check(with_counter(vec![Stmt::expr(missing)])).unwrap_err(),
            TypeError::ArgumentCount {
                expected: 1,
                actual: 0,
                ..
            }
        ));

        let unknown = Expr::method_call(Expr::name("c"), "sub", vec![]);
        assert!(matches!(
            TypeChecker::check(with_counter(vec![Stmt::expr(unknown)])).unwrap_err(),
            TypeError::UnknownMethod { .. }
        ));
    }

    #[test]
    fn field_access_on_non_object() {
        let access = Expr::field(Expr::number(1), "value");
        assert!(matches!(
            check_expr(access),
            Err(TypeError::NotAnObject { .. })
        ));
        let access = Expr::field(Expr::name("c"), "value");
        let typed = TypeChecker::check(with_counter(vec![Stmt::expr(access)])).unwrap();
        assert_eq!(typed.ty, Some(Type::Int));
    }

    #[test]
    fn construction_takes_no_arguments() {
        let with_args = Expr::call("Counter", vec![Expr::number(1)]);
        assert!(matches!(
            TypeChecker::check(with_counter(vec![Stmt::expr(with_args)])).unwrap_err(),
            TypeError::ConstructorArguments { count: 1, .. }
        ));

        let init = FuncDef::new(
            CONSTRUCTOR,
            vec![Param::new("self", Type::object("P")), Param::new("x", Type::Int)],
            Type::object("P"),
            vec![],
        );
        let program = Program::new()
            .with_class(ClassDef::new("P", vec![], vec![init]))
            .with_stmt(Stmt::expr(Expr::construct("P")));
        assert!(matches!(
            TypeChecker::check(program).unwrap_err(),
            TypeError::ConstructorArguments { count: 1, .. }
        ));

        assert!(matches!(
            check_expr(Expr::construct("Ghost")),
            Err(TypeError::UnknownClass { .. })
        ));
    }
}
