//! Expression lowering.

use snek_core::{CodeGenError, Literal, SELF_PARAM, Span, Type, UnaryOp};
use snek_parser::ast::{Expr, ExprKind, Name};

use super::{CodeGenerator, Result, Slots};
use crate::helpers::Helper;
use crate::instr::{Instr, NumericOp};
use crate::module::{
    HEAP_POINTER, NOT_OPERATOR, PRINT_BOOL, PRINT_NONE, PRINT_NUM, method_symbol,
};

impl CodeGenerator<'_> {
    /// Lower an expression. `None` lowers to nothing at all.
    pub(super) fn expr(&mut self, expr: &Expr, slots: &Slots) -> Result<Vec<Instr>> {
        let mut out = Vec::new();
        match &expr.kind {
            ExprKind::Literal(Literal::None) | ExprKind::Name(Name::None) => {}
            ExprKind::Literal(lit) => out.push(Instr::Const(lit.as_word())),
            ExprKind::Name(Name::SelfRef) => out.push(slots.get(SELF_PARAM)),
            ExprKind::Name(Name::Plain(name)) => out.push(slots.get(name)),
            ExprKind::Unary { op, operand } => {
                let operand = self.value(operand, slots)?;
                match op {
                    UnaryOp::Not => {
                        out.extend(operand);
                        out.push(Instr::call(NOT_OPERATOR));
                    }
                    UnaryOp::Neg => {
                        out.push(Instr::Const(0));
                        out.extend(operand);
                        out.push(Instr::Numeric(NumericOp::Sub));
                    }
                }
            }
            ExprKind::Binary { op, left, right } => {
                out.extend(self.value(left, slots)?);
                out.extend(self.value(right, slots)?);
                out.push(Instr::Numeric(NumericOp::from_binary(*op)));
            }
            ExprKind::Call { name, args } => {
                for arg in args {
                    out.extend(self.value(arg, slots)?);
                }
                out.push(Instr::call(name));
            }
            ExprKind::Builtin1 { func, arg } => {
                let helper = Helper::for_builtin1(*func);
                self.helpers.insert(helper);
                out.extend(self.value(arg, slots)?);
                out.push(Instr::call(helper.symbol()));
            }
            ExprKind::Builtin2 { func, left, right } => {
                let helper = Helper::for_builtin2(*func);
                self.helpers.insert(helper);
                out.extend(self.value(left, slots)?);
                out.extend(self.value(right, slots)?);
                out.push(Instr::call(helper.symbol()));
            }
            ExprKind::Construct { class } => self.construct(class, expr.span, &mut out)?,
            ExprKind::Field { object, field } => {
                let class = receiver_class(object)?;
                let offset = self.layouts.field(&class, field, expr.span)?.offset();
                out.extend(self.value(object, slots)?);
                out.push(Instr::Const(offset as i32));
                out.push(Instr::Numeric(NumericOp::Add));
                out.push(Instr::Load);
            }
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => {
                let class = receiver_class(object)?;
                out.extend(self.value(object, slots)?);
                for arg in args {
                    out.extend(self.value(arg, slots)?);
                }
                out.push(Instr::Call(method_symbol(&class, method)));
            }
            ExprKind::Print { args } => {
                let [arg] = args.as_slice() else {
                    return Err(CodeGenError::Unsupported {
                        what: format!("print with {} arguments", args.len()),
                        span: expr.span,
                    });
                };
                let target = match typed(arg)? {
                    Type::Int => PRINT_NUM,
                    Type::Bool => PRINT_BOOL,
                    Type::None => PRINT_NONE,
                    other => {
                        return Err(CodeGenError::UnsupportedPrint {
                            ty: other.clone(),
                            span: expr.span,
                        });
                    }
                };
                out.extend(self.value(arg, slots)?);
                out.push(Instr::call(target));
            }
        }
        Ok(out)
    }

    /// Lower an expression whose value the next instruction consumes; an
    /// empty lowering becomes `i32.const 0`.
    pub(super) fn value(&mut self, expr: &Expr, slots: &Slots) -> Result<Vec<Instr>> {
        let mut out = self.expr(expr, slots)?;
        if out.is_empty() {
            out.push(Instr::Const(0));
        }
        Ok(out)
    }

    /// Bump-allocate an instance and store every field default. Leaves the
    /// object address on the stack.
    fn construct(&self, class: &str, span: Span, out: &mut Vec<Instr>) -> Result<()> {
        let layout = self.layouts.get(class, span)?;
        for field in &layout.fields {
            out.push(Instr::global_get(HEAP_POINTER));
            out.push(Instr::Const(field.offset() as i32));
            out.push(Instr::Numeric(NumericOp::Add));
            out.push(Instr::Const(field.default.as_word()));
            out.push(Instr::Store);
        }
        out.push(Instr::global_get(HEAP_POINTER));
        out.push(Instr::global_get(HEAP_POINTER));
        out.push(Instr::Const(layout.size() as i32));
        out.push(Instr::Numeric(NumericOp::Add));
        out.push(Instr::global_set(HEAP_POINTER));
        Ok(())
    }
}

/// The checked type of an expression.
pub(super) fn typed(expr: &Expr) -> Result<&Type> {
    expr.ty()
        .ok_or(CodeGenError::MissingType { span: expr.span })
}

/// Class name of an object-typed receiver.
pub(super) fn receiver_class(object: &Expr) -> Result<String> {
    match typed(object)? {
        Type::Object(class) => Ok(class.clone()),
        actual => Err(CodeGenError::ReceiverNotObject {
            actual: actual.clone(),
            span: object.span,
        }),
    }
}

#[cfg(test)]
mod tests {
    use snek_core::{BinaryOp, CodeGenError, Literal, Type, UnaryOp};
    use snek_parser::ast::{ClassDef, Expr, Program, Stmt, VarDef};

    use crate::checker::TypeChecker;
    use crate::codegen::CodeGenerator;
    use crate::instr::{Instr, NumericOp};
    use crate::module::{HEAP_POINTER, NOT_OPERATOR, PRINT_BOOL, PRINT_NONE, SCRATCH_LOCAL};
    use crate::options::CompileOptions;

    /// Lowering of a single trailing expression statement, without the
    /// scratch store.
    fn lower(program: Program) -> Vec<Instr> {
        let typed = TypeChecker::check(program).unwrap();
        let module = CodeGenerator::generate(&typed, &CompileOptions::default()).unwrap();
        let mut body = module.export("_start").unwrap().body.clone();
        // Trailing `local.set $rt.scratch`, `local.get $rt.scratch`.
        body.truncate(body.len() - 2);
        body
    }

    fn lower_expr(expr: Expr) -> Vec<Instr> {
        lower(Program::new().with_stmt(Stmt::expr(expr)))
    }

    fn point() -> ClassDef {
        ClassDef::new(
            "Point",
            vec![
                VarDef::new("x", Type::Int, Literal::Number(3)),
                VarDef::new("y", Type::Bool, Literal::Bool(true)),
            ],
            vec![],
        )
    }

    #[test]
    fn literals_and_operators() {
        assert_eq!(
            lower_expr(Expr::binary(BinaryOp::FloorDiv, Expr::number(7), Expr::number(2))),
            [
                Instr::Const(7),
                Instr::Const(2),
                Instr::Numeric(NumericOp::DivS)
            ]
        );
        assert_eq!(
            lower_expr(Expr::unary(UnaryOp::Neg, Expr::number(4))),
            [
                Instr::Const(0),
                Instr::Const(4),
                Instr::Numeric(NumericOp::Sub)
            ]
        );
        assert_eq!(
            lower_expr(Expr::unary(UnaryOp::Not, Expr::boolean(true))),
            [Instr::Const(1), Instr::call(NOT_OPERATOR)]
        );
    }

    #[test]
    fn none_lowers_to_nothing_but_is_normalized_as_operand() {
        assert_eq!(
            lower_expr(Expr::binary(BinaryOp::Is, Expr::none(), Expr::name("None"))),
            [
                Instr::Const(0),
                Instr::Const(0),
                Instr::Numeric(NumericOp::Eq)
            ]
        );
        assert_eq!(
            lower_expr(Expr::print(Expr::none())),
            [Instr::Const(0), Instr::call(PRINT_NONE)]
        );
    }

    #[test]
    fn bare_none_statement_stores_zero() {
        let typed = TypeChecker::check(Program::new().with_stmt(Stmt::expr(Expr::none()))).unwrap();
        let module = CodeGenerator::generate(&typed, &CompileOptions::default()).unwrap();
        assert_eq!(
            module.export("_start").unwrap().body,
            [
                Instr::Const(0),
                Instr::local_set(SCRATCH_LOCAL),
                Instr::local_get(SCRATCH_LOCAL),
            ]
        );
    }

    #[test]
    fn construction_stores_defaults_and_bumps_heap() {
        let instrs = lower(
            Program::new()
                .with_class(point())
                .with_stmt(Stmt::expr(Expr::call("Point", vec![]))),
        );
        let heap = || Instr::global_get(HEAP_POINTER);
        assert_eq!(
            instrs,
            [
                heap(),
                Instr::Const(0),
                Instr::Numeric(NumericOp::Add),
                Instr::Const(3),
                Instr::Store,
                heap(),
                Instr::Const(4),
                Instr::Numeric(NumericOp::Add),
                Instr::Const(1),
                Instr::Store,
                heap(),
                heap(),
                Instr::Const(8),
                Instr::Numeric(NumericOp::Add),
                Instr::global_set(HEAP_POINTER),
            ]
        );
    }

    #[test]
    fn field_read_adds_offset_and_loads() {
        let instrs = lower(
            Program::new()
                .with_class(point())
                .with_var(VarDef::new("p", Type::object("Point"), Literal::None))
                .with_stmt(Stmt::expr(Expr::print(Expr::field(Expr::name("p"), "y")))),
        );
        assert_eq!(
            instrs,
            [
                Instr::global_get("p"),
                Instr::Const(4),
                Instr::Numeric(NumericOp::Add),
                Instr::Load,
                Instr::call(PRINT_BOOL),
            ]
        );
    }

    #[test]
    fn printing_an_object_fails() {
        let typed = TypeChecker::check(
            Program::new()
                .with_class(point())
                .with_stmt(Stmt::expr(Expr::print(Expr::call("Point", vec![])))),
        )
        .unwrap();
        let err = CodeGenerator::generate(&typed, &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CodeGenError::UnsupportedPrint { .. }));
    }

    #[test]
    fn unchecked_tree_is_rejected() {
        let program = Program::new().with_stmt(Stmt::expr(Expr::print(Expr::number(1))));
        let err = CodeGenerator::generate(&program, &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CodeGenError::MissingType { .. }));
    }
}
