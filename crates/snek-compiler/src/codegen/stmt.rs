//! Statement lowering.

use snek_core::{CONSTRUCTOR, CodeGenError};
use snek_parser::ast::{AssignTarget, Expr, ExprKind, IfStmt, Stmt};

use super::expr::receiver_class;
use super::{CodeGenerator, Result, Slots};
use crate::instr::{Instr, NumericOp};
use crate::module::{SCRATCH_LOCAL, method_symbol};

impl CodeGenerator<'_> {
    pub(super) fn block(&mut self, stmts: &[Stmt], slots: &Slots) -> Result<Vec<Instr>> {
        let mut out = Vec::new();
        for stmt in stmts {
            self.stmt(stmt, slots, &mut out)?;
        }
        Ok(out)
    }

    fn stmt(&mut self, stmt: &Stmt, slots: &Slots, out: &mut Vec<Instr>) -> Result<()> {
        match stmt {
            Stmt::Assign(assign) => match &assign.target {
                AssignTarget::Name(name) => self.store_name(name, &assign.value, slots, out)?,
                AssignTarget::Field { object, field } => {
                    let class = receiver_class(object)?;
                    let offset = self.layouts.field(&class, field, assign.span)?.offset();
                    out.extend(self.value(object, slots)?);
                    out.push(Instr::Const(offset as i32));
                    out.push(Instr::Numeric(NumericOp::Add));
                    out.extend(self.value(&assign.value, slots)?);
                    out.push(Instr::Store);
                }
            },
            Stmt::VarDef(def) => self.store_name(&def.name, &def.value, slots, out)?,
            Stmt::If(if_stmt) => self.if_stmt(if_stmt, slots, out)?,
            Stmt::While(while_stmt) => {
                let mut body = self.value(&while_stmt.condition, slots)?;
                body.push(Instr::Eqz);
                body.push(Instr::BrIf(1));
                body.extend(self.block(&while_stmt.body, slots)?);
                body.push(Instr::Br(0));
                out.push(Instr::Block(vec![Instr::Loop(body)]));
            }
            Stmt::Pass(_) => out.push(Instr::Nop),
            Stmt::Return(ret) => {
                out.extend(self.value(&ret.value, slots)?);
                out.push(Instr::Return);
            }
            Stmt::Expr(expr) => {
                out.extend(self.value(expr, slots)?);
                out.push(Instr::local_set(SCRATCH_LOCAL));
            }
            Stmt::FuncDef(func) => {
                return Err(CodeGenError::Unsupported {
                    what: format!("nested function '{}'", func.name),
                    span: func.span,
                });
            }
            Stmt::ClassDef(class) => {
                return Err(CodeGenError::Unsupported {
                    what: format!("nested class '{}'", class.name),
                    span: class.span,
                });
            }
        }
        Ok(())
    }

    /// Store into a named slot. A value that lowers to nothing skips the
    /// store; constructing a class with `__init__` runs it on the new object.
    fn store_name(
        &mut self,
        name: &str,
        value: &Expr,
        slots: &Slots,
        out: &mut Vec<Instr>,
    ) -> Result<()> {
        let instrs = self.expr(value, slots)?;
        if instrs.is_empty() {
            return Ok(());
        }
        out.extend(instrs);
        out.push(slots.set(name));

        if let ExprKind::Construct { class } = &value.kind {
            if self.layouts.get(class, value.span)?.has_constructor {
                out.push(slots.get(name));
                out.push(Instr::Call(method_symbol(class, CONSTRUCTOR)));
                out.push(slots.set(name));
            }
        }
        Ok(())
    }

    /// `if` with an optional `elif` nests the `elif` arm in the `else` arm.
    fn if_stmt(&mut self, if_stmt: &IfStmt, slots: &Slots, out: &mut Vec<Instr>) -> Result<()> {
        let then = self.block(&if_stmt.body, slots)?;
        let else_body = match &if_stmt.else_body {
            Some(body) => self.block(body, slots)?,
            None => Vec::new(),
        };

        let otherwise = match &if_stmt.elif {
            Some(elif) => {
                let mut nested = self.value(&elif.condition, slots)?;
                nested.push(Instr::If {
                    then: self.block(&elif.body, slots)?,
                    otherwise: else_body,
                });
                nested
            }
            None => else_body,
        };

        out.extend(self.value(&if_stmt.condition, slots)?);
        out.push(Instr::If { then, otherwise });
        Ok(())
    }
}
