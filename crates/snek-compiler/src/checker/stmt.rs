//! Statement checking.

use snek_core::{Span, Type, TypeError};
use snek_parser::ast::{AssignStmt, AssignTarget, Expr, IfStmt, LocalVarDef, ReturnStmt, Stmt};

use super::{Result, TypeChecker};

impl TypeChecker {
    pub(super) fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<()> {
        match stmt {
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::If(if_stmt) => self.check_if(if_stmt),
            Stmt::While(while_stmt) => {
                self.check_condition(&mut while_stmt.condition, "while")?;
                self.check_body(&mut while_stmt.body)
            }
            Stmt::Pass(_) => Ok(()),
            Stmt::Return(ret) => self.check_return(ret),
            Stmt::Expr(expr) => self.check_expr(expr).map(drop),
            Stmt::VarDef(def) => self.check_var_def(def),
            Stmt::FuncDef(func) => Err(TypeError::NestedDefinition {
                name: func.name.clone(),
                span: func.span,
            }),
            Stmt::ClassDef(class) => Err(TypeError::NestedDefinition {
                name: class.name.clone(),
                span: class.span,
            }),
        }
    }

    fn check_body(&mut self, body: &mut [Stmt]) -> Result<()> {
        body.iter_mut().try_for_each(|stmt| self.check_stmt(stmt))
    }

    fn check_assign(&mut self, assign: &mut AssignStmt) -> Result<()> {
        let actual = self.check_expr(&mut assign.value)?;
        match &mut assign.target {
            AssignTarget::Name(name) => {
                let expected = self.lookup(name, assign.span)?;
                require(&expected, &actual, || format!("assignment to '{name}'"), assign.span)
            }
            AssignTarget::Field { object, field } => {
                let class = self.receiver_class(object)?;
                let expected = self.field_type(&class, field, assign.span)?;
                require(
                    &expected,
                    &actual,
                    || format!("assignment to field '{class}.{field}'"),
                    assign.span,
                )
            }
        }
    }

    /// A `vardef` declares a local inside a body and a global at top level.
    ///
    /// Any object initializer is accepted for an object declaration, without
    /// comparing class names.
    fn check_var_def(&mut self, def: &mut LocalVarDef) -> Result<()> {
        self.classes.validate(&def.ty, def.span)?;
        let actual = self.check_expr(&mut def.value)?;
        let compatible = def.ty.accepts(&actual) || (def.ty.is_object() && actual.is_object());
        if !compatible {
            return Err(TypeError::Mismatch {
                context: format!("declaration of '{}'", def.name),
                expected: def.ty.clone(),
                actual,
                span: def.span,
            });
        }

        if self.function.is_some() {
            self.locals.declare(&def.name, def.ty.clone(), def.span)
        } else {
            self.globals.declare_var(&def.name, def.ty.clone(), def.span)
        }
    }

    fn check_if(&mut self, if_stmt: &mut IfStmt) -> Result<()> {
        self.check_condition(&mut if_stmt.condition, "if")?;
        self.check_body(&mut if_stmt.body)?;
        if let Some(elif) = &mut if_stmt.elif {
            self.check_condition(&mut elif.condition, "elif")?;
            self.check_body(&mut elif.body)?;
        }
        if let Some(else_body) = &mut if_stmt.else_body {
            self.check_body(else_body)?;
        }
        Ok(())
    }

    fn check_condition(&mut self, condition: &mut Expr, construct: &'static str) -> Result<()> {
        let actual = self.check_expr(condition)?;
        if actual == Type::Bool {
            Ok(())
        } else {
            Err(TypeError::ConditionNotBool {
                construct,
                actual,
                span: condition.span,
            })
        }
    }

    fn check_return(&mut self, ret: &mut ReturnStmt) -> Result<()> {
        if self.function.is_none() {
            return Err(TypeError::ReturnOutsideFunction { span: ret.span });
        }
        let actual = self.check_expr(&mut ret.value)?;
        let Some(scope) = self.function.as_mut() else {
            return Err(TypeError::ReturnOutsideFunction { span: ret.span });
        };
        require(
            &scope.ret,
            &actual,
            || format!("return from '{}'", scope.name),
            ret.span,
        )?;
        scope.has_returned = true;
        Ok(())
    }
}

/// Fail with `Mismatch` unless a slot of type `expected` accepts `actual`.
fn require(
    expected: &Type,
    actual: &Type,
    context: impl FnOnce() -> String,
    span: Span,
) -> Result<()> {
    if expected.accepts(actual) {
        Ok(())
    } else {
        Err(TypeError::Mismatch {
            context: context(),
            expected: expected.clone(),
            actual: actual.clone(),
            span,
        })
    }
}
