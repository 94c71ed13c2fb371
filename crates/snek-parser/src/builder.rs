//! Conversion from a concrete syntax tree to the untyped AST.
//!
//! [`AstBuilder`] walks a [`TreeCursor`] whose node kinds follow the Lezer
//! Python grammar. Every descent into a subtree goes through
//! [`AstBuilder::children`], which moves back to the parent before returning,
//! so the cursor ends on the node it started from even when a subtree fails to
//! convert.

use snek_core::{BinaryOp, Literal, ParseError, SELF_PARAM, Span, Type, UnaryOp};

use crate::ast::{
    AssignStmt, AssignTarget, Builtin1, Builtin2, ClassDef, ElifArm, Expr, ExprKind, FuncDef,
    IfStmt, LocalVarDef, Name, Param, Program, ReturnStmt, Stmt, VarDef, WhileStmt,
};
use crate::cursor::TreeCursor;

type Result<T> = std::result::Result<T, ParseError>;

/// An assignment statement before it is classified as a declaration or a
/// plain assignment.
struct Assignment {
    target: AssignTarget,
    annotation: Option<Type>,
    value: Expr,
    span: Span,
}

/// Builds the untyped AST from a syntax tree cursor.
pub struct AstBuilder<'c, C: TreeCursor> {
    cursor: &'c mut C,
}

impl<'c, C: TreeCursor> AstBuilder<'c, C> {
    pub fn new(cursor: &'c mut C) -> Self {
        Self { cursor }
    }

    /// Build a program from a cursor positioned on a `Script` node.
    #[tracing::instrument(skip_all)]
    pub fn build_program(&mut self) -> Result<Program> {
        if self.cursor.kind() != "Script" {
            return Err(self.unexpected("program"));
        }

        let mut program = Program::new();
        let mut seen_stmt = false;
        self.each_child(|b| {
            match b.cursor.kind() {
                "FunctionDefinition" => program.func_defs.push(b.func_def(None)?),
                "ClassDefinition" => program.class_defs.push(b.class_def()?),
                "AssignStatement" => {
                    let assignment = b.assignment()?;
                    match (seen_stmt, global_var_def(&assignment)) {
                        (false, Some(def)) => program.var_defs.push(def),
                        _ => {
                            seen_stmt = true;
                            program.stmts.push(assignment_stmt(assignment));
                        }
                    }
                }
                _ => {
                    seen_stmt = true;
                    program.stmts.push(b.stmt()?);
                }
            }
            Ok(())
        })?;

        tracing::debug!(
            vars = program.var_defs.len(),
            funcs = program.func_defs.len(),
            classes = program.class_defs.len(),
            stmts = program.stmts.len(),
            "built program"
        );
        Ok(program)
    }

    // ========================================================================
    // Cursor helpers
    // ========================================================================

    /// Run `f` on the first child of the current node, then return to it.
    fn children<T>(
        &mut self,
        context: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if !self.cursor.first_child() {
            return Err(ParseError::MissingNode {
                context,
                expected: "child node",
                span: self.cursor.span(),
            });
        }
        let result = f(self);
        self.cursor.parent();
        result
    }

    /// Run `f` on every non-trivia child of the current node.
    fn each_child(&mut self, mut f: impl FnMut(&mut Self) -> Result<()>) -> Result<()> {
        if !self.cursor.first_child() {
            return Ok(());
        }
        let result = (|| {
            loop {
                if !is_trivia(self.cursor.kind()) {
                    f(self)?;
                }
                if !self.cursor.next_sibling() {
                    return Ok(());
                }
            }
        })();
        self.cursor.parent();
        result
    }

    /// Advance to the next sibling, skipping trivia.
    fn advance(&mut self, context: &'static str, expected: &'static str) -> Result<()> {
        loop {
            if !self.cursor.next_sibling() {
                return Err(ParseError::MissingNode {
                    context,
                    expected,
                    span: self.cursor.span(),
                });
            }
            if !is_trivia(self.cursor.kind()) {
                return Ok(());
            }
        }
    }

    /// Advance to the next non-trivia sibling, if there is one.
    fn try_advance(&mut self) -> bool {
        while self.cursor.next_sibling() {
            if !is_trivia(self.cursor.kind()) {
                return true;
            }
        }
        false
    }

    fn unexpected(&self, context: &'static str) -> ParseError {
        ParseError::UnexpectedNode {
            context,
            kind: self.cursor.kind().to_string(),
            text: self.cursor.text().to_string(),
            span: self.cursor.span(),
        }
    }

    fn expect_kind(&self, kind: &str, context: &'static str) -> Result<()> {
        if self.cursor.kind() == kind {
            Ok(())
        } else {
            Err(self.unexpected(context))
        }
    }

    // ========================================================================
    // Definitions
    // ========================================================================

    /// `def name(params) [-> type]: body`
    fn func_def(&mut self, class: Option<&str>) -> Result<FuncDef> {
        const CTX: &str = "function definition";
        let span = self.cursor.span();
        self.children(CTX, |b| {
            b.expect_kind("def", CTX)?;
            b.advance(CTX, "function name")?;
            b.expect_kind("VariableName", CTX)?;
            let name = b.cursor.text().to_string();

            b.advance(CTX, "parameter list")?;
            b.expect_kind("ParamList", CTX)?;
            let params = b.params(class)?;

            b.advance(CTX, "body")?;
            let mut ret = Type::None;
            if b.cursor.kind() == "TypeDef" {
                ret = b.type_def()?;
                b.advance(CTX, "body")?;
            }
            b.expect_kind("Body", CTX)?;
            let body = b.body()?;

            Ok(FuncDef {
                name,
                params,
                ret,
                body,
                span,
            })
        })
    }

    /// `(name: type, …)`; inside a class an unannotated `self` gets the
    /// class's object type.
    fn params(&mut self, class: Option<&str>) -> Result<Vec<Param>> {
        const CTX: &str = "parameter list";
        let mut params: Vec<Param> = Vec::new();
        let mut annotated: Vec<bool> = Vec::new();
        self.each_child(|b| {
            match b.cursor.kind() {
                "(" | ")" | "," => {}
                "VariableName" => {
                    let name = b.cursor.text().to_string();
                    let ty = match class {
                        Some(class) if name == SELF_PARAM => Type::object(class),
                        _ => Type::None,
                    };
                    params.push(Param {
                        name,
                        ty,
                        span: b.cursor.span(),
                    });
                    annotated.push(false);
                }
                "TypeDef" => {
                    let ty = b.type_def()?;
                    match (params.last_mut(), annotated.last_mut()) {
                        (Some(param), Some(flag)) => {
                            param.ty = ty;
                            *flag = true;
                        }
                        _ => return Err(b.unexpected(CTX)),
                    }
                }
                _ => return Err(b.unexpected(CTX)),
            }
            Ok(())
        })?;

        // Every parameter except a method receiver must be annotated.
        for (param, annotated) in params.iter().zip(&annotated) {
            let is_receiver = class.is_some() && param.name == SELF_PARAM;
            if !annotated && !is_receiver {
                return Err(ParseError::MissingNode {
                    context: CTX,
                    expected: "parameter type annotation",
                    span: param.span,
                });
            }
        }
        Ok(params)
    }

    /// `: type` or `-> type`
    fn type_def(&mut self) -> Result<Type> {
        const CTX: &str = "type annotation";
        self.children(CTX, |b| {
            while matches!(b.cursor.kind(), ":" | "->") || is_trivia(b.cursor.kind()) {
                b.advance(CTX, "type name")?;
            }
            match b.cursor.kind() {
                "VariableName" | "None" => Ok(Type::from_annotation(b.cursor.text())),
                _ => Err(b.unexpected(CTX)),
            }
        })
    }

    /// `class Name[(object)]: fields and methods`
    fn class_def(&mut self) -> Result<ClassDef> {
        const CTX: &str = "class definition";
        let span = self.cursor.span();
        self.children(CTX, |b| {
            b.expect_kind("class", CTX)?;
            b.advance(CTX, "class name")?;
            b.expect_kind("VariableName", CTX)?;
            let name = b.cursor.text().to_string();

            b.advance(CTX, "body")?;
            if b.cursor.kind() == "ArgList" {
                b.base_classes()?;
                b.advance(CTX, "body")?;
            }
            b.expect_kind("Body", CTX)?;

            let mut class = ClassDef {
                name,
                fields: Vec::new(),
                methods: Vec::new(),
                span,
            };
            b.each_child(|b| {
                match b.cursor.kind() {
                    ":" | "PassStatement" => {}
                    "FunctionDefinition" => {
                        let method = b.func_def(Some(&class.name))?;
                        class.methods.push(method);
                    }
                    "AssignStatement" => {
                        let assignment = b.assignment()?;
                        match global_var_def(&assignment) {
                            Some(field) => class.fields.push(field),
                            None => {
                                return Err(ParseError::Unsupported {
                                    message: "class fields must be declared with a type and a literal value".to_string(),
                                    span: assignment.span,
                                });
                            }
                        }
                    }
                    _ => return Err(b.unexpected(CTX)),
                }
                Ok(())
            })?;
            Ok(class)
        })
    }

    /// Only the implicit `object` base is accepted; there is no inheritance.
    fn base_classes(&mut self) -> Result<()> {
        const CTX: &str = "base class list";
        self.each_child(|b| match b.cursor.kind() {
            "(" | ")" | "," => Ok(()),
            "VariableName" if b.cursor.text() == "object" => Ok(()),
            _ => Err(ParseError::Unsupported {
                message: format!("inheritance from '{}' is not supported", b.cursor.text()),
                span: b.cursor.span(),
            }),
        })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// The statements of a `Body` node.
    fn body(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        self.each_child(|b| {
            if b.cursor.kind() != ":" {
                stmts.push(b.stmt()?);
            }
            Ok(())
        })?;
        Ok(stmts)
    }

    fn stmt(&mut self) -> Result<Stmt> {
        let span = self.cursor.span();
        match self.cursor.kind() {
            "AssignStatement" => {
                let assignment = self.assignment()?;
                Ok(assignment_stmt(assignment))
            }
            "IfStatement" => self.if_stmt(),
            "WhileStatement" => {
                const CTX: &str = "while statement";
                self.children(CTX, |b| {
                    b.expect_kind("while", CTX)?;
                    b.advance(CTX, "condition")?;
                    let condition = b.expr()?;
                    b.advance(CTX, "body")?;
                    b.expect_kind("Body", CTX)?;
                    let body = b.body()?;
                    Ok(Stmt::While(WhileStmt {
                        condition,
                        body,
                        span,
                    }))
                })
            }
            "PassStatement" => Ok(Stmt::Pass(span)),
            "ReturnStatement" => {
                const CTX: &str = "return statement";
                self.children(CTX, |b| {
                    b.expect_kind("return", CTX)?;
                    let value = if b.try_advance() {
                        b.expr()?
                    } else {
                        Expr::new(ExprKind::Literal(Literal::None), span)
                    };
                    Ok(Stmt::Return(ReturnStmt { value, span }))
                })
            }
            "ExpressionStatement" => self.children("expression statement", |b| {
                let expr = b.expr()?;
                Ok(Stmt::Expr(expr))
            }),
            "FunctionDefinition" => Ok(Stmt::FuncDef(self.func_def(None)?)),
            "ClassDefinition" => Ok(Stmt::ClassDef(self.class_def()?)),
            _ => Err(self.unexpected("statement")),
        }
    }

    /// `target [: type] = value`
    fn assignment(&mut self) -> Result<Assignment> {
        const CTX: &str = "assignment";
        let span = self.cursor.span();
        self.children(CTX, |b| {
            let target = match b.cursor.kind() {
                "VariableName" => AssignTarget::Name(b.cursor.text().to_string()),
                "MemberExpression" => {
                    let (object, field) = b.member()?;
                    AssignTarget::Field { object, field }
                }
                _ => return Err(b.unexpected(CTX)),
            };

            b.advance(CTX, "value")?;
            let mut annotation = None;
            if b.cursor.kind() == "TypeDef" {
                annotation = Some(b.type_def()?);
                b.advance(CTX, "value")?;
            }
            if matches!(b.cursor.kind(), "AssignOp" | "=") {
                b.advance(CTX, "value")?;
            }
            let value = b.expr()?;
            if b.try_advance() {
                return Err(ParseError::Unsupported {
                    message: "chained assignment is not supported".to_string(),
                    span: b.cursor.span(),
                });
            }

            Ok(Assignment {
                target,
                annotation,
                value,
                span,
            })
        })
    }

    /// `if cond: body [elif cond: body] [else: body]`
    fn if_stmt(&mut self) -> Result<Stmt> {
        const CTX: &str = "if statement";
        let span = self.cursor.span();
        self.children(CTX, |b| {
            b.expect_kind("if", CTX)?;
            b.advance(CTX, "condition")?;
            let condition = b.expr()?;
            b.advance(CTX, "body")?;
            b.expect_kind("Body", CTX)?;
            let body = b.body()?;

            let mut stmt = IfStmt {
                condition,
                body,
                elif: None,
                else_body: None,
                span,
            };

            while b.try_advance() {
                match b.cursor.kind() {
                    "elif" => {
                        if stmt.elif.is_some() || stmt.else_body.is_some() {
                            return Err(ParseError::Unsupported {
                                message: "only one 'elif' arm is supported".to_string(),
                                span: b.cursor.span(),
                            });
                        }
                        b.advance(CTX, "elif condition")?;
                        let condition = b.expr()?;
                        b.advance(CTX, "elif body")?;
                        b.expect_kind("Body", CTX)?;
                        let body = b.body()?;
                        stmt.elif = Some(ElifArm { condition, body });
                    }
                    "else" => {
                        if stmt.else_body.is_some() {
                            return Err(b.unexpected(CTX));
                        }
                        b.advance(CTX, "else body")?;
                        b.expect_kind("Body", CTX)?;
                        stmt.else_body = Some(b.body()?);
                    }
                    _ => return Err(b.unexpected(CTX)),
                }
            }
            Ok(Stmt::If(stmt))
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expr(&mut self) -> Result<Expr> {
        let span = self.cursor.span();
        let kind = match self.cursor.kind() {
            "Number" => {
                let text = self.cursor.text();
                let value = text.parse::<i32>().map_err(|_| ParseError::InvalidNumber {
                    text: text.to_string(),
                    span,
                })?;
                ExprKind::Literal(Literal::Number(value))
            }
            "Boolean" => match self.cursor.text() {
                "True" => ExprKind::Literal(Literal::Bool(true)),
                "False" => ExprKind::Literal(Literal::Bool(false)),
                _ => return Err(self.unexpected("boolean literal")),
            },
            "None" => ExprKind::Literal(Literal::None),
            "VariableName" => ExprKind::Name(Name::from_ident(self.cursor.text())),
            "UnaryExpression" => self.unary()?,
            "BinaryExpression" => self.binary()?,
            "ParenthesizedExpression" => {
                const CTX: &str = "parenthesized expression";
                return self.children(CTX, |b| {
                    b.expect_kind("(", CTX)?;
                    b.advance(CTX, "expression")?;
                    b.expr()
                });
            }
            "CallExpression" => self.call()?,
            "MemberExpression" => {
                let (object, field) = self.member()?;
                ExprKind::Field {
                    object: Box::new(object),
                    field,
                }
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(Expr::new(kind, span))
    }

    fn unary(&mut self) -> Result<ExprKind> {
        const CTX: &str = "unary expression";
        self.children(CTX, |b| {
            let symbol = b.cursor.text();
            let op = UnaryOp::from_symbol(symbol).ok_or_else(|| ParseError::UnknownOperator {
                op: symbol.to_string(),
                span: b.cursor.span(),
            })?;
            b.advance(CTX, "operand")?;
            let operand = b.expr()?;
            Ok(ExprKind::Unary {
                op,
                operand: Box::new(operand),
            })
        })
    }

    fn binary(&mut self) -> Result<ExprKind> {
        const CTX: &str = "binary expression";
        self.children(CTX, |b| {
            let left = b.expr()?;
            b.advance(CTX, "operator")?;
            let op_span = b.cursor.span();
            let symbol = b.cursor.text().to_string();
            b.advance(CTX, "right operand")?;
            // Two-keyword operators (`is not`, `not in`) arrive as two leaves.
            if matches!(b.cursor.kind(), "not" | "in") {
                return Err(ParseError::Unsupported {
                    message: format!("operator '{symbol} {}' is not supported", b.cursor.text()),
                    span: op_span,
                });
            }
            let op = BinaryOp::from_symbol(&symbol).ok_or(ParseError::UnknownOperator {
                op: symbol,
                span: op_span,
            })?;
            let right = b.expr()?;
            Ok(ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })
        })
    }

    /// `callee(args…)`: free function, built-in, `print`, or method call.
    /// A call whose callee names a class is turned into a construction by
    /// the type checker, which knows the class table.
    fn call(&mut self) -> Result<ExprKind> {
        const CTX: &str = "call expression";
        let span = self.cursor.span();
        self.children(CTX, |b| match b.cursor.kind() {
            "VariableName" => {
                let name = b.cursor.text().to_string();
                b.advance(CTX, "argument list")?;
                let mut args = b.args()?;

                if name == "print" {
                    return Ok(ExprKind::Print { args });
                }
                if let Some(func) = Builtin1::from_name(&name) {
                    let [arg] = take_args::<1>(&name, &mut args, span)?;
                    return Ok(ExprKind::Builtin1 {
                        func,
                        arg: Box::new(arg),
                    });
                }
                if let Some(func) = Builtin2::from_name(&name) {
                    let [left, right] = take_args::<2>(&name, &mut args, span)?;
                    return Ok(ExprKind::Builtin2 {
                        func,
                        left: Box::new(left),
                        right: Box::new(right),
                    });
                }
                Ok(ExprKind::Call { name, args })
            }
            "MemberExpression" => {
                let (object, method) = b.member()?;
                b.advance(CTX, "argument list")?;
                let args = b.args()?;
                Ok(ExprKind::MethodCall {
                    object: Box::new(object),
                    method,
                    args,
                })
            }
            _ => Err(b.unexpected(CTX)),
        })
    }

    fn args(&mut self) -> Result<Vec<Expr>> {
        self.expect_kind("ArgList", "argument list")?;
        let mut args = Vec::new();
        self.each_child(|b| {
            if !matches!(b.cursor.kind(), "(" | ")" | ",") {
                args.push(b.expr()?);
            }
            Ok(())
        })?;
        Ok(args)
    }

    /// `object.name`
    fn member(&mut self) -> Result<(Expr, String)> {
        const CTX: &str = "member expression";
        self.children(CTX, |b| {
            let object = b.expr()?;
            b.advance(CTX, "'.'")?;
            b.expect_kind(".", CTX)?;
            b.advance(CTX, "property name")?;
            b.expect_kind("PropertyName", CTX)?;
            Ok((object, b.cursor.text().to_string()))
        })
    }
}

/// Kinds that carry no meaning for the AST.
fn is_trivia(kind: &str) -> bool {
    matches!(kind, "Comment" | "newline" | "indent" | "dedent" | ";")
}

/// Read an annotated assignment with a literal initializer as a declaration.
fn global_var_def(assignment: &Assignment) -> Option<VarDef> {
    let (AssignTarget::Name(name), Some(ty)) = (&assignment.target, &assignment.annotation) else {
        return None;
    };
    let value = literal_of(&assignment.value)?;
    Some(VarDef {
        name: name.clone(),
        ty: ty.clone(),
        value,
        span: assignment.span,
    })
}

/// The literal an initializer denotes, folding `-<number>` and `None`.
fn literal_of(expr: &Expr) -> Option<Literal> {
    match &expr.kind {
        ExprKind::Literal(lit) => Some(*lit),
        ExprKind::Name(Name::None) => Some(Literal::None),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match operand.kind {
            ExprKind::Literal(Literal::Number(n)) => n.checked_neg().map(Literal::Number),
            _ => None,
        },
        _ => None,
    }
}

fn assignment_stmt(assignment: Assignment) -> Stmt {
    match (assignment.target, assignment.annotation) {
        (AssignTarget::Name(name), Some(ty)) => Stmt::VarDef(LocalVarDef {
            name,
            ty,
            value: assignment.value,
            span: assignment.span,
        }),
        (target, _) => Stmt::Assign(AssignStmt {
            target,
            value: assignment.value,
            span: assignment.span,
        }),
    }
}

fn take_args<const N: usize>(name: &str, args: &mut Vec<Expr>, span: Span) -> Result<[Expr; N]> {
    let found = args.len();
    std::mem::take(args)
        .try_into()
        .map_err(|_| ParseError::Unsupported {
            message: format!("{name}() takes {N} argument(s), found {found}"),
            span,
        })
}
