//! Type checker.
//!
//! [`TypeChecker::check`] consumes an untyped [`Program`] and returns the same
//! tree with every expression's type filled in. Checking runs in a fixed
//! order:
//!
//! 1. Register classes: names first, then fields and method signatures, so
//!    classes may refer to each other in any order
//! 2. Register free-function signatures
//!
//! Registration also claims the function name each definition is emitted
//! under, so no two definitions (and no definition and host import) share one.
//! 3. Check top-level variable declarations
//! 4. Check function bodies, then method bodies
//! 5. Check the top-level statements
//!
//! The first violation aborts checking.

mod expr;
mod stmt;

use rustc_hash::FxHashSet;
use snek_core::{CONSTRUCTOR, SELF_PARAM, Span, Type, TypeError};
use snek_parser::ast::{ClassDef, FuncDef, Program, Stmt, VarDef};

use crate::env::{ClassEnv, FieldInfo, FuncSig, GlobalEnv, LocalEnv};
use crate::module::{HOST_FUNCTIONS, method_symbol};

type Result<T> = std::result::Result<T, TypeError>;

/// The function or method whose body is being checked.
#[derive(Debug)]
struct FunctionScope {
    name: String,
    /// Owning class, for methods
    class: Option<String>,
    ret: Type,
    /// Set by any `return` in the body, whatever branch it sits in
    has_returned: bool,
}

/// Validates a program and annotates it with types.
#[derive(Debug, Default)]
pub struct TypeChecker {
    globals: GlobalEnv,
    classes: ClassEnv,
    locals: LocalEnv,
    function: Option<FunctionScope>,
    /// Function names taken in the emitted module
    symbols: FxHashSet<String>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            symbols: HOST_FUNCTIONS.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Check `program` and return it with types filled in.
    ///
    /// `Program::ty` is set to the type of the last top-level statement when
    /// it is a bare expression, and to `None` otherwise.
    #[tracing::instrument(skip_all)]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check(mut program: Program) -> Result<Program> {
        let mut checker = Self::new();

        checker.register_classes(&program.class_defs)?;
        checker.register_functions(&program.func_defs)?;
        checker.check_globals(&program.var_defs)?;

        for func in &mut program.func_defs {
            checker.check_function(func, None)?;
        }
        for ClassDef { name, methods, .. } in &mut program.class_defs {
            for method in methods.iter_mut() {
                checker.check_function(method, Some(name.as_str()))?;
            }
        }

        checker.locals.clear();
        for stmt in &mut program.stmts {
            checker.check_stmt(stmt)?;
        }

        program.ty = Some(match program.stmts.last() {
            Some(Stmt::Expr(expr)) => expr.ty.clone().unwrap_or(Type::None),
            _ => Type::None,
        });

        tracing::debug!(
            functions = program.func_defs.len(),
            classes = program.class_defs.len(),
            ty = ?program.ty,
            "program checked"
        );
        Ok(program)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    fn register_classes(&mut self, classes: &[ClassDef]) -> Result<()> {
        for class in classes {
            self.classes.declare_class(&class.name, class.span)?;
        }

        for class in classes {
            for field in &class.fields {
                self.classes.validate(&field.ty, field.span)?;
                check_literal(field, &format!("field '{}'", field.name))?;
                let info = FieldInfo {
                    name: field.name.clone(),
                    ty: field.ty.clone(),
                    default: field.value,
                };
                self.classes.add_field(&class.name, info, field.span)?;
            }

            for method in &class.methods {
                let sig = self.method_signature(&class.name, method)?;
                self.classes
                    .add_method(&class.name, &method.name, sig, method.span)?;
                let symbol = method_symbol(&class.name, &method.name);
                self.claim_symbol(&method.name, symbol, method.span)?;
            }

            tracing::trace!(
                class = %class.name,
                fields = class.fields.len(),
                methods = class.methods.len(),
                "registered class"
            );
        }

        tracing::debug!(count = classes.len(), "classes registered");
        Ok(())
    }

    /// Receiver type followed by the declared parameter types after `self`.
    ///
    /// The receiver is bound to the first parameter, so that parameter must be
    /// `self`.
    fn method_signature(&self, class: &str, method: &FuncDef) -> Result<FuncSig> {
        if method.params.first().is_none_or(|p| p.name != SELF_PARAM) {
            return Err(TypeError::MissingSelf {
                class: class.to_string(),
                method: method.name.clone(),
                span: method.span,
            });
        }

        let this = Type::object(class);
        if method.name == CONSTRUCTOR && method.ret != this {
            return Err(TypeError::InvalidConstructor {
                class: class.to_string(),
                actual: method.ret.clone(),
                span: method.span,
            });
        }

        let mut params = vec![this];
        for param in method.params.iter().skip(1) {
            self.classes.validate(&param.ty, param.span)?;
            params.push(param.ty.clone());
        }
        self.classes.validate(&method.ret, method.span)?;
        Ok(FuncSig::new(params, method.ret.clone()))
    }

    fn register_functions(&mut self, funcs: &[FuncDef]) -> Result<()> {
        for func in funcs {
            for param in &func.params {
                self.classes.validate(&param.ty, param.span)?;
            }
            self.classes.validate(&func.ret, func.span)?;
            let params = func.params.iter().map(|p| p.ty.clone()).collect();
            self.globals
                .declare_func(&func.name, FuncSig::new(params, func.ret.clone()), func.span)?;
            self.claim_symbol(&func.name, func.name.clone(), func.span)?;
        }
        Ok(())
    }

    /// Reserve the emitted function name `symbol` for the definition `name`.
    fn claim_symbol(&mut self, name: &str, symbol: String, span: Span) -> Result<()> {
        if self.symbols.contains(&symbol) {
            return Err(TypeError::SymbolCollision {
                name: name.to_string(),
                symbol,
                span,
            });
        }
        self.symbols.insert(symbol);
        Ok(())
    }

    fn check_globals(&mut self, defs: &[VarDef]) -> Result<()> {
        for def in defs {
            self.classes.validate(&def.ty, def.span)?;
            check_literal(def, &format!("declaration of '{}'", def.name))?;
            self.globals.declare_var(&def.name, def.ty.clone(), def.span)?;
        }
        Ok(())
    }

    // ========================================================================
    // Bodies
    // ========================================================================

    /// Check one function or method body against a fresh local environment.
    fn check_function(&mut self, func: &mut FuncDef, class: Option<&str>) -> Result<()> {
        self.locals.clear();
        for param in &func.params {
            let ty = match class {
                Some(class) if param.name == SELF_PARAM => Type::object(class),
                _ => param.ty.clone(),
            };
            self.locals.declare(&param.name, ty, param.span)?;
        }

        self.function = Some(FunctionScope {
            name: func.name.clone(),
            class: class.map(str::to_string),
            ret: func.ret.clone(),
            has_returned: false,
        });
        let result = func.body.iter_mut().try_for_each(|stmt| self.check_stmt(stmt));
        let scope = self.function.take();
        result?;

        let is_constructor = class.is_some() && func.name == CONSTRUCTOR;
        let has_returned = scope.is_some_and(|s| s.has_returned);
        if func.ret != Type::None && !is_constructor && !has_returned {
            return Err(TypeError::MissingReturn {
                function: func.name.clone(),
                expected: func.ret.clone(),
                span: func.span,
            });
        }

        tracing::trace!(
            function = %func.name,
            class = class.unwrap_or("-"),
            locals = self.locals.len(),
            "checked body"
        );
        Ok(())
    }

    /// Type of a name in scope: locals first, then globals.
    fn lookup(&self, name: &str, span: Span) -> Result<Type> {
        self.locals
            .get(name)
            .or_else(|| self.globals.var(name))
            .cloned()
            .ok_or_else(|| TypeError::UndefinedName {
                name: name.to_string(),
                span,
            })
    }
}

/// A declaration's literal must be accepted by its declared type.
fn check_literal(def: &VarDef, context: &str) -> Result<()> {
    let actual = def.value.ty();
    if def.ty.accepts(&actual) {
        Ok(())
    } else {
        Err(TypeError::Mismatch {
            context: context.to_string(),
            expected: def.ty.clone(),
            actual,
            span: def.span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snek_core::{BinaryOp, DefinitionKind, Literal};
    use snek_parser::ast::{Expr, ExprKind, IfStmt, Param};

    fn counter_class() -> ClassDef {
        ClassDef::new(
            "Counter",
            vec![VarDef::new("value", Type::Int, Literal::Number(0))],
            vec![FuncDef::new(
                "inc",
                vec![Param::new("self", Type::object("Counter"))],
                Type::Int,
                vec![
                    Stmt::assign_field(
                        Expr::name("self"),
                        "value",
                        Expr::binary(
                            BinaryOp::Add,
                            Expr::field(Expr::name("self"), "value"),
                            Expr::number(1),
                        ),
                    ),
                    Stmt::ret(Expr::field(Expr::name("self"), "value")),
                ],
            )],
        )
    }

    #[test]
    fn program_type_is_last_expression() {
        let program = Program::new()
            .with_var(VarDef::new("x", Type::Int, Literal::Number(5)))
            .with_stmt(Stmt::assign(
                "x",
                Expr::binary(BinaryOp::Add, Expr::name("x"), Expr::number(3)),
            ))
            .with_stmt(Stmt::expr(Expr::print(Expr::name("x"))));
        let typed = TypeChecker::check(program).unwrap();
        assert_eq!(typed.ty, Some(Type::Int));
        let Stmt::Assign(assign) = &typed.stmts[0] else {
            panic!("expected assignment");
        };
        assert_eq!(assign.value.ty(), Some(&Type::Int));
    }

    #[test]
    fn program_type_defaults_to_none() {
        let program = Program::new()
            .with_var(VarDef::new("x", Type::Int, Literal::Number(5)))
            .with_stmt(Stmt::assign("x", Expr::number(1)));
        assert_eq!(TypeChecker::check(program).unwrap().ty, Some(Type::None));
        assert_eq!(
            TypeChecker::check(Program::new()).unwrap().ty,
            Some(Type::None)
        );
    }

    #[test]
    fn methods_see_fields_and_receiver() {
        let program = Program::new()
            .with_class(counter_class())
            .with_var(VarDef::new("c", Type::object("Counter"), Literal::None))
            .with_stmt(Stmt::assign("c", Expr::call("Counter", vec![])))
            .with_stmt(Stmt::expr(Expr::method_call(Expr::name("c"), "inc", vec![])));
        let typed = TypeChecker::check(program).unwrap();
        assert_eq!(typed.ty, Some(Type::Int));

        // The call naming a class became a construction.
        let Stmt::Assign(assign) = &typed.stmts[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(&assign.value.kind, ExprKind::Construct { class } if class == "Counter"));
        assert_eq!(assign.value.ty(), Some(&Type::object("Counter")));
    }

    #[test]
    fn global_redeclaration_fails() {
        let program = Program::new()
            .with_var(VarDef::new("x", Type::Int, Literal::Number(1)))
            .with_var(VarDef::new("x", Type::Bool, Literal::Bool(true)));
        let err = TypeChecker::check(program).unwrap_err();
        assert!(matches!(
            err,
            TypeError::DuplicateDefinition {
                kind: DefinitionKind::GlobalVariable,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_function_and_class() {
        let f = FuncDef::new("f", vec![], Type::None, vec![]);
        let program = Program::new().with_func(f.clone()).with_func(f);
        assert!(matches!(
            TypeChecker::check(program).unwrap_err(),
            TypeError::DuplicateDefinition {
                kind: DefinitionKind::Function,
                ..
            }
        ));

        let program = Program::new()
            .with_class(ClassDef::new("A", vec![], vec![]))
            .with_class(ClassDef::new("A", vec![], vec![]));
        assert!(matches!(
            TypeChecker::check(program).unwrap_err(),
            TypeError::DuplicateDefinition {
                kind: DefinitionKind::Class,
                ..
            }
        ));
    }

    #[test]
    fn local_shadowing_a_parameter_fails() {
        let f = FuncDef::new(
            "f",
            vec![Param::new("a", Type::Int)],
            Type::None,
            vec![Stmt::var_def("a", Type::Int, Expr::number(1))],
        );
        assert!(matches!(
            TypeChecker::check(Program::new().with_func(f)).unwrap_err(),
            TypeError::DuplicateDefinition {
                kind: DefinitionKind::Local,
                ..
            }
        ));
    }

    #[test]
    fn field_default_must_match_declared_type() {
        let class = ClassDef::new(
            "A",
            vec![VarDef::new("flag", Type::Bool, Literal::Number(1))],
            vec![],
        );
        assert!(matches!(
            TypeChecker::check(Program::new().with_class(class)).unwrap_err(),
            TypeError::Mismatch { .. }
        ));
    }

    #[test]
    fn object_field_may_default_to_none() {
        let class = ClassDef::new(
            "Node",
            vec![VarDef::new("next", Type::object("Node"), Literal::None)],
            vec![],
        );
        assert!(TypeChecker::check(Program::new().with_class(class)).is_ok());
    }

    #[test]
    fn method_without_self_fails() {
        let class = ClassDef::new(
            "A",
            vec![],
            vec![FuncDef::new("m", vec![], Type::None, vec![])],
        );
        assert!(matches!(
            TypeChecker::check(Program::new().with_class(class)).unwrap_err(),
            TypeError::MissingSelf { .. }
        ));
    }

    #[test]
    fn self_must_be_the_first_parameter() {
        let class = ClassDef::new(
            "C",
            vec![VarDef::new("v", Type::Int, Literal::Number(7))],
            vec![FuncDef::new(
                "get",
                vec![
                    Param::new("n", Type::Int),
                    Param::new("self", Type::object("C")),
                ],
                Type::Int,
                vec![Stmt::ret(Expr::field(Expr::name("self"), "v"))],
            )],
        );
        let err = TypeChecker::check(Program::new().with_class(class)).unwrap_err();
        assert!(matches!(
            err,
            TypeError::MissingSelf { ref class, ref method, .. } if class == "C" && method == "get"
        ));
    }

    #[test]
    fn free_function_may_not_shadow_a_host_import() {
        for name in HOST_FUNCTIONS {
            let f = FuncDef::new(
                name,
                vec![Param::new("n", Type::Int)],
                Type::Int,
                vec![Stmt::ret(Expr::name("n"))],
            );
            let err = TypeChecker::check(Program::new().with_func(f)).unwrap_err();
            assert!(matches!(
                err,
                TypeError::SymbolCollision { ref symbol, .. } if symbol == name
            ));
        }
    }

    #[test]
    fn method_symbol_may_not_shadow_a_host_import() {
        // `num.print` is emitted as `print_num`.
        let class = ClassDef::new(
            "num",
            vec![],
            vec![FuncDef::new(
                "print",
                vec![Param::new("self", Type::object("num"))],
                Type::None,
                vec![],
            )],
        );
        assert!(matches!(
            TypeChecker::check(Program::new().with_class(class)).unwrap_err(),
            TypeError::SymbolCollision { ref symbol, .. } if symbol == "print_num"
        ));
    }

    #[test]
    fn free_function_may_not_shadow_a_method() {
        let inc_counter = FuncDef::new("inc_Counter", vec![], Type::None, vec![]);
        let program = Program::new()
            .with_class(counter_class())
            .with_func(inc_counter);
        let err = TypeChecker::check(program).unwrap_err();
        assert!(matches!(
            err,
            TypeError::SymbolCollision { ref name, ref symbol, .. }
                if name == "inc_Counter" && symbol == "inc_Counter"
        ));
    }

    #[test]
    fn methods_of_different_classes_may_not_share_a_symbol() {
        // `a` on `B_C` and `a_B` on `C` are both emitted as `a_B_C`.
        let method = |name: &str, class: &str| {
            FuncDef::new(
                name,
                vec![Param::new("self", Type::object(class))],
                Type::None,
                vec![],
            )
        };
        let program = Program::new()
            .with_class(ClassDef::new("B_C", vec![], vec![method("a", "B_C")]))
            .with_class(ClassDef::new("C", vec![], vec![method("a_B", "C")]));
        assert!(matches!(
            TypeChecker::check(program).unwrap_err(),
            TypeError::SymbolCollision { ref symbol, .. } if symbol == "a_B_C"
        ));
    }

    #[test]
    fn same_method_name_in_two_classes_is_fine() {
        let method = |class: &str| {
            FuncDef::new(
                "get",
                vec![Param::new("self", Type::object(class))],
                Type::None,
                vec![],
            )
        };
        let program = Program::new()
            .with_class(ClassDef::new("A", vec![], vec![method("A")]))
            .with_class(ClassDef::new("B", vec![], vec![method("B")]));
        assert!(TypeChecker::check(program).is_ok());
    }

    #[test]
    fn constructor_must_return_its_class() {
        let class = ClassDef::new(
            "A",
            vec![],
            vec![FuncDef::new(
                CONSTRUCTOR,
                vec![Param::new("self", Type::object("A"))],
                Type::None,
                vec![],
            )],
        );
        assert!(matches!(
            TypeChecker::check(Program::new().with_class(class)).unwrap_err(),
            TypeError::InvalidConstructor { .. }
        ));
    }

    #[test]
    fn constructor_is_exempt_from_return_check() {
        let class = ClassDef::new(
            "A",
            vec![],
            vec![FuncDef::new(
                CONSTRUCTOR,
                vec![Param::new("self", Type::object("A"))],
                Type::object("A"),
                vec![Stmt::Pass(Span::default())],
            )],
        );
        assert!(TypeChecker::check(Program::new().with_class(class)).is_ok());
    }

    #[test]
    fn missing_return_is_reported() {
        let f = FuncDef::new("f", vec![], Type::Int, vec![Stmt::Pass(Span::default())]);
        assert!(matches!(
            TypeChecker::check(Program::new().with_func(f)).unwrap_err(),
            TypeError::MissingReturn { .. }
        ));
    }

    #[test]
    fn return_in_one_branch_satisfies_return_check() {
        let f = FuncDef::new(
            "f",
            vec![Param::new("a", Type::Int)],
            Type::Int,
            vec![Stmt::If(IfStmt::new(
                Expr::binary(BinaryOp::Less, Expr::name("a"), Expr::number(0)),
                vec![Stmt::ret(Expr::number(0))],
            ))],
        );
        assert!(TypeChecker::check(Program::new().with_func(f)).is_ok());
    }

    #[test]
    fn unknown_class_in_declaration() {
        let program = Program::new().with_var(VarDef::new("p", Type::object("Ghost"), Literal::None));
        assert!(matches!(
            TypeChecker::check(program).unwrap_err(),
            TypeError::UnknownClass { .. }
        ));
    }

    #[test]
    fn forward_references_between_classes() {
        let a = ClassDef::new(
            "A",
            vec![VarDef::new("b", Type::object("B"), Literal::None)],
            vec![],
        );
        let b = ClassDef::new("B", vec![], vec![]);
        let program = Program::new().with_class(a).with_class(b);
        assert!(TypeChecker::check(program).is_ok());
    }

    #[test]
    fn locals_do_not_leak_between_functions() {
        let f = FuncDef::new(
            "f",
            vec![],
            Type::None,
            vec![Stmt::var_def("t", Type::Int, Expr::number(1))],
        );
        let g = FuncDef::new(
            "g",
            vec![],
            Type::None,
            vec![Stmt::assign("t", Expr::number(2))],
        );
        let program = Program::new().with_func(f).with_func(g);
        assert!(matches!(
            TypeChecker::check(program).unwrap_err(),
            TypeError::UndefinedName { ref name, .. } if name == "t"
        ));
    }
}
