//! Code generator.
//!
//! [`CodeGenerator::generate`] lowers a typed [`Program`] into a [`Module`].
//! Class layouts are computed once up front; every function body is then
//! lowered against the set of names that are local slots in it (parameters
//! and declared locals anywhere in the body). All other names are globals.
//!
//! Function emission order is fixed: built-in helpers, free functions,
//! methods (class by class, in declaration order), then the entry function.

mod expr;
mod stmt;

use rustc_hash::FxHashSet;
use snek_core::{CONSTRUCTOR, CodeGenError, Literal, SELF_PARAM, Type};
use snek_parser::ast::{FuncDef, Program, collect_var_defs};

use crate::helpers::HelperSet;
use crate::instr::Instr;
use crate::layout::ClassLayouts;
use crate::module::{
    ENTRY_FUNCTION, Function, Global, HEAP_POINTER, HOST_FUNCTIONS, Import, ImportKind, MEMORY,
    Module, SCRATCH_LOCAL, method_symbol,
};
use crate::options::CompileOptions;

type Result<T> = std::result::Result<T, CodeGenError>;

/// Names that are local slots in the body being lowered.
#[derive(Debug, Default)]
struct Slots {
    locals: FxHashSet<String>,
}

impl Slots {
    fn for_function(func: &FuncDef) -> Self {
        let mut locals: FxHashSet<String> = func.params.iter().map(|p| p.name.clone()).collect();
        locals.extend(func.declared_locals().iter().map(|d| d.name.clone()));
        Self { locals }
    }

    fn get(&self, name: &str) -> Instr {
        if self.locals.contains(name) {
            Instr::local_get(name)
        } else {
            Instr::global_get(name)
        }
    }

    fn set(&self, name: &str) -> Instr {
        if self.locals.contains(name) {
            Instr::local_set(name)
        } else {
            Instr::global_set(name)
        }
    }
}

/// Lowers one typed program.
pub struct CodeGenerator<'a> {
    options: &'a CompileOptions,
    layouts: ClassLayouts,
    helpers: HelperSet,
}

impl<'a> CodeGenerator<'a> {
    /// Generate the module for a checked program.
    #[tracing::instrument(skip_all)]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate(program: &Program, options: &'a CompileOptions) -> Result<Module> {
        let mut generator = CodeGenerator {
            options,
            layouts: ClassLayouts::new(&program.class_defs),
            helpers: HelperSet::default(),
        };

        let mut functions = Vec::new();
        for func in &program.func_defs {
            functions.push(generator.function(func, None)?);
        }
        for class in &program.class_defs {
            for method in &class.methods {
                functions.push(generator.function(method, Some(class.name.as_str()))?);
            }
        }
        let entry = generator.entry(program)?;

        let mut all = generator.helpers.functions();
        all.append(&mut functions);
        all.push(entry);

        let module = Module {
            imports: generator.imports(),
            globals: generator.globals(program),
            functions: all,
        };
        tracing::debug!(
            functions = module.functions.len(),
            globals = module.globals.len(),
            classes = generator.layouts.len(),
            "module emitted"
        );
        Ok(module)
    }

    fn imports(&self) -> Vec<Import> {
        let module = &self.options.import_module;
        let mut imports = vec![Import {
            module: module.clone(),
            name: MEMORY.to_string(),
            kind: ImportKind::Memory {
                pages: self.options.memory_pages,
            },
        }];
        for name in HOST_FUNCTIONS {
            imports.push(Import {
                module: module.clone(),
                name: name.to_string(),
                kind: ImportKind::Func,
            });
        }
        imports
    }

    /// The heap pointer, then one global per top-level variable.
    fn globals(&self, program: &Program) -> Vec<Global> {
        let initial = |ty: &Type| {
            if ty.is_object() {
                self.options.object_sentinel
            } else {
                0
            }
        };

        let mut globals = vec![Global::new(HEAP_POINTER, self.options.heap_base)];
        for def in &program.var_defs {
            globals.push(Global::new(&def.name, initial(&def.ty)));
        }
        let mut late = Vec::new();
        collect_var_defs(&program.stmts, &mut late);
        for def in late {
            globals.push(Global::new(&def.name, initial(&def.ty)));
        }
        globals
    }

    /// A free function (`class` is `None`) or a method.
    fn function(&mut self, func: &FuncDef, class: Option<&str>) -> Result<Function> {
        let slots = Slots::for_function(func);
        let mut body = self.block(&func.body, &slots)?;
        if class.is_some() && func.name == CONSTRUCTOR {
            body.push(Instr::local_get(SELF_PARAM));
            body.push(Instr::Return);
        }
        body.push(Instr::Const(0));

        let name = match class {
            Some(class) => method_symbol(class, &func.name),
            None => func.name.clone(),
        };
        let mut locals = vec![SCRATCH_LOCAL.to_string()];
        locals.extend(func.declared_locals().iter().map(|d| d.name.clone()));

        tracing::trace!(function = %name, locals = locals.len(), "lowered function");
        Ok(Function {
            name,
            export: None,
            params: func.params.iter().map(|p| p.name.clone()).collect(),
            result: true,
            locals,
            body,
        })
    }

    /// Global initializers followed by the top-level statements.
    fn entry(&mut self, program: &Program) -> Result<Function> {
        let slots = Slots::default();
        let mut body = Vec::new();
        for def in &program.var_defs {
            if def.value != Literal::None {
                body.push(Instr::Const(def.value.as_word()));
                body.push(Instr::global_set(&def.name));
            }
        }
        body.extend(self.block(&program.stmts, &slots)?);

        let result = program.ends_with_expr();
        if result {
            body.push(Instr::local_get(SCRATCH_LOCAL));
        }
        Ok(Function {
            name: ENTRY_FUNCTION.to_string(),
            export: Some(self.options.entry_export.clone()),
            params: Vec::new(),
            result,
            locals: vec![SCRATCH_LOCAL.to_string()],
            body,
        })
    }
}
