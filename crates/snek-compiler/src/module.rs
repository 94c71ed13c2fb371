//! The emitted module.
//!
//! A [`Module`] is the structured form of the WebAssembly text the compiler
//! produces; its `Display` impl renders that text. Rendering is a pure
//! function of the module, so equal programs give byte-identical output.

use std::fmt;

use crate::instr::{Indent, Instr, write_body};

/// Mutable global holding the next free heap address.
pub const HEAP_POINTER: &str = "rt.heap";
/// Local that receives the value of bare expression statements.
pub const SCRATCH_LOCAL: &str = "rt.scratch";
/// Internal name of the entry function.
pub const ENTRY_FUNCTION: &str = "rt.start";

/// Host imports, by their field name.
pub const MEMORY: &str = "mem";
pub const PRINT_NUM: &str = "print_num";
pub const PRINT_BOOL: &str = "print_bool";
pub const PRINT_NONE: &str = "print_none";
pub const NOT_OPERATOR: &str = "not_operator";
/// Function imports, in the order they are declared.
pub const HOST_FUNCTIONS: [&str; 4] = [PRINT_NUM, PRINT_BOOL, PRINT_NONE, NOT_OPERATOR];

/// Name of the function generated for `class.method`.
pub fn method_symbol(class: &str, method: &str) -> String {
    format!("{method}_{class}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// Linear memory of the given size in pages
    Memory { pages: u32 },
    /// `(param i32) (result i32)` host function
    Func,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub kind: ImportKind,
}

/// A mutable `i32` global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub name: String,
    pub init: i32,
}

impl Global {
    pub fn new(name: &str, init: i32) -> Self {
        Self {
            name: name.to_string(),
            init,
        }
    }
}

/// A function. Parameters and locals are all `i32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub export: Option<String>,
    pub params: Vec<String>,
    /// Whether the function leaves an `i32` result
    pub result: bool,
    pub locals: Vec<String>,
    pub body: Vec<Instr>,
}

impl Function {
    /// Whether `name` is a parameter or local of this function.
    pub fn has_slot(&self, name: &str) -> bool {
        self.params.iter().chain(&self.locals).any(|slot| slot == name)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(func ${}", self.name)?;
        if let Some(export) = &self.export {
            write!(f, " (export \"{export}\")")?;
        }
        for param in &self.params {
            write!(f, " (param ${param} i32)")?;
        }
        if self.result {
            f.write_str(" (result i32)")?;
        }
        f.write_str("\n")?;
        for local in &self.locals {
            writeln!(f, "{}(local ${local} i32)", Indent(1))?;
        }
        write_body(f, &self.body, 1)?;
        f.write_str(")")
    }
}

/// A complete module: imports, globals and functions, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    pub imports: Vec<Import>,
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// The function exported as `name`.
    pub fn export(&self, name: &str) -> Option<&Function> {
        self.functions
            .iter()
            .find(|f| f.export.as_deref() == Some(name))
    }

    pub fn global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Pages requested by the memory import, if there is one.
    pub fn memory_pages(&self) -> Option<u32> {
        self.imports.iter().find_map(|import| match import.kind {
            ImportKind::Memory { pages } => Some(pages),
            ImportKind::Func => None,
        })
    }

    /// Whether the module imports a host function with this field name.
    pub fn imports_func(&self, name: &str) -> bool {
        self.imports
            .iter()
            .any(|i| i.kind == ImportKind::Func && i.name == name)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(module\n")?;
        let pad = Indent(1);
        for import in &self.imports {
            match import.kind {
                ImportKind::Memory { pages } => writeln!(
                    f,
                    "{pad}(import \"{}\" \"{}\" (memory {pages}))",
                    import.module, import.name
                )?,
                ImportKind::Func => writeln!(
                    f,
                    "{pad}(func ${} (import \"{}\" \"{}\") (param i32) (result i32))",
                    import.name, import.module, import.name
                )?,
            }
        }
        for global in &self.globals {
            writeln!(
                f,
                "{pad}(global ${} (mut i32) (i32.const {}))",
                global.name, global.init
            )?;
        }
        for function in &self.functions {
            let text = function.to_string();
            for line in text.lines() {
                writeln!(f, "{pad}{line}")?;
            }
        }
        f.write_str(")\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Module {
        Module {
            imports: vec![
                Import {
                    module: "imports".to_string(),
                    name: MEMORY.to_string(),
                    kind: ImportKind::Memory { pages: 1 },
                },
                Import {
                    module: "imports".to_string(),
                    name: PRINT_NUM.to_string(),
                    kind: ImportKind::Func,
                },
            ],
            globals: vec![Global::new(HEAP_POINTER, 4)],
            functions: vec![Function {
                name: ENTRY_FUNCTION.to_string(),
                export: Some("_start".to_string()),
                params: vec![],
                result: false,
                locals: vec![SCRATCH_LOCAL.to_string()],
                body: vec![Instr::Const(7), Instr::call(PRINT_NUM), Instr::local_set(SCRATCH_LOCAL)],
            }],
        }
    }

    #[test]
    fn renders_module_text() {
        let expected = "\
(module
  (import \"imports\" \"mem\" (memory 1))
  (func $print_num (import \"imports\" \"print_num\") (param i32) (result i32))
  (global $rt.heap (mut i32) (i32.const 4))
  (func $rt.start (export \"_start\")
    (local $rt.scratch i32)
    (i32.const 7)
    (call $print_num)
    (local.set $rt.scratch)
  )
)
";
        assert_eq!(sample().to_string(), expected);
    }

    #[test]
    fn lookups() {
        let module = sample();
        assert!(module.export("_start").is_some());
        assert!(module.export("main").is_none());
        assert_eq!(module.memory_pages(), Some(1));
        assert!(module.imports_func(PRINT_NUM));
        assert!(!module.imports_func(MEMORY));
        assert_eq!(module.global(HEAP_POINTER).map(|g| g.init), Some(4));
        let entry = module.function(ENTRY_FUNCTION).unwrap();
        assert!(entry.has_slot(SCRATCH_LOCAL));
    }

    #[test]
    fn method_symbols_put_the_method_first() {
        assert_eq!(method_symbol("Counter", "inc"), "inc_Counter");
        assert_eq!(method_symbol("Counter", "__init__"), "__init___Counter");
    }
}
