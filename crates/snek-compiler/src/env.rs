//! Type environments used by the checker.
//!
//! - [`GlobalEnv`]: top-level variables and free-function signatures
//! - [`ClassEnv`]: fields and method signatures per class
//! - [`LocalEnv`]: the flat name→type map of one function body
//!
//! All three are rebuilt for every compilation.

use rustc_hash::FxHashMap;
use snek_core::{CONSTRUCTOR, DefinitionKind, Literal, Span, Type, TypeError};

type Result<T> = std::result::Result<T, TypeError>;

// ============================================================================
// Signatures
// ============================================================================

/// Parameter and return types of a function or method.
///
/// For methods, `params[0]` is the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncSig {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl FuncSig {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self { params, ret }
    }
}

// ============================================================================
// GlobalEnv
// ============================================================================

#[derive(Debug, Default)]
pub struct GlobalEnv {
    vars: FxHashMap<String, Type>,
    funcs: FxHashMap<String, FuncSig>,
}

impl GlobalEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a top-level variable. Redeclaration fails regardless of type.
    pub fn declare_var(&mut self, name: &str, ty: Type, span: Span) -> Result<()> {
        if self.vars.contains_key(name) {
            return Err(TypeError::DuplicateDefinition {
                kind: DefinitionKind::GlobalVariable,
                name: name.to_string(),
                span,
            });
        }
        self.vars.insert(name.to_string(), ty);
        Ok(())
    }

    pub fn declare_func(&mut self, name: &str, sig: FuncSig, span: Span) -> Result<()> {
        if self.funcs.contains_key(name) {
            return Err(TypeError::DuplicateDefinition {
                kind: DefinitionKind::Function,
                name: name.to_string(),
                span,
            });
        }
        self.funcs.insert(name.to_string(), sig);
        Ok(())
    }

    pub fn var(&self, name: &str) -> Option<&Type> {
        self.vars.get(name)
    }

    pub fn func(&self, name: &str) -> Option<&FuncSig> {
        self.funcs.get(name)
    }
}

// ============================================================================
// ClassEnv
// ============================================================================

/// A field as recorded in the class environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: Type,
    pub default: Literal,
}

/// Fields and methods of one class, both in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<(String, FuncSig)>,
}

impl ClassInfo {
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&FuncSig> {
        self.methods
            .iter()
            .find(|(method, _)| method == name)
            .map(|(_, sig)| sig)
    }

    /// The `__init__` signature, if the class defines one.
    pub fn constructor(&self) -> Option<&FuncSig> {
        self.method(CONSTRUCTOR)
    }
}

#[derive(Debug, Default)]
pub struct ClassEnv {
    classes: FxHashMap<String, ClassInfo>,
}

impl ClassEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class name with no members yet.
    pub fn declare_class(&mut self, name: &str, span: Span) -> Result<()> {
        if self.classes.contains_key(name) {
            return Err(TypeError::DuplicateDefinition {
                kind: DefinitionKind::Class,
                name: name.to_string(),
                span,
            });
        }
        self.classes.insert(name.to_string(), ClassInfo::default());
        Ok(())
    }

    pub fn add_field(&mut self, class: &str, field: FieldInfo, span: Span) -> Result<()> {
        let info = self.class_mut(class, span)?;
        if info.field(&field.name).is_some() {
            return Err(TypeError::DuplicateDefinition {
                kind: DefinitionKind::Field,
                name: field.name,
                span,
            });
        }
        info.fields.push(field);
        Ok(())
    }

    pub fn add_method(&mut self, class: &str, name: &str, sig: FuncSig, span: Span) -> Result<()> {
        let info = self.class_mut(class, span)?;
        if info.method(name).is_some() {
            return Err(TypeError::DuplicateDefinition {
                kind: DefinitionKind::Method,
                name: name.to_string(),
                span,
            });
        }
        info.methods.push((name.to_string(), sig));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    /// Look up a class, failing with `UnknownClass`.
    pub fn class(&self, name: &str, span: Span) -> Result<&ClassInfo> {
        self.classes.get(name).ok_or_else(|| TypeError::UnknownClass {
            name: name.to_string(),
            span,
        })
    }

    fn class_mut(&mut self, name: &str, span: Span) -> Result<&mut ClassInfo> {
        self.classes
            .get_mut(name)
            .ok_or_else(|| TypeError::UnknownClass {
                name: name.to_string(),
                span,
            })
    }

    /// Check that every class named by `ty` is registered.
    pub fn validate(&self, ty: &Type, span: Span) -> Result<()> {
        match ty {
            Type::Object(class) if !self.contains(class) => Err(TypeError::UnknownClass {
                name: class.clone(),
                span,
            }),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// LocalEnv
// ============================================================================

/// Parameters and locals of the body being checked.
///
/// Scoping is flat: a declaration anywhere in the body is visible for the rest
/// of the body, including after the block it appeared in.
#[derive(Debug, Default)]
pub struct LocalEnv {
    vars: FxHashMap<String, Type>,
}

impl LocalEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, ty: Type, span: Span) -> Result<()> {
        if self.vars.contains_key(name) {
            return Err(TypeError::DuplicateDefinition {
                kind: DefinitionKind::Local,
                name: name.to_string(),
                span,
            });
        }
        self.vars.insert(name.to_string(), ty);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.vars.get(name)
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
