//! Object layout.
//!
//! Instances live in linear memory as a run of word-sized fields. Field `i`
//! (in declaration order) sits at byte offset `i * WORD_SIZE` from the object
//! address; there is no header.

use rustc_hash::FxHashMap;
use snek_core::{CONSTRUCTOR, CodeGenError, Literal, Span, WORD_SIZE};
use snek_parser::ast::ClassDef;

/// One field slot of a class layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub name: String,
    /// Word index within the object
    pub index: u32,
    pub default: Literal,
}

impl FieldSlot {
    /// Byte offset from the object address.
    pub fn offset(&self) -> u32 {
        self.index * WORD_SIZE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLayout {
    pub name: String,
    pub fields: Vec<FieldSlot>,
    /// Whether the class defines `__init__`
    pub has_constructor: bool,
}

impl ClassLayout {
    pub fn from_class(class: &ClassDef) -> Self {
        let fields = class
            .fields
            .iter()
            .zip(0..)
            .map(|(field, index)| FieldSlot {
                name: field.name.clone(),
                index,
                default: field.value,
            })
            .collect();
        Self {
            name: class.name.clone(),
            fields,
            has_constructor: class.methods.iter().any(|m| m.name == CONSTRUCTOR),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSlot> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Bytes one instance occupies.
    pub fn size(&self) -> u32 {
        self.fields.len() as u32 * WORD_SIZE
    }
}

/// Layouts of every class in a program, built before any code is generated.
#[derive(Debug, Default)]
pub struct ClassLayouts {
    layouts: FxHashMap<String, ClassLayout>,
}

impl ClassLayouts {
    pub fn new(classes: &[ClassDef]) -> Self {
        let layouts = classes
            .iter()
            .map(|class| (class.name.clone(), ClassLayout::from_class(class)))
            .collect();
        Self { layouts }
    }

    pub fn get(&self, class: &str, span: Span) -> Result<&ClassLayout, CodeGenError> {
        self.layouts
            .get(class)
            .ok_or_else(|| CodeGenError::UnknownLayout {
                class: class.to_string(),
                span,
            })
    }

    /// The slot of `class.field`.
    pub fn field(&self, class: &str, field: &str, span: Span) -> Result<&FieldSlot, CodeGenError> {
        self.get(class, span)?
            .field(field)
            .ok_or_else(|| CodeGenError::UnknownField {
                class: class.to_string(),
                field: field.to_string(),
                span,
            })
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}
