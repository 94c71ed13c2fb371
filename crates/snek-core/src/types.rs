//! Value types and literals.

use std::fmt;

/// Name of the constructor method.
pub const CONSTRUCTOR: &str = "__init__";

/// Name of the implicit receiver parameter.
pub const SELF_PARAM: &str = "self";

/// A static value type.
///
/// Equality is structural; two object types are equal only when they name the
/// same class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    None,
    /// Instance of a user-defined class.
    Object(String),
}

impl Type {
    /// Object type for `class`.
    pub fn object(class: impl Into<String>) -> Self {
        Type::Object(class.into())
    }

    /// Resolve a type annotation as written in source.
    ///
    /// `int`, `bool` and `None` map to the primitive types; any other name is
    /// taken to be a class.
    pub fn from_annotation(name: &str) -> Self {
        match name {
            "int" => Type::Int,
            "bool" => Type::Bool,
            "None" | "none" => Type::None,
            class => Type::Object(class.to_string()),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Type::Object(_))
    }

    /// The class name of an object type.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Type::Object(class) => Some(class),
            _ => None,
        }
    }

    /// Whether a slot declared as `self` can hold a value of type `actual`.
    ///
    /// Exact match, plus `None` flowing into any object-typed slot.
    pub fn accepts(&self, actual: &Type) -> bool {
        self == actual || (self.is_object() && *actual == Type::None)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Bool => f.write_str("bool"),
            Type::None => f.write_str("None"),
            Type::Object(class) => f.write_str(class),
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Number(i32),
    Bool(bool),
    None,
}

impl Literal {
    /// The type of the literal.
    pub fn ty(&self) -> Type {
        match self {
            Literal::Number(_) => Type::Int,
            Literal::Bool(_) => Type::Bool,
            Literal::None => Type::None,
        }
    }

    /// The machine word this literal is stored as.
    pub fn as_word(&self) -> i32 {
        match self {
            Literal::Number(n) => *n,
            Literal::Bool(b) => i32::from(*b),
            Literal::None => 0,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::None => f.write_str("None"),
        }
    }
}
