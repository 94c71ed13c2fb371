//! Unified error types for snek.
//!
//! Every phase of the pipeline has its own error enum; the first error raised
//! aborts the pipeline. [`SnekError`] wraps them for callers that only care
//! about the kind and message.
//!
//! ```text
//! SnekError (top-level wrapper)
//! ├── ParseError    - concrete syntax tree did not match any handled shape
//! ├── TypeError     - a typing rule was violated
//! ├── CodeGenError  - the typed tree has a shape with no lowering
//! └── RuntimeTrap   - the host runtime stopped execution
//! ```

use std::fmt;

use thiserror::Error;

use crate::Span;
use crate::ops::BinaryOp;
use crate::types::Type;

// ============================================================================
// Parse Errors
// ============================================================================

/// Errors raised while building the untyped AST from a syntax tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A node kind that is not valid in this position.
    #[error("at {span}: could not parse {context}: unexpected {kind} '{text}'")]
    UnexpectedNode {
        context: &'static str,
        kind: String,
        text: String,
        span: Span,
    },

    /// A node ended before a required child was found.
    #[error("at {span}: could not parse {context}: missing {expected}")]
    MissingNode {
        context: &'static str,
        expected: &'static str,
        span: Span,
    },

    /// A numeric literal that does not fit a 32-bit signed integer.
    #[error("at {span}: invalid integer literal '{text}'")]
    InvalidNumber { text: String, span: Span },

    /// An operator outside the supported set.
    #[error("at {span}: unsupported operator '{op}'")]
    UnknownOperator { op: String, span: Span },

    /// A syntactically valid construct the language subset does not support.
    #[error("at {span}: {message}")]
    Unsupported { message: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedNode { span, .. } => *span,
            ParseError::MissingNode { span, .. } => *span,
            ParseError::InvalidNumber { span, .. } => *span,
            ParseError::UnknownOperator { span, .. } => *span,
            ParseError::Unsupported { span, .. } => *span,
        }
    }
}

// ============================================================================
// Type Errors
// ============================================================================

/// What kind of declaration a duplicate name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    GlobalVariable,
    Function,
    Class,
    Field,
    Method,
    Local,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DefinitionKind::GlobalVariable => "global variable",
            DefinitionKind::Function => "function",
            DefinitionKind::Class => "class",
            DefinitionKind::Field => "field",
            DefinitionKind::Method => "method",
            DefinitionKind::Local => "local variable",
        })
    }
}

/// Errors raised by the type checker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("at {span}: undefined name '{name}'")]
    UndefinedName { name: String, span: Span },

    #[error("at {span}: unknown function '{name}'")]
    UnknownFunction { name: String, span: Span },

    #[error("at {span}: unknown class '{name}'")]
    UnknownClass { name: String, span: Span },

    #[error("at {span}: class '{class}' has no field '{field}'")]
    UnknownField {
        class: String,
        field: String,
        span: Span,
    },

    #[error("at {span}: class '{class}' has no method '{method}'")]
    UnknownMethod {
        class: String,
        method: String,
        span: Span,
    },

    #[error("at {span}: duplicate {kind} '{name}'")]
    DuplicateDefinition {
        kind: DefinitionKind,
        name: String,
        span: Span,
    },

    /// A value of the wrong type flows into a typed slot.
    #[error("at {span}: type mismatch in {context}: expected {expected}, found {actual}")]
    Mismatch {
        context: String,
        expected: Type,
        actual: Type,
        span: Span,
    },

    #[error("at {span}: unsupported operand type for '{op}': expected {expected}, found {actual}")]
    UnsupportedOperand {
        op: String,
        expected: Type,
        actual: Type,
        span: Span,
    },

    #[error("at {span}: operands of '{op}' must have the same type, found {left} and {right}")]
    OperandMismatch {
        op: BinaryOp,
        left: Type,
        right: Type,
        span: Span,
    },

    #[error("at {span}: expected an object, found {actual}")]
    NotAnObject { actual: Type, span: Span },

    #[error("at {span}: '{callee}' expects {expected} argument(s), found {actual}")]
    ArgumentCount {
        callee: String,
        expected: usize,
        actual: usize,
        span: Span,
    },

    #[error("at {span}: argument {index} of '{callee}': expected {expected}, found {actual}")]
    ArgumentType {
        callee: String,
        index: usize,
        expected: Type,
        actual: Type,
        span: Span,
    },

    #[error("at {span}: {construct} condition must be bool, found {actual}")]
    ConditionNotBool {
        construct: &'static str,
        actual: Type,
        span: Span,
    },

    #[error("at {span}: 'return' outside of a function")]
    ReturnOutsideFunction { span: Span },

    #[error("at {span}: '{function}' must return a value of type {expected}")]
    MissingReturn {
        function: String,
        expected: Type,
        span: Span,
    },

    #[error("at {span}: method '{method}' of class '{class}' must take 'self' as its first parameter")]
    MissingSelf {
        class: String,
        method: String,
        span: Span,
    },

    #[error("at {span}: constructor of '{class}' must return {class}, declared {actual}")]
    InvalidConstructor {
        class: String,
        actual: Type,
        span: Span,
    },

    #[error("at {span}: constructing '{class}' takes no arguments, found {count}")]
    ConstructorArguments {
        class: String,
        count: usize,
        span: Span,
    },

    #[error("at {span}: 'self' used outside of a method")]
    SelfOutsideClass { span: Span },

    #[error("at {span}: print expects exactly 1 argument, found {count}")]
    PrintArity { count: usize, span: Span },

    #[error("at {span}: nested definition of '{name}' is not supported")]
    NestedDefinition { name: String, span: Span },

    /// Two definitions, or a definition and a host import, would share one
    /// function name in the emitted module.
    #[error("at {span}: '{name}' would be emitted as '${symbol}', which is already taken")]
    SymbolCollision {
        name: String,
        symbol: String,
        span: Span,
    },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::UndefinedName { span, .. } => *span,
            TypeError::UnknownFunction { span, .. } => *span,
            TypeError::UnknownClass { span, .. } => *span,
            TypeError::UnknownField { span, .. } => *span,
            TypeError::UnknownMethod { span, .. } => *span,
            TypeError::DuplicateDefinition { span, .. } => *span,
            TypeError::Mismatch { span, .. } => *span,
            TypeError::UnsupportedOperand { span, .. } => *span,
            TypeError::OperandMismatch { span, .. } => *span,
            TypeError::NotAnObject { span, .. } => *span,
            TypeError::ArgumentCount { span, .. } => *span,
            TypeError::ArgumentType { span, .. } => *span,
            TypeError::ConditionNotBool { span, .. } => *span,
            TypeError::ReturnOutsideFunction { span } => *span,
            TypeError::MissingReturn { span, .. } => *span,
            TypeError::MissingSelf { span, .. } => *span,
            TypeError::InvalidConstructor { span, .. } => *span,
            TypeError::ConstructorArguments { span, .. } => *span,
            TypeError::SelfOutsideClass { span } => *span,
            TypeError::PrintArity { span, .. } => *span,
            TypeError::NestedDefinition { span, .. } => *span,
            TypeError::SymbolCollision { span, .. } => *span,
        }
    }
}

// ============================================================================
// Code Generation Errors
// ============================================================================

/// Errors raised while lowering the typed tree.
///
/// These indicate that the checker accepted something the generator cannot
/// lower, so they are internal-consistency faults rather than user errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodeGenError {
    #[error("at {span}: expression has not been type checked")]
    MissingType { span: Span },

    #[error("at {span}: cannot print a value of type {ty}")]
    UnsupportedPrint { ty: Type, span: Span },

    #[error("at {span}: expected an object receiver, found {actual}")]
    ReceiverNotObject { actual: Type, span: Span },

    #[error("at {span}: no layout for class '{class}'")]
    UnknownLayout { class: String, span: Span },

    #[error("at {span}: class '{class}' has no field '{field}' in its layout")]
    UnknownField {
        class: String,
        field: String,
        span: Span,
    },

    #[error("at {span}: no lowering for {what}")]
    Unsupported { what: String, span: Span },
}

impl CodeGenError {
    pub fn span(&self) -> Span {
        match self {
            CodeGenError::MissingType { span } => *span,
            CodeGenError::UnsupportedPrint { span, .. } => *span,
            CodeGenError::ReceiverNotObject { span, .. } => *span,
            CodeGenError::UnknownLayout { span, .. } => *span,
            CodeGenError::UnknownField { span, .. } => *span,
            CodeGenError::Unsupported { span, .. } => *span,
        }
    }
}

// ============================================================================
// Runtime Traps
// ============================================================================

/// Conditions that stop execution inside the host runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeTrap {
    #[error("out of bounds memory access at address {address} (memory size {size})")]
    OutOfBounds { address: i64, size: usize },

    #[error("out of memory: heap pointer {heap_pointer} exceeds memory size {limit}")]
    OutOfMemory { heap_pointer: i32, limit: usize },

    #[error("integer divide by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("call stack exhausted at depth {depth}")]
    CallStackExhausted { depth: usize },

    #[error("call to unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("access to unknown global '{name}'")]
    UnknownGlobal { name: String },

    #[error("access to unknown local '{name}' in '{function}'")]
    UnknownLocal { name: String, function: String },

    #[error("value stack underflow in '{function}'")]
    StackUnderflow { function: String },

    #[error("module does not export '{name}'")]
    MissingExport { name: String },

    #[error("branch depth {depth} escapes its function")]
    InvalidBranch { depth: u32 },

    #[error("host error: {message}")]
    Host { message: String },
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Any error produced by the compile-and-run pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnekError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    CodeGen(#[from] CodeGenError),

    #[error(transparent)]
    Runtime(#[from] RuntimeTrap),
}

impl SnekError {
    /// Short name of the error kind, as shown to users.
    pub fn kind(&self) -> &'static str {
        match self {
            SnekError::Parse(_) => "ParseError",
            SnekError::Type(_) => "TypeError",
            SnekError::CodeGen(_) => "CodeGenError",
            SnekError::Runtime(_) => "RuntimeTrap",
        }
    }

    /// Source location, when the error has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            SnekError::Parse(e) => Some(e.span()),
            SnekError::Type(e) => Some(e.span()),
            SnekError::CodeGen(e) => Some(e.span()),
            SnekError::Runtime(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_error_message_names_both_types() {
        let err = TypeError::Mismatch {
            context: "assignment to 'x'".to_string(),
            expected: Type::Int,
            actual: Type::Bool,
            span: Span::new(2, 1, 5),
        };
        assert_eq!(
            err.to_string(),
            "at 2:1: type mismatch in assignment to 'x': expected int, found bool"
        );
        assert_eq!(err.span(), Span::new(2, 1, 5));
    }

    #[test]
    fn duplicate_definition_message() {
        let err = TypeError::DuplicateDefinition {
            kind: DefinitionKind::Field,
            name: "value".to_string(),
            span: Span::new(3, 5, 5),
        };
        assert_eq!(err.to_string(), "at 3:5: duplicate field 'value'");
    }

    #[test]
    fn wrapper_is_transparent() {
        let err: SnekError = ParseError::InvalidNumber {
            text: "99999999999".to_string(),
            span: Span::new(1, 1, 11),
        }
        .into();
        assert_eq!(err.kind(), "ParseError");
        assert_eq!(err.to_string(), "at 1:1: invalid integer literal '99999999999'");
        assert_eq!(err.span(), Some(Span::new(1, 1, 11)));
    }

    #[test]
    fn runtime_traps_have_no_span() {
        let err: SnekError = RuntimeTrap::DivisionByZero.into();
        assert_eq!(err.kind(), "RuntimeTrap");
        assert_eq!(err.span(), None);
        assert_eq!(err.to_string(), "integer divide by zero");
    }
}
