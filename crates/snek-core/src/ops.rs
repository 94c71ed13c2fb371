//! Operator definitions and the operator typing table.

use std::fmt;

use crate::types::Type;

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `not`
    Not,
    /// `-`
    Neg,
}

impl UnaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "not" => Some(UnaryOp::Not),
            "-" => Some(UnaryOp::Neg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Neg => "-",
        }
    }

    /// Required operand type and result type.
    pub fn signature(&self) -> (Type, Type) {
        match self {
            UnaryOp::Not => (Type::Bool, Type::Bool),
            UnaryOp::Neg => (Type::Int, Type::Int),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,

    // Comparison
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,

    // Equality
    /// `==`
    Equal,
    /// `!=`
    NotEqual,

    // Identity
    /// `is`
    Is,
}

/// How an operator constrains its operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandRule {
    /// Both operands must have exactly `operand`; the result is `result`.
    Uniform { operand: Type, result: Type },
    /// Both operands must share one type, whatever it is; the result is `result`.
    SameType { result: Type },
}

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use BinaryOp::*;
        Some(match symbol {
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "//" => FloorDiv,
            "%" => Mod,
            "<" => Less,
            "<=" => LessEqual,
            ">" => Greater,
            ">=" => GreaterEqual,
            "==" => Equal,
            "!=" => NotEqual,
            "is" => Is,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            FloorDiv => "//",
            Mod => "%",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            Is => "is",
        }
    }

    /// The typing rule for this operator.
    pub fn rule(&self) -> OperandRule {
        use BinaryOp::*;
        match self {
            Add | Sub | Mul | FloorDiv | Mod => OperandRule::Uniform {
                operand: Type::Int,
                result: Type::Int,
            },
            Less | LessEqual | Greater | GreaterEqual => OperandRule::Uniform {
                operand: Type::Int,
                result: Type::Bool,
            },
            Is => OperandRule::Uniform {
                operand: Type::None,
                result: Type::Bool,
            },
            Equal | NotEqual => OperandRule::SameType { result: Type::Bool },
        }
    }

    /// The `(operand, result)` pair for operators with one uniform operand type.
    ///
    /// Returns `None` for the equality operators, which accept any type as long
    /// as both sides agree.
    pub fn operand_signature(&self) -> Option<(Type, Type)> {
        match self.rule() {
            OperandRule::Uniform { operand, result } => Some((operand, result)),
            OperandRule::SameType { .. } => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_round_trip() {
        for symbol in ["+", "-", "*", "//", "%", "<", "<=", ">", ">=", "==", "!=", "is"] {
            let op = BinaryOp::from_symbol(symbol).unwrap();
            assert_eq!(op.as_str(), symbol);
        }
        assert_eq!(BinaryOp::from_symbol("/"), None);
        assert_eq!(UnaryOp::from_symbol("not"), Some(UnaryOp::Not));
        assert_eq!(UnaryOp::from_symbol("~"), None);
    }

    #[test]
    fn arithmetic_and_comparison_table() {
        assert_eq!(
            BinaryOp::Add.operand_signature(),
            Some((Type::Int, Type::Int))
        );
        assert_eq!(
            BinaryOp::LessEqual.operand_signature(),
            Some((Type::Int, Type::Bool))
        );
        assert_eq!(
            BinaryOp::Is.operand_signature(),
            Some((Type::None, Type::Bool))
        );
    }

    #[test]
    fn equality_is_special_cased() {
        assert_eq!(BinaryOp::Equal.operand_signature(), None);
        assert_eq!(
            BinaryOp::NotEqual.rule(),
            OperandRule::SameType { result: Type::Bool }
        );
    }

    #[test]
    fn unary_table() {
        assert_eq!(UnaryOp::Not.signature(), (Type::Bool, Type::Bool));
        assert_eq!(UnaryOp::Neg.signature(), (Type::Int, Type::Int));
    }
}
