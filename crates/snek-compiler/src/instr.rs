//! Stack-machine instructions.
//!
//! The code generator produces structured [`Instr`] trees rather than text so
//! that the emitted module can be rendered deterministically and executed
//! directly by the reference VM. Every value is an `i32`.

use std::fmt;

use snek_core::BinaryOp;

/// Binary `i32` operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericOp {
    Add,
    Sub,
    Mul,
    /// Signed division, truncating toward zero
    DivS,
    RemS,
    Eq,
    Ne,
    LtS,
    LeS,
    GtS,
    GeS,
}

impl NumericOp {
    /// Lowering of a source operator.
    pub fn from_binary(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => NumericOp::Add,
            BinaryOp::Sub => NumericOp::Sub,
            BinaryOp::Mul => NumericOp::Mul,
            BinaryOp::FloorDiv => NumericOp::DivS,
            BinaryOp::Mod => NumericOp::RemS,
            BinaryOp::Less => NumericOp::LtS,
            BinaryOp::LessEqual => NumericOp::LeS,
            BinaryOp::Greater => NumericOp::GtS,
            BinaryOp::GreaterEqual => NumericOp::GeS,
            BinaryOp::Equal | BinaryOp::Is => NumericOp::Eq,
            BinaryOp::NotEqual => NumericOp::Ne,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            NumericOp::Add => "i32.add",
            NumericOp::Sub => "i32.sub",
            NumericOp::Mul => "i32.mul",
            NumericOp::DivS => "i32.div_s",
            NumericOp::RemS => "i32.rem_s",
            NumericOp::Eq => "i32.eq",
            NumericOp::Ne => "i32.ne",
            NumericOp::LtS => "i32.lt_s",
            NumericOp::LeS => "i32.le_s",
            NumericOp::GtS => "i32.gt_s",
            NumericOp::GeS => "i32.ge_s",
        }
    }
}

/// One instruction. Control instructions own their nested bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `i32.const`
    Const(i32),
    LocalGet(String),
    LocalSet(String),
    GlobalGet(String),
    GlobalSet(String),
    Call(String),
    Numeric(NumericOp),
    /// `i32.eqz`
    Eqz,
    /// `i32.load`: pops an address, pushes the word stored there
    Load,
    /// `i32.store`: pops a value and an address
    Store,
    /// Pops a condition; runs `then` if it is non-zero, else `otherwise`.
    If {
        then: Vec<Instr>,
        otherwise: Vec<Instr>,
    },
    /// A branch to a block exits it.
    Block(Vec<Instr>),
    /// A branch to a loop restarts it.
    Loop(Vec<Instr>),
    Br(u32),
    BrIf(u32),
    Return,
    Nop,
}

impl Instr {
    pub fn local_get(name: &str) -> Self {
        Instr::LocalGet(name.to_string())
    }

    pub fn local_set(name: &str) -> Self {
        Instr::LocalSet(name.to_string())
    }

    pub fn global_get(name: &str) -> Self {
        Instr::GlobalGet(name.to_string())
    }

    pub fn global_set(name: &str) -> Self {
        Instr::GlobalSet(name.to_string())
    }

    pub fn call(name: &str) -> Self {
        Instr::Call(name.to_string())
    }

    /// Render this instruction at the given nesting depth, one line per
    /// leaf instruction.
    pub fn write_to(&self, out: &mut impl fmt::Write, depth: usize) -> fmt::Result {
        let pad = Indent(depth);
        match self {
            Instr::Const(value) => writeln!(out, "{pad}(i32.const {value})"),
            Instr::LocalGet(name) => writeln!(out, "{pad}(local.get ${name})"),
            Instr::LocalSet(name) => writeln!(out, "{pad}(local.set ${name})"),
            Instr::GlobalGet(name) => writeln!(out, "{pad}(global.get ${name})"),
            Instr::GlobalSet(name) => writeln!(out, "{pad}(global.set ${name})"),
            Instr::Call(name) => writeln!(out, "{pad}(call ${name})"),
            Instr::Numeric(op) => writeln!(out, "{pad}({})", op.mnemonic()),
            Instr::Eqz => writeln!(out, "{pad}(i32.eqz)"),
            Instr::Load => writeln!(out, "{pad}(i32.load)"),
            Instr::Store => writeln!(out, "{pad}(i32.store)"),
            Instr::If { then, otherwise } => {
                writeln!(out, "{pad}(if")?;
                writeln!(out, "{}(then", Indent(depth + 1))?;
                write_body(out, then, depth + 2)?;
                writeln!(out, "{})", Indent(depth + 1))?;
                if !otherwise.is_empty() {
                    writeln!(out, "{}(else", Indent(depth + 1))?;
                    write_body(out, otherwise, depth + 2)?;
                    writeln!(out, "{})", Indent(depth + 1))?;
                }
                writeln!(out, "{pad})")
            }
            Instr::Block(body) => {
                writeln!(out, "{pad}(block")?;
                write_body(out, body, depth + 1)?;
                writeln!(out, "{pad})")
            }
            Instr::Loop(body) => {
                writeln!(out, "{pad}(loop")?;
                write_body(out, body, depth + 1)?;
                writeln!(out, "{pad})")
            }
            Instr::Br(label) => writeln!(out, "{pad}(br {label})"),
            Instr::BrIf(label) => writeln!(out, "{pad}(br_if {label})"),
            Instr::Return => writeln!(out, "{pad}(return)"),
            Instr::Nop => writeln!(out, "{pad}(nop)"),
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, 0)
    }
}

/// Render a sequence of instructions at the given nesting depth.
pub fn write_body(out: &mut impl fmt::Write, body: &[Instr], depth: usize) -> fmt::Result {
    body.iter().try_for_each(|instr| instr.write_to(out, depth))
}

/// Two spaces per nesting level.
#[derive(Clone, Copy)]
pub(crate) struct Indent(pub usize);

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            f.write_str("  ")?;
        }
        Ok(())
    }
}
