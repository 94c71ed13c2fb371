//! Runtime helper functions for the built-ins.
//!
//! Each helper is emitted into the module only when the program calls the
//! corresponding built-in, always in the order of [`Helper::ALL`].

use snek_parser::ast::{Builtin1, Builtin2};

use crate::instr::{Instr, NumericOp};
use crate::module::Function;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Helper {
    Abs,
    Max,
    Min,
    Pow,
}

impl Helper {
    pub const ALL: [Helper; 4] = [Helper::Abs, Helper::Max, Helper::Min, Helper::Pow];

    pub fn for_builtin1(func: Builtin1) -> Self {
        match func {
            Builtin1::Abs => Helper::Abs,
        }
    }

    pub fn for_builtin2(func: Builtin2) -> Self {
        match func {
            Builtin2::Max => Helper::Max,
            Builtin2::Min => Helper::Min,
            Builtin2::Pow => Helper::Pow,
        }
    }

    /// Function name in the emitted module.
    pub fn symbol(&self) -> &'static str {
        match self {
            Helper::Abs => "rt.abs",
            Helper::Max => "rt.max",
            Helper::Min => "rt.min",
            Helper::Pow => "rt.pow",
        }
    }

    pub fn function(&self) -> Function {
        let (params, locals, body) = match self {
            Helper::Abs => (vec!["x"], vec![], abs_body()),
            Helper::Max => (vec!["a", "b"], vec![], pick_body(NumericOp::GtS)),
            Helper::Min => (vec!["a", "b"], vec![], pick_body(NumericOp::LtS)),
            Helper::Pow => (vec!["base", "exp"], vec!["acc"], pow_body()),
        };
        Function {
            name: self.symbol().to_string(),
            export: None,
            params: params.into_iter().map(str::to_string).collect(),
            result: true,
            locals: locals.into_iter().map(str::to_string).collect(),
            body,
        }
    }
}

/// Set of helpers a program uses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HelperSet {
    used: [bool; 4],
}

impl HelperSet {
    pub fn insert(&mut self, helper: Helper) {
        self.used[helper as usize] = true;
    }

    pub fn contains(&self, helper: Helper) -> bool {
        self.used[helper as usize]
    }

    /// Helper functions to emit, in fixed order.
    pub fn functions(&self) -> Vec<Function> {
        Helper::ALL
            .iter()
            .filter(|h| self.contains(**h))
            .map(Helper::function)
            .collect()
    }
}

/// `if x < 0 { return 0 - x } x`
fn abs_body() -> Vec<Instr> {
    vec![
        Instr::local_get("x"),
        Instr::Const(0),
        Instr::Numeric(NumericOp::LtS),
        Instr::If {
            then: vec![
                Instr::Const(0),
                Instr::local_get("x"),
                Instr::Numeric(NumericOp::Sub),
                Instr::Return,
            ],
            otherwise: vec![],
        },
        Instr::local_get("x"),
    ]
}

/// `if a <cmp> b { return a } b`
fn pick_body(cmp: NumericOp) -> Vec<Instr> {
    vec![
        Instr::local_get("a"),
        Instr::local_get("b"),
        Instr::Numeric(cmp),
        Instr::If {
            then: vec![Instr::local_get("a"), Instr::Return],
            otherwise: vec![],
        },
        Instr::local_get("b"),
    ]
}

/// Repeated multiplication; a non-positive exponent yields 1.
fn pow_body() -> Vec<Instr> {
    vec![
        Instr::Const(1),
        Instr::local_set("acc"),
        Instr::Block(vec![Instr::Loop(vec![
            Instr::local_get("exp"),
            Instr::Const(0),
            Instr::Numeric(NumericOp::LeS),
            Instr::BrIf(1),
            Instr::local_get("acc"),
            Instr::local_get("base"),
            Instr::Numeric(NumericOp::Mul),
            Instr::local_set("acc"),
            Instr::local_get("exp"),
            Instr::Const(1),
            Instr::Numeric(NumericOp::Sub),
            Instr::local_set("exp"),
            Instr::Br(0),
        ])]),
        Instr::local_get("acc"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_used_helpers_in_fixed_order() {
        let mut set = HelperSet::default();
        set.insert(Helper::Pow);
        set.insert(Helper::Abs);
        set.insert(Helper::Pow);
        let names: Vec<_> = set.functions().into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["rt.abs", "rt.pow"]);
        assert!(!set.contains(Helper::Max));
    }

    #[test]
    fn builtins_map_to_helpers() {
        assert_eq!(Helper::for_builtin1(Builtin1::Abs).symbol(), "rt.abs");
        assert_eq!(Helper::for_builtin2(Builtin2::Min), Helper::Min);
    }

    #[test]
    fn helper_shapes() {
        let pow = Helper::Pow.function();
        assert_eq!(pow.params, ["base", "exp"]);
        assert_eq!(pow.locals, ["acc"]);
        assert!(pow.result);
        assert_eq!(pow.body.last(), Some(&Instr::local_get("acc")));
    }
}
