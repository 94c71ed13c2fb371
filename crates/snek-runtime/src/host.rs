//! Host side of the runtime ABI.
//!
//! Every host import takes one `i32` and returns one `i32`:
//!
//! | Import         | Output line        | Result            |
//! |----------------|--------------------|-------------------|
//! | `print_num`    | decimal integer    | the argument      |
//! | `print_bool`   | `False` / `True`   | the argument      |
//! | `print_none`   | `None`             | the argument      |
//! | `not_operator` | none               | `1` for `0`, else `0` |

use std::io::Write;

use snek_compiler::module::{NOT_OPERATOR, PRINT_BOOL, PRINT_NONE, PRINT_NUM};
use snek_core::RuntimeTrap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFunction {
    PrintNum,
    PrintBool,
    PrintNone,
    NotOperator,
}

impl HostFunction {
    /// The host function imported under `name`, if any.
    pub fn from_import(name: &str) -> Option<Self> {
        match name {
            PRINT_NUM => Some(HostFunction::PrintNum),
            PRINT_BOOL => Some(HostFunction::PrintBool),
            PRINT_NONE => Some(HostFunction::PrintNone),
            NOT_OPERATOR => Some(HostFunction::NotOperator),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HostFunction::PrintNum => PRINT_NUM,
            HostFunction::PrintBool => PRINT_BOOL,
            HostFunction::PrintNone => PRINT_NONE,
            HostFunction::NotOperator => NOT_OPERATOR,
        }
    }

    /// The line this call prints, if it prints one.
    pub fn output(&self, arg: i32) -> Option<String> {
        match self {
            HostFunction::PrintNum => Some(arg.to_string()),
            HostFunction::PrintBool if arg == 0 => Some("False".to_string()),
            HostFunction::PrintBool => Some("True".to_string()),
            HostFunction::PrintNone => Some("None".to_string()),
            HostFunction::NotOperator => None,
        }
    }

    pub fn result(&self, arg: i32) -> i32 {
        match self {
            HostFunction::NotOperator => i32::from(arg == 0),
            HostFunction::PrintNum | HostFunction::PrintBool | HostFunction::PrintNone => arg,
        }
    }
}

/// Receives the calls a running program makes to its imports.
pub trait Host {
    /// Write one line of program output.
    fn write_line(&mut self, line: &str) -> Result<(), RuntimeTrap>;

    /// Observe a host call before it runs.
    fn on_call(&mut self, _func: HostFunction, _arg: i32) {}

    /// Run a host import and return its result.
    fn call(&mut self, func: HostFunction, arg: i32) -> Result<i32, RuntimeTrap> {
        self.on_call(func, arg);
        if let Some(line) = func.output(arg) {
            self.write_line(&line)?;
        }
        Ok(func.result(arg))
    }
}

/// Prints program output to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutHost;

impl Host for StdoutHost {
    fn write_line(&mut self, line: &str) -> Result<(), RuntimeTrap> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}").map_err(|e| RuntimeTrap::Host {
            message: e.to_string(),
        })
    }
}

/// Records every host call and output line, for tests and embedding.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingHost {
    pub calls: Vec<(HostFunction, i32)>,
    pub lines: Vec<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments of every call to `func`, in order.
    pub fn args(&self, func: HostFunction) -> Vec<i32> {
        self.calls
            .iter()
            .filter(|(f, _)| *f == func)
            .map(|(_, arg)| *arg)
            .collect()
    }

    /// All output joined with newlines.
    pub fn output(&self) -> String {
        self.lines.iter().map(|l| format!("{l}\n")).collect()
    }
}

impl Host for RecordingHost {
    fn write_line(&mut self, line: &str) -> Result<(), RuntimeTrap> {
        self.lines.push(line.to_string());
        Ok(())
    }

    fn on_call(&mut self, func: HostFunction, arg: i32) {
        self.calls.push((func, arg));
    }
}
