//! The interpreter.
//!
//! [`Vm`] executes a [`Module`] directly from its structured form. Each call
//! gets a [`Frame`] with its own value stack, locals and label stack; globals
//! and memory live on the `Vm` for the whole run. Frames are kept on an
//! explicit stack, so nested calls never recurse on the host stack and
//! `max_call_depth` is the only limit on recursion.
//!
//! Control flow follows WebAssembly label rules: `block`, `loop` and `if` each
//! push a label, `br n` targets the n-th enclosing label, and a branch to a
//! function's outermost label returns.

use rustc_hash::FxHashMap;
use snek_compiler::module::HEAP_POINTER;
use snek_compiler::{Function, ImportKind, Instr, Module, NumericOp};
use snek_core::RuntimeTrap;

use crate::config::VmConfig;
use crate::host::{Host, HostFunction};
use crate::memory::Memory;

type Result<T> = std::result::Result<T, RuntimeTrap>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelKind {
    /// A branch leaves the body
    Block,
    /// A branch restarts the body
    Loop,
}

/// An instruction sequence being executed, with its program counter.
#[derive(Debug)]
struct Label<'m> {
    body: &'m [Instr],
    pc: usize,
    kind: LabelKind,
}

/// What the frame stack has to do after one instruction.
enum Step<'m> {
    Next,
    Call(&'m Function, Vec<i32>),
}

/// Execution state of one function call.
#[derive(Debug)]
struct Frame<'m> {
    function: &'m Function,
    locals: FxHashMap<&'m str, i32>,
    stack: Vec<i32>,
    /// Innermost last; the function body is `labels[0]`
    labels: Vec<Label<'m>>,
}

impl<'m> Frame<'m> {
    fn new(function: &'m Function, args: &[i32]) -> Self {
        let mut locals = FxHashMap::default();
        for (param, arg) in function.params.iter().zip(args) {
            locals.insert(param.as_str(), *arg);
        }
        for local in &function.locals {
            locals.insert(local.as_str(), 0);
        }
        let mut frame = Self {
            function,
            locals,
            stack: Vec::new(),
            labels: Vec::new(),
        };
        frame.enter(&function.body, LabelKind::Block);
        frame
    }

    fn push(&mut self, value: i32) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<i32> {
        self.stack.pop().ok_or_else(|| RuntimeTrap::StackUnderflow {
            function: self.function.name.clone(),
        })
    }

    fn slot(&mut self, name: &str) -> Result<&mut i32> {
        let function = self.function;
        self.locals
            .get_mut(name)
            .ok_or_else(|| RuntimeTrap::UnknownLocal {
                name: name.to_string(),
                function: function.name.clone(),
            })
    }

    fn enter(&mut self, body: &'m [Instr], kind: LabelKind) {
        self.labels.push(Label { body, pc: 0, kind });
    }

    /// The next instruction to run, leaving every label whose body has
    /// finished. `None` once the function body itself has finished.
    fn next(&mut self) -> Option<&'m Instr> {
        while let Some(label) = self.labels.last_mut() {
            let body = label.body;
            if let Some(instr) = body.get(label.pc) {
                label.pc += 1;
                return Some(instr);
            }
            self.labels.pop();
        }
        None
    }

    fn branch(&mut self, depth: u32) -> Result<()> {
        let open = self.labels.len();
        let Some(target) = open.checked_sub(depth as usize + 1) else {
            return Err(RuntimeTrap::InvalidBranch {
                depth: depth - open.saturating_sub(1) as u32,
            });
        };
        if self.labels[target].kind == LabelKind::Loop {
            self.labels.truncate(target + 1);
            self.labels[target].pc = 0;
        } else {
            self.labels.truncate(target);
        }
        Ok(())
    }

    fn ret(&mut self) {
        self.labels.clear();
    }

    fn result(&mut self) -> Result<Option<i32>> {
        if self.function.result {
            self.pop().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Runs one module against a host.
pub struct Vm<'m, H: Host> {
    functions: FxHashMap<&'m str, &'m Function>,
    exports: FxHashMap<&'m str, &'m Function>,
    imports: FxHashMap<&'m str, HostFunction>,
    globals: FxHashMap<&'m str, i32>,
    memory: Memory,
    host: H,
    config: VmConfig,
}

impl<'m, H: Host> Vm<'m, H> {
    /// Instantiate `module`: fresh memory and globals at their initial values.
    pub fn new(module: &'m Module, host: H, config: VmConfig) -> Self {
        let functions = module
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f))
            .collect();
        let exports = module
            .functions
            .iter()
            .filter_map(|f| f.export.as_deref().map(|name| (name, f)))
            .collect();
        let imports = module
            .imports
            .iter()
            .filter(|i| i.kind == ImportKind::Func)
            .filter_map(|i| HostFunction::from_import(&i.name).map(|f| (i.name.as_str(), f)))
            .collect();
        let globals = module
            .globals
            .iter()
            .map(|g| (g.name.as_str(), g.init))
            .collect();
        let pages = config.memory_pages.or(module.memory_pages()).unwrap_or(0);

        Self {
            functions,
            exports,
            imports,
            globals,
            memory: Memory::new(pages),
            host,
            config,
        }
    }

    /// Call the function exported as `name` with no arguments.
    #[tracing::instrument(skip(self))]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&mut self, name: &str) -> Result<Option<i32>> {
        let function = self
            .exports
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeTrap::MissingExport {
                name: name.to_string(),
            })?;
        let result = self.invoke(function, &[]);
        tracing::debug!(?result, "run finished");
        result
    }

    /// Call a module function by its internal name.
    pub fn call(&mut self, name: &str, args: &[i32]) -> Result<Option<i32>> {
        let function = self.function(name)?;
        self.invoke(function, args)
    }

    pub fn global(&self, name: &str) -> Option<i32> {
        self.globals.get(name).copied()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn function(&self, name: &str) -> Result<&'m Function> {
        self.functions
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeTrap::UnknownFunction {
                name: name.to_string(),
            })
    }

    /// Run `function` to completion on a fresh frame stack.
    fn invoke(&mut self, function: &'m Function, args: &[i32]) -> Result<Option<i32>> {
        let mut frames = Vec::new();
        self.push_frame(&mut frames, function, args)?;

        while let Some(frame) = frames.last_mut() {
            let Some(instr) = frame.next() else {
                let result = frame.result()?;
                frames.pop();
                match (frames.last_mut(), result) {
                    (Some(caller), Some(value)) => caller.push(value),
                    (Some(_), None) => {}
                    (None, result) => return Ok(result),
                }
                continue;
            };
            if let Step::Call(callee, args) = self.step(frame, instr)? {
                self.push_frame(&mut frames, callee, &args)?;
            }
        }
        Ok(None)
    }

    fn push_frame(
        &self,
        frames: &mut Vec<Frame<'m>>,
        function: &'m Function,
        args: &[i32],
    ) -> Result<()> {
        if frames.len() >= self.config.max_call_depth {
            return Err(RuntimeTrap::CallStackExhausted {
                depth: frames.len(),
            });
        }
        tracing::trace!(function = %function.name, ?args, "call");
        frames.push(Frame::new(function, args));
        Ok(())
    }

    fn step(&mut self, frame: &mut Frame<'m>, instr: &'m Instr) -> Result<Step<'m>> {
        match instr {
            Instr::Const(value) => frame.push(*value),
            Instr::LocalGet(name) => {
                let value = *frame.slot(name)?;
                frame.push(value);
            }
            Instr::LocalSet(name) => {
                let value = frame.pop()?;
                *frame.slot(name)? = value;
            }
            Instr::GlobalGet(name) => {
                let value = self.global(name).ok_or_else(|| RuntimeTrap::UnknownGlobal {
                    name: name.clone(),
                })?;
                frame.push(value);
            }
            Instr::GlobalSet(name) => {
                let value = frame.pop()?;
                self.set_global(name, value)?;
            }
            Instr::Call(name) => return self.call_instr(frame, name),
            Instr::Numeric(op) => {
                let right = frame.pop()?;
                let left = frame.pop()?;
                frame.push(numeric(*op, left, right)?);
            }
            Instr::Eqz => {
                let value = frame.pop()?;
                frame.push(i32::from(value == 0));
            }
            Instr::Load => {
                let address = frame.pop()?;
                frame.push(self.memory.load(address)?);
            }
            Instr::Store => {
                let value = frame.pop()?;
                let address = frame.pop()?;
                self.store(address, value)?;
            }
            Instr::If { then, otherwise } => {
                let body = if frame.pop()? != 0 { then } else { otherwise };
                frame.enter(body, LabelKind::Block);
            }
            Instr::Block(body) => frame.enter(body, LabelKind::Block),
            Instr::Loop(body) => frame.enter(body, LabelKind::Loop),
            Instr::Br(depth) => frame.branch(*depth)?,
            Instr::BrIf(depth) => {
                if frame.pop()? != 0 {
                    frame.branch(*depth)?;
                }
            }
            Instr::Return => frame.ret(),
            Instr::Nop => {}
        }
        Ok(Step::Next)
    }

    /// Host imports run immediately; module functions become a new frame.
    fn call_instr(&mut self, frame: &mut Frame<'m>, name: &str) -> Result<Step<'m>> {
        if let Some(func) = self.imports.get(name).copied() {
            let arg = frame.pop()?;
            let result = self.host.call(func, arg)?;
            frame.push(result);
            return Ok(Step::Next);
        }

        let callee = self.function(name)?;
        let mut args = vec![0; callee.params.len()];
        for slot in args.iter_mut().rev() {
            *slot = frame.pop()?;
        }
        Ok(Step::Call(callee, args))
    }

    /// A store at or above the heap pointer that misses memory is an
    /// allocation that does not fit.
    fn store(&mut self, address: i32, value: i32) -> Result<()> {
        let heap = self.global(HEAP_POINTER);
        let limit = self.memory.size();
        self.memory.store(address, value).map_err(|trap| match heap {
            Some(heap_pointer) if address >= heap_pointer => RuntimeTrap::OutOfMemory {
                heap_pointer,
                limit,
            },
            _ => trap,
        })
    }

    fn set_global(&mut self, name: &str, value: i32) -> Result<()> {
        if name == HEAP_POINTER && value as u32 as usize > self.memory.size() {
            return Err(RuntimeTrap::OutOfMemory {
                heap_pointer: value,
                limit: self.memory.size(),
            });
        }
        let slot = self
            .globals
            .get_mut(name)
            .ok_or_else(|| RuntimeTrap::UnknownGlobal {
                name: name.to_string(),
            })?;
        *slot = value;
        Ok(())
    }
}

/// `i32` arithmetic and comparison with WebAssembly semantics.
fn numeric(op: NumericOp, left: i32, right: i32) -> Result<i32> {
    Ok(match op {
        NumericOp::Add => left.wrapping_add(right),
        NumericOp::Sub => left.wrapping_sub(right),
        NumericOp::Mul => left.wrapping_mul(right),
        NumericOp::DivS => {
            if right == 0 {
                return Err(RuntimeTrap::DivisionByZero);
            }
            left.checked_div(right).ok_or(RuntimeTrap::IntegerOverflow)?
        }
        NumericOp::RemS => {
            if right == 0 {
                return Err(RuntimeTrap::DivisionByZero);
            }
            left.wrapping_rem(right)
        }
        NumericOp::Eq => i32::from(left == right),
        NumericOp::Ne => i32::from(left != right),
        NumericOp::LtS => i32::from(left < right),
        NumericOp::LeS => i32::from(left <= right),
        NumericOp::GtS => i32::from(left > right),
        NumericOp::GeS => i32::from(left >= right),
    })
}
