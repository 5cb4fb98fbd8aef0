use std::io::{self, Write};

use super::collection::{Collection, CollectionMode};
use super::operators;
use super::ops::Opcode;
use super::value::Object;
use super::{Program, RuntimeError};

/// Default capacity of a fresh operand stack, in items.
pub const DEFAULT_STACK_CAPACITY: usize = 64;

/// Execution statistics for a single run.
#[derive(Debug, Clone, Default)]
pub struct ExecStats {
    /// Instructions executed, immediates not counted.
    pub instructions: u64,
    /// High-water mark of the operand stack.
    pub max_stack_depth: usize,
}

/// The opal virtual machine.
///
/// A single synchronous fetch-decode-execute loop over a flat word stream.
/// The operand stack is a stack-mode [`Collection`], so the machine's own
/// working storage obeys the same ownership rules as the objects it builds.
/// Any failure aborts the run; `halt` is the only graceful terminal state.
pub struct Vm {
    stack: Collection,
    stats: ExecStats,
    trace: bool,
    /// Output stream for print instructions.
    output: Box<dyn Write>,
}

impl Vm {
    pub fn new() -> Self {
        Self::new_with_config(DEFAULT_STACK_CAPACITY, false, Box::new(io::stdout()))
    }

    /// Create a VM with a custom output stream.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self::new_with_config(DEFAULT_STACK_CAPACITY, false, output)
    }

    /// Create a new VM with full configuration.
    ///
    /// # Arguments
    /// * `stack_capacity` - Initial operand stack capacity (clamped to 1)
    /// * `trace` - Whether to log each executed instruction to stderr
    /// * `output` - Output stream for print instructions
    pub fn new_with_config(stack_capacity: usize, trace: bool, output: Box<dyn Write>) -> Self {
        let stack = Collection::new(stack_capacity.max(1), CollectionMode::Stack)
            .expect("stack capacity is nonzero");
        Self {
            stack,
            stats: ExecStats::default(),
            trace,
            output,
        }
    }

    /// Read access to the operand stack.
    pub fn stack(&self) -> &Collection {
        &self.stack
    }

    /// Statistics collected so far.
    pub fn stats(&self) -> &ExecStats {
        &self.stats
    }

    /// Execute a program from its first word.
    ///
    /// Returns when a `halt` executes. Every other way out is an error:
    /// unknown opcodes, truncated instructions, operand stack underflow,
    /// and operator failures all abort immediately, leaving the machine
    /// state as it was at the faulting instruction.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        let mut pc = 0;
        loop {
            if pc >= program.code.len() {
                // Ran off the end without a halt.
                return Err(RuntimeError::TruncatedProgram);
            }
            let at = pc;
            let word = program.code[pc];
            pc += 1;

            let op = Opcode::from_word(word)?;
            self.stats.instructions += 1;
            if self.trace {
                eprintln!("[trace] {:04} {}", at, op.name());
            }

            match op {
                Opcode::PushInt => {
                    let imm = self.fetch(program, &mut pc)?;
                    self.push(Object::Integer(imm as u32 as i32));
                }
                Opcode::PushFloat => {
                    // The immediate is the bit pattern, not a numeric cast.
                    let imm = self.fetch(program, &mut pc)?;
                    self.push(Object::Float(f32::from_bits(imm as u32)));
                }
                Opcode::PushString => {
                    let index = self.fetch(program, &mut pc)? as usize;
                    let s = program.strings.get(index).ok_or(
                        RuntimeError::InvalidStringIndex {
                            index,
                            pool: program.strings.len(),
                        },
                    )?;
                    self.push(Object::Str(s.clone()));
                }
                Opcode::BuildCollection => {
                    let count = self.fetch(program, &mut pc)? as usize;
                    let mut items = Vec::with_capacity(count);
                    for _ in 0..count {
                        items.push(self.stack.pop()?);
                    }
                    items.reverse();
                    let mut list = Collection::new(count.max(1), CollectionMode::List)?;
                    for item in items {
                        list.append(item);
                    }
                    self.push(Object::Collection(list));
                }
                Opcode::BuildVector => {
                    let dims = self.fetch(program, &mut pc)? as usize;
                    let mut coords = Vec::with_capacity(dims);
                    for _ in 0..dims {
                        match self.stack.pop()? {
                            Object::Integer(n) => coords.push(n as f32),
                            Object::Float(x) => coords.push(x),
                            other => {
                                return Err(RuntimeError::TypeMismatch {
                                    op: "build_vector",
                                    kind: other.kind(),
                                });
                            }
                        }
                    }
                    coords.reverse();
                    self.push(Object::vector(coords)?);
                }
                Opcode::Add => {
                    let b = self.stack.pop()?;
                    let a = self.stack.pop()?;
                    let result = operators::add(a, b)?;
                    self.push(result);
                }
                Opcode::Sub => {
                    let b = self.stack.pop()?;
                    let a = self.stack.pop()?;
                    let result = operators::subtract(a, b)?;
                    self.push(result);
                }
                Opcode::Mul => {
                    let b = self.stack.pop()?;
                    let a = self.stack.pop()?;
                    let result = operators::multiply(&a, &b)?;
                    self.push(result);
                }
                Opcode::Div => {
                    let b = self.stack.pop()?;
                    let a = self.stack.pop()?;
                    let result = operators::divide(&a, &b)?;
                    self.push(result);
                }
                Opcode::Print => {
                    let value = self.stack.pop()?;
                    writeln!(self.output, "{}", value)
                        .map_err(|e| RuntimeError::Io(e.to_string()))?;
                }
                Opcode::Halt => return Ok(()),
            }
        }
    }

    /// Read the next immediate word, advancing the instruction pointer.
    fn fetch(&self, program: &Program, pc: &mut usize) -> Result<u64, RuntimeError> {
        let word = program
            .code
            .get(*pc)
            .copied()
            .ok_or(RuntimeError::TruncatedProgram)?;
        *pc += 1;
        Ok(word)
    }

    fn push(&mut self, value: Object) {
        self.stack.push(value);
        if self.stack.len() > self.stats.max_stack_depth {
            self.stats.max_stack_depth = self.stack.len();
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
