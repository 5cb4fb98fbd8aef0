mod collection;
mod ops;
mod value;
mod vm;
pub mod bytecode;
pub mod debug;
pub mod operators;

pub use collection::{Collection, CollectionMode};
pub use ops::Opcode;
pub use value::{Object, ObjectKind, Vector};
pub use vm::{ExecStats, Vm, DEFAULT_STACK_CAPACITY};

use std::fmt;

/// An executable program: a flat sequence of instruction words plus the
/// string constant pool that `PushString` immediates index into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub code: Vec<u64>,
    pub strings: Vec<String>,
}

impl Program {
    pub fn new(code: Vec<u64>, strings: Vec<String>) -> Self {
        Program { code, strings }
    }
}

/// Error type for object, collection, operator, and interpreter failures.
///
/// Every failure is an explicit result; nothing in the runtime unwinds.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A constructor or operator argument was out of its domain
    /// (zero capacity, zero dimension, non-positive repeat count).
    InvalidArgument(&'static str),
    /// The operation is not defined for this kind of object.
    InvalidOperand { op: &'static str, kind: ObjectKind },
    /// Indexed access past the end of a list.
    IndexOutOfBounds { index: usize, length: usize },
    /// Pop, peek, or build on a stack with too few items.
    Underflow,
    /// Stack subtraction found a non-matching item in the suffix.
    StackMismatch,
    /// No operator row exists for this pair of operand kinds.
    IncompatibleKinds {
        op: &'static str,
        lhs: ObjectKind,
        rhs: ObjectKind,
    },
    /// Element-wise vector arithmetic on different dimensions.
    DimensionMismatch { lhs: usize, rhs: usize },
    /// Zero divisor, or a zero coordinate in a vector divisor.
    DivisionByZero,
    /// An instruction expected a numeric operand.
    TypeMismatch { op: &'static str, kind: ObjectKind },
    /// The instruction word is not a known opcode.
    UnknownOpcode(u64),
    /// A string immediate pointed outside the constant pool.
    InvalidStringIndex { index: usize, pool: usize },
    /// The code ended in the middle of an instruction, or without a halt.
    TruncatedProgram,
    /// Writing print output failed.
    Io(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            RuntimeError::InvalidOperand { op, kind } => {
                write!(f, "{} is not supported for {}", op, kind)
            }
            RuntimeError::IndexOutOfBounds { index, length } => {
                write!(f, "index {} out of bounds (length {})", index, length)
            }
            RuntimeError::Underflow => write!(f, "stack underflow"),
            RuntimeError::StackMismatch => {
                write!(f, "stack contents do not match the expected suffix")
            }
            RuntimeError::IncompatibleKinds { op, lhs, rhs } => {
                write!(f, "cannot {} {} and {}", op, lhs, rhs)
            }
            RuntimeError::DimensionMismatch { lhs, rhs } => {
                write!(f, "vector dimensions do not match ({} vs {})", lhs, rhs)
            }
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
            RuntimeError::TypeMismatch { op, kind } => {
                write!(f, "{} expects a number, got {}", op, kind)
            }
            RuntimeError::UnknownOpcode(word) => write!(f, "unknown opcode: {}", word),
            RuntimeError::InvalidStringIndex { index, pool } => {
                write!(f, "string constant {} out of range (pool size {})", index, pool)
            }
            RuntimeError::TruncatedProgram => write!(f, "program ended unexpectedly"),
            RuntimeError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}
