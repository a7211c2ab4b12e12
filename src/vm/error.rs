//! Typed runtime errors
//!
//! Every way an opcode can fail maps to a variant here; the VM records the
//! rendered message in its last-error channel and halts cleanly.

use std::{error, fmt};

#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
    NoModule,
    NoFrame,
    InvalidFunction(usize),
    StackUnderflow,
    StackOverflow,
    BadConstant(u16),
    BadLocal(u16),
    BadGlobal(u16),
    DivisionByZero,
    Type(String),
    IndexOutOfBounds { index: i64, size: usize },
    UnknownFunction(String),
    ArityMismatch {
        function: String,
        expected: u16,
        given: u16,
    },
    Builtin(String),
    Cancelled,
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoModule => write!(f, "no module loaded"),
            Self::NoFrame => write!(f, "no active call frame"),
            Self::InvalidFunction(index) => write!(f, "invalid function index {}", index),
            Self::StackUnderflow => write!(f, "stack underflow"),
            Self::StackOverflow => write!(f, "call stack overflow"),
            Self::BadConstant(index) => write!(f, "invalid constant index {}", index),
            Self::BadLocal(slot) => write!(f, "invalid local slot {}", slot),
            Self::BadGlobal(slot) => write!(f, "invalid global slot {}", slot),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Type(msg) => write!(f, "{}", msg),
            Self::IndexOutOfBounds { index, size } => {
                write!(f, "array index {} out of bounds (size {})", index, size)
            }
            Self::UnknownFunction(name) => write!(f, "call to unknown function '{}'", name),
            Self::ArityMismatch {
                function,
                expected,
                given,
            } => write!(
                f,
                "{}() expects {} arguments, {} given",
                function, expected, given
            ),
            Self::Builtin(msg) => write!(f, "{}", msg),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl error::Error for VmError {}
