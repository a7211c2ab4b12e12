//! Call frames
//!
//! A frame is one function invocation: the index of the executing function
//! in the module's table, the instruction pointer, and a fresh set of local
//! slots. The first `param_count` locals hold the arguments in call order.

use crate::runtime::Value;

#[derive(Debug)]
pub struct CallFrame {
    /// Index into the loaded module's function table
    pub function: usize,
    /// Instruction pointer within that function's code
    pub ip: usize,
    /// Local slots, all Null until written
    pub locals: Vec<Value>,
}

impl CallFrame {
    pub fn new(function: usize, local_count: usize) -> Self {
        Self {
            function,
            ip: 0,
            locals: vec![Value::Null; local_count],
        }
    }

    #[inline]
    pub fn jump_to(&mut self, target: usize) {
        self.ip = target;
    }
}
