//! micro-PHP: a tiny PHP-flavored scripting stack for constrained targets.
//!
//! Two halves share this crate: a compiler that lowers source text through
//! tokens and an AST into a compact `MBC` bytecode container, and a stack
//! VM that loads such a container and executes it against a host-supplied
//! builtin registry.
//!
//! Embedding sketch:
//!
//! ```no_run
//! use microphp::{compile_source, Vm};
//!
//! let module = compile_source("print(1 + 2);").expect("compile");
//! let mut vm = Vm::new(std::io::stdout());
//! vm.load_bytecode(&module.to_bytes()).expect("load");
//! vm.run().expect("run");
//! ```

pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod token;
pub mod vm;

pub use compiler::compile_source;
pub use vm::{Vm, VmError};
