//! AST to bytecode compilation
//!
//! One pass over the program: top-level statements become the module's
//! `main` function, `function` definitions become further entries in the
//! function table. Literals are deduplicated into a module-wide constant
//! pool by structural equality; calls are encoded against the constant pool
//! by callee name, so forward references need no second pass.

mod expr;
mod loops;
mod stmt;

use std::collections::{HashMap, HashSet};

use crate::ast::Program;
use crate::bytecode::{
    Function, Instruction, Module, Opcode, GLOBAL_SLOTS, MAX_CONSTANTS, MAX_FUNCTIONS, MAX_LOCALS,
};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::runtime::Value;

/// Lex, parse and compile a full source text into a loadable module.
pub fn compile_source(source: &str) -> Result<Module, String> {
    let tokens = Lexer::new(source).tokenize()?;
    let program = Parser::new(tokens).parse()?;
    Compiler::new().compile_program(&program)
}

/// Where a name lives after resolution
#[derive(Debug, Clone, Copy)]
pub(crate) enum Slot {
    Local(u16),
    Global(u16),
}

/// Per-function compilation state
pub(crate) struct FunctionBuilder {
    name: String,
    code: Vec<Instruction>,
    locals: HashMap<String, u16>,
    const_names: HashSet<String>,
    next_local: u16,
    param_count: u16,
    /// Counter for compiler-generated locals (loop cursors, store temps)
    hidden: usize,
}

impl FunctionBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            code: Vec::new(),
            locals: HashMap::new(),
            const_names: HashSet::new(),
            next_local: 0,
            param_count: 0,
            hidden: 0,
        }
    }

    fn finish(self) -> Function {
        Function {
            name: self.name,
            code: self.code,
            local_count: self.next_local,
            param_count: self.param_count,
        }
    }
}

/// Compiler state for one module
pub struct Compiler {
    constants: Vec<Value>,
    functions: Vec<Function>,
    globals: HashMap<String, u16>,
    current: FunctionBuilder,
    in_function: bool,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            constants: Vec::new(),
            functions: Vec::new(),
            globals: HashMap::new(),
            current: FunctionBuilder::new("main".to_string()),
            in_function: false,
        }
    }

    /// Compile a parsed program into a module whose entry function holds
    /// the top-level statements.
    pub fn compile_program(mut self, program: &Program) -> Result<Module, String> {
        for stmt in &program.statements {
            self.compile_stmt(stmt)?;
        }

        // Implicit end of main: return Null
        let null_index = self.add_constant(Value::Null)?;
        self.emit_op1(Opcode::Const, null_index);
        self.emit(Opcode::Return);

        let main = std::mem::replace(&mut self.current, FunctionBuilder::new(String::new()));
        self.push_function(main)?;
        let main_offset = (self.functions.len() - 1) as u32;

        Ok(Module {
            constants: self.constants,
            functions: self.functions,
            main_offset,
        })
    }

    // ==================== Emission helpers ====================

    pub(crate) fn emit(&mut self, opcode: Opcode) -> usize {
        let offset = self.current.code.len();
        self.current.code.push(Instruction::op(opcode));
        offset
    }

    pub(crate) fn emit_op1(&mut self, opcode: Opcode, op1: u16) -> usize {
        let offset = self.current.code.len();
        self.current.code.push(Instruction::op1(opcode, op1));
        offset
    }

    pub(crate) fn emit_op2(&mut self, opcode: Opcode, op1: u16, op2: u16) -> usize {
        let offset = self.current.code.len();
        self.current.code.push(Instruction::new(opcode, op1, op2));
        offset
    }

    /// Emit a forward jump with a placeholder target; patch later.
    pub(crate) fn emit_jump(&mut self, opcode: Opcode) -> usize {
        self.emit_op1(opcode, 0)
    }

    /// Point a previously emitted jump at the current offset.
    pub(crate) fn patch_jump(&mut self, at: usize) -> Result<(), String> {
        let target = self.jump_target(self.current.code.len())?;
        match self.current.code[at].opcode {
            Opcode::Jmp | Opcode::Jmpz | Opcode::Jmpnz => {
                self.current.code[at].op1 = target;
                Ok(())
            }
            _ => panic!("attempted to patch a non-jump instruction"),
        }
    }

    /// Backward jump to a known offset.
    pub(crate) fn emit_loop(&mut self, start: usize) -> Result<(), String> {
        let target = self.jump_target(start)?;
        self.emit_op1(Opcode::Jmp, target);
        Ok(())
    }

    fn jump_target(&self, offset: usize) -> Result<u16, String> {
        u16::try_from(offset).map_err(|_| {
            format!(
                "Function '{}' is too large (jump target out of range)",
                self.current.name
            )
        })
    }

    pub(crate) fn current_offset(&self) -> usize {
        self.current.code.len()
    }

    // ==================== Symbols, constants, functions ====================

    /// Intern a constant by structural equality.
    pub(crate) fn add_constant(&mut self, value: Value) -> Result<u16, String> {
        if let Some(index) = self.constants.iter().position(|c| *c == value) {
            return Ok(index as u16);
        }
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(format!("Too many constants (max {})", MAX_CONSTANTS));
        }
        self.constants.push(value);
        Ok((self.constants.len() - 1) as u16)
    }

    /// Push a literal through the constant pool.
    pub(crate) fn emit_literal(&mut self, value: Value) -> Result<(), String> {
        let index = self.add_constant(value)?;
        self.emit_op1(Opcode::Const, index);
        Ok(())
    }

    /// Slot for a declared local, allocating on first sight.
    pub(crate) fn allocate_local(&mut self, name: &str) -> Result<u16, String> {
        if let Some(&slot) = self.current.locals.get(name) {
            return Ok(slot);
        }
        if self.current.next_local as usize >= MAX_LOCALS {
            return Err(format!(
                "Too many locals in function '{}' (max {})",
                self.current.name, MAX_LOCALS
            ));
        }
        let slot = self.current.next_local;
        self.current.locals.insert(name.to_string(), slot);
        self.current.next_local += 1;
        Ok(slot)
    }

    /// A compiler-generated local invisible to the program.
    pub(crate) fn hidden_local(&mut self, tag: &str) -> Result<u16, String> {
        let name = format!("__{}_{}", tag, self.current.hidden);
        self.current.hidden += 1;
        self.allocate_local(&name)
    }

    /// Resolve a free name: current function's locals first, then the
    /// global table, allocating a global slot on first use.
    pub(crate) fn resolve(&mut self, name: &str) -> Result<Slot, String> {
        if let Some(&slot) = self.current.locals.get(name) {
            return Ok(Slot::Local(slot));
        }
        if let Some(&slot) = self.globals.get(name) {
            return Ok(Slot::Global(slot));
        }
        if self.globals.len() >= GLOBAL_SLOTS {
            return Err(format!("Too many globals (max {})", GLOBAL_SLOTS));
        }
        let slot = self.globals.len() as u16;
        self.globals.insert(name.to_string(), slot);
        Ok(Slot::Global(slot))
    }

    pub(crate) fn check_not_const(&self, name: &str) -> Result<(), String> {
        if self.current.const_names.contains(name) {
            Err(format!("Cannot assign to constant '{}'", name))
        } else {
            Ok(())
        }
    }

    fn push_function(&mut self, builder: FunctionBuilder) -> Result<(), String> {
        if self.functions.len() >= MAX_FUNCTIONS {
            return Err(format!("Too many functions (max {})", MAX_FUNCTIONS));
        }
        self.functions.push(builder.finish());
        Ok(())
    }

    pub(crate) fn compile_function_def(
        &mut self,
        name: &str,
        params: &[String],
        body: &[crate::ast::Stmt],
    ) -> Result<(), String> {
        if self.in_function {
            return Err("Nested function definitions are not supported".to_string());
        }
        if name == "main" {
            return Err("Function name 'main' is reserved".to_string());
        }
        if self.functions.iter().any(|f| f.name == name) {
            return Err(format!("Duplicate function name '{}'", name));
        }

        let saved = std::mem::replace(&mut self.current, FunctionBuilder::new(name.to_string()));
        self.in_function = true;

        for param in params {
            if self.current.locals.contains_key(param) {
                return Err(format!(
                    "Duplicate parameter '{}' in function '{}'",
                    param, name
                ));
            }
            self.allocate_local(param)?;
        }
        self.current.param_count = params.len() as u16;

        for stmt in body {
            self.compile_stmt(stmt)?;
        }

        // Implicit bare return at the end of every function body
        let null_index = self.add_constant(Value::Null)?;
        self.emit_op1(Opcode::Const, null_index);
        self.emit(Opcode::Return);

        self.in_function = false;
        let built = std::mem::replace(&mut self.current, saved);
        self.push_function(built)
    }
}
