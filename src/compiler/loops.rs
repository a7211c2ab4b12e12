use super::Compiler;
use crate::ast::{Expr, Stmt};
use crate::bytecode::Opcode;
use crate::runtime::Value;

impl Compiler {
    pub(crate) fn compile_while(&mut self, condition: &Expr, body: &[Stmt]) -> Result<(), String> {
        let loop_start = self.current_offset();

        self.compile_expr(condition)?;
        let exit_jump = self.emit_jump(Opcode::Jmpz);

        for stmt in body {
            self.compile_stmt(stmt)?;
        }

        self.emit_loop(loop_start)?;
        self.patch_jump(exit_jump)
    }

    /// `for (init; cond; update) body` runs as `init; while (cond) { body; update; }`.
    pub(crate) fn compile_for(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: Option<&Expr>,
        body: &[Stmt],
    ) -> Result<(), String> {
        if let Some(init) = init {
            self.compile_stmt(init)?;
        }

        let loop_start = self.current_offset();

        let exit_jump = match condition {
            Some(condition) => {
                self.compile_expr(condition)?;
                Some(self.emit_jump(Opcode::Jmpz))
            }
            None => None,
        };

        for stmt in body {
            self.compile_stmt(stmt)?;
        }

        if let Some(update) = update {
            self.compile_expr(update)?;
            self.emit(Opcode::Pop);
        }

        self.emit_loop(loop_start)?;
        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump)?;
        }
        Ok(())
    }

    /// foreach lowers to an index loop over hidden locals:
    /// the array is copied into a cursor slot, then visited in order while
    /// the index stays below `count(array)`.
    pub(crate) fn compile_foreach(
        &mut self,
        array: &Expr,
        value: &str,
        body: &[Stmt],
    ) -> Result<(), String> {
        self.compile_expr(array)?;
        let array_slot = self.hidden_local("foreach_arr")?;
        self.emit_op1(Opcode::SetLocal, array_slot);

        let index_slot = self.hidden_local("foreach_idx")?;
        self.emit_literal(Value::Integer(0))?;
        self.emit_op1(Opcode::SetLocal, index_slot);

        self.check_not_const(value)?;
        let value_slot = self.allocate_local(value)?;

        let loop_start = self.current_offset();

        // index < count(array)
        self.emit_op1(Opcode::GetLocal, index_slot);
        self.emit_op1(Opcode::GetLocal, array_slot);
        let count_index = self.add_constant(Value::String("count".to_string()))?;
        self.emit_op2(Opcode::Call, count_index, 1);
        self.emit(Opcode::Lt);
        let exit_jump = self.emit_jump(Opcode::Jmpz);

        self.emit_op1(Opcode::GetLocal, array_slot);
        self.emit_op1(Opcode::GetLocal, index_slot);
        self.emit(Opcode::ArrayGet);
        self.emit_op1(Opcode::SetLocal, value_slot);

        for stmt in body {
            self.compile_stmt(stmt)?;
        }

        self.emit_op1(Opcode::Inc, index_slot);
        self.emit_loop(loop_start)?;
        self.patch_jump(exit_jump)
    }
}
