use super::Compiler;
use crate::ast::Stmt;
use crate::bytecode::Opcode;
use crate::runtime::Value;

impl Compiler {
    pub(crate) fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), String> {
        match stmt {
            Stmt::Expression(expr) => {
                self.compile_expr(expr)?;
                self.emit(Opcode::Pop);
            }

            // echo is sugar for the print builtin
            Stmt::Echo(exprs) => {
                for expr in exprs {
                    self.compile_expr(expr)?;
                }
                let print_index = self.add_constant(Value::String("print".to_string()))?;
                self.emit_op2(Opcode::Call, print_index, exprs.len() as u16);
                self.emit(Opcode::Pop);
            }

            Stmt::VarDecl {
                name,
                init,
                is_const,
            } => {
                self.check_not_const(name)?;
                let slot = self.allocate_local(name)?;
                match init {
                    Some(expr) => self.compile_expr(expr)?,
                    None => self.emit_literal(Value::Null)?,
                }
                self.emit_op1(Opcode::SetLocal, slot);
                if *is_const {
                    self.current.const_names.insert(name.clone());
                }
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.compile_expr(condition)?;
                let skip_then = self.emit_jump(Opcode::Jmpz);
                for stmt in then_branch {
                    self.compile_stmt(stmt)?;
                }
                match else_branch {
                    Some(else_branch) => {
                        let skip_else = self.emit_jump(Opcode::Jmp);
                        self.patch_jump(skip_then)?;
                        for stmt in else_branch {
                            self.compile_stmt(stmt)?;
                        }
                        self.patch_jump(skip_else)?;
                    }
                    None => self.patch_jump(skip_then)?,
                }
            }

            Stmt::While { condition, body } => self.compile_while(condition, body)?,
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => self.compile_for(init.as_deref(), condition.as_ref(), update.as_ref(), body)?,
            Stmt::Foreach { array, value, body } => self.compile_foreach(array, value, body)?,

            Stmt::Function { name, params, body } => {
                self.compile_function_def(name, params, body)?;
            }

            Stmt::Return(expr) => {
                match expr {
                    Some(expr) => self.compile_expr(expr)?,
                    None => self.emit_literal(Value::Null)?,
                }
                self.emit(Opcode::Return);
            }

            Stmt::Block(statements) => {
                for stmt in statements {
                    self.compile_stmt(stmt)?;
                }
            }
        }
        Ok(())
    }
}
