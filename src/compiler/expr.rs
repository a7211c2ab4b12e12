use super::{Compiler, Slot};
use crate::ast::{AssignOp, AssignTarget, BinaryOp, Expr, UnaryOp};
use crate::bytecode::Opcode;
use crate::runtime::Value;

/// A literal expression foldable into one constant-pool entry. Negated
/// numeric literals and arrays of literals fold too.
fn literal_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Integer(n) => Some(Value::Integer(*n)),
        Expr::Float(f) => Some(Value::Float(*f)),
        Expr::String(s) => Some(Value::String(s.clone())),
        Expr::Bool(b) => Some(Value::Bool(*b)),
        Expr::Null => Some(Value::Null),
        Expr::ArrayLiteral(elements) => elements
            .iter()
            .map(literal_value)
            .collect::<Option<Vec<Value>>>()
            .map(Value::Array),
        Expr::Unary {
            op: UnaryOp::Neg,
            expr,
        } => match literal_value(expr)? {
            Value::Integer(n) => Some(Value::Integer(n.wrapping_neg())),
            Value::Float(f) => Some(Value::Float(-f)),
            _ => None,
        },
        _ => None,
    }
}

impl Compiler {
    pub(crate) fn compile_expr(&mut self, expr: &Expr) -> Result<(), String> {
        match expr {
            Expr::Integer(n) => self.emit_literal(Value::Integer(*n)),
            Expr::Float(f) => self.emit_literal(Value::Float(*f)),
            Expr::String(s) => self.emit_literal(Value::String(s.clone())),
            Expr::Bool(b) => self.emit_literal(Value::Bool(*b)),
            Expr::Null => self.emit_literal(Value::Null),

            Expr::ArrayLiteral(elements) => self.compile_array_literal(expr, elements),

            Expr::Variable(name) => {
                let slot = self.resolve(name)?;
                self.emit_get(slot);
                Ok(())
            }

            Expr::Binary { left, op, right } => self.compile_binary(left, *op, right),
            Expr::Unary { op, expr } => self.compile_unary(*op, expr),
            Expr::Assign { target, op, value } => self.compile_assign(target, *op, value),

            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                self.compile_expr(condition)?;
                let skip_then = self.emit_jump(Opcode::Jmpz);
                self.compile_expr(then_expr)?;
                let skip_else = self.emit_jump(Opcode::Jmp);
                self.patch_jump(skip_then)?;
                self.compile_expr(else_expr)?;
                self.patch_jump(skip_else)
            }

            Expr::Index { array, index } => {
                self.compile_expr(array)?;
                self.compile_expr(index)?;
                self.emit(Opcode::ArrayGet);
                Ok(())
            }

            Expr::FunctionCall { name, args } => {
                for arg in args {
                    self.compile_expr(arg)?;
                }
                let name_index = self.add_constant(Value::String(name.clone()))?;
                self.emit_op2(Opcode::Call, name_index, args.len() as u16);
                Ok(())
            }
        }
    }

    /// Arrays of literals become one pooled constant; anything else builds
    /// at runtime with NEW_ARRAY and per-element ARRAY_SET appends.
    fn compile_array_literal(&mut self, whole: &Expr, elements: &[Expr]) -> Result<(), String> {
        if let Some(value) = literal_value(whole) {
            return self.emit_literal(value);
        }

        if elements.len() > u16::MAX as usize {
            return Err("Array literal too large".to_string());
        }
        self.emit_op1(Opcode::NewArray, elements.len() as u16);
        for (index, element) in elements.iter().enumerate() {
            self.emit_literal(Value::Integer(index as i64))?;
            self.compile_expr(element)?;
            self.emit(Opcode::ArraySet);
        }
        Ok(())
    }

    fn compile_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<(), String> {
        match op {
            BinaryOp::And => return self.compile_and(left, right),
            BinaryOp::Or => return self.compile_or(left, right),
            _ => {}
        }

        self.compile_expr(left)?;
        self.compile_expr(right)?;
        let opcode = match op {
            BinaryOp::Add => Opcode::Add,
            BinaryOp::Sub => Opcode::Sub,
            BinaryOp::Mul => Opcode::Mul,
            BinaryOp::Div => Opcode::Div,
            BinaryOp::Mod => Opcode::Mod,
            BinaryOp::Concat => Opcode::StringConcat,
            BinaryOp::Equal => Opcode::Eq,
            BinaryOp::NotEqual => Opcode::Neq,
            BinaryOp::LessThan => Opcode::Lt,
            BinaryOp::LessEqual => Opcode::Lte,
            BinaryOp::GreaterThan => Opcode::Gt,
            BinaryOp::GreaterEqual => Opcode::Gte,
            BinaryOp::And | BinaryOp::Or => {
                return Err("Logical operators compile to jumps".to_string())
            }
        };
        self.emit(opcode);
        Ok(())
    }

    /// `a && b`: if a is falsy the result is false without evaluating b;
    /// otherwise the result is b's truthiness as a Bool.
    fn compile_and(&mut self, left: &Expr, right: &Expr) -> Result<(), String> {
        self.compile_expr(left)?;
        let short = self.emit_jump(Opcode::Jmpz);
        self.compile_expr(right)?;
        self.emit(Opcode::CastBool);
        let done = self.emit_jump(Opcode::Jmp);
        self.patch_jump(short)?;
        self.emit_literal(Value::Bool(false))?;
        self.patch_jump(done)
    }

    fn compile_or(&mut self, left: &Expr, right: &Expr) -> Result<(), String> {
        self.compile_expr(left)?;
        let short = self.emit_jump(Opcode::Jmpnz);
        self.compile_expr(right)?;
        self.emit(Opcode::CastBool);
        let done = self.emit_jump(Opcode::Jmp);
        self.patch_jump(short)?;
        self.emit_literal(Value::Bool(true))?;
        self.patch_jump(done)
    }

    fn compile_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<(), String> {
        match op {
            UnaryOp::Neg => {
                // Fold negated numeric literals straight into the pool
                match literal_value(operand) {
                    Some(Value::Integer(n)) => {
                        return self.emit_literal(Value::Integer(n.wrapping_neg()))
                    }
                    Some(Value::Float(f)) => return self.emit_literal(Value::Float(-f)),
                    _ => {}
                }
                self.emit_literal(Value::Integer(0))?;
                self.compile_expr(operand)?;
                self.emit(Opcode::Sub);
                Ok(())
            }
            UnaryOp::Not => {
                self.compile_expr(operand)?;
                self.emit(Opcode::Not);
                Ok(())
            }
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                let name = match operand {
                    Expr::Variable(name) => name,
                    _ => return Err("'++'/'--' needs a variable".to_string()),
                };
                self.check_not_const(name)?;
                self.compile_step(op, name)
            }
        }
    }

    /// Increment/decrement with the correct old/new expression value.
    fn compile_step(&mut self, op: UnaryOp, name: &str) -> Result<(), String> {
        let slot = self.resolve(name)?;
        match slot {
            Slot::Local(local) => match op {
                UnaryOp::PreInc => {
                    self.emit_op1(Opcode::Inc, local);
                    self.emit_op1(Opcode::GetLocal, local);
                }
                UnaryOp::PreDec => {
                    self.emit_op1(Opcode::Dec, local);
                    self.emit_op1(Opcode::GetLocal, local);
                }
                UnaryOp::PostInc => {
                    self.emit_op1(Opcode::GetLocal, local);
                    self.emit_op1(Opcode::Inc, local);
                }
                UnaryOp::PostDec => {
                    self.emit_op1(Opcode::GetLocal, local);
                    self.emit_op1(Opcode::Dec, local);
                }
                _ => return Err("'++'/'--' needs a variable".to_string()),
            },
            Slot::Global(_) => {
                let step = if matches!(op, UnaryOp::PreInc | UnaryOp::PostInc) {
                    Opcode::Add
                } else {
                    Opcode::Sub
                };
                self.emit_get(slot);
                if matches!(op, UnaryOp::PostInc | UnaryOp::PostDec) {
                    // Old value stays as the expression result
                    self.emit(Opcode::Dup);
                    self.emit_literal(Value::Integer(1))?;
                    self.emit(step);
                    self.emit_set(slot);
                } else {
                    self.emit_literal(Value::Integer(1))?;
                    self.emit(step);
                    self.emit(Opcode::Dup);
                    self.emit_set(slot);
                }
            }
        }
        Ok(())
    }

    fn compile_assign(
        &mut self,
        target: &AssignTarget,
        op: AssignOp,
        value: &Expr,
    ) -> Result<(), String> {
        match target {
            AssignTarget::Name(name) => {
                self.check_not_const(name)?;
                let slot = self.resolve(name)?;
                match (compound_opcodes(op), slot) {
                    (None, slot) => {
                        self.compile_expr(value)?;
                        self.emit(Opcode::Dup);
                        self.emit_set(slot);
                    }
                    (Some((assign_opcode, _)), Slot::Local(local)) => {
                        self.compile_expr(value)?;
                        self.emit_op1(assign_opcode, local);
                        self.emit_op1(Opcode::GetLocal, local);
                    }
                    (Some((_, plain_opcode)), Slot::Global(_)) => {
                        self.emit_get(slot);
                        self.compile_expr(value)?;
                        self.emit(plain_opcode);
                        self.emit(Opcode::Dup);
                        self.emit_set(slot);
                    }
                }
                Ok(())
            }

            AssignTarget::Index { name, index } => {
                self.check_not_const(name)?;
                let slot = self.resolve(name)?;
                match compound_opcodes(op) {
                    None => {
                        // The stored value doubles as the expression result,
                        // so park it in a temp while the array is rebuilt.
                        self.compile_expr(value)?;
                        let temp = self.hidden_local("store_val")?;
                        self.emit_op1(Opcode::SetLocal, temp);

                        self.emit_get(slot);
                        self.compile_expr(index)?;
                        self.emit_op1(Opcode::GetLocal, temp);
                        self.emit(Opcode::ArraySet);
                        self.emit_set(slot);

                        self.emit_op1(Opcode::GetLocal, temp);
                    }
                    Some((_, plain_opcode)) => {
                        // Evaluate the index once for both the read and the
                        // write-back.
                        self.compile_expr(index)?;
                        let temp_index = self.hidden_local("store_idx")?;
                        self.emit_op1(Opcode::SetLocal, temp_index);

                        self.emit_get(slot);
                        self.emit_op1(Opcode::GetLocal, temp_index);
                        self.emit(Opcode::ArrayGet);
                        self.compile_expr(value)?;
                        self.emit(plain_opcode);
                        let temp_value = self.hidden_local("store_val")?;
                        self.emit_op1(Opcode::SetLocal, temp_value);

                        self.emit_get(slot);
                        self.emit_op1(Opcode::GetLocal, temp_index);
                        self.emit_op1(Opcode::GetLocal, temp_value);
                        self.emit(Opcode::ArraySet);
                        self.emit_set(slot);

                        self.emit_op1(Opcode::GetLocal, temp_value);
                    }
                }
                Ok(())
            }
        }
    }

    fn emit_get(&mut self, slot: Slot) {
        match slot {
            Slot::Local(local) => self.emit_op1(Opcode::GetLocal, local),
            Slot::Global(global) => self.emit_op1(Opcode::GetGlobal, global),
        };
    }

    fn emit_set(&mut self, slot: Slot) {
        match slot {
            Slot::Local(local) => self.emit_op1(Opcode::SetLocal, local),
            Slot::Global(global) => self.emit_op1(Opcode::SetGlobal, global),
        };
    }
}

/// For a compound assignment: the in-place opcode usable on locals, and the
/// plain binary opcode for the load/op/store path.
fn compound_opcodes(op: AssignOp) -> Option<(Opcode, Opcode)> {
    match op {
        AssignOp::Assign => None,
        AssignOp::AddAssign => Some((Opcode::AssignAdd, Opcode::Add)),
        AssignOp::SubAssign => Some((Opcode::AssignSub, Opcode::Sub)),
        AssignOp::MulAssign => Some((Opcode::AssignMul, Opcode::Mul)),
        AssignOp::DivAssign => Some((Opcode::AssignDiv, Opcode::Div)),
        AssignOp::ModAssign => Some((Opcode::AssignMod, Opcode::Mod)),
    }
}
