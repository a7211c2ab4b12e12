use std::io::Write;

use super::super::{Vm, VmError};
use crate::bytecode::Opcode;
use crate::runtime::value::{Number, Value};

/// The five arithmetic operations, shared by the plain, compound-assignment
/// and increment/decrement opcodes.
#[derive(Debug, Clone, Copy)]
enum ArithKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithKind {
    fn of(opcode: Opcode) -> Option<ArithKind> {
        match opcode {
            Opcode::Add | Opcode::AssignAdd => Some(ArithKind::Add),
            Opcode::Sub | Opcode::AssignSub => Some(ArithKind::Sub),
            Opcode::Mul | Opcode::AssignMul => Some(ArithKind::Mul),
            Opcode::Div | Opcode::AssignDiv => Some(ArithKind::Div),
            Opcode::Mod | Opcode::AssignMod => Some(ArithKind::Mod),
            _ => None,
        }
    }
}

/// Numeric coercion: Integer op Integer stays Integer (two's-complement
/// wrap-around), anything involving a Float widens to Float, numeric
/// strings coerce through the cast rules.
fn apply(kind: ArithKind, a: &Value, b: &Value) -> Result<Value, VmError> {
    let x = a.as_number().map_err(VmError::Type)?;
    let y = b.as_number().map_err(VmError::Type)?;

    match (x, y) {
        (Number::Int(i), Number::Int(j)) => {
            let value = match kind {
                ArithKind::Add => i.wrapping_add(j),
                ArithKind::Sub => i.wrapping_sub(j),
                ArithKind::Mul => i.wrapping_mul(j),
                ArithKind::Div => {
                    if j == 0 {
                        return Err(VmError::DivisionByZero);
                    }
                    i.wrapping_div(j)
                }
                ArithKind::Mod => {
                    if j == 0 {
                        return Err(VmError::DivisionByZero);
                    }
                    i.wrapping_rem(j)
                }
            };
            Ok(Value::Integer(value))
        }
        _ => {
            let i = widen(x);
            let j = widen(y);
            let value = match kind {
                ArithKind::Add => i + j,
                ArithKind::Sub => i - j,
                ArithKind::Mul => i * j,
                ArithKind::Div => {
                    if j == 0.0 {
                        return Err(VmError::DivisionByZero);
                    }
                    i / j
                }
                ArithKind::Mod => {
                    if j == 0.0 {
                        return Err(VmError::DivisionByZero);
                    }
                    i % j
                }
            };
            Ok(Value::Float(value))
        }
    }
}

fn widen(n: Number) -> f64 {
    match n {
        Number::Int(i) => i as f64,
        Number::Float(f) => f,
    }
}

fn execute_binary<W: Write>(vm: &mut Vm<W>, kind: ArithKind) -> Result<(), VmError> {
    let right = vm.pop()?;
    let left = vm.pop()?;
    let result = apply(kind, &left, &right)?;
    vm.push(result);
    Ok(())
}

pub fn execute_add<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    execute_binary(vm, ArithKind::Add)
}

pub fn execute_sub<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    execute_binary(vm, ArithKind::Sub)
}

pub fn execute_mul<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    execute_binary(vm, ArithKind::Mul)
}

pub fn execute_div<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    execute_binary(vm, ArithKind::Div)
}

pub fn execute_mod<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    execute_binary(vm, ArithKind::Mod)
}

/// locals[slot] = locals[slot] <op> pop()
pub fn execute_assign_op<W: Write>(
    vm: &mut Vm<W>,
    opcode: Opcode,
    slot: u16,
) -> Result<(), VmError> {
    let kind = ArithKind::of(opcode)
        .ok_or_else(|| VmError::Type(format!("{:?} is not a compound assignment", opcode)))?;
    let value = vm.pop()?;
    let frame = vm.current_frame_mut()?;
    let current = frame
        .locals
        .get(slot as usize)
        .cloned()
        .ok_or(VmError::BadLocal(slot))?;
    let result = apply(kind, &current, &value)?;
    vm.current_frame_mut()?.locals[slot as usize] = result;
    Ok(())
}

fn step_local<W: Write>(vm: &mut Vm<W>, kind: ArithKind, slot: u16) -> Result<(), VmError> {
    let frame = vm.current_frame_mut()?;
    let current = frame
        .locals
        .get(slot as usize)
        .cloned()
        .ok_or(VmError::BadLocal(slot))?;
    let result = apply(kind, &current, &Value::Integer(1))?;
    vm.current_frame_mut()?.locals[slot as usize] = result;
    Ok(())
}

pub fn execute_inc<W: Write>(vm: &mut Vm<W>, slot: u16) -> Result<(), VmError> {
    step_local(vm, ArithKind::Add, slot)
}

pub fn execute_dec<W: Write>(vm: &mut Vm<W>, slot: u16) -> Result<(), VmError> {
    step_local(vm, ArithKind::Sub, slot)
}
