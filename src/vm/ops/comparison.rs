use std::cmp::Ordering;
use std::io::Write;

use super::super::{Vm, VmError};
use crate::runtime::value::{self, Value};

pub fn execute_eq<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let right = vm.pop()?;
    let left = vm.pop()?;
    vm.push(Value::Bool(left == right));
    Ok(())
}

pub fn execute_neq<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let right = vm.pop()?;
    let left = vm.pop()?;
    vm.push(Value::Bool(left != right));
    Ok(())
}

fn execute_ordering<W: Write>(
    vm: &mut Vm<W>,
    accept: fn(Ordering) -> bool,
) -> Result<(), VmError> {
    let right = vm.pop()?;
    let left = vm.pop()?;
    let ordering = value::compare(&left, &right).map_err(VmError::Type)?;
    vm.push(Value::Bool(accept(ordering)));
    Ok(())
}

pub fn execute_lt<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    execute_ordering(vm, Ordering::is_lt)
}

pub fn execute_lte<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    execute_ordering(vm, Ordering::is_le)
}

pub fn execute_gt<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    execute_ordering(vm, Ordering::is_gt)
}

pub fn execute_gte<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    execute_ordering(vm, Ordering::is_ge)
}

pub fn execute_and<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let right = vm.pop()?;
    let left = vm.pop()?;
    vm.push(Value::Bool(left.truthy() && right.truthy()));
    Ok(())
}

pub fn execute_or<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let right = vm.pop()?;
    let left = vm.pop()?;
    vm.push(Value::Bool(left.truthy() || right.truthy()));
    Ok(())
}

pub fn execute_not<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let value = vm.pop()?;
    vm.push(Value::Bool(!value.truthy()));
    Ok(())
}
