use std::io::Write;

use super::super::{Vm, VmError};
use crate::runtime::Value;

pub fn execute_cast_int<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let value = vm.pop()?;
    let result = value.cast_int().map_err(VmError::Type)?;
    vm.push(Value::Integer(result));
    Ok(())
}

pub fn execute_cast_float<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let value = vm.pop()?;
    let result = value.cast_float().map_err(VmError::Type)?;
    vm.push(Value::Float(result));
    Ok(())
}

pub fn execute_cast_string<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let value = vm.pop()?;
    let result = value.cast_string().map_err(VmError::Type)?;
    vm.push(Value::String(result));
    Ok(())
}

pub fn execute_cast_bool<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let value = vm.pop()?;
    vm.push(Value::Bool(value.truthy()));
    Ok(())
}
