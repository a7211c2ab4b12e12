use std::io::Write;

use super::super::{Vm, VmError};
use crate::runtime::Value;

pub fn execute_new_array<W: Write>(vm: &mut Vm<W>, capacity: u16) -> Result<(), VmError> {
    vm.push(Value::array(capacity as usize));
    Ok(())
}

fn index_of(value: &Value) -> Result<i64, VmError> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(VmError::Type(format!(
            "Array index must be an integer, {} given",
            other.type_name()
        ))),
    }
}

pub fn execute_array_get<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let index = index_of(&vm.pop()?)?;
    let array = vm.pop()?;
    match array {
        Value::Array(items) => {
            if index < 0 || index as usize >= items.len() {
                return Err(VmError::IndexOutOfBounds {
                    index,
                    size: items.len(),
                });
            }
            vm.push(items[index as usize].clone());
            Ok(())
        }
        other => Err(VmError::Type(format!(
            "{} is not an array",
            other.type_name()
        ))),
    }
}

/// Pops value, index, array and pushes the updated array; `index == size`
/// appends, which is how array literals grow at runtime.
pub fn execute_array_set<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let value = vm.pop()?;
    let index = index_of(&vm.pop()?)?;
    let array = vm.pop()?;
    match array {
        Value::Array(mut items) => {
            if index < 0 || index as usize > items.len() {
                return Err(VmError::IndexOutOfBounds {
                    index,
                    size: items.len(),
                });
            }
            if index as usize == items.len() {
                items.push(value);
            } else {
                items[index as usize] = value;
            }
            vm.push(Value::Array(items));
            Ok(())
        }
        other => Err(VmError::Type(format!(
            "{} is not an array",
            other.type_name()
        ))),
    }
}
