use std::io::Write;

use super::super::{Vm, VmError};

pub fn execute_const<W: Write>(vm: &mut Vm<W>, index: u16) -> Result<(), VmError> {
    let value = vm.constant(index)?;
    vm.push(value);
    Ok(())
}

pub fn execute_pop<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    vm.pop()?;
    Ok(())
}

pub fn execute_dup<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let top = vm.stack.last().cloned().ok_or(VmError::StackUnderflow)?;
    vm.push(top);
    Ok(())
}

pub fn execute_swap<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let len = vm.stack.len();
    if len < 2 {
        return Err(VmError::StackUnderflow);
    }
    vm.stack.swap(len - 1, len - 2);
    Ok(())
}

pub fn execute_get_local<W: Write>(vm: &mut Vm<W>, slot: u16) -> Result<(), VmError> {
    let value = vm
        .current_frame()?
        .locals
        .get(slot as usize)
        .cloned()
        .ok_or(VmError::BadLocal(slot))?;
    vm.push(value);
    Ok(())
}

pub fn execute_set_local<W: Write>(vm: &mut Vm<W>, slot: u16) -> Result<(), VmError> {
    let value = vm.pop()?;
    let frame = vm.current_frame_mut()?;
    match frame.locals.get_mut(slot as usize) {
        Some(dest) => {
            *dest = value;
            Ok(())
        }
        None => Err(VmError::BadLocal(slot)),
    }
}

pub fn execute_get_global<W: Write>(vm: &mut Vm<W>, slot: u16) -> Result<(), VmError> {
    let value = vm
        .globals
        .get(slot as usize)
        .cloned()
        .ok_or(VmError::BadGlobal(slot))?;
    vm.push(value);
    Ok(())
}

pub fn execute_set_global<W: Write>(vm: &mut Vm<W>, slot: u16) -> Result<(), VmError> {
    let value = vm.pop()?;
    match vm.globals.get_mut(slot as usize) {
        Some(dest) => {
            *dest = value;
            Ok(())
        }
        None => Err(VmError::BadGlobal(slot)),
    }
}
