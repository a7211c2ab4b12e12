use std::io::Write;

use super::super::{Vm, VmError, MAX_FRAMES};
use crate::runtime::Value;
use crate::vm::frame::CallFrame;

pub fn execute_jmp<W: Write>(vm: &mut Vm<W>, target: u16) -> Result<(), VmError> {
    vm.current_frame_mut()?.jump_to(target as usize);
    Ok(())
}

pub fn execute_jmpz<W: Write>(vm: &mut Vm<W>, target: u16) -> Result<(), VmError> {
    let value = vm.pop()?;
    if !value.truthy() {
        vm.current_frame_mut()?.jump_to(target as usize);
    }
    Ok(())
}

pub fn execute_jmpnz<W: Write>(vm: &mut Vm<W>, target: u16) -> Result<(), VmError> {
    let value = vm.pop()?;
    if value.truthy() {
        vm.current_frame_mut()?.jump_to(target as usize);
    }
    Ok(())
}

/// CALL name_const, arg_count: resolve the name against the module's
/// function table, then the builtin registry. User calls get a fresh frame
/// with the top `arg_count` values moved into the first local slots in
/// argument order; builtin calls run inline and push their result.
pub fn execute_call<W: Write>(vm: &mut Vm<W>, name_index: u16, arg_count: u16) -> Result<(), VmError> {
    let name = match vm.constant(name_index)? {
        Value::String(name) => name,
        other => {
            return Err(VmError::Type(format!(
                "CALL target must be a string constant, {} given",
                other.type_name()
            )))
        }
    };

    if let Some(function_index) = vm.find_function(&name) {
        let function = vm.function(function_index)?;
        let param_count = function.param_count;
        let local_count = function.local_count as usize;

        if arg_count != param_count {
            return Err(VmError::ArityMismatch {
                function: name,
                expected: param_count,
                given: arg_count,
            });
        }
        if vm.frames.len() >= MAX_FRAMES {
            return Err(VmError::StackOverflow);
        }

        // Top of stack is the last argument.
        let mut frame = CallFrame::new(function_index, local_count);
        for slot in (0..arg_count as usize).rev() {
            frame.locals[slot] = vm.pop()?;
        }
        vm.frames.push(frame);
        Ok(())
    } else if let Some(builtin) = vm.builtins.get(&name) {
        let mut args = Vec::with_capacity(arg_count as usize);
        for _ in 0..arg_count {
            args.push(vm.pop()?);
        }
        args.reverse();
        let result = builtin(&mut vm.output, &args).map_err(VmError::Builtin)?;
        vm.push(result);
        Ok(())
    } else {
        Err(VmError::UnknownFunction(name))
    }
}

/// Pop the return value (an empty stack means a bare return of Null), tear
/// down the frame, and hand the value to the caller; returning from the top
/// frame stops the VM and publishes the value as the run result.
pub fn execute_return<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let value = vm.stack.pop().unwrap_or(Value::Null);
    vm.frames.pop();
    if vm.frames.is_empty() {
        vm.running = false;
        vm.result = Some(value);
    } else {
        vm.push(value);
    }
    Ok(())
}
