//! The fetch/decode/execute loop

use std::io::Write;
use std::sync::atomic::Ordering;

use super::{Vm, VmError};
use crate::runtime::Value;
use crate::vm::frame::CallFrame;

/// Run the loaded module from its entry function. The loop continues while
/// the running flag is set; RETURN from the top frame clears it and leaves
/// the final value in `vm.result`.
pub fn run<W: Write>(vm: &mut Vm<W>) -> Result<Value, VmError> {
    let (main_index, local_count) = {
        let module = vm.module.as_ref().ok_or(VmError::NoModule)?;
        let index = module.main_offset as usize;
        let main = module
            .functions
            .get(index)
            .ok_or(VmError::InvalidFunction(index))?;
        (index, main.local_count as usize)
    };

    // Each run starts from a clean activation of the entry function.
    vm.stack.clear();
    vm.frames.clear();
    vm.result = None;
    vm.frames.push(CallFrame::new(main_index, local_count));
    vm.running = true;

    while vm.running {
        if vm.cancel.load(Ordering::Relaxed) {
            return Err(VmError::Cancelled);
        }

        // Fetch; running off the end of a function is an implicit bare return.
        let instruction = {
            let frame = vm.current_frame()?;
            let function = vm.function(frame.function)?;
            function.code.get(frame.ip).copied()
        };

        match instruction {
            Some(instruction) => {
                vm.current_frame_mut()?.ip += 1;
                vm.execute_instruction(instruction)?;
            }
            None => {
                vm.frames.pop();
                if vm.frames.is_empty() {
                    vm.running = false;
                    vm.result = Some(Value::Null);
                } else {
                    vm.stack.push(Value::Null);
                }
            }
        }
    }

    Ok(vm.result.take().unwrap_or(Value::Null))
}
