use std::io::Write;

use super::super::{Vm, VmError};
use crate::runtime::value;

pub fn execute_concat<W: Write>(vm: &mut Vm<W>) -> Result<(), VmError> {
    let right = vm.pop()?;
    let left = vm.pop()?;
    let result = value::concat(&left, &right).map_err(VmError::Type)?;
    vm.push(result);
    Ok(())
}
