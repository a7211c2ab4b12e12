//! MBC container serialization
//!
//! Layout (everything little-endian):
//!
//! ```text
//! magic "MBC\0" | version u32 | constant_count u32 | constant entries
//! | function_count u32 | function entries | main_offset u32
//! ```
//!
//! Constant entry: 1-byte tag, then the payload (Bool: 1 byte; Int: i64;
//! Float: f64 bits; String: u32 length + bytes; Array: u32 size + entries).
//! Function entry: u32 name length + bytes, u32 local_count, u32
//! param_count, u32 code_size, then code_size x 6-byte instructions.

use super::{Instruction, Module, MAGIC, TAG_ARRAY, TAG_BOOL, TAG_FLOAT, TAG_INT, TAG_NULL, TAG_STRING, VERSION};
use crate::runtime::Value;

impl Module {
    /// Serialize to the on-disk MBC byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.extend_from_slice(&MAGIC);
        put_u32(&mut buf, VERSION);

        put_u32(&mut buf, self.constants.len() as u32);
        for constant in &self.constants {
            put_constant(&mut buf, constant);
        }

        put_u32(&mut buf, self.functions.len() as u32);
        for function in &self.functions {
            put_u32(&mut buf, function.name.len() as u32);
            buf.extend_from_slice(function.name.as_bytes());
            put_u32(&mut buf, function.local_count as u32);
            put_u32(&mut buf, function.param_count as u32);
            put_u32(&mut buf, function.code.len() as u32);
            for instruction in &function.code {
                put_instruction(&mut buf, instruction);
            }
        }

        put_u32(&mut buf, self.main_offset);
        buf
    }
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_instruction(buf: &mut Vec<u8>, instruction: &Instruction) {
    put_u16(buf, instruction.opcode.into());
    put_u16(buf, instruction.op1);
    put_u16(buf, instruction.op2);
}

fn put_constant(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.push(TAG_NULL),
        Value::Bool(b) => {
            buf.push(TAG_BOOL);
            buf.push(*b as u8);
        }
        Value::Integer(n) => {
            buf.push(TAG_INT);
            buf.extend_from_slice(&n.to_le_bytes());
        }
        Value::Float(f) => {
            buf.push(TAG_FLOAT);
            buf.extend_from_slice(&f.to_le_bytes());
        }
        Value::String(s) => {
            buf.push(TAG_STRING);
            put_u32(buf, s.len() as u32);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            buf.push(TAG_ARRAY);
            put_u32(buf, items.len() as u32);
            for item in items {
                put_constant(buf, item);
            }
        }
        // Reserved tags serialize as Null, matching their copy behavior
        Value::Object | Value::Closure | Value::Resource => buf.push(TAG_NULL),
    }
}
