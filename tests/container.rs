//! Byte-exact MBC container tests: golden layout, writer/loader round-trip
//! and framing-error behavior.

use microphp::bytecode::{loader, Function, Instruction, LoadError, Module, Opcode};
use microphp::runtime::Value;

fn u32le(value: u32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

#[test]
fn golden_layout() {
    let module = Module {
        constants: vec![Value::Integer(3)],
        functions: vec![Function {
            name: "main".to_string(),
            code: vec![Instruction::op1(Opcode::Const, 0), Instruction::op(Opcode::Return)],
            local_count: 0,
            param_count: 0,
        }],
        main_offset: 0,
    };

    let mut expected = Vec::new();
    expected.extend_from_slice(b"MBC\0");
    expected.extend(u32le(1)); // version
    expected.extend(u32le(1)); // constant count
    expected.push(2); // int tag
    expected.extend(3i64.to_le_bytes());
    expected.extend(u32le(1)); // function count
    expected.extend(u32le(4));
    expected.extend_from_slice(b"main");
    expected.extend(u32le(0)); // local_count
    expected.extend(u32le(0)); // param_count
    expected.extend(u32le(2)); // code_size
    expected.extend_from_slice(&[1, 0, 0, 0, 0, 0]); // CONST 0
    expected.extend_from_slice(&[27, 0, 0, 0, 0, 0]); // RETURN
    expected.extend(u32le(0)); // main_offset

    assert_eq!(module.to_bytes(), expected);
    // And the loader agrees with the layout, independent of the writer
    assert_eq!(loader::parse(&expected).expect("load failed"), module);
}

#[test]
fn round_trip_covers_every_constant_kind() {
    let module = Module {
        constants: vec![
            Value::Null,
            Value::Bool(false),
            Value::Bool(true),
            Value::Integer(i64::MIN),
            Value::Integer(i64::MAX),
            Value::Float(-0.0),
            Value::Float(1.0e300),
            Value::String(String::new()),
            Value::String("with \0 interior nul and unicode: ¤".to_string()),
            Value::Array(vec![
                Value::Integer(1),
                Value::Array(vec![Value::String("nested".to_string())]),
                Value::Null,
            ]),
        ],
        functions: vec![
            Function {
                name: "main".to_string(),
                code: vec![
                    Instruction::op1(Opcode::Const, 9),
                    Instruction::new(Opcode::Call, 8, 1),
                    Instruction::op(Opcode::Pop),
                    Instruction::op1(Opcode::Const, 0),
                    Instruction::op(Opcode::Return),
                ],
                local_count: 2,
                param_count: 0,
            },
            Function {
                name: "helper".to_string(),
                code: vec![
                    Instruction::op1(Opcode::GetLocal, 0),
                    Instruction::op(Opcode::Return),
                ],
                local_count: 1,
                param_count: 1,
            },
        ],
        main_offset: 0,
    };

    let bytes = module.to_bytes();
    let loaded = loader::parse(&bytes).expect("load failed");
    assert_eq!(loaded, module);
    // Serialization is deterministic
    assert_eq!(loaded.to_bytes(), bytes);
}

#[test]
fn constant_count_limit() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MBC\0");
    bytes.extend(u32le(1));
    bytes.extend(u32le(1025));
    assert_eq!(loader::parse(&bytes), Err(LoadError::TooManyConstants(1025)));
}

#[test]
fn function_count_limit() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MBC\0");
    bytes.extend(u32le(1));
    bytes.extend(u32le(0)); // no constants
    bytes.extend(u32le(65));
    assert_eq!(loader::parse(&bytes), Err(LoadError::TooManyFunctions(65)));
}

#[test]
fn truncated_function_name() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MBC\0");
    bytes.extend(u32le(1));
    bytes.extend(u32le(0));
    bytes.extend(u32le(1));
    bytes.extend(u32le(10)); // claims a 10-byte name
    bytes.extend_from_slice(b"abc");
    assert_eq!(
        loader::parse(&bytes),
        Err(LoadError::Truncated("function name"))
    );
}

#[test]
fn invalid_constant_tag() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MBC\0");
    bytes.extend(u32le(1));
    bytes.extend(u32le(1));
    bytes.push(9);
    assert_eq!(loader::parse(&bytes), Err(LoadError::InvalidConstantTag(9)));
}

#[test]
fn huge_claimed_code_size_is_rejected_without_allocating() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MBC\0");
    bytes.extend(u32le(1));
    bytes.extend(u32le(0));
    bytes.extend(u32le(1));
    bytes.extend(u32le(1));
    bytes.push(b'f');
    bytes.extend(u32le(0)); // local_count
    bytes.extend(u32le(0)); // param_count
    bytes.extend(u32le(u32::MAX)); // absurd code size
    assert_eq!(loader::parse(&bytes), Err(LoadError::Truncated("instruction")));
}

#[test]
fn version_two_is_unsupported() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MBC\0");
    bytes.extend(u32le(2));
    assert_eq!(loader::parse(&bytes), Err(LoadError::UnsupportedVersion(2)));
}
