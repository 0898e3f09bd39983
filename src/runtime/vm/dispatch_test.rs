use serde_json::json;

use crate::{
    bytecode::{
        data_type::DataType,
        instruction::{Instruction, Operand, Partition, make},
        object_code::{ConstantData, ObjectCode},
        op_code::OpCode,
    },
    runtime::{
        container::Container,
        error::VmError,
        host::{FunctionTable, VariableTable},
        memory::{Memory, MemoryAccess},
        vm::Processor,
    },
};

const R0: Operand = Operand::register(0);
const R1: Operand = Operand::register(1);
const R2: Operand = Operand::register(2);
const N: Operand = Operand::NONE;

fn int(value: i64) -> ConstantData {
    ConstantData::new(DataType::Int64, json!(value))
}

fn memory_for(registers: usize, constants: Vec<ConstantData>) -> Memory {
    let object_code = ObjectCode {
        registers,
        constants,
        ..Default::default()
    };
    Memory::allocate(&object_code, &VariableTable::new()).unwrap()
}

fn run(instructions: &[Instruction], memory: &mut Memory) -> Result<Processor, VmError> {
    let mut processor = Processor::new();
    let mut calls = FunctionTable::with_builtins();
    processor.run(instructions, memory, &mut calls)?;
    Ok(processor)
}

#[test]
fn counting_loop_with_backward_jump() {
    // i = 1; acc = 0; do { acc += i; i += 1 } while i <= 5
    let mut memory = memory_for(3, vec![int(1), int(5), int(0), int(3)]);
    let program = vec![
        make(OpCode::OpFill, DataType::Int64, &[R0, Operand::constant(0)]),
        make(OpCode::OpFill, DataType::Int64, &[R1, Operand::constant(2)]),
        make(OpCode::OpAlloc, DataType::Bool, &[R2]),
        make(OpCode::OpLabel, DataType::Void, &[]),
        make(OpCode::OpAdd, DataType::Int64, &[R1, R1, R0]),
        make(OpCode::OpAdd, DataType::Int64, &[R0, R0, Operand::constant(0)]),
        make(OpCode::OpLeq, DataType::Int64, &[R2, R0, Operand::constant(1)]),
        make(OpCode::OpJmp, DataType::Void, &[N, Operand::constant(3), R2]),
    ];
    let processor = run(&program, &mut memory).unwrap();

    assert_eq!(memory.get(R1.partition, 1).unwrap().get::<i64>(0), Some(15));
    assert_eq!(memory.get(R0.partition, 0).unwrap().get::<i64>(0), Some(6));
    assert_eq!(processor.pc(), program.len());
    assert_eq!(processor.stats().executed_instructions, 3 + 5 * 5);
}

#[test]
fn jmpn_jumps_only_when_every_condition_is_false() {
    let program = vec![
        make(OpCode::OpJmpn, DataType::Void, &[N, Operand::constant(0), R0]),
        make(OpCode::OpFill, DataType::Int64, &[R1, Operand::constant(1)]),
    ];

    let mut memory = memory_for(2, vec![int(2), int(9)]);
    memory.set(R0.partition, 0, Container::vector(vec![false, false])).unwrap();
    run(&program, &mut memory).unwrap();
    assert!(!memory.get(R1.partition, 1).unwrap().is_allocated());

    let mut memory = memory_for(2, vec![int(2), int(9)]);
    memory.set(R0.partition, 0, Container::vector(vec![false, true])).unwrap();
    run(&program, &mut memory).unwrap();
    assert_eq!(memory.get(R1.partition, 1).unwrap().get::<i64>(0), Some(9));
}

#[test]
fn jump_target_past_the_end_is_rejected() {
    let mut memory = memory_for(1, vec![int(7)]);
    memory.set(R0.partition, 0, Container::scalar(true)).unwrap();
    let program = vec![make(OpCode::OpJmp, DataType::Void, &[N, Operand::constant(0), R0])];
    let err = run(&program, &mut memory).unwrap_err();
    assert_eq!(err, VmError::InvalidJumpTarget { target: 7, len: 1 });
}

#[test]
fn call_invokes_host_function_by_index() {
    let mut memory = memory_for(2, vec![int(3), ConstantData::new(DataType::Float64, json!([1.0, -2.5, 4.0]))]);
    let program = vec![make(
        OpCode::OpCall,
        DataType::Float64,
        &[R0, Operand::constant(0), Operand::constant(1)],
    )];
    run(&program, &mut memory).unwrap();
    assert_eq!(memory.get(R0.partition, 0).unwrap().get::<f64>(0), Some(2.5));
}

#[test]
fn call_to_missing_function_fails() {
    let mut memory = memory_for(1, vec![int(42)]);
    let program = vec![make(OpCode::OpCall, DataType::Void, &[R0, Operand::constant(0)])];
    assert_eq!(run(&program, &mut memory).unwrap_err(), VmError::UnknownFunction(42));
}

#[test]
fn end_stops_and_records_a_copy() {
    let mut memory = memory_for(1, vec![int(11), int(12)]);
    let program = vec![
        make(OpCode::OpFill, DataType::Int64, &[R0, Operand::constant(0)]),
        make(OpCode::OpEnd, DataType::Int64, &[N, R0]),
        make(OpCode::OpFill, DataType::Int64, &[R0, Operand::constant(1)]),
    ];
    let mut processor = run(&program, &mut memory).unwrap();
    assert_eq!(processor.pc(), program.len());
    assert_eq!(memory.get(R0.partition, 0).unwrap().get::<i64>(0), Some(11));

    let result = processor.take_result().unwrap();
    memory.get(R0.partition, 0).unwrap().set(0, 99i64).unwrap();
    assert_eq!(result.get::<i64>(0), Some(11));
}

#[test]
fn malformed_instructions_are_rejected() {
    let mut memory = memory_for(1, vec![int(1)]);

    let program = vec![make(OpCode::OpAdd, DataType::Int64, &[R0, Operand::constant(0)])];
    assert!(matches!(
        run(&program, &mut memory),
        Err(VmError::InvalidOperandCount { op: OpCode::OpAdd, found: 2, .. })
    ));

    let program = vec![make(OpCode::OpCast, DataType::Int64, &[R0, Operand::constant(0)])];
    assert!(matches!(
        run(&program, &mut memory),
        Err(VmError::InvalidDeclaredTypes { op: OpCode::OpCast, expected: 2, found: 1 })
    ));

    let program = vec![make(OpCode::OpMov, DataType::Int64, &[R0, Operand::register(9)])];
    assert_eq!(
        run(&program, &mut memory).unwrap_err(),
        VmError::MemoryAccessOutOfBounds {
            partition: Partition::Register,
            address: 9
        }
    );
}

#[test]
fn writes_through_none_are_discarded() {
    let mut memory = memory_for(0, vec![int(1)]);
    let program = vec![
        make(OpCode::OpFill, DataType::Int64, &[N, Operand::constant(0)]),
        make(OpCode::OpNop, DataType::Void, &[]),
    ];
    run(&program, &mut memory).unwrap();
    assert!(!memory.get_mut(Partition::None, 0).unwrap().is_allocated());
}

#[test]
fn step_reports_next_pc() {
    let mut memory = memory_for(1, vec![int(1)]);
    let program = vec![
        make(OpCode::OpNop, DataType::Void, &[]),
        make(OpCode::OpFill, DataType::Int64, &[R0, Operand::constant(0)]),
    ];
    let mut processor = Processor::new();
    let mut calls = FunctionTable::new();
    assert_eq!(processor.step(&program, &mut memory, &mut calls).unwrap(), 1);
    assert_eq!(processor.step(&program, &mut memory, &mut calls).unwrap(), 2);
    assert_eq!(processor.step(&program, &mut memory, &mut calls).unwrap(), 2);
    assert_eq!(processor.stats().executed_instructions, 2);
}
