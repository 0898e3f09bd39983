use crate::{
    bytecode::{instruction::Instruction, op_code::OpCode},
    runtime::memory::MemoryAccess,
};

use super::Processor;

impl Processor {
    pub(super) fn trace_instruction<M: MemoryAccess + ?Sized>(
        &self,
        pc: usize,
        instruction: &Instruction,
        memory: &M,
    ) {
        let output = instruction
            .operands
            .first()
            .and_then(|operand| memory.get(operand.partition, operand.address).ok())
            .map(|container| container.to_string());
        tracing::trace!(
            target: "vecscript::vm",
            "{}",
            format_trace_line(pc, instruction, output.as_deref())
        );
    }
}

/// One trace line: pc, the instruction, and the output operand after it ran.
pub fn format_trace_line(pc: usize, instruction: &Instruction, output: Option<&str>) -> String {
    let has_output = !matches!(
        instruction.op,
        OpCode::OpJmp | OpCode::OpJmpn | OpCode::OpEnd | OpCode::OpLabel | OpCode::OpNop
    );
    match output {
        Some(output) if has_output => format!("IP={:04} {} => {}", pc, instruction, output),
        _ => format!("IP={:04} {}", pc, instruction),
    }
}
