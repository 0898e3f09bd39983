use crate::{
    bytecode::{
        data_type::DataType,
        instruction::{Instruction, Operand},
        op_code::OpCode,
    },
    runtime::{
        container::Container,
        error::{Result, VmError},
        host::CallTable,
        memory::MemoryAccess,
    },
};

use super::{
    Processor,
    execution_unit::{check_data_type, check_instruction_shape, read_scalar, read_values},
};

impl Processor {
    /// Executes one instruction and returns the pc to continue at.
    pub(super) fn dispatch_instruction<M, C>(
        &mut self,
        instruction: &Instruction,
        len: usize,
        memory: &mut M,
        calls: &mut C,
    ) -> Result<usize>
    where
        M: MemoryAccess + ?Sized,
        C: CallTable + ?Sized,
    {
        let pc = self.pc;
        let operands = &instruction.operands;
        check_instruction_shape(instruction, operands.len())?;

        if !instruction.op.is_control() {
            let mut inputs = std::mem::take(&mut self.operand_scratch);
            let outcome = load_all(&*memory, &operands[1..], &mut inputs).and_then(|()| {
                let out = memory.get_mut(operands[0].partition, operands[0].address)?;
                self.unit.execute(instruction, out, &inputs)
            });
            inputs.clear();
            self.operand_scratch = inputs;
            outcome?;
            return Ok(pc + 1);
        }

        match instruction.op {
            OpCode::OpJmp | OpCode::OpJmpn => {
                let condition = load(&*memory, operands[2])?;
                check_data_type(condition, DataType::Bool)?;
                let values = read_values::<bool>(condition)?;
                let jump = if instruction.op == OpCode::OpJmp {
                    values.iter().all(|&value| value)
                } else {
                    values.iter().all(|&value| !value)
                };
                if !jump {
                    return Ok(pc + 1);
                }

                let target = load(&*memory, operands[1])?;
                check_data_type(target, DataType::Int64)?;
                let target = read_scalar::<i64>(target)?;
                usize::try_from(target)
                    .ok()
                    .filter(|&target| target <= len)
                    .ok_or(VmError::InvalidJumpTarget { target, len })
            }
            OpCode::OpCall => {
                let index = load(&*memory, operands[1])?;
                check_data_type(index, DataType::Int64)?;
                let index = read_scalar::<i64>(index)?;
                let index = usize::try_from(index).map_err(|_| VmError::UnknownFunction(index))?;

                let mut args = std::mem::take(&mut self.operand_scratch);
                let outcome = load_all(&*memory, &operands[2..], &mut args).and_then(|()| {
                    let ret = memory.get_mut(operands[0].partition, operands[0].address)?;
                    calls.invoke(index, &args, ret)
                });
                args.clear();
                self.operand_scratch = args;
                outcome?;
                Ok(pc + 1)
            }
            OpCode::OpEnd => {
                if let Some(&operand) = operands.get(1) {
                    self.result = Some(load(&*memory, operand)?.deep_copy());
                }
                Ok(len)
            }
            // LABEL, NOP
            _ => Ok(pc + 1),
        }
    }
}

fn load<M: MemoryAccess + ?Sized>(memory: &M, operand: Operand) -> Result<&Container> {
    memory.get(operand.partition, operand.address)
}

/// Clones the containers behind `operands` into `into`. The clones share
/// buffers with memory, so writes through them stay visible.
fn load_all<M: MemoryAccess + ?Sized>(
    memory: &M,
    operands: &[Operand],
    into: &mut Vec<Container>,
) -> Result<()> {
    into.clear();
    for &operand in operands {
        into.push(load(&*memory, operand)?.clone());
    }
    Ok(())
}
