use crate::{
    bytecode::instruction::Instruction,
    runtime::{
        container::Container, error::Result, host::CallTable, memory::MemoryAccess,
        stats::PerformanceStats,
    },
};

mod alloc_ops;
mod binary_ops;
mod cast_ops;
mod comparison_ops;
mod dispatch;
mod execution_unit;
mod index_ops;
mod logical_ops;
mod trace;
mod transfer_ops;

#[cfg(test)]
mod dispatch_test;
#[cfg(test)]
mod index_ops_test;
#[cfg(test)]
mod transfer_ops_test;

pub use cast_ops::format_float;
pub use execution_unit::ExecutionUnit;
pub use trace::format_trace_line;

/// Fetch-execute loop over an instruction array.
///
/// Branches, calls and END are handled here; every other opcode goes to the
/// [`ExecutionUnit`].
#[derive(Debug)]
pub struct Processor {
    pc: usize,
    unit: ExecutionUnit,
    trace: bool,
    result: Option<Container>,
    operand_scratch: Vec<Container>,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    pub fn new() -> Self {
        Self {
            pc: 0,
            unit: ExecutionUnit::new(),
            trace: false,
            result: None,
            operand_scratch: Vec::new(),
        }
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Rewinds to the first instruction and forgets any END result.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.result = None;
    }

    pub fn stats(&self) -> PerformanceStats {
        self.unit.stats()
    }

    pub fn reset_stats(&mut self) {
        self.unit.stats_mut().reset();
    }

    /// The value recorded by END, if the last run produced one.
    pub fn result(&self) -> Option<&Container> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<Container> {
        self.result.take()
    }

    /// Runs from the first instruction until the pc passes the end.
    pub fn run<M, C>(
        &mut self,
        instructions: &[Instruction],
        memory: &mut M,
        calls: &mut C,
    ) -> Result<()>
    where
        M: MemoryAccess + ?Sized,
        C: CallTable + ?Sized,
    {
        self.reset();
        while self.pc < instructions.len() {
            self.step(instructions, memory, calls)?;
        }
        Ok(())
    }

    /// Executes the instruction at the current pc and returns the next pc.
    /// A pc at or past the end is returned unchanged.
    pub fn step<M, C>(
        &mut self,
        instructions: &[Instruction],
        memory: &mut M,
        calls: &mut C,
    ) -> Result<usize>
    where
        M: MemoryAccess + ?Sized,
        C: CallTable + ?Sized,
    {
        let pc = self.pc;
        let Some(instruction) = instructions.get(pc) else {
            return Ok(pc);
        };

        let next = self.dispatch_instruction(instruction, instructions.len(), memory, calls)?;
        self.unit.stats_mut().record_instruction();
        if self.trace {
            self.trace_instruction(pc, instruction, &*memory);
        }
        self.pc = next;
        Ok(next)
    }
}
