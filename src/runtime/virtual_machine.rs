use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, info};

use crate::{
    bytecode::{
        instruction::{Instruction, Partition},
        object_code::ObjectCode,
    },
    runtime::{
        config::VmConfig,
        container::Container,
        error::{Result, VmError},
        host::{FunctionTable, VariableTable},
        memory::{Memory, MemoryAccess},
        stats::PerformanceStats,
        vm::Processor,
    },
};

/// Shareable handle that asks a running VM to stop before its next
/// instruction.
#[derive(Debug, Clone, Default)]
pub struct Terminator {
    requested: Arc<AtomicBool>,
}

impl Terminator {
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.requested.store(false, Ordering::Release);
    }
}

struct ReexecutionCache {
    object_code: ObjectCode,
    fingerprint: [u8; 32],
    memory: Memory,
}

/// Runs object code against host variables and host functions.
pub struct VirtualMachine {
    config: VmConfig,
    processor: Processor,
    terminator: Terminator,
    cache: Option<ReexecutionCache>,
}

impl VirtualMachine {
    pub fn new(config: VmConfig) -> Self {
        let mut processor = Processor::new();
        processor.set_trace(config.trace);
        Self {
            config,
            processor,
            terminator: Terminator::default(),
            cache: None,
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator.clone()
    }

    /// Counters of the most recent run.
    pub fn stats(&self) -> PerformanceStats {
        self.processor.stats()
    }

    /// Fingerprint of the object code the reexecution cache holds.
    pub fn last_fingerprint(&self) -> Option<[u8; 32]> {
        self.cache.as_ref().map(|cache| cache.fingerprint)
    }

    /// Allocates fresh memory for `object_code`, runs it, and writes the
    /// touched non-constant globals back into `variables`.
    ///
    /// Returns the container recorded by END, if any.
    pub fn execute(
        &mut self,
        object_code: &ObjectCode,
        variables: &mut VariableTable,
        functions: &mut FunctionTable,
    ) -> Result<Option<Container>> {
        let fingerprint = object_code.fingerprint()?;
        if self.config.dump_object_code {
            info!("object code:\n{}", object_code.disassemble());
        }
        let mut cache = ReexecutionCache {
            object_code: object_code.clone(),
            fingerprint,
            memory: Memory::allocate(object_code, variables)?,
        };
        let result = self.run_cached(&mut cache, variables, functions)?;
        self.cache = Some(cache);
        Ok(result)
    }

    /// Runs the last successfully executed object code again, reusing its
    /// memory. Globals are rebound to the current host variables; registers
    /// and locals keep their buffers. The cache survives a failed run.
    pub fn reexecute_last(
        &mut self,
        variables: &mut VariableTable,
        functions: &mut FunctionTable,
    ) -> Result<Option<Container>> {
        let mut cache = self.cache.take().ok_or(VmError::NoPreviousExecution)?;
        debug!("reexecuting cached object code");
        let outcome = cache
            .memory
            .refresh_globals(&cache.object_code, variables)
            .and_then(|()| self.run_cached(&mut cache, variables, functions));
        self.cache = Some(cache);
        outcome
    }

    fn run_cached(
        &mut self,
        cache: &mut ReexecutionCache,
        variables: &mut VariableTable,
        functions: &mut FunctionTable,
    ) -> Result<Option<Container>> {
        debug!(
            instructions = cache.object_code.instructions.len(),
            registers = cache.object_code.registers,
            "starting execution"
        );
        self.processor.reset_stats();

        functions.initialize_all()?;
        let outcome = self.run_loop(&cache.object_code.instructions, &mut cache.memory, functions);
        let finalized = functions.finalize_all();
        outcome?;
        finalized?;

        writeback_globals(&cache.object_code, &cache.memory, variables)?;
        let result = self.processor.take_result();
        let stats = self.stats();
        debug!(
            executed = stats.executed_instructions,
            allocations = stats.buffer_allocations,
            reuses = stats.buffer_reuses,
            "execution finished"
        );
        Ok(result)
    }

    fn run_loop(
        &mut self,
        instructions: &[Instruction],
        memory: &mut Memory,
        functions: &mut FunctionTable,
    ) -> Result<()> {
        self.processor.reset();
        while self.processor.pc() < instructions.len() {
            if self.terminator.is_requested() {
                self.terminator.reset();
                debug!(pc = self.processor.pc(), "execution terminated");
                return Err(VmError::Terminated);
            }
            if let Some(limit) = self.config.max_instructions {
                if self.processor.stats().executed_instructions >= limit {
                    return Err(VmError::InstructionBudgetExceeded(limit));
                }
            }
            self.processor.step(instructions, memory, functions)?;
        }
        Ok(())
    }
}

/// Copies every referenced, non-constant global in the object code's
/// global address range back into its host variable.
pub fn writeback_globals(
    object_code: &ObjectCode,
    memory: &Memory,
    variables: &mut VariableTable,
) -> Result<()> {
    let (Some(min), Some(max)) = (
        object_code.min_global_address(),
        object_code.max_global_address(),
    ) else {
        return Ok(());
    };

    for address in min..=max {
        if !object_code.is_global_referenced(address) {
            continue;
        }
        let Some(name) = object_code.global_name(address) else {
            continue;
        };
        let Some(variable) = variables.get_mut(name) else {
            continue;
        };
        if variable.constant {
            continue;
        }
        variable.container = memory.get(Partition::Global, address)?.clone();
    }
    Ok(())
}
