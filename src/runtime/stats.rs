#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceStats {
    pub executed_instructions: u64,
    pub buffer_allocations: u64,
    pub buffer_reuses: u64,
}

impl PerformanceStats {
    pub fn record_instruction(&mut self) {
        self.executed_instructions += 1;
    }

    pub fn record_allocation(&mut self) {
        self.buffer_allocations += 1;
    }

    pub fn record_reuse(&mut self) {
        self.buffer_reuses += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
