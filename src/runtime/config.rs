use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::runtime::error::{Result, VmError};

/// Options a `VirtualMachine` runs with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Emit a `trace!` event for every executed instruction.
    pub trace: bool,
    /// Abort with `InstructionBudgetExceeded` after this many instructions.
    pub max_instructions: Option<u64>,
    /// Log the disassembly before each run.
    pub dump_object_code: bool,
}

impl VmConfig {
    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str(source)
            .map_err(|err| VmError::ObjectCode(format!("invalid configuration: {}", err)))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|err| VmError::ObjectCode(format!("{}: {}", path.display(), err)))?;
        Self::from_json_str(&source)
    }

    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    pub fn with_max_instructions(mut self, limit: Option<u64>) -> Self {
        self.max_instructions = limit;
        self
    }
}
