use std::{collections::BTreeSet, path::Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    bytecode::{data_type::DataType, instruction::Instruction, op_code::disassemble},
    runtime::error::{Result, VmError},
};

/// A constant pool entry: declared kind plus nested host data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantData {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub value: serde_json::Value,
}

impl ConstantData {
    pub fn new(data_type: DataType, value: serde_json::Value) -> Self {
        Self { data_type, value }
    }
}

/// A global slot bound by name to a host variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSlot {
    pub name: String,
    pub address: usize,
}

/// Everything the upstream compiler hands the VM for one script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectCode {
    pub instructions: Vec<Instruction>,
    pub constants: Vec<ConstantData>,
    pub registers: usize,
    pub locals: usize,
    pub globals: Vec<GlobalSlot>,
    /// Global addresses the script actually touches. Only these are
    /// written back to the host after a run.
    pub referenced_globals: BTreeSet<usize>,
}

impl ObjectCode {
    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|err| VmError::ObjectCode(err.to_string()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|err| VmError::ObjectCode(format!("{}: {}", path.display(), err)))?;
        Self::from_json_str(&source)
    }

    pub fn min_global_address(&self) -> Option<usize> {
        self.globals.iter().map(|slot| slot.address).min()
    }

    pub fn max_global_address(&self) -> Option<usize> {
        self.globals.iter().map(|slot| slot.address).max()
    }

    pub fn global_name(&self, address: usize) -> Option<&str> {
        self.globals
            .iter()
            .find(|slot| slot.address == address)
            .map(|slot| slot.name.as_str())
    }

    pub fn is_global_referenced(&self, address: usize) -> bool {
        self.referenced_globals.contains(&address)
    }

    /// SHA-256 over the compact JSON encoding.
    pub fn fingerprint(&self) -> Result<[u8; 32]> {
        let bytes = serde_json::to_vec(self).map_err(|err| VmError::ObjectCode(err.to_string()))?;
        Ok(hash_bytes(&bytes))
    }

    pub fn fingerprint_hex(&self) -> Result<String> {
        Ok(self
            .fingerprint()?
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect())
    }

    pub fn disassemble(&self) -> String {
        disassemble(&self.instructions)
    }
}

pub fn hash_bytes(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}
