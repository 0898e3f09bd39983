use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::bytecode::{data_type::DataType, op_code::OpCode};

/// Memory partition an operand address points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Partition {
    Global,
    Local,
    Constant,
    Register,
    None,
}

impl Partition {
    pub fn prefix(self) -> char {
        match self {
            Partition::Global => 'G',
            Partition::Local => 'L',
            Partition::Constant => 'C',
            Partition::Register => 'R',
            Partition::None => 'N',
        }
    }

    fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'G' => Some(Partition::Global),
            'L' => Some(Partition::Local),
            'C' => Some(Partition::Constant),
            'R' => Some(Partition::Register),
            'N' => Some(Partition::None),
            _ => None,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Partition::Global => "GLOBAL",
            Partition::Local => "LOCAL",
            Partition::Constant => "CONSTANT",
            Partition::Register => "REGISTER",
            Partition::None => "NONE",
        };
        f.write_str(name)
    }
}

/// Reference to one container slot: a partition plus an address in it.
///
/// Serialized as a compact string such as `R0`, `C3` or `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Operand {
    pub partition: Partition,
    pub address: usize,
}

impl Operand {
    pub const NONE: Operand = Operand {
        partition: Partition::None,
        address: 0,
    };

    pub const fn new(partition: Partition, address: usize) -> Self {
        Self { partition, address }
    }

    pub const fn register(address: usize) -> Self {
        Self::new(Partition::Register, address)
    }

    pub const fn constant(address: usize) -> Self {
        Self::new(Partition::Constant, address)
    }

    pub const fn global(address: usize) -> Self {
        Self::new(Partition::Global, address)
    }

    pub const fn local(address: usize) -> Self {
        Self::new(Partition::Local, address)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.partition {
            Partition::None => f.write_str("N"),
            partition => write!(f, "{}{}", partition.prefix(), self.address),
        }
    }
}

impl FromStr for Operand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let partition = chars
            .next()
            .and_then(Partition::from_prefix)
            .ok_or_else(|| format!("invalid operand `{}`", s))?;
        let digits = chars.as_str();
        if partition == Partition::None {
            return if digits.is_empty() {
                Ok(Operand::NONE)
            } else {
                Err(format!("invalid operand `{}`", s))
            };
        }
        let address = digits
            .parse::<usize>()
            .map_err(|_| format!("invalid operand `{}`", s))?;
        Ok(Operand::new(partition, address))
    }
}

impl TryFrom<String> for Operand {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operand> for String {
    fn from(operand: Operand) -> Self {
        operand.to_string()
    }
}

/// One instruction: opcode, declared kind(s) and operands, output first.
///
/// `data_types` holds a single kind for every opcode except CAST, which
/// declares `[to, from]`. Instructions are never validated on construction;
/// the dispatcher checks them each time they execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: OpCode,
    pub data_types: Vec<DataType>,
    pub operands: Vec<Operand>,
}

impl Instruction {
    pub fn new(op: OpCode, data_type: DataType, operands: &[Operand]) -> Self {
        Self {
            op,
            data_types: vec![data_type],
            operands: operands.to_vec(),
        }
    }

    pub fn cast(to: DataType, from: DataType, operands: &[Operand]) -> Self {
        Self {
            op: OpCode::OpCast,
            data_types: vec![to, from],
            operands: operands.to_vec(),
        }
    }

    /// The primary declared kind, `Void` when none was declared.
    pub fn data_type(&self) -> DataType {
        self.data_types.first().copied().unwrap_or(DataType::Void)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        for data_type in &self.data_types {
            write!(f, " {}", data_type)?;
        }
        for operand in &self.operands {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

pub fn make(op: OpCode, data_type: DataType, operands: &[Operand]) -> Instruction {
    Instruction::new(op, data_type, operands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_text_round_trip() {
        for text in ["R0", "C12", "G3", "L7", "N"] {
            let operand: Operand = text.parse().unwrap();
            assert_eq!(operand.to_string(), text);
        }
    }

    #[test]
    fn operand_rejects_garbage() {
        assert!("X1".parse::<Operand>().is_err());
        assert!("R".parse::<Operand>().is_err());
        assert!("N4".parse::<Operand>().is_err());
        assert!("".parse::<Operand>().is_err());
    }

    #[test]
    fn cast_declares_two_kinds() {
        let instruction = Instruction::cast(
            DataType::String,
            DataType::Int64,
            &[Operand::register(0), Operand::register(1)],
        );
        assert_eq!(instruction.data_type(), DataType::String);
        assert_eq!(instruction.to_string(), "CAST STRING INT64 R0 R1");
    }
}
