use thiserror::Error;

use crate::{
    bytecode::{data_type::DataType, instruction::Partition, op_code::OpCode},
    runtime::error_codes::{self, ErrorCode},
};

/// Errors raised while loading or executing object code.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    #[error("{op} does not support data type {data_type}")]
    UnsupportedDataType { op: OpCode, data_type: DataType },

    #[error("data type mismatch: expected {expected}, found {found}")]
    DataTypeMismatch { expected: DataType, found: DataType },

    #[error("operand size mismatch: expected {expected} elements, found {found}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("jagged array: axis {axis} expected length {expected}, found {found}")]
    JaggedArray {
        axis: usize,
        expected: usize,
        found: usize,
    },

    #[error("cannot cast {value:?} to {to}")]
    CastFailedDueToValue { value: String, to: DataType },

    #[error("cannot cast from {from} to {to}")]
    CastFailedDueToType { from: DataType, to: DataType },

    #[error("index {index} is out of bounds for axis {axis} of length {length}")]
    InvalidArrayIndex {
        axis: usize,
        index: i64,
        length: usize,
    },

    #[error("{found} subscripts given for an array of rank {rank}")]
    InvalidSubscriptRank { rank: usize, found: usize },

    #[error("invalid array length {0}")]
    InvalidArrayLength(i64),

    #[error("division by zero")]
    DivisionByZero,

    #[error("{op} expects {expected} operands, got {found}")]
    InvalidOperandCount {
        op: OpCode,
        expected: String,
        found: usize,
    },

    #[error("{op} expects {expected} declared data types, got {found}")]
    InvalidDeclaredTypes {
        op: OpCode,
        expected: usize,
        found: usize,
    },

    #[error("jump target {target} is outside the instruction range 0..{len}")]
    InvalidJumpTarget { target: i64, len: usize },

    #[error("address {address} is out of bounds of the {partition} partition")]
    MemoryAccessOutOfBounds { partition: Partition, address: usize },

    #[error("no function is registered at index {0}")]
    UnknownFunction(i64),

    #[error("host function `{name}` failed: {message}")]
    HostFunction { name: String, message: String },

    #[error("invalid host value: {0}")]
    InvalidHostValue(String),

    #[error("execution was terminated")]
    Terminated,

    #[error("instruction budget of {0} exceeded")]
    InstructionBudgetExceeded(u64),

    #[error("there is no previous execution to repeat")]
    NoPreviousExecution,

    #[error("invalid object code: {0}")]
    ObjectCode(String),
}

impl VmError {
    pub fn code(&self) -> &'static ErrorCode {
        match self {
            VmError::UnsupportedDataType { .. } => &error_codes::UNSUPPORTED_DATA_TYPE,
            VmError::DataTypeMismatch { .. } => &error_codes::DATA_TYPE_MISMATCH,
            VmError::SizeMismatch { .. } => &error_codes::SIZE_MISMATCH,
            VmError::JaggedArray { .. } => &error_codes::JAGGED_ARRAY,
            VmError::CastFailedDueToValue { .. } => &error_codes::CAST_FAILED_DUE_TO_VALUE,
            VmError::CastFailedDueToType { .. } => &error_codes::CAST_FAILED_DUE_TO_TYPE,
            VmError::InvalidArrayIndex { .. } => &error_codes::INVALID_ARRAY_INDEX,
            VmError::InvalidSubscriptRank { .. } => &error_codes::INVALID_SUBSCRIPT_RANK,
            VmError::InvalidArrayLength(_) => &error_codes::INVALID_ARRAY_LENGTH,
            VmError::DivisionByZero => &error_codes::DIVISION_BY_ZERO,
            VmError::InvalidOperandCount { .. } => &error_codes::INVALID_OPERAND_COUNT,
            VmError::InvalidDeclaredTypes { .. } => &error_codes::INVALID_DECLARED_TYPES,
            VmError::InvalidJumpTarget { .. } => &error_codes::INVALID_JUMP_TARGET,
            VmError::MemoryAccessOutOfBounds { .. } => &error_codes::MEMORY_ACCESS_OUT_OF_BOUNDS,
            VmError::UnknownFunction(_) => &error_codes::UNKNOWN_FUNCTION,
            VmError::HostFunction { .. } => &error_codes::HOST_FUNCTION_FAILED,
            VmError::InvalidHostValue(_) => &error_codes::INVALID_HOST_VALUE,
            VmError::Terminated => &error_codes::EXECUTION_TERMINATED,
            VmError::InstructionBudgetExceeded(_) => &error_codes::INSTRUCTION_BUDGET_EXCEEDED,
            VmError::NoPreviousExecution => &error_codes::NO_PREVIOUS_EXECUTION,
            VmError::ObjectCode(_) => &error_codes::OBJECT_CODE_LOAD_FAILED,
        }
    }

    pub(crate) fn host_function(name: &str, message: impl Into<String>) -> Self {
        VmError::HostFunction {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VmError>;
