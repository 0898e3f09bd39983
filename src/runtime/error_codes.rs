#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: &'static str,
    pub title: &'static str,
}

pub const UNSUPPORTED_DATA_TYPE: ErrorCode = ErrorCode {
    code: "E2000",
    title: "UNSUPPORTED DATA TYPE",
};
pub const DATA_TYPE_MISMATCH: ErrorCode = ErrorCode {
    code: "E2001",
    title: "DATA TYPE MISMATCH",
};
pub const SIZE_MISMATCH: ErrorCode = ErrorCode {
    code: "E2002",
    title: "OPERAND SIZE MISMATCH",
};
pub const JAGGED_ARRAY: ErrorCode = ErrorCode {
    code: "E2003",
    title: "JAGGED ARRAY",
};
pub const CAST_FAILED_DUE_TO_VALUE: ErrorCode = ErrorCode {
    code: "E2004",
    title: "CAST FAILED DUE TO VALUE",
};
pub const CAST_FAILED_DUE_TO_TYPE: ErrorCode = ErrorCode {
    code: "E2005",
    title: "CAST FAILED DUE TO TYPE",
};
pub const INVALID_ARRAY_INDEX: ErrorCode = ErrorCode {
    code: "E2006",
    title: "INVALID ARRAY INDEX",
};
pub const INVALID_SUBSCRIPT_RANK: ErrorCode = ErrorCode {
    code: "E2007",
    title: "INVALID SUBSCRIPT RANK",
};
pub const INVALID_ARRAY_LENGTH: ErrorCode = ErrorCode {
    code: "E2008",
    title: "INVALID ARRAY LENGTH",
};
pub const DIVISION_BY_ZERO: ErrorCode = ErrorCode {
    code: "E2009",
    title: "DIVISION BY ZERO",
};
pub const INVALID_OPERAND_COUNT: ErrorCode = ErrorCode {
    code: "E2010",
    title: "INVALID OPERAND COUNT",
};
pub const INVALID_DECLARED_TYPES: ErrorCode = ErrorCode {
    code: "E2011",
    title: "INVALID DECLARED TYPES",
};
pub const INVALID_JUMP_TARGET: ErrorCode = ErrorCode {
    code: "E2012",
    title: "INVALID JUMP TARGET",
};
pub const MEMORY_ACCESS_OUT_OF_BOUNDS: ErrorCode = ErrorCode {
    code: "E2013",
    title: "MEMORY ACCESS OUT OF BOUNDS",
};
pub const UNKNOWN_FUNCTION: ErrorCode = ErrorCode {
    code: "E2014",
    title: "UNKNOWN FUNCTION",
};
pub const HOST_FUNCTION_FAILED: ErrorCode = ErrorCode {
    code: "E2015",
    title: "HOST FUNCTION FAILED",
};
pub const INVALID_HOST_VALUE: ErrorCode = ErrorCode {
    code: "E2016",
    title: "INVALID HOST VALUE",
};
pub const EXECUTION_TERMINATED: ErrorCode = ErrorCode {
    code: "E2017",
    title: "EXECUTION TERMINATED",
};
pub const INSTRUCTION_BUDGET_EXCEEDED: ErrorCode = ErrorCode {
    code: "E2018",
    title: "INSTRUCTION BUDGET EXCEEDED",
};
pub const NO_PREVIOUS_EXECUTION: ErrorCode = ErrorCode {
    code: "E2019",
    title: "NO PREVIOUS EXECUTION",
};
pub const OBJECT_CODE_LOAD_FAILED: ErrorCode = ErrorCode {
    code: "E2020",
    title: "OBJECT CODE LOAD FAILED",
};

pub const ERROR_CODES: &[ErrorCode] = &[
    UNSUPPORTED_DATA_TYPE,
    DATA_TYPE_MISMATCH,
    SIZE_MISMATCH,
    JAGGED_ARRAY,
    CAST_FAILED_DUE_TO_VALUE,
    CAST_FAILED_DUE_TO_TYPE,
    INVALID_ARRAY_INDEX,
    INVALID_SUBSCRIPT_RANK,
    INVALID_ARRAY_LENGTH,
    DIVISION_BY_ZERO,
    INVALID_OPERAND_COUNT,
    INVALID_DECLARED_TYPES,
    INVALID_JUMP_TARGET,
    MEMORY_ACCESS_OUT_OF_BOUNDS,
    UNKNOWN_FUNCTION,
    HOST_FUNCTION_FAILED,
    INVALID_HOST_VALUE,
    EXECUTION_TERMINATED,
    INSTRUCTION_BUDGET_EXCEEDED,
    NO_PREVIOUS_EXECUTION,
    OBJECT_CODE_LOAD_FAILED,
];

pub fn get(code: &str) -> Option<&'static ErrorCode> {
    ERROR_CODES.iter().find(|item| item.code == code)
}
