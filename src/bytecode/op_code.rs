use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::bytecode::instruction::Instruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    #[serde(rename = "ADD")]
    OpAdd = 0,
    #[serde(rename = "SUB")]
    OpSub = 1,
    #[serde(rename = "MUL")]
    OpMul = 2,
    #[serde(rename = "DIV")]
    OpDiv = 3,
    #[serde(rename = "REM")]
    OpRem = 4,
    #[serde(rename = "NEG")]
    OpNeg = 5,
    #[serde(rename = "EQ")]
    OpEq = 6,
    #[serde(rename = "NEQ")]
    OpNeq = 7,
    #[serde(rename = "GT")]
    OpGt = 8,
    #[serde(rename = "LT")]
    OpLt = 9,
    #[serde(rename = "GEQ")]
    OpGeq = 10,
    #[serde(rename = "LEQ")]
    OpLeq = 11,
    #[serde(rename = "AND")]
    OpAnd = 12,
    #[serde(rename = "OR")]
    OpOr = 13,
    #[serde(rename = "NOT")]
    OpNot = 14,
    #[serde(rename = "MOV")]
    OpMov = 15,
    #[serde(rename = "REF")]
    OpRef = 16,
    #[serde(rename = "FILL")]
    OpFill = 17,
    #[serde(rename = "ALLOC")]
    OpAlloc = 18,
    #[serde(rename = "ALLOCR")]
    OpAllocr = 19,
    #[serde(rename = "FREE")]
    OpFree = 20,
    #[serde(rename = "CAST")]
    OpCast = 21,
    #[serde(rename = "VEC")]
    OpVec = 22,
    #[serde(rename = "ELEM")]
    OpElem = 23,
    #[serde(rename = "MOVELM")]
    OpMovelm = 24,
    #[serde(rename = "LEN")]
    OpLen = 25,
    #[serde(rename = "JMP")]
    OpJmp = 26,
    #[serde(rename = "JMPN")]
    OpJmpn = 27,
    #[serde(rename = "CALL")]
    OpCall = 28,
    #[serde(rename = "END")]
    OpEnd = 29,
    #[serde(rename = "LABEL")]
    OpLabel = 30,
    #[serde(rename = "NOP")]
    OpNop = 31,
}

impl OpCode {
    pub const ALL: [OpCode; 32] = [
        OpCode::OpAdd,
        OpCode::OpSub,
        OpCode::OpMul,
        OpCode::OpDiv,
        OpCode::OpRem,
        OpCode::OpNeg,
        OpCode::OpEq,
        OpCode::OpNeq,
        OpCode::OpGt,
        OpCode::OpLt,
        OpCode::OpGeq,
        OpCode::OpLeq,
        OpCode::OpAnd,
        OpCode::OpOr,
        OpCode::OpNot,
        OpCode::OpMov,
        OpCode::OpRef,
        OpCode::OpFill,
        OpCode::OpAlloc,
        OpCode::OpAllocr,
        OpCode::OpFree,
        OpCode::OpCast,
        OpCode::OpVec,
        OpCode::OpElem,
        OpCode::OpMovelm,
        OpCode::OpLen,
        OpCode::OpJmp,
        OpCode::OpJmpn,
        OpCode::OpCall,
        OpCode::OpEnd,
        OpCode::OpLabel,
        OpCode::OpNop,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::OpAdd => "ADD",
            OpCode::OpSub => "SUB",
            OpCode::OpMul => "MUL",
            OpCode::OpDiv => "DIV",
            OpCode::OpRem => "REM",
            OpCode::OpNeg => "NEG",
            OpCode::OpEq => "EQ",
            OpCode::OpNeq => "NEQ",
            OpCode::OpGt => "GT",
            OpCode::OpLt => "LT",
            OpCode::OpGeq => "GEQ",
            OpCode::OpLeq => "LEQ",
            OpCode::OpAnd => "AND",
            OpCode::OpOr => "OR",
            OpCode::OpNot => "NOT",
            OpCode::OpMov => "MOV",
            OpCode::OpRef => "REF",
            OpCode::OpFill => "FILL",
            OpCode::OpAlloc => "ALLOC",
            OpCode::OpAllocr => "ALLOCR",
            OpCode::OpFree => "FREE",
            OpCode::OpCast => "CAST",
            OpCode::OpVec => "VEC",
            OpCode::OpElem => "ELEM",
            OpCode::OpMovelm => "MOVELM",
            OpCode::OpLen => "LEN",
            OpCode::OpJmp => "JMP",
            OpCode::OpJmpn => "JMPN",
            OpCode::OpCall => "CALL",
            OpCode::OpEnd => "END",
            OpCode::OpLabel => "LABEL",
            OpCode::OpNop => "NOP",
        }
    }

    /// True for opcodes the dispatcher handles itself instead of handing them
    /// to the execution unit.
    pub fn is_control(self) -> bool {
        matches!(
            self,
            OpCode::OpJmp
                | OpCode::OpJmpn
                | OpCode::OpCall
                | OpCode::OpEnd
                | OpCode::OpLabel
                | OpCode::OpNop
        )
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for OpCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpCode::ALL
            .into_iter()
            .find(|op| op.mnemonic() == s)
            .ok_or_else(|| format!("unknown opcode `{}`", s))
    }
}

/// Inclusive bounds on the operand count of each opcode. `None` as the upper
/// bound means the opcode is variadic.
pub fn operand_range(op: OpCode) -> (usize, Option<usize>) {
    match op {
        OpCode::OpAdd
        | OpCode::OpSub
        | OpCode::OpMul
        | OpCode::OpDiv
        | OpCode::OpRem
        | OpCode::OpEq
        | OpCode::OpNeq
        | OpCode::OpGt
        | OpCode::OpLt
        | OpCode::OpGeq
        | OpCode::OpLeq
        | OpCode::OpAnd
        | OpCode::OpOr
        | OpCode::OpJmp
        | OpCode::OpJmpn => (3, Some(3)),
        OpCode::OpNeg
        | OpCode::OpNot
        | OpCode::OpMov
        | OpCode::OpRef
        | OpCode::OpFill
        | OpCode::OpCast
        | OpCode::OpAllocr => (2, Some(2)),
        OpCode::OpFree => (1, Some(1)),
        OpCode::OpAlloc | OpCode::OpVec => (1, None),
        OpCode::OpElem | OpCode::OpMovelm | OpCode::OpCall => (2, None),
        OpCode::OpLen => (2, Some(3)),
        OpCode::OpEnd => (1, Some(2)),
        OpCode::OpLabel | OpCode::OpNop => (0, Some(1)),
    }
}

/// Number of declared kinds an instruction of this opcode carries.
pub fn declared_type_count(op: OpCode) -> usize {
    match op {
        OpCode::OpCast => 2,
        _ => 1,
    }
}

pub fn disassemble(instructions: &[Instruction]) -> String {
    let mut result = String::new();
    for (i, instruction) in instructions.iter().enumerate() {
        result.push_str(&format!("{:04} {}\n", i, instruction));
    }
    result
}
