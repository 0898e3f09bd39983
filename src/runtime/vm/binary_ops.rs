use crate::{
    bytecode::{data_type::DataType, op_code::OpCode},
    runtime::{
        container::Container,
        error::{Result, VmError},
    },
};

use super::{
    ExecutionUnit,
    execution_unit::{any_value, check_data_type, check_same_size, map1, map2},
};

impl ExecutionUnit {
    /// ADD, SUB, MUL, DIV and REM, elementwise. ADD on STRING concatenates.
    pub fn arithmetic(
        &mut self,
        op: OpCode,
        data_type: DataType,
        out: &mut Container,
        a: &Container,
        b: &Container,
    ) -> Result<()> {
        let supported = data_type.is_numeric() || (data_type == DataType::String && op == OpCode::OpAdd);
        if !supported {
            return Err(VmError::UnsupportedDataType { op, data_type });
        }
        for operand in [&*out, a, b] {
            check_data_type(operand, data_type)?;
        }
        check_same_size(out.size(), &[a, b])?;

        match data_type {
            DataType::Int64 => {
                if matches!(op, OpCode::OpDiv | OpCode::OpRem)
                    && any_value(b, |divisor: &i64| *divisor == 0)?
                {
                    return Err(VmError::DivisionByZero);
                }
                let f: fn(i64, i64) -> i64 = match op {
                    OpCode::OpAdd => i64::wrapping_add,
                    OpCode::OpSub => i64::wrapping_sub,
                    OpCode::OpMul => i64::wrapping_mul,
                    OpCode::OpDiv => i64::wrapping_div,
                    _ => i64::wrapping_rem,
                };
                map2(out, a, b, |x: &i64, y: &i64| f(*x, *y))
            }
            DataType::Float64 => {
                let f: fn(f64, f64) -> f64 = match op {
                    OpCode::OpAdd => |x, y| x + y,
                    OpCode::OpSub => |x, y| x - y,
                    OpCode::OpMul => |x, y| x * y,
                    OpCode::OpDiv => |x, y| x / y,
                    _ => |x, y| x % y,
                };
                map2(out, a, b, |x: &f64, y: &f64| f(*x, *y))
            }
            _ => map2(out, a, b, |x: &String, y: &String| format!("{}{}", x, y)),
        }
    }

    pub fn neg(&mut self, data_type: DataType, out: &mut Container, a: &Container) -> Result<()> {
        if !data_type.is_numeric() {
            return Err(VmError::UnsupportedDataType {
                op: OpCode::OpNeg,
                data_type,
            });
        }
        check_data_type(out, data_type)?;
        check_data_type(a, data_type)?;
        check_same_size(out.size(), &[a])?;
        if data_type == DataType::Int64 {
            map1(out, a, |x: &i64| x.wrapping_neg())
        } else {
            map1(out, a, |x: &f64| -x)
        }
    }
}
