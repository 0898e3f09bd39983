use std::cmp::Ordering;

use crate::{
    bytecode::{data_type::DataType, op_code::OpCode},
    runtime::{
        container::Container,
        error::{Result, VmError},
    },
};

use super::{
    ExecutionUnit,
    execution_unit::{check_data_type, check_same_size, map2},
};

impl ExecutionUnit {
    /// EQ, NEQ, GT, LT, GEQ and LEQ. Inputs are of the declared kind, the
    /// output is always BOOL. Ordering is defined on numeric kinds only.
    pub fn compare(
        &mut self,
        op: OpCode,
        data_type: DataType,
        out: &mut Container,
        a: &Container,
        b: &Container,
    ) -> Result<()> {
        let equality = matches!(op, OpCode::OpEq | OpCode::OpNeq);
        let supported = data_type.is_numeric()
            || (equality && matches!(data_type, DataType::Bool | DataType::String));
        if !supported {
            return Err(VmError::UnsupportedDataType { op, data_type });
        }
        check_data_type(out, DataType::Bool)?;
        check_data_type(a, data_type)?;
        check_data_type(b, data_type)?;
        check_same_size(out.size(), &[a, b])?;

        match data_type {
            DataType::Int64 => map2(out, a, b, |x: &i64, y: &i64| holds(op, x.partial_cmp(y))),
            DataType::Float64 => map2(out, a, b, |x: &f64, y: &f64| holds(op, x.partial_cmp(y))),
            DataType::Bool => map2(out, a, b, |x: &bool, y: &bool| (x == y) == (op == OpCode::OpEq)),
            _ => map2(out, a, b, |x: &String, y: &String| (x == y) == (op == OpCode::OpEq)),
        }
    }
}

/// Whether `op` holds for an ordering. Unordered (NaN) operands satisfy
/// only NEQ.
fn holds(op: OpCode, ordering: Option<Ordering>) -> bool {
    match (op, ordering) {
        (OpCode::OpNeq, None) => true,
        (_, None) => false,
        (OpCode::OpEq, Some(ord)) => ord == Ordering::Equal,
        (OpCode::OpNeq, Some(ord)) => ord != Ordering::Equal,
        (OpCode::OpGt, Some(ord)) => ord == Ordering::Greater,
        (OpCode::OpLt, Some(ord)) => ord == Ordering::Less,
        (OpCode::OpGeq, Some(ord)) => ord != Ordering::Less,
        (_, Some(ord)) => ord != Ordering::Greater,
    }
}
