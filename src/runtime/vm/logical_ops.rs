use crate::{
    bytecode::{data_type::DataType, op_code::OpCode},
    runtime::{
        container::Container,
        error::{Result, VmError},
    },
};

use super::{
    ExecutionUnit,
    execution_unit::{check_data_type, check_same_size, map1, map2},
};

impl ExecutionUnit {
    pub fn logical(
        &mut self,
        op: OpCode,
        data_type: DataType,
        out: &mut Container,
        a: &Container,
        b: &Container,
    ) -> Result<()> {
        if data_type != DataType::Bool {
            return Err(VmError::UnsupportedDataType { op, data_type });
        }
        for operand in [&*out, a, b] {
            check_data_type(operand, DataType::Bool)?;
        }
        check_same_size(out.size(), &[a, b])?;
        if op == OpCode::OpAnd {
            map2(out, a, b, |x: &bool, y: &bool| *x && *y)
        } else {
            map2(out, a, b, |x: &bool, y: &bool| *x || *y)
        }
    }

    pub fn not(&mut self, data_type: DataType, out: &mut Container, a: &Container) -> Result<()> {
        if data_type != DataType::Bool {
            return Err(VmError::UnsupportedDataType {
                op: OpCode::OpNot,
                data_type,
            });
        }
        check_data_type(out, DataType::Bool)?;
        check_data_type(a, DataType::Bool)?;
        check_same_size(out.size(), &[a])?;
        map1(out, a, |x: &bool| !x)
    }
}
