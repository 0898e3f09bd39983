use crate::{
    bytecode::{data_type::DataType, op_code::OpCode},
    runtime::{
        container::{Container, Element},
        error::{Result, VmError},
    },
};

use super::{
    ExecutionUnit,
    execution_unit::{
        buffer_of, check_data_type, check_same_size, effective_type, map1, read_scalar,
        with_element_type, write_values,
    },
};

impl ExecutionUnit {
    /// Copies values; `out` keeps its own buffer.
    pub fn mov(&mut self, data_type: DataType, out: &mut Container, a: &Container) -> Result<()> {
        check_data_type(a, data_type)?;
        let kind = effective_type(data_type, a);
        check_data_type(out, kind)?;
        check_same_size(out.size(), &[a])?;
        if out.shares_buffer_with(a) && out.offset() == a.offset() {
            return Ok(());
        }
        with_element_type!(kind, OpCode::OpMov, |T| map1(out, a, |x: &T| x.clone()))
    }

    /// Makes `out` a view of the whole of `a`: same buffer, offset and shape.
    pub fn reference(&mut self, data_type: DataType, out: &mut Container, a: &Container) -> Result<()> {
        check_data_type(a, data_type)?;
        let buffer = buffer_of(a, data_type)?;
        out.bind_view(buffer, a.offset(), a.shape().to_vec());
        Ok(())
    }

    /// Writes the single element of `a` into every element of `out`.
    /// An unallocated `out` becomes a scalar first.
    pub fn fill(&mut self, data_type: DataType, out: &mut Container, a: &Container) -> Result<()> {
        check_data_type(a, data_type)?;
        let kind = effective_type(data_type, a);
        if !out.is_allocated() {
            self.allocate(OpCode::OpFill, kind, out, Vec::new())?;
        }
        check_data_type(out, kind)?;
        with_element_type!(kind, OpCode::OpFill, |T| fill_with::<T>(out, a))
    }

    pub fn free(&mut self, out: &mut Container) {
        out.release();
    }

    /// Packs K scalar inputs into a rank 1 output of length K.
    ///
    /// An output that already holds K elements of the kind is overwritten in
    /// place; otherwise it is bound to a fresh buffer.
    pub fn vec(&mut self, data_type: DataType, out: &mut Container, inputs: &[Container]) -> Result<()> {
        let kind = match (data_type, inputs.first()) {
            (DataType::Any, Some(first)) => first.data_type(),
            (DataType::Any, None) if out.is_allocated() => out.data_type(),
            (declared, _) => declared,
        };
        if !kind.is_storable() {
            return Err(VmError::UnsupportedDataType {
                op: OpCode::OpVec,
                data_type: kind,
            });
        }
        for input in inputs {
            check_data_type(input, kind)?;
            check_same_size(1, &[input])?;
        }
        if out.is_allocated() {
            check_data_type(out, kind)?;
        }
        with_element_type!(kind, OpCode::OpVec, |T| self.pack::<T>(out, inputs))
    }

    fn pack<T: Element>(&mut self, out: &mut Container, inputs: &[Container]) -> Result<()> {
        let values = inputs
            .iter()
            .map(read_scalar::<T>)
            .collect::<Result<Vec<T>>>()?;
        let len = values.len();
        if out.is_allocated() && out.size() == len {
            out.reshape(vec![len]);
            self.stats_mut().record_reuse();
            return write_values(out, values);
        }
        out.bind_owned(T::into_buffer(values), vec![len]);
        self.stats_mut().record_allocation();
        Ok(())
    }
}

fn fill_with<T: Element>(out: &Container, a: &Container) -> Result<()> {
    let value = read_scalar::<T>(a)?;
    write_values(out, vec![value; out.size()])
}
