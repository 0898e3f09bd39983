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
        buffer_of, check_data_type, check_same_size, effective_type, read_scalar, read_values,
        with_element_type, write_values,
    },
};

impl ExecutionUnit {
    /// Makes `out` a rank 0 view of one element of `src`.
    ///
    /// The index operands are INT64; their elements, concatenated in order,
    /// form one subscript per axis of `src`, most significant axis first.
    /// Writes through `out` land in `src`'s buffer.
    pub fn elem(
        &mut self,
        data_type: DataType,
        out: &mut Container,
        src: &Container,
        indices: &[Container],
    ) -> Result<()> {
        check_data_type(src, data_type)?;
        let index = flat_index(src, indices)?;
        let buffer = buffer_of(src, data_type)?;
        out.bind_view(buffer, src.offset() + index, Vec::new());
        Ok(())
    }

    /// Copies one element of `src`, addressed like ELEM, into the scalar
    /// `out`. An unallocated `out` gets its own scalar buffer.
    pub fn movelm(
        &mut self,
        data_type: DataType,
        out: &mut Container,
        src: &Container,
        indices: &[Container],
    ) -> Result<()> {
        check_data_type(src, data_type)?;
        let kind = effective_type(data_type, src);
        let index = flat_index(src, indices)?;
        if !out.is_allocated() {
            self.allocate(OpCode::OpMovelm, kind, out, Vec::new())?;
        }
        check_data_type(out, kind)?;
        check_same_size(1, &[&*out])?;
        with_element_type!(kind, OpCode::OpMovelm, |T| copy_element::<T>(out, src, index))
    }

    /// Number of elements of `src` along `axis` (axis 0 when omitted). A
    /// scalar has length 1 along axis 0.
    pub fn len(
        &mut self,
        data_type: DataType,
        out: &mut Container,
        src: &Container,
        axis: Option<&Container>,
    ) -> Result<()> {
        if data_type != DataType::Int64 {
            return Err(VmError::UnsupportedDataType {
                op: OpCode::OpLen,
                data_type,
            });
        }
        let axis = match axis {
            Some(axis) => {
                check_data_type(axis, DataType::Int64)?;
                read_scalar::<i64>(axis)?
            }
            None => 0,
        };
        let length = match (src.rank(), usize::try_from(axis)) {
            (0, Ok(0)) => src.size(),
            (rank, Ok(axis)) if axis < rank => src.shape()[axis],
            (rank, _) => {
                return Err(VmError::InvalidArrayIndex {
                    axis: 0,
                    index: axis,
                    length: rank.max(1),
                });
            }
        };

        if !out.is_allocated() {
            self.allocate(OpCode::OpLen, DataType::Int64, out, Vec::new())?;
        }
        check_data_type(out, DataType::Int64)?;
        check_same_size(1, &[&*out])?;
        write_values(out, vec![length as i64])
    }
}

/// Row-major flat offset (relative to `src.offset()`) of the element the
/// index operands select.
fn flat_index(src: &Container, indices: &[Container]) -> Result<usize> {
    let mut subscripts = Vec::with_capacity(src.rank());
    for index in indices {
        check_data_type(index, DataType::Int64)?;
        subscripts.extend(read_values::<i64>(index)?);
    }
    if subscripts.len() != src.rank() {
        return Err(VmError::InvalidSubscriptRank {
            rank: src.rank(),
            found: subscripts.len(),
        });
    }

    let mut flat = 0;
    let mut stride = 1;
    for (axis, (&index, &length)) in subscripts.iter().zip(src.shape()).enumerate().rev() {
        let position = usize::try_from(index)
            .ok()
            .filter(|&position| position < length)
            .ok_or(VmError::InvalidArrayIndex {
                axis,
                index,
                length,
            })?;
        flat += position * stride;
        stride *= length;
    }
    Ok(flat)
}

fn copy_element<T: Element>(out: &Container, src: &Container, index: usize) -> Result<()> {
    let value = {
        let buffer = buffer_of(src, T::DATA_TYPE)?.borrow();
        let values = T::slice(&buffer).ok_or(VmError::DataTypeMismatch {
            expected: T::DATA_TYPE,
            found: buffer.data_type(),
        })?;
        values
            .get(src.offset() + index)
            .cloned()
            .ok_or(VmError::SizeMismatch {
                expected: src.offset() + index + 1,
                found: values.len(),
            })?
    };
    write_values(out, vec![value])
}
