use crate::{
    bytecode::{data_type::DataType, op_code::OpCode},
    runtime::{
        container::Container,
        error::{Result, VmError},
    },
};

use super::{
    ExecutionUnit,
    execution_unit::{check_data_type, checked_shape_size, read_scalar, read_values},
};

impl ExecutionUnit {
    /// ALLOC with extent operands:
    ///
    /// - none: a scalar;
    /// - `size, lengths` where `lengths` is an array: one axis per element of
    ///   `lengths`, whose product must equal `size`;
    /// - otherwise every element of every operand is one axis length, so a
    ///   single scalar gives a vector.
    ///
    /// The buffer is reused when kind and total size are unchanged, which
    /// keeps existing aliases of it valid.
    pub fn alloc(&mut self, data_type: DataType, out: &mut Container, extents: &[Container]) -> Result<()> {
        if !data_type.is_storable() {
            return Err(VmError::UnsupportedDataType {
                op: OpCode::OpAlloc,
                data_type,
            });
        }
        check_kind_unchanged(out, data_type)?;

        let shape = match extents {
            [size, lengths] if size.rank() == 0 && lengths.rank() >= 1 => {
                let size = to_length(read_extent_scalar(size)?)?;
                let shape = read_lengths(lengths)?;
                let product = checked_shape_size(&shape)?;
                if product != size {
                    return Err(VmError::SizeMismatch {
                        expected: size,
                        found: product,
                    });
                }
                shape
            }
            _ => {
                let mut shape = Vec::with_capacity(extents.len());
                for extent in extents {
                    shape.extend(read_lengths(extent)?);
                }
                shape
            }
        };

        self.allocate(OpCode::OpAlloc, data_type, out, shape)
    }

    /// ALLOCR: allocates `out` with the shape of `template`.
    pub fn alloc_same_shape(
        &mut self,
        data_type: DataType,
        out: &mut Container,
        template: &Container,
    ) -> Result<()> {
        check_kind_unchanged(out, data_type)?;
        let shape = template.shape().to_vec();
        self.allocate(OpCode::OpAllocr, data_type, out, shape)
    }
}

/// An allocated output keeps the kind it was first allocated with.
fn check_kind_unchanged(out: &Container, data_type: DataType) -> Result<()> {
    if out.is_allocated() && out.data_type() != data_type {
        return Err(VmError::DataTypeMismatch {
            expected: data_type,
            found: out.data_type(),
        });
    }
    Ok(())
}

fn read_extent_scalar(container: &Container) -> Result<i64> {
    check_data_type(container, DataType::Int64)?;
    read_scalar::<i64>(container)
}

fn read_lengths(container: &Container) -> Result<Vec<usize>> {
    check_data_type(container, DataType::Int64)?;
    read_values::<i64>(container)?
        .into_iter()
        .map(to_length)
        .collect()
}

fn to_length(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| VmError::InvalidArrayLength(value))
}
