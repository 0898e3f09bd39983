use std::rc::Rc;

use crate::{
    bytecode::{
        data_type::DataType,
        instruction::Instruction,
        op_code::{OpCode, declared_type_count, operand_range},
    },
    runtime::{
        container::{Buffer, Container, Element, SharedBuffer},
        error::{Result, VmError},
        stats::PerformanceStats,
    },
};

/// Runs `$body` with `$t` bound to the Rust element type of a storable
/// kind. Other kinds are unsupported by `$op`.
macro_rules! with_element_type {
    ($data_type:expr, $op:expr, |$t:ident| $body:expr) => {
        match $data_type {
            DataType::Int64 => {
                type $t = i64;
                $body
            }
            DataType::Float64 => {
                type $t = f64;
                $body
            }
            DataType::Bool => {
                type $t = bool;
                $body
            }
            DataType::String => {
                type $t = String;
                $body
            }
            other => Err(VmError::UnsupportedDataType {
                op: $op,
                data_type: other,
            }),
        }
    };
}

pub(super) use with_element_type;

/// Type-dispatching implementation of every non-control opcode.
///
/// Each operation mutates its output container in place. Outputs that share
/// a buffer with an input are computed into a temporary first.
#[derive(Debug, Default)]
pub struct ExecutionUnit {
    stats: PerformanceStats,
}

impl ExecutionUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> PerformanceStats {
        self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut PerformanceStats {
        &mut self.stats
    }

    /// Executes one instruction whose output is `out` and whose remaining
    /// operands are `inputs`, in order.
    pub fn execute(
        &mut self,
        instruction: &Instruction,
        out: &mut Container,
        inputs: &[Container],
    ) -> Result<()> {
        let op = instruction.op;
        check_instruction_shape(instruction, inputs.len() + 1)?;
        let data_type = instruction.data_type();

        match op {
            OpCode::OpAdd | OpCode::OpSub | OpCode::OpMul | OpCode::OpDiv | OpCode::OpRem => {
                self.arithmetic(op, data_type, out, &inputs[0], &inputs[1])
            }
            OpCode::OpNeg => self.neg(data_type, out, &inputs[0]),
            OpCode::OpEq
            | OpCode::OpNeq
            | OpCode::OpGt
            | OpCode::OpLt
            | OpCode::OpGeq
            | OpCode::OpLeq => self.compare(op, data_type, out, &inputs[0], &inputs[1]),
            OpCode::OpAnd | OpCode::OpOr => {
                self.logical(op, data_type, out, &inputs[0], &inputs[1])
            }
            OpCode::OpNot => self.not(data_type, out, &inputs[0]),
            OpCode::OpMov => self.mov(data_type, out, &inputs[0]),
            OpCode::OpRef => self.reference(data_type, out, &inputs[0]),
            OpCode::OpFill => self.fill(data_type, out, &inputs[0]),
            OpCode::OpAlloc => self.alloc(data_type, out, inputs),
            OpCode::OpAllocr => self.alloc_same_shape(data_type, out, &inputs[0]),
            OpCode::OpFree => {
                self.free(out);
                Ok(())
            }
            OpCode::OpCast => self.cast(
                instruction.data_types[0],
                instruction.data_types[1],
                out,
                &inputs[0],
            ),
            OpCode::OpVec => self.vec(data_type, out, inputs),
            OpCode::OpElem => self.elem(data_type, out, &inputs[0], &inputs[1..]),
            OpCode::OpMovelm => self.movelm(data_type, out, &inputs[0], &inputs[1..]),
            OpCode::OpLen => self.len(data_type, out, &inputs[0], inputs.get(1)),
            OpCode::OpJmp
            | OpCode::OpJmpn
            | OpCode::OpCall
            | OpCode::OpEnd
            | OpCode::OpLabel
            | OpCode::OpNop => Err(VmError::UnsupportedDataType { op, data_type }),
        }
    }

    /// Binds `out` to a buffer of `data_type` with `shape`, reusing its
    /// current buffer when kind and total size are unchanged.
    pub(super) fn allocate(
        &mut self,
        op: OpCode,
        data_type: DataType,
        out: &mut Container,
        shape: Vec<usize>,
    ) -> Result<()> {
        if !data_type.is_storable() {
            return Err(VmError::UnsupportedDataType { op, data_type });
        }
        let size = checked_shape_size(&shape)?;
        if out.is_allocated() && out.data_type() == data_type && out.size() == size {
            out.reshape(shape);
            self.stats.record_reuse();
            return Ok(());
        }
        let buffer = Buffer::new(data_type, size).ok_or(VmError::UnsupportedDataType { op, data_type })?;
        out.bind_owned(buffer, shape);
        self.stats.record_allocation();
        Ok(())
    }
}

/// Total element count of `shape`, rejecting products that overflow.
pub(super) fn checked_shape_size(shape: &[usize]) -> Result<usize> {
    shape.iter().try_fold(1usize, |size, &length| {
        size.checked_mul(length)
            .ok_or(VmError::InvalidArrayLength(i64::try_from(length).unwrap_or(i64::MAX)))
    })
}

/// Validates operand and declared kind counts against the opcode.
pub(crate) fn check_instruction_shape(instruction: &Instruction, operand_count: usize) -> Result<()> {
    let op = instruction.op;
    let (min, max) = operand_range(op);
    if operand_count < min || max.is_some_and(|max| operand_count > max) {
        let expected = match max {
            Some(max) if max == min => min.to_string(),
            Some(max) => format!("{}..={}", min, max),
            None => format!("at least {}", min),
        };
        return Err(VmError::InvalidOperandCount {
            op,
            expected,
            found: operand_count,
        });
    }
    let expected = declared_type_count(op);
    if instruction.data_types.len() != expected {
        return Err(VmError::InvalidDeclaredTypes {
            op,
            expected,
            found: instruction.data_types.len(),
        });
    }
    Ok(())
}

pub(super) fn check_data_type(container: &Container, declared: DataType) -> Result<()> {
    let found = container.data_type();
    if declared.accepts(found) {
        Ok(())
    } else {
        Err(VmError::DataTypeMismatch {
            expected: declared,
            found,
        })
    }
}

pub(super) fn check_same_size(expected: usize, containers: &[&Container]) -> Result<()> {
    for container in containers {
        if container.size() != expected {
            return Err(VmError::SizeMismatch {
                expected,
                found: container.size(),
            });
        }
    }
    Ok(())
}

/// Resolves a declared kind to the stored kind of `container` when the
/// declaration is `ANY`.
pub(super) fn effective_type(declared: DataType, container: &Container) -> DataType {
    match declared {
        DataType::Any => container.data_type(),
        declared => declared,
    }
}

pub(super) fn buffer_of(container: &Container, expected: DataType) -> Result<&SharedBuffer> {
    container.buffer().ok_or(VmError::DataTypeMismatch {
        expected,
        found: DataType::Void,
    })
}

pub(super) fn window<T: Element>(buffer: &Buffer, offset: usize, len: usize) -> Result<&[T]> {
    let values = T::slice(buffer).ok_or(VmError::DataTypeMismatch {
        expected: T::DATA_TYPE,
        found: buffer.data_type(),
    })?;
    values.get(offset..offset + len).ok_or(VmError::SizeMismatch {
        expected: offset + len,
        found: values.len(),
    })
}

pub(super) fn window_mut<T: Element>(
    buffer: &mut Buffer,
    offset: usize,
    len: usize,
) -> Result<&mut [T]> {
    let found = buffer.data_type();
    let values = T::slice_mut(buffer).ok_or(VmError::DataTypeMismatch {
        expected: T::DATA_TYPE,
        found,
    })?;
    let available = values.len();
    values
        .get_mut(offset..offset + len)
        .ok_or(VmError::SizeMismatch {
            expected: offset + len,
            found: available,
        })
}

/// Overwrites the logical window of `out` with `values`.
pub(super) fn write_values<T: Element>(out: &Container, values: Vec<T>) -> Result<()> {
    let buffer = buffer_of(out, T::DATA_TYPE)?;
    let mut buffer = buffer.borrow_mut();
    let dst = window_mut::<T>(&mut buffer, out.offset(), values.len())?;
    for (slot, value) in dst.iter_mut().zip(values) {
        *slot = value;
    }
    Ok(())
}

/// Logical elements of `container` as an owned vector.
pub(super) fn read_values<T: Element>(container: &Container) -> Result<Vec<T>> {
    let buffer = buffer_of(container, T::DATA_TYPE)?.borrow();
    Ok(window::<T>(&buffer, container.offset(), container.size())?.to_vec())
}

/// Whether any logical element of `container` satisfies `pred`.
pub(super) fn any_value<T: Element>(container: &Container, pred: impl FnMut(&T) -> bool) -> Result<bool> {
    let buffer = buffer_of(container, T::DATA_TYPE)?.borrow();
    Ok(window::<T>(&buffer, container.offset(), container.size())?
        .iter()
        .any(pred))
}

/// The single element of a size-1 container.
pub(super) fn read_scalar<T: Element>(container: &Container) -> Result<T> {
    check_same_size(1, &[container])?;
    let buffer = buffer_of(container, T::DATA_TYPE)?.borrow();
    Ok(window::<T>(&buffer, container.offset(), 1)?[0].clone())
}

/// `out[i] = f(a[i])` over the logical size of `out`.
pub(super) fn map1<A, O>(out: &Container, a: &Container, mut f: impl FnMut(&A) -> O) -> Result<()>
where
    A: Element,
    O: Element,
{
    let len = out.size();
    let out_buffer = buffer_of(out, O::DATA_TYPE)?;
    let a_buffer = buffer_of(a, A::DATA_TYPE)?;

    if Rc::ptr_eq(out_buffer, a_buffer) {
        let values: Vec<O> = {
            let a_ref = a_buffer.borrow();
            window::<A>(&a_ref, a.offset(), len)?.iter().map(&mut f).collect()
        };
        return write_values(out, values);
    }

    let a_ref = a_buffer.borrow();
    let mut out_ref = out_buffer.borrow_mut();
    let xs = window::<A>(&a_ref, a.offset(), len)?;
    let dst = window_mut::<O>(&mut out_ref, out.offset(), len)?;
    for (slot, x) in dst.iter_mut().zip(xs) {
        *slot = f(x);
    }
    Ok(())
}

/// `out[i] = f(a[i], b[i])` over the logical size of `out`.
pub(super) fn map2<A, B, O>(
    out: &Container,
    a: &Container,
    b: &Container,
    mut f: impl FnMut(&A, &B) -> O,
) -> Result<()>
where
    A: Element,
    B: Element,
    O: Element,
{
    let len = out.size();
    let out_buffer = buffer_of(out, O::DATA_TYPE)?;
    let a_buffer = buffer_of(a, A::DATA_TYPE)?;
    let b_buffer = buffer_of(b, B::DATA_TYPE)?;

    if Rc::ptr_eq(out_buffer, a_buffer) || Rc::ptr_eq(out_buffer, b_buffer) {
        let values: Vec<O> = {
            let a_ref = a_buffer.borrow();
            let b_ref = b_buffer.borrow();
            let xs = window::<A>(&a_ref, a.offset(), len)?;
            let ys = window::<B>(&b_ref, b.offset(), len)?;
            xs.iter().zip(ys).map(|(x, y)| f(x, y)).collect()
        };
        return write_values(out, values);
    }

    let a_ref = a_buffer.borrow();
    let b_ref = b_buffer.borrow();
    let mut out_ref = out_buffer.borrow_mut();
    let xs = window::<A>(&a_ref, a.offset(), len)?;
    let ys = window::<B>(&b_ref, b.offset(), len)?;
    let dst = window_mut::<O>(&mut out_ref, out.offset(), len)?;
    for ((slot, x), y) in dst.iter_mut().zip(xs).zip(ys) {
        *slot = f(x, y);
    }
    Ok(())
}

/// Like `map1`, but `f` may fail. Nothing is written unless every element
/// converts.
pub(super) fn try_map1<A, O>(
    out: &Container,
    a: &Container,
    f: impl FnMut(&A) -> Result<O>,
) -> Result<()>
where
    A: Element,
    O: Element,
{
    let values: Vec<O> = {
        let a_ref = buffer_of(a, A::DATA_TYPE)?.borrow();
        window::<A>(&a_ref, a.offset(), out.size())?
            .iter()
            .map(f)
            .collect::<Result<_>>()?
    };
    write_values(out, values)
}
