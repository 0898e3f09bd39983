use std::{cell::RefCell, fmt, rc::Rc};

use serde_json::Value as JsonValue;

use crate::{
    bytecode::data_type::DataType,
    runtime::error::{Result, VmError},
};

/// Flat, homogeneously typed element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    String(Vec<String>),
}

impl Buffer {
    /// A zero-initialized buffer, or `None` for kinds that cannot be stored.
    pub fn new(data_type: DataType, len: usize) -> Option<Self> {
        match data_type {
            DataType::Int64 => Some(Buffer::Int64(vec![0; len])),
            DataType::Float64 => Some(Buffer::Float64(vec![0.0; len])),
            DataType::Bool => Some(Buffer::Bool(vec![false; len])),
            DataType::String => Some(Buffer::String(vec![String::new(); len])),
            DataType::Any | DataType::Void => None,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Buffer::Int64(_) => DataType::Int64,
            Buffer::Float64(_) => DataType::Float64,
            Buffer::Bool(_) => DataType::Bool,
            Buffer::String(_) => DataType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Buffer::Int64(values) => values.len(),
            Buffer::Float64(values) => values.len(),
            Buffer::Bool(values) => values.len(),
            Buffer::String(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element_json(&self, index: usize) -> JsonValue {
        match self {
            Buffer::Int64(values) => JsonValue::from(values[index]),
            Buffer::Float64(values) => JsonValue::from(values[index]),
            Buffer::Bool(values) => JsonValue::from(values[index]),
            Buffer::String(values) => JsonValue::from(values[index].clone()),
        }
    }

    fn element_text(&self, index: usize) -> String {
        match self {
            Buffer::Int64(values) => values[index].to_string(),
            Buffer::Float64(values) => format!("{:?}", values[index]),
            Buffer::Bool(values) => values[index].to_string(),
            Buffer::String(values) => format!("\"{}\"", values[index]),
        }
    }
}

pub type SharedBuffer = Rc<RefCell<Buffer>>;

/// Rust element types that map onto one `Buffer` variant.
pub trait Element: Clone + 'static {
    const DATA_TYPE: DataType;

    fn slice(buffer: &Buffer) -> Option<&[Self]>;
    fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]>;
    fn into_buffer(values: Vec<Self>) -> Buffer;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DATA_TYPE: DataType = DataType::$variant;

            fn slice(buffer: &Buffer) -> Option<&[Self]> {
                match buffer {
                    Buffer::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
                match buffer {
                    Buffer::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn into_buffer(values: Vec<Self>) -> Buffer {
                Buffer::$variant(values)
            }
        }
    };
}

impl_element!(i64, Int64);
impl_element!(f64, Float64);
impl_element!(bool, Bool);
impl_element!(String, String);

/// Whether a container owns its buffer or views a buffer shared with
/// other containers (ELEM and REF results).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Owned,
    View,
}

/// The uniform runtime value: a possibly shared flat buffer read through an
/// offset and a shape.
///
/// A rank 0 container (empty shape) is a scalar of size 1. The container
/// never checks that `offset + size` fits the buffer; the execution unit
/// keeps dimensions consistent.
#[derive(Debug, Clone)]
pub struct Container {
    buffer: Option<SharedBuffer>,
    binding: Binding,
    offset: usize,
    shape: Vec<usize>,
    size: usize,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// An unallocated scalar slot reporting kind `VOID`.
    pub fn new() -> Self {
        Self {
            buffer: None,
            binding: Binding::Owned,
            offset: 0,
            shape: Vec::new(),
            size: 1,
        }
    }

    /// An owned container over `values` read with `shape`. The shape must
    /// describe exactly `values.len()` elements.
    pub fn from_values<T: Element>(values: Vec<T>, shape: Vec<usize>) -> Result<Self> {
        let size = shape
            .iter()
            .try_fold(1usize, |size, &length| size.checked_mul(length));
        if size != Some(values.len()) {
            return Err(VmError::InvalidHostValue(format!(
                "shape {:?} does not describe {} values",
                shape,
                values.len()
            )));
        }
        let mut container = Self::new();
        container.bind_owned(T::into_buffer(values), shape);
        Ok(container)
    }

    pub fn scalar<T: Element>(value: T) -> Self {
        let mut container = Self::new();
        container.bind_owned(T::into_buffer(vec![value]), Vec::new());
        container
    }

    pub fn vector<T: Element>(values: Vec<T>) -> Self {
        let len = values.len();
        let mut container = Self::new();
        container.bind_owned(T::into_buffer(values), vec![len]);
        container
    }

    /// Rebinds buffer, binding, offset, shape and size together.
    pub fn replace_backing(
        &mut self,
        buffer: SharedBuffer,
        binding: Binding,
        offset: usize,
        shape: Vec<usize>,
    ) {
        self.size = shape_size(&shape);
        self.buffer = Some(buffer);
        self.binding = binding;
        self.offset = offset;
        self.shape = shape;
    }

    pub fn bind_owned(&mut self, buffer: Buffer, shape: Vec<usize>) {
        self.replace_backing(Rc::new(RefCell::new(buffer)), Binding::Owned, 0, shape);
    }

    pub fn bind_view(&mut self, buffer: &SharedBuffer, offset: usize, shape: Vec<usize>) {
        self.replace_backing(Rc::clone(buffer), Binding::View, offset, shape);
    }

    /// Changes the shape while keeping buffer and offset. The new shape must
    /// describe the same number of elements.
    pub fn reshape(&mut self, shape: Vec<usize>) {
        debug_assert_eq!(shape_size(&shape), self.size);
        self.shape = shape;
    }

    /// Drops this container's reference to its buffer.
    pub fn release(&mut self) {
        *self = Self::new();
    }

    pub fn buffer(&self) -> Option<&SharedBuffer> {
        self.buffer.as_ref()
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn is_allocated(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn data_type(&self) -> DataType {
        self.buffer
            .as_ref()
            .map(|buffer| buffer.borrow().data_type())
            .unwrap_or(DataType::Void)
    }

    pub fn shares_buffer_with(&self, other: &Container) -> bool {
        match (&self.buffer, &other.buffer) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Clone of the logical element at `index`, if the kind matches.
    pub fn get<T: Element>(&self, index: usize) -> Option<T> {
        if index >= self.size {
            return None;
        }
        let buffer = self.buffer.as_ref()?.borrow();
        T::slice(&buffer)?.get(self.offset + index).cloned()
    }

    /// Writes one logical element through the shared buffer.
    pub fn set<T: Element>(&self, index: usize, value: T) -> Option<()> {
        if index >= self.size {
            return None;
        }
        let mut buffer = self.buffer.as_ref()?.borrow_mut();
        let slot = T::slice_mut(&mut buffer)?.get_mut(self.offset + index)?;
        *slot = value;
        Some(())
    }

    /// The logical elements in row-major order.
    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        let buffer = self.buffer.as_ref()?.borrow();
        T::slice(&buffer)?
            .get(self.offset..self.offset + self.size)
            .map(<[T]>::to_vec)
    }

    /// A container with its own buffer holding a copy of the logical window.
    pub fn deep_copy(&self) -> Container {
        let Some(buffer) = &self.buffer else {
            return Container::new();
        };
        let window = slice_buffer(&buffer.borrow(), self.offset, self.size);
        let mut copy = Container::new();
        copy.bind_owned(window, self.shape.clone());
        copy
    }

    /// Builds a container from nested host data of the given kind.
    ///
    /// Nested arrays become axes, outermost first. Non-rectangular data is
    /// rejected as a jagged array.
    pub fn from_json(value: &JsonValue, data_type: DataType) -> Result<Container> {
        if !data_type.is_storable() {
            return Err(VmError::InvalidHostValue(format!(
                "cannot store host data as {}",
                data_type
            )));
        }

        let shape = infer_shape(value);
        let mut leaves = Vec::with_capacity(shape_size(&shape));
        collect_leaves(value, &shape, 0, &mut leaves)?;

        let buffer = match data_type {
            DataType::Int64 => Buffer::Int64(convert_leaves(&leaves, data_type, JsonValue::as_i64)?),
            DataType::Float64 => {
                Buffer::Float64(convert_leaves(&leaves, data_type, JsonValue::as_f64)?)
            }
            DataType::Bool => Buffer::Bool(convert_leaves(&leaves, data_type, JsonValue::as_bool)?),
            _ => Buffer::String(convert_leaves(&leaves, data_type, |leaf| {
                leaf.as_str().map(str::to_string)
            })?),
        };

        let mut container = Container::new();
        container.bind_owned(buffer, shape);
        Ok(container)
    }

    /// Nested host data for the logical window; `null` when unallocated.
    pub fn to_json(&self) -> JsonValue {
        let Some(buffer) = &self.buffer else {
            return JsonValue::Null;
        };
        let buffer = buffer.borrow();
        let mut items = (self.offset..self.offset + self.size).map(|i| buffer.element_json(i));
        nest_json(&self.shape, &mut items)
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(buffer) = &self.buffer else {
            return f.write_str("void");
        };
        let buffer = buffer.borrow();
        let mut items = (self.offset..self.offset + self.size).map(|i| buffer.element_text(i));
        f.write_str(&nest_text(&self.shape, &mut items))
    }
}

pub fn shape_size(shape: &[usize]) -> usize {
    shape.iter().product()
}

fn slice_buffer(buffer: &Buffer, offset: usize, size: usize) -> Buffer {
    let range = offset..offset + size;
    match buffer {
        Buffer::Int64(values) => Buffer::Int64(values[range].to_vec()),
        Buffer::Float64(values) => Buffer::Float64(values[range].to_vec()),
        Buffer::Bool(values) => Buffer::Bool(values[range].to_vec()),
        Buffer::String(values) => Buffer::String(values[range].to_vec()),
    }
}

fn infer_shape(value: &JsonValue) -> Vec<usize> {
    let mut shape = Vec::new();
    let mut current = value;
    while let JsonValue::Array(items) = current {
        shape.push(items.len());
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    shape
}

fn collect_leaves<'a>(
    value: &'a JsonValue,
    shape: &[usize],
    axis: usize,
    leaves: &mut Vec<&'a JsonValue>,
) -> Result<()> {
    match (value, shape.get(axis)) {
        (JsonValue::Array(items), Some(&expected)) => {
            if items.len() != expected {
                return Err(VmError::JaggedArray {
                    axis,
                    expected,
                    found: items.len(),
                });
            }
            for item in items {
                collect_leaves(item, shape, axis + 1, leaves)?;
            }
            Ok(())
        }
        (JsonValue::Array(items), None) => Err(VmError::JaggedArray {
            axis,
            expected: 0,
            found: items.len(),
        }),
        (_, Some(&expected)) => Err(VmError::JaggedArray {
            axis,
            expected,
            found: 0,
        }),
        (leaf, None) => {
            leaves.push(leaf);
            Ok(())
        }
    }
}

fn convert_leaves<T>(
    leaves: &[&JsonValue],
    data_type: DataType,
    convert: impl Fn(&JsonValue) -> Option<T>,
) -> Result<Vec<T>> {
    leaves
        .iter()
        .map(|leaf| {
            convert(leaf).ok_or_else(|| {
                VmError::InvalidHostValue(format!("expected {} element, found {}", data_type, leaf))
            })
        })
        .collect()
}

fn nest_json(shape: &[usize], items: &mut impl Iterator<Item = JsonValue>) -> JsonValue {
    match shape.split_first() {
        None => items.next().unwrap_or(JsonValue::Null),
        Some((&len, rest)) => JsonValue::Array((0..len).map(|_| nest_json(rest, items)).collect()),
    }
}

fn nest_text(shape: &[usize], items: &mut impl Iterator<Item = String>) -> String {
    match shape.split_first() {
        None => items.next().unwrap_or_default(),
        Some((&len, rest)) => {
            let parts: Vec<String> = (0..len).map(|_| nest_text(rest, items)).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}
