use crate::{
    bytecode::{data_type::DataType, op_code::OpCode},
    runtime::{
        container::Container,
        error::{Result, VmError},
    },
};

use super::{
    ExecutionUnit,
    execution_unit::{check_data_type, check_same_size, effective_type, try_map1, with_element_type},
};

impl ExecutionUnit {
    /// CAST from `from` to `to`, elementwise.
    ///
    /// Float to integer truncates toward zero. Text converts to numbers by
    /// parsing, and integer targets also accept float text (truncated).
    /// Text converts to BOOL only from exactly `true` or `false`.
    pub fn cast(&mut self, to: DataType, from: DataType, out: &mut Container, a: &Container) -> Result<()> {
        if !to.is_storable() || from == DataType::Void {
            return Err(VmError::CastFailedDueToType { from, to });
        }
        check_data_type(a, from)?;
        check_data_type(out, to)?;
        check_same_size(out.size(), &[a])?;

        let from = effective_type(from, a);
        match (to, from) {
            (DataType::Int64, DataType::Int64) => try_map1(out, a, |x: &i64| Ok(*x)),
            (DataType::Int64, DataType::Float64) => try_map1(out, a, |x: &f64| Ok(*x as i64)),
            (DataType::Int64, DataType::String) => try_map1(out, a, |x: &String| parse_int(x)),
            (DataType::Float64, DataType::Int64) => try_map1(out, a, |x: &i64| Ok(*x as f64)),
            (DataType::Float64, DataType::Float64) => try_map1(out, a, |x: &f64| Ok(*x)),
            (DataType::Float64, DataType::String) => try_map1(out, a, |x: &String| parse_float(x)),
            (DataType::Bool, DataType::Bool) => try_map1(out, a, |x: &bool| Ok(*x)),
            (DataType::Bool, DataType::String) => try_map1(out, a, |x: &String| parse_bool(x)),
            (DataType::String, DataType::Float64) => {
                try_map1(out, a, |x: &f64| Ok(format_float(*x)))
            }
            (DataType::String, kind) => with_element_type!(kind, OpCode::OpCast, |T| {
                try_map1(out, a, |x: &T| Ok(x.to_string()))
            }),
            (to, from) => Err(VmError::CastFailedDueToType { from, to }),
        }
    }
}

/// Canonical text of a float: always shows a fractional part or exponent,
/// so `2.0` stays distinguishable from the integer `2`.
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

fn parse_int(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    trimmed
        .parse::<f64>()
        .map(|value| value as i64)
        .map_err(|_| cast_value_error(text, DataType::Int64))
}

fn parse_float(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| cast_value_error(text, DataType::Float64))
}

fn parse_bool(text: &str) -> Result<bool> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(cast_value_error(text, DataType::Bool)),
    }
}

fn cast_value_error(text: &str, to: DataType) -> VmError {
    VmError::CastFailedDueToValue {
        value: text.to_string(),
        to,
    }
}
