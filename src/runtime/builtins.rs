use crate::{
    bytecode::data_type::DataType,
    runtime::{
        container::{Buffer, Container},
        error::{Result, VmError},
        host::{NativeFunction, ParameterSpec},
    },
};

pub type BuiltinFn = fn(&[Container], &mut Container) -> Result<()>;

#[derive(Clone, Copy)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub parameters: &'static [ParameterSpec],
    pub return_type: DataType,
    pub variadic: bool,
    pub func: BuiltinFn,
}

impl BuiltinFunction {
    pub fn to_native(&self) -> NativeFunction {
        let native = NativeFunction::new(
            self.name,
            self.parameters.to_vec(),
            self.return_type,
            self.func,
        );
        if self.variadic { native.variadic() } else { native }
    }
}

const FLOAT_ARRAY: &[ParameterSpec] = &[ParameterSpec::array(DataType::Float64)];

pub static BUILTINS: &[BuiltinFunction] = &[
    BuiltinFunction {
        name: "print",
        parameters: &[],
        return_type: DataType::Void,
        variadic: true,
        func: builtin_print,
    },
    BuiltinFunction {
        name: "sqrt",
        parameters: FLOAT_ARRAY,
        return_type: DataType::Float64,
        variadic: false,
        func: builtin_sqrt,
    },
    BuiltinFunction {
        name: "abs",
        parameters: FLOAT_ARRAY,
        return_type: DataType::Float64,
        variadic: false,
        func: builtin_abs,
    },
    BuiltinFunction {
        name: "sum",
        parameters: FLOAT_ARRAY,
        return_type: DataType::Float64,
        variadic: false,
        func: builtin_sum,
    },
];

pub fn get_builtin(name: &str) -> Option<&'static BuiltinFunction> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

fn builtin_print(args: &[Container], _ret: &mut Container) -> Result<()> {
    let parts: Vec<String> = args
        .iter()
        .map(|arg| match arg.get::<String>(0) {
            Some(text) if arg.rank() == 0 => text,
            _ => arg.to_string(),
        })
        .collect();
    println!("{}", parts.join(" "));
    Ok(())
}

fn float_values(name: &str, arg: &Container) -> Result<Vec<f64>> {
    arg.to_vec::<f64>()
        .ok_or_else(|| VmError::host_function(name, "expected an allocated FLOAT64 argument"))
}

fn map_floats(name: &str, args: &[Container], ret: &mut Container, f: fn(f64) -> f64) -> Result<()> {
    let values = float_values(name, &args[0])?;
    let mapped = values.into_iter().map(f).collect();
    ret.bind_owned(Buffer::Float64(mapped), args[0].shape().to_vec());
    Ok(())
}

fn builtin_sqrt(args: &[Container], ret: &mut Container) -> Result<()> {
    map_floats("sqrt", args, ret, f64::sqrt)
}

fn builtin_abs(args: &[Container], ret: &mut Container) -> Result<()> {
    map_floats("abs", args, ret, f64::abs)
}

fn builtin_sum(args: &[Container], ret: &mut Container) -> Result<()> {
    let total: f64 = float_values("sum", &args[0])?.into_iter().sum();
    ret.bind_owned(Buffer::Float64(vec![total]), Vec::new());
    Ok(())
}
