//! Host-side collaborators of the VM: callable functions and bound variables.

use std::fmt;

use serde_json::{Map, Value as JsonValue};

use crate::{
    bytecode::data_type::DataType,
    runtime::{
        builtins::BUILTINS,
        container::Container,
        error::{Result, VmError},
    },
};

/// Invocation seam used by the CALL instruction.
pub trait CallTable {
    fn invoke(&mut self, index: usize, args: &[Container], ret: &mut Container) -> Result<()>;
}

/// Expected kind and rank of one host function parameter. A `None` rank
/// accepts arrays of any rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    pub data_type: DataType,
    pub rank: Option<usize>,
}

impl ParameterSpec {
    pub const fn scalar(data_type: DataType) -> Self {
        Self {
            data_type,
            rank: Some(0),
        }
    }

    pub const fn array(data_type: DataType) -> Self {
        Self {
            data_type,
            rank: None,
        }
    }

    fn accepts(&self, arg: &Container) -> bool {
        self.data_type.accepts(arg.data_type()) && self.rank.is_none_or(|rank| rank == arg.rank())
    }
}

/// A function the host exposes to scripts.
pub trait HostFunction {
    fn name(&self) -> &str;
    fn parameters(&self) -> &[ParameterSpec];
    fn return_type(&self) -> DataType;

    /// Accepts extra trailing arguments beyond `parameters`.
    fn is_variadic(&self) -> bool {
        false
    }

    fn invoke(&mut self, args: &[Container], ret: &mut Container) -> Result<()>;

    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

pub type NativeFn = Box<dyn FnMut(&[Container], &mut Container) -> Result<()>>;

/// Closure-backed `HostFunction`.
pub struct NativeFunction {
    name: String,
    parameters: Vec<ParameterSpec>,
    return_type: DataType,
    variadic: bool,
    func: NativeFn,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<ParameterSpec>,
        return_type: DataType,
        func: impl FnMut(&[Container], &mut Container) -> Result<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type,
            variadic: false,
            func: Box::new(func),
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl HostFunction for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    fn return_type(&self) -> DataType {
        self.return_type
    }

    fn is_variadic(&self) -> bool {
        self.variadic
    }

    fn invoke(&mut self, args: &[Container], ret: &mut Container) -> Result<()> {
        (self.func)(args, ret)
    }
}

/// Index-addressed registry of host functions.
#[derive(Default)]
pub struct FunctionTable {
    functions: Vec<Box<dyn HostFunction>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table preloaded with the builtin functions, in `BUILTINS` order.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        for builtin in BUILTINS {
            table.register(Box::new(builtin.to_native()));
        }
        table
    }

    /// Registers a function and returns the index CALL uses to reach it.
    pub fn register(&mut self, function: Box<dyn HostFunction>) -> usize {
        self.functions.push(function);
        self.functions.len() - 1
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.functions.iter().position(|function| function.name() == name)
    }

    pub fn get(&self, index: usize) -> Option<&dyn HostFunction> {
        self.functions.get(index).map(|function| function.as_ref())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn initialize_all(&mut self) -> Result<()> {
        self.functions
            .iter_mut()
            .try_for_each(|function| function.initialize())
    }

    pub fn finalize_all(&mut self) -> Result<()> {
        self.functions
            .iter_mut()
            .try_for_each(|function| function.finalize())
    }
}

impl CallTable for FunctionTable {
    fn invoke(&mut self, index: usize, args: &[Container], ret: &mut Container) -> Result<()> {
        let function = self
            .functions
            .get_mut(index)
            .ok_or(VmError::UnknownFunction(index as i64))?;
        check_arguments(function.as_ref(), args)?;
        function.invoke(args, ret)
    }
}

fn check_arguments(function: &dyn HostFunction, args: &[Container]) -> Result<()> {
    let parameters = function.parameters();
    let arity_ok = if function.is_variadic() {
        args.len() >= parameters.len()
    } else {
        args.len() == parameters.len()
    };
    if !arity_ok {
        return Err(VmError::host_function(
            function.name(),
            format!(
                "expects {} arguments, got {}",
                parameters.len(),
                args.len()
            ),
        ));
    }
    for (position, (spec, arg)) in parameters.iter().zip(args).enumerate() {
        if !spec.accepts(arg) {
            return Err(VmError::host_function(
                function.name(),
                format!(
                    "argument {} expected {} of rank {}, got {} of rank {}",
                    position + 1,
                    spec.data_type,
                    spec.rank.map_or_else(|| "any".to_string(), |rank| rank.to_string()),
                    arg.data_type(),
                    arg.rank()
                ),
            ));
        }
    }
    Ok(())
}

/// A host field bound to a script global.
#[derive(Debug, Clone)]
pub struct HostVariable {
    pub name: String,
    pub container: Container,
    /// Constant variables are never written back after a run.
    pub constant: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    variables: Vec<HostVariable>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, replacing any previous binding of the same name.
    pub fn register(&mut self, name: impl Into<String>, container: Container, constant: bool) {
        let name = name.into();
        let variable = HostVariable {
            name,
            container,
            constant,
        };
        match self.variables.iter_mut().find(|v| v.name == variable.name) {
            Some(existing) => *existing = variable,
            None => self.variables.push(variable),
        }
    }

    pub fn get(&self, name: &str) -> Option<&HostVariable> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut HostVariable> {
        self.variables.iter_mut().find(|variable| variable.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostVariable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .variables
            .iter()
            .map(|variable| (variable.name.clone(), variable.container.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[test]
    fn invoke_checks_arity_and_kinds() {
        let mut table = FunctionTable::new();
        let index = table.register(Box::new(NativeFunction::new(
            "twice",
            vec![ParameterSpec::scalar(DataType::Int64)],
            DataType::Int64,
            |args, ret| {
                let value = args[0].get::<i64>(0).unwrap_or_default();
                *ret = Container::scalar(value * 2);
                Ok(())
            },
        )));

        let mut ret = Container::new();
        table
            .invoke(index, &[Container::scalar(21i64)], &mut ret)
            .unwrap();
        assert_eq!(ret.get::<i64>(0), Some(42));

        let err = table.invoke(index, &[], &mut ret).unwrap_err();
        assert!(matches!(err, VmError::HostFunction { .. }));

        let err = table
            .invoke(index, &[Container::scalar(1.0f64)], &mut ret)
            .unwrap_err();
        assert!(matches!(err, VmError::HostFunction { .. }));

        assert_eq!(
            table.invoke(7, &[], &mut ret).unwrap_err(),
            VmError::UnknownFunction(7)
        );
    }

    #[test]
    fn lifecycle_hooks_run() {
        struct Counting {
            calls: Rc<Cell<u32>>,
        }

        impl HostFunction for Counting {
            fn name(&self) -> &str {
                "counting"
            }
            fn parameters(&self) -> &[ParameterSpec] {
                &[]
            }
            fn return_type(&self) -> DataType {
                DataType::Void
            }
            fn invoke(&mut self, _: &[Container], _: &mut Container) -> Result<()> {
                Ok(())
            }
            fn initialize(&mut self) -> Result<()> {
                self.calls.set(self.calls.get() + 1);
                Ok(())
            }
            fn finalize(&mut self) -> Result<()> {
                self.calls.set(self.calls.get() + 10);
                Ok(())
            }
        }

        let calls = Rc::new(Cell::new(0));
        let mut table = FunctionTable::new();
        table.register(Box::new(Counting {
            calls: Rc::clone(&calls),
        }));
        table.initialize_all().unwrap();
        table.finalize_all().unwrap();
        assert_eq!(calls.get(), 11);
    }

    #[test]
    fn register_replaces_same_name() {
        let mut variables = VariableTable::new();
        variables.register("x", Container::scalar(1i64), false);
        variables.register("x", Container::scalar(2i64), true);
        assert_eq!(variables.len(), 1);
        let x = variables.get("x").unwrap();
        assert!(x.constant);
        assert_eq!(x.container.get::<i64>(0), Some(2));
    }
}
