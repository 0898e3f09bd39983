use crate::{
    bytecode::{instruction::Partition, object_code::ObjectCode},
    runtime::{
        container::Container,
        error::{Result, VmError},
        host::VariableTable,
    },
};

/// Addressable storage the dispatcher reads operands from.
pub trait MemoryAccess {
    fn get(&self, partition: Partition, address: usize) -> Result<&Container>;
    fn get_mut(&mut self, partition: Partition, address: usize) -> Result<&mut Container>;
}

/// Partitioned container storage for one script execution.
#[derive(Debug, Default, Clone)]
pub struct Memory {
    globals: Vec<Container>,
    locals: Vec<Container>,
    constants: Vec<Container>,
    registers: Vec<Container>,
    void: Container,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lays out every partition the object code asks for.
    ///
    /// Global slots share their buffers with the bound host variables, so
    /// in-place writes during the run are visible to the host directly.
    pub fn allocate(object_code: &ObjectCode, variables: &VariableTable) -> Result<Self> {
        let constants = object_code
            .constants
            .iter()
            .map(|constant| Container::from_json(&constant.value, constant.data_type))
            .collect::<Result<Vec<_>>>()?;

        let mut memory = Self {
            globals: Vec::new(),
            locals: vec![Container::new(); object_code.locals],
            constants,
            registers: vec![Container::new(); object_code.registers],
            void: Container::new(),
        };
        memory.refresh_globals(object_code, variables)?;
        Ok(memory)
    }

    /// Rebinds the global partition to the current host variables while
    /// leaving every other partition untouched.
    pub fn refresh_globals(
        &mut self,
        object_code: &ObjectCode,
        variables: &VariableTable,
    ) -> Result<()> {
        let len = object_code.max_global_address().map_or(0, |max| max + 1);
        let mut globals = vec![Container::new(); len];
        for slot in &object_code.globals {
            let variable = variables.get(&slot.name).ok_or_else(|| {
                VmError::ObjectCode(format!("global `{}` has no host variable", slot.name))
            })?;
            globals[slot.address] = variable.container.clone();
        }
        self.globals = globals;
        Ok(())
    }

    pub fn partition(&self, partition: Partition) -> &[Container] {
        match partition {
            Partition::Global => &self.globals,
            Partition::Local => &self.locals,
            Partition::Constant => &self.constants,
            Partition::Register => &self.registers,
            Partition::None => std::slice::from_ref(&self.void),
        }
    }

    pub fn set(&mut self, partition: Partition, address: usize, container: Container) -> Result<()> {
        *self.get_mut(partition, address)? = container;
        Ok(())
    }
}

impl MemoryAccess for Memory {
    fn get(&self, partition: Partition, address: usize) -> Result<&Container> {
        if partition == Partition::None {
            return Ok(&self.void);
        }
        self.partition(partition)
            .get(address)
            .ok_or(VmError::MemoryAccessOutOfBounds { partition, address })
    }

    fn get_mut(&mut self, partition: Partition, address: usize) -> Result<&mut Container> {
        let slots = match partition {
            Partition::Global => &mut self.globals,
            Partition::Local => &mut self.locals,
            Partition::Constant => &mut self.constants,
            Partition::Register => &mut self.registers,
            Partition::None => {
                // Whatever was written through NONE last time is discarded.
                self.void = Container::new();
                return Ok(&mut self.void);
            }
        };
        slots
            .get_mut(address)
            .ok_or(VmError::MemoryAccessOutOfBounds { partition, address })
    }
}
