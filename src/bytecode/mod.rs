pub mod data_type;
pub mod instruction;
pub mod object_code;
pub mod op_code;
