//! Runtime of the vectorized VM.
//!
//! Every value is a [`container::Container`]: a possibly shared flat buffer
//! read through an offset and a shape. Element references (ELEM, REF) alias
//! the buffer of their source, so writes through them are visible to every
//! holder of that buffer. Buffers are reference counted and never form
//! cycles.
pub mod builtins;
pub mod config;
pub mod container;
pub mod error;
pub mod error_codes;
pub mod host;
pub mod memory;
pub mod stats;
pub mod virtual_machine;
pub mod vm;
