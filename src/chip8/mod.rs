//! The full implementation of the chip8 virtual machine, from the instruction semantics to an
//! option to pretty print its state.
mod config;
mod machine;
mod opcodes;
mod print;

/// reexport machine structs and data for simpler usage
pub use config::*;
pub use machine::*;
