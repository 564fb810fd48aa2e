use thiserror::Error;

use crate::opcode::Opcode;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum ProcessError {
    #[error("Invalid opcode state '{0}'.")]
    Opcode(#[from] OpcodeError),
    #[error("Invalid stack state '{0}'.")]
    Stack(#[from] StackError),
    #[error("Invalid memory access '{0}'.")]
    Memory(#[from] MemoryError),
    #[error("Invalid input '{0}'.")]
    Input(#[from] InputError),
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum OpcodeError {
    #[error("An unsupported opcode was used {0:#06X?}.")]
    InvalidOpcode(Opcode),
    #[error("Pointer location invalid there can not be an opcode at {pointer}, if data len is {len}")]
    MemoryInvalid { pointer: usize, len: usize },
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum StackError {
    #[error("Stack is full!")]
    Full,
    #[error("Stack is empty!")]
    Empty,
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum MemoryError {
    /// `address` is the first address of the access that runs past the memory.
    #[error("Memory access starting at {address:#06X} runs out of bounds.")]
    OutOfBounds { address: usize },
    #[error("The program is {len} bytes long, but only {max} bytes fit into memory.")]
    ProgramTooLarge { len: usize, max: usize },
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum InputError {
    #[error("There is no key with the index {0:#X}.")]
    InvalidKey(usize),
}
