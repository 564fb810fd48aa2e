//! Opcode abstractions, functionality and constants.
use std::convert::TryFrom;

use crate::{definitions::memory, OpcodeError};

/// the base mask used for generating all the other sub masks
pub(crate) const OPCODE_MASK_FFFF: u16 = u16::MAX;

/// the mask for the first twelve bits
pub(crate) const OPCODE_MASK_FFF0: u16 = OPCODE_MASK_FFFF << 4;

/// the mask for the first eight bits
pub(crate) const OPCODE_MASK_FF00: u16 = OPCODE_MASK_FFFF << 8;

/// the mask for the first four bits
pub(crate) const OPCODE_MASK_F000: u16 = OPCODE_MASK_FFFF << 12;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FFF0;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FF00;

/// the mask for the last twelve bits
pub(crate) const OPCODE_MASK_0FFF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_F000;

/// a single nibble
const NIBBLE: u16 = 4;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1` make
/// the opcode up
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
/// # use chip::OpcodeError;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// # let pointer = 3;
/// # let err = OpcodeError::MemoryInvalid {pointer, len: SPLIT_OPCODE.len() };
/// # assert_eq!(Err(err), build_opcode(&SPLIT_OPCODE, pointer));
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, OpcodeError> {
    if pointer + 1 < data.len() {
        Ok(Opcode::from_be_bytes([data[pointer], data[pointer + 1]]))
    } else {
        Err(OpcodeError::MemoryInvalid {
            pointer,
            len: data.len(),
        })
    }
}

/// These are special traits used to filter out information
/// from opcodes
pub trait OpcodeTrait {
    /// The instruction family, the highest nibble `T` of `TXYN`.
    fn t(&self) -> u8;

    /// The address part `NNN` of `TNNN`.
    fn nnn(&self) -> u16;

    /// The register index `X` of `TXYN`.
    fn x(&self) -> usize;

    /// The register index `Y` of `TXYN`.
    fn y(&self) -> usize;

    /// The lowest nibble `N` of `TXYN`.
    fn n(&self) -> u8;

    /// The constant `NN` of `TXNN`.
    fn nn(&self) -> u8;
}

impl OpcodeTrait for Opcode {
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.t(), 0x1);
    /// ```
    fn t(&self) -> u8 {
        ((self & OPCODE_MASK_F000) >> (3 * NIBBLE)) as u8
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.nnn(), 0xEDA)
    /// ```
    fn nnn(&self) -> u16 {
        self & OPCODE_MASK_0FFF
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.x(), 0xE);
    /// ```
    fn x(&self) -> usize {
        ((self & OPCODE_MASK_0FFF & OPCODE_MASK_FF00) >> (2 * NIBBLE)) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.y(), 0xD);
    /// ```
    fn y(&self) -> usize {
        ((self & OPCODE_MASK_00FF & OPCODE_MASK_FFF0) >> NIBBLE) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.n(), 0xA);
    /// ```
    fn n(&self) -> u8 {
        (self & OPCODE_MASK_000F) as u8
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.nn(), 0xDA);
    /// ```
    fn nn(&self) -> u8 {
        (self & OPCODE_MASK_00FF) as u8
    }
}

/// The sub instructions of the `8XYN` family, selected by `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOpcode {
    /// `8XY0` - Sets `VX` to the value of `VY`.
    Assign,
    /// `8XY1` - Sets `VX` to `VX | VY`.
    Or,
    /// `8XY2` - Sets `VX` to `VX & VY`.
    And,
    /// `8XY3` - Sets `VX` to `VX ^ VY`.
    Xor,
    /// `8XY4` - Adds `VY` to `VX`, `VF` is set to `1` on carry.
    AddCarry,
    /// `8XY5` - Subtracts `VY` from `VX`, `VF` is set to `0` on borrow.
    SubBorrow,
    /// `8XY6` - Shifts `VX` right by one, `VF` receives the shifted out bit.
    ShiftRight,
    /// `8XY7` - Sets `VX` to `VY - VX`, `VF` is set to `0` on borrow.
    SubReverse,
    /// `8XYE` - Shifts `VX` left by one, `VF` receives the shifted out bit.
    ShiftLeft,
}

impl TryFrom<u8> for ArithmeticOpcode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let ops = match value {
            0x0 => ArithmeticOpcode::Assign,
            0x1 => ArithmeticOpcode::Or,
            0x2 => ArithmeticOpcode::And,
            0x3 => ArithmeticOpcode::Xor,
            0x4 => ArithmeticOpcode::AddCarry,
            0x5 => ArithmeticOpcode::SubBorrow,
            0x6 => ArithmeticOpcode::ShiftRight,
            0x7 => ArithmeticOpcode::SubReverse,
            0xE => ArithmeticOpcode::ShiftLeft,
            _ => return Err(()),
        };
        Ok(ops)
    }
}

/// The decoded form of every canonical chip8 instruction.
///
/// `x` and `y` are register indexes, `nn` is a byte constant, `nnn` a 12 bit address
/// and `n` the 4 bit sprite height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `0NNN` - Calls machine code routine at `NNN`, ignored by this machine.
    System { nnn: u16 },
    /// `00E0` - Clears the screen.
    Clear,
    /// `00EE` - Returns from a subroutine.
    Return,
    /// `1NNN` - Jumps to address `NNN`.
    Jump { nnn: u16 },
    /// `2NNN` - Calls subroutine at `NNN`.
    Call { nnn: u16 },
    /// `3XNN` - Skips the next instruction if `VX` equals `NN`.
    SkipEqual { x: usize, nn: u8 },
    /// `4XNN` - Skips the next instruction if `VX` doesn't equal `NN`.
    SkipNotEqual { x: usize, nn: u8 },
    /// `5XY0` - Skips the next instruction if `VX` equals `VY`.
    SkipRegistersEqual { x: usize, y: usize },
    /// `6XNN` - Sets `VX` to `NN`.
    Set { x: usize, nn: u8 },
    /// `7XNN` - Adds `NN` to `VX`. (Carry flag is not changed)
    Add { x: usize, nn: u8 },
    /// `8XYN` - Register arithmetic and logic, see [`ArithmeticOpcode`].
    Arithmetic { ops: ArithmeticOpcode, x: usize, y: usize },
    /// `9XY0` - Skips the next instruction if `VX` doesn't equal `VY`.
    SkipRegistersNotEqual { x: usize, y: usize },
    /// `ANNN` - Sets `I` to the address `NNN`.
    SetIndex { nnn: u16 },
    /// `BNNN` - Jumps to the address `NNN` plus `V0`.
    JumpOffset { nnn: u16 },
    /// `CXNN` - Sets `VX` to a random byte and `NN`.
    Random { x: usize, nn: u8 },
    /// `DXYN` - Draws an `8xN` sprite from `I` at `(VX, VY)`.
    Draw { x: usize, y: usize, n: u8 },
    /// `EX9E` - Skips the next instruction if the key in `VX` is pressed.
    SkipKeyPressed { x: usize },
    /// `EXA1` - Skips the next instruction if the key in `VX` isn't pressed.
    SkipKeyNotPressed { x: usize },
    /// `FX07` - Sets `VX` to the value of the delay timer.
    GetDelayTimer { x: usize },
    /// `FX0A` - A key press is awaited, and then stored in `VX`.
    AwaitKeyPress { x: usize },
    /// `FX15` - Sets the delay timer to `VX`.
    SetDelayTimer { x: usize },
    /// `FX18` - Sets the sound timer to `VX`.
    SetSoundTimer { x: usize },
    /// `FX1E` - Adds `VX` to `I`. `VF` is not affected.
    AddIndex { x: usize },
    /// `FX29` - Sets `I` to the font sprite of the character in `VX`.
    SetIndexToSprite { x: usize },
    /// `FX33` - Stores the binary-coded decimal of `VX` at `I`, `I+1` and `I+2`.
    StoreBcd { x: usize },
    /// `FX55` - Stores `V0` to `VX` (including) starting at `I`.
    StoreRegisters { x: usize },
    /// `FX65` - Fills `V0` to `VX` (including) starting at `I`.
    LoadRegisters { x: usize },
}

impl TryFrom<Opcode> for Instruction {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        let (x, y, n, nn, nnn) = (value.x(), value.y(), value.n(), value.nn(), value.nnn());
        let instruction = match (value.t(), n) {
            (0x0, _) => match value {
                0x00E0 => Instruction::Clear,
                0x00EE => Instruction::Return,
                _ => Instruction::System { nnn },
            },
            (0x1, _) => Instruction::Jump { nnn },
            (0x2, _) => Instruction::Call { nnn },
            (0x3, _) => Instruction::SkipEqual { x, nn },
            (0x4, _) => Instruction::SkipNotEqual { x, nn },
            (0x5, 0x0) => Instruction::SkipRegistersEqual { x, y },
            (0x6, _) => Instruction::Set { x, nn },
            (0x7, _) => Instruction::Add { x, nn },
            (0x8, _) => {
                let ops = ArithmeticOpcode::try_from(n)
                    .map_err(|_| OpcodeError::InvalidOpcode(value))?;
                Instruction::Arithmetic { ops, x, y }
            }
            (0x9, 0x0) => Instruction::SkipRegistersNotEqual { x, y },
            (0xA, _) => Instruction::SetIndex { nnn },
            (0xB, _) => Instruction::JumpOffset { nnn },
            (0xC, _) => Instruction::Random { x, nn },
            (0xD, _) => Instruction::Draw { x, y, n },
            (0xE, _) => match nn {
                0x9E => Instruction::SkipKeyPressed { x },
                0xA1 => Instruction::SkipKeyNotPressed { x },
                _ => return Err(OpcodeError::InvalidOpcode(value)),
            },
            (0xF, _) => match nn {
                0x07 => Instruction::GetDelayTimer { x },
                0x0A => Instruction::AwaitKeyPress { x },
                0x15 => Instruction::SetDelayTimer { x },
                0x18 => Instruction::SetSoundTimer { x },
                0x1E => Instruction::AddIndex { x },
                0x29 => Instruction::SetIndexToSprite { x },
                0x33 => Instruction::StoreBcd { x },
                0x55 => Instruction::StoreRegisters { x },
                0x65 => Instruction::LoadRegisters { x },
                _ => return Err(OpcodeError::InvalidOpcode(value)),
            },
            _ => return Err(OpcodeError::InvalidOpcode(value)),
        };
        Ok(instruction)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents the program counter movements an instruction requests
/// after the fetch already moved past it.
pub enum ProgramCounterStep {
    /// Will continue with the next instruction
    Next,
    /// Will skip the next instruction
    Skip,
    /// Will execute the same instruction again
    Hold,
    /// Will move the program counter to the given location, masked to 12 bits.
    Jump(u16),
}

impl ProgramCounterStep {
    /// Will return a Skip if the condition is true.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next, ProgramCounterStep::cond(false));
    /// assert_eq!(ProgramCounterStep::Skip, ProgramCounterStep::cond(true));
    /// ```
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }

    /// Applies the step to a program counter that already points past the
    /// current instruction.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next.apply(0x202), 0x202);
    /// assert_eq!(ProgramCounterStep::Skip.apply(0x202), 0x204);
    /// assert_eq!(ProgramCounterStep::Hold.apply(0x202), 0x200);
    /// assert_eq!(ProgramCounterStep::Jump(0x1234).apply(0x202), 0x234);
    /// ```
    #[inline]
    pub fn apply(&self, program_counter: u16) -> u16 {
        let next = match *self {
            ProgramCounterStep::Next => program_counter,
            ProgramCounterStep::Skip => program_counter.wrapping_add(memory::opcodes::SIZE),
            ProgramCounterStep::Hold => program_counter.wrapping_sub(memory::opcodes::SIZE),
            ProgramCounterStep::Jump(pointer) => pointer,
        };
        next & memory::ADDRESS_MASK
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents a command from the interpreter up to the driver.
pub enum Operation {
    /// If no action has to be taken.
    None,
    /// The framebuffer changed and shall be presented again.
    Draw,
    /// The machine waits for the next key press, the
    /// instruction will run again on the next step.
    Wait,
    /// The opcode is not part of the instruction set and was skipped.
    Unknown(Opcode),
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use super::*;

    #[test]
    fn test_tryfrom_opcode_simple() {
        let value: Opcode = 0x00E0;
        let conv = value.try_into();
        assert_eq!(conv, Ok(Instruction::Clear));
    }

    #[test]
    fn test_tryfrom_opcode_system() {
        let value: Opcode = 0x0000;
        let conv = value.try_into();
        assert_eq!(conv, Ok(Instruction::System { nnn: 0 }));
    }

    #[test]
    fn test_tryfrom_opcode_multiple() {
        let tests: &[(Opcode, Result<Instruction, &str>)] = &[
            (0x00E0, Ok(Instruction::Clear)),
            (0x00EE, Ok(Instruction::Return)),
            (0x0123, Ok(Instruction::System { nnn: 0x123 })),
            (0x1919, Ok(Instruction::Jump { nnn: 0x919 })),
            (0x2222, Ok(Instruction::Call { nnn: 0x222 })),
            (0x3123, Ok(Instruction::SkipEqual { x: 0x1, nn: 0x23 })),
            (0x4123, Ok(Instruction::SkipNotEqual { x: 0x1, nn: 0x23 })),
            (0x5120, Ok(Instruction::SkipRegistersEqual { x: 0x1, y: 0x2 })),
            (0x5121, Err("")),
            (0x6123, Ok(Instruction::Set { x: 0x1, nn: 0x23 })),
            (0x7123, Ok(Instruction::Add { x: 0x1, nn: 0x23 })),
            (
                0x8120,
                Ok(Instruction::Arithmetic {
                    ops: ArithmeticOpcode::Assign,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8121,
                Ok(Instruction::Arithmetic {
                    ops: ArithmeticOpcode::Or,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8122,
                Ok(Instruction::Arithmetic {
                    ops: ArithmeticOpcode::And,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8123,
                Ok(Instruction::Arithmetic {
                    ops: ArithmeticOpcode::Xor,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8124,
                Ok(Instruction::Arithmetic {
                    ops: ArithmeticOpcode::AddCarry,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8125,
                Ok(Instruction::Arithmetic {
                    ops: ArithmeticOpcode::SubBorrow,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8126,
                Ok(Instruction::Arithmetic {
                    ops: ArithmeticOpcode::ShiftRight,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8127,
                Ok(Instruction::Arithmetic {
                    ops: ArithmeticOpcode::SubReverse,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x812E,
                Ok(Instruction::Arithmetic {
                    ops: ArithmeticOpcode::ShiftLeft,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (0x8128, Err("")),
            (0x9120, Ok(Instruction::SkipRegistersNotEqual { x: 0x1, y: 0x2 })),
            (0x9121, Err("")),
            (0xA222, Ok(Instruction::SetIndex { nnn: 0x222 })),
            (0xB222, Ok(Instruction::JumpOffset { nnn: 0x222 })),
            (0xC123, Ok(Instruction::Random { x: 0x1, nn: 0x23 })),
            (0xD123, Ok(Instruction::Draw { x: 0x1, y: 0x2, n: 0x3 })),
            (0xE19E, Ok(Instruction::SkipKeyPressed { x: 0x1 })),
            (0xE1A1, Ok(Instruction::SkipKeyNotPressed { x: 0x1 })),
            (0xE111, Err("")),
            (0xF007, Ok(Instruction::GetDelayTimer { x: 0x0 })),
            (0xF00A, Ok(Instruction::AwaitKeyPress { x: 0x0 })),
            (0xF015, Ok(Instruction::SetDelayTimer { x: 0x0 })),
            (0xF018, Ok(Instruction::SetSoundTimer { x: 0x0 })),
            (0xF01E, Ok(Instruction::AddIndex { x: 0x0 })),
            (0xF029, Ok(Instruction::SetIndexToSprite { x: 0x0 })),
            (0xF033, Ok(Instruction::StoreBcd { x: 0x0 })),
            (0xF055, Ok(Instruction::StoreRegisters { x: 0x0 })),
            (0xF065, Ok(Instruction::LoadRegisters { x: 0x0 })),
            (0xF0AA, Err("")),
        ];
        for &(value, res) in tests {
            let conv: Result<Instruction, _> = value.try_into();
            assert_eq!(conv, res.map_err(|_| OpcodeError::InvalidOpcode(value)));
        }
    }

    #[test]
    fn test_every_family_is_decoded() {
        // every family has at least one valid member with all operands at zero
        for t in 0x0..=0xFu16 {
            let base = t << 12;
            let opcode = match t {
                0xE => base | 0x9E,
                0xF => base | 0x07,
                _ => base,
            };
            let conv: Result<Instruction, _> = opcode.try_into();
            assert!(conv.is_ok(), "family {:#X} was not decoded", t);
        }
    }

    #[test]
    fn test_step_wraps_address_space() {
        assert_eq!(ProgramCounterStep::Skip.apply(0xFFE), 0x000);
        assert_eq!(ProgramCounterStep::Jump(0xFFFF).apply(0x200), 0xFFF);
    }
}
