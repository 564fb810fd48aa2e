use crate::{
    definitions::{cpu, display, memory},
    opcode::{ArithmeticOpcode, Instruction, Operation, ProgramCounterStep},
    ProcessError,
};

use super::Machine;

type Executed = Result<(ProgramCounterStep, Operation), ProcessError>;

impl Machine {
    /// Will run a single decoded instruction and return how the program counter
    /// shall move afterwards.
    ///
    /// The program counter already points past the instruction at this point.
    pub(super) fn execute(&mut self, instruction: Instruction) -> Executed {
        use ProgramCounterStep::*;

        let step = match instruction {
            Instruction::System { nnn } => {
                // there is no machine code to run on this machine
                log::trace!("ignoring machine code routine at {:#05X}", nnn);
                Next
            }
            Instruction::Clear => {
                self.framebuffer.clear();
                return Ok((Next, Operation::Draw));
            }
            Instruction::Return => {
                let pc = self.pop_stack()?;
                log::debug!("return to {:#06X}", pc);
                Jump(pc)
            }
            Instruction::Jump { nnn } => Jump(nnn),
            Instruction::Call { nnn } => {
                self.push_stack(self.program_counter)?;
                log::debug!("call {:#06X}, depth {}", nnn, self.stack.len());
                Jump(nnn)
            }
            Instruction::SkipEqual { x, nn } => ProgramCounterStep::cond(self.registers[x] == nn),
            Instruction::SkipNotEqual { x, nn } => {
                ProgramCounterStep::cond(self.registers[x] != nn)
            }
            Instruction::SkipRegistersEqual { x, y } => {
                ProgramCounterStep::cond(self.registers[x] == self.registers[y])
            }
            Instruction::SkipRegistersNotEqual { x, y } => {
                ProgramCounterStep::cond(self.registers[x] != self.registers[y])
            }
            Instruction::Set { x, nn } => {
                self.registers[x] = nn;
                Next
            }
            Instruction::Add { x, nn } => {
                // let VX overflow, but ignore carry
                self.registers[x] = self.registers[x].wrapping_add(nn);
                Next
            }
            Instruction::Arithmetic { ops, x, y } => {
                self.arithmetic(ops, x, y);
                Next
            }
            Instruction::SetIndex { nnn } => {
                self.index_register = nnn & memory::ADDRESS_MASK;
                Next
            }
            Instruction::JumpOffset { nnn } => {
                Jump(nnn.wrapping_add(self.registers[0] as u16) & memory::ADDRESS_MASK)
            }
            Instruction::Random { x, nn } => {
                // using a fill bytes call here, as the trait RngCore does not
                // support random u8.
                let mut rand: [u8; 1] = [0];
                self.rng.fill_bytes(&mut rand);
                self.registers[x] = nn & rand[0];
                Next
            }
            Instruction::Draw { x, y, n } => {
                self.draw(x, y, n)?;
                return Ok((Next, Operation::Draw));
            }
            Instruction::SkipKeyPressed { x } => {
                ProgramCounterStep::cond(self.keyboard.is_pressed(self.registers[x] as usize))
            }
            Instruction::SkipKeyNotPressed { x } => {
                ProgramCounterStep::cond(!self.keyboard.is_pressed(self.registers[x] as usize))
            }
            Instruction::GetDelayTimer { x } => {
                self.registers[x] = self.delay_timer.get_value();
                Next
            }
            Instruction::AwaitKeyPress { x } => match self.keyboard.take_press() {
                Some(key) => {
                    log::debug!("key {:#X} pressed while waiting", key);
                    self.registers[x] = key as u8;
                    Next
                }
                // don't move on until a key was pressed
                None => return Ok((Hold, Operation::Wait)),
            },
            Instruction::SetDelayTimer { x } => {
                self.delay_timer.set_value(self.registers[x]);
                Next
            }
            Instruction::SetSoundTimer { x } => {
                self.sound_timer.set_value(self.registers[x]);
                Next
            }
            Instruction::AddIndex { x } => {
                // VF is not affected
                let vx = self.registers[x] as u16;
                self.index_register = self.index_register.wrapping_add(vx) & memory::ADDRESS_MASK;
                Next
            }
            Instruction::SetIndexToSprite { x } => {
                let character = (self.registers[x] & 0xF) as u16;
                self.index_register =
                    display::fontset::LOCATION + display::fontset::CHAR_SIZE * character;
                Next
            }
            Instruction::StoreBcd { x } => {
                let range = self.memory_range(self.index_register, 3)?;
                let r = self.registers[x];
                // 246u8 => [2, 4, 6]
                self.memory[range].copy_from_slice(&[r / 100, r / 10 % 10, r % 10]);
                Next
            }
            Instruction::StoreRegisters { x } => {
                let range = self.memory_range(self.index_register, x + 1)?;
                self.memory[range].copy_from_slice(&self.registers[..=x]);
                Next
            }
            Instruction::LoadRegisters { x } => {
                let range = self.memory_range(self.index_register, x + 1)?;
                self.registers[..=x].copy_from_slice(&self.memory[range]);
                Next
            }
        };
        Ok((step, Operation::None))
    }

    /// The `8XYN` family, the flag is always written after the result.
    fn arithmetic(&mut self, ops: ArithmeticOpcode, x: usize, y: usize) {
        let (vx, vy) = (self.registers[x], self.registers[y]);

        let (result, flag) = match ops {
            ArithmeticOpcode::Assign => (vy, None),
            ArithmeticOpcode::Or => (vx | vy, None),
            ArithmeticOpcode::And => (vx & vy, None),
            ArithmeticOpcode::Xor => (vx ^ vy, None),
            ArithmeticOpcode::AddCarry => {
                let (res, carry) = vx.overflowing_add(vy);
                (res, Some(carry as u8))
            }
            ArithmeticOpcode::SubBorrow => {
                // VF is the "no borrow" flag
                let (res, borrow) = vx.overflowing_sub(vy);
                (res, Some(!borrow as u8))
            }
            ArithmeticOpcode::SubReverse => {
                let (res, borrow) = vy.overflowing_sub(vx);
                (res, Some(!borrow as u8))
            }
            ArithmeticOpcode::ShiftRight => (vx >> 1, Some(vx & 0x01)),
            ArithmeticOpcode::ShiftLeft => (vx << 1, Some(vx >> 7)),
        };

        self.registers[x] = result;
        if let Some(flag) = flag {
            self.registers[cpu::register::LAST] = flag;
        }
    }

    /// Draws a sprite at coordinate `(VX, VY)` that has a width of 8 pixels and a height of `n`
    /// pixels. Each row of 8 pixels is read as bit-coded starting from memory location `I`; `I`
    /// value doesn’t change after the execution of this instruction. `VF` is set to 1 if any
    /// screen pixels are flipped from set to unset when the sprite is drawn, and to 0 if that
    /// doesn’t happen.
    ///
    /// The starting coordinate wraps around the screen, the sprite itself is clipped at the
    /// right and bottom edge.
    /// see https://tobiasvl.github.io/blog/write-a-chip-8-emulator/
    fn draw(&mut self, x: usize, y: usize, n: u8) -> Result<(), ProcessError> {
        // validate before the first pixel is flipped
        let rows = self.memory_range(self.index_register, n as usize)?;

        let coorx = self.registers[x] as usize % display::WIDTH;
        let coory = self.registers[y] as usize % display::HEIGHT;

        self.registers[cpu::register::LAST] = 0;

        let mut collision = false;
        for (i, row) in self.memory[rows].iter().enumerate() {
            let y = coory + i;
            if y >= display::HEIGHT {
                break;
            }

            for j in 0..display::SPRITE_WIDTH {
                let x = coorx + j;
                if x >= display::WIDTH {
                    break;
                }

                let mask = 0x80 >> j;
                if *row & mask == mask {
                    collision |= self.framebuffer.toggle(x, y);
                }
            }
        }

        self.registers[cpu::register::LAST] = collision as u8;
        Ok(())
    }
}
