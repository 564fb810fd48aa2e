use std::{convert::TryFrom, ops::Range};

use {
    rand::RngCore,
    tinyvec::ArrayVec,
};

use crate::{
    definitions::{cpu, display, keyboard, memory},
    devices::{Framebuffer, KeyQueue, Keyboard},
    opcode::{self, Instruction, Opcode, Operation},
    resources::Rom,
    timer::Timer,
    InputError, MemoryError, OpcodeError, ProcessError, StackError,
};

use super::{Config, Timing};

/// The Machine struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instant of the
/// Chip8 CPU.
pub struct Machine {
    /// The runtime configuration
    pub(super) config: Config,
    /// - `0x000-0x1FF` - Chip 8 interpreter (contains font set in emu)
    /// - `0x050-0x0A0` - Used for the built in `4x5` pixel font set (`0-F`)
    /// - `0x200-0xFFF` - Program ROM and work RAM
    pub(super) memory: Box<[u8; memory::SIZE]>,
    /// `8-bit` data registers named `V0` to `VF`. The `VF` register doubles as a flag for some
    /// instructions; thus, it should be avoided. In an addition operation, `VF` is the carry flag,
    /// while in subtraction, it is the "no borrow" flag. In the draw instruction `VF` is set upon
    /// pixel collision.
    pub(super) registers: [u8; cpu::register::SIZE],
    /// The index for the register, this is a special register entry
    /// called index `I`, always kept inside the 12 bit address space.
    pub(super) index_register: u16,
    /// The program counter is a CPU register in the computer processor which has the address of the
    /// next instruction to be executed from memory.
    pub(super) program_counter: u16,
    /// The stack is only used to store return addresses when subroutines are called. The original
    /// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
    /// `12` levels of nesting; modern implementations usually have more.
    /// (here we are using `16`)
    pub(super) stack: ArrayVec<[u16; cpu::stack::SIZE]>,
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    pub(super) delay_timer: Timer,
    /// Sound timer: This timer is used for sound effects. When its value is nonzero, a beeping
    /// sound is made.
    pub(super) sound_timer: Timer,
    /// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
    /// `(64 x 32)`.
    pub(super) framebuffer: Framebuffer,
    /// The hex keypad, only ever written by the host.
    pub(super) keyboard: Keyboard,
    /// Key transitions coming from other threads, applied at the start of a step.
    pub(super) key_queue: KeyQueue,
    /// This stores the random number generator, used by the machine.
    /// It is stored into the machine, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// will create a new machine in its reset state
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// will create a new machine with the given configuration
    pub fn with_config(config: Config) -> Self {
        let mut machine = Self {
            config,
            memory: Box::new([0; memory::SIZE]),
            registers: [0; cpu::register::SIZE],
            index_register: 0,
            program_counter: cpu::PROGRAM_COUNTER,
            stack: ArrayVec::default(),
            delay_timer: Timer::default(),
            sound_timer: Timer::default(),
            framebuffer: Framebuffer::new(),
            keyboard: Keyboard::new(),
            key_queue: KeyQueue::new(),
            rng: Box::new(rand::rngs::OsRng),
        };
        machine.reset();
        machine
    }

    /// Will replace the random number generator used by `CXNN`.
    pub fn with_rng(mut self, rng: Box<dyn RngCore + Send>) -> Self {
        self.rng = rng;
        self
    }

    /// Will zero all the state, load the font and move the
    /// program counter to the program start.
    pub fn reset(&mut self) {
        log::debug!("resetting machine");

        self.memory.iter_mut().for_each(|cell| *cell = 0);
        let font = display::fontset::LOCATION as usize;
        self.memory[font..(font + display::fontset::FONTSET.len())]
            .copy_from_slice(&display::fontset::FONTSET);

        self.registers = [0; cpu::register::SIZE];
        self.index_register = 0;
        self.program_counter = cpu::PROGRAM_COUNTER;
        self.stack.clear();
        self.delay_timer.set_value(0);
        self.sound_timer.set_value(0);
        self.framebuffer.clear();
        self.keyboard.reset();
        // transitions from the previous session are stale now
        self.key_queue.drain();
    }

    /// Will reset the machine and copy the program to the program start.
    ///
    /// A program that does not fit is rejected, before any state is touched.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), ProcessError> {
        if program.len() > cpu::PROGRAM_CAPACITY {
            return Err(MemoryError::ProgramTooLarge {
                len: program.len(),
                max: cpu::PROGRAM_CAPACITY,
            }
            .into());
        }

        self.reset();
        let start = cpu::PROGRAM_COUNTER as usize;
        self.memory[start..(start + program.len())].copy_from_slice(program);
        log::debug!("loaded program with {} bytes", program.len());
        Ok(())
    }

    /// Will load the data of the given rom.
    pub fn load_rom(&mut self, rom: &Rom) -> Result<(), ProcessError> {
        log::debug!("loading rom {}", rom.get_name());
        self.load_program(rom.get_data())
    }

    /// will advance the program by a single cycle (fetch, decode, execute
    /// and depending on the configuration the timer tick)
    ///
    /// If an error is returned the program counter still points to the
    /// faulting instruction and the timers did not tick.
    pub fn step(&mut self) -> Result<Operation, ProcessError> {
        self.apply_key_queue();

        let start = self.program_counter;
        match self.cycle() {
            Ok(operation) => {
                if self.config.timing == Timing::PerStep {
                    self.tick_timers();
                }
                Ok(operation)
            }
            Err(err) => {
                self.program_counter = start;
                Err(err)
            }
        }
    }

    fn cycle(&mut self) -> Result<Operation, ProcessError> {
        let opcode = self.fetch()?;

        let instruction = match Instruction::try_from(opcode) {
            Ok(instruction) => instruction,
            Err(OpcodeError::InvalidOpcode(opcode)) => {
                log::warn!(
                    "An unsupported opcode was used {:#06X} at {:#06X}",
                    opcode,
                    self.program_counter.wrapping_sub(memory::opcodes::SIZE)
                );
                return Ok(Operation::Unknown(opcode));
            }
            Err(err) => return Err(err.into()),
        };
        log::trace!("executing {:?}", instruction);

        let (step, operation) = self.execute(instruction)?;
        self.program_counter = step.apply(self.program_counter);
        Ok(operation)
    }

    /// will get the next opcode from memory and move the program counter past it
    fn fetch(&mut self) -> Result<Opcode, OpcodeError> {
        let opcode = opcode::build_opcode(&self.memory[..], self.program_counter as usize)?;
        log::trace!("opcode {:#06X} at {:#06X}", opcode, self.program_counter);
        self.program_counter =
            self.program_counter.wrapping_add(memory::opcodes::SIZE) & memory::ADDRESS_MASK;
        Ok(opcode)
    }

    /// Will decrement both timers by one, used directly by hosts
    /// running with [`Timing::External`].
    pub fn tick_timers(&mut self) {
        self.delay_timer.tick();
        self.sound_timer.tick();
    }

    fn apply_key_queue(&mut self) {
        for event in self.key_queue.drain() {
            if let Err(err) = self.keyboard.set_key(event.key, event.pressed) {
                log::warn!("dropping key event {:?}: {}", event, err);
            }
        }
    }

    /// Will set the value of the given key
    pub fn set_key(&mut self, key: usize, pressed: bool) -> Result<(), InputError> {
        self.keyboard.set_key(key, pressed)
    }

    /// Will write keyboard data into internal keyboard representation.
    pub fn set_keyboard(&mut self, keys: &[bool; keyboard::SIZE]) {
        self.keyboard.set_mult(keys);
    }

    /// Will return a handle that can feed key events from any thread.
    pub fn key_queue(&self) -> KeyQueue {
        self.key_queue.clone()
    }

    /// Will get the current state of the keyboard
    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// will return the sound timer
    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.get_value()
    }

    /// Should the host currently emit a tone.
    pub fn is_sound_active(&self) -> bool {
        self.sound_timer.is_active()
    }

    /// will return the delay timer
    pub fn delay_timer(&self) -> u8 {
        self.delay_timer.get_value()
    }

    /// Will return the current display configuration
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// will return the address of the next instruction
    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    /// will return the index register `I`
    pub fn index_register(&self) -> u16 {
        self.index_register
    }

    /// will return the registers `V0` to `VF`
    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// The return addresses, the last entry is the top of the stack.
    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    /// will return the whole memory, font and program included
    pub fn memory(&self) -> &[u8] {
        &self.memory[..]
    }

    /// will return the runtime configuration
    pub fn config(&self) -> Config {
        self.config
    }

    /// Will push the return address to the stack
    pub(super) fn push_stack(&mut self, pointer: u16) -> Result<(), StackError> {
        match self.stack.try_push(pointer) {
            None => Ok(()),
            Some(_) => Err(StackError::Full),
        }
    }

    /// Will pop the last return address from the stack
    pub(super) fn pop_stack(&mut self) -> Result<u16, StackError> {
        self.stack.pop().ok_or(StackError::Empty)
    }

    /// Will check that `len` bytes starting at `start` are inside of the memory.
    ///
    /// The error carries `start`, the address the rejected access begins at.
    pub(super) fn memory_range(&self, start: u16, len: usize) -> Result<Range<usize>, MemoryError> {
        let start = start as usize;
        let end = start + len;
        if end > memory::SIZE {
            Err(MemoryError::OutOfBounds { address: start })
        } else {
            Ok(start..end)
        }
    }
}
