//! The pretty print implementation of the [`Machine`](super::Machine) state.
//! This implementation was split up into this file for smaller file sizes and higher
//! cohesion.

use std::fmt::{self, Write};

use super::Machine;

/// The amount of bytes shown in a single memory row.
const HEX_PRINT_STEP: usize = 16;

const INDENT_FILLAMENT: char = '\t';

/// Used when there are at least two rows of only zeros.
const FILLER: &str = "...";

/// Will write a single memory row, the pointers are inclusive.
fn memory_row(f: &mut impl Write, from: usize, row: &[u8]) -> fmt::Result {
    write!(
        f,
        "{}{:#06X} - {:#06X} :",
        INDENT_FILLAMENT,
        from,
        from + row.len() - 1
    )?;
    for byte in row {
        write!(f, " {:#04X}", byte)?;
    }
    writeln!(f)
}

/// Will write the memory, where runs of zero rows are collapsed into a single
/// filler line.
fn memory_print(f: &mut impl Write, memory: &[u8]) -> fmt::Result {
    let is_zero = |row: &[u8]| row.iter().all(|&byte| byte == 0);

    let rows: Vec<&[u8]> = memory.chunks(HEX_PRINT_STEP).collect();
    let mut i = 0;
    while i < rows.len() {
        if is_zero(rows[i]) {
            let run = rows[i..].iter().take_while(|row| is_zero(row)).count();
            if run >= 2 {
                writeln!(f, "{}{}", INDENT_FILLAMENT, FILLER)?;
                i += run;
                continue;
            }
        }
        memory_row(f, i * HEX_PRINT_STEP, rows[i])?;
        i += 1;
    }
    Ok(())
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Program Counter : {:#06X}", self.program_counter)?;
        writeln!(f, "Index Register  : {:#06X}", self.index_register)?;
        writeln!(f, "Delay Timer     : {}", self.delay_timer.get_value())?;
        writeln!(f, "Sound Timer     : {}", self.sound_timer.get_value())?;

        writeln!(f, "Registers:")?;
        for (i, chunk) in self.registers.chunks(4).enumerate() {
            write!(f, "{}", INDENT_FILLAMENT)?;
            for (j, value) in chunk.iter().enumerate() {
                write!(f, "V{:X} {:#04X} ", i * 4 + j, value)?;
            }
            writeln!(f)?;
        }

        write!(f, "Stack:")?;
        for pointer in self.stack.iter() {
            write!(f, " {:#06X}", pointer)?;
        }
        writeln!(f)?;

        writeln!(f, "Memory:")?;
        memory_print(f, &self.memory[..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip8::Machine;

    #[test]
    fn test_memory_print_collapses_zero_rows() {
        let mut memory = [0u8; 4 * HEX_PRINT_STEP];
        memory[0] = 0xAB;

        let mut text = String::new();
        memory_print(&mut text, &memory).unwrap();

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("\t0x0000 - 0x000F : 0xAB 0x00"));
        assert_eq!(lines[1], "\t...");
    }

    #[test]
    fn test_memory_print_keeps_single_zero_row() {
        let mut memory = [0u8; 3 * HEX_PRINT_STEP];
        memory[0] = 0x1;
        memory[2 * HEX_PRINT_STEP] = 0x2;

        let mut text = String::new();
        memory_print(&mut text, &memory).unwrap();

        assert_eq!(text.lines().count(), 3);
        assert!(!text.contains(FILLER));
    }

    #[test]
    fn test_display_machine() {
        let mut machine = Machine::new();
        machine.load_program(&[0x12, 0x34]).unwrap();

        let text = format!("{}", machine);
        assert!(text.contains("Program Counter : 0x0200"));
        assert!(text.contains("VF 0x00"));
        // the font is part of the reserved memory
        assert!(text.contains("\t0x0050 - 0x005F : 0xF0 0x90 0x90 0x90 0xF0"));
        assert!(text.contains("\t0x0200 - 0x020F : 0x12 0x34"));
    }
}
