//! Linear-sweep disassembler for program images.
//!
//! Intcode mixes code and data freely, so the listing is a best effort: every
//! cell that decodes to a complete instruction is shown as one, everything
//! else as a `DATA` cell.

use crate::virtual_machine::isa::Instruction;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::Memory;
use std::fmt;
use std::fmt::Write;

/// What a listing line shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Item {
    Instruction(Instruction),
    Data(i64),
}

/// One line of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line {
    pub address: usize,
    pub item: Item,
}

impl Line {
    /// Number of cells the line covers.
    pub fn width(&self) -> usize {
        match self.item {
            Item::Instruction(instr) => instr.length() as usize,
            Item::Data(_) => 1,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item {
            Item::Instruction(instr) => write!(f, "{:>5}: {}", self.address, instr),
            Item::Data(value) => write!(f, "{:>5}: DATA {}", self.address, value),
        }
    }
}

/// Sweeps `program` from address 0 and returns one [`Line`] per decoded item.
///
/// An instruction whose parameters would run past the end of the image is
/// shown as data.
pub fn disassemble(program: &Program) -> Vec<Line> {
    let cells = program.cells();
    let memory = Memory::new(cells);
    let mut lines = Vec::new();
    let mut address = 0usize;
    while address < cells.len() {
        let decoded = Instruction::decode(&memory, address as i64)
            .ok()
            .filter(|instr| address + instr.length() as usize <= cells.len());
        let item = match decoded {
            Some(instr) => Item::Instruction(instr),
            None => Item::Data(cells[address]),
        };
        let line = Line { address, item };
        address += line.width();
        lines.push(line);
    }
    lines
}

/// Renders the full listing, one line per item.
pub fn render(program: &Program) -> String {
    let mut out = String::new();
    for line in disassemble(program) {
        let _ = writeln!(out, "{line}");
    }
    out
}
