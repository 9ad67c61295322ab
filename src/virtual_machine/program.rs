//! Intcode program representation and its textual form.
//!
//! A [`Program`] is the immutable initial memory image. Machines copy it on
//! construction, so one program can seed any number of independent machines.

use crate::virtual_machine::errors::VMError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Initial memory image of an Intcode machine.
///
/// Cheap to clone: the cells are shared behind an [`Arc`] and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Program {
    cells: Arc<[i64]>,
}

impl Program {
    pub fn new(cells: Vec<i64>) -> Self {
        Self {
            cells: cells.into(),
        }
    }

    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns a copy of this program with `address` set to `value`.
    ///
    /// Addresses past the end zero-extend the image.
    pub fn patched(&self, address: usize, value: i64) -> Self {
        let mut cells = self.cells.to_vec();
        if address >= cells.len() {
            cells.resize(address + 1, 0);
        }
        cells[address] = value;
        Self::new(cells)
    }
}

impl From<Vec<i64>> for Program {
    fn from(cells: Vec<i64>) -> Self {
        Self::new(cells)
    }
}

impl From<&[i64]> for Program {
    fn from(cells: &[i64]) -> Self {
        Self::new(cells.to_vec())
    }
}

impl FromStr for Program {
    type Err = VMError;

    /// Parses the comma-separated form, e.g. `"1,0,0,3,99\n"`.
    ///
    /// Whitespace around cells is ignored, as is one trailing comma.
    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let source = source.trim();
        let source = source.strip_suffix(',').unwrap_or(source);
        if source.is_empty() {
            return Err(VMError::EmptyProgram);
        }
        source
            .split(',')
            .enumerate()
            .map(|(index, token)| {
                let token = token.trim();
                token.parse::<i64>().map_err(|_| VMError::ParseError {
                    index,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", cell)?;
        }
        Ok(())
    }
}
