use crate::virtual_machine::errors::VMError;
use std::collections::BTreeMap;

/// Addresses below this bound live in a contiguous buffer; anything above is
/// kept in a sparse map so a single far write cannot allocate gigabytes.
pub const DENSE_MEMORY_LIMIT: usize = 1 << 20;

/// Zero-initialised, unbounded integer memory owned by one machine.
///
/// Reading an address that was never written yields 0 without allocating.
/// Writing past the end zero-extends the dense buffer up to and including the
/// written address.
///
/// Equality compares contents: a cell that was never written and a cell
/// holding 0 are alike, wherever either is stored.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Cells `0..dense.len()`.
    dense: Vec<i64>,
    /// Cells at or above [`DENSE_MEMORY_LIMIT`].
    sparse: BTreeMap<usize, i64>,
}

impl Memory {
    /// Creates memory holding a copy of `cells` at addresses `0..cells.len()`.
    pub fn new(cells: &[i64]) -> Self {
        Self {
            dense: cells.to_vec(),
            sparse: BTreeMap::new(),
        }
    }

    fn index(address: i64) -> Result<usize, VMError> {
        usize::try_from(address).map_err(|_| VMError::NegativeAddress { address })
    }

    /// Returns the value at `address`.
    pub fn get(&self, address: i64) -> Result<i64, VMError> {
        let index = Self::index(address)?;
        Ok(match self.dense.get(index) {
            Some(value) => *value,
            None => self.sparse.get(&index).copied().unwrap_or(0),
        })
    }

    /// Stores `value` at `address`, growing storage as needed.
    pub fn set(&mut self, address: i64, value: i64) -> Result<(), VMError> {
        let index = Self::index(address)?;
        if index < self.dense.len() {
            self.dense[index] = value;
        } else if index < DENSE_MEMORY_LIMIT.max(self.dense.len()) {
            self.dense.resize(index + 1, 0);
            self.dense[index] = value;
        } else {
            self.sparse.insert(index, value);
        }
        Ok(())
    }

    /// Number of cells in the contiguous region.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty() && self.sparse.is_empty()
    }

    /// The contiguous region starting at address 0.
    pub fn as_slice(&self) -> &[i64] {
        &self.dense
    }

    /// Cells stored above the contiguous region, in address order.
    pub fn sparse_cells(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.sparse.iter().map(|(k, v)| (*k, *v))
    }

    /// Every non-zero cell, in address order.
    ///
    /// Sparse keys always lie above the dense region, so chaining keeps order.
    pub fn nonzero_cells(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.dense
            .iter()
            .copied()
            .enumerate()
            .chain(self.sparse_cells())
            .filter(|&(_, value)| value != 0)
    }
}

impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool {
        self.nonzero_cells().eq(other.nonzero_cells())
    }
}

impl Eq for Memory {}
