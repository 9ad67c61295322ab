use crate::virtual_machine::errors::VMError;

/// Counts executed instructions and enforces an optional ceiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepBudget {
    used: u64,
    limit: Option<u64>,
}

impl StepBudget {
    pub const fn new(limit: Option<u64>) -> Self {
        Self { used: 0, limit }
    }

    pub const fn unlimited() -> Self {
        Self::new(None)
    }

    /// Records one instruction.
    ///
    /// Fails with [`VMError::StepLimitExceeded`] once the limit is spent; the
    /// counter is left unchanged in that case.
    #[inline(always)]
    pub fn charge(&mut self) -> Result<(), VMError> {
        if let Some(limit) = self.limit {
            if self.used >= limit {
                return Err(VMError::StepLimitExceeded { limit });
            }
        }
        self.used = self.used.saturating_add(1);
        Ok(())
    }

    /// Instructions executed so far.
    pub const fn used(&self) -> u64 {
        self.used
    }

    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Instructions left before the limit, `None` when unlimited.
    pub fn remaining(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.used))
    }
}
