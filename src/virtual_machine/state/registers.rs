use crate::virtual_machine::errors::{Bounded, VMError};

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Register file of eight 8-bit registers, all starting at zero.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Registers {
    regs: [u8; REGISTER_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value in register `idx`.
    ///
    /// Returns [`VMError::OutOfBounds`] if `idx` is not in `0..8`.
    pub fn get(&self, idx: u8) -> Result<u8, VMError> {
        self.regs
            .get(idx as usize)
            .copied()
            .ok_or(VMError::OutOfBounds {
                kind: Bounded::Register,
                index: idx as usize,
                limit: REGISTER_COUNT,
            })
    }

    /// Stores a value into register `idx`.
    ///
    /// Returns [`VMError::OutOfBounds`] if `idx` is not in `0..8`.
    pub fn set(&mut self, idx: u8, v: u8) -> Result<(), VMError> {
        let slot = self
            .regs
            .get_mut(idx as usize)
            .ok_or(VMError::OutOfBounds {
                kind: Bounded::Register,
                index: idx as usize,
                limit: REGISTER_COUNT,
            })?;
        *slot = v;
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.regs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let mut regs = Registers::new();
        regs.set(7, 200).unwrap();
        assert_eq!(regs.get(7).unwrap(), 200);
        assert_eq!(regs.get(0).unwrap(), 0);
    }

    #[test]
    fn index_past_file_is_out_of_bounds() {
        let mut regs = Registers::new();
        assert!(matches!(
            regs.get(8),
            Err(VMError::OutOfBounds {
                kind: Bounded::Register,
                index: 8,
                limit: REGISTER_COUNT
            })
        ));
        assert!(regs.set(255, 1).is_err());
        assert_eq!(regs.as_slice(), &[0; REGISTER_COUNT]);
    }
}
