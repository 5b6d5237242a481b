//! Arithmetic/logic unit.
//!
//! Pure register-to-register arithmetic on 8-bit values. Results wrap at
//! 8 bits, matching the register width.

use crate::virtual_machine::errors::VMError;
use std::fmt;
use std::str::FromStr;

/// Operations the ALU implements.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AluOp {
    /// Wrapping addition. No opcode dispatches to it yet.
    Add,
    /// Wrapping multiplication.
    Mul,
}

impl AluOp {
    /// Applies the operation to two register values.
    pub const fn apply(self, a: u8, b: u8) -> u8 {
        match self {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Mul => a.wrapping_mul(b),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Mul => "MUL",
        }
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AluOp {
    type Err = VMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(AluOp::Add),
            "MUL" => Ok(AluOp::Mul),
            other => Err(VMError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Applies the named operation, failing for names the ALU does not know.
pub fn apply_named(op: &str, a: u8, b: u8) -> Result<u8, VMError> {
    Ok(op.parse::<AluOp>()?.apply(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_and_add() {
        assert_eq!(AluOp::Mul.apply(8, 9), 72);
        assert_eq!(AluOp::Add.apply(8, 9), 17);
        assert_eq!(AluOp::Mul.apply(0, 200), 0);
    }

    #[test]
    fn results_wrap_at_eight_bits() {
        assert_eq!(AluOp::Mul.apply(16, 16), 0);
        assert_eq!(AluOp::Mul.apply(200, 2), 144);
        assert_eq!(AluOp::Add.apply(255, 1), 0);
    }

    #[test]
    fn mul_matches_wide_product_mod_256() {
        for a in (0..=255u8).step_by(7) {
            for b in (0..=255u8).step_by(11) {
                let wide = (a as u32 * b as u32) % 256;
                assert_eq!(AluOp::Mul.apply(a, b) as u32, wide);
            }
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("MUL".parse::<AluOp>().unwrap(), AluOp::Mul);
        assert_eq!("ADD".parse::<AluOp>().unwrap(), AluOp::Add);
        assert_eq!(AluOp::Mul.to_string(), "MUL");
    }

    #[test]
    fn unknown_operation_is_unsupported() {
        assert!(matches!(
            apply_named("SUB", 1, 2),
            Err(VMError::UnsupportedOperation(op)) if op == "SUB"
        ));
        assert_eq!(apply_named("MUL", 3, 4).unwrap(), 12);
    }
}
