//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the
//! canonical instruction table and hands it to a callback macro, so the
//! decoder, the executor and the assembler all work from the same list.
//!
//! This module generates:
//! - The [`Instruction`] enum with opcode mappings
//! - `TryFrom<u8>` for decoding opcodes
//! - Mnemonic and operand-shape lookups
//!
//! # Encoding
//!
//! Every instruction is one opcode byte followed by zero, one or two operand
//! bytes. The opcode itself describes the instruction shape:
//!
//! ```text
//! AABCDDDD
//! AA    number of operand bytes
//! B     1 if the ALU handles it
//! C     1 if it sets PC itself
//! DDDD  instruction identifier
//! ```

use crate::virtual_machine::errors::VMError;

/// Invokes a callback macro with the complete instruction definition list.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            /// HLT ; stop the machine
            Hlt = 0b0000_0001, "HLT" => [],
            /// LDI reg, imm ; reg = imm
            Ldi = 0b1000_0010, "LDI" => [reg: Reg, value: Imm],
            /// PRN reg ; print reg as a decimal number
            Prn = 0b0100_0111, "PRN" => [reg: Reg],
            /// MUL reg_a, reg_b ; reg_a = reg_a * reg_b
            Mul = 0b1010_0010, "MUL" => [reg_a: Reg, reg_b: Reg],
            /// PUSH reg ; SP -= 1, memory[SP] = reg
            Push = 0b0100_0101, "PUSH" => [reg: Reg],
            /// POP reg ; reg = memory[SP], SP += 1
            Pop = 0b0100_0110, "POP" => [reg: Reg],
            /// CALL reg ; push address of next instruction, PC = reg
            Call = 0b0101_0000, "CALL" => [reg: Reg],
            /// RET ; pop PC
            Ret = 0b0001_0001, "RET" => [],
        }
    };
}

/// Kind of byte following an opcode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperandKind {
    /// Register index, 0-7.
    Reg,
    /// Literal byte.
    Imm,
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        #[repr(u8)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u8> for Instruction {
            type Error = VMError;

            /// Decodes an opcode. The returned error carries pc 0; the
            /// executor fills in the real fetch address.
            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Instruction::$name), )*
                    _ => Err(VMError::IllegalInstruction {
                        opcode: value,
                        pc: 0,
                    }),
                }
            }
        }

        impl Instruction {
            /// Every instruction, in table order.
            pub const ALL: &'static [Instruction] = &[ $( Instruction::$name, )* ];

            /// Returns the assembly mnemonic for this instruction.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Instruction::$name => $mnemonic, )*
                }
            }

            /// Returns the kinds of the operand bytes, in encoding order.
            pub const fn operands(&self) -> &'static [OperandKind] {
                match self {
                    $( Instruction::$name => &[ $( OperandKind::$kind ),* ], )*
                }
            }

            /// Looks an instruction up by mnemonic, ignoring ASCII case.
            pub fn from_mnemonic(name: &str) -> Option<Self> {
                $(
                    if name.eq_ignore_ascii_case($mnemonic) {
                        return Some(Instruction::$name);
                    }
                )*
                None
            }
        }
    };
}

for_each_instruction!(define_instructions);

impl Instruction {
    /// Opcode byte.
    pub const fn opcode(&self) -> u8 {
        *self as u8
    }

    /// Number of operand bytes, taken from the opcode's top two bits.
    pub const fn operand_count(&self) -> usize {
        (self.opcode() >> 6) as usize
    }

    /// Encoded length in bytes, opcode included.
    pub const fn size(&self) -> usize {
        1 + self.operand_count()
    }

    /// Whether the ALU carries out this instruction.
    pub const fn is_alu(&self) -> bool {
        self.opcode() & 0b0010_0000 != 0
    }

    /// Whether the instruction writes PC itself instead of falling through.
    pub const fn sets_pc(&self) -> bool {
        self.opcode() & 0b0001_0000 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_try_from_invalid() {
        assert!(matches!(
            Instruction::try_from(0xFF),
            Err(VMError::IllegalInstruction { opcode: 0xFF, .. })
        ));
        assert!(Instruction::try_from(0).is_err());
    }

    #[test]
    fn instruction_try_from_valid() {
        assert_eq!(Instruction::try_from(0b1000_0010).unwrap(), Instruction::Ldi);
        assert_eq!(Instruction::try_from(0b0000_0001).unwrap(), Instruction::Hlt);
        assert_eq!(Instruction::try_from(0b0001_0001).unwrap(), Instruction::Ret);
    }

    #[test]
    fn sizes() {
        assert_eq!(Instruction::Hlt.size(), 1);
        assert_eq!(Instruction::Prn.size(), 2);
        assert_eq!(Instruction::Ldi.size(), 3);
        assert_eq!(Instruction::Mul.size(), 3);
    }

    #[test]
    fn mnemonic_lookup_ignores_case() {
        assert_eq!(Instruction::from_mnemonic("push"), Some(Instruction::Push));
        assert_eq!(Instruction::from_mnemonic("PUSH"), Some(Instruction::Push));
        assert_eq!(Instruction::from_mnemonic("ADD"), None);
        assert_eq!(Instruction::Call.mnemonic(), "CALL");
    }
}
