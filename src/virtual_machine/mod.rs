//! LS-8 byte-code virtual machine.
//!
//! A 256-byte memory, eight 8-bit registers, a program counter and a stack
//! pointer, driven by a fetch-decode-execute loop over a fixed instruction
//! set.
//!
//! # Architecture
//!
//! - **Memory**: 256 cells; the program is loaded at address 0 and the stack
//!   grows down from address 255
//! - **Registers**: `R0`..`R7`, 8 bits wide, arithmetic wraps
//! - **Instruction format**: one opcode byte, then zero to two operand bytes;
//!   the opcode's top two bits give the operand count
//! - **Execution model**: runs until `HLT`; every fault is a typed error and
//!   a step limit catches programs that never halt
//!
//! # Modules
//!
//! - [`alu`]: Arithmetic on register values
//! - [`assembler`]: Mnemonic source to program bytes, and back to image text
//! - [`errors`]: Execution, loader and assembler error types
//! - [`isa`]: Instruction set definition and opcode mappings
//! - [`loader`]: Program image parsing
//! - [`state`]: Memory, registers, PC and SP
//! - [`vm`]: Fetch-decode-execute loop

pub mod alu;
pub mod assembler;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod loader;
pub mod state;
pub mod vm;
