//! Machine state: memory, register file, program counter and stack pointer.
//!
//! [`MachineState`] holds data only. Every memory and register access is
//! bounds checked and reports [`VMError::OutOfBounds`]; instruction
//! semantics live in [`vm`](super::vm).

mod registers;

pub use registers::{REGISTER_COUNT, Registers};

use crate::virtual_machine::errors::{Bounded, LoaderError, VMError};

/// Number of addressable memory cells.
pub const MEMORY_SIZE: usize = 256;

/// Stack pointer value of an empty stack (last valid address).
pub const STACK_TOP: usize = MEMORY_SIZE - 1;

/// Memory, registers, PC and SP of one machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MachineState {
    memory: [u8; MEMORY_SIZE],
    registers: Registers,
    pub(crate) pc: usize,
    pub(crate) sp: usize,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            memory: [0; MEMORY_SIZE],
            registers: Registers::new(),
            pc: 0,
            sp: STACK_TOP,
        }
    }
}

impl MachineState {
    /// Zeroed memory and registers, PC at 0, SP at the top of memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state with `program` copied to memory from address 0.
    pub fn with_program(program: &[u8]) -> Result<Self, LoaderError> {
        let mut state = Self::new();
        state.load(program)?;
        Ok(state)
    }

    /// Copies `program` into memory starting at address 0.
    pub fn load(&mut self, program: &[u8]) -> Result<(), LoaderError> {
        let dst = self
            .memory
            .get_mut(..program.len())
            .ok_or(LoaderError::ProgramTooLarge {
                len: program.len(),
                capacity: MEMORY_SIZE,
            })?;
        dst.copy_from_slice(program);
        Ok(())
    }

    /// Reads the byte at `address`.
    pub fn read(&self, address: usize) -> Result<u8, VMError> {
        self.memory
            .get(address)
            .copied()
            .ok_or(VMError::OutOfBounds {
                kind: Bounded::Memory,
                index: address,
                limit: MEMORY_SIZE,
            })
    }

    /// Overwrites the byte at `address`.
    pub fn write(&mut self, address: usize, value: u8) -> Result<(), VMError> {
        let cell = self.memory.get_mut(address).ok_or(VMError::OutOfBounds {
            kind: Bounded::Memory,
            index: address,
            limit: MEMORY_SIZE,
        })?;
        *cell = value;
        Ok(())
    }

    pub fn register(&self, idx: u8) -> Result<u8, VMError> {
        self.registers.get(idx)
    }

    pub fn set_register(&mut self, idx: u8, value: u8) -> Result<(), VMError> {
        self.registers.set(idx, value)
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Whether nothing has been pushed (or everything has been popped).
    pub fn stack_is_empty(&self) -> bool {
        self.sp >= STACK_TOP
    }
}
