//! LS-8 library.
//!
//! Provides the LS-8 virtual machine, its program loader and assembler, and
//! the logging used by the command-line tools.

pub mod utils;
pub mod virtual_machine;
