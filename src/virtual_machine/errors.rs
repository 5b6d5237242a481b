use ls8_derive::Error;
use std::fmt;

/// Which bounded resource an out-of-range index referred to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Bounded {
    Memory,
    Register,
}

impl fmt::Display for Bounded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bounded::Memory => write!(f, "memory address"),
            Bounded::Register => write!(f, "register index"),
        }
    }
}

/// Errors that can occur while executing a program.
#[derive(Debug, Error)]
pub enum VMError {
    /// Memory address or register index outside its valid range.
    #[error("{kind} {index} out of bounds (limit {limit})")]
    OutOfBounds {
        kind: Bounded,
        index: usize,
        limit: usize,
    },
    /// Opcode byte that does not name any instruction.
    #[error("illegal instruction {opcode:#010b} at pc {pc}")]
    IllegalInstruction { opcode: u8, pc: usize },
    /// ALU asked for an operation it does not implement.
    #[error("unsupported ALU operation: {0}")]
    UnsupportedOperation(String),
    /// POP or RET with nothing on the stack.
    #[error("stack underflow at pc {pc}")]
    StackUnderflow { pc: usize },
    /// PUSH or CALL with the stack already reaching address 0.
    #[error("stack overflow at pc {pc}")]
    StackOverflow { pc: usize },
    /// The program ran for `limit` instructions without halting.
    #[error("no HLT after {limit} instructions")]
    StepLimitExceeded { limit: u64 },
    /// PRN could not write to the output sink.
    #[error("output failed: {reason}")]
    Output { reason: String },
}

/// Errors raised while reading a program image.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The program file does not exist.
    #[error("file not found: {path}")]
    FileNotFound { path: String },
    /// Any other failure reading the program file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A line that is neither blank, a comment, nor a binary literal.
    #[error("line {line}: unknown number {text:?}")]
    MalformedLiteral { line: usize, text: String },
    /// The image does not fit in memory.
    #[error("program is {len} bytes, memory holds {capacity}")]
    ProgramTooLarge { len: usize, capacity: usize },
}

/// Errors raised by the assembler, tagged with the source line.
#[derive(Debug, Error)]
pub enum AsmError {
    #[error("line {line}: unknown instruction {name}")]
    UnknownInstruction { line: usize, name: String },
    #[error("line {line}: {mnemonic} takes {expected} operand(s), got {actual}")]
    ArityMismatch {
        line: usize,
        mnemonic: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("line {line}: expected register R0-R7, got {token}")]
    InvalidRegister { line: usize, token: String },
    #[error("line {line}: invalid immediate {token}")]
    InvalidImmediate { line: usize, token: String },
    #[error("line {line}: duplicate label {label}")]
    DuplicateLabel { line: usize, label: String },
    #[error("line {line}: undefined label {label}")]
    UndefinedLabel { line: usize, label: String },
    #[error("program is {len} bytes, memory holds {capacity}")]
    ProgramTooLarge { len: usize, capacity: usize },
}
