//! Execution engine.
//!
//! The [`VM`] owns a [`MachineState`] and runs the fetch-decode-execute loop
//! until `HLT`: fetch the opcode at PC, decode it into an [`Instruction`], read
//! its operand bytes from PC+1 and PC+2, execute, then advance PC by the
//! instruction size unless the instruction set PC itself.
//!
//! Every failure (illegal opcode, out-of-bounds access, stack misuse, a run
//! that never halts) stops execution with a typed [`VMError`].
//!
//! With [`RunConfig::trace`] set, a [`trace_line`] is written before every
//! instruction: to standard error from [`VM::run`], or to any writer from
//! [`VM::run_traced`].

mod trace;

pub use trace::trace_line;

use crate::virtual_machine::alu::AluOp;
use crate::virtual_machine::errors::{Bounded, LoaderError, VMError};
use crate::virtual_machine::isa::Instruction;
use crate::virtual_machine::state::{MEMORY_SIZE, MachineState, REGISTER_COUNT, STACK_TOP};
use std::io::{self, Write};

/// Instructions executed before a run is abandoned as non-terminating.
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// Engine settings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunConfig {
    /// Write a trace line before every instruction.
    pub trace: bool,
    /// Maximum number of instructions a run may execute.
    pub step_limit: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trace: false,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }
}

/// Result of a run that reached `HLT`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunSummary {
    /// Instructions executed, `HLT` included.
    pub steps: u64,
}

/// Whether the machine can keep stepping.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepOutcome {
    Running,
    Halted,
}

/// What to do with PC after an instruction.
enum Flow {
    /// Advance past the instruction.
    Next,
    /// PC was already written.
    Jump,
    Halt,
}

macro_rules! exec_vm {
    // Entry point
    (
        vm = $vm:ident,
        out = $out:ident,
        instr = $instr:ident,
        { $( $variant:ident => $handler:ident $args:tt ),* $(,)? }
    ) => {{
        let pc = $vm.state.pc;
        match $instr {
            $(
                Instruction::$variant => exec_vm!(@call $vm, $out, pc, $handler, $args),
            )*
        }
    }};

    // Handler that writes output (semicolon separator)
    (@call $vm:ident, $out:ident, $pc:ident, $handler:ident,
        (out; $( $field:ident : $kind:ident ),* $(,)? )
    ) => {{
        let mut _cursor = $pc;
        $( let $field = exec_vm!(@read $vm, _cursor, $kind)?; )*
        $vm.$handler($out, $( $field ),*)
    }};

    // Handler without output (no semicolon)
    (@call $vm:ident, $out:ident, $pc:ident, $handler:ident,
        ( $( $field:ident : $kind:ident ),* $(,)? )
    ) => {{
        #[allow(unused_mut)]
        let mut _cursor = $pc;
        $( let $field = exec_vm!(@read $vm, _cursor, $kind)?; )*
        $vm.$handler($( $field ),*)
    }};

    // Register index byte, checked against the register file
    (@read $vm:ident, $cursor:ident, Reg) => {{
        $cursor += 1;
        let index = $vm.state.read($cursor)?;
        if (index as usize) < REGISTER_COUNT {
            Ok::<u8, VMError>(index)
        } else {
            Err(VMError::OutOfBounds {
                kind: Bounded::Register,
                index: index as usize,
                limit: REGISTER_COUNT,
            })
        }
    }};

    // Literal byte
    (@read $vm:ident, $cursor:ident, Imm) => {{
        $cursor += 1;
        $vm.state.read($cursor)
    }};
}

/// LS-8 virtual machine.
pub struct VM {
    state: MachineState,
    config: RunConfig,
    /// Instructions executed so far.
    steps: u64,
    halted: bool,
}

impl VM {
    /// Creates a VM over an already loaded machine state.
    pub fn new(state: MachineState) -> Self {
        Self::with_config(state, RunConfig::default())
    }

    pub fn with_config(state: MachineState, config: RunConfig) -> Self {
        Self {
            state,
            config,
            steps: 0,
            halted: false,
        }
    }

    /// Creates a VM with `program` in memory from address 0.
    pub fn from_program(program: &[u8]) -> Result<Self, LoaderError> {
        Ok(Self::new(MachineState::with_program(program)?))
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn into_state(self) -> MachineState {
        self.state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Runs until `HLT`, writing `PRN` output to `out` and trace lines to
    /// standard error.
    ///
    /// Fails with [`VMError::StepLimitExceeded`] if the configured step limit
    /// is reached first.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<RunSummary, VMError> {
        self.run_traced(out, &mut io::stderr().lock())
    }

    /// Like [`VM::run`], with trace lines going to `trace`.
    pub fn run_traced<W: Write, T: Write>(
        &mut self,
        out: &mut W,
        trace: &mut T,
    ) -> Result<RunSummary, VMError> {
        while !self.halted {
            if self.steps >= self.config.step_limit {
                return Err(VMError::StepLimitExceeded {
                    limit: self.config.step_limit,
                });
            }
            self.step_traced(out, trace)?;
        }
        Ok(RunSummary { steps: self.steps })
    }

    /// Fetches, decodes and executes one instruction.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<StepOutcome, VMError> {
        self.step_traced(out, &mut io::stderr().lock())
    }

    /// Like [`VM::step`], with the trace line going to `trace`.
    pub fn step_traced<W: Write, T: Write>(
        &mut self,
        out: &mut W,
        trace: &mut T,
    ) -> Result<StepOutcome, VMError> {
        if self.halted {
            return Ok(StepOutcome::Halted);
        }
        if self.config.trace {
            writeln!(trace, "{}", trace_line(&self.state)).map_err(|e| VMError::Output {
                reason: e.to_string(),
            })?;
        }

        let pc = self.state.pc;
        let opcode = self.state.read(pc)?;
        let instr =
            Instruction::try_from(opcode).map_err(|_| VMError::IllegalInstruction { opcode, pc })?;

        let flow = self.exec(instr, out)?;
        self.steps += 1;

        match flow {
            Flow::Next => {
                self.state.pc = pc + instr.size();
                Ok(StepOutcome::Running)
            }
            Flow::Jump => Ok(StepOutcome::Running),
            Flow::Halt => {
                self.halted = true;
                Ok(StepOutcome::Halted)
            }
        }
    }

    /// Executes a single decoded instruction.
    fn exec<W: Write>(&mut self, instruction: Instruction, out: &mut W) -> Result<Flow, VMError> {
        exec_vm! {
            vm = self,
            out = out,
            instr = instruction,
            {
                Hlt => op_hlt(),
                Ldi => op_ldi(reg: Reg, value: Imm),
                Prn => op_prn(out; reg: Reg),
                Mul => op_mul(reg_a: Reg, reg_b: Reg),
                Push => op_push(reg: Reg),
                Pop => op_pop(reg: Reg),
                Call => op_call(reg: Reg),
                Ret => op_ret(),
            }
        }
    }

    /// Decrements SP and stores `value` at the new top of stack.
    fn push(&mut self, value: u8) -> Result<(), VMError> {
        if self.state.sp == 0 {
            return Err(VMError::StackOverflow { pc: self.state.pc });
        }
        self.state.sp -= 1;
        self.state.write(self.state.sp, value)?;
        crate::trace!("pushed: {value}");
        Ok(())
    }

    /// Reads the top of stack and increments SP.
    fn pop(&mut self) -> Result<u8, VMError> {
        if self.state.sp >= STACK_TOP {
            return Err(VMError::StackUnderflow { pc: self.state.pc });
        }
        let value = self.state.read(self.state.sp)?;
        self.state.sp += 1;
        Ok(value)
    }

    fn op_hlt(&mut self) -> Result<Flow, VMError> {
        Ok(Flow::Halt)
    }

    fn op_ldi(&mut self, reg: u8, value: u8) -> Result<Flow, VMError> {
        self.state.set_register(reg, value)?;
        Ok(Flow::Next)
    }

    fn op_prn<W: Write>(&mut self, out: &mut W, reg: u8) -> Result<Flow, VMError> {
        let value = self.state.register(reg)?;
        writeln!(out, "{value}").map_err(|e| VMError::Output {
            reason: e.to_string(),
        })?;
        Ok(Flow::Next)
    }

    fn op_mul(&mut self, reg_a: u8, reg_b: u8) -> Result<Flow, VMError> {
        let a = self.state.register(reg_a)?;
        let b = self.state.register(reg_b)?;
        self.state.set_register(reg_a, AluOp::Mul.apply(a, b))?;
        Ok(Flow::Next)
    }

    fn op_push(&mut self, reg: u8) -> Result<Flow, VMError> {
        let value = self.state.register(reg)?;
        self.push(value)?;
        Ok(Flow::Next)
    }

    fn op_pop(&mut self, reg: u8) -> Result<Flow, VMError> {
        let value = self.pop()?;
        self.state.set_register(reg, value)?;
        Ok(Flow::Next)
    }

    fn op_call(&mut self, reg: u8) -> Result<Flow, VMError> {
        let target = self.state.register(reg)?;
        let return_addr = self.state.pc + Instruction::Call.size();
        let return_addr = u8::try_from(return_addr).map_err(|_| VMError::OutOfBounds {
            kind: Bounded::Memory,
            index: return_addr,
            limit: MEMORY_SIZE,
        })?;
        self.push(return_addr)?;
        self.state.pc = target as usize;
        Ok(Flow::Jump)
    }

    fn op_ret(&mut self) -> Result<Flow, VMError> {
        self.state.pc = self.pop()? as usize;
        Ok(Flow::Jump)
    }
}
