use crate::virtual_machine::state::MachineState;
use std::fmt::Write;

/// Formats one trace line: PC, the three bytes at PC, and every register.
///
/// ```text
/// TRACE: 03 | 82 01 09 | 08 00 00 00 00 00 00 00
/// ```
///
/// Bytes past the end of memory print as `00`.
pub fn trace_line(state: &MachineState) -> String {
    let pc = state.pc();
    let peek = |offset: usize| state.read(pc + offset).unwrap_or_default();

    let mut line = format!(
        "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
        pc,
        peek(0),
        peek(1),
        peek(2)
    );
    for reg in state.registers().as_slice() {
        let _ = write!(line, " {reg:02X}");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_pc_bytes_and_registers() {
        let mut state = MachineState::with_program(&[0b1000_0010, 1, 9]).unwrap();
        state.set_register(0, 8).unwrap();
        state.set_register(7, 0xF4).unwrap();
        assert_eq!(
            trace_line(&state),
            "TRACE: 00 | 82 01 09 | 08 00 00 00 00 00 00 F4"
        );
    }

    #[test]
    fn bytes_past_memory_read_as_zero() {
        let mut state = MachineState::new();
        state.write(255, 0xAA).unwrap();
        state.pc = 255;
        assert_eq!(
            trace_line(&state),
            "TRACE: FF | AA 00 00 | 00 00 00 00 00 00 00 00"
        );
    }
}
