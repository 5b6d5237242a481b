//! Assembler from mnemonic source to program images.
//!
//! # Syntax
//!
//! ```text
//! start:  LDI R0, 8       # load 8 into R0
//!         LDI R1, square
//!         CALL R1
//!         HLT
//! square: MUL R0, R0
//!         RET
//! ```
//!
//! - Mnemonics are case-insensitive (`ldi`, `LDI`)
//! - Registers are `R0` to `R7`
//! - Immediates are decimal, `0x` hex or `0b` binary, in `0..=255`
//! - `name:` defines a label; a label can stand in for any immediate
//! - Comments start with `#`, commas between operands are optional
//!
//! [`render_image`] turns assembled bytes back into the loader's text format.

use crate::virtual_machine::errors::AsmError;
use crate::virtual_machine::isa::{Instruction, OperandKind};
use crate::virtual_machine::state::{MEMORY_SIZE, REGISTER_COUNT};
use std::collections::HashMap;
use std::fmt::Write;

const COMMENT_CHAR: char = '#';
const LABEL_SUFFIX: char = ':';

/// One instruction after the first pass.
struct ParsedLine<'a> {
    line: usize,
    instr: Instruction,
    operands: Vec<&'a str>,
}

/// Label name to address.
#[derive(Debug, Default)]
struct Labels(HashMap<String, u8>);

impl Labels {
    fn define(&mut self, line: usize, name: &str, address: usize) -> Result<(), AsmError> {
        let address = u8::try_from(address).map_err(|_| AsmError::ProgramTooLarge {
            len: address,
            capacity: MEMORY_SIZE,
        })?;
        if self.0.insert(name.to_string(), address).is_some() {
            return Err(AsmError::DuplicateLabel {
                line,
                label: name.to_string(),
            });
        }
        Ok(())
    }

    fn resolve(&self, line: usize, name: &str) -> Result<u8, AsmError> {
        self.0.get(name).copied().ok_or(AsmError::UndefinedLabel {
            line,
            label: name.to_string(),
        })
    }
}

/// Parses `R0`..`R7`.
pub(crate) fn parse_reg(line: usize, tok: &str) -> Result<u8, AsmError> {
    tok.strip_prefix(['R', 'r'])
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (*n as usize) < REGISTER_COUNT)
        .ok_or(AsmError::InvalidRegister {
            line,
            token: tok.to_string(),
        })
}

/// Parses a decimal, `0x` or `0b` byte literal.
pub(crate) fn parse_imm(tok: &str) -> Option<u8> {
    if let Some(hex) = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = tok.strip_prefix("0b").or_else(|| tok.strip_prefix("0B")) {
        u8::from_str_radix(bin, 2).ok()
    } else {
        tok.parse::<u8>().ok()
    }
}

fn is_label_name(tok: &str) -> bool {
    tok.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && tok.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// First pass: strips comments, records labels, checks mnemonics and arity.
fn parse_lines<'a>(
    source: &'a str,
    labels: &mut Labels,
) -> Result<(Vec<ParsedLine<'a>>, usize), AsmError> {
    let mut parsed = Vec::new();
    let mut address = 0usize;

    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let mut code = raw.split(COMMENT_CHAR).next().unwrap_or_default().trim();

        loop {
            let (head, tail) = code
                .split_once(char::is_whitespace)
                .unwrap_or((code, ""));
            match head.strip_suffix(LABEL_SUFFIX) {
                Some(label) if is_label_name(label) => {
                    labels.define(line, label, address)?;
                    code = tail.trim_start();
                }
                _ => break,
            }
        }
        if code.is_empty() {
            continue;
        }

        let mut tokens = code
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty());
        let name = tokens.next().unwrap_or_default();
        let instr = Instruction::from_mnemonic(name).ok_or(AsmError::UnknownInstruction {
            line,
            name: name.to_string(),
        })?;
        let operands: Vec<&str> = tokens.collect();
        if operands.len() != instr.operand_count() {
            return Err(AsmError::ArityMismatch {
                line,
                mnemonic: instr.mnemonic(),
                expected: instr.operand_count(),
                actual: operands.len(),
            });
        }

        address += instr.size();
        parsed.push(ParsedLine {
            line,
            instr,
            operands,
        });
    }

    Ok((parsed, address))
}

fn encode_operand(
    out: &mut Vec<u8>,
    labels: &Labels,
    line: usize,
    kind: OperandKind,
    tok: &str,
) -> Result<(), AsmError> {
    let byte = match kind {
        OperandKind::Reg => parse_reg(line, tok)?,
        OperandKind::Imm => match parse_imm(tok) {
            Some(v) => v,
            None if is_label_name(tok) => labels.resolve(line, tok)?,
            None => {
                return Err(AsmError::InvalidImmediate {
                    line,
                    token: tok.to_string(),
                });
            }
        },
    };
    out.push(byte);
    Ok(())
}

/// Assembles source text into program bytes.
pub fn assemble_source(source: &str) -> Result<Vec<u8>, AsmError> {
    let mut labels = Labels::default();
    let (lines, len) = parse_lines(source, &mut labels)?;
    if len > MEMORY_SIZE {
        return Err(AsmError::ProgramTooLarge {
            len,
            capacity: MEMORY_SIZE,
        });
    }

    let mut out = Vec::with_capacity(len);
    for parsed in &lines {
        out.push(parsed.instr.opcode());
        for (kind, tok) in parsed.instr.operands().iter().zip(&parsed.operands) {
            encode_operand(&mut out, &labels, parsed.line, *kind, tok)?;
        }
    }
    Ok(out)
}

/// Formats the instruction starting at `address`, e.g. `LDI R0,8`.
///
/// Returns the text and the instruction size, or `None` when the byte is not
/// an opcode or its operands run past the end of `bytes`.
pub fn disassemble_at(bytes: &[u8], address: usize) -> Option<(String, usize)> {
    let instr = Instruction::try_from(*bytes.get(address)?).ok()?;
    let operands = bytes.get(address + 1..address + instr.size())?;
    let rendered: Vec<String> = instr
        .operands()
        .iter()
        .zip(operands)
        .map(|(kind, byte)| match kind {
            OperandKind::Reg => format!("R{byte}"),
            OperandKind::Imm => byte.to_string(),
        })
        .collect();

    let text = if rendered.is_empty() {
        instr.mnemonic().to_string()
    } else {
        format!("{} {}", instr.mnemonic(), rendered.join(","))
    };
    Some((text, instr.size()))
}

/// Renders bytes in the loader's format, one binary literal per line, with
/// each decodable instruction named in a trailing comment.
pub fn render_image(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut address = 0;
    while address < bytes.len() {
        match disassemble_at(bytes, address) {
            Some((text, size)) => {
                let _ = writeln!(out, "{:08b} {COMMENT_CHAR} {text}", bytes[address]);
                for byte in &bytes[address + 1..address + size] {
                    let _ = writeln!(out, "{byte:08b}");
                }
                address += size;
            }
            None => {
                let _ = writeln!(out, "{:08b}", bytes[address]);
                address += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::loader::parse_image;

    #[test]
    fn parse_reg_valid() {
        assert_eq!(parse_reg(1, "R0").unwrap(), 0);
        assert_eq!(parse_reg(1, "r7").unwrap(), 7);
    }

    #[test]
    fn parse_reg_invalid() {
        for bad in ["R8", "R", "0", "x1", "R-1", "R255"] {
            assert!(
                matches!(parse_reg(3, bad), Err(AsmError::InvalidRegister { line: 3, .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn parse_imm_radixes() {
        assert_eq!(parse_imm("72"), Some(72));
        assert_eq!(parse_imm("0xFF"), Some(255));
        assert_eq!(parse_imm("0b1010"), Some(10));
        assert_eq!(parse_imm("256"), None);
        assert_eq!(parse_imm("-1"), None);
    }

    #[test]
    fn assemble_empty_and_comments() {
        assert!(assemble_source("").unwrap().is_empty());
        assert!(assemble_source("# nothing\n\n   # here").unwrap().is_empty());
    }

    #[test]
    fn assemble_mult_program() {
        let bytes = assemble_source(
            r#"
            LDI R0, 8
            LDI R1, 9
            MUL R0, R1   # 72
            PRN R0
            HLT
            "#,
        )
        .unwrap();
        assert_eq!(
            bytes,
            vec![
                0b1000_0010, 0, 8, 0b1000_0010, 1, 9, 0b1010_0010, 0, 1, 0b0100_0111, 0,
                0b0000_0001,
            ]
        );
    }

    #[test]
    fn labels_resolve_forward_and_backward() {
        let bytes = assemble_source(
            r#"
            start: LDI R1, sub
                   CALL R1
                   HLT
            sub:
                   LDI R2, start
                   RET
            "#,
        )
        .unwrap();
        // LDI(3) + CALL(2) + HLT(1) puts `sub` at 6
        assert_eq!(bytes[2], 6);
        assert_eq!(bytes[8], 0);
    }

    #[test]
    fn assemble_errors_carry_line() {
        assert!(matches!(
            assemble_source("HLT\nADD R0, R1"),
            Err(AsmError::UnknownInstruction { line: 2, .. })
        ));
        assert!(matches!(
            assemble_source("LDI R0"),
            Err(AsmError::ArityMismatch {
                line: 1,
                expected: 2,
                actual: 1,
                ..
            })
        ));
        assert!(matches!(
            assemble_source("LDI R0, 300"),
            Err(AsmError::InvalidImmediate { line: 1, .. })
        ));
        assert!(matches!(
            assemble_source("LDI R0, nowhere"),
            Err(AsmError::UndefinedLabel { line: 1, .. })
        ));
        assert!(matches!(
            assemble_source("a: HLT\na: HLT"),
            Err(AsmError::DuplicateLabel { line: 2, .. })
        ));
    }

    #[test]
    fn oversized_program_is_rejected() {
        let source = "LDI R0, 1\n".repeat(90);
        assert!(matches!(
            assemble_source(&source),
            Err(AsmError::ProgramTooLarge { len: 270, .. })
        ));
    }

    #[test]
    fn disassemble_instructions() {
        let bytes = [0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001];
        assert_eq!(disassemble_at(&bytes, 0), Some(("LDI R0,8".to_string(), 3)));
        assert_eq!(disassemble_at(&bytes, 3), Some(("PRN R0".to_string(), 2)));
        assert_eq!(disassemble_at(&bytes, 5), Some(("HLT".to_string(), 1)));
        assert_eq!(disassemble_at(&bytes, 6), None);
        assert_eq!(disassemble_at(&[0b1000_0010, 0], 0), None);
    }

    #[test]
    fn rendered_image_loads_back() {
        let bytes = assemble_source("LDI R0, 8\nPRN R0\nHLT").unwrap();
        let text = render_image(&bytes);
        assert!(text.starts_with("10000010 # LDI R0,8\n00000000\n00001000\n"));

        let image = parse_image(&text);
        assert!(image.skipped.is_empty());
        assert_eq!(image.bytes, bytes);
    }
}
