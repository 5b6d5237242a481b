#[cfg(test)]
mod tests {
    use crate::virtual_machine::isa::{Instruction, OperandKind};
    use std::collections::HashSet;

    #[test]
    fn declared_operands_match_opcode_bits() {
        for instr in Instruction::ALL {
            assert_eq!(
                instr.operands().len(),
                instr.operand_count(),
                "{} declares operands that disagree with its opcode",
                instr.mnemonic()
            );
        }
    }

    #[test]
    fn only_call_and_ret_set_pc() {
        let setters: Vec<_> = Instruction::ALL
            .iter()
            .filter(|i| i.sets_pc())
            .copied()
            .collect();
        assert_eq!(setters, vec![Instruction::Call, Instruction::Ret]);
    }

    #[test]
    fn only_mul_uses_alu() {
        let alu: Vec<_> = Instruction::ALL
            .iter()
            .filter(|i| i.is_alu())
            .copied()
            .collect();
        assert_eq!(alu, vec![Instruction::Mul]);
    }

    #[test]
    fn opcodes_and_mnemonics_are_unique() {
        let opcodes: HashSet<u8> = Instruction::ALL.iter().map(|i| i.opcode()).collect();
        let names: HashSet<&str> = Instruction::ALL.iter().map(|i| i.mnemonic()).collect();
        assert_eq!(opcodes.len(), Instruction::ALL.len());
        assert_eq!(names.len(), Instruction::ALL.len());
    }

    #[test]
    fn every_opcode_decodes_to_itself() {
        for instr in Instruction::ALL {
            assert_eq!(Instruction::try_from(instr.opcode()).unwrap(), *instr);
        }
        let known: HashSet<u8> = Instruction::ALL.iter().map(|i| i.opcode()).collect();
        for byte in 0..=u8::MAX {
            assert_eq!(Instruction::try_from(byte).is_ok(), known.contains(&byte));
        }
    }

    #[test]
    fn first_operand_of_register_instructions_is_a_register() {
        for instr in Instruction::ALL {
            if let Some(first) = instr.operands().first() {
                assert_eq!(*first, OperandKind::Reg, "{}", instr.mnemonic());
            }
        }
    }
}
