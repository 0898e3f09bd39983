#[cfg(test)]
mod tests {
    use vecscript::bytecode::data_type::DataType;
    use vecscript::bytecode::instruction::{Instruction, Operand, make};
    use vecscript::bytecode::op_code::OpCode;
    use vecscript::bytecode::op_code::declared_type_count;
    use vecscript::bytecode::op_code::disassemble;
    use vecscript::bytecode::op_code::operand_range;

    #[test]
    fn mnemonics_round_trip() {
        for op in OpCode::ALL {
            let parsed: OpCode = op.mnemonic().parse().unwrap();
            assert_eq!(parsed, op);
        }
        assert!("PUSH".parse::<OpCode>().is_err());
    }

    #[test]
    fn opcode_values_are_dense() {
        for (i, op) in OpCode::ALL.into_iter().enumerate() {
            assert_eq!(op as u8 as usize, i);
        }
    }

    #[test]
    fn serde_uses_mnemonics() {
        let text = serde_json::to_string(&OpCode::OpMovelm).unwrap();
        assert_eq!(text, "\"MOVELM\"");
        let op: OpCode = serde_json::from_str("\"JMPN\"").unwrap();
        assert_eq!(op, OpCode::OpJmpn);
    }

    #[test]
    fn operand_counts() {
        assert_eq!(operand_range(OpCode::OpAdd), (3, Some(3)));
        assert_eq!(operand_range(OpCode::OpCast), (2, Some(2)));
        assert_eq!(operand_range(OpCode::OpVec), (1, None));
        assert_eq!(operand_range(OpCode::OpLen), (2, Some(3)));
        assert_eq!(operand_range(OpCode::OpNop), (0, Some(1)));
    }

    #[test]
    fn only_cast_declares_two_kinds() {
        for op in OpCode::ALL {
            let expected = if op == OpCode::OpCast { 2 } else { 1 };
            assert_eq!(declared_type_count(op), expected, "{op}");
        }
    }

    #[test]
    fn control_opcodes() {
        let control: Vec<OpCode> = OpCode::ALL.into_iter().filter(|op| op.is_control()).collect();
        assert_eq!(
            control,
            vec![
                OpCode::OpJmp,
                OpCode::OpJmpn,
                OpCode::OpCall,
                OpCode::OpEnd,
                OpCode::OpLabel,
                OpCode::OpNop
            ]
        );
    }

    #[test]
    fn instruction_json_shape() {
        let instruction = Instruction::cast(
            DataType::Float64,
            DataType::Int64,
            &[Operand::register(0), Operand::constant(1)],
        );
        let value = serde_json::to_value(&instruction).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "op": "CAST",
                "data_types": ["FLOAT64", "INT64"],
                "operands": ["R0", "C1"]
            })
        );
        let back: Instruction = serde_json::from_value(value).unwrap();
        assert_eq!(back, instruction);
    }

    #[test]
    fn bad_operand_text_is_rejected() {
        let result: Result<Instruction, _> = serde_json::from_str(
            r#"{"op": "MOV", "data_types": ["INT64"], "operands": ["R0", "X1"]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn disassemble_numbers_lines() {
        let instructions = vec![
            make(OpCode::OpLabel, DataType::Void, &[]),
            make(
                OpCode::OpSub,
                DataType::Float64,
                &[Operand::local(0), Operand::local(0), Operand::constant(2)],
            ),
        ];
        assert_eq!(
            disassemble(&instructions),
            "0000 LABEL VOID\n0001 SUB FLOAT64 L0 L0 C2\n"
        );
    }
}
