//! Human-readable listing of bytecode programs.

use super::ops::Opcode;
use super::Program;

/// Render a program as one line per instruction: the word offset, the
/// opcode name, and the decoded immediate. String immediates also show the
/// resolved constant. Undecodable words are listed rather than failing, so
/// a listing is always produced.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();
    let mut pc = 0;
    while pc < program.code.len() {
        let at = pc;
        let word = program.code[pc];
        pc += 1;

        let op = match Opcode::from_word(word) {
            Ok(op) => op,
            Err(_) => {
                out.push_str(&format!("{:04} ??? ({})\n", at, word));
                continue;
            }
        };

        out.push_str(&format!("{:04} {}", at, op.name()));
        if op.immediate_words() > 0 {
            match program.code.get(pc).copied() {
                Some(imm) => {
                    pc += 1;
                    match op {
                        Opcode::PushInt => {
                            out.push_str(&format!(" {}", imm as u32 as i32));
                        }
                        Opcode::PushFloat => {
                            out.push_str(&format!(" {}", f32::from_bits(imm as u32)));
                        }
                        Opcode::PushString => match program.strings.get(imm as usize) {
                            Some(s) => out.push_str(&format!(" {} ; {:?}", imm, s)),
                            None => out.push_str(&format!(" {} ; <bad index>", imm)),
                        },
                        _ => out.push_str(&format!(" {}", imm)),
                    }
                }
                None => out.push_str(" <missing immediate>"),
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing() {
        let program = Program::new(
            vec![
                Opcode::PushInt.word(),
                (-3i32) as u32 as u64,
                Opcode::PushFloat.word(),
                2.5f32.to_bits() as u64,
                Opcode::PushString.word(),
                0,
                Opcode::BuildCollection.word(),
                3,
                Opcode::Add.word(),
                Opcode::Print.word(),
                Opcode::Halt.word(),
            ],
            vec!["hi".to_string()],
        );
        let listing = disassemble(&program);
        let expected = "\
0000 push_int -3
0002 push_float 2.5
0004 push_string 0 ; \"hi\"
0006 build_collection 3
0008 add
0009 print
0010 halt
";
        assert_eq!(listing, expected);
    }

    #[test]
    fn test_listing_survives_garbage() {
        let program = Program::new(vec![99, Opcode::PushInt.word()], vec![]);
        let listing = disassemble(&program);
        assert!(listing.contains("??? (99)"));
        assert!(listing.contains("<missing immediate>"));
    }
}
