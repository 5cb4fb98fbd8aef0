//! Bytecode serialization/deserialization for opal programs.
//!
//! Binary format, little-endian throughout:
//! - Magic: "OPAL" (4 bytes)
//! - Version: u32
//! - String pool: count + (length + UTF-8 bytes) per string
//! - Code: word count + u64 instruction words
//!
//! Deserialization validates the instruction stream: every word in opcode
//! position must decode, every immediate must be present, and every string
//! immediate must index into the pool. A loaded program can only fail at
//! run time for dynamic reasons (underflow, operator errors).

use std::io::{self, Read, Write};

use super::ops::Opcode;
use super::Program;

/// Magic bytes for opal bytecode files
pub const MAGIC: &[u8; 4] = b"OPAL";

/// Current bytecode format version
pub const VERSION: u32 = 1;

/// Error type for bytecode operations
#[derive(Debug)]
pub enum BytecodeError {
    /// Invalid magic number
    InvalidMagic,
    /// Unsupported version
    UnsupportedVersion(u32),
    /// Truncated data
    UnexpectedEof,
    /// A word in opcode position is not a known opcode
    InvalidOpcode(u64),
    /// An opcode's immediate word is missing
    MissingImmediate(usize),
    /// A string immediate points outside the pool
    InvalidStringIndex(usize),
    /// I/O error
    Io(io::Error),
    /// Invalid UTF-8 in string
    InvalidUtf8,
}

impl From<io::Error> for BytecodeError {
    fn from(e: io::Error) -> Self {
        BytecodeError::Io(e)
    }
}

impl std::fmt::Display for BytecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BytecodeError::InvalidMagic => write!(f, "invalid magic number"),
            BytecodeError::UnsupportedVersion(v) => write!(f, "unsupported version: {}", v),
            BytecodeError::UnexpectedEof => write!(f, "unexpected end of file"),
            BytecodeError::InvalidOpcode(word) => write!(f, "invalid opcode: {}", word),
            BytecodeError::MissingImmediate(at) => {
                write!(f, "missing immediate for instruction at word {}", at)
            }
            BytecodeError::InvalidStringIndex(index) => {
                write!(f, "string constant {} out of range", index)
            }
            BytecodeError::Io(e) => write!(f, "I/O error: {}", e),
            BytecodeError::InvalidUtf8 => write!(f, "invalid UTF-8 string"),
        }
    }
}

impl std::error::Error for BytecodeError {}

/// Serialize a Program to bytes
pub fn serialize(program: &Program) -> Vec<u8> {
    let mut buf = Vec::new();
    write_program(&mut buf, program).expect("writing to Vec cannot fail");
    buf
}

/// Deserialize and validate a Program from bytes
pub fn deserialize(data: &[u8]) -> Result<Program, BytecodeError> {
    let mut cursor = io::Cursor::new(data);
    read_program(&mut cursor)
}

/// Write a Program to a writer
pub fn write_program<W: Write>(w: &mut W, program: &Program) -> io::Result<()> {
    // Magic
    w.write_all(MAGIC)?;

    // Version
    w.write_all(&VERSION.to_le_bytes())?;

    // String pool
    write_u32(w, program.strings.len() as u32)?;
    for s in &program.strings {
        write_string(w, s)?;
    }

    // Code
    write_u32(w, program.code.len() as u32)?;
    for word in &program.code {
        w.write_all(&word.to_le_bytes())?;
    }

    Ok(())
}

/// Read a Program from a reader, validating the instruction stream
pub fn read_program<R: Read>(r: &mut R) -> Result<Program, BytecodeError> {
    // Magic
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)
        .map_err(|_| BytecodeError::UnexpectedEof)?;
    if &magic != MAGIC {
        return Err(BytecodeError::InvalidMagic);
    }

    // Version
    let version = read_u32(r)?;
    if version != VERSION {
        return Err(BytecodeError::UnsupportedVersion(version));
    }

    // String pool
    let string_count = read_u32(r)? as usize;
    let mut strings = Vec::with_capacity(string_count);
    for _ in 0..string_count {
        strings.push(read_string(r)?);
    }

    // Code
    let word_count = read_u32(r)? as usize;
    let mut code = Vec::with_capacity(word_count);
    for _ in 0..word_count {
        code.push(read_u64(r)?);
    }

    let program = Program { code, strings };
    validate(&program)?;
    Ok(program)
}

/// Check that the code decodes cleanly: known opcodes, immediates present,
/// string immediates inside the pool.
pub fn validate(program: &Program) -> Result<(), BytecodeError> {
    let mut pc = 0;
    while pc < program.code.len() {
        let at = pc;
        let op = Opcode::from_word(program.code[pc])
            .map_err(|_| BytecodeError::InvalidOpcode(program.code[pc]))?;
        pc += 1;

        if op.immediate_words() > 0 {
            if pc >= program.code.len() {
                return Err(BytecodeError::MissingImmediate(at));
            }
            let imm = program.code[pc];
            pc += 1;

            if op == Opcode::PushString && imm as usize >= program.strings.len() {
                return Err(BytecodeError::InvalidStringIndex(imm as usize));
            }
        }
    }
    Ok(())
}

fn write_u32<W: Write>(w: &mut W, value: u32) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32, BytecodeError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .map_err(|_| BytecodeError::UnexpectedEof)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> Result<u64, BytecodeError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)
        .map_err(|_| BytecodeError::UnexpectedEof)?;
    Ok(u64::from_le_bytes(buf))
}

fn write_string<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    write_u32(w, s.len() as u32)?;
    w.write_all(s.as_bytes())
}

fn read_string<R: Read>(r: &mut R) -> Result<String, BytecodeError> {
    let len = read_u32(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)
        .map_err(|_| BytecodeError::UnexpectedEof)?;
    String::from_utf8(buf).map_err(|_| BytecodeError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_program() -> Program {
        Program::new(
            vec![
                Opcode::PushString.word(),
                0,
                Opcode::PushInt.word(),
                42,
                Opcode::Print.word(),
                Opcode::Print.word(),
                Opcode::Halt.word(),
            ],
            vec!["hello".to_string()],
        )
    }

    #[test]
    fn test_round_trip() {
        let program = sample_program();
        let bytes = serialize(&program);
        let loaded = deserialize(&bytes).unwrap();
        assert_eq!(loaded, program);
    }

    #[test]
    fn test_round_trip_empty_pool() {
        let program = Program::new(vec![Opcode::Halt.word()], vec![]);
        let loaded = deserialize(&serialize(&program)).unwrap();
        assert_eq!(loaded, program);
    }

    #[test]
    fn test_invalid_magic() {
        let mut bytes = serialize(&sample_program());
        bytes[0] = b'X';
        assert!(matches!(
            deserialize(&bytes),
            Err(BytecodeError::InvalidMagic)
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = serialize(&sample_program());
        bytes[4] = 0xFF;
        assert!(matches!(
            deserialize(&bytes),
            Err(BytecodeError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_truncated_data() {
        let bytes = serialize(&sample_program());
        assert!(matches!(
            deserialize(&bytes[..bytes.len() - 3]),
            Err(BytecodeError::UnexpectedEof)
        ));
        assert!(matches!(
            deserialize(&bytes[..2]),
            Err(BytecodeError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_opcode() {
        let program = Program::new(vec![99, Opcode::Halt.word()], vec![]);
        assert!(matches!(
            deserialize(&serialize(&program)),
            Err(BytecodeError::InvalidOpcode(99))
        ));
    }

    #[test]
    fn test_validate_rejects_missing_immediate() {
        let program = Program::new(vec![Opcode::PushInt.word()], vec![]);
        assert!(matches!(
            deserialize(&serialize(&program)),
            Err(BytecodeError::MissingImmediate(0))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_string_index() {
        let program = Program::new(
            vec![Opcode::PushString.word(), 2, Opcode::Halt.word()],
            vec!["only one".to_string()],
        );
        assert!(matches!(
            deserialize(&serialize(&program)),
            Err(BytecodeError::InvalidStringIndex(2))
        ));
    }
}
