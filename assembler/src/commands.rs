use crate::error::{Error, Result};
use crate::parser::*;

// every SIC instruction is 3 bytes: opcode + 16 bit address
pub const INSTR_SIZE: u32 = 3;
pub const WORD_SIZE: u32 = 3;

// bit 15 of the address marks indexed addressing
pub const INDEX_BIT: u32 = 0x8000;
pub const MAX_ADDRESS: u32 = 0x7FFF;

const OPCODES: [(&str, u8); 26] = [("ADD", 0x18),
                                   ("AND", 0x40),
                                   ("COMP", 0x28),
                                   ("DIV", 0x24),
                                   ("J", 0x3C),
                                   ("JEQ", 0x30),
                                   ("JGT", 0x34),
                                   ("JLT", 0x38),
                                   ("JSUB", 0x48),
                                   ("LDA", 0x00),
                                   ("LDCH", 0x50),
                                   ("LDL", 0x08),
                                   ("LDX", 0x04),
                                   ("MUL", 0x20),
                                   ("OR", 0x44),
                                   ("RD", 0xD8),
                                   ("RSUB", 0x4C),
                                   ("STA", 0x0C),
                                   ("STCH", 0x54),
                                   ("STL", 0x14),
                                   ("STSW", 0xE8),
                                   ("STX", 0x10),
                                   ("SUB", 0x1C),
                                   ("TD", 0xE0),
                                   ("TIX", 0x2C),
                                   ("WD", 0xDC)];

const DIRECTIVES: [&str; 6] = ["START", "END", "BYTE", "WORD", "RESB", "RESW"];

// look up numeric opcode for mnemonic
pub fn opcode(mnem: &str) -> Option<u8> {
    OPCODES.iter().find(|(m, _)| *m == mnem).map(|(_, code)| *code)
}

// check if given word is a mnemonic for instruction
pub fn is_instr(mnem: &str) -> bool {
    opcode(mnem).is_some()
}

// check if given word is a directive
pub fn is_directive(dir: &str) -> bool {
    DIRECTIVES.contains(&dir)
}

// storage directives are the ones that take up (or reserve) memory
pub fn is_storage(dir: &str) -> bool {
    matches!(dir, "BYTE" | "WORD" | "RESB" | "RESW")
}

// RSUB is the only instruction without an operand
pub fn takes_operand(mnem: &str) -> bool {
    mnem != "RSUB"
}

// a lone token that is neither mnemonic nor directive is skipped like a blank line
pub fn is_malformed(parsed: &ParsedLine) -> bool {
    parsed.label.is_none()
        && parsed.operands.is_empty()
        && !is_instr(&parsed.opcode)
        && !is_directive(&parsed.opcode)
}

fn invalid_operand(line: usize, operand: &str, reason: &str) -> Error {
    Error::InvalidOperand {
        line,
        operand: operand.to_owned(),
        reason: reason.to_owned(),
    }
}

/*
    size of a line in bytes
    instructions and WORD are 3 bytes, RESW n is 3n, RESB n is n
    BYTE is 1 byte per char in C'..' and 1 byte per 2 digits in X'..'
    unknown mnemonics and storage directives without operand take no space
*/
pub fn determine_size(mnem: &str, operand: Option<&str>, line: usize) -> Result<u32> {
    if is_instr(mnem) {
        return Ok(INSTR_SIZE);
    }
    let Some(operand) = operand else {
        return Ok(0);
    };
    match mnem {
        "WORD" => Ok(WORD_SIZE),
        "RESW" => parse_count(operand)
            .map_err(|msg| invalid_operand(line, operand, msg))?
            .checked_mul(WORD_SIZE)
            .ok_or_else(|| invalid_operand(line, operand, "Reservation is too large")),
        "RESB" => parse_count(operand).map_err(|msg| invalid_operand(line, operand, msg)),
        "BYTE" => parse_literal(operand)
            .map(|lit| lit.size())
            .map_err(|msg| invalid_operand(line, operand, msg)),
        _ => Ok(0),
    }
}

// object code of WORD, 24 bit two's complement
pub fn encode_word(operand: &str, line: usize) -> Result<String> {
    let value = parse_dec(operand).map_err(|msg| invalid_operand(line, operand, msg))?;
    if !(-(1 << 23)..(1 << 24)).contains(&value) {
        return Err(invalid_operand(
            line,
            operand,
            "Word value must be in interval [-8388608, 16777215]",
        ));
    }
    Ok(format!("{:06X}", value & 0xFF_FFFF))
}

// object code of BYTE
pub fn encode_byte(operand: &str, line: usize) -> Result<String> {
    parse_literal(operand)
        .map(|lit| lit.to_hex())
        .map_err(|msg| invalid_operand(line, operand, msg))
}

// strip indexing suffix: ALPHA,X -> Some(ALPHA)
pub fn parse_indexed(operand: &str) -> Option<&str> {
    operand.strip_suffix(",X").map(str::trim_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_opcodes() {
        assert_eq!(opcode("LDA"), Some(0x00));
        assert_eq!(opcode("STA"), Some(0x0C));
        assert_eq!(opcode("ADD"), Some(0x18));
        assert_eq!(opcode("SUB"), Some(0x1C));
        assert_eq!(opcode("MUL"), Some(0x20));
        assert_eq!(opcode("JSUB"), Some(0x48));
        assert_eq!(opcode("J"), Some(0x3C));
        assert_eq!(opcode("LDX"), Some(0x04));
        assert_eq!(opcode("BYTE"), None);
        assert_eq!(opcode("lda"), None);
    }

    #[test]
    fn directives_are_not_instructions() {
        for dir in DIRECTIVES {
            assert!(is_directive(dir));
            assert!(!is_instr(dir));
        }
    }

    #[test]
    fn sizes() {
        assert_eq!(determine_size("LDA", Some("ALPHA"), 1), Ok(3));
        assert_eq!(determine_size("RSUB", None, 1), Ok(3));
        assert_eq!(determine_size("WORD", Some("5"), 1), Ok(3));
        assert_eq!(determine_size("RESW", Some("4"), 1), Ok(12));
        assert_eq!(determine_size("RESB", Some("4"), 1), Ok(4));
        assert_eq!(determine_size("BYTE", Some("C'EOF'"), 1), Ok(3));
        assert_eq!(determine_size("BYTE", Some("X'F1F2'"), 1), Ok(2));
        assert_eq!(determine_size("FOO", Some("BAR"), 1), Ok(0));
        assert_eq!(determine_size("RESW", None, 1), Ok(0));
    }

    #[test]
    fn bad_reservation_names_line() {
        let err = determine_size("RESB", Some("many"), 7).unwrap_err();
        assert_eq!(err.line(), Some(7));
        assert!(matches!(err, Error::InvalidOperand { .. }));
    }

    #[test]
    fn word_encoding() {
        assert_eq!(encode_word("5", 1).unwrap(), "000005");
        assert_eq!(encode_word("4096", 1).unwrap(), "001000");
        assert_eq!(encode_word("-1", 1).unwrap(), "FFFFFF");
        assert!(encode_word("16777216", 1).is_err());
    }

    #[test]
    fn lone_unknown_token_is_malformed() {
        assert!(is_malformed(&parse_line("HALT").unwrap()));
        assert!(!is_malformed(&parse_line("END").unwrap()));
        assert!(!is_malformed(&parse_line("RSUB").unwrap()));
        assert!(!is_malformed(&parse_line("WORD").unwrap()));
        assert!(!is_malformed(&parse_line("HALT NOW").unwrap()));
        assert!(!is_malformed(&parse_line("LOOP: HALT").unwrap()));
    }

    #[test]
    fn only_rsub_omits_operand() {
        assert!(!takes_operand("RSUB"));
        assert!(takes_operand("LDA"));
        assert!(takes_operand("J"));
    }

    #[test]
    fn indexed_suffix() {
        assert_eq!(parse_indexed("ALPHA,X"), Some("ALPHA"));
        assert_eq!(parse_indexed("ALPHA"), None);
    }
}
