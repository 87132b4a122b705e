use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([CX])'(.*)'$").expect("valid regex"));

// one line of source, whitespace already collapsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub index: usize,
    pub text: String,
}

impl SourceLine {
    // 1-based number used in diagnostics
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn parse(&self) -> Option<ParsedLine> {
        parse_line(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub label: Option<String>,
    pub opcode: String,
    pub operands: Vec<String>,
}

impl ParsedLine {
    // the grammar carries at most one operand token
    pub fn operand(&self) -> Option<&str> {
        self.operands.first().map(|op| op.as_str())
    }
}

/*
    split source text to cleaned lines
    all whitespace runs are reduced to one space " " and lines are trimmed
    empty lines are kept so that line numbers stay accurate
*/
pub fn read_source(text: &str) -> Vec<SourceLine> {
    text.lines()
        .enumerate()
        .map(|(index, line)| SourceLine {
            index,
            text: WHITESPACE.replace_all(line, " ").trim().to_string(),
        })
        .collect()
}

// cut a trailing `; comment`, semicolons inside quotes belong to literals
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, ch) in line.char_indices() {
        match ch {
            '\'' => quoted = !quoted,
            ';' if !quoted => return &line[..i],
            _ => (),
        }
    }
    line
}

fn strip_colon(label: &str) -> String {
    label.strip_suffix(':').unwrap_or(label).to_owned()
}

/*
    decompose one line to (label, opcode, operands)
    3 tokens                    -> label opcode operand
    2 tokens, 1st ends with ':' -> label opcode
    2 tokens                    -> opcode operand
    1 token                     -> opcode
    anything past the 3rd token is joined back into the operand
*/
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') {
        return None;
    }

    let tokens: Vec<&str> = strip_comment(line).split_whitespace().collect();
    let parsed = match tokens.as_slice() {
        [] => return None,
        [opcode] => ParsedLine {
            label: None,
            opcode: opcode.to_string(),
            operands: Vec::new(),
        },
        [label, opcode] if label.ends_with(':') => ParsedLine {
            label: Some(strip_colon(label)),
            opcode: opcode.to_string(),
            operands: Vec::new(),
        },
        [opcode, operand] => ParsedLine {
            label: None,
            opcode: opcode.to_string(),
            operands: vec![operand.to_string()],
        },
        [label, opcode, rest @ ..] => ParsedLine {
            label: Some(strip_colon(label)),
            opcode: opcode.to_string(),
            operands: vec![rest.join(" ")],
        },
    };

    Some(parsed)
}

// parse hexadecimal address, 0x prefix is optional
pub fn parse_hex(num_str: &str) -> Result<u32, &'static str> {
    let digits = num_str
        .strip_prefix("0x")
        .or_else(|| num_str.strip_prefix("0X"))
        .unwrap_or(num_str);

    u32::from_str_radix(digits, 16).map_err(|_| "Failed parsing hexadecimal number")
}

// parse signed decimal number
pub fn parse_dec(num_str: &str) -> Result<i64, &'static str> {
    num_str
        .parse::<i64>()
        .map_err(|_| "Failed parsing decimal number")
}

// parse size of reservation, RESB / RESW
pub fn parse_count(num_str: &str) -> Result<u32, &'static str> {
    match parse_dec(num_str)? {
        value if value < 0 => Err("Reservations can't be negative"),
        value => u32::try_from(value).map_err(|_| "Reservation is too large"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Char(Vec<u8>),
    Hex(String),
    Byte(u8),
}

impl Literal {
    // size in bytes
    pub fn size(&self) -> u32 {
        match self {
            Literal::Char(bytes) => bytes.len() as u32,
            Literal::Hex(digits) => (digits.len() / 2) as u32,
            Literal::Byte(_) => 1,
        }
    }

    pub fn to_hex(&self) -> String {
        match self {
            Literal::Char(bytes) => bytes.iter().map(|b| format!("{:02X}", b)).collect(),
            // hex digits are emitted as written
            Literal::Hex(digits) => digits.clone(),
            Literal::Byte(value) => format!("{:02X}", value),
        }
    }
}

// parse hex from init X'<hex val>'
fn parse_hex_literal(digits: &str) -> Result<Literal, &'static str> {
    if digits.is_empty() {
        return Err("Invalid hex format. Use: X'<hex val>'. Example: X'42'");
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("Can't parse hex literal");
    }
    if digits.len() % 2 != 0 {
        return Err("Hex literal needs an even number of digits");
    }
    Ok(Literal::Hex(digits.to_owned()))
}

// parse char from init C'<char val>'
fn parse_char_literal(chars: &str) -> Result<Literal, &'static str> {
    if chars.is_empty() {
        return Err("Invalid char format. Use: C'<char val>'. Example: C'EOF'");
    }
    if !chars.is_ascii() {
        return Err("Char literal must be ASCII");
    }
    Ok(Literal::Char(chars.bytes().collect()))
}

// parse BYTE operand: C'..', X'..' or a plain number that fits one byte
pub fn parse_literal(operand: &str) -> Result<Literal, &'static str> {
    if let Some(caps) = LITERAL.captures(operand) {
        return match &caps[1] {
            "X" => parse_hex_literal(&caps[2]),
            _ => parse_char_literal(&caps[2]),
        };
    }

    match parse_dec(operand)? {
        value @ 0..=255 => Ok(Literal::Byte(value as u8)),
        _ => Err("Byte value must be in interval [0, 255]"),
    }
}
