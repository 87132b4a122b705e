use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// which label rule a symbol broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRule {
    TooLong,
    NotAlphanumeric,
    MisplacedStart,
    MisplacedEnd,
}

impl fmt::Display for SymbolRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolRule::TooLong => write!(f, "symbol is longer than 6 characters"),
            SymbolRule::NotAlphanumeric => write!(f, "symbol contains invalid characters"),
            SymbolRule::MisplacedStart => write!(f, "START must be the first line"),
            SymbolRule::MisplacedEnd => write!(f, "END must be the last line"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Line {line}, invalid symbol `{symbol}`: {rule}")]
    InvalidSymbol {
        line: usize,
        symbol: String,
        rule: SymbolRule,
    },

    #[error("Line {line}, duplicate symbol: `{symbol}`")]
    DuplicateSymbol { line: usize, symbol: String },

    #[error("Line {line}, symbol `{symbol}` not found in symbol table")]
    UnresolvedReference { line: usize, symbol: String },

    #[error("Line {line}, invalid opcode: `{opcode}`")]
    InvalidOpcode { line: usize, opcode: String },

    #[error("Line {line}, invalid operand `{operand}`: {reason}")]
    InvalidOperand {
        line: usize,
        operand: String,
        reason: String,
    },

    #[error("Line {line}, address {address:04X} of `{symbol}` does not fit in 15 bits")]
    AddressOutOfRange {
        line: usize,
        symbol: String,
        address: u32,
    },

    #[error("Symbol `{symbol}` has an invalid hexadecimal address: `{value}`")]
    InvalidAddress { symbol: String, value: String },

    #[error("Line {line}, symbol table entries must look like `NAME: ADDRESS`")]
    MalformedTable { line: usize },
}

impl Error {
    // 1-based source line the error points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::InvalidSymbol { line, .. }
            | Error::DuplicateSymbol { line, .. }
            | Error::UnresolvedReference { line, .. }
            | Error::InvalidOpcode { line, .. }
            | Error::InvalidOperand { line, .. }
            | Error::AddressOutOfRange { line, .. }
            | Error::MalformedTable { line } => Some(*line),
            Error::InvalidAddress { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_line_and_rule() {
        let err = Error::InvalidSymbol {
            line: 1,
            symbol: "TOOLONGNAME".to_owned(),
            rule: SymbolRule::TooLong,
        };
        assert_eq!(
            err.to_string(),
            "Line 1, invalid symbol `TOOLONGNAME`: symbol is longer than 6 characters"
        );
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn invalid_address_has_no_line() {
        let err = Error::InvalidAddress {
            symbol: "ALPHA".to_owned(),
            value: "zz".to_owned(),
        };
        assert_eq!(err.line(), None);
    }
}
