use crate::commands::*;
use crate::error::{Error, Result, SymbolRule};
use crate::parser::{parse_hex, ParsedLine, SourceLine};
use crate::symtab::SymbolTable;
use std::fmt;
use tracing::{debug, trace};

const MAX_SYMBOL_LEN: usize = 6;

// address each processed line was assigned, for display only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub line: usize,
    pub address: u32,
    pub text: String,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}\t{}", self.address, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOne {
    // label of the START line
    pub name: Option<String>,
    pub start: u32,
    pub length: u32,
    pub symtab: SymbolTable,
    pub trace: Vec<TraceEntry>,
}

fn invalid(line: usize, symbol: &str, rule: SymbolRule) -> Error {
    Error::InvalidSymbol {
        line,
        symbol: symbol.to_owned(),
        rule,
    }
}

/*
    label rules
    at most 6 chars, alphanumeric only
    START may only label the first line and END only the last one,
    and a label on the first (last) line must come with START (END)
*/
pub fn validate_symbol(symbol: &str, opcode: &str, line: usize, first: bool, last: bool) -> Result<()> {
    if symbol.chars().count() > MAX_SYMBOL_LEN {
        return Err(invalid(line, symbol, SymbolRule::TooLong));
    }
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid(line, symbol, SymbolRule::NotAlphanumeric));
    }
    let is_start = symbol == "START" || opcode == "START";
    if (symbol == "START" && !first) || (first && !is_start) {
        return Err(invalid(line, symbol, SymbolRule::MisplacedStart));
    }
    let is_end = symbol == "END" || opcode == "END";
    if (symbol == "END" && !last) || (last && !is_end) {
        return Err(invalid(line, symbol, SymbolRule::MisplacedEnd));
    }
    Ok(())
}

// first pass, assign addresses to labels and measure the program
pub fn get_symbol_table(program: &[SourceLine]) -> Result<PassOne> {
    // skip empty, comment and malformed lines, first and last refer to what remains
    let lines: Vec<(&SourceLine, ParsedLine)> = program
        .iter()
        .filter_map(|line| line.parse().map(|parsed| (line, parsed)))
        .filter(|(_, parsed)| !is_malformed(parsed))
        .collect();

    let mut symtab = SymbolTable::new();
    let mut trace_lines = Vec::with_capacity(lines.len());
    let mut name = None;
    let mut start: u32 = 0;
    let mut loc_counter: u32 = 0;

    for (pos, (line, parsed)) in lines.iter().enumerate() {
        let line_count = line.number();
        let first = pos == 0;
        let last = pos + 1 == lines.len();

        if let Some(label) = &parsed.label {
            validate_symbol(label, &parsed.opcode, line_count, first, last)?;
        }

        trace!(line = line_count, address = loc_counter, "{}", line.text);
        let entry = TraceEntry {
            line: line_count,
            address: loc_counter,
            text: line.text.clone(),
        };

        match parsed.opcode.as_str() {
            "START" => {
                if !first {
                    return Err(invalid(line_count, "START", SymbolRule::MisplacedStart));
                }
                start = match parsed.operand() {
                    Some(op) => parse_hex(op).map_err(|msg| Error::InvalidOperand {
                        line: line_count,
                        operand: op.to_owned(),
                        reason: msg.to_owned(),
                    })?,
                    None => 0,
                };
                loc_counter = start;
                name = parsed.label.clone();
                trace_lines.push(TraceEntry {
                    address: start,
                    ..entry
                });
                continue;
            }
            "END" => {
                if !last {
                    return Err(invalid(line_count, "END", SymbolRule::MisplacedEnd));
                }
                trace_lines.push(entry);
                break;
            }
            _ => (),
        }

        if let Some(label) = &parsed.label {
            if !symtab.define(label, loc_counter) {
                return Err(Error::DuplicateSymbol {
                    line: line_count,
                    symbol: label.clone(),
                });
            }
            debug!(symbol = %label, address = loc_counter, "defined symbol");
        }
        trace_lines.push(entry);

        let size = determine_size(&parsed.opcode, parsed.operand(), line_count)?;
        loc_counter = loc_counter
            .checked_add(size)
            .ok_or_else(|| Error::InvalidOperand {
                line: line_count,
                operand: parsed.operand().unwrap_or_default().to_owned(),
                reason: "Location counter overflow".to_owned(),
            })?;
    }

    let length = loc_counter - start;
    debug!(symbols = symtab.len(), start, length, "pass one done");

    Ok(PassOne {
        name,
        start,
        length,
        symtab,
        trace: trace_lines,
    })
}
