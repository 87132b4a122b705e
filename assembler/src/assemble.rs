use crate::commands::*;
use crate::error::{Error, Result};
use crate::objwriter::*;
use crate::parser::{parse_hex, SourceLine};
use crate::symtab::SymbolTable;
use tracing::{debug, trace};

/// Second pass settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Report a direct operand that resolves to address `0000` as an
    /// unresolved reference, the way the address-zero fallback always has.
    /// When off, only symbols missing from the table are unresolved.
    pub zero_address_is_unresolved: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            zero_address_is_unresolved: true,
        }
    }
}

// one source line with the address and object code it got
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledLine {
    pub line: usize,
    // None for comments and empty lines
    pub address: Option<u32>,
    pub code: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCode {
    pub name: Option<String>,
    pub start: u32,
    // location counter after the last line
    pub end: u32,
    // first instruction to execute, named by END
    pub entry: u32,
    pub records: Vec<ObjectRecord>,
    pub fragments: Vec<Fragment>,
    pub lines: Vec<AssembledLine>,
}

impl ObjectCode {
    pub fn length(&self) -> u32 {
        self.end - self.start
    }

    pub fn record_strings(&self) -> Vec<String> {
        self.records.iter().map(|rec| rec.code.clone()).collect()
    }
}

fn unresolved(line: usize, symbol: &str) -> Error {
    Error::UnresolvedReference {
        line,
        symbol: symbol.to_owned(),
    }
}

// resolve operand to the 16 bit address field, ALPHA or ALPHA,X
fn resolve_operand(operand: &str, symtab: &SymbolTable, options: &Options, line: usize) -> Result<u32> {
    let (symbol, indexed) = match parse_indexed(operand) {
        Some(base) => (base, true),
        None => (operand, false),
    };

    let address = symtab.get(symbol).ok_or_else(|| unresolved(line, symbol))?;
    // old SIC addresses are in interval [0, 32767], bit 15 is the X flag
    if address > MAX_ADDRESS {
        return Err(Error::AddressOutOfRange {
            line,
            symbol: symbol.to_owned(),
            address,
        });
    }

    if indexed {
        Ok(address | INDEX_BIT)
    } else if address == 0 && options.zero_address_is_unresolved {
        Err(unresolved(line, symbol))
    } else {
        Ok(address)
    }
}

// get machine code from instruction, opcode byte + address
pub fn get_machine_code(mnem: &str, operand: Option<&str>, symtab: &SymbolTable, options: &Options, line: usize) -> Result<String> {
    let code = opcode(mnem).ok_or_else(|| Error::InvalidOpcode {
        line,
        opcode: mnem.to_owned(),
    })?;

    let address = match operand {
        Some(op) => resolve_operand(op, symtab, options, line)?,
        None if !takes_operand(mnem) => 0,
        // a missing operand can't name a symbol
        None => return Err(unresolved(line, "")),
    };

    Ok(format!("{:02X}{:04X}", code, address))
}

// split code to fragments no wider than a record
fn fragments_of(code: &str, address: u32) -> impl Iterator<Item = Fragment> + '_ {
    code.as_bytes()
        .chunks(RECORD_WIDTH)
        .enumerate()
        .map(move |(i, chunk)| Fragment {
            address: address + (i * RECORD_WIDTH / 2) as u32,
            code: String::from_utf8_lossy(chunk).into_owned(),
        })
}

// second pass, translate every line to object code
pub fn generate_obj(program: &[SourceLine], symtab: &SymbolTable, options: &Options) -> Result<ObjectCode> {
    let mut builder = RecordBuilder::new();
    let mut fragments = Vec::new();
    let mut lines = Vec::with_capacity(program.len());

    let mut name = None;
    let mut start: u32 = 0;
    let mut loc_counter: u32 = 0;
    let mut entry = None;

    for line in program {
        let line_count = line.number();
        let Some(parsed) = line.parse().filter(|parsed| !is_malformed(parsed)) else {
            lines.push(AssembledLine {
                line: line_count,
                address: None,
                code: String::new(),
                text: line.text.clone(),
            });
            continue;
        };
        let mnem = parsed.opcode.as_str();
        let operand = parsed.operand();
        let prev_loc = loc_counter;

        let machine_code = match mnem {
            "START" => {
                start = match operand {
                    Some(op) => parse_hex(op).map_err(|msg| Error::InvalidOperand {
                        line: line_count,
                        operand: op.to_owned(),
                        reason: msg.to_owned(),
                    })?,
                    None => 0,
                };
                loc_counter = start;
                name = parsed.label.clone();
                String::new()
            }
            "END" => {
                // END <label> names the first instruction, default is start
                entry = operand.and_then(|op| symtab.get(op));
                String::new()
            }
            _ if is_instr(mnem) => get_machine_code(mnem, operand, symtab, options, line_count)?,
            // storage directive without operand, pass it through
            _ if is_storage(mnem) && operand.is_none() => String::new(),
            "WORD" => encode_word(operand.unwrap_or_default(), line_count)?,
            "BYTE" => encode_byte(operand.unwrap_or_default(), line_count)?,
            // reserved storage carries no object bytes
            "RESW" | "RESB" => String::new(),
            _ => {
                return Err(Error::InvalidOpcode {
                    line: line_count,
                    opcode: mnem.to_owned(),
                })
            }
        };

        if mnem != "START" && mnem != "END" {
            let size = determine_size(mnem, operand, line_count)?;
            loc_counter = loc_counter
                .checked_add(size)
                .ok_or_else(|| Error::InvalidOperand {
                    line: line_count,
                    operand: operand.unwrap_or_default().to_owned(),
                    reason: "Location counter overflow".to_owned(),
                })?;
        }

        let address = if mnem == "START" { start } else { prev_loc };
        trace!(line = line_count, address, code = %machine_code, "{}", line.text);
        for fragment in fragments_of(&machine_code, address) {
            builder.push(&fragment);
            fragments.push(fragment);
        }

        lines.push(AssembledLine {
            line: line_count,
            address: Some(address),
            code: machine_code,
            text: line.text.clone(),
        });
    }

    let records = builder.finish();
    debug!(records = records.len(), bytes = loc_counter - start, "pass two done");

    Ok(ObjectCode {
        name,
        start,
        end: loc_counter,
        entry: entry.unwrap_or(start),
        records,
        fragments,
        lines,
    })
}
