//! Two-pass assembler for the SIC instruction set.
//!
//! Pass 1 walks the source, validates labels and assigns every label an
//! address. Pass 2 walks the same source again and turns each instruction or
//! storage directive into hexadecimal object code, grouped into records of
//! at most 60 hex characters.
//!
//! ```
//! let (first, code) = sicasm::assemble("START 0\nLDA ALPHA\nALPHA WORD 5\nEND").unwrap();
//! assert_eq!(first.symtab.get("ALPHA"), Some(3));
//! assert_eq!(first.length, 6);
//! assert_eq!(code.record_strings(), vec!["000003000005"]);
//! ```

pub mod assemble;
pub mod commands;
pub mod error;
pub mod objwriter;
pub mod parser;
pub mod symbols;
pub mod symtab;

pub use assemble::{AssembledLine, ObjectCode, Options};
pub use error::{Error, Result, SymbolRule};
pub use objwriter::{Fragment, ObjectRecord};
pub use parser::{parse_line, read_source, ParsedLine, SourceLine};
pub use symbols::{PassOne, TraceEntry};
pub use symtab::SymbolTable;

/// Run pass 1: symbol table, program length and address trace.
pub fn pass_one(program: &[SourceLine]) -> Result<PassOne> {
    symbols::get_symbol_table(program)
}

/// Run pass 2 with the default [`Options`].
///
/// The table does not have to come from [`pass_one`], but it has to describe
/// the same source.
pub fn pass_two(program: &[SourceLine], symtab: &SymbolTable) -> Result<ObjectCode> {
    pass_two_with(program, symtab, &Options::default())
}

pub fn pass_two_with(program: &[SourceLine], symtab: &SymbolTable, options: &Options) -> Result<ObjectCode> {
    assemble::generate_obj(program, symtab, options)
}

/// Both passes over one source text.
pub fn assemble(source: &str) -> Result<(PassOne, ObjectCode)> {
    let program = read_source(source);
    let first = pass_one(&program)?;
    let code = pass_two(&program, &first.symtab)?;
    Ok((first, code))
}
