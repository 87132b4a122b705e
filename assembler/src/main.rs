use anyhow::{Context, Result};
use clap::Parser;
use color_print::{ceprintln, cformat, cprintln};
use sicasm::objwriter;
use sicasm::{Options, SymbolTable};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Assembly source file
    input: PathBuf,

    /// Run only pass 2, with a symbol table of `NAME: ADDRESS` lines
    #[arg(short, long, conflicts_with = "pass_one")]
    symtab: Option<PathBuf>,

    /// Stop after pass 1
    #[arg(short, long)]
    pass_one: bool,

    /// Write the H/T/E object program here
    #[arg(short, long)]
    object: Option<PathBuf>,

    /// Write the assembly listing here
    #[arg(short, long)]
    listing: Option<PathBuf>,

    /// Accept operands that resolve to address 0000
    #[arg(long)]
    allow_zero_address: bool,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ceprintln!("<red,bold>error</>: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| cformat!("Failed to open file: <underline>{}</>", args.input.display()))?;
    let program = sicasm::read_source(&source);

    // first pass, unless a table was handed to us
    let symtab = match &args.symtab {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| cformat!("Failed to open file: <underline>{}</>", path.display()))?;
            text.parse::<SymbolTable>()
                .with_context(|| format!("Error reading symtab {}", path.display()))?
        }
        None => {
            let first = sicasm::pass_one(&program).context("Error generating symtab")?;
            cprintln!("<bold>Symbol Table:</>");
            print!("{}", first.symtab);
            cprintln!("<bold>Program Length:</> {:X}", first.length);
            for entry in &first.trace {
                println!("{}", entry);
            }
            first.symtab
        }
    };

    if args.pass_one {
        return Ok(());
    }

    let options = Options {
        zero_address_is_unresolved: !args.allow_zero_address,
    };
    let code = sicasm::pass_two_with(&program, &symtab, &options).context("Error assembling")?;

    cprintln!("<bold>Object Code:</>");
    for record in &code.records {
        println!("{}", record);
    }

    if let Some(path) = &args.object {
        fs::write(path, objwriter::object_program(&code))
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
    }
    if let Some(path) = &args.listing {
        fs::write(path, objwriter::listing(&code))
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
    }

    Ok(())
}
