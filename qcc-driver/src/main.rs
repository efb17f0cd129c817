//! Quill C Compiler Driver
//!
//! Translates a C source file into three-address IR and prints the
//! resulting control-flow graphs as text or JSON.

use anyhow::{Context, Result};
use clap::Parser;
use qcc_frontend::{CfgPrinter, Frontend};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "qcc", version, about = "C front-end emitting three-address IR")]
struct Args {
    /// Input C source file
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Print the token stream instead of translating
    #[clap(long)]
    dump_tokens: bool,

    /// Emit the control-flow graphs as JSON
    #[clap(long)]
    emit_json: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::init();
    }

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;

    let output = if args.dump_tokens {
        dump_tokens(&source)?
    } else if args.emit_json {
        emit_json(&source)?
    } else {
        dump_ir(&source)?
    };

    match args.output {
        Some(path) => fs::write(path, output)?,
        None => print!("{}", output),
    }
    Ok(())
}

fn dump_tokens(source: &str) -> Result<String> {
    let tokens = Frontend::tokenize(source)?;
    let mut out = String::new();
    for token in tokens {
        writeln!(out, "{}\t{}", token.location, token.kind)?;
    }
    Ok(out)
}

fn dump_ir(source: &str) -> Result<String> {
    let translation = Frontend::translate(source)?;
    let mut out = String::new();
    for cfg in &translation.cfgs {
        let printer = CfgPrinter::new(cfg, &translation.symbols, &translation.types);
        writeln!(out, "{}", printer)?;
    }
    Ok(out)
}

fn emit_json(source: &str) -> Result<String> {
    let translation = Frontend::translate(source)?;
    Ok(serde_json::to_string_pretty(&translation.cfgs)?)
}
