//! C-minus Compiler - semantic analyzer for C-minus programs
//!
//! Usage: cminusc [OPTIONS] <input>

use anyhow::{bail, Context};
use clap::Parser as ClapParser;
use cminus_compiler::common::DiagnosticReporter;
use cminus_compiler::driver::{AnalyzeConfig, CompileContext, Pipeline};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser, Debug)]
#[command(name = "cminusc")]
#[command(author = "C-Minus Compiler Team")]
#[command(version)]
#[command(about = "Semantic analyzer for the C-minus teaching language", long_about = None)]
struct Args {
    /// Input source file (.cm)
    #[arg(required = true)]
    input: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print symbol, function, global and scope listings
    #[arg(long)]
    trace_analyze: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(&filename, &source);

    if args.verbose {
        eprintln!("Analyzing {}", filename);
    }

    let config = AnalyzeConfig {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        trace_analyze: args.trace_analyze,
        verbose: args.verbose,
    };

    let ctx = CompileContext::new(filename.clone(), file_id, &reporter);
    let program = Pipeline::new().analyze_source(&source, &ctx, &config)?;

    if program.has_errors() {
        bail!(
            "{}: {} semantic error(s)",
            filename,
            program.analysis.errors().len()
        );
    }

    if args.verbose {
        eprintln!("No semantic errors in {}", filename);
    }

    Ok(())
}
