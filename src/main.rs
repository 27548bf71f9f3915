mod host_builtins;
mod repl;

use clap::Parser;
use simplescript::builtins::install_core;
use simplescript::context::Context;
use simplescript::driver;
use simplescript::env::SymbolTable;
use std::path::PathBuf;

/// SimpleScript interpreter: a small dynamically-typed scripting language
#[derive(Parser, Debug)]
#[command(name = "simplescript")]
#[command(version)]
#[command(about = "A small dynamically-typed scripting language")]
struct CliArgs {
    /// Script file to execute (optional — if not provided, starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let table = SymbolTable::new();
    let ctx = Context::global(table);
    install_core(&ctx);
    host_builtins::install(&ctx);

    match args.script {
        Some(path) => run_script(&path, &ctx),
        None => repl::run_repl(&ctx),
    }
}

fn run_script(path: &PathBuf, ctx: &std::rc::Rc<Context>) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path).map_err(|e| format!("Cannot read script file {}: {e}", path.display()))?;
    let filename = path.display().to_string();
    let (_, err) = driver::run_in(filename, source, ctx);
    if let Some(err) = err {
        eprint!("{}", err.report());
        std::process::exit(1);
    }
    Ok(())
}
