// ABOUTME: I/O-bound built-ins (PRINT, INPUT, CLEAR, RUN) registered by the shell, not the core library

use simplescript::context::Context;
use simplescript::driver;
use simplescript::error::LangError;
use simplescript::value::{BuiltinSpec, Value};
use std::io::Write;
use std::rc::Rc;

fn arg(ctx: &Rc<Context>, name: &str) -> Value {
    ctx.symbol_table
        .get(name)
        .unwrap_or_else(|| panic!("built-in parameter '{name}' missing from call context"))
}

fn runtime_error(ctx: &Rc<Context>, message: impl Into<String>) -> LangError {
    let pos = ctx
        .parent_entry_pos
        .clone()
        .expect("built-in call context always has an entry position");
    LangError::Runtime(message.into(), pos.clone(), pos, ctx.clone())
}

fn print_fn(ctx: &Rc<Context>) -> Result<Value, LangError> {
    println!("{}", arg(ctx, "value"));
    Ok(Value::Number(0.0))
}

fn print_ret(ctx: &Rc<Context>) -> Result<Value, LangError> {
    Ok(Value::Str(Rc::from(arg(ctx, "value").to_string())))
}

fn read_line() -> String {
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).unwrap_or(0);
    line.trim_end_matches(['\n', '\r']).to_string()
}

fn input(_ctx: &Rc<Context>) -> Result<Value, LangError> {
    Ok(Value::Str(Rc::from(read_line())))
}

fn input_int(_ctx: &Rc<Context>) -> Result<Value, LangError> {
    loop {
        let line = read_line();
        if let Ok(n) = line.parse::<i64>() {
            return Ok(Value::Number(n as f64));
        }
        println!("Must be an integer. Try again!");
    }
}

fn clear(_ctx: &Rc<Context>) -> Result<Value, LangError> {
    print!("\x1B[2J\x1B[H");
    let _ = std::io::stdout().flush();
    Ok(Value::Number(0.0))
}

fn run_file(ctx: &Rc<Context>) -> Result<Value, LangError> {
    let path = match arg(ctx, "filename") {
        Value::Str(s) => s.to_string(),
        _ => return Err(runtime_error(ctx, "Argument must be a string")),
    };
    let contents = std::fs::read_to_string(&path).map_err(|e| runtime_error(ctx, format!("Failed to load script \"{path}\": {e}")))?;
    let global = ctx.root();
    let (_, err) = driver::run_in(path.clone(), contents, &global);
    if let Some(err) = err {
        return Err(runtime_error(ctx, format!("Failed to finish executing script \"{path}\"\n{}", err.report())));
    }
    Ok(Value::Number(0.0))
}

pub static PRINT: BuiltinSpec = BuiltinSpec { name: "PRINT", params: &["value"], handler: print_fn };
pub static PRINT_RET: BuiltinSpec = BuiltinSpec {
    name: "PRINT_RET",
    params: &["value"],
    handler: print_ret,
};
pub static INPUT: BuiltinSpec = BuiltinSpec { name: "INPUT", params: &[], handler: input };
pub static INPUT_INT: BuiltinSpec = BuiltinSpec { name: "INPUT_INT", params: &[], handler: input_int };
pub static CLEAR: BuiltinSpec = BuiltinSpec { name: "CLEAR", params: &[], handler: clear };
pub static CLS: BuiltinSpec = BuiltinSpec { name: "CLS", params: &[], handler: clear };
pub static RUN: BuiltinSpec = BuiltinSpec { name: "RUN", params: &["filename"], handler: run_file };

/// Installs the I/O-bound built-ins into `ctx`'s symbol table, alongside
/// the pure core set the driver already seeded.
pub fn install(ctx: &Rc<Context>) {
    ctx.symbol_table.set("PRINT", Value::BuiltIn(&PRINT));
    ctx.symbol_table.set("PRINT_RET", Value::BuiltIn(&PRINT_RET));
    ctx.symbol_table.set("INPUT", Value::BuiltIn(&INPUT));
    ctx.symbol_table.set("INPUT_INT", Value::BuiltIn(&INPUT_INT));
    ctx.symbol_table.set("CLEAR", Value::BuiltIn(&CLEAR));
    ctx.symbol_table.set("CLS", Value::BuiltIn(&CLS));
    ctx.symbol_table.set("RUN", Value::BuiltIn(&RUN));
}
