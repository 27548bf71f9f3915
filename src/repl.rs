// ABOUTME: Read-eval-print loop — reserved verbs EXIT/DEBUG, persistent global context, rustyline history

use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use simplescript::context::Context;
use simplescript::driver;
use std::rc::Rc;

const HISTORY_FILE: &str = ".simplescript_history";

pub fn run_repl(ctx: &Rc<Context>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::<(), _>::with_config(config).map_err(|e| format!("Failed to initialize REPL: {e}"))?;
    let _ = rl.load_history(HISTORY_FILE);

    println!("SimpleScript — type EXIT to quit, DEBUG to toggle error tracebacks");
    let mut debug = false;

    loop {
        match rl.readline("simplescript> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match trimmed {
                    "EXIT" => break,
                    "DEBUG" => {
                        debug = !debug;
                        println!("debug mode: {}", if debug { "on" } else { "off" });
                        continue;
                    }
                    _ => {}
                }

                let (value, err) = driver::run_in("<stdin>", line.clone(), ctx);
                if let Some(err) = err {
                    if debug {
                        eprint!("{}", err.report());
                    } else {
                        eprintln!("{}: {}", err.name(), err.details());
                    }
                } else if let Some(value) = value {
                    println!("{value}");
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("readline error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}
