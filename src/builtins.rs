// ABOUTME: Core built-in registry — pure, host-independent built-ins plus the global seed values
//
// Built-ins that perform I/O (PRINT, INPUT, CLEAR, RUN, ...) have no bodies
// here: the core only defines the registration protocol (`BuiltinSpec`) and
// dispatches through it the same way it dispatches a user `Function`. Hosts
// supply those handlers and register them into the same global table the
// driver seeds with this module's pure set.

use crate::context::Context;
use crate::error::LangError;
use crate::value::{BuiltinSpec, Value};
use std::rc::Rc;

fn arg(ctx: &Rc<Context>, name: &str) -> Value {
    ctx.symbol_table
        .get(name)
        .unwrap_or_else(|| panic!("built-in parameter '{name}' missing from call context"))
}

fn type_check_error(ctx: &Rc<Context>, message: &str) -> LangError {
    let pos = ctx
        .parent_entry_pos
        .clone()
        .expect("built-in call context always has an entry position");
    LangError::Runtime(message.to_string(), pos.clone(), pos, ctx.clone())
}

fn is_num(ctx: &Rc<Context>) -> Result<Value, LangError> {
    Ok(Value::Number(if matches!(arg(ctx, "value"), Value::Number(_)) { 1.0 } else { 0.0 }))
}

fn is_str(ctx: &Rc<Context>) -> Result<Value, LangError> {
    Ok(Value::Number(if matches!(arg(ctx, "value"), Value::Str(_)) { 1.0 } else { 0.0 }))
}

fn is_list(ctx: &Rc<Context>) -> Result<Value, LangError> {
    Ok(Value::Number(if matches!(arg(ctx, "value"), Value::List(_)) { 1.0 } else { 0.0 }))
}

fn is_func(ctx: &Rc<Context>) -> Result<Value, LangError> {
    Ok(Value::Number(
        if matches!(arg(ctx, "value"), Value::Function(_) | Value::BuiltIn(_)) {
            1.0
        } else {
            0.0
        },
    ))
}

fn append(ctx: &Rc<Context>) -> Result<Value, LangError> {
    match arg(ctx, "list") {
        Value::List(list) => {
            list.borrow_mut().push(arg(ctx, "value"));
            Ok(Value::Number(0.0))
        }
        _ => Err(type_check_error(ctx, "First argument must be list")),
    }
}

fn pop(ctx: &Rc<Context>) -> Result<Value, LangError> {
    match arg(ctx, "list") {
        Value::List(list) => match arg(ctx, "index") {
            Value::Number(n) => {
                let idx = n as i64;
                let mut elements = list.borrow_mut();
                if idx < 0 || (idx as usize) >= elements.len() {
                    Err(type_check_error(ctx, "Index out of bounds"))
                } else {
                    Ok(elements.remove(idx as usize))
                }
            }
            _ => Err(type_check_error(ctx, "Second argument must be number")),
        },
        _ => Err(type_check_error(ctx, "First argument must be list")),
    }
}

fn extend(ctx: &Rc<Context>) -> Result<Value, LangError> {
    match (arg(ctx, "list_a"), arg(ctx, "list_b")) {
        (Value::List(a), Value::List(b)) => {
            a.borrow_mut().extend(b.borrow().iter().cloned());
            Ok(Value::Number(0.0))
        }
        (Value::List(_), _) => Err(type_check_error(ctx, "Second argument must be list")),
        _ => Err(type_check_error(ctx, "First argument must be list")),
    }
}

fn len(ctx: &Rc<Context>) -> Result<Value, LangError> {
    match arg(ctx, "list") {
        Value::List(list) => Ok(Value::Number(list.borrow().len() as f64)),
        _ => Err(type_check_error(ctx, "Argument must be list")),
    }
}

pub static IS_NUM: BuiltinSpec = BuiltinSpec { name: "IS_NUM", params: &["value"], handler: is_num };
pub static IS_STR: BuiltinSpec = BuiltinSpec { name: "IS_STR", params: &["value"], handler: is_str };
pub static IS_LIST: BuiltinSpec = BuiltinSpec { name: "IS_LIST", params: &["value"], handler: is_list };
pub static IS_FUNC: BuiltinSpec = BuiltinSpec { name: "IS_FUNC", params: &["value"], handler: is_func };
pub static APPEND: BuiltinSpec = BuiltinSpec { name: "APPEND", params: &["list", "value"], handler: append };
pub static POP: BuiltinSpec = BuiltinSpec { name: "POP", params: &["list", "index"], handler: pop };
pub static EXTEND: BuiltinSpec = BuiltinSpec {
    name: "EXTEND",
    params: &["list_a", "list_b"],
    handler: extend,
};
pub static LEN: BuiltinSpec = BuiltinSpec { name: "LEN", params: &["list"], handler: len };

/// Installs the constants and pure built-ins that are always present,
/// regardless of host. I/O-bound built-ins (PRINT, INPUT, CLEAR, RUN, ...)
/// are registered separately by the host binary.
pub fn install_core(ctx: &Rc<Context>) {
    ctx.symbol_table.set("NULL", Value::Number(0.0));
    ctx.symbol_table.set("TRUE", Value::Number(1.0));
    ctx.symbol_table.set("FALSE", Value::Number(0.0));
    ctx.symbol_table.set("MATH_PI", Value::Number(std::f64::consts::PI));

    ctx.symbol_table.set("IS_NUM", Value::BuiltIn(&IS_NUM));
    ctx.symbol_table.set("IS_STR", Value::BuiltIn(&IS_STR));
    ctx.symbol_table.set("IS_LIST", Value::BuiltIn(&IS_LIST));
    ctx.symbol_table.set("IS_FUNC", Value::BuiltIn(&IS_FUNC));
    ctx.symbol_table.set("APPEND", Value::BuiltIn(&APPEND));
    ctx.symbol_table.set("POP", Value::BuiltIn(&POP));
    ctx.symbol_table.set("EXTEND", Value::BuiltIn(&EXTEND));
    ctx.symbol_table.set("LEN", Value::BuiltIn(&LEN));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::run;

    #[test]
    fn is_num_distinguishes_types() {
        let (value, err) = run("<test>", "IS_NUM(1)");
        assert!(err.is_none());
        assert!(matches!(value, Some(Value::Number(n)) if n == 1.0));

        let (value, err) = run("<test>", "IS_NUM(\"a\")");
        assert!(err.is_none());
        assert!(matches!(value, Some(Value::Number(n)) if n == 0.0));
    }

    #[test]
    fn append_mutates_list_in_place() {
        let (value, err) = run("<test>", "VAR l = [1, 2]\nAPPEND(l, 3)\nLEN(l)");
        assert!(err.is_none());
        assert!(matches!(value, Some(Value::Number(n)) if n == 3.0));
    }

    #[test]
    fn pop_out_of_range_is_runtime_error() {
        let (_, err) = run("<test>", "VAR l = [1]\nPOP(l, 10)");
        assert!(matches!(err, Some(LangError::Runtime(..))));
    }

    #[test]
    fn append_on_non_list_errors() {
        let (_, err) = run("<test>", "APPEND(1, 2)");
        assert!(matches!(err, Some(LangError::Runtime(..))));
    }

    #[test]
    fn math_pi_is_seeded() {
        let (value, err) = run("<test>", "MATH_PI");
        assert!(err.is_none());
        assert!(matches!(value, Some(Value::Number(n)) if (n - std::f64::consts::PI).abs() < 1e-12));
    }
}
