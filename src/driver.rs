// ABOUTME: Driver — composes lexer, parser, and interpreter; seeds the global environment

use crate::builtins::install_core;
use crate::context::Context;
use crate::env::SymbolTable;
use crate::error::LangError;
use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Value;
use std::rc::Rc;

/// Runs `source` end to end against a freshly seeded global `Context`.
/// Equivalent to [`run_in`] with a fresh global context; most callers that
/// only need one-shot evaluation should use this.
pub fn run(filename: impl Into<Rc<str>>, source: impl Into<Rc<str>>) -> (Option<Value>, Option<LangError>) {
    let table = SymbolTable::new();
    let ctx = Context::global(table);
    install_core(&ctx);
    run_in(filename, source, &ctx)
}

/// Runs `source` against a caller-supplied global `Context`, so a host can
/// seed additional (I/O-bound) built-ins before evaluation and reuse the
/// same table across repeated calls (e.g. a REPL).
pub fn run_in(filename: impl Into<Rc<str>>, source: impl Into<Rc<str>>, ctx: &Rc<Context>) -> (Option<Value>, Option<LangError>) {
    let filename = filename.into();
    let source = source.into();

    let tokens = match Lexer::new(filename, source).tokenize() {
        Ok(tokens) => tokens,
        Err(err) => return (None, Some(err)),
    };

    let ast = match Parser::new(tokens).parse() {
        Ok(ast) => ast,
        Err(err) => return (None, Some(err)),
    };

    let interpreter = Interpreter::new();
    match interpreter.visit(&ast, ctx) {
        Ok(flow) => (Some(flow.into_value()), None),
        Err(err) => (None, Some(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_and_arithmetic() {
        let (value, err) = run("<test>", "VAR a = 5 + 2 * 3\na * 2");
        assert!(err.is_none());
        assert!(matches!(value, Some(Value::Number(n)) if n == 22.0));
    }

    #[test]
    fn function_call_arity_mismatch_is_runtime_error() {
        let (_, err) = run("<test>", "FUNC sq(x) -> x ^ 2\nsq(1, 2)");
        assert!(matches!(err, Some(LangError::Runtime(..))));
    }

    #[test]
    fn if_else_chain() {
        let (value, err) = run("<test>", "IF 0 THEN 1 ELIF 0 THEN 2 ELSE 3");
        assert!(err.is_none());
        assert!(matches!(value, Some(Value::Number(n)) if n == 3.0));
    }

    #[test]
    fn closures_capture_lexical_scope() {
        let (value, err) = run("<test>", "FUNC make(x)\nRETURN FUNC() -> x\nEND\nVAR f = make(7)\nf()");
        assert!(err.is_none());
        assert!(matches!(value, Some(Value::Number(n)) if n == 7.0));
    }

    #[test]
    fn illegal_char_is_lex_error() {
        let (_, err) = run("<test>", "1 + @");
        assert!(matches!(err, Some(LangError::IllegalChar(..))));
    }

    #[test]
    fn for_loop_zero_iterations_when_bounds_equal() {
        let (value, err) = run("<test>", "VAR count = 0\nFOR i = 0 TO 0 THEN VAR count = count + 1\ncount");
        assert!(err.is_none());
        assert!(matches!(value, Some(Value::Number(n)) if n == 0.0));
    }

    #[test]
    fn for_loop_negative_step_counts_down() {
        let (value, err) = run(
            "<test>",
            "VAR total = 0\nFOR i = 5 TO 0 STEP -1 THEN VAR total = total + 1\ntotal",
        );
        assert!(err.is_none());
        assert!(matches!(value, Some(Value::Number(n)) if n == 5.0));
    }
}
