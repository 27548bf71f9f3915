// ABOUTME: Value model — the closed tagged union of runtime values and per-type operator contracts

use crate::ast::Node;
use crate::context::Context;
use crate::error::LangError;
use crate::position::Position;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A user-defined function: captures the `Context` active when the `FUNC`
/// literal was evaluated, so calls close over lexically-visible bindings.
#[derive(Debug)]
pub struct FunctionData {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Node>,
    pub captured_context: Rc<Context>,
    pub should_auto_return: bool,
}

/// A host-registered built-in: dispatched by name through the same `Call`
/// path as a user `Function`. Handler bodies for I/O-bound built-ins live
/// outside this crate; see the `builtins` module.
pub struct BuiltinSpec {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub handler: BuiltinHandler,
}

pub type BuiltinHandler = fn(&Rc<Context>) -> Result<Value, LangError>;

impl fmt::Debug for BuiltinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinSpec({})", self.name)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Function(Rc<FunctionData>),
    BuiltIn(&'static BuiltinSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl Value {
    pub fn list(elements: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Str(_) => "String",
            Value::List(_) => "List",
            Value::Function(_) => "Function",
            Value::BuiltIn(_) => "BuiltInFunction",
        }
    }

    pub fn is_true(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(_) => true,
            Value::Function(_) | Value::BuiltIn(_) => true,
        }
    }

    fn illegal_operation(&self, start: &Position, end: &Position, ctx: &Rc<Context>) -> LangError {
        LangError::Runtime(
            "Illegal operation performed".to_string(),
            start.clone(),
            end.clone(),
            ctx.clone(),
        )
    }

    fn div_by_zero(start: &Position, end: &Position, ctx: &Rc<Context>) -> LangError {
        LangError::Runtime(
            "Division by 0 is not allowed.".to_string(),
            start.clone(),
            end.clone(),
            ctx.clone(),
        )
    }

    fn index_not_found(start: &Position, end: &Position, ctx: &Rc<Context>) -> LangError {
        LangError::Runtime("Index not found".to_string(), start.clone(), end.clone(), ctx.clone())
    }

    pub fn add_to(&self, other: &Value, start: &Position, end: &Position, ctx: &Rc<Context>) -> Result<Value, LangError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(Rc::from(format!("{a}{b}")))),
            (Value::List(a), _) => {
                let mut elems = a.borrow().clone();
                elems.push(other.clone());
                Ok(Value::list(elems))
            }
            _ => Err(self.illegal_operation(start, end, ctx)),
        }
    }

    pub fn subtract_by(&self, other: &Value, start: &Position, end: &Position, ctx: &Rc<Context>) -> Result<Value, LangError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
            (Value::List(a), Value::Number(idx)) => {
                let mut elems = a.borrow().clone();
                let i = *idx as i64;
                if i < 0 || (i as usize) >= elems.len() {
                    return Err(Value::index_not_found(start, end, ctx));
                }
                elems.remove(i as usize);
                Ok(Value::list(elems))
            }
            _ => Err(self.illegal_operation(start, end, ctx)),
        }
    }

    pub fn multiply_by(&self, other: &Value, start: &Position, end: &Position, ctx: &Rc<Context>) -> Result<Value, LangError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
            (Value::Str(s), Value::Number(n)) => {
                if *n < 0.0 {
                    Ok(Value::Str(Rc::from("")))
                } else {
                    Ok(Value::Str(Rc::from(s.repeat(*n as usize))))
                }
            }
            (Value::List(a), Value::List(b)) => {
                let mut elems = a.borrow().clone();
                elems.extend(b.borrow().iter().cloned());
                Ok(Value::list(elems))
            }
            _ => Err(self.illegal_operation(start, end, ctx)),
        }
    }

    /// `clean`: true for `|` (truncating quotient), false for `/`.
    pub fn divide_by(&self, other: &Value, clean: bool, start: &Position, end: &Position, ctx: &Rc<Context>) -> Result<Value, LangError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                if *b == 0.0 {
                    return Err(Value::div_by_zero(start, end, ctx));
                }
                Ok(Value::Number(if clean { (a / b).trunc() } else { a / b }))
            }
            (Value::List(a), Value::Number(idx)) => {
                let elems = a.borrow();
                let i = *idx as i64;
                if i < 0 || (i as usize) >= elems.len() {
                    Err(Value::index_not_found(start, end, ctx))
                } else {
                    Ok(elems[i as usize].clone())
                }
            }
            _ => Err(self.illegal_operation(start, end, ctx)),
        }
    }

    pub fn modulo_by(&self, other: &Value, start: &Position, end: &Position, ctx: &Rc<Context>) -> Result<Value, LangError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                if *b == 0.0 {
                    Err(Value::div_by_zero(start, end, ctx))
                } else {
                    Ok(Value::Number(a % b))
                }
            }
            _ => Err(self.illegal_operation(start, end, ctx)),
        }
    }

    pub fn power_by(&self, other: &Value, start: &Position, end: &Position, ctx: &Rc<Context>) -> Result<Value, LangError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.powf(*b))),
            _ => Err(self.illegal_operation(start, end, ctx)),
        }
    }

    pub fn compare(&self, other: &Value, op: CompareOp, start: &Position, end: &Position, ctx: &Rc<Context>) -> Result<Value, LangError> {
        let truth = match (self, other) {
            (Value::Number(a), Value::Number(b)) => match op {
                CompareOp::Eq => a == b,
                CompareOp::Ne => a != b,
                CompareOp::Lt => a < b,
                CompareOp::Gt => a > b,
                CompareOp::Lte => a <= b,
                CompareOp::Gte => a >= b,
            },
            _ => return Err(self.illegal_operation(start, end, ctx)),
        };
        Ok(Value::Number(if truth { 1.0 } else { 0.0 }))
    }

    pub fn anded_by(&self, other: &Value, start: &Position, end: &Position, ctx: &Rc<Context>) -> Result<Value, LangError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(if *a != 0.0 && *b != 0.0 { 1.0 } else { 0.0 })),
            _ => Err(self.illegal_operation(start, end, ctx)),
        }
    }

    pub fn ored_by(&self, other: &Value, start: &Position, end: &Position, ctx: &Rc<Context>) -> Result<Value, LangError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(if *a != 0.0 || *b != 0.0 { 1.0 } else { 0.0 })),
            _ => Err(self.illegal_operation(start, end, ctx)),
        }
    }

    pub fn notted(&self, start: &Position, end: &Position, ctx: &Rc<Context>) -> Result<Value, LangError> {
        match self {
            Value::Number(n) => Ok(Value::Number(if *n == 0.0 { 1.0 } else { 0.0 })),
            _ => Err(self.illegal_operation(start, end, ctx)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(elems) => {
                write!(f, "[")?;
                for (i, e) in elems.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "]")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name.as_deref().unwrap_or("<anonymous>")),
            Value::BuiltIn(spec) => write!(f, "<built-in function {}>", spec.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SymbolTable;

    fn ctx() -> Rc<Context> {
        Context::global(SymbolTable::new())
    }

    fn p() -> Position {
        Position::new(0, 0, 0, Rc::from("<test>"), Rc::from(""))
    }

    #[test]
    fn number_arithmetic() {
        let c = ctx();
        let a = Value::Number(4.0);
        let b = Value::Number(2.0);
        assert!(matches!(a.add_to(&b, &p(), &p(), &c), Ok(Value::Number(n)) if n == 6.0));
        assert!(matches!(a.subtract_by(&b, &p(), &p(), &c), Ok(Value::Number(n)) if n == 2.0));
        assert!(matches!(a.multiply_by(&b, &p(), &p(), &c), Ok(Value::Number(n)) if n == 8.0));
        assert!(matches!(a.divide_by(&b, false, &p(), &p(), &c), Ok(Value::Number(n)) if n == 2.0));
        assert!(matches!(a.power_by(&b, &p(), &p(), &c), Ok(Value::Number(n)) if n == 16.0));
    }

    #[test]
    fn division_by_zero_is_runtime_error() {
        let c = ctx();
        let a = Value::Number(1.0);
        let zero = Value::Number(0.0);
        assert!(matches!(a.divide_by(&zero, false, &p(), &p(), &c), Err(LangError::Runtime(..))));
        assert!(matches!(a.modulo_by(&zero, &p(), &p(), &c), Err(LangError::Runtime(..))));
    }

    #[test]
    fn clean_div_truncates() {
        let c = ctx();
        let a = Value::Number(7.0);
        let b = Value::Number(2.0);
        assert!(matches!(a.divide_by(&b, true, &p(), &p(), &c), Ok(Value::Number(n)) if n == 3.0));
    }

    #[test]
    fn string_concat_and_repeat() {
        let c = ctx();
        let a = Value::Str(Rc::from("ab"));
        let b = Value::Str(Rc::from("cd"));
        assert!(matches!(a.add_to(&b, &p(), &p(), &c), Ok(Value::Str(s)) if &*s == "abcd"));
        let n = Value::Number(3.0);
        assert!(matches!(a.multiply_by(&n, &p(), &p(), &c), Ok(Value::Str(s)) if &*s == "ababab"));
    }

    #[test]
    fn list_append_index_and_remove() {
        let c = ctx();
        let list = Value::list(vec![Value::Number(1.0), Value::Number(2.0)]);
        let appended = list.add_to(&Value::Number(3.0), &p(), &p(), &c).unwrap();
        if let Value::List(elems) = &appended {
            assert_eq!(elems.borrow().len(), 3);
        } else {
            panic!("expected list");
        }
        let indexed = appended.divide_by(&Value::Number(2.0), false, &p(), &p(), &c).unwrap();
        assert!(matches!(indexed, Value::Number(n) if n == 3.0));
        let removed = appended.subtract_by(&Value::Number(0.0), &p(), &p(), &c).unwrap();
        if let Value::List(elems) = removed {
            assert_eq!(elems.borrow().len(), 2);
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn list_index_out_of_range_errors() {
        let c = ctx();
        let list = Value::list(vec![Value::Number(1.0)]);
        assert!(matches!(
            list.divide_by(&Value::Number(10.0), false, &p(), &p(), &c),
            Err(LangError::Runtime(..))
        ));
    }

    #[test]
    fn truthiness() {
        assert!(Value::Number(1.0).is_true());
        assert!(!Value::Number(0.0).is_true());
        assert!(Value::Str(Rc::from("x")).is_true());
        assert!(!Value::Str(Rc::from("")).is_true());
        assert!(Value::list(vec![]).is_true());
    }

    #[test]
    fn illegal_operation_on_mismatched_types() {
        let c = ctx();
        let n = Value::Number(1.0);
        let list = Value::list(vec![]);
        assert!(matches!(n.subtract_by(&list, &p(), &p(), &c), Err(LangError::Runtime(..))));
    }

    #[test]
    fn comparisons() {
        let c = ctx();
        let a = Value::Number(3.0);
        let b = Value::Number(5.0);
        assert!(matches!(a.compare(&b, CompareOp::Lt, &p(), &p(), &c), Ok(Value::Number(n)) if n == 1.0));
        assert!(matches!(a.compare(&b, CompareOp::Gt, &p(), &p(), &c), Ok(Value::Number(n)) if n == 0.0));
        assert!(matches!(a.compare(&a, CompareOp::Eq, &p(), &p(), &c), Ok(Value::Number(_))));
    }

    #[test]
    fn comparison_is_number_only() {
        let c = ctx();
        let a = Value::Str(Rc::from("a"));
        let b = Value::Str(Rc::from("b"));
        assert!(matches!(a.compare(&b, CompareOp::Eq, &p(), &p(), &c), Err(LangError::Runtime(..))));
        assert!(matches!(a.compare(&b, CompareOp::Ne, &p(), &p(), &c), Err(LangError::Runtime(..))));

        let n = Value::Number(1.0);
        assert!(matches!(n.compare(&a, CompareOp::Eq, &p(), &p(), &c), Err(LangError::Runtime(..))));
    }
}
