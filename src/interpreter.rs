// ABOUTME: Tree-walking evaluator — visits AST nodes against a Context, producing values or control flow

use crate::ast::Node;
use crate::context::Context;
use crate::env::SymbolTable;
use crate::error::LangError;
use crate::token::{Payload, TokenKind};
use crate::value::{CompareOp, FunctionData, Value};
use std::rc::Rc;

/// The result of visiting one statement: either a plain value, or one of
/// the three signals that must propagate up through enclosing blocks
/// (`RETURN`, `CONTINUE`, `BREAK`) without being swallowed by an
/// intervening loop or function body.
#[derive(Debug, Clone)]
pub enum Flow {
    Value(Value),
    Return(Option<Value>),
    Continue,
    Break,
}

impl Flow {
    pub fn into_value(self) -> Value {
        match self {
            Flow::Value(v) => v,
            _ => unreachable!("signal flow escaped into a value position"),
        }
    }

    fn should_propagate(&self) -> bool {
        !matches!(self, Flow::Value(_))
    }
}

pub type RuntimeResult = Result<Flow, LangError>;

pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Interpreter
    }

    pub fn visit(&self, node: &Rc<Node>, ctx: &Rc<Context>) -> RuntimeResult {
        match node.as_ref() {
            Node::NumberLit { token, .. } => Ok(Flow::Value(Value::Number(match token.payload {
                Payload::Int(n) => n as f64,
                Payload::Float(f) => f,
                _ => unreachable!("NumberLit token must carry Int or Float payload"),
            }))),
            Node::StringLit { token, .. } => {
                let text = match &token.payload {
                    Payload::Text(s) => s.as_str(),
                    _ => unreachable!("StringLit token must carry Text payload"),
                };
                Ok(Flow::Value(Value::Str(Rc::from(text))))
            }
            Node::ListLit { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for el in elements {
                    let flow = self.visit(el, ctx)?;
                    if flow.should_propagate() {
                        return Ok(flow);
                    }
                    values.push(flow.into_value());
                }
                Ok(Flow::Value(Value::list(values)))
            }
            Node::VarAccess { name, start, end } => {
                let ident = name.text().expect("VarAccess token carries Text payload");
                match ctx.symbol_table.get(ident) {
                    Some(value) => Ok(Flow::Value(value)),
                    None => Err(LangError::Runtime(
                        format!("'{ident}' is not defined"),
                        start.clone(),
                        end.clone(),
                        ctx.clone(),
                    )),
                }
            }
            Node::VarAssign { name, value, .. } => {
                let flow = self.visit(value, ctx)?;
                if flow.should_propagate() {
                    return Ok(flow);
                }
                let v = flow.into_value();
                let ident = name.text().expect("VarAssign token carries Text payload");
                ctx.symbol_table.set(ident.to_string(), v.clone());
                Ok(Flow::Value(v))
            }
            Node::BinOp { left, op, right, start, end } => self.visit_bin_op(left, op, right, start, end, ctx),
            Node::UnaryOp { op, operand, start, end } => self.visit_unary_op(op, operand, start, end, ctx),
            Node::If { cases, else_case, .. } => self.visit_if(cases, else_case, ctx),
            Node::For {
                var_name,
                start_expr,
                end_expr,
                step_expr,
                body,
                is_multiline,
                ..
            } => self.visit_for(
                var_name.text().expect("for-loop variable token carries Text payload"),
                start_expr,
                end_expr,
                step_expr.as_ref(),
                body,
                *is_multiline,
                ctx,
            ),
            Node::While {
                condition,
                body,
                is_multiline,
                ..
            } => self.visit_while(condition, body, *is_multiline, ctx),
            Node::FuncDef {
                name,
                arg_names,
                body,
                should_auto_return,
                ..
            } => {
                let func_name = name.as_ref().map(|t| t.text().expect("function name token carries Text payload").to_string());
                let data = Rc::new(FunctionData {
                    name: func_name.clone(),
                    params: arg_names
                        .iter()
                        .map(|t| t.text().expect("param token carries Text payload").to_string())
                        .collect(),
                    body: body.clone(),
                    captured_context: ctx.clone(),
                    should_auto_return: *should_auto_return,
                });
                let value = Value::Function(data);
                if let Some(n) = func_name {
                    ctx.symbol_table.set(n, value.clone());
                }
                Ok(Flow::Value(value))
            }
            Node::Call { callee, args, start, end } => self.visit_call(callee, args, start, end, ctx),
            Node::Return { value, .. } => {
                let result = match value {
                    Some(expr) => {
                        let flow = self.visit(expr, ctx)?;
                        if flow.should_propagate() {
                            return Ok(flow);
                        }
                        Some(flow.into_value())
                    }
                    None => None,
                };
                Ok(Flow::Return(result))
            }
            Node::Continue { .. } => Ok(Flow::Continue),
            Node::Break { .. } => Ok(Flow::Break),
            Node::Statements { statements, .. } => {
                let mut last = Value::Number(0.0);
                for stmt in statements {
                    let flow = self.visit(stmt, ctx)?;
                    if flow.should_propagate() {
                        return Ok(flow);
                    }
                    last = flow.into_value();
                }
                Ok(Flow::Value(last))
            }
        }
    }

    fn visit_bin_op(
        &self,
        left: &Rc<Node>,
        op: &crate::token::Token,
        right: &Rc<Node>,
        start: &crate::position::Position,
        end: &crate::position::Position,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let lflow = self.visit(left, ctx)?;
        if lflow.should_propagate() {
            return Ok(lflow);
        }
        let l = lflow.into_value();
        let rflow = self.visit(right, ctx)?;
        if rflow.should_propagate() {
            return Ok(rflow);
        }
        let r = rflow.into_value();

        let result = if op.kind == TokenKind::Keyword {
            match op.text() {
                Some("AND") => l.anded_by(&r, start, end, ctx)?,
                Some("OR") => l.ored_by(&r, start, end, ctx)?,
                other => unreachable!("unexpected keyword operator {other:?}"),
            }
        } else {
            match op.kind {
                TokenKind::Plus => l.add_to(&r, start, end, ctx)?,
                TokenKind::Minus => l.subtract_by(&r, start, end, ctx)?,
                TokenKind::Mul => l.multiply_by(&r, start, end, ctx)?,
                TokenKind::Div => l.divide_by(&r, false, start, end, ctx)?,
                TokenKind::CleanDiv => l.divide_by(&r, true, start, end, ctx)?,
                TokenKind::Modulo => l.modulo_by(&r, start, end, ctx)?,
                TokenKind::Power => l.power_by(&r, start, end, ctx)?,
                TokenKind::Ee => l.compare(&r, CompareOp::Eq, start, end, ctx)?,
                TokenKind::Ne => l.compare(&r, CompareOp::Ne, start, end, ctx)?,
                TokenKind::Lt => l.compare(&r, CompareOp::Lt, start, end, ctx)?,
                TokenKind::Gt => l.compare(&r, CompareOp::Gt, start, end, ctx)?,
                TokenKind::Lte => l.compare(&r, CompareOp::Lte, start, end, ctx)?,
                TokenKind::Gte => l.compare(&r, CompareOp::Gte, start, end, ctx)?,
                other => unreachable!("unexpected binary operator token {other:?}"),
            }
        };
        Ok(Flow::Value(result))
    }

    fn visit_unary_op(
        &self,
        op: &crate::token::Token,
        operand: &Rc<Node>,
        start: &crate::position::Position,
        end: &crate::position::Position,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let flow = self.visit(operand, ctx)?;
        if flow.should_propagate() {
            return Ok(flow);
        }
        let v = flow.into_value();
        let result = if op.kind == TokenKind::Keyword && op.text() == Some("NOT") {
            v.notted(start, end, ctx)?
        } else if op.kind == TokenKind::Minus {
            v.multiply_by(&Value::Number(-1.0), start, end, ctx)?
        } else {
            v
        };
        Ok(Flow::Value(result))
    }

    fn visit_if(&self, cases: &[crate::ast::IfCase], else_case: &Option<(Rc<Node>, bool)>, ctx: &Rc<Context>) -> RuntimeResult {
        for case in cases {
            let flow = self.visit(&case.condition, ctx)?;
            if flow.should_propagate() {
                return Ok(flow);
            }
            if flow.into_value().is_true() {
                let flow = self.visit(&case.body, ctx)?;
                if flow.should_propagate() {
                    return Ok(flow);
                }
                return Ok(if case.is_multiline {
                    Flow::Value(Value::Number(0.0))
                } else {
                    flow
                });
            }
        }
        if let Some((body, is_multiline)) = else_case {
            let flow = self.visit(body, ctx)?;
            if flow.should_propagate() {
                return Ok(flow);
            }
            return Ok(if *is_multiline { Flow::Value(Value::Number(0.0)) } else { flow });
        }
        Ok(Flow::Value(Value::Number(0.0)))
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_for(
        &self,
        var_name: &str,
        start_expr: &Rc<Node>,
        end_expr: &Rc<Node>,
        step_expr: Option<&Rc<Node>>,
        body: &Rc<Node>,
        is_multiline: bool,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let start_flow = self.visit(start_expr, ctx)?;
        if start_flow.should_propagate() {
            return Ok(start_flow);
        }
        let mut i = match start_flow.into_value() {
            Value::Number(n) => n,
            _ => 0.0,
        };

        let end_flow = self.visit(end_expr, ctx)?;
        if end_flow.should_propagate() {
            return Ok(end_flow);
        }
        let end_value = match end_flow.into_value() {
            Value::Number(n) => n,
            _ => 0.0,
        };

        let step = match step_expr {
            Some(expr) => {
                let flow = self.visit(expr, ctx)?;
                if flow.should_propagate() {
                    return Ok(flow);
                }
                match flow.into_value() {
                    Value::Number(n) => n,
                    _ => 1.0,
                }
            }
            None => 1.0,
        };

        let mut elements = Vec::new();
        while (step >= 0.0 && i < end_value) || (step < 0.0 && i > end_value) {
            ctx.symbol_table.set(var_name.to_string(), Value::Number(i));
            let flow = self.visit(body, ctx)?;
            match flow {
                Flow::Break => break,
                Flow::Continue => {}
                Flow::Return(_) => return Ok(flow),
                Flow::Value(v) => elements.push(v),
            }
            i += step;
        }
        Ok(Flow::Value(if is_multiline { Value::Number(0.0) } else { Value::list(elements) }))
    }

    fn visit_while(&self, condition: &Rc<Node>, body: &Rc<Node>, is_multiline: bool, ctx: &Rc<Context>) -> RuntimeResult {
        let mut elements = Vec::new();
        loop {
            let cond_flow = self.visit(condition, ctx)?;
            if cond_flow.should_propagate() {
                return Ok(cond_flow);
            }
            if !cond_flow.into_value().is_true() {
                break;
            }
            let flow = self.visit(body, ctx)?;
            match flow {
                Flow::Break => break,
                Flow::Continue => {}
                Flow::Return(_) => return Ok(flow),
                Flow::Value(v) => elements.push(v),
            }
        }
        Ok(Flow::Value(if is_multiline { Value::Number(0.0) } else { Value::list(elements) }))
    }

    fn visit_call(
        &self,
        callee: &Rc<Node>,
        args: &[Rc<Node>],
        start: &crate::position::Position,
        end: &crate::position::Position,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let callee_flow = self.visit(callee, ctx)?;
        if callee_flow.should_propagate() {
            return Ok(callee_flow);
        }
        let callee_value = callee_flow.into_value();

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            let flow = self.visit(arg, ctx)?;
            if flow.should_propagate() {
                return Ok(flow);
            }
            arg_values.push(flow.into_value());
        }

        match callee_value {
            Value::Function(func) => {
                if func.params.len() != arg_values.len() {
                    return Err(LangError::Runtime(
                        format!(
                            "{} argument{} passed into '{}'",
                            if arg_values.len() > func.params.len() { "Too many" } else { "Too few" },
                            if func.params.len() == 1 { "" } else { "s" },
                            func.name.as_deref().unwrap_or("<anonymous>")
                        ),
                        start.clone(),
                        end.clone(),
                        ctx.clone(),
                    ));
                }
                let call_table = SymbolTable::with_parent(func.captured_context.symbol_table.clone());
                for (param, value) in func.params.iter().zip(arg_values.into_iter()) {
                    call_table.set(param.clone(), value);
                }
                let call_ctx = Context::new(
                    func.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
                    Some(ctx.clone()),
                    Some(start.clone()),
                    call_table,
                );
                let flow = self.visit(&func.body, &call_ctx)?;
                let result = match flow {
                    Flow::Return(Some(v)) => v,
                    Flow::Return(None) => Value::Number(0.0),
                    Flow::Value(v) if func.should_auto_return => v,
                    Flow::Value(_) => Value::Number(0.0),
                    Flow::Break | Flow::Continue => Value::Number(0.0),
                };
                Ok(Flow::Value(result))
            }
            Value::BuiltIn(spec) => {
                if spec.params.len() != arg_values.len() {
                    return Err(LangError::Runtime(
                        format!(
                            "{} argument{} passed into '{}'",
                            if arg_values.len() > spec.params.len() { "Too many" } else { "Too few" },
                            if spec.params.len() == 1 { "" } else { "s" },
                            spec.name
                        ),
                        start.clone(),
                        end.clone(),
                        ctx.clone(),
                    ));
                }
                let call_table = SymbolTable::with_parent(ctx.symbol_table.clone());
                for (param, value) in spec.params.iter().zip(arg_values.into_iter()) {
                    call_table.set((*param).to_string(), value);
                }
                let call_ctx = Context::new(spec.name.to_string(), Some(ctx.clone()), Some(start.clone()), call_table);
                Ok(Flow::Value((spec.handler)(&call_ctx)?))
            }
            other => Err(LangError::Runtime(
                format!("{} is not callable", other.type_name()),
                start.clone(),
                end.clone(),
                ctx.clone(),
            )),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(src: &str) -> Result<Value, LangError> {
        let tokens = Lexer::new("<test>", src).tokenize()?;
        let ast = Parser::new(tokens).parse()?;
        let table = SymbolTable::new();
        let ctx = Context::global(table);
        let interp = Interpreter::new();
        Ok(interp.visit(&ast, &ctx)?.into_value())
    }

    #[test]
    fn arithmetic_precedence() {
        let v = run("1 + 2 * 3").unwrap();
        assert!(matches!(v, Value::Number(n) if n == 7.0));
    }

    #[test]
    fn variable_assignment_and_access() {
        let v = run("VAR a = 5\nVAR b = a + 1\nb").unwrap();
        assert!(matches!(v, Value::Number(n) if n == 6.0));
    }

    #[test]
    fn if_expression_picks_matching_branch() {
        let v = run("VAR x = 1\nIF x == 1 THEN 10 ELSE 20").unwrap();
        assert!(matches!(v, Value::Number(n) if n == 10.0));
    }

    #[test]
    fn for_loop_accumulates_results() {
        let v = run("VAR total = 0\nFOR i = 0 TO 5 THEN VAR total = total + i\ntotal").unwrap();
        assert!(matches!(v, Value::Number(n) if n == 10.0));
    }

    #[test]
    fn while_loop_with_break() {
        let v = run("VAR i = 0\nWHILE 1 THEN\n  VAR i = i + 1\n  IF i == 3 THEN BREAK\nEND\ni").unwrap();
        assert!(matches!(v, Value::Number(n) if n == 3.0));
    }

    #[test]
    fn function_definition_and_call() {
        let v = run("FUNC add(a, b) -> a + b\nadd(2, 3)").unwrap();
        assert!(matches!(v, Value::Number(n) if n == 5.0));
    }

    #[test]
    fn undefined_variable_is_runtime_error() {
        let err = run("missing").unwrap_err();
        assert!(matches!(err, LangError::Runtime(..)));
    }

    #[test]
    fn arity_mismatch_is_runtime_error() {
        let err = run("FUNC f(a) -> a\nf(1, 2)").unwrap_err();
        assert!(matches!(err, LangError::Runtime(..)));
    }
}
