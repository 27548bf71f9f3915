// ABOUTME: Recursive-descent parser — tokens to AST with a precedence-stratified grammar
//
// program      ::= statements EOF
// statements   ::= NEWLINE* statement (NEWLINE+ statement)* NEWLINE*
// statement    ::= 'RETURN' expr? | 'CONTINUE' | 'BREAK' | expr
// expr         ::= 'VAR' IDENT '=' expr | comparison (('AND'|'OR') comparison)*
// comparison   ::= 'NOT' comparison | arithmetic ((EE|NE|LT|GT|LTE|GTE) arithmetic)*
// arithmetic   ::= term ((PLUS|MINUS) term)*
// term         ::= factor ((MUL|DIV|CLEAN_DIV|MODULO|POWER) factor)*
// factor       ::= (PLUS|MINUS) factor | power
// power        ::= call (POWER factor)*
// call         ::= atom ('(' (expr (',' expr)*)? ')')?
// atom         ::= INT|FLOAT|STRING|IDENT | '(' expr ')' | list-expr | if-expr | for-expr | while-expr | func-def

use crate::ast::{IfCase, Node};
use crate::error::LangError;
use crate::token::{Token, TokenKind};
use std::rc::Rc;

pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

type ParseResult = Result<Rc<Node>, LangError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, cursor: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.cursor < self.tokens.len() - 1 {
            self.cursor += 1;
        }
        tok
    }

    fn is_keyword(&self, text: &str) -> bool {
        self.current().matches(TokenKind::Keyword, text)
    }

    fn expect_keyword(&mut self, text: &str) -> Result<Token, LangError> {
        if self.is_keyword(text) {
            Ok(self.advance())
        } else {
            Err(self.syntax_error(format!("Expected '{text}'")))
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, LangError> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.syntax_error(format!("Expected {what}")))
        }
    }

    fn syntax_error(&self, msg: String) -> LangError {
        LangError::InvalidSyntax(msg, self.current().start.clone(), self.current().end.clone())
    }

    fn skip_newlines(&mut self) {
        while self.current().kind == TokenKind::Newline {
            self.advance();
        }
    }

    pub fn parse(mut self) -> ParseResult {
        let statements = self.statements()?;
        if self.current().kind != TokenKind::Eof {
            return Err(self.syntax_error(
                "Expected '+', '-', '*', '/' or an operator, found unexpected trailing input".to_string(),
            ));
        }
        Ok(statements)
    }

    fn statements(&mut self) -> ParseResult {
        let start = self.current().start.clone();
        let mut statements = Vec::new();
        self.skip_newlines();
        if !self.statement_follows() {
            let end = self.current().end.clone();
            return Ok(Rc::new(Node::Statements { statements, start, end }));
        }
        statements.push(self.statement()?);

        loop {
            let mut newline_count = 0;
            while self.current().kind == TokenKind::Newline {
                self.advance();
                newline_count += 1;
            }
            if newline_count == 0 || !self.statement_follows() {
                break;
            }
            statements.push(self.statement()?);
        }
        self.skip_newlines();
        let end = statements.last().map(|s: &Rc<Node>| s.end().clone()).unwrap_or_else(|| start.clone());
        Ok(Rc::new(Node::Statements { statements, start, end }))
    }

    /// Whether the current token could start a `statement`. Used to decide
    /// when `statements` has run out of input (EOF, a closing keyword, etc).
    fn statement_follows(&self) -> bool {
        !matches!(self.current().kind, TokenKind::Eof)
            && !self.is_keyword("END")
            && !self.is_keyword("ELSE")
            && !self.is_keyword("ELIF")
    }

    fn statement(&mut self) -> ParseResult {
        let start = self.current().start.clone();
        if self.is_keyword("RETURN") {
            self.advance();
            let value = if self.expr_follows() { Some(self.expr()?) } else { None };
            let end = value.as_ref().map(|v| v.end().clone()).unwrap_or_else(|| start.clone());
            return Ok(Rc::new(Node::Return { value, start, end }));
        }
        if self.is_keyword("CONTINUE") {
            let end = self.current().end.clone();
            self.advance();
            return Ok(Rc::new(Node::Continue { start, end }));
        }
        if self.is_keyword("BREAK") {
            let end = self.current().end.clone();
            self.advance();
            return Ok(Rc::new(Node::Break { start, end }));
        }
        self.expr()
    }

    fn expr_follows(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Identifier
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::LParen
                | TokenKind::LSquare
        ) || self.is_keyword("VAR")
            || self.is_keyword("NOT")
            || self.is_keyword("IF")
            || self.is_keyword("FOR")
            || self.is_keyword("WHILE")
            || self.is_keyword("FUNC")
    }

    fn expr(&mut self) -> ParseResult {
        if self.is_keyword("VAR") {
            let start = self.current().start.clone();
            self.advance();
            let name = self.expect(TokenKind::Identifier, "an identifier")?;
            self.expect(TokenKind::Eq, "'='")?;
            let value = self.expr()?;
            let end = value.end().clone();
            return Ok(Rc::new(Node::VarAssign { name, value, start, end }));
        }

        let mut left = self.comparison()?;
        while self.is_keyword("AND") || self.is_keyword("OR") {
            let op = self.advance();
            let right = self.comparison()?;
            let start = left.start().clone();
            let end = right.end().clone();
            left = Rc::new(Node::BinOp { left, op, right, start, end });
        }
        Ok(left)
    }

    fn comparison(&mut self) -> ParseResult {
        if self.is_keyword("NOT") {
            let op = self.advance();
            let operand = self.comparison()?;
            let start = op.start.clone();
            let end = operand.end().clone();
            return Ok(Rc::new(Node::UnaryOp { op, operand, start, end }));
        }
        let mut left = self.arithmetic()?;
        while matches!(
            self.current().kind,
            TokenKind::Ee | TokenKind::Ne | TokenKind::Lt | TokenKind::Gt | TokenKind::Lte | TokenKind::Gte
        ) {
            let op = self.advance();
            let right = self.arithmetic()?;
            let start = left.start().clone();
            let end = right.end().clone();
            left = Rc::new(Node::BinOp { left, op, right, start, end });
        }
        Ok(left)
    }

    fn arithmetic(&mut self) -> ParseResult {
        let mut left = self.term()?;
        while matches!(self.current().kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.advance();
            let right = self.term()?;
            let start = left.start().clone();
            let end = right.end().clone();
            left = Rc::new(Node::BinOp { left, op, right, start, end });
        }
        Ok(left)
    }

    fn term(&mut self) -> ParseResult {
        let mut left = self.factor()?;
        while matches!(
            self.current().kind,
            TokenKind::Mul | TokenKind::Div | TokenKind::CleanDiv | TokenKind::Modulo
        ) {
            let op = self.advance();
            let right = self.factor()?;
            let start = left.start().clone();
            let end = right.end().clone();
            left = Rc::new(Node::BinOp { left, op, right, start, end });
        }
        Ok(left)
    }

    fn factor(&mut self) -> ParseResult {
        if matches!(self.current().kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.advance();
            let operand = self.factor()?;
            let start = op.start.clone();
            let end = operand.end().clone();
            return Ok(Rc::new(Node::UnaryOp { op, operand, start, end }));
        }
        self.power()
    }

    fn power(&mut self) -> ParseResult {
        let mut left = self.call()?;
        while self.current().kind == TokenKind::Power {
            let op = self.advance();
            let right = self.factor()?;
            let start = left.start().clone();
            let end = right.end().clone();
            left = Rc::new(Node::BinOp { left, op, right, start, end });
        }
        Ok(left)
    }

    fn call(&mut self) -> ParseResult {
        let atom = self.atom()?;
        if self.current().kind != TokenKind::LParen {
            return Ok(atom);
        }
        self.advance();
        let mut args = Vec::new();
        if self.current().kind != TokenKind::RParen {
            args.push(self.expr()?);
            while self.current().kind == TokenKind::Comma {
                self.advance();
                args.push(self.expr()?);
            }
        }
        let end_tok = self.expect(TokenKind::RParen, "')'")?;
        let start = atom.start().clone();
        Ok(Rc::new(Node::Call {
            callee: atom,
            args,
            start,
            end: end_tok.end,
        }))
    }

    fn atom(&mut self) -> ParseResult {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Int | TokenKind::Float => {
                self.advance();
                Ok(Rc::new(Node::NumberLit {
                    start: tok.start.clone(),
                    end: tok.end.clone(),
                    token: tok,
                }))
            }
            TokenKind::String => {
                self.advance();
                Ok(Rc::new(Node::StringLit {
                    start: tok.start.clone(),
                    end: tok.end.clone(),
                    token: tok,
                }))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Rc::new(Node::VarAccess {
                    start: tok.start.clone(),
                    end: tok.end.clone(),
                    name: tok,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LSquare => self.list_expr(),
            TokenKind::Keyword if tok.text() == Some("IF") => self.if_expr(),
            TokenKind::Keyword if tok.text() == Some("FOR") => self.for_expr(),
            TokenKind::Keyword if tok.text() == Some("WHILE") => self.while_expr(),
            TokenKind::Keyword if tok.text() == Some("FUNC") => self.func_def(),
            _ => Err(self.syntax_error(
                "Expected int, float, identifier, '+', '-', '(', '[', IF, FOR, WHILE, FUNC".to_string(),
            )),
        }
    }

    fn list_expr(&mut self) -> ParseResult {
        let start_tok = self.expect(TokenKind::LSquare, "'['")?;
        let mut elements = Vec::new();
        if self.current().kind != TokenKind::RSquare {
            elements.push(self.expr()?);
            while self.current().kind == TokenKind::Comma {
                self.advance();
                elements.push(self.expr()?);
            }
        }
        let end_tok = self.expect(TokenKind::RSquare, "']'")?;
        Ok(Rc::new(Node::ListLit {
            elements,
            start: start_tok.start,
            end: end_tok.end,
        }))
    }

    /// Parses `'THEN' (NEWLINE statements 'END' | statement)`, returning the
    /// body node and whether it took the multiline (block) form.
    fn then_body(&mut self, opening_keyword: &str) -> Result<(Rc<Node>, bool), LangError> {
        self.expect_keyword(opening_keyword)?;
        self.multiline_or_inline_body("END")
    }

    fn multiline_or_inline_body(&mut self, closing_keyword: &str) -> Result<(Rc<Node>, bool), LangError> {
        if self.current().kind == TokenKind::Newline {
            self.advance();
            let statements = self.statements()?;
            self.expect_keyword(closing_keyword)?;
            Ok((statements, true))
        } else {
            Ok((self.statement()?, false))
        }
    }

    fn if_expr(&mut self) -> ParseResult {
        let start = self.current().start.clone();
        self.expect_keyword("IF")?;
        let mut cases = Vec::new();
        let mut else_case = None;

        loop {
            let condition = self.expr()?;
            let (body, is_multiline) = self.then_body_after_condition()?;
            cases.push(IfCase { condition, body, is_multiline });
            if self.is_keyword("ELIF") {
                self.advance();
                continue;
            }
            break;
        }

        if self.is_keyword("ELSE") {
            self.advance();
            let (body, is_multiline) = self.multiline_or_inline_body("END")?;
            else_case = Some((body, is_multiline));
        }

        let end = else_case
            .as_ref()
            .map(|(b, _)| b.end().clone())
            .unwrap_or_else(|| cases.last().unwrap().body.end().clone());
        Ok(Rc::new(Node::If { cases, else_case, start, end }))
    }

    /// Like `then_body`, but consumes `THEN` without re-checking for `END`
    /// immediately after, since an `ELIF`/`ELSE` may legally follow an
    /// inline arm instead of `END`.
    fn then_body_after_condition(&mut self) -> Result<(Rc<Node>, bool), LangError> {
        self.expect_keyword("THEN")?;
        if self.current().kind == TokenKind::Newline {
            self.advance();
            let statements = self.statements()?;
            if self.is_keyword("END") {
                self.advance();
            }
            Ok((statements, true))
        } else {
            Ok((self.statement()?, false))
        }
    }

    fn for_expr(&mut self) -> ParseResult {
        let start = self.current().start.clone();
        self.expect_keyword("FOR")?;
        let var_name = self.expect(TokenKind::Identifier, "an identifier")?;
        self.expect(TokenKind::Eq, "'='")?;
        let start_expr = self.expr()?;
        self.expect_keyword("TO")?;
        let end_expr = self.expr()?;
        let step_expr = if self.is_keyword("STEP") {
            self.advance();
            Some(self.expr()?)
        } else {
            None
        };
        let (body, is_multiline) = self.then_body("THEN")?;
        let end = body.end().clone();
        Ok(Rc::new(Node::For {
            var_name,
            start_expr,
            end_expr,
            step_expr,
            body,
            is_multiline,
            start,
            end,
        }))
    }

    fn while_expr(&mut self) -> ParseResult {
        let start = self.current().start.clone();
        self.expect_keyword("WHILE")?;
        let condition = self.expr()?;
        let (body, is_multiline) = self.then_body("THEN")?;
        let end = body.end().clone();
        Ok(Rc::new(Node::While { condition, body, is_multiline, start, end }))
    }

    fn func_def(&mut self) -> ParseResult {
        let start = self.current().start.clone();
        self.expect_keyword("FUNC")?;
        let name = if self.current().kind == TokenKind::Identifier {
            Some(self.advance())
        } else {
            None
        };
        self.expect(TokenKind::LParen, "'('")?;
        let mut arg_names = Vec::new();
        if self.current().kind == TokenKind::Identifier {
            arg_names.push(self.advance());
            while self.current().kind == TokenKind::Comma {
                self.advance();
                arg_names.push(self.expect(TokenKind::Identifier, "an identifier")?);
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        if self.current().kind == TokenKind::Arrow {
            self.advance();
            let body = self.expr()?;
            let end = body.end().clone();
            return Ok(Rc::new(Node::FuncDef {
                name,
                arg_names,
                body,
                should_auto_return: true,
                start,
                end,
            }));
        }

        self.expect(TokenKind::Newline, "'->' or a newline")?;
        let body = self.statements()?;
        let end_tok = self.expect_keyword("END")?;
        Ok(Rc::new(Node::FuncDef {
            name,
            arg_names,
            body,
            should_auto_return: false,
            start,
            end: end_tok.end,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> ParseResult {
        let tokens = Lexer::new("<test>", src).tokenize().expect("lex should succeed");
        Parser::new(tokens).parse()
    }

    fn single_statement(src: &str) -> Rc<Node> {
        match &*parse(src).expect("parse should succeed") {
            Node::Statements { statements, .. } => statements[0].clone(),
            other => panic!("expected Statements, got {other:?}"),
        }
    }

    #[test]
    fn arithmetic_respects_precedence() {
        let node = single_statement("1 + 2 * 3");
        match &*node {
            Node::BinOp { op, right, .. } => {
                assert_eq!(op.kind, TokenKind::Plus);
                assert!(matches!(&**right, Node::BinOp { op, .. } if op.kind == TokenKind::Mul));
            }
            other => panic!("expected BinOp, got {other:?}"),
        }
    }

    #[test]
    fn power_is_right_associative() {
        let node = single_statement("2 ^ 3 ^ 2");
        match &*node {
            Node::BinOp { left, right, .. } => {
                assert!(matches!(&**left, Node::NumberLit { .. }));
                assert!(matches!(&**right, Node::BinOp { .. }));
            }
            other => panic!("expected BinOp, got {other:?}"),
        }
    }

    #[test]
    fn var_assignment_parses() {
        let node = single_statement("VAR x = 5");
        assert!(matches!(&*node, Node::VarAssign { .. }));
    }

    #[test]
    fn call_with_arguments_parses() {
        let node = single_statement("f(1, 2, 3)");
        match &*node {
            Node::Call { args, .. } => assert_eq!(args.len(), 3),
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn list_literal_parses() {
        let node = single_statement("[1, 2, 3]");
        match &*node {
            Node::ListLit { elements, .. } => assert_eq!(elements.len(), 3),
            other => panic!("expected ListLit, got {other:?}"),
        }
    }

    #[test]
    fn inline_if_is_not_multiline() {
        let node = single_statement("IF 1 THEN 2 ELSE 3");
        match &*node {
            Node::If { cases, else_case, .. } => {
                assert!(!cases[0].is_multiline);
                assert!(!else_case.as_ref().unwrap().1);
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn multiline_if_consumes_end() {
        let ast = parse("IF 1 THEN\n  2\nEND").expect("parse should succeed");
        match &*ast {
            Node::Statements { statements, .. } => {
                assert_eq!(statements.len(), 1);
                match &*statements[0] {
                    Node::If { cases, .. } => assert!(cases[0].is_multiline),
                    other => panic!("expected If, got {other:?}"),
                }
            }
            other => panic!("expected Statements, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_parses_with_step() {
        let node = single_statement("FOR i = 0 TO 10 STEP 2 THEN i");
        assert!(matches!(&*node, Node::For { step_expr: Some(_), .. }));
    }

    #[test]
    fn func_def_inline_auto_returns() {
        let node = single_statement("FUNC sq(x) -> x ^ 2");
        match &*node {
            Node::FuncDef { should_auto_return, arg_names, .. } => {
                assert!(*should_auto_return);
                assert_eq!(arg_names.len(), 1);
            }
            other => panic!("expected FuncDef, got {other:?}"),
        }
    }

    #[test]
    fn multiple_statements_on_separate_lines() {
        let ast = parse("VAR a = 1\nVAR b = 2").expect("parse should succeed");
        match &*ast {
            Node::Statements { statements, .. } => assert_eq!(statements.len(), 2),
            other => panic!("expected Statements, got {other:?}"),
        }
    }

    #[test]
    fn trailing_garbage_is_invalid_syntax() {
        let err = parse("1 2").unwrap_err();
        assert!(matches!(err, LangError::InvalidSyntax(..)));
    }

    #[test]
    fn unclosed_paren_is_invalid_syntax() {
        let err = parse("(1 + 2").unwrap_err();
        assert!(matches!(err, LangError::InvalidSyntax(..)));
    }
}
