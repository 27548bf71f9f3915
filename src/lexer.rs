// ABOUTME: Single-character-lookahead lexer turning a source buffer into a token stream

use crate::error::LangError;
use crate::position::Position;
use crate::token::{is_keyword, Payload, Token, TokenKind};
use std::rc::Rc;

const DIGITS: &str = "0123456789";

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_digit(c: char) -> bool {
    DIGITS.contains(c)
}

pub struct Lexer {
    chars: Vec<char>,
    position: Position,
    current: Option<char>,
}

impl Lexer {
    pub fn new(filename: impl Into<Rc<str>>, source: impl Into<Rc<str>>) -> Self {
        let filename: Rc<str> = filename.into();
        let source: Rc<str> = source.into();
        let chars: Vec<char> = source.chars().collect();
        let mut position = Position::new(-1, 0, -1, filename, source);
        position.advance(None);
        let mut lexer = Lexer {
            chars,
            position,
            current: None,
        };
        lexer.current = lexer.chars.first().copied();
        lexer
    }

    fn peek_next(&self) -> Option<char> {
        let idx = self.position.idx + 1;
        if idx >= 0 && (idx as usize) < self.chars.len() {
            Some(self.chars[idx as usize])
        } else {
            None
        }
    }

    fn advance(&mut self) {
        self.position.advance(self.current);
        let idx = self.position.idx;
        self.current = if idx >= 0 && (idx as usize) < self.chars.len() {
            Some(self.chars[idx as usize])
        } else {
            None
        };
    }

    /// Tokenizes the whole buffer, returning the token stream ending in EOF,
    /// or the first lexical error encountered.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LangError> {
        let mut tokens = Vec::new();
        while let Some(ch) = self.current {
            if ch == ' ' || ch == '\t' {
                self.advance();
            } else if ch == '\r' && self.peek_next() == Some('\n') {
                // fold "\r\n" into the single NEWLINE the following '\n' emits
                self.advance();
            } else if ch == ';' || ch == '\n' {
                tokens.push(Token::at(TokenKind::Newline, self.position.clone()));
                self.advance();
            } else if is_digit(ch) {
                tokens.push(self.make_number());
            } else if is_letter(ch) {
                tokens.push(self.make_identifier());
            } else if ch == '"' {
                tokens.push(self.make_string()?);
            } else if ch == '+' {
                tokens.push(Token::at(TokenKind::Plus, self.position.clone()));
                self.advance();
            } else if ch == '-' {
                tokens.push(self.make_minus_or_arrow());
            } else if ch == '*' {
                tokens.push(Token::at(TokenKind::Mul, self.position.clone()));
                self.advance();
            } else if ch == '^' {
                tokens.push(Token::at(TokenKind::Power, self.position.clone()));
                self.advance();
            } else if ch == '/' {
                tokens.push(Token::at(TokenKind::Div, self.position.clone()));
                self.advance();
            } else if ch == '|' {
                tokens.push(Token::at(TokenKind::CleanDiv, self.position.clone()));
                self.advance();
            } else if ch == '%' {
                tokens.push(Token::at(TokenKind::Modulo, self.position.clone()));
                self.advance();
            } else if ch == '(' {
                tokens.push(Token::at(TokenKind::LParen, self.position.clone()));
                self.advance();
            } else if ch == ')' {
                tokens.push(Token::at(TokenKind::RParen, self.position.clone()));
                self.advance();
            } else if ch == '[' {
                tokens.push(Token::at(TokenKind::LSquare, self.position.clone()));
                self.advance();
            } else if ch == ']' {
                tokens.push(Token::at(TokenKind::RSquare, self.position.clone()));
                self.advance();
            } else if ch == '!' {
                tokens.push(self.make_not_equals()?);
            } else if ch == '=' {
                tokens.push(self.make_dual(TokenKind::Eq, TokenKind::Ee));
            } else if ch == '<' {
                tokens.push(self.make_dual(TokenKind::Lt, TokenKind::Lte));
            } else if ch == '>' {
                tokens.push(self.make_dual(TokenKind::Gt, TokenKind::Gte));
            } else if ch == ',' {
                tokens.push(Token::at(TokenKind::Comma, self.position.clone()));
                self.advance();
            } else {
                let start = self.position.clone();
                let illegal = ch;
                self.advance();
                return Err(LangError::IllegalChar(
                    format!("\"{}\"", illegal),
                    start,
                    self.position.clone(),
                ));
            }
        }
        tokens.push(Token::at(TokenKind::Eof, self.position.clone()));
        Ok(tokens)
    }

    fn make_number(&mut self) -> Token {
        let mut number_str = String::new();
        let mut dot_count = 0;
        let start = self.position.clone();
        while let Some(ch) = self.current {
            if ch == '.' {
                if dot_count == 1 {
                    break;
                }
                dot_count += 1;
            } else if !is_digit(ch) {
                break;
            }
            number_str.push(ch);
            self.advance();
        }
        let end = self.position.clone();
        if dot_count == 0 {
            match number_str.parse::<i64>() {
                Ok(value) => Token::new(TokenKind::Int, Payload::Int(value), start, end),
                // wider than i64 (e.g. "99999999999999999999"): fall back to the
                // same f64 representation Value::Number uses everywhere else
                Err(_) => {
                    let value: f64 = number_str.parse().expect("digit-only string parses as f64");
                    Token::new(TokenKind::Float, Payload::Float(value), start, end)
                }
            }
        } else {
            let value: f64 = number_str.parse().expect("validated float text parses");
            Token::new(TokenKind::Float, Payload::Float(value), start, end)
        }
    }

    fn make_minus_or_arrow(&mut self) -> Token {
        let start = self.position.clone();
        self.advance();
        if self.current == Some('>') {
            self.advance();
            Token::new(TokenKind::Arrow, Payload::None, start, self.position.clone())
        } else {
            Token::new(TokenKind::Minus, Payload::None, start, self.position.clone())
        }
    }

    fn make_identifier(&mut self) -> Token {
        let mut text = String::new();
        let start = self.position.clone();
        while let Some(ch) = self.current {
            if is_letter(ch) || is_digit(ch) || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        let end = self.position.clone();
        let kind = if is_keyword(&text) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, Payload::Text(text), start, end)
    }

    fn make_not_equals(&mut self) -> Result<Token, LangError> {
        let start = self.position.clone();
        self.advance();
        if self.current == Some('=') {
            self.advance();
            Ok(Token::new(TokenKind::Ne, Payload::None, start, self.position.clone()))
        } else {
            self.advance();
            Err(LangError::ExpectedChar(
                "Expected '=' after '!'".to_string(),
                start,
                self.position.clone(),
            ))
        }
    }

    fn make_dual(&mut self, plain: TokenKind, with_eq: TokenKind) -> Token {
        let start = self.position.clone();
        self.advance();
        let kind = if self.current == Some('=') {
            self.advance();
            with_eq
        } else {
            plain
        };
        Token::new(kind, Payload::None, start, self.position.clone())
    }

    fn make_string(&mut self) -> Result<Token, LangError> {
        let start = self.position.clone();
        self.advance(); // consume opening quote
        let mut text = String::new();
        let mut escaping = false;
        loop {
            match self.current {
                None => {
                    return Err(LangError::ExpectedChar(
                        "Expected '\"' to close string literal".to_string(),
                        start,
                        self.position.clone(),
                    ));
                }
                Some('"') if !escaping => break,
                Some(ch) => {
                    if escaping {
                        text.push(match ch {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                        escaping = false;
                    } else if ch == '\\' {
                        escaping = true;
                    } else {
                        text.push(ch);
                    }
                    self.advance();
                }
            }
        }
        self.advance(); // consume closing quote
        Ok(Token::new(TokenKind::String, Payload::Text(text), start, self.position.clone()))
    }
}
