//! Parser for the `${{ ... }}` expression language.
//!
//! The grammar covers literals (`null`, booleans, numbers, single-quoted
//! strings), context identifiers, dot and bracket access, function calls,
//! and the `!`, comparison, and logical operators. The parser is used to
//! reject malformed expressions and to extract the context paths and
//! function names an expression touches.

use std::fmt;

/// Parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// A bare context identifier, e.g. `github`.
    Ident(String),
    /// Property access, e.g. `github.event`. A `*` property selects all
    /// elements of an array context.
    Member { object: Box<Expr>, property: String },
    /// Bracket access, e.g. `matrix['os']` or `needs[0]`.
    Index { object: Box<Expr>, index: Box<Expr> },
    Call { function: String, args: Vec<Expr> },
    Not(Box<Expr>),
    Binary { lhs: Box<Expr>, op: BinOp, rhs: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl Expr {
    /// Visit this expression and all sub-expressions in pre-order.
    pub fn walk(&self, visit: &mut dyn FnMut(&Expr)) {
        visit(self);
        match self {
            Expr::Member { object, .. } => object.walk(visit),
            Expr::Index { object, index } => {
                object.walk(visit);
                index.walk(visit);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Expr::Not(inner) => inner.walk(visit),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            _ => {}
        }
    }

    /// Dotted context path for an access chain rooted at an identifier,
    /// e.g. `github.event.commits.*.message`. Bracket access with a string
    /// literal contributes the literal; any other index contributes `*`.
    /// Returns `None` for chains not rooted at an identifier.
    pub fn path(&self) -> Option<String> {
        match self {
            Expr::Ident(name) => Some(name.clone()),
            Expr::Member { object, property } => Some(format!("{}.{}", object.path()?, property)),
            Expr::Index { object, index } => {
                let segment = match index.as_ref() {
                    Expr::Str(value) => value.clone(),
                    _ => "*".to_string(),
                };
                Some(format!("{}.{}", object.path()?, segment))
            }
            _ => None,
        }
    }
}

/// Error with the byte offset of the failure inside the expression text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprError {
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for ExprError {}

/// Parse the text between `${{` and `}}`.
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(input)?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    match parser.peek() {
        Some(token) => Err(ExprError {
            offset: token.offset,
            message: format!("unexpected '{}'", token.kind),
        }),
        None => Ok(expr),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    Dot,
    Star,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "{}", name),
            TokenKind::Number(value) => write!(f, "{}", value),
            TokenKind::Str(value) => write!(f, "'{}'", value),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Star => write!(f, "*"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Not => write!(f, "!"),
            TokenKind::Eq => write!(f, "=="),
            TokenKind::Ne => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Le => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Ge => write!(f, ">="),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Or => write!(f, "||"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let offset = i;
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
            }
            b'\'' => {
                let (value, next) = lex_string(input, i)?;
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    offset,
                });
                i = next;
            }
            b'0'..=b'9' => {
                let (value, next) = lex_number(input, i)?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    offset,
                });
                i = next;
            }
            b'-' if i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() => {
                let (value, next) = lex_number(input, i)?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    offset,
                });
                i = next;
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let mut end = i + 1;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_' || bytes[end] == b'-')
                {
                    end += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(input[i..end].to_string()),
                    offset,
                });
                i = end;
            }
            b'.' => {
                tokens.push(Token {
                    kind: TokenKind::Dot,
                    offset,
                });
                i += 1;
            }
            b'*' => {
                tokens.push(Token {
                    kind: TokenKind::Star,
                    offset,
                });
                i += 1;
            }
            b'[' => {
                tokens.push(Token {
                    kind: TokenKind::LBracket,
                    offset,
                });
                i += 1;
            }
            b']' => {
                tokens.push(Token {
                    kind: TokenKind::RBracket,
                    offset,
                });
                i += 1;
            }
            b'(' => {
                tokens.push(Token {
                    kind: TokenKind::LParen,
                    offset,
                });
                i += 1;
            }
            b')' => {
                tokens.push(Token {
                    kind: TokenKind::RParen,
                    offset,
                });
                i += 1;
            }
            b',' => {
                tokens.push(Token {
                    kind: TokenKind::Comma,
                    offset,
                });
                i += 1;
            }
            b'!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token {
                        kind: TokenKind::Ne,
                        offset,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Not,
                        offset,
                    });
                    i += 1;
                }
            }
            b'=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token {
                        kind: TokenKind::Eq,
                        offset,
                    });
                    i += 2;
                } else {
                    return Err(ExprError {
                        offset,
                        message: "expressions are read-only; use '==' for comparison".to_string(),
                    });
                }
            }
            b'<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token {
                        kind: TokenKind::Le,
                        offset,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Lt,
                        offset,
                    });
                    i += 1;
                }
            }
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token {
                        kind: TokenKind::Ge,
                        offset,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Gt,
                        offset,
                    });
                    i += 1;
                }
            }
            b'&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    tokens.push(Token {
                        kind: TokenKind::And,
                        offset,
                    });
                    i += 2;
                } else {
                    return Err(ExprError {
                        offset,
                        message: "single '&' is not a valid operator".to_string(),
                    });
                }
            }
            b'|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    tokens.push(Token {
                        kind: TokenKind::Or,
                        offset,
                    });
                    i += 2;
                } else {
                    return Err(ExprError {
                        offset,
                        message: "single '|' is not a valid operator".to_string(),
                    });
                }
            }
            _ => {
                let c = input[i..].chars().next().unwrap_or('?');
                return Err(ExprError {
                    offset,
                    message: format!("unexpected character '{}'", c),
                });
            }
        }
    }

    Ok(tokens)
}

fn lex_string(input: &str, start: usize) -> Result<(String, usize), ExprError> {
    let bytes = input.as_bytes();
    let mut value = String::new();
    let mut i = start + 1;

    while i < bytes.len() {
        if bytes[i] == b'\'' {
            // '' is the escape for a literal quote
            if bytes.get(i + 1) == Some(&b'\'') {
                value.push('\'');
                i += 2;
            } else {
                return Ok((value, i + 1));
            }
        } else {
            let c = input[i..].chars().next().unwrap_or('\0');
            value.push(c);
            i += c.len_utf8();
        }
    }

    Err(ExprError {
        offset: start,
        message: "unterminated string literal".to_string(),
    })
}

fn lex_number(input: &str, start: usize) -> Result<(f64, usize), ExprError> {
    let bytes = input.as_bytes();
    let mut i = start;

    if bytes[i] == b'-' {
        i += 1;
    }

    // Hex literals are accepted by the runner's expression evaluator.
    if bytes.get(i) == Some(&b'0') && matches!(bytes.get(i + 1), Some(b'x') | Some(b'X')) {
        let digits_start = i + 2;
        let mut end = digits_start;
        while end < bytes.len() && bytes[end].is_ascii_hexdigit() {
            end += 1;
        }
        let value = i64::from_str_radix(&input[digits_start..end], 16).map_err(|_| ExprError {
            offset: start,
            message: "invalid hexadecimal literal".to_string(),
        })?;
        let value = if bytes[start] == b'-' {
            -(value as f64)
        } else {
            value as f64
        };
        return Ok((value, end));
    }

    let mut end = i;
    while end < bytes.len()
        && (bytes[end].is_ascii_digit()
            || bytes[end] == b'.'
            || bytes[end] == b'e'
            || bytes[end] == b'E'
            || ((bytes[end] == b'+' || bytes[end] == b'-')
                && matches!(bytes.get(end - 1), Some(b'e') | Some(b'E'))))
    {
        end += 1;
    }

    input[start..end]
        .parse::<f64>()
        .map(|value| (value, end))
        .map_err(|_| ExprError {
            offset: start,
            message: format!("invalid number literal '{}'", &input[start..end]),
        })
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().map(|t| &t.kind) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ExprError> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected '{}'", kind)))
        }
    }

    fn error_here(&self, message: String) -> ExprError {
        let offset = self
            .peek()
            .map(|t| t.offset)
            .or_else(|| self.tokens.last().map(|t| t.offset))
            .unwrap_or(0);
        ExprError { offset, message }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op: BinOp::Or,
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_comparison()?;
        while self.eat(&TokenKind::And) {
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op: BinOp::And,
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Eq) => BinOp::Eq,
                Some(TokenKind::Ne) => BinOp::Ne,
                Some(TokenKind::Lt) => BinOp::Lt,
                Some(TokenKind::Le) => BinOp::Le,
                Some(TokenKind::Gt) => BinOp::Gt,
                Some(TokenKind::Ge) => BinOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&TokenKind::Not) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::Dot) {
                let property = match self.advance().map(|t| t.kind) {
                    Some(TokenKind::Ident(name)) => name,
                    Some(TokenKind::Star) => "*".to_string(),
                    _ => {
                        return Err(self.error_here("expected property name after '.'".to_string()))
                    }
                };
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.eat(&TokenKind::LBracket) {
                let index = self.parse_or()?;
                self.expect(TokenKind::RBracket)?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(token) => match token.kind {
                TokenKind::Number(value) => Ok(Expr::Number(value)),
                TokenKind::Str(value) => Ok(Expr::Str(value)),
                TokenKind::Ident(name) => {
                    if self.eat(&TokenKind::LParen) {
                        let mut args = Vec::new();
                        if !self.eat(&TokenKind::RParen) {
                            loop {
                                args.push(self.parse_or()?);
                                if self.eat(&TokenKind::Comma) {
                                    continue;
                                }
                                self.expect(TokenKind::RParen)?;
                                break;
                            }
                        }
                        return Ok(Expr::Call {
                            function: name,
                            args,
                        });
                    }
                    match name.as_str() {
                        "null" => Ok(Expr::Null),
                        "true" => Ok(Expr::Bool(true)),
                        "false" => Ok(Expr::Bool(false)),
                        _ => Ok(Expr::Ident(name)),
                    }
                }
                TokenKind::LParen => {
                    let expr = self.parse_or()?;
                    self.expect(TokenKind::RParen)?;
                    Ok(expr)
                }
                kind => Err(ExprError {
                    offset: token.offset,
                    message: format!("unexpected '{}'", kind),
                }),
            },
            None => Err(ExprError {
                offset: 0,
                message: "empty expression".to_string(),
            }),
        }
    }
}
