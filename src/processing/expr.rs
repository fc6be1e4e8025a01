// src/processing/expr.rs
//! Per-pixel band algebra formulas.
//!
//! Supports the subset of the raster calculator's formula language used by
//! the vegetation indices: numeric literals, slot symbols `A`..`F`, the four
//! arithmetic operators, unary minus, comparisons, parentheses and the
//! functions `logical_and`, `logical_or`, `logical_not`, `abs` and `sqrt`.
//!
//! Comparisons and logical functions are predicates evaluating to 1.0 or
//! 0.0. Multiplying by a false predicate yields 0.0 even when the other
//! factor is infinite or NaN, so a guard such as `((A+B)!=0)*(A/(A+B))`
//! masks the division instead of leaking NaN into the output.

use crate::error::EngineError;
use crate::processing::params::{SLOT_COUNT, SLOT_SYMBOLS};

/// Deepest parenthesis, function or sign nesting accepted by the parser.
pub const MAX_NESTING: usize = 256;

/// Longest formula accepted, in tokens. Bounds the evaluation depth of long
/// operator chains.
pub const MAX_TOKENS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    Abs,
    Sqrt,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "logical_and" => Self::LogicalAnd,
            "logical_or" => Self::LogicalOr,
            "logical_not" => Self::LogicalNot,
            "abs" => Self::Abs,
            "sqrt" => Self::Sqrt,
            _ => return None,
        })
    }

    fn arity(self) -> usize {
        match self {
            Self::LogicalAnd | Self::LogicalOr => 2,
            Self::LogicalNot | Self::Abs | Self::Sqrt => 1,
        }
    }

    fn is_predicate(self) -> bool {
        matches!(self, Self::LogicalAnd | Self::LogicalOr | Self::LogicalNot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Slot(usize),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

fn truth(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl Expr {
    fn is_predicate(&self) -> bool {
        match self {
            Self::Compare(..) => true,
            Self::Call(func, _) => func.is_predicate(),
            _ => false,
        }
    }

    pub fn eval(&self, values: &[f64; SLOT_COUNT]) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Slot(i) => values[*i],
            Self::Neg(e) => -e.eval(values),
            Self::Binary(BinOp::Mul, l, r) => {
                let a = l.eval(values);
                if a == 0.0 && l.is_predicate() {
                    return 0.0;
                }
                let b = r.eval(values);
                if b == 0.0 && r.is_predicate() {
                    return 0.0;
                }
                a * b
            }
            Self::Binary(op, l, r) => {
                let (a, b) = (l.eval(values), r.eval(values));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Div => a / b,
                    BinOp::Mul => unreachable!(),
                }
            }
            Self::Compare(op, l, r) => {
                let (a, b) = (l.eval(values), r.eval(values));
                truth(match op {
                    CmpOp::Eq => a == b,
                    CmpOp::Ne => a != b,
                    CmpOp::Lt => a < b,
                    CmpOp::Le => a <= b,
                    CmpOp::Gt => a > b,
                    CmpOp::Ge => a >= b,
                })
            }
            Self::Call(func, args) => match func {
                Func::LogicalAnd => truth(args[0].eval(values) != 0.0 && args[1].eval(values) != 0.0),
                Func::LogicalOr => truth(args[0].eval(values) != 0.0 || args[1].eval(values) != 0.0),
                Func::LogicalNot => truth(args[0].eval(values) == 0.0),
                Func::Abs => args[0].eval(values).abs(),
                Func::Sqrt => args[0].eval(values).sqrt(),
            },
        }
    }

    fn visit_slots(&self, used: &mut [bool; SLOT_COUNT]) {
        match self {
            Self::Number(_) => {}
            Self::Slot(i) => used[*i] = true,
            Self::Neg(e) => e.visit_slots(used),
            Self::Binary(_, l, r) | Self::Compare(_, l, r) => {
                l.visit_slots(used);
                r.visit_slots(used);
            }
            Self::Call(_, args) => args.iter().for_each(|a| a.visit_slots(used)),
        }
    }
}

/// A parsed formula together with the slots it reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expr,
    used: [bool; SLOT_COUNT],
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, EngineError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            end: source.len(),
            depth: 0,
        };
        let expr = parser.comparison()?;
        if let Some((offset, token)) = parser.tokens.get(parser.pos) {
            return Err(EngineError::Formula {
                offset: *offset,
                reason: format!("unexpected {token:?}"),
            });
        }

        let mut used = [false; SLOT_COUNT];
        expr.visit_slots(&mut used);
        Ok(Self { expr, used })
    }

    /// Symbols of the slots the formula references.
    pub fn slots(&self) -> impl Iterator<Item = char> + '_ {
        SLOT_SYMBOLS
            .iter()
            .zip(self.used)
            .filter_map(|(s, used)| used.then_some(*s))
    }

    pub fn uses(&self, slot: usize) -> bool {
        self.used[slot]
    }

    /// Evaluate for one pixel; `values` is indexed by slot (A = 0).
    pub fn eval(&self, values: &[f64; SLOT_COUNT]) -> f64 {
        self.expr.eval(values)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

fn formula_error(offset: usize, reason: impl Into<String>) -> EngineError {
    EngineError::Formula {
        offset,
        reason: reason.into(),
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, EngineError> {
    const OPERATORS: [&str; 10] = ["==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/"];

    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if tokens.len() == MAX_TOKENS {
            return Err(formula_error(start, format!("formula longer than {MAX_TOKENS} tokens")));
        }

        if c.is_ascii_digit() || (c == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    i = j;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text = &source[start..i];
            let value = text
                .parse::<f64>()
                .map_err(|_| formula_error(start, format!("invalid number {text:?}")))?;
            tokens.push((start, Token::Number(value)));
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push((start, Token::Ident(source[start..i].to_string())));
            continue;
        }

        let token = match c {
            b'(' => Some(Token::LParen),
            b')' => Some(Token::RParen),
            b',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = token {
            tokens.push((start, token));
            i += 1;
            continue;
        }

        match OPERATORS.iter().find(|op| source[start..].starts_with(**op)) {
            Some(op) => {
                tokens.push((start, Token::Op(*op)));
                i += op.len();
            }
            None => {
                let ch = source[start..].chars().next().unwrap_or('?');
                return Err(formula_error(start, format!("unexpected character {ch:?}")));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(o, _)| *o)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), EngineError> {
        let offset = self.offset();
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(formula_error(offset, format!("expected {expected:?}, found {token:?}"))),
            None => Err(formula_error(offset, format!("expected {expected:?}, found end of formula"))),
        }
    }

    fn comparison(&mut self) -> Result<Expr, EngineError> {
        let left = self.sum()?;
        let op = match self.peek() {
            Some(Token::Op("==")) => CmpOp::Eq,
            Some(Token::Op("!=")) => CmpOp::Ne,
            Some(Token::Op("<")) => CmpOp::Lt,
            Some(Token::Op("<=")) => CmpOp::Le,
            Some(Token::Op(">")) => CmpOp::Gt,
            Some(Token::Op(">=")) => CmpOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.sum()?;
        Ok(Expr::Compare(op, Box::new(left), Box::new(right)))
    }

    fn sum(&mut self) -> Result<Expr, EngineError> {
        let mut expr = self.product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op("+")) => BinOp::Add,
                Some(Token::Op("-")) => BinOp::Sub,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let right = self.product()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
    }

    fn product(&mut self) -> Result<Expr, EngineError> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op("*")) => BinOp::Mul,
                Some(Token::Op("/")) => BinOp::Div,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let right = self.unary()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, EngineError> {
        if self.depth == MAX_NESTING {
            return Err(formula_error(
                self.offset(),
                format!("formula nested deeper than {MAX_NESTING} levels"),
            ));
        }
        self.depth += 1;
        let expr = self.signed();
        self.depth -= 1;
        expr
    }

    fn signed(&mut self) -> Result<Expr, EngineError> {
        match self.peek() {
            Some(Token::Op("-")) => {
                self.pos += 1;
                Ok(match self.unary()? {
                    Expr::Number(n) => Expr::Number(-n),
                    e => Expr::Neg(Box::new(e)),
                })
            }
            Some(Token::Op("+")) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, EngineError> {
        let offset = self.offset();
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let expr = self.comparison()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Ident(name)) => {
                if let Some(slot) = SLOT_SYMBOLS.iter().position(|s| name.len() == 1 && name.starts_with(*s)) {
                    return Ok(Expr::Slot(slot));
                }
                let func = Func::lookup(&name)
                    .ok_or_else(|| formula_error(offset, format!("unknown name {name:?}")))?;
                self.expect(Token::LParen)?;
                let mut args = vec![self.comparison()?];
                while self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                    args.push(self.comparison()?);
                }
                self.expect(Token::RParen)?;
                if args.len() != func.arity() {
                    return Err(formula_error(
                        offset,
                        format!("{name} takes {} argument(s), got {}", func.arity(), args.len()),
                    ));
                }
                Ok(Expr::Call(func, args))
            }
            Some(token) => Err(formula_error(offset, format!("unexpected {token:?}"))),
            None => Err(formula_error(offset, "unexpected end of formula")),
        }
    }
}
