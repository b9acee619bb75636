//! Safe arithmetic evaluator exposed as the `calc` tool.
//!
//! Accepts numbers, parentheses, unary `+`/`-` and the binary operators
//! `+ - * / // % ** << >> & | ^` with the usual precedence (`**` binds tighter
//! than unary minus and is right-associative; bitwise operators bind loosest).
//! Integers stay integers until `/` or a float operand; `/` always yields a float.
//! Anything else (names, calls, attribute access) is rejected before evaluation.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tools::{parse_args, Tool, ToolError, ToolSpec};

/// Tool name for the calculator.
pub const TOOL_CALC: &str = "calc";

/// Longest expression accepted, in chars.
pub const MAX_EXPRESSION_LEN: usize = 10_000;

/// Deepest nesting of parentheses, signs and exponents the parser descends into.
const MAX_DEPTH: usize = 200;

/// Evaluation result: integer or float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{:.1}", x)
            }
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    Shl,
    Shr,
    Amp,
    Pipe,
    Caret,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            let mut is_float = false;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
                i += 1;
            }
            if i < chars.len() && chars[i] == '.' {
                is_float = true;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    is_float = true;
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
            let num = if is_float {
                Number::Float(
                    text.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .ok_or_else(|| format!("invalid number literal: {}", text))?,
                )
            } else {
                Number::Int(
                    text.parse::<i64>()
                        .map_err(|_| format!("integer literal too large: {}", text))?,
                )
            };
            tokens.push(Token::Num(num));
            continue;
        }
        let next = chars.get(i + 1).copied();
        let (tok, width) = match (c, next) {
            ('*', Some('*')) => (Token::DoubleStar, 2),
            ('/', Some('/')) => (Token::DoubleSlash, 2),
            ('<', Some('<')) => (Token::Shl, 2),
            ('>', Some('>')) => (Token::Shr, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('&', _) => (Token::Amp, 1),
            ('|', _) => (Token::Pipe, 1),
            ('^', _) => (Token::Caret, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            _ => return Err(format!("unsafe expression: unexpected {:?}", c)),
        };
        tokens.push(tok);
        i += width;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, tok: Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Left-associative binary level: `next (op next)*`.
    fn binary(
        &mut self,
        ops: &[Token],
        next: fn(&mut Self) -> Result<Number, String>,
    ) -> Result<Number, String> {
        let mut lhs = next(self)?;
        while let Some(op) = self.peek().filter(|t| ops.contains(t)) {
            self.pos += 1;
            let rhs = next(self)?;
            lhs = apply(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn bit_or(&mut self) -> Result<Number, String> {
        self.binary(&[Token::Pipe], Self::bit_xor)
    }

    fn bit_xor(&mut self) -> Result<Number, String> {
        self.binary(&[Token::Caret], Self::bit_and)
    }

    fn bit_and(&mut self) -> Result<Number, String> {
        self.binary(&[Token::Amp], Self::shift)
    }

    fn shift(&mut self) -> Result<Number, String> {
        self.binary(&[Token::Shl, Token::Shr], Self::arith)
    }

    fn arith(&mut self) -> Result<Number, String> {
        self.binary(&[Token::Plus, Token::Minus], Self::term)
    }

    fn term(&mut self) -> Result<Number, String> {
        self.binary(
            &[Token::Star, Token::Slash, Token::DoubleSlash, Token::Percent],
            Self::unary,
        )
    }

    /// Every nested construct passes through here, so this is where depth is bounded.
    fn unary(&mut self) -> Result<Number, String> {
        if self.depth >= MAX_DEPTH {
            return Err("expression nested too deeply".to_string());
        }
        self.depth += 1;
        let result = self.signed();
        self.depth -= 1;
        result
    }

    fn signed(&mut self) -> Result<Number, String> {
        if self.eat(Token::Minus) {
            return match self.unary()? {
                Number::Int(i) => i
                    .checked_neg()
                    .map(Number::Int)
                    .ok_or_else(|| "integer overflow".to_string()),
                Number::Float(f) => Ok(Number::Float(-f)),
            };
        }
        if self.eat(Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<Number, String> {
        let base = self.atom()?;
        if self.eat(Token::DoubleStar) {
            let exp = self.unary()?;
            return apply(Token::DoubleStar, base, exp);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, String> {
        match self.peek() {
            Some(Token::Num(n)) => {
                self.pos += 1;
                Ok(n)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let v = self.bit_or()?;
                if !self.eat(Token::RParen) {
                    return Err("expected ')'".to_string());
                }
                Ok(v)
            }
            Some(t) => Err(format!("unexpected token {:?}", t)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn overflow() -> String {
    "integer overflow".to_string()
}

fn int_op(op: Token, a: i64, b: i64) -> Result<Number, String> {
    let v = match op {
        Token::Plus => a.checked_add(b).ok_or_else(overflow)?,
        Token::Minus => a.checked_sub(b).ok_or_else(overflow)?,
        Token::Star => a.checked_mul(b).ok_or_else(overflow)?,
        Token::Slash => {
            if b == 0 {
                return Err("division by zero".to_string());
            }
            return Ok(Number::Float(a as f64 / b as f64));
        }
        Token::DoubleSlash => {
            if b == 0 {
                return Err("integer division or modulo by zero".to_string());
            }
            let q = a.checked_div(b).ok_or_else(overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        Token::Percent => {
            if b == 0 {
                return Err("integer division or modulo by zero".to_string());
            }
            let r = a.checked_rem(b).ok_or_else(overflow)?;
            if r != 0 && ((r < 0) != (b < 0)) {
                r + b
            } else {
                r
            }
        }
        Token::DoubleStar => {
            if b < 0 {
                if a == 0 {
                    return Err("0 cannot be raised to a negative power".to_string());
                }
                return Ok(Number::Float((a as f64).powf(b as f64)));
            }
            let exp = u32::try_from(b).map_err(|_| overflow())?;
            a.checked_pow(exp).ok_or_else(overflow)?
        }
        Token::Shl | Token::Shr if b < 0 => return Err("negative shift count".to_string()),
        Token::Shl => {
            if a == 0 {
                0
            } else if b >= 63 {
                return Err(overflow());
            } else {
                let wide = (a as i128) << b;
                i64::try_from(wide).map_err(|_| overflow())?
            }
        }
        Token::Shr => {
            if b >= 64 {
                if a < 0 {
                    -1
                } else {
                    0
                }
            } else {
                a >> b
            }
        }
        Token::Amp => a & b,
        Token::Pipe => a | b,
        Token::Caret => a ^ b,
        Token::Num(_) | Token::LParen | Token::RParen => {
            return Err(format!("unexpected token {:?}", op))
        }
    };
    Ok(Number::Int(v))
}

fn float_op(op: Token, a: f64, b: f64) -> Result<Number, String> {
    let v = match op {
        Token::Plus => a + b,
        Token::Minus => a - b,
        Token::Star => a * b,
        Token::Slash | Token::DoubleSlash | Token::Percent if b == 0.0 => {
            return Err("float division by zero".to_string())
        }
        Token::Slash => a / b,
        Token::DoubleSlash => (a / b).floor(),
        Token::Percent => {
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        Token::DoubleStar => {
            if a == 0.0 && b < 0.0 {
                return Err("0.0 cannot be raised to a negative power".to_string());
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err("negative number cannot be raised to a fractional power".to_string());
            }
            a.powf(b)
        }
        Token::Shl | Token::Shr | Token::Amp | Token::Pipe | Token::Caret => {
            return Err("bitwise operators require integer operands".to_string())
        }
        Token::Num(_) | Token::LParen | Token::RParen => {
            return Err(format!("unexpected token {:?}", op))
        }
    };
    if !v.is_finite() {
        return Err("numerical result out of range".to_string());
    }
    Ok(Number::Float(v))
}

fn apply(op: Token, lhs: Number, rhs: Number) -> Result<Number, String> {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => int_op(op, a, b),
        (a, b) => float_op(op, a.as_f64(), b.as_f64()),
    }
}

/// Evaluates an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<Number, String> {
    if expression.chars().count() > MAX_EXPRESSION_LEN {
        return Err(format!(
            "expression too long (limit {} characters)",
            MAX_EXPRESSION_LEN
        ));
    }
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.bit_or()?;
    if let Some(t) = parser.peek() {
        return Err(format!("unexpected token {:?}", t));
    }
    Ok(value)
}

/// Evaluates arithmetic expressions; the result is returned as a string.
pub struct Calc;

#[derive(Deserialize)]
struct CalcArgs {
    expression: String,
}

#[async_trait]
impl Tool for Calc {
    fn name(&self) -> &str {
        TOOL_CALC
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            TOOL_CALC,
            "Safely evaluate a numeric expression and return the result as a string. \
             Supports + - * / // % ** << >> & | ^ and parentheses.",
            json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "Arithmetic expression, e.g. '(2 + 3) * 4 ** 2'."
                    }
                },
                "required": ["expression"]
            }),
        )
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: CalcArgs = parse_args(args)?;
        let value = evaluate(&args.expression).map_err(ToolError::Failed)?;
        Ok(Value::String(value.to_string()))
    }
}
