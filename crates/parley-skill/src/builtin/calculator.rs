// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Arithmetic calculator tool.
//!
//! Expressions are checked against a character whitelist and a length cap,
//! then evaluated by a small recursive-descent parser. There are no names,
//! calls or variables, so nothing in the input can reach outside the parser.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary ('^' unary)?
//! primary := number | '(' expr ')'
//! ```

use async_trait::async_trait;
use parley_core::ParleyError;
use serde_json::{Value, json};

use crate::tool::{Tool, ToolOutput, required_str};

/// Evaluates arithmetic expressions.
pub struct CalculatorTool {
    max_len: usize,
}

impl CalculatorTool {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression using + - * / % ^ and parentheses"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression, e.g. (12.5 * 4) ^ 2"
                }
            },
            "required": ["expression"]
        })
    }

    async fn invoke(&self, input: Value) -> Result<ToolOutput, ParleyError> {
        let expression = required_str(&input, "expression")?;
        let value = evaluate_with_limit(expression, self.max_len)?;
        Ok(ToolOutput::ok(format_number(value)))
    }
}

const DEFAULT_MAX_LEN: usize = 200;

/// Evaluate `expression` with the default length cap.
pub fn evaluate_expression(expression: &str) -> Result<f64, ParleyError> {
    evaluate_with_limit(expression, DEFAULT_MAX_LEN)
}

fn evaluate_with_limit(expression: &str, max_len: usize) -> Result<f64, ParleyError> {
    if expression.chars().count() > max_len {
        return Err(ParleyError::skill(format!(
            "expression is longer than {max_len} characters"
        )));
    }
    if let Some(bad) = expression
        .chars()
        .find(|c| !(c.is_ascii_digit() || c.is_ascii_whitespace() || "+-*/().,%^".contains(*c)))
    {
        return Err(ParleyError::skill(format!(
            "unsupported character '{bad}' in expression"
        )));
    }

    let cleaned: Vec<u8> = expression.bytes().filter(|b| *b != b',').collect();
    if cleaned.iter().all(u8::is_ascii_whitespace) {
        return Err(ParleyError::skill("expression is empty"));
    }

    let mut parser = Parser {
        input: &cleaned,
        pos: 0,
    };
    let value = parser.expr()?;
    parser.skip_whitespace();
    if parser.pos != cleaned.len() {
        return Err(ParleyError::skill(format!(
            "unexpected '{}' at position {}",
            cleaned[parser.pos] as char,
            parser.pos + 1
        )));
    }
    if !value.is_finite() {
        return Err(ParleyError::skill("result is not a finite number"));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64, ParleyError> {
        let mut value = self.term()?;
        loop {
            if self.eat(b'+') {
                value += self.term()?;
            } else if self.eat(b'-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, ParleyError> {
        let mut value = self.unary()?;
        loop {
            if self.eat(b'*') {
                value *= self.unary()?;
            } else if self.eat(b'/') {
                value /= self.unary()?;
            } else if self.eat(b'%') {
                value %= self.unary()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<f64, ParleyError> {
        if self.eat(b'-') {
            Ok(-self.unary()?)
        } else if self.eat(b'+') {
            self.unary()
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> Result<f64, ParleyError> {
        let base = self.primary()?;
        if self.eat(b'^') {
            // Right-associative: 2^3^2 == 2^(3^2).
            let exponent = self.unary()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> Result<f64, ParleyError> {
        if self.eat(b'(') {
            let value = self.expr()?;
            if !self.eat(b')') {
                return Err(ParleyError::skill("missing closing parenthesis"));
            }
            return Ok(value);
        }
        self.number()
    }

    fn number(&mut self) -> Result<f64, ParleyError> {
        self.skip_whitespace();
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9' | b'.')) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(b) => ParleyError::skill(format!(
                    "expected a number at position {}, found '{}'",
                    start + 1,
                    b as char
                )),
                None => ParleyError::skill("expression ends unexpectedly"),
            });
        }
        // The slice holds only ASCII digits and dots.
        let literal = String::from_utf8_lossy(&self.input[start..self.pos]);
        literal
            .parse::<f64>()
            .map_err(|_| ParleyError::skill(format!("invalid number '{literal}'")))
    }
}

/// Render a result without float noise: integers print bare, other values
/// are rounded to ten decimal places with trailing zeros dropped.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    // Fixed decimals would print these as zero.
    if value.abs() < 1e-6 {
        let scientific = format!("{value:.9e}");
        if let Some((mantissa, exponent)) = scientific.split_once('e') {
            let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
            return format!("{mantissa}e{exponent}");
        }
    }
    let fixed = format!("{value:.10}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" || trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
