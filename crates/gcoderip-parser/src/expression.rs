//! Expression evaluator
//!
//! Evaluates the bracketed expressions and `#` parameter references of
//! RS274/NGC style G-code. Operator precedence, lowest first:
//!
//! | level | operators                      |
//! |-------|--------------------------------|
//! | 1     | `AND`, `OR`, `XOR`             |
//! | 2     | `EQ`, `NE`, `GT`, `GE`, `LT`, `LE` |
//! | 3     | `+`, `-`                       |
//! | 4     | `*`, `/`, `MOD`                |
//! | 5     | `**` (right associative)       |
//!
//! Trigonometric functions take and return degrees.

use std::collections::HashMap;
use std::fmt;

use crate::error::{EvalError, EvalResult};

/// A parameter reference: `#123` or `#<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VarRef {
    Numbered(u32),
    /// Lower-cased with whitespace removed
    Named(String),
}

impl VarRef {
    /// Reference a named parameter, normalizing the name
    pub fn named(name: &str) -> Self {
        Self::Named(
            name.chars()
                .filter(|c| !c.is_whitespace())
                .flat_map(char::to_lowercase)
                .collect(),
        )
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numbered(n) => write!(f, "{}", n),
            Self::Named(name) => write!(f, "<{}>", name),
        }
    }
}

/// Parameter values visible to expressions
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    numbered: HashMap<u32, f64>,
    named: HashMap<String, f64>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: &VarRef) -> Option<f64> {
        match var {
            VarRef::Numbered(n) => self.numbered.get(n).copied(),
            VarRef::Named(name) => self.named.get(name).copied(),
        }
    }

    pub fn set(&mut self, var: VarRef, value: f64) {
        match var {
            VarRef::Numbered(n) => {
                self.numbered.insert(n, value);
            }
            VarRef::Named(name) => {
                self.named.insert(name, value);
            }
        }
    }

    pub fn contains(&self, var: &VarRef) -> bool {
        self.get(var).is_some()
    }

    pub fn len(&self) -> usize {
        self.numbered.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Evaluate a complete expression
///
/// The text may be a single bracketed expression (`[1 + 2]`) or a bare
/// one (`1 + 2`).
pub fn evaluate(expr: &str, vars: &VarTable) -> EvalResult<f64> {
    check_brackets(expr)?;
    let mut reader = ExprReader::new(expr, vars);
    let value = reader.expression(0)?;
    reader.skip_whitespace();
    if !reader.at_end() {
        return Err(reader.unexpected());
    }
    Ok(value)
}

/// Check that `[` and `]` pair up
pub fn check_brackets(text: &str) -> EvalResult<()> {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth < 0 {
                    return Err(EvalError::UnbalancedBrackets(0));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(EvalError::UnbalancedBrackets(0));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    And,
    Or,
    Xor,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            Self::And | Self::Or | Self::Xor => 1,
            Self::Eq | Self::Ne | Self::Gt | Self::Ge | Self::Lt | Self::Le => 2,
            Self::Add | Self::Sub => 3,
            Self::Mul | Self::Div | Self::Mod => 4,
            Self::Pow => 5,
        }
    }

    fn keyword(word: &str) -> Option<Self> {
        Some(match word {
            "AND" => Self::And,
            "OR" => Self::Or,
            "XOR" => Self::Xor,
            "EQ" => Self::Eq,
            "NE" => Self::Ne,
            "GT" => Self::Gt,
            "GE" => Self::Ge,
            "LT" => Self::Lt,
            "LE" => Self::Le,
            "MOD" => Self::Mod,
            _ => return None,
        })
    }

    fn apply(self, a: f64, b: f64) -> EvalResult<f64> {
        let truth = |v: bool| if v { 1.0 } else { 0.0 };
        Ok(match self {
            Self::And => truth(a != 0.0 && b != 0.0),
            Self::Or => truth(a != 0.0 || b != 0.0),
            Self::Xor => truth((a != 0.0) != (b != 0.0)),
            Self::Eq => truth(a == b),
            Self::Ne => truth(a != b),
            Self::Gt => truth(a > b),
            Self::Ge => truth(a >= b),
            Self::Lt => truth(a < b),
            Self::Le => truth(a <= b),
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => {
                if b == 0.0 {
                    return Err(domain(format!("division of {} by zero", a)));
                }
                a / b
            }
            Self::Mod => {
                if b == 0.0 {
                    return Err(domain(format!("{} MOD 0", a)));
                }
                // result takes the sign of the divisor
                a - b * (a / b).floor()
            }
            Self::Pow => {
                let v = a.powf(b);
                if v.is_nan() {
                    return Err(domain(format!("{} ** {}", a, b)));
                }
                v
            }
        })
    }
}

fn domain(reason: String) -> EvalError {
    EvalError::DomainError { reason }
}

/// Cursor over expression text
///
/// Used for whole expressions by [`evaluate`] and word by word by the line
/// tokenizer.
pub struct ExprReader<'a> {
    chars: Vec<char>,
    pos: usize,
    vars: &'a VarTable,
}

impl<'a> ExprReader<'a> {
    pub fn new(text: &str, vars: &'a VarTable) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            vars,
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek_non_ws(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.peek()
    }

    fn expect(&mut self, expected: char) -> EvalResult<()> {
        match self.peek_non_ws() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(EvalError::Syntax {
                reason: format!("expected '{}' at column {}", expected, self.pos + 1),
            }),
        }
    }

    pub(crate) fn unexpected(&self) -> EvalError {
        match self.peek() {
            Some(c) => EvalError::Syntax {
                reason: format!("unexpected '{}' at column {}", c, self.pos + 1),
            },
            None => EvalError::Syntax {
                reason: "unexpected end of expression".to_string(),
            },
        }
    }

    /// Word starting at the cursor, upper-cased, not consumed
    ///
    /// Operator words end at the first digit (`7MOD3`); function names may
    /// carry digits (`ATAN2`).
    fn peek_word(&self, digits: bool) -> String {
        self.chars[self.pos.min(self.chars.len())..]
            .iter()
            .take_while(|c| c.is_ascii_alphabetic() || (digits && c.is_ascii_digit()))
            .flat_map(|c| c.to_uppercase())
            .collect()
    }

    /// Binary expression with operators binding at least `min_prec`
    pub fn expression(&mut self, min_prec: u8) -> EvalResult<f64> {
        let mut lhs = self.real_value()?;
        while let Some((op, len)) = self.peek_operator() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.pos += len;
            let next_min = if op == BinaryOp::Pow { prec } else { prec + 1 };
            let rhs = self.expression(next_min)?;
            lhs = op.apply(lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn peek_operator(&mut self) -> Option<(BinaryOp, usize)> {
        let c = self.peek_non_ws()?;
        let next = self.chars.get(self.pos + 1).copied();
        match c {
            '*' if next == Some('*') => Some((BinaryOp::Pow, 2)),
            '*' => Some((BinaryOp::Mul, 1)),
            '/' => Some((BinaryOp::Div, 1)),
            '+' => Some((BinaryOp::Add, 1)),
            '-' => Some((BinaryOp::Sub, 1)),
            c if c.is_ascii_alphabetic() => {
                let word = self.peek_word(false);
                BinaryOp::keyword(&word).map(|op| (op, word.len()))
            }
            _ => None,
        }
    }

    /// A single real value: number, parameter, bracketed expression or
    /// function call, with optional leading signs
    pub fn real_value(&mut self) -> EvalResult<f64> {
        match self.peek_non_ws() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.real_value()?)
            }
            Some('+') => {
                self.pos += 1;
                self.real_value()
            }
            Some('[') => {
                self.pos += 1;
                let value = self.expression(0)?;
                self.expect(']')?;
                Ok(value)
            }
            Some('#') => {
                let var = self.var_ref()?;
                self.vars
                    .get(&var)
                    .ok_or_else(|| EvalError::UndefinedVariable {
                        name: var.to_string(),
                    })
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.function(),
            _ => Err(self.unexpected()),
        }
    }

    /// Parameter reference starting at `#`, without looking it up
    pub fn var_ref(&mut self) -> EvalResult<VarRef> {
        self.expect('#')?;
        match self.peek_non_ws() {
            Some('<') => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != '>') {
                    self.pos += 1;
                }
                if self.at_end() {
                    return Err(EvalError::Syntax {
                        reason: "unterminated parameter name".to_string(),
                    });
                }
                let name: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                if name.trim().is_empty() {
                    return Err(EvalError::Syntax {
                        reason: "empty parameter name".to_string(),
                    });
                }
                Ok(VarRef::named(&name))
            }
            Some(_) => {
                // #123, ##1 and #[expr] all evaluate to a parameter number
                let value = self.real_value()?;
                if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
                    return Err(EvalError::Syntax {
                        reason: format!("invalid parameter number {}", value),
                    });
                }
                Ok(VarRef::Numbered(value as u32))
            }
            None => Err(self.unexpected()),
        }
    }

    fn number(&mut self) -> EvalResult<f64> {
        let start = self.pos;
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>().map_err(|_| EvalError::Syntax {
            reason: format!("invalid number '{}'", text),
        })
    }

    fn bracketed(&mut self) -> EvalResult<f64> {
        self.expect('[')?;
        let value = self.expression(0)?;
        self.expect(']')?;
        Ok(value)
    }

    fn function(&mut self) -> EvalResult<f64> {
        let name = self.peek_word(true);
        self.pos += name.len();
        match name.as_str() {
            "EXISTS" => {
                self.expect('[')?;
                let var = self.var_ref()?;
                self.expect(']')?;
                Ok(if self.vars.contains(&var) { 1.0 } else { 0.0 })
            }
            "ATAN" => {
                let y = self.bracketed()?;
                let checkpoint = self.pos;
                if self.peek_non_ws() == Some('/') {
                    self.pos += 1;
                    if self.peek_non_ws() == Some('[') {
                        let x = self.bracketed()?;
                        return Ok(normalize_deg(y.atan2(x).to_degrees()));
                    }
                }
                self.pos = checkpoint;
                Ok(y.atan().to_degrees())
            }
            "ATAN2" => {
                self.expect('[')?;
                let y = self.expression(0)?;
                self.expect(',')?;
                let x = self.expression(0)?;
                self.expect(']')?;
                Ok(normalize_deg(y.atan2(x).to_degrees()))
            }
            _ => {
                let f = unary_function(&name).ok_or_else(|| EvalError::UnknownFunction {
                    name: name.clone(),
                })?;
                let arg = self.bracketed()?;
                f(arg).ok_or_else(|| domain(format!("{}[{}]", name, arg)))
            }
        }
    }
}

/// Map `(-180, 180]` onto `[0, 360)` the way controllers report ATAN
fn normalize_deg(deg: f64) -> f64 {
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

type UnaryFn = fn(f64) -> Option<f64>;

fn unary_function(name: &str) -> Option<UnaryFn> {
    let f: UnaryFn = match name {
        "ABS" => |v: f64| Some(v.abs()),
        "ACOS" => |v: f64| (-1.0..=1.0).contains(&v).then(|| v.acos().to_degrees()),
        "ASIN" => |v: f64| (-1.0..=1.0).contains(&v).then(|| v.asin().to_degrees()),
        "COS" => |v: f64| Some(v.to_radians().cos()),
        "SIN" => |v: f64| Some(v.to_radians().sin()),
        "TAN" => |v: f64| Some(v.to_radians().tan()),
        "EXP" => |v: f64| Some(v.exp()),
        "FIX" => |v: f64| Some(v.floor()),
        "FUP" => |v: f64| Some(v.ceil()),
        "ROUND" => |v: f64| Some(v.round()),
        "LN" => |v: f64| (v > 0.0).then(|| v.ln()),
        "SQRT" => |v: f64| (v >= 0.0).then(|| v.sqrt()),
        _ => return None,
    };
    Some(f)
}
