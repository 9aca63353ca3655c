//! Line tokenizer
//!
//! Splits comments off a line and reads the remaining words and parameter
//! assignments, evaluating every value through the expression reader.

use crate::error::{EvalError, EvalResult};
use crate::expression::{ExprReader, VarRef, VarTable};

/// A letter and its evaluated value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word {
    pub letter: char,
    pub value: f64,
}

impl Word {
    /// The word as G-code text, e.g. `M3` or `G61.1`
    pub fn to_gcode(&self) -> String {
        format!("{}{}", self.letter, self.value)
    }
}

/// `#var = value` statement
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: VarRef,
    pub value: f64,
}

/// Everything on one line of code, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineWords {
    pub words: Vec<Word>,
    pub assignments: Vec<Assignment>,
}

impl LineWords {
    /// Value of the last `letter` word on the line
    pub fn get(&self, letter: char) -> Option<f64> {
        self.words
            .iter()
            .rev()
            .find(|w| w.letter == letter)
            .map(|w| w.value)
    }

    pub fn has(&self, letter: char) -> bool {
        self.words.iter().any(|w| w.letter == letter)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.assignments.is_empty()
    }
}

/// A line with its comments separated from the code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentSplit {
    pub code: String,
    pub comments: Vec<String>,
    /// False when parentheses did not pair up; no comments are captured then
    pub balanced: bool,
}

/// Separate `( ... )` and `;` comments from code
///
/// Nested parentheses stay part of the outer comment. An unterminated
/// comment swallows the rest of the line and a stray `)` is dropped.
pub fn split_comments(line: &str) -> CommentSplit {
    let mut code = String::with_capacity(line.len());
    let mut comments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut balanced = true;

    for (i, c) in line.char_indices() {
        match c {
            ';' if depth == 0 => {
                let rest = line[i + 1..].trim();
                if !rest.is_empty() {
                    comments.push(rest.to_string());
                }
                break;
            }
            '(' => {
                if depth > 0 {
                    current.push(c);
                }
                depth += 1;
            }
            ')' if depth == 0 => balanced = false,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    comments.push(current.trim().to_string());
                    current.clear();
                } else {
                    current.push(c);
                }
            }
            _ if depth > 0 => current.push(c),
            _ => code.push(c),
        }
    }
    if depth > 0 {
        balanced = false;
    }
    if !balanced {
        comments.clear();
    }
    CommentSplit {
        code,
        comments,
        balanced,
    }
}

/// Read the words and assignments of comment-free code
pub fn read_words(code: &str, vars: &VarTable) -> EvalResult<LineWords> {
    let mut line = LineWords::default();
    let mut reader = ExprReader::new(code, vars);
    loop {
        reader.skip_whitespace();
        match reader.peek() {
            None => break,
            Some('#') => {
                let target = reader.var_ref()?;
                reader.skip_whitespace();
                if reader.advance() != Some('=') {
                    return Err(EvalError::Syntax {
                        reason: format!("expected '=' after #{}", target),
                    });
                }
                let value = reader.real_value()?;
                line.assignments.push(Assignment { target, value });
            }
            Some(c) if c.is_ascii_alphabetic() => {
                reader.advance();
                let value = reader.real_value()?;
                line.words.push(Word {
                    letter: c.to_ascii_uppercase(),
                    value,
                });
            }
            Some(_) => return Err(reader.unexpected()),
        }
    }
    Ok(line)
}
