//! Error and warning types for the G-code parser
//!
//! Fatal problems are [`ParseError`]s and stop the parse unless the caller
//! asks for skipping. Everything recoverable is reported as a
//! [`ParseWarning`] value next to the output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Expression evaluation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// `[` and `]` do not pair up
    #[error("Unbalanced brackets at line {0}")]
    UnbalancedBrackets(usize),

    /// A variable was read before being assigned
    #[error("Undefined variable: #{name}")]
    UndefinedVariable {
        /// The variable as written, without the leading `#`.
        name: String,
    },

    /// A function name that the evaluator does not know
    #[error("Unknown function: {name}")]
    UnknownFunction {
        /// The function name.
        name: String,
    },

    /// Malformed expression
    #[error("Syntax error: {reason}")]
    Syntax {
        /// What was expected or found.
        reason: String,
    },

    /// A function or operator was applied outside its domain
    #[error("Domain error: {reason}")]
    DomainError {
        /// The offending operation.
        reason: String,
    },
}

impl EvalError {
    /// Attach a line number where the variant carries one
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Self::UnbalancedBrackets(_) => Self::UnbalancedBrackets(line),
            other => other,
        }
    }
}

/// Fatal parse error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Expression brackets do not balance
    #[error("Unbalanced brackets at line {line_number}")]
    UnbalancedBrackets {
        /// The line number of the offending line.
        line_number: usize,
    },

    /// An expression could not be evaluated
    #[error("Expression error at line {line_number}: {message}")]
    Expression {
        /// The line number of the offending line.
        line_number: usize,
        /// The evaluation failure.
        message: String,
    },

    /// An arc asked for more than one turn with a `P` word
    #[error("Multi-turn arc at line {line_number}: P{turns} is not supported")]
    MultiTurnArc {
        /// The line number of the offending line.
        line_number: usize,
        /// The requested number of turns.
        turns: f64,
    },

    /// An arc whose center cannot be determined
    #[error("Invalid arc at line {line_number}: {message}")]
    InvalidArc {
        /// The line number of the offending line.
        line_number: usize,
        /// Why the arc is unusable.
        message: String,
    },

    /// A G-code set a modal group to a value it cannot hold
    #[error("Modal state error at line {line_number}: {message}")]
    ModalState {
        /// The line number of the offending line.
        line_number: usize,
        /// The rejected value.
        message: String,
    },
}

impl ParseError {
    /// Line the error was raised on
    pub fn line_number(&self) -> usize {
        match self {
            Self::UnbalancedBrackets { line_number }
            | Self::Expression { line_number, .. }
            | Self::MultiTurnArc { line_number, .. }
            | Self::InvalidArc { line_number, .. }
            | Self::ModalState { line_number, .. } => *line_number,
        }
    }

    pub(crate) fn from_eval(err: EvalError, line_number: usize) -> Self {
        match err {
            EvalError::UnbalancedBrackets(_) => Self::UnbalancedBrackets { line_number },
            other => Self::Expression {
                line_number,
                message: other.to_string(),
            },
        }
    }
}

/// Recoverable problem found while parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParseWarning {
    /// Parentheses in a comment do not balance; the comment was dropped
    BadComment(usize),
    /// A word letter that is not supported; the line was skipped
    UnsupportedCode(char, usize),
    /// Axes used by a cutting move before any position was known
    AmbiguousStart(Vec<char>),
    /// Arc start and end radii differ by more than the accuracy
    RadiusMismatch {
        /// The line of the arc.
        line: usize,
        /// Difference between the start and end radius.
        deviation: f64,
    },
    /// A G-code that would change geometry in unsupported ways; the line was skipped
    UnsupportedGCode {
        /// The code as written, e.g. `G92`.
        code: String,
        /// The line of the code.
        line: usize,
    },
    /// A line read an unassigned variable and was skipped
    UndefinedVariable {
        /// The variable as written, without the leading `#`.
        name: String,
        /// The line of the read.
        line: usize,
    },
    /// A line with a fatal error was skipped at the caller's request
    SkippedLine {
        /// The skipped line.
        line: usize,
        /// The error that would have stopped the parse.
        message: String,
    },
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadComment(line) => write!(f, "Line {}: unbalanced comment parentheses", line),
            Self::UnsupportedCode(letter, line) => {
                write!(f, "Line {}: unsupported word '{}', line skipped", line, letter)
            }
            Self::AmbiguousStart(axes) => {
                let axes: String = axes.iter().collect();
                write!(f, "Ambiguous start position on axes {}", axes)
            }
            Self::RadiusMismatch { line, deviation } => {
                write!(f, "Line {}: arc radius mismatch of {:.6}", line, deviation)
            }
            Self::UnsupportedGCode { code, line } => {
                write!(f, "Line {}: {} is not supported, line skipped", line, code)
            }
            Self::UndefinedVariable { name, line } => {
                write!(f, "Line {}: undefined variable #{}, line skipped", line, name)
            }
            Self::SkippedLine { line, message } => {
                write!(f, "Line {}: skipped: {}", line, message)
            }
        }
    }
}

/// Result type alias for expression evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Result type alias for parsing
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_error_display() {
        let err = EvalError::UndefinedVariable {
            name: "<depth>".to_string(),
        };
        assert_eq!(err.to_string(), "Undefined variable: #<depth>");
    }

    #[test]
    fn test_at_line() {
        assert_eq!(
            EvalError::UnbalancedBrackets(0).at_line(12),
            EvalError::UnbalancedBrackets(12)
        );
        let syntax = EvalError::Syntax {
            reason: "x".to_string(),
        };
        assert_eq!(syntax.clone().at_line(3), syntax);
    }

    #[test]
    fn test_parse_error_from_eval() {
        let err = ParseError::from_eval(EvalError::UnbalancedBrackets(0), 7);
        assert_eq!(err, ParseError::UnbalancedBrackets { line_number: 7 });
        assert_eq!(err.line_number(), 7);
        assert_eq!(err.to_string(), "Unbalanced brackets at line 7");

        let err = ParseError::from_eval(
            EvalError::DomainError {
                reason: "SQRT of -1".to_string(),
            },
            2,
        );
        assert_eq!(
            err.to_string(),
            "Expression error at line 2: Domain error: SQRT of -1"
        );
    }

    #[test]
    fn test_warning_display() {
        let warning = ParseWarning::AmbiguousStart(vec!['X', 'Z']);
        assert_eq!(warning.to_string(), "Ambiguous start position on axes XZ");
        let warning = ParseWarning::UnsupportedCode('A', 4);
        assert!(warning.to_string().contains("'A'"));
    }
}
