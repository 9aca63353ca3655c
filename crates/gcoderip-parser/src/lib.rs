//! # GCodeRip Parser
//!
//! Reads G-code programs into [`gcoderip_core::Segment`] sequences.
//!
//! ## Features
//!
//! - RS274/NGC expressions: `[...]` arithmetic, logic and comparison
//!   operators, degree-based trigonometry, numbered and named parameters
//! - Modal state for motion mode, plane, distance modes and units
//! - `IJK` and `R` arcs, with arcs outside the XY plane linearized
//! - Comments and non-motion words preserved in program order
//! - Ambiguous start detection with forward-fill of unset axes

pub mod error;
pub mod expression;
pub mod parser;
pub mod state;
pub mod words;

pub use error::{EvalError, EvalResult, ParseError, ParseResult, ParseWarning};
pub use expression::{check_brackets, evaluate, ExprReader, VarRef, VarTable};
pub use parser::{parse, ParseOptions, ParseOutput, UNSUPPORTED_LETTERS};
pub use state::ModalState;
pub use words::{read_words, split_comments, Assignment, CommentSplit, LineWords, Word};
