// ABOUTME: Error types for the lexing, typing, and evaluation pipeline

use thiserror::Error;

/// Faults raised while tokenizing or parsing source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("expected `{expected}`, found `{found}`")]
    Expected { expected: String, found: String },

    #[error("integer literal `{0}` out of range")]
    IntegerOutOfRange(String),
}

/// Faults raised during type inference.
///
/// Mismatch and circularity are distinct internally but both surface as
/// the single `type error` diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("type mismatch")]
    Mismatch,

    #[error("circular type")]
    Circularity,

    #[error("equality test on non-equality type")]
    NotEquality,

    #[error("variable `{0}` is not bound")]
    Unbound(String),
}

/// Faults raised by the evaluator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("{op} of nil")]
    EmptyList { op: &'static str },

    #[error("segmentation fault: address {0} is unallocated")]
    DanglingRef(usize),

    #[error("variable `{0}` is not defined")]
    Undefined(String),

    #[error("value is not callable")]
    NotCallable,

    /// An operand had the wrong shape. Unreachable for well-typed
    /// programs; the evaluator still has to refuse rather than panic.
    #[error("expected {expected}, got {actual}")]
    ValueMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Top-level failure category. Its `Display` form is exactly the
/// diagnostic line the interpreter prints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("syntax error")]
    Syntax(#[from] SyntaxError),

    #[error("type error")]
    Type(#[from] TypeError),

    #[error("runtime error")]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_displays_only_the_category() {
        let f: Fault = SyntaxError::UnexpectedEof.into();
        assert_eq!(f.to_string(), "syntax error");

        let f: Fault = TypeError::Circularity.into();
        assert_eq!(f.to_string(), "type error");

        let f: Fault = RuntimeError::DivisionByZero.into();
        assert_eq!(f.to_string(), "runtime error");
    }

    #[test]
    fn inner_messages_carry_context() {
        let e = RuntimeError::EmptyList { op: "hd" };
        assert_eq!(e.to_string(), "hd of nil");

        let e = TypeError::Unbound("x".to_string());
        assert_eq!(e.to_string(), "variable `x` is not bound");
    }
}
