use std::fmt;

/// The pipeline stage that produced an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scan,
    Parse,
    Runtime,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan => write!(f, "scan"),
            Self::Parse => write!(f, "parse"),
            Self::Runtime => write!(f, "runtime"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("Unterminated string.")]
    UnterminatedString,
    #[error("Unexpected character '{0}'.")]
    UnexpectedCharacter(char),
    #[error("Invalid number literal '{0}'.")]
    InvalidNumber(String),

    #[error("{0}")]
    UnexpectedToken(String),
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
    #[error("Can't have more than {0} arguments.")]
    TooManyArguments(usize),
    #[error("Can't return from top-level code.")]
    ReturnOutsideFunction,
    #[error("Nesting is deeper than {0} levels.")]
    TooDeeplyNested(usize),

    #[error("Operand of '{0}' must be a number.")]
    OperandMustBeNumber(&'static str),
    #[error("Operands of '{0}' must be numbers.")]
    OperandsMustBeNumbers(&'static str),
    #[error("Operands of '+' must be two numbers or two strings.")]
    InvalidAddOperands,
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Can only call functions, not {0}.")]
    NotCallable(&'static str),
    #[error("Expected {expected} arguments but got {found}.")]
    ArityMismatch { expected: usize, found: usize },
    #[error("Maximum call depth of {0} exceeded.")]
    StackOverflow(usize),
    #[error("Native function '{name}' failed: {message}")]
    NativeFailure { name: String, message: String },
    #[error("Failed to write output: {0}")]
    Output(String),
}

impl ErrorKind {
    pub fn phase(&self) -> Phase {
        match self {
            Self::UnterminatedString | Self::UnexpectedCharacter(_) | Self::InvalidNumber(_) => {
                Phase::Scan
            }
            Self::UnexpectedToken(_)
            | Self::InvalidAssignmentTarget
            | Self::TooManyArguments(_)
            | Self::ReturnOutsideFunction
            | Self::TooDeeplyNested(_) => Phase::Parse,
            _ => Phase::Runtime,
        }
    }
}

/// A diagnostic carrying everything needed to reproduce a failure from the
/// report alone.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("[line {line}] {phase} error{location}: {kind}", phase = .kind.phase(), location = location(.context))]
pub struct Error {
    pub kind: ErrorKind,
    pub line: usize,
    /// Lexical context, e.g. `at ';'` or `at end`.
    pub context: Option<String>,
}

fn location(context: &Option<String>) -> String {
    match context {
        Some(context) => format!(" {context}"),
        None => String::new(),
    }
}

impl Error {
    pub fn new(kind: ErrorKind, line: usize) -> Self {
        Self {
            kind,
            line,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn phase(&self) -> Phase {
        self.kind.phase()
    }
}

pub type PResult<T> = Result<T, Error>;

#[cfg(test)]
mod test {
    use super::{Error, ErrorKind, Phase};

    #[test]
    fn display_parse_error_with_context() {
        let err = Error::new(ErrorKind::UnexpectedToken("Expect ';' after value.".into()), 3)
            .with_context("at end");

        assert_eq!(err.phase(), Phase::Parse);
        assert_eq!(
            err.to_string(),
            "[line 3] parse error at end: Expect ';' after value."
        );
    }

    #[test]
    fn display_runtime_error() {
        let err = Error::new(
            ErrorKind::ArityMismatch {
                expected: 2,
                found: 1,
            },
            7,
        );

        assert_eq!(
            err.to_string(),
            "[line 7] runtime error: Expected 2 arguments but got 1."
        );
    }
}
