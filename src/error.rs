use thiserror::Error;

/// The stage of the pipeline an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Runtime,
}

/// Every error the lexer, parser and interpreter can produce. All of them are
/// fatal for the program being run, the caller decides what to do next.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum JiffyError {
    #[error("Line {line}: Illegal format for a number '{literal}'")]
    MalformedNumber { literal: String, line: usize },

    #[error("Line {line}: Unterminated string literal")]
    UnterminatedText { line: usize },

    #[error("Line {line}: Unexpected character '{character}'")]
    UnexpectedCharacter { character: char, line: usize },

    #[error("Line {line}: Expected a {expected}. Got {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Line {line}: Unexpected text in the program")]
    TrailingInput { line: usize },

    #[error("Line {line}: Malformed assignment statement")]
    MalformedAssignment { line: usize },

    #[error("Line {line}: Expected a number, identifier, string literal, or a parenthesis. Got {found}")]
    ExpectedOperand { found: String, line: usize },

    #[error("Line {line}: Undefined variable '{name}'")]
    UndefinedVariable { name: String, line: usize },

    #[error("Line {line}: Undefined function '{name}'")]
    UndefinedFunction { name: String, line: usize },

    #[error("Line {line}: Mismatched parameters for {name}: expected {expected}, got {found}")]
    ParameterCount {
        name: String,
        expected: usize,
        found: usize,
        line: usize,
    },

    #[error("Line {line}: Operand '{operand}' of '{operator}' is not a number")]
    NonNumericOperand {
        operator: String,
        operand: String,
        line: usize,
    },

    #[error("Line {line}: No input left for read({name})")]
    InputExhausted { name: String, line: usize },

    #[error("Program has no 'main' function")]
    MissingMain,

    #[error("Line {line}: {message}")]
    Io { message: String, line: usize },
}

impl JiffyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedNumber { .. }
            | Self::UnterminatedText { .. }
            | Self::UnexpectedCharacter { .. } => ErrorKind::Lexical,

            Self::UnexpectedToken { .. }
            | Self::TrailingInput { .. }
            | Self::MalformedAssignment { .. }
            | Self::ExpectedOperand { .. } => ErrorKind::Syntax,

            Self::UndefinedVariable { .. }
            | Self::UndefinedFunction { .. }
            | Self::ParameterCount { .. }
            | Self::NonNumericOperand { .. }
            | Self::InputExhausted { .. }
            | Self::MissingMain
            | Self::Io { .. } => ErrorKind::Runtime,
        }
    }

    /// The source line the error was detected on, when one is known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedNumber { line, .. }
            | Self::UnterminatedText { line }
            | Self::UnexpectedCharacter { line, .. }
            | Self::UnexpectedToken { line, .. }
            | Self::TrailingInput { line }
            | Self::MalformedAssignment { line }
            | Self::ExpectedOperand { line, .. }
            | Self::UndefinedVariable { line, .. }
            | Self::UndefinedFunction { line, .. }
            | Self::ParameterCount { line, .. }
            | Self::NonNumericOperand { line, .. }
            | Self::InputExhausted { line, .. }
            | Self::Io { line, .. } => Some(*line),
            Self::MissingMain => None,
        }
    }

    /// The variant name, used by the fixture harness to compare failures.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MalformedNumber { .. } => "MalformedNumber",
            Self::UnterminatedText { .. } => "UnterminatedText",
            Self::UnexpectedCharacter { .. } => "UnexpectedCharacter",
            Self::UnexpectedToken { .. } => "UnexpectedToken",
            Self::TrailingInput { .. } => "TrailingInput",
            Self::MalformedAssignment { .. } => "MalformedAssignment",
            Self::ExpectedOperand { .. } => "ExpectedOperand",
            Self::UndefinedVariable { .. } => "UndefinedVariable",
            Self::UndefinedFunction { .. } => "UndefinedFunction",
            Self::ParameterCount { .. } => "ParameterCount",
            Self::NonNumericOperand { .. } => "NonNumericOperand",
            Self::InputExhausted { .. } => "InputExhausted",
            Self::MissingMain => "MissingMain",
            Self::Io { .. } => "Io",
        }
    }
}

pub type LexResult<T> = Result<T, JiffyError>;
pub type ParseResult<T> = Result<T, JiffyError>;
pub type EvaluationResult<T> = Result<T, JiffyError>;
