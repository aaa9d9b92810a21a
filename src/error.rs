//! Error types for parsing, code generation and the translation driver.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ast::Segment;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: malformed command '{text}': {reason}")]
    MalformedCommand {
        line: usize,
        text: String,
        reason: &'static str,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedCommand { line, .. } => *line,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("cannot pop into the constant segment")]
    PopConstant,
    #[error("index {index} is out of range for segment {segment}")]
    InvalidIndex { segment: Segment, index: u16 },
    #[error("constant {0} does not fit in a 15-bit immediate")]
    ConstantOutOfRange(u16),
    #[error("call with {0} arguments exceeds the addressable frame size")]
    TooManyArguments(u16),
    #[error("label '{0}' used outside of any function")]
    LabelOutsideFunction(String),
    #[error("'{0}' is reserved for generated labels")]
    ReservedSymbol(String),
    #[error("function '{0}' returns with nothing on its stack")]
    ReturnWithoutValue(String),
}

pub type TranslateResult<T> = Result<T, TranslateError>;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("{unit}: {source}")]
    Parse {
        unit: String,
        #[source]
        source: ParseError,
    },
    #[error("{unit}: line {line}: {source}")]
    Generate {
        unit: String,
        line: usize,
        #[source]
        source: GenerationError,
    },
    #[error("'{0}' is not a valid entry point name")]
    InvalidEntryPoint(String),
    #[error("'{0}' is not a valid unit name")]
    InvalidUnitName(String),
    #[error("unit '{0}' appears more than once")]
    DuplicateUnit(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("no .vm files found in {}", .0.display())]
    NoUnits(PathBuf),
    #[error("not a .vm file or directory: {}", .0.display())]
    InvalidInput(PathBuf),
}
