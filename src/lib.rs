//! Translator from the stack-based VM language to Hack assembly.
//!
//! - `parser` turns source lines into [`ast::Command`]s, lazily.
//! - `codegen` lowers one command at a time, threading [`codegen::GeneratorState`].
//! - `translator` sequences units behind a single bootstrap into one sink.
//! - `driver` maps files and directories onto a translation run.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod driver;
pub mod error;
pub mod parser;
pub mod symbols;
pub mod translator;

pub use config::TranslatorConfig;
pub use error::{GenerationError, ParseError, TranslateError, TranslateResult};
pub use translator::{translate_units, Translator, Unit};
