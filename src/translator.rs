use std::collections::HashSet;
use std::io::Write;

use tracing::{debug, trace};

use crate::codegen::CodeGenerator;
use crate::config::TranslatorConfig;
use crate::error::{TranslateError, TranslateResult};
use crate::parser::{self, Parser};

/// One input unit: a name for its statics plus its VM source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: String,
    pub source: String,
}

impl Unit {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Unit {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Streams translated units into a single assembly sink.
///
/// The bootstrap (when enabled) is written once, ahead of the first unit.
/// All units share one generator so labels stay unique across the program.
pub struct Translator<W: Write> {
    out: W,
    generator: CodeGenerator,
    config: TranslatorConfig,
    bootstrapped: bool,
    units: HashSet<String>,
}

impl<W: Write> Translator<W> {
    pub fn new(out: W, config: TranslatorConfig) -> Self {
        let generator = CodeGenerator::new("").annotated(config.annotate);
        Translator {
            out,
            generator,
            config,
            bootstrapped: false,
            units: HashSet::new(),
        }
    }

    fn write_block(&mut self, block: &[String]) -> TranslateResult<()> {
        for line in block {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    /// Emit the bootstrap if it is enabled and has not been written yet.
    pub fn bootstrap(&mut self) -> TranslateResult<()> {
        if self.bootstrapped || !self.config.bootstrap {
            return Ok(());
        }
        if !parser::is_symbol(&self.config.entry_point) {
            return Err(TranslateError::InvalidEntryPoint(
                self.config.entry_point.clone(),
            ));
        }

        let entry_point = self.config.entry_point.clone();
        let block = self.generator.bootstrap(&entry_point);
        self.write_block(&block)?;
        self.bootstrapped = true;
        debug!(entry_point = %entry_point, "wrote bootstrap");
        Ok(())
    }

    /// Translate one unit, writing each command's block as soon as it is lowered.
    /// Returns the number of commands translated.
    ///
    /// The unit name prefixes static symbols, so it must be a valid symbol and
    /// unique within this translator.
    pub fn translate_unit(&mut self, unit: &str, source: &str) -> TranslateResult<usize> {
        if !parser::is_symbol(unit) {
            return Err(TranslateError::InvalidUnitName(unit.to_string()));
        }
        if !self.units.insert(unit.to_string()) {
            return Err(TranslateError::DuplicateUnit(unit.to_string()));
        }
        self.bootstrap()?;
        self.generator.set_unit(unit);
        if self.config.annotate {
            writeln!(self.out, "// unit {}", unit)?;
        }

        let mut count = 0;
        for parsed in Parser::new(source).commands() {
            let parsed = parsed.map_err(|source| TranslateError::Parse {
                unit: unit.to_string(),
                source,
            })?;
            trace!(unit, line = parsed.line, command = %parsed.command, "lowering");

            let block = self
                .generator
                .generate(&parsed.command)
                .map_err(|source| TranslateError::Generate {
                    unit: unit.to_string(),
                    line: parsed.line,
                    source,
                })?;
            self.write_block(&block)?;
            count += 1;
        }

        debug!(unit, commands = count, "translated unit");
        Ok(count)
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> TranslateResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Translate `units` in order into one assembly program.
pub fn translate_units(units: &[Unit], config: TranslatorConfig) -> TranslateResult<String> {
    let mut translator = Translator::new(Vec::new(), config);
    translator.bootstrap()?;
    for unit in units {
        translator.translate_unit(&unit.name, &unit.source)?;
    }
    let buf = translator.finish()?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
