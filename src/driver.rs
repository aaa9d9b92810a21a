//! File-system front end: resolve `.vm` inputs, translate, and persist the
//! `.asm` output only when the whole run succeeds.

use std::ffi::OsStr;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::TranslatorConfig;
use crate::error::{TranslateError, TranslateResult};
use crate::translator::Translator;

/// Inputs and destination for one translation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub units: Vec<PathBuf>,
    pub output: PathBuf,
}

fn is_vm_file(path: &Path) -> bool {
    path.is_file() && path.extension() == Some(OsStr::new("vm"))
}

/// The unit name is the file stem; it prefixes every static symbol.
pub fn unit_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Resolve `input` (a `.vm` file or a directory of them) into a job.
///
/// Directory units are sorted by file name. Without an explicit `output`, a
/// file `X.vm` becomes `X.asm` and a directory `D` becomes `D/D.asm`.
pub fn plan(input: &Path, output: Option<&Path>) -> TranslateResult<Job> {
    if input.is_dir() {
        let mut units: Vec<PathBuf> = fs::read_dir(input)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        units.retain(|path| is_vm_file(path));
        units.sort();
        if units.is_empty() {
            return Err(TranslateError::NoUnits(input.to_path_buf()));
        }

        let output = match output {
            Some(path) => path.to_path_buf(),
            None => {
                let dir_name = fs::canonicalize(input)?
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "out".to_string());
                input.join(format!("{}.asm", dir_name))
            }
        };
        Ok(Job { units, output })
    } else if is_vm_file(input) {
        Ok(Job {
            units: vec![input.to_path_buf()],
            output: output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| input.with_extension("asm")),
        })
    } else {
        Err(TranslateError::InvalidInput(input.to_path_buf()))
    }
}

/// Run a planned job. The output file is replaced atomically on success and
/// left untouched on failure.
pub fn run(job: &Job, config: TranslatorConfig) -> TranslateResult<()> {
    let dir = job
        .output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(dir)?;

    {
        let mut translator = Translator::new(BufWriter::new(temp.as_file()), config);
        translator.bootstrap()?;
        for path in &job.units {
            let source = fs::read_to_string(path)?;
            let name = unit_name(path);
            debug!(path = %path.display(), unit = %name, "reading unit");
            translator.translate_unit(&name, &source)?;
        }
        translator.finish()?;
    }

    temp.persist(&job.output).map_err(|err| err.error)?;
    Ok(())
}

/// Plan and run in one step, returning the output path.
pub fn translate_path(
    input: &Path,
    output: Option<&Path>,
    config: TranslatorConfig,
) -> TranslateResult<PathBuf> {
    let job = plan(input, output)?;
    run(&job, config)?;
    Ok(job.output)
}
