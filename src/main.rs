use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vmil::symbols::DEFAULT_ENTRY_POINT;
use vmil::{driver, TranslatorConfig};

/// Translate VM code (a .vm file or a directory of them) into Hack assembly.
#[derive(Debug, Parser)]
#[command(name = "vmil-translator", version)]
struct Cli {
    /// A .vm file or a directory containing .vm files
    input: PathBuf,

    /// Output .asm path (defaults next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the SP setup and entry-point call
    #[arg(long)]
    no_bootstrap: bool,

    /// Function the bootstrap calls
    #[arg(long, default_value = DEFAULT_ENTRY_POINT)]
    entry: String,

    /// Omit the VM commands echoed as comments
    #[arg(long)]
    bare: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = TranslatorConfig::default()
        .bootstrap(!cli.no_bootstrap)
        .entry_point(cli.entry)
        .annotate(!cli.bare);

    info!(input = %cli.input.display(), "translating");
    match driver::translate_path(&cli.input, cli.output.as_deref(), config) {
        Ok(output) => {
            info!(output = %output.display(), "wrote assembly");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
