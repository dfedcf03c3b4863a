//! # CLI Argument Definitions

use clap::Parser;
use std::path::PathBuf;

/// Compiles a feature definitions file into a guard header and a validation source.
#[derive(Debug, Parser)]
#[command(name = "featurec")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile feature definitions into preprocessor guard code")]
pub(crate) struct Cli {
    /// Feature definitions file to read
    #[arg(value_name = "SPECFILE")]
    pub(crate) definitions: PathBuf,
    /// Guard header to write
    #[arg(value_name = "HEADERFILE")]
    pub(crate) header: PathBuf,
    /// Validation/reflection source to write
    #[arg(value_name = "SOURCEFILE")]
    pub(crate) source: PathBuf,
    /// Generator config file (defaults to an optional `featurec.toml` in the working directory)
    #[arg(short, long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,
}
