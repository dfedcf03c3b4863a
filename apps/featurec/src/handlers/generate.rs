use crate::models::args::Cli;
use crate::services::provenance;
use anyhow::{Context, Result};
use featurec::config::{GeneratorConfig, LogRotation, load_config};
use featurec::output::{Output, StagedOutputs};
use featurec::{emit, engine, parser};
use featurec_logger::{LevelFilter, Logger, Rotation};
use std::fs;

/// Runs one generation: read, validate, render, then stage both artifacts and
/// move them into place together.
///
/// # Errors
/// Returns an error if the config is invalid, the definitions cannot be read or
/// contain errors, or an output cannot be written.
pub(crate) fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let _logger = init_logger(&config, cli.verbose)?;

    println!("Reading definitions from {}...", cli.definitions.display());
    let text = fs::read_to_string(&cli.definitions)
        .with_context(|| format!("Failed to read {}", cli.definitions.display()))?;
    let rules = parser::parse(&text)?;
    let validated = engine::validate(rules)?;
    println!("Done.");

    let options = config.emit_options(
        &provenance::definitions_name(&cli.definitions),
        provenance::timestamp(config.provenance.timestamp),
    );
    let artifacts = emit::plan(&validated, &options).render()?;

    let mut staged = StagedOutputs::new();
    for (path, contents) in [(&cli.header, &artifacts.header), (&cli.source, &artifacts.source)] {
        println!("Writing {}...", path.display());
        staged.stage(Output { path, contents })?;
        println!("Done.");
    }
    staged.commit()?;

    Ok(())
}

fn init_logger(config: &GeneratorConfig, verbose: u8) -> Result<Logger> {
    let mut builder = Logger::builder(env!("CARGO_BIN_NAME"));
    builder = match verbose {
        0 => builder.env_filter(config.log.level.as_str()),
        1 => builder.level(LevelFilter::INFO),
        2 => builder.level(LevelFilter::DEBUG),
        _ => builder.level(LevelFilter::TRACE),
    };
    if let Some(dir) = &config.log.dir {
        builder = builder
            .directory(dir)
            .rotation(rotation(config.log.rotation))
            .max_files(config.log.max_files);
    }
    Ok(builder.init()?)
}

const fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
    }
}
