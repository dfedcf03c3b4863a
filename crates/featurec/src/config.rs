use crate::emit::{EmitOptions, IncludePath};
use crate::error::format_context;
use chrono::{DateTime, Utc};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use strum_macros::Display;

/// Prefix of environment overrides, e.g. `FEATUREC__PROVENANCE__TIMESTAMP=omit`.
pub const ENV_PREFIX: &str = "FEATUREC";
/// Config file looked up (without extension) in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "featurec";
/// Reproducible-builds convention for a fixed generation time.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Generator settings. Every field has a default, so an empty config is valid.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub header: HeaderConfig,
    pub source: SourceConfig,
    pub provenance: ProvenanceConfig,
    pub log: LogConfig,
}

/// Guard header settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub guard: String,
    pub build_config: IncludePath,
    /// Hand-edited user configuration; empty disables the include.
    pub user_config: String,
}

/// Validation/reflection source settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub config_header: IncludePath,
    pub table: String,
    pub count: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    pub generator: String,
    pub timestamp: TimestampPolicy,
}

/// Whether and how the generation time appears in the banner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TimestampPolicy {
    /// Wall-clock time, unless `SOURCE_DATE_EPOCH` pins it.
    #[default]
    Now,
    /// Only `SOURCE_DATE_EPOCH`; omitted when unset.
    SourceDateEpoch,
    Omit,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, overridden by `FEATUREC_LOG`.
    pub level: String,
    /// Directory for an additional log file.
    pub dir: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Rotated log files kept in `dir`.
    pub max_files: usize,
}

/// How often the log file in [`LogConfig::dir`] is rotated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LogRotation {
    /// One file, appended to across runs.
    #[default]
    Never,
    Minutely,
    Hourly,
    Daily,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            guard: "FEATURECONFIG_HPP".to_owned(),
            build_config: IncludePath::parse("<cmake_config.hpp>"),
            user_config: "myconfig-final.hpp".to_owned(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            config_header: IncludePath::parse("config.hpp"),
            table: "FEATURES".to_owned(),
            count: "NUM_FEATURES".to_owned(),
        }
    }
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self { generator: "featurec".to_owned(), timestamp: TimestampPolicy::default() }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "warn".to_owned(), dir: None, rotation: LogRotation::Never, max_files: 5 }
    }
}

impl TimestampPolicy {
    /// Picks the banner time. `source_date_epoch` is the raw environment value.
    #[must_use]
    pub fn resolve(self, now: DateTime<Utc>, source_date_epoch: Option<&str>) -> Option<DateTime<Utc>> {
        let pinned = source_date_epoch
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        match self {
            Self::Now => Some(pinned.unwrap_or(now)),
            Self::SourceDateEpoch => pinned,
            Self::Omit => None,
        }
    }
}

impl GeneratorConfig {
    /// Emitter options for one run over the definitions file `definitions`.
    #[must_use]
    pub fn emit_options(&self, definitions: &str, timestamp: Option<DateTime<Utc>>) -> EmitOptions {
        let user_config = self.header.user_config.trim();
        EmitOptions {
            generator: self.provenance.generator.clone(),
            timestamp,
            definitions: definitions.to_owned(),
            guard: self.header.guard.clone(),
            build_config: self.header.build_config.clone(),
            user_config: (!user_config.is_empty()).then(|| IncludePath::parse(user_config)),
            config_header: self.source.config_header.clone(),
            table: self.source.table.clone(),
            count: self.source.count.clone(),
        }
    }
}

/// Loads [`GeneratorConfig`] from a file layered under environment overrides.
///
/// 1. **File**: `path` if given (must exist), otherwise an optional `featurec.{toml,json,...}`
///    in the working directory.
/// 2. **Environment**: variables prefixed with `FEATUREC__`, nested with `__`
///    (e.g. `FEATUREC__HEADER__GUARD` maps to `header.guard`).
///
/// # Errors
/// Returns [`ConfigError`] if an explicit file is missing or a value has the wrong shape.
pub fn load_config(path: Option<&Path>) -> Result<GeneratorConfig, ConfigError> {
    let file = path.map_or_else(
        || File::with_name(DEFAULT_CONFIG_FILE).required(false),
        |p| File::from(p).required(true),
    );

    let settings = Config::builder()
        .add_source(file)
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|source| ConfigError::Config {
            source,
            context: Some("Failed to build config".into()),
        })?;

    let config = settings.try_deserialize::<GeneratorConfig>().map_err(|source| {
        ConfigError::Config { source, context: Some("Failed to deserialize config".into()) }
    })?;

    tracing::debug!(?config, "Loaded generator config");
    Ok(config)
}
