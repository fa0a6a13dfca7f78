use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT: &str = "agg_cov.cov";

/// Environment variable holding the log configuration, either a bare level
/// (`debug`) or a JSON object (`{"level":"debug","enableTrace":true}`).
pub const LOG_ENV: &str = "GOCOV_AGGREGATE_LOG";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogOptions {
    pub level: Option<String>,
    pub enable_trace: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        LogOptions {
            level: None,
            enable_trace: false,
        }
    }
}

impl LogOptions {
    /// Resolves the configured level. An unrecognised level is reported on
    /// stderr and leaves logging disabled.
    pub fn max_level(&self) -> Option<tracing::Level> {
        match self.level.as_deref() {
            Some("error") => Some(tracing::Level::ERROR),
            Some("debug") => Some(tracing::Level::DEBUG),
            Some("info") => Some(tracing::Level::INFO),
            Some("warn") => Some(tracing::Level::WARN),
            Some("trace") => Some(tracing::Level::TRACE),
            Some(other) => {
                eprintln!(
                    "Unknown log level '{}' in {}, expected one of error, warn, info, debug, trace; logging stays disabled",
                    other, LOG_ENV
                );
                None
            }
            None => None,
        }
    }

    pub fn from_env() -> LogOptions {
        match std::env::var(LOG_ENV) {
            Ok(value) => LogOptions::parse(&value),
            Err(_) => Default::default(),
        }
    }

    pub fn parse(value: &str) -> LogOptions {
        let value = value.trim();
        if value.is_empty() {
            return Default::default();
        }

        if value.starts_with('{') {
            serde_json::from_str(value).unwrap_or_else(|f| {
                eprintln!("Could not deserialize {}, logging stays disabled", LOG_ENV);
                eprintln!("{:#?}", f);
                Default::default()
            })
        } else {
            LogOptions {
                level: Some(value.to_ascii_lowercase()),
                enable_trace: false,
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateOptions {
    pub file: PathBuf,
    pub output: PathBuf,
    pub log: LogOptions,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            file: Default::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            log: Default::default(),
        }
    }
}
