use std::{ffi::OsString, path::PathBuf};

use clap::{builder::NonEmptyStringValueParser, Parser};
use gocov_profile::{aggregate_file, AggregateSummary, ProfileError};
use tracing_subscriber::fmt::format::FmtSpan;

mod options;
pub use options::*;

/// Merge duplicate blocks of a go cover profile by summing their counts.
#[derive(Debug, Parser)]
#[command(name = "gocov-aggregate", version, about)]
pub struct Cli {
    /// Full path for the file to be parsed
    #[arg(long, value_name = "PATH", value_parser = NonEmptyStringValueParser::new())]
    pub file: String,

    /// Output file for aggregation results
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub output: String,
}

impl Cli {
    pub fn into_options(self, log: LogOptions) -> AggregateOptions {
        AggregateOptions {
            file: PathBuf::from(self.file),
            output: PathBuf::from(self.output),
            log,
        }
    }
}

const GO_STYLE_FLAGS: &[&str] = &["file", "output", "help", "version"];

/// Rewrites go `flag` style arguments (`-file x`, `-output=y`) into the
/// double dash form clap expects. Everything after `--` is left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;

    args.into_iter()
        .enumerate()
        .map(|(index, arg)| {
            if index == 0 || passthrough {
                return arg;
            }

            let text = match arg.to_str() {
                Some(text) => text,
                None => return arg,
            };

            if text == "--" {
                passthrough = true;
                return arg;
            }

            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split('=').next().unwrap_or(rest);
                    if GO_STYLE_FLAGS.contains(&name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

pub fn initialize_log(log_options: &LogOptions) {
    if let Some(log_level) = log_options.max_level() {
        let builder = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr);

        let builder = if log_options.enable_trace {
            builder.with_span_events(FmtSpan::ENTER | FmtSpan::CLOSE)
        } else {
            builder
        };

        // A subscriber may already be installed when embedded; keep it.
        let _ = builder
            .with_ansi(false)
            .event_format(tracing_subscriber::fmt::format().pretty())
            .try_init();
    }
}

pub fn run(options: &AggregateOptions) -> Result<AggregateSummary, ProfileError> {
    initialize_log(&options.log);

    tracing::info!(file = %options.file.display(), "Going to parse file");
    aggregate_file(&options.file, &options.output)
}
