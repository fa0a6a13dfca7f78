use std::{io, num::ParseIntError, path::PathBuf};

use thiserror::Error;

/// Errors raised while aggregating a coverage profile. Every variant aborts
/// the run; nothing is written when one is returned.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read input profile '{}': {source}", .path.display())]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("profile has no leading `mode:` header")]
    MissingHeader,

    #[error("line {line_number}: unsupported coverage mode '{mode}', expected one of set, count, atomic")]
    UnknownMode { line_number: usize, mode: String },

    #[error("line {line_number}: cannot aggregate coverage in different modes '{expected}' and '{found}'")]
    ModeMismatch {
        expected: String,
        found: String,
        line_number: usize,
    },

    #[error("line {line_number}: '{line}' doesn't match expected format {pattern}")]
    MalformedRecord {
        line_number: usize,
        line: String,
        pattern: &'static str,
    },

    #[error("line {line_number}: failed parsing count of '{line}': {source}")]
    CountParseFailure {
        line_number: usize,
        line: String,
        #[source]
        source: ParseIntError,
    },

    #[error("count for '{key}' overflows: {accumulated} + {addend}")]
    CountOverflow {
        key: String,
        accumulated: i64,
        addend: i64,
    },

    #[error("failed to write output profile '{}': {source}", .path.display())]
    OutputUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("aggregator already finished")]
    Finished,
}

/// Fieldless discriminant of [`ProfileError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProfileErrorKind {
    InputUnavailable,
    MissingHeader,
    UnknownMode,
    ModeMismatch,
    MalformedRecord,
    CountParseFailure,
    CountOverflow,
    OutputUnavailable,
    Finished,
}

impl ProfileError {
    pub fn kind(&self) -> ProfileErrorKind {
        match self {
            ProfileError::InputUnavailable { .. } => ProfileErrorKind::InputUnavailable,
            ProfileError::MissingHeader => ProfileErrorKind::MissingHeader,
            ProfileError::UnknownMode { .. } => ProfileErrorKind::UnknownMode,
            ProfileError::ModeMismatch { .. } => ProfileErrorKind::ModeMismatch,
            ProfileError::MalformedRecord { .. } => ProfileErrorKind::MalformedRecord,
            ProfileError::CountParseFailure { .. } => ProfileErrorKind::CountParseFailure,
            ProfileError::CountOverflow { .. } => ProfileErrorKind::CountOverflow,
            ProfileError::OutputUnavailable { .. } => ProfileErrorKind::OutputUnavailable,
            ProfileError::Finished => ProfileErrorKind::Finished,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProfileError>;
