use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex as Regexp;

use crate::{Position, ProfileError, RangeKey, Result};

pub const RECORD_PATTERN: &str =
    "<path>:<startLine>.<startCol>,<endLine>.<endCol> <numStatements> <count>";

/// Record grammar of the go cover profile,
/// e.g. `encoding/base64/base64.go:34.44,37.40 3 1`.
/// Path is greedy so that paths containing `:` still bind to the last match.
static RECORD_RE: Lazy<Regexp> = Lazy::new(|| {
    Regexp::new(r"^(.+):([0-9]+)\.([0-9]+),([0-9]+)\.([0-9]+) ([0-9]+) ([0-9]+)$")
        .expect("record pattern is valid")
});

/// A single block line of a profile: the range it covers and its hit count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageRecord {
    pub key: RangeKey,
    pub count: i64,
}

impl CoverageRecord {
    pub fn new(key: RangeKey, count: i64) -> CoverageRecord {
        CoverageRecord { key, count }
    }

    /// Parses a record line into its fields. The range key is rebuilt from
    /// the captured fields, keeping their digits verbatim, rather than by
    /// cutting the count off the raw text.
    pub fn parse(line: &str, line_number: usize) -> Result<CoverageRecord> {
        let malformed = || ProfileError::MalformedRecord {
            line_number,
            line: line.to_string(),
            pattern: RECORD_PATTERN,
        };

        let captures = RECORD_RE.captures(line).ok_or_else(malformed)?;

        let key = RangeKey::from_parts(
            &captures[1],
            Position::from_digits(&captures[2], &captures[3]),
            Position::from_digits(&captures[4], &captures[5]),
            &captures[6],
        );

        let count = captures[7]
            .parse::<i64>()
            .map_err(|source| ProfileError::CountParseFailure {
                line_number,
                line: line.to_string(),
                source,
            })?;

        Ok(CoverageRecord { key, count })
    }
}

impl fmt::Display for CoverageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.key, self.count)
    }
}
