use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex as Regexp;
use serde::Serialize;

use crate::{ProfileError, Result};

pub const MODE_PREFIX: &str = "mode:";

pub const MODE_LINE_PATTERN: &str = "mode: <set|count|atomic>";

static MODE_LINE_RE: Lazy<Regexp> =
    Lazy::new(|| Regexp::new(r"^mode: (\S+)$").expect("mode line pattern is valid"));

/// How the instrumented binary recorded hits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageMode {
    Set,
    Count,
    Atomic,
}

impl CoverageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageMode::Set => "set",
            CoverageMode::Count => "count",
            CoverageMode::Atomic => "atomic",
        }
    }
}

impl fmt::Display for CoverageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoverageMode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "set" => Ok(CoverageMode::Set),
            "count" => Ok(CoverageMode::Count),
            "atomic" => Ok(CoverageMode::Atomic),
            _ => Err(()),
        }
    }
}

/// The `mode: <token>` header of a profile, kept verbatim so that later
/// headers can be compared against the exact text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeLine {
    text: String,
    mode: CoverageMode,
}

impl ModeLine {
    /// Whether a line has the `mode: <token>` shape and should go through
    /// [`ModeLine::parse`]. Records whose path merely starts with `mode:` do not.
    pub fn is_header(line: &str) -> bool {
        MODE_LINE_RE.is_match(line)
    }

    pub fn parse(line: &str, line_number: usize) -> Result<ModeLine> {
        let token = MODE_LINE_RE
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|token| token.as_str())
            .ok_or_else(|| ProfileError::MalformedRecord {
                line_number,
                line: line.to_string(),
                pattern: MODE_LINE_PATTERN,
            })?;

        let mode = token.parse().map_err(|_| ProfileError::UnknownMode {
            line_number,
            mode: token.to_string(),
        })?;

        Ok(ModeLine {
            text: line.to_string(),
            mode,
        })
    }

    pub fn mode(&self) -> CoverageMode {
        self.mode
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<CoverageMode> for ModeLine {
    fn from(mode: CoverageMode) -> Self {
        ModeLine {
            text: format!("{} {}", MODE_PREFIX, mode),
            mode,
        }
    }
}

impl fmt::Display for ModeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProfileErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_known_modes() {
        for (line, mode) in [
            ("mode: set", CoverageMode::Set),
            ("mode: count", CoverageMode::Count),
            ("mode: atomic", CoverageMode::Atomic),
        ] {
            let header = ModeLine::parse(line, 1).unwrap();
            assert_eq!(header.mode(), mode);
            assert_eq!(header.as_str(), line);
        }
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = ModeLine::parse("mode: sometimes", 1).unwrap_err();
        assert_eq!(err.kind(), ProfileErrorKind::UnknownMode);
    }

    #[test]
    fn rejects_header_without_token() {
        for line in ["mode:", "mode:count", "mode: count extra"] {
            let err = ModeLine::parse(line, 3).unwrap_err();
            assert_eq!(err.kind(), ProfileErrorKind::MalformedRecord);
        }
    }

    #[test]
    fn record_with_mode_prefixed_path_is_not_a_header() {
        assert!(ModeLine::is_header("mode: count"));
        assert!(!ModeLine::is_header("mode:x.go:1.1,2.2 3 5"));
        assert!(!ModeLine::is_header("mode: x.go:1.1,2.2 3 5"));
    }

    #[test]
    fn header_from_mode_matches_go_tool_output() {
        assert_eq!(ModeLine::from(CoverageMode::Atomic).as_str(), "mode: atomic");
    }
}
