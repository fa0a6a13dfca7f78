use std::fmt;

/// A non-negative decimal field of a record, kept exactly as written so that
/// keys compare byte for byte (`01` and `1` stay distinct) and values of any
/// width survive a round trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    /// Wraps digits already validated by the record grammar.
    pub(crate) fn from_digits(digits: &str) -> Decimal {
        Decimal(digits.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Decimal(value.to_string())
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: Decimal,
    pub column: Decimal,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Position {
        Position {
            line: line.into(),
            column: column.into(),
        }
    }

    pub(crate) fn from_digits(line: &str, column: &str) -> Position {
        Position {
            line: Decimal::from_digits(line),
            column: Decimal::from_digits(column),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.line, self.column)
    }
}

/// Identity of a single instrumented block: everything on a profile record
/// line except the trailing hit count.
///
/// The textual form is `path:line.col,line.col statements ` and keeps the
/// trailing space, so appending a count yields a complete record line.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RangeKey {
    pub path: String,
    pub start: Position,
    pub end: Position,
    pub num_statements: Decimal,
}

impl RangeKey {
    pub fn new(
        path: impl Into<String>,
        start: Position,
        end: Position,
        num_statements: u32,
    ) -> RangeKey {
        RangeKey {
            path: path.into(),
            start,
            end,
            num_statements: num_statements.into(),
        }
    }

    pub(crate) fn from_parts(
        path: &str,
        start: Position,
        end: Position,
        num_statements: &str,
    ) -> RangeKey {
        RangeKey {
            path: path.to_string(),
            start,
            end,
            num_statements: Decimal::from_digits(num_statements),
        }
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{} {} ",
            self.path, self.start, self.end, self.num_statements
        )
    }
}
