use std::{
    fmt,
    io::{BufRead, Write},
};

use crate::{AggregationTable, CoverageMode, CoverageRecord, ModeLine, ProfileError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AggregatorState {
    NotStarted,
    HeaderRead,
    Accumulating,
    Finalized,
    Failed,
}

/// Streaming aggregator over the lines of a single profile.
///
/// Lines are fed one at a time; the first non-blank line must be a
/// `mode:` header, later headers must repeat it exactly, and every other
/// line is a record whose count is summed into its range. Any error moves
/// the aggregator into [`AggregatorState::Failed`] and the partial table is
/// never handed out.
#[derive(Debug)]
pub struct ProfileAggregator {
    state: AggregatorState,
    mode_line: Option<ModeLine>,
    table: AggregationTable,
    line_number: usize,
    records_read: usize,
    merged_duplicates: usize,
}

impl Default for ProfileAggregator {
    fn default() -> Self {
        ProfileAggregator::new()
    }
}

impl ProfileAggregator {
    pub fn new() -> ProfileAggregator {
        ProfileAggregator {
            state: AggregatorState::NotStarted,
            mode_line: None,
            table: Default::default(),
            line_number: 0,
            records_read: 0,
            merged_duplicates: 0,
        }
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        match self.state {
            AggregatorState::Finalized | AggregatorState::Failed => {
                return Err(ProfileError::Finished)
            }
            _ => {}
        }

        self.line_number += 1;
        let result = self.accept(line.strip_suffix('\r').unwrap_or(line));
        if result.is_err() {
            self.state = AggregatorState::Failed;
        }
        result
    }

    fn accept(&mut self, line: &str) -> Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        let line_number = self.line_number;

        if ModeLine::is_header(line) {
            if let Some(expected) = &self.mode_line {
                if expected.as_str() != line {
                    return Err(ProfileError::ModeMismatch {
                        expected: expected.to_string(),
                        found: line.to_string(),
                        line_number,
                    });
                }
                tracing::debug!(line_number, "Skipping repeated profile header");
                return Ok(());
            }

            let header = ModeLine::parse(line, line_number)?;
            tracing::debug!(line_number, mode = %header.mode(), "Read profile header");
            self.mode_line = Some(header);
            self.state = AggregatorState::HeaderRead;
            return Ok(());
        }

        if self.mode_line.is_none() {
            return Err(ProfileError::MissingHeader);
        }

        let record = CoverageRecord::parse(line, line_number)?;
        self.state = AggregatorState::Accumulating;
        self.records_read += 1;

        if self.table.add(record)? {
            self.merged_duplicates += 1;
            tracing::debug!(line_number, "Merged duplicate range");
        }

        Ok(())
    }

    /// Consumes the aggregator and yields the merged profile.
    pub fn finish(mut self) -> Result<MergedProfile> {
        match self.state {
            AggregatorState::Finalized | AggregatorState::Failed => Err(ProfileError::Finished),
            _ => {
                let mode_line = self.mode_line.take().ok_or(ProfileError::MissingHeader)?;
                self.state = AggregatorState::Finalized;

                Ok(MergedProfile {
                    mode_line,
                    table: std::mem::take(&mut self.table),
                    records_read: self.records_read,
                    merged_duplicates: self.merged_duplicates,
                })
            }
        }
    }
}

/// Result of aggregating one profile, ready to be serialized.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedProfile {
    mode_line: ModeLine,
    table: AggregationTable,
    records_read: usize,
    merged_duplicates: usize,
}

impl MergedProfile {
    pub fn mode(&self) -> CoverageMode {
        self.mode_line.mode()
    }

    pub fn mode_line(&self) -> &ModeLine {
        &self.mode_line
    }

    pub fn table(&self) -> &AggregationTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut AggregationTable {
        &mut self.table
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    pub fn merged_duplicates(&self) -> usize {
        self.merged_duplicates
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write!(writer, "{}", self)
    }
}

/// Renders the header followed by one `<rangeKey><count>` line per range.
impl fmt::Display for MergedProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.mode_line)?;
        for (key, count) in self.table.iter() {
            writeln!(f, "{}{}", key, count)?;
        }
        Ok(())
    }
}

/// Aggregates a whole profile from a buffered reader. A read error is
/// reported as [`ProfileError::InputUnavailable`] against `source_name`.
pub fn aggregate_reader<R: BufRead>(
    reader: R,
    source_name: impl AsRef<std::path::Path>,
) -> Result<MergedProfile> {
    let mut aggregator = ProfileAggregator::new();

    for line in reader.lines() {
        let line = line.map_err(|source| ProfileError::InputUnavailable {
            path: source_name.as_ref().to_path_buf(),
            source,
        })?;
        aggregator.feed_line(&line)?;
    }

    aggregator.finish()
}

pub fn aggregate_str(input: &str) -> Result<MergedProfile> {
    aggregate_reader(input.as_bytes(), "<memory>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, ProfileErrorKind, RangeKey};
    use pretty_assertions::assert_eq;

    fn lines(profile: &MergedProfile) -> Vec<String> {
        profile
            .to_string()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn merges_duplicate_ranges() {
        let merged = aggregate_str(
            "mode: count\na.go:1.1,2.2 3 5\na.go:1.1,2.2 3 7\nb.go:4.4,5.5 1 2\n",
        )
        .unwrap();

        assert_eq!(
            lines(&merged),
            vec!["mode: count", "a.go:1.1,2.2 3 12", "b.go:4.4,5.5 1 2"]
        );
        assert_eq!(merged.records_read(), 3);
        assert_eq!(merged.merged_duplicates(), 1);
        assert_eq!(merged.mode(), CoverageMode::Count);
    }

    #[test]
    fn count_matching_other_fields_does_not_truncate_key() {
        let merged = aggregate_str("mode: set\na.go:12.1,12.5 12 12\na.go:12.1,12.5 12 3\n").unwrap();

        assert_eq!(lines(&merged), vec!["mode: set", "a.go:12.1,12.5 12 15"]);
    }

    #[test]
    fn keys_compare_byte_for_byte() {
        let merged = aggregate_str("mode: count\na.go:01.1,2.2 3 5\na.go:1.1,2.2 3 7\n").unwrap();

        assert_eq!(
            lines(&merged),
            vec!["mode: count", "a.go:01.1,2.2 3 5", "a.go:1.1,2.2 3 7"]
        );
        assert_eq!(merged.merged_duplicates(), 0);
    }

    #[test]
    fn positions_wider_than_u32_are_merged() {
        let merged = aggregate_str(
            "mode: count\na.go:4294967296.1,4294967297.2 3 5\na.go:4294967296.1,4294967297.2 3 1\n",
        )
        .unwrap();

        assert_eq!(
            lines(&merged),
            vec!["mode: count", "a.go:4294967296.1,4294967297.2 3 6"]
        );
    }

    #[test]
    fn path_starting_with_mode_is_a_record() {
        let merged = aggregate_str("mode: count\nmode:x.go:1.1,2.2 3 5\nmode:x.go:1.1,2.2 3 2\n").unwrap();

        assert_eq!(lines(&merged), vec!["mode: count", "mode:x.go:1.1,2.2 3 7"]);
        assert_eq!(merged.records_read(), 2);
    }

    #[test]
    fn write_to_matches_display() {
        let merged = aggregate_str("mode: set\na.go:1.1,2.2 3 1\n").unwrap();
        let mut buf = Vec::new();
        merged.write_to(&mut buf).unwrap();

        assert_eq!(String::from_utf8(buf).unwrap(), merged.to_string());
    }

    #[test]
    fn distinct_ranges_round_trip() {
        let input = "mode: atomic\nx.go:1.2,3.4 1 0\nx.go:5.6,7.8 2 9\ny.go:1.2,3.4 1 4\n";
        let merged = aggregate_str(input).unwrap();

        assert_eq!(merged.to_string(), input);
    }

    #[test]
    fn skips_blank_lines_and_carriage_returns() {
        let merged = aggregate_str("\n  \r\nmode: count\r\na.go:1.1,2.2 3 5\r\n\r\na.go:1.1,2.2 3 1\r\n").unwrap();

        assert_eq!(lines(&merged), vec!["mode: count", "a.go:1.1,2.2 3 6"]);
    }

    #[test]
    fn repeated_identical_header_is_accepted() {
        let merged = aggregate_str("mode: count\na.go:1.1,2.2 3 5\nmode: count\na.go:1.1,2.2 3 1\n").unwrap();

        assert_eq!(lines(&merged), vec!["mode: count", "a.go:1.1,2.2 3 6"]);
    }

    #[test]
    fn differing_header_is_a_mode_mismatch() {
        let err = aggregate_str("mode: count\na.go:1.1,2.2 3 5\nmode: set\n").unwrap_err();

        assert_eq!(err.kind(), ProfileErrorKind::ModeMismatch);
        match err {
            ProfileError::ModeMismatch {
                expected,
                found,
                line_number,
            } => {
                assert_eq!(expected, "mode: count");
                assert_eq!(found, "mode: set");
                assert_eq!(line_number, 3);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn record_before_header_is_rejected() {
        let err = aggregate_str("a.go:1.1,2.2 3 5\nmode: count\n").unwrap_err();
        assert_eq!(err.kind(), ProfileErrorKind::MissingHeader);
    }

    #[test]
    fn empty_input_has_no_header() {
        for input in ["", "\n\n"] {
            let err = aggregate_str(input).unwrap_err();
            assert_eq!(err.kind(), ProfileErrorKind::MissingHeader);
        }
    }

    #[test]
    fn header_only_profile_is_valid() {
        let merged = aggregate_str("mode: set\n").unwrap();

        assert_eq!(merged.to_string(), "mode: set\n");
        assert!(merged.table().is_empty());
    }

    #[test]
    fn malformed_line_fails_whole_run() {
        let err = aggregate_str("mode: count\na.go:1.1,2.2 3 5\nnot a record\n").unwrap_err();

        match err {
            ProfileError::MalformedRecord {
                line_number, line, ..
            } => {
                assert_eq!(line_number, 3);
                assert_eq!(line, "not a record");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn failed_aggregator_refuses_more_input() {
        let mut aggregator = ProfileAggregator::new();
        aggregator.feed_line("mode: count").unwrap();
        assert_eq!(aggregator.state(), AggregatorState::HeaderRead);

        aggregator.feed_line("a.go:1.1,2.2 3 5").unwrap();
        assert_eq!(aggregator.state(), AggregatorState::Accumulating);

        assert!(aggregator.feed_line("bogus").is_err());
        assert_eq!(aggregator.state(), AggregatorState::Failed);

        let err = aggregator.feed_line("a.go:1.1,2.2 3 5").unwrap_err();
        assert_eq!(err.kind(), ProfileErrorKind::Finished);
        assert_eq!(aggregator.finish().unwrap_err().kind(), ProfileErrorKind::Finished);
    }

    #[test]
    fn table_can_be_sorted_before_writing() {
        let mut merged = aggregate_str("mode: set\nb.go:1.1,1.2 1 1\na.go:1.1,1.2 1 0\n").unwrap();
        merged.table_mut().sort_by_key();

        assert_eq!(
            lines(&merged),
            vec!["mode: set", "a.go:1.1,1.2 1 0", "b.go:1.1,1.2 1 1"]
        );
        assert_eq!(
            merged
                .table()
                .get(&RangeKey::new("b.go", Position::new(1, 1), Position::new(1, 2), 1)),
            Some(1)
        );
    }
}
