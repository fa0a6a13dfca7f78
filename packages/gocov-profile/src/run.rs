use std::{
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::{aggregate_reader, CoverageMode, MergedProfile, ProfileError, Result};

/// Outcome of a successful [`aggregate_file`] run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub mode: CoverageMode,
    pub records_read: usize,
    pub distinct_ranges: usize,
    pub merged_duplicates: usize,
    pub output: PathBuf,
}

impl fmt::Display for AggregateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done writing aggregated coverage results to: {} ({} records, {} ranges, mode: {})",
            self.output.display(),
            self.records_read,
            self.distinct_ranges,
            self.mode
        )
    }
}

/// Reads the profile at `input`, merges duplicate ranges and writes the
/// result to `output`. The output is only replaced once the whole profile
/// has been aggregated and written.
#[tracing::instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn aggregate_file(input: &Path, output: &Path) -> Result<AggregateSummary> {
    let file = File::open(input).map_err(|source| ProfileError::InputUnavailable {
        path: input.to_path_buf(),
        source,
    })?;

    let merged = aggregate_reader(BufReader::new(file), input)?;
    write_profile(&merged, output)?;

    let summary = AggregateSummary {
        mode: merged.mode(),
        records_read: merged.records_read(),
        distinct_ranges: merged.table().len(),
        merged_duplicates: merged.merged_duplicates(),
        output: output.to_path_buf(),
    };

    tracing::info!(
        records_read = summary.records_read,
        distinct_ranges = summary.distinct_ranges,
        merged_duplicates = summary.merged_duplicates,
        "Aggregated coverage profile"
    );

    Ok(summary)
}

/// Writes `profile` to a temporary file beside `output`, then renames it
/// into place.
pub fn write_profile(profile: &MergedProfile, output: &Path) -> Result<()> {
    let unavailable = |source: io::Error| ProfileError::OutputUnavailable {
        path: output.to_path_buf(),
        source,
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(unavailable)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        profile.write_to(&mut writer).map_err(unavailable)?;
        writer.flush().map_err(unavailable)?;
    }

    temp.persist(output).map_err(|err| {
        tracing::warn!(error = %err.error, "Discarding temporary output");
        unavailable(err.error)
    })?;

    Ok(())
}
