//! Parsing and aggregation of go cover profiles.
//!
//! A profile is a `mode: <set|count|atomic>` header followed by one record
//! per instrumented block:
//!
//! ```text
//! mode: count
//! encoding/base64/base64.go:34.44,37.40 3 1
//! ```
//!
//! Records sharing the same range are merged by summing their counts.

mod aggregator;
mod error;
mod mode;
mod range;
mod record;
mod run;
mod table;

pub use aggregator::*;
pub use error::*;
pub use mode::*;
pub use range::*;
pub use record::*;
pub use run::*;
pub use table::AggregationTable;
