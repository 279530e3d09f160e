pub mod reading;
pub mod report;

pub use reading::{CostedReading, RawRow, Reading, RejectedRow, RowError};
pub use report::{AggregateReport, MonthBucket, SeasonBucket};
