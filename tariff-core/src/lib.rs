//! Time-of-use tariff classification and cost aggregation.
//!
//! Given interval-metered kWh readings, the engine resolves the tariff tier
//! (season x peak/off-peak x weekday/weekend) that applies to each reading,
//! prices it under both the tiered schedule and a flat-rate alternative, and
//! aggregates the costs by month, season and grand total.
//!
//! Everything in this crate is synchronous and pure: the schedule is built
//! once, validated, and shared read-only across batches.

pub mod calendar;
pub mod domain;
pub mod engine;
pub mod schedule;

pub use domain::{AggregateReport, CostedReading, RawRow, Reading, RejectedRow, RowError};
pub use schedule::{Period, RateQuote, ScheduleError, TariffRule, TariffSchedule};
