//! Energy price series and cost terms from retail time-of-use tariffs.
#![warn(missing_docs)]
pub mod billing_period;
pub mod calendar;
pub mod cli;
pub mod input;
pub mod log;
pub mod model;
pub mod objective;
pub mod output;
pub mod price_series;
pub mod rate_structure;
pub mod schedule;
pub mod settings;
pub mod simulation;
pub mod units;
pub mod value_stream;
pub mod warning;

#[cfg(test)]
mod fixture;
