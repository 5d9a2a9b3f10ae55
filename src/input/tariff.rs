//! Code for reading a tiered time-of-use rate structure from a TOML file.
use super::{input_err_msg, read_toml};
use crate::rate_structure::{RateStructure, TierRecord};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// A period as it appears in the tariff file
#[derive(Debug, Deserialize, PartialEq)]
struct PeriodRaw {
    #[serde(default)]
    tiers: Vec<TierRecord>,
}

/// The contents of a tariff file.
///
/// Schedules hold 0-based indexes into `periods`, one row per month and one column per hour.
#[derive(Debug, Deserialize, PartialEq)]
struct RateStructureRaw {
    weekday_schedule: Vec<Vec<u32>>,
    weekend_schedule: Vec<Vec<u32>>,
    #[serde(default)]
    periods: Vec<PeriodRaw>,
}

/// Read a rate structure from a TOML file.
///
/// # Arguments
///
/// * `file_path` - Path to the tariff file
///
/// # Returns
///
/// The rate structure, or an error if the file could not be read or describes an invalid tariff.
pub fn read_rate_structure(file_path: &Path) -> Result<RateStructure> {
    let raw: RateStructureRaw = read_toml(file_path)?;
    rate_structure_from_raw(raw).with_context(|| input_err_msg(file_path))
}

fn rate_structure_from_raw(raw: RateStructureRaw) -> Result<RateStructure> {
    let periods = raw.periods.into_iter().map(|period| period.tiers).collect();
    RateStructure::new(periods, &raw.weekday_schedule, &raw.weekend_schedule)
}
