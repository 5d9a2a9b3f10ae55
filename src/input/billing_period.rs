//! Code for reading a tariff given as a table of billing periods from a CSV file.
use super::{input_err_msg, read_csv};
use crate::billing_period::BillingPeriodRow;
use crate::schedule::{DayType, HOURS_PER_DAY, MONTHS_PER_YEAR};
use crate::units::MoneyPerEnergy;
use anyhow::{Context, Result, bail, ensure};
use log::debug;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::ops::RangeInclusive;
use std::path::Path;

/// The kind of charge described by a billing period
#[derive(PartialEq, Eq, Clone, Copy, Debug, DeserializeLabeledStringEnum)]
pub enum ChargeType {
    /// A charge per unit of energy
    #[string = "energy"]
    Energy,
    /// A charge per unit of peak power
    #[string = "demand"]
    Demand,
}

/// A billing period as it appears in the CSV file
#[derive(PartialEq, Debug, Deserialize, Clone)]
struct BillingPeriodRaw {
    billing_period: String,
    start_month: u32,
    end_month: u32,
    /// First hour ending of the period
    start_time: u32,
    /// Last hour ending of the period
    end_time: u32,
    excluding_start_time: Option<u32>,
    excluding_end_time: Option<u32>,
    weekday: DayType,
    value: f64,
    charge: ChargeType,
}

/// Read the energy charges of a billing period table.
///
/// Rows describing demand charges are skipped.
///
/// # Arguments
///
/// * `file_path` - Path to the billing period CSV file
///
/// # Returns
///
/// One [`BillingPeriodRow`] per energy charge, in file order.
pub fn read_billing_periods(file_path: &Path) -> Result<Vec<BillingPeriodRow>> {
    let billing_periods_csv = read_csv::<BillingPeriodRaw>(file_path)?;
    read_billing_periods_iter(billing_periods_csv).with_context(|| input_err_msg(file_path))
}

fn read_billing_periods_iter<I>(iter: I) -> Result<Vec<BillingPeriodRow>>
where
    I: Iterator<Item = BillingPeriodRaw>,
{
    let mut rows = Vec::new();
    for raw in iter {
        if raw.charge == ChargeType::Demand {
            debug!(
                "Billing period {} is a demand charge; skipping",
                raw.billing_period
            );
            continue;
        }

        rows.push(
            billing_period_from_raw(raw.clone())
                .with_context(|| format!("Invalid billing period {}", raw.billing_period))?,
        );
    }

    Ok(rows)
}

fn billing_period_from_raw(raw: BillingPeriodRaw) -> Result<BillingPeriodRow> {
    ensure!(raw.value.is_finite(), "Value must be a finite number");
    let months = checked_range("month", raw.start_month, raw.end_month, MONTHS_PER_YEAR)?;
    let hours = checked_range("time", raw.start_time, raw.end_time, HOURS_PER_DAY)?;
    let excluding_hours = match (raw.excluding_start_time, raw.excluding_end_time) {
        (Some(start), Some(end)) => {
            Some(checked_range("excluding time", start, end, HOURS_PER_DAY)?)
        }
        (None, None) => None,
        _ => bail!(
            "Both or neither of excluding_start_time and excluding_end_time must be given"
        ),
    };

    Ok(BillingPeriodRow::from_ranges(
        raw.billing_period,
        months,
        hours,
        excluding_hours,
        raw.weekday,
        MoneyPerEnergy(raw.value),
    ))
}

/// Check that `start..=end` is a non-empty range within `1..=max`
#[allow(clippy::cast_possible_truncation)]
fn checked_range(name: &str, start: u32, end: u32, max: usize) -> Result<RangeInclusive<u32>> {
    let max = max as u32;
    ensure!(
        (1..=max).contains(&start) && (1..=max).contains(&end),
        "Start and end {name} must be between 1 and {max} (got {start} and {end})"
    );
    ensure!(
        start <= end,
        "Start {name} ({start}) must not be after end {name} ({end})"
    );

    Ok(start..=end)
}
