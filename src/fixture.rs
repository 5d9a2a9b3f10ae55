//! Fixtures for tests

use crate::billing_period::BillingPeriodRow;
use crate::rate_structure::TierRecord;
use crate::schedule::{DayType, HOURS_PER_DAY, MONTHS_PER_YEAR};
use crate::units::MoneyPerEnergy;
use chrono::NaiveDateTime;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Parse a timestamp in the form `%Y-%m-%d %H:%M:%S`
pub fn datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// A raw (0-indexed) schedule with the same period index in every cell
pub fn raw_schedule(index: u32) -> Vec<Vec<u32>> {
    vec![vec![index; HOURS_PER_DAY]; MONTHS_PER_YEAR]
}

/// A tier record with a bound and rate
pub fn tier(max: Option<f64>, rate: f64) -> TierRecord {
    TierRecord {
        max,
        rate: Some(rate),
        unit: Some("kWh".into()),
        ..Default::default()
    }
}

/// A single billing row applying `rate` to every timestep
pub fn flat_rows(rate: f64) -> Vec<BillingPeriodRow> {
    vec![BillingPeriodRow::from_ranges(
        "flat".into(),
        1..=12,
        1..=24,
        None,
        DayType::All,
        MoneyPerEnergy(rate),
    )]
}

/// Raw weekday and weekend schedules for a tariff with an on-peak period on summer weekday
/// afternoons (period index 1) and off-peak at all other times (period index 0)
#[fixture]
pub fn peak_schedules() -> (Vec<Vec<u32>>, Vec<Vec<u32>>) {
    let mut weekday = raw_schedule(0);
    for month in &mut weekday[5..9] {
        month[12..18].fill(1);
    }

    (weekday, raw_schedule(0))
}
