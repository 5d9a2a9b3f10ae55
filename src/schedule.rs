//! Month by hour schedules indicating which time-of-use period is active.
use anyhow::{Context, Result, ensure};
use serde_string_enum::DeserializeLabeledStringEnum;
use std::collections::BTreeSet;

/// The number of months in a schedule
pub const MONTHS_PER_YEAR: usize = 12;

/// The number of hours in each month's row of a schedule
pub const HOURS_PER_DAY: usize = 24;

/// The class of day to which a schedule or billing row applies
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, DeserializeLabeledStringEnum)]
pub enum DayType {
    /// Monday to Friday
    #[string = "weekday"]
    Weekday,
    /// Saturday and Sunday
    #[string = "weekend"]
    Weekend,
    /// Every day of the week
    #[string = "all"]
    All,
}

impl DayType {
    /// Whether a day with the given weekday classification belongs to this day type
    pub fn contains(self, is_weekday: bool) -> bool {
        match self {
            DayType::Weekday => is_weekday,
            DayType::Weekend => !is_weekday,
            DayType::All => true,
        }
    }
}

/// A 12 x 24 grid giving the active period number for each month and hour ending.
///
/// Period numbers are 1-based. Months run from 1 (January) to 12 and hours follow the
/// hour-ending convention (1 to 24).
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleMatrix([[u32; HOURS_PER_DAY]; MONTHS_PER_YEAR]);

impl ScheduleMatrix {
    /// Create a schedule from raw rows of 0-based period indexes, as provided in tariff data.
    ///
    /// # Arguments
    ///
    /// * `raw` - One row per month, each containing one period index per hour
    pub fn from_raw(raw: &[Vec<u32>]) -> Result<Self> {
        ensure!(
            raw.len() == MONTHS_PER_YEAR,
            "Schedule must have {MONTHS_PER_YEAR} rows (one per month), found {}",
            raw.len()
        );

        let mut cells = [[0; HOURS_PER_DAY]; MONTHS_PER_YEAR];
        for (month, (row, cells)) in raw.iter().zip(cells.iter_mut()).enumerate() {
            ensure!(
                row.len() == HOURS_PER_DAY,
                "Schedule row for month {} must have {HOURS_PER_DAY} values, found {}",
                month + 1,
                row.len()
            );
            for (cell, index) in cells.iter_mut().zip(row) {
                *cell = index
                    .checked_add(1)
                    .context("Period index in schedule is too large")?;
            }
        }

        Ok(Self(cells))
    }

    /// Get the active period for a month (1 to 12) and hour ending (1 to 24).
    ///
    /// Returns `None` if either value is out of range.
    pub fn period_at(&self, month: u32, hour_ending: u32) -> Option<u32> {
        let month = usize::try_from(month.checked_sub(1)?).ok()?;
        let hour = usize::try_from(hour_ending.checked_sub(1)?).ok()?;
        self.0.get(month)?.get(hour).copied()
    }

    /// Get the hour endings in `month` during which `period` is active
    pub fn hours_for_period(&self, month: u32, period: u32) -> BTreeSet<u32> {
        (1..=HOURS_PER_DAY as u32)
            .filter(|&hour| self.period_at(month, hour) == Some(period))
            .collect()
    }

    /// Iterate over every period number referenced by the schedule
    pub fn iter_periods(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().flatten().copied()
    }
}
