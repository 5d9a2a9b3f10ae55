//! Code for working with the simulation calendar.
//!
//! A calendar index is an ordered sequence of timestamps at a fixed frequency covering one or more
//! calendar years. Timestamps label the start of each timestep. Tariff schedules use the
//! hour-ending convention instead, so every timestamp is also classified by month, hour ending and
//! whether it falls on a weekday.
use crate::units::Hours;
use anyhow::{Context, Result, ensure};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use itertools::Itertools;
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::iter;
use std::str::FromStr;

/// Index of Saturday when counting days from Monday = 0
const SATURDAY: u32 = 5;

/// Number of seconds in an hour
const SECONDS_PER_HOUR: i64 = 3600;

/// The fixed interval between consecutive timesteps.
///
/// Written as a number followed by a unit, e.g. `1h`, `30min` or `900s`. The interval must divide
/// an hour exactly so that every timestep lies within a single hour of the tariff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency(TimeDelta);

impl Frequency {
    /// Create a new [`Frequency`] from a number of seconds
    pub fn from_seconds(seconds: i64) -> Result<Self> {
        ensure!(seconds > 0, "Frequency must be positive");
        ensure!(
            SECONDS_PER_HOUR % seconds == 0,
            "Frequency must divide one hour exactly (got {seconds}s)"
        );

        Ok(Self(TimeDelta::seconds(seconds)))
    }

    /// An hourly frequency
    pub fn hourly() -> Self {
        Self(TimeDelta::hours(1))
    }

    /// The interval between timesteps
    pub fn step(&self) -> TimeDelta {
        self.0
    }

    /// The duration of one timestep in hours
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Hours {
        Hours(self.0.num_seconds() as f64 / SECONDS_PER_HOUR as f64)
    }
}

impl FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .with_context(|| format!("Frequency '{s}' has no unit"))?;
        let (count, unit) = s.split_at(split);
        let count: i64 = count
            .parse()
            .with_context(|| format!("Invalid frequency '{s}'"))?;
        let multiplier = match unit.trim() {
            "h" => SECONDS_PER_HOUR,
            "min" => 60,
            "s" => 1,
            unit => anyhow::bail!("Unknown frequency unit '{unit}': must be h, min or s"),
        };
        let seconds = count
            .checked_mul(multiplier)
            .with_context(|| format!("Invalid frequency '{s}'"))?;

        Self::from_seconds(seconds)
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seconds = self.0.num_seconds();
        if seconds % SECONDS_PER_HOUR == 0 {
            write!(f, "{}h", seconds / SECONDS_PER_HOUR)
        } else if seconds % 60 == 0 {
            write!(f, "{}min", seconds / 60)
        } else {
            write!(f, "{seconds}s")
        }
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D>(deserialiser: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserialiser)?;
        s.parse().map_err(|err| D::Error::custom(format!("{err:#}")))
    }
}

/// Get the hour ending (1 to 24) for the timestep starting at `timestamp`.
///
/// The timestamp is advanced by one second and the hour of the result is taken, so a timestep
/// starting at midnight belongs to hour ending 1 and one starting at 23:00 to hour ending 24.
pub fn hour_ending(timestamp: &NaiveDateTime) -> u32 {
    (*timestamp + TimeDelta::seconds(1)).hour() + 1
}

/// Whether `timestamp` falls on a weekday (Monday to Friday)
pub fn is_weekday(timestamp: &NaiveDateTime) -> bool {
    timestamp.weekday().num_days_from_monday() < SATURDAY
}

/// Get the first instant of the given calendar year
fn start_of_year(year: i32) -> Result<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(year, 1, 1)
        .with_context(|| format!("Year {year} is out of range"))?;
    Ok(date.and_time(NaiveTime::MIN))
}

/// Timestamps together with their calendar classification.
///
/// The classification vectors are aligned with the timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarIndex {
    timestamps: Vec<NaiveDateTime>,
    months: Vec<u32>,
    hour_endings: Vec<u32>,
    weekdays: Vec<bool>,
}

impl CalendarIndex {
    /// Create a calendar index covering all of `year` at the given frequency.
    ///
    /// The index runs from midnight on 1 January (inclusive) to midnight on 1 January of the
    /// following year (exclusive).
    pub fn for_year(year: i32, frequency: Frequency) -> Result<Self> {
        let start = start_of_year(year)?;
        let end = start_of_year(year + 1)?;
        let step = frequency.step();
        let timestamps = iter::successors(Some(start), |ts| Some(*ts + step))
            .take_while(|ts| *ts < end)
            .collect_vec();

        Ok(Self::from_timestamps(timestamps))
    }

    /// Classify an existing sequence of timestamps
    pub fn from_timestamps(timestamps: Vec<NaiveDateTime>) -> Self {
        let months = timestamps.iter().map(Datelike::month).collect();
        let hour_endings = timestamps.iter().map(hour_ending).collect();
        let weekdays = timestamps.iter().map(is_weekday).collect();

        Self {
            timestamps,
            months,
            hour_endings,
            weekdays,
        }
    }

    /// The number of timesteps in the index
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the index has no timesteps
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The timestamps of the index
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// The month (1 to 12) of each timestep
    pub fn months(&self) -> &[u32] {
        &self.months
    }

    /// The hour ending (1 to 24) of each timestep
    pub fn hour_endings(&self) -> &[u32] {
        &self.hour_endings
    }

    /// Whether each timestep falls on a weekday
    pub fn weekdays(&self) -> &[bool] {
        &self.weekdays
    }

    /// Consume the index, returning the timestamps
    pub fn into_timestamps(self) -> Vec<NaiveDateTime> {
        self.timestamps
    }
}
