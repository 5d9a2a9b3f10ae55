//! Billing period rows and the timestep masks they select.
//!
//! A billing period row pairs a month/hour/day-type membership rule with a volumetric value. The
//! energy price for a timestep is the sum of the values of all rows whose mask includes it.
use crate::calendar::CalendarIndex;
use crate::rate_structure::RateStructure;
use crate::schedule::{DayType, MONTHS_PER_YEAR};
use crate::units::MoneyPerEnergy;
use indexmap::IndexMap;
use itertools::izip;
use log::debug;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// A rule selecting timesteps by month, hour ending and day type, with the price it contributes
#[derive(PartialEq, Debug, Clone)]
pub struct BillingPeriodRow {
    /// Human-readable description of where the row came from
    pub label: String,
    /// Months (1 to 12) during which the row applies
    pub months: BTreeSet<u32>,
    /// Hour endings (1 to 24) during which the row applies
    pub hours: BTreeSet<u32>,
    /// The class of days on which the row applies
    pub day_type: DayType,
    /// The price added to each selected timestep
    pub value: MoneyPerEnergy,
}

impl BillingPeriodRow {
    /// Create a row from inclusive month and hour-ending ranges.
    ///
    /// # Arguments
    ///
    /// * `label` - Description of the row
    /// * `months` - Months during which the row applies
    /// * `hours` - Hour endings during which the row applies
    /// * `excluding_hours` - Hour endings to remove from `hours`, if any
    /// * `day_type` - The class of days on which the row applies
    /// * `value` - The price contributed by the row
    pub fn from_ranges(
        label: String,
        months: RangeInclusive<u32>,
        hours: RangeInclusive<u32>,
        excluding_hours: Option<RangeInclusive<u32>>,
        day_type: DayType,
        value: MoneyPerEnergy,
    ) -> Self {
        let hours = hours
            .filter(|hour| !excluding_hours.as_ref().is_some_and(|ex| ex.contains(hour)))
            .collect();

        Self {
            label,
            months: months.collect(),
            hours,
            day_type,
            value,
        }
    }

    /// Select the timesteps of `calendar` to which this row applies
    pub fn mask(&self, calendar: &CalendarIndex) -> Vec<bool> {
        mask(
            self,
            calendar.months(),
            calendar.hour_endings(),
            calendar.weekdays(),
        )
    }
}

/// Compute the selection mask of a billing row.
///
/// A timestep is selected when its month is in the row's months, its hour ending is in the row's
/// hours and its weekday classification matches the row's day type. The three slices describe the
/// same timesteps and must have equal length.
pub fn mask(
    row: &BillingPeriodRow,
    months: &[u32],
    hour_endings: &[u32],
    weekdays: &[bool],
) -> Vec<bool> {
    assert!(
        months.len() == hour_endings.len() && months.len() == weekdays.len(),
        "Calendar slices must have equal length"
    );

    izip!(months, hour_endings, weekdays)
        .map(|(month, hour, &is_weekday)| {
            row.months.contains(month)
                && row.hours.contains(hour)
                && row.day_type.contains(is_weekday)
        })
        .collect()
}

/// Derive the billing period rows for every period and tier of a rate structure.
///
/// For each period, tier and day type, months in which the period is active during exactly the
/// same hours are combined into one row. Rows are produced in period order, then tier order.
///
/// Tier bounds are not considered: every tier of a period contributes its volumetric rate to every
/// timestep in which the period is active. Tiers without a rate contribute nothing.
pub fn rows_from_rate_structure(rate_structure: &RateStructure) -> Vec<BillingPeriodRow> {
    let mut rows = Vec::new();
    for period in rate_structure.periods() {
        for tier in period.tiers() {
            let Some(value) = tier.volumetric_rate() else {
                debug!(
                    "Tier {} of period {} has no rate; skipping",
                    tier.index, period.number
                );
                continue;
            };

            for (day_type, schedule) in rate_structure.schedules() {
                // Group months by the hours during which this period is active
                let mut months_by_hours: IndexMap<BTreeSet<u32>, BTreeSet<u32>> = IndexMap::new();
                for month in 1..=MONTHS_PER_YEAR as u32 {
                    let hours = schedule.hours_for_period(month, period.number);
                    if !hours.is_empty() {
                        months_by_hours.entry(hours).or_default().insert(month);
                    }
                }

                rows.extend(months_by_hours.into_iter().map(|(hours, months)| {
                    BillingPeriodRow {
                        label: format!(
                            "period {} tier {} {day_type:?}",
                            period.number, tier.index
                        )
                        .to_lowercase(),
                        months,
                        hours,
                        day_type,
                        value,
                    }
                }));
            }
        }
    }

    debug!("Derived {} billing period rows from rate structure", rows.len());

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Frequency;
    use crate::fixture::{datetime, raw_schedule, tier};
    use chrono::{Datelike, Timelike};
    use itertools::Itertools;

    fn row(
        months: RangeInclusive<u32>,
        hours: RangeInclusive<u32>,
        day_type: DayType,
    ) -> BillingPeriodRow {
        BillingPeriodRow::from_ranges(
            "test".into(),
            months,
            hours,
            None,
            day_type,
            MoneyPerEnergy(0.1),
        )
    }

    #[test]
    fn test_from_ranges_excluding() {
        let row = BillingPeriodRow::from_ranges(
            "test".into(),
            6..=9,
            1..=24,
            Some(13..=18),
            DayType::All,
            MoneyPerEnergy(0.1),
        );
        assert_eq!(row.months, BTreeSet::from_iter(6..=9));
        assert_eq!(row.hours.len(), 18);
        assert!(!row.hours.contains(&13));
        assert!(!row.hours.contains(&18));
        assert!(row.hours.contains(&12));
        assert!(row.hours.contains(&19));
    }

    #[test]
    fn test_mask() {
        let row = row(1..=1, 1..=1, DayType::Weekday);
        let timestamps = [
            "2024-01-01 00:00:00", // Monday, hour ending 1: selected
            "2024-01-01 01:00:00", // hour ending 2
            "2024-01-06 00:00:00", // Saturday
            "2024-02-05 00:00:00", // February
        ]
        .into_iter()
        .map(datetime)
        .collect_vec();
        let calendar = CalendarIndex::from_timestamps(timestamps);

        assert_eq!(row.mask(&calendar), [true, false, false, false]);
    }

    #[test]
    fn test_mask_slices() {
        let row = row(6..=8, 14..=19, DayType::All);
        let months = [5, 6, 6, 8, 9];
        let hours = [14, 14, 20, 19, 15];
        let weekdays = [true, false, true, true, true];
        assert_eq!(
            mask(&row, &months, &hours, &weekdays),
            [false, true, false, true, false]
        );
    }

    #[test]
    #[should_panic(expected = "Calendar slices must have equal length")]
    fn test_mask_slices_mismatched() {
        let row = row(1..=12, 1..=24, DayType::All);
        mask(&row, &[1, 2], &[1], &[true, true]);
    }

    #[test]
    fn test_mask_full_year() {
        let calendar = CalendarIndex::for_year(2024, Frequency::hourly()).unwrap();
        let row = row(7..=7, 17..=20, DayType::Weekday);
        let selected = row
            .mask(&calendar)
            .into_iter()
            .zip(calendar.timestamps())
            .filter_map(|(selected, ts)| selected.then_some(ts))
            .collect_vec();

        // July 2024 has 23 weekdays, each with 4 selected hours
        assert_eq!(selected.len(), 23 * 4);
        assert!(selected.iter().all(|ts| ts.month() == 7));
        assert!(selected.iter().all(|ts| (16..=19).contains(&ts.hour())));
    }

    #[test]
    fn test_rows_from_rate_structure() {
        let mut weekday = raw_schedule(0);
        for month in &mut weekday[5..9] {
            month[16..20].fill(1); // June to September, hour ending 17 to 20
        }
        let rate_structure = RateStructure::new(
            vec![vec![tier(None, 0.10)], vec![tier(None, 0.30)]],
            &weekday,
            &raw_schedule(0),
        )
        .unwrap();
        let rows = rows_from_rate_structure(&rate_structure);

        // Period 1 weekday: summer months (20 hours) and other months (24 hours)
        // Period 1 weekend: all months
        // Period 2 weekday: summer months
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].label, "period 1 tier 1 weekday");
        assert_eq!(rows[0].months, BTreeSet::from_iter([1, 2, 3, 4, 5, 10, 11, 12]));
        assert_eq!(rows[0].hours.len(), 24);
        assert_eq!(rows[1].months, BTreeSet::from_iter(6..=9));
        assert_eq!(rows[1].hours.len(), 20);
        assert_eq!(rows[2].label, "period 1 tier 1 weekend");
        assert_eq!(rows[2].day_type, DayType::Weekend);
        assert_eq!(rows[2].months.len(), 12);
        assert_eq!(rows[3].label, "period 2 tier 1 weekday");
        assert_eq!(rows[3].hours, BTreeSet::from_iter(17..=20));
        assert_eq!(rows[3].value, MoneyPerEnergy(0.30));
    }

    #[test]
    fn test_rows_from_rate_structure_ignores_tier_bounds() {
        let rate_structure = RateStructure::new(
            vec![vec![tier(Some(500.0), 0.10), tier(None, 0.15)]],
            &raw_schedule(0),
            &raw_schedule(0),
        )
        .unwrap();
        let rows = rows_from_rate_structure(&rate_structure);

        // Both tiers cover every hour of every day
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.hours.len() == 24 && row.months.len() == 12));
        assert_eq!(rows[0].value, MoneyPerEnergy(0.10));
        assert_eq!(rows[2].value, MoneyPerEnergy(0.15));
    }

    #[test]
    fn test_rows_from_rate_structure_tier_without_rate() {
        let rate_structure = RateStructure::new(
            vec![vec![Default::default()]],
            &raw_schedule(0),
            &raw_schedule(0),
        )
        .unwrap();
        assert!(rows_from_rate_structure(&rate_structure).is_empty());
    }
}
