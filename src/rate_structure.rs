//! The periods and tiers making up a tiered, time-of-use energy tariff.
//!
//! A [`RateStructure`] is built once from tariff data in which tier attributes are already grouped
//! by tier and tiers are grouped by period. Schedules are supplied 0-indexed and stored 1-indexed.
use crate::schedule::{DayType, ScheduleMatrix};
use crate::units::MoneyPerEnergy;
use crate::warning::DataIntegrityWarning;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::collections::HashSet;

/// The attributes of a single tier, as provided in tariff data.
///
/// Any attribute may be absent. A tier without a `max` is the unbounded tier.
#[derive(PartialEq, Debug, Deserialize, Clone, Default)]
pub struct TierRecord {
    /// Upper usage bound of the tier
    pub max: Option<f64>,
    /// Volumetric rate
    pub rate: Option<f64>,
    /// Unit of the rate (e.g. "kWh")
    pub unit: Option<String>,
    /// Adjustment added to the rate
    pub adjustment: Option<f64>,
    /// Rate paid for energy sold back
    pub sell: Option<f64>,
}

/// One charge tier within a period
#[derive(PartialEq, Debug, Clone)]
pub struct Tier {
    /// 1-based position of the tier within its period
    pub index: u32,
    /// Upper usage bound, or `None` for the unbounded tier
    pub max: Option<f64>,
    /// Volumetric rate
    pub rate: Option<MoneyPerEnergy>,
    /// Unit of the rate
    pub unit: Option<String>,
    /// Adjustment added to the rate
    pub adjustment: Option<MoneyPerEnergy>,
    /// Sell-back rate
    pub sell: Option<MoneyPerEnergy>,
}

impl Tier {
    fn from_record(index: u32, record: TierRecord) -> Self {
        Self {
            index,
            max: record.max,
            rate: record.rate.map(MoneyPerEnergy),
            unit: record.unit,
            adjustment: record.adjustment.map(MoneyPerEnergy),
            sell: record.sell.map(MoneyPerEnergy),
        }
    }

    /// Whether this tier has no upper bound
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    /// The rate including any adjustment, or `None` if the tier has no rate
    pub fn volumetric_rate(&self) -> Option<MoneyPerEnergy> {
        self.rate
            .map(|rate| rate + self.adjustment.unwrap_or_default())
    }
}

/// A named time-of-use period with an ordered list of tiers
#[derive(PartialEq, Debug, Clone)]
pub struct Period {
    /// 1-based period number
    pub number: u32,
    tiers: Vec<Tier>,
}

impl Period {
    /// Create a new [`Period`] from grouped tier records.
    ///
    /// Bounds must be strictly increasing and only the last tier may be unbounded.
    pub fn new(number: u32, records: Vec<TierRecord>) -> Result<Self> {
        let mut tiers: Vec<Tier> = Vec::with_capacity(records.len());
        for (index, record) in (1..).zip(records) {
            let tier = Tier::from_record(index, record);
            if let Some(previous) = tiers.last() {
                let previous_max = previous.max.with_context(|| {
                    format!("Only the last tier of period {number} may be unbounded")
                })?;
                if let Some(max) = tier.max {
                    ensure!(
                        max > previous_max,
                        "Tier {index} of period {number} has bound {max}, which is not greater \
                        than the bound of the previous tier ({previous_max})"
                    );
                }
            }
            tiers.push(tier);
        }

        Ok(Self { number, tiers })
    }

    /// The tiers of this period, in tier order
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Find the tier which applies to the given level of usage.
    ///
    /// This is the tier with the smallest bound which is at least `usage`, falling back to the
    /// unbounded tier. Returns `None` if usage exceeds every bound and there is no unbounded tier.
    pub fn tier_for_usage(&self, usage: f64) -> Option<&Tier> {
        self.tiers
            .iter()
            .find(|tier| tier.max.is_none_or(|max| max >= usage))
    }
}

/// The full energy rate structure of a tariff
#[derive(PartialEq, Debug, Clone)]
pub struct RateStructure {
    periods: Vec<Period>,
    weekday_schedule: ScheduleMatrix,
    weekend_schedule: ScheduleMatrix,
    warnings: Vec<DataIntegrityWarning>,
}

impl RateStructure {
    /// Create a new [`RateStructure`].
    ///
    /// # Arguments
    ///
    /// * `periods` - Tier records grouped by period, in period order
    /// * `weekday_schedule` - Raw 12 x 24 weekday schedule of 0-based period indexes
    /// * `weekend_schedule` - Raw 12 x 24 weekend schedule of 0-based period indexes
    ///
    /// # Returns
    ///
    /// The rate structure, or an error if the data is malformed or a schedule refers to a period
    /// which doesn't exist. Data quality problems are logged and can be retrieved with
    /// [`RateStructure::warnings`].
    pub fn new(
        periods: Vec<Vec<TierRecord>>,
        weekday_schedule: &[Vec<u32>],
        weekend_schedule: &[Vec<u32>],
    ) -> Result<Self> {
        let periods: Vec<_> = (1..)
            .zip(periods)
            .map(|(number, records)| Period::new(number, records))
            .collect::<Result<_>>()?;
        let weekday_schedule =
            ScheduleMatrix::from_raw(weekday_schedule).context("Invalid weekday schedule")?;
        let weekend_schedule =
            ScheduleMatrix::from_raw(weekend_schedule).context("Invalid weekend schedule")?;

        Self::from_parts(periods, weekday_schedule, weekend_schedule)
    }

    /// Create a new [`RateStructure`] from periods and already-normalised schedules
    pub fn from_parts(
        periods: Vec<Period>,
        weekday_schedule: ScheduleMatrix,
        weekend_schedule: ScheduleMatrix,
    ) -> Result<Self> {
        let mut rate_structure = Self {
            periods,
            weekday_schedule,
            weekend_schedule,
            warnings: Vec::new(),
        };
        rate_structure.warnings = rate_structure.validate()?;

        Ok(rate_structure)
    }

    /// Check schedule references, returning any non-fatal problems found
    fn validate(&self) -> Result<Vec<DataIntegrityWarning>> {
        if self.periods.is_empty() {
            return Ok(vec![DataIntegrityWarning::EmptyRateStructure.log()]);
        }

        for (expected, period) in (1..).zip(&self.periods) {
            ensure!(
                period.number == expected,
                "Periods must be numbered consecutively from 1 (found {} at position {expected})",
                period.number
            );
        }

        let period_count = self.periods.len();
        for (day_type, schedule) in self.schedules() {
            for period in schedule.iter_periods() {
                ensure!(
                    self.period(period).is_some(),
                    "{day_type:?} schedule refers to period {period}, but only {period_count} \
                    periods are defined"
                );
            }
        }

        let reachable: HashSet<u32> = self
            .weekday_schedule
            .iter_periods()
            .chain(self.weekend_schedule.iter_periods())
            .collect();
        let warnings = self
            .periods
            .iter()
            .filter(|period| !reachable.contains(&period.number))
            .map(|period| DataIntegrityWarning::UnreachablePeriod {
                period: period.number,
            })
            .map(DataIntegrityWarning::log)
            .collect();

        Ok(warnings)
    }

    /// The periods of the tariff, in period order
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Get a period by its 1-based number
    pub fn period(&self, number: u32) -> Option<&Period> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.periods.get(index)
    }

    /// Whether the tariff defines no periods
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// The weekday and weekend schedules, labelled by day type
    pub fn schedules(&self) -> [(DayType, &ScheduleMatrix); 2] {
        [
            (DayType::Weekday, &self.weekday_schedule),
            (DayType::Weekend, &self.weekend_schedule),
        ]
    }

    /// Data quality problems found when the rate structure was created
    pub fn warnings(&self) -> &[DataIntegrityWarning] {
        &self.warnings
    }
}
