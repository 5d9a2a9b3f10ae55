//! An append-only series of energy prices covering whole calendar years.
//!
//! Years missing from the series are constructed from billing period rows and scaled by a growth
//! rate relative to the latest year already present. Years already present are never modified.
use crate::billing_period::BillingPeriodRow;
use crate::calendar::{CalendarIndex, Frequency};
use crate::units::{Dimensionless, MoneyPerEnergy};
use crate::warning::DataIntegrityWarning;
use anyhow::{Result, anyhow, bail, ensure};
use chrono::{Datelike, NaiveDateTime};
use itertools::Itertools;
use log::{debug, info};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// The prices for one calendar year
#[derive(Debug, Clone, PartialEq)]
struct YearPrices {
    timestamps: Vec<NaiveDateTime>,
    prices: Vec<MoneyPerEnergy>,
}

/// An ordered mapping from timestamp to energy price.
///
/// Prices are grouped by calendar year. The only way to change a series is to append years it
/// doesn't yet cover.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    years: BTreeMap<i32, YearPrices>,
}

/// The outcome of a call to [`PriceSeries::extend`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtendReport {
    /// The years appended to the series, in ascending order
    pub added_years: Vec<i32>,
    /// Data quality problems found while constructing the new years
    pub warnings: Vec<DataIntegrityWarning>,
}

impl PriceSeries {
    /// Create a series from timestamped prices.
    ///
    /// Timestamps must be strictly increasing.
    pub fn from_points<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDateTime, MoneyPerEnergy)>,
    {
        let mut series = Self::default();
        let mut previous: Option<NaiveDateTime> = None;
        for (timestamp, price) in points {
            if let Some(previous) = previous {
                ensure!(
                    timestamp > previous,
                    "Timestamps must be strictly increasing ({timestamp} follows {previous})"
                );
            }
            previous = Some(timestamp);

            let year = series
                .years
                .entry(timestamp.year())
                .or_insert_with(|| YearPrices {
                    timestamps: Vec::new(),
                    prices: Vec::new(),
                });
            year.timestamps.push(timestamp);
            year.prices.push(price);
        }

        Ok(series)
    }

    /// Create a series covering a single year built directly from billing period rows.
    ///
    /// No growth is applied. Any data quality problems are logged and returned.
    pub fn from_billing_periods(
        rows: &[BillingPeriodRow],
        year: i32,
        frequency: Frequency,
    ) -> Result<(Self, Vec<DataIntegrityWarning>)> {
        let calendar = CalendarIndex::for_year(year, frequency)?;
        let (prices, warnings) = accumulate_prices(rows, &calendar, year);

        let mut series = Self::default();
        series.append_year(
            year,
            YearPrices {
                timestamps: calendar.into_timestamps(),
                prices,
            },
        );

        Ok((series, warnings))
    }

    /// Iterate over the years covered by the series, in ascending order
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// Whether the series covers all of the given years
    pub fn covers(&self, years: &[i32]) -> bool {
        years.iter().all(|year| self.years.contains_key(year))
    }

    /// The total number of timesteps in the series
    pub fn len(&self) -> usize {
        self.years.values().map(|year| year.prices.len()).sum()
    }

    /// Whether the series has no data
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Get the price at the given timestamp, if present
    pub fn get(&self, timestamp: &NaiveDateTime) -> Option<MoneyPerEnergy> {
        let year = self.years.get(&timestamp.year())?;
        let index = year.timestamps.binary_search(timestamp).ok()?;
        Some(year.prices[index])
    }

    /// Iterate over timestamps and prices in time order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, MoneyPerEnergy)> + '_ {
        self.years.values().flat_map(|year| {
            year.timestamps
                .iter()
                .copied()
                .zip(year.prices.iter().copied())
        })
    }

    /// Iterate over the timestamps of the series in time order
    pub fn timestamps(&self) -> impl Iterator<Item = &NaiveDateTime> + '_ {
        self.years.values().flat_map(|year| year.timestamps.iter())
    }

    /// Check that consecutive timestamps within each year are one timestep apart
    pub fn check_frequency(&self, frequency: Frequency) -> Result<()> {
        let step = frequency.step();
        for (previous, timestamp) in self
            .years
            .values()
            .flat_map(|year| year.timestamps.iter().tuple_windows())
        {
            ensure!(
                *timestamp - *previous == step,
                "Timestamps must be {frequency} apart ({timestamp} follows {previous})"
            );
        }

        Ok(())
    }

    /// Get the prices selected by a mask.
    ///
    /// The mask must have one entry for every timestep of the series, in time order.
    pub fn select(&self, mask: &[bool]) -> Result<Vec<MoneyPerEnergy>> {
        let len = self.len();
        ensure!(
            mask.len() == len,
            "Mask has {} entries but the price series has {len} timesteps",
            mask.len()
        );

        Ok(self
            .iter()
            .zip(mask)
            .filter_map(|((_, price), &selected)| selected.then_some(price))
            .collect())
    }

    /// Get the prices at the given timestamps.
    ///
    /// Returns an error if any timestamp is not in the series.
    pub fn select_timestamps(&self, timestamps: &[NaiveDateTime]) -> Result<Vec<MoneyPerEnergy>> {
        timestamps
            .iter()
            .map(|timestamp| {
                self.get(timestamp)
                    .ok_or_else(|| anyhow!("No energy price for {timestamp}"))
            })
            .try_collect()
    }

    /// Extend the series to cover the required years.
    ///
    /// Each missing year is built from `rows` on a full calendar at `frequency` and scaled by
    /// `(1 + growth_rate)^(year - source_year)`, where `source_year` is the latest year present
    /// before this call. Either every missing year is appended or, on error, none is.
    ///
    /// # Arguments
    ///
    /// * `rows` - Billing period rows making up the tariff
    /// * `required_years` - The years the series must cover
    /// * `frequency` - The interval between timesteps for new years
    /// * `growth_rate` - The fractional change in price per year
    ///
    /// # Returns
    ///
    /// The years added and any data quality problems found, or an error if the series has no data
    /// to extrapolate from.
    pub fn extend(
        &mut self,
        rows: &[BillingPeriodRow],
        required_years: &[i32],
        frequency: Frequency,
        growth_rate: Dimensionless,
    ) -> Result<ExtendReport> {
        let missing_years = required_years
            .iter()
            .copied()
            .filter(|year| !self.years.contains_key(year))
            .sorted()
            .dedup()
            .collect_vec();
        if missing_years.is_empty() {
            return Ok(ExtendReport::default());
        }

        let Some(&source_year) = self.years.keys().next_back() else {
            bail!(
                "Cannot extend energy prices to {}: no base year of price data is present",
                missing_years.iter().join(", ")
            );
        };

        // Build all the new years before modifying the series
        let mut new_years = Vec::with_capacity(missing_years.len());
        let mut warnings = Vec::new();
        for &year in &missing_years {
            let calendar = CalendarIndex::for_year(year, frequency)?;
            let (prices, year_warnings) = accumulate_prices(rows, &calendar, year);
            warnings.extend(year_warnings);

            let factor = (Dimensionless(1.0) + growth_rate).powi(year - source_year);
            debug!(
                "Energy prices for {year} built from tariff with growth factor {} relative to {source_year}",
                factor.value()
            );
            new_years.push((
                year,
                YearPrices {
                    timestamps: calendar.into_timestamps(),
                    prices: prices.into_iter().map(|price| price * factor).collect(),
                },
            ));
        }

        for (year, prices) in new_years {
            self.append_year(year, prices);
        }
        info!(
            "Extended energy prices to cover {}",
            missing_years.iter().join(", ")
        );

        Ok(ExtendReport {
            added_years: missing_years,
            warnings,
        })
    }

    /// Add a year which is not yet covered by the series
    fn append_year(&mut self, year: i32, prices: YearPrices) {
        match self.years.entry(year) {
            Entry::Vacant(entry) => {
                entry.insert(prices);
            }
            Entry::Occupied(_) => panic!("Energy prices for {year} are already present"),
        }
    }
}

/// Sum the contributions of every billing row over a calendar.
///
/// A warning is raised for each row which adds to timesteps that already have a positive price.
fn accumulate_prices(
    rows: &[BillingPeriodRow],
    calendar: &CalendarIndex,
    year: i32,
) -> (Vec<MoneyPerEnergy>, Vec<DataIntegrityWarning>) {
    let mut prices = vec![MoneyPerEnergy(0.0); calendar.len()];
    let mut warnings = Vec::new();
    for row in rows {
        let mask = row.mask(calendar);
        let overlapping = prices
            .iter()
            .zip(&mask)
            .filter(|(price, selected)| **selected && **price > MoneyPerEnergy(0.0))
            .count();
        if overlapping > 0 {
            warnings.push(
                DataIntegrityWarning::OverlappingPrices {
                    year,
                    row: row.label.clone(),
                    timesteps: overlapping,
                }
                .log(),
            );
        }

        for (price, _) in prices.iter_mut().zip(&mask).filter(|(_, selected)| **selected) {
            *price += row.value;
        }
    }

    (prices, warnings)
}
