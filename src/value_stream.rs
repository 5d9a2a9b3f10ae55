//! The retail energy time shift value stream.
//!
//! An [`EnergyTimeShift`] owns a tariff and the energy price series derived from it. It grows the
//! series to cover the years of a simulation, contributes the energy cost term to a dispatch
//! optimisation and provides report views of the prices.
use crate::billing_period::BillingPeriodRow;
use crate::calendar::{Frequency, hour_ending};
use crate::model::{Model, Tariff};
use crate::objective::{CostTerms, ENERGY_COST_NAME, PowerFlowTerms, energy_cost_terms};
use crate::price_series::{ExtendReport, PriceSeries};
use crate::schedule::HOURS_PER_DAY;
use crate::units::{Dimensionless, MoneyPerEnergy};
use crate::warning::DataIntegrityWarning;
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use std::collections::BTreeMap;
use std::hash::Hash;

/// Mean energy price for each date and hour ending (1 to 24, stored at index 0 to 23).
///
/// A cell is `None` if no timestep falls within it.
pub type EnergyPriceMap = BTreeMap<NaiveDate, [Option<MoneyPerEnergy>; HOURS_PER_DAY]>;

/// Value stream which prices energy consumption using a retail time-of-use tariff
#[derive(Debug, Clone)]
pub struct EnergyTimeShift {
    rows: Vec<BillingPeriodRow>,
    prices: PriceSeries,
    frequency: Frequency,
    growth_rate: Dimensionless,
    warnings: Vec<DataIntegrityWarning>,
}

impl EnergyTimeShift {
    /// Create a new [`EnergyTimeShift`].
    ///
    /// # Arguments
    ///
    /// * `rows` - Billing period rows making up the tariff
    /// * `prices` - Energy prices for at least one base year
    /// * `frequency` - The interval between timesteps
    /// * `growth_rate` - The fractional change in energy prices per year
    pub fn new(
        rows: Vec<BillingPeriodRow>,
        prices: PriceSeries,
        frequency: Frequency,
        growth_rate: Dimensionless,
    ) -> Self {
        Self {
            rows,
            prices,
            frequency,
            growth_rate,
            warnings: Vec::new(),
        }
    }

    /// Create the value stream for a model.
    ///
    /// If the model has no base prices, the base year is built directly from the tariff.
    pub fn from_model(model: &Model) -> Result<Self> {
        let params = &model.parameters;
        let rows = model.tariff.billing_period_rows();
        let mut warnings = match &model.tariff {
            Tariff::RateStructure(rate_structure) => rate_structure.warnings().to_vec(),
            Tariff::BillingPeriods(_) => Vec::new(),
        };

        let prices = match &model.base_prices {
            Some(prices) => prices.clone(),
            None => {
                let base_year = params.base_year();
                info!("No price file given: building energy prices for {base_year} from tariff");
                let (prices, base_warnings) =
                    PriceSeries::from_billing_periods(&rows, base_year, params.frequency)?;
                warnings.extend(base_warnings);
                prices
            }
        };

        let mut value_stream =
            Self::new(rows, prices, params.frequency, params.growth_fraction());
        value_stream.warnings = warnings;

        Ok(value_stream)
    }

    /// The name of the value stream
    pub fn name(&self) -> &'static str {
        ENERGY_COST_NAME
    }

    /// The energy price series
    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    /// The interval between timesteps
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// All data quality problems found so far
    pub fn warnings(&self) -> &[DataIntegrityWarning] {
        &self.warnings
    }

    /// Extend the energy prices to cover the given years.
    ///
    /// See [`PriceSeries::extend`].
    pub fn grow_data(&mut self, years: &[i32]) -> Result<ExtendReport> {
        let report = self
            .prices
            .extend(&self.rows, years, self.frequency, self.growth_rate)?;
        self.warnings.extend(report.warnings.iter().cloned());

        Ok(report)
    }

    /// Build the energy cost term for the timesteps selected by `mask`.
    ///
    /// # Arguments
    ///
    /// * `mask` - Selects timesteps of the price series, which must be fully covered
    /// * `flows` - Power flows at each selected timestep
    /// * `annuity_scalar` - Multiplier projecting one year's cost over a project lifetime
    pub fn objective_function<V: Eq + Hash + Clone>(
        &self,
        mask: &[bool],
        flows: &PowerFlowTerms<V>,
        annuity_scalar: Dimensionless,
    ) -> Result<CostTerms<V>> {
        let prices = self.prices.select(mask)?;
        energy_cost_terms(&prices, flows, self.frequency.duration(), annuity_scalar)
    }

    /// The energy price at every timestep, in time order
    pub fn timeseries_report(&self) -> Vec<(NaiveDateTime, MoneyPerEnergy)> {
        self.prices.iter().collect()
    }

    /// The mean energy price for each date and hour ending
    pub fn energy_price_map(&self) -> EnergyPriceMap {
        let mut totals: BTreeMap<NaiveDate, [(f64, u32); HOURS_PER_DAY]> = BTreeMap::new();
        for (timestamp, price) in self.prices.iter() {
            let hour = hour_ending(&timestamp) as usize;
            let cell = &mut totals
                .entry(timestamp.date())
                .or_insert([(0.0, 0); HOURS_PER_DAY])[hour - 1];
            cell.0 += price.value();
            cell.1 += 1;
        }

        totals
            .into_iter()
            .map(|(date, cells)| {
                let means = cells.map(|(total, count)| {
                    (count > 0).then(|| MoneyPerEnergy(total / f64::from(count)))
                });
                (date, means)
            })
            .collect()
    }
}
