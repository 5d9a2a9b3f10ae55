//! Code for loading a model: its parameters, tariff and any base energy prices.
use crate::billing_period::{BillingPeriodRow, rows_from_rate_structure};
use crate::input::{input_err_msg, read_billing_periods, read_price_series, read_rate_structure};
use crate::price_series::PriceSeries;
use crate::rate_structure::RateStructure;
use anyhow::{Context, Result, bail};
use log::info;
use std::path::{Path, PathBuf};

pub mod parameters;
pub use parameters::ModelParameters;

/// The tariff from which energy prices are built
#[derive(Debug, Clone, PartialEq)]
pub enum Tariff {
    /// A tiered time-of-use rate structure with weekday and weekend schedules
    RateStructure(RateStructure),
    /// A table of billing periods
    BillingPeriods(Vec<BillingPeriodRow>),
}

impl Tariff {
    /// Read a tariff from a file, choosing the format by file extension.
    ///
    /// `.toml` files hold a rate structure and `.csv` files a billing period table.
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let extension = file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("toml") => Ok(Self::RateStructure(read_rate_structure(file_path)?)),
            Some("csv") => Ok(Self::BillingPeriods(read_billing_periods(file_path)?)),
            _ => bail!(
                "Unsupported tariff file {}: expected a .toml or .csv file",
                file_path.display()
            ),
        }
    }

    /// The billing period rows which make up the tariff
    pub fn billing_period_rows(&self) -> Vec<BillingPeriodRow> {
        match self {
            Self::RateStructure(rate_structure) => rows_from_rate_structure(rate_structure),
            Self::BillingPeriods(rows) => rows.clone(),
        }
    }
}

/// Model definition
pub struct Model {
    /// Path to the model folder
    pub model_path: PathBuf,
    /// Parameters from the model file
    pub parameters: ModelParameters,
    /// The tariff
    pub tariff: Tariff,
    /// Base energy prices, if a price file was given
    pub base_prices: Option<PriceSeries>,
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let model_dir = model_dir.as_ref();
        let parameters = ModelParameters::from_path(model_dir)?;
        let tariff = Tariff::from_path(&model_dir.join(&parameters.tariff_file))?;
        let base_prices = parameters
            .price_file
            .as_ref()
            .map(|price_file| -> Result<PriceSeries> {
                let file_path = model_dir.join(price_file);
                let prices = read_price_series(&file_path)?;
                prices
                    .check_frequency(parameters.frequency)
                    .with_context(|| input_err_msg(&file_path))?;
                Ok(prices)
            })
            .transpose()?;
        info!("Loaded model from {}", model_dir.display());

        Ok(Model {
            model_path: model_dir.to_path_buf(),
            parameters,
            tariff,
            base_prices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_tariff_from_path_unsupported() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tariff.json");
        File::create(&file_path).unwrap();
        assert!(Tariff::from_path(&file_path).is_err());
    }

    /// Write a model with a flat billing period tariff and the given base prices
    fn write_model(dir: &Path, frequency: &str, prices: &str) {
        let mut file = File::create(dir.join("model.toml")).unwrap();
        writeln!(
            file,
            "years = [2024]\nfrequency = \"{frequency}\"\ntariff_file = \"tariff.csv\"\n\
            price_file = \"prices.csv\""
        )
        .unwrap();
        let mut file = File::create(dir.join("tariff.csv")).unwrap();
        writeln!(
            file,
            "billing_period,start_month,end_month,start_time,end_time,excluding_start_time,\
            excluding_end_time,weekday,value,charge\n1,1,12,1,24,,,all,0.1,energy"
        )
        .unwrap();
        let mut file = File::create(dir.join("prices.csv")).unwrap();
        writeln!(file, "datetime,price\n{prices}").unwrap();
    }

    #[test]
    fn test_model_from_path() {
        let dir = tempdir().unwrap();
        write_model(dir.path(), "1h", "2023-01-01 00:00:00,0.1");

        let model = Model::from_path(dir.path()).unwrap();
        assert_eq!(model.parameters.years, [2024]);
        assert_eq!(model.tariff.billing_period_rows().len(), 1);
        assert_eq!(model.base_prices.unwrap().len(), 1);
    }

    #[test]
    fn test_model_from_path_price_frequency_mismatch() {
        let dir = tempdir().unwrap();
        write_model(
            dir.path(),
            "15min",
            "2023-01-01 00:00:00,0.2\n2023-01-01 01:00:00,0.2",
        );

        let result = Model::from_path(dir.path());
        let chain = result
            .err()
            .unwrap()
            .chain()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        assert_eq!(
            chain,
            [
                input_err_msg(dir.path().join("prices.csv")),
                "Timestamps must be 15min apart (2023-01-01 01:00:00 follows 2023-01-01 00:00:00)"
                    .to_string()
            ]
        );
    }
}
