//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::calendar::Frequency;
use crate::input::{
    deserialise_growth_percentage, input_err_msg, is_sorted_and_unique, read_toml,
};
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

fn default_frequency() -> Frequency {
    Frequency::hourly()
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// The calendar years for which energy prices are required
    pub years: Vec<i32>,
    /// The interval between timesteps
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,
    /// Annual change in energy prices, as a percentage
    #[serde(default, deserialize_with = "deserialise_growth_percentage")]
    pub growth_rate: f64,
    /// Tariff file, relative to the model directory.
    ///
    /// Either a rate structure (`.toml`) or a billing period table (`.csv`).
    pub tariff_file: PathBuf,
    /// File containing base energy prices, relative to the model directory
    pub price_file: Option<PathBuf>,
    /// The year built directly from the tariff if no price file is given
    pub base_year: Option<i32>,
}

/// Check that the `years` parameter is valid
fn check_years(years: &[i32]) -> Result<()> {
    ensure!(!years.is_empty(), "`years` is empty");

    ensure!(
        is_sorted_and_unique(years),
        "`years` must be composed of unique values in order"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// The annual growth rate as a fraction
    pub fn growth_fraction(&self) -> Dimensionless {
        Dimensionless(self.growth_rate / 100.0)
    }

    /// The year to build from the tariff when there is no price file
    pub fn base_year(&self) -> i32 {
        // years is checked to be non-empty
        self.base_year.unwrap_or(self.years[0])
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_years(&self.years)?;

        ensure!(
            self.price_file.is_none() || self.base_year.is_none(),
            "`base_year` cannot be given together with `price_file`"
        );

        Ok(())
    }
}
