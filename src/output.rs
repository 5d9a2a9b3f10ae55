//! The module responsible for writing output data to disk.
use crate::schedule::HOURS_PER_DAY;
use crate::units::MoneyPerEnergy;
use crate::value_stream::EnergyPriceMap;
use anyhow::{Context, Result, ensure};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "tariff_ets_results";

/// The output file name for the energy price time series
const ENERGY_PRICES_FILE_NAME: &str = "energy_prices.csv";

/// The output file name for the energy price map
const ENERGY_PRICE_MAP_FILE_NAME: &str = "energy_price_map.csv";

/// The format used for timestamps in output files
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The format used for dates in column headers
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Get the model name from the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory.
///
/// An existing, non-empty directory is only replaced if `overwrite` is true.
///
/// # Returns
///
/// Whether an existing directory was overwritten
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    let mut overwritten = false;
    if output_dir.is_dir() {
        let is_empty = output_dir.read_dir()?.next().is_none();
        if is_empty {
            return Ok(false);
        }

        ensure!(
            overwrite,
            "Output folder already exists and is not empty. Use --overwrite to replace it."
        );
        fs::remove_dir_all(output_dir)?;
        overwritten = true;
    }

    fs::create_dir_all(output_dir)?;

    Ok(overwritten)
}

/// Represents a row in the energy prices CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct EnergyPriceRow {
    datetime: String,
    energy_price: f64,
}

/// Write the energy price at every timestep to `energy_prices.csv`
pub fn write_energy_prices<I>(output_path: &Path, prices: I) -> Result<()>
where
    I: IntoIterator<Item = (NaiveDateTime, MoneyPerEnergy)>,
{
    let file_path = output_path.join(ENERGY_PRICES_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for (timestamp, price) in prices {
        writer.serialize(EnergyPriceRow {
            datetime: timestamp.format(DATETIME_FORMAT).to_string(),
            energy_price: price.value(),
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the energy price map to `energy_price_map.csv`.
///
/// There is one row per hour ending and one column per date. Empty cells have no timesteps.
pub fn write_energy_price_map(output_path: &Path, map: &EnergyPriceMap) -> Result<()> {
    let file_path = output_path.join(ENERGY_PRICE_MAP_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;

    let header = std::iter::once("hour_ending".to_string())
        .chain(map.keys().map(|date| date.format(DATE_FORMAT).to_string()));
    writer.write_record(header)?;

    for hour in 0..HOURS_PER_DAY {
        let cells = map.values().map(|prices| {
            prices[hour]
                .map(|price| price.value().to_string())
                .unwrap_or_default()
        });
        writer.write_record(std::iter::once((hour + 1).to_string()).chain(cells))?;
    }
    writer.flush()?;

    Ok(())
}
