//! Functionality for building the energy prices of a model.
use crate::model::Model;
use crate::output::{write_energy_price_map, write_energy_prices};
use crate::value_stream::EnergyTimeShift;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

/// Run the model.
///
/// Energy prices are extended to cover every year of the model and written to the output folder.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
///
/// # Returns
///
/// The value stream holding the completed price series
pub fn run(model: &Model, output_path: &Path) -> Result<EnergyTimeShift> {
    let mut value_stream =
        EnergyTimeShift::from_model(model).context("Failed to create energy value stream")?;
    info!(
        "Building {} energy prices at {} intervals",
        value_stream.name(),
        value_stream.frequency()
    );

    let years = &model.parameters.years;
    let report = value_stream.grow_data(years)?;
    for year in years {
        if report.added_years.contains(year) {
            info!("Year {year}: prices extrapolated from tariff");
        } else {
            info!("Year {year}: prices taken from base data");
        }
    }

    write_energy_prices(output_path, value_stream.timeseries_report())?;
    write_energy_price_map(output_path, &value_stream.energy_price_map())?;

    let warning_count = value_stream.warnings().len();
    if warning_count > 0 {
        warn!("{warning_count} data integrity warning(s) raised while building energy prices");
    }

    Ok(value_stream)
}
