//! Code for reading a base series of energy prices from a CSV file.
use super::{input_err_msg, read_csv};
use crate::price_series::PriceSeries;
use crate::units::MoneyPerEnergy;
use anyhow::{Context, Result, ensure};
use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

/// Accepted formats for timestamps in price files
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(PartialEq, Debug, Deserialize)]
struct PriceRaw {
    datetime: String,
    price: f64,
}

/// Read a base price series from a CSV file with `datetime` and `price` columns.
///
/// Timestamps must be strictly increasing.
pub fn read_price_series(file_path: &Path) -> Result<PriceSeries> {
    let prices_csv = read_csv::<PriceRaw>(file_path)?;
    read_price_series_iter(prices_csv).with_context(|| input_err_msg(file_path))
}

fn read_price_series_iter<I>(iter: I) -> Result<PriceSeries>
where
    I: Iterator<Item = PriceRaw>,
{
    let points: Vec<_> = iter
        .map(|raw| {
            let timestamp = parse_datetime(&raw.datetime)?;
            ensure!(
                raw.price.is_finite(),
                "Price at {timestamp} must be a finite number"
            );
            Ok((timestamp, MoneyPerEnergy(raw.price)))
        })
        .try_collect()?;

    PriceSeries::from_points(points)
}

/// Parse a timestamp in one of the accepted formats
fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .with_context(|| {
            format!(
                "Invalid timestamp '{s}': expected format {}",
                DATETIME_FORMATS.iter().join(" or ")
            )
        })
}
