//! Non-fatal data quality problems found while processing a tariff.
//!
//! These are logged when raised and also handed back to the caller, but never stop a run.
use derive_more::Display;
use log::warn;

/// A data quality problem which does not prevent the calculation from continuing
#[derive(Debug, Clone, PartialEq, Display)]
pub enum DataIntegrityWarning {
    /// The tariff defines no periods, so all prices will be zero
    #[display("Rate structure contains no periods: energy prices will all be zero")]
    EmptyRateStructure,
    /// A period is never referenced by either schedule
    #[display("Period {period} is not active in any weekday or weekend schedule cell")]
    UnreachablePeriod {
        /// The 1-based period number
        period: u32,
    },
    /// A billing row added a price to timesteps which already had one
    #[display(
        "More than one energy price applies to the same time step \
        ({timesteps} timesteps in {year}, billing row '{row}')"
    )]
    OverlappingPrices {
        /// The year being constructed
        year: i32,
        /// Label of the billing row whose contribution overlapped
        row: String,
        /// The number of timesteps affected
        timesteps: usize,
    },
}

impl DataIntegrityWarning {
    /// Write the warning to the program log and return it
    pub fn log(self) -> Self {
        warn!("{self}");
        self
    }
}
