//! Typed time-series records shared by the pipeline stages and the routes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// The two Elexon BMRS datasets this service consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum Dataset {
    /// Instantaneous generation out-turn by fuel type.
    #[serde(rename = "FUELINST")]
    Fuelinst,
    /// Total system demand forecast.
    #[serde(rename = "TSDF")]
    Tsdf,
}

impl Dataset {
    /// Dataset name as used in the BMRS URL path and fallback filenames.
    pub fn name(self) -> &'static str {
        match self {
            Dataset::Fuelinst => "FUELINST",
            Dataset::Tsdf => "TSDF",
        }
    }

    /// Fallback filenames, in the order they are tried.
    pub fn fallback_files(self) -> &'static [&'static str] {
        match self {
            Dataset::Fuelinst => &["FUELINST.csv", "FUELINST.json"],
            Dataset::Tsdf => &["TSDF.json", "TSDF.csv"],
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Broad generation category. Closed set: every raw fuel code maps into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
pub enum FuelCategory {
    Gas,
    Biomass,
    Nuclear,
    Wind,
    Hydro,
    Imports,
    #[serde(rename = "Coal/Oil/Other")]
    CoalOilOther,
}

impl FuelCategory {
    /// All categories, in chart stacking order.
    pub const ALL: [FuelCategory; 7] = [
        FuelCategory::Gas,
        FuelCategory::Biomass,
        FuelCategory::Nuclear,
        FuelCategory::Wind,
        FuelCategory::Hydro,
        FuelCategory::Imports,
        FuelCategory::CoalOilOther,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FuelCategory::Gas => "Gas",
            FuelCategory::Biomass => "Biomass",
            FuelCategory::Nuclear => "Nuclear",
            FuelCategory::Wind => "Wind",
            FuelCategory::Hydro => "Hydro",
            FuelCategory::Imports => "Imports",
            FuelCategory::CoalOilOther => "Coal/Oil/Other",
        }
    }

    /// Position in [`FuelCategory::ALL`].
    pub fn index(self) -> usize {
        match self {
            FuelCategory::Gas => 0,
            FuelCategory::Biomass => 1,
            FuelCategory::Nuclear => 2,
            FuelCategory::Wind => 3,
            FuelCategory::Hydro => 4,
            FuelCategory::Imports => 5,
            FuelCategory::CoalOilOther => 6,
        }
    }
}

impl fmt::Display for FuelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Generation output of one category during one source interval.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRecord {
    pub timestamp: DateTime<Utc>,
    pub fuel_category: FuelCategory,
    /// Non-negative output in MW (negative source values are clipped).
    pub megawatts: f64,
}

/// Forecast national demand for one half-hour settlement period.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandRecord {
    pub timestamp: DateTime<Utc>,
    pub forecast_megawatts: f64,
}

/// Estimated carbon intensity for one generation interval.
#[derive(Debug, Clone, PartialEq)]
pub struct CarbonIntensityRecord {
    pub timestamp: DateTime<Utc>,
    pub grams_co2_per_kwh: f64,
}

/// Supply minus forecast demand for one half-hour period present in both feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ImbalanceRecord {
    pub timestamp: DateTime<Utc>,
    pub total_generation_mw: f64,
    pub demand_forecast_mw: f64,
    pub supply_minus_demand_mw: f64,
}

/// Generation at one timestamp with every category present (zero-filled).
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationMix {
    pub timestamp: DateTime<Utc>,
    /// Indexed by [`FuelCategory::index`].
    pub megawatts: [f64; 7],
}

impl GenerationMix {
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            megawatts: [0.0; 7],
        }
    }

    pub fn get(&self, category: FuelCategory) -> f64 {
        self.megawatts[category.index()]
    }

    pub fn total(&self) -> f64 {
        self.megawatts.iter().sum()
    }
}
