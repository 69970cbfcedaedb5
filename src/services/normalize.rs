//! Raw rows → typed time series.
//!
//! Row-level problems (bad timestamp, missing or non-finite value) drop that
//! row only and are counted in [`Normalized::dropped`].

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::helpers::{floor_to_half_hour, parse_timestamp};
use crate::models::{DemandRecord, FuelCategory, GenerationMix, GenerationRecord};
use crate::services::fetcher::{RawDemandRow, RawFuelRow};

/// TSDF boundary code for the national (GB-wide) forecast.
const NATIONAL_BOUNDARY: &str = "N";

/// Interconnector fuel codes published in FUELINST.
const INTERCONNECTORS: [&str; 10] = [
    "INTELEC", "INTEW", "INTFR", "INTGRNL", "INTIFA2", "INTIRL", "INTNED", "INTNEM", "INTNSL",
    "INTVKL",
];

/// Normalized records plus the number of rows that could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub dropped: usize,
}

/// Map a raw FUELINST fuel code to its broad category.
///
/// Unknown codes land in `CoalOilOther` so new upstream codes never break
/// the pipeline.
pub fn categorise_fuel_type(code: &str) -> FuelCategory {
    let code = code.trim().to_ascii_uppercase();
    match code.as_str() {
        "CCGT" | "OCGT" => FuelCategory::Gas,
        "BIOMASS" => FuelCategory::Biomass,
        "COAL" | "OIL" | "OTHER" => FuelCategory::CoalOilOther,
        "NUCLEAR" => FuelCategory::Nuclear,
        "WIND" => FuelCategory::Wind,
        "NPSHYD" | "PS" => FuelCategory::Hydro,
        c if INTERCONNECTORS.contains(&c) => FuelCategory::Imports,
        _ => FuelCategory::CoalOilOther,
    }
}

/// Turn FUELINST rows into one record per (interval, category).
///
/// Negative values (pumped-storage pumping, interconnector exports) are
/// clipped to zero before summing codes that share a category.
pub fn normalize_generation(rows: &[RawFuelRow]) -> Normalized<GenerationRecord> {
    let mut sums: BTreeMap<(DateTime<Utc>, FuelCategory), f64> = BTreeMap::new();
    let mut dropped = 0;

    for row in rows {
        let parsed = row
            .start_time
            .as_deref()
            .and_then(parse_timestamp)
            .zip(row.fuel_type.as_deref())
            .zip(row.generation.filter(|g| g.is_finite()));

        let Some(((timestamp, fuel_type), generation)) = parsed else {
            tracing::debug!("Dropping malformed FUELINST row: {:?}", row);
            dropped += 1;
            continue;
        };

        *sums
            .entry((timestamp, categorise_fuel_type(fuel_type)))
            .or_insert(0.0) += generation.max(0.0);
    }

    let records = sums
        .into_iter()
        .map(|((timestamp, fuel_category), megawatts)| GenerationRecord {
            timestamp,
            fuel_category,
            megawatts,
        })
        .collect();

    Normalized { records, dropped }
}

/// Turn TSDF rows into one national demand forecast per half hour.
///
/// When several forecasts cover the same half hour, the most recently
/// published one wins; a row without a publish time counts as oldest.
pub fn normalize_demand(rows: &[RawDemandRow]) -> Normalized<DemandRecord> {
    let mut latest: BTreeMap<DateTime<Utc>, (Option<DateTime<Utc>>, f64)> = BTreeMap::new();
    let mut dropped = 0;
    let mut zonal = 0;

    for row in rows {
        if row
            .boundary
            .as_deref()
            .is_some_and(|b| !b.trim().eq_ignore_ascii_case(NATIONAL_BOUNDARY))
        {
            zonal += 1;
            continue;
        }

        let parsed = row
            .start_time
            .as_deref()
            .and_then(parse_timestamp)
            .zip(row.demand.filter(|d| d.is_finite()));

        let Some((start, demand)) = parsed else {
            tracing::debug!("Dropping malformed TSDF row: {:?}", row);
            dropped += 1;
            continue;
        };

        let published = row.publish_time.as_deref().and_then(parse_timestamp);
        let slot = floor_to_half_hour(start);

        match latest.get(&slot) {
            Some((existing, _)) if *existing > published => {}
            _ => {
                latest.insert(slot, (published, demand));
            }
        }
    }

    if zonal > 0 {
        tracing::debug!("Skipped {} zonal TSDF rows", zonal);
    }

    let records = latest
        .into_iter()
        .map(|(timestamp, (_, forecast_megawatts))| DemandRecord {
            timestamp,
            forecast_megawatts,
        })
        .collect();

    Normalized { records, dropped }
}

/// Pivot generation records into one zero-filled row per timestamp.
pub fn generation_mix(records: &[GenerationRecord]) -> Vec<GenerationMix> {
    let mut by_time: BTreeMap<DateTime<Utc>, GenerationMix> = BTreeMap::new();
    for r in records {
        by_time
            .entry(r.timestamp)
            .or_insert_with(|| GenerationMix::empty(r.timestamp))
            .megawatts[r.fuel_category.index()] += r.megawatts;
    }
    by_time.into_values().collect()
}
