//! Supply vs. forecast demand on the shared half-hour axis.
//!
//! FUELINST and TSDF are refreshed independently and frequently cover
//! different windows (recent out-turn vs. upcoming forecast), so overlap is
//! optional. An empty intersection is reported as [`Reconciliation::NoOverlap`]
//! rather than as an empty series.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::helpers::floor_to_half_hour;
use crate::models::{DemandRecord, GenerationRecord, ImbalanceRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// At least one half hour present in both feeds. Never empty.
    Overlap(Vec<ImbalanceRecord>),
    NoOverlap,
}

impl Reconciliation {
    pub fn records(&self) -> Option<&[ImbalanceRecord]> {
        match self {
            Reconciliation::Overlap(records) => Some(records.as_slice()),
            Reconciliation::NoOverlap => None,
        }
    }

    pub fn has_overlap(&self) -> bool {
        matches!(self, Reconciliation::Overlap(_))
    }

    /// Mean supply minus demand across the overlapping periods. `None` when
    /// there are no records.
    pub fn mean_imbalance(&self) -> Option<f64> {
        let records = self.records().filter(|r| !r.is_empty())?;
        let sum: f64 = records.iter().map(|r| r.supply_minus_demand_mw).sum();
        Some(sum / records.len() as f64)
    }
}

/// Join generation and demand on half-hour timestamps.
///
/// Generation intervals are grouped by the half hour they start in; the
/// bucket's generation is the mean of its per-interval totals (MW is a rate,
/// so averaging keeps the unit). Demand records are used at their own
/// timestamps.
pub fn reconcile(generation: &[GenerationRecord], demand: &[DemandRecord]) -> Reconciliation {
    let mut interval_totals: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for r in generation {
        *interval_totals.entry(r.timestamp).or_insert(0.0) += r.megawatts;
    }

    let mut buckets: BTreeMap<DateTime<Utc>, (f64, usize)> = BTreeMap::new();
    for (ts, total) in interval_totals {
        let bucket = buckets.entry(floor_to_half_hour(ts)).or_insert((0.0, 0));
        bucket.0 += total;
        bucket.1 += 1;
    }

    let mut records: Vec<ImbalanceRecord> = demand
        .iter()
        .filter_map(|d| {
            let (sum, count) = buckets.get(&d.timestamp)?;
            let total_generation_mw = sum / *count as f64;
            Some(ImbalanceRecord {
                timestamp: d.timestamp,
                total_generation_mw,
                demand_forecast_mw: d.forecast_megawatts,
                supply_minus_demand_mw: total_generation_mw - d.forecast_megawatts,
            })
        })
        .collect();
    records.sort_by_key(|r| r.timestamp);

    if records.is_empty() {
        Reconciliation::NoOverlap
    } else {
        Reconciliation::Overlap(records)
    }
}
