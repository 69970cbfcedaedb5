//! Startup data load: fetch → normalize → estimate → reconcile.
//!
//! Runs once per process. The resulting [`DashboardSnapshot`] is immutable and
//! shared with the HTTP handlers behind an `Arc`; nothing refreshes it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::models::{CarbonIntensityRecord, Dataset, GenerationMix};
use crate::services::carbon::{estimate_intensity, EmissionFactors};
use crate::services::fetcher::{fetch_dataset, DataSource, FetchedRows, RawDemandRow, RawFuelRow};
use crate::services::normalize::{generation_mix, normalize_demand, normalize_generation};
use crate::services::reconcile::{reconcile, Reconciliation};

/// Where a dataset came from and how much of it survived cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SourceReport {
    pub dataset: Dataset,
    /// Description of the source that served the rows (remote URL or file path)
    pub source: String,
    /// Whether the remote endpoint failed and a local file was used
    pub fallback: bool,
    /// Typed records produced by normalization
    pub records: usize,
    /// Rows that could not be decoded or parsed
    pub dropped: usize,
}

/// Everything the dashboard renders, computed once at startup.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub loaded_at: DateTime<Utc>,
    pub mix: Vec<GenerationMix>,
    pub intensity: Vec<CarbonIntensityRecord>,
    pub reconciliation: Reconciliation,
    pub sources: Vec<SourceReport>,
}

/// Shared snapshot handle.
pub type SharedSnapshot = Arc<DashboardSnapshot>;

impl DashboardSnapshot {
    /// Build the snapshot from already-fetched rows. Pure, no I/O.
    pub fn build(
        fuel: &FetchedRows<RawFuelRow>,
        demand: &FetchedRows<RawDemandRow>,
        factors: &EmissionFactors,
    ) -> Self {
        let generation = normalize_generation(&fuel.rows);
        let demand_records = normalize_demand(&demand.rows);

        let mix = generation_mix(&generation.records);
        let intensity = estimate_intensity(&mix, factors);
        let reconciliation = reconcile(&generation.records, &demand_records.records);

        let sources = vec![
            SourceReport {
                dataset: fuel.dataset,
                source: fuel.source.clone(),
                fallback: fuel.fallback,
                records: generation.records.len(),
                dropped: fuel.undecodable + generation.dropped,
            },
            SourceReport {
                dataset: demand.dataset,
                source: demand.source.clone(),
                fallback: demand.fallback,
                records: demand_records.records.len(),
                dropped: demand.undecodable + demand_records.dropped,
            },
        ];

        Self {
            loaded_at: Utc::now(),
            mix,
            intensity,
            reconciliation,
            sources,
        }
    }
}

/// Fetch both datasets (sequentially) and build the snapshot.
///
/// Fails only with `DataUnavailable` when every source for a dataset failed.
pub async fn load_snapshot(
    sources: &[DataSource],
    factors: &EmissionFactors,
) -> Result<DashboardSnapshot, AppError> {
    tracing::info!("Fetching data from Elexon");
    let fuel = fetch_dataset::<RawFuelRow>(sources).await?;
    let demand = fetch_dataset::<RawDemandRow>(sources).await?;

    tracing::info!("Processing data");
    let snapshot = DashboardSnapshot::build(&fuel, &demand, factors);

    for report in &snapshot.sources {
        tracing::info!(
            "{}: {} records from {} ({} rows dropped)",
            report.dataset,
            report.records,
            report.source,
            report.dropped
        );
    }

    match snapshot.reconciliation.mean_imbalance() {
        Some(mean) => tracing::info!(
            "Average supply minus forecast demand over overlap: {:.1} MW",
            mean
        ),
        None => tracing::warn!(
            "No overlapping half-hour periods between generation and demand forecast; \
             supply-demand chart will be omitted"
        ),
    }

    Ok(snapshot)
}
