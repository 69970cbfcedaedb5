//! Chart data HTTP endpoints.
//!
//! - GET /api/v1/dashboard
//! - GET /api/v1/charts/generation
//! - GET /api/v1/charts/carbon-intensity
//! - GET /api/v1/charts/imbalance

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::helpers::{round_1dp, to_london};
use crate::models::{CarbonIntensityRecord, FuelCategory, GenerationMix, ImbalanceRecord};
use crate::services::reconcile::Reconciliation;
use crate::services::snapshot::SharedSnapshot;

/// Headroom above the peak intensity for the y-axis.
const INTENSITY_Y_HEADROOM: f64 = 1.1;

const TIME_AXIS_LABEL: &str = "Time (Europe/London)";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

// Point timestamps carry the Europe/London offset; Plotly draws the wall-clock
// time as written and ignores the offset.

/// One category's output at one timestamp (long format for stacked areas).
#[derive(Debug, Serialize, ToSchema)]
pub struct GenerationPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub category: FuelCategory,
    /// Output in MW
    pub megawatts: f64,
}

/// Stacked-area chart: generation mix by fuel category.
#[derive(Debug, Serialize, ToSchema)]
pub struct GenerationChart {
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    /// Categories in stacking order
    pub categories: Vec<FuelCategory>,
    pub points: Vec<GenerationPoint>,
}

impl GenerationChart {
    pub fn from_mix(mix: &[GenerationMix]) -> Self {
        let points = mix
            .iter()
            .flat_map(|row| {
                let timestamp = to_london(row.timestamp);
                FuelCategory::ALL.iter().map(move |&category| GenerationPoint {
                    timestamp,
                    category,
                    megawatts: row.get(category),
                })
            })
            .collect();

        Self {
            title: "Generation Mix by Fuel Category".to_string(),
            x_axis_label: TIME_AXIS_LABEL.to_string(),
            y_axis_label: "Generation (MW)".to_string(),
            categories: FuelCategory::ALL.to_vec(),
            points,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IntensityPoint {
    pub timestamp: DateTime<FixedOffset>,
    /// g CO₂/kWh, one decimal place
    pub grams_co2_per_kwh: f64,
}

/// Line chart: estimated carbon intensity.
#[derive(Debug, Serialize, ToSchema)]
pub struct IntensityChart {
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    /// Suggested y-axis upper bound (peak + 10%); absent when there is no positive value
    pub y_axis_max: Option<f64>,
    /// Caveat shown under the chart
    pub note: String,
    pub points: Vec<IntensityPoint>,
}

impl IntensityChart {
    pub fn from_records(records: &[CarbonIntensityRecord]) -> Self {
        let points: Vec<IntensityPoint> = records
            .iter()
            .map(|r| IntensityPoint {
                timestamp: to_london(r.timestamp),
                grams_co2_per_kwh: round_1dp(r.grams_co2_per_kwh),
            })
            .collect();

        let peak = points
            .iter()
            .map(|r| r.grams_co2_per_kwh)
            .fold(f64::NEG_INFINITY, f64::max);
        let y_axis_max =
            (peak.is_finite() && peak > 0.0).then(|| round_1dp(peak * INTENSITY_Y_HEADROOM));

        Self {
            title: "Estimated Carbon Intensity".to_string(),
            x_axis_label: TIME_AXIS_LABEL.to_string(),
            y_axis_label: "Carbon Intensity (g/kWh)".to_string(),
            y_axis_max,
            note: "Indicative estimate from static, approximate emission factors.".to_string(),
            points,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImbalancePoint {
    pub timestamp: DateTime<FixedOffset>,
    pub total_generation_mw: f64,
    pub demand_forecast_mw: f64,
    pub supply_minus_demand_mw: f64,
}

impl From<&ImbalanceRecord> for ImbalancePoint {
    fn from(r: &ImbalanceRecord) -> Self {
        Self {
            timestamp: to_london(r.timestamp),
            total_generation_mw: r.total_generation_mw,
            demand_forecast_mw: r.demand_forecast_mw,
            supply_minus_demand_mw: r.supply_minus_demand_mw,
        }
    }
}

/// Line chart: half-hourly supply minus forecast demand.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImbalanceChart {
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    /// Mean supply minus demand across the overlap, in MW
    pub mean_supply_minus_demand_mw: f64,
    pub points: Vec<ImbalancePoint>,
}

impl ImbalanceChart {
    /// `None` when generation and demand do not overlap.
    pub fn from_reconciliation(reconciliation: &Reconciliation) -> Option<Self> {
        let records = reconciliation.records()?;
        let mean = reconciliation.mean_imbalance()?;
        Some(Self {
            title: "Supply Minus Demand (Half-hourly)".to_string(),
            x_axis_label: TIME_AXIS_LABEL.to_string(),
            y_axis_label: "Supply − Demand (MW)".to_string(),
            mean_supply_minus_demand_mw: round_1dp(mean),
            points: records.iter().map(ImbalancePoint::from).collect(),
        })
    }
}

/// All dashboard charts in one document.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    /// When the data snapshot was loaded
    pub loaded_at: DateTime<Utc>,
    pub generation: GenerationChart,
    pub carbon_intensity: IntensityChart,
    /// `null` when generation and demand periods do not overlap
    pub imbalance: Option<ImbalanceChart>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Get all chart series.
///
/// The imbalance chart is `null` when the generation and demand feeds share
/// no half-hour period.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Charts",
    responses(
        (status = 200, description = "All chart series", body = DashboardResponse),
    )
)]
pub async fn get_dashboard(State(snapshot): State<SharedSnapshot>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        loaded_at: snapshot.loaded_at,
        generation: GenerationChart::from_mix(&snapshot.mix),
        carbon_intensity: IntensityChart::from_records(&snapshot.intensity),
        imbalance: ImbalanceChart::from_reconciliation(&snapshot.reconciliation),
    })
}

/// Get the generation mix series.
#[utoipa::path(
    get,
    path = "/api/v1/charts/generation",
    tag = "Charts",
    responses(
        (status = 200, description = "Generation by category", body = GenerationChart),
    )
)]
pub async fn get_generation_chart(State(snapshot): State<SharedSnapshot>) -> Json<GenerationChart> {
    Json(GenerationChart::from_mix(&snapshot.mix))
}

/// Get the carbon intensity series.
#[utoipa::path(
    get,
    path = "/api/v1/charts/carbon-intensity",
    tag = "Charts",
    responses(
        (status = 200, description = "Estimated carbon intensity", body = IntensityChart),
    )
)]
pub async fn get_carbon_intensity_chart(
    State(snapshot): State<SharedSnapshot>,
) -> Json<IntensityChart> {
    Json(IntensityChart::from_records(&snapshot.intensity))
}

/// Get the supply minus demand series.
#[utoipa::path(
    get,
    path = "/api/v1/charts/imbalance",
    tag = "Charts",
    responses(
        (status = 200, description = "Supply minus forecast demand", body = ImbalanceChart),
        (status = 404, description = "No overlapping half-hour periods", body = ErrorResponse),
    )
)]
pub async fn get_imbalance_chart(
    State(snapshot): State<SharedSnapshot>,
) -> Result<Json<ImbalanceChart>, AppError> {
    ImbalanceChart::from_reconciliation(&snapshot.reconciliation)
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(
                "No overlapping half-hour periods between generation and demand forecast"
                    .to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse::<DateTime<Utc>>().unwrap()
    }

    #[test]
    fn test_generation_chart_long_format() {
        let mut mix = GenerationMix::empty(utc("2025-01-15T00:00:00Z"));
        mix.megawatts[FuelCategory::Gas.index()] = 100.0;

        let chart = GenerationChart::from_mix(&[mix]);
        assert_eq!(chart.points.len(), 7, "one point per category");
        assert_eq!(chart.points[0].category, FuelCategory::Gas);
        assert_eq!(chart.points[0].megawatts, 100.0);
        assert!(chart.points[1..].iter().all(|p| p.megawatts == 0.0));
    }

    #[test]
    fn test_intensity_chart_headroom() {
        let records = vec![
            CarbonIntensityRecord {
                timestamp: utc("2025-01-15T00:00:00Z"),
                grams_co2_per_kwh: 200.04,
            },
            CarbonIntensityRecord {
                timestamp: utc("2025-01-15T00:05:00Z"),
                grams_co2_per_kwh: 100.0,
            },
        ];
        let chart = IntensityChart::from_records(&records);
        assert_eq!(chart.points[0].grams_co2_per_kwh, 200.0);
        assert_eq!(chart.y_axis_max, Some(220.0));
    }

    #[test]
    fn test_intensity_chart_no_axis_for_empty_or_zero() {
        assert_eq!(IntensityChart::from_records(&[]).y_axis_max, None);
        let zero = vec![CarbonIntensityRecord {
            timestamp: utc("2025-01-15T00:00:00Z"),
            grams_co2_per_kwh: 0.0,
        }];
        assert_eq!(IntensityChart::from_records(&zero).y_axis_max, None);
    }

    #[test]
    fn test_chart_timestamps_in_london_time() {
        let mut mix = GenerationMix::empty(utc("2025-07-01T11:00:00Z"));
        mix.megawatts[FuelCategory::Wind.index()] = 50.0;
        let generation = serde_json::to_value(GenerationChart::from_mix(&[mix])).unwrap();
        assert_eq!(
            generation["points"][0]["timestamp"],
            "2025-07-01T12:00:00+01:00"
        );

        let intensity = serde_json::to_value(IntensityChart::from_records(&[
            CarbonIntensityRecord {
                timestamp: utc("2025-07-01T11:00:00Z"),
                grams_co2_per_kwh: 10.0,
            },
        ]))
        .unwrap();
        assert_eq!(
            intensity["points"][0]["timestamp"],
            "2025-07-01T12:00:00+01:00"
        );

        let reconciliation = Reconciliation::Overlap(vec![ImbalanceRecord {
            timestamp: utc("2025-01-15T11:00:00Z"),
            total_generation_mw: 150.0,
            demand_forecast_mw: 120.0,
            supply_minus_demand_mw: 30.0,
        }]);
        let chart = ImbalanceChart::from_reconciliation(&reconciliation).unwrap();
        let imbalance = serde_json::to_value(chart).unwrap();
        assert_eq!(
            imbalance["points"][0]["timestamp"],
            "2025-01-15T11:00:00+00:00",
            "GMT in winter"
        );
    }

    #[test]
    fn test_imbalance_chart_absent_without_overlap() {
        assert!(ImbalanceChart::from_reconciliation(&Reconciliation::NoOverlap).is_none());
    }
}
