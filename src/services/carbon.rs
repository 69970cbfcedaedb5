//! Carbon intensity estimate from the generation mix.
//!
//! The factors are approximate, non-authoritative g CO₂/kWh figures derived
//! from National Grid ESO's published methodology (gas 0.3294 t/MWh, biomass
//! 0.12 t/MWh, oil ~0.675 t/MWh). Imports are assumed to be gas-like. The
//! result is an indicative estimate, not an official intensity figure.

use crate::models::{CarbonIntensityRecord, FuelCategory, GenerationMix};

/// Emissions factor per category in g CO₂/kWh, indexed by [`FuelCategory::index`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionFactors([f64; 7]);

/// Default factor table used by the dashboard.
pub const UK_EMISSION_FACTORS: EmissionFactors = EmissionFactors([
    329.4, // Gas
    120.0, // Biomass
    0.0,   // Nuclear
    0.0,   // Wind
    0.0,   // Hydro
    329.4, // Imports
    675.0, // Coal/Oil/Other
]);

impl EmissionFactors {
    pub fn get(&self, category: FuelCategory) -> f64 {
        self.0[category.index()]
    }
}

impl Default for EmissionFactors {
    fn default() -> Self {
        UK_EMISSION_FACTORS
    }
}

/// Estimate carbon intensity for each interval of the generation mix.
///
/// intensity = Σ(MW × factor) / Σ MW. Intervals with zero total output are
/// omitted rather than producing NaN.
pub fn estimate_intensity(
    mix: &[GenerationMix],
    factors: &EmissionFactors,
) -> Vec<CarbonIntensityRecord> {
    mix.iter()
        .filter_map(|row| {
            let total = row.total();
            if total <= 0.0 {
                return None;
            }
            let weighted: f64 = FuelCategory::ALL
                .iter()
                .map(|&cat| row.get(cat) * factors.get(cat))
                .sum();
            let intensity = weighted / total;
            intensity.is_finite().then_some(CarbonIntensityRecord {
                timestamp: row.timestamp,
                grams_co2_per_kwh: intensity,
            })
        })
        .collect()
}
