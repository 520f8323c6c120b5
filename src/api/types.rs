//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::sim::SimulationResult;
use crate::sim::types::TariffStructure;

/// Scenario plus the headline figures of its run.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub scenario: ScenarioConfig,
    pub structure: TariffStructure,
    /// `(start, end)` month labels.
    pub period_label: (String, String),
    pub months: usize,
    pub overall_discount: f64,
    pub total_savings: f64,
    pub npv_savings: f64,
    pub total_acr_spend: f64,
    pub total_acl_spend: f64,
}

impl SummaryResponse {
    pub fn new(scenario: &ScenarioConfig, result: &SimulationResult) -> Self {
        Self {
            scenario: scenario.clone(),
            structure: result.structure,
            period_label: result.period_label.clone(),
            months: result.monthly.len(),
            overall_discount: result.overall_discount,
            total_savings: result.total_savings,
            npv_savings: result.npv_savings,
            total_acr_spend: result.total_acr_spend,
            total_acl_spend: result.total_acl_spend,
        }
    }
}

/// Optional range query parameters for the monthly endpoint.
///
/// Indices count contract months from 0.
#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    /// First month index (inclusive).
    pub from: Option<usize>,
    /// Last month index (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
