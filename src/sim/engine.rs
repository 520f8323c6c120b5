//! Simulation facade: series projection, monthly evaluation, and result assembly.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::locale::{format_brl, format_percent, format_period};

use super::aggregate::{AnnualResult, aggregate_annual, savings_npv};
use super::evaluator::MonthlyEvaluator;
use super::finance::blended_discount;
use super::series::TariffSeries;
use super::types::{MonthlyResult, SimulationParams, TariffSnapshot, TariffStructure, month_label};

/// Full payload of one simulation run.
///
/// The per-year arrays duplicate `annual` in parallel-vector form for
/// charting and export collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub monthly: Vec<MonthlyResult>,
    pub annual: Vec<AnnualResult>,
    /// `1 - total ACL spend / total ACR spend`.
    pub overall_discount: f64,
    /// Nominal savings over the whole contract (R$).
    pub total_savings: f64,
    /// Net present value of the yearly savings (R$).
    pub npv_savings: f64,
    pub total_acr_spend: f64,
    pub total_acl_spend: f64,
    /// `(start, end)` labels, e.g. `("Jan/2025", "Dez/2027")`.
    pub period_label: (String, String),
    /// Display form of the period, e.g. `"Jan/2025 a Dez/2027"`.
    pub period: String,
    pub years: Vec<i32>,
    pub acr_spend_by_year: Vec<f64>,
    pub acl_spend_by_year: Vec<f64>,
    pub savings_by_year: Vec<f64>,
    pub structure: TariffStructure,
    /// Base snapshot the projection started from.
    pub tariff: TariffSnapshot,
}

/// Runs the pipeline for one consumer unit.
///
/// Holds no state beyond the borrowed parameters, so separate units can be
/// simulated on separate threads without coordination.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    params: &'a SimulationParams,
    series: TariffSeries,
}

impl<'a> Engine<'a> {
    /// Creates an engine with the default annual readjustment.
    pub fn new(params: &'a SimulationParams) -> Self {
        Self {
            params,
            series: TariffSeries::default(),
        }
    }

    /// Overrides the annual tariff readjustment (fraction).
    pub fn with_readjustment(mut self, readjustment: f64) -> Self {
        self.series = TariffSeries::new(readjustment);
        self
    }

    /// Evaluates every contract month, in calendar order.
    pub fn monthly(&self) -> Vec<MonthlyResult> {
        let p = self.params;
        let evaluator = MonthlyEvaluator::new(&p.consumption, &p.taxes, &p.offer, p.structure);
        let mwh = p.consumption.total_mwh();

        self.series
            .build(&p.tariff, &p.contract)
            .into_iter()
            .map(|projected| {
                let cost = evaluator.evaluate(&projected.tariff, projected.year_offset);
                let acr_per_mwh = cost.acr.total;
                let acl_per_mwh = cost.acl.total;
                MonthlyResult {
                    month: projected.month,
                    year: projected.year,
                    period: month_label(projected.month, projected.year),
                    acr_per_mwh,
                    acl_per_mwh,
                    discount: blended_discount(acl_per_mwh, acr_per_mwh),
                    savings: (acr_per_mwh - acl_per_mwh) * mwh,
                    acr_spend: acr_per_mwh * mwh,
                    acl_spend: acl_per_mwh * mwh,
                    acr: cost.acr,
                    acl: cost.acl,
                }
            })
            .collect()
    }

    /// Executes the full pipeline and assembles the result payload.
    pub fn run(&self) -> SimulationResult {
        let p = self.params;
        if p.consumption.is_degenerate() {
            warn!("zero consumption: per-MWh costs are computed against a 1 kWh placeholder");
        }
        if !p.tariff.is_resolved() {
            warn!("tariff snapshot has no off-peak demand or TE rate; costs will be zero");
        }

        let monthly = self.monthly();
        let annual = aggregate_annual(&monthly);
        let npv_savings = savings_npv(&annual, p.contract.monthly_npv_rate());

        let total_savings = monthly.iter().map(|m| m.savings).sum();
        let total_acr_spend: f64 = monthly.iter().map(|m| m.acr_spend).sum();
        let total_acl_spend: f64 = monthly.iter().map(|m| m.acl_spend).sum();
        let overall_discount = blended_discount(total_acl_spend, total_acr_spend);

        info!(
            months = monthly.len(),
            structure = %p.structure,
            overall_discount,
            total_savings,
            npv_savings,
            "simulation complete"
        );

        SimulationResult {
            years: annual.iter().map(|y| y.year).collect(),
            acr_spend_by_year: annual.iter().map(|y| y.acr_spend).collect(),
            acl_spend_by_year: annual.iter().map(|y| y.acl_spend).collect(),
            savings_by_year: annual.iter().map(|y| y.savings).collect(),
            monthly,
            annual,
            overall_discount,
            total_savings,
            npv_savings,
            total_acr_spend,
            total_acl_spend,
            period_label: p.contract.label(),
            period: format_period(
                p.contract.start_month(),
                p.contract.start_year(),
                p.contract.end_month(),
                p.contract.end_year(),
            ),
            structure: p.structure,
            tariff: p.tariff.clone(),
        }
    }
}

/// Runs one simulation with the default readjustment.
pub fn simulate(params: &SimulationParams) -> SimulationResult {
    Engine::new(params).run()
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Savings Report ---")?;
        writeln!(f, "Period:               {}", self.period)?;
        writeln!(f, "Structure:            {}", self.structure)?;
        if !self.tariff.effective_date.is_empty() {
            writeln!(f, "Tariff effective:     {}", self.tariff.effective_date)?;
        }
        writeln!(f, "ACR spend:            {}", format_brl(self.total_acr_spend))?;
        writeln!(f, "ACL spend:            {}", format_brl(self.total_acl_spend))?;
        writeln!(
            f,
            "Overall discount:     {}",
            format_percent(self.overall_discount)
        )?;
        writeln!(f, "Total savings:        {}", format_brl(self.total_savings))?;
        write!(f, "NPV of savings:       {}", format_brl(self.npv_savings))?;
        for year in &self.annual {
            write!(
                f,
                "\n  {} ({:>2} months): savings {}, discount {}",
                year.year,
                year.months,
                format_brl(year.savings),
                format_percent(year.discount)
            )?;
        }
        Ok(())
    }
}
