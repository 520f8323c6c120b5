//! Side-by-side comparison of two simulation runs.

use std::fmt;

use serde::Serialize;

use crate::locale::{format_brl, format_percent};

use super::engine::SimulationResult;

/// Savings of both runs for one calendar year.
///
/// A side is `None` when that run's contract does not cover the year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSavings {
    pub year: i32,
    pub savings_a: Option<f64>,
    pub savings_b: Option<f64>,
}

/// Headline deltas between scenario A and scenario B (`B - A`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    pub label_a: String,
    pub label_b: String,
    pub discount_a: f64,
    pub discount_b: f64,
    /// Difference in overall discount, in percentage points.
    pub discount_delta_pp: f64,
    pub total_savings_a: f64,
    pub total_savings_b: f64,
    pub total_savings_delta: f64,
    pub npv_a: f64,
    pub npv_b: f64,
    pub npv_delta: f64,
    /// Union of both runs' years, oldest first.
    pub by_year: Vec<YearSavings>,
}

impl ScenarioComparison {
    pub fn new(
        label_a: impl Into<String>,
        a: &SimulationResult,
        label_b: impl Into<String>,
        b: &SimulationResult,
    ) -> Self {
        let mut years: Vec<i32> = a.years.iter().chain(&b.years).copied().collect();
        years.sort_unstable();
        years.dedup();

        let savings_in = |r: &SimulationResult, year: i32| {
            r.annual.iter().find(|y| y.year == year).map(|y| y.savings)
        };
        let by_year = years
            .into_iter()
            .map(|year| YearSavings {
                year,
                savings_a: savings_in(a, year),
                savings_b: savings_in(b, year),
            })
            .collect();

        Self {
            label_a: label_a.into(),
            label_b: label_b.into(),
            discount_a: a.overall_discount,
            discount_b: b.overall_discount,
            discount_delta_pp: (b.overall_discount - a.overall_discount) * 100.0,
            total_savings_a: a.total_savings,
            total_savings_b: b.total_savings,
            total_savings_delta: b.total_savings - a.total_savings,
            npv_a: a.npv_savings,
            npv_b: b.npv_savings,
            npv_delta: b.npv_savings - a.npv_savings,
            by_year,
        }
    }

    /// Label of the run with the larger NPV of savings; A wins ties.
    pub fn better(&self) -> &str {
        if self.npv_b > self.npv_a {
            &self.label_b
        } else {
            &self.label_a
        }
    }
}

impl fmt::Display for ScenarioComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Comparison: {} vs {} ---", self.label_a, self.label_b)?;
        writeln!(
            f,
            "Overall discount:     {} | {} | {:+.2} p.p.",
            format_percent(self.discount_a),
            format_percent(self.discount_b),
            self.discount_delta_pp
        )?;
        writeln!(
            f,
            "Total savings:        {} | {} | {}",
            format_brl(self.total_savings_a),
            format_brl(self.total_savings_b),
            format_brl(self.total_savings_delta)
        )?;
        writeln!(
            f,
            "NPV of savings:       {} | {} | {}",
            format_brl(self.npv_a),
            format_brl(self.npv_b),
            format_brl(self.npv_delta)
        )?;
        write!(f, "Better NPV:           {}", self.better())?;
        for y in &self.by_year {
            let side = |v: Option<f64>| v.map_or_else(|| "-".to_string(), format_brl);
            write!(
                f,
                "\n  {}: {} | {}",
                y.year,
                side(y.savings_a),
                side(y.savings_b)
            )?;
        }
        Ok(())
    }
}
