//! Post-hoc yearly aggregation and NPV of the savings stream.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::finance::{annual_from_monthly, blended_discount, npv};
use super::types::MonthlyResult;

/// Totals for one calendar year of the contract.
///
/// Computed post-hoc from the monthly records so the yearly figures always
/// add up to the months they cover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualResult {
    pub year: i32,
    /// Number of contract months falling in this year.
    pub months: u32,
    /// Spend under the regulated regime (R$).
    pub acr_spend: f64,
    /// Spend under the free-market regime (R$).
    pub acl_spend: f64,
    /// Savings (R$).
    pub savings: f64,
    /// `1 - acl_spend/acr_spend`, recomputed from the yearly totals.
    pub discount: f64,
}

impl fmt::Display for AnnualResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:>2} months) | ACR={:.2}  ACL={:.2} | savings={:.2} | discount={:.2}%",
            self.year,
            self.months,
            self.acr_spend,
            self.acl_spend,
            self.savings,
            self.discount * 100.0,
        )
    }
}

/// Groups monthly records by calendar year, oldest first.
pub fn aggregate_annual(monthly: &[MonthlyResult]) -> Vec<AnnualResult> {
    let mut years: BTreeMap<i32, AnnualResult> = BTreeMap::new();

    for m in monthly {
        let entry = years.entry(m.year).or_insert_with(|| AnnualResult {
            year: m.year,
            months: 0,
            acr_spend: 0.0,
            acl_spend: 0.0,
            savings: 0.0,
            discount: 0.0,
        });
        entry.months += 1;
        entry.acr_spend += m.acr_spend;
        entry.acl_spend += m.acl_spend;
        entry.savings += m.savings;
    }

    years
        .into_values()
        .map(|mut year| {
            year.discount = blended_discount(year.acl_spend, year.acr_spend);
            year
        })
        .collect()
}

/// NPV of the yearly savings, discounted at the annual equivalent of `monthly_rate`.
///
/// Falls back to the plain sum when the effective annual rate is not
/// positive or there are no years.
pub fn savings_npv(annual: &[AnnualResult], monthly_rate: f64) -> f64 {
    let flows: Vec<f64> = annual.iter().map(|y| y.savings).collect();
    let annual_rate = annual_from_monthly(monthly_rate);
    if flows.is_empty() || annual_rate <= 0.0 {
        return flows.iter().sum();
    }
    npv(annual_rate, &flows)
}
