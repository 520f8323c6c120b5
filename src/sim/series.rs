//! Month-by-month tariff projection across a contract period.

use tracing::debug;

use super::types::{ContractPeriod, DEFAULT_ANNUAL_READJUSTMENT, TariffSnapshot};

/// Calendar cursor that walks every month of a contract, oldest first.
///
/// # Examples
///
/// ```
/// use acl_sim::sim::series::MonthCursor;
/// use acl_sim::sim::types::ContractPeriod;
///
/// let period = ContractPeriod::new(11, 2025, 2, 2026, 0.0).unwrap();
/// let months: Vec<_> = MonthCursor::new(&period).collect();
/// assert_eq!(months, vec![(11, 2025), (12, 2025), (1, 2026), (2, 2026)]);
/// ```
#[derive(Debug, Clone)]
pub struct MonthCursor {
    /// Next month to yield.
    month: u32,
    year: i32,
    /// Last month to yield, inclusive.
    end_month: u32,
    end_year: i32,
}

impl MonthCursor {
    /// Creates a cursor positioned on the first contract month.
    pub fn new(contract: &ContractPeriod) -> Self {
        Self {
            month: contract.start_month(),
            year: contract.start_year(),
            end_month: contract.end_month(),
            end_year: contract.end_year(),
        }
    }

    /// Advances by one month.
    ///
    /// # Returns
    ///
    /// * `Some((month, year))` - The month under the cursor before advancing
    /// * `None` - If the end of the contract has been passed
    pub fn tick(&mut self) -> Option<(u32, i32)> {
        if (self.year, self.month) > (self.end_year, self.end_month) {
            return None;
        }
        let current = (self.month, self.year);
        self.month += 1;
        if self.month > 12 {
            self.month = 1;
            self.year += 1;
        }
        Some(current)
    }
}

impl Iterator for MonthCursor {
    type Item = (u32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        self.tick()
    }
}

/// One contract month paired with its projected tariff.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedMonth {
    pub month: u32,
    pub year: i32,
    /// `year - start_year`; not reset at contract anniversaries.
    pub year_offset: usize,
    pub tariff: TariffSnapshot,
}

/// Projects a base tariff snapshot forward with a fixed annual readjustment.
///
/// Tariffs stay flat within a calendar year and escalate by
/// `(1 + readjustment)^k` in contract year offset `k`.
#[derive(Debug, Clone, Copy)]
pub struct TariffSeries {
    readjustment: f64,
}

impl Default for TariffSeries {
    fn default() -> Self {
        Self::new(DEFAULT_ANNUAL_READJUSTMENT)
    }
}

impl TariffSeries {
    /// Creates a builder with the given annual readjustment (fraction, e.g. `0.05`).
    pub fn new(readjustment: f64) -> Self {
        Self { readjustment }
    }

    pub fn readjustment(&self) -> f64 {
        self.readjustment
    }

    /// Escalation factor for a contract-year offset.
    pub fn factor(&self, year_offset: usize) -> f64 {
        let exponent = i32::try_from(year_offset).unwrap_or(i32::MAX);
        (1.0 + self.readjustment).powi(exponent)
    }

    /// Builds the projected series for every month of `contract`.
    ///
    /// The result holds exactly `contract.month_count()` entries.
    pub fn build(&self, base: &TariffSnapshot, contract: &ContractPeriod) -> Vec<ProjectedMonth> {
        let mut series = Vec::with_capacity(contract.month_count());
        let mut current: Option<(usize, TariffSnapshot)> = None;

        for (month, year) in MonthCursor::new(contract) {
            let year_offset = contract.year_offset(year);
            let tariff = match &current {
                Some((offset, tariff)) if *offset == year_offset => tariff.clone(),
                _ => {
                    let factor = self.factor(year_offset);
                    debug!(year, year_offset, factor, "projecting tariff");
                    let tariff = base.scaled(factor);
                    current = Some((year_offset, tariff.clone()));
                    tariff
                }
            };
            series.push(ProjectedMonth {
                month,
                year,
                year_offset,
                tariff,
            });
        }

        series
    }
}
