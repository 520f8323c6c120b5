//! Core simulation types: validated inputs, tariff snapshots, and monthly records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::SimError;

/// Annual tariff readjustment applied once per calendar year of the contract.
pub const DEFAULT_ANNUAL_READJUSTMENT: f64 = 0.05;

/// Earliest contract year accepted.
pub const MIN_CONTRACT_YEAR: i32 = 2020;

/// Latest contract year accepted.
pub const MAX_CONTRACT_YEAR: i32 = 2035;

/// Month abbreviations used in period labels (`"Jan/2025"`).
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Formats a month/year pair as `"Mmm/YYYY"`.
///
/// Months outside `1..=12` are clamped so the label is always printable.
pub fn month_label(month: u32, year: i32) -> String {
    let idx = month.clamp(1, 12) as usize - 1;
    format!("{}/{year}", MONTH_ABBREVIATIONS[idx])
}

fn ensure_in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, SimError> {
    if !value.is_finite() || value < min || value > max {
        return Err(SimError::invalid(
            field,
            format!("must be in [{min}, {max}], got {value}"),
        ));
    }
    Ok(value)
}

fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64, SimError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimError::invalid(
            field,
            format!("must be a finite number >= 0, got {value}"),
        ));
    }
    Ok(value)
}

/// Monthly load profile split into peak (P) and off-peak (FP) segments.
///
/// # Examples
///
/// ```
/// use acl_sim::sim::types::ConsumptionProfile;
///
/// let load = ConsumptionProfile::new(100.0, 300.0, 30_000.0, 120_000.0).unwrap();
/// assert_eq!(load.total_mwh(), 150.0);
/// assert!((load.peak_share() - 0.2).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionProfile {
    demand_peak_kw: f64,
    demand_offpeak_kw: f64,
    energy_peak_kwh: f64,
    energy_offpeak_kwh: f64,
}

impl ConsumptionProfile {
    /// Maximum contracted demand accepted per segment (kW).
    pub const MAX_DEMAND_KW: f64 = 100_000.0;

    /// Creates a validated load profile.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameter` if a demand is outside
    /// `[0, 100 000]` kW or an energy figure is negative or not finite.
    pub fn new(
        demand_peak_kw: f64,
        demand_offpeak_kw: f64,
        energy_peak_kwh: f64,
        energy_offpeak_kwh: f64,
    ) -> Result<Self, SimError> {
        Ok(Self {
            demand_peak_kw: ensure_in_range(
                "demand_peak_kw",
                demand_peak_kw,
                0.0,
                Self::MAX_DEMAND_KW,
            )?,
            demand_offpeak_kw: ensure_in_range(
                "demand_offpeak_kw",
                demand_offpeak_kw,
                0.0,
                Self::MAX_DEMAND_KW,
            )?,
            energy_peak_kwh: ensure_non_negative("energy_peak_kwh", energy_peak_kwh)?,
            energy_offpeak_kwh: ensure_non_negative("energy_offpeak_kwh", energy_offpeak_kwh)?,
        })
    }

    pub fn demand_peak_kw(&self) -> f64 {
        self.demand_peak_kw
    }

    pub fn demand_offpeak_kw(&self) -> f64 {
        self.demand_offpeak_kw
    }

    pub fn energy_peak_kwh(&self) -> f64 {
        self.energy_peak_kwh
    }

    pub fn energy_offpeak_kwh(&self) -> f64 {
        self.energy_offpeak_kwh
    }

    /// Sum of peak and off-peak demand (kW).
    pub fn total_demand_kw(&self) -> f64 {
        self.demand_peak_kw + self.demand_offpeak_kw
    }

    /// True when no energy is consumed at all; cost-per-MWh figures are then advisory only.
    pub fn is_degenerate(&self) -> bool {
        self.energy_peak_kwh + self.energy_offpeak_kwh == 0.0
    }

    /// Total monthly consumption (kWh), with `1.0` standing in for zero.
    pub fn total_kwh(&self) -> f64 {
        let total = self.energy_peak_kwh + self.energy_offpeak_kwh;
        if total == 0.0 { 1.0 } else { total }
    }

    /// Total monthly consumption (MWh), derived from [`Self::total_kwh`].
    pub fn total_mwh(&self) -> f64 {
        self.total_kwh() / 1000.0
    }

    /// Fraction of consumption that falls in the peak segment.
    pub fn peak_share(&self) -> f64 {
        self.energy_peak_kwh / self.total_kwh()
    }

    /// Fraction of consumption that falls in the off-peak segment.
    pub fn offpeak_share(&self) -> f64 {
        1.0 - self.peak_share()
    }
}

/// Free-market energy incentive tier.
///
/// The multiplier scales only the free-market demand (wire) charge. Incentive
/// programs act on distribution-use charges, never on the energy price itself,
/// so the energy term of the ACL cost must stay untouched by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyIncentive {
    /// Conventional energy, multiplier 0.
    Conventional,
    /// 50 % incentivized energy, multiplier 0.5.
    Half,
    /// 100 % incentivized energy, multiplier 1.
    Full,
}

impl EnergyIncentive {
    /// Factor applied to the free-market demand charge.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Conventional => 0.0,
            Self::Half => 0.5,
            Self::Full => 1.0,
        }
    }
}

impl FromStr for EnergyIncentive {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conventional" | "none" | "i1" => Ok(Self::Conventional),
            "half" | "50" | "i5" => Ok(Self::Half),
            "full" | "100" | "i0" => Ok(Self::Full),
            _ => Err(SimError::invalid(
                "incentive",
                format!("must be \"conventional\", \"half\" or \"full\", got \"{s}\""),
            )),
        }
    }
}

/// ICMS taxpayer class of the consumer, deciding how a fixed energy price is grossed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IcmsClass {
    /// Not an ICMS taxpayer.
    NonTaxpayer,
    /// Taxpayer subject to the standard ICMS rate.
    StandardTaxpayer,
    /// Taxpayer with 0 % ICMS on energy.
    IcmsExemptTaxpayer,
    /// Not a taxpayer, free-market energy exempt from ICMS.
    NonTaxpayerAclExempt,
}

impl FromStr for IcmsClass {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "non_taxpayer" | "np" => Ok(Self::NonTaxpayer),
            "standard" | "standard_taxpayer" | "sp" => Ok(Self::StandardTaxpayer),
            "icms_exempt" | "icms_exempt_taxpayer" | "snicms" => Ok(Self::IcmsExemptTaxpayer),
            "non_taxpayer_acl_exempt" | "nnicms" => Ok(Self::NonTaxpayerAclExempt),
            _ => Err(SimError::invalid(
                "icms_class",
                format!(
                    "must be \"non_taxpayer\", \"standard\", \"icms_exempt\" or \
                     \"non_taxpayer_acl_exempt\", got \"{s}\""
                ),
            )),
        }
    }
}

/// Tax parameters of the consumer unit. Rates are stored as fractions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxProfile {
    icms: f64,
    pis_cofins: f64,
    incentive: EnergyIncentive,
    icms_class: IcmsClass,
    ccee_fee_per_mwh: f64,
}

impl TaxProfile {
    /// Creates a validated tax profile from percentage rates.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameter` if ICMS is outside `[0, 35]` %,
    /// PIS/COFINS outside `[0, 15]` %, or the CCEE fee is negative.
    pub fn new(
        icms_pct: f64,
        pis_cofins_pct: f64,
        incentive: EnergyIncentive,
        icms_class: IcmsClass,
        ccee_fee_per_mwh: f64,
    ) -> Result<Self, SimError> {
        Ok(Self {
            icms: ensure_in_range("icms_pct", icms_pct, 0.0, 35.0)? / 100.0,
            pis_cofins: ensure_in_range("pis_cofins_pct", pis_cofins_pct, 0.0, 15.0)? / 100.0,
            incentive,
            icms_class,
            ccee_fee_per_mwh: ensure_non_negative("ccee_fee_per_mwh", ccee_fee_per_mwh)?,
        })
    }

    /// ICMS rate as a fraction.
    pub fn icms(&self) -> f64 {
        self.icms
    }

    /// PIS/COFINS rate as a fraction.
    pub fn pis_cofins(&self) -> f64 {
        self.pis_cofins
    }

    pub fn incentive(&self) -> EnergyIncentive {
        self.incentive
    }

    pub fn icms_class(&self) -> IcmsClass {
        self.icms_class
    }

    /// Settlement-chamber fee (R$/MWh).
    pub fn ccee_fee_per_mwh(&self) -> f64 {
        self.ccee_fee_per_mwh
    }
}

/// Inclusive contract window plus the annual hurdle rate used for NPV.
///
/// # Examples
///
/// ```
/// use acl_sim::sim::types::ContractPeriod;
///
/// let period = ContractPeriod::new(1, 2025, 12, 2027, 9.67).unwrap();
/// assert_eq!(period.month_count(), 36);
/// assert_eq!(period.label(), ("Jan/2025".to_string(), "Dez/2027".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractPeriod {
    start_month: u32,
    start_year: i32,
    end_month: u32,
    end_year: i32,
    npv_rate: f64,
}

impl ContractPeriod {
    /// Creates a validated contract period.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameter` for months outside `1..=12`,
    /// years outside `2020..=2035` or an NPV rate outside `[0, 100]` %, and
    /// `SimError::InvalidPeriod` if the end month precedes the start month.
    pub fn new(
        start_month: u32,
        start_year: i32,
        end_month: u32,
        end_year: i32,
        npv_rate_pct: f64,
    ) -> Result<Self, SimError> {
        for (field, month) in [("start_month", start_month), ("end_month", end_month)] {
            if !(1..=12).contains(&month) {
                return Err(SimError::invalid(
                    field,
                    format!("must be in [1, 12], got {month}"),
                ));
            }
        }
        for (field, year) in [("start_year", start_year), ("end_year", end_year)] {
            if !(MIN_CONTRACT_YEAR..=MAX_CONTRACT_YEAR).contains(&year) {
                return Err(SimError::invalid(
                    field,
                    format!("must be in [{MIN_CONTRACT_YEAR}, {MAX_CONTRACT_YEAR}], got {year}"),
                ));
            }
        }
        let npv_rate = ensure_in_range("npv_rate_pct", npv_rate_pct, 0.0, 100.0)? / 100.0;

        if (end_year, end_month) < (start_year, start_month) {
            return Err(SimError::InvalidPeriod {
                start_month,
                start_year,
                end_month,
                end_year,
            });
        }

        Ok(Self {
            start_month,
            start_year,
            end_month,
            end_year,
            npv_rate,
        })
    }

    pub fn start_month(&self) -> u32 {
        self.start_month
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_month(&self) -> u32 {
        self.end_month
    }

    pub fn end_year(&self) -> i32 {
        self.end_year
    }

    /// Annual NPV hurdle rate as a fraction.
    pub fn npv_rate(&self) -> f64 {
        self.npv_rate
    }

    /// Effective monthly rate equivalent to the annual hurdle rate.
    pub fn monthly_npv_rate(&self) -> f64 {
        (1.0 + self.npv_rate).powf(1.0 / 12.0) - 1.0
    }

    /// Number of calendar months covered, both ends inclusive.
    pub fn month_count(&self) -> usize {
        let months = (self.end_year - self.start_year) * 12 + self.end_month as i32
            - self.start_month as i32
            + 1;
        usize::try_from(months).unwrap_or(0)
    }

    /// Zero-based year offset of `year` relative to the start year.
    pub fn year_offset(&self, year: i32) -> usize {
        usize::try_from(year - self.start_year).unwrap_or(0)
    }

    /// `(start, end)` labels, e.g. `("Jan/2025", "Dez/2027")`.
    pub fn label(&self) -> (String, String) {
        (
            month_label(self.start_month, self.start_year),
            month_label(self.end_month, self.end_year),
        )
    }
}

/// Commercial offer made by the free-market supplier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommercialOffer {
    /// Discount (fraction) applied to the ACR-equivalent energy budget.
    GuaranteedDiscount { discount: f64 },
    /// Raw yearly energy prices (R$/MWh), indexed by contract-year offset.
    FixedPrice { prices_per_mwh: Vec<f64> },
}

impl CommercialOffer {
    /// Largest guaranteed discount accepted (%).
    pub const MAX_DISCOUNT_PCT: f64 = 50.0;

    /// Creates a guaranteed-discount offer from a percentage.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameter` if the percentage is outside `[0, 50]`.
    pub fn guaranteed_discount(discount_pct: f64) -> Result<Self, SimError> {
        let pct = ensure_in_range("discount_pct", discount_pct, 0.0, Self::MAX_DISCOUNT_PCT)?;
        Ok(Self::GuaranteedDiscount {
            discount: pct / 100.0,
        })
    }

    /// Creates a fixed-price schedule.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameter` if the schedule is empty or holds
    /// a negative or non-finite price.
    pub fn fixed_price(prices_per_mwh: Vec<f64>) -> Result<Self, SimError> {
        let offer = Self::FixedPrice { prices_per_mwh };
        offer.validate()?;
        Ok(offer)
    }

    /// Re-checks the offer invariants, for offers built from the enum variants directly.
    ///
    /// # Errors
    ///
    /// Same conditions as the constructors.
    pub fn validate(&self) -> Result<(), SimError> {
        match self {
            Self::GuaranteedDiscount { discount } => {
                ensure_in_range(
                    "discount_pct",
                    discount * 100.0,
                    0.0,
                    Self::MAX_DISCOUNT_PCT,
                )?;
            }
            Self::FixedPrice { prices_per_mwh } => {
                if prices_per_mwh.is_empty() {
                    return Err(SimError::invalid(
                        "prices_per_mwh",
                        "must hold at least one yearly price",
                    ));
                }
                for &price in prices_per_mwh {
                    ensure_non_negative("prices_per_mwh", price)?;
                }
            }
        }
        Ok(())
    }

    /// Fixed price for a contract-year offset, reusing the last price past the end.
    ///
    /// Returns `None` for guaranteed-discount offers.
    pub fn price_for_year(&self, year_offset: usize) -> Option<f64> {
        match self {
            Self::GuaranteedDiscount { .. } => None,
            Self::FixedPrice { prices_per_mwh } => prices_per_mwh
                .get(year_offset)
                .or_else(|| prices_per_mwh.last())
                .copied(),
        }
    }
}

/// Regulated tariff structure for demand billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TariffStructure {
    /// Separate peak and off-peak demand charges.
    Blue,
    /// Single demand charge at the off-peak rate.
    Green,
}

impl TariffStructure {
    /// Modality name used in the regulator's published tables.
    pub fn regulator_name(self) -> &'static str {
        match self {
            Self::Blue => "Azul",
            Self::Green => "Verde",
        }
    }
}

impl FromStr for TariffStructure {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" | "azul" => Ok(Self::Blue),
            "green" | "verde" => Ok(Self::Green),
            _ => Err(SimError::UnknownModality(s.to_string())),
        }
    }
}

impl fmt::Display for TariffStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blue => f.write_str("Blue"),
            Self::Green => f.write_str("Green"),
        }
    }
}

/// Regulated price components effective at one point in time.
///
/// TUSD is the distribution-use (wire) charge, TE the energy charge. For the
/// Green structure `tusd_kw_peak` is always zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffSnapshot {
    /// TUSD demand charge, peak (R$/kW).
    pub tusd_kw_peak: f64,
    /// TUSD demand charge, off-peak (R$/kW).
    pub tusd_kw_offpeak: f64,
    /// TUSD energy charge, peak (R$/MWh).
    pub tusd_mwh_peak: f64,
    /// TUSD energy charge, off-peak (R$/MWh).
    pub tusd_mwh_offpeak: f64,
    /// TE energy charge, peak (R$/MWh).
    pub te_peak: f64,
    /// TE energy charge, off-peak (R$/MWh).
    pub te_offpeak: f64,
    /// Effective date label, display only.
    pub effective_date: String,
}

impl TariffSnapshot {
    /// Returns a copy with every price multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            tusd_kw_peak: self.tusd_kw_peak * factor,
            tusd_kw_offpeak: self.tusd_kw_offpeak * factor,
            tusd_mwh_peak: self.tusd_mwh_peak * factor,
            tusd_mwh_offpeak: self.tusd_mwh_offpeak * factor,
            te_peak: self.te_peak * factor,
            te_offpeak: self.te_offpeak * factor,
            effective_date: self.effective_date.clone(),
        }
    }

    /// False when the snapshot looks like an unmatched lookup (no off-peak demand or TE rate).
    pub fn is_resolved(&self) -> bool {
        self.tusd_kw_offpeak != 0.0 || self.te_offpeak != 0.0
    }

    /// Checks that every price is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameter` naming the first offending price.
    pub fn validate(&self) -> Result<(), SimError> {
        ensure_non_negative("tusd_kw_peak", self.tusd_kw_peak)?;
        ensure_non_negative("tusd_kw_offpeak", self.tusd_kw_offpeak)?;
        ensure_non_negative("tusd_mwh_peak", self.tusd_mwh_peak)?;
        ensure_non_negative("tusd_mwh_offpeak", self.tusd_mwh_offpeak)?;
        ensure_non_negative("te_peak", self.te_peak)?;
        ensure_non_negative("te_offpeak", self.te_offpeak)?;
        Ok(())
    }
}

/// Complete, validated input bundle for one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub consumption: ConsumptionProfile,
    pub taxes: TaxProfile,
    pub contract: ContractPeriod,
    pub offer: CommercialOffer,
    pub structure: TariffStructure,
    pub tariff: TariffSnapshot,
}

impl SimulationParams {
    /// Bundles already-built value objects, re-checking the offer and the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameter` if the offer or a tariff price is invalid.
    pub fn new(
        consumption: ConsumptionProfile,
        taxes: TaxProfile,
        contract: ContractPeriod,
        offer: CommercialOffer,
        structure: TariffStructure,
        tariff: TariffSnapshot,
    ) -> Result<Self, SimError> {
        offer.validate()?;
        tariff.validate()?;
        Ok(Self {
            consumption,
            taxes,
            contract,
            offer,
            structure,
            tariff,
        })
    }
}

/// Regulated-market cost breakdown for one month (R$/MWh).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AcrBreakdown {
    /// Wire (TUSD) charge before taxes.
    pub wire: f64,
    /// PIS/COFINS overhead on the wire charge.
    pub wire_pis: f64,
    /// ICMS overhead on the wire charge.
    pub wire_icms: f64,
    /// Energy (TE) charge before taxes.
    pub energy: f64,
    /// PIS/COFINS overhead on the energy charge.
    pub energy_pis: f64,
    /// ICMS overhead on the energy charge.
    pub energy_icms: f64,
    /// Sum of all six components.
    pub total: f64,
}

/// Free-market cost breakdown for one month (R$/MWh).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AclBreakdown {
    /// Free-market wire charge, incentive applied.
    pub wire: f64,
    /// Energy budget implied by the regulated cost: `ACR total - ACL wire`.
    pub reference_energy: f64,
    /// Energy price from the offer, before any tax gross-up.
    pub energy: f64,
    /// Energy price after the taxpayer-class gross-up.
    pub energy_final: f64,
    /// CCEE settlement fee.
    pub ccee_fee: f64,
    /// `wire + energy_final + ccee_fee`.
    pub total: f64,
}

/// Complete record of one contract month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyResult {
    /// Calendar month (1–12).
    pub month: u32,
    /// Calendar year.
    pub year: i32,
    /// Display label, e.g. `"Mar/2026"`.
    pub period: String,
    /// Regulated cost (R$/MWh).
    pub acr_per_mwh: f64,
    /// Free-market cost (R$/MWh).
    pub acl_per_mwh: f64,
    /// `1 - ACL/ACR`, or 0 when ACR is 0.
    pub discount: f64,
    /// `acr_spend - acl_spend` (R$).
    pub savings: f64,
    /// Monthly spend under the regulated regime (R$).
    pub acr_spend: f64,
    /// Monthly spend under the free-market regime (R$).
    pub acl_spend: f64,
    pub acr: AcrBreakdown,
    pub acl: AclBreakdown,
}

impl fmt::Display for MonthlyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8} | ACR={:>9.2} R$/MWh  ACL={:>9.2} R$/MWh | discount={:>6.2}% | \
             spend ACR={:.2}  ACL={:.2} | savings={:.2}",
            self.period,
            self.acr_per_mwh,
            self.acl_per_mwh,
            self.discount * 100.0,
            self.acr_spend,
            self.acl_spend,
            self.savings,
        )
    }
}
