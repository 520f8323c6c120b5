//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::SimError;
use crate::sim::types::{
    CommercialOffer, ConsumptionProfile, ContractPeriod, SimulationParams, TariffSnapshot,
    TariffStructure, TaxProfile,
};
use crate::tariffs::{TariffError, TariffTable};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Monthly demand and energy of the consumer unit.
    #[serde(default)]
    pub consumption: ConsumptionConfig,
    /// Tax rates and taxpayer classification.
    #[serde(default)]
    pub taxes: TaxConfig,
    /// Contract window and NPV hurdle rate.
    #[serde(default)]
    pub contract: ContractConfig,
    /// Free-market supplier offer.
    #[serde(default)]
    pub offer: OfferConfig,
    /// Tariff structure and base prices.
    #[serde(default)]
    pub tariff: TariffConfig,
}

/// Monthly demand and energy of the consumer unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumptionConfig {
    /// Contracted peak demand (kW).
    pub demand_peak_kw: f64,
    /// Contracted off-peak demand (kW).
    pub demand_offpeak_kw: f64,
    /// Peak energy per month (kWh).
    pub energy_peak_kwh: f64,
    /// Off-peak energy per month (kWh).
    pub energy_offpeak_kwh: f64,
}

impl Default for ConsumptionConfig {
    fn default() -> Self {
        Self {
            demand_peak_kw: 100.0,
            demand_offpeak_kw: 300.0,
            energy_peak_kwh: 30_000.0,
            energy_offpeak_kwh: 120_000.0,
        }
    }
}

/// Tax rates and taxpayer classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxConfig {
    /// ICMS rate (%).
    pub icms_pct: f64,
    /// Combined PIS/COFINS rate (%).
    pub pis_cofins_pct: f64,
    /// `"conventional"`, `"half"` or `"full"`.
    pub incentive: String,
    /// `"non_taxpayer"`, `"standard"`, `"icms_exempt"` or `"non_taxpayer_acl_exempt"`.
    pub icms_class: String,
    /// CCEE settlement fee (R$/MWh).
    pub ccee_fee_per_mwh: f64,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            icms_pct: 18.0,
            pis_cofins_pct: 6.5,
            incentive: "conventional".to_string(),
            icms_class: "standard".to_string(),
            ccee_fee_per_mwh: 0.0,
        }
    }
}

/// Contract window and NPV hurdle rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContractConfig {
    pub start_month: u32,
    pub start_year: i32,
    pub end_month: u32,
    pub end_year: i32,
    /// Annual NPV hurdle rate (%).
    pub npv_rate_pct: f64,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            start_month: 1,
            start_year: 2025,
            end_month: 12,
            end_year: 2027,
            npv_rate_pct: 9.67,
        }
    }
}

/// Free-market supplier offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OfferConfig {
    /// `"guaranteed_discount"` or `"fixed_price"`.
    pub kind: String,
    /// Guaranteed discount (%), used when `kind = "guaranteed_discount"`.
    pub discount_pct: f64,
    /// Yearly energy prices (R$/MWh), used when `kind = "fixed_price"`.
    pub prices_per_mwh: Vec<f64>,
}

impl Default for OfferConfig {
    fn default() -> Self {
        Self {
            kind: "guaranteed_discount".to_string(),
            discount_pct: 20.0,
            prices_per_mwh: Vec::new(),
        }
    }
}

/// Tariff structure and base prices.
///
/// When `utility` and `subgroup` are set the six prices come from a tariff
/// table; a scenario naming them cannot run on the inline prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// `"Blue"` or `"Green"` (regulator names `"Azul"`/`"Verde"` also accepted).
    pub modality: String,
    pub utility: Option<String>,
    pub subgroup: Option<String>,
    pub tusd_kw_peak: f64,
    pub tusd_kw_offpeak: f64,
    pub tusd_mwh_peak: f64,
    pub tusd_mwh_offpeak: f64,
    pub te_peak: f64,
    pub te_offpeak: f64,
    pub effective_date: String,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            modality: "Blue".to_string(),
            utility: None,
            subgroup: None,
            tusd_kw_peak: 60.0,
            tusd_kw_offpeak: 20.0,
            tusd_mwh_peak: 80.0,
            tusd_mwh_offpeak: 80.0,
            te_peak: 450.0,
            te_offpeak: 280.0,
            effective_date: String::new(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"taxes.icms_pct"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn from_sim(section: &str, err: &SimError) -> Self {
        Self {
            field: format!("{section}.{}", err.field().unwrap_or("?")),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ScenarioConfig {
    /// Returns the baseline scenario: Blue structure, 20 % guaranteed discount,
    /// three-year contract.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the Green fixed-price preset.
    pub fn green_fixed_price() -> Self {
        Self {
            consumption: ConsumptionConfig {
                demand_peak_kw: 0.0,
                demand_offpeak_kw: 250.0,
                energy_peak_kwh: 12_000.0,
                energy_offpeak_kwh: 90_000.0,
            },
            offer: OfferConfig {
                kind: "fixed_price".to_string(),
                discount_pct: 0.0,
                prices_per_mwh: vec![290.0, 280.0, 275.0],
            },
            tariff: TariffConfig {
                modality: "Green".to_string(),
                tusd_kw_peak: 0.0,
                tusd_kw_offpeak: 19.5,
                tusd_mwh_peak: 1_200.0,
                ..TariffConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the incentivized-source preset: Blue structure, 50 % wire discount.
    pub fn incentivized() -> Self {
        Self {
            taxes: TaxConfig {
                incentive: "half".to_string(),
                ccee_fee_per_mwh: 2.5,
                ..TaxConfig::default()
            },
            offer: OfferConfig {
                discount_pct: 15.0,
                ..OfferConfig::default()
            },
            contract: ContractConfig {
                end_year: 2029,
                ..ContractConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "green_fixed_price", "incentivized"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "green_fixed_price" => Ok(Self::green_fixed_price()),
            "incentivized" => Ok(Self::incentivized()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Builds the validated consumption profile.
    ///
    /// # Errors
    ///
    /// Returns the first constraint violated by the `[consumption]` section.
    pub fn consumption(&self) -> Result<ConsumptionProfile, SimError> {
        let c = &self.consumption;
        ConsumptionProfile::new(
            c.demand_peak_kw,
            c.demand_offpeak_kw,
            c.energy_peak_kwh,
            c.energy_offpeak_kwh,
        )
    }

    /// Builds the validated tax profile.
    ///
    /// # Errors
    ///
    /// Returns the first constraint violated by the `[taxes]` section.
    pub fn taxes(&self) -> Result<TaxProfile, SimError> {
        let t = &self.taxes;
        TaxProfile::new(
            t.icms_pct,
            t.pis_cofins_pct,
            t.incentive.parse()?,
            t.icms_class.parse()?,
            t.ccee_fee_per_mwh,
        )
    }

    /// Builds the validated contract period.
    ///
    /// # Errors
    ///
    /// Returns the first constraint violated by the `[contract]` section.
    pub fn contract(&self) -> Result<ContractPeriod, SimError> {
        let c = &self.contract;
        ContractPeriod::new(
            c.start_month,
            c.start_year,
            c.end_month,
            c.end_year,
            c.npv_rate_pct,
        )
    }

    /// Builds the validated commercial offer.
    ///
    /// # Errors
    ///
    /// Returns the first constraint violated by the `[offer]` section.
    pub fn offer(&self) -> Result<CommercialOffer, SimError> {
        let o = &self.offer;
        match o.kind.as_str() {
            "guaranteed_discount" => CommercialOffer::guaranteed_discount(o.discount_pct),
            "fixed_price" => CommercialOffer::fixed_price(o.prices_per_mwh.clone()),
            other => Err(SimError::InvalidParameter {
                field: "kind",
                constraint: format!(
                    "must be \"guaranteed_discount\" or \"fixed_price\", got \"{other}\""
                ),
            }),
        }
    }

    /// Resolves the tariff structure from `tariff.modality`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::UnknownModality` for anything but Blue or Green.
    pub fn structure(&self) -> Result<TariffStructure, SimError> {
        self.tariff.modality.parse()
    }

    /// Builds the validated base tariff snapshot from the inline prices.
    ///
    /// # Errors
    ///
    /// Returns the first negative or non-finite price.
    pub fn tariff_snapshot(&self) -> Result<TariffSnapshot, SimError> {
        let t = &self.tariff;
        let snapshot = TariffSnapshot {
            tusd_kw_peak: t.tusd_kw_peak,
            tusd_kw_offpeak: t.tusd_kw_offpeak,
            tusd_mwh_peak: t.tusd_mwh_peak,
            tusd_mwh_offpeak: t.tusd_mwh_offpeak,
            te_peak: t.te_peak,
            te_offpeak: t.te_offpeak,
            effective_date: t.effective_date.clone(),
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Replaces the inline tariff prices with the table's latest snapshot.
    ///
    /// Does nothing when neither `tariff.utility` nor `tariff.subgroup` is
    /// set, or when `tariff.modality` is not a known structure (`validate`
    /// reports that on `tariff.modality`).
    ///
    /// # Errors
    ///
    /// Returns `TariffError::Unresolved` if only one of utility and subgroup
    /// is set, or if the table has no usable rows for the combination.
    pub fn apply_tariff_table(&mut self, table: &TariffTable) -> Result<(), TariffError> {
        let Ok(structure) = self.structure() else {
            return Ok(());
        };
        let (utility, subgroup) = match (&self.tariff.utility, &self.tariff.subgroup) {
            (None, None) => return Ok(()),
            (Some(utility), Some(subgroup)) => (utility, subgroup),
            (utility, subgroup) => {
                return Err(TariffError::Unresolved {
                    utility: utility.clone().unwrap_or_default(),
                    subgroup: subgroup.clone().unwrap_or_default(),
                    modality: structure.regulator_name().to_string(),
                });
            }
        };
        let snapshot = table.resolve_snapshot(utility, subgroup, structure)?;

        let t = &mut self.tariff;
        t.tusd_kw_peak = snapshot.tusd_kw_peak;
        t.tusd_kw_offpeak = snapshot.tusd_kw_offpeak;
        t.tusd_mwh_peak = snapshot.tusd_mwh_peak;
        t.tusd_mwh_offpeak = snapshot.tusd_mwh_offpeak;
        t.te_peak = snapshot.te_peak;
        t.te_offpeak = snapshot.te_offpeak;
        t.effective_date = snapshot.effective_date;
        Ok(())
    }

    /// Checks that the scenario can run on its inline prices alone.
    ///
    /// A scenario naming `tariff.utility` or `tariff.subgroup` must be
    /// resolved through `apply_tariff_table`; its inline prices are only
    /// placeholders.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` on the named field.
    pub fn require_inline_tariff(&self) -> Result<(), ConfigError> {
        let named = [
            ("tariff.utility", &self.tariff.utility),
            ("tariff.subgroup", &self.tariff.subgroup),
        ];
        match named.into_iter().find(|(_, value)| value.is_some()) {
            None => Ok(()),
            Some((field, value)) => Err(ConfigError {
                field: field.to_string(),
                message: format!(
                    "\"{}\" needs a tariff table to resolve its prices",
                    value.as_deref().unwrap_or_default()
                ),
            }),
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Each section
    /// reports at most its first violation.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |section: &str, result: Result<(), SimError>| {
            if let Err(e) = result {
                errors.push(ConfigError::from_sim(section, &e));
            }
        };

        check("consumption", self.consumption().map(drop));
        check("taxes", self.taxes().map(drop));
        check("contract", self.contract().map(drop));
        check("offer", self.offer().map(drop));
        check("tariff", self.structure().map(drop));
        check("tariff", self.tariff_snapshot().map(drop));

        errors
    }

    /// Converts the configuration into validated simulation inputs.
    ///
    /// # Errors
    ///
    /// Returns the first `SimError` met, in section order.
    pub fn to_params(&self) -> Result<SimulationParams, SimError> {
        SimulationParams::new(
            self.consumption()?,
            self.taxes()?,
            self.contract()?,
            self.offer()?,
            self.structure()?,
            self.tariff_snapshot()?,
        )
    }
}
