//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use acl_sim::sim::types::{
    CommercialOffer, ConsumptionProfile, ContractPeriod, EnergyIncentive, IcmsClass,
    SimulationParams, TariffSnapshot, TariffStructure, TaxProfile,
};

/// Tolerance for currency comparisons on per-MWh figures.
pub const EPS: f64 = 1e-6;

/// A4 tariff used across the suite (R$/kW and R$/MWh).
pub fn example_tariff() -> TariffSnapshot {
    TariffSnapshot {
        tusd_kw_peak: 60.0,
        tusd_kw_offpeak: 20.0,
        tusd_mwh_peak: 80.0,
        tusd_mwh_offpeak: 80.0,
        te_peak: 450.0,
        te_offpeak: 280.0,
        effective_date: "01/06/2024".to_string(),
    }
}

/// 100 kW peak / 300 kW off-peak, 30 MWh peak / 120 MWh off-peak.
pub fn example_consumption() -> ConsumptionProfile {
    ConsumptionProfile::new(100.0, 300.0, 30_000.0, 120_000.0).unwrap()
}

/// ICMS 18 %, PIS/COFINS 6.5 %, no CCEE fee.
pub fn example_taxes(incentive: EnergyIncentive, class: IcmsClass) -> TaxProfile {
    TaxProfile::new(18.0, 6.5, incentive, class, 0.0).unwrap()
}

/// Calendar-year contract with no NPV discounting.
pub fn one_year(year: i32) -> ContractPeriod {
    ContractPeriod::new(1, year, 12, year, 0.0).unwrap()
}

/// Standard-taxpayer, conventional-energy parameters over `contract`.
pub fn params(
    structure: TariffStructure,
    offer: CommercialOffer,
    contract: ContractPeriod,
) -> SimulationParams {
    SimulationParams::new(
        example_consumption(),
        example_taxes(EnergyIncentive::Conventional, IcmsClass::StandardTaxpayer),
        contract,
        offer,
        structure,
        example_tariff(),
    )
    .unwrap()
}

/// Blue structure, 20 % guaranteed discount, one calendar year.
pub fn blue_discount_params() -> SimulationParams {
    params(
        TariffStructure::Blue,
        CommercialOffer::guaranteed_discount(20.0).unwrap(),
        one_year(2025),
    )
}
