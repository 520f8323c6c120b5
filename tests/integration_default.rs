//! Integration tests for the projection and cost-comparison pipeline.

mod common;

use acl_sim::sim::types::{
    CommercialOffer, ContractPeriod, EnergyIncentive, IcmsClass, SimulationParams,
    TariffStructure, TaxProfile,
};
use acl_sim::sim::{Engine, simulate};
use common::EPS;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn twelve_month_blue_discount_run() {
    let result = simulate(&common::blue_discount_params());

    assert_eq!(result.monthly.len(), 12);
    assert_eq!(result.annual.len(), 1);
    assert_eq!(result.period_label, ("Jan/2025".to_string(), "Dez/2025".to_string()));
    assert!(
        result.overall_discount > 0.15 && result.overall_discount < 0.20,
        "overall discount {} should sit just under the 20 % offer",
        result.overall_discount
    );
    assert!(result.total_savings > 0.0);
}

#[test]
fn same_year_months_share_one_snapshot() {
    let result = simulate(&common::blue_discount_params());
    let first = &result.monthly[0];
    for m in &result.monthly[1..] {
        assert_eq!(m.acr, first.acr, "{} differs from {}", m.period, first.period);
        assert_eq!(m.acl, first.acl);
    }
}

#[test]
fn acl_total_matches_acr_total_times_discount() {
    let result = simulate(&common::blue_discount_params());
    let expected = result.total_acr_spend * (1.0 - result.overall_discount);
    assert!((result.total_acl_spend - expected).abs() < 1e-3);
}

#[test]
fn annual_rollups_sum_to_monthly_totals() {
    let contract = ContractPeriod::new(7, 2024, 3, 2027, 9.67).unwrap();
    let p = common::params(
        TariffStructure::Blue,
        CommercialOffer::guaranteed_discount(15.0).unwrap(),
        contract,
    );
    let result = simulate(&p);

    let monthly_savings: f64 = result.monthly.iter().map(|m| m.savings).sum();
    let annual_savings: f64 = result.annual.iter().map(|y| y.savings).sum();
    assert!((monthly_savings - annual_savings).abs() < 1e-3);
    assert!((result.total_savings - monthly_savings).abs() < 1e-3);

    let months: u32 = result.annual.iter().map(|y| y.months).sum();
    assert_eq!(months as usize, result.monthly.len());
    assert_eq!(result.years, vec![2024, 2025, 2026, 2027]);
    assert_eq!(result.annual[0].months, 6);
    assert_eq!(result.annual[3].months, 3);
}

#[test]
fn zero_npv_rate_is_plain_sum() {
    let contract = ContractPeriod::new(1, 2025, 12, 2027, 0.0).unwrap();
    let p = common::params(
        TariffStructure::Blue,
        CommercialOffer::guaranteed_discount(20.0).unwrap(),
        contract,
    );
    let result = simulate(&p);
    assert!((result.npv_savings - result.total_savings).abs() < 1e-6);
}

#[test]
fn positive_npv_rate_discounts_later_years() {
    let contract = ContractPeriod::new(1, 2025, 12, 2027, 9.67).unwrap();
    let p = common::params(
        TariffStructure::Blue,
        CommercialOffer::guaranteed_discount(20.0).unwrap(),
        contract,
    );
    let result = simulate(&p);
    assert!(result.npv_savings < result.total_savings);
    // The first year is never discounted.
    assert!(result.npv_savings > result.savings_by_year[0]);
}

#[test]
fn series_length_spans_year_boundaries() {
    for (sm, sy, em, ey, expected) in [
        (1, 2025, 1, 2025, 1),
        (11, 2024, 2, 2026, 16),
        (1, 2025, 12, 2027, 36),
        (12, 2025, 1, 2026, 2),
    ] {
        let contract = ContractPeriod::new(sm, sy, em, ey, 0.0).unwrap();
        let p = common::params(
            TariffStructure::Green,
            CommercialOffer::guaranteed_discount(10.0).unwrap(),
            contract,
        );
        assert_eq!(simulate(&p).monthly.len(), expected, "{sm}/{sy}..{em}/{ey}");
    }
}

#[test]
fn inverted_period_is_rejected() {
    assert!(ContractPeriod::new(6, 2026, 5, 2026, 0.0).is_err());
    assert!(ContractPeriod::new(1, 2027, 12, 2026, 0.0).is_err());
}

#[test]
fn tariffs_escalate_once_per_contract_year() {
    let contract = ContractPeriod::new(1, 2025, 12, 2026, 0.0).unwrap();
    let p = common::params(
        TariffStructure::Blue,
        CommercialOffer::guaranteed_discount(20.0).unwrap(),
        contract,
    );
    let result = simulate(&p);
    let jan_2025 = &result.monthly[0];
    let dec_2025 = &result.monthly[11];
    let jan_2026 = &result.monthly[12];

    assert_eq!(jan_2025.acr_per_mwh, dec_2025.acr_per_mwh);
    assert!((jan_2026.acr_per_mwh / jan_2025.acr_per_mwh - 1.05).abs() < 1e-9);
    assert!((jan_2026.acl_per_mwh / jan_2025.acl_per_mwh - 1.05).abs() < 1e-9);
}

#[test]
fn flat_readjustment_keeps_every_month_equal() {
    let contract = ContractPeriod::new(1, 2025, 12, 2027, 0.0).unwrap();
    let p = common::params(
        TariffStructure::Blue,
        CommercialOffer::guaranteed_discount(20.0).unwrap(),
        contract,
    );
    let monthly = Engine::new(&p).with_readjustment(0.0).monthly();
    assert_eq!(monthly.len(), 36);
    assert!(monthly.iter().all(|m| m.acr_per_mwh == monthly[0].acr_per_mwh));
}

#[test]
fn green_ignores_peak_demand_rate() {
    let offer = CommercialOffer::guaranteed_discount(20.0).unwrap();
    let base = common::params(TariffStructure::Green, offer.clone(), common::one_year(2025));
    let mut spiked = base.clone();
    spiked.tariff.tusd_kw_peak = 5_000.0;

    let a = simulate(&base);
    let b = simulate(&spiked);
    assert_eq!(a.total_acr_spend, b.total_acr_spend);
    assert_eq!(a.total_acl_spend, b.total_acl_spend);

    // Blue does bill the peak demand.
    let blue = common::params(TariffStructure::Blue, offer, common::one_year(2025));
    let mut blue_spiked = blue.clone();
    blue_spiked.tariff.tusd_kw_peak = 5_000.0;
    assert!(simulate(&blue_spiked).total_acr_spend > simulate(&blue).total_acr_spend);
}

#[test]
fn zero_discount_prices_energy_at_reference() {
    let p = common::params(
        TariffStructure::Blue,
        CommercialOffer::guaranteed_discount(0.0).unwrap(),
        common::one_year(2025),
    );
    let result = simulate(&p);
    for m in &result.monthly {
        assert!((m.acl.energy - m.acl.reference_energy).abs() < EPS);
        assert!((m.acl_per_mwh - m.acr_per_mwh).abs() < EPS);
    }
    assert!(result.total_savings.abs() < 1e-3);
    assert!(result.overall_discount.abs() < 1e-9);
}

#[test]
fn fixed_price_grossed_up_for_standard_taxpayer() {
    let p = common::params(
        TariffStructure::Blue,
        CommercialOffer::fixed_price(vec![200.0]).unwrap(),
        common::one_year(2025),
    );
    let result = simulate(&p);
    let expected_energy = 200.0 / (1.0 - 0.18) / (1.0 - 0.065);

    for m in &result.monthly {
        assert_eq!(m.acl.energy, 200.0);
        assert!((m.acl.energy_final - expected_energy).abs() < EPS);
        // Blue conventional energy: wire is the peak TUSD energy rate only.
        assert!((m.acl.wire - 80.0).abs() < EPS);
        assert!((m.acl.total - (m.acl.wire + expected_energy + m.acl.ccee_fee)).abs() < EPS);
    }
}

#[test]
fn fixed_price_gross_up_follows_taxpayer_class() {
    for (class, expected) in [
        (IcmsClass::StandardTaxpayer, 200.0 / 0.82 / 0.935),
        (IcmsClass::IcmsExemptTaxpayer, 200.0 / 0.935),
        (IcmsClass::NonTaxpayer, 200.0),
        (IcmsClass::NonTaxpayerAclExempt, 200.0),
    ] {
        let mut p = common::params(
            TariffStructure::Green,
            CommercialOffer::fixed_price(vec![200.0]).unwrap(),
            common::one_year(2025),
        );
        p.taxes = common::example_taxes(EnergyIncentive::Conventional, class);
        let first = &simulate(&p).monthly[0];
        assert!(
            (first.acl.energy_final - expected).abs() < EPS,
            "{class:?}: {} != {expected}",
            first.acl.energy_final
        );
    }
}

#[test]
fn fixed_price_schedule_reuses_last_year() {
    let contract = ContractPeriod::new(1, 2025, 12, 2027, 0.0).unwrap();
    let p = common::params(
        TariffStructure::Blue,
        CommercialOffer::fixed_price(vec![300.0, 250.0]).unwrap(),
        contract,
    );
    let result = simulate(&p);
    assert_eq!(result.monthly[0].acl.energy, 300.0);
    assert_eq!(result.monthly[12].acl.energy, 250.0);
    assert_eq!(result.monthly[35].acl.energy, 250.0);
}

#[test]
fn ccee_fee_adds_to_every_month() {
    let base = common::blue_discount_params();
    let mut with_fee = base.clone();
    with_fee.taxes = TaxProfile::new(
        18.0,
        6.5,
        EnergyIncentive::Conventional,
        IcmsClass::StandardTaxpayer,
        3.0,
    )
    .unwrap();

    let a = simulate(&base);
    let b = simulate(&with_fee);
    for (x, y) in a.monthly.iter().zip(&b.monthly) {
        assert!((y.acl_per_mwh - x.acl_per_mwh - 3.0).abs() < EPS);
        assert_eq!(x.acr_per_mwh, y.acr_per_mwh);
    }
}

#[test]
fn full_incentive_bills_demand_in_free_market() {
    let mut p = common::blue_discount_params();
    p.taxes = common::example_taxes(EnergyIncentive::Full, IcmsClass::StandardTaxpayer);
    let first = &simulate(&p).monthly[0];
    // (60*100 + 20*300) / 150 + 80
    assert!((first.acl.wire - 160.0).abs() < EPS);

    p.taxes = common::example_taxes(EnergyIncentive::Half, IcmsClass::StandardTaxpayer);
    let first = &simulate(&p).monthly[0];
    assert!((first.acl.wire - 120.0).abs() < EPS);
}

#[test]
fn report_renders_headline_lines() {
    let report = simulate(&common::blue_discount_params()).to_string();
    assert!(report.contains("--- Savings Report ---"));
    assert!(report.contains("Jan/2025 a Dez/2025"));
    assert!(report.contains("Overall discount:"));
    assert!(report.contains("R$ "));
}

/// Random scenarios must keep the bookkeeping identities intact.
#[test]
fn randomized_scenarios_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(42);

    for case in 0..200 {
        let structure = if rng.random_bool(0.5) {
            TariffStructure::Blue
        } else {
            TariffStructure::Green
        };
        let discount_pct = rng.random_range(0.0..=50.0);
        let start_year = rng.random_range(2020..=2030);
        let start_month = rng.random_range(1..=12);
        let end_year = rng.random_range(start_year..=2035);
        let end_month = if end_year == start_year {
            rng.random_range(start_month..=12)
        } else {
            rng.random_range(1..=12)
        };
        let contract =
            ContractPeriod::new(start_month, start_year, end_month, end_year, 0.0).unwrap();

        let mut p: SimulationParams = common::params(
            structure,
            CommercialOffer::guaranteed_discount(discount_pct).unwrap(),
            contract.clone(),
        );
        p.tariff.tusd_kw_peak = rng.random_range(0.0..100.0);
        p.tariff.tusd_kw_offpeak = rng.random_range(1.0..50.0);
        p.tariff.te_offpeak = rng.random_range(100.0..600.0);

        let result = simulate(&p);
        let expected_len = ((end_year - start_year) * 12 + end_month as i32 - start_month as i32
            + 1) as usize;
        assert_eq!(result.monthly.len(), expected_len, "case {case}");
        assert_eq!(result.monthly.len(), contract.month_count());

        let d = discount_pct / 100.0;
        let mwh = p.consumption.total_mwh();
        for m in &result.monthly {
            let expected = d * m.acl.reference_energy * mwh;
            assert!(
                (m.savings - expected).abs() < 1e-6 * expected.abs().max(1.0),
                "case {case} {}: savings {} != {expected}",
                m.period,
                m.savings
            );
        }

        let annual_sum: f64 = result.annual.iter().map(|y| y.savings).sum();
        assert!((annual_sum - result.total_savings).abs() < 1e-6 * result.total_savings.abs().max(1.0));
        assert!((result.npv_savings - result.total_savings).abs() < 1e-6 * result.total_savings.abs().max(1.0));

        let rebuilt = result.total_acr_spend * (1.0 - result.overall_discount);
        assert!((rebuilt - result.total_acl_spend).abs() < 1e-6 * result.total_acl_spend.max(1.0));
    }
}
