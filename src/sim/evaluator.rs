//! Per-month regulated (ACR) and free-market (ACL) cost evaluation.

use super::types::{
    AclBreakdown, AcrBreakdown, CommercialOffer, ConsumptionProfile, IcmsClass, TariffSnapshot,
    TariffStructure, TaxProfile,
};

/// Tax overhead on `base` for a rate charged "por dentro": `base/(1-r) - base`.
///
/// A rate of 1 or more is treated as no tax rather than an error.
pub fn tax_overhead(base: f64, rate: f64) -> f64 {
    if rate < 1.0 {
        base / (1.0 - rate) - base
    } else {
        0.0
    }
}

/// Grosses `price` up by a tax rate, leaving it untouched for rates of 1 or more.
pub fn gross_up(price: f64, rate: f64) -> f64 {
    if rate < 1.0 { price / (1.0 - rate) } else { price }
}

/// ACR and ACL costs of one month, per MWh.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCost {
    pub acr: AcrBreakdown,
    pub acl: AclBreakdown,
}

/// Evaluates monthly costs for a fixed consumer, tax regime, and offer.
///
/// Holds only borrowed inputs; the tariff and year offset vary per call.
#[derive(Debug, Clone, Copy)]
pub struct MonthlyEvaluator<'a> {
    consumption: &'a ConsumptionProfile,
    taxes: &'a TaxProfile,
    offer: &'a CommercialOffer,
    structure: TariffStructure,
}

impl<'a> MonthlyEvaluator<'a> {
    pub fn new(
        consumption: &'a ConsumptionProfile,
        taxes: &'a TaxProfile,
        offer: &'a CommercialOffer,
        structure: TariffStructure,
    ) -> Self {
        Self {
            consumption,
            taxes,
            offer,
            structure,
        }
    }

    /// Computes both regimes for one projected month.
    ///
    /// # Arguments
    ///
    /// * `tariff` - Tariff snapshot projected for this month
    /// * `year_offset` - Zero-based contract year, used to index fixed prices
    pub fn evaluate(&self, tariff: &TariffSnapshot, year_offset: usize) -> MonthlyCost {
        let acr = self.acr(tariff);
        let acl = self.acl(tariff, &acr, year_offset);
        MonthlyCost { acr, acl }
    }

    /// Regulated cost: wire and energy components, each grossed up by PIS/COFINS and ICMS.
    pub fn acr(&self, t: &TariffSnapshot) -> AcrBreakdown {
        let c = self.consumption;
        let mwh = c.total_mwh();
        let peak = c.peak_share();
        let offpeak = c.offpeak_share();

        let wire = match self.structure {
            TariffStructure::Blue => {
                (t.tusd_kw_peak * c.demand_peak_kw() + t.tusd_kw_offpeak * c.demand_offpeak_kw())
                    / mwh
                    + t.tusd_mwh_peak * peak
                    + t.tusd_mwh_offpeak * offpeak
            }
            TariffStructure::Green => {
                t.tusd_kw_offpeak * c.total_demand_kw() / mwh + t.tusd_mwh_offpeak
            }
        };
        let energy = t.te_offpeak * offpeak + t.te_peak * peak;

        let pis = self.taxes.pis_cofins();
        let icms = self.taxes.icms();
        let wire_pis = tax_overhead(wire, pis);
        let wire_icms = tax_overhead(wire, icms);
        let energy_pis = tax_overhead(energy, pis);
        let energy_icms = tax_overhead(energy, icms);

        AcrBreakdown {
            wire,
            wire_pis,
            wire_icms,
            energy,
            energy_pis,
            energy_icms,
            total: wire + wire_pis + wire_icms + energy + energy_pis + energy_icms,
        }
    }

    /// Free-market wire charge: demand rates scaled by the incentive multiplier,
    /// plus the unmodified peak TUSD energy rate for Blue.
    pub fn acl_wire(&self, t: &TariffSnapshot) -> f64 {
        let c = self.consumption;
        let mwh = c.total_mwh();
        let incentive = self.taxes.incentive().multiplier();

        match self.structure {
            TariffStructure::Blue => {
                incentive
                    * (t.tusd_kw_peak * c.demand_peak_kw()
                        + t.tusd_kw_offpeak * c.demand_offpeak_kw())
                    / mwh
                    + t.tusd_mwh_peak
            }
            TariffStructure::Green => incentive * t.tusd_kw_offpeak * c.total_demand_kw() / mwh,
        }
    }

    /// Free-market cost for the month, given the month's regulated cost.
    pub fn acl(&self, t: &TariffSnapshot, acr: &AcrBreakdown, year_offset: usize) -> AclBreakdown {
        let wire = self.acl_wire(t);
        let reference_energy = acr.total - wire;

        let (energy, energy_final) = match self.offer {
            // The reference price already embeds the regulated taxes.
            CommercialOffer::GuaranteedDiscount { discount } => {
                let price = reference_energy * (1.0 - discount);
                (price, price)
            }
            CommercialOffer::FixedPrice { .. } => {
                let price = self
                    .offer
                    .price_for_year(year_offset)
                    .unwrap_or(reference_energy);
                (price, self.gross_up_fixed_price(price))
            }
        };

        let ccee_fee = self.taxes.ccee_fee_per_mwh();
        AclBreakdown {
            wire,
            reference_energy,
            energy,
            energy_final,
            ccee_fee,
            total: wire + energy_final + ccee_fee,
        }
    }

    /// Applies the taxpayer-class gross-up to a raw fixed energy price.
    pub fn gross_up_fixed_price(&self, price: f64) -> f64 {
        let pis = self.taxes.pis_cofins();
        match self.taxes.icms_class() {
            IcmsClass::StandardTaxpayer => gross_up(gross_up(price, self.taxes.icms()), pis),
            IcmsClass::IcmsExemptTaxpayer => gross_up(price, pis),
            IcmsClass::NonTaxpayer | IcmsClass::NonTaxpayerAclExempt => price,
        }
    }
}
