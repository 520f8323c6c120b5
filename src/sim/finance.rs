//! Discounting and discount-rate helpers.

/// Blended discount `1 - acl/acr`, or 0 when `acr` is 0.
pub fn blended_discount(acl: f64, acr: f64) -> f64 {
    if acr == 0.0 { 0.0 } else { 1.0 - acl / acr }
}

/// Effective annual rate equivalent to a monthly rate.
pub fn annual_from_monthly(monthly_rate: f64) -> f64 {
    (1.0 + monthly_rate).powi(12) - 1.0
}

/// Net present value of a yearly cash-flow stream.
///
/// The first flow sits at period 0 and is not discounted; flow `t` is
/// divided by `(1 + rate)^t`. A zero rate or an empty stream degrades to a
/// plain sum.
///
/// # Examples
///
/// ```
/// use acl_sim::sim::finance::npv;
///
/// assert_eq!(npv(0.0, &[100.0, 100.0]), 200.0);
/// assert!((npv(0.1, &[100.0, 110.0]) - 200.0).abs() < 1e-9);
/// ```
pub fn npv(rate: f64, flows: &[f64]) -> f64 {
    if flows.is_empty() || rate == 0.0 {
        return flows.iter().sum();
    }
    flows
        .iter()
        .zip(0..)
        .map(|(flow, t)| flow / (1.0 + rate).powi(t))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blended_discount_guards_zero_denominator() {
        assert_eq!(blended_discount(10.0, 0.0), 0.0);
        assert!((blended_discount(80.0, 100.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn annual_from_monthly_round_trip() {
        let annual = 0.0967_f64;
        let monthly = (1.0 + annual).powf(1.0 / 12.0) - 1.0;
        assert!((annual_from_monthly(monthly) - annual).abs() < 1e-12);
    }

    #[test]
    fn npv_empty_is_zero() {
        assert_eq!(npv(0.1, &[]), 0.0);
    }

    #[test]
    fn npv_discounts_later_years() {
        // 1000 + 1000/1.1 + 1000/1.21
        let value = npv(0.1, &[1000.0, 1000.0, 1000.0]);
        let expected = 1000.0 + 1000.0 / 1.1 + 1000.0 / 1.21;
        assert!((value - expected).abs() < 1e-9);
        assert!(value < 3000.0);
    }

    #[test]
    fn npv_handles_negative_flows() {
        let value = npv(0.05, &[-100.0, 50.0]);
        assert!((value - (-100.0 + 50.0 / 1.05)).abs() < 1e-9);
    }
}
