//! Regulated (ACR) vs free-market (ACL) electricity cost simulator.
//!
//! Projects a distribution utility's regulated tariff over a contract period,
//! prices each month under both regimes, and rolls the result up into yearly
//! savings and their net present value.

#[cfg(feature = "api")]
pub mod api;
pub mod batch;
pub mod config;
/// Result export (CSV, JSON).
pub mod io;
pub mod locale;
/// Tariff projection, cost evaluation, and aggregation.
pub mod sim;
pub mod tariffs;
