/// Annual rollups and NPV of savings.
pub mod aggregate;
pub mod compare;
pub mod engine;
pub mod error;
/// Per-month ACR and ACL cost formulas.
pub mod evaluator;
pub mod finance;
/// Monthly tariff projection.
pub mod series;
pub mod types;

pub use engine::{Engine, SimulationResult, simulate};
pub use error::SimError;
