//! Fluent builder APIs for fixture sets.
//!
//! The [`FixturePlan`] provides a convenient way to seed a complete
//! catalog with users, categories and products.

mod plan;

pub use plan::{FixturePlan, PlanMetrics, PlanResult};
