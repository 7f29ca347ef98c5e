//! # weft-bench
//!
//! Cloth topology builder, canonical scenarios and a benchmark runner
//! that drives any [`SpringProcessor`](weft_solver::SpringProcessor)
//! and collects metrics for CSV export.

pub mod backend;
pub mod cloth;
pub mod grab;
pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use backend::create_processor;
pub use cloth::{ClothNodes, RectangularCloth};
pub use grab::Grab;
pub use metrics::BenchmarkMetrics;
pub use runner::BenchmarkRunner;
pub use scenarios::{Scenario, ScenarioKind};
