//! Benchmark metrics: data collected during a benchmark run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use weft_contact::ContactCounts;
use weft_types::WeftResult;

/// Metrics collected from one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub scenario: String,
    /// Processor name (`cpu`, `gpu`).
    pub backend: String,
    pub node_count: usize,
    pub damper_count: usize,
    pub ticks: u32,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// Average wall-clock time per tick (seconds).
    pub avg_tick_time: f64,
    pub min_tick_time: f64,
    pub max_tick_time: f64,
    /// Should approach zero once the cloth has settled.
    pub final_kinetic_energy: f64,
    /// Elastic energy left in the springs.
    pub final_potential_energy: f64,
    /// Largest node displacement from the start position.
    pub max_displacement: f32,
    /// Contacts summed over every tick.
    pub contacts: ContactCounts,
}

impl BenchmarkMetrics {
    pub fn to_csv_header() -> String {
        "scenario,backend,node_count,damper_count,ticks,total_wall_time_s,avg_tick_ms,min_tick_ms,max_tick_ms,final_ke,final_pe,max_displacement,pairs_tested,node_contacts,static_contacts".to_string()
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.6},{:.4},{:.4},{:.4},{:.6e},{:.6e},{:.6},{},{},{}",
            self.scenario,
            self.backend,
            self.node_count,
            self.damper_count,
            self.ticks,
            self.total_wall_time,
            self.avg_tick_time * 1000.0,
            self.min_tick_time * 1000.0,
            self.max_tick_time * 1000.0,
            self.final_kinetic_energy,
            self.final_potential_energy,
            self.max_displacement,
            self.contacts.pairs_tested,
            self.contacts.node_contacts,
            self.contacts.static_contacts,
        )
    }

    /// Header plus one row per run.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv.push('\n');
        csv
    }

    pub fn write_csv(path: &Path, metrics: &[BenchmarkMetrics]) -> WeftResult<()> {
        std::fs::write(path, Self::to_csv(metrics))?;
        tracing::info!(path = %path.display(), rows = metrics.len(), "metrics written");
        Ok(())
    }
}
