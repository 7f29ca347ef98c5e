//! Simulation run contract types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weft_contact::{ImmovableCuboid, ImmovableSphere};
use weft_solver::PhysicsConfig;
use weft_types::constants::{DEFAULT_FIXED_DT, DEFAULT_GRID_SIZE};
use weft_types::{WeftError, WeftResult};

/// Which spring processor runs the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Object-per-node processor with node–node collisions.
    #[default]
    Cpu,
    /// Flat-buffer processor running its kernels on the CPU fallback.
    GpuFallback,
    /// Flat-buffer processor on a wgpu device (feature `wgpu`).
    Wgpu,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Cpu, BackendKind::GpuFallback, BackendKind::Wgpu];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Cpu => "cpu",
            BackendKind::GpuFallback => "gpu_fallback",
            BackendKind::Wgpu => "wgpu",
        }
    }

    /// Flat-buffer backends run explicit Euler only.
    pub fn is_flat(self) -> bool {
        !matches!(self, BackendKind::Cpu)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = WeftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                WeftError::InvalidConfig(format!(
                    "unknown backend '{s}' (expected cpu, gpu_fallback or wgpu)"
                ))
            })
    }
}

/// A rectangular cloth in the XZ plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothSpec {
    /// Centre of the cloth.
    pub center: Vec3,
    /// Extent along X (metres).
    pub width: f32,
    /// Extent along Z (metres).
    pub height: f32,
    /// Grid cells per side; the cloth has `(divisions + 1)²` nodes.
    pub divisions: u32,
    /// Rotate the cloth a quarter turn about the vertical axis through
    /// its centre after building it.
    pub quarter_turn: bool,
}

impl Default for ClothSpec {
    fn default() -> Self {
        Self {
            center: Vec3::new(0.0, 1.5, 0.0),
            width: 1.0,
            height: 1.0,
            divisions: 20,
            quarter_turn: false,
        }
    }
}

impl ClothSpec {
    pub fn node_count(&self) -> usize {
        let side = self.divisions as usize + 1;
        side * side
    }
}

/// A static collider in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ColliderSpec {
    Sphere { center: Vec3, radius: f32 },
    Cuboid { minimum: Vec3, maximum: Vec3 },
}

/// Where a run writes its results. Unset paths are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSpec {
    /// JSON position recording.
    pub recording: Option<PathBuf>,
    /// Capture a recording frame every this many ticks.
    pub record_every: u64,
    /// Binary node snapshot of the final state.
    pub snapshot: Option<PathBuf>,
    /// One-row CSV with the run metrics.
    pub metrics_csv: Option<PathBuf>,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            recording: None,
            record_every: 1,
            snapshot: None,
            metrics_csv: None,
        }
    }
}

/// Complete description of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationInput {
    pub backend: BackendKind,
    pub physics: PhysicsConfig,
    /// Spatial hash cell size (CPU backend).
    pub grid_size: f32,
    /// Frame time handed to every tick.
    pub delta_time: f32,
    pub ticks: u32,
    /// Times the run is played, resetting the cloth in between.
    pub episodes: u32,
    pub cloth: ClothSpec,
    pub colliders: Vec<ColliderSpec>,
    pub outputs: OutputSpec,
}

impl Default for SimulationInput {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            physics: PhysicsConfig::default(),
            grid_size: DEFAULT_GRID_SIZE,
            delta_time: DEFAULT_FIXED_DT,
            ticks: 150,
            episodes: 1,
            cloth: ClothSpec::default(),
            colliders: vec![ColliderSpec::Sphere {
                center: Vec3::new(0.0, 0.5, 0.0),
                radius: 0.5,
            }],
            outputs: OutputSpec::default(),
        }
    }
}

impl SimulationInput {
    pub fn from_toml_str(text: &str) -> WeftResult<Self> {
        toml::from_str(text).map_err(|e| WeftError::Serialization(e.to_string()))
    }

    pub fn to_toml_string(&self) -> WeftResult<String> {
        toml::to_string_pretty(self).map_err(|e| WeftError::Serialization(e.to_string()))
    }

    pub fn from_path(path: &Path) -> WeftResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let input = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), backend = %input.backend, "loaded simulation input");
        Ok(input)
    }

    pub fn spheres(&self) -> Vec<ImmovableSphere> {
        self.colliders
            .iter()
            .filter_map(|c| match *c {
                ColliderSpec::Sphere { center, radius } => Some(ImmovableSphere::new(center, radius)),
                ColliderSpec::Cuboid { .. } => None,
            })
            .collect()
    }

    pub fn cuboids(&self) -> Vec<ImmovableCuboid> {
        self.colliders
            .iter()
            .filter_map(|c| match *c {
                ColliderSpec::Cuboid { minimum, maximum } => {
                    Some(ImmovableCuboid::new(minimum, maximum))
                }
                ColliderSpec::Sphere { .. } => None,
            })
            .collect()
    }

    /// Simulated seconds covered by the run.
    pub fn duration(&self) -> f32 {
        self.ticks as f32 * self.delta_time
    }
}
