//! Benchmark scenarios: cloths, colliders and physics for each case.
//!
//! Four canonical scenarios:
//! 1. **Sphere drape**: a cloth falls onto a sphere
//! 2. **Table drape**: a cloth falls onto a table top above a floor
//! 3. **Grab**: two corners of a cloth lying on the floor are lifted
//! 4. **Pile**: two cloths fall onto each other (node–node contacts)

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weft_contact::{ImmovableCuboid, ImmovableSphere};
use weft_io::SimulationInput;
use weft_solver::{PhysicsConfig, SpringProcessor};
use weft_types::constants::{DEFAULT_FIXED_DT, DEFAULT_GRID_SIZE};
use weft_types::WeftResult;

use crate::cloth::{ClothNodes, RectangularCloth};
use crate::grab::Grab;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    SphereDrape,
    TableDrape,
    Grab,
    Pile,
    /// Built from a run file.
    Custom,
}

impl ScenarioKind {
    /// The canonical scenarios.
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::SphereDrape,
            ScenarioKind::TableDrape,
            ScenarioKind::Grab,
            ScenarioKind::Pile,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::SphereDrape => "sphere_drape",
            ScenarioKind::TableDrape => "table_drape",
            ScenarioKind::Grab => "grab",
            ScenarioKind::Pile => "pile",
            ScenarioKind::Custom => "custom",
        }
    }

    pub fn from_name(name: &str) -> Option<ScenarioKind> {
        Self::all().iter().copied().find(|kind| kind.name() == name)
    }
}

/// Lifts a set of cloth corners at constant speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabPlan {
    /// Indices into [`ClothNodes::corners`] of the first cloth.
    pub corners: [usize; 2],
    /// Anchor velocity (m/s).
    pub velocity: Vec3,
}

/// A fully specified scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub cloths: Vec<RectangularCloth>,
    /// Rotate each cloth a quarter turn once it is built.
    pub quarter_turn: bool,
    pub spheres: Vec<ImmovableSphere>,
    pub cuboids: Vec<ImmovableCuboid>,
    pub physics: PhysicsConfig,
    /// Spatial hash cell size for the CPU processor.
    pub grid_size: f32,
    pub ticks: u32,
    /// Times the ticks are played, restarting the cloth in between.
    pub episodes: u32,
    pub delta_time: f32,
    pub grab: Option<GrabPlan>,
}

/// A scenario after its cloths were added to a processor.
#[derive(Debug, Clone)]
pub struct BuiltScenario {
    pub cloths: Vec<ClothNodes>,
    pub grab: Option<(Grab, Vec3)>,
}

fn floor() -> ImmovableCuboid {
    ImmovableCuboid::new(Vec3::new(-4.0, -0.2, -4.0), Vec3::new(4.0, 0.0, 4.0))
}

impl Scenario {
    fn base(kind: ScenarioKind, cloths: Vec<RectangularCloth>) -> Self {
        Self {
            kind,
            cloths,
            quarter_turn: false,
            spheres: Vec::new(),
            cuboids: Vec::new(),
            physics: PhysicsConfig::default(),
            grid_size: DEFAULT_GRID_SIZE,
            ticks: 150,
            episodes: 1,
            delta_time: DEFAULT_FIXED_DT,
            grab: None,
        }
    }

    /// A 1.5 m cloth at 20×20 divisions falls onto a 0.5 m sphere.
    pub fn sphere_drape() -> WeftResult<Self> {
        let cloth = RectangularCloth::new(Vec3::new(0.0, 1.2, 0.0), 1.5, 1.5, 20)?;
        let mut s = Self::base(ScenarioKind::SphereDrape, vec![cloth]);
        s.spheres.push(ImmovableSphere::new(Vec3::new(0.0, 0.5, 0.0), 0.5));
        Ok(s)
    }

    /// A 1.5 m cloth falls onto a 1 m table standing on the floor.
    pub fn table_drape() -> WeftResult<Self> {
        let cloth = RectangularCloth::new(Vec3::new(0.0, 1.1, 0.0), 1.5, 1.5, 20)?;
        let mut s = Self::base(ScenarioKind::TableDrape, vec![cloth]);
        s.cuboids.push(ImmovableCuboid::new(
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.8, 0.5),
        ));
        s.cuboids.push(floor());
        Ok(s)
    }

    /// A cloth lying on the floor has two adjacent corners lifted.
    pub fn grab() -> WeftResult<Self> {
        let cloth = RectangularCloth::new(Vec3::new(0.0, 0.06, 0.0), 1.0, 1.0, 16)?;
        let mut s = Self::base(ScenarioKind::Grab, vec![cloth]);
        s.cuboids.push(floor());
        s.ticks = 100;
        s.grab = Some(GrabPlan {
            corners: [1, 3],
            velocity: Vec3::new(0.0, 0.6, 0.0),
        });
        Ok(s)
    }

    /// Two cloths dropped onto each other above the floor.
    pub fn pile() -> WeftResult<Self> {
        let lower = RectangularCloth::new(Vec3::new(0.0, 0.4, 0.0), 1.0, 1.0, 12)?;
        let upper = RectangularCloth::new(Vec3::new(0.1, 0.6, 0.1), 1.0, 1.0, 12)?;
        let mut s = Self::base(ScenarioKind::Pile, vec![lower, upper]);
        s.cuboids.push(floor());
        Ok(s)
    }

    pub fn from_kind(kind: ScenarioKind) -> WeftResult<Self> {
        match kind {
            ScenarioKind::SphereDrape => Self::sphere_drape(),
            ScenarioKind::TableDrape => Self::table_drape(),
            ScenarioKind::Grab => Self::grab(),
            ScenarioKind::Pile => Self::pile(),
            ScenarioKind::Custom => Self::from_input(&SimulationInput::default()),
        }
    }

    /// Scenario described by a run file.
    pub fn from_input(input: &SimulationInput) -> WeftResult<Self> {
        let cloth = RectangularCloth::from_spec(&input.cloth)?;
        let mut s = Self::base(ScenarioKind::Custom, vec![cloth]);
        s.quarter_turn = input.cloth.quarter_turn;
        s.spheres = input.spheres();
        s.cuboids = input.cuboids();
        s.physics = input.physics.clone();
        s.grid_size = input.grid_size;
        s.ticks = input.ticks;
        s.episodes = input.episodes;
        s.delta_time = input.delta_time;
        Ok(s)
    }

    pub fn with_ticks(mut self, ticks: u32) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn with_episodes(mut self, episodes: u32) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn node_count(&self) -> usize {
        self.cloths.iter().map(RectangularCloth::node_count).sum()
    }

    pub fn damper_count(&self) -> usize {
        self.cloths.iter().map(RectangularCloth::damper_count).sum()
    }

    /// Adds every cloth to `processor`, finalizes it and sets up the grab.
    pub fn build(&self, processor: &mut dyn SpringProcessor) -> WeftResult<BuiltScenario> {
        let cloths = self
            .cloths
            .iter()
            .map(|cloth| cloth.build(processor))
            .collect::<WeftResult<Vec<_>>>()?;
        processor.finalize_topology()?;

        if self.quarter_turn {
            for nodes in &cloths {
                nodes.rotate_quarter_turn(processor)?;
            }
        }

        let grab = match (self.grab, cloths.first()) {
            (Some(plan), Some(nodes)) => {
                let corners = nodes.corners();
                let grabbed = plan.corners.iter().map(|&c| corners[c % 4]).collect();
                Some((Grab::around_centroid(&*processor, grabbed)?, plan.velocity))
            }
            _ => None,
        };

        Ok(BuiltScenario { cloths, grab })
    }
}

impl BuiltScenario {
    /// Returns the cloths to their built state: start positions at rest,
    /// the quarter turn applied again and the grab anchor back home.
    pub fn restart(
        &mut self,
        scenario: &Scenario,
        processor: &mut dyn SpringProcessor,
    ) -> WeftResult<()> {
        processor.reset_to_initial_state()?;
        if scenario.quarter_turn {
            for nodes in &self.cloths {
                nodes.rotate_quarter_turn(processor)?;
            }
        }
        if let Some((grab, _)) = self.grab.as_mut() {
            grab.reset();
        }
        Ok(())
    }
}
