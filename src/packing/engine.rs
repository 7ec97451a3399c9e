//! Hand-off to the external physics engine
//!
//! The engine owns collision, integration and export. This module only
//! defines what it receives ([`PhysicsEngine`]) and ships [`SceneWriter`], an
//! engine-neutral implementation that records the scene as JSON for a host
//! script to replay.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::packing::scenario::Packing;
use crate::packing::states::{ContainerGeometry, NVec3, PistonGeometry};

/// One rigid particle as the engine must create it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleBody {
    pub species_index: usize,
    pub position: NVec3,
    pub rotation: NVec3, // Euler x, y, z
    pub sides: u32,
    pub radius: f64, // scaled
    pub height: f64, // scaled
    pub mass: f64, // density * scaled volume
    pub friction: f64,
    pub restitution: f64,
    pub linear_damping: f64,
}

/// Rigid-body role of a static or moving object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dynamics {
    #[serde(rename = "passive")]
    Passive,
    #[serde(rename = "active")]
    Active,
}

/// Scene-building interface of an external physics engine
pub trait PhysicsEngine {
    fn add_particle(&mut self, body: &ParticleBody) -> Result<()>;
    fn add_container(&mut self, container: &ContainerGeometry) -> Result<()>;
    fn add_piston(&mut self, piston: &PistonGeometry) -> Result<()>;
    /// Run the simulation up to `frame`; blocks until the bake is done
    fn bake(&mut self, frame: u32) -> Result<()>;
    fn export(&mut self, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneContainer {
    #[serde(flatten)]
    pub geometry: ContainerGeometry,
    pub dynamics: Dynamics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePiston {
    #[serde(flatten)]
    pub geometry: PistonGeometry,
    pub dynamics: Dynamics,
}

/// Serialized scene description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub seed: u64,
    pub bake_frame: Option<u32>,
    pub container: Option<SceneContainer>,
    pub piston: Option<ScenePiston>,
    pub particles: Vec<ParticleBody>,
}

/// Records the scene and writes it as JSON on export
#[derive(Debug, Default)]
pub struct SceneWriter {
    scene: Scene,
}

impl SceneWriter {
    pub fn new(seed: u64) -> Self {
        Self {
            scene: Scene {
                seed,
                ..Default::default()
            },
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

impl PhysicsEngine for SceneWriter {
    fn add_particle(&mut self, body: &ParticleBody) -> Result<()> {
        self.scene.particles.push(body.clone());
        Ok(())
    }

    fn add_container(&mut self, container: &ContainerGeometry) -> Result<()> {
        self.scene.container = Some(SceneContainer {
            geometry: container.clone(),
            dynamics: Dynamics::Passive,
        });
        Ok(())
    }

    fn add_piston(&mut self, piston: &PistonGeometry) -> Result<()> {
        self.scene.piston = Some(ScenePiston {
            geometry: piston.clone(),
            dynamics: Dynamics::Active,
        });
        Ok(())
    }

    // the host engine performs the bake when it replays the scene
    fn bake(&mut self, frame: u32) -> Result<()> {
        self.scene.bake_frame = Some(frame);
        Ok(())
    }

    fn export(&mut self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.scene)?;
        info!(path = %path.display(), particles = self.scene.particles.len(), "scene exported");
        Ok(())
    }
}

/// Feed a packing to `engine`, bake to the packing's frame and export
pub fn drive(packing: &Packing, engine: &mut dyn PhysicsEngine, output: &Path) -> Result<()> {
    for body in packing.particle_bodies()? {
        engine.add_particle(&body)?;
    }
    engine.add_container(&packing.container)?;
    if let Some(piston) = &packing.piston {
        engine.add_piston(piston)?;
    }
    engine.bake(packing.bake_frame)?;
    engine.export(output)
}
