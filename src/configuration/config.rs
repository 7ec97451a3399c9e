//! Configuration types for loading packing parameters from YAML or JSON.
//!
//! A parameter file is a flat mapping. Species A and B are described by
//! suffixed keys; A is the remainder species whose mass fraction is implied
//! by `mass_fraction_B`.
//!
//! # YAML format
//!
//! ```yaml
//! r_A: 0.06               # circumscribed radius of species A
//! r_B: 0.06
//! thickness_A: 0.05       # prism height
//! thickness_B: 0.10
//! density_A: 1.6
//! density_B: 1.6
//! mass_fraction_B: 0.3    # species A gets 0.7
//!
//! num_particles_x: 10     # lattice extents
//! num_particles_y: 10
//! num_particles_z: 20
//! num_sides: 6            # hexagonal prisms
//! distance: 0.15          # lattice spacing
//! seed: 42                # omit or null for a random seed
//! scale: 1.0
//!
//! container_wall_thickness: 0.2
//! container_piston_slack: 0.05
//! use_piston: true
//! mass_piston: 1.0
//! placement: "grid"       # or "random"
//! ```
//!
//! Files with a `.json` extension are read as JSON with the same keys. The
//! key names of the first packing scripts (`r_aligned`, `r_non_aligned`,
//! `num_cubes_x`, `mass_fraction_non_aligned`, ...) are accepted as aliases,
//! with "aligned" mapping to A and "non-aligned" to B.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::{PackError, Result};
use crate::packing::species::SpeciesSpec;

/// How slot positions are generated
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementConfig {
    #[serde(rename = "grid")] // regular lattice, no position draws
    #[default]
    Grid,

    #[serde(rename = "random")] // random x/y stacked at the self-avoidance pitch
    Random,
}

/// Top-level parameter file
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ParametersConfig {
    #[serde(rename = "r_A", alias = "r_aligned")]
    pub r_a: f64,
    #[serde(rename = "r_B", alias = "r_non_aligned")]
    pub r_b: f64,
    #[serde(rename = "thickness_A", alias = "thickness_aligned")]
    pub thickness_a: f64,
    #[serde(rename = "thickness_B", alias = "thickness_non_aligned")]
    pub thickness_b: f64,
    #[serde(rename = "density_A", alias = "density_aligned")]
    pub density_a: f64,
    #[serde(rename = "density_B", alias = "density_non_aligned")]
    pub density_b: f64,
    #[serde(rename = "mass_fraction_B", alias = "mass_fraction_non_aligned")]
    pub mass_fraction_b: f64,

    #[serde(rename = "friction_A", default = "default_contact")]
    pub friction_a: f64,
    #[serde(rename = "friction_B", default = "default_contact")]
    pub friction_b: f64,
    #[serde(rename = "restitution_A", default = "default_contact")]
    pub restitution_a: f64,
    #[serde(rename = "restitution_B", default = "default_contact")]
    pub restitution_b: f64,
    #[serde(rename = "linear_damping_A", default = "default_damping")]
    pub linear_damping_a: f64,
    #[serde(rename = "linear_damping_B", default = "default_damping")]
    pub linear_damping_b: f64,

    #[serde(alias = "num_cubes_x")]
    pub num_particles_x: usize,
    #[serde(alias = "num_cubes_y")]
    pub num_particles_y: usize,
    #[serde(alias = "num_cubes_z")]
    pub num_particles_z: usize,
    #[serde(default = "default_num_sides")]
    pub num_sides: u32,
    pub distance: f64, // lattice spacing
    #[serde(default, deserialize_with = "deserialize_seed")]
    pub seed: Option<u64>, // None until resolved
    #[serde(default = "default_one")]
    pub scale: f64, // applied to every radius and thickness

    #[serde(default = "default_wall_thickness")]
    pub container_wall_thickness: f64,
    #[serde(default = "default_piston_slack")]
    pub container_piston_slack: f64,
    #[serde(default)]
    pub use_piston: bool,
    #[serde(default = "default_one")]
    pub mass_piston: f64,
    #[serde(default = "default_height_factor")]
    pub container_height_factor: f64,

    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub rounding_tolerance: Option<f64>, // None -> resolver default
    #[serde(default = "default_bake_frame")]
    pub bake_frame: u32, // frame the external engine bakes to
}

fn default_contact() -> f64 {
    0.5
}

fn default_damping() -> f64 {
    0.04
}

fn default_num_sides() -> u32 {
    6
}

fn default_one() -> f64 {
    1.0
}

fn default_wall_thickness() -> f64 {
    0.2
}

fn default_piston_slack() -> f64 {
    0.05
}

fn default_height_factor() -> f64 {
    crate::packing::container::DEFAULT_HEIGHT_FACTOR
}

fn default_bake_frame() -> u32 {
    230
}

/// Seeds may be written as integers or, in older files, as floats
fn deserialize_seed<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SeedValue {
        Int(u64),
        Float(f64),
    }

    Ok(Option::<SeedValue>::deserialize(deserializer)?.map(|v| match v {
        SeedValue::Int(i) => i,
        SeedValue::Float(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => f as u64,
        SeedValue::Float(f) => f.to_bits(),
    }))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

impl ParametersConfig {
    /// Load from `path`, JSON for `.json` files and YAML otherwise
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let cfg: Self = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(cfg)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Write the configuration, seed included, for reproducing a run
    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_yaml::to_writer(writer, self)?;
        }
        Ok(())
    }

    /// Fill in a random seed if none was configured
    pub fn with_resolved_seed(mut self) -> Self {
        if self.seed.is_none() {
            let seed = rand::random::<u64>();
            info!(seed, "no seed configured, generated one");
            self.seed = Some(seed);
        }
        self
    }

    pub fn num_particles(&self) -> usize {
        self.num_particles_x * self.num_particles_y * self.num_particles_z
    }

    /// Species A and B at unit scale, validated
    pub fn species(&self) -> Result<Vec<SpeciesSpec>> {
        let a = SpeciesSpec {
            sides: self.num_sides,
            radius: self.r_a,
            height: self.thickness_a,
            density: self.density_a,
            friction: self.friction_a,
            restitution: self.restitution_a,
            linear_damping: self.linear_damping_a,
        };
        let b = SpeciesSpec {
            sides: self.num_sides,
            radius: self.r_b,
            height: self.thickness_b,
            density: self.density_b,
            friction: self.friction_b,
            restitution: self.restitution_b,
            linear_damping: self.linear_damping_b,
        };
        Ok(vec![a.validated()?, b.validated()?])
    }

    /// Mass fractions of A and B, A taking the remainder
    pub fn mass_fractions(&self) -> Result<Vec<f64>> {
        let x = self.mass_fraction_b;
        if !(0.0..=1.0).contains(&x) {
            return Err(PackError::InvalidMixtureInput(format!(
                "mass_fraction_B must lie in [0, 1], got {x}"
            )));
        }
        Ok(vec![1.0 - x, x])
    }

    /// Checks that do not depend on the species
    pub fn validate(&self) -> Result<()> {
        if self.num_particles() == 0 {
            return Err(PackError::InvalidMixtureInput(
                "num_particles_x/y/z must all be positive".into(),
            ));
        }
        if !(self.distance > 0.0) {
            return Err(PackError::Config(format!(
                "distance must be positive, got {}",
                self.distance
            )));
        }
        if !(self.scale > 0.0) {
            return Err(PackError::Config(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}
