//! Build a fully-placed packing from configuration
//!
//! Takes a `ParametersConfig` (file-facing) and produces a `Packing`
//! containing:
//! - the scaled species list
//! - the resolved mixture (fractions and target populations)
//! - one `ParticleSlot` per lattice or random site
//! - container and optional piston geometry
//!
//! The call sequence is fixed: resolve, seed the sampler, place, size the
//! container, size the piston. Nothing here holds global state.

use tracing::info;

use crate::configuration::config::{ParametersConfig, PlacementConfig};
use crate::error::{PackError, Result};
use crate::packing::container::{size_container, size_piston};
use crate::packing::engine::ParticleBody;
use crate::packing::mixture::{Budget, MixtureResolver, ResolvedMixture};
use crate::packing::placement::{
    place_particles, species_counts, Grid, Placement, RandomSelfAvoiding,
};
use crate::packing::sampler::TypeSampler;
use crate::packing::species::{self_avoidance_margin, SpeciesSpec};
use crate::packing::states::{ContainerGeometry, ParticleSlot, PistonGeometry};

/// Everything the external engine needs to build the scene
#[derive(Debug, Clone)]
pub struct Packing {
    pub seed: u64,
    pub species: Vec<SpeciesSpec>, // already scaled
    pub mixture: ResolvedMixture,
    pub slots: Vec<ParticleSlot>,
    pub container: ContainerGeometry,
    pub piston: Option<PistonGeometry>,
    pub bake_frame: u32,
}

impl Packing {
    /// Build a packing; the configuration's seed must already be resolved
    pub fn build_packing(cfg: &ParametersConfig) -> Result<Self> {
        cfg.validate()?;
        let seed = cfg.seed.ok_or_else(|| {
            PackError::Config("seed must be resolved before building a packing".into())
        })?;

        // Species: geometry scaled once, here
        let species: Vec<SpeciesSpec> = cfg
            .species()?
            .iter()
            .map(|s| s.scaled(cfg.scale))
            .collect();

        // Mixture for the fixed number of slots
        let resolver = MixtureResolver {
            tolerance: cfg.rounding_tolerance,
        };
        let n = cfg.num_particles();
        let budget = Budget::Particles(n as u64);
        let mixture = resolver.resolve(&cfg.mass_fractions()?, &species, budget)?;

        let mut sampler = TypeSampler::from_fractions(seed, &mixture.number_fractions);

        let side_length = cfg.num_particles_x as f64 * cfg.distance;
        let margin = self_avoidance_margin(&species);
        let placement: Box<dyn Placement> = match cfg.placement {
            PlacementConfig::Grid => Box::new(Grid::new(
                cfg.num_particles_x,
                cfg.num_particles_y,
                cfg.num_particles_z,
                cfg.distance,
            )),
            PlacementConfig::Random => Box::new(RandomSelfAvoiding::new(
                n,
                side_length,
                margin,
                cfg.container_wall_thickness,
            )?),
        };
        let slots = place_particles(placement.as_ref(), &mut sampler);

        let placed = species_counts(&slots, species.len());
        // sampling is statistical, exact counts are not enforced
        info!(expected = ?mixture.populations, ?placed, "species placed");

        let container = size_container(
            &slots,
            &species,
            side_length,
            cfg.container_wall_thickness,
            cfg.container_height_factor,
        )?;
        let piston = if cfg.use_piston {
            Some(size_piston(
                &container,
                &slots,
                cfg.container_piston_slack,
                cfg.mass_piston,
                margin,
            )?)
        } else {
            None
        };

        info!(seed, particles = slots.len(), "packing built");
        Ok(Self {
            seed,
            species,
            mixture,
            slots,
            container,
            piston,
            bake_frame: cfg.bake_frame,
        })
    }

    /// Per-particle data for the physics engine, in slot order
    pub fn particle_bodies(&self) -> Result<Vec<ParticleBody>> {
        self.slots
            .iter()
            .map(|slot| {
                let s = &self.species[slot.species_index];
                Ok(ParticleBody {
                    species_index: slot.species_index,
                    position: slot.position,
                    rotation: slot.rotation,
                    sides: s.sides,
                    radius: s.radius,
                    height: s.height,
                    mass: s.particle_mass()?,
                    friction: s.friction,
                    restitution: s.restitution,
                    linear_damping: s.linear_damping,
                })
            })
            .collect()
    }

    /// Placed particle count per species
    pub fn placed_counts(&self) -> Vec<u64> {
        species_counts(&self.slots, self.species.len())
    }
}
