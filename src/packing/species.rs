//! Per-species particle description
//!
//! `SpeciesSpec` is the immutable record for one kind of particle: prism
//! geometry, density and the contact properties handed to the physics
//! engine. Scaling produces a new value; nothing here is mutated in place.

use serde::{Deserialize, Serialize};

use crate::error::{PackError, Result};
use crate::packing::geometry::volume_prism;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSpec {
    pub sides: u32, // polygon vertex count, >= 3
    pub radius: f64, // circumscribed radius of the cross-section
    pub height: f64, // prism thickness
    pub density: f64, // mass per unit volume
    pub friction: f64, // [0, 1]
    pub restitution: f64, // [0, 1]
    pub linear_damping: f64, // [0, 1]
}

impl SpeciesSpec {
    /// Check geometry and material ranges, returning `self` unchanged
    pub fn validated(self) -> Result<Self> {
        // surfaces InvalidGeometry for sides/radius/height
        volume_prism(self.sides, self.radius, self.height)?;

        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(PackError::InvalidMixtureInput(format!(
                "density must be positive, got {}",
                self.density
            )));
        }
        for (name, value) in [
            ("friction", self.friction),
            ("restitution", self.restitution),
            ("linear_damping", self.linear_damping),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PackError::Config(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        Ok(self)
    }

    /// Same species with radius and height multiplied by `scale`
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            radius: self.radius * scale,
            height: self.height * scale,
            ..self.clone()
        }
    }

    pub fn volume(&self) -> Result<f64> {
        volume_prism(self.sides, self.radius, self.height)
    }

    /// Mass of a single particle, density * volume
    pub fn particle_mass(&self) -> Result<f64> {
        Ok(self.density * self.volume()?)
    }

    /// Half of the body diagonal of the prism's bounding cylinder
    ///
    /// Whatever the orientation, no point of the particle lies farther than
    /// this from its center.
    pub fn half_extent(&self) -> f64 {
        (self.radius * self.radius + 0.25 * self.height * self.height).sqrt()
    }
}

/// Largest half extent over a set of species, the self-avoidance margin
pub fn self_avoidance_margin(species: &[SpeciesSpec]) -> f64 {
    species
        .iter()
        .map(SpeciesSpec::half_extent)
        .fold(0.0, f64::max)
}
