//! Particle placement policies
//!
//! A [`Placement`] enumerates slot positions in a fixed order. The placer
//! walks the slots once and, per slot, consumes the shared stream as:
//! position draws (random policy only), one species draw, then three
//! rotation draws (x, y, z). Changing this order changes every packing
//! generated from a given seed.

use tracing::debug;

use crate::error::{PackError, Result};
use crate::packing::sampler::TypeSampler;
use crate::packing::states::{NVec3, ParticleSlot};

/// Source of slot positions
pub trait Placement {
    /// Number of slots
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of `slot`; random policies draw from the sampler's stream
    fn position(&self, slot: usize, sampler: &mut TypeSampler) -> NVec3;

    /// All positions in slot order
    fn place(&self, sampler: &mut TypeSampler) -> Vec<NVec3> {
        (0..self.len()).map(|slot| self.position(slot, sampler)).collect()
    }
}

/// Rectangular lattice centered on the x/y origin
///
/// Slots run x slowest, z fastest. The lowest layer sits at `z0`, by default
/// half a spacing above the floor.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub distance: f64, // lattice spacing
    pub z0: f64, // height of the lowest layer
}

impl Grid {
    pub fn new(nx: usize, ny: usize, nz: usize, distance: f64) -> Self {
        Self {
            nx,
            ny,
            nz,
            distance,
            z0: 0.5 * distance,
        }
    }

    pub fn with_z0(mut self, z0: f64) -> Self {
        self.z0 = z0;
        self
    }

    /// Lattice indices (i, j, k) of a slot
    pub fn indices(&self, slot: usize) -> (usize, usize, usize) {
        let i = slot / (self.ny * self.nz);
        let j = (slot / self.nz) % self.ny;
        let k = slot % self.nz;
        (i, j, k)
    }
}

impl Placement for Grid {
    fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    fn position(&self, slot: usize, _sampler: &mut TypeSampler) -> NVec3 {
        let (i, j, k) = self.indices(slot);
        let centered = |index: usize, count: usize| {
            (index as f64 - count as f64 / 2.0 + 0.5) * self.distance
        };
        NVec3::new(
            centered(i, self.nx),
            centered(j, self.ny),
            self.z0 + k as f64 * self.distance,
        )
    }
}

/// Random x/y inside a shrunken square, stacked at a fixed vertical pitch
///
/// The pitch is the self-avoidance margin. Neighbouring particles are not
/// collision-checked against each other, so overlap is reduced, not ruled out.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomSelfAvoiding {
    pub count: usize,
    pub half_width: f64, // x and y are drawn in [-half_width, half_width)
    pub pitch: f64, // vertical distance between consecutive slots
}

impl RandomSelfAvoiding {
    /// Square cross-section of `container_side` shrunk by the margin and the
    /// wall thickness on every side
    pub fn new(
        count: usize,
        container_side: f64,
        margin: f64,
        wall_thickness: f64,
    ) -> Result<Self> {
        let half_width = 0.5 * container_side - margin - wall_thickness;
        if !(half_width > 0.0) {
            return Err(PackError::InvalidGeometry(format!(
                "container side {container_side} leaves no room for particles \
                 with margin {margin} and wall thickness {wall_thickness}"
            )));
        }
        Ok(Self {
            count,
            half_width,
            pitch: margin,
        })
    }
}

impl Placement for RandomSelfAvoiding {
    fn len(&self) -> usize {
        self.count
    }

    fn position(&self, slot: usize, sampler: &mut TypeSampler) -> NVec3 {
        let x = self.half_width * (2.0 * sampler.next_unit() - 1.0);
        let y = self.half_width * (2.0 * sampler.next_unit() - 1.0);
        NVec3::new(x, y, self.pitch * (slot + 1) as f64)
    }
}

/// Walk every slot of `placement` and assign species and rotation
pub fn place_particles(placement: &dyn Placement, sampler: &mut TypeSampler) -> Vec<ParticleSlot> {
    let mut slots = Vec::with_capacity(placement.len());
    for slot in 0..placement.len() {
        let position = placement.position(slot, sampler);
        let species_index = sampler.next_species();
        let rotation = sampler.next_rotation();
        slots.push(ParticleSlot {
            position,
            rotation,
            species_index,
        });
    }
    debug!(count = slots.len(), "particles placed");
    slots
}

/// Number of placed particles per species
pub fn species_counts(slots: &[ParticleSlot], species_count: usize) -> Vec<u64> {
    let mut counts = vec![0u64; species_count];
    for slot in slots {
        if let Some(c) = counts.get_mut(slot.species_index) {
            *c += 1;
        }
    }
    counts
}
