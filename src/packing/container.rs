//! Container and piston sizing from the placed particles

use tracing::info;

use crate::error::{PackError, Result};
use crate::packing::species::SpeciesSpec;
use crate::packing::states::{ContainerGeometry, ParticleSlot, PistonGeometry};

/// Default ratio between container height and the particle stack
pub const DEFAULT_HEIGHT_FACTOR: f64 = 1.2;

/// Highest particle center, 0 for an empty packing
pub fn max_slot_z(slots: &[ParticleSlot]) -> f64 {
    slots.iter().map(|s| s.position.z).fold(0.0, f64::max)
}

/// Open-top box holding every slot
///
/// `side_length` is the horizontal slot count along one axis times the
/// spacing. Height is `height_factor * (max z + half the tallest extent)`.
pub fn size_container(
    slots: &[ParticleSlot],
    species: &[SpeciesSpec],
    side_length: f64,
    wall_thickness: f64,
    height_factor: f64,
) -> Result<ContainerGeometry> {
    if !(side_length > 0.0) {
        return Err(PackError::InvalidGeometry(format!(
            "container side must be positive, got {side_length}"
        )));
    }
    if !(height_factor > 1.0) {
        return Err(PackError::InvalidGeometry(format!(
            "container height factor must exceed 1, got {height_factor}"
        )));
    }

    let tallest = species.iter().map(SpeciesSpec::half_extent).fold(0.0, f64::max);
    let height = height_factor * (max_slot_z(slots) + tallest);

    info!(side_length, height, wall_thickness, "container sized");
    Ok(ContainerGeometry {
        side_length,
        height,
        wall_thickness,
    })
}

/// Piston plate resting above the particles
///
/// The plate is `1 - slack` as wide as the container and as thick as its
/// wall. Its center starts `clearance` plus half its thickness above the
/// highest particle.
pub fn size_piston(
    container: &ContainerGeometry,
    slots: &[ParticleSlot],
    slack: f64,
    mass: f64,
    clearance: f64,
) -> Result<PistonGeometry> {
    if !(0.0..1.0).contains(&slack) {
        return Err(PackError::InvalidGeometry(format!(
            "piston slack must lie in [0, 1), got {slack}"
        )));
    }
    if !(mass > 0.0) {
        return Err(PackError::InvalidGeometry(format!(
            "piston mass must be positive, got {mass}"
        )));
    }

    let thickness = container.wall_thickness;
    let piston = PistonGeometry {
        side_length: container.side_length * (1.0 - slack),
        thickness,
        z_offset: max_slot_z(slots) + clearance + 0.5 * thickness,
        mass,
        friction: 0.0,
        restitution: 0.0,
    };
    info!(side_length = piston.side_length, z_offset = piston.z_offset, "piston sized");
    Ok(piston)
}
