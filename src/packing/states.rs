//! Core state types for a generated packing
//!
//! - `ParticleSlot` one placed particle (position, rotation, species)
//! - `ContainerGeometry` / `PistonGeometry` derived once all slots exist

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSlot {
    pub position: NVec3, // center of the particle
    pub rotation: NVec3, // Euler angles about x, y, z in radians
    pub species_index: usize, // index into the species list
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerGeometry {
    pub side_length: f64, // square footprint
    pub height: f64, // wall height above the floor
    pub wall_thickness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PistonGeometry {
    pub side_length: f64, // square plate, smaller than the container by the slack
    pub thickness: f64,
    pub z_offset: f64, // height of the plate's center
    pub mass: f64,
    pub friction: f64, // always 0
    pub restitution: f64, // always 0
}
