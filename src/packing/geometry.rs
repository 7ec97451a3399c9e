//! Closed-form geometry of regular prisms
//!
//! A particle is a right prism whose cross-section is a regular polygon with
//! `sides` vertices on a circle of circumscribed radius `radius`, extruded to
//! `height`. The polygon area is `n/2 * r^2 * sin(2*pi/n)`

use std::f64::consts::TAU;

use crate::error::{PackError, Result};

/// Volume of a single regular prism
pub fn volume_prism(sides: u32, radius: f64, height: f64) -> Result<f64> {
    if sides < 3 {
        return Err(PackError::InvalidGeometry(format!(
            "a prism needs at least 3 sides, got {sides}"
        )));
    }
    if !(radius.is_finite() && radius > 0.0) {
        return Err(PackError::InvalidGeometry(format!(
            "radius must be positive, got {radius}"
        )));
    }
    if !(height.is_finite() && height > 0.0) {
        return Err(PackError::InvalidGeometry(format!(
            "height must be positive, got {height}"
        )));
    }

    let n = sides as f64;
    Ok(0.5 * n * radius * radius * (TAU / n).sin() * height)
}

/// Element-wise prism volumes
///
/// Any input of length one is broadcast against the others; every other
/// input must share the same length. The result has the length of the
/// longest input.
pub fn volume_prisms(sides: &[u32], radii: &[f64], heights: &[f64]) -> Result<Vec<f64>> {
    let lens = [sides.len(), radii.len(), heights.len()];
    if lens.contains(&0) {
        return Err(PackError::InvalidGeometry(
            "sides, radii and heights must not be empty".into(),
        ));
    }

    let n = lens.iter().copied().max().unwrap_or(1);
    if lens.iter().any(|&len| len != 1 && len != n) {
        return Err(PackError::InvalidGeometry(format!(
            "cannot broadcast sides ({}), radii ({}) and heights ({}) together",
            lens[0], lens[1], lens[2]
        )));
    }

    // length-one slices repeat their only element
    let pick = |len: usize, i: usize| if len == 1 { 0 } else { i };

    (0..n)
        .map(|i| {
            volume_prism(
                sides[pick(lens[0], i)],
                radii[pick(lens[1], i)],
                heights[pick(lens[2], i)],
            )
        })
        .collect()
}
