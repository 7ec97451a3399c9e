//! Tabulate number ratios for a handful of two-species packings
//!
//! Quick sanity check of the mass balance: for each case print the mass
//! fraction and densities that went in, the particle volumes, and the number
//! fraction of species A that comes out.

use crate::error::Result;
use crate::packing::geometry::volume_prisms;
use crate::packing::mixture::number_ratio;
use crate::packing::species::SpeciesSpec;

/// Sides used for every case in the summary
pub const SUMMARY_SIDES: u32 = 6;

/// Two-species packing, values given as (A, B)
#[derive(Debug, Clone, PartialEq)]
pub struct PackingCase {
    pub mass_fraction_a: f64,
    pub densities: (f64, f64),
    pub radii: (f64, f64),
    pub heights: (f64, f64),
}

impl PackingCase {
    fn species(&self) -> [SpeciesSpec; 2] {
        let make = |density, radius, height| SpeciesSpec {
            sides: SUMMARY_SIDES,
            radius,
            height,
            density,
            friction: 0.5,
            restitution: 0.5,
            linear_damping: 0.04,
        };
        [
            make(self.densities.0, self.radii.0, self.heights.0),
            make(self.densities.1, self.radii.1, self.heights.1),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub mass_fraction_a: f64,
    pub density_a: f64,
    pub density_b: f64,
    pub volume_a: f64,
    pub volume_b: f64,
    pub number_ratio_a: f64,
}

/// The reference cases: equal, halved A and halved B density
pub fn default_cases() -> Vec<PackingCase> {
    let case = |density_a, density_b| PackingCase {
        mass_fraction_a: 0.5,
        densities: (density_a, density_b),
        radii: (1.0, 1.0),
        heights: (1.0, 1.0),
    };
    vec![case(1.0, 1.0), case(0.5, 1.0), case(1.0, 0.5)]
}

pub fn calculate_results(cases: &[PackingCase]) -> Result<Vec<SummaryRow>> {
    cases
        .iter()
        .map(|case| {
            let volumes = volume_prisms(
                &[SUMMARY_SIDES],
                &[case.radii.0, case.radii.1],
                &[case.heights.0, case.heights.1],
            )?;
            let fractions = number_ratio(
                &[case.mass_fraction_a, 1.0 - case.mass_fraction_a],
                &case.species(),
            )?;
            Ok(SummaryRow {
                mass_fraction_a: case.mass_fraction_a,
                density_a: case.densities.0,
                density_b: case.densities.1,
                volume_a: volumes[0],
                volume_b: volumes[1],
                number_ratio_a: fractions[0],
            })
        })
        .collect()
}

/// Render rows as a fixed-width text table
pub fn tabulate(rows: &[SummaryRow]) -> String {
    let mut out = format!(
        "{:>15} {:>10} {:>10} {:>10} {:>10} {:>15}\n",
        "mass fraction A", "density A", "density B", "volume A", "volume B", "number ratio A"
    );
    for r in rows {
        out.push_str(&format!(
            "{:>15.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>15.6}\n",
            r.mass_fraction_a, r.density_a, r.density_b, r.volume_a, r.volume_b, r.number_ratio_a
        ));
    }
    out
}
