//! Mixture resolution: mass fractions to particle populations
//!
//! The chain is mass fraction -> volume fraction -> number fraction ->
//! integer population. For species `i` with normalized mass share `w_i`,
//! density `rho_i` and particle volume `V_i`:
//!
//! ```text
//! volume share  v_i  ~  w_i / rho_i
//! number share  n_i  ~  v_i / V_i  =  w_i / (rho_i * V_i)
//! ```
//!
//! which is the solution of the mass balance "species mass is proportional
//! to count times particle mass" with counts summing to the total. For two
//! species it collapses to the closed form in [`two_species_number_fraction`].
//!
//! Rounding never goes down for a budgeted species, so requested mass is not
//! under-delivered. The one exception is the particle-count budget, where the
//! total is fixed and the first species with positive mass absorbs the
//! remainder.

use tracing::{debug, info, warn};

use crate::error::{PackError, Result, RoundingReport};
use crate::packing::species::SpeciesSpec;

/// Default tolerance when the total particle count is fixed
pub const PARTICLE_TOLERANCE: f64 = 1e-2;
/// Default tolerance for volume and mass budgets
pub const CONTINUOUS_TOLERANCE: f64 = 1e-3;

/// Total amount of material the populations must realize
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Budget {
    Particles(u64), // fixed total number of particles
    Volume(f64), // total solid volume
    Mass(f64), // total mass
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMixture {
    pub number_fractions: Vec<f64>, // normalized populations, sums to 1
    pub exact_fractions: Vec<f64>, // number fractions before rounding
    pub populations: Vec<u64>,
    pub rounding: Option<RoundingReport>, // set when rounding exceeded the tolerance
}

impl ResolvedMixture {
    pub fn total(&self) -> u64 {
        self.populations.iter().sum()
    }

    /// Turn a rounding warning into an error
    pub fn strict(self) -> Result<Self> {
        match self.rounding {
            Some(report) => Err(report.into()),
            None => Ok(self),
        }
    }
}

/// Resolves a mixture with a configurable rounding tolerance
///
/// `tolerance: None` picks [`PARTICLE_TOLERANCE`] or
/// [`CONTINUOUS_TOLERANCE`] depending on the budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixtureResolver {
    pub tolerance: Option<f64>,
}

impl MixtureResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance: Some(tolerance),
        }
    }

    fn tolerance_for(&self, budget: Budget) -> f64 {
        self.tolerance.unwrap_or(match budget {
            Budget::Particles(_) => PARTICLE_TOLERANCE,
            Budget::Volume(_) | Budget::Mass(_) => CONTINUOUS_TOLERANCE,
        })
    }

    pub fn resolve(
        &self,
        mass_fractions: &[f64],
        species: &[SpeciesSpec],
        budget: Budget,
    ) -> Result<ResolvedMixture> {
        validate_budget(budget)?;
        let balance = MassBalance::new(mass_fractions, species)?;
        debug!(
            mass_shares = ?balance.mass_shares,
            volume_shares = ?balance.volume_shares,
            number_fractions = ?balance.number_fractions,
            "mass balance solved"
        );

        let tolerance = self.tolerance_for(budget);
        let (populations, worst) = match budget {
            Budget::Particles(total) => {
                let populations = round_to_total(&balance.number_fractions, total)?;
                let worst = worst_mass_share_error(&balance, &populations);
                (populations, worst)
            }
            Budget::Volume(total_volume) => {
                let requested: Vec<f64> =
                    balance.volume_shares.iter().map(|v| v * total_volume).collect();
                round_up_components(&requested, &balance.volumes)
            }
            Budget::Mass(total_mass) => {
                let requested: Vec<f64> =
                    balance.mass_shares.iter().map(|w| w * total_mass).collect();
                round_up_components(&requested, &balance.masses)
            }
        };

        let rounding = worst
            .filter(|w| w.relative_error > tolerance)
            .map(|w| RoundingReport { tolerance, ..w });
        if let Some(report) = &rounding {
            warn!(
                species = report.species,
                relative_error = report.relative_error,
                tolerance,
                "resolved populations deviate from the requested mixture"
            );
        }

        let total: u64 = populations.iter().sum();
        let number_fractions = populations
            .iter()
            .map(|&p| p as f64 / total as f64)
            .collect();
        info!(?populations, total, "mixture resolved");

        Ok(ResolvedMixture {
            number_fractions,
            exact_fractions: balance.number_fractions,
            populations,
            rounding,
        })
    }
}

/// Resolve with the default tolerances
pub fn resolve(
    mass_fractions: &[f64],
    species: &[SpeciesSpec],
    budget: Budget,
) -> Result<ResolvedMixture> {
    MixtureResolver::new().resolve(mass_fractions, species, budget)
}

/// Exact number fractions for the given mass fractions, before rounding
pub fn number_ratio(mass_fractions: &[f64], species: &[SpeciesSpec]) -> Result<Vec<f64>> {
    Ok(MassBalance::new(mass_fractions, species)?.number_fractions)
}

/// Number fraction of `target` in a two-species mixture
///
/// With `x` the mass fraction of `target` and `m` the particle masses:
/// `alpha = (m_other / m_target) * x / (1 - x)`, `n_target = alpha / (1 + alpha)`.
pub fn two_species_number_fraction(
    mass_fraction: f64,
    target: &SpeciesSpec,
    other: &SpeciesSpec,
) -> Result<f64> {
    if !(0.0..=1.0).contains(&mass_fraction) {
        return Err(PackError::InvalidMixtureInput(format!(
            "mass fraction must lie in [0, 1], got {mass_fraction}"
        )));
    }
    let m_target = target.particle_mass()?;
    let m_other = other.particle_mass()?;
    if mass_fraction == 1.0 {
        return Ok(1.0);
    }

    let beta = m_target / m_other;
    let alpha = (1.0 / beta) * (mass_fraction / (1.0 - mass_fraction));
    Ok(alpha / (1.0 + alpha))
}

/// Per-species quantities of the mass balance
struct MassBalance {
    masses: Vec<f64>, // mass of one particle
    volumes: Vec<f64>, // volume of one particle
    mass_shares: Vec<f64>, // normalized mass fractions
    volume_shares: Vec<f64>,
    number_fractions: Vec<f64>,
}

impl MassBalance {
    fn new(mass_fractions: &[f64], species: &[SpeciesSpec]) -> Result<Self> {
        if species.is_empty() {
            return Err(PackError::InvalidMixtureInput(
                "at least one species is required".into(),
            ));
        }
        if mass_fractions.len() != species.len() {
            return Err(PackError::InvalidMixtureInput(format!(
                "{} mass fractions for {} species",
                mass_fractions.len(),
                species.len()
            )));
        }
        if let Some(bad) = mass_fractions.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(PackError::InvalidMixtureInput(format!(
                "mass fractions must be non-negative, got {bad}"
            )));
        }
        let sum: f64 = mass_fractions.iter().sum();
        if sum <= 0.0 {
            return Err(PackError::InvalidMixtureInput(
                "mass fractions must have a positive sum".into(),
            ));
        }

        let mut volumes = Vec::with_capacity(species.len());
        let mut masses = Vec::with_capacity(species.len());
        for s in species {
            let s = s.clone().validated()?;
            let v = s.volume()?;
            volumes.push(v);
            masses.push(s.density * v);
        }

        let mass_shares: Vec<f64> = mass_fractions.iter().map(|w| w / sum).collect();

        // zero-mass species drop out of every weighting
        let volume_shares = normalized(
            mass_shares
                .iter()
                .zip(species)
                .map(|(w, s)| if *w > 0.0 { w / s.density } else { 0.0 }),
        );
        let number_fractions = normalized(
            volume_shares
                .iter()
                .zip(&volumes)
                .map(|(v, vol)| v / vol),
        );

        Ok(Self {
            masses,
            volumes,
            mass_shares,
            volume_shares,
            number_fractions,
        })
    }
}

fn validate_budget(budget: Budget) -> Result<()> {
    let ok = match budget {
        Budget::Particles(n) => n > 0,
        Budget::Volume(v) => v.is_finite() && v > 0.0,
        Budget::Mass(m) => m.is_finite() && m > 0.0,
    };
    if ok {
        Ok(())
    } else {
        Err(PackError::InvalidMixtureInput(format!(
            "total budget must be positive, got {budget:?}"
        )))
    }
}

fn normalized(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let values: Vec<f64> = values.collect();
    let sum: f64 = values.iter().sum();
    values.into_iter().map(|v| v / sum).collect()
}

/// Ceiling that ignores floating noise just above an integer
///
/// Snaps to the nearest integer only within a few ulps of it, so a genuine
/// fractional part is never rounded down.
fn ceil_tolerant(x: f64) -> f64 {
    let nearest = x.round();
    if (x - nearest).abs() <= 4.0 * f64::EPSILON * x.abs() {
        nearest
    } else {
        x.ceil()
    }
}

/// Split a fixed particle total according to `fractions`
///
/// Every positive species but the first is rounded up; the first positive
/// species takes what is left. If that leaves it empty, single particles are
/// moved over from the largest other population.
fn round_to_total(fractions: &[f64], total: u64) -> Result<Vec<u64>> {
    let positive: Vec<usize> = (0..fractions.len()).filter(|&i| fractions[i] > 0.0).collect();
    if (total as usize) < positive.len() {
        return Err(PackError::InvalidMixtureInput(format!(
            "{total} particles cannot represent {} species with positive mass",
            positive.len()
        )));
    }

    let mut populations = vec![0u64; fractions.len()];
    let (&remainder, others) = match positive.split_first() {
        Some(split) => split,
        None => return Ok(populations),
    };
    for &i in others {
        populations[i] = (ceil_tolerant(fractions[i] * total as f64) as u64).max(1);
    }

    let mut assigned: u64 = others.iter().map(|&i| populations[i]).sum();
    while assigned >= total {
        let donor = others
            .iter()
            .copied()
            .filter(|&i| populations[i] > 1)
            .max_by_key(|&i| populations[i]);
        match donor {
            Some(i) => {
                populations[i] -= 1;
                assigned -= 1;
            }
            None => break,
        }
    }
    populations[remainder] = total - assigned;
    Ok(populations)
}

/// Largest relative error of the delivered mass shares
fn worst_mass_share_error(balance: &MassBalance, populations: &[u64]) -> Option<RoundingReport> {
    let delivered: Vec<f64> = populations
        .iter()
        .zip(&balance.masses)
        .map(|(&p, m)| p as f64 * m)
        .collect();
    let total_mass: f64 = delivered.iter().sum();

    worst_error(
        &balance.mass_shares,
        delivered.iter().map(|d| d / total_mass),
    )
}

/// Round each requested component up to whole particles of size `unit`
fn round_up_components(requested: &[f64], unit: &[f64]) -> (Vec<u64>, Option<RoundingReport>) {
    let populations: Vec<u64> = requested
        .iter()
        .zip(unit)
        .map(|(r, u)| {
            if *r > 0.0 {
                (ceil_tolerant(r / u) as u64).max(1)
            } else {
                0
            }
        })
        .collect();
    let delivered = populations.iter().zip(unit).map(|(&p, u)| p as f64 * u);
    let worst = worst_error(requested, delivered);
    (populations, worst)
}

fn worst_error(
    requested: &[f64],
    delivered: impl Iterator<Item = f64>,
) -> Option<RoundingReport> {
    requested
        .iter()
        .zip(delivered)
        .enumerate()
        .filter(|(_, (r, _))| **r > 0.0)
        .map(|(species, (&requested, delivered))| RoundingReport {
            species,
            requested,
            delivered,
            relative_error: (delivered - requested).abs() / requested,
            tolerance: 0.0,
        })
        .max_by(|a, b| a.relative_error.total_cmp(&b.relative_error))
}
