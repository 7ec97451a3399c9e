//! Error taxonomy for packing generation
//!
//! Geometry and mixture inputs are validated eagerly; anything rejected here
//! is rejected before a single particle is placed. Rounding excess is not a
//! hard failure: the resolver attaches a [`RoundingReport`] to its result and
//! callers decide whether to escalate it with [`PackError::from`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PackError>;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid mixture input: {0}")]
    InvalidMixtureInput(String),

    #[error(
        "rounding tolerance exceeded for species {}: requested {:.6}, delivered {:.6} \
         (relative error {:.4} > {:.4})",
        .0.species, .0.requested, .0.delivered, .0.relative_error, .0.tolerance
    )]
    RoundingToleranceExceeded(RoundingReport),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Worst per-species deviation between what was requested and what the
/// rounded populations deliver
#[derive(Debug, Clone, PartialEq)]
pub struct RoundingReport {
    pub species: usize,
    pub requested: f64,
    pub delivered: f64,
    pub relative_error: f64,
    pub tolerance: f64,
}

impl From<RoundingReport> for PackError {
    fn from(report: RoundingReport) -> Self {
        PackError::RoundingToleranceExceeded(report)
    }
}
