pub mod configuration;
pub mod error;
pub mod packing;
pub mod report;

pub use error::{PackError, Result, RoundingReport};

pub use packing::geometry::{volume_prism, volume_prisms};
pub use packing::species::{self_avoidance_margin, SpeciesSpec};
pub use packing::states::{ContainerGeometry, NVec3, ParticleSlot, PistonGeometry};
pub use packing::mixture::{number_ratio, resolve, two_species_number_fraction};
pub use packing::mixture::{Budget, MixtureResolver, ResolvedMixture};
pub use packing::sampler::{CumulativeThresholds, TypeSampler};
pub use packing::placement::{place_particles, species_counts, Grid, Placement, RandomSelfAvoiding};
pub use packing::container::{size_container, size_piston};
pub use packing::scenario::Packing;
pub use packing::engine::{drive, Dynamics, ParticleBody, PhysicsEngine, Scene, SceneWriter};

pub use configuration::config::{ParametersConfig, PlacementConfig};

pub use report::summary::{calculate_results, default_cases, tabulate, PackingCase, SummaryRow};
