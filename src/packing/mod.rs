pub mod geometry;
pub mod species;
pub mod states;
pub mod mixture;
pub mod sampler;
pub mod placement;
pub mod container;
pub mod scenario;
pub mod engine;
