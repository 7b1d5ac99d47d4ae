//! neucap-core: Core types for neutron-capture candidate tagging.
//!
//! This crate provides the foundational abstractions for photodetector
//! hits, detector geometry, per-candidate feature bookkeeping, and the
//! timing/angular statistics the tagging features are built from.

pub mod error;
pub mod feature;
pub mod geometry;
pub mod hit;
pub mod math;

pub use error::{Error, Result};
pub use feature::{Candidate, FeatureSet};
pub use geometry::{SensorGeometry, StaticGeometry, Vertex, C_WATER};
pub use hit::{Hit, HitBuffer};
