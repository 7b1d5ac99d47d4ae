//! neucap-algorithms: Capture-candidate search and feature extraction.
//!
//! This crate provides the tagging pipeline:
//! - **ToF correction** - per-hit time-of-flight subtraction and stable sort
//! - **Peak search** - sliding-window anchor state machine
//! - **Feature extraction** - per-candidate counts, timing and angular moments
//! - **Candidate store** - event-level columnar feature accumulation
//!
#![warn(missing_docs)]

pub mod classifier;
pub mod event;
pub mod features;
pub mod peak;
pub mod store;
pub mod tof;

pub use classifier::Classifier;
pub use event::{process_events, EventInput, EventProcessor, EventResult, TagConfig, TrueCapture};
pub use features::{FeatureConfig, FeatureExtractor};
pub use peak::{Peak, PeakScan, PeakSearch, PeakSearchConfig};
pub use store::CandidateStore;
pub use tof::{correct_and_sort, subtract_tof, time_of_flight, SortedHitSeries};

// Re-export the core types the pipeline API surfaces.
pub use neucap_core::{Candidate, FeatureSet, HitBuffer, SensorGeometry, StaticGeometry, Vertex};
