//! The seam to the external statistical classifier.

use std::collections::BTreeMap;

use neucap_core::{Error, Result};

/// A classifier consuming named float features and returning one score.
///
/// Real models (boosted trees, neural networks) live outside this
/// crate; the core only defines the contract: every feature the model
/// expects must be present by name, and a missing name is surfaced to
/// the caller rather than silently defaulted.
pub trait Classifier: Send + Sync {
    /// Model name, for reporting.
    fn name(&self) -> &'static str;

    /// Scores one candidate from its merged float feature map.
    ///
    /// # Errors
    /// [`Error::MissingFeature`] when an expected name is absent.
    fn score(&self, features: &BTreeMap<String, f32>) -> Result<f32>;
}

/// Fetches a required feature by name.
///
/// # Errors
/// [`Error::MissingFeature`] when the name is absent.
pub fn require(features: &BTreeMap<String, f32>, name: &str) -> Result<f32> {
    features
        .get(name)
        .copied()
        .ok_or_else(|| Error::MissingFeature(name.to_string()))
}
