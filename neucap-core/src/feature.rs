//! Per-candidate feature bookkeeping.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named scalar features of one capture candidate.
///
/// Counts live in the integer namespace, everything else in the float
/// namespace. The two namespaces are disjoint by convention; should a
/// name ever appear in both, the float value wins for output purposes
/// (see [`FeatureSet::merged_floats`]).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureSet {
    ints: BTreeMap<String, i32>,
    floats: BTreeMap<String, f32>,
}

impl FeatureSet {
    /// Creates an empty feature set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an integer-valued feature.
    pub fn set_int(&mut self, name: impl Into<String>, value: i32) {
        self.ints.insert(name.into(), value);
    }

    /// Sets a float-valued feature.
    pub fn set_float(&mut self, name: impl Into<String>, value: f32) {
        self.floats.insert(name.into(), value);
    }

    /// Looks up an integer feature by name.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i32> {
        self.ints.get(name).copied()
    }

    /// Looks up a float feature by name.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    /// The integer namespace.
    #[must_use]
    pub fn ints(&self) -> &BTreeMap<String, i32> {
        &self.ints
    }

    /// The float namespace.
    #[must_use]
    pub fn floats(&self) -> &BTreeMap<String, f32> {
        &self.floats
    }

    /// Returns true if no feature has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ints.is_empty() && self.floats.is_empty()
    }

    /// Flattens both namespaces into one float map, e.g. for handing to
    /// a classifier. Integer values are widened to floats first, so a
    /// float entry overrides an integer entry of the same name.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn merged_floats(&self) -> BTreeMap<String, f32> {
        let mut merged: BTreeMap<String, f32> = self
            .ints
            .iter()
            .map(|(name, &value)| (name.clone(), value as f32))
            .collect();
        for (name, &value) in &self.floats {
            merged.insert(name.clone(), value);
        }
        merged
    }
}

/// One neutron-capture candidate: a peak's hit slices plus its features.
///
/// A candidate is created when the peak search emits a peak, filled once
/// by feature extraction, and read-only afterwards. It never outlives
/// its event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Candidate {
    /// Candidate id, monotonically increasing within an event.
    pub id: usize,
    /// Raw (uncorrected) hit times of the window, in sorted-time order [ns].
    pub raw_times: Vec<f32>,
    /// ToF-corrected hit times of the window, ascending [ns].
    pub res_times: Vec<f32>,
    /// Deposited charges of the window hits [p.e.].
    pub charges: Vec<f32>,
    /// Sensor ids of the window hits.
    pub sensor_ids: Vec<u32>,
    /// Signal flags of the window hits, when truth is available.
    pub signal_flags: Option<Vec<bool>>,
    /// Extracted scalar features.
    pub features: FeatureSet,
}

impl Candidate {
    /// Number of hits in the candidate window.
    #[must_use]
    pub fn multiplicity(&self) -> usize {
        self.res_times.len()
    }

    /// ToF-corrected time of the candidate's anchor (earliest) hit [ns].
    #[must_use]
    pub fn anchor_time(&self) -> Option<f32> {
        self.res_times.first().copied()
    }
}
