//! Event-level accumulation of candidate features into named columns.

use std::collections::BTreeMap;

use neucap_core::{Candidate, Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Columnar accumulator for candidate feature vectors.
///
/// The first candidate ever appended fixes the feature schema; every
/// later candidate must carry exactly the same names in both
/// namespaces. [`CandidateStore::clear`] truncates the value columns at
/// an event boundary but keeps the schema, so the downstream output
/// layout is stable across events.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CandidateStore {
    int_columns: BTreeMap<String, Vec<i32>>,
    float_columns: BTreeMap<String, Vec<f32>>,
    schema_fixed: bool,
    rows: usize,
}

impl CandidateStore {
    /// Creates an empty store with no schema yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of appended candidates since the last clear.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Returns true if no candidate has been appended since the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Appends one candidate's features, in candidate-id order.
    ///
    /// # Errors
    /// [`Error::SchemaViolation`] if the candidate misses a known
    /// feature name or introduces an unseen one.
    pub fn append(&mut self, candidate: &Candidate) -> Result<()> {
        if !self.schema_fixed {
            for name in candidate.features.ints().keys() {
                self.int_columns.insert(name.clone(), Vec::new());
            }
            for name in candidate.features.floats().keys() {
                self.float_columns.insert(name.clone(), Vec::new());
            }
            self.schema_fixed = true;
            log::debug!(
                "feature schema fixed: {} int, {} float columns",
                self.int_columns.len(),
                self.float_columns.len()
            );
        } else {
            self.check_schema(candidate)?;
        }

        for (name, column) in &mut self.int_columns {
            // check_schema guarantees presence past this point.
            if let Some(value) = candidate.features.int(name) {
                column.push(value);
            } else {
                return Err(Error::SchemaViolation(format!(
                    "candidate {} is missing int feature {name:?}",
                    candidate.id
                )));
            }
        }
        for (name, column) in &mut self.float_columns {
            if let Some(value) = candidate.features.float(name) {
                column.push(value);
            } else {
                return Err(Error::SchemaViolation(format!(
                    "candidate {} is missing float feature {name:?}",
                    candidate.id
                )));
            }
        }
        self.rows += 1;
        Ok(())
    }

    fn check_schema(&self, candidate: &Candidate) -> Result<()> {
        for name in candidate.features.ints().keys() {
            if !self.int_columns.contains_key(name) {
                return Err(Error::SchemaViolation(format!(
                    "candidate {} introduces unseen int feature {name:?}",
                    candidate.id
                )));
            }
        }
        for name in candidate.features.floats().keys() {
            if !self.float_columns.contains_key(name) {
                return Err(Error::SchemaViolation(format!(
                    "candidate {} introduces unseen float feature {name:?}",
                    candidate.id
                )));
            }
        }
        if candidate.features.ints().len() != self.int_columns.len()
            || candidate.features.floats().len() != self.float_columns.len()
        {
            return Err(Error::SchemaViolation(format!(
                "candidate {} carries {}+{} features, schema expects {}+{}",
                candidate.id,
                candidate.features.ints().len(),
                candidate.features.floats().len(),
                self.int_columns.len(),
                self.float_columns.len()
            )));
        }
        Ok(())
    }

    /// Truncates all value columns; the schema stays fixed.
    pub fn clear(&mut self) {
        for column in self.int_columns.values_mut() {
            column.clear();
        }
        for column in self.float_columns.values_mut() {
            column.clear();
        }
        self.rows = 0;
    }

    /// An integer column by feature name.
    #[must_use]
    pub fn int_column(&self, name: &str) -> Option<&[i32]> {
        self.int_columns.get(name).map(Vec::as_slice)
    }

    /// A float column by feature name.
    #[must_use]
    pub fn float_column(&self, name: &str) -> Option<&[f32]> {
        self.float_columns.get(name).map(Vec::as_slice)
    }

    /// All integer columns keyed by feature name.
    #[must_use]
    pub fn int_columns(&self) -> &BTreeMap<String, Vec<i32>> {
        &self.int_columns
    }

    /// All float columns keyed by feature name.
    #[must_use]
    pub fn float_columns(&self) -> &BTreeMap<String, Vec<f32>> {
        &self.float_columns
    }
}
