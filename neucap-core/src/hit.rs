//! Hit types and the per-event hit buffer.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single photodetector hit record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hit {
    /// Hit time in nanoseconds, relative to the trigger.
    pub time: f32,
    /// Deposited charge in photoelectrons.
    pub charge: f32,
    /// Sensor (PMT) id, an index into the detector geometry table.
    pub sensor_id: u32,
}

impl Hit {
    /// Creates a new hit record.
    #[inline]
    #[must_use]
    pub fn new(time: f32, charge: f32, sensor_id: u32) -> Self {
        Self {
            time,
            charge,
            sensor_id,
        }
    }
}

/// Raw hits of one trigger window in Structure of Arrays (`SoA`) layout.
///
/// The vectors are parallel and index-aligned; `signal_flags` is only
/// populated when Monte-Carlo truth is available and is either empty or
/// the same length as the other columns.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HitBuffer {
    /// Columnar storage for hit times [ns].
    pub times: Vec<f32>,
    /// Columnar storage for deposited charge [p.e.].
    pub charges: Vec<f32>,
    /// Columnar storage for sensor ids.
    pub sensor_ids: Vec<u32>,
    /// Columnar storage for signal flags (true: signal, false: background).
    #[cfg_attr(feature = "serde", serde(default))]
    pub signal_flags: Vec<bool>,
}

impl HitBuffer {
    /// Creates a new empty buffer with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            times: Vec::with_capacity(capacity),
            charges: Vec::with_capacity(capacity),
            sensor_ids: Vec::with_capacity(capacity),
            signal_flags: Vec::new(),
        }
    }

    /// Builds a buffer from parallel arrays, checking the length invariant.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] if the arrays are not parallel.
    pub fn from_arrays(
        times: Vec<f32>,
        charges: Vec<f32>,
        sensor_ids: Vec<u32>,
        signal_flags: Option<Vec<bool>>,
    ) -> Result<Self> {
        let buffer = Self {
            times,
            charges,
            sensor_ids,
            signal_flags: signal_flags.unwrap_or_default(),
        };
        buffer.validate()?;
        Ok(buffer)
    }

    /// Returns the number of hits in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true if the buffer holds no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns true if signal flags are populated for this event.
    #[must_use]
    pub fn has_signal_flags(&self) -> bool {
        !self.signal_flags.is_empty()
    }

    /// Appends a single hit without a signal flag.
    pub fn push(&mut self, hit: Hit) {
        self.times.push(hit.time);
        self.charges.push(hit.charge);
        self.sensor_ids.push(hit.sensor_id);
    }

    /// Appends a single hit with a signal flag.
    pub fn push_flagged(&mut self, hit: Hit, is_signal: bool) {
        self.push(hit);
        self.signal_flags.push(is_signal);
    }

    /// Clears all columns.
    pub fn clear(&mut self) {
        self.times.clear();
        self.charges.clear();
        self.sensor_ids.clear();
        self.signal_flags.clear();
    }

    /// Checks the parallel-array length invariant.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] naming the offending column.
    pub fn validate(&self) -> Result<()> {
        let n = self.times.len();
        if self.charges.len() != n {
            return Err(Error::LengthMismatch {
                column: "charges",
                expected: n,
                actual: self.charges.len(),
            });
        }
        if self.sensor_ids.len() != n {
            return Err(Error::LengthMismatch {
                column: "sensor_ids",
                expected: n,
                actual: self.sensor_ids.len(),
            });
        }
        if !self.signal_flags.is_empty() && self.signal_flags.len() != n {
            return Err(Error::LengthMismatch {
                column: "signal_flags",
                expected: n,
                actual: self.signal_flags.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_buffer_push_and_clear() {
        let mut buffer = HitBuffer::with_capacity(4);
        assert!(buffer.is_empty());

        buffer.push(Hit::new(12.5, 1.1, 100));
        buffer.push(Hit::new(13.0, 0.9, 101));
        assert_eq!(buffer.len(), 2);
        assert!(!buffer.has_signal_flags());
        buffer.validate().unwrap();

        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_hit_buffer_flagged_hits() {
        let mut buffer = HitBuffer::default();
        buffer.push_flagged(Hit::new(5.0, 2.0, 7), true);
        buffer.push_flagged(Hit::new(6.0, 1.0, 8), false);
        assert!(buffer.has_signal_flags());
        buffer.validate().unwrap();
    }

    #[test]
    fn test_hit_buffer_length_mismatch() {
        let result = HitBuffer::from_arrays(vec![1.0, 2.0], vec![0.5], vec![0, 1], None);
        assert!(matches!(result, Err(Error::LengthMismatch { .. })));

        let result = HitBuffer::from_arrays(
            vec![1.0, 2.0],
            vec![0.5, 0.6],
            vec![0, 1],
            Some(vec![true]),
        );
        assert!(matches!(result, Err(Error::LengthMismatch { .. })));
    }
}
