//! Time-of-flight subtraction and the sorted hit series.

use neucap_core::{HitBuffer, Result, SensorGeometry, Vertex, C_WATER};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ToF-corrected hits sorted ascending by corrected time.
///
/// Carries both permutations between sorted and original order:
/// `source_index[s]` is the hit-buffer position of sorted entry `s`,
/// and `reverse_index[o]` is the sorted position of hit-buffer entry
/// `o`. Feature extraction uses `source_index` to recover raw
/// (uncorrected) times while slicing in sorted time order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SortedHitSeries {
    /// ToF-corrected hit times, ascending [ns].
    pub times: Vec<f32>,
    /// Charges in sorted-time order [p.e.].
    pub charges: Vec<f32>,
    /// Sensor ids in sorted-time order.
    pub sensor_ids: Vec<u32>,
    /// Signal flags in sorted-time order, when the event carries them.
    pub signal_flags: Option<Vec<bool>>,
    /// Sorted position -> original hit-buffer position.
    pub source_index: Vec<usize>,
    /// Original hit-buffer position -> sorted position.
    pub reverse_index: Vec<usize>,
}

impl SortedHitSeries {
    /// Number of hits in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true if the series holds no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Time-of-flight from a vertex to one sensor [ns].
///
/// # Errors
/// Propagates the geometry lookup failure for unknown sensor ids.
pub fn time_of_flight<G: SensorGeometry + ?Sized>(
    geometry: &G,
    vertex: Vertex,
    sensor_id: u32,
) -> Result<f32> {
    let position = geometry.position_checked(sensor_id)?;
    Ok(vertex.distance_to(position) / C_WATER)
}

/// Subtracts per-hit ToF from the raw hit times, preserving the
/// original hit order. The hit buffer itself is never mutated.
///
/// # Errors
/// Fails on mismatched parallel arrays or unknown sensor ids.
pub fn subtract_tof<G: SensorGeometry + ?Sized>(
    hits: &HitBuffer,
    vertex: Vertex,
    geometry: &G,
) -> Result<Vec<f32>> {
    hits.validate()?;
    let mut corrected = Vec::with_capacity(hits.len());
    for (&time, &sensor_id) in hits.times.iter().zip(&hits.sensor_ids) {
        corrected.push(time - time_of_flight(geometry, vertex, sensor_id)?);
    }
    Ok(corrected)
}

/// Subtracts ToF and stable-sorts the result ascending by corrected
/// time, carrying charges, sensor ids and optional signal flags along.
/// Hits with equal corrected time keep their original relative order.
///
/// # Errors
/// Fails on mismatched parallel arrays or unknown sensor ids.
pub fn correct_and_sort<G: SensorGeometry + ?Sized>(
    hits: &HitBuffer,
    vertex: Vertex,
    geometry: &G,
) -> Result<SortedHitSeries> {
    let corrected = subtract_tof(hits, vertex, geometry)?;
    let n = corrected.len();

    let mut source_index: Vec<usize> = (0..n).collect();
    // sort_by is stable, so equal corrected times stay in buffer order.
    source_index.sort_by(|&a, &b| corrected[a].total_cmp(&corrected[b]));

    let mut reverse_index = vec![0usize; n];
    for (sorted_pos, &original_pos) in source_index.iter().enumerate() {
        reverse_index[original_pos] = sorted_pos;
    }

    let times = source_index.iter().map(|&i| corrected[i]).collect();
    let charges = source_index.iter().map(|&i| hits.charges[i]).collect();
    let sensor_ids = source_index.iter().map(|&i| hits.sensor_ids[i]).collect();
    let signal_flags = if hits.has_signal_flags() {
        Some(source_index.iter().map(|&i| hits.signal_flags[i]).collect())
    } else {
        None
    };

    Ok(SortedHitSeries {
        times,
        charges,
        sensor_ids,
        signal_flags,
        source_index,
        reverse_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use neucap_core::{Hit, StaticGeometry};

    fn one_sensor_geometry() -> StaticGeometry {
        // A single sensor C_WATER cm from the origin: ToF from the
        // origin is exactly 1 ns.
        StaticGeometry::new(vec![[C_WATER, 0.0, 0.0]]).unwrap()
    }

    #[test]
    fn test_time_of_flight() {
        let geometry = one_sensor_geometry();
        let tof = time_of_flight(&geometry, Vertex::default(), 0).unwrap();
        assert_relative_eq!(tof, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_subtract_tof_preserves_order() {
        let geometry = one_sensor_geometry();
        let mut hits = HitBuffer::default();
        hits.push(Hit::new(10.0, 1.0, 0));
        hits.push(Hit::new(5.0, 1.0, 0));

        let corrected = subtract_tof(&hits, Vertex::default(), &geometry).unwrap();
        assert_relative_eq!(corrected[0], 9.0, epsilon = 1e-5);
        assert_relative_eq!(corrected[1], 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_unknown_sensor_id_fails() {
        let geometry = one_sensor_geometry();
        let mut hits = HitBuffer::default();
        hits.push(Hit::new(10.0, 1.0, 3));
        assert!(subtract_tof(&hits, Vertex::default(), &geometry).is_err());
    }

    #[test]
    fn test_sort_round_trip_permutations() {
        let geometry = one_sensor_geometry();
        let mut hits = HitBuffer::default();
        for &t in &[30.0f32, 10.0, 20.0, 40.0, 15.0] {
            hits.push(Hit::new(t, 1.0, 0));
        }

        let series = correct_and_sort(&hits, Vertex::default(), &geometry).unwrap();
        assert!(series.times.windows(2).all(|w| w[0] <= w[1]));

        let corrected = subtract_tof(&hits, Vertex::default(), &geometry).unwrap();
        for sorted_pos in 0..series.len() {
            let original_pos = series.source_index[sorted_pos];
            assert_eq!(series.reverse_index[original_pos], sorted_pos);
            assert_relative_eq!(series.times[sorted_pos], corrected[original_pos]);
        }
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let geometry = one_sensor_geometry();
        let mut hits = HitBuffer::default();
        // Equal raw times, distinct charges to observe the order.
        hits.push(Hit::new(10.0, 1.0, 0));
        hits.push(Hit::new(10.0, 2.0, 0));
        hits.push(Hit::new(10.0, 3.0, 0));

        let series = correct_and_sort(&hits, Vertex::default(), &geometry).unwrap();
        assert_eq!(series.charges, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.source_index, vec![0, 1, 2]);
    }

    #[test]
    fn test_signal_flags_follow_sort() {
        let geometry = one_sensor_geometry();
        let mut hits = HitBuffer::default();
        hits.push_flagged(Hit::new(20.0, 1.0, 0), true);
        hits.push_flagged(Hit::new(10.0, 1.0, 0), false);

        let series = correct_and_sort(&hits, Vertex::default(), &geometry).unwrap();
        assert_eq!(series.signal_flags, Some(vec![false, true]));
    }
}
