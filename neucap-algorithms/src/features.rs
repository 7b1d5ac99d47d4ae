//! Per-candidate feature extraction.
//!
//! For each emitted peak the extractor slices the window's hit
//! sub-arrays out of the sorted series and fills the candidate's two
//! feature namespaces: window counts on the integer side, timing and
//! angular statistics on the float side, plus any opaque fit-derived
//! scalars handed in by the vertex-fit collaborator.

use std::collections::BTreeMap;

use neucap_core::math::{beta_moments, time_rms, time_skewness, unit_vector};
use neucap_core::{Candidate, FeatureSet, Result, SensorGeometry, Vertex};

use crate::peak::{count_around_center, count_from_start, Peak};
use crate::tof::SortedHitSeries;

/// Window widths for the candidate count features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    /// Tight window width [ns]; must match the peak search.
    pub cluster_window: f32,
    /// Intermediate count window width [ns] (the `n50` feature).
    pub mid_window: f32,
    /// Wide count window width [ns] (the `n200` feature).
    pub wide_window: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            cluster_window: 10.0,
            mid_window: 50.0,
            wide_window: 200.0,
        }
    }
}

/// Extracts the fixed feature vector of one candidate window.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    /// Creates an extractor with the given window widths.
    #[must_use]
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Builds a [`Candidate`] from an emitted peak.
    ///
    /// `raw_times` are the uncorrected hit times in original buffer
    /// order; the series' source permutation recovers them for the
    /// window while slicing in sorted time order. `fit_scalars` are
    /// opaque collaborator-supplied values copied into the float
    /// namespace as-is.
    ///
    /// The peak search never emits an empty window, so `peak` must
    /// reference at least one hit.
    ///
    /// # Errors
    /// Propagates geometry lookup failures for window sensor ids.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn extract<G: SensorGeometry + ?Sized>(
        &self,
        id: usize,
        peak: &Peak,
        series: &SortedHitSeries,
        raw_times: &[f32],
        vertex: Vertex,
        geometry: &G,
        fit_scalars: &BTreeMap<String, f32>,
    ) -> Result<Candidate> {
        let start = peak.anchor_index;
        let n = count_from_start(&series.times, start, self.config.cluster_window);
        debug_assert_eq!(n, peak.n_cluster);
        let window = start..start + n;

        let res_times = series.times[window.clone()].to_vec();
        let charges = series.charges[window.clone()].to_vec();
        let sensor_ids = series.sensor_ids[window.clone()].to_vec();
        let signal_flags = series
            .signal_flags
            .as_ref()
            .map(|flags| flags[window.clone()].to_vec());
        let window_raw_times: Vec<f32> = series.source_index[window]
            .iter()
            .map(|&original| raw_times[original])
            .collect();

        let anchor_time = peak.anchor_time;
        let window_center = anchor_time + self.config.cluster_window / 2.0;

        let mut features = FeatureSet::new();
        features.set_int("n10", n as i32);
        features.set_int(
            "n50",
            count_from_start(&series.times, start, self.config.mid_window) as i32,
        );
        features.set_int(
            "n200",
            count_around_center(&series.times, window_center, self.config.wide_window) as i32,
        );
        if let Some(flags) = &signal_flags {
            features.set_int("n_sig", flags.iter().filter(|&&f| f).count() as i32);
        }

        features.set_float("recon_ct", anchor_time);
        features.set_float("qsum", charges.iter().sum());
        features.set_float("trms", time_rms(&res_times));
        features.set_float("tskew", time_skewness(&res_times));

        let mut directions = Vec::with_capacity(n);
        for &sensor_id in &sensor_ids {
            let position = geometry.position_checked(sensor_id)?;
            directions.push(unit_vector([
                position[0] - vertex.x,
                position[1] - vertex.y,
                position[2] - vertex.z,
            ]));
        }
        let betas = beta_moments(&directions);
        for (order, beta) in betas.iter().enumerate() {
            features.set_float(format!("beta{}", order + 1), *beta);
        }

        for (name, &value) in fit_scalars {
            features.set_float(name.clone(), value);
        }

        Ok(Candidate {
            id,
            raw_times: window_raw_times,
            res_times,
            charges,
            sensor_ids,
            signal_flags,
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peak::{PeakSearch, PeakSearchConfig};
    use crate::tof::correct_and_sort;
    use approx::assert_relative_eq;
    use neucap_core::{Hit, HitBuffer, StaticGeometry, C_WATER};

    /// Geometry with every sensor C_WATER cm from the origin, so ToF
    /// from the origin is exactly 1 ns regardless of sensor id.
    fn ring_geometry(sensors: usize) -> StaticGeometry {
        #[allow(clippy::cast_precision_loss)]
        let positions = (0..sensors)
            .map(|i| {
                let angle = i as f32;
                [C_WATER * angle.cos(), C_WATER * angle.sin(), 0.0]
            })
            .collect();
        StaticGeometry::new(positions).unwrap()
    }

    fn make_candidate(hits: &HitBuffer, geometry: &StaticGeometry) -> Candidate {
        let series = correct_and_sort(hits, Vertex::default(), geometry).unwrap();
        let config = PeakSearchConfig::default().with_multiplicity_bounds(3, 50);
        let scan = PeakSearch::new(config).unwrap().search(&series.times);
        assert_eq!(scan.peaks.len(), 1);

        FeatureExtractor::default()
            .extract(
                0,
                &scan.peaks[0],
                &series,
                &hits.times,
                Vertex::default(),
                geometry,
                &BTreeMap::new(),
            )
            .unwrap()
    }

    #[test]
    fn test_window_counts_and_charge_sum() {
        let geometry = ring_geometry(8);
        let mut hits = HitBuffer::default();
        // Five hits inside one tight window (raw times carry the +1 ns
        // ToF), one straggler 30 ns later.
        for (i, &t) in [101.0f32, 102.0, 103.0, 104.0, 105.0].iter().enumerate() {
            hits.push(Hit::new(t, 2.0, i as u32));
        }
        hits.push(Hit::new(135.0, 1.0, 5));

        let candidate = make_candidate(&hits, &geometry);
        assert_eq!(candidate.multiplicity(), 5);
        assert_eq!(candidate.features.int("n10"), Some(5));
        assert_eq!(candidate.features.int("n50"), Some(6));
        assert_eq!(candidate.features.int("n200"), Some(6));
        assert_relative_eq!(candidate.features.float("qsum").unwrap(), 10.0);
        assert_relative_eq!(
            candidate.features.float("recon_ct").unwrap(),
            100.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_raw_times_recovered_through_permutation() {
        let geometry = ring_geometry(4);
        let mut hits = HitBuffer::default();
        // Out-of-order raw times; the window slice must come back in
        // sorted corrected order with matching raw times.
        hits.push(Hit::new(103.0, 1.0, 0));
        hits.push(Hit::new(101.0, 1.0, 1));
        hits.push(Hit::new(102.0, 1.0, 2));

        let candidate = make_candidate(&hits, &geometry);
        assert_eq!(candidate.raw_times, vec![101.0, 102.0, 103.0]);
        assert_eq!(candidate.sensor_ids, vec![1, 2, 0]);
        for (raw, res) in candidate.raw_times.iter().zip(&candidate.res_times) {
            assert_relative_eq!(raw - res, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_timing_statistics() {
        let geometry = ring_geometry(4);
        let mut hits = HitBuffer::default();
        for (i, &t) in [101.0f32, 102.0, 103.0].iter().enumerate() {
            hits.push(Hit::new(t, 1.0, i as u32));
        }

        let candidate = make_candidate(&hits, &geometry);
        // Corrected times 100, 101, 102: rms = sqrt(2/3), symmetric so
        // zero skew.
        assert_relative_eq!(
            candidate.features.float("trms").unwrap(),
            (2.0f32 / 3.0).sqrt(),
            epsilon = 1e-4
        );
        assert_relative_eq!(
            candidate.features.float("tskew").unwrap(),
            0.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_beta_features_present() {
        let geometry = ring_geometry(8);
        let mut hits = HitBuffer::default();
        for (i, &t) in [101.0f32, 101.5, 102.0, 102.5].iter().enumerate() {
            hits.push(Hit::new(t, 1.0, i as u32));
        }

        let candidate = make_candidate(&hits, &geometry);
        for order in 1..=5 {
            let beta = candidate.features.float(&format!("beta{order}")).unwrap();
            assert!(beta.abs() <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn test_fit_scalars_pass_through() {
        let geometry = ring_geometry(4);
        let series = correct_and_sort(
            &{
                let mut hits = HitBuffer::default();
                for (i, &t) in [101.0f32, 102.0, 103.0].iter().enumerate() {
                    hits.push(Hit::new(t, 1.0, i as u32));
                }
                hits
            },
            Vertex::default(),
            &geometry,
        )
        .unwrap();
        let scan = PeakSearch::new(PeakSearchConfig::default().with_multiplicity_bounds(3, 50))
            .unwrap()
            .search(&series.times);

        let mut fit_scalars = BTreeMap::new();
        fit_scalars.insert("fit_energy".to_string(), 8.2f32);
        fit_scalars.insert("fit_goodness".to_string(), 0.71f32);

        let candidate = FeatureExtractor::default()
            .extract(
                0,
                &scan.peaks[0],
                &series,
                &[103.0, 101.0, 102.0],
                Vertex::default(),
                &geometry,
                &fit_scalars,
            )
            .unwrap();
        assert_relative_eq!(candidate.features.float("fit_energy").unwrap(), 8.2);
        assert_relative_eq!(candidate.features.float("fit_goodness").unwrap(), 0.71);
    }

    #[test]
    fn test_signal_flag_count() {
        let geometry = ring_geometry(4);
        let mut hits = HitBuffer::default();
        hits.push_flagged(Hit::new(101.0, 1.0, 0), true);
        hits.push_flagged(Hit::new(102.0, 1.0, 1), true);
        hits.push_flagged(Hit::new(103.0, 1.0, 2), false);

        let candidate = make_candidate(&hits, &geometry);
        assert_eq!(candidate.features.int("n_sig"), Some(2));
        assert_eq!(candidate.signal_flags, Some(vec![true, true, false]));
    }
}
