//! Sliding-window peak search over the sorted hit series.
//!
//! The search is a single linear pass: each hit is tested as a peak
//! anchor using a forward-looking tight-window multiplicity, and the
//! best anchor within any `min_peak_separation`-wide neighborhood is
//! kept via an explicit anchor state machine. A second, centered wide
//! window rejects anchors embedded in an oversized burst (e.g. muon
//! afterglow) and tracks the single largest burst of the event.

use neucap_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Thresholds for the capture-candidate peak search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakSearchConfig {
    /// Minimum tight-window multiplicity for a peak anchor.
    pub n_low: usize,
    /// Maximum tight-window multiplicity for a peak anchor.
    pub n_high: usize,
    /// Wide-window multiplicity cap; anchors at or above it are not emitted.
    pub n_wide_max: usize,
    /// Tight window width [ns], forward-looking from the anchor.
    pub cluster_window: f32,
    /// Wide window width [ns], centered on the middle of the tight window.
    pub wide_window: f32,
    /// Minimum separation between emitted anchors [ns].
    pub min_peak_separation: f32,
    /// Corrected hit times below this are skipped entirely [ns].
    pub t0_min: f32,
    /// Advisory upper bound on candidate times [ns]; documented for
    /// downstream cuts, not enforced inside the scan.
    pub t0_max: f32,
}

impl Default for PeakSearchConfig {
    fn default() -> Self {
        Self {
            n_low: 7,
            n_high: 50,
            n_wide_max: 200,
            cluster_window: 10.0,
            wide_window: 200.0,
            min_peak_separation: 50.0,
            t0_min: 5.0,
            t0_max: 535.0,
        }
    }
}

impl PeakSearchConfig {
    /// Creates a configuration with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tight-window multiplicity bounds.
    #[must_use]
    pub fn with_multiplicity_bounds(mut self, low: usize, high: usize) -> Self {
        self.n_low = low;
        self.n_high = high;
        self
    }

    /// Sets the wide-window multiplicity cap.
    #[must_use]
    pub fn with_wide_max(mut self, max: usize) -> Self {
        self.n_wide_max = max;
        self
    }

    /// Sets the tight and wide window widths [ns].
    #[must_use]
    pub fn with_windows(mut self, cluster_window: f32, wide_window: f32) -> Self {
        self.cluster_window = cluster_window;
        self.wide_window = wide_window;
        self
    }

    /// Sets the minimum anchor separation [ns].
    #[must_use]
    pub fn with_min_peak_separation(mut self, separation: f32) -> Self {
        self.min_peak_separation = separation;
        self
    }

    /// Sets the accepted corrected-time range [ns].
    #[must_use]
    pub fn with_time_range(mut self, t0_min: f32, t0_max: f32) -> Self {
        self.t0_min = t0_min;
        self.t0_max = t0_max;
        self
    }

    /// Checks threshold ordering and window widths once, before any
    /// event is processed.
    ///
    /// # Errors
    /// [`Error::Config`] describing the violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.n_low == 0 {
            return Err(Error::Config("n_low must be at least 1".into()));
        }
        if self.n_low > self.n_high {
            return Err(Error::Config(format!(
                "n_low ({}) must not exceed n_high ({})",
                self.n_low, self.n_high
            )));
        }
        if !(self.cluster_window > 0.0) || !(self.wide_window > 0.0) {
            return Err(Error::Config("window widths must be positive".into()));
        }
        if !(self.min_peak_separation > 0.0) {
            return Err(Error::Config("min_peak_separation must be positive".into()));
        }
        if self.t0_min >= self.t0_max {
            return Err(Error::Config(format!(
                "t0_min ({}) must be below t0_max ({})",
                self.t0_min, self.t0_max
            )));
        }
        Ok(())
    }
}

/// One emitted peak: the anchor hit and its window multiplicities.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Peak {
    /// Sorted-series index of the anchor (earliest window hit).
    pub anchor_index: usize,
    /// Corrected time of the anchor [ns].
    pub anchor_time: f32,
    /// Hit count in `[anchor_time, anchor_time + cluster_window)`.
    pub n_cluster: usize,
    /// Hit count in the wide window centered on the tight window.
    pub n_wide: usize,
}

/// Result of one peak-search pass over an event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakScan {
    /// Emitted peaks, in ascending anchor-time order.
    pub peaks: Vec<Peak>,
    /// Largest wide-window count seen at any anchor candidate,
    /// independent of emission.
    pub max_n_wide: usize,
    /// Anchor time of the largest wide-window burst [ns].
    pub max_n_wide_time: Option<f32>,
    /// Earliest accepted corrected hit time [ns].
    pub first_hit_time: Option<f32>,
}

/// Tracked best anchor of the current un-separated run.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    index: usize,
    time: f32,
    n_cluster: usize,
    n_wide: usize,
}

impl Anchor {
    fn to_peak(self) -> Peak {
        Peak {
            anchor_index: self.index,
            anchor_time: self.time,
            n_cluster: self.n_cluster,
            n_wide: self.n_wide,
        }
    }
}

/// Number of hits in `[times[start], times[start] + width)`.
///
/// `times` must be sorted ascending; the count is a local forward scan,
/// not a full windowed convolution.
#[must_use]
pub fn count_from_start(times: &[f32], start: usize, width: f32) -> usize {
    let limit = times[start] + width;
    times[start..].iter().take_while(|&&t| t < limit).count()
}

/// Number of hits in `[center - width / 2, center + width / 2)`.
///
/// `times` must be sorted ascending.
#[must_use]
pub fn count_around_center(times: &[f32], center: f32, width: f32) -> usize {
    let lo = center - width / 2.0;
    let hi = center + width / 2.0;
    let begin = times.partition_point(|&t| t < lo);
    let end = times.partition_point(|&t| t < hi);
    end - begin
}

/// The capture-candidate peak search.
#[derive(Debug, Clone, Default)]
pub struct PeakSearch {
    config: PeakSearchConfig,
}

impl PeakSearch {
    /// Creates a search with a validated configuration.
    ///
    /// # Errors
    /// [`Error::Config`] for invalid threshold ordering or windows.
    pub fn new(config: PeakSearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PeakSearchConfig {
        &self.config
    }

    /// Scans a sorted corrected-time series and emits disjoint peaks.
    ///
    /// Empty input, or input where no hit ever reaches `n_low`, yields
    /// zero peaks.
    #[must_use]
    pub fn search(&self, times: &[f32]) -> PeakScan {
        let cfg = &self.config;
        let mut scan = PeakScan::default();
        let mut anchor: Option<Anchor> = None;

        for (i, &t) in times.iter().enumerate() {
            if t < cfg.t0_min {
                continue;
            }
            if scan.first_hit_time.is_none() {
                scan.first_hit_time = Some(t);
            }

            let n_cluster = count_from_start(times, i, cfg.cluster_window);
            if n_cluster < cfg.n_low || n_cluster > cfg.n_high {
                continue;
            }

            // The wide-window burst maximum is tracked for every anchor
            // candidate, whether or not it ends up emitted.
            let window_center = t + cfg.cluster_window / 2.0;
            let n_wide = count_around_center(times, window_center, cfg.wide_window);
            if n_wide > scan.max_n_wide {
                scan.max_n_wide = n_wide;
                scan.max_n_wide_time = Some(t);
            }

            if let Some(best) = anchor.take() {
                if t - best.time > cfg.min_peak_separation {
                    // The tracked anchor can no longer be displaced;
                    // finalize it and start a fresh run at this hit.
                    if best.n_wide < cfg.n_wide_max {
                        log::debug!(
                            "peak accepted: t = {:.1} ns, n_cluster = {}, n_wide = {}",
                            best.time,
                            best.n_cluster,
                            best.n_wide
                        );
                        scan.peaks.push(best.to_peak());
                    } else {
                        log::debug!(
                            "peak rejected by wide-window cap: t = {:.1} ns, n_wide = {}",
                            best.time,
                            best.n_wide
                        );
                    }
                } else if n_cluster <= best.n_cluster {
                    // Not the best anchor of the current run; keep the
                    // tracked one and keep scanning.
                    anchor = Some(best);
                    continue;
                }
            }

            anchor = Some(Anchor {
                index: i,
                time: t,
                n_cluster,
                n_wide,
            });
        }

        // The wide-window cap does not apply to the final anchor.
        if let Some(best) = anchor {
            scan.peaks.push(best.to_peak());
        }

        scan
    }
}
