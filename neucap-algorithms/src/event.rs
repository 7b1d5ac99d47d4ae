//! Per-event processing pipeline.
//!
//! One [`EventProcessor`] owns the working state for a single event at
//! a time: ToF correction, sorting, peak search, feature extraction and
//! the candidate store. All per-event state is rebuilt from scratch at
//! the start of each event; only the read-only geometry table and the
//! once-fixed feature schema persist across events.

use std::collections::BTreeMap;

use neucap_core::{Candidate, HitBuffer, Result, SensorGeometry, Vertex};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::features::{FeatureConfig, FeatureExtractor};
use crate::peak::{PeakSearch, PeakSearchConfig};
use crate::store::CandidateStore;
use crate::tof::{correct_and_sort, subtract_tof};

/// Full tagging configuration: search thresholds plus truth matching.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TagConfig {
    /// Peak-search thresholds.
    pub peak: PeakSearchConfig,
    /// Half-width of the true-to-reconstructed capture time match [ns].
    pub t_match_window: f32,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            peak: PeakSearchConfig::default(),
            t_match_window: 40.0,
        }
    }
}

impl TagConfig {
    /// Validates the configuration before any event is processed.
    ///
    /// # Errors
    /// [`neucap_core::Error::Config`] for invalid thresholds.
    pub fn validate(&self) -> Result<()> {
        self.peak.validate()?;
        if !(self.t_match_window > 0.0) {
            return Err(neucap_core::Error::Config(
                "t_match_window must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// One true neutron capture from Monte-Carlo truth.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrueCapture {
    /// True capture time [ns].
    pub time: f32,
    /// True capture vertex [cm].
    pub vertex: [f32; 3],
    /// True for captures on gadolinium, false for hydrogen.
    pub on_gadolinium: bool,
}

/// Everything the pipeline needs for one event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventInput {
    /// Raw hits of the trigger window.
    pub hits: HitBuffer,
    /// Prompt vertex from the external fit.
    pub vertex: Vertex,
    /// Opaque fit-derived scalars copied into every candidate.
    #[cfg_attr(feature = "serde", serde(default))]
    pub fit_scalars: BTreeMap<String, f32>,
    /// Monte-Carlo truth, absent for data events.
    #[cfg_attr(feature = "serde", serde(default))]
    pub truth: Option<Vec<TrueCapture>>,
}

/// Processed output of one event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventResult {
    /// Candidates in candidate-id order.
    pub candidates: Vec<Candidate>,
    /// Largest wide-window multiplicity seen at any anchor candidate.
    pub max_n_wide: usize,
    /// Anchor time of the largest wide-window burst [ns].
    pub max_n_wide_time: Option<f32>,
    /// Earliest accepted ToF-corrected hit time [ns].
    pub first_hit_time: Option<f32>,
}

/// The per-event tagging pipeline.
pub struct EventProcessor<'a> {
    geometry: &'a dyn SensorGeometry,
    search: PeakSearch,
    extractor: FeatureExtractor,
    t_match_window: f32,
    store: CandidateStore,
    events_processed: usize,
}

impl<'a> EventProcessor<'a> {
    /// Creates a processor over a fixed geometry and validated config.
    ///
    /// # Errors
    /// Configuration errors surface here, before any event is touched.
    pub fn new(geometry: &'a dyn SensorGeometry, config: TagConfig) -> Result<Self> {
        config.validate()?;
        if geometry.is_empty() {
            return Err(neucap_core::Error::EmptyGeometry);
        }
        let extractor = FeatureExtractor::new(FeatureConfig {
            cluster_window: config.peak.cluster_window,
            mid_window: 50.0,
            wide_window: config.peak.wide_window,
        });
        let search = PeakSearch::new(config.peak)?;
        Ok(Self {
            geometry,
            search,
            extractor,
            t_match_window: config.t_match_window,
            store: CandidateStore::new(),
            events_processed: 0,
        })
    }

    /// The event-level columnar feature store of the last event.
    #[must_use]
    pub fn store(&self) -> &CandidateStore {
        &self.store
    }

    /// Number of events processed so far.
    #[must_use]
    pub fn events_processed(&self) -> usize {
        self.events_processed
    }

    /// Runs the full pipeline on one event.
    ///
    /// Clears the previous event's candidate columns first (the feature
    /// schema persists), then: ToF correction, stable sort, peak
    /// search, per-peak feature extraction, truth labeling when truth
    /// is supplied, and columnar accumulation.
    ///
    /// # Errors
    /// Input-shape, geometry and schema errors abort this event only.
    pub fn process(&mut self, event: &EventInput) -> Result<EventResult> {
        self.store.clear();

        event.hits.validate()?;
        if event.hits.is_empty() {
            self.events_processed += 1;
            return Ok(EventResult::default());
        }

        let series = correct_and_sort(&event.hits, event.vertex, self.geometry)?;
        let scan = self.search.search(&series.times);
        log::debug!(
            "event {}: {} hits, {} peaks, max_n_wide = {}",
            self.events_processed,
            series.len(),
            scan.peaks.len(),
            scan.max_n_wide
        );

        let mut candidates = Vec::with_capacity(scan.peaks.len());
        for (id, peak) in scan.peaks.iter().enumerate() {
            let mut candidate = self.extractor.extract(
                id,
                peak,
                &series,
                &event.hits.times,
                event.vertex,
                self.geometry,
                &event.fit_scalars,
            )?;
            if let Some(truth) = &event.truth {
                label_candidate(&mut candidate, truth, self.t_match_window);
            }
            self.store.append(&candidate)?;
            candidates.push(candidate);
        }

        self.events_processed += 1;
        Ok(EventResult {
            candidates,
            max_n_wide: scan.max_n_wide,
            max_n_wide_time: scan.max_n_wide_time,
            first_hit_time: scan.first_hit_time,
        })
    }

    /// ToF-corrected hit times in original buffer order, for callers
    /// that need the unsorted reference series.
    ///
    /// # Errors
    /// Fails on mismatched arrays or unknown sensor ids.
    pub fn corrected_times(&self, hits: &HitBuffer, vertex: Vertex) -> Result<Vec<f32>> {
        subtract_tof(hits, vertex, self.geometry)
    }
}

/// Attaches truth labels to a candidate: `is_capture` (0/1) and
/// `capture_type` (0 background, 1 hydrogen, 2 gadolinium), matched by
/// reconstructed capture time within the match window.
fn label_candidate(candidate: &mut Candidate, truth: &[TrueCapture], t_match_window: f32) {
    let recon_ct = candidate.features.float("recon_ct").unwrap_or(0.0);
    let matched = truth
        .iter()
        .find(|capture| (recon_ct - capture.time).abs() < t_match_window);
    match matched {
        Some(capture) => {
            candidate.features.set_int("is_capture", 1);
            candidate
                .features
                .set_int("capture_type", if capture.on_gadolinium { 2 } else { 1 });
        }
        None => {
            candidate.features.set_int("is_capture", 0);
            candidate.features.set_int("capture_type", 0);
        }
    }
}

/// Processes a batch of events in parallel, one independent processor
/// per event. Per-event processing itself stays single-threaded; only
/// the read-only geometry is shared.
pub fn process_events<G: SensorGeometry + Sync>(
    geometry: &G,
    config: &TagConfig,
    events: &[EventInput],
) -> Vec<Result<EventResult>> {
    events
        .par_iter()
        .map(|event| {
            let mut processor = EventProcessor::new(geometry, config.clone())?;
            processor.process(event)
        })
        .collect()
}
