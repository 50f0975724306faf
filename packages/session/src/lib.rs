#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive map session.
//!
//! A [`Session`] holds the four independent inputs of the map UI (filter
//! state, viewport, selection, pattern mode) over a read-only corpus and
//! answers pull-based queries against them. It owns the pattern-mode state
//! machine:
//!
//! ```text
//!            enter_city_wide_pattern            enter_local_pattern
//!   None ─────────────────────────► CityWide   None ───────────────► Local
//!     ▲                                │         ▲                     │
//!     └──────── clear_pattern ─────────┘         └──── clear_pattern ──┘
//! ```
//!
//! Entering a pattern requires a selection and clears it; clearing restores
//! the view and selection captured on entry. Selection and an active
//! pattern never coexist.

pub mod marker;
pub mod mode;

use std::sync::Arc;

use civic_watch_analysis::clock::{Clock, SystemClock};
use civic_watch_analysis::{cluster, filter, pattern, stats, viewport};
use civic_watch_analysis_models::{ClusterSize, EngineConfig, FilterState, Stats, Viewport};
use civic_watch_observation_models::Observation;
use civic_watch_spatial::bounding_box;
use thiserror::Error;

use crate::marker::MarkerDescriptor;
use crate::mode::{CityWideSnapshot, LocalSnapshot, MapView, PatternMode, SavedView};

/// Rejected session commands. A rejected command never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A pattern is already active; clear it first.
    #[error("Pattern mode '{mode}' is already active")]
    PatternAlreadyActive {
        /// Name of the active mode.
        mode: &'static str,
    },

    /// Entering a pattern needs a selected reference observation.
    #[error("No observation is selected")]
    NoSelection,

    /// No observation with this id exists in the corpus.
    #[error("Unknown observation '{id}'")]
    UnknownObservation {
        /// Requested id.
        id: String,
    },

    /// The observation exists but the current filters hide it.
    #[error("Observation '{id}' is not in the filtered set")]
    NotInFilteredSet {
        /// Requested id.
        id: String,
    },

    /// The local analysis matched nothing around the reference.
    #[error("No observations found around '{id}'")]
    NoLocalMatches {
        /// Reference id.
        id: String,
    },
}

/// Map session over an immutable corpus.
pub struct Session {
    corpus: Arc<[Observation]>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    filter: FilterState,
    viewport: Option<Viewport>,
    view: MapView,
    selection: Option<String>,
    pattern: PatternMode,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("corpus_len", &self.corpus.len())
            .field("filter", &self.filter)
            .field("viewport", &self.viewport)
            .field("view", &self.view)
            .field("selection", &self.selection)
            .field("pattern", &self.pattern.name())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session with default filters, no selection, no pattern, and
    /// the system clock.
    #[must_use]
    pub fn new(corpus: impl Into<Arc<[Observation]>>, config: EngineConfig, view: MapView) -> Self {
        Self {
            corpus: corpus.into(),
            config,
            clock: Arc::new(SystemClock),
            filter: FilterState::default(),
            viewport: None,
            view,
            selection: None,
            pattern: PatternMode::None,
        }
    }

    /// Replaces the clock used for "now".
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The full corpus.
    #[must_use]
    pub fn corpus(&self) -> &[Observation] {
        &self.corpus
    }

    /// Engine configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current filter state.
    #[must_use]
    pub const fn filter_state(&self) -> FilterState {
        self.filter
    }

    /// Current map view.
    #[must_use]
    pub const fn view(&self) -> MapView {
        self.view
    }

    /// Current pattern mode.
    #[must_use]
    pub const fn pattern(&self) -> &PatternMode {
        &self.pattern
    }

    /// Id of the selected observation, if any.
    #[must_use]
    pub fn selection_id(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// The selected observation, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&Observation> {
        self.selection.as_deref().and_then(|id| self.find(id))
    }

    fn find(&self, id: &str) -> Option<&Observation> {
        self.corpus.iter().find(|o| o.id == id)
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Observations passing the current lens and time window.
    #[must_use]
    pub fn filtered(&self) -> Vec<&Observation> {
        filter::apply(&self.corpus, self.filter, self.clock.now_millis())
    }

    /// Filtered observations inside the last reported viewport. Empty until
    /// the map surface has reported one.
    #[must_use]
    pub fn visible(&self) -> Vec<&Observation> {
        self.viewport.as_ref().map_or_else(Vec::new, |vp| {
            viewport::visible(&self.filtered(), vp)
        })
    }

    /// Aggregate stats over the visible set.
    #[must_use]
    pub fn visible_stats(&self) -> Stats {
        stats::aggregate(self.visible())
    }

    /// Marker descriptors for the current render pass: the pattern's matched
    /// set while a pattern is active, the filtered set otherwise.
    #[must_use]
    pub fn markers(&self) -> Vec<MarkerDescriptor> {
        if let Some(matched) = self.pattern.matched() {
            return matched.iter().map(MarkerDescriptor::pattern).collect();
        }

        let selected = self.selection.as_deref();
        self.filtered()
            .into_iter()
            .map(|o| MarkerDescriptor::plain(o, selected == Some(o.id.as_str())))
            .collect()
    }

    /// Glyph size for a cluster of `count` markers.
    #[must_use]
    pub const fn cluster_size(&self, count: u64) -> ClusterSize {
        cluster::size_tier(count, &self.config.cluster)
    }

    // ── Inputs ──────────────────────────────────────────────────────

    /// Changes the lens/time filter. A selection the new filter hides is
    /// dropped so it never dangles.
    pub fn set_filter(&mut self, state: FilterState) {
        self.filter = state;
        log::debug!("filter set to lens={} window={}", state.lens, state.window);

        if let Some(id) = self.selection.clone()
            && !self.is_filtered(&id)
        {
            log::info!("Deselecting {id}: no longer in the filtered set");
            self.selection = None;
        }
    }

    /// Records a pan/zoom from the map surface.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.view = MapView {
            center: viewport.bounds.center(),
            zoom: viewport.zoom,
        };
        self.viewport = Some(viewport);
    }

    fn is_filtered(&self, id: &str) -> bool {
        self.filtered().iter().any(|o| o.id == id)
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Selects an observation (a marker click).
    ///
    /// # Errors
    ///
    /// * [`SessionError::PatternAlreadyActive`] while a pattern is shown
    /// * [`SessionError::UnknownObservation`] if `id` is not in the corpus
    /// * [`SessionError::NotInFilteredSet`] if the filters hide it
    pub fn select_observation(&mut self, id: &str) -> Result<(), SessionError> {
        self.ensure_no_pattern()?;

        if self.find(id).is_none() {
            return Err(SessionError::UnknownObservation { id: id.to_string() });
        }
        if !self.is_filtered(id) {
            return Err(SessionError::NotInFilteredSet { id: id.to_string() });
        }

        log::debug!("Selected {id}");
        self.selection = Some(id.to_string());
        Ok(())
    }

    /// Clears the selection. No-op when nothing is selected.
    pub fn clear_selection(&mut self) {
        if let Some(id) = self.selection.take() {
            log::debug!("Deselected {id}");
        }
    }

    /// Enters city-wide pattern mode around the selected observation.
    ///
    /// # Errors
    ///
    /// * [`SessionError::PatternAlreadyActive`] unless in [`PatternMode::None`]
    /// * [`SessionError::NoSelection`] if nothing is selected
    pub fn enter_city_wide_pattern(&mut self) -> Result<(), SessionError> {
        self.ensure_no_pattern()?;
        let reference = self.selection().cloned().ok_or(SessionError::NoSelection)?;

        let now = self.clock.now_millis();
        let window_ms = self.config.pattern.trend_span_ms(self.filter.window);
        let filtered = self.filtered();
        let result = pattern::city_wide(&reference, &filtered, window_ms, now, &self.config.pattern);

        let saved_view = self.save_view();
        let focus = bounding_box(result.matched.iter().map(pattern::location))
            .map_or(self.view.center, |b| b.center());

        log::info!(
            "Entering city-wide {} pattern from {}: {} matches",
            reference.observation_type,
            reference.id,
            result.stats.total
        );

        self.selection = None;
        self.view.center = focus;
        self.pattern = PatternMode::CityWide(CityWideSnapshot {
            reference_id: reference.id,
            reference_type: reference.observation_type,
            matched: result.matched,
            stats: result.stats,
            saved_view,
        });

        Ok(())
    }

    /// Enters local pattern mode: same-type observations within the
    /// configured radius of the selected observation.
    ///
    /// # Errors
    ///
    /// * [`SessionError::PatternAlreadyActive`] unless in [`PatternMode::None`]
    /// * [`SessionError::NoSelection`] if nothing is selected
    /// * [`SessionError::NoLocalMatches`] if the analysis matched nothing
    pub fn enter_local_pattern(&mut self) -> Result<(), SessionError> {
        self.ensure_no_pattern()?;
        let reference = self.selection().cloned().ok_or(SessionError::NoSelection)?;

        let now = self.clock.now_millis();
        let window_ms = self.config.pattern.trend_span_ms(self.filter.window);
        let radius = self.config.pattern.local_radius_meters;
        let filtered = self.filtered();
        let result = pattern::local(
            &reference,
            &filtered,
            radius,
            window_ms,
            now,
            &self.config.pattern,
        );

        let Some(result) = result else {
            log::warn!("Local pattern around {} matched nothing", reference.id);
            return Err(SessionError::NoLocalMatches { id: reference.id });
        };

        let saved_view = self.save_view();

        log::info!(
            "Entering local {} pattern within {radius}m of {}: {} matches",
            reference.observation_type,
            reference.id,
            result.stats.count
        );

        self.selection = None;
        self.view = MapView {
            center: result.stats.center,
            zoom: self.config.pattern.local_focus_zoom,
        };
        self.pattern = PatternMode::Local(LocalSnapshot {
            reference_id: reference.id,
            reference_type: reference.observation_type,
            matched: result.matched,
            stats: result.stats,
            saved_view,
        });

        Ok(())
    }

    /// Leaves pattern mode, restoring the saved center, zoom, and selection.
    /// Idempotent: does nothing in [`PatternMode::None`].
    ///
    /// The saved selection is only restored if the current filters still
    /// show it.
    pub fn clear_pattern(&mut self) {
        let previous = std::mem::take(&mut self.pattern);
        let Some(saved) = previous.saved_view() else {
            return;
        };

        log::info!("Leaving {} pattern", previous.name());

        self.view = MapView {
            center: saved.center,
            zoom: saved.zoom,
        };
        self.selection = saved
            .previous_selection
            .as_deref()
            .filter(|id| {
                let visible = self.is_filtered(id);
                if !visible {
                    log::info!("Not restoring selection {id}: no longer in the filtered set");
                }
                visible
            })
            .map(str::to_string);
    }

    fn ensure_no_pattern(&self) -> Result<(), SessionError> {
        if self.pattern.is_active() {
            log::warn!("Rejected command: pattern '{}' is active", self.pattern.name());
            return Err(SessionError::PatternAlreadyActive {
                mode: self.pattern.name(),
            });
        }
        Ok(())
    }

    fn save_view(&self) -> SavedView {
        SavedView {
            center: self.view.center,
            zoom: self.view.zoom,
            previous_selection: self.selection.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use civic_watch_analysis::clock::FixedClock;
    use civic_watch_analysis_models::{Lens, TimeWindow, Trend};
    use civic_watch_observation_models::{MILLIS_PER_DAY, ObservationStatus, ObservationType};
    use civic_watch_spatial::{GeoBounds, LatLng};

    use super::*;

    const NOW: i64 = 1_760_000_000_000;
    const START: MapView = MapView {
        center: LatLng::new(19.076, 72.8777),
        zoom: 12,
    };

    fn obs(id: &str, observation_type: ObservationType, lat: f64, lng: f64, age: i64) -> Observation {
        Observation {
            id: id.to_string(),
            observation_type,
            lat,
            lng,
            timestamp: NOW - age,
            status: ObservationStatus::Pending,
            reviewed_at: None,
            response_time: None,
            media: None,
        }
    }

    fn session() -> Session {
        let corpus = vec![
            obs("v1", ObservationType::Violation, 19.0, 72.9, MILLIS_PER_DAY),
            obs("v2", ObservationType::Violation, 19.0005, 72.9, 2 * MILLIS_PER_DAY),
            obs("v3", ObservationType::Violation, 19.1, 72.8, 20 * MILLIS_PER_DAY),
            obs("r1", ObservationType::Risk, 19.0, 72.9, MILLIS_PER_DAY),
            obs("i-old", ObservationType::Infrastructure, 19.05, 72.85, 45 * MILLIS_PER_DAY),
        ];
        Session::new(corpus, EngineConfig::default(), START).with_clock(Arc::new(FixedClock(NOW)))
    }

    #[test]
    fn default_filter_hides_old_observations() {
        let session = session();
        let ids: Vec<&str> = session.filtered().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3", "r1"]);
    }

    #[test]
    fn visible_is_empty_until_viewport_reported() {
        let mut session = session();
        assert!(session.visible().is_empty());

        session.set_viewport(Viewport {
            bounds: GeoBounds::new(72.85, 18.95, 72.95, 19.05),
            zoom: 14,
        });
        let stats = session.visible_stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type.violation, 2);
        assert_eq!(stats.by_type.risk, 1);
        assert_eq!(session.view().zoom, 14);
    }

    #[test]
    fn select_requires_filtered_observation() {
        let mut session = session();

        assert_eq!(
            session.select_observation("nope"),
            Err(SessionError::UnknownObservation { id: "nope".into() })
        );
        assert_eq!(
            session.select_observation("i-old"),
            Err(SessionError::NotInFilteredSet { id: "i-old".into() })
        );
        assert!(session.select_observation("v1").is_ok());
        assert_eq!(session.selection().map(|o| o.id.as_str()), Some("v1"));
    }

    #[test]
    fn filter_change_drops_hidden_selection() {
        let mut session = session();
        session.select_observation("v1").unwrap();

        session.set_filter(FilterState {
            lens: Lens::Only(ObservationType::Risk),
            window: TimeWindow::Month,
        });
        assert_eq!(session.selection_id(), None);
    }

    #[test]
    fn filter_change_keeps_visible_selection() {
        let mut session = session();
        session.select_observation("v1").unwrap();

        session.set_filter(FilterState {
            lens: Lens::Only(ObservationType::Violation),
            window: TimeWindow::Week,
        });
        assert_eq!(session.selection_id(), Some("v1"));
    }

    #[test]
    fn city_wide_then_clear_restores_view_and_selection() {
        let mut session = session();
        session.select_observation("v1").unwrap();
        let before = (session.view(), session.selection_id().map(str::to_string));

        session.enter_city_wide_pattern().unwrap();
        let snapshot = session.pattern().city_wide().unwrap();
        assert_eq!(snapshot.stats.total, 3);
        assert_eq!(snapshot.reference_type, ObservationType::Violation);
        assert_eq!(snapshot.saved_view.previous_selection.as_deref(), Some("v1"));
        assert_eq!(session.selection_id(), None);
        assert_eq!(session.pattern().name(), "city_wide");

        session.clear_pattern();
        assert_eq!(*session.pattern(), PatternMode::None);
        assert_eq!(
            (session.view(), session.selection_id().map(str::to_string)),
            before
        );
    }

    #[test]
    fn local_pattern_uses_radius_and_focus_zoom() {
        let mut session = session();
        session.select_observation("v1").unwrap();

        session.enter_local_pattern().unwrap();
        let snapshot = session.pattern().local().unwrap();
        let ids: Vec<&str> = snapshot.matched.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2"]);
        assert_eq!(snapshot.stats.count, 2);
        assert_eq!(snapshot.stats.time_span_days, 1);
        assert_eq!(snapshot.stats.trend, Trend::Increasing);
        assert_eq!(snapshot.center(), LatLng::new(19.0, 72.9));
        assert!(session.pattern().city_wide().is_none());

        assert_eq!(session.view().zoom, session.config().pattern.local_focus_zoom);
        session.clear_pattern();
        assert_eq!(session.view(), START);
    }

    #[test]
    fn entering_requires_selection() {
        let mut session = session();
        assert_eq!(
            session.enter_city_wide_pattern().err(),
            Some(SessionError::NoSelection)
        );
        assert_eq!(session.enter_local_pattern().err(), Some(SessionError::NoSelection));
        assert!(!session.pattern().is_active());
    }

    #[test]
    fn entering_twice_is_rejected_without_corruption() {
        let mut session = session();
        session.select_observation("v1").unwrap();
        session.enter_city_wide_pattern().unwrap();
        let snapshot_before = session.pattern().clone();

        assert_eq!(
            session.enter_local_pattern().err(),
            Some(SessionError::PatternAlreadyActive { mode: "city_wide" })
        );
        assert_eq!(
            session.select_observation("v2"),
            Err(SessionError::PatternAlreadyActive { mode: "city_wide" })
        );
        assert_eq!(*session.pattern(), snapshot_before);
        assert_eq!(session.selection_id(), None);
    }

    #[test]
    fn clear_pattern_is_idempotent() {
        let mut session = session();
        session.clear_pattern();
        assert_eq!(*session.pattern(), PatternMode::None);
        assert_eq!(session.view(), START);

        session.select_observation("r1").unwrap();
        session.enter_city_wide_pattern().unwrap();
        session.clear_pattern();
        session.clear_pattern();
        assert_eq!(session.selection_id(), Some("r1"));
    }

    #[test]
    fn clear_pattern_skips_selection_hidden_since_entry() {
        let mut session = session();
        session.select_observation("v3").unwrap();
        session.enter_city_wide_pattern().unwrap();

        session.set_filter(FilterState {
            lens: Lens::All,
            window: TimeWindow::Week,
        });
        session.clear_pattern();
        assert_eq!(session.selection_id(), None);
    }

    #[test]
    fn markers_follow_selection_and_pattern() {
        let mut session = session();
        session.select_observation("r1").unwrap();

        let markers = session.markers();
        assert_eq!(markers.len(), 4);
        let selected: Vec<&MarkerDescriptor> = markers.iter().filter(|m| m.is_selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "r1");
        assert_eq!(selected[0].stroke_weight, marker::SELECTED_STROKE_WEIGHT);

        session.enter_city_wide_pattern().unwrap();
        let markers = session.markers();
        assert_eq!(markers.len(), 1);
        assert!(markers.iter().all(|m| m.fill_emphasis && !m.is_selected));
    }

    #[test]
    fn cluster_size_uses_config() {
        let session = session();
        assert_eq!(
            session.cluster_size(51).tier,
            civic_watch_analysis_models::ClusterTier::Large
        );
    }

    #[test]
    fn pattern_mode_serializes_with_tag() {
        let mut session = session();
        session.select_observation("v1").unwrap();
        session.enter_local_pattern().unwrap();

        let json = serde_json::to_value(session.pattern()).unwrap();
        assert_eq!(json["mode"], "local");
        assert_eq!(json["stats"]["count"], 2);
        assert_eq!(json["savedView"]["previousSelection"], "v1");
    }
}
