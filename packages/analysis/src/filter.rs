//! Lens and time-window filtering over the corpus.

use civic_watch_analysis_models::FilterState;
use civic_watch_observation_models::Observation;

/// Returns the observations admitted by `state`'s lens and time window,
/// in corpus order.
///
/// An observation passes the window when the window is unbounded or its age
/// (`now - timestamp`, clamped at zero for future timestamps) is strictly
/// less than the window span.
#[must_use]
pub fn apply<'a>(corpus: &'a [Observation], state: FilterState, now: i64) -> Vec<&'a Observation> {
    let span = state.window.span_ms();

    let filtered: Vec<&Observation> = corpus
        .iter()
        .filter(|o| state.lens.admits(o.observation_type))
        .filter(|o| span.is_none_or(|span| age_ms(o, now) < span))
        .collect();

    log::debug!(
        "filter lens={} window={}: {} of {} observations",
        state.lens,
        state.window,
        filtered.len(),
        corpus.len()
    );

    filtered
}

/// Age of `observation` at `now`, never negative.
#[must_use]
pub fn age_ms(observation: &Observation, now: i64) -> i64 {
    now.saturating_sub(observation.timestamp).max(0)
}
