//! Identity filters
//!
//! Remote and local records are matched on natural keys only: venue code,
//! event code, and (event code, start time) for performances. Start time
//! alone is not unique across events and event code alone is not unique
//! across performances. The storage guid never takes part in matching.

use crate::filter::Filter;
use crate::model::{stored_precision, LocalEvent, LocalPerformance, LocalVenue, PerformanceLifecycle};
use chrono::{DateTime, Utc};

pub fn venue_by_code(code: &str) -> Filter<LocalVenue> {
    Filter::all().eq(LocalVenue::CODE, code)
}

pub fn event_by_code(code: &str) -> Filter<LocalEvent> {
    Filter::all().eq(LocalEvent::CODE, code)
}

pub fn performance_by_key(event_code: &str, starts_at: DateTime<Utc>) -> Filter<LocalPerformance> {
    Filter::all()
        .eq(LocalPerformance::EVENT_CODE, event_code)
        .eq(LocalPerformance::STARTS_AT, starts_at)
}

/// Natural key rendered for reference ids, e.g. `E1@2026-08-01T19:30:00+00:00`
pub fn performance_key(event_code: &str, starts_at: DateTime<Utc>) -> String {
    format!("{}@{}", event_code, stored_precision(starts_at).to_rfc3339())
}

/// All performances of an event, any lifecycle
pub fn performances_of_event(event_code: &str) -> Filter<LocalPerformance> {
    Filter::all().eq(LocalPerformance::EVENT_CODE, event_code)
}

/// Active performances of an event whose start is not in `listed_starts`
///
/// These are the candidates for the cancellation sweep.
pub fn active_performances_missing_from(
    event_code: &str,
    listed_starts: &[DateTime<Utc>],
) -> Filter<LocalPerformance> {
    Filter::all()
        .eq(LocalPerformance::EVENT_CODE, event_code)
        .eq(LocalPerformance::LIFECYCLE, PerformanceLifecycle::Active)
        .not_in(LocalPerformance::STARTS_AT, listed_starts.iter().copied())
}

pub fn favourite_events() -> Filter<LocalEvent> {
    Filter::all().eq(LocalEvent::IS_FAVOURITE, true)
}
