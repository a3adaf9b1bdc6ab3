//! Remote snapshot builders

use chrono::{DateTime, Duration, TimeZone, Utc};
use fest_sync::{RemoteEvent, RemotePerformance, RemoteVenue};

/// 2026-08-01 at `hour`:00 UTC
pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, hour, 0, 0).unwrap()
}

pub fn venue(code: &str, name: &str) -> RemoteVenue {
    RemoteVenue {
        city: Some("Edinburgh".to_string()),
        ..RemoteVenue::new(code, name)
    }
}

/// Event at venue V1 "Hall A" with one performance per listed hour
pub fn event(code: &str, hours: &[u32]) -> RemoteEvent {
    event_at_venue(code, venue("V1", "Hall A"), hours)
}

pub fn event_at_venue(code: &str, venue: RemoteVenue, hours: &[u32]) -> RemoteEvent {
    hours.iter().fold(
        RemoteEvent::new(code, format!("Show {}", code), venue),
        |event, hour| event.with_performance_at(at(*hour)),
    )
}

/// Event E1 with one performance whose times carry sub-millisecond digits
pub fn event_with_fine_times() -> RemoteEvent {
    let starts_at = Utc.with_ymd_and_hms(2026, 8, 1, 19, 30, 0).unwrap()
        + Duration::nanoseconds(123_456_000);
    let ends_at = Utc.with_ymd_and_hms(2026, 8, 1, 21, 15, 0).unwrap()
        + Duration::nanoseconds(987_654_321);
    let mut event = RemoteEvent::new("E1", "Show E1", venue("V1", "Hall A"));
    event.performances.push(RemotePerformance {
        ends_at: Some(ends_at),
        ..RemotePerformance::new("E1", starts_at)
    });
    event
}
