//! Remote entities as decoded from the listing service
//!
//! These are immutable snapshot values. Field trimming and enum normalization
//! already happened in the decoder; the engine takes them as given.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteVenue {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub website: Option<String>,
}

impl RemoteVenue {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            address: None,
            city: None,
            latitude: None,
            longitude: None,
            website: None,
        }
    }
}

/// Listing status as published by the service
///
/// Independent of the local performance lifecycle: a performance can be
/// listed as `Cancelled` and still be locally `Active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Scheduled,
    Postponed,
    SoldOut,
    Cancelled,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Scheduled => "scheduled",
            ListingStatus::Postponed => "postponed",
            ListingStatus::SoldOut => "sold_out",
            ListingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(ListingStatus::Scheduled),
            "postponed" => Ok(ListingStatus::Postponed),
            "sold_out" => Ok(ListingStatus::SoldOut),
            "cancelled" => Ok(ListingStatus::Cancelled),
            other => Err(format!("unknown listing status '{}'", other)),
        }
    }
}

/// One scheduled showing of an event
///
/// Performances have no service-assigned id; `(event_code, starts_at)` is
/// their identity. Nested performances in the wire format may omit
/// `event_code`; [`RemoteEvent::adopt_performances`] fills it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePerformance {
    #[serde(default)]
    pub event_code: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub listing_status: ListingStatus,
    pub ticket_url: Option<String>,
    pub price_info: Option<String>,
}

impl RemotePerformance {
    pub fn new(event_code: impl Into<String>, starts_at: DateTime<Utc>) -> Self {
        Self {
            event_code: event_code.into(),
            starts_at,
            ends_at: None,
            listing_status: ListingStatus::Scheduled,
            ticket_url: None,
            price_info: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub code: String,
    pub title: String,
    pub teaser: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub ticket_url: Option<String>,
    pub age_restriction: Option<String>,
    pub venue: RemoteVenue,
    #[serde(default)]
    pub performances: Vec<RemotePerformance>,
}

impl RemoteEvent {
    pub fn new(code: impl Into<String>, title: impl Into<String>, venue: RemoteVenue) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            teaser: None,
            description: None,
            category: None,
            image_url: None,
            ticket_url: None,
            age_restriction: None,
            venue,
            performances: Vec::new(),
        }
    }

    /// Add a performance of this event starting at `starts_at`
    pub fn with_performance_at(mut self, starts_at: DateTime<Utc>) -> Self {
        let performance = RemotePerformance::new(self.code.clone(), starts_at);
        self.performances.push(performance);
        self
    }

    /// Stamp this event's code onto every nested performance
    pub fn adopt_performances(mut self) -> Self {
        for performance in &mut self.performances {
            performance.event_code = self.code.clone();
        }
        self
    }

    /// Start times of the listed performances
    pub fn performance_starts(&self) -> Vec<DateTime<Utc>> {
        self.performances.iter().map(|p| p.starts_at).collect()
    }
}
