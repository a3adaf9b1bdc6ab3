//! Local (store-resident) records

use super::remote::ListingStatus;
use super::value::{Column, ColumnType, Row, RowReader, Value};
use super::LocalModel;
use crate::status::EntityKind;
use chrono::{DateTime, Utc};
use fest_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Local lifecycle of a performance
///
/// Only moves Active → Cancelled, when a performance silently drops out of
/// its event's listing. Performances are never deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLifecycle {
    #[default]
    Active,
    Cancelled,
}

impl PerformanceLifecycle {
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceLifecycle::Active => "active",
            PerformanceLifecycle::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PerformanceLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceLifecycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(PerformanceLifecycle::Active),
            "cancelled" => Ok(PerformanceLifecycle::Cancelled),
            other => Err(format!("unknown performance lifecycle '{}'", other)),
        }
    }
}

impl From<PerformanceLifecycle> for Value {
    fn from(value: PerformanceLifecycle) -> Self {
        Value::Text(value.as_str().to_string())
    }
}

impl From<ListingStatus> for Value {
    fn from(value: ListingStatus) -> Self {
        Value::Text(value.as_str().to_string())
    }
}

fn parse_text<T>(kind: EntityKind, column: &str, text: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    text.parse()
        .map_err(|e| Error::Decode(format!("{}.{}: {}", kind, column, e)))
}

// ============================================================================
// Venue
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVenue {
    pub guid: Uuid,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub website: Option<String>,
}

impl LocalVenue {
    pub const CODE: &'static str = "code";
}

impl LocalModel for LocalVenue {
    const KIND: EntityKind = EntityKind::Venue;
    const COLUMNS: &'static [Column] = &[
        Column::new("guid", ColumnType::Text),
        Column::new("code", ColumnType::Text),
        Column::new("name", ColumnType::Text),
        Column::new("address", ColumnType::Text),
        Column::new("city", ColumnType::Text),
        Column::new("latitude", ColumnType::Real),
        Column::new("longitude", ColumnType::Real),
        Column::new("website", ColumnType::Text),
    ];

    fn guid(&self) -> Uuid {
        self.guid
    }

    fn to_row(&self) -> Row {
        vec![
            self.guid.into(),
            (&self.code).into(),
            (&self.name).into(),
            self.address.as_ref().into(),
            self.city.as_ref().into(),
            self.latitude.into(),
            self.longitude.into(),
            self.website.as_ref().into(),
        ]
    }

    fn from_row(row: Row) -> Result<Self> {
        let mut r = RowReader::new(Self::KIND, Self::COLUMNS, row)?;
        Ok(Self {
            guid: r.uuid()?,
            code: r.text()?,
            name: r.text()?,
            address: r.opt_text()?,
            city: r.opt_text()?,
            latitude: r.opt_real()?,
            longitude: r.opt_real()?,
            website: r.opt_text()?,
        })
    }
}

// ============================================================================
// Event
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LocalEvent {
    pub guid: Uuid,
    pub code: String,
    pub title: String,
    pub teaser: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub ticket_url: Option<String>,
    pub age_restriction: Option<String>,
    /// Owning venue
    pub venue_id: Uuid,
    /// Local-only
    pub is_favourite: bool,
    /// Local-only
    pub favourited_at: Option<DateTime<Utc>>,
}

impl LocalEvent {
    pub const CODE: &'static str = "code";
    pub const IS_FAVOURITE: &'static str = "is_favourite";
}

impl LocalModel for LocalEvent {
    const KIND: EntityKind = EntityKind::Event;
    const COLUMNS: &'static [Column] = &[
        Column::new("guid", ColumnType::Text),
        Column::new("code", ColumnType::Text),
        Column::new("title", ColumnType::Text),
        Column::new("teaser", ColumnType::Text),
        Column::new("description", ColumnType::Text),
        Column::new("category", ColumnType::Text),
        Column::new("image_url", ColumnType::Text),
        Column::new("ticket_url", ColumnType::Text),
        Column::new("age_restriction", ColumnType::Text),
        Column::new("venue_id", ColumnType::Text),
        Column::new("is_favourite", ColumnType::Bool),
        Column::new("favourited_at", ColumnType::Integer),
    ];

    fn guid(&self) -> Uuid {
        self.guid
    }

    fn to_row(&self) -> Row {
        vec![
            self.guid.into(),
            (&self.code).into(),
            (&self.title).into(),
            self.teaser.as_ref().into(),
            self.description.as_ref().into(),
            self.category.as_ref().into(),
            self.image_url.as_ref().into(),
            self.ticket_url.as_ref().into(),
            self.age_restriction.as_ref().into(),
            self.venue_id.into(),
            self.is_favourite.into(),
            self.favourited_at.into(),
        ]
    }

    fn from_row(row: Row) -> Result<Self> {
        let mut r = RowReader::new(Self::KIND, Self::COLUMNS, row)?;
        Ok(Self {
            guid: r.uuid()?,
            code: r.text()?,
            title: r.text()?,
            teaser: r.opt_text()?,
            description: r.opt_text()?,
            category: r.opt_text()?,
            image_url: r.opt_text()?,
            ticket_url: r.opt_text()?,
            age_restriction: r.opt_text()?,
            venue_id: r.uuid()?,
            is_favourite: r.bool()?,
            favourited_at: r.opt_timestamp()?,
        })
    }
}

// ============================================================================
// Performance
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LocalPerformance {
    pub guid: Uuid,
    /// Owning event's natural key, kept so (event_code, starts_at) is queryable
    pub event_code: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub listing_status: ListingStatus,
    pub ticket_url: Option<String>,
    pub price_info: Option<String>,
    /// Owning event
    pub event_id: Uuid,
    /// Local-only
    pub lifecycle: PerformanceLifecycle,
}

impl LocalPerformance {
    pub const EVENT_CODE: &'static str = "event_code";
    pub const STARTS_AT: &'static str = "starts_at";
    pub const LIFECYCLE: &'static str = "lifecycle";

    pub fn is_active(&self) -> bool {
        self.lifecycle == PerformanceLifecycle::Active
    }
}

impl LocalModel for LocalPerformance {
    const KIND: EntityKind = EntityKind::Performance;
    const COLUMNS: &'static [Column] = &[
        Column::new("guid", ColumnType::Text),
        Column::new("event_code", ColumnType::Text),
        Column::new("starts_at", ColumnType::Integer),
        Column::new("ends_at", ColumnType::Integer),
        Column::new("listing_status", ColumnType::Text),
        Column::new("ticket_url", ColumnType::Text),
        Column::new("price_info", ColumnType::Text),
        Column::new("event_id", ColumnType::Text),
        Column::new("lifecycle", ColumnType::Text),
    ];

    fn guid(&self) -> Uuid {
        self.guid
    }

    fn to_row(&self) -> Row {
        vec![
            self.guid.into(),
            (&self.event_code).into(),
            self.starts_at.into(),
            self.ends_at.into(),
            self.listing_status.into(),
            self.ticket_url.as_ref().into(),
            self.price_info.as_ref().into(),
            self.event_id.into(),
            self.lifecycle.into(),
        ]
    }

    fn from_row(row: Row) -> Result<Self> {
        let mut r = RowReader::new(Self::KIND, Self::COLUMNS, row)?;
        Ok(Self {
            guid: r.uuid()?,
            event_code: r.text()?,
            starts_at: r.timestamp()?,
            ends_at: r.opt_timestamp()?,
            listing_status: parse_text(Self::KIND, "listing_status", &r.text()?)?,
            ticket_url: r.opt_text()?,
            price_info: r.opt_text()?,
            event_id: r.uuid()?,
            lifecycle: parse_text(Self::KIND, "lifecycle", &r.text()?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_performance_row_keeps_millisecond_start() {
        let performance = LocalPerformance {
            guid: Uuid::new_v4(),
            event_code: "E1".to_string(),
            starts_at: Utc.with_ymd_and_hms(2026, 8, 1, 19, 30, 0).unwrap(),
            ends_at: None,
            listing_status: ListingStatus::SoldOut,
            ticket_url: None,
            price_info: Some("£12".to_string()),
            event_id: Uuid::new_v4(),
            lifecycle: PerformanceLifecycle::Cancelled,
        };

        let row = performance.to_row();
        assert_eq!(row[2], Value::Integer(performance.starts_at.timestamp_millis()));
        assert_eq!(row[8], Value::Text("cancelled".to_string()));
        assert_eq!(LocalPerformance::from_row(row).unwrap(), performance);
    }

    #[test]
    fn test_unknown_lifecycle_is_decode_error() {
        let mut row = LocalPerformance {
            guid: Uuid::new_v4(),
            event_code: "E1".to_string(),
            starts_at: Utc::now(),
            ends_at: None,
            listing_status: ListingStatus::Scheduled,
            ticket_url: None,
            price_info: None,
            event_id: Uuid::new_v4(),
            lifecycle: PerformanceLifecycle::Active,
        }
        .to_row();
        row[8] = Value::Text("deleted".to_string());

        let err = LocalPerformance::from_row(row).unwrap_err();
        assert!(err.to_string().contains("Performance.lifecycle"), "got: {}", err);
    }

    #[test]
    fn test_column_index_lookup() {
        assert_eq!(LocalEvent::column_index(LocalEvent::IS_FAVOURITE), Some(10));
        assert_eq!(LocalVenue::column_index("missing"), None);
    }
}
