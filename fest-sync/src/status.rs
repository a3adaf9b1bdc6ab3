//! Upsert outcomes and per-batch summaries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three synchronized entity kinds, in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Venue,
    Event,
    Performance,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Venue, EntityKind::Event, EntityKind::Performance];

    /// Backing table name
    pub const fn table_name(self) -> &'static str {
        match self {
            EntityKind::Venue => fest_common::db::VENUES_TABLE,
            EntityKind::Event => fest_common::db::EVENTS_TABLE,
            EntityKind::Performance => fest_common::db::PERFORMANCES_TABLE,
        }
    }

    pub fn from_table_name(table: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.table_name() == table)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Venue => "Venue",
            EntityKind::Event => "Event",
            EntityKind::Performance => "Performance",
        };
        f.write_str(name)
    }
}

/// Human-readable `<Kind>-<naturalKey>` label
///
/// Only used for logs and status reporting, never for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceId {
    pub kind: EntityKind,
    pub key: String,
}

impl ReferenceId {
    pub fn new(kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.key)
    }
}

/// Result of reconciling one remote entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertStatus {
    /// Local record already matched the remote one; nothing was written
    NoChange,
    Inserted(ReferenceId),
    Updated(ReferenceId),
}

impl UpsertStatus {
    pub fn is_no_change(&self) -> bool {
        matches!(self, UpsertStatus::NoChange)
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, UpsertStatus::Inserted(_))
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, UpsertStatus::Updated(_))
    }

    pub fn reference(&self) -> Option<&ReferenceId> {
        match self {
            UpsertStatus::NoChange => None,
            UpsertStatus::Inserted(reference) | UpsertStatus::Updated(reference) => Some(reference),
        }
    }

    pub fn kind(&self) -> Option<EntityKind> {
        self.reference().map(|reference| reference.kind)
    }
}

impl fmt::Display for UpsertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertStatus::NoChange => f.write_str("no change"),
            UpsertStatus::Inserted(reference) => write!(f, "inserted {}", reference),
            UpsertStatus::Updated(reference) => write!(f, "updated {}", reference),
        }
    }
}

/// Counts of a batch's statuses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub inserted: BTreeMap<EntityKind, usize>,
    pub updated: BTreeMap<EntityKind, usize>,
    pub unchanged: usize,
}

impl ImportSummary {
    pub fn from_statuses(statuses: &[UpsertStatus]) -> Self {
        let mut summary = Self::default();
        for status in statuses {
            match status {
                UpsertStatus::NoChange => summary.unchanged += 1,
                UpsertStatus::Inserted(reference) => {
                    *summary.inserted.entry(reference.kind).or_default() += 1;
                }
                UpsertStatus::Updated(reference) => {
                    *summary.updated.entry(reference.kind).or_default() += 1;
                }
            }
        }
        summary
    }

    pub fn total_inserted(&self) -> usize {
        self.inserted.values().sum()
    }

    pub fn total_updated(&self) -> usize {
        self.updated.values().sum()
    }

    /// True when the batch did not change the store
    pub fn is_unchanged(&self) -> bool {
        self.total_inserted() == 0 && self.total_updated() == 0
    }
}

fn write_counts(f: &mut fmt::Formatter<'_>, counts: &BTreeMap<EntityKind, usize>) -> fmt::Result {
    let total: usize = counts.values().sum();
    write!(f, "{}", total)?;
    if total > 0 {
        let parts: Vec<String> = counts
            .iter()
            .map(|(kind, count)| format!("{} {}", kind, count))
            .collect();
        write!(f, " ({})", parts.join(", "))?;
    }
    Ok(())
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("inserted ")?;
        write_counts(f, &self.inserted)?;
        f.write_str(", updated ")?;
        write_counts(f, &self.updated)?;
        write!(f, ", unchanged {}", self.unchanged)
    }
}
