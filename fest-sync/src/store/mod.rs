//! Mutable local store
//!
//! A store stages inserts and updates in a working context and persists
//! them only on [`Store::save`]. Fetches see staged changes. There is one
//! SQLite-backed implementation and one in-memory implementation used by
//! tests and dry runs.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::filter::Filter;
use crate::model::LocalModel;
use crate::status::EntityKind;
use async_trait::async_trait;
use fest_common::Result;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Entity kinds a store can hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    kinds: BTreeSet<EntityKind>,
}

impl Schema {
    pub fn new(kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Venue, event and performance
    pub fn listings() -> Self {
        Self::new(EntityKind::ALL)
    }

    pub fn supports(&self, kind: EntityKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.kinds.iter().copied()
    }
}

/// Transactional record store
///
/// Not object-safe; the engine is generic over it.
#[async_trait]
pub trait Store: Send {
    fn schema(&self) -> &Schema;

    /// Records of `L` matching `filter`, staged changes included
    async fn fetch<L: LocalModel>(&mut self, filter: &Filter<L>) -> Result<Vec<L>>;

    /// Stage a new record
    async fn insert<L: LocalModel>(&mut self, record: &L) -> Result<()>;

    /// Stage new field values for an existing record, keyed by guid
    async fn update<L: LocalModel>(&mut self, record: &L) -> Result<()>;

    /// Whether a record with this guid is visible in the working context
    async fn is_managed<L: LocalModel>(&mut self, guid: Uuid) -> Result<bool>;

    /// Persist every staged change atomically
    async fn save(&mut self) -> Result<()>;

    /// Drop every staged change
    async fn discard(&mut self) -> Result<()>;

    fn has_changes(&self) -> bool;
}
