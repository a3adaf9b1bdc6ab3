//! In-memory store
//!
//! Keeps a committed copy and a working copy of every table. `save` promotes
//! the working copy, `discard` restores the committed one. No uniqueness
//! constraints are enforced, which lets tests stage states SQLite would
//! reject.

use super::{Schema, Store};
use crate::filter::Filter;
use crate::model::{LocalModel, Row};
use crate::status::EntityKind;
use async_trait::async_trait;
use fest_common::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use uuid::Uuid;

type Tables = HashMap<EntityKind, BTreeMap<Uuid, Row>>;

#[derive(Debug, Clone)]
pub struct MemoryStore {
    schema: Schema,
    committed: Tables,
    working: Tables,
    dirty: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Store holding venues, events and performances
    pub fn new() -> Self {
        Self::with_schema(Schema::listings())
    }

    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            committed: Tables::new(),
            working: Tables::new(),
            dirty: false,
        }
    }

    /// Place a record directly in committed state, bypassing staging
    pub fn seed<L: LocalModel>(&mut self, record: &L) {
        for tables in [&mut self.committed, &mut self.working] {
            tables
                .entry(L::KIND)
                .or_default()
                .insert(record.guid(), record.to_row());
        }
    }

    /// Number of `L` records in the working context
    pub fn len<L: LocalModel>(&self) -> usize {
        self.working.get(&L::KIND).map_or(0, BTreeMap::len)
    }

    /// Number of `L` records in committed state
    pub fn committed_len<L: LocalModel>(&self) -> usize {
        self.committed.get(&L::KIND).map_or(0, BTreeMap::len)
    }

    fn ensure_supported(&self, kind: EntityKind) -> Result<()> {
        if self.schema.supports(kind) {
            Ok(())
        } else {
            Err(Error::UnsupportedKind(kind.to_string()))
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Kinds outside the schema simply have no records
    async fn fetch<L: LocalModel>(&mut self, filter: &Filter<L>) -> Result<Vec<L>> {
        let Some(table) = self.working.get(&L::KIND) else {
            return Ok(Vec::new());
        };
        table
            .values()
            .filter(|row| filter.matches_row(row))
            .cloned()
            .map(L::from_row)
            .collect()
    }

    async fn insert<L: LocalModel>(&mut self, record: &L) -> Result<()> {
        self.ensure_supported(L::KIND)?;
        let table = self.working.entry(L::KIND).or_default();
        if table.contains_key(&record.guid()) {
            return Err(Error::Internal(format!(
                "{} {} already exists",
                L::KIND,
                record.guid()
            )));
        }
        table.insert(record.guid(), record.to_row());
        self.dirty = true;
        Ok(())
    }

    async fn update<L: LocalModel>(&mut self, record: &L) -> Result<()> {
        self.ensure_supported(L::KIND)?;
        let Some(row) = self
            .working
            .get_mut(&L::KIND)
            .and_then(|table| table.get_mut(&record.guid()))
        else {
            return Err(Error::Internal(format!(
                "{} {} is not in the store",
                L::KIND,
                record.guid()
            )));
        };
        *row = record.to_row();
        self.dirty = true;
        Ok(())
    }

    async fn is_managed<L: LocalModel>(&mut self, guid: Uuid) -> Result<bool> {
        Ok(self
            .working
            .get(&L::KIND)
            .is_some_and(|table| table.contains_key(&guid)))
    }

    async fn save(&mut self) -> Result<()> {
        if self.dirty {
            self.committed = self.working.clone();
            self.dirty = false;
            debug!("Memory store committed");
        }
        Ok(())
    }

    async fn discard(&mut self) -> Result<()> {
        if self.dirty {
            self.working = self.committed.clone();
            self.dirty = false;
            debug!("Memory store rolled back");
        }
        Ok(())
    }

    fn has_changes(&self) -> bool {
        self.dirty
    }
}
