//! SQLite-backed store
//!
//! All staged writes share one transaction, opened lazily on the first
//! insert or update and held until `save` (commit) or `discard` (rollback).
//! Fetches run on that transaction while it is open so they see staged rows.

use super::{Schema, Store};
use crate::filter::{Filter, Predicate};
use crate::model::{ColumnType, LocalModel, Row, Value};
use crate::status::EntityKind;
use async_trait::async_trait;
use fest_common::db::{existing_tables, init_database};
use fest_common::{Error, Result};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row as SqlxRow, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

pub struct SqliteStore {
    pool: SqlitePool,
    schema: Schema,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and wrap it
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = init_database(path).await?;
        Self::new(pool).await
    }

    /// Wrap an existing pool; the schema is whatever listing tables exist
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let tables = existing_tables(&pool).await?;
        let schema = Schema::new(
            tables
                .iter()
                .filter_map(|table| EntityKind::from_table_name(table)),
        );
        debug!("SQLite store schema: {:?}", schema.kinds().collect::<Vec<_>>());
        Ok(Self {
            pool,
            schema,
            tx: None,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn ensure_supported(&self, kind: EntityKind) -> Result<()> {
        if self.schema.supports(kind) {
            Ok(())
        } else {
            Err(Error::UnsupportedKind(kind.to_string()))
        }
    }

    async fn transaction(&mut self) -> Result<&mut Transaction<'static, Sqlite>> {
        if self.tx.is_none() {
            self.tx = Some(self.pool.begin().await?);
            debug!("Opened write transaction");
        }
        self.tx
            .as_mut()
            .ok_or_else(|| Error::Internal("write transaction not open".to_string()))
    }
}

fn column_list<L: LocalModel>() -> String {
    L::COLUMNS
        .iter()
        .map(|column| column.name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Render predicates as a `WHERE` clause plus its bind values
///
/// `Eq(col, Null)` renders as `IS NULL`. `NotIn` also admits NULL so that it
/// agrees with in-memory evaluation; an empty list adds no clause.
fn where_clause(predicates: &[Predicate]) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    for predicate in predicates {
        match predicate {
            Predicate::Eq {
                column,
                value: Value::Null,
            } => clauses.push(format!("{} IS NULL", column)),
            Predicate::Eq { column, value } => {
                clauses.push(format!("{} = ?", column));
                binds.push(value.clone());
            }
            Predicate::NotIn { values, .. } if values.is_empty() => {}
            Predicate::NotIn { column, values } => {
                clauses.push(format!(
                    "({col} IS NULL OR {col} NOT IN ({}))",
                    placeholders(values.len()),
                    col = column
                ));
                binds.extend(values.iter().cloned());
            }
        }
    }

    if clauses.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), binds)
    }
}

fn bind_value(query: SqliteQuery<'_>, value: Value) -> SqliteQuery<'_> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Text(text) => query.bind(text),
        Value::Integer(number) => query.bind(number),
        Value::Real(number) => query.bind(number),
        Value::Bool(flag) => query.bind(flag),
    }
}

fn bind_all(mut query: SqliteQuery<'_>, values: Vec<Value>) -> SqliteQuery<'_> {
    for value in values {
        query = bind_value(query, value);
    }
    query
}

fn read_row<L: LocalModel>(row: &SqliteRow) -> Result<L> {
    let mut values: Row = Vec::with_capacity(L::COLUMNS.len());
    for (index, column) in L::COLUMNS.iter().enumerate() {
        let value = match column.ty {
            ColumnType::Text => row.try_get::<Option<String>, _>(index)?.into(),
            ColumnType::Integer => row.try_get::<Option<i64>, _>(index)?.into(),
            ColumnType::Real => row.try_get::<Option<f64>, _>(index)?.into(),
            ColumnType::Bool => row.try_get::<Option<bool>, _>(index)?.into(),
        };
        values.push(value);
    }
    L::from_row(values)
}

#[async_trait]
impl Store for SqliteStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn fetch<L: LocalModel>(&mut self, filter: &Filter<L>) -> Result<Vec<L>> {
        self.ensure_supported(L::KIND)?;
        let (clause, binds) = where_clause(filter.predicates());
        let sql = format!(
            "SELECT {} FROM {}{}",
            column_list::<L>(),
            L::KIND.table_name(),
            clause
        );
        let query = bind_all(sqlx::query(&sql), binds);

        let rows = match self.tx.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await?,
            None => query.fetch_all(&self.pool).await?,
        };

        rows.iter().map(read_row::<L>).collect()
    }

    async fn insert<L: LocalModel>(&mut self, record: &L) -> Result<()> {
        self.ensure_supported(L::KIND)?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            L::KIND.table_name(),
            column_list::<L>(),
            placeholders(L::COLUMNS.len())
        );
        let query = bind_all(sqlx::query(&sql), record.to_row());

        let tx = self.transaction().await?;
        query.execute(&mut **tx).await?;
        Ok(())
    }

    async fn update<L: LocalModel>(&mut self, record: &L) -> Result<()> {
        self.ensure_supported(L::KIND)?;
        // COLUMNS[0] is always guid
        let assignments = L::COLUMNS[1..]
            .iter()
            .map(|column| format!("{} = ?", column.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE guid = ?",
            L::KIND.table_name(),
            assignments
        );

        let mut values = record.to_row();
        let guid = values.remove(0);
        values.push(guid);
        let query = bind_all(sqlx::query(&sql), values);

        let tx = self.transaction().await?;
        let result = query.execute(&mut **tx).await?;
        if result.rows_affected() != 1 {
            return Err(Error::Internal(format!(
                "{} {} is not in the store",
                L::KIND,
                record.guid()
            )));
        }
        Ok(())
    }

    async fn is_managed<L: LocalModel>(&mut self, guid: Uuid) -> Result<bool> {
        self.ensure_supported(L::KIND)?;
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE guid = ?",
            L::KIND.table_name()
        );
        let query = sqlx::query_scalar::<_, i64>(&sql).bind(guid.to_string());

        let count = match self.tx.as_mut() {
            Some(tx) => query.fetch_one(&mut **tx).await?,
            None => query.fetch_one(&self.pool).await?,
        };
        Ok(count == 1)
    }

    async fn save(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
            info!("Committed staged listing changes");
        }
        Ok(())
    }

    async fn discard(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
            info!("Discarded staged listing changes");
        }
        Ok(())
    }

    fn has_changes(&self) -> bool {
        self.tx.is_some()
    }
}
