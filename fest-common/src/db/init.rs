//! Database initialization
//!
//! Opens (or creates) the local listing database and makes sure the
//! venue/event/performance tables exist. Safe to call on every start.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Busy timeout applied to every connection
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Table holding local venues
pub const VENUES_TABLE: &str = "venues";
/// Table holding local events
pub const EVENTS_TABLE: &str = "events";
/// Table holding local performances
pub const PERFORMANCES_TABLE: &str = "performances";

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Per-connection pragmas; foreign_keys is not persisted in the file
                sqlx::query("PRAGMA foreign_keys = ON")
                    .execute(&mut *conn)
                    .await?;
                sqlx::query(&format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets readers browse while an import transaction is open
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    create_listing_tables(&pool).await?;

    Ok(pool)
}

/// Create venue, event and performance tables (idempotent)
pub async fn create_listing_tables(pool: &SqlitePool) -> Result<()> {
    create_venues_table(pool).await?;
    create_events_table(pool).await?;
    create_performances_table(pool).await?;
    Ok(())
}

async fn create_venues_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venues (
            guid TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            address TEXT,
            city TEXT,
            latitude REAL,
            longitude REAL,
            website TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            guid TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            teaser TEXT,
            description TEXT,
            category TEXT,
            image_url TEXT,
            ticket_url TEXT,
            age_restriction TEXT,
            venue_id TEXT NOT NULL REFERENCES venues(guid),
            is_favourite INTEGER NOT NULL DEFAULT 0,
            favourited_at INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_venue ON events(venue_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_performances_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performances (
            guid TEXT PRIMARY KEY,
            event_code TEXT NOT NULL,
            starts_at INTEGER NOT NULL,
            ends_at INTEGER,
            listing_status TEXT NOT NULL,
            ticket_url TEXT,
            price_info TEXT,
            event_id TEXT NOT NULL REFERENCES events(guid),
            lifecycle TEXT NOT NULL DEFAULT 'active',
            UNIQUE (event_code, starts_at),
            CHECK (lifecycle IN ('active', 'cancelled'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_performances_event ON performances(event_code, lifecycle)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Names of user tables currently present in the database
pub async fn existing_tables(pool: &SqlitePool) -> Result<Vec<String>> {
    let tables = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(tables)
}
