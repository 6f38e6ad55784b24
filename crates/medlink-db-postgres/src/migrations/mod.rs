//! Schema migrations compiled into the binary.
//!
//! Applied versions are recorded in `_sqlx_migrations`; re-running is a no-op.

use std::borrow::Cow;

use sqlx_core::migrate::{Migration, MigrationType, Migrator};
use sqlx_postgres::PgPool;
use tracing::{info, instrument};

use crate::error::{PostgresError, Result};

/// A migration script shipped with the crate.
struct Script {
    version: i64,
    description: &'static str,
    sql: &'static str,
}

/// Append new scripts at the end; versions must keep increasing.
const SCRIPTS: &[Script] = &[Script {
    version: 20250301000001,
    description: "patients",
    sql: include_str!("../../migrations/20250301000001_patients.sql"),
}];

/// Migrator over the embedded scripts, checksummed so an edited script that
/// was already applied is reported instead of skipped.
pub fn migrator() -> Migrator {
    let migrations = SCRIPTS
        .iter()
        .map(|script| {
            Migration::new(
                script.version,
                Cow::Borrowed(script.description),
                MigrationType::Simple,
                Cow::Borrowed(script.sql),
                false,
            )
        })
        .collect::<Vec<_>>();

    Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    }
}

/// Applies every embedded migration the database has not seen yet.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> Result<()> {
    let migrator = migrator();
    let latest = migrator.migrations.iter().map(|m| m.version).max();
    info!(count = migrator.migrations.len(), ?latest, "applying schema migrations");

    migrator
        .run(pool)
        .await
        .map_err(|e| PostgresError::Migration(e.to_string()))?;

    info!("schema is up to date");
    Ok(())
}
