use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;
use tracing::info;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[derive(Error, Debug)]
pub enum DbSetupError {
    #[error("Failed to connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Failed to run migrations: {0}")]
    Migration(String),
}

/// Opens `database_url` (a path or `:memory:`) and applies pending migrations.
pub fn establish_connection(database_url: &str) -> Result<SqliteConnection, DbSetupError> {
    let mut connection = SqliteConnection::establish(database_url)?;

    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| DbSetupError::Migration(err.to_string()))?;

    info!(count = applied.len(), "Applied pending migrations");
    Ok(connection)
}
