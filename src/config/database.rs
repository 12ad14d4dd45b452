//! Database configuration module for formgate.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! It provides functions for establishing database connections and creating all necessary tables
//! based on the entity definitions. The module uses `SeaORM`'s `Schema::create_table_from_entity`
//! method to automatically generate SQL statements from the entity models, ensuring that the
//! database schema matches the Rust struct definitions without requiring manual SQL. The
//! store-level uniqueness constraints (`secret_value`, `token`, `name`, `category`) come from
//! the `#[sea_orm(unique)]` attributes on the entities, so they hold even if a process crashes
//! mid-operation.

use crate::entities::{AccessKey, Group, SequenceCounter, Submission};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the `SQLite` database at the given URL.
///
/// This function handles connection errors and provides a clean interface for database access
/// throughout the application.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// This function uses the `DeriveEntityModel` macros to automatically generate proper SQL
/// statements for table creation, ensuring the database schema matches the Rust struct definitions.
/// It creates tables for groups, access keys, sequence counters, and submissions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let group_table = schema.create_table_from_entity(Group);
    let access_key_table = schema.create_table_from_entity(AccessKey);
    let sequence_counter_table = schema.create_table_from_entity(SequenceCounter);
    let submission_table = schema.create_table_from_entity(Submission);

    db.execute(builder.build(&group_table)).await?;
    db.execute(builder.build(&access_key_table)).await?;
    db.execute(builder.build(&sequence_counter_table)).await?;
    db.execute(builder.build(&submission_table)).await?;

    Ok(())
}
