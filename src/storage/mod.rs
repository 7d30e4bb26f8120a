//! Persistence layer: SQLite client, schema, and migrations.

mod database;
mod migrations;
mod schema;

pub use database::{
    Database, DatabaseError, ImageRecord, ReleaseOptions, ReleaseRecord, TransformationRecord,
    TransformationStatus,
};
pub use migrations::{MigrationError, MigrationRunner};
pub use schema::all_schema_statements;
