//! SQLite schema definitions.
//!
//! All statements use IF NOT EXISTS so the migration runner stays
//! idempotent.

/// Releases: one row per generation attempt.
pub const CREATE_RELEASES: &str = r#"
CREATE TABLE IF NOT EXISTS releases (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    export_format TEXT NOT NULL,
    task_type TEXT NOT NULL,
    dataset_ids TEXT NOT NULL,
    options TEXT NOT NULL,
    total_original_images INTEGER,
    total_augmented_images INTEGER,
    final_image_count INTEGER,
    output_path TEXT,
    created_at TEXT NOT NULL
)
"#;

/// Index for per-project history queries.
pub const CREATE_RELEASES_PROJECT_IDX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_releases_project_created
ON releases (project_id, created_at DESC)
"#;

/// Versioned transformation catalog entries.
pub const CREATE_TRANSFORMATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS image_transformations (
    id TEXT PRIMARY KEY,
    transformation_type TEXT NOT NULL,
    parameters TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    order_index INTEGER NOT NULL DEFAULT 0,
    release_version TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    release_id TEXT
)
"#;

/// Index for catalog loads by version and status.
pub const CREATE_TRANSFORMATIONS_VERSION_IDX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transformations_version_status
ON image_transformations (release_version, status, enabled, order_index)
"#;

/// Dataset image index.
pub const CREATE_IMAGES: &str = r#"
CREATE TABLE IF NOT EXISTS images (
    id TEXT PRIMARY KEY,
    filename TEXT NOT NULL,
    file_path TEXT NOT NULL,
    dataset_id TEXT NOT NULL,
    split_type TEXT NOT NULL DEFAULT 'dataset',
    split_section TEXT NOT NULL DEFAULT 'train',
    width INTEGER,
    height INTEGER
)
"#;

/// Index for dataset image loads.
pub const CREATE_IMAGES_DATASET_IDX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_images_dataset_split
ON images (dataset_id, split_type)
"#;

/// Returns all schema statements in creation order.
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_RELEASES,
        CREATE_RELEASES_PROJECT_IDX,
        CREATE_TRANSFORMATIONS,
        CREATE_TRANSFORMATIONS_VERSION_IDX,
        CREATE_IMAGES,
        CREATE_IMAGES_DATASET_IDX,
    ]
}
