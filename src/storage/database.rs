//! SQLite database client for release pipeline persistence.
//!
//! Holds the release records, the versioned transformation catalog, and the
//! dataset image index. All SQL is hand-written against a `sqlx` pool.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::augment::SplitSection;
use crate::export::{FormatChoice, TaskType};

use super::migrations::MigrationRunner;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection to the database failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    /// Record not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value could not be interpreted.
    #[error("Invalid record data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] super::migrations::MigrationError),
}

/// Status of a transformation catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationStatus {
    /// Awaiting application in a release.
    Pending,
    /// Applied and linked to a release.
    Completed,
}

impl TransformationStatus {
    /// Canonical lowercase tag stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformationStatus::Pending => "pending",
            TransformationStatus::Completed => "completed",
        }
    }
}

impl FromStr for TransformationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransformationStatus::Pending),
            "completed" => Ok(TransformationStatus::Completed),
            other => Err(format!("unknown transformation status '{}'", other)),
        }
    }
}

/// Snapshot of the numeric/flag release options persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseOptions {
    /// Augmented variants generated per original image.
    pub images_per_original: u32,
    /// Sampling strategy tag (opaque to the pipeline).
    pub sampling_strategy: String,
    /// Encoding for output images (e.g. "jpg").
    pub output_encoding: String,
    /// Whether originals count toward the final image total.
    pub include_original: bool,
}

/// Persistent record of one release attempt.
#[derive(Debug, Clone)]
pub struct ReleaseRecord {
    /// Globally unique release id.
    pub id: Uuid,
    /// Owning project.
    pub project_id: String,
    /// Release name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Requested or selected export format.
    pub export_format: FormatChoice,
    /// Task the release serves.
    pub task_type: TaskType,
    /// Datasets included in the release.
    pub dataset_ids: Vec<String>,
    /// Option snapshot taken at creation.
    pub options: ReleaseOptions,
    /// Count of source images actually processed.
    pub total_original_images: Option<i64>,
    /// Count of generated variants.
    pub total_augmented_images: Option<i64>,
    /// Final image total (variants plus originals when included).
    pub final_image_count: Option<i64>,
    /// Output location (augmentation root, later the export directory).
    pub output_path: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Catalog entry: one pending, version-scoped transformation definition.
#[derive(Debug, Clone)]
pub struct TransformationRecord {
    /// Unique id.
    pub id: String,
    /// Transformation type tag.
    pub transformation_type: String,
    /// Parameter mapping.
    pub parameters: serde_json::Value,
    /// Only enabled records participate in releases.
    pub enabled: bool,
    /// Application order within the chain.
    pub order_index: i64,
    /// Version tag the record is scoped to.
    pub release_version: String,
    /// Lifecycle status.
    pub status: TransformationStatus,
    /// Release the record was consumed by, once completed.
    pub release_id: Option<Uuid>,
}

/// One image in the dataset index.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Unique id.
    pub id: String,
    /// Original filename.
    pub filename: String,
    /// Stored (possibly relative) image location.
    pub file_path: String,
    /// Owning dataset.
    pub dataset_id: String,
    /// Split type; only "dataset" images are release-eligible.
    pub split_type: String,
    /// Train/val/test partition.
    pub split_section: SplitSection,
    /// Pixel width, if known.
    pub width: Option<i64>,
    /// Pixel height, if known.
    pub height: Option<i64>,
}

/// SQLite database client.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects to the database, creating the file if missing.
    pub async fn connect(database_url: &str) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Creates a new database client from an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs database migrations.
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let runner = MigrationRunner::new(self.pool.clone());
        runner.run_migrations().await?;
        Ok(())
    }

    // =========================================================================
    // Release Operations
    // =========================================================================

    /// Inserts a freshly created release record.
    pub async fn insert_release(&self, record: &ReleaseRecord) -> Result<(), DatabaseError> {
        let dataset_ids = serde_json::to_string(&record.dataset_ids)?;
        let options = serde_json::to_string(&record.options)?;

        sqlx::query(
            r#"
            INSERT INTO releases (
                id, project_id, name, description, export_format, task_type,
                dataset_ids, options, total_original_images, total_augmented_images,
                final_image_count, output_path, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.project_id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.export_format.as_str())
        .bind(record.task_type.as_str())
        .bind(dataset_ids)
        .bind(options)
        .bind(record.total_original_images)
        .bind(record.total_augmented_images)
        .bind(record.final_image_count)
        .bind(&record.output_path)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates the post-augmentation counts and output location.
    pub async fn update_release_counts(
        &self,
        release_id: Uuid,
        total_original: i64,
        total_augmented: i64,
        final_count: i64,
        output_path: &str,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE releases
            SET total_original_images = ?,
                total_augmented_images = ?,
                final_image_count = ?,
                output_path = ?
            WHERE id = ?
            "#,
        )
        .bind(total_original)
        .bind(total_augmented)
        .bind(final_count)
        .bind(output_path)
        .bind(release_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Release {}", release_id)));
        }
        Ok(())
    }

    /// Updates the final export location and the chosen format.
    pub async fn update_release_export(
        &self,
        release_id: Uuid,
        export_path: &str,
        export_format: &str,
        task_type: TaskType,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE releases
            SET output_path = ?, export_format = ?, task_type = ?
            WHERE id = ?
            "#,
        )
        .bind(export_path)
        .bind(export_format)
        .bind(task_type.as_str())
        .bind(release_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Release {}", release_id)));
        }
        Ok(())
    }

    /// Retrieves a release record by id.
    pub async fn get_release(&self, release_id: Uuid) -> Result<Option<ReleaseRecord>, DatabaseError> {
        let row = sqlx::query(
            r#"
            SELECT id, project_id, name, description, export_format, task_type,
                   dataset_ids, options, total_original_images, total_augmented_images,
                   final_image_count, output_path, created_at
            FROM releases
            WHERE id = ?
            "#,
        )
        .bind(release_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(release_from_row).transpose()
    }

    /// Lists a project's releases, most recent first.
    pub async fn list_releases(
        &self,
        project_id: &str,
        limit: i64,
    ) -> Result<Vec<ReleaseRecord>, DatabaseError> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, name, description, export_format, task_type,
                   dataset_ids, options, total_original_images, total_augmented_images,
                   final_image_count, output_path, created_at
            FROM releases
            WHERE project_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(release_from_row).collect()
    }

    // =========================================================================
    // Transformation Catalog Operations
    // =========================================================================

    /// Inserts a transformation catalog entry.
    pub async fn insert_transformation(
        &self,
        record: &TransformationRecord,
    ) -> Result<(), DatabaseError> {
        let parameters = serde_json::to_string(&record.parameters)?;

        sqlx::query(
            r#"
            INSERT INTO image_transformations (
                id, transformation_type, parameters, enabled, order_index,
                release_version, status, release_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.transformation_type)
        .bind(parameters)
        .bind(record.enabled)
        .bind(record.order_index)
        .bind(&record.release_version)
        .bind(record.status.as_str())
        .bind(record.release_id.map(|id| id.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads the enabled, pending catalog entries for a version, ordered by
    /// ordering index ascending.
    pub async fn pending_transformations(
        &self,
        release_version: &str,
    ) -> Result<Vec<TransformationRecord>, DatabaseError> {
        let rows = sqlx::query(
            r#"
            SELECT id, transformation_type, parameters, enabled, order_index,
                   release_version, status, release_id
            FROM image_transformations
            WHERE release_version = ? AND status = 'pending' AND enabled = 1
            ORDER BY order_index ASC
            "#,
        )
        .bind(release_version)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(transformation_from_row).collect()
    }

    /// Marks the given transformations completed and links them to a release.
    pub async fn mark_transformations_completed(
        &self,
        transformation_ids: &[String],
        release_id: Uuid,
    ) -> Result<(), DatabaseError> {
        if transformation_ids.is_empty() {
            return Ok(());
        }

        let placeholders = vec!["?"; transformation_ids.len()].join(", ");
        let query = format!(
            "UPDATE image_transformations SET status = 'completed', release_id = ? WHERE id IN ({})",
            placeholders
        );

        let mut sqlx_query = sqlx::query(&query).bind(release_id.to_string());
        for id in transformation_ids {
            sqlx_query = sqlx_query.bind(id);
        }
        sqlx_query.execute(&self.pool).await?;

        Ok(())
    }

    // =========================================================================
    // Image Index Operations
    // =========================================================================

    /// Inserts an image index entry.
    pub async fn insert_image(&self, record: &ImageRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO images (
                id, filename, file_path, dataset_id, split_type, split_section, width, height
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.filename)
        .bind(&record.file_path)
        .bind(&record.dataset_id)
        .bind(&record.split_type)
        .bind(record.split_section.as_str())
        .bind(record.width)
        .bind(record.height)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads all release-eligible images for the given datasets.
    ///
    /// Restricted to split_type = "dataset"; derived or held-out splits are
    /// excluded.
    pub async fn dataset_images(
        &self,
        dataset_ids: &[String],
    ) -> Result<Vec<ImageRecord>, DatabaseError> {
        if dataset_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; dataset_ids.len()].join(", ");
        let query = format!(
            r#"
            SELECT id, filename, file_path, dataset_id, split_type, split_section, width, height
            FROM images
            WHERE dataset_id IN ({}) AND split_type = 'dataset'
            "#,
            placeholders
        );

        let mut sqlx_query = sqlx::query(&query);
        for id in dataset_ids {
            sqlx_query = sqlx_query.bind(id);
        }
        let rows = sqlx_query.fetch_all(&self.pool).await?;

        rows.into_iter().map(image_from_row).collect()
    }
}

fn release_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ReleaseRecord, DatabaseError> {
    let id: String = row.get("id");
    let export_format: String = row.get("export_format");
    let task_type: String = row.get("task_type");
    let dataset_ids: String = row.get("dataset_ids");
    let options: String = row.get("options");

    Ok(ReleaseRecord {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::InvalidData(e.to_string()))?,
        project_id: row.get("project_id"),
        name: row.get("name"),
        description: row.get("description"),
        export_format: export_format
            .parse()
            .map_err(DatabaseError::InvalidData)?,
        task_type: task_type.parse().map_err(DatabaseError::InvalidData)?,
        dataset_ids: serde_json::from_str(&dataset_ids)?,
        options: serde_json::from_str(&options)?,
        total_original_images: row.get("total_original_images"),
        total_augmented_images: row.get("total_augmented_images"),
        final_image_count: row.get("final_image_count"),
        output_path: row.get("output_path"),
        created_at: row.get("created_at"),
    })
}

fn transformation_from_row(
    row: sqlx::sqlite::SqliteRow,
) -> Result<TransformationRecord, DatabaseError> {
    let parameters: String = row.get("parameters");
    let status: String = row.get("status");
    let release_id: Option<String> = row.get("release_id");

    Ok(TransformationRecord {
        id: row.get("id"),
        transformation_type: row.get("transformation_type"),
        parameters: serde_json::from_str(&parameters)?,
        enabled: row.get("enabled"),
        order_index: row.get("order_index"),
        release_version: row.get("release_version"),
        status: status.parse().map_err(DatabaseError::InvalidData)?,
        release_id: release_id
            .map(|id| Uuid::parse_str(&id))
            .transpose()
            .map_err(|e| DatabaseError::InvalidData(e.to_string()))?,
    })
}

fn image_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ImageRecord, DatabaseError> {
    let split_section: String = row.get("split_section");

    Ok(ImageRecord {
        id: row.get("id"),
        filename: row.get("filename"),
        file_path: row.get("file_path"),
        dataset_id: row.get("dataset_id"),
        split_type: row.get("split_type"),
        split_section: split_section
            .parse()
            .unwrap_or_default(),
        width: row.get("width"),
        height: row.get("height"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportFormat;

    async fn test_database(dir: &tempfile::TempDir) -> Database {
        let url = format!("sqlite://{}/test.db", dir.path().display());
        let db = Database::connect(&url).await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    fn sample_release(project_id: &str) -> ReleaseRecord {
        ReleaseRecord {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            name: "Release v1".to_string(),
            description: "test release".to_string(),
            export_format: FormatChoice::Auto,
            task_type: TaskType::ObjectDetection,
            dataset_ids: vec!["ds-1".to_string(), "ds-2".to_string()],
            options: ReleaseOptions {
                images_per_original: 4,
                sampling_strategy: "intelligent".to_string(),
                output_encoding: "jpg".to_string(),
                include_original: true,
            },
            total_original_images: None,
            total_augmented_images: None,
            final_image_count: None,
            output_path: None,
            created_at: Utc::now(),
        }
    }

    fn sample_transformation(id: &str, version: &str, order_index: i64) -> TransformationRecord {
        TransformationRecord {
            id: id.to_string(),
            transformation_type: "rotate".to_string(),
            parameters: serde_json::json!({"degrees": 15}),
            enabled: true,
            order_index,
            release_version: version.to_string(),
            status: TransformationStatus::Pending,
            release_id: None,
        }
    }

    fn sample_image(id: &str, dataset_id: &str) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            filename: format!("{}.jpg", id),
            file_path: format!("uploads/{}.jpg", id),
            dataset_id: dataset_id.to_string(),
            split_type: "dataset".to_string(),
            split_section: SplitSection::Train,
            width: Some(640),
            height: Some(480),
        }
    }

    #[tokio::test]
    async fn test_release_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_database(&dir).await;

        let record = sample_release("proj-1");
        db.insert_release(&record).await.unwrap();

        let loaded = db.get_release(record.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Release v1");
        assert_eq!(loaded.export_format, FormatChoice::Auto);
        assert_eq!(loaded.dataset_ids, vec!["ds-1", "ds-2"]);
        assert_eq!(loaded.options.images_per_original, 4);
        assert!(loaded.total_original_images.is_none());
    }

    #[tokio::test]
    async fn test_release_update_counts_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_database(&dir).await;

        let record = sample_release("proj-1");
        db.insert_release(&record).await.unwrap();

        db.update_release_counts(record.id, 10, 40, 50, "releases/x")
            .await
            .unwrap();
        db.update_release_export(
            record.id,
            "releases/x/export",
            ExportFormat::Coco.as_str(),
            TaskType::Segmentation,
        )
        .await
        .unwrap();

        let loaded = db.get_release(record.id).await.unwrap().unwrap();
        assert_eq!(loaded.total_original_images, Some(10));
        assert_eq!(loaded.total_augmented_images, Some(40));
        assert_eq!(loaded.final_image_count, Some(50));
        assert_eq!(loaded.output_path.as_deref(), Some("releases/x/export"));
        assert_eq!(
            loaded.export_format,
            FormatChoice::Explicit(ExportFormat::Coco)
        );
        assert_eq!(loaded.task_type, TaskType::Segmentation);
    }

    #[tokio::test]
    async fn test_update_missing_release_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_database(&dir).await;

        let err = db
            .update_release_counts(Uuid::new_v4(), 1, 1, 1, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_releases_ordering_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_database(&dir).await;

        for i in 0..3 {
            let mut record = sample_release("proj-1");
            record.name = format!("release-{}", i);
            record.created_at = Utc::now() + chrono::Duration::seconds(i);
            db.insert_release(&record).await.unwrap();
        }
        let other = sample_release("proj-2");
        db.insert_release(&other).await.unwrap();

        let history = db.list_releases("proj-1", 2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].name, "release-2");
        assert_eq!(history[1].name, "release-1");
    }

    #[tokio::test]
    async fn test_pending_transformations_filter_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_database(&dir).await;

        db.insert_transformation(&sample_transformation("t-2", "v1", 2))
            .await
            .unwrap();
        db.insert_transformation(&sample_transformation("t-1", "v1", 1))
            .await
            .unwrap();

        let mut disabled = sample_transformation("t-3", "v1", 0);
        disabled.enabled = false;
        db.insert_transformation(&disabled).await.unwrap();

        let mut completed = sample_transformation("t-4", "v1", 0);
        completed.status = TransformationStatus::Completed;
        db.insert_transformation(&completed).await.unwrap();

        db.insert_transformation(&sample_transformation("t-5", "v2", 0))
            .await
            .unwrap();

        let pending = db.pending_transformations("v1").await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, "t-1");
        assert_eq!(pending[1].id, "t-2");
    }

    #[tokio::test]
    async fn test_mark_transformations_completed() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_database(&dir).await;

        db.insert_transformation(&sample_transformation("t-1", "v1", 0))
            .await
            .unwrap();
        db.insert_transformation(&sample_transformation("t-2", "v1", 1))
            .await
            .unwrap();

        let release_id = Uuid::new_v4();
        db.mark_transformations_completed(
            &["t-1".to_string(), "t-2".to_string()],
            release_id,
        )
        .await
        .unwrap();

        let pending = db.pending_transformations("v1").await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_dataset_images_split_type_filter() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_database(&dir).await;

        db.insert_image(&sample_image("img-1", "ds-1")).await.unwrap();
        db.insert_image(&sample_image("img-2", "ds-2")).await.unwrap();

        let mut held_out = sample_image("img-3", "ds-1");
        held_out.split_type = "holdout".to_string();
        db.insert_image(&held_out).await.unwrap();

        let images = db
            .dataset_images(&["ds-1".to_string(), "ds-2".to_string()])
            .await
            .unwrap();
        assert_eq!(images.len(), 2);

        let only_ds1 = db.dataset_images(&["ds-1".to_string()]).await.unwrap();
        assert_eq!(only_ds1.len(), 1);
        assert_eq!(only_ds1[0].id, "img-1");

        let none = db.dataset_images(&[]).await.unwrap();
        assert!(none.is_empty());
    }
}
