//! Export artifact writer.
//!
//! Stages encoder output and source-image copies in a release-scoped
//! temporary directory, then relocates everything into the final
//! `<release_root>/<release_id>/export/` location. The staging directory
//! is removed whether the operation succeeds or fails.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;
use walkdir::WalkDir;

use super::formats::{self, EncodeRequest, EncodedArtifacts};
use super::payload::ExportPayload;
use super::types::{ExportFormat, TaskType};
use super::ExportError;

/// Parameters for one export materialization.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// Release this export belongs to.
    pub release_id: Uuid,
    /// Format to encode.
    pub format: ExportFormat,
    /// Bundle source images under `images/`.
    pub include_images: bool,
    /// Dataset name embedded in container formats.
    pub dataset_name: String,
    /// Task the release serves.
    pub task_type: TaskType,
    /// Project type label embedded in container formats.
    pub project_type: String,
}

/// Writes export artifacts for a release.
pub struct ExportArtifactWriter {
    release_root: PathBuf,
}

impl ExportArtifactWriter {
    /// Creates a writer rooted at the release output directory.
    pub fn new(release_root: impl Into<PathBuf>) -> Self {
        Self {
            release_root: release_root.into(),
        }
    }

    /// Final export location for a release.
    pub fn export_dir(&self, release_id: Uuid) -> PathBuf {
        self.release_root
            .join(release_id.to_string())
            .join("export")
    }

    /// Encodes the payload and materializes the export artifacts.
    ///
    /// Returns the final export directory. The temporary staging directory
    /// is cleaned up on every exit path via [`tempfile::TempDir`] drop.
    pub async fn write(
        &self,
        payload: &ExportPayload,
        request: &WriteRequest,
    ) -> Result<PathBuf, ExportError> {
        let staging = tempfile::Builder::new()
            .prefix(&format!("release_{}_", request.release_id))
            .tempdir()?;

        let encode_request = EncodeRequest {
            payload,
            format: request.format,
            include_images: request.include_images,
            dataset_name: request.dataset_name.clone(),
            task_type: request.task_type,
            project_type: request.project_type.clone(),
        };
        let artifacts = formats::encode(&encode_request)?;
        self.stage_artifacts(staging.path(), &artifacts).await?;

        if request.include_images {
            self.stage_images(staging.path(), payload).await?;
        }

        let final_dir = self.export_dir(request.release_id);
        relocate(staging.path(), &final_dir).await?;

        info!(
            release_id = %request.release_id,
            format = %request.format,
            export_dir = %final_dir.display(),
            "Export artifacts written"
        );

        Ok(final_dir)
    }

    /// Writes encoder output into the staging directory.
    async fn stage_artifacts(
        &self,
        staging: &Path,
        artifacts: &EncodedArtifacts,
    ) -> Result<(), ExportError> {
        match artifacts {
            EncodedArtifacts::Files(files) => {
                for (filename, content) in files {
                    fs::write(staging.join(filename), content).await?;
                }
            }
            EncodedArtifacts::Document(document) => {
                let content = serde_json::to_string_pretty(document)?;
                fs::write(staging.join("annotations.json"), content).await?;
            }
        }
        Ok(())
    }

    /// Copies referenced source images into `images/` under staging.
    ///
    /// A source whose path no longer exists is skipped without error.
    async fn stage_images(&self, staging: &Path, payload: &ExportPayload) -> Result<(), ExportError> {
        let images_dir = staging.join("images");
        fs::create_dir_all(&images_dir).await?;

        for image in &payload.images {
            if !image.file_path.exists() {
                debug!(path = %image.file_path.display(), "Source image missing, skipping copy");
                continue;
            }
            fs::copy(&image.file_path, images_dir.join(&image.name)).await?;
        }
        Ok(())
    }
}

/// Moves the contents of `staging` into `dest`, merging with any
/// pre-existing content there.
async fn relocate(staging: &Path, dest: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(dest).await?;

    for entry in WalkDir::new(staging) {
        let entry = entry.map_err(|e| ExportError::Filesystem(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(staging)
            .map_err(|e| ExportError::Filesystem(e.to_string()))?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).await?;
        } else {
            fs::copy(entry.path(), &target).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::Geometry;
    use crate::export::payload::{ExportAnnotation, ExportImage, UnifiedClass};

    fn payload_with_image(image_path: &Path) -> ExportPayload {
        ExportPayload {
            images: vec![ExportImage {
                id: 0,
                name: "frame_0.jpg".to_string(),
                width: 640,
                height: 480,
                file_path: image_path.to_path_buf(),
            }],
            annotations: vec![ExportAnnotation {
                id: 1,
                image_id: 0,
                class_id: 0,
                class_name: "car".to_string(),
                geometry: Geometry::Bbox {
                    bbox: [10.0, 10.0, 50.0, 50.0],
                },
                confidence: 1.0,
            }],
            classes: vec![UnifiedClass::new(0, "car")],
        }
    }

    fn write_request(release_id: Uuid, format: ExportFormat) -> WriteRequest {
        WriteRequest {
            release_id,
            format,
            include_images: true,
            dataset_name: format!("release_{}", release_id),
            task_type: TaskType::ObjectDetection,
            project_type: "general".to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_yolo_artifacts_and_images() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("frame_0.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();

        let writer = ExportArtifactWriter::new(root.path().join("releases"));
        let release_id = Uuid::new_v4();
        let payload = payload_with_image(&source);

        let export_dir = writer
            .write(&payload, &write_request(release_id, ExportFormat::YoloDetection))
            .await
            .unwrap();

        assert_eq!(export_dir, writer.export_dir(release_id));
        assert!(export_dir.join("classes.txt").exists());
        assert!(export_dir.join("frame_0.txt").exists());
        assert!(export_dir.join("images").join("frame_0.jpg").exists());
    }

    #[tokio::test]
    async fn test_write_coco_document() {
        let root = tempfile::tempdir().unwrap();
        let writer = ExportArtifactWriter::new(root.path().join("releases"));
        let release_id = Uuid::new_v4();
        let payload = payload_with_image(&root.path().join("gone.jpg"));

        let export_dir = writer
            .write(&payload, &write_request(release_id, ExportFormat::Coco))
            .await
            .unwrap();

        let content = std::fs::read_to_string(export_dir.join("annotations.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(doc["images"].as_array().unwrap().len(), 1);
        // missing source image is skipped silently
        assert!(!export_dir.join("images").join("frame_0.jpg").exists());
    }

    #[tokio::test]
    async fn test_relocation_merges_with_existing_content() {
        let root = tempfile::tempdir().unwrap();
        let writer = ExportArtifactWriter::new(root.path().join("releases"));
        let release_id = Uuid::new_v4();

        let export_dir = writer.export_dir(release_id);
        std::fs::create_dir_all(&export_dir).unwrap();
        std::fs::write(export_dir.join("preexisting.txt"), b"keep me").unwrap();

        let payload = payload_with_image(&root.path().join("gone.jpg"));
        writer
            .write(&payload, &write_request(release_id, ExportFormat::Csv))
            .await
            .unwrap();

        assert!(export_dir.join("preexisting.txt").exists());
        assert!(export_dir.join("annotations.csv").exists());
    }

    fn staging_leftovers(release_id: Uuid) -> Vec<std::fs::DirEntry> {
        std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with(&format!("release_{}_", release_id))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_staging_removed_when_relocation_fails() {
        let root = tempfile::tempdir().unwrap();
        // A regular file where the release root should be makes the final
        // create_dir_all fail after staging succeeded.
        let release_root = root.path().join("releases");
        std::fs::write(&release_root, b"not a directory").unwrap();

        let writer = ExportArtifactWriter::new(release_root);
        let release_id = Uuid::new_v4();
        let payload = payload_with_image(&root.path().join("gone.jpg"));

        let err = writer
            .write(&payload, &write_request(release_id, ExportFormat::Csv))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
        assert!(staging_leftovers(release_id).is_empty());
    }

    #[tokio::test]
    async fn test_staging_directory_is_removed() {
        let root = tempfile::tempdir().unwrap();
        let writer = ExportArtifactWriter::new(root.path().join("releases"));
        let release_id = Uuid::new_v4();
        let payload = payload_with_image(&root.path().join("gone.jpg"));

        writer
            .write(&payload, &write_request(release_id, ExportFormat::Csv))
            .await
            .unwrap();

        assert!(staging_leftovers(release_id).is_empty());
    }
}
