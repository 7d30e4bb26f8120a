//! Pascal VOC encoder: one XML document per image.
//!
//! Only bounding boxes are representable; polygon annotations are skipped.

use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;

use crate::augment::Geometry;
use crate::export::payload::{ExportImage, ExportPayload};
use crate::export::ExportError;

/// Encodes the payload as per-image VOC XML files.
pub fn encode(payload: &ExportPayload) -> Result<Vec<(String, String)>, ExportError> {
    let mut files = Vec::with_capacity(payload.images.len());

    for image in &payload.images {
        let stem = Path::new(&image.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let content = build_document(payload, image)?;
        files.push((format!("{}.xml", stem), content));
    }

    Ok(files)
}

fn build_document(payload: &ExportPayload, image: &ExportImage) -> Result<String, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    writer.write_event(Event::Start(BytesStart::new("annotation")))?;

    write_text(&mut writer, "folder", "images")?;
    write_text(&mut writer, "filename", &image.name)?;

    writer.write_event(Event::Start(BytesStart::new("size")))?;
    write_text(&mut writer, "width", &image.width.to_string())?;
    write_text(&mut writer, "height", &image.height.to_string())?;
    write_text(&mut writer, "depth", "3")?;
    writer.write_event(Event::End(BytesEnd::new("size")))?;

    write_text(&mut writer, "segmented", "0")?;

    for annotation in payload.annotations.iter().filter(|a| a.image_id == image.id) {
        match &annotation.geometry {
            Geometry::Bbox { bbox } => {
                let [x, y, w, h] = *bbox;
                writer.write_event(Event::Start(BytesStart::new("object")))?;
                write_text(&mut writer, "name", &annotation.class_name)?;
                write_text(&mut writer, "pose", "Unspecified")?;
                write_text(&mut writer, "truncated", "0")?;
                write_text(&mut writer, "difficult", "0")?;

                writer.write_event(Event::Start(BytesStart::new("bndbox")))?;
                write_text(&mut writer, "xmin", &(x.round() as i64).to_string())?;
                write_text(&mut writer, "ymin", &(y.round() as i64).to_string())?;
                write_text(&mut writer, "xmax", &((x + w).round() as i64).to_string())?;
                write_text(&mut writer, "ymax", &((y + h).round() as i64).to_string())?;
                writer.write_event(Event::End(BytesEnd::new("bndbox")))?;

                writer.write_event(Event::End(BytesEnd::new("object")))?;
            }
            Geometry::Polygon { .. } => {
                debug!(
                    image = %image.name,
                    class = %annotation.class_name,
                    "Skipping polygon annotation, Pascal VOC supports bounding boxes only"
                );
            }
        }
    }

    writer.write_event(Event::End(BytesEnd::new("annotation")))?;

    let bytes = writer.into_inner();
    String::from_utf8(bytes)
        .map_err(|e| ExportError::Filesystem(format!("VOC document is not UTF-8: {}", e)))
}

fn write_text<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
