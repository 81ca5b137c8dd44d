//! Multi-page PDF assembly from corrected page images

use crate::error::ConvertError;
use crate::raster::{ColorDepth, RasterImage};
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Encoded PDF ready for storage
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Builds one PDF page per image, in sequence order
pub struct DocumentAssembler {
    jpeg_quality: u8,
}

impl DocumentAssembler {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Every page is converted to RGB and placed full-bleed on a page sized
    /// to its pixel dimensions at 72 dpi.
    pub fn assemble(&self, pages: &[RasterImage]) -> Result<Artifact, ConvertError> {
        if pages.is_empty() {
            return Err(ConvertError::EmptyResult);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

        for (index, page) in pages.iter().enumerate() {
            if page.color_depth() == ColorDepth::Grayscale {
                tracing::debug!("Page {} is grayscale, embedding as RGB", index + 1);
            }
            let rgb = page.image().to_rgb8();
            let (width, height) = rgb.dimensions();

            let mut jpeg = Vec::new();
            JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality)
                .encode_image(&rgb)
                .map_err(|e| {
                    ConvertError::Assembly(format!("Failed to encode page {}: {}", index + 1, e))
                })?;

            let image_stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8_i64,
                    "Filter" => "DCTDecode",
                },
                jpeg,
            )
            .with_compression(false);
            let image_id = doc.add_object(image_stream);

            let (w, h) = (width as f32, height as f32);
            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            w.into(),
                            0_i64.into(),
                            0_i64.into(),
                            h.into(),
                            0_i64.into(),
                            0_i64.into(),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let encoded = content.encode().map_err(|e| {
                ConvertError::Assembly(format!("Failed to encode page {}: {}", index + 1, e))
            })?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0_i64.into(), 0_i64.into(), w.into(), h.into()],
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Im0" => image_id,
                    },
                },
                "Contents" => content_id,
            });
            kids.push(page_id.into());

            tracing::debug!("Added page {} ({}x{})", index + 1, width, height);
        }

        let page_count = kids.len();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| ConvertError::Assembly(format!("Failed to write PDF: {}", e)))?;

        tracing::info!("Assembled {} page PDF ({} bytes)", page_count, bytes.len());

        Ok(Artifact { bytes, page_count })
    }
}
