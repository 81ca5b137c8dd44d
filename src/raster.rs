//! Decoded page images and their orientation metadata

use image::{ColorType, DynamicImage, ImageError};
use std::io::Cursor;

/// Rotation needed to view an image upright, as recorded in EXIF tag 0x0112
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    Rotate180,
    /// Needs a quarter turn clockwise (EXIF 6)
    Rotate90Cw,
    /// Needs a quarter turn counter-clockwise (EXIF 8)
    Rotate90Ccw,
}

impl Orientation {
    /// Map an EXIF orientation value. Mirrored and unknown values yield `None`.
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Normal),
            3 => Some(Self::Rotate180),
            6 => Some(Self::Rotate90Cw),
            8 => Some(Self::Rotate90Ccw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Rotate180 => "rotate-180",
            Self::Rotate90Cw => "rotate-90-cw",
            Self::Rotate90Ccw => "rotate-90-ccw",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    Rgb,
    Grayscale,
}

/// A page image moving through the correction stages
#[derive(Debug, Clone)]
pub struct RasterImage {
    image: DynamicImage,
    orientation: Option<Orientation>,
}

impl RasterImage {
    /// Wrap pixels that carry no orientation metadata
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            orientation: None,
        }
    }

    pub fn with_orientation(image: DynamicImage, orientation: Orientation) -> Self {
        Self {
            image,
            orientation: Some(orientation),
        }
    }

    /// Decode encoded image bytes, keeping the EXIF orientation if present
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        let image = image::load_from_memory(bytes)?;
        let orientation = read_exif_orientation(bytes).and_then(|value| {
            let orientation = Orientation::from_exif(value);
            if orientation.is_none() {
                tracing::debug!("Ignoring unsupported EXIF orientation value {}", value);
            }
            orientation
        });

        Ok(match orientation {
            Some(orientation) => Self::with_orientation(image, orientation),
            None => Self::new(image),
        })
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn color_depth(&self) -> ColorDepth {
        match self.image.color() {
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
                ColorDepth::Grayscale
            }
            _ => ColorDepth::Rgb,
        }
    }
}

/// Read the raw EXIF orientation value. Missing or unreadable EXIF yields `None`.
pub fn read_exif_orientation(bytes: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(bytes);
    let exif = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!("No readable EXIF data: {}", e);
            return None;
        }
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}
