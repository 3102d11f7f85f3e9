// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas files: prebuilt pages and letter definitions stored as JSON.
//!
//! Pages are stored as base64 text of the gzip-compressed page bytes. Letter geometry is stored
//! in raw pixels and divided by the scale factor of the atlas it is loaded into.
//!
//! ```json
//! {
//!   "type": "fontatlas",
//!   "atlasName": "ui",
//!   "sourceFont": "fonts/ui.ttf",
//!   "faceSize": 24,
//!   "atlasDim": [512, 512],
//!   "pages": ["H4sIAAAA..."],
//!   "pageX": 133,
//!   "pageY": 30,
//!   "letters": {
//!     "65": { "U": 0, "V": 0, "advance": 15, "width": 16, "height": 19,
//!             "offsetX": -1, "offsetY": 1, "page": 0 }
//!   }
//! }
//! ```

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use std::io::{Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::{AtlasConfig, AtlasTexture, FontAtlas, GlyphSource, LetterDefinition, PixelFormat};

/// Value of the `type` field of every atlas file.
pub const ATLAS_FILE_TYPE: &str = "fontatlas";

/// Largest page width or height accepted from an atlas file.
pub const MAX_PAGE_DIMENSION: u32 = 8192;

/// The JSON document of an atlas file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlasDocument {
    /// Always [`ATLAS_FILE_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Key of the atlas in an [`AtlasRegistry`](crate::AtlasRegistry).
    pub atlas_name: String,
    /// Font the pages were rendered from.
    pub source_font: String,
    /// Size the font was rendered at.
    pub face_size: u32,
    /// Page width and height in pixels.
    pub atlas_dim: [u32; 2],
    /// Base64 text of the gzip-compressed bytes of every page.
    pub pages: Vec<String>,
    /// Packing cursor on the last page.
    pub page_x: f32,
    /// Top of the current shelf on the last page.
    pub page_y: f32,
    /// Letter definitions keyed by code point.
    pub letters: BTreeMap<u32, LetterRecord>,
}

/// A letter definition as stored in an atlas file, in raw pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterRecord {
    /// X position of the cell in the page.
    #[serde(rename = "U")]
    pub u: f32,
    /// Y position of the cell in the page.
    #[serde(rename = "V")]
    pub v: f32,
    /// Horizontal pen advance.
    pub advance: f32,
    /// Width of the cell.
    pub width: f32,
    /// Height of the cell.
    pub height: f32,
    /// Horizontal drawing offset.
    pub offset_x: f32,
    /// Vertical drawing offset.
    pub offset_y: f32,
    /// Page holding the glyph.
    pub page: u32,
}

/// Errors produced while loading or saving an atlas file.
#[derive(Debug)]
#[non_exhaustive]
pub enum AtlasFileError {
    /// The document is not valid JSON or misses fields.
    Json(serde_json::Error),
    /// The `type` field is not [`ATLAS_FILE_TYPE`].
    InvalidType(String),
    /// An atlas with the same name is still used outside the registry.
    AtlasInUse(String),
    /// The source font could not be instantiated.
    FontCreation(String),
    /// A page dimension is zero or larger than [`MAX_PAGE_DIMENSION`].
    InvalidDimensions([u32; 2]),
    /// A page is not valid base64.
    Base64 {
        /// Index of the page.
        page: usize,
        /// The decoding error.
        source: base64::DecodeError,
    },
    /// A page is not valid gzip.
    Decompress {
        /// Index of the page.
        page: usize,
        /// The decompression error.
        source: std::io::Error,
    },
    /// A decompressed page does not hold exactly one page of pixels.
    PageSizeMismatch {
        /// Index of the page.
        page: usize,
        /// `width * height` times the bytes per pixel of the atlas.
        expected: usize,
        /// Decompressed size, counted up to one byte past `expected`.
        actual: usize,
    },
    /// A letter key is not a Unicode scalar value.
    InvalidCharCode(u32),
    /// A letter refers to a page the file does not contain.
    InvalidPage {
        /// The letter.
        letter: char,
        /// Its page index.
        page: u32,
    },
    /// The file could not be read or written.
    Io(std::io::Error),
    /// The texture of a page does not support reading its content back.
    PageReadback(usize),
}

impl fmt::Display for AtlasFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid atlas document: {err}"),
            Self::InvalidType(kind) => {
                write!(f, "invalid asset type {kind:?}, expected {ATLAS_FILE_TYPE:?}")
            }
            Self::AtlasInUse(name) => {
                write!(f, "an atlas named {name:?} already exists and is in use")
            }
            Self::FontCreation(font) => write!(f, "could not create source font {font:?}"),
            Self::InvalidDimensions([width, height]) => {
                write!(f, "invalid atlas dimensions {width}x{height}")
            }
            Self::Base64 { page, source } => write!(f, "page {page}: invalid base64: {source}"),
            Self::Decompress { page, source } => {
                write!(f, "page {page}: could not decompress: {source}")
            }
            Self::PageSizeMismatch {
                page,
                expected,
                actual,
            } => write!(
                f,
                "page {page}: expected {expected} bytes after decompression, got {actual}"
            ),
            Self::InvalidCharCode(code) => write!(f, "letter key {code} is not a character"),
            Self::InvalidPage { letter, page } => {
                write!(f, "letter {letter:?} refers to missing page {page}")
            }
            Self::Io(err) => write!(f, "atlas file I/O failed: {err}"),
            Self::PageReadback(page) => write!(f, "page {page} cannot be read back"),
        }
    }
}

impl core::error::Error for AtlasFileError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Base64 { source, .. } => Some(source),
            Self::Decompress { source, .. } | Self::Io(source) => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AtlasFileError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<std::io::Error> for AtlasFileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl AtlasDocument {
    /// Parse an atlas file and check its type.
    pub fn from_json(json: &str) -> Result<Self, AtlasFileError> {
        let document: Self = serde_json::from_str(json)?;
        if document.kind != ATLAS_FILE_TYPE {
            return Err(AtlasFileError::InvalidType(document.kind));
        }
        Ok(document)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, AtlasFileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<S: GlyphSource, T: AtlasTexture> FontAtlas<S, T> {
    /// Rebuild an atlas from a parsed atlas file.
    ///
    /// The page size comes from the document and overrides the one in `config`. Pages are
    /// uploaded as they are decoded; the last one stays in the scratch buffer so packing resumes
    /// where the file left off.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "cursor and advances are whole pixels"
    )]
    pub fn from_document(
        font: Rc<S>,
        document: &AtlasDocument,
        config: AtlasConfig,
    ) -> Result<Self, AtlasFileError> {
        let [page_width, page_height] = document.atlas_dim;
        let mut atlas = Self::with_config(
            font,
            AtlasConfig {
                page_width,
                page_height,
                ..config
            },
        );
        let page_size = page_byte_size(document.atlas_dim, atlas.pixel_format())
            .ok_or(AtlasFileError::InvalidDimensions(document.atlas_dim))?;

        let mut compressed = Vec::new();
        for (page, encoded) in document.pages.iter().enumerate() {
            compressed.clear();
            STANDARD
                .decode_vec(encoded, &mut compressed)
                .map_err(|source| AtlasFileError::Base64 { page, source })?;
            let mut pixels = Vec::new();
            // One byte past a page is enough to tell an oversized page apart.
            GzDecoder::new(compressed.as_slice())
                .take(page_size as u64 + 1)
                .read_to_end(&mut pixels)
                .map_err(|source| AtlasFileError::Decompress { page, source })?;
            atlas
                .pages_mut()
                .load_page(&pixels)
                .map_err(|expected| AtlasFileError::PageSizeMismatch {
                    page,
                    expected,
                    actual: pixels.len(),
                })?;
        }

        let scale = atlas.scale_factor();
        let last_page = document.pages.len().checked_sub(1);
        let mut shelf_height = 0_u32;
        for (&code, record) in &document.letters {
            let code = char::from_u32(code).ok_or(AtlasFileError::InvalidCharCode(code))?;
            if record.page as usize >= document.pages.len() {
                return Err(AtlasFileError::InvalidPage {
                    letter: code,
                    page: record.page,
                });
            }
            if last_page == Some(record.page as usize) && record.v == document.page_y {
                shelf_height = shelf_height.max(record.height.ceil() as u32);
            }
            atlas.add_letter_definition(
                code,
                LetterDefinition {
                    u: record.u / scale,
                    v: record.v / scale,
                    width: record.width / scale,
                    height: record.height / scale,
                    offset_x: record.offset_x,
                    offset_y: record.offset_y,
                    x_advance: record.advance as i32,
                    texture_id: record.page,
                    rotated: false,
                    valid_definition: true,
                },
            );
        }

        if last_page.is_some() {
            atlas.pages_mut().set_cursor(
                document.page_x.max(0.0) as u32,
                document.page_y.max(0.0) as u32,
                shelf_height,
            );
        }
        log::debug!(
            "font atlas {:?} loaded {} pages and {} letters",
            document.atlas_name,
            document.pages.len(),
            document.letters.len()
        );
        Ok(atlas)
    }

    /// Describe this atlas as an atlas file.
    ///
    /// The page being filled is taken from the scratch buffer; earlier pages are read back
    /// from their textures. Definitions that are not valid are left out.
    pub fn to_document(
        &self,
        atlas_name: &str,
        face_size: u32,
    ) -> Result<AtlasDocument, AtlasFileError> {
        let pages = self.pages();
        let current = pages.current_page().map(|page| page as usize);
        let mut encoded_pages = Vec::with_capacity(pages.page_count());
        for (slot, texture) in pages.textures().iter().enumerate() {
            let read_back;
            let pixels = if current == Some(slot) {
                pages.page_data()
            } else {
                read_back = texture
                    .read_back()
                    .ok_or(AtlasFileError::PageReadback(slot))?;
                read_back.as_slice()
            };
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(pixels)?;
            encoded_pages.push(STANDARD.encode(encoder.finish()?));
        }

        let scale = self.scale_factor();
        let letters = self
            .letters()
            .filter(|(_, definition)| definition.valid_definition)
            .map(|(code, definition)| {
                (
                    u32::from(code),
                    LetterRecord {
                        u: definition.u * scale,
                        v: definition.v * scale,
                        advance: definition.x_advance as f32,
                        width: definition.width * scale,
                        height: definition.height * scale,
                        offset_x: definition.offset_x,
                        offset_y: definition.offset_y,
                        page: definition.texture_id,
                    },
                )
            })
            .collect();

        let (page_x, page_y) = pages.origin();
        Ok(AtlasDocument {
            kind: ATLAS_FILE_TYPE.into(),
            atlas_name: atlas_name.into(),
            source_font: self.font().font_name().into(),
            face_size,
            atlas_dim: [self.width(), self.height()],
            pages: encoded_pages,
            page_x: page_x as f32,
            page_y: page_y as f32,
            letters,
        })
    }
}

/// Bytes in one page of `dim` pixels, or `None` when a dimension is out of range.
fn page_byte_size(dim: [u32; 2], format: PixelFormat) -> Option<usize> {
    let [width, height] = dim;
    let in_range = |side: u32| (1..=MAX_PAGE_DIMENSION).contains(&side);
    if !in_range(width) || !in_range(height) {
        return None;
    }
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(format.bytes_per_pixel())
}
