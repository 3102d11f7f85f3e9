// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The glyph rasterizer interface consumed by the atlas.

use alloc::borrow::Cow;
use alloc::string::String;

/// Metrics of a font face that influence how its glyphs are packed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FaceMetrics {
    /// Maximum height of a line of text set in this face, in pixels.
    pub max_height: f32,
    /// Distance from the top of the line to the baseline, in pixels.
    pub ascender: i32,
    /// Width of the glyph outline in pixels, or `0.0` when glyphs have no outline.
    ///
    /// Faces with an outline produce two-channel bitmaps (occupancy and outline).
    pub outline_size: f32,
    /// Whether the face produces signed distance field bitmaps.
    pub distance_field: bool,
}

impl FaceMetrics {
    /// Whether bitmaps produced by this face carry an outline channel.
    #[inline]
    pub fn has_outline(&self) -> bool {
        self.outline_size > 0.0
    }
}

/// Tight bounding rectangle of a glyph, relative to the pen position on the baseline.
///
/// `y` grows downwards, so a glyph that rises above the baseline has a negative `y`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

/// Pixels of a rasterized glyph.
///
/// Rows are tightly packed; each pixel has one byte per channel of the atlas pixel format.
#[derive(Clone, Debug)]
pub struct GlyphBitmap<'a> {
    /// Pixel data.
    ///
    /// [`Cow::Borrowed`] data is owned by the source's own glyph cache and is never freed by the
    /// atlas. [`Cow::Owned`] data belongs to the atlas and is dropped once it has been copied
    /// into the page.
    pub data: Cow<'a, [u8]>,
    /// Width of the bitmap in pixels.
    pub width: u32,
    /// Height of the bitmap in pixels.
    pub height: u32,
    /// Tight bounds of the glyph.
    pub bounds: GlyphRect,
}

impl GlyphBitmap<'_> {
    /// Whether the bitmap covers at least one pixel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Identifies a face able to render a glyph the requested face lacks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontFaceInfo {
    /// Family name of the face.
    pub family: String,
    /// Path of the font file, if known.
    pub path: String,
    /// Index of the face within a collection, or `-1` when unknown.
    pub face_index: i32,
}

/// Hint returned by a [`GlyphSource`] when it cannot render a character itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlyphResolution {
    /// The face that contains the glyph.
    pub face: FontFaceInfo,
    /// Index of the glyph within that face.
    pub glyph_index: u32,
}

/// Outcome of asking a [`GlyphSource`] for one glyph.
#[derive(Clone, Debug, Default)]
pub struct GlyphRaster<'a> {
    /// The glyph pixels, or `None` when the glyph is blank or could not be rendered.
    pub bitmap: Option<GlyphBitmap<'a>>,
    /// Horizontal pen advance in pixels.
    pub advance: i32,
    /// When the face lacks the glyph, where to find it instead.
    pub resolution: Option<GlyphResolution>,
}

impl<'a> GlyphRaster<'a> {
    /// A rendered glyph.
    pub fn new(bitmap: GlyphBitmap<'a>, advance: i32) -> Self {
        Self {
            bitmap: Some(bitmap),
            advance,
            resolution: None,
        }
    }

    /// A glyph without pixels that still moves the pen, such as a space.
    pub fn blank(advance: i32) -> Self {
        Self {
            bitmap: None,
            advance,
            resolution: None,
        }
    }

    /// A glyph this face lacks, optionally pointing at a face that has it.
    pub fn missing(resolution: Option<GlyphResolution>) -> Self {
        Self {
            bitmap: None,
            advance: 0,
            resolution,
        }
    }

    /// Returns the bitmap if it covers at least one pixel.
    pub fn drawable(&self) -> Option<&GlyphBitmap<'a>> {
        self.bitmap.as_ref().filter(|bitmap| !bitmap.is_empty())
    }
}

/// A rasterizer for one font face at one size.
pub trait GlyphSource: Sized {
    /// Metrics of the face.
    fn face_metrics(&self) -> FaceMetrics;

    /// Name (usually the file path) of the font.
    fn font_name(&self) -> &str;

    /// Rasterize the glyph mapped to `code`.
    ///
    /// When the face has no glyph for `code`, the result has no bitmap and may carry a
    /// [`GlyphResolution`] naming a face that can render it.
    fn glyph_bitmap(&self, code: char) -> GlyphRaster<'_>;

    /// Rasterize a glyph by its index in this face, bypassing the character map.
    fn glyph_bitmap_by_index(&self, glyph_index: u32) -> GlyphRaster<'_>;

    /// Instantiate the fallback face described by `face` with the same size and rendering
    /// options as `self`.
    fn create_fallback(&self, face: &FontFaceInfo) -> Option<Self>;
}
