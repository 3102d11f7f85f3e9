// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Font Atlas Dev
//!
//! This crate provides utilities for developing Font Atlas without font files or a GPU:
//! - [`ScriptedFont`], a [`GlyphSource`] whose glyphs are declared up front;
//! - [`RecordingTexture`], an [`AtlasTexture`] that mirrors its pixels and logs every upload;
//! - small TrueType fonts in `assets/fonts` for exercising real rasterizers.

use std::borrow::Cow;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use font_atlas::{
    AtlasTexture, FaceMetrics, FontFaceInfo, GlyphBitmap, GlyphRaster, GlyphRect,
    GlyphResolution, GlyphSource, PixelFormat,
};

/// A TrueType font with 1000 units per em, an ascender of 800 and a descender of -200.
///
/// `A` maps to a triangle with its base on the baseline from x = 50 to 650 and its apex at
/// (350, 700), advancing 700 units. The space advances 250 units. No other character is mapped.
pub const TRIANGLE_FONT: &[u8] = include_bytes!("../assets/fonts/triangle.ttf");

/// [`TRIANGLE_FONT`] with `B` also mapped to the triangle glyph, index 1.
pub const TRIANGLE_FALLBACK_FONT: &[u8] = include_bytes!("../assets/fonts/triangle_fallback.ttf");

/// A glyph declared on a [`ScriptedFont`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScriptedGlyph {
    /// Bitmap width in pixels.
    pub width: u32,
    /// Bitmap height in pixels.
    pub height: u32,
    /// Horizontal pen advance.
    pub advance: i32,
    /// Left edge relative to the pen position.
    pub bearing_x: f32,
    /// Top edge relative to the baseline, negative above it.
    pub bearing_y: f32,
    /// Value of every byte of the bitmap.
    pub value: u8,
}

impl ScriptedGlyph {
    /// A `width` × `height` glyph sitting on the baseline, filled with `0xff`.
    pub fn solid(width: u32, height: u32, advance: i32) -> Self {
        Self {
            width,
            height,
            advance,
            bearing_x: 0.0,
            bearing_y: -(height as f32),
            value: 0xff,
        }
    }

    /// A glyph without pixels, such as a space.
    pub fn blank(advance: i32) -> Self {
        Self::solid(0, 0, advance)
    }

    /// Set the bitmap fill value.
    pub fn with_value(mut self, value: u8) -> Self {
        self.value = value;
        self
    }

    /// Set the offset of the bitmap from the pen position.
    pub fn with_bearing(mut self, x: f32, y: f32) -> Self {
        self.bearing_x = x;
        self.bearing_y = y;
        self
    }
}

/// How often a [`ScriptedFont`] and the faces created from it were asked for work.
///
/// Shared between a font and every fallback it creates.
#[derive(Debug, Default)]
pub struct FontCounters {
    /// Calls to [`GlyphSource::glyph_bitmap`].
    pub by_code: Cell<u32>,
    /// Calls to [`GlyphSource::glyph_bitmap_by_index`].
    pub by_index: Cell<u32>,
    /// Fallback faces instantiated.
    pub fallbacks_created: Cell<u32>,
}

impl FontCounters {
    fn bump(counter: &Cell<u32>) {
        counter.set(counter.get() + 1);
    }
}

#[derive(Clone, Debug)]
struct ScriptedEntry {
    glyph: ScriptedGlyph,
    pixels: Vec<u8>,
}

/// A [`GlyphSource`] serving glyphs declared with its builder methods.
///
/// Characters without a declared glyph are missing; [`fallback`](Self::fallback) attaches a
/// resolution hint to them, and [`fallback_face`](Self::fallback_face) registers the face
/// [`GlyphSource::create_fallback`] returns for a family.
#[derive(Clone, Debug)]
pub struct ScriptedFont {
    name: String,
    metrics: FaceMetrics,
    glyphs: HashMap<char, ScriptedEntry>,
    indexed: HashMap<u32, ScriptedEntry>,
    hints: HashMap<char, GlyphResolution>,
    faces: HashMap<String, ScriptedFont>,
    borrowed: bool,
    counters: Rc<FontCounters>,
}

impl ScriptedFont {
    /// Creates a font without glyphs.
    pub fn new(name: impl Into<String>, metrics: FaceMetrics) -> Self {
        Self {
            name: name.into(),
            metrics,
            glyphs: HashMap::new(),
            indexed: HashMap::new(),
            hints: HashMap::new(),
            faces: HashMap::new(),
            borrowed: false,
            counters: Rc::default(),
        }
    }

    /// Declare the glyph of `code`.
    pub fn glyph(mut self, code: char, glyph: ScriptedGlyph) -> Self {
        let entry = self.entry(glyph);
        self.glyphs.insert(code, entry);
        self
    }

    /// Declare the same glyph for every character of `codes`.
    pub fn glyphs(mut self, codes: &str, glyph: ScriptedGlyph) -> Self {
        for code in codes.chars() {
            let entry = self.entry(glyph);
            self.glyphs.insert(code, entry);
        }
        self
    }

    /// Declare the glyph with index `glyph_index`, reachable only by index.
    pub fn indexed_glyph(mut self, glyph_index: u32, glyph: ScriptedGlyph) -> Self {
        let entry = self.entry(glyph);
        self.indexed.insert(glyph_index, entry);
        self
    }

    /// Report `code` as available in `family` at `glyph_index`.
    pub fn fallback(mut self, code: char, family: &str, glyph_index: u32) -> Self {
        self.hints.insert(
            code,
            GlyphResolution {
                face: FontFaceInfo {
                    family: family.into(),
                    path: format!("{family}.ttf"),
                    face_index: 0,
                },
                glyph_index,
            },
        );
        self
    }

    /// Register the face instantiated for `family`. It shares this font's counters.
    pub fn fallback_face(mut self, family: &str, mut face: Self) -> Self {
        face.counters = Rc::clone(&self.counters);
        self.faces.insert(family.into(), face);
        self
    }

    /// Serve bitmaps borrowed from the font instead of fresh copies.
    pub fn borrowed_bitmaps(mut self) -> Self {
        self.borrowed = true;
        self
    }

    /// Work counters shared with the fallbacks of this font.
    pub fn counters(&self) -> Rc<FontCounters> {
        Rc::clone(&self.counters)
    }

    fn entry(&self, glyph: ScriptedGlyph) -> ScriptedEntry {
        let channels = if self.metrics.has_outline() { 2 } else { 1 };
        let len = glyph.width as usize * glyph.height as usize * channels;
        ScriptedEntry {
            glyph,
            pixels: vec![glyph.value; len],
        }
    }

    fn raster<'a>(&self, entry: &'a ScriptedEntry) -> GlyphRaster<'a> {
        let glyph = entry.glyph;
        let data = if self.borrowed {
            Cow::Borrowed(entry.pixels.as_slice())
        } else {
            Cow::Owned(entry.pixels.clone())
        };
        GlyphRaster::new(
            GlyphBitmap {
                data,
                width: glyph.width,
                height: glyph.height,
                bounds: GlyphRect {
                    x: glyph.bearing_x,
                    y: glyph.bearing_y,
                    width: glyph.width as f32,
                    height: glyph.height as f32,
                },
            },
            glyph.advance,
        )
    }
}

impl GlyphSource for ScriptedFont {
    fn face_metrics(&self) -> FaceMetrics {
        self.metrics
    }

    fn font_name(&self) -> &str {
        &self.name
    }

    fn glyph_bitmap(&self, code: char) -> GlyphRaster<'_> {
        FontCounters::bump(&self.counters.by_code);
        match self.glyphs.get(&code) {
            Some(entry) => self.raster(entry),
            None => GlyphRaster::missing(self.hints.get(&code).cloned()),
        }
    }

    fn glyph_bitmap_by_index(&self, glyph_index: u32) -> GlyphRaster<'_> {
        FontCounters::bump(&self.counters.by_index);
        match self.indexed.get(&glyph_index) {
            Some(entry) => self.raster(entry),
            None => GlyphRaster::missing(None),
        }
    }

    fn create_fallback(&self, face: &FontFaceInfo) -> Option<Self> {
        let fallback = self.faces.get(&face.family)?.clone();
        FontCounters::bump(&self.counters.fallbacks_created);
        Some(fallback)
    }
}

/// An upload received by a [`RecordingTexture`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upload {
    /// The whole page was replaced.
    Full,
    /// A rectangle of the page was replaced.
    Sub {
        /// Left edge.
        x: u32,
        /// Top edge.
        y: u32,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

/// An [`AtlasTexture`] keeping a CPU copy of the page and a log of the uploads it received.
#[derive(Clone, Debug)]
pub struct RecordingTexture {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
    uploads: Vec<Upload>,
    invalidated: bool,
    antialias: bool,
}

impl RecordingTexture {
    /// Page width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Page height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout of the page.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The page content as last uploaded.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The bytes of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let bpp = self.format.bytes_per_pixel();
        let start = (y as usize * self.width as usize + x as usize) * bpp;
        &self.pixels[start..start + bpp]
    }

    /// Every upload since the texture was created, in order. Creation itself is not logged.
    pub fn uploads(&self) -> &[Upload] {
        &self.uploads
    }

    /// The rectangles of the partial uploads, as `(x, y, width, height)`.
    pub fn sub_uploads(&self) -> Vec<(u32, u32, u32, u32)> {
        self.uploads
            .iter()
            .filter_map(|upload| match *upload {
                Upload::Sub {
                    x,
                    y,
                    width,
                    height,
                } => Some((x, y, width, height)),
                Upload::Full => None,
            })
            .collect()
    }

    /// Whether the texture was invalidated and not repopulated since.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// Whether linear filtering is on.
    pub fn antialias(&self) -> bool {
        self.antialias
    }
}

impl AtlasTexture for RecordingTexture {
    fn create_with_data(data: &[u8], format: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format,
            pixels: data.to_vec(),
            uploads: Vec::new(),
            invalidated: false,
            antialias: false,
        }
    }

    fn update_data(&mut self, data: &[u8], width: u32, height: u32) {
        assert_eq!((width, height), (self.width, self.height), "full upload size");
        self.pixels.copy_from_slice(data);
        self.uploads.push(Upload::Full);
        self.invalidated = false;
    }

    fn update_sub_data(&mut self, data: &[u8], x: u32, y: u32, width: u32, height: u32) {
        let bpp = self.format.bytes_per_pixel();
        let row_len = width as usize * bpp;
        assert_eq!(data.len(), row_len * height as usize, "sub upload size");
        for row in 0..height as usize {
            let dst = ((y as usize + row) * self.width as usize + x as usize) * bpp;
            self.pixels[dst..dst + row_len]
                .copy_from_slice(&data[row * row_len..(row + 1) * row_len]);
        }
        self.uploads.push(Upload::Sub {
            x,
            y,
            width,
            height,
        });
    }

    fn invalidate(&mut self) {
        self.invalidated = true;
    }

    fn set_antialias(&mut self, enabled: bool) {
        self.antialias = enabled;
    }

    fn read_back(&self) -> Option<Vec<u8>> {
        Some(self.pixels.clone())
    }
}
