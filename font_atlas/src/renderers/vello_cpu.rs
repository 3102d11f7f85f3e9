// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph rasterization with skrifa and Vello CPU, and atlas pages stored in a Vello `Pixmap`.

#![allow(
    clippy::cast_possible_truncation,
    reason = "glyph extents and font metrics are small whole pixel values"
)]

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};

use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::raw::ReadError;
use skrifa::{FontRef, GlyphId, MetadataProvider};
use vello_cpu::color::PremulRgba8;
use vello_cpu::color::palette::css::WHITE;
use vello_cpu::{Image, ImageSource, Pixmap, RenderContext};

use crate::kurbo::{Affine, BezPath, Rect};
use crate::peniko::{self, FontData, ImageSampler};
use crate::{
    AtlasTexture, FaceMetrics, FontFaceInfo, GlyphBitmap, GlyphRaster, GlyphRect,
    GlyphResolution, GlyphSource, PixelFormat,
};

#[cfg(not(feature = "std"))]
use crate::kurbo::common::FloatFuncs as _;

/// A face [`SkrifaGlyphSource`] may route missing glyphs to.
#[derive(Clone)]
pub struct FallbackFace {
    /// How the face is reported in a [`GlyphResolution`].
    pub info: FontFaceInfo,
    /// The font data.
    pub font: FontData,
}

impl Debug for FallbackFace {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FallbackFace")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Rasterizes glyph outlines of one face at one size into coverage bitmaps.
///
/// Characters missing from the face are looked up in the fallback faces, in order, and
/// reported as a [`GlyphResolution`] for the first one that has them.
#[derive(Clone)]
pub struct SkrifaGlyphSource {
    font: FontData,
    name: String,
    size: f32,
    metrics: FaceMetrics,
    fallbacks: Arc<[FallbackFace]>,
}

impl SkrifaGlyphSource {
    /// Creates a source rendering `font` at `size` pixels per em.
    pub fn new(font: FontData, name: impl Into<String>, size: f32) -> Result<Self, ReadError> {
        let metrics = {
            let font_ref = FontRef::from_index(font.data.as_ref(), font.index)?;
            let metrics = font_ref.metrics(Size::new(size), LocationRef::default());
            let ascent = f64::from(metrics.ascent);
            let descent = f64::from(metrics.descent);
            let leading = f64::from(metrics.leading);
            FaceMetrics {
                max_height: (ascent - descent + leading).ceil() as f32,
                ascender: ascent.ceil() as i32,
                outline_size: 0.0,
                distance_field: false,
            }
        };
        Ok(Self {
            font,
            name: name.into(),
            size,
            metrics,
            fallbacks: Arc::new([]),
        })
    }

    /// Set the faces consulted for characters this face lacks.
    pub fn with_fallbacks(mut self, fallbacks: impl Into<Arc<[FallbackFace]>>) -> Self {
        self.fallbacks = fallbacks.into();
        self
    }

    /// Pixels per em.
    pub fn size(&self) -> f32 {
        self.size
    }

    fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(self.font.data.as_ref(), self.font.index).ok()
    }

    fn resolve_fallback(&self, code: char) -> Option<GlyphResolution> {
        self.fallbacks.iter().find_map(|candidate| {
            let font_ref =
                FontRef::from_index(candidate.font.data.as_ref(), candidate.font.index).ok()?;
            let glyph_id = font_ref.charmap().map(code)?;
            Some(GlyphResolution {
                face: candidate.info.clone(),
                glyph_index: glyph_id.to_u32(),
            })
        })
    }

    fn rasterize(&self, font_ref: &FontRef<'_>, glyph_id: GlyphId) -> GlyphRaster<'static> {
        let size = Size::new(self.size);
        let advance = font_ref
            .glyph_metrics(size, LocationRef::default())
            .advance_width(glyph_id)
            .unwrap_or_default();
        let advance = f64::from(advance).round() as i32;

        let Some(outline) = font_ref.outline_glyphs().get(glyph_id) else {
            return GlyphRaster::blank(advance);
        };
        let mut pen = GlyphOutline::new();
        if let Err(err) = outline.draw(DrawSettings::unhinted(size, LocationRef::default()), &mut pen)
        {
            log::warn!("could not draw glyph {} of {:?}: {err:?}", glyph_id.to_u32(), self.name);
            return GlyphRaster::blank(advance);
        }
        if pen.path.elements().is_empty() {
            return GlyphRaster::blank(advance);
        }

        let x0 = pen.bbox.x0.floor();
        let y0 = pen.bbox.y0.floor();
        let x1 = pen.bbox.x1.ceil();
        let y1 = pen.bbox.y1.ceil();
        let width = (x1 - x0) as u16;
        let height = (y1 - y0) as u16;
        if width == 0 || height == 0 {
            return GlyphRaster::blank(advance);
        }

        // Outlines are y-up; bitmaps are y-down with the top of the glyph on row 0.
        let mut ctx = RenderContext::new(width, height);
        ctx.set_paint(WHITE);
        ctx.set_transform(Affine::translate((-x0, y1)) * Affine::FLIP_Y);
        ctx.fill_path(&pen.path);
        ctx.flush();
        let mut pixmap = Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);

        let coverage: Vec<u8> = pixmap.data().iter().map(|pixel| pixel.a).collect();
        GlyphRaster::new(
            GlyphBitmap {
                data: Cow::Owned(coverage),
                width: u32::from(width),
                height: u32::from(height),
                bounds: GlyphRect {
                    x: x0 as f32,
                    y: -y1 as f32,
                    width: f32::from(width),
                    height: f32::from(height),
                },
            },
            advance,
        )
    }
}

impl GlyphSource for SkrifaGlyphSource {
    fn face_metrics(&self) -> FaceMetrics {
        self.metrics
    }

    fn font_name(&self) -> &str {
        &self.name
    }

    fn glyph_bitmap(&self, code: char) -> GlyphRaster<'_> {
        let Some(font_ref) = self.font_ref() else {
            return GlyphRaster::missing(None);
        };
        match font_ref.charmap().map(code) {
            Some(glyph_id) => self.rasterize(&font_ref, glyph_id),
            None => GlyphRaster::missing(self.resolve_fallback(code)),
        }
    }

    fn glyph_bitmap_by_index(&self, glyph_index: u32) -> GlyphRaster<'_> {
        match self.font_ref() {
            Some(font_ref) => self.rasterize(&font_ref, GlyphId::new(glyph_index)),
            None => GlyphRaster::missing(None),
        }
    }

    fn create_fallback(&self, face: &FontFaceInfo) -> Option<Self> {
        let candidate = self
            .fallbacks
            .iter()
            .find(|candidate| candidate.info.family == face.family)?;
        let name = if candidate.info.path.is_empty() {
            candidate.info.family.clone()
        } else {
            candidate.info.path.clone()
        };
        Self::new(candidate.font.clone(), name, self.size)
            .ok()
            .map(|source| source.with_fallbacks(Arc::clone(&self.fallbacks)))
    }
}

impl Debug for SkrifaGlyphSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SkrifaGlyphSource")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("metrics", &self.metrics)
            .field("fallbacks", &self.fallbacks.len())
            .finish_non_exhaustive()
    }
}

struct GlyphOutline {
    path: BezPath,
    bbox: Rect,
}

impl GlyphOutline {
    fn new() -> Self {
        Self {
            path: BezPath::new(),
            bbox: Rect {
                x0: f64::INFINITY,
                y0: f64::INFINITY,
                x1: f64::NEG_INFINITY,
                y1: f64::NEG_INFINITY,
            },
        }
    }
}

impl OutlinePen for GlyphOutline {
    #[inline]
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to((x, y));
        self.bbox = self.bbox.union_pt((x, y));
    }

    #[inline]
    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to((x, y));
        self.bbox = self.bbox.union_pt((x, y));
    }

    #[inline]
    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.path.curve_to((cx0, cy0), (cx1, cy1), (x, y));
        self.bbox = self.bbox.union_pt((cx0, cy0));
        self.bbox = self.bbox.union_pt((cx1, cy1));
        self.bbox = self.bbox.union_pt((x, y));
    }

    #[inline]
    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.path.quad_to((cx, cy), (x, y));
        self.bbox = self.bbox.union_pt((cx, cy));
        self.bbox = self.bbox.union_pt((x, y));
    }

    #[inline]
    fn close(&mut self) {
        self.path.close_path();
    }
}

/// An atlas page kept in a Vello `Pixmap` as premultiplied white, ready to be sampled by a
/// CPU renderer.
///
/// Two-channel pages store the larger of the fill and outline coverage and cannot be read back.
pub struct PixmapTexture {
    pixmap: Pixmap,
    format: PixelFormat,
    antialias: bool,
    valid: bool,
}

impl PixmapTexture {
    /// The page pixels.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Whether the page holds its content, i.e. has not been invalidated since the last full
    /// upload.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether the page is sampled with linear filtering.
    pub fn antialias(&self) -> bool {
        self.antialias
    }

    /// A paint sampling this page, for drawing glyph cells with a [`RenderContext`].
    pub fn to_image(&self) -> Image {
        let quality = if self.antialias {
            peniko::ImageQuality::Medium
        } else {
            peniko::ImageQuality::Low
        };
        Image {
            image: ImageSource::Pixmap(Arc::new(self.pixmap.clone())),
            sampler: ImageSampler {
                x_extend: peniko::Extend::Pad,
                y_extend: peniko::Extend::Pad,
                quality,
                alpha: 1.0,
            },
        }
    }

    fn write_rows(&mut self, data: &[u8], x: u32, y: u32, width: u32, height: u32) {
        let bpp = self.format.bytes_per_pixel();
        let stride = usize::from(self.pixmap.width());
        let pixels = self.pixmap.data_mut();
        for (row, src_row) in data
            .chunks_exact(width as usize * bpp)
            .take(height as usize)
            .enumerate()
        {
            let start = (y as usize + row) * stride + x as usize;
            let Some(dst_row) = pixels.get_mut(start..start + width as usize) else {
                break;
            };
            for (dst, src) in dst_row.iter_mut().zip(src_row.chunks_exact(bpp)) {
                let coverage = src.iter().copied().max().unwrap_or_default();
                *dst = PremulRgba8 {
                    r: coverage,
                    g: coverage,
                    b: coverage,
                    a: coverage,
                };
            }
        }
    }
}

impl AtlasTexture for PixmapTexture {
    fn create_with_data(data: &[u8], format: PixelFormat, width: u32, height: u32) -> Self {
        let mut texture = Self {
            pixmap: Pixmap::new(width as u16, height as u16),
            format,
            antialias: true,
            valid: true,
        };
        texture.write_rows(data, 0, 0, width, height);
        texture
    }

    fn update_data(&mut self, data: &[u8], width: u32, height: u32) {
        self.write_rows(data, 0, 0, width, height);
        self.valid = true;
    }

    fn update_sub_data(&mut self, data: &[u8], x_offset: u32, y_offset: u32, width: u32, height: u32) {
        self.write_rows(data, x_offset, y_offset, width, height);
    }

    fn invalidate(&mut self) {
        self.valid = false;
    }

    fn set_antialias(&mut self, enabled: bool) {
        self.antialias = enabled;
    }

    fn read_back(&self) -> Option<Vec<u8>> {
        match self.format {
            PixelFormat::R8 => Some(self.pixmap.data().iter().map(|pixel| pixel.a).collect()),
            PixelFormat::Rg8 => None,
        }
    }
}

impl Debug for PixmapTexture {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixmapTexture")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("format", &self.format)
            .field("antialias", &self.antialias)
            .field("valid", &self.valid)
            .finish_non_exhaustive()
    }
}
