// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The atlas: residency requests, glyph placement metadata and page lifecycle.

use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use core::fmt::{Debug, Formatter};
use hashbrown::HashMap;

use super::fallback::FallbackResolver;
use super::letter::LetterDefinition;
use super::page::PageAllocator;
use crate::source::{GlyphBitmap, GlyphSource};
use crate::texture::{AtlasTexture, PixelFormat};

#[cfg(not(feature = "std"))]
use core_maths::CoreFloat as _;

/// Default page width in pixels.
pub const DEFAULT_PAGE_WIDTH: u32 = 512;

/// Default page height in pixels.
pub const DEFAULT_PAGE_HEIGHT: u32 = 512;

/// Pixels added around each glyph cell to keep bilinear filtering from sampling neighbours.
pub const LETTER_EDGE_EXTEND: u32 = 2;

/// Spread in pixels of distance field glyphs, on each side of the outline.
pub const DISTANCE_MAP_SPREAD: f32 = 6.0;

/// Construction parameters of a [`FontAtlas`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasConfig {
    /// Width of every page in pixels.
    pub page_width: u32,
    /// Height of every page in pixels.
    pub page_height: u32,
    /// Device content scale. Placement geometry is divided by it so consumers work in
    /// logical units.
    pub scale_factor: f32,
    /// Extra pixels around each glyph cell, half on each side.
    pub letter_edge_extend: u32,
    /// Whether pages use linear filtering.
    pub antialias: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            page_width: DEFAULT_PAGE_WIDTH,
            page_height: DEFAULT_PAGE_HEIGHT,
            scale_factor: 1.0,
            letter_edge_extend: LETTER_EDGE_EXTEND,
            antialias: true,
        }
    }
}

/// A dynamic glyph atlas for one font face.
///
/// Characters become resident through [`ensure_resident`](Self::ensure_resident), which
/// rasterizes the ones not seen before, packs them into the current page and uploads the
/// rows it wrote. The atlas is meant to be driven from the thread owning the rendering
/// context.
pub struct FontAtlas<S, T> {
    /// The primary face, shared with whoever else renders with it.
    font: Rc<S>,
    config: AtlasConfig,
    /// Distance field spread on both sides, 0 for coverage glyphs.
    letter_padding: u32,
    line_height: f32,
    font_ascender: i32,
    pages: PageAllocator<T>,
    letters: HashMap<char, LetterDefinition>,
    fallback: FallbackResolver<S>,
    /// Bumped on every full reset.
    generation: u32,
}

impl<S: GlyphSource, T: AtlasTexture> FontAtlas<S, T> {
    /// Creates an atlas with [`DEFAULT_PAGE_WIDTH`] × [`DEFAULT_PAGE_HEIGHT`] pages.
    pub fn new(font: Rc<S>) -> Self {
        Self::with_config(font, AtlasConfig::default())
    }

    /// Creates an atlas for `font`.
    ///
    /// Pages are only allocated once the first glyph is requested.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "padding is a handful of whole pixels"
    )]
    pub fn with_config(font: Rc<S>, config: AtlasConfig) -> Self {
        let metrics = font.face_metrics();
        let mut line_height = metrics.max_height;
        let pixel_format = if metrics.has_outline() {
            line_height += 2.0 * metrics.outline_size;
            PixelFormat::Rg8
        } else {
            PixelFormat::R8
        };
        let letter_padding = if metrics.distance_field {
            (2.0 * DISTANCE_MAP_SPREAD * config.scale_factor) as u32
        } else {
            0
        };

        let mut pages = PageAllocator::new(config.page_width, config.page_height, pixel_format);
        pages.set_antialias(config.antialias);

        Self {
            font,
            config,
            letter_padding,
            line_height,
            font_ascender: metrics.ascender,
            pages,
            letters: HashMap::new(),
            fallback: FallbackResolver::new(),
            generation: 0,
        }
    }

    /// Make every character of `text` resident.
    ///
    /// Returns `true` if at least one glyph was added.
    pub fn ensure_resident(&mut self, text: &str) -> bool {
        self.ensure_resident_chars(text.chars())
    }

    /// Make every character yielded by `chars` resident.
    ///
    /// New characters are processed in code point order. Characters no face can render are
    /// still recorded, so asking again does not rasterize them again. Returns `true` if at
    /// least one definition was added.
    pub fn ensure_resident_chars(&mut self, chars: impl IntoIterator<Item = char>) -> bool {
        let new_codes: BTreeSet<char> = if self.letters.is_empty() {
            chars.into_iter().collect()
        } else {
            chars
                .into_iter()
                .filter(|code| !self.letters.contains_key(code))
                .collect()
        };
        if new_codes.is_empty() {
            return false;
        }

        if !self.pages.is_started() {
            self.pages.reinit();
        }
        self.pages.begin_batch();

        let layout = CellLayout {
            letter_padding: self.letter_padding,
            letter_edge_extend: self.config.letter_edge_extend,
            ascender: self.font_ascender,
            scale_factor: self.config.scale_factor,
        };

        for code in new_codes {
            let raster = self.fallback.rasterize(code, &self.font);
            let definition = match raster.drawable() {
                Some(bitmap) => layout
                    .pack(&mut self.pages, bitmap, raster.advance)
                    .unwrap_or_else(|| {
                        log::warn!(
                            "font atlas rejected {:?}: {}x{} glyph does not fit a {}x{} page",
                            code,
                            bitmap.width,
                            bitmap.height,
                            self.config.page_width,
                            self.config.page_height
                        );
                        LetterDefinition {
                            x_advance: raster.advance,
                            valid_definition: false,
                            ..LetterDefinition::default()
                        }
                    }),
                None => {
                    if raster.advance == 0 {
                        log::debug!("font atlas has no glyph for {:?}", code);
                    }
                    self.pages.skip(1);
                    LetterDefinition::blank(raster.advance)
                }
            };
            self.letters.insert(code, definition);
        }

        self.pages.flush();
        true
    }

    /// The definition stored for `code`.
    ///
    /// Check [`LetterDefinition::valid_definition`] before drawing; invalid definitions still
    /// carry the advance.
    pub fn lookup(&self, code: char) -> Option<LetterDefinition> {
        self.letters.get(&code).copied()
    }

    /// Number of stored definitions.
    pub fn letter_count(&self) -> usize {
        self.letters.len()
    }

    /// All stored definitions, in no particular order.
    pub fn letters(&self) -> impl Iterator<Item = (char, &LetterDefinition)> + '_ {
        self.letters.iter().map(|(code, definition)| (*code, definition))
    }

    /// Store a definition, replacing any previous one for `code`.
    pub fn add_letter_definition(&mut self, code: char, definition: LetterDefinition) {
        self.letters.insert(code, definition);
    }

    /// Scale the drawing metrics of every stored definition.
    pub fn scale_letter_definitions(&mut self, factor: f32) {
        for definition in self.letters.values_mut() {
            definition.scale(factor);
        }
    }

    /// Drop every placement and restart packing on an empty page 0.
    ///
    /// Page textures are invalidated and reused as packing reaches them again. Glyphs are
    /// rasterized again on the next [`ensure_resident`](Self::ensure_resident).
    pub fn full_reset(&mut self) {
        self.letters.clear();
        self.pages.reset();
        self.generation = self.generation.wrapping_add(1);
        log::debug!(
            "font atlas {:?} reset, generation {}",
            self.font_name(),
            self.generation
        );
    }

    /// The rendering context lost its GPU resources.
    pub fn on_context_lost(&mut self) {
        self.pages.invalidate_all();
    }

    /// The rendering context was recreated; every glyph must be rasterized again.
    ///
    /// Text using this atlas should be laid out again; [`generation`](Self::generation)
    /// changes to signal it.
    pub fn on_context_restored(&mut self) {
        self.full_reset();
    }

    /// Counter bumped on every full reset.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The primary face.
    #[inline]
    pub fn font(&self) -> &Rc<S> {
        &self.font
    }

    /// File name of the primary face, without its directory.
    pub fn font_name(&self) -> &str {
        let name = self.font.font_name();
        match name.rfind(['/', '\\']) {
            Some(index) => &name[index + 1..],
            None => name,
        }
    }

    /// Fallback faces and glyph routing.
    #[inline]
    pub fn fallback(&self) -> &FallbackResolver<S> {
        &self.fallback
    }

    /// Construction parameters.
    #[inline]
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Page width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.config.page_width
    }

    /// Page height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.config.page_height
    }

    /// Content scale factor.
    #[inline]
    pub fn scale_factor(&self) -> f32 {
        self.config.scale_factor
    }

    /// Pixel layout of the pages.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.pages.pixel_format()
    }

    /// Height of a line of text.
    #[inline]
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Override the height of a line of text.
    pub fn set_line_height(&mut self, line_height: f32) {
        self.line_height = line_height;
    }

    /// Distance from the top of the line to the baseline.
    #[inline]
    pub fn font_ascender(&self) -> i32 {
        self.font_ascender
    }

    /// Whether pages use linear filtering.
    #[inline]
    pub fn antialias(&self) -> bool {
        self.config.antialias
    }

    /// Switch every page between linear and nearest filtering.
    pub fn set_antialias(&mut self, enabled: bool) {
        if self.config.antialias != enabled {
            self.config.antialias = enabled;
            self.pages.set_antialias(enabled);
        }
    }

    /// The packer, with its cursor and scratch buffer.
    #[inline]
    pub fn pages(&self) -> &PageAllocator<T> {
        &self.pages
    }

    /// Number of pages.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.page_count()
    }

    /// The texture of page `slot`.
    #[inline]
    pub fn texture(&self, slot: usize) -> Option<&T> {
        self.pages.textures().get(slot)
    }

    /// Install a texture for page `slot`, replacing an existing one or appending the next page.
    ///
    /// Returns `false` when `slot` would leave a gap in the page list.
    pub fn set_texture(&mut self, slot: usize, texture: T) -> bool {
        self.pages.set_texture(slot, texture)
    }

    pub(crate) fn pages_mut(&mut self) -> &mut PageAllocator<T> {
        &mut self.pages
    }
}

impl<S, T> Debug for FontAtlas<S, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FontAtlas")
            .field("config", &self.config)
            .field("letters", &self.letters.len())
            .field("pages", &self.pages)
            .field("fallback", &self.fallback)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Padding and scaling applied to every glyph of a batch.
struct CellLayout {
    letter_padding: u32,
    letter_edge_extend: u32,
    ascender: i32,
    scale_factor: f32,
}

impl CellLayout {
    /// Place `bitmap`, copy it into the page and describe where it went.
    ///
    /// Returns `None` when the padded cell is larger than a page.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "cell sizes are bounded by the page size"
    )]
    fn pack<T: AtlasTexture>(
        &self,
        pages: &mut PageAllocator<T>,
        bitmap: &GlyphBitmap<'_>,
        advance: i32,
    ) -> Option<LetterDefinition> {
        let padding = self.letter_padding + self.letter_edge_extend;
        let adjust = (self.letter_padding / 2 + self.letter_edge_extend / 2) as f32;
        let cell_width = bitmap.bounds.width + padding as f32;
        let cell_height = bitmap.bounds.height + padding as f32;

        // The shelf reserves the bitmap rows; the definition reports the source bounds.
        let placement = pages.place(cell_width.ceil() as u32, bitmap.height + padding)?;
        let inset = self.letter_edge_extend / 2;
        pages.blit(placement.x + inset, placement.y + inset, bitmap);

        let scale = self.scale_factor;
        Some(LetterDefinition {
            u: placement.x as f32 / scale,
            v: placement.y as f32 / scale,
            width: cell_width / scale,
            height: cell_height / scale,
            offset_x: bitmap.bounds.x - adjust,
            offset_y: self.ascender as f32 + bitmap.bounds.y - adjust,
            x_advance: advance,
            texture_id: placement.page,
            rotated: false,
            valid_definition: true,
        })
    }
}
