// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing of glyphs missing from the primary face to fallback faces.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt::{Debug, Formatter};
use hashbrown::HashMap;

use crate::source::{GlyphRaster, GlyphSource};

/// Finds and remembers fallback faces for characters the primary face lacks.
///
/// Two caches are kept:
/// - per character, the fallback face and glyph index that rendered it, so repeated requests
///   skip resolution entirely;
/// - per family name, the instantiated fallback face, so characters from the same fallback
///   family share one face.
pub struct FallbackResolver<S> {
    glyph_fallbacks: HashMap<char, (Rc<S>, u32)>,
    family_fonts: HashMap<String, Rc<S>>,
}

impl<S: GlyphSource> FallbackResolver<S> {
    /// Creates a resolver with empty caches.
    pub fn new() -> Self {
        Self {
            glyph_fallbacks: HashMap::new(),
            family_fonts: HashMap::new(),
        }
    }

    /// Rasterize `code`, from `primary` if it has the glyph and from a fallback face otherwise.
    ///
    /// When no face can render the glyph the raster of `primary` is returned, which keeps the
    /// advance the primary face reported.
    pub fn rasterize<'a>(&'a mut self, code: char, primary: &'a S) -> GlyphRaster<'a> {
        if self.glyph_fallbacks.contains_key(&code) {
            let (font, glyph_index) = &self.glyph_fallbacks[&code];
            return font.glyph_bitmap_by_index(*glyph_index);
        }

        let raster = primary.glyph_bitmap(code);
        if raster.bitmap.is_some() {
            return raster;
        }
        let Some(resolution) = raster.resolution.clone() else {
            return raster;
        };

        let font = match self.family_fonts.get(&resolution.face.family) {
            Some(font) => Rc::clone(font),
            None => {
                let Some(font) = primary.create_fallback(&resolution.face) else {
                    log::warn!(
                        "font atlas could not create fallback face {:?} for {:?}",
                        resolution.face.family,
                        code
                    );
                    return raster;
                };
                log::debug!(
                    "font atlas created fallback face {:?}",
                    resolution.face.family
                );
                let font = Rc::new(font);
                self.family_fonts
                    .insert(resolution.face.family.clone(), Rc::clone(&font));
                font
            }
        };

        self.glyph_fallbacks
            .insert(code, (font, resolution.glyph_index));
        let (font, glyph_index) = &self.glyph_fallbacks[&code];
        font.glyph_bitmap_by_index(*glyph_index)
    }

    /// The fallback face and glyph index cached for `code`.
    pub fn cached(&self, code: char) -> Option<(&S, u32)> {
        self.glyph_fallbacks
            .get(&code)
            .map(|(font, glyph_index)| (&**font, *glyph_index))
    }

    /// The fallback face instantiated for `family`.
    pub fn family(&self, family: &str) -> Option<&S> {
        self.family_fonts.get(family).map(|font| &**font)
    }

    /// Number of instantiated fallback faces.
    pub fn family_count(&self) -> usize {
        self.family_fonts.len()
    }

    /// Number of characters routed to a fallback face.
    pub fn glyph_count(&self) -> usize {
        self.glyph_fallbacks.len()
    }
}

impl<S: GlyphSource> Default for FallbackResolver<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Debug for FallbackResolver<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FallbackResolver")
            .field("glyph_fallbacks", &self.glyph_fallbacks.len())
            .field("family_fonts", &self.family_fonts.len())
            .finish()
    }
}
