// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions and types shared across tests.

use std::rc::Rc;

use font_atlas::{AtlasConfig, FaceMetrics, FontAtlas, LETTER_EDGE_EXTEND, Placement};
use font_atlas_dev::{RecordingTexture, ScriptedFont, ScriptedGlyph};

pub(crate) type TestAtlas = FontAtlas<ScriptedFont, RecordingTexture>;

/// Metrics of a plain single-channel face.
pub(crate) fn metrics() -> FaceMetrics {
    FaceMetrics {
        max_height: 32.0,
        ascender: 24,
        outline_size: 0.0,
        distance_field: false,
    }
}

/// A font with a `width` × `height` glyph for every ASCII letter and a blank space.
pub(crate) fn latin_font(width: u32, height: u32) -> ScriptedFont {
    ScriptedFont::new("fonts/latin.ttf", metrics())
        .glyphs(
            "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
            ScriptedGlyph::solid(width, height, width as i32 + 1),
        )
        .glyph(' ', ScriptedGlyph::blank(6))
}

/// An atlas over `font` with `page_width` × `page_height` pages.
pub(crate) fn atlas(font: ScriptedFont, page_width: u32, page_height: u32) -> TestAtlas {
    FontAtlas::with_config(
        Rc::new(font),
        AtlasConfig {
            page_width,
            page_height,
            ..AtlasConfig::default()
        },
    )
}

/// Size of the cell packed for a `width` × `height` bitmap of a plain face.
pub(crate) fn cell(width: u32, height: u32) -> (u32, u32) {
    (width + LETTER_EDGE_EXTEND, height + LETTER_EDGE_EXTEND)
}

/// Straightforward shelf packing: left to right with a one pixel gap, new shelf below the
/// tallest cell, new page when the shelf runs out of height.
pub(crate) fn simulate_shelves(
    cells: &[(u32, u32)],
    page_width: u32,
    page_height: u32,
) -> Vec<Placement> {
    let (mut x, mut y, mut shelf, mut page) = (0, 0, 0, 0);
    let mut placements = Vec::with_capacity(cells.len());
    for &(width, height) in cells {
        if x + width > page_width {
            x = 0;
            y += shelf;
            shelf = 0;
        }
        if y + height > page_height {
            page += 1;
            x = 0;
            y = 0;
            shelf = 0;
        }
        placements.push(Placement { x, y, page });
        shelf = shelf.max(height);
        x += width + 1;
    }
    placements
}
