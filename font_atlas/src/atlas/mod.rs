// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic glyph atlas.
//!
//! This module provides a glyph atlas that:
//! - Rasterizes glyphs the first time a piece of text needs them
//! - Packs glyph bitmaps into fixed-size pages with a shelf packer
//! - Routes glyphs missing from the primary face through fallback faces
//! - Uploads only the rows written since the last sync
//!
//! The work is split between [`PageAllocator`] (packing, scratch buffer, page textures),
//! [`DirtyRegion`] (upload window), [`FallbackResolver`] (missing glyph routing) and the
//! orchestrating [`FontAtlas`].

mod fallback;
mod font_atlas;
mod letter;
mod page;

pub use fallback::FallbackResolver;
pub use font_atlas::{
    AtlasConfig, DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH, DISTANCE_MAP_SPREAD, FontAtlas,
    LETTER_EDGE_EXTEND,
};
pub use letter::LetterDefinition;
pub use page::{DirtyRegion, PageAllocator, Placement};
