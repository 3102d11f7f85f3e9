// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font Atlas rasterizes glyphs on demand and packs them into fixed-size texture pages.
//!
//! The central type is [`FontAtlas`]. Text layout code asks it to make the characters of a
//! string resident with [`FontAtlas::ensure_resident`], then reads placement metadata back with
//! [`FontAtlas::lookup`]. Glyphs are packed with a shelf packer, missing glyphs are routed
//! through fallback faces, and only the rows written since the last sync are uploaded to the
//! page texture.
//!
//! Rasterization and texture storage are supplied by the caller through the [`GlyphSource`]
//! and [`AtlasTexture`] traits.
//!
//! ## Features
//!
//! - `std` (enabled by default): Get floating point functions from the standard library
//!   (likely using your target's libc).
//! - `libm`: Use floating point implementations from [libm].
//! - `persist` (enabled by default): Load and save atlas files, and the [`AtlasRegistry`]
//!   file loaders.
//! - `vello_cpu` (enabled by default): A [`GlyphSource`] backed by skrifa and Vello CPU, and an
//!   [`AtlasTexture`] backed by a Vello `Pixmap`.
//!
//! At least one of `std` and `libm` is required; `std` overrides `libm`.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// Suppress the unused_crate_dependencies lint when both std and libm are specified.
#[cfg(all(feature = "std", feature = "libm"))]
use core_maths as _;

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "vello_cpu")]
use vello_common::{kurbo, peniko};

mod atlas;
mod registry;
mod source;
mod texture;

#[cfg(feature = "persist")]
pub mod persist;

pub mod renderers;

pub use atlas::{
    AtlasConfig, DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH, DISTANCE_MAP_SPREAD, DirtyRegion,
    FallbackResolver, FontAtlas, LETTER_EDGE_EXTEND, LetterDefinition, PageAllocator, Placement,
};
pub use registry::{AtlasRegistry, SharedAtlas};
pub use source::{
    FaceMetrics, FontFaceInfo, GlyphBitmap, GlyphRaster, GlyphRect, GlyphResolution, GlyphSource,
};
pub use texture::{AtlasTexture, PixelFormat};

#[cfg(feature = "persist")]
pub use persist::{ATLAS_FILE_TYPE, AtlasDocument, AtlasFileError, LetterRecord};
