// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content scale factor tests.

use std::rc::Rc;

use font_atlas::{AtlasConfig, FaceMetrics, FontAtlas};
use font_atlas_dev::{RecordingTexture, ScriptedFont, ScriptedGlyph};

use crate::util::metrics;

fn scaled_atlas(
    font: ScriptedFont,
    scale_factor: f32,
) -> FontAtlas<ScriptedFont, RecordingTexture> {
    FontAtlas::with_config(
        Rc::new(font),
        AtlasConfig {
            page_width: 256,
            page_height: 256,
            scale_factor,
            ..AtlasConfig::default()
        },
    )
}

#[test]
fn scale_divides_placement_geometry() {
    // A 38 × 38 bitmap plus the 2px edge extend makes a 40 × 40 raw cell.
    let font = ScriptedFont::new("fonts/big.ttf", metrics())
        .glyph('M', ScriptedGlyph::solid(38, 38, 40))
        .glyph('N', ScriptedGlyph::solid(38, 38, 40));
    let mut atlas = scaled_atlas(font, 2.0);
    atlas.ensure_resident("MN");

    let m = atlas.lookup('M').unwrap();
    let n = atlas.lookup('N').unwrap();
    assert!((m.width - 20.0).abs() < 1e-6 && (m.height - 20.0).abs() < 1e-6);
    assert!((n.u - 20.5).abs() < 1e-6, "raw x 41 in logical units");
    assert_eq!(m.x_advance, 40, "advances stay in raw pixels");
    // Offsets are not divided by the scale factor.
    assert_eq!(m.offset_x, -1.0);
    assert_eq!(m.offset_y, 24.0 - 38.0 - 1.0);
}

#[test]
fn scale_grows_distance_field_padding() {
    let font = ScriptedFont::new(
        "fonts/sdf.ttf",
        FaceMetrics {
            distance_field: true,
            ..metrics()
        },
    )
    .glyph('S', ScriptedGlyph::solid(10, 10, 12));
    let mut atlas = scaled_atlas(font, 2.0);
    atlas.ensure_resident("S");

    // Padding is 2 * 6 * 2 = 24 pixels, plus the 2px edge extend.
    let s = atlas.lookup('S').unwrap();
    assert_eq!(s.width, (10.0 + 24.0 + 2.0) / 2.0);
    assert_eq!(s.offset_x, -(12.0 + 1.0));
    assert_eq!(atlas.pages().origin(), (37, 0));
}
