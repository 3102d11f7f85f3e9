// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shelf packing tests.

use font_atlas::{FontAtlas, LetterDefinition, Placement};
use font_atlas_dev::{ScriptedFont, ScriptedGlyph};

use crate::util::{TestAtlas, atlas, cell, latin_font, metrics, simulate_shelves};

const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Glyph sizes vary per letter so shelves get uneven heights.
fn varied_glyph(index: usize) -> ScriptedGlyph {
    let width = 5 + (index as u32 * 7) % 13;
    let height = 4 + (index as u32 * 5) % 11;
    ScriptedGlyph::solid(width, height, width as i32)
}

fn varied_font() -> ScriptedFont {
    LETTERS
        .chars()
        .enumerate()
        .fold(ScriptedFont::new("varied.ttf", metrics()), |font, (index, code)| {
            font.glyph(code, varied_glyph(index))
        })
}

fn placement(definition: &LetterDefinition) -> Placement {
    Placement {
        x: definition.u as u32,
        y: definition.v as u32,
        page: definition.texture_id,
    }
}

fn overlaps(a: &LetterDefinition, b: &LetterDefinition) -> bool {
    a.texture_id == b.texture_id
        && a.u < b.u + b.width
        && b.u < a.u + a.width
        && a.v < b.v + b.height
        && b.v < a.v + a.height
}

#[test]
fn packing_matches_reference_shelf_simulation() {
    let mut atlas = atlas(varied_font(), 64, 64);
    assert!(atlas.ensure_resident(LETTERS));

    // Characters are packed in code point order, which is also the order of `LETTERS`.
    let cells: Vec<_> = (0..LETTERS.len())
        .map(|index| {
            let glyph = varied_glyph(index);
            cell(glyph.width, glyph.height)
        })
        .collect();
    let expected = simulate_shelves(&cells, 64, 64);

    for (code, expected) in LETTERS.chars().zip(&expected) {
        let definition = atlas.lookup(code).unwrap();
        assert_eq!(placement(&definition), *expected, "placement of {code:?}");
    }
    let pages = expected.last().unwrap().page as usize + 1;
    assert!(pages > 1, "the sequence should span several pages");
    assert_eq!(atlas.page_count(), pages);
}

#[test]
fn packing_never_overlaps_and_stays_in_page() {
    let mut atlas = atlas(varied_font(), 64, 64);
    atlas.ensure_resident(LETTERS);

    let definitions: Vec<_> = atlas.letters().map(|(_, definition)| *definition).collect();
    for (index, a) in definitions.iter().enumerate() {
        assert!(a.u + a.width <= 64.0 && a.v + a.height <= 64.0, "{a:?} leaves the page");
        for b in &definitions[index + 1..] {
            assert!(!overlaps(a, b), "{a:?} overlaps {b:?}");
        }
    }
}

#[test]
fn packing_wraps_to_next_shelf() {
    // Cells are 22 wide: two fit on a 48 wide shelf (0 and 23), the third wraps.
    let mut atlas = atlas(latin_font(20, 10), 48, 64);
    atlas.ensure_resident("abc");
    assert_eq!(placement(&atlas.lookup('a').unwrap()), Placement { x: 0, y: 0, page: 0 });
    assert_eq!(placement(&atlas.lookup('b').unwrap()), Placement { x: 23, y: 0, page: 0 });
    assert_eq!(placement(&atlas.lookup('c').unwrap()), Placement { x: 0, y: 12, page: 0 });
    assert_eq!(atlas.pages().origin(), (23, 12));
}

#[test]
fn packing_starts_new_page_when_full() {
    // One 22 × 22 cell per shelf and two shelves per page.
    let mut atlas = atlas(latin_font(20, 20), 30, 48);
    atlas.ensure_resident("abc");
    let pages: Vec<_> = "abc"
        .chars()
        .map(|code| atlas.lookup(code).unwrap().texture_id)
        .collect();
    assert_eq!(pages, [0, 0, 1]);
    assert_eq!(atlas.page_count(), 2);
    assert_eq!(atlas.pages().current_page(), Some(1));
    // Page 0 was flushed before page 1 started.
    assert_eq!(atlas.texture(0).unwrap().sub_uploads(), [(0, 0, 30, 44)]);
    assert_eq!(atlas.texture(1).unwrap().sub_uploads(), [(0, 0, 30, 22)]);
}

#[test]
fn packing_blits_inside_the_edge_extend() {
    let font = ScriptedFont::new("blit.ttf", metrics())
        .glyph('x', ScriptedGlyph::solid(2, 2, 3).with_value(7));
    let mut atlas = atlas(font, 16, 16);
    atlas.ensure_resident("x");
    let page = atlas.texture(0).unwrap();
    assert_eq!(page.pixel(0, 0), [0]);
    assert_eq!(page.pixel(1, 1), [7]);
    assert_eq!(page.pixel(2, 2), [7]);
    assert_eq!(page.pixel(3, 3), [0]);
}

#[test]
fn packing_two_channel_pages() {
    let font = ScriptedFont::new(
        "outlined.ttf",
        font_atlas::FaceMetrics {
            outline_size: 1.0,
            ..metrics()
        },
    )
    .glyph('o', ScriptedGlyph::solid(3, 3, 4).with_value(9));
    let mut atlas = atlas(font, 16, 16);
    atlas.ensure_resident("o");
    let page = atlas.texture(0).unwrap();
    assert_eq!(page.pixels().len(), 16 * 16 * 2);
    assert_eq!(page.pixel(1, 1), [9, 9]);
    assert_eq!(atlas.line_height(), 34.0);
}

#[test]
fn packing_rejects_glyph_larger_than_page() {
    let font = latin_font(8, 8).glyph('W', ScriptedGlyph::solid(40, 8, 41));
    let mut atlas: TestAtlas = atlas(font, 32, 32);
    assert!(atlas.ensure_resident("WA"));
    let wide = atlas.lookup('W').unwrap();
    assert!(!wide.valid_definition);
    assert_eq!(wide.x_advance, 41);
    // The next glyph still packs at the origin of page 0.
    let a = atlas.lookup('A').unwrap();
    assert!(a.valid_definition);
    assert_eq!(placement(&a), Placement { x: 0, y: 0, page: 0 });
    assert_eq!(atlas.page_count(), 1);
}

#[test]
fn packing_uses_default_page_size() {
    let atlas: TestAtlas = FontAtlas::new(std::rc::Rc::new(latin_font(4, 4)));
    assert_eq!((atlas.width(), atlas.height()), (512, 512));
    assert_eq!(atlas.page_count(), 0, "pages are created on first use");
}
