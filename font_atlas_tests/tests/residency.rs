// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for making glyphs resident, looking them up and resetting the atlas.

use font_atlas::LetterDefinition;
use font_atlas_dev::{ScriptedFont, ScriptedGlyph, Upload};

use crate::util::{atlas, latin_font, metrics};

fn ab_font() -> ScriptedFont {
    ScriptedFont::new("fonts/ab.ttf", metrics())
        .glyph('A', ScriptedGlyph::solid(20, 30, 21))
        .glyph('B', ScriptedGlyph::solid(15, 30, 16))
}

#[test]
fn residency_end_to_end_ab() {
    let mut atlas = atlas(ab_font(), 512, 512);
    assert!(atlas.ensure_resident("AB"));

    let a = atlas.lookup('A').unwrap();
    let b = atlas.lookup('B').unwrap();
    assert_eq!((a.u, a.v, a.width, a.height), (0.0, 0.0, 22.0, 32.0));
    assert_eq!((b.u, b.v, b.width, b.height), (23.0, 0.0, 17.0, 32.0));
    assert_eq!((a.texture_id, b.texture_id), (0, 0));
    assert_eq!(atlas.letter_count(), 2);

    assert_eq!(atlas.pages().origin(), (41, 0));
    assert_eq!(atlas.pages().line_height(), 32);
    assert_eq!(atlas.page_count(), 1);
    assert_eq!(atlas.texture(0).unwrap().uploads(), [Upload::Sub {
        x: 0,
        y: 0,
        width: 512,
        height: 32
    }]);
}

#[test]
fn residency_is_idempotent() {
    let mut atlas = atlas(latin_font(10, 12), 128, 128);
    assert!(atlas.ensure_resident("hello"));
    let uploads = atlas.texture(0).unwrap().uploads().len();
    let letters = atlas.letter_count();

    assert!(!atlas.ensure_resident("hello"));
    assert!(!atlas.ensure_resident("hole"));
    assert_eq!(atlas.texture(0).unwrap().uploads().len(), uploads);
    assert_eq!(atlas.letter_count(), letters);
    assert_eq!(letters, 4, "duplicate characters are placed once");
}

#[test]
fn residency_only_adds_new_characters() {
    let mut atlas = atlas(latin_font(10, 12), 128, 128);
    atlas.ensure_resident("ab");
    let before = atlas.lookup('a').unwrap();
    assert!(atlas.ensure_resident("abc"));
    assert_eq!(atlas.lookup('a').unwrap(), before);
    assert_eq!(atlas.lookup('c').unwrap().u, 26.0);
}

#[test]
fn residency_offsets_follow_bearing_and_ascender() {
    let font = ScriptedFont::new("fonts/bearing.ttf", metrics())
        .glyph('g', ScriptedGlyph::solid(8, 12, 9).with_bearing(1.0, -8.0));
    let mut atlas = atlas(font, 64, 64);
    atlas.ensure_resident("g");
    let g = atlas.lookup('g').unwrap();
    // Half the 2px edge extend is removed from both offsets.
    assert_eq!(g.offset_x, 0.0);
    assert_eq!(g.offset_y, 24.0 - 8.0 - 1.0);
    assert_eq!(g.x_advance, 9);
    assert!(g.valid_definition);
    assert!(!g.rotated);
}

#[test]
fn residency_blank_glyph_keeps_advance() {
    let mut atlas = atlas(latin_font(10, 12), 128, 128);
    atlas.ensure_resident(" a");
    let space = atlas.lookup(' ').unwrap();
    assert_eq!(space, LetterDefinition::blank(6));
    assert!(space.valid_definition);
    // The blank glyph moved the cursor by one pixel before 'a' was placed.
    assert_eq!(atlas.lookup('a').unwrap().u, 1.0);
}

#[test]
fn residency_missing_glyph_is_invalid_but_recorded() {
    let mut atlas = atlas(latin_font(10, 12), 128, 128);
    assert!(atlas.ensure_resident("\u{263a}"));
    let missing = atlas.lookup('\u{263a}').unwrap();
    assert!(!missing.valid_definition);
    assert_eq!(missing.x_advance, 0);
    assert!(atlas.lookup('z').is_none(), "never requested");
}

#[test]
fn residency_empty_text_does_nothing() {
    let mut atlas = atlas(latin_font(10, 12), 128, 128);
    assert!(!atlas.ensure_resident(""));
    assert_eq!(atlas.page_count(), 0);
}

#[test]
fn residency_accepts_char_iterators() {
    let mut atlas = atlas(latin_font(10, 12), 128, 128);
    assert!(atlas.ensure_resident_chars(['x', 'y', 'x']));
    assert_eq!(atlas.letter_count(), 2);
}

#[test]
fn residency_borrowed_bitmaps_are_copied_into_the_page() {
    let font = latin_font(4, 4).borrowed_bitmaps();
    let mut atlas = atlas(font, 32, 32);
    atlas.ensure_resident("a");
    assert_eq!(atlas.texture(0).unwrap().pixel(1, 1), [0xff]);
}

#[test]
fn reset_clears_letters_and_restarts_page_zero() {
    let mut atlas = atlas(latin_font(20, 20), 30, 48);
    atlas.ensure_resident("abc");
    assert_eq!(atlas.page_count(), 2);

    atlas.full_reset();
    assert!(atlas.lookup('a').is_none());
    assert_eq!(atlas.letter_count(), 0);
    assert_eq!(atlas.generation(), 1);
    assert_eq!(atlas.pages().current_page(), Some(0));
    assert_eq!(atlas.pages().origin(), (0, 0));
    assert!(atlas.pages().page_data().iter().all(|&byte| byte == 0));
    // Page 0 was repopulated with an empty page, page 1 waits to be reused.
    assert!(!atlas.texture(0).unwrap().is_invalidated());
    assert!(atlas.texture(1).unwrap().is_invalidated());

    assert!(atlas.ensure_resident("c"));
    let c = atlas.lookup('c').unwrap();
    assert_eq!((c.u, c.v, c.texture_id), (0.0, 0.0, 0));
    assert_eq!(atlas.page_count(), 2, "textures are reused, not recreated");
}

#[test]
fn reset_after_context_loss() {
    let mut atlas = atlas(latin_font(10, 10), 64, 64);
    atlas.ensure_resident("ab");
    atlas.on_context_lost();
    assert!(atlas.texture(0).unwrap().is_invalidated());
    assert!(atlas.lookup('a').is_some(), "definitions survive until the context is back");

    atlas.on_context_restored();
    assert_eq!(atlas.generation(), 1);
    assert!(atlas.lookup('a').is_none());
    assert!(atlas.ensure_resident("ab"));
    assert_eq!(atlas.texture(0).unwrap().uploads().last(), Some(&Upload::Sub {
        x: 0,
        y: 0,
        width: 64,
        height: 12
    }));
}

#[test]
fn residency_manual_definitions_and_scaling() {
    let mut atlas = atlas(latin_font(10, 10), 64, 64);
    atlas.add_letter_definition('?', LetterDefinition {
        width: 10.0,
        height: 20.0,
        offset_x: 2.0,
        x_advance: 8,
        valid_definition: true,
        ..LetterDefinition::default()
    });
    atlas.scale_letter_definitions(0.5);
    let question = atlas.lookup('?').unwrap();
    assert_eq!((question.width, question.height, question.offset_x), (5.0, 10.0, 1.0));
    assert_eq!(question.x_advance, 4);
    assert!(!atlas.ensure_resident("?"), "already defined");
}

#[test]
fn residency_font_accessors() {
    let mut atlas = atlas(latin_font(10, 10), 64, 64);
    assert_eq!(atlas.font_name(), "latin.ttf");
    assert_eq!(atlas.line_height(), 32.0);
    assert_eq!(atlas.font_ascender(), 24);
    atlas.set_line_height(40.0);
    assert_eq!(atlas.line_height(), 40.0);

    atlas.ensure_resident("a");
    assert!(atlas.texture(0).unwrap().antialias());
    atlas.set_antialias(false);
    assert!(!atlas.antialias());
    assert!(!atlas.texture(0).unwrap().antialias());
}
