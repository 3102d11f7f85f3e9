// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement metadata of a resident glyph.

/// Location and metrics of a glyph within an atlas page.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LetterDefinition {
    /// X position of the cell in the page (logical units).
    pub u: f32,

    /// Y position of the cell in the page (logical units).
    pub v: f32,

    /// Width of the cell including padding (logical units).
    pub width: f32,

    /// Height of the cell including padding (logical units).
    pub height: f32,

    /// Horizontal drawing offset from the pen position.
    pub offset_x: f32,

    /// Vertical drawing offset from the top of the line.
    pub offset_y: f32,

    /// Horizontal pen advance in pixels.
    ///
    /// Unlike the geometry above this is not divided by the scale factor.
    pub x_advance: i32,

    /// Index of the page holding the glyph.
    pub texture_id: u32,

    /// Always `false`; kept for compatibility with atlas files written by external tools.
    pub rotated: bool,

    /// Whether the definition may be used for layout.
    ///
    /// Blank glyphs that still move the pen, such as spaces, are valid with zero-sized
    /// geometry. A glyph no face could render and that has no advance is invalid, as is a glyph
    /// too large for a page.
    pub valid_definition: bool,
}

impl LetterDefinition {
    /// A definition without pixels that only moves the pen.
    pub fn blank(x_advance: i32) -> Self {
        Self {
            x_advance,
            valid_definition: x_advance != 0,
            ..Self::default()
        }
    }

    /// Scale the drawing metrics, as done when a label renders at a different size than the
    /// atlas face.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "advances are whole pixels, matching how they were rasterized"
    )]
    pub fn scale(&mut self, factor: f32) {
        self.width *= factor;
        self.height *= factor;
        self.offset_x *= factor;
        self.offset_y *= factor;
        self.x_advance = (self.x_advance as f32 * factor) as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_definition_validity_follows_advance() {
        assert!(LetterDefinition::blank(7).valid_definition, "space still advances");
        assert!(!LetterDefinition::blank(0).valid_definition, "nothing to draw or advance");
        assert_eq!(LetterDefinition::blank(7).width, 0.0);
    }

    #[test]
    fn scale_leaves_texture_coordinates() {
        let mut def = LetterDefinition {
            u: 10.0,
            v: 20.0,
            width: 8.0,
            height: 12.0,
            offset_x: -1.0,
            offset_y: 3.0,
            x_advance: 9,
            ..LetterDefinition::default()
        };
        def.scale(0.5);
        assert_eq!((def.u, def.v), (10.0, 20.0));
        assert_eq!((def.width, def.height), (4.0, 6.0));
        assert_eq!((def.offset_x, def.offset_y), (-0.5, 1.5));
        assert_eq!(def.x_advance, 4);
    }
}
