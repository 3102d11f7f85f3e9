// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The page texture interface consumed by the atlas.

use alloc::vec::Vec;

/// Pixel layout of an atlas page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One coverage byte per pixel.
    R8,
    /// Coverage and outline bytes per pixel.
    Rg8,
}

impl PixelFormat {
    /// Number of bytes per pixel.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        1 << self.stride_shift()
    }

    /// Left shift turning a pixel count into a byte count.
    #[inline]
    pub fn stride_shift(self) -> u32 {
        match self {
            Self::R8 => 0,
            Self::Rg8 => 1,
        }
    }
}

/// One texture page of a [`FontAtlas`](crate::FontAtlas).
///
/// Offsets and sizes are in pixels. `data` always starts at the first byte of the updated
/// region and rows span the full page width.
pub trait AtlasTexture: Sized {
    /// Create a page initialized with `data`.
    fn create_with_data(data: &[u8], format: PixelFormat, width: u32, height: u32) -> Self;

    /// Replace the whole content of the page.
    fn update_data(&mut self, data: &[u8], width: u32, height: u32);

    /// Replace the rows `[y_offset, y_offset + height)` of the columns
    /// `[x_offset, x_offset + width)`.
    fn update_sub_data(&mut self, data: &[u8], x_offset: u32, y_offset: u32, width: u32, height: u32);

    /// Mark the GPU resource as lost. The page keeps its slot and is repopulated through
    /// [`update_data`](Self::update_data).
    fn invalidate(&mut self);

    /// Switch between linear (`true`) and nearest (`false`) filtering.
    fn set_antialias(&mut self, enabled: bool) {
        let _ = enabled;
    }

    /// Read the page content back, if the texture keeps it somewhere accessible.
    ///
    /// Used when saving an atlas. The default implementation returns `None`.
    fn read_back(&self) -> Option<Vec<u8>> {
        None
    }
}
