// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shelf packing into fixed-size pages, with incremental upload of written rows.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use smallvec::SmallVec;

use crate::source::GlyphBitmap;
use crate::texture::{AtlasTexture, PixelFormat};

/// Gap in pixels left between two glyphs on the same shelf.
const GLYPH_GUTTER: u32 = 1;

/// Where a glyph cell was placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Left edge of the cell in pixels.
    pub x: u32,
    /// Top edge of the cell in pixels.
    pub y: u32,
    /// Index of the page holding the cell.
    pub page: u32,
}

/// The rows of a page written since the last upload.
///
/// The window spans from the first to the last row written, so a batch that starts a new shelf
/// uploads from the top of that shelf rather than from the shelf it resumed on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyRegion {
    start_y: u32,
    end_y: u32,
}

impl DirtyRegion {
    /// An empty region anchored at row `start_y`.
    pub fn new(start_y: u32) -> Self {
        Self {
            start_y,
            end_y: start_y,
        }
    }

    /// Start a new accumulation window at row `start_y`.
    pub fn begin(&mut self, start_y: u32) {
        *self = Self::new(start_y);
    }

    /// Whether nothing was written since the window started.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end_y <= self.start_y
    }

    /// Record that rows `[y, y + height)` were written.
    pub fn mark_written(&mut self, y: u32, height: u32) {
        if height == 0 {
            return;
        }
        if self.is_empty() {
            self.start_y = y;
            self.end_y = y + height;
        } else {
            self.start_y = self.start_y.min(y);
            self.end_y = self.end_y.max(y + height);
        }
    }

    /// First row of the window.
    #[inline]
    pub fn start_y(&self) -> u32 {
        self.start_y
    }

    /// One past the last written row.
    #[inline]
    pub fn end_y(&self) -> u32 {
        self.end_y
    }

    /// The `(start_y, height)` to upload, clamped to a page of `page_height` rows, or `None`
    /// when nothing is pending.
    pub fn pending(&self, page_height: u32) -> Option<(u32, u32)> {
        let available = page_height.checked_sub(self.start_y)?;
        let height = self.end_y.saturating_sub(self.start_y).min(available);
        (height > 0).then_some((self.start_y, height))
    }
}

/// Shelf packer over a sequence of equally sized pages.
///
/// Owns the page textures and the single CPU scratch buffer that mirrors the page currently
/// being filled. Glyphs are laid out left to right on a shelf; when a glyph does not fit the
/// remaining width, a new shelf starts below the tallest glyph of the current one, and when
/// it does not fit the remaining height, the page is flushed and a new page starts.
pub struct PageAllocator<T> {
    /// Page width in pixels.
    width: u32,
    /// Page height in pixels.
    height: u32,
    /// Pixel layout shared by every page.
    pixel_format: PixelFormat,
    /// Page textures, indexed by page number. Uses `SmallVec` with inline capacity of 1
    /// because most atlases fit on a single page.
    textures: SmallVec<[T; 1]>,
    /// CPU copy of the page being filled. Empty until the first page starts.
    page_data: Vec<u8>,
    /// Page being filled, `None` before packing starts.
    current_page: Option<usize>,
    /// Left edge of the next free cell.
    orig_x: u32,
    /// Top edge of the current shelf.
    orig_y: u32,
    /// Height of the tallest cell placed on the current shelf.
    line_height: u32,
    /// Rows written since the last upload.
    dirty: DirtyRegion,
    /// Filtering mode applied to new pages.
    antialias: bool,
}

impl<T: AtlasTexture> PageAllocator<T> {
    /// Creates an allocator for pages of `width` × `height` pixels.
    ///
    /// No memory is allocated until the first page starts.
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            pixel_format,
            textures: SmallVec::new(),
            page_data: Vec::new(),
            current_page: None,
            orig_x: 0,
            orig_y: 0,
            line_height: 0,
            dirty: DirtyRegion::new(0),
            antialias: true,
        }
    }

    /// Page width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Page height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout of every page.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Size in bytes of one page.
    #[inline]
    pub fn page_data_size(&self) -> usize {
        (self.width as usize * self.height as usize) << self.pixel_format.stride_shift()
    }

    /// Whether the scratch buffer exists and a page is being filled.
    #[inline]
    pub fn is_started(&self) -> bool {
        self.current_page.is_some() && !self.page_data.is_empty()
    }

    /// Index of the page being filled.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "page counts are far below u32::MAX"
    )]
    #[inline]
    pub fn current_page(&self) -> Option<u32> {
        self.current_page.map(|page| page as u32)
    }

    /// Position of the next free cell, `(x, y)`.
    #[inline]
    pub fn origin(&self) -> (u32, u32) {
        (self.orig_x, self.orig_y)
    }

    /// Height of the current shelf.
    #[inline]
    pub fn line_height(&self) -> u32 {
        self.line_height
    }

    /// Rows written on the current page since the last upload.
    #[inline]
    pub fn dirty_region(&self) -> DirtyRegion {
        self.dirty
    }

    /// The scratch buffer of the page being filled.
    #[inline]
    pub fn page_data(&self) -> &[u8] {
        &self.page_data
    }

    /// All page textures.
    #[inline]
    pub fn textures(&self) -> &[T] {
        &self.textures
    }

    /// Number of pages.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.textures.len()
    }

    /// Replace the texture in `slot`, or append it when `slot` is the next free page index.
    ///
    /// Returns `false` when `slot` would leave a gap in the page list.
    pub fn set_texture(&mut self, slot: usize, texture: T) -> bool {
        if let Some(existing) = self.textures.get_mut(slot) {
            *existing = texture;
            true
        } else if slot == self.textures.len() {
            self.textures.push(texture);
            true
        } else {
            false
        }
    }

    /// Set the filtering mode of every page, current and future.
    pub fn set_antialias(&mut self, enabled: bool) {
        self.antialias = enabled;
        for texture in &mut self.textures {
            texture.set_antialias(enabled);
        }
    }

    /// Allocate the scratch buffer if needed and restart packing on page 0.
    pub fn reinit(&mut self) {
        if self.page_data.is_empty() {
            self.page_data = vec![0; self.page_data_size()];
        }
        self.current_page = None;
        self.add_new_page();
    }

    /// Mark every page texture as lost. The textures keep their slots.
    pub fn invalidate_all(&mut self) {
        for texture in &mut self.textures {
            texture.invalidate();
        }
    }

    /// Invalidate every page and restart packing from an empty page 0.
    pub fn reset(&mut self) {
        self.invalidate_all();
        self.orig_x = 0;
        self.orig_y = 0;
        self.line_height = 0;
        self.reinit();
    }

    /// Start a new upload window at the current shelf.
    pub fn begin_batch(&mut self) {
        self.dirty.begin(self.orig_y);
    }

    /// Find room for a cell of `glyph_w` × `glyph_h` pixels.
    ///
    /// Returns `None`, leaving the packer untouched, when the cell is larger than a page.
    pub fn place(&mut self, glyph_w: u32, glyph_h: u32) -> Option<Placement> {
        if glyph_w > self.width || glyph_h > self.height {
            return None;
        }
        if !self.is_started() {
            self.reinit();
        }

        if self.orig_x + glyph_w > self.width {
            self.orig_y += self.line_height;
            self.line_height = 0;
            self.orig_x = 0;
        }
        if self.orig_y + glyph_h > self.height {
            self.flush();
            self.add_new_page();
        }

        let placement = Placement {
            x: self.orig_x,
            y: self.orig_y,
            page: self.current_page()?,
        };

        self.line_height = self.line_height.max(glyph_h);
        self.orig_x += glyph_w + GLYPH_GUTTER;
        self.dirty.mark_written(placement.y, glyph_h);

        Some(placement)
    }

    /// Move the cursor right without placing anything.
    pub fn skip(&mut self, pixels: u32) {
        self.orig_x += pixels;
    }

    /// Copy `bitmap` into the scratch buffer with its top-left corner at `(x, y)`.
    ///
    /// Pixels falling outside the page are dropped.
    pub fn blit(&mut self, x: u32, y: u32, bitmap: &GlyphBitmap<'_>) {
        if x >= self.width || y >= self.height || self.page_data.is_empty() {
            return;
        }
        let bpp = self.pixel_format.bytes_per_pixel();
        let cols = bitmap.width.min(self.width - x) as usize * bpp;
        let rows = bitmap.height.min(self.height - y) as usize;
        let src_stride = bitmap.width as usize * bpp;
        let dst_stride = self.width as usize * bpp;

        for row in 0..rows {
            let src_start = row * src_stride;
            let Some(src) = bitmap.data.get(src_start..src_start + cols) else {
                break;
            };
            let dst_start = (y as usize + row) * dst_stride + x as usize * bpp;
            self.page_data[dst_start..dst_start + cols].copy_from_slice(src);
        }
    }

    /// Upload the rows written since the last upload to the current page texture.
    ///
    /// Returns the `(start_y, height)` that was uploaded, if any.
    pub fn flush(&mut self) -> Option<(u32, u32)> {
        let page = self.current_page?;
        let pending = self.dirty.pending(self.height);
        if let Some((start_y, height)) = pending {
            let shift = self.pixel_format.stride_shift();
            let start = (self.width as usize * start_y as usize) << shift;
            let len = (self.width as usize * height as usize) << shift;
            if let Some(texture) = self.textures.get_mut(page) {
                texture.update_sub_data(
                    &self.page_data[start..start + len],
                    0,
                    start_y,
                    self.width,
                    height,
                );
            }
        }
        self.dirty.begin(self.orig_y);
        pending
    }

    /// Start the next page from externally provided pixels, such as a page read from an
    /// atlas file.
    ///
    /// Returns the expected size as an error when `data` is not exactly one page.
    pub fn load_page(&mut self, data: &[u8]) -> Result<u32, usize> {
        let expected = self.page_data_size();
        if data.len() != expected {
            return Err(expected);
        }
        if self.page_data.is_empty() {
            self.page_data = vec![0; expected];
        }
        self.page_data.copy_from_slice(data);
        self.next_page();
        self.orig_x = 0;
        self.orig_y = 0;
        self.line_height = 0;
        self.dirty.begin(0);
        self.current_page().ok_or(expected)
    }

    /// Restore the packer cursor, e.g. after loading pages from a file.
    pub fn set_cursor(&mut self, orig_x: u32, orig_y: u32, line_height: u32) {
        self.orig_x = orig_x;
        self.orig_y = orig_y;
        self.line_height = line_height;
        self.dirty.begin(orig_y);
    }

    /// Clear the scratch buffer and move on to an empty page.
    fn add_new_page(&mut self) {
        self.page_data.fill(0);
        self.next_page();
        self.orig_x = 0;
        self.orig_y = 0;
        self.line_height = 0;
        self.dirty.begin(0);
        log::debug!("font atlas started page {}", self.current_page.unwrap_or(0));
    }

    /// Push the scratch buffer to the texture of the next page, creating it if needed.
    fn next_page(&mut self) {
        let index = self.current_page.map_or(0, |page| page + 1);
        if let Some(texture) = self.textures.get_mut(index) {
            texture.update_data(&self.page_data, self.width, self.height);
            texture.set_antialias(self.antialias);
        } else {
            let mut texture =
                T::create_with_data(&self.page_data, self.pixel_format, self.width, self.height);
            texture.set_antialias(self.antialias);
            self.textures.push(texture);
        }
        self.current_page = Some(index);
    }
}

impl<T> Debug for PageAllocator<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageAllocator")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixel_format", &self.pixel_format)
            .field("pages", &self.textures.len())
            .field("current_page", &self.current_page)
            .field("orig_x", &self.orig_x)
            .field("orig_y", &self.orig_y)
            .field("line_height", &self.line_height)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
