// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named atlases shared between text renderers.

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;
use core::fmt::{Debug, Formatter};
use hashbrown::HashMap;

use crate::{AtlasTexture, FontAtlas, GlyphSource};

#[cfg(feature = "persist")]
use crate::{AtlasConfig, AtlasDocument, AtlasFileError};

/// An atlas shared by every renderer using it.
pub type SharedAtlas<S, T> = Rc<RefCell<FontAtlas<S, T>>>;

/// Atlases keyed by name.
///
/// The registry keeps one reference to each atlas. An atlas is considered in use while
/// anything else holds a reference to it.
pub struct AtlasRegistry<S, T> {
    atlases: HashMap<String, SharedAtlas<S, T>>,
}

impl<S: GlyphSource, T: AtlasTexture> AtlasRegistry<S, T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            atlases: HashMap::new(),
        }
    }

    /// The atlas registered under `name`.
    pub fn get(&self, name: &str) -> Option<SharedAtlas<S, T>> {
        self.atlases.get(name).cloned()
    }

    /// Whether an atlas is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.atlases.contains_key(name)
    }

    /// Register `atlas` under `name` and return the shared handle.
    ///
    /// An atlas already registered under `name` is replaced, unless it is still in use, in
    /// which case `atlas` is handed back.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        atlas: FontAtlas<S, T>,
    ) -> Result<SharedAtlas<S, T>, FontAtlas<S, T>> {
        let name = name.into();
        if self.is_in_use(&name) {
            return Err(atlas);
        }
        let shared = Rc::new(RefCell::new(atlas));
        self.atlases.insert(name, Rc::clone(&shared));
        Ok(shared)
    }

    /// Unregister the atlas under `name`. Handles held elsewhere stay valid.
    pub fn remove(&mut self, name: &str) -> Option<SharedAtlas<S, T>> {
        self.atlases.remove(name)
    }

    /// Drop every atlas only the registry refers to. Returns how many were dropped.
    pub fn purge_unused(&mut self) -> usize {
        let before = self.atlases.len();
        self.atlases.retain(|_, atlas| Rc::strong_count(atlas) > 1);
        let purged = before - self.atlases.len();
        if purged > 0 {
            log::debug!("font atlas registry purged {purged} unused atlases");
        }
        purged
    }

    /// Full reset of every registered atlas.
    pub fn reset_all(&mut self) {
        for atlas in self.atlases.values() {
            atlas.borrow_mut().full_reset();
        }
    }

    /// Number of registered atlases.
    pub fn len(&self) -> usize {
        self.atlases.len()
    }

    /// Whether no atlas is registered.
    pub fn is_empty(&self) -> bool {
        self.atlases.is_empty()
    }

    /// Names of the registered atlases.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.atlases.keys().map(String::as_str)
    }

    fn is_in_use(&self, name: &str) -> bool {
        self.atlases
            .get(name)
            .is_some_and(|atlas| Rc::strong_count(atlas) > 1)
    }
}

#[cfg(feature = "persist")]
impl<S: GlyphSource, T: AtlasTexture> AtlasRegistry<S, T> {
    /// Load an atlas file and register it under its `atlasName`.
    ///
    /// `load_font` creates the source font from the `sourceFont` and `faceSize` fields. An
    /// existing atlas with the same name is replaced only once the new one has loaded, and
    /// loading fails without touching the registry if that atlas is in use.
    pub fn load_str(
        &mut self,
        json: &str,
        load_font: impl FnOnce(&str, u32) -> Option<S>,
        config: AtlasConfig,
    ) -> Result<SharedAtlas<S, T>, AtlasFileError> {
        let document = AtlasDocument::from_json(json)?;
        if self.is_in_use(&document.atlas_name) {
            return Err(AtlasFileError::AtlasInUse(document.atlas_name));
        }
        let font = load_font(&document.source_font, document.face_size)
            .ok_or_else(|| AtlasFileError::FontCreation(document.source_font.clone()))?;
        let atlas = FontAtlas::from_document(Rc::new(font), &document, config)?;
        let shared = Rc::new(RefCell::new(atlas));
        self.atlases.insert(document.atlas_name, Rc::clone(&shared));
        Ok(shared)
    }

    /// Read an atlas file from disk and [`load_str`](Self::load_str) it.
    pub fn load_file(
        &mut self,
        path: impl AsRef<std::path::Path>,
        load_font: impl FnOnce(&str, u32) -> Option<S>,
        config: AtlasConfig,
    ) -> Result<SharedAtlas<S, T>, AtlasFileError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        self.load_str(&json, load_font, config).inspect_err(|err| {
            log::warn!("loading font atlas {} failed: {err}", path.display());
        })
    }
}

impl<S: GlyphSource, T: AtlasTexture> Default for AtlasRegistry<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> Debug for AtlasRegistry<S, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtlasRegistry")
            .field("atlases", &self.atlases.len())
            .finish()
    }
}
