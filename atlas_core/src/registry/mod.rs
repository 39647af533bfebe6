//! Font face identities and their glyph caches.

use std::collections::HashMap;

use crate::glyph::{GlyphCache, LineRendition};

/// Opaque face handle issued by the rasterizer.
///
/// Two sizes of the same font file are two faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub u32);

/// The four rendition caches of one face.
#[derive(Debug, Default)]
pub struct FontFaceEntry {
    face: Option<FaceId>,
    glyphs: [GlyphCache; 4],
}

impl FontFaceEntry {
    fn new(face: Option<FaceId>) -> Self {
        Self {
            face,
            glyphs: Default::default(),
        }
    }

    /// Backing face, `None` for the builtin entry.
    pub fn face(&self) -> Option<FaceId> {
        self.face
    }

    pub fn is_builtin(&self) -> bool {
        self.face.is_none()
    }

    pub fn glyphs(&self, rendition: LineRendition) -> &GlyphCache {
        &self.glyphs[rendition.index()]
    }

    pub fn glyphs_mut(&mut self, rendition: LineRendition) -> &mut GlyphCache {
        &mut self.glyphs[rendition.index()]
    }
}

/// Get-or-create map from [`FaceId`] to [`FontFaceEntry`], plus the one
/// builtin entry used for procedurally drawn glyphs.
///
/// Entries survive atlas resets; only their caches are invalidated.
#[derive(Debug)]
pub struct FontFaceRegistry {
    faces: HashMap<FaceId, FontFaceEntry>,
    builtin: FontFaceEntry,
}

impl FontFaceRegistry {
    pub fn new() -> Self {
        Self {
            faces: HashMap::new(),
            builtin: FontFaceEntry::new(None),
        }
    }

    /// The entry for `face`, created on first use. `None` is the builtin
    /// entry.
    pub fn resolve(&mut self, face: Option<FaceId>) -> &mut FontFaceEntry {
        match face {
            Some(id) => self
                .faces
                .entry(id)
                .or_insert_with(|| FontFaceEntry::new(Some(id))),
            None => &mut self.builtin,
        }
    }

    pub fn get(&self, face: Option<FaceId>) -> Option<&FontFaceEntry> {
        match face {
            Some(id) => self.faces.get(&id),
            None => Some(&self.builtin),
        }
    }

    pub fn contains(&self, face: FaceId) -> bool {
        self.faces.contains_key(&face)
    }

    /// Number of font-backed entries (the builtin entry is not counted).
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

impl Default for FontFaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
