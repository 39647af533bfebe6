use super::{FaceId, FontFaceRegistry};
use crate::glyph::{Epoch, GlyphEntry, LineRendition, ShadingType};

#[test]
fn resolve_creates_once() {
    let mut registry = FontFaceRegistry::new();
    registry.resolve(Some(FaceId(4)));
    registry.resolve(Some(FaceId(4)));
    registry.resolve(Some(FaceId(5)));
    assert_eq!(registry.face_count(), 2);
    assert!(registry.contains(FaceId(4)));
    assert!(!registry.contains(FaceId(6)));
}

#[test]
fn none_routes_to_builtin() {
    let mut registry = FontFaceRegistry::new();
    let entry = registry.resolve(None);
    assert!(entry.is_builtin());
    assert_eq!(entry.face(), None);
    assert_eq!(registry.face_count(), 0);
}

#[test]
fn renditions_have_independent_caches() {
    let mut registry = FontFaceRegistry::new();
    let epoch = Epoch::default();
    let entry = registry.resolve(Some(FaceId(1)));
    entry.glyphs_mut(LineRendition::DoubleWidth).insert(
        GlyphEntry {
            glyph_index: 42,
            shading: ShadingType::GrayscaleText,
            size: (8, 8),
            ..GlyphEntry::default()
        },
        epoch,
    );

    let entry = registry.get(Some(FaceId(1))).expect("registered");
    assert!(entry.glyphs(LineRendition::DoubleWidth).lookup(42, epoch).is_some());
    assert!(entry.glyphs(LineRendition::SingleWidth).lookup(42, epoch).is_none());
}

#[test]
fn entries_survive_epoch_change() {
    let mut registry = FontFaceRegistry::new();
    let old = Epoch::default();
    registry
        .resolve(Some(FaceId(2)))
        .glyphs_mut(LineRendition::SingleWidth)
        .insert(GlyphEntry::blank(1), old);

    let new = old.next();
    let entry = registry.get(Some(FaceId(2))).expect("face survives");
    assert!(entry.glyphs(LineRendition::SingleWidth).lookup(1, new).is_none());
}
