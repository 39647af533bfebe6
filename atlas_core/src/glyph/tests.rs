use super::{Epoch, GlyphCache, GlyphEntry, LineRendition, ShadingType, split_double_height};
use crate::settings::FontSettings;

fn drawn(glyph_index: u32, offset_y: i32, height: u32) -> GlyphEntry {
    GlyphEntry {
        glyph_index,
        shading: ShadingType::GrayscaleText,
        overlap_split: false,
        offset: (1, offset_y),
        size: (12, height),
        texcoord: (40, 100),
    }
}

#[test]
fn fresh_slot_is_blank() {
    let mut cache = GlyphCache::default();
    let epoch = Epoch::default();
    assert!(cache.lookup(7, epoch).is_none());
    let slot = cache.resolve(7, epoch);
    assert_eq!(slot.shading, ShadingType::Default);
    assert_eq!(slot.glyph_index, 7);
    assert!(cache.lookup(7, epoch).is_some());
}

#[test]
fn resolve_is_idempotent() {
    let mut cache = GlyphCache::default();
    let epoch = Epoch::default();
    cache.insert(drawn(3, -10, 14), epoch);
    let first = *cache.resolve(3, epoch);
    let second = *cache.resolve(3, epoch);
    assert_eq!(first, second);
    assert_eq!(cache.len(epoch), 1);
}

#[test]
fn newer_epoch_hides_and_then_drops_entries() {
    let mut cache = GlyphCache::default();
    let old = Epoch::default();
    cache.insert(drawn(3, -10, 14), old);

    let new = old.next();
    assert!(cache.lookup(3, new).is_none());
    assert!(cache.is_empty(new));

    let slot = cache.resolve(3, new);
    assert_eq!(slot.shading, ShadingType::Default);
    assert!(cache.lookup(3, old).is_none());
}

#[test]
fn rendition_scale_and_sibling() {
    assert_eq!(LineRendition::SingleWidth.scale(), (1, 1));
    assert_eq!(LineRendition::DoubleWidth.scale(), (2, 1));
    assert_eq!(LineRendition::DoubleHeightBottom.scale(), (2, 2));
    assert_eq!(
        LineRendition::DoubleHeightTop.sibling(),
        LineRendition::DoubleHeightBottom
    );
    assert_eq!(LineRendition::DoubleWidth.sibling(), LineRendition::DoubleWidth);
}

#[test]
fn double_height_halves_conserve_height() {
    let font = FontSettings::default();
    for (offset_y, height) in [(-40, 44), (-30, 16), (-8, 30), (-60, 70), (-36, 1)] {
        let entry = drawn(9, offset_y, height);
        let (top, bottom) = split_double_height(entry, &font);

        assert_eq!(top.size.1 + bottom.size.1, height);
        // Windows tile the original allocation without gap or overlap.
        assert_eq!(top.texcoord, entry.texcoord);
        assert_eq!(bottom.texcoord.1, entry.texcoord.1 + top.size.1);
        assert_eq!(top.size.0, entry.size.0);
        assert_eq!(bottom.size.0, entry.size.0);
    }
}

#[test]
fn double_height_split_offsets() {
    let font = FontSettings::default();
    // Box from 40 above the doubled baseline down to 4 below it.
    let (top, bottom) = split_double_height(drawn(1, -40, 44), &font);
    // offset.y becomes -44; top keeps -(-44) - 16 = 28 rows.
    assert_eq!(top.size.1, 28);
    assert_eq!(top.offset.1, -44 + 20);
    assert_eq!(bottom.size.1, 16);
    assert_eq!(bottom.offset.1, -44 + 28);
    assert_eq!(bottom.texcoord.1, 128);
}

#[test]
fn empty_half_becomes_whitespace() {
    let font = FontSettings::default();
    // Entirely below the split line: nothing for the top half.
    let (top, bottom) = split_double_height(drawn(1, -8, 30), &font);
    assert_eq!(top.size.1, 0);
    assert_eq!(top.shading, ShadingType::Default);
    assert!(bottom.is_drawable());

    // Entirely above it: nothing for the bottom half.
    let (top, bottom) = split_double_height(drawn(2, -60, 30), &font);
    assert_eq!(bottom.size.1, 0);
    assert_eq!(bottom.shading, ShadingType::Default);
    assert!(top.is_drawable());
}
