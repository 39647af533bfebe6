//! Text shaping via `rustybuzz`: splits a row of text into font runs and
//! builtin runs and fills a [`ShapedRow`].

use log::warn;
use unicode_width::UnicodeWidthChar;

use atlas_core::builtin::is_builtin_glyph;
use atlas_core::{FaceId, GlyphOffset, LineRendition, ShapedRow};

use super::FontCollection;

/// Parse feature strings into rustybuzz features.
///
/// Each string is a 4-char OpenType tag, optionally prefixed with `-` to
/// disable. Examples: `"calt"` (enable), `"-dlig"` (disable).
pub fn parse_features(strings: &[String]) -> Vec<rustybuzz::Feature> {
    strings
        .iter()
        .filter_map(|s| {
            let s = s.trim();
            let (tag_str, value) = match s.strip_prefix('-') {
                Some(rest) => (rest, 0),
                None => (s.strip_prefix('+').unwrap_or(s), 1),
            };
            let Ok(bytes) = <[u8; 4]>::try_from(tag_str.as_bytes()) else {
                warn!("shaper: ignoring invalid feature tag: {s}");
                return None;
            };
            let tag = rustybuzz::ttf_parser::Tag::from_bytes(&bytes);
            Some(rustybuzz::Feature::new(tag, value, ..))
        })
        .collect()
}

/// A stretch of text that goes through one path.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Font(&'a str),
    Builtin(&'a str),
}

fn segments(text: &str, builtin: bool) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let is_builtin = builtin && is_builtin_glyph(c);
        if current.is_some_and(|b| b != is_builtin) {
            out.push(segment(&text[start..i], current == Some(true)));
            start = i;
        }
        current = Some(is_builtin);
    }
    if let Some(is_builtin) = current {
        out.push(segment(&text[start..], is_builtin));
    }
    out
}

fn segment(text: &str, builtin: bool) -> Segment<'_> {
    if builtin {
        Segment::Builtin(text)
    } else {
        Segment::Font(text)
    }
}

/// Shape one viewport row of `text` with `face`.
///
/// Builtin characters become face-less runs keyed by code point, each one
/// cell wide. Advances and offsets are scaled from font units by
/// `size / units_per_em`.
pub fn shape_row(
    collection: &FontCollection,
    face: FaceId,
    text: &str,
    features: &[String],
    line_rendition: LineRendition,
) -> ShapedRow {
    let mut row = ShapedRow {
        line_rendition,
        ..ShapedRow::default()
    };
    let cell_w = collection.char_advance(face, '0').unwrap_or(collection.size() / 2.0).ceil();
    let features = parse_features(features);

    for seg in segments(text, collection.builtin_glyphs()) {
        match seg {
            Segment::Builtin(s) => row.push_run(
                None,
                s.chars()
                    .map(|c| (u32::from(c), cell_w * column_width(c), GlyphOffset::default())),
            ),
            Segment::Font(s) => shape_run(collection, face, s, &features, cell_w, &mut row),
        }
    }
    row
}

fn column_width(c: char) -> f32 {
    c.width().unwrap_or(1) as f32
}

fn shape_run(
    collection: &FontCollection,
    face: FaceId,
    text: &str,
    features: &[rustybuzz::Feature],
    cell_w: f32,
    row: &mut ShapedRow,
) {
    let Some(rb_face) = collection.shaping_face(face) else {
        emit_unshaped(face, text, cell_w, row);
        return;
    };

    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.set_direction(rustybuzz::Direction::LeftToRight);
    let glyphs = rustybuzz::shape(&rb_face, features, buffer);

    let upem = rb_face.units_per_em().max(1) as f32;
    let scale = collection.size() / upem;
    row.push_run(
        Some(face),
        glyphs
            .glyph_infos()
            .iter()
            .zip(glyphs.glyph_positions())
            .map(|(info, pos)| {
                (
                    info.glyph_id,
                    pos.x_advance as f32 * scale,
                    GlyphOffset {
                        advance_offset: pos.x_offset as f32 * scale,
                        ascender_offset: pos.y_offset as f32 * scale,
                    },
                )
            }),
    );
}

/// Fallback for when no rustybuzz face is available: one `.notdef` per
/// visible character.
fn emit_unshaped(face: FaceId, text: &str, cell_w: f32, row: &mut ShapedRow) {
    row.push_run(
        Some(face),
        text.chars()
            .filter(|&c| c.width() != Some(0))
            .map(|c| (0, cell_w * column_width(c), GlyphOffset::default())),
    );
}
