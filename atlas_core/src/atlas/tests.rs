use super::{AtlasState, AtlasStore, atlas_dimensions};
use crate::config::AtlasConfig;
use crate::testing::RecordingSink;

const CELL_AREA: u64 = 10 * 20;

fn dims(target_area: u64, packer_area: u64) -> (u32, u32) {
    atlas_dimensions(&AtlasConfig::default(), 16384, CELL_AREA, target_area, packer_area)
}

#[test]
fn minimum_area_is_one_megatexel() {
    assert_eq!(dims(800 * 600, 0), (1024, 1024));
    assert_eq!(dims(1, 0), (1024, 1024));
}

#[test]
fn growth_doubles_until_viewport_cap() {
    // 1920x1080 * 1.25 = 2_592_000 caps the doubled 2M area.
    assert_eq!(dims(1920 * 1080, 1024 * 1024), (2048, 1024));
    // A larger target lets it double again.
    assert_eq!(dims(3840 * 2160, 2048 * 1024), (2048, 2048));
}

#[test]
fn font_area_sets_the_floor() {
    // 95 cells of 200x200 = 3_800_000 texels.
    let size = atlas_dimensions(&AtlasConfig::default(), 16384, 200 * 200, 10_000_000, 0);
    assert_eq!(size, (2048, 2048));
}

#[test]
fn hardware_limit_caps_the_area() {
    let size = atlas_dimensions(&AtlasConfig::default(), 2048, CELL_AREA, u64::MAX / 4, 1 << 40);
    assert_eq!(size, (2048, 2048));
    // Non power-of-two limits round down.
    let size = atlas_dimensions(&AtlasConfig::default(), 3000, CELL_AREA, u64::MAX / 4, 1 << 40);
    assert_eq!(size, (2048, 2048));
}

#[test]
fn dimensions_are_powers_of_two_and_wide() {
    for area in [5_000_000u64, 9_000_000, 40_000_000, 100_000_000] {
        let (u, v) = dims(area, area);
        assert!(u.is_power_of_two() && v.is_power_of_two());
        assert!(u == v || u == 2 * v, "{u}x{v}");
        assert!(u64::from(u) * u64::from(v) >= (area as f64 * 1.25) as u64 || u == 16384);
    }
}

#[test]
fn one_pixel_viewport_changes_only_cross_buckets() {
    let mut previous = dims(640 * 400, 1 << 30);
    let mut changes = 0;
    for width in 640..4000u64 {
        let size = dims(width * 1200, 1 << 30);
        if size != previous {
            // Every change lands on the next power-of-two bucket.
            let old = u64::from(previous.0) * u64::from(previous.1);
            let new = u64::from(size.0) * u64::from(size.1);
            assert_eq!(new, old * 2, "width {width}");
            changes += 1;
        }
        previous = size;
    }
    assert!(changes < 5, "{changes} resizes for a 1px sweep");
}

#[test]
fn first_reset_creates_the_texture() {
    let mut store = AtlasStore::new(AtlasConfig::default());
    let mut sink = RecordingSink::default();
    assert_eq!(store.state(), AtlasState::Empty);

    store.reset(CELL_AREA, 800 * 600, &mut sink).expect("reset");
    assert_eq!(sink.atlases, [(1024, 1024)]);
    assert_eq!(store.state(), AtlasState::Ready);
    assert_eq!(store.reset_count(), 1);

    store.allocate(10, 10).expect("fits");
    assert_eq!(store.state(), AtlasState::Populated);
}

#[test]
fn reset_without_resize_keeps_texture_but_bumps_epoch() {
    let mut store = AtlasStore::new(AtlasConfig::default());
    let mut sink = RecordingSink::default();
    store.reset(CELL_AREA, 800 * 600, &mut sink).expect("reset");
    let epoch = store.epoch();
    store.allocate(30, 30).expect("fits");

    store.reset(CELL_AREA, 800 * 600, &mut sink).expect("reset");
    assert_eq!(sink.atlases.len(), 1);
    assert!(store.epoch() > epoch);
    assert_eq!(store.state(), AtlasState::Ready);
    assert_eq!(store.allocate(30, 30), Some((0, 0)));
}

#[test]
fn resize_bumps_epoch_exactly_once_per_reset() {
    let mut store = AtlasStore::new(AtlasConfig::default());
    let mut sink = RecordingSink::default();
    store.reset(CELL_AREA, 1920 * 1080, &mut sink).expect("reset");
    let epoch = store.epoch();

    // Second reset grows 1024x1024 -> 2048x1024.
    store.reset(CELL_AREA, 1920 * 1080, &mut sink).expect("reset");
    assert_eq!(sink.atlases, [(1024, 1024), (2048, 1024)]);
    assert_eq!(store.epoch(), epoch.next());
}

#[test]
fn ensure_sized_is_a_noop_when_size_is_unchanged() {
    let mut store = AtlasStore::new(AtlasConfig::default());
    let mut sink = RecordingSink::default();
    store.reset(CELL_AREA, 800 * 600, &mut sink).expect("reset");
    store.allocate(8, 8).expect("fits");
    let epoch = store.epoch();

    let size = store.ensure_sized(CELL_AREA, 800 * 600, &mut sink).expect("sized");
    assert_eq!(size, (1024, 1024));
    assert_eq!(store.epoch(), epoch);
    assert_eq!(store.state(), AtlasState::Populated);
}

#[test]
fn config_cap_applies_below_device_limit() {
    let config = AtlasConfig {
        min_area: 64 * 64,
        max_dimension: Some(64),
        ..AtlasConfig::default()
    };
    let mut store = AtlasStore::new(config);
    let mut sink = RecordingSink::default();
    store.reset(CELL_AREA, 1920 * 1080, &mut sink).expect("reset");
    assert_eq!(store.dimensions(), (64, 64));
}
