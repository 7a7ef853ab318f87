//! Master split adjustment for tiled resizes.

use crate::layout::LayoutKind;
use crate::state::{Geometry, Point};

/// Smallest master split a drag can produce.
pub const MIN_SPLIT: f64 = 0.1;
/// Largest master split a drag can produce.
pub const MAX_SPLIT: f64 = 0.9;
/// Minimum change in split before a re-arrangement is requested.
pub const REARRANGE_THRESHOLD: f64 = 0.05;
/// Slack for rounding when comparing a split change against the threshold.
const SPLIT_EPSILON: f64 = 1e-9;

/// Result of feeding one pointer sample to [`adjust`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitUpdate {
    pub fraction: f64,
    pub rearrange: bool,
}

pub fn clamp_split(fraction: f64) -> f64 {
    if fraction.is_nan() {
        return 0.5;
    }
    fraction.clamp(MIN_SPLIT, MAX_SPLIT)
}

/// Translate a pointer position into a master split for `layout`.
///
/// `rearrange` is set only when the clamped fraction moved at least
/// [`REARRANGE_THRESHOLD`] away from `current`, band edges included; callers commit the fraction
/// only in that case. Floating layouts and degenerate areas leave the split
/// untouched.
pub fn adjust(pointer: Point, area: Geometry, layout: LayoutKind, current: f64) -> SplitUpdate {
    let along_x = || {
        (f64::from(pointer.x) - f64::from(area.x)) / f64::from(area.width)
    };
    let along_y = || {
        (f64::from(pointer.y) - f64::from(area.y)) / f64::from(area.height)
    };

    let raw = match layout {
        LayoutKind::Floating => None,
        LayoutKind::Tile if area.width > 0 => Some(along_x()),
        LayoutKind::TileLeft if area.width > 0 => Some(1.0 - along_x()),
        LayoutKind::TileBottom if area.height > 0 => Some(along_y()),
        LayoutKind::TileTop if area.height > 0 => Some(1.0 - along_y()),
        LayoutKind::Tile | LayoutKind::TileLeft | LayoutKind::TileBottom | LayoutKind::TileTop => {
            None
        }
    };

    let Some(raw) = raw else {
        return SplitUpdate {
            fraction: current,
            rearrange: false,
        };
    };

    let fraction = clamp_split(raw);
    SplitUpdate {
        fraction,
        rearrange: (fraction - current).abs() >= REARRANGE_THRESHOLD - SPLIT_EPSILON,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const AREA: Geometry = Geometry::new(0, 20, 1000, 780);

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_tile_follows_pointer_x() {
        let update = adjust(Point::new(700, 300), AREA, LayoutKind::Tile, 0.5);
        assert!(approx(update.fraction, 0.7));
        assert!(update.rearrange);
    }

    #[test]
    fn test_tile_left_mirrors() {
        let update = adjust(Point::new(700, 300), AREA, LayoutKind::TileLeft, 0.5);
        assert!(approx(update.fraction, 0.3));
        assert!(update.rearrange);
    }

    #[test]
    fn test_vertical_layouts_use_area_origin() {
        // (410 - 20) / 780 = 0.5
        let bottom = adjust(Point::new(0, 410), AREA, LayoutKind::TileBottom, 0.3);
        assert!(approx(bottom.fraction, 0.5));

        // 1 - (176 - 20) / 780 = 0.8
        let top = adjust(Point::new(0, 176), AREA, LayoutKind::TileTop, 0.3);
        assert!(approx(top.fraction, 0.8));
    }

    #[test]
    fn test_hysteresis_band() {
        for x in [460, 500, 540] {
            let update = adjust(Point::new(x, 0), AREA, LayoutKind::Tile, 0.5);
            assert!(!update.rearrange, "x = {x} should stay inside the band");
        }
        for x in [440, 560, 900] {
            let update = adjust(Point::new(x, 0), AREA, LayoutKind::Tile, 0.5);
            assert!(update.rearrange, "x = {x} should leave the band");
        }
    }

    #[test]
    fn test_hysteresis_band_edges_are_symmetric() {
        let below = adjust(Point::new(450, 0), AREA, LayoutKind::Tile, 0.5);
        let above = adjust(Point::new(550, 0), AREA, LayoutKind::Tile, 0.5);
        assert!(below.rearrange, "a 0.05 drop reaches the threshold");
        assert!(above.rearrange, "a 0.05 rise reaches the threshold");
        assert!(approx(below.fraction, 0.45));
        assert!(approx(above.fraction, 0.55));
    }

    #[test]
    fn test_floating_and_degenerate_area_are_noops() {
        let update = adjust(Point::new(900, 0), AREA, LayoutKind::Floating, 0.5);
        assert_eq!(update, SplitUpdate { fraction: 0.5, rearrange: false });

        let empty = Geometry::new(0, 0, 0, 0);
        let update = adjust(Point::new(900, 0), empty, LayoutKind::Tile, 0.4);
        assert_eq!(update, SplitUpdate { fraction: 0.4, rearrange: false });
    }

    #[test]
    fn test_clamp_split_nan() {
        assert!(approx(clamp_split(f64::NAN), 0.5));
    }

    proptest! {
        #[test]
        fn prop_outside_area_clamps_to_bounds(offset in 1i32..100_000, right in any::<bool>()) {
            let x = if right { 1000 + offset } else { -offset };
            let update = adjust(Point::new(x, 0), AREA, LayoutKind::Tile, 0.5);
            let expected = if right { MAX_SPLIT } else { MIN_SPLIT };
            prop_assert!(update.fraction.to_bits() == expected.to_bits());
        }

        #[test]
        fn prop_fraction_always_in_range(
            x in -50_000i32..50_000,
            y in -50_000i32..50_000,
            layout in prop_oneof![
                Just(LayoutKind::Tile),
                Just(LayoutKind::TileLeft),
                Just(LayoutKind::TileTop),
                Just(LayoutKind::TileBottom),
            ],
        ) {
            let update = adjust(Point::new(x, y), AREA, layout, 0.5);
            prop_assert!((MIN_SPLIT..=MAX_SPLIT).contains(&update.fraction));
        }
    }
}
