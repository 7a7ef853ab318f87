//! Edge snapping for dragged windows.
//!
//! Pure geometry: called once per coalesced motion sample, so it stays O(1)
//! and allocation free.

use crate::state::Geometry;

/// Lock `candidate` to the edges of `area` when it comes within `threshold`
/// pixels of them.
///
/// Each axis is handled independently. The near edge (left/top) is checked
/// first and only applies when the window has not crossed it; otherwise the
/// far edge (right/bottom, measured on the outer extent including both
/// borders) is considered. A window wider than the area therefore prefers
/// its left edge.
pub fn snap(candidate: Geometry, area: Geometry, threshold: u32) -> Geometry {
    let threshold = i64::from(threshold);
    let x = snap_axis(
        i64::from(candidate.x),
        candidate.outer_width(),
        i64::from(area.x),
        i64::from(area.width),
        threshold,
    );
    let y = snap_axis(
        i64::from(candidate.y),
        candidate.outer_height(),
        i64::from(area.y),
        i64::from(area.height),
        threshold,
    );
    Geometry {
        x: x as i32,
        y: y as i32,
        ..candidate
    }
}

fn snap_axis(pos: i64, extent: i64, start: i64, length: i64, threshold: i64) -> i64 {
    let near = |p: i64| p >= start && p - start <= threshold;
    if near(pos) {
        return start;
    }

    let end = start + length;
    if (end - (pos + extent)).abs() <= threshold {
        let flush = end - extent;
        // Flush with the far edge may itself land in the near zone
        // (window almost as wide as the area); near still wins there.
        return if near(flush) { start } else { flush };
    }

    pos
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    const AREA: Geometry = Geometry::new(0, 0, 1000, 800);

    fn window(x: i32, y: i32) -> Geometry {
        Geometry::new(x, y, 200, 150).with_border(2)
    }

    #[test]
    fn test_snaps_to_left_edge() {
        assert_eq!(snap(window(3, 400), AREA, 10), window(0, 400));
    }

    #[test]
    fn test_snaps_right_edge_flush() {
        // 806 + 200 + 4 = 1010, within 10 of 1000.
        assert_eq!(snap(window(806, 400), AREA, 10), window(796, 400));
        // Coming from the inside as well.
        assert_eq!(snap(window(790, 400), AREA, 10), window(796, 400));
    }

    #[test]
    fn test_snaps_top_and_bottom() {
        assert_eq!(snap(window(400, 7), AREA, 10), window(400, 0));
        // 640 + 150 + 4 = 794, within 10 of 800.
        assert_eq!(snap(window(400, 640), AREA, 10), window(400, 646));
    }

    #[test]
    fn test_left_of_area_does_not_snap_left() {
        assert_eq!(snap(window(-5, 400), AREA, 10), window(-5, 400));
    }

    #[test]
    fn test_outside_threshold_untouched() {
        assert_eq!(snap(window(11, 300), AREA, 10), window(11, 300));
        assert_eq!(snap(window(500, 300), AREA, 10), window(500, 300));
    }

    #[test]
    fn test_wide_window_prefers_left_edge() {
        let wide = Geometry::new(5, 0, 995, 100);
        assert_eq!(snap(wide, AREA, 10).x, 0);
    }

    #[test]
    fn test_zero_threshold_only_exact_edges() {
        assert_eq!(snap(window(0, 1), AREA, 0), window(0, 1));
        assert_eq!(snap(window(1, 1), AREA, 0), window(1, 1));
    }

    #[test]
    fn test_offset_area() {
        let area = Geometry::new(1920, 20, 1280, 1004);
        assert_eq!(
            snap(Geometry::new(1925, 25, 100, 100), area, 8),
            Geometry::new(1920, 20, 100, 100)
        );
    }

    proptest! {
        #[test]
        fn prop_snap_is_idempotent(
            x in -10_000i32..10_000,
            y in -10_000i32..10_000,
            width in 1u32..4000,
            height in 1u32..4000,
            border in 0u32..20,
            area_x in -2000i32..2000,
            area_y in -2000i32..2000,
            area_w in 1u32..4000,
            area_h in 1u32..4000,
            threshold in 0u32..64,
        ) {
            let candidate = Geometry::new(x, y, width, height).with_border(border);
            let area = Geometry::new(area_x, area_y, area_w, area_h);
            let once = snap(candidate, area, threshold);
            prop_assert_eq!(snap(once, area, threshold), once);
        }

        #[test]
        fn prop_snap_keeps_size(
            x in -5000i32..5000,
            y in -5000i32..5000,
            width in 1u32..3000,
            height in 1u32..3000,
            threshold in 0u32..64,
        ) {
            let candidate = Geometry::new(x, y, width, height).with_border(1);
            let snapped = snap(candidate, AREA, threshold);
            prop_assert_eq!(snapped.width, width);
            prop_assert_eq!(snapped.height, height);
            prop_assert_eq!(snapped.border, 1);
        }
    }
}
