//! Layout kinds and the resize corner each one drags from.

use serde::{Deserialize, Serialize};

use crate::state::Geometry;

/// Arrangement policy of a tag.
///
/// The tiling variants are named after where the master area sits:
/// `Tile` keeps it on the left with the stack on the right, `TileLeft`
/// mirrors that, `TileTop`/`TileBottom` split horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    Floating,
    #[default]
    Tile,
    TileLeft,
    TileTop,
    TileBottom,
}

impl LayoutKind {
    pub const fn is_tiling(self) -> bool {
        !matches!(self, Self::Floating)
    }

    /// Corner the pointer is warped to before a tiled resize.
    pub const fn resize_corner(self) -> ResizeCorner {
        match self {
            Self::TileLeft => ResizeCorner::BottomLeft,
            Self::TileTop => ResizeCorner::TopRight,
            Self::Floating | Self::Tile | Self::TileBottom => ResizeCorner::BottomRight,
        }
    }
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Floating => "floating",
            Self::Tile => "tile",
            Self::TileLeft => "tile-left",
            Self::TileTop => "tile-top",
            Self::TileBottom => "tile-bottom",
        };
        f.write_str(name)
    }
}

/// Window corner used as the pointer anchor during a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeCorner {
    BottomRight,
    BottomLeft,
    TopRight,
}

impl ResizeCorner {
    /// Offset of the corner relative to the window origin, landing on the
    /// last pixel of the border.
    pub const fn offset(self, geometry: Geometry) -> (i32, i32) {
        let right = (geometry.width + geometry.border) as i32 - 1;
        let bottom = (geometry.height + geometry.border) as i32 - 1;
        match self {
            Self::BottomRight => (right, bottom),
            Self::BottomLeft => (0, bottom),
            Self::TopRight => (right, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_resize_corner_per_layout() {
        let geo = Geometry::new(0, 0, 400, 300).with_border(2);
        assert_eq!(LayoutKind::Tile.resize_corner().offset(geo), (401, 301));
        assert_eq!(LayoutKind::TileLeft.resize_corner().offset(geo), (0, 301));
        assert_eq!(LayoutKind::TileTop.resize_corner().offset(geo), (401, 0));
        assert_eq!(LayoutKind::TileBottom.resize_corner().offset(geo), (401, 301));
        assert_eq!(LayoutKind::Floating.resize_corner().offset(geo), (401, 301));
    }

    #[test]
    fn test_layout_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            layout: LayoutKind,
        }
        let parsed: Wrapper = toml::from_str(r#"layout = "tile-left""#).unwrap();
        assert_eq!(parsed.layout, LayoutKind::TileLeft);
        assert_eq!(LayoutKind::TileBottom.to_string(), "tile-bottom");
        assert!(!LayoutKind::Floating.is_tiling());
    }
}
