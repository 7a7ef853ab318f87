//! Tags: per-screen views carrying their own layout parameters.

use serde::{Deserialize, Serialize};

use crate::layout::LayoutKind;
use crate::ratio;
use crate::state::ScreenId;

/// Unique identifier for tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagId(pub u32);

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tag:{}", self.0)
    }
}

/// Layout parameters of one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagState {
    pub id: TagId,
    pub name: String,
    pub screen: ScreenId,
    pub layout: LayoutKind,
    /// Share of the usable area given to the master column/row.
    pub split_fraction: f64,
    /// Number of clients in the master column/row.
    pub master_count: u32,
}

impl TagState {
    pub fn new(id: TagId, name: String, screen: ScreenId, layout: LayoutKind) -> Self {
        Self {
            id,
            name,
            screen,
            layout,
            split_fraction: 0.5,
            master_count: 1,
        }
    }

    /// Set the master split, clamped into the allowed range.
    pub fn set_split_fraction(&mut self, fraction: f64) {
        self.split_fraction = ratio::clamp_split(fraction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fraction_is_clamped() {
        let mut tag = TagState::new(TagId(1), "1".into(), ScreenId(0), LayoutKind::Tile);
        assert!((tag.split_fraction - 0.5).abs() < f64::EPSILON);

        tag.set_split_fraction(0.95);
        assert!((tag.split_fraction - 0.9).abs() < f64::EPSILON);

        tag.set_split_fraction(-3.0);
        assert!((tag.split_fraction - 0.1).abs() < f64::EPSILON);
    }
}
