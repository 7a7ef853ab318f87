//! Protocol-agnostic events seen by a drag session.
//!
//! Backends translate protocol-specific events (X11 `MotionNotify`,
//! `MapRequest`, etc.) into [`DragEvent`] before handing them to the
//! session loop.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::state::{Geometry, Point};
use crate::window::NativeHandle;

bitflags! {
    /// Classes of events a session is willing to receive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventMask: u32 {
        const POINTER_MOTION        = 1 << 0;
        const BUTTON_PRESS          = 1 << 1;
        const BUTTON_RELEASE        = 1 << 2;
        const EXPOSURE              = 1 << 3;
        const SUBSTRUCTURE_REDIRECT = 1 << 4;

        /// What the pointer grab itself asks the server for.
        const POINTER = Self::POINTER_MOTION.bits()
            | Self::BUTTON_PRESS.bits()
            | Self::BUTTON_RELEASE.bits();

        /// Everything an active session waits on.
        const DRAG_SESSION = Self::POINTER.bits()
            | Self::EXPOSURE.bits()
            | Self::SUBSTRUCTURE_REDIRECT.bits();
    }
}

/// A region of a window needing a redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposeEvent {
    pub window: NativeHandle,
    pub area: Geometry,
    /// Number of expose events still following for the same window.
    #[serde(default)]
    pub count: u16,
}

/// A client asking to change its own geometry. Absent fields are unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureRequest {
    pub window: NativeHandle,
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub y: Option<i32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub border: Option<u32>,
}

impl ConfigureRequest {
    /// Requested geometry, falling back to `current` for absent fields.
    pub fn merged_with(&self, current: Geometry) -> Geometry {
        Geometry {
            x: self.x.unwrap_or(current.x),
            y: self.y.unwrap_or(current.y),
            width: self.width.unwrap_or(current.width),
            height: self.height.unwrap_or(current.height),
            border: self.border.unwrap_or(current.border),
        }
    }
}

/// A new top-level window asking to be mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRequest {
    pub parent: NativeHandle,
    pub window: NativeHandle,
}

/// Events a drag session can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragEvent {
    /// Pointer moved to an absolute root position.
    Motion(Point),
    ButtonPress { button: u8 },
    ButtonRelease { button: u8 },
    Expose(ExposeEvent),
    ConfigureRequest(ConfigureRequest),
    MapRequest(MapRequest),
}

impl DragEvent {
    /// Mask bit this event is selected by.
    pub const fn mask(&self) -> EventMask {
        match self {
            Self::Motion(_) => EventMask::POINTER_MOTION,
            Self::ButtonPress { .. } => EventMask::BUTTON_PRESS,
            Self::ButtonRelease { .. } => EventMask::BUTTON_RELEASE,
            Self::Expose(_) => EventMask::EXPOSURE,
            Self::ConfigureRequest(_) | Self::MapRequest(_) => EventMask::SUBSTRUCTURE_REDIRECT,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_session_mask_covers_every_event() {
        let events = [
            DragEvent::Motion(Point::new(1, 2)),
            DragEvent::ButtonPress { button: 1 },
            DragEvent::ButtonRelease { button: 1 },
            DragEvent::MapRequest(MapRequest {
                parent: NativeHandle(1),
                window: NativeHandle(2),
            }),
        ];
        for event in events {
            assert!(EventMask::DRAG_SESSION.contains(event.mask()));
        }
        assert!(!EventMask::POINTER.contains(EventMask::EXPOSURE));
    }

    #[test]
    fn test_configure_request_merge() {
        let request = ConfigureRequest {
            window: NativeHandle(7),
            x: None,
            y: Some(40),
            width: Some(300),
            height: None,
            border: None,
        };
        let current = Geometry::new(10, 10, 100, 100).with_border(1);
        assert_eq!(
            request.merged_with(current),
            Geometry::new(10, 40, 300, 100).with_border(1)
        );
    }
}
