//! Display-server seam used by drag sessions.
//!
//! [`DisplayServer`] is the only way the core talks to the pointer-grab
//! subsystem. [`PointerGrab`] scopes a grab so it is released exactly once,
//! whichever way the session ends.

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::event::{DragEvent, EventMask};
use crate::state::{Geometry, Point};
use crate::window::NativeHandle;

/// Cursor shown while a grab is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorKind {
    Move,
    Resize,
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("display connection failed: {0}")]
    Connection(String),

    #[error("display request failed: {0}")]
    Request(String),

    #[error("display connection closed")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum GrabError {
    #[error("pointer is already grabbed by another client")]
    AlreadyGrabbed,

    #[error("pointer grab refused: {0}")]
    Refused(String),

    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// Operations a drag session needs from the display server.
pub trait DisplayServer {
    /// Take exclusive delivery of pointer events on `root`.
    fn grab_pointer(
        &mut self,
        root: NativeHandle,
        cursor: CursorKind,
        mask: EventMask,
    ) -> Result<(), GrabError>;

    fn ungrab_pointer(&mut self) -> Result<(), DisplayError>;

    fn query_pointer(&mut self, root: NativeHandle) -> Result<Point, DisplayError>;

    /// Move the pointer to `(x, y)` relative to `window`.
    fn warp_pointer(&mut self, window: NativeHandle, x: i32, y: i32) -> Result<(), DisplayError>;

    /// Block until the next event selected by `mask`.
    fn next_event(&mut self, mask: EventMask) -> Result<DragEvent, DisplayError>;

    /// Pop the next motion event already queued, without blocking.
    fn take_queued_motion(&mut self) -> Result<Option<Point>, DisplayError>;

    /// Push a new geometry to the native window. `interactive` is set for
    /// intermediate drag steps, which skip the border refresh.
    fn configure_window(
        &mut self,
        window: NativeHandle,
        geometry: Geometry,
        interactive: bool,
    ) -> Result<(), DisplayError>;
}

/// Scoped pointer grab.
///
/// Derefs to the display so the session keeps using it while the grab is
/// held.
pub struct PointerGrab<'d, D: DisplayServer> {
    display: &'d mut D,
    released: bool,
}

impl<'d, D: DisplayServer> PointerGrab<'d, D> {
    pub fn acquire(
        display: &'d mut D,
        root: NativeHandle,
        cursor: CursorKind,
    ) -> Result<Self, GrabError> {
        display.grab_pointer(root, cursor, EventMask::POINTER)?;
        debug!(%root, ?cursor, "pointer grabbed");
        Ok(Self {
            display,
            released: false,
        })
    }

    /// Release the grab now and report the outcome.
    pub fn release(mut self) -> Result<(), DisplayError> {
        self.released = true;
        self.display.ungrab_pointer()
    }
}

impl<D: DisplayServer> Deref for PointerGrab<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.display
    }
}

impl<D: DisplayServer> DerefMut for PointerGrab<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.display
    }
}

impl<D: DisplayServer> Drop for PointerGrab<'_, D> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.display.ungrab_pointer() {
            warn!("Failed to release pointer grab: {}", e);
        }
    }
}
