//! Scripted display server for tests, benches and trace replay.
//!
//! Events are fed in batches: each batch is what the server has queued at
//! one instant. [`DisplayServer::take_queued_motion`] only looks at the
//! current batch, so coalescing behaves like a real queue being drained.

use std::collections::VecDeque;

use serde::Serialize;

use crate::dispatch::EventHandlers;
use crate::display::{CursorKind, DisplayError, DisplayServer, GrabError};
use crate::event::{ConfigureRequest, DragEvent, EventMask, ExposeEvent, MapRequest};
use crate::state::{Geometry, Point, WmState};
use crate::window::NativeHandle;

/// One call made against the scripted display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum DisplayCall {
    Grab {
        root: NativeHandle,
        cursor: CursorKind,
    },
    Ungrab,
    QueryPointer,
    Warp {
        window: NativeHandle,
        x: i32,
        y: i32,
    },
    Configure {
        window: NativeHandle,
        geometry: Geometry,
        interactive: bool,
    },
}

#[derive(Debug, Default)]
pub struct ScriptedDisplay {
    pointer: Point,
    batches: VecDeque<VecDeque<DragEvent>>,
    deferred: Vec<DragEvent>,
    calls: Vec<DisplayCall>,
    refuse_grab: bool,
    close_after_grab: bool,
    grabbed: bool,
}

impl ScriptedDisplay {
    pub fn new(pointer: Point) -> Self {
        Self {
            pointer,
            ..Self::default()
        }
    }

    /// Queue a batch of events delivered together.
    #[must_use]
    pub fn with_batch(mut self, events: impl IntoIterator<Item = DragEvent>) -> Self {
        self.push_batch(events);
        self
    }

    pub fn push_batch(&mut self, events: impl IntoIterator<Item = DragEvent>) {
        self.batches.push_back(events.into_iter().collect());
    }

    /// Make every grab attempt fail as if another client held the pointer.
    #[must_use]
    pub const fn refuse_grab(mut self) -> Self {
        self.refuse_grab = true;
        self
    }

    /// Drop the connection as soon as the grab is held: pointer queries and
    /// warps fail with [`DisplayError::Closed`].
    #[must_use]
    pub const fn close_after_grab(mut self) -> Self {
        self.close_after_grab = true;
        self
    }

    pub fn calls(&self) -> &[DisplayCall] {
        &self.calls
    }

    /// Events that arrived but were outside the mask being waited on.
    pub fn deferred(&self) -> &[DragEvent] {
        &self.deferred
    }

    pub fn grab_count(&self) -> usize {
        self.count(|call| matches!(call, DisplayCall::Grab { .. }))
    }

    pub fn ungrab_count(&self) -> usize {
        self.count(|call| matches!(call, DisplayCall::Ungrab))
    }

    pub const fn pointer(&self) -> Point {
        self.pointer
    }

    fn count(&self, pred: impl Fn(&DisplayCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }

    fn check_open(&self) -> Result<(), DisplayError> {
        if self.close_after_grab && self.grabbed {
            return Err(DisplayError::Closed);
        }
        Ok(())
    }

    fn pop_event(&mut self) -> Option<DragEvent> {
        loop {
            let batch = self.batches.front_mut()?;
            if let Some(event) = batch.pop_front() {
                return Some(event);
            }
            self.batches.pop_front();
        }
    }
}

impl DisplayServer for ScriptedDisplay {
    fn grab_pointer(
        &mut self,
        root: NativeHandle,
        cursor: CursorKind,
        _mask: EventMask,
    ) -> Result<(), GrabError> {
        if self.refuse_grab || self.grabbed {
            return Err(GrabError::AlreadyGrabbed);
        }
        self.grabbed = true;
        self.calls.push(DisplayCall::Grab { root, cursor });
        Ok(())
    }

    fn ungrab_pointer(&mut self) -> Result<(), DisplayError> {
        self.grabbed = false;
        self.calls.push(DisplayCall::Ungrab);
        Ok(())
    }

    fn query_pointer(&mut self, _root: NativeHandle) -> Result<Point, DisplayError> {
        self.check_open()?;
        self.calls.push(DisplayCall::QueryPointer);
        Ok(self.pointer)
    }

    fn warp_pointer(&mut self, window: NativeHandle, x: i32, y: i32) -> Result<(), DisplayError> {
        self.check_open()?;
        self.calls.push(DisplayCall::Warp { window, x, y });
        Ok(())
    }

    fn next_event(&mut self, mask: EventMask) -> Result<DragEvent, DisplayError> {
        while let Some(event) = self.pop_event() {
            if !mask.contains(event.mask()) {
                self.deferred.push(event);
                continue;
            }
            if let DragEvent::Motion(point) = event {
                self.pointer = point;
            }
            return Ok(event);
        }
        Err(DisplayError::Closed)
    }

    fn take_queued_motion(&mut self) -> Result<Option<Point>, DisplayError> {
        let Some(batch) = self.batches.front_mut() else {
            return Ok(None);
        };
        let Some(index) = batch
            .iter()
            .position(|event| matches!(event, DragEvent::Motion(_)))
        else {
            return Ok(None);
        };
        match batch.remove(index) {
            Some(DragEvent::Motion(point)) => {
                self.pointer = point;
                Ok(Some(point))
            }
            _ => Ok(None),
        }
    }

    fn configure_window(
        &mut self,
        window: NativeHandle,
        geometry: Geometry,
        interactive: bool,
    ) -> Result<(), DisplayError> {
        self.calls.push(DisplayCall::Configure {
            window,
            geometry,
            interactive,
        });
        Ok(())
    }
}

/// Event handlers that only record what was forwarded to them.
#[derive(Debug, Default)]
pub struct RecordingHandlers {
    pub forwarded: Vec<DragEvent>,
}

impl RecordingHandlers {
    pub fn count(&self, pred: impl Fn(&DragEvent) -> bool) -> usize {
        self.forwarded.iter().filter(|event| pred(event)).count()
    }
}

impl EventHandlers for RecordingHandlers {
    fn on_configure_request(&mut self, _state: &mut WmState, request: &ConfigureRequest) {
        self.forwarded.push(DragEvent::ConfigureRequest(*request));
    }

    fn on_expose(&mut self, _state: &mut WmState, expose: &ExposeEvent) {
        self.forwarded.push(DragEvent::Expose(*expose));
    }

    fn on_map_request(&mut self, _state: &mut WmState, request: &MapRequest) {
        self.forwarded.push(DragEvent::MapRequest(*request));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_queued_motion_stays_within_batch() {
        let mut display = ScriptedDisplay::new(Point::new(0, 0))
            .with_batch([
                DragEvent::Motion(Point::new(1, 1)),
                DragEvent::Motion(Point::new(2, 2)),
            ])
            .with_batch([DragEvent::Motion(Point::new(3, 3))]);

        let first = display.next_event(EventMask::DRAG_SESSION).unwrap();
        assert_eq!(first, DragEvent::Motion(Point::new(1, 1)));
        assert_eq!(display.take_queued_motion().unwrap(), Some(Point::new(2, 2)));
        assert_eq!(display.take_queued_motion().unwrap(), None);

        let next = display.next_event(EventMask::DRAG_SESSION).unwrap();
        assert_eq!(next, DragEvent::Motion(Point::new(3, 3)));
        assert_eq!(display.pointer(), Point::new(3, 3));
    }

    #[test]
    fn test_masked_events_are_deferred() {
        let mut display = ScriptedDisplay::new(Point::new(0, 0)).with_batch([
            DragEvent::MapRequest(MapRequest {
                parent: NativeHandle(1),
                window: NativeHandle(2),
            }),
            DragEvent::ButtonRelease { button: 1 },
        ]);
        let event = display.next_event(EventMask::POINTER).unwrap();
        assert_eq!(event, DragEvent::ButtonRelease { button: 1 });
        assert_eq!(display.deferred().len(), 1);
        assert!(matches!(
            display.next_event(EventMask::POINTER),
            Err(DisplayError::Closed)
        ));
    }

    #[test]
    fn test_second_grab_is_refused() {
        let mut display = ScriptedDisplay::new(Point::new(0, 0));
        display
            .grab_pointer(NativeHandle(1), CursorKind::Move, EventMask::POINTER)
            .unwrap();
        assert!(matches!(
            display.grab_pointer(NativeHandle(1), CursorKind::Move, EventMask::POINTER),
            Err(GrabError::AlreadyGrabbed)
        ));
    }
}
