//! Drag session controller.
//!
//! A session is a small state machine:
//!
//! ```text
//! Idle -> Grabbing -> Active -> Terminated
//! ```
//!
//! Preconditions are checked while `Idle` without touching any state.
//! `Grabbing` performs the floating conversion a move needs together with
//! the pointer grab, undoing the conversion if the grab is refused. While
//! `Active` the session is the event loop: it blocks on the display, applies
//! motion and forwards administrative events to the regular handlers until
//! a button is released.

use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use crate::dispatch::EventHandlers;
use crate::display::{CursorKind, DisplayError, DisplayServer, PointerGrab};
use crate::event::{DragEvent, EventMask};
use crate::input::DragOperation;
use crate::layout::{LayoutKind, ResizeCorner};
use crate::ratio;
use crate::snap::snap;
use crate::state::{Geometry, Point, ScreenId, WmState};
use crate::window::{ClientFlags, ClientId, NativeHandle};
use crate::workspace::TagId;

/// Lifecycle of one drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Grabbing,
    Active,
    Terminated,
}

impl SessionState {
    /// Events the session waits on in this state.
    pub const fn event_mask(self) -> EventMask {
        match self {
            Self::Active => EventMask::DRAG_SESSION,
            Self::Idle | Self::Grabbing | Self::Terminated => EventMask::empty(),
        }
    }
}

/// Why a drag never started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Abandon {
    NoFocusedClient,
    UnknownScreen,
    FixedSize,
    /// A tiled resize needs at least one tiled client beyond the masters.
    NoResizableTiles,
}

/// Counters collected while a session is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Motion events processed.
    pub motions: usize,
    /// Queued motion events drained and dropped after a processed one.
    pub coalesced: usize,
    /// Events handed to the regular event handlers.
    pub forwarded: usize,
}

/// How a call to [`DragController::begin_move`] or
/// [`DragController::begin_resize`] ended.
///
/// Purely informational; binding tables are free to ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DragOutcome {
    Abandoned(Abandon),
    GrabFailed,
    Completed(SessionStats),
    /// The display went away mid-drag.
    Interrupted(SessionStats),
}

/// Behaviour chosen once at session start.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SessionMode {
    Move { area: Geometry, threshold: u32 },
    FloatingResize,
    TiledResize {
        screen: ScreenId,
        tag: TagId,
        layout: LayoutKind,
        area: Geometry,
    },
}

/// Everything decided while `Idle`.
#[derive(Debug, Clone, Copy)]
struct SessionPlan {
    operation: DragOperation,
    client: ClientId,
    handle: NativeHandle,
    root: NativeHandle,
    mode: SessionMode,
    /// Move on a tiled client: convert to floating first.
    make_floating: bool,
    /// Window and offset the pointer is warped to before a resize.
    warp: Option<(NativeHandle, i32, i32)>,
}

/// Transient per-drag data, dropped on termination.
#[derive(Debug)]
struct DragSession {
    plan: SessionPlan,
    state: SessionState,
    anchor_pointer: Point,
    anchor_geometry: Geometry,
    stats: SessionStats,
}

/// State saved by the floating conversion so a refused grab can undo it.
#[derive(Debug, Clone, Copy)]
struct FloatRollback {
    flags: ClientFlags,
    floating_geometry: Geometry,
}

/// Runs move/resize drags against explicit window-manager state, display
/// and event handlers.
///
/// Holding the controller borrows all three mutably, so a second drag
/// cannot start while one is running.
pub struct DragController<'a, D, H> {
    state: &'a mut WmState,
    display: &'a mut D,
    handlers: &'a mut H,
}

impl<'a, D: DisplayServer, H: EventHandlers> DragController<'a, D, H> {
    pub fn new(state: &'a mut WmState, display: &'a mut D, handlers: &'a mut H) -> Self {
        Self {
            state,
            display,
            handlers,
        }
    }

    /// Move the focused client with the pointer until a button is released.
    pub fn begin_move(&mut self, screen: ScreenId) -> DragOutcome {
        self.begin(screen, DragOperation::Move)
    }

    /// Resize the focused client, or the master split of a tiled layout,
    /// until a button is released.
    pub fn begin_resize(&mut self, screen: ScreenId) -> DragOutcome {
        self.begin(screen, DragOperation::Resize)
    }

    pub fn begin(&mut self, screen: ScreenId, operation: DragOperation) -> DragOutcome {
        let plan = match self.plan(screen, operation) {
            Ok(plan) => plan,
            Err(reason) => {
                debug!(?operation, %screen, ?reason, "Drag abandoned");
                return DragOutcome::Abandoned(reason);
            },
        };

        let outcome = self.run(plan);

        #[cfg(debug_assertions)]
        if let Err(e) = self.state.validate_invariants() {
            warn!("Invariant violation after drag: {}", e);
        }

        outcome
    }

    fn plan(&self, screen: ScreenId, operation: DragOperation) -> Result<SessionPlan, Abandon> {
        let client = self.state.focused_client().ok_or(Abandon::NoFocusedClient)?;
        let screen_state = self.state.screen(screen).ok_or(Abandon::UnknownScreen)?;
        let layout = self
            .state
            .current_layout(screen)
            .ok_or(Abandon::UnknownScreen)?;
        let root_of = |id: ScreenId| {
            self.state
                .physical_screen(id)
                .unwrap_or(screen_state.root)
        };

        match operation {
            DragOperation::Move => {
                let area = self
                    .state
                    .usable_area(client.screen)
                    .unwrap_or_else(|| screen_state.usable_area());
                Ok(SessionPlan {
                    operation,
                    client: client.id,
                    handle: client.handle,
                    root: root_of(client.screen),
                    mode: SessionMode::Move {
                        area,
                        threshold: screen_state.snap,
                    },
                    make_floating: layout.is_tiling() && !client.is_floating(),
                    warp: None,
                })
            },
            DragOperation::Resize if client.is_fixed_size() => Err(Abandon::FixedSize),
            DragOperation::Resize if !layout.is_tiling() || client.is_floating() => {
                let (x, y) = ResizeCorner::BottomRight.offset(client.geometry);
                Ok(SessionPlan {
                    operation,
                    client: client.id,
                    handle: client.handle,
                    root: root_of(client.screen),
                    mode: SessionMode::FloatingResize,
                    make_floating: false,
                    warp: Some((client.handle, x, y)),
                })
            },
            DragOperation::Resize => {
                let tag = self.state.current_tag(screen).ok_or(Abandon::UnknownScreen)?;
                let tiled = self.state.tiled_clients(screen).count();
                if tiled <= tag.master_count as usize {
                    return Err(Abandon::NoResizableTiles);
                }
                let first = self
                    .state
                    .tiled_clients(screen)
                    .next()
                    .ok_or(Abandon::NoResizableTiles)?;
                let (x, y) = layout.resize_corner().offset(first.geometry);
                Ok(SessionPlan {
                    operation,
                    client: client.id,
                    handle: client.handle,
                    root: root_of(first.screen),
                    mode: SessionMode::TiledResize {
                        screen,
                        tag: tag.id,
                        layout,
                        area: screen_state.usable_area(),
                    },
                    make_floating: false,
                    warp: Some((first.handle, x, y)),
                })
            },
        }
    }

    fn run(&mut self, plan: SessionPlan) -> DragOutcome {
        let mut session = DragSession {
            plan,
            state: SessionState::Idle,
            anchor_pointer: Point::default(),
            anchor_geometry: Geometry::default(),
            stats: SessionStats::default(),
        };

        session.state = SessionState::Grabbing;
        let rollback = if plan.make_floating {
            self.make_floating(plan.client)
        } else {
            None
        };

        let cursor = match plan.operation {
            DragOperation::Move => CursorKind::Move,
            DragOperation::Resize => CursorKind::Resize,
        };
        let mut grab = match PointerGrab::acquire(&mut *self.display, plan.root, cursor) {
            Ok(grab) => grab,
            Err(e) => {
                warn!(client = %plan.client, "Pointer grab failed: {}", e);
                Self::undo_floating(self.state, plan.client, rollback);
                return DragOutcome::GrabFailed;
            },
        };

        if let Err(e) = Self::activate(self.state, &mut grab, &mut session, rollback.is_some()) {
            error!("Display failed while starting drag: {}", e);
            Self::undo_floating(self.state, plan.client, rollback);
            return DragOutcome::Interrupted(session.stats);
        }
        info!(
            operation = ?plan.operation,
            client = %plan.client,
            "Drag session active"
        );

        let result = loop {
            let event = match grab.next_event(session.state.event_mask()) {
                Ok(event) => event,
                Err(e) => break Err(e),
            };
            match event {
                DragEvent::ButtonRelease { button } => {
                    debug!(button, "Button released, ending drag");
                    break Ok(());
                },
                DragEvent::ButtonPress { .. } => {},
                DragEvent::Expose(expose) => {
                    session.stats.forwarded += 1;
                    self.handlers.on_expose(self.state, &expose);
                },
                DragEvent::ConfigureRequest(request) => {
                    session.stats.forwarded += 1;
                    self.handlers.on_configure_request(self.state, &request);
                },
                DragEvent::MapRequest(request) => {
                    session.stats.forwarded += 1;
                    self.handlers.on_map_request(self.state, &request);
                },
                DragEvent::Motion(pointer) => {
                    session.stats.motions += 1;
                    if let Err(e) = Self::on_motion(self.state, &mut grab, &session, pointer) {
                        break Err(e);
                    }
                    match Self::drain_motion(&mut grab) {
                        Ok(dropped) => session.stats.coalesced += dropped,
                        Err(e) => break Err(e),
                    }
                },
            }
        };

        session.state = SessionState::Terminated;
        match result {
            Ok(()) => {
                if let Err(e) = Self::finish(self.state, &mut grab, &session) {
                    warn!("Final configure failed: {}", e);
                }
                if let Err(e) = grab.release() {
                    warn!("Failed to release pointer grab: {}", e);
                }
                info!(stats = ?session.stats, "Drag session finished");
                DragOutcome::Completed(session.stats)
            },
            Err(e) => {
                error!("Display failed during drag: {}", e);
                DragOutcome::Interrupted(session.stats)
            },
        }
    }

    /// Float a tiled client for a move, keeping what is needed to undo it.
    fn make_floating(&mut self, id: ClientId) -> Option<FloatRollback> {
        let client = self.state.client_mut(id)?;
        let saved = FloatRollback {
            flags: client.flags,
            floating_geometry: client.floating_geometry,
        };
        client.floating_geometry = client.geometry;
        client.set_floating(true);
        debug!(client = %id, "Client floated for move");
        Some(saved)
    }

    fn undo_floating(state: &mut WmState, id: ClientId, rollback: Option<FloatRollback>) {
        let Some(saved) = rollback else {
            return;
        };
        if let Some(client) = state.client_mut(id) {
            client.flags = saved.flags;
            client.floating_geometry = saved.floating_geometry;
            debug!(client = %id, "Floating conversion undone");
        }
    }

    /// `Grabbing -> Active`: record anchors, clear maximized, warp.
    fn activate(
        state: &mut WmState,
        display: &mut D,
        session: &mut DragSession,
        floated: bool,
    ) -> Result<(), DisplayError> {
        let plan = session.plan;
        if plan.operation == DragOperation::Move {
            session.anchor_pointer = display.query_pointer(plan.root)?;
        }

        if let Some(client) = state.client_mut(plan.client) {
            client.flags.remove(ClientFlags::MAXIMIZED);
            session.anchor_geometry = client.geometry;
            if floated {
                let screen = client.screen;
                state.mark_needs_arrange(screen);
            }
        }

        if let Some((window, x, y)) = plan.warp {
            display.warp_pointer(window, x, y)?;
        }

        session.state = SessionState::Active;
        Ok(())
    }

    fn on_motion(
        state: &mut WmState,
        display: &mut D,
        session: &DragSession,
        pointer: Point,
    ) -> Result<(), DisplayError> {
        trace!(x = pointer.x, y = pointer.y, "Motion");
        let anchor = session.anchor_geometry;

        match session.plan.mode {
            SessionMode::Move { area, threshold } => {
                let candidate = Geometry {
                    x: anchor
                        .x
                        .saturating_add(pointer.x.saturating_sub(session.anchor_pointer.x)),
                    y: anchor
                        .y
                        .saturating_add(pointer.y.saturating_sub(session.anchor_pointer.y)),
                    ..anchor
                };
                let target = snap(candidate, area, threshold);
                Self::apply(state, display, session, target, true)
            },
            SessionMode::FloatingResize => {
                let target = Geometry {
                    width: drag_extent(pointer.x, anchor.x, anchor.border),
                    height: drag_extent(pointer.y, anchor.y, anchor.border),
                    ..anchor
                };
                Self::apply(state, display, session, target, true)
            },
            SessionMode::TiledResize {
                screen,
                tag,
                layout,
                area,
            } => {
                let Some(tag_state) = state.tags.get_mut(&tag) else {
                    return Ok(());
                };
                let update = ratio::adjust(pointer, area, layout, tag_state.split_fraction);
                if update.rearrange {
                    tag_state.set_split_fraction(update.fraction);
                    debug!(%tag, fraction = update.fraction, "Master split updated");
                    state.mark_needs_arrange(screen);
                }
                Ok(())
            },
        }
    }

    /// Drop motion already queued behind the sample just processed.
    fn drain_motion(display: &mut D) -> Result<usize, DisplayError> {
        let mut dropped = 0;
        while display.take_queued_motion()?.is_some() {
            dropped += 1;
        }
        Ok(dropped)
    }

    /// Settle the final geometry with a full, non-interactive configure.
    fn finish(
        state: &mut WmState,
        display: &mut D,
        session: &DragSession,
    ) -> Result<(), DisplayError> {
        if matches!(session.plan.mode, SessionMode::TiledResize { .. })
            || session.stats.motions == 0
        {
            return Ok(());
        }
        let Some(geometry) = state.client(session.plan.client).map(|c| c.geometry) else {
            return Ok(());
        };
        Self::apply(state, display, session, geometry, false)
    }

    fn apply(
        state: &mut WmState,
        display: &mut D,
        session: &DragSession,
        geometry: Geometry,
        interactive: bool,
    ) -> Result<(), DisplayError> {
        // The client may have gone away through a forwarded event.
        let Some(applied) = state.apply_geometry(session.plan.client, geometry) else {
            return Ok(());
        };
        display.configure_window(session.plan.handle, applied, interactive)
    }
}

/// Width or height spanned from `origin` to `pointer`, borders excluded,
/// never below one pixel.
pub(crate) fn drag_extent(pointer: i32, origin: i32, border: u32) -> u32 {
    let extent = i64::from(pointer) - i64::from(origin) - 2 * i64::from(border) + 1;
    extent.clamp(1, i64::from(u32::MAX)) as u32
}
