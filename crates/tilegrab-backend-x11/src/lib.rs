//! Tilegrab X11 Backend - Adapter between x11rb and tilegrab-core.
//!
//! This crate:
//! - Owns all x11rb/protocol types.
//! - Implements [`DisplayServer`] on a live connection: pointer grab with
//!   glyph cursors, warp, masked event waits and motion draining.
//! - Implements [`EventHandlers`] so configure, expose and map requests keep
//!   being served while a drag holds the event loop.
//!
//! **No x11rb types leak into `tilegrab-core`.**

use std::collections::VecDeque;

use anyhow::{Context, Result};
use tracing::{debug, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    self, ConfigWindow, ConfigureWindowAux, ConnectionExt as _, Cursor, GrabMode, GrabStatus,
};
use x11rb::protocol::Event;

use tilegrab_core::config::Config;
use tilegrab_core::event::{ConfigureRequest, ExposeEvent, MapRequest};
use tilegrab_core::state::{Output, Point, ScreenId};
use tilegrab_core::window::{Client, ClientId, NativeHandle};
use tilegrab_core::{
    CursorKind, DisplayError, DisplayServer, DragController, DragEvent, DragOperation,
    DragOutcome, EventHandlers, EventMask, Geometry, GrabError, WmState,
};

/// Glyphs from the core X cursor font.
const XC_FLEUR: u16 = 52;
const XC_SIZING: u16 = 120;

fn request_error(e: impl std::fmt::Display) -> DisplayError {
    DisplayError::Request(e.to_string())
}

fn connection_error(e: impl std::fmt::Display) -> DisplayError {
    DisplayError::Connection(e.to_string())
}

/// Pointer-related bits of a session mask, as the grab request wants them.
fn grab_mask(mask: EventMask) -> xproto::EventMask {
    let mut x_mask = xproto::EventMask::NO_EVENT;
    if mask.contains(EventMask::POINTER_MOTION) {
        x_mask = x_mask | xproto::EventMask::POINTER_MOTION;
    }
    if mask.contains(EventMask::BUTTON_PRESS) {
        x_mask = x_mask | xproto::EventMask::BUTTON_PRESS;
    }
    if mask.contains(EventMask::BUTTON_RELEASE) {
        x_mask = x_mask | xproto::EventMask::BUTTON_RELEASE;
    }
    x_mask
}

/// Translate a protocol event into a [`DragEvent`], if a drag cares about it.
pub fn translate(event: &Event) -> Option<DragEvent> {
    match event {
        Event::MotionNotify(e) => Some(DragEvent::Motion(Point::new(
            i32::from(e.root_x),
            i32::from(e.root_y),
        ))),
        Event::ButtonPress(e) => Some(DragEvent::ButtonPress { button: e.detail }),
        Event::ButtonRelease(e) => Some(DragEvent::ButtonRelease { button: e.detail }),
        Event::Expose(e) => Some(DragEvent::Expose(ExposeEvent {
            window: NativeHandle(e.window),
            area: Geometry::new(
                i32::from(e.x),
                i32::from(e.y),
                u32::from(e.width),
                u32::from(e.height),
            ),
            count: e.count,
        })),
        Event::ConfigureRequest(e) => {
            let mask = u16::from(e.value_mask);
            let has = |flag: ConfigWindow| mask & u16::from(flag) != 0;
            Some(DragEvent::ConfigureRequest(ConfigureRequest {
                window: NativeHandle(e.window),
                x: has(ConfigWindow::X).then_some(i32::from(e.x)),
                y: has(ConfigWindow::Y).then_some(i32::from(e.y)),
                width: has(ConfigWindow::WIDTH).then_some(u32::from(e.width)),
                height: has(ConfigWindow::HEIGHT).then_some(u32::from(e.height)),
                border: has(ConfigWindow::BORDER_WIDTH).then_some(u32::from(e.border_width)),
            }))
        },
        Event::MapRequest(e) => Some(DragEvent::MapRequest(MapRequest {
            parent: NativeHandle(e.parent),
            window: NativeHandle(e.window),
        })),
        _ => None,
    }
}

/// Live X11 implementation of [`DisplayServer`].
pub struct X11Display<'c, C: Connection> {
    conn: &'c C,
    move_cursor: Cursor,
    resize_cursor: Cursor,
    /// Events read ahead while looking for queued motion.
    pending: VecDeque<Event>,
    /// Events outside the session mask, for the outer event loop.
    deferred: Vec<Event>,
}

impl<'c, C: Connection> X11Display<'c, C> {
    pub fn new(conn: &'c C) -> Result<Self, DisplayError> {
        let font = conn.generate_id().map_err(request_error)?;
        conn.open_font(font, b"cursor").map_err(request_error)?;

        let glyph_cursor = |glyph: u16| -> Result<Cursor, DisplayError> {
            let cursor = conn.generate_id().map_err(request_error)?;
            conn.create_glyph_cursor(
                cursor,
                font,
                font,
                glyph,
                glyph + 1,
                0,
                0,
                0,
                0xffff,
                0xffff,
                0xffff,
            )
            .map_err(request_error)?;
            Ok(cursor)
        };
        let move_cursor = glyph_cursor(XC_FLEUR)?;
        let resize_cursor = glyph_cursor(XC_SIZING)?;
        conn.close_font(font).map_err(request_error)?;

        Ok(Self {
            conn,
            move_cursor,
            resize_cursor,
            pending: VecDeque::new(),
            deferred: Vec::new(),
        })
    }

    /// Hand events the session did not select back to the caller.
    pub fn take_deferred(&mut self) -> Vec<Event> {
        self.deferred.extend(self.pending.drain(..));
        std::mem::take(&mut self.deferred)
    }

    fn flush(&self) -> Result<(), DisplayError> {
        self.conn.flush().map_err(connection_error)
    }
}

impl<C: Connection> Drop for X11Display<'_, C> {
    fn drop(&mut self) {
        for cursor in [self.move_cursor, self.resize_cursor] {
            if let Err(e) = self.conn.free_cursor(cursor) {
                warn!("Failed to free cursor: {}", e);
            }
        }
    }
}

impl<C: Connection> DisplayServer for X11Display<'_, C> {
    fn grab_pointer(
        &mut self,
        root: NativeHandle,
        cursor: CursorKind,
        mask: EventMask,
    ) -> Result<(), GrabError> {
        let cursor = match cursor {
            CursorKind::Move => self.move_cursor,
            CursorKind::Resize => self.resize_cursor,
        };
        let reply = self
            .conn
            .grab_pointer(
                false,
                root.0,
                grab_mask(mask),
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                cursor,
                x11rb::CURRENT_TIME,
            )
            .map_err(request_error)?
            .reply()
            .map_err(request_error)?;

        if reply.status == GrabStatus::SUCCESS {
            Ok(())
        } else if reply.status == GrabStatus::ALREADY_GRABBED {
            Err(GrabError::AlreadyGrabbed)
        } else {
            Err(GrabError::Refused(format!("{:?}", reply.status)))
        }
    }

    fn ungrab_pointer(&mut self) -> Result<(), DisplayError> {
        self.conn
            .ungrab_pointer(x11rb::CURRENT_TIME)
            .map_err(request_error)?;
        self.flush()
    }

    fn query_pointer(&mut self, root: NativeHandle) -> Result<Point, DisplayError> {
        let reply = self
            .conn
            .query_pointer(root.0)
            .map_err(request_error)?
            .reply()
            .map_err(request_error)?;
        Ok(Point::new(i32::from(reply.root_x), i32::from(reply.root_y)))
    }

    fn warp_pointer(&mut self, window: NativeHandle, x: i32, y: i32) -> Result<(), DisplayError> {
        let clamp = |v: i32| v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        self.conn
            .warp_pointer(x11rb::NONE, window.0, 0, 0, 0, 0, clamp(x), clamp(y))
            .map_err(request_error)?;
        self.flush()
    }

    fn next_event(&mut self, mask: EventMask) -> Result<DragEvent, DisplayError> {
        while let Some(event) = self.pending.pop_front() {
            match translate(&event) {
                Some(drag) if mask.contains(drag.mask()) => return Ok(drag),
                _ => self.deferred.push(event),
            }
        }
        loop {
            let event = self.conn.wait_for_event().map_err(connection_error)?;
            match translate(&event) {
                Some(drag) if mask.contains(drag.mask()) => return Ok(drag),
                _ => {
                    trace!(?event, "Deferring event outside drag mask");
                    self.deferred.push(event);
                },
            }
        }
    }

    fn take_queued_motion(&mut self) -> Result<Option<Point>, DisplayError> {
        let queued = self
            .pending
            .iter()
            .position(|event| matches!(event, Event::MotionNotify(_)));
        if let Some(index) = queued {
            return Ok(self
                .pending
                .remove(index)
                .as_ref()
                .and_then(translate)
                .and_then(|event| match event {
                    DragEvent::Motion(point) => Some(point),
                    _ => None,
                }));
        }

        while let Some(event) = self.conn.poll_for_event().map_err(connection_error)? {
            if let Event::MotionNotify(e) = &event {
                return Ok(Some(Point::new(i32::from(e.root_x), i32::from(e.root_y))));
            }
            self.pending.push_back(event);
        }
        Ok(None)
    }

    fn configure_window(
        &mut self,
        window: NativeHandle,
        geometry: Geometry,
        interactive: bool,
    ) -> Result<(), DisplayError> {
        let mut aux = ConfigureWindowAux::new()
            .x(geometry.x)
            .y(geometry.y)
            .width(geometry.width)
            .height(geometry.height);
        if !interactive {
            aux = aux.border_width(geometry.border);
        }
        self.conn
            .configure_window(window.0, &aux)
            .map_err(request_error)?;
        self.flush()
    }
}

/// Regular window-manager handlers for events arriving mid-drag.
pub struct X11Handlers<'c, C: Connection> {
    conn: &'c C,
}

impl<'c, C: Connection> X11Handlers<'c, C> {
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    fn send(&self, window: NativeHandle, aux: &ConfigureWindowAux) {
        let sent = self
            .conn
            .configure_window(window.0, aux)
            .map_err(request_error)
            .and_then(|_| self.conn.flush().map_err(connection_error));
        if let Err(e) = sent {
            warn!(%window, "Failed to configure window: {}", e);
        }
    }
}

impl<C: Connection> EventHandlers for X11Handlers<'_, C> {
    fn on_configure_request(&mut self, state: &mut WmState, request: &ConfigureRequest) {
        let managed = state
            .client_by_handle(request.window)
            .map(|c| (c.id, c.is_floating(), c.geometry));

        let geometry = match managed {
            // Floating clients may place themselves.
            Some((id, true, current)) => state.apply_geometry(id, request.merged_with(current)),
            // Tiled clients are held where the layout put them.
            Some((_, false, current)) => Some(current),
            None => {
                debug!(window = %request.window, "Configure request from unmanaged window");
                let aux = ConfigureWindowAux::new()
                    .x(request.x)
                    .y(request.y)
                    .width(request.width)
                    .height(request.height)
                    .border_width(request.border);
                self.send(request.window, &aux);
                return;
            },
        };

        if let Some(geometry) = geometry {
            let aux = ConfigureWindowAux::new()
                .x(geometry.x)
                .y(geometry.y)
                .width(geometry.width)
                .height(geometry.height)
                .border_width(geometry.border);
            self.send(request.window, &aux);
        }
    }

    fn on_expose(&mut self, _state: &mut WmState, expose: &ExposeEvent) {
        trace!(window = %expose.window, count = expose.count, "Expose during drag");
    }

    fn on_map_request(&mut self, _state: &mut WmState, request: &MapRequest) {
        debug!(window = %request.window, "Mapping window during drag");
        let mapped = self
            .conn
            .map_window(request.window.0)
            .map_err(request_error)
            .and_then(|_| self.conn.flush().map_err(connection_error));
        if let Err(e) = mapped {
            warn!(window = %request.window, "Failed to map window: {}", e);
        }
    }
}

/// Connect to the X server and run one drag on `window`.
///
/// The window is registered as the focused client of the first screen; the
/// drag starts immediately and ends on the next button release.
pub fn run_single_drag(
    config: &Config,
    window: u32,
    operation: DragOperation,
) -> Result<DragOutcome> {
    let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
    let screen = conn
        .setup()
        .roots
        .get(screen_num)
        .context("X server reported no screens")?;
    let root = NativeHandle(screen.root);
    info!(%root, screen = screen_num, "Connected to X server");

    let outputs = [Output {
        geometry: Geometry::new(
            0,
            0,
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        ),
        root,
    }];
    let mut state = WmState::from_config(config, &outputs)?;

    let reply = conn
        .get_geometry(window)
        .context("Failed to query window geometry")?
        .reply()
        .with_context(|| format!("Window 0x{window:x} does not exist"))?;
    let geometry = Geometry::new(
        i32::from(reply.x),
        i32::from(reply.y),
        u32::from(reply.width),
        u32::from(reply.height),
    )
    .with_border(u32::from(reply.border_width));

    let tag = state
        .screen(ScreenId(0))
        .map(|s| s.tag)
        .context("No screen configured")?;
    let id = state.add_client(Client::new(
        ClientId(1),
        NativeHandle(window),
        ScreenId(0),
        tag,
        geometry,
    ));
    state.focus_client(id);

    let mut display = X11Display::new(&conn)?;
    let mut handlers = X11Handlers::new(&conn);
    let outcome = DragController::new(&mut state, &mut display, &mut handlers)
        .begin(ScreenId(0), operation);

    let deferred = display.take_deferred();
    debug!(count = deferred.len(), "Events deferred during drag");
    Ok(outcome)
}
