//! Tilegrab Core - Protocol-agnostic pointer move/resize controller
//!
//! This crate contains the interactive drag logic of a tiling window
//! manager (edge snapping, master-split adjustment, the drag session state
//! machine) with zero dependencies on display protocols.
//!
//! Backends implement [`DisplayServer`] for the pointer grab and event
//! queue, and [`EventHandlers`] for the events that must keep flowing while
//! a drag holds the event loop. The window-manager state is passed in by
//! reference for the duration of one drag.
//!
//! # Quick Start
//! ```
//! use tilegrab_core::config::Config;
//! use tilegrab_core::headless::{RecordingHandlers, ScriptedDisplay};
//! use tilegrab_core::state::{Output, Point, ScreenId};
//! use tilegrab_core::window::{Client, ClientId, NativeHandle};
//! use tilegrab_core::{DragController, DragEvent, DragOutcome, Geometry, WmState};
//!
//! let outputs = [Output {
//!     geometry: Geometry::new(0, 0, 1920, 1080),
//!     root: NativeHandle(0x100),
//! }];
//! let mut state = WmState::from_config(&Config::default(), &outputs).unwrap();
//! let tag = state.screen(ScreenId(0)).unwrap().tag;
//! let id = state.add_client(Client::new(
//!     ClientId(1),
//!     NativeHandle(0x40_0001),
//!     ScreenId(0),
//!     tag,
//!     Geometry::new(100, 100, 640, 480),
//! ));
//! state.focus_client(id);
//!
//! // The display reports the pointer at (200, 200), then a drag and release.
//! let mut display = ScriptedDisplay::new(Point::new(200, 200))
//!     .with_batch([DragEvent::Motion(Point::new(260, 230))])
//!     .with_batch([DragEvent::ButtonRelease { button: 1 }]);
//! let mut handlers = RecordingHandlers::default();
//!
//! let outcome = DragController::new(&mut state, &mut display, &mut handlers)
//!     .begin_move(ScreenId(0));
//!
//! assert!(matches!(outcome, DragOutcome::Completed(_)));
//! let client = state.client(id).unwrap();
//! assert!(client.is_floating());
//! assert_eq!((client.geometry.x, client.geometry.y), (160, 130));
//! ```

pub mod config;
pub mod dispatch;
pub mod display;
pub mod event;
pub mod headless;
pub mod input;
pub mod invariants;
pub mod layout;
pub mod ratio;
pub mod session;
pub mod snap;
pub mod state;
pub mod window;
pub mod workspace;

// Re-export primary API types at crate root
pub use dispatch::EventHandlers;
pub use display::{CursorKind, DisplayError, DisplayServer, GrabError, PointerGrab};
pub use event::{DragEvent, EventMask};
pub use input::DragOperation;
pub use layout::LayoutKind;
pub use session::{Abandon, DragController, DragOutcome, SessionState, SessionStats};
pub use state::{Geometry, WmState};
pub use window::ClientId;
pub use workspace::TagId;
