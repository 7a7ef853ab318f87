//! Bridge to the window manager's regular event handlers.
//!
//! While a drag is active the session loop is the only loop running, so
//! configure, expose and map events have to be handed to these handlers
//! inline or the rest of the desktop stalls.

use crate::event::{ConfigureRequest, ExposeEvent, MapRequest};
use crate::state::WmState;

pub trait EventHandlers {
    fn on_configure_request(&mut self, state: &mut WmState, request: &ConfigureRequest);

    fn on_expose(&mut self, state: &mut WmState, expose: &ExposeEvent);

    fn on_map_request(&mut self, state: &mut WmState, request: &MapRequest);
}
