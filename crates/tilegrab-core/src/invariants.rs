//! Invariant validation for the window-manager state.
//!
//! Called after every drag session in debug builds.

use crate::ratio::{MAX_SPLIT, MIN_SPLIT};
use crate::state::WmState;

/// Error indicating which invariant was violated.
#[derive(Debug, thiserror::Error)]
pub enum InvariantError {
    #[error("Focused client {0} does not exist")]
    FocusedClientMissing(String),

    #[error("Client {client} references missing {what}")]
    DanglingReference { client: String, what: String },

    #[error("Tag {tag} has split fraction {fraction} outside [0.1, 0.9]")]
    SplitOutOfRange { tag: String, fraction: f64 },

    #[error("Client {0} has an empty geometry")]
    EmptyGeometry(String),
}

/// Validate all core invariants. Returns the first violation found.
pub fn validate(state: &WmState) -> Result<(), InvariantError> {
    // 1. Focused client must exist
    if let Some(id) = state.focus {
        if !state.clients.contains_key(&id) {
            return Err(InvariantError::FocusedClientMissing(format!("{id}")));
        }
    }

    // 2. Clients point at existing screens and tags, and are never empty
    for (id, client) in &state.clients {
        if !state.screens.contains_key(&client.screen) {
            return Err(InvariantError::DanglingReference {
                client: format!("{id}"),
                what: format!("{}", client.screen),
            });
        }
        if !state.tags.contains_key(&client.tag) {
            return Err(InvariantError::DanglingReference {
                client: format!("{id}"),
                what: format!("{}", client.tag),
            });
        }
        if client.geometry.width == 0 || client.geometry.height == 0 {
            return Err(InvariantError::EmptyGeometry(format!("{id}")));
        }
    }

    // 3. Split fractions stay clamped
    for (id, tag) in &state.tags {
        if !(MIN_SPLIT..=MAX_SPLIT).contains(&tag.split_fraction) {
            return Err(InvariantError::SplitOutOfRange {
                tag: format!("{id}"),
                fraction: tag.split_fraction,
            });
        }
    }

    Ok(())
}
