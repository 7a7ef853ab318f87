//! Managed client windows.
//!
//! Protocol-agnostic client representation. The only display-server detail
//! kept here is the opaque [`NativeHandle`] the backend hands back to us.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::state::{Geometry, ScreenId};
use crate::workspace::TagId;

/// Unique, opaque identifier for a managed client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client:{}", self.0)
    }
}

/// Display-server window handle (an X11 XID for the x11 backend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeHandle(pub u32);

impl std::fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

bitflags! {
    /// Client state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClientFlags: u32 {
        const FLOATING   = 0b0001;
        const FIXED_SIZE = 0b0010;
        const MAXIMIZED  = 0b0100;
    }
}

/// Size constraints advertised by the client (`WM_NORMAL_HINTS`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeHints {
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl SizeHints {
    /// A client whose minimum and maximum sizes coincide cannot be resized.
    pub fn is_fixed(&self) -> bool {
        matches!(
            (self.min_width, self.max_width, self.min_height, self.max_height),
            (Some(min_w), Some(max_w), Some(min_h), Some(max_h))
                if min_w == max_w && min_h == max_h && max_w > 0 && max_h > 0
        )
    }
}

/// A managed window.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    pub handle: NativeHandle,
    pub name: String,
    pub screen: ScreenId,
    pub tag: TagId,
    /// Current geometry; `geometry.border` is the client's border width.
    pub geometry: Geometry,
    /// Where the client goes when it is (or becomes) floating.
    pub floating_geometry: Geometry,
    pub flags: ClientFlags,
    pub size_hints: SizeHints,
}

impl Client {
    pub fn new(
        id: ClientId,
        handle: NativeHandle,
        screen: ScreenId,
        tag: TagId,
        geometry: Geometry,
    ) -> Self {
        Self {
            id,
            handle,
            name: String::new(),
            screen,
            tag,
            geometry,
            floating_geometry: geometry,
            flags: ClientFlags::empty(),
            size_hints: SizeHints::default(),
        }
    }

    pub const fn border(&self) -> u32 {
        self.geometry.border
    }

    pub const fn is_floating(&self) -> bool {
        self.flags.contains(ClientFlags::FLOATING)
    }

    pub const fn is_fixed_size(&self) -> bool {
        self.flags.contains(ClientFlags::FIXED_SIZE)
    }

    pub const fn is_maximized(&self) -> bool {
        self.flags.contains(ClientFlags::MAXIMIZED)
    }

    pub fn set_floating(&mut self, floating: bool) {
        self.flags.set(ClientFlags::FLOATING, floating);
    }

    /// Record new size hints and derive the fixed-size flag from them.
    pub fn set_size_hints(&mut self, hints: SizeHints) {
        self.size_hints = hints;
        self.flags.set(ClientFlags::FIXED_SIZE, hints.is_fixed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(
            ClientId(1),
            NativeHandle(0x0040_0001),
            ScreenId(0),
            TagId(1),
            Geometry::new(0, 0, 640, 480).with_border(1),
        )
    }

    #[test]
    fn test_client_flags() {
        let mut client = client();
        assert!(!client.is_floating());
        client.set_floating(true);
        assert!(client.is_floating());
        client.flags.insert(ClientFlags::MAXIMIZED);
        assert!(client.is_maximized());
        client.set_floating(false);
        assert!(!client.is_floating());
        assert!(client.is_maximized());
    }

    #[test]
    fn test_size_hints_fixed_size() {
        let mut client = client();
        client.set_size_hints(SizeHints {
            min_width: Some(300),
            min_height: Some(200),
            max_width: Some(300),
            max_height: Some(200),
        });
        assert!(client.is_fixed_size());

        client.set_size_hints(SizeHints {
            min_width: Some(100),
            max_width: Some(300),
            ..SizeHints::default()
        });
        assert!(!client.is_fixed_size());
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(NativeHandle(0x0040_0001).to_string(), "0x400001");
        assert_eq!(ClientId(7).to_string(), "client:7");
    }
}
