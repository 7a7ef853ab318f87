//! Window-manager state shared with the drag controller.
//!
//! [`WmState`] is the client registry plus per-screen and per-tag state.
//! It is handed to the controller by reference for the duration of one
//! drag; nothing here is global.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::layout::LayoutKind;
use crate::window::{Client, ClientFlags, ClientId, NativeHandle};
use crate::workspace::{TagId, TagState};

/// Geometry of a rectangular region.
///
/// `border` is drawn outside `width`/`height`, so a window occupies
/// `width + 2 * border` pixels horizontally. Work areas carry a zero border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub border: u32,
}

impl Geometry {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            border: 0,
        }
    }

    #[must_use]
    pub const fn with_border(self, border: u32) -> Self {
        Self { border, ..self }
    }

    /// Horizontal footprint including both borders.
    pub const fn outer_width(self) -> i64 {
        self.width as i64 + 2 * self.border as i64
    }

    /// Vertical footprint including both borders.
    pub const fn outer_height(self) -> i64 {
        self.height as i64 + 2 * self.border as i64
    }

    /// Shrink by the given insets, never below zero extent.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn inset(self, top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            x: self.x + left as i32,
            y: self.y + top as i32,
            width: self.width.saturating_sub(left + right),
            height: self.height.saturating_sub(top + bottom),
            border: self.border,
        }
    }
}

/// A pointer position in root-window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Identifier of a logical screen (one per monitor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenId(pub u32);

impl std::fmt::Display for ScreenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "screen:{}", self.0)
    }
}

/// Where the status bar is docked on a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusBarPosition {
    Top,
    Bottom,
    Left,
    Right,
    #[default]
    Off,
}

/// Space reserved by the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StatusBar {
    pub position: StatusBarPosition,
    /// Height for top/bottom bars, width for left/right bars.
    pub thickness: u32,
}

/// Extra space kept free around the tiling area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Padding {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

/// A physical output as discovered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub geometry: Geometry,
    /// Root window of the display-server screen this output belongs to.
    pub root: NativeHandle,
}

/// Per-screen state.
#[derive(Debug, Clone)]
pub struct Screen {
    pub id: ScreenId,
    pub geometry: Geometry,
    pub root: NativeHandle,
    pub statusbar: StatusBar,
    pub padding: Padding,
    /// Distance in pixels under which a dragged window locks to an edge.
    pub snap: u32,
    /// Currently viewed tag.
    pub tag: TagId,
    /// Raised when the arrangement engine must re-run on its next pass.
    pub need_arrange: bool,
}

impl Screen {
    /// Work area left after the status bar and padding reservations.
    pub const fn usable_area(&self) -> Geometry {
        let bar = self.statusbar.thickness;
        let area = match self.statusbar.position {
            StatusBarPosition::Top => self.geometry.inset(bar, 0, 0, 0),
            StatusBarPosition::Bottom => self.geometry.inset(0, 0, bar, 0),
            StatusBarPosition::Left => self.geometry.inset(0, 0, 0, bar),
            StatusBarPosition::Right => self.geometry.inset(0, bar, 0, 0),
            StatusBarPosition::Off => self.geometry,
        };
        let pad = self.padding;
        area.inset(pad.top, pad.right, pad.bottom, pad.left)
    }
}

/// The central window-manager state the drag controller reads and writes.
#[derive(Debug, Default)]
pub struct WmState {
    /// Managed clients in stacking/list order.
    pub clients: IndexMap<ClientId, Client>,
    pub screens: IndexMap<ScreenId, Screen>,
    pub tags: IndexMap<TagId, TagState>,
    pub focus: Option<ClientId>,
}

impl WmState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build screens and tags for the given outputs from configuration.
    ///
    /// Output `i` becomes `ScreenId(i)`; each screen gets its own set of
    /// tags and views the first one.
    pub fn from_config(config: &Config, outputs: &[Output]) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut state = Self::new();
        let mut next_tag = 1;

        for (index, output) in outputs.iter().enumerate() {
            let id = ScreenId(index as u32);
            let overrides = config.screen_config(index);

            let mut first_tag = None;
            for name in &config.general.tags {
                let tag_id = TagId(next_tag);
                next_tag += 1;
                let mut tag = TagState::new(tag_id, name.clone(), id, config.general.default_layout);
                tag.set_split_fraction(config.general.split_fraction);
                tag.master_count = config.general.master_count;
                state.tags.insert(tag_id, tag);
                first_tag.get_or_insert(tag_id);
            }
            let tag = first_tag.ok_or(ConfigError::NoTags)?;

            state.screens.insert(
                id,
                Screen {
                    id,
                    geometry: output.geometry,
                    root: output.root,
                    statusbar: overrides.map(|s| s.statusbar).unwrap_or_default(),
                    padding: overrides.map(|s| s.padding).unwrap_or_default(),
                    snap: config.snap_for(index),
                    tag,
                    need_arrange: false,
                },
            );
        }

        Ok(state)
    }

    pub fn add_client(&mut self, client: Client) -> ClientId {
        let id = client.id;
        self.clients.insert(id, client);
        if let Some(screen) = self.clients.get(&id).map(|c| c.screen) {
            self.mark_needs_arrange(screen);
        }
        id
    }

    pub fn focus_client(&mut self, id: ClientId) {
        if self.clients.contains_key(&id) {
            self.focus = Some(id);
        }
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn client_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    pub fn client_by_handle(&self, handle: NativeHandle) -> Option<&Client> {
        self.clients.values().find(|c| c.handle == handle)
    }

    /// Clients in list order.
    pub fn clients(&self) -> impl Iterator<Item = &Client> + '_ {
        self.clients.values()
    }

    pub fn focused_client(&self) -> Option<&Client> {
        self.focus.and_then(|id| self.clients.get(&id))
    }

    pub fn screen(&self, id: ScreenId) -> Option<&Screen> {
        self.screens.get(&id)
    }

    pub fn current_tag(&self, screen: ScreenId) -> Option<&TagState> {
        let tag = self.screens.get(&screen)?.tag;
        self.tags.get(&tag)
    }

    pub fn current_tag_mut(&mut self, screen: ScreenId) -> Option<&mut TagState> {
        let tag = self.screens.get(&screen)?.tag;
        self.tags.get_mut(&tag)
    }

    pub fn current_layout(&self, screen: ScreenId) -> Option<LayoutKind> {
        self.current_tag(screen).map(|tag| tag.layout)
    }

    pub fn usable_area(&self, screen: ScreenId) -> Option<Geometry> {
        self.screens.get(&screen).map(Screen::usable_area)
    }

    /// Root window of the display-server screen backing `screen`.
    pub fn physical_screen(&self, screen: ScreenId) -> Option<NativeHandle> {
        self.screens.get(&screen).map(|s| s.root)
    }

    /// Whether `client` takes part in the tiling arrangement of `screen`.
    pub fn is_tiled(&self, client: &Client, screen: ScreenId) -> bool {
        self.screens.get(&screen).is_some_and(|s| {
            client.screen == screen && client.tag == s.tag && !client.is_floating()
        })
    }

    /// Tiled clients of `screen`, in list order.
    pub fn tiled_clients(&self, screen: ScreenId) -> impl Iterator<Item = &Client> + '_ {
        self.clients
            .values()
            .filter(move |client| self.is_tiled(client, screen))
    }

    pub fn mark_needs_arrange(&mut self, screen: ScreenId) {
        if let Some(screen) = self.screens.get_mut(&screen) {
            screen.need_arrange = true;
        }
    }

    /// Store a new geometry for a client.
    ///
    /// Width and height are floored at 1 and the border always comes from
    /// the client. Floating clients also get their floating snapshot
    /// updated so a later tile/float toggle returns them here.
    pub fn apply_geometry(&mut self, id: ClientId, geometry: Geometry) -> Option<Geometry> {
        let client = self.clients.get_mut(&id)?;
        let applied = Geometry {
            x: geometry.x,
            y: geometry.y,
            width: geometry.width.max(1),
            height: geometry.height.max(1),
            border: client.border(),
        };
        client.geometry = applied;
        if client.flags.contains(ClientFlags::FLOATING) {
            client.floating_geometry = applied;
        }
        Some(applied)
    }

    /// Validate core invariants. See `invariants` module.
    pub fn validate_invariants(&self) -> Result<(), crate::invariants::InvariantError> {
        crate::invariants::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn screen_with(statusbar: StatusBar, padding: Padding) -> Screen {
        Screen {
            id: ScreenId(0),
            geometry: Geometry::new(0, 0, 1920, 1080),
            root: NativeHandle(0x100),
            statusbar,
            padding,
            snap: 8,
            tag: TagId(1),
            need_arrange: false,
        }
    }

    #[test]
    fn test_usable_area_subtracts_statusbar_then_padding() {
        let screen = screen_with(
            StatusBar {
                position: StatusBarPosition::Top,
                thickness: 20,
            },
            Padding {
                top: 5,
                right: 10,
                bottom: 15,
                left: 10,
            },
        );
        assert_eq!(screen.usable_area(), Geometry::new(10, 25, 1900, 1040));
    }

    #[test]
    fn test_usable_area_side_bars() {
        let right = screen_with(
            StatusBar {
                position: StatusBarPosition::Right,
                thickness: 30,
            },
            Padding::default(),
        );
        assert_eq!(right.usable_area(), Geometry::new(0, 0, 1890, 1080));

        let left = screen_with(
            StatusBar {
                position: StatusBarPosition::Left,
                thickness: 30,
            },
            Padding::default(),
        );
        assert_eq!(left.usable_area(), Geometry::new(30, 0, 1890, 1080));
    }

    #[test]
    fn test_inset_never_underflows() {
        let geo = Geometry::new(0, 0, 10, 10).inset(8, 8, 8, 8);
        assert_eq!(geo.width, 0);
        assert_eq!(geo.height, 0);
    }

    #[test]
    fn test_outer_extent_counts_both_borders() {
        let geo = Geometry::new(0, 0, 200, 100).with_border(2);
        assert_eq!(geo.outer_width(), 204);
        assert_eq!(geo.outer_height(), 104);
    }

    #[test]
    fn test_from_config_builds_tags_per_screen() {
        let config = Config::default();
        let outputs = [
            Output {
                geometry: Geometry::new(0, 0, 1920, 1080),
                root: NativeHandle(0x100),
            },
            Output {
                geometry: Geometry::new(1920, 0, 1280, 1024),
                root: NativeHandle(0x100),
            },
        ];
        let state = WmState::from_config(&config, &outputs).unwrap();
        assert_eq!(state.screens.len(), 2);
        assert_eq!(state.tags.len(), 2 * config.general.tags.len());

        let second = state.screen(ScreenId(1)).unwrap();
        let tag = state.current_tag(ScreenId(1)).unwrap();
        assert_eq!(tag.screen, second.id);
        assert_eq!(state.current_layout(ScreenId(1)), Some(LayoutKind::Tile));
    }

    #[test]
    fn test_apply_geometry_floors_size_and_tracks_floating_snapshot() {
        let mut state = WmState::from_config(
            &Config::default(),
            &[Output {
                geometry: Geometry::new(0, 0, 800, 600),
                root: NativeHandle(0x100),
            }],
        )
        .unwrap();
        let tag = state.screen(ScreenId(0)).unwrap().tag;
        let mut client = Client::new(
            ClientId(1),
            NativeHandle(0x400),
            ScreenId(0),
            tag,
            Geometry::new(10, 10, 100, 100).with_border(1),
        );
        client.set_floating(true);
        let id = state.add_client(client);

        let applied = state
            .apply_geometry(id, Geometry::new(50, 60, 0, 0))
            .unwrap();
        assert_eq!(applied, Geometry::new(50, 60, 1, 1).with_border(1));
        assert_eq!(state.client(id).unwrap().floating_geometry, applied);
    }
}
