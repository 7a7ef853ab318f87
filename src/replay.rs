//! Headless replay of recorded drag sessions.
//!
//! A scene file describes the desktop (outputs, clients, focus, tag layout)
//! and the batches of events the display delivers. The scene is replayed
//! once against the scripted display and the resulting state is reported.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use tilegrab_core::config::{Config, ConfigError};
use tilegrab_core::headless::{DisplayCall, RecordingHandlers, ScriptedDisplay};
use tilegrab_core::input::{InputError, MouseBinding};
use tilegrab_core::state::{Output, Point, ScreenId};
use tilegrab_core::window::{Client, ClientFlags, ClientId, NativeHandle, SizeHints};
use tilegrab_core::{
    DragController, DragEvent, DragOperation, DragOutcome, Geometry, LayoutKind, WmState,
};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read scene {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scene: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("scene references unknown screen {0}")]
    UnknownScreen(u32),

    #[error("focused client {0} is not part of the scene")]
    UnknownFocus(u64),

    #[error("scene names neither an operation nor a binding")]
    NoOperation,

    #[error(transparent)]
    Binding(#[from] InputError),

    #[error("binding {0:?} is not configured")]
    Unbound(String),
}

fn default_root() -> NativeHandle {
    NativeHandle(0x100)
}

fn default_outputs() -> Vec<SceneOutput> {
    vec![SceneOutput {
        geometry: Geometry::new(0, 0, 1920, 1080),
        root: default_root(),
    }]
}

#[derive(Debug, Deserialize)]
pub struct SceneOutput {
    pub geometry: Geometry,
    #[serde(default = "default_root")]
    pub root: NativeHandle,
}

#[derive(Debug, Deserialize)]
pub struct SceneClient {
    pub id: u64,
    pub window: NativeHandle,
    #[serde(default)]
    pub screen: u32,
    pub geometry: Geometry,
    #[serde(default)]
    pub floating: bool,
    #[serde(default)]
    pub maximized: bool,
    /// Advertise min == max size hints.
    #[serde(default)]
    pub fixed_size: bool,
}

/// A recorded drag.
#[derive(Debug, Deserialize)]
pub struct Scene {
    #[serde(default = "default_outputs")]
    pub outputs: Vec<SceneOutput>,
    #[serde(default)]
    pub clients: Vec<SceneClient>,
    pub focused: Option<u64>,
    /// Screen the drag is started on.
    #[serde(default)]
    pub screen: u32,
    pub layout: Option<LayoutKind>,
    pub split_fraction: Option<f64>,
    pub master_count: Option<u32>,
    pub operation: Option<DragOperation>,
    /// Button binding resolved through the configured mouse bindings,
    /// e.g. "Mod4+button3".
    pub binding: Option<String>,
    #[serde(default)]
    pub pointer: Point,
    #[serde(default)]
    pub refuse_grab: bool,
    #[serde(default)]
    pub batches: Vec<Vec<DragEvent>>,
}

#[derive(Debug, Serialize)]
pub struct ClientReport {
    pub id: u64,
    pub window: NativeHandle,
    pub geometry: Geometry,
    pub floating_geometry: Geometry,
    pub floating: bool,
    pub maximized: bool,
}

#[derive(Debug, Serialize)]
pub struct ScreenReport {
    pub id: u32,
    pub usable_area: Geometry,
    pub need_arrange: bool,
    pub layout: Option<LayoutKind>,
    pub split_fraction: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub operation: DragOperation,
    pub outcome: DragOutcome,
    pub clients: Vec<ClientReport>,
    pub screens: Vec<ScreenReport>,
    pub calls: Vec<DisplayCall>,
    pub forwarded: Vec<DragEvent>,
    pub deferred: usize,
}

/// Read a scene file and replay it.
pub fn run(config: &Config, path: &Path) -> Result<ReplayReport, ReplayError> {
    let content = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let scene: Scene = serde_json::from_str(&content)?;
    info!("Replaying {:?}", path);
    replay(config, scene)
}

pub fn replay(config: &Config, scene: Scene) -> Result<ReplayReport, ReplayError> {
    let operation = resolve_operation(config, &scene)?;
    let mut state = build_state(config, &scene)?;
    let screen = ScreenId(scene.screen);

    let mut display = ScriptedDisplay::new(scene.pointer);
    if scene.refuse_grab {
        display = display.refuse_grab();
    }
    for batch in scene.batches {
        display.push_batch(batch);
    }
    let mut handlers = RecordingHandlers::default();

    let outcome =
        DragController::new(&mut state, &mut display, &mut handlers).begin(screen, operation);
    debug!(?outcome, "Replay finished");

    Ok(ReplayReport {
        operation,
        outcome,
        clients: state
            .clients()
            .map(|c| ClientReport {
                id: c.id.0,
                window: c.handle,
                geometry: c.geometry,
                floating_geometry: c.floating_geometry,
                floating: c.is_floating(),
                maximized: c.is_maximized(),
            })
            .collect(),
        screens: state
            .screens
            .values()
            .map(|s| {
                let tag = state.current_tag(s.id);
                ScreenReport {
                    id: s.id.0,
                    usable_area: s.usable_area(),
                    need_arrange: s.need_arrange,
                    layout: tag.map(|t| t.layout),
                    split_fraction: tag.map(|t| t.split_fraction),
                }
            })
            .collect(),
        calls: display.calls().to_vec(),
        forwarded: handlers.forwarded,
        deferred: display.deferred().len(),
    })
}

fn resolve_operation(config: &Config, scene: &Scene) -> Result<DragOperation, ReplayError> {
    if let Some(operation) = scene.operation {
        return Ok(operation);
    }
    let button = scene.binding.as_deref().ok_or(ReplayError::NoOperation)?;
    let binding = MouseBinding::parse(button)?;
    config
        .mouse_bindings()?
        .lookup(binding.modifiers, binding.button)
        .ok_or_else(|| ReplayError::Unbound(button.to_string()))
}

fn build_state(config: &Config, scene: &Scene) -> Result<WmState, ReplayError> {
    let outputs: Vec<Output> = scene
        .outputs
        .iter()
        .map(|o| Output {
            geometry: o.geometry,
            root: o.root,
        })
        .collect();
    let mut state = WmState::from_config(config, &outputs)?;

    for id in state.screens.keys().copied().collect::<Vec<_>>() {
        if let Some(tag) = state.current_tag_mut(id) {
            if let Some(layout) = scene.layout {
                tag.layout = layout;
            }
            if let Some(fraction) = scene.split_fraction {
                tag.set_split_fraction(fraction);
            }
            if let Some(count) = scene.master_count {
                tag.master_count = count;
            }
        }
    }

    for entry in &scene.clients {
        let screen = ScreenId(entry.screen);
        let tag = state
            .screen(screen)
            .map(|s| s.tag)
            .ok_or(ReplayError::UnknownScreen(entry.screen))?;
        let mut client = Client::new(ClientId(entry.id), entry.window, screen, tag, entry.geometry);
        client.set_floating(entry.floating);
        client.flags.set(ClientFlags::MAXIMIZED, entry.maximized);
        if entry.fixed_size {
            let (w, h) = (entry.geometry.width, entry.geometry.height);
            client.set_size_hints(SizeHints {
                min_width: Some(w),
                min_height: Some(h),
                max_width: Some(w),
                max_height: Some(h),
            });
        }
        state.add_client(client);
    }

    if state.screen(ScreenId(scene.screen)).is_none() {
        return Err(ReplayError::UnknownScreen(scene.screen));
    }
    if let Some(focused) = scene.focused {
        let id = ClientId(focused);
        if state.client(id).is_none() {
            return Err(ReplayError::UnknownFocus(focused));
        }
        state.focus_client(id);
    }

    // The scene describes an arranged desktop.
    for screen in state.screens.values_mut() {
        screen.need_arrange = false;
    }
    Ok(state)
}
