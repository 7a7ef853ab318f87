//! End-to-end tests running the `tilegrab` binary on recorded scenes.

use std::io::Write;
use std::process::Command;

use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::NamedTempFile;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn run_replay(config: &str, scene: &str) -> Value {
    let config = write_temp(config);
    let scene = write_temp(scene);
    let output = Command::new(env!("CARGO_BIN_EXE_tilegrab"))
        .arg("--config")
        .arg(config.path())
        .arg("--replay")
        .arg(scene.path())
        .env("RUST_LOG", "warn")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "tilegrab failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

const STATUSBAR_CONFIG: &str = r#"
[general]
snap = 10

[[screens]]
statusbar = { position = "top", thickness = 20 }
"#;

#[test]
fn move_snaps_below_status_bar() {
    let report = run_replay(
        STATUSBAR_CONFIG,
        r#"{
            "outputs": [{"geometry": {"x": 0, "y": 0, "width": 1000, "height": 800}}],
            "clients": [
                {"id": 1, "window": 4194305, "floating": true,
                 "geometry": {"x": 300, "y": 300, "width": 200, "height": 100, "border": 2}}
            ],
            "focused": 1,
            "operation": "move",
            "pointer": {"x": 400, "y": 350},
            "batches": [
                [{"motion": {"x": 105, "y": 74}}],
                [{"map_request": {"parent": 256, "window": 5242881}}],
                [{"button_release": {"button": 1}}]
            ]
        }"#,
    );

    assert_eq!(report["outcome"]["completed"]["motions"], 1);
    assert_eq!(report["outcome"]["completed"]["forwarded"], 1);
    // x: 300 - 295 = 5 snaps to 0; y: 300 - 276 = 24 snaps to the bar edge at 20.
    let geometry = &report["clients"][0]["geometry"];
    assert_eq!(geometry["x"], 0);
    assert_eq!(geometry["y"], 20);
    assert_eq!(report["screens"][0]["usable_area"]["y"], 20);
    assert_eq!(report["calls"][0]["call"], "grab");
    assert_eq!(report["calls"][0]["cursor"], "move");
    assert_eq!(report["forwarded"][0]["map_request"]["window"], 5_242_881);
}

#[test]
fn refused_grab_reports_failure() {
    let report = run_replay(
        "",
        r#"{
            "clients": [
                {"id": 1, "window": 17, "geometry": {"x": 0, "y": 0, "width": 960, "height": 1080}}
            ],
            "focused": 1,
            "operation": "move",
            "refuse_grab": true,
            "batches": [[{"button_release": {"button": 1}}]]
        }"#,
    );

    assert_eq!(report["outcome"], "grab_failed");
    assert_eq!(report["clients"][0]["floating"], false);
    assert_eq!(report["screens"][0]["need_arrange"], false);
}

#[test]
fn print_default_config_is_valid_toml() {
    let output = Command::new(env!("CARGO_BIN_EXE_tilegrab"))
        .arg("--print-default-config")
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("[general]"));
    assert!(text.contains("Mod4+button1"));
}
