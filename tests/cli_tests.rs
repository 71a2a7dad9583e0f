use std::time::Duration;

use clap::Parser;
use screen_trace::cli::commands::{cmd_convert, cmd_extract};
use screen_trace::cli::config::{AppConfig, Cli, Commands, build_recorder_config, load_config};
use screen_trace::trace::store::read_json_file;
use serde_json::json;

mod common;
use crate::common::dump_xml;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_record_minimal() {
    let cli = Cli::parse_from(["screen-trace", "record", "--app", "twitter", "--task", "1"]);
    match cli.command {
        Commands::Record {
            app,
            task,
            output_root,
            scale,
            script,
        } => {
            assert_eq!(app, "twitter");
            assert_eq!(task, 1);
            assert!(output_root.is_none());
            assert!(scale.is_none());
            assert!(script.is_none());
        }
        _ => panic!("Expected Record command"),
    }
}

#[test]
fn cli_parse_record_all_args() {
    let cli = Cli::parse_from([
        "screen-trace",
        "--serial",
        "emulator-5554",
        "record",
        "--app",
        "maps",
        "--task",
        "7",
        "--output-root",
        "out",
        "--scale",
        "4",
        "--script",
        "gestures.txt",
    ]);
    assert_eq!(cli.serial.as_deref(), Some("emulator-5554"));
    match cli.command {
        Commands::Record {
            app,
            task,
            output_root,
            scale,
            script,
        } => {
            assert_eq!(app, "maps");
            assert_eq!(task, 7);
            assert_eq!(output_root.as_deref(), Some("out"));
            assert_eq!(scale, Some(4));
            assert_eq!(script.as_deref(), Some("gestures.txt"));
        }
        _ => panic!("Expected Record command"),
    }
}

#[test]
fn cli_parse_capture_defaults_to_screen_zero() {
    let cli = Cli::parse_from(["screen-trace", "capture", "--app", "a", "--task", "2"]);
    match cli.command {
        Commands::Capture { ui_no, task, .. } => {
            assert_eq!(ui_no, 0);
            assert_eq!(task, 2);
        }
        _ => panic!("Expected Capture command"),
    }
}

#[test]
fn cli_parse_extract_defaults_to_canonical() {
    let cli = Cli::parse_from(["screen-trace", "extract", "--input", "0.json", "-o", "el.json"]);
    match cli.command {
        Commands::Extract { input, format, output } => {
            assert_eq!(input, "0.json");
            assert_eq!(format, "canonical");
            assert_eq!(output.as_deref(), Some("el.json"));
        }
        _ => panic!("Expected Extract command"),
    }
}

#[test]
fn cli_parse_global_verbose_after_subcommand() {
    let cli = Cli::parse_from(["screen-trace", "info", "-vv"]);
    assert_eq!(cli.verbose, 2);
    assert!(matches!(cli.command, Commands::Info));
}

#[test]
fn cli_rejects_non_numeric_task() {
    let result = Cli::try_parse_from(["screen-trace", "record", "--app", "a", "--task", "one"]);
    assert!(result.is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_load_missing_file() {
    let config = load_config(Some("nonexistent_file_that_does_not_exist.yaml"));
    assert_eq!(config.record.output_root, "datacollect");
    assert_eq!(config.record.scale, 3);
    assert_eq!(config.device.adb_path, "adb");
}

#[test]
fn config_default_values() {
    let config = AppConfig::default();
    assert!(config.device.serial.is_none());
    assert_eq!(config.device.dump_path, "/sdcard/window_dump.xml");
    assert_eq!(config.record.swipe_threshold, 10);
    assert_eq!(config.record.swipe_duration_ms, 500);
    assert_eq!(config.record.settle_ms, 500);
    assert_eq!(config.record.capture_retries, 3);
    assert!(config.record.canonicalize);
}

#[test]
fn config_partial_yaml() {
    let yaml = r#"
device:
  serial: "R58M123"
record:
  scale: 2
  settle_ms: 0
"#;
    let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.device.serial.as_deref(), Some("R58M123"));
    assert_eq!(config.device.adb_path, "adb");
    assert_eq!(config.record.scale, 2);
    assert_eq!(config.record.settle_ms, 0);
    assert_eq!(config.record.output_root, "datacollect");
}

#[test]
fn config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("screen-trace.yaml");
    std::fs::write(&path, "record:\n  output_root: traces\n  capture_retries: 1\n").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.record.output_root, "traces");
    assert_eq!(config.record.capture_retries, 1);
}

#[test]
fn config_malformed_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "record: [not, a, map").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.record.scale, 3);
}

#[test]
fn build_recorder_config_wiring() {
    let mut config = AppConfig::default();
    config.record.swipe_threshold = 25;
    config.record.settle_ms = 0;
    config.record.capture_retries = 5;
    config.record.canonicalize = false;

    let recorder = build_recorder_config(&config.record);
    assert_eq!(recorder.swipe_threshold, 25);
    assert_eq!(recorder.swipe_duration_ms, 500);
    assert_eq!(recorder.settle, Duration::ZERO);
    assert_eq!(recorder.capture.retries, 5);
    assert!(!recorder.capture.canonicalize);
}

// ============================================================================
// Offline Commands
// ============================================================================

#[test]
fn convert_command_writes_canonical_document() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("0.xml");
    let output = dir.path().join("0.json");
    std::fs::write(&input, dump_xml("Next")).unwrap();

    cmd_convert(input.to_str().unwrap(), output.to_str()).unwrap();

    let doc = read_json_file(&output).unwrap();
    assert_eq!(doc["activity"]["root"]["children"][0]["text"], json!("Next"));
    assert_eq!(doc["activity"]["root"]["bounds"], json!([0, 0, 90, 160]));
}

#[test]
fn extract_command_writes_element_list() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("semantic.json");
    let output = dir.path().join("elements.json");
    std::fs::write(
        &input,
        json!({
            "activity": {"root": {
                "class": "FrameLayout",
                "bounds": [0, 0, 100, 100],
                "children": [
                    {"class": "ImageButton", "bounds": [0, 0, 20, 20], "componentLabel": "Icon", "iconClass": "menu"}
                ]
            }}
        })
        .to_string(),
    )
    .unwrap();

    cmd_extract(input.to_str().unwrap(), "canonical", output.to_str()).unwrap();

    let elements = read_json_file(&output).unwrap();
    assert_eq!(
        elements,
        json!([{
            "id": 1,
            "class": "ImageButton",
            "bounds": [0, 0, 20, 20],
            "componentLabel": "Icon",
            "iconClass": "menu",
            "children-id": []
        }])
    );
}

#[test]
fn extract_command_fails_on_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.json");
    std::fs::write(&input, r#"{"class": "View"}"#).unwrap();

    assert!(cmd_extract(input.to_str().unwrap(), "canonical", None).is_err());
}

#[test]
fn extract_command_rejects_unknown_format() {
    assert!(cmd_extract("whatever.json", "yaml", None).is_err());
}
