use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::cli::config::{AppConfig, build_capture_options, build_recorder_config};
use crate::device::adb::AdbDevice;
use crate::device::device::{DeviceControl, DeviceInfo};
use crate::element::extractor::ElementExtractor;
use crate::error::TraceError;
use crate::hierarchy::convert::{HierarchyFormat, canonical_root, convert_dump, to_canonical_document};
use crate::recorder::capture::capture_screen;
use crate::recorder::recorder::Recorder;
use crate::recorder::surface::{ScriptedSurface, Surface};
use crate::recorder::terminal::TerminalSurface;
use crate::trace::store::{TaskStore, read_json_file, write_json_file};
use crate::trace::trace_model::Trace;

// ============================================================================
// record subcommand
// ============================================================================

/// Run an interactive (or scripted) recording session.
pub fn cmd_record(
    config: &AppConfig,
    serial: Option<&str>,
    app: &str,
    task: u32,
    output_root: Option<&str>,
    scale: Option<i32>,
    script: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut device = connect(config, serial)?;
    let output_root = output_root.unwrap_or(config.record.output_root.as_str());
    let scale = scale.unwrap_or(config.record.scale);
    let store = TaskStore::create(Path::new(output_root), app, task)?;

    let mut surface: Box<dyn Surface> = match script {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| TraceError::io(path, e))?;
            Box::new(ScriptedSurface::from_script(&content, scale)?)
        }
        None => {
            let size = device.screen_size()?;
            Box::new(TerminalSurface::open(size, scale)?)
        }
    };

    let mut recorder = Recorder::new(
        &mut device,
        surface.as_mut(),
        store,
        Trace::new(app, task),
        build_recorder_config(&config.record),
    );
    let result = recorder.run();
    let trace = recorder.into_trace();
    // Restore the terminal before printing the summary.
    drop(surface);

    println!(
        "Recorded {} screens and {} actions",
        trace.screens.len(),
        trace.actions.len()
    );
    result?;
    Ok(())
}

// ============================================================================
// capture subcommand
// ============================================================================

/// Capture a single screen and store its canonical hierarchy.
pub fn cmd_capture(
    config: &AppConfig,
    serial: Option<&str>,
    app: &str,
    task: u32,
    ui_no: usize,
    output_root: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut device = connect(config, serial)?;
    let output_root = output_root.unwrap_or(config.record.output_root.as_str());
    let store = TaskStore::create(Path::new(output_root), app, task)?;

    let mut options = build_capture_options(&config.record);
    options.canonicalize = true;
    let screen = capture_screen(&mut device, &store, ui_no, &options)?;

    println!(
        "Captured screen {} ({}x{}) into {}",
        ui_no,
        screen.image.width(),
        screen.image.height(),
        store.dir().display()
    );
    Ok(())
}

// ============================================================================
// convert subcommand
// ============================================================================

pub fn cmd_convert(input: &str, output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(input);
    let canonical = if path.extension().map_or(false, |e| e == "xml") {
        let xml = std::fs::read_to_string(path).map_err(|e| TraceError::io(path, e))?;
        convert_dump(&xml)?
    } else {
        to_canonical_document(read_json_file(path)?)?
    };

    emit_json(&canonical, output)?;
    Ok(())
}

// ============================================================================
// extract subcommand
// ============================================================================

/// Extract elements and print them as a JSON array.
pub fn cmd_extract(input: &str, format: &str, output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let format: HierarchyFormat = format.parse()?;
    let document = read_json_file(Path::new(input))?;
    let root = canonical_root(document, format)?;

    let tree = ElementExtractor::new().extract(root);
    for issue in tree.issues() {
        warn!("{}: {}", input, issue);
    }
    let tree = tree.into_strict()?;

    info!(
        nodes = tree.len(),
        elements = tree.element_ids().len(),
        "Extracted elements from {}",
        input
    );

    let records = serde_json::to_value(tree.element_records())
        .map_err(|e| TraceError::json("element list", e))?;
    emit_json(&records, output)?;
    Ok(())
}

// ============================================================================
// info subcommand
// ============================================================================

pub fn cmd_info(config: &AppConfig, serial: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mut device = connect(config, serial)?;
    let info = DeviceInfo::query(&mut device)?;
    println!("Device Name:{} Resolution:{}x{}", info.serial, info.width, info.height);
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Connect to the device named on the command line, else the configured one.
fn connect(config: &AppConfig, serial: Option<&str>) -> Result<AdbDevice, TraceError> {
    let serial = serial.or(config.device.serial.as_deref());
    AdbDevice::connect(&config.device.adb_path, serial, &config.device.dump_path)
}

/// Write JSON to `output`, or pretty-print it to stdout.
fn emit_json(value: &Value, output: Option<&str>) -> Result<(), TraceError> {
    match output {
        Some(path) => {
            write_json_file(Path::new(path), value)?;
            info!("Saved {}", path);
        }
        None => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| TraceError::json("stdout", e))?;
            println!("{}", json);
        }
    }
    Ok(())
}
