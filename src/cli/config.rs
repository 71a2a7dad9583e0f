use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::device::adb::DEFAULT_DUMP_PATH;
use crate::recorder::capture::{CAPTURE_RETRIES, CaptureOptions};
use crate::recorder::gesture::SWIPE_THRESHOLD;
use crate::recorder::recorder::{RecorderConfig, SETTLE_MS, SWIPE_DURATION_MS};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "screen-trace",
    version,
    about = "Capture GUI screens, view hierarchies and interaction traces from Android devices"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: screen-trace.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// adb serial of the device to use
    #[arg(long, global = true)]
    pub serial: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record an interaction trace for one task
    Record {
        /// App name (output subdirectory)
        #[arg(long)]
        app: String,

        /// Task / test case number
        #[arg(long)]
        task: u32,

        /// Output root directory
        #[arg(long)]
        output_root: Option<String>,

        /// Integer factor between device and surface pixels
        #[arg(long)]
        scale: Option<i32>,

        /// Read gestures from a script file instead of the terminal
        #[arg(long)]
        script: Option<String>,
    },

    /// Capture one screen (screenshot + hierarchy) and convert it
    Capture {
        #[arg(long)]
        app: String,

        #[arg(long)]
        task: u32,

        /// Screen number to save as
        #[arg(long, default_value_t = 0)]
        ui_no: usize,

        #[arg(long)]
        output_root: Option<String>,
    },

    /// Convert a raw hierarchy dump (.xml or raw .json) to canonical JSON
    Convert {
        #[arg(long)]
        input: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Extract the valid element list from a hierarchy JSON file
    Extract {
        #[arg(long)]
        input: String,

        /// Input format: raw or canonical
        #[arg(long, default_value = "canonical")]
        format: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print device serial and screen size
    Info,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `screen-trace.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub record: RecordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub serial: Option<String>,

    #[serde(default = "default_adb")]
    pub adb_path: String,

    #[serde(default = "default_dump_path")]
    pub dump_path: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial: None,
            adb_path: default_adb(),
            dump_path: default_dump_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    #[serde(default = "default_output_root")]
    pub output_root: String,

    #[serde(default = "default_scale")]
    pub scale: i32,

    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: i32,

    #[serde(default = "default_swipe_duration")]
    pub swipe_duration_ms: u64,

    #[serde(default = "default_settle")]
    pub settle_ms: u64,

    #[serde(default = "default_retries")]
    pub capture_retries: u32,

    #[serde(default = "default_true")]
    pub canonicalize: bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            scale: default_scale(),
            swipe_threshold: default_swipe_threshold(),
            swipe_duration_ms: default_swipe_duration(),
            settle_ms: default_settle(),
            capture_retries: default_retries(),
            canonicalize: true,
        }
    }
}

// Serde default helpers
fn default_adb() -> String { "adb".to_string() }
fn default_dump_path() -> String { DEFAULT_DUMP_PATH.to_string() }
fn default_output_root() -> String { "datacollect".to_string() }
fn default_scale() -> i32 { 3 }
fn default_swipe_threshold() -> i32 { SWIPE_THRESHOLD }
fn default_swipe_duration() -> u64 { SWIPE_DURATION_MS }
fn default_settle() -> u64 { SETTLE_MS }
fn default_retries() -> u32 { CAPTURE_RETRIES }
fn default_true() -> bool { true }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("screen-trace.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Build the recorder configuration from the resolved record section.
pub fn build_recorder_config(record: &RecordConfig) -> RecorderConfig {
    RecorderConfig {
        swipe_threshold: record.swipe_threshold,
        swipe_duration_ms: record.swipe_duration_ms,
        settle: Duration::from_millis(record.settle_ms),
        capture: build_capture_options(record),
    }
}

pub fn build_capture_options(record: &RecordConfig) -> CaptureOptions {
    CaptureOptions {
        retries: record.capture_retries,
        canonicalize: record.canonicalize,
    }
}
