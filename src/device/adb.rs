use std::process::{Command, Output};

use tracing::{debug, info};

use crate::device::device::DeviceControl;
use crate::error::TraceError;

pub const DEFAULT_DUMP_PATH: &str = "/sdcard/window_dump.xml";

/// Android device driven through the `adb` command-line tool.
///
/// Every operation spawns one adb subprocess and waits for it; screenshots
/// and dumps are streamed back over `exec-out` instead of pulled as files.
#[derive(Debug)]
pub struct AdbDevice {
    adb_path: String,
    serial: String,
    dump_path: String,
}

impl AdbDevice {
    /// Bind to `serial`, or to the single attached device when `None`.
    pub fn connect(adb_path: &str, serial: Option<&str>, dump_path: &str) -> Result<Self, TraceError> {
        let serial = match serial {
            Some(s) => s.to_string(),
            None => {
                let output = run_adb(adb_path, None, &["get-serialno"])?;
                let serial = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if serial.is_empty() || serial == "unknown" {
                    return Err(TraceError::DeviceIo {
                        command: "adb get-serialno".into(),
                        message: "no device attached".into(),
                    });
                }
                serial
            }
        };

        info!(serial = %serial, "Connected to device");

        Ok(AdbDevice {
            adb_path: adb_path.to_string(),
            serial,
            dump_path: dump_path.to_string(),
        })
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>, TraceError> {
        let output = run_adb(&self.adb_path, Some(self.serial.as_str()), args)?;
        Ok(output.stdout)
    }

    fn shell(&self, args: &[&str]) -> Result<String, TraceError> {
        let mut full = vec!["shell"];
        full.extend_from_slice(args);
        let stdout = self.run(&full)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl DeviceControl for AdbDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn capture_screenshot(&mut self) -> Result<Vec<u8>, TraceError> {
        let bytes = self.run(&["exec-out", "screencap", "-p"])?;
        debug!(bytes = bytes.len(), "Captured screenshot");
        Ok(bytes)
    }

    fn capture_hierarchy(&mut self) -> Result<String, TraceError> {
        self.shell(&["uiautomator", "dump", self.dump_path.as_str()])?;
        let bytes = self.run(&["exec-out", "cat", self.dump_path.as_str()])?;
        let xml = String::from_utf8_lossy(&bytes).into_owned();
        if !xml.trim_start().starts_with('<') {
            return Err(TraceError::DeviceIo {
                command: format!("cat {}", self.dump_path),
                message: format!("unexpected dump content: {}", xml.trim()),
            });
        }
        Ok(xml)
    }

    fn tap(&mut self, x: i32, y: i32) -> Result<(), TraceError> {
        self.shell(&["input", "tap", x.to_string().as_str(), y.to_string().as_str()])?;
        Ok(())
    }

    fn swipe(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u64) -> Result<(), TraceError> {
        self.shell(&[
            "input",
            "swipe",
            x1.to_string().as_str(),
            y1.to_string().as_str(),
            x2.to_string().as_str(),
            y2.to_string().as_str(),
            duration_ms.to_string().as_str(),
        ])?;
        Ok(())
    }

    fn screen_size(&mut self) -> Result<(u32, u32), TraceError> {
        let output = self.shell(&["wm", "size"])?;
        parse_wm_size(&output).ok_or_else(|| TraceError::DeviceIo {
            command: "wm size".into(),
            message: format!("unrecognized output: {}", output.trim()),
        })
    }
}

fn run_adb(adb_path: &str, serial: Option<&str>, args: &[&str]) -> Result<Output, TraceError> {
    let mut command = Command::new(adb_path);
    if let Some(serial) = serial {
        command.arg("-s").arg(serial);
    }
    command.args(args);

    let shown = format!("{} {}", adb_path, args.join(" "));
    debug!(command = %shown, "Running device command");

    let output = command.output().map_err(|e| TraceError::DeviceSpawn {
        command: shown.clone(),
        source: e,
    })?;

    if !output.status.success() {
        return Err(TraceError::DeviceIo {
            command: shown,
            message: format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(output)
}

/// Parse `wm size` output. The physical size wins; an override is used only
/// when no physical line is present.
pub fn parse_wm_size(output: &str) -> Option<(u32, u32)> {
    let mut fallback = None;

    for line in output.lines() {
        let Some((label, size)) = line.split_once(':') else {
            continue;
        };
        let Some((w, h)) = size.trim().split_once('x') else {
            continue;
        };
        let (Ok(w), Ok(h)) = (w.trim().parse::<u32>(), h.trim().parse::<u32>()) else {
            continue;
        };

        if label.trim().eq_ignore_ascii_case("physical size") {
            return Some((w, h));
        }
        fallback.get_or_insert((w, h));
    }

    fallback
}
