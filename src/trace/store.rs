use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::TraceError;

pub const ACTION_LOG_FILE: &str = "actions.jsonl";
pub const TRACE_FILE: &str = "trace.json";

/// On-disk layout of one recorded task:
/// `<root>/<app>/testcase<task>/{n.png, n.xml, n.json, actions.jsonl, trace.json}`.
///
/// Every write replaces the whole file and is logged once it succeeded.
#[derive(Debug, Clone)]
pub struct TaskStore {
    dir: PathBuf,
}

impl TaskStore {
    pub fn create(output_root: &Path, app: &str, task: u32) -> Result<Self, TraceError> {
        let dir = output_root.join(app).join(format!("testcase{}", task));
        fs::create_dir_all(&dir).map_err(|e| TraceError::io(&dir, e))?;
        info!("Saving data to {}", dir.display());
        Ok(TaskStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn screenshot_path(&self, ui_no: usize) -> PathBuf {
        self.dir.join(format!("{}.png", ui_no))
    }

    pub fn xml_path(&self, ui_no: usize) -> PathBuf {
        self.dir.join(format!("{}.xml", ui_no))
    }

    pub fn json_path(&self, ui_no: usize) -> PathBuf {
        self.dir.join(format!("{}.json", ui_no))
    }

    pub fn action_log_path(&self) -> PathBuf {
        self.dir.join(ACTION_LOG_FILE)
    }

    pub fn trace_path(&self) -> PathBuf {
        self.dir.join(TRACE_FILE)
    }

    pub fn write_screenshot(&self, ui_no: usize, bytes: &[u8]) -> Result<PathBuf, TraceError> {
        let path = self.screenshot_path(ui_no);
        write_bytes(&path, bytes)?;
        info!("Saved screenshot to {}", path.display());
        Ok(path)
    }

    pub fn write_xml(&self, ui_no: usize, xml: &str) -> Result<PathBuf, TraceError> {
        let path = self.xml_path(ui_no);
        write_bytes(&path, xml.as_bytes())?;
        info!("Saved xml to {}", path.display());
        Ok(path)
    }

    pub fn write_json(&self, ui_no: usize, hierarchy: &Value) -> Result<PathBuf, TraceError> {
        let path = self.json_path(ui_no);
        write_json_file(&path, hierarchy)?;
        info!("Saved view hierarchy to {}", path.display());
        Ok(path)
    }

    pub fn write_trace<T: Serialize>(&self, trace: &T) -> Result<PathBuf, TraceError> {
        let path = self.trace_path();
        write_json_file(&path, trace)?;
        info!("Saved trace summary to {}", path.display());
        Ok(path)
    }
}

/// Pretty-print `value` as JSON into `path`, replacing the file.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), TraceError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| TraceError::json(path.display(), e))?;
    write_bytes(path, json.as_bytes())
}

/// Read and parse a JSON file.
pub fn read_json_file(path: &Path) -> Result<Value, TraceError> {
    let content = fs::read_to_string(path).map_err(|e| TraceError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| TraceError::json(path.display(), e))
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), TraceError> {
    fs::write(path, bytes).map_err(|e| TraceError::io(path, e))
}

/// sha1 of a hierarchy document's compact JSON form.
pub fn hierarchy_fingerprint(hierarchy: &Value) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(hierarchy.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}
