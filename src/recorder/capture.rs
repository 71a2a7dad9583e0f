use image::DynamicImage;
use tracing::{error, info, warn};

use crate::device::device::DeviceControl;
use crate::error::TraceError;
use crate::hierarchy::convert::to_canonical_document;
use crate::hierarchy::raw::parse_dump_xml;
use crate::trace::store::{TaskStore, hierarchy_fingerprint};
use crate::trace::trace_model::ScreenRecord;

/// Retries after the first unreadable screenshot.
pub const CAPTURE_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    pub retries: u32,
    /// Rewrite `n.json` with the canonical document after saving the raw one
    pub canonicalize: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            retries: CAPTURE_RETRIES,
            canonicalize: true,
        }
    }
}

/// Result of capturing screen `ui_no`.
#[derive(Debug)]
pub struct CapturedScreen {
    pub record: ScreenRecord,
    pub image: DynamicImage,
}

/// Capture screenshot and hierarchy of the current device screen into the
/// store as screen `ui_no`.
///
/// The screenshot is re-captured while it fails to decode, up to
/// `options.retries` extra attempts. A hierarchy that fails conversion keeps
/// its raw JSON form; only device and file errors abort the capture.
pub fn capture_screen(
    device: &mut dyn DeviceControl,
    store: &TaskStore,
    ui_no: usize,
    options: &CaptureOptions,
) -> Result<CapturedScreen, TraceError> {
    let image = capture_screenshot(device, store, ui_no, options.retries)?;

    let xml = device.capture_hierarchy()?;
    store.write_xml(ui_no, &xml)?;

    let raw = parse_dump_xml(&xml)?;
    store.write_json(ui_no, &raw)?;

    let hierarchy = if options.canonicalize {
        match to_canonical_document(raw.clone()) {
            Ok(canonical) => {
                store.write_json(ui_no, &canonical)?;
                info!(ui_no, "Saved reformatted view hierarchy");
                canonical
            }
            Err(e) => {
                error!(ui_no, "Keeping raw hierarchy, conversion failed: {}", e);
                raw
            }
        }
    } else {
        raw
    };

    let record = ScreenRecord {
        ui_no,
        screenshot: file_name(&store.screenshot_path(ui_no)),
        hierarchy_xml: file_name(&store.xml_path(ui_no)),
        hierarchy_json: file_name(&store.json_path(ui_no)),
        fingerprint: hierarchy_fingerprint(&hierarchy),
    };

    Ok(CapturedScreen { record, image })
}

fn capture_screenshot(
    device: &mut dyn DeviceControl,
    store: &TaskStore,
    ui_no: usize,
    retries: u32,
) -> Result<DynamicImage, TraceError> {
    let attempts = retries.saturating_add(1);

    for attempt in 1..=attempts {
        let bytes = device.capture_screenshot()?;
        let path = store.write_screenshot(ui_no, &bytes)?;

        match image::load_from_memory(&bytes) {
            Ok(image) => return Ok(image),
            Err(e) => {
                warn!(
                    ui_no,
                    attempt,
                    "Unreadable screenshot {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }

    Err(TraceError::CaptureRetryExhausted { ui_no, attempts })
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
