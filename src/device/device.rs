use serde::Serialize;

use crate::error::TraceError;

/// Identity and resolution of a connected device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub serial: String,
    pub width: u32,
    pub height: u32,
}

impl DeviceInfo {
    pub fn query(device: &mut dyn DeviceControl) -> Result<Self, TraceError> {
        let (width, height) = device.screen_size()?;
        Ok(DeviceInfo {
            serial: device.serial().to_string(),
            width,
            height,
        })
    }
}

/// Device-control collaborator used by capture and replay.
///
/// All coordinates are device-native pixels. Calls are synchronous and
/// block until the device has answered.
pub trait DeviceControl {
    /// Identifier shown in logs (adb serial for real devices).
    fn serial(&self) -> &str;

    /// Encoded screenshot bytes (PNG for adb). May be corrupt; callers decode
    /// and retry.
    fn capture_screenshot(&mut self) -> Result<Vec<u8>, TraceError>;

    /// View hierarchy dump in the device-native format (uiautomator XML).
    fn capture_hierarchy(&mut self) -> Result<String, TraceError>;

    fn tap(&mut self, x: i32, y: i32) -> Result<(), TraceError>;

    fn swipe(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u64) -> Result<(), TraceError>;

    /// `(width, height)` in device pixels.
    fn screen_size(&mut self) -> Result<(u32, u32), TraceError>;
}
