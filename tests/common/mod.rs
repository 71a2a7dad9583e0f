#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};
use screen_trace::TraceError;
use screen_trace::device::device::DeviceControl;

pub const DEVICE_WIDTH: u32 = 90;
pub const DEVICE_HEIGHT: u32 = 160;

/// Encoded PNG of a solid-color screen.
pub fn png_bytes(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([shade, shade, shade]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// uiautomator-style dump whose button text is `label`.
pub fn dump_xml(label: &str) -> String {
    format!(
        r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
  <node index="0" text="" class="android.widget.FrameLayout" package="com.example" clickable="false" bounds="[0,0][90,160]">
    <node index="0" text="{label}" class="android.widget.Button" package="com.example" clickable="true" bounds="[10,20][80,50]" />
    <node index="1" text="" class="android.widget.LinearLayout" package="com.example" clickable="false" bounds="[0,60][90,160]">
      <node index="0" text="Icon" class="android.widget.ImageView" package="com.example" clickable="true" bounds="[5,70][25,90]" />
    </node>
  </node>
</hierarchy>"#
    )
}

/// In-memory device. Serves queued screenshots (falling back to a valid
/// PNG), a dump that changes with every capture, and records replays.
pub struct MockDevice {
    pub screenshots: VecDeque<Vec<u8>>,
    pub taps: Vec<(i32, i32)>,
    pub swipes: Vec<(i32, i32, i32, i32, u64)>,
    pub screenshot_calls: usize,
    pub hierarchy_calls: usize,
    pub static_hierarchy: bool,
    pub fail_taps: bool,
}

impl MockDevice {
    pub fn new() -> Self {
        MockDevice {
            screenshots: VecDeque::new(),
            taps: vec![],
            swipes: vec![],
            screenshot_calls: 0,
            hierarchy_calls: 0,
            static_hierarchy: false,
            fail_taps: false,
        }
    }

    pub fn with_screenshots(screenshots: Vec<Vec<u8>>) -> Self {
        let mut device = Self::new();
        device.screenshots = screenshots.into();
        device
    }
}

impl DeviceControl for MockDevice {
    fn serial(&self) -> &str {
        "emulator-5554"
    }

    fn capture_screenshot(&mut self) -> Result<Vec<u8>, TraceError> {
        self.screenshot_calls += 1;
        Ok(self
            .screenshots
            .pop_front()
            .unwrap_or_else(|| png_bytes(DEVICE_WIDTH, DEVICE_HEIGHT, 200)))
    }

    fn capture_hierarchy(&mut self) -> Result<String, TraceError> {
        self.hierarchy_calls += 1;
        if self.static_hierarchy {
            return Ok(dump_xml("OK"));
        }
        Ok(dump_xml(&format!("Screen {}", self.hierarchy_calls)))
    }

    fn tap(&mut self, x: i32, y: i32) -> Result<(), TraceError> {
        if self.fail_taps {
            return Err(TraceError::DeviceIo {
                command: "input tap".into(),
                message: "device offline".into(),
            });
        }
        self.taps.push((x, y));
        Ok(())
    }

    fn swipe(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u64) -> Result<(), TraceError> {
        self.swipes.push((x1, y1, x2, y2, duration_ms));
        Ok(())
    }

    fn screen_size(&mut self) -> Result<(u32, u32), TraceError> {
        Ok((DEVICE_WIDTH, DEVICE_HEIGHT))
    }
}
