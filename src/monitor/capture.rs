use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use chrono::Local;
use image::{
    codecs::png::PngEncoder, imageops::FilterType, ExtendedColorType, ImageEncoder, Rgba,
    RgbaImage,
};

use crate::models::{CaptureId, ScreenshotRecord};

use super::activity::ActivityCounters;

pub const UNKNOWN_WINDOW: &str = "Unknown window";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Something that can grab the screen.
pub trait ScreenSource: Send + Sync {
    fn capture(&self) -> Result<RgbaImage>;
}

/// Something that can name the window the user is looking at.
pub trait WindowProbe: Send + Sync {
    fn active_window_title(&self) -> Result<Option<String>>;
}

/// Everything a capture reads from.
#[derive(Clone)]
pub struct CaptureSources {
    pub screen: Arc<dyn ScreenSource>,
    pub windows: Arc<dyn WindowProbe>,
    pub activity: Arc<ActivityCounters>,
}

/// Solid frame of a fixed size, for machines without a capturable display.
pub struct BlankScreen {
    width: u32,
    height: u32,
}

impl BlankScreen {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ScreenSource for BlankScreen {
    fn capture(&self) -> Result<RgbaImage> {
        Ok(RgbaImage::from_pixel(
            self.width,
            self.height,
            Rgba([24, 24, 27, 255]),
        ))
    }
}

pub struct NoWindowProbe;

impl WindowProbe for NoWindowProbe {
    fn active_window_title(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Runs one full capture. Blocking; call from `spawn_blocking`.
///
/// Click and key counts are left at zero and the counters untouched; the
/// caller fills them in with [`attach_counts`] once the record is delivered.
pub(crate) fn capture_record(
    sources: &CaptureSources,
    capture_id: CaptureId,
    thumbnail_width: u32,
) -> Result<ScreenshotRecord> {
    let time = Local::now().format(TIME_FORMAT).to_string();

    let frame = sources.screen.capture().context("screen capture failed")?;
    let image_data = encode_data_url(&frame, thumbnail_width)?;

    let active_window_title = sources
        .windows
        .active_window_title()
        .context("active window lookup failed")?
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_WINDOW.to_string());

    Ok(ScreenshotRecord {
        capture_id,
        time,
        image_data,
        active_window_title,
        mouse_click_count: 0,
        keypress_count: 0,
    })
}

/// Moves the input seen since the previous delivered record into `record`.
pub(crate) fn attach_counts(record: &mut ScreenshotRecord, activity: &ActivityCounters) {
    let (mouse_clicks, key_presses) = activity.take_counts();
    record.mouse_click_count = mouse_clicks;
    record.keypress_count = key_presses;
}

/// PNG data URL of `frame`, scaled down to at most `max_width` pixels wide.
pub fn encode_data_url(frame: &RgbaImage, max_width: u32) -> Result<String> {
    let scaled;
    let image = if frame.width() > max_width {
        let height = scaled_height(frame.width(), frame.height(), max_width);
        scaled = image::imageops::resize(frame, max_width, height, FilterType::Triangle);
        &scaled
    } else {
        frame
    };

    let mut png = Cursor::new(Vec::new());
    PngEncoder::new(&mut png)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .context("failed to encode PNG")?;

    Ok(format!(
        "data:image/png;base64,{}",
        BASE64_STANDARD.encode(png.into_inner())
    ))
}

fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(target_width) / u64::from(width.max(1));
    u32::try_from(scaled).unwrap_or(height).max(1)
}
