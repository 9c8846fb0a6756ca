use serde::{Deserialize, Serialize};

/// Correlation token assigned when a capture is requested.
pub type CaptureId = u64;

/// Accumulated active time, in whole seconds.
pub type ActiveSeconds = u64;

/// One delivered screenshot plus the activity observed since the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotRecord {
    pub capture_id: CaptureId,
    /// Local wall-clock time, already formatted for display.
    pub time: String,
    /// `data:image/png;base64,...`
    pub image_data: String,
    pub active_window_title: String,
    pub mouse_click_count: u64,
    pub keypress_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(image_data: &str) -> ScreenshotRecord {
        ScreenshotRecord {
            capture_id: 7,
            time: "2026-10-19 09:15:00".into(),
            image_data: image_data.into(),
            active_window_title: "Editor".into(),
            mouse_click_count: 3,
            keypress_count: 12,
        }
    }

    #[test]
    fn serializes_in_camel_case() {
        let json = serde_json::to_value(record("data:image/png;base64,AAAA")).unwrap();
        assert_eq!(json["captureId"], 7);
        assert_eq!(json["activeWindowTitle"], "Editor");
        assert_eq!(json["mouseClickCount"], 3);
        assert_eq!(json["keypressCount"], 12);
        assert_eq!(json["imageData"], "data:image/png;base64,AAAA");
    }
}
