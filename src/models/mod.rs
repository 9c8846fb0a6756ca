mod screenshot;

pub use screenshot::{ActiveSeconds, CaptureId, ScreenshotRecord};
