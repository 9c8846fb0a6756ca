pub mod clock;
pub mod render;
pub mod state;
pub mod view;

pub use clock::format_clock;
pub use render::{render_text, DashboardFrame, ScreenshotCell};
pub use state::{DashboardState, RetentionPolicy};
pub use view::{DashboardConfig, DashboardView};
