//! The boundary between the dashboard and whatever performs the monitoring.
//!
//! Requests travel outward as fire-and-forget calls. Results travel inward
//! on two delivery channels, each a set of persistent callbacks. Nothing on
//! this trait returns a result: a request that goes nowhere simply never
//! produces a delivery.

mod listeners;
mod local;
#[cfg(test)]
pub(crate) mod testing;

pub use listeners::{Listener, ListenerId, ListenerRegistry};
pub use local::{BridgeRequest, DeliveryChannels, LocalBridge};

use crate::models::{ActiveSeconds, ScreenshotRecord};

pub type ScreenshotListener = Listener<ScreenshotRecord>;
pub type ActiveTimeListener = Listener<ActiveSeconds>;

pub trait MonitoringBridge: Send + Sync {
    /// Ask for one screenshot. Delivery, if any, arrives on the screenshot channel.
    fn request_capture(&self);

    fn on_screenshot(&self, listener: ScreenshotListener) -> ListenerId;

    fn on_active_time(&self, listener: ActiveTimeListener) -> ListenerId;

    fn remove_screenshot_listener(&self, id: ListenerId);

    fn remove_active_time_listener(&self, id: ListenerId);

    fn start_monitoring(&self);

    fn stop_monitoring(&self);
}
