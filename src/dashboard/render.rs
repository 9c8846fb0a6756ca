use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;

use super::{clock::format_clock, state::DashboardState};

const HEADLINE: &str = "It also monitors your active time!";
const INSTRUCTIONS: &str = "Click on \"Start Monitoring\" to track your active time on your PC!";
const START_LABEL: &str = "Start Monitoring";

/// One render of the dashboard, independent of any particular front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFrame {
    pub headline: String,
    pub instructions: String,
    pub start_label: String,
    pub active_time: String,
    pub active_seconds: u64,
    pub gallery_heading: String,
    pub cells: Vec<ScreenshotCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotCell {
    pub index: usize,
    pub time: String,
    pub image_data: String,
    pub alt: String,
    pub caption: String,
    pub mouse_clicks: u64,
    pub key_presses: u64,
}

pub(crate) fn build_frame(state: &DashboardState, capture_interval: Duration) -> DashboardFrame {
    let cells = state
        .records()
        .iter()
        .enumerate()
        .map(|(index, record)| ScreenshotCell {
            index,
            time: record.time.clone(),
            image_data: record.image_data.clone(),
            alt: format!("Screenshot {index}"),
            caption: record.active_window_title.clone(),
            mouse_clicks: record.mouse_click_count,
            key_presses: record.keypress_count,
        })
        .collect();

    DashboardFrame {
        headline: HEADLINE.into(),
        instructions: INSTRUCTIONS.into(),
        start_label: START_LABEL.into(),
        active_time: format_clock(state.active_seconds()),
        active_seconds: state.active_seconds(),
        gallery_heading: format!(
            "It takes screenshots of your desktop {}!",
            describe_cadence(capture_interval)
        ),
        cells,
    }
}

fn describe_cadence(interval: Duration) -> String {
    let millis = interval.as_millis();
    match millis {
        1_000 => "every second".into(),
        m if m % 1_000 == 0 => format!("every {} seconds", m / 1_000),
        m => format!("every {m} ms"),
    }
}

/// Plain-text rendering for the terminal. Image payloads are summarized.
pub fn render_text(frame: &DashboardFrame) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "== {} ==", frame.headline);
    let _ = writeln!(out, "{}", frame.instructions);
    let _ = writeln!(out, "[ {} ]  (type `start`)", frame.start_label);
    let _ = writeln!(out, "Active time: {}", frame.active_time);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", frame.gallery_heading);

    if frame.cells.is_empty() {
        let _ = writeln!(out, "  (no screenshots yet)");
    }

    for cell in &frame.cells {
        let image = match summarize_image(&cell.image_data) {
            Some((mime, len)) => format!("{mime}, {len} bytes encoded"),
            None => "no image".to_string(),
        };
        let _ = writeln!(out, "#{:<3} {}  {}", cell.index, cell.time, cell.caption);
        let _ = writeln!(
            out,
            "     {image} | mouse clicks: {} | key presses: {}",
            cell.mouse_clicks, cell.key_presses
        );
    }

    out
}

fn summarize_image(data: &str) -> Option<(&str, usize)> {
    let rest = data.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    Some((header.split(';').next().unwrap_or(header), payload.len()))
}
