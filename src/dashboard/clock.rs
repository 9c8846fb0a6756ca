/// Clock-style readout of a duration in seconds: `mm:ss` under an hour,
/// `hh:mm:ss` from there on. Hours keep counting past 24.
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours == 0 {
        format!("{minutes:02}:{secs:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    }
}
