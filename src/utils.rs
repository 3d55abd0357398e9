/// Renders a position in seconds as `MM:SS`.
///
/// Minutes are not wrapped into hours, so an hour-long track shows `60:00`.
/// Anything that is not a finite, non-negative number renders as `00:00`.
pub fn format_time(seconds: f64) -> String {
    let total_seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}
