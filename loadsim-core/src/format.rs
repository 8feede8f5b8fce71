use std::time::Duration;

/// Human readable rendering of a duration, truncated to whole microseconds.
pub fn format_duration(dur: Duration) -> humantime::FormattedDuration {
    humantime::format_duration(Duration::from_micros(dur.as_micros() as u64))
}
