use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

/// Deadline rendered in the configured timezone.
pub fn format_deadline(deadline: DateTime<Utc>, tz: &str) -> Result<String> {
    let tz: chrono_tz::Tz = tz.parse().map_err(|_| anyhow!("invalid tz: {tz}"))?;
    Ok(deadline.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z").to_string())
}

/// Countdown text: `"{d}d {h}h"`, or `"{h}h"` under a day. Past deadlines read `"0h"`.
pub fn time_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (deadline - now).num_seconds().max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    if days > 0 {
        format!("{days}d {hours}h")
    } else {
        format!("{hours}h")
    }
}
