// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fleetsync status` and `fleetsync queue` command implementations.

use chrono::Utc;

use fleetsync_core::FleetsyncError;
use fleetsync_outbox::Outbox;

/// Render the sync status snapshot, human-readable or as JSON.
pub fn run_status(outbox: &Outbox, json: bool) -> Result<(), FleetsyncError> {
    let status = outbox.status()?;

    if json {
        let rendered = serde_json::to_string_pretty(&status)
            .map_err(|e| FleetsyncError::Internal(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    println!("pending:      {}", status.pending_count);
    println!("dead-letter:  {}", status.dead_letter_count);
    println!("syncing:      {}", if status.is_syncing { "yes" } else { "no" });
    match status.last_sync_at {
        Some(at) => println!("last sync:    {} ({} ago)", at, format_age(at)),
        None => println!("last sync:    never"),
    }
    if let Some(error) = &status.sync_error {
        println!("last error:   {error}");
    }
    Ok(())
}

/// List pending actions: id, kind, age, retry count.
pub fn run_queue(outbox: &Outbox) -> Result<(), FleetsyncError> {
    let pending = outbox.list()?;
    if pending.is_empty() {
        println!("outbox is empty");
        return Ok(());
    }
    for action in &pending {
        println!(
            "{}  {:<16} queued {} ago, {} retr{}",
            action.id,
            action.kind.to_string(),
            format_age(action.created_at),
            action.retry_count,
            if action.retry_count == 1 { "y" } else { "ies" },
        );
    }

    let dead = outbox.dead_letters()?;
    if !dead.is_empty() {
        println!("\n{} dead-lettered action(s); inspect {}", dead.len(), outbox.path().display());
    }
    Ok(())
}

/// Format how long ago a timestamp was, coarsely.
fn format_age(at: chrono::DateTime<Utc>) -> String {
    let secs = (Utc::now() - at).num_seconds().max(0) as u64;
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn age_formatting_is_coarse() {
        let now = Utc::now();
        assert_eq!(format_age(now), "0m");
        assert_eq!(format_age(now - Duration::minutes(5)), "5m");
        assert_eq!(format_age(now - Duration::hours(3) - Duration::minutes(7)), "3h 7m");
        assert_eq!(format_age(now - Duration::days(2) - Duration::hours(1)), "2d 1h");
    }

    #[test]
    fn future_timestamps_clamp_to_zero() {
        // Device clocks in the field drift; never render a negative age.
        let future = Utc::now() + Duration::minutes(10);
        assert_eq!(format_age(future), "0m");
    }
}
