// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Human readable playback positions.

/// Formats a position in milliseconds as `m:ss`, or `h:mm:ss` from one hour
/// on. Negative values are shown as `0:00`.
pub fn format_position(msecs: i64) -> String {
    let total = msecs.max(0) / 1000;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
