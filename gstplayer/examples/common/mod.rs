// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Helpers shared by the demos.

use futures::StreamExt;
use gstplayer::{PipelineState, PlayerEvent, PlayerEvents, format_position};
use tracing::{error, info};

/// Logs to stdout at INFO unless `RUST_LOG` says otherwise.
pub fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

/// Prints events until playback stops or fails.
///
/// Returns `false` when the pipeline reported an error.
pub async fn follow(mut events: PlayerEvents) -> bool {
    let mut duration = 0;

    while let Some(event) = events.next().await {
        match event {
            PlayerEvent::DurationChanged(ms) => duration = ms,
            PlayerEvent::PositionChanged(ms) => {
                info!("{} / {}", format_position(ms), format_position(duration));
            }
            PlayerEvent::StateChanged(PipelineState::Stop) => return true,
            PlayerEvent::Error { message, debug: debug_info } => {
                error!(%message, debug = debug_info.as_deref().unwrap_or(""), "playback failed");
                return false;
            }
            other => info!(?other, "event"),
        }
    }

    true
}
