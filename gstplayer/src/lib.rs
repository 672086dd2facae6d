// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! # gstplayer
//!
//! A playback component built on GStreamer's `playbin3`, with the state of
//! the pipeline mirrored into plain values and every change reported as an
//! event.
//!
//! ## Overview
//!
//! The crate does not decode or render anything itself. It builds a playback
//! pipeline around a caller-supplied render target, forwards property writes,
//! relays bus messages and polls the playback position.
//!
//! ### Key Concepts
//!
//! - **Player**: the controller ([`Player`]), cheap to clone, owning one pipeline at a time
//! - **Source**: a URI for `playbin3`, or a `gst-launch` description prefixed with `gst-pipeline:`
//! - **Render target**: where video ends up ([`RenderTarget`]), wrapped by the `playersink` element
//! - **Events**: every change is sent to the [`PlayerEvents`] streams returned by [`Player::subscribe`]
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐  writes   ┌──────────────────────────────────────────────┐
//! │ Player │ ────────► │ playbin3 (uri)                               │
//! └───┬────┘           │   video-sink: playersink                     │
//!     │                │     [capsfilter] ─► upload ─► render sink    │
//!     │                └───────────────────────┬──────────────────────┘
//!     │    PlayerEvent   bus watch, position   │
//!     ◄────────────────── timer (main loop) ◄──┘
//! ```
//!
//! ## Examples
//!
//! ### Playing a test pattern until the end
//!
//! ```no_run
//! use futures::StreamExt;
//! use gstplayer::{Player, PlayerEvent, RenderTarget};
//!
//! # fn main() -> Result<(), gstplayer::Error> {
//! let player = Player::builder()
//!     .source("gst-pipeline:videotestsrc num-buffers=100")
//!     .sink(RenderTarget::new("autovideosink"))
//!     .build()?;
//!
//! let mut events = player.subscribe();
//! futures::executor::block_on(async {
//!     while let Some(event) = events.next().await {
//!         match event {
//!             PlayerEvent::PositionChanged(ms) => println!("{}", gstplayer::format_position(ms)),
//!             PlayerEvent::EndOfStream => break,
//!             _ => {}
//!         }
//!     }
//! });
//! # Ok(())
//! # }
//! ```
//!
//! ### Rendering into a Qt Quick item
//!
//! ```no_run
//! use gstplayer::{Player, RenderTarget};
//!
//! # fn main() -> Result<(), gstplayer::Error> {
//! let config = gstplayer::PlayerConfig::default();
//! gstplayer::register_companion(&config)?;
//!
//! // The item is not ready to draw until the scene graph is up.
//! let target = RenderTarget::deferred(config.flavor.qml_sink_factory()).with_upload("glupload");
//! let player = Player::builder()
//!     .config(config)
//!     .source("https://example.com/stream.m3u8")
//!     .sink(target.clone())
//!     .upload_video_format("RGBA")
//!     .build()?;
//!
//! // Called from the UI once the item is initialized; playback starts now.
//! target.set_initialized(true);
//! # drop(player);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]. Install a subscriber (for example
//! `tracing_subscriber::fmt()`) to see pipeline construction, bus errors and
//! property changes in verbose mode.

pub mod config;
mod error;
pub mod events;
pub mod graph;
mod player;
pub mod render;
pub mod state;
pub mod time;

use std::sync::OnceLock;

use gstreamer as gst;
use tracing::debug;

pub use config::{PlaybackFlavor, PlayerConfig};
pub use error::{Error, Result};
pub use events::{PlayerEvent, PlayerEvents};
pub use player::{PAUSED_DOT_NAME, Player, PlayerBuilder};
pub use render::RenderTarget;
pub use state::PipelineState;
pub use time::format_position;

/// Initializes GStreamer and registers the `playersink` element.
///
/// Safe to call more than once; only the first call does any work.
pub fn init() -> Result<()> {
    static INIT: OnceLock<core::result::Result<(), glib::Error>> = OnceLock::new();

    INIT.get_or_init(|| {
        gst::init()?;
        gstplayersink::plugin_register_static()
            .map_err(|err| glib::Error::new(gst::CoreError::Failed, &err.to_string()))?;
        debug!(version = %gst::version_string(), "GStreamer initialized");
        Ok(())
    })
    .clone()
    .map_err(Error::Init)
}

/// Initializes GStreamer and loads the companion rendering plugin, making
/// its elements (for example `qml6glsink` from `qml6`) available.
pub fn register_types(companion: &str) -> Result<()> {
    init()?;
    gst::Plugin::load_by_name(companion).map_err(|source| Error::PluginLoad {
        name: companion.to_owned(),
        source: glib::Error::new(gst::CoreError::Failed, &source.to_string()),
    })?;
    debug!(plugin = companion, "companion plugin loaded");
    Ok(())
}

/// [`register_types`] for the companion plugin named by `config`.
pub fn register_companion(config: &PlayerConfig) -> Result<()> {
    register_types(&config.companion_plugin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init().unwrap();
        init().unwrap();
        assert!(gst::ElementFactory::find("playersink").is_some());
    }

    #[test]
    fn missing_companion_is_an_error() {
        let err = register_types("no-such-plugin-gstplayer").unwrap_err();
        assert!(matches!(err, Error::PluginLoad { ref name, .. } if name == "no-such-plugin-gstplayer"));
    }

    #[test]
    fn core_plugins_load() {
        register_types("coreelements").unwrap();
    }

    #[test]
    fn companion_comes_from_the_config() {
        let config = PlayerConfig {
            companion_plugin: "coreelements".to_owned(),
            ..Default::default()
        };
        register_companion(&config).unwrap();

        let config = PlayerConfig {
            companion_plugin: "no-such-plugin-gstplayer".to_owned(),
            ..Default::default()
        };
        let err = register_companion(&config).unwrap_err();
        assert!(matches!(err, Error::PluginLoad { ref name, .. } if name == "no-such-plugin-gstplayer"));
    }
}
