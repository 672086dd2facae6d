// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Player configuration.
//!
//! [`PlayerConfig`] collects the knobs that are fixed for the lifetime of a
//! [`crate::Player`]: which playback element to use, how often to poll the
//! position and how the render sink is tuned. It can be loaded from JSON;
//! every key is optional.
//!
//! ```
//! use gstplayer::config::{PlaybackFlavor, PlayerConfig};
//!
//! # fn main() -> Result<(), gstplayer::Error> {
//! let config = PlayerConfig::from_json_str(r#"{ "flavor": "playbin", "position-interval-ms": 250 }"#)?;
//! assert_eq!(config.flavor, PlaybackFlavor::Playbin);
//! assert_eq!(config.position_interval_ms, 250);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Position polling interval while playing.
pub const DEFAULT_POSITION_INTERVAL_MS: u64 = 500;

/// `processing-deadline` applied to the render sink.
pub const DEFAULT_PROCESSING_DEADLINE_MS: u64 = 35;

/// `max-lateness` applied to the render sink.
pub const DEFAULT_MAX_LATENESS_MS: i64 = 15;

/// `connection-speed` handed to playbin, in kbps.
pub const DEFAULT_CONNECTION_SPEED: u64 = 1;

/// Which playback element drives URI sources.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackFlavor {
    /// `playbin3` with the Qt 6 render sink.
    #[default]
    Playbin3,

    /// Legacy `playbin` with the Qt 5 render sink.
    Playbin,
}

impl PlaybackFlavor {
    /// Factory name of the playback element.
    pub fn playbin_factory(self) -> &'static str {
        match self {
            PlaybackFlavor::Playbin3 => "playbin3",
            PlaybackFlavor::Playbin => "playbin",
        }
    }

    /// Name of the plugin providing the matching Qt render sink.
    pub fn companion_plugin(self) -> &'static str {
        match self {
            PlaybackFlavor::Playbin3 => "qml6",
            PlaybackFlavor::Playbin => "qmlgl",
        }
    }

    /// Factory name of the matching Qt render sink.
    pub fn qml_sink_factory(self) -> &'static str {
        match self {
            PlaybackFlavor::Playbin3 => "qml6glsink",
            PlaybackFlavor::Playbin => "qmlglsink",
        }
    }
}

/// Settings fixed for the lifetime of a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PlayerConfig {
    /// Playback element used for URI sources.
    pub flavor: PlaybackFlavor,

    /// Position polling interval while playing, in milliseconds.
    pub position_interval_ms: u64,

    /// Render sink `processing-deadline` in milliseconds, if set.
    pub processing_deadline_ms: Option<u64>,

    /// Render sink `max-lateness` in milliseconds, if set.
    pub max_lateness_ms: Option<i64>,

    /// Render sink `sync`.
    pub sync: bool,

    /// playbin `connection-speed` in kbps.
    pub connection_speed: u64,

    /// Plugin loaded by [`crate::register_companion`].
    pub companion_plugin: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            flavor: PlaybackFlavor::Playbin3,
            position_interval_ms: DEFAULT_POSITION_INTERVAL_MS,
            processing_deadline_ms: Some(DEFAULT_PROCESSING_DEADLINE_MS),
            max_lateness_ms: Some(DEFAULT_MAX_LATENESS_MS),
            sync: true,
            connection_speed: DEFAULT_CONNECTION_SPEED,
            companion_plugin: PlaybackFlavor::Playbin3.companion_plugin().to_owned(),
        }
    }
}

impl PlayerConfig {
    /// Configuration of the legacy `playbin` component.
    ///
    /// The legacy render sink is left with its own deadline and lateness.
    pub fn legacy() -> Self {
        PlayerConfig {
            flavor: PlaybackFlavor::Playbin,
            processing_deadline_ms: None,
            max_lateness_ms: None,
            companion_plugin: PlaybackFlavor::Playbin.companion_plugin().to_owned(),
            ..Default::default()
        }
    }

    /// Parses a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Position polling interval as a [`Duration`], never zero.
    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.position_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_playbin3_component() {
        let config = PlayerConfig::default();
        assert_eq!(config.flavor.playbin_factory(), "playbin3");
        assert_eq!(config.position_interval(), Duration::from_millis(500));
        assert_eq!(config.processing_deadline_ms, Some(35));
        assert_eq!(config.max_lateness_ms, Some(15));
        assert_eq!(config.connection_speed, 1);
        assert_eq!(config.companion_plugin, "qml6");
        assert!(config.sync);
    }

    #[test]
    fn legacy_uses_playbin_and_qmlgl() {
        let config = PlayerConfig::legacy();
        assert_eq!(config.flavor.playbin_factory(), "playbin");
        assert_eq!(config.flavor.qml_sink_factory(), "qmlglsink");
        assert_eq!(config.companion_plugin, "qmlgl");
        assert_eq!(config.processing_deadline_ms, None);
        assert_eq!(config.max_lateness_ms, None);
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = PlayerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn keys_are_kebab_case() {
        let config = PlayerConfig::from_json_str(
            r#"{
                "flavor": "playbin",
                "position-interval-ms": 100,
                "processing-deadline-ms": null,
                "sync": false,
                "connection-speed": 2000
            }"#,
        )
        .unwrap();
        assert_eq!(config.flavor, PlaybackFlavor::Playbin);
        assert_eq!(config.position_interval_ms, 100);
        assert_eq!(config.processing_deadline_ms, None);
        assert_eq!(config.max_lateness_ms, Some(DEFAULT_MAX_LATENESS_MS));
        assert!(!config.sync);
        assert_eq!(config.connection_speed, 2000);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = PlayerConfig {
            position_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.position_interval(), Duration::from_millis(1));
    }

    #[test]
    fn bad_documents_are_config_errors() {
        assert!(matches!(
            PlayerConfig::from_json_str(r#"{ "flavor": "decodebin" }"#),
            Err(crate::Error::Config(_))
        ));
        assert!(matches!(
            PlayerConfig::from_file("/nonexistent/gstplayer.json"),
            Err(crate::Error::Io(_))
        ));
    }
}
