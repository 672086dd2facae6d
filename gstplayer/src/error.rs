// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for player operations.

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur when building or driving a [`crate::Player`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// GStreamer could not be initialized.
    #[error("GStreamer initialization failed: {0}")]
    Init(#[source] glib::Error),

    /// A required element factory is not available.
    ///
    /// Usually means a plugin package is not installed (for `playbin3`
    /// that is the GStreamer playback plugin from gst-plugins-base).
    #[error("Missing element '{0}', is the plugin providing it installed?")]
    MissingElement(String),

    /// A plugin could not be loaded by name.
    #[error("Failed to load plugin '{name}': {source}")]
    PluginLoad {
        name: String,
        #[source]
        source: glib::Error,
    },

    /// A `gst-pipeline:` description could not be parsed.
    #[error("Invalid pipeline description: {0}")]
    Parse(#[source] glib::Error),

    /// A GStreamer call reported failure (adding, linking, seeking, ...).
    #[error("GStreamer call failed: {0}")]
    Gst(#[from] glib::BoolError),

    /// The current stream does not support seeking (or has not said so yet).
    #[error("Seeking is not available in this stream")]
    NotSeekable,

    /// The player's main loop thread could not be started.
    #[error("Failed to start the player main loop: {0}")]
    MainLoop(#[source] std::io::Error),

    /// A configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic error for failures without a dedicated variant.
    #[error("Other error: {0}")]
    Other(String),
}
