//! GStreamer plugin for the gstplayer playback component
//!
//! This crate provides the `playersink` element: the video-sink bin that the
//! player hands to `playbin3` (or links behind a custom `gst-pipeline:`
//! description). It is a plain GStreamer element, so it can be used from
//! `gst-launch-1.0` too:
//!
//! ```bash
//! gst-launch-1.0 playbin3 uri=file:///tmp/clip.mp4 \
//!     video-sink="playersink render-sink=glimagesink upload-video-format=NV12"
//! ```
//!
//! The bin contains, in order:
//! - an optional `capsfilter` pinning `video/x-raw,format=<upload-video-format>`
//! - an optional upload element (`glupload` unless told otherwise)
//! - the caller-supplied render sink

// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::non_send_fields_in_send_ty, unused_doc_comments)]

use gst::glib;
use gstreamer as gst;

/// Video sink bin (optional format filter, upload, render sink)
pub mod playersink;

/// Registers all elements of the plugin.
///
/// Called once when the plugin is loaded, or through
/// `plugin_register_static()` when the crate is linked statically.
fn plugin_init(plugin: &gst::Plugin) -> Result<(), glib::BoolError> {
    playersink::register(plugin)?;
    Ok(())
}

gst::plugin_define!(
    playersink,
    env!("CARGO_PKG_DESCRIPTION"),
    plugin_init,
    concat!(env!("CARGO_PKG_VERSION"), "-", env!("COMMIT_ID")),
    "Apache-2.0",
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_REPOSITORY"),
    env!("BUILD_REL_DATE")
);
