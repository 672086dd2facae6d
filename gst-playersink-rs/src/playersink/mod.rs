//! Player Video Sink Element
//!
//! This module implements `playersink`, a bin that routes decoded video into
//! a render sink chosen by the application.
//!
//! ## Properties (set before READY state)
//! - `render-sink`: element that consumes the frames (e.g. `qml6glsink`)
//! - `upload`: factory name of the element in front of the render sink,
//!   empty for none
//! - `upload-video-format`: optional raw video format forced in front of the
//!   upload element
//!
//! The chain is assembled on NULL→READY and taken apart again on READY→NULL,
//! so the element can be reconfigured and reused.

// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gstreamer as gst;

/// Core implementation (properties, chain assembly, GStreamer trait impls)
mod imp;


pub use imp::DEFAULT_UPLOAD;

glib::wrapper! {
    pub struct PlayerSink(ObjectSubclass<imp::PlayerSink>)
        @extends gst::Bin, gst::Element, gst::Object,
        @implements gst::ChildProxy;
}

/// Registers the playersink element with GStreamer.
///
/// The rank is NONE: the bin is never picked by autoplugging and has to be
/// requested by name.
pub fn register(plugin: &gst::Plugin) -> Result<(), glib::BoolError> {
    gst::Element::register(
        Some(plugin),
        "playersink",
        gst::Rank::NONE,
        PlayerSink::static_type(),
    )
}
