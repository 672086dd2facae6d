// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Playback graph construction.
//!
//! A source is either a URI played through `playbin3`/`playbin`, or a
//! `gst-launch` description prefixed with [`SOURCE_PIPELINE_PREFIX`] whose
//! unlinked source pad is linked to the video sink. Video always ends in a
//! `playersink` element wrapping the render target.

use gst::prelude::*;
use gstreamer as gst;
use tracing::{debug, warn};

use crate::config::PlayerConfig;
use crate::render::RenderTarget;
use crate::state::Settings;
use crate::{Error, Result};

/// Prefix marking a source as a `gst-launch` pipeline description.
pub const SOURCE_PIPELINE_PREFIX: &str = "gst-pipeline:";

/// What a source string asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind<'a> {
    /// A URI handed to playbin.
    Uri(&'a str),

    /// A pipeline description with the prefix removed.
    Custom(&'a str),
}

impl<'a> SourceKind<'a> {
    pub fn parse(source: &'a str) -> Self {
        match source.strip_prefix(SOURCE_PIPELINE_PREFIX) {
            Some(description) => SourceKind::Custom(description),
            None => SourceKind::Uri(source),
        }
    }
}

/// playbin `flags` value: native video, plus audio when enabled.
pub fn playbin_flags(audio: bool) -> &'static str {
    if audio {
        "native-video+audio"
    } else {
        "native-video"
    }
}

/// Creates the `playersink` bin routing video into `target`.
pub fn make_sink_bin(
    target: &RenderTarget,
    config: &PlayerConfig,
    upload_video_format: Option<&str>,
) -> Result<gst::Element> {
    let render_sink = target.make_element(config)?;

    let sink_bin = gst::ElementFactory::make("playersink")
        .property("render-sink", &render_sink)
        .property("upload", target.upload())
        .build()
        .map_err(|_| Error::MissingElement("playersink".to_owned()))?;
    if let Some(format) = upload_video_format {
        sink_bin.set_property("upload-video-format", format);
    }

    Ok(sink_bin)
}

fn pipeline_name() -> String {
    format!("gstplayer-{}", uuid::Uuid::new_v4())
}

/// Builds the playback pipeline for the current settings.
pub(crate) fn build_pipeline(
    config: &PlayerConfig,
    settings: &Settings,
    target: &RenderTarget,
) -> Result<gst::Pipeline> {
    let sink_bin = make_sink_bin(target, config, settings.upload_video_format.as_deref())?;
    let name = pipeline_name();

    let pipeline = match SourceKind::parse(&settings.source) {
        SourceKind::Uri(uri) => {
            let factory = config.flavor.playbin_factory();
            let playbin = gst::ElementFactory::make(factory)
                .name(name.as_str())
                .property("video-sink", &sink_bin)
                .property("mute", settings.mute)
                .property("volume", settings.volume)
                .property("connection-speed", settings.connection_speed)
                .property("uri", uri)
                .build()
                .map_err(|_| Error::MissingElement(factory.to_owned()))?;
            playbin.set_property_from_str("flags", playbin_flags(settings.audio));
            playbin.connect("element-setup", false, |values| {
                if let Ok(element) = values[1].get::<gst::Element>() {
                    setup_element(&element);
                }
                None
            });

            playbin
                .downcast::<gst::Pipeline>()
                .map_err(|_| Error::Other(format!("'{factory}' is not a pipeline")))?
        }
        SourceKind::Custom(description) => {
            let pipeline = gst::Pipeline::with_name(&name);
            let source_bin =
                gst::parse::bin_from_description(description, true).map_err(Error::Parse)?;
            pipeline.add_many([source_bin.upcast_ref::<gst::Element>(), &sink_bin])?;
            source_bin.link(&sink_bin)?;
            pipeline
        }
    };

    debug!(pipeline = %name, source = %settings.source, "built pipeline");
    Ok(pipeline)
}

/// Per-element tweaks applied as playbin creates its children.
fn setup_element(element: &gst::Element) {
    if element.type_().name() == "v4l2h264dec" {
        if element.find_property("capture-io-mode").is_some() {
            debug!(element = %element.name(), "using dmabuf capture");
            element.set_property_from_str("capture-io-mode", "dmabuf");
        } else {
            warn!(element = %element.name(), "decoder has no capture-io-mode");
        }
    }
}
