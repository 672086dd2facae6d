//! Player Video Sink Implementation
//!
//! A `gst::Bin` subclass with a single ghost `sink` pad. The inner chain is
//! built from the properties when the element goes to READY:
//!
//! ```text
//! ghost sink ─► [capsfilter] ─► [upload] ─► render-sink
//! ```
//!
//! Both leading elements are optional. Without a `render-sink` the element
//! refuses to leave NULL.

// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gst::subclass::prelude::*;
use gstreamer as gst;
use gstreamer_video as gst_video;
use tracing::{debug, trace};

use std::sync::LazyLock;
use std::sync::Mutex;

use crate::playersink;

/// GStreamer debug category for playersink messages.
///
/// Set GST_DEBUG=playersink:6 to see everything.
pub(crate) static CAT: LazyLock<gst::DebugCategory> = LazyLock::new(|| {
    gst::DebugCategory::new(
        "playersink",
        gst::DebugColorFlags::empty(),
        Some("Player Video Sink"),
    )
});

/// Upload element used when the `upload` property is left alone.
pub const DEFAULT_UPLOAD: &str = "glupload";

/// User-configurable settings, applied on the next NULL→READY transition.
#[derive(Debug, Clone)]
struct Settings {
    render_sink: Option<gst::Element>,
    upload: String,
    upload_video_format: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            render_sink: None,
            upload: DEFAULT_UPLOAD.to_owned(),
            upload_video_format: None,
        }
    }
}

/// Elements currently inside the bin, in link order.
#[derive(Default)]
struct State {
    chain: Vec<gst::Element>,
}

pub struct PlayerSink {
    sinkpad: gst::GhostPad,
    settings: Mutex<Settings>,
    state: Mutex<State>,
}

#[glib::object_subclass]
impl ObjectSubclass for PlayerSink {
    const NAME: &'static str = "GstRsPlayerSink";
    type Type = playersink::PlayerSink;
    type ParentType = gst::Bin;

    fn with_class(klass: &Self::Class) -> Self {
        let templ = klass
            .pad_template("sink")
            .expect("playersink is registered with a sink pad template");
        let sinkpad = gst::GhostPad::builder_from_template(&templ).build();

        Self {
            sinkpad,
            settings: Mutex::new(Settings::default()),
            state: Mutex::new(State::default()),
        }
    }
}

impl ObjectImpl for PlayerSink {
    fn properties() -> &'static [glib::ParamSpec] {
        static PROPERTIES: LazyLock<Vec<glib::ParamSpec>> = LazyLock::new(|| {
            vec![
                glib::ParamSpecObject::builder::<gst::Element>("render-sink")
                    .nick("Render Sink")
                    .blurb("Element that renders the video frames")
                    .mutable_ready()
                    .build(),
                glib::ParamSpecString::builder("upload")
                    .nick("Upload")
                    .blurb("Factory name of the element placed in front of the render sink, empty for none")
                    .default_value(DEFAULT_UPLOAD)
                    .mutable_ready()
                    .build(),
                glib::ParamSpecString::builder("upload-video-format")
                    .nick("Upload Video Format")
                    .blurb("Raw video format forced in front of the upload element")
                    .mutable_ready()
                    .build(),
            ]
        });

        PROPERTIES.as_ref()
    }

    fn constructed(&self) {
        #[cfg(feature = "tracing")]
        {
            use tracing_subscriber::filter::LevelFilter;
            use tracing_subscriber::util::SubscriberInitExt;

            let _ = tracing_subscriber::fmt()
                .compact()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(false)
                .with_max_level(LevelFilter::TRACE)
                .with_ansi(true)
                .finish()
                .try_init();
        }

        self.parent_constructed();

        let obj = self.obj();
        obj.set_element_flags(gst::ElementFlags::SINK);
        obj.set_suppressed_flags(gst::ElementFlags::SINK | gst::ElementFlags::SOURCE);
        if let Err(err) = obj.add_pad(&self.sinkpad) {
            gst::error!(CAT, imp = self, "Failed to add ghost sink pad: {}", err);
        }
    }

    fn set_property(&self, _id: usize, value: &glib::Value, pspec: &glib::ParamSpec) {
        let Ok(mut settings) = self.settings.lock() else {
            gst::error!(
                CAT,
                imp = self,
                "Settings mutex poisoned, property change ignored"
            );
            return;
        };

        match pspec.name() {
            "render-sink" => match value.get::<Option<gst::Element>>() {
                Ok(render_sink) => {
                    gst::info!(CAT, imp = self, "Changing render-sink to {:?}", render_sink);
                    settings.render_sink = render_sink;
                }
                Err(_) => gst::error!(CAT, imp = self, "Invalid type for render-sink property"),
            },
            "upload" => match value.get::<Option<String>>() {
                Ok(upload) => {
                    let upload = upload.unwrap_or_default();
                    gst::info!(
                        CAT,
                        imp = self,
                        "Changing upload from '{}' to '{}'",
                        settings.upload,
                        upload
                    );
                    settings.upload = upload;
                }
                Err(_) => gst::error!(CAT, imp = self, "Invalid type for upload property"),
            },
            "upload-video-format" => match value.get::<Option<String>>() {
                Ok(format) => {
                    let format = format.filter(|format| !format.is_empty());
                    gst::info!(
                        CAT,
                        imp = self,
                        "Changing upload-video-format to {:?}",
                        format
                    );
                    settings.upload_video_format = format;
                }
                Err(_) => gst::error!(
                    CAT,
                    imp = self,
                    "Invalid type for upload-video-format property"
                ),
            },
            other => gst::error!(CAT, imp = self, "Unknown property '{}'", other),
        }
    }

    fn property(&self, _id: usize, pspec: &glib::ParamSpec) -> glib::Value {
        let Ok(settings) = self.settings.lock() else {
            gst::error!(CAT, imp = self, "Settings mutex poisoned");
            return pspec.default_value().clone();
        };

        match pspec.name() {
            "render-sink" => settings.render_sink.to_value(),
            "upload" => settings.upload.to_value(),
            "upload-video-format" => settings.upload_video_format.to_value(),
            _ => {
                gst::error!(CAT, imp = self, "Unknown property {}", pspec.name());
                pspec.default_value().clone()
            }
        }
    }
}

impl GstObjectImpl for PlayerSink {}

impl ElementImpl for PlayerSink {
    fn metadata() -> Option<&'static gst::subclass::ElementMetadata> {
        static ELEMENT_METADATA: LazyLock<gst::subclass::ElementMetadata> = LazyLock::new(|| {
            gst::subclass::ElementMetadata::new(
                "Player Video Sink",
                "Sink/Video/Bin",
                "Routes video through an optional format filter and upload element into a render sink",
                "Contributors to the gstplayer project",
            )
        });

        Some(&*ELEMENT_METADATA)
    }

    fn pad_templates() -> &'static [gst::PadTemplate] {
        static PAD_TEMPLATES: LazyLock<Result<Vec<gst::PadTemplate>, glib::BoolError>> =
            LazyLock::new(|| {
                let sink_pad_template = gst::PadTemplate::new(
                    "sink",
                    gst::PadDirection::Sink,
                    gst::PadPresence::Always,
                    &gst::Caps::new_any(),
                )?;

                Ok(vec![sink_pad_template])
            });

        match PAD_TEMPLATES.as_ref() {
            Ok(templates) => templates,
            Err(err) => {
                trace!("Failed to create pad templates: {:?}", err);
                &[]
            }
        }
    }

    fn change_state(
        &self,
        transition: gst::StateChange,
    ) -> Result<gst::StateChangeSuccess, gst::StateChangeError> {
        if transition == gst::StateChange::NullToReady {
            if let Err(err) = self.assemble() {
                self.post_error_message(err);
                self.teardown();
                return Err(gst::StateChangeError);
            }
        }

        let ret = self.parent_change_state(transition);

        match (transition, &ret) {
            (gst::StateChange::ReadyToNull, _) | (gst::StateChange::NullToReady, Err(_)) => {
                self.teardown()
            }
            _ => (),
        }

        ret
    }
}

impl BinImpl for PlayerSink {}

impl PlayerSink {
    /// Builds the inner chain from the current settings and points the
    /// ghost pad at its head.
    fn assemble(&self) -> Result<(), gst::ErrorMessage> {
        let settings = self
            .settings
            .lock()
            .map_err(|e| {
                gst::error_msg!(
                    gst::CoreError::Failed,
                    ["Failed to get settings mutex: {}", e]
                )
            })?
            .clone();
        let mut state = self.state.lock().map_err(|e| {
            gst::error_msg!(gst::CoreError::Failed, ["Failed to get state mutex: {}", e])
        })?;

        let render_sink = settings.render_sink.ok_or_else(|| {
            gst::error_msg!(gst::CoreError::StateChange, ["No render-sink configured"])
        })?;

        let mut chain = Vec::with_capacity(3);

        if let Some(format) = settings.upload_video_format.as_deref() {
            let video_format = gst_video::VideoFormat::from_string(format);
            if video_format == gst_video::VideoFormat::Unknown {
                return Err(gst::error_msg!(
                    gst::CoreError::Negotiation,
                    ["Unknown upload video format '{}'", format]
                ));
            }

            let caps = gst::Caps::builder("video/x-raw")
                .field("format", video_format.to_str().as_str())
                .build();
            let capsfilter = gst::ElementFactory::make("capsfilter")
                .property("caps", &caps)
                .build()
                .map_err(|e| {
                    gst::error_msg!(
                        gst::CoreError::MissingPlugin,
                        ["Failed to create capsfilter: {}", e]
                    )
                })?;
            chain.push(capsfilter);
        }

        if !settings.upload.is_empty() {
            let upload = gst::ElementFactory::make(&settings.upload)
                .build()
                .map_err(|e| {
                    gst::error_msg!(
                        gst::CoreError::MissingPlugin,
                        ["Failed to create upload element '{}': {}", settings.upload, e]
                    )
                })?;
            chain.push(upload);
        }

        chain.push(render_sink);

        let obj = self.obj();
        obj.add_many(&chain).map_err(|e| {
            gst::error_msg!(gst::CoreError::Failed, ["Failed to add elements: {}", e])
        })?;
        // From here on the elements are owned by the bin, teardown() removes them.
        state.chain = chain;

        gst::Element::link_many(&state.chain).map_err(|e| {
            gst::error_msg!(gst::CoreError::Negotiation, ["Failed to link chain: {}", e])
        })?;

        let target = state
            .chain
            .first()
            .and_then(|head| head.static_pad("sink"))
            .ok_or_else(|| {
                gst::error_msg!(gst::CoreError::Pad, ["Chain head has no sink pad"])
            })?;
        self.sinkpad.set_target(Some(&target)).map_err(|e| {
            gst::error_msg!(gst::CoreError::Pad, ["Failed to set ghost pad target: {}", e])
        })?;

        debug!(elements = state.chain.len(), "assembled video chain");
        gst::debug!(CAT, imp = self, "Assembled chain of {} elements", state.chain.len());

        Ok(())
    }

    /// Removes every element added by [`Self::assemble`].
    fn teardown(&self) {
        let chain = match self.state.lock() {
            Ok(mut state) => std::mem::take(&mut state.chain),
            Err(_) => {
                gst::error!(CAT, imp = self, "State mutex poisoned");
                return;
            }
        };

        if let Err(err) = self.sinkpad.set_target(None::<&gst::Pad>) {
            gst::warning!(CAT, imp = self, "Failed to clear ghost pad target: {}", err);
        }

        if chain.is_empty() {
            return;
        }

        if let Err(err) = self.obj().remove_many(&chain) {
            gst::warning!(CAT, imp = self, "Failed to remove chain: {}", err);
        }
        gst::debug!(CAT, imp = self, "Removed chain of {} elements", chain.len());
    }
}
