// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Playback state and the values the player keeps between rebuilds.

use std::fmt;
use std::str::FromStr;

use gstreamer as gst;

use crate::Error;

/// Requested playback state of a [`crate::Player`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Playing, with the position timer running.
    #[default]
    Play,

    /// Paused, preroll kept.
    Pause,

    /// Stopped, pipeline in NULL.
    Stop,
}

impl PipelineState {
    /// GStreamer state requested for this playback state.
    pub fn target(self) -> gst::State {
        match self {
            PipelineState::Play => gst::State::Playing,
            PipelineState::Pause => gst::State::Paused,
            PipelineState::Stop => gst::State::Null,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Play => "play",
            PipelineState::Pause => "pause",
            PipelineState::Stop => "stop",
        };
        f.write_str(name)
    }
}

impl FromStr for PipelineState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "play" | "playing" => Ok(PipelineState::Play),
            "pause" | "paused" => Ok(PipelineState::Pause),
            "stop" | "stopped" => Ok(PipelineState::Stop),
            other => Err(Error::Other(format!("Unknown pipeline state '{other}'"))),
        }
    }
}

/// Values written by the user, applied on the next rebuild or immediately
/// where the pipeline allows it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Settings {
    pub source: String,
    pub state: PipelineState,
    pub verbose: bool,
    pub audio: bool,
    pub volume: f64,
    pub mute: bool,
    pub looping: bool,
    pub upload_video_format: Option<String>,
    pub connection_speed: u64,
}

impl Settings {
    pub fn new(connection_speed: u64) -> Self {
        Settings {
            source: String::new(),
            state: PipelineState::default(),
            verbose: false,
            audio: true,
            volume: 1.0,
            mute: false,
            looping: false,
            upload_video_format: None,
            connection_speed,
        }
    }
}

/// Values observed from the running pipeline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Status {
    /// Last observed position in milliseconds.
    pub position: i64,
    /// Last observed duration in milliseconds.
    pub duration: i64,
    pub seekable: bool,
    /// Set by DURATION_CHANGED until a duration query succeeds.
    pub duration_dirty: bool,
}
