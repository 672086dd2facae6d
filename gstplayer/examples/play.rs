// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Plays a URI or a `gst-pipeline:` description and prints the position.
//!
//! ```text
//! cargo run --example play -- https://example.com/stream.m3u8
//! cargo run --example play -- "gst-pipeline:videotestsrc num-buffers=300" --loop
//! ```

mod common;

use std::path::PathBuf;

use clap::Parser;
use gstplayer::{Player, PlayerConfig, RenderTarget};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Plays a media source through gstplayer")]
struct Args {
    /// URI or `gst-pipeline:` description
    source: String,

    /// Render sink factory
    #[arg(long, default_value = "autovideosink")]
    sink: String,

    /// Upload element placed in front of the render sink, empty for none
    #[arg(long, default_value = gstplayer::render::DEFAULT_UPLOAD)]
    upload: String,

    /// Raw video format forced in front of the upload element
    #[arg(long)]
    format: Option<String>,

    /// Restart at end of stream
    #[arg(long = "loop")]
    looping: bool,

    #[arg(long)]
    mute: bool,

    #[arg(long, default_value_t = 1.0)]
    volume: f64,

    /// Disable audio output
    #[arg(long)]
    no_audio: bool,

    /// Log property changes inside the pipeline
    #[arg(long)]
    verbose: bool,

    /// Use the legacy playbin configuration
    #[arg(long)]
    legacy: bool,

    /// JSON configuration file
    #[arg(long, conflicts_with = "legacy")]
    config: Option<PathBuf>,

    /// Load a companion plugin before building the pipeline. Without a
    /// value the plugin named by the configuration is loaded (e.g. qml6).
    #[arg(long, num_args = 0..=1)]
    companion: Option<Option<String>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::setup_logging();
    let args = Args::parse();

    let config = match (&args.config, args.legacy) {
        (Some(path), _) => PlayerConfig::from_file(path)?,
        (None, true) => PlayerConfig::legacy(),
        (None, false) => PlayerConfig::default(),
    };

    gstplayer::init()?;
    match &args.companion {
        Some(Some(name)) => gstplayer::register_types(name)?,
        Some(None) => gstplayer::register_companion(&config)?,
        None => {}
    }

    let target = RenderTarget::new(&args.sink).with_upload(&args.upload);
    let mut builder = Player::builder()
        .config(config)
        .source(&args.source)
        .sink(target)
        .looping(args.looping)
        .mute(args.mute)
        .volume(args.volume)
        .audio(!args.no_audio)
        .verbose(args.verbose);
    if let Some(format) = &args.format {
        builder = builder.upload_video_format(format);
    }

    let player = builder.build()?;
    let events = player.subscribe();
    info!(source = %player.source(), "playing");

    let ok = futures::executor::block_on(common::follow(events));
    player.stop();

    if ok {
        Ok(())
    } else {
        Err("playback failed".into())
    }
}
