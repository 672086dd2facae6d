// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the player.
//!
//! Every test drives a real pipeline built from GStreamer core and base
//! elements. Video goes into a `fakesink` through `identity`, so no display
//! or GL context is needed.
//!
//! # Requirements
//!
//! - GStreamer with gst-plugins-base (`videotestsrc`, `audiotestsrc`,
//!   `playbin3`, `playbin`)
//! - gst-plugins-good for the seeking tests (`wavenc`, `wavparse`)

use std::path::PathBuf;
use std::time::{Duration, Instant};

use futures::{FutureExt, StreamExt};
use gstplayer::{PipelineState, Player, PlayerConfig, PlayerEvent, PlayerEvents, RenderTarget};
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::info;

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

const TIMEOUT: Duration = Duration::from_secs(10);

fn setup_test() {
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_test_writer()
            .init();
    });
    gstplayer::init().unwrap();
}

fn target() -> RenderTarget {
    RenderTarget::new("fakesink").with_upload("identity")
}

fn test_source(buffers: u32) -> String {
    format!("gst-pipeline:videotestsrc num-buffers={buffers}")
}

fn fast_config() -> PlayerConfig {
    PlayerConfig {
        position_interval_ms: 20,
        ..Default::default()
    }
}

/// Collects events until one matches `done`, failing after [`TIMEOUT`].
fn wait_for(
    events: &mut PlayerEvents,
    done: impl Fn(&PlayerEvent) -> bool,
) -> Vec<PlayerEvent> {
    let deadline = Instant::now() + TIMEOUT;
    let mut seen = Vec::new();

    while Instant::now() < deadline {
        match events.next().now_or_never() {
            Some(Some(event)) => {
                let finished = done(&event);
                seen.push(event);
                if finished {
                    return seen;
                }
            }
            Some(None) => panic!("event stream closed, saw {seen:?}"),
            None => std::thread::sleep(Duration::from_millis(10)),
        }
    }

    panic!("timed out, saw {seen:?}");
}

/// A short seekable WAV file in the temp directory, removed on drop.
struct WavFile(PathBuf);

impl WavFile {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("gstplayer-{}.wav", uuid::Uuid::new_v4()));
        let writer = gst::parse::launch(&format!(
            "audiotestsrc num-buffers=100 ! wavenc ! filesink location=\"{}\"",
            path.display()
        ))
        .unwrap();
        writer.set_state(gst::State::Playing).unwrap();
        let msg = writer
            .bus()
            .unwrap()
            .timed_pop_filtered(
                gst::ClockTime::from_seconds(10),
                &[gst::MessageType::Eos, gst::MessageType::Error],
            )
            .expect("writer finished");
        writer.set_state(gst::State::Null).unwrap();
        assert_eq!(msg.type_(), gst::MessageType::Eos);
        Self(path)
    }

    fn source(&self) -> String {
        format!(
            "gst-pipeline:filesrc location=\"{}\" ! wavparse ! audioconvert",
            self.0.display()
        )
    }
}

impl Drop for WavFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn current_state(pipeline: &gst::Pipeline) -> gst::State {
    pipeline.state(gst::ClockTime::from_seconds(5)).1
}

/// State changes are requested asynchronously, so poll until one lands.
fn wait_state(pipeline: &gst::Pipeline, state: gst::State) {
    let deadline = Instant::now() + TIMEOUT;
    while current_state(pipeline) != state {
        assert!(
            Instant::now() < deadline,
            "pipeline never reached {state:?}"
        );
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn end_of_stream_stops_playback() {
    setup_test();

    let player = Player::new(fast_config()).unwrap();
    let mut events = player.subscribe();
    player.set_sink(Some(target())).unwrap();
    player.set_source(test_source(10)).unwrap();
    player.complete().unwrap();

    let seen = wait_for(&mut events, |e| *e == PlayerEvent::EndOfStream);
    info!(?seen, "events");

    assert!(seen.contains(&PlayerEvent::StateChanged(PipelineState::Stop)));
    assert!(
        seen.iter()
            .any(|e| matches!(e, PlayerEvent::PositionChanged(ms) if *ms > 0))
    );
    assert_eq!(player.state(), PipelineState::Stop);

    // The rebuilt pipeline is left stopped.
    std::thread::sleep(Duration::from_millis(200));
    let pipeline = player.pipeline().expect("pipeline is rebuilt");
    assert_eq!(current_state(&pipeline), gst::State::Null);
}

#[test]
fn looping_restarts_playback() {
    setup_test();

    let player = Player::builder()
        .config(fast_config())
        .source(test_source(3))
        .sink(target())
        .looping(true)
        .build()
        .unwrap();
    let mut events = player.subscribe();

    wait_for(&mut events, |e| *e == PlayerEvent::EndOfStream);
    let seen = wait_for(&mut events, |e| *e == PlayerEvent::EndOfStream);

    assert!(!seen.contains(&PlayerEvent::StateChanged(PipelineState::Stop)));
    assert_eq!(player.state(), PipelineState::Play);
}

#[test]
fn pipeline_errors_are_reported() {
    setup_test();

    let player = Player::new(PlayerConfig::default()).unwrap();
    let mut events = player.subscribe();
    player.set_sink(Some(target())).unwrap();
    player
        .set_source("gst-pipeline:filesrc location=/nonexistent/gstplayer-test.mp4")
        .unwrap();
    player.complete().unwrap();

    let seen = wait_for(&mut events, |e| matches!(e, PlayerEvent::Error { .. }));
    let Some(PlayerEvent::Error { message, .. }) = seen.last() else {
        unreachable!();
    };
    assert!(!message.is_empty());
}

#[test]
fn state_changes_are_reported_once() {
    setup_test();

    let player = Player::builder()
        .source("gst-pipeline:videotestsrc is-live=true")
        .sink(target())
        .build()
        .unwrap();
    let mut events = player.subscribe();
    let pipeline = player.pipeline().unwrap();
    wait_state(&pipeline, gst::State::Playing);

    // Already playing, nothing to do.
    player.play();

    player.pause();
    wait_state(&pipeline, gst::State::Paused);
    player.pause();

    player.play();
    wait_state(&pipeline, gst::State::Playing);
    player.stop();
    wait_state(&pipeline, gst::State::Null);

    let seen = wait_for(&mut events, |e| {
        *e == PlayerEvent::StateChanged(PipelineState::Stop)
    });
    let states: Vec<_> = seen
        .into_iter()
        .filter_map(|e| match e {
            PlayerEvent::StateChanged(state) => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![PipelineState::Pause, PipelineState::Play, PipelineState::Stop]
    );
}

#[test]
fn deferred_target_holds_playback() {
    setup_test();

    let target = RenderTarget::deferred("fakesink").with_upload("identity");
    let player = Player::builder()
        .source(test_source(5))
        .sink(target.clone())
        .build()
        .unwrap();
    let mut events = player.subscribe();

    let pipeline = player.pipeline().unwrap();
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(current_state(&pipeline), gst::State::Null);
    assert_eq!(player.state(), PipelineState::Play);

    target.set_initialized(true);
    wait_for(&mut events, |e| *e == PlayerEvent::EndOfStream);
}

#[test]
fn source_change_replaces_the_pipeline() {
    setup_test();

    let player = Player::builder()
        .source(test_source(100))
        .sink(target())
        .state(PipelineState::Stop)
        .build()
        .unwrap();
    let mut events = player.subscribe();
    let first = player.pipeline().unwrap();

    player.set_source(test_source(50)).unwrap();
    let second = player.pipeline().unwrap();

    assert_ne!(first, second);
    assert!(second.name().starts_with("gstplayer-"));
    assert_eq!(current_state(&first), gst::State::Null);
    wait_for(&mut events, |e| {
        *e == PlayerEvent::SourceChanged(test_source(50))
    });

    player.set_source("").unwrap();
    assert!(player.pipeline().is_none());
}

#[test]
fn playbin_properties_follow_writes() {
    setup_test();

    let player = Player::builder()
        .source("file:///nonexistent/gstplayer-test.mp4")
        .sink(target())
        .state(PipelineState::Stop)
        .volume(0.5)
        .connection_speed(64)
        .build()
        .unwrap();
    let pipeline = player.pipeline().unwrap();

    assert_eq!(pipeline.factory().unwrap().name(), "playbin3");
    assert_eq!(pipeline.property::<f64>("volume"), 0.5);
    assert_eq!(pipeline.property::<u64>("connection-speed"), 64);

    player.set_volume(0.25);
    player.set_mute(true);
    player.set_connection_speed(128);
    assert_eq!(pipeline.property::<f64>("volume"), 0.25);
    assert!(pipeline.property::<bool>("mute"));
    assert_eq!(pipeline.property::<u64>("connection-speed"), 128);
}

#[test]
fn legacy_config_uses_playbin() {
    setup_test();

    let player = Player::builder()
        .config(PlayerConfig::legacy())
        .source("file:///nonexistent/gstplayer-test.mp4")
        .sink(target())
        .state(PipelineState::Stop)
        .build()
        .unwrap();

    let pipeline = player.pipeline().unwrap();
    assert_eq!(pipeline.factory().unwrap().name(), "playbin");
}

#[test]
fn dropping_the_player_stops_the_pipeline() {
    setup_test();

    let player = Player::builder()
        .source("gst-pipeline:videotestsrc is-live=true")
        .sink(target())
        .build()
        .unwrap();
    let pipeline = player.pipeline().unwrap();
    wait_state(&pipeline, gst::State::Playing);
    let clone = player.clone();

    drop(player);
    assert!(clone.pipeline().is_some());

    drop(clone);
    wait_state(&pipeline, gst::State::Null);
}

#[test]
fn upload_video_format_reaches_the_sink() {
    setup_test();

    let player = Player::builder()
        .source(test_source(3))
        .sink(target())
        .upload_video_format("RGBA")
        .state(PipelineState::Stop)
        .build()
        .unwrap();

    let pipeline = player.pipeline().unwrap();
    let sink_bin = pipeline
        .children()
        .into_iter()
        .find(|element| element.factory().is_some_and(|f| f.name() == "playersink"))
        .expect("playersink in pipeline");
    assert_eq!(
        sink_bin
            .property::<Option<String>>("upload-video-format")
            .as_deref(),
        Some("RGBA")
    );
}

#[test]
fn rapid_state_writes_settle_on_the_last() {
    setup_test();

    let player = Player::builder()
        .source("gst-pipeline:videotestsrc is-live=true")
        .sink(target())
        .state(PipelineState::Stop)
        .build()
        .unwrap();
    let pipeline = player.pipeline().unwrap();

    for _ in 0..20 {
        player.play();
        player.pause();
        player.stop();
    }
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(current_state(&pipeline), gst::State::Null);
    assert_eq!(player.state(), PipelineState::Stop);

    for _ in 0..20 {
        player.stop();
        player.play();
        player.pause();
    }
    wait_state(&pipeline, gst::State::Paused);
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(current_state(&pipeline), gst::State::Paused);
    assert_eq!(player.state(), PipelineState::Pause);
}

#[test]
fn variant_switches_are_relayed() {
    setup_test();

    let player = Player::builder()
        .source(test_source(1000))
        .sink(target())
        .state(PipelineState::Pause)
        .build()
        .unwrap();
    let pipeline = player.pipeline().unwrap();
    wait_state(&pipeline, gst::State::Paused);
    let mut events = player.subscribe();

    let bus = pipeline.bus().unwrap();
    bus.post(gst::message::Latency::builder().src(&pipeline).build())
        .unwrap();
    // Statistics without a bitrate are not a switch.
    let stats = gst::Structure::builder("adaptive-streaming-statistics")
        .field("uri", "http://localhost/low.m3u8")
        .build();
    bus.post(gst::message::Element::builder(stats).src(&pipeline).build())
        .unwrap();
    let stats = gst::Structure::builder("adaptive-streaming-statistics")
        .field("uri", "http://localhost/high.m3u8")
        .field("bitrate", 4_000_000u64)
        .build();
    bus.post(gst::message::Element::builder(stats).src(&pipeline).build())
        .unwrap();

    let seen = wait_for(&mut events, |e| {
        matches!(e, PlayerEvent::StreamVariantSwitched { .. })
    });
    assert_eq!(
        seen.last(),
        Some(&PlayerEvent::StreamVariantSwitched {
            uri: "http://localhost/high.m3u8".to_owned()
        })
    );
    assert!(!seen.iter().any(|e| matches!(e, PlayerEvent::Error { .. })));
    assert_eq!(current_state(&pipeline), gst::State::Paused);
}

#[test]
fn duration_and_seeking_follow_the_stream() {
    setup_test();

    let wav = WavFile::new();
    let player = Player::new(fast_config()).unwrap();
    let mut events = player.subscribe();
    player.set_sink(Some(target())).unwrap();
    player.set_source(wav.source()).unwrap();
    player.pause();
    player.complete().unwrap();
    let pipeline = player.pipeline().unwrap();
    wait_state(&pipeline, gst::State::Paused);

    pipeline
        .bus()
        .unwrap()
        .post(gst::message::DurationChanged::builder().src(&pipeline).build())
        .unwrap();
    let seen = wait_for(&mut events, |e| {
        matches!(e, PlayerEvent::DurationChanged(ms) if *ms > 0)
    });
    info!(?seen, "events");

    assert!(seen.contains(&PlayerEvent::SeekableChanged(true)));
    assert!(player.seekable());
    let duration = player.duration();
    assert!((2300..2350).contains(&duration), "{duration}");

    player.set_position(1000).unwrap();
    wait_for(&mut events, |e| *e == PlayerEvent::PositionChanged(1000));
    assert_eq!(player.position(), 1000);
}
