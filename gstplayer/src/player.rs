// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Player controller.
//!
//! This module provides [`Player`], which owns a playback pipeline, mirrors
//! its state into plain Rust values and reports every change as a
//! [`PlayerEvent`]. Each player runs a private GLib main loop on its own
//! thread; the bus watch and the position timer are dispatched there.
//!
//! Writes are accepted at any time. Until [`Player::complete`] is called they
//! are only stored, afterwards changing the source or the sink rebuilds the
//! pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::JoinHandle;

use gst::prelude::*;
use gstreamer as gst;
use tracing::{debug, error, info, warn};

use crate::config::PlayerConfig;
use crate::events::{Notifier, PlayerEvent, PlayerEvents};
use crate::graph;
use crate::render::{RenderTarget, WatchId};
use crate::state::{PipelineState, Settings, Status};
use crate::{Error, Result};

/// File name (without extension) of the graph dump written on pause.
pub const PAUSED_DOT_NAME: &str = "gstplayer-paused";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_msecs(time: gst::ClockTime) -> i64 {
    i64::try_from(time.mseconds()).unwrap_or(i64::MAX)
}

/// Pipeline and the sources attached to the player's main context.
#[derive(Default)]
struct Engine {
    pipeline: Option<gst::Pipeline>,
    bus_watch: Option<glib::Source>,
    timer: Option<glib::Source>,
}

struct Inner {
    config: PlayerConfig,
    context: glib::MainContext,
    main_loop: glib::MainLoop,
    thread: Mutex<Option<JoinHandle<()>>>,
    ready: AtomicBool,
    /// Serializes teardown and construction of pipelines.
    rebuild: Mutex<()>,
    sink: Mutex<Option<(RenderTarget, WatchId)>>,
    settings: Mutex<Settings>,
    engine: Mutex<Engine>,
    status: Mutex<Status>,
    notifier: Notifier,
}

/// Playback controller.
///
/// Cloning is cheap; all clones control the same pipeline. Dropping the last
/// clone stops the pipeline and the main loop thread.
///
/// # Examples
///
/// ```no_run
/// use futures::StreamExt;
/// use gstplayer::{Player, PlayerEvent, RenderTarget};
///
/// # fn main() -> Result<(), gstplayer::Error> {
/// let player = Player::builder()
///     .source("https://example.com/stream.m3u8")
///     .sink(RenderTarget::new("autovideosink"))
///     .build()?;
///
/// let mut events = player.subscribe();
/// futures::executor::block_on(async {
///     while let Some(event) = events.next().await {
///         if event == PlayerEvent::EndOfStream {
///             break;
///         }
///     }
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Player {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("settings", &*lock(&self.inner.settings))
            .field("status", &*lock(&self.inner.status))
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl Player {
    /// Creates a player that stores writes until [`Player::complete`].
    ///
    /// Initializes GStreamer if needed and starts the main loop thread.
    pub fn new(config: PlayerConfig) -> Result<Self> {
        crate::init()?;

        let context = glib::MainContext::new();
        let main_loop = glib::MainLoop::new(Some(&context), false);

        let thread = std::thread::Builder::new()
            .name("gstplayer-loop".to_owned())
            .spawn({
                let context = context.clone();
                let main_loop = main_loop.clone();
                move || {
                    if let Err(err) = context.with_thread_default(|| main_loop.run()) {
                        error!(%err, "failed to acquire the player main context");
                    }
                }
            })
            .map_err(Error::MainLoop)?;

        let settings = Settings::new(config.connection_speed);
        Ok(Player {
            inner: Arc::new(Inner {
                config,
                context,
                main_loop,
                thread: Mutex::new(Some(thread)),
                ready: AtomicBool::new(false),
                rebuild: Mutex::new(()),
                sink: Mutex::new(None),
                settings: Mutex::new(settings),
                engine: Mutex::new(Engine::default()),
                status: Mutex::new(Status::default()),
                notifier: Notifier::default(),
            }),
        })
    }

    pub fn builder() -> PlayerBuilder {
        PlayerBuilder::default()
    }

    /// Marks the player ready and builds the first pipeline.
    pub fn complete(&self) -> Result<()> {
        self.inner.ready.store(true, Ordering::SeqCst);
        self.inner.update_pipeline()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.inner.config
    }

    /// Returns a stream receiving every subsequent change.
    pub fn subscribe(&self) -> PlayerEvents {
        self.inner.notifier.subscribe()
    }

    /// The current pipeline, if one is built.
    pub fn pipeline(&self) -> Option<gst::Pipeline> {
        lock(&self.inner.engine).pipeline.clone()
    }

    pub fn source(&self) -> String {
        lock(&self.inner.settings).source.clone()
    }

    /// Sets the URI or `gst-pipeline:` description and rebuilds.
    pub fn set_source(&self, source: impl Into<String>) -> Result<()> {
        let source = source.into();
        let changed = {
            let mut settings = lock(&self.inner.settings);
            if settings.source != source {
                settings.source = source.clone();
                true
            } else {
                false
            }
        };
        if changed {
            self.inner
                .notifier
                .emit(PlayerEvent::SourceChanged(source));
        }
        self.inner.update_pipeline()
    }

    pub fn sink(&self) -> Option<RenderTarget> {
        lock(&self.inner.sink).as_ref().map(|(target, _)| target.clone())
    }

    /// Routes video into `target` and rebuilds.
    ///
    /// State writes are held back while the target is not initialized and
    /// re-applied once it is.
    pub fn set_sink(&self, target: Option<RenderTarget>) -> Result<()> {
        let watched = target.map(|target| {
            let weak = Arc::downgrade(&self.inner);
            let id = target.connect_initialized_changed(move |initialized| {
                if !initialized {
                    return;
                }
                if let Some(inner) = weak.upgrade() {
                    let state = lock(&inner.settings).state;
                    debug!(%state, "render target initialized, re-applying state");
                    inner.set_state(state);
                }
            });
            (target, id)
        });

        let previous = std::mem::replace(&mut *lock(&self.inner.sink), watched);
        if let Some((target, id)) = previous {
            target.disconnect(id);
        }

        self.inner.update_pipeline()
    }

    pub fn state(&self) -> PipelineState {
        lock(&self.inner.settings).state
    }

    pub fn set_state(&self, state: PipelineState) {
        self.inner.set_state(state);
    }

    pub fn play(&self) {
        self.set_state(PipelineState::Play);
    }

    pub fn pause(&self) {
        self.set_state(PipelineState::Pause);
    }

    pub fn stop(&self) {
        self.set_state(PipelineState::Stop);
    }

    /// Last observed position in milliseconds.
    pub fn position(&self) -> i64 {
        lock(&self.inner.status).position
    }

    /// Seeks to `position` milliseconds. Negative values seek to the start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSeekable`] until the stream reported that it is
    /// seekable, and [`Error::Gst`] when the seek is refused.
    pub fn set_position(&self, position: i64) -> Result<()> {
        self.inner.set_position(position)
    }

    /// Seeks `offset` milliseconds relative to the current position.
    pub fn seek(&self, offset: i64) -> Result<()> {
        if !self.seekable() {
            info!("seeking is not available in this stream");
            return Err(Error::NotSeekable);
        }
        self.inner.query_position();
        let position = self.position().saturating_add(offset);
        self.inner.set_position(position)
    }

    /// Refreshes the position from the pipeline.
    pub fn query_position(&self) {
        self.inner.query_position();
    }

    /// Last observed duration in milliseconds.
    pub fn duration(&self) -> i64 {
        lock(&self.inner.status).duration
    }

    pub fn seekable(&self) -> bool {
        lock(&self.inner.status).seekable
    }

    pub fn verbose(&self) -> bool {
        lock(&self.inner.settings).verbose
    }

    /// Logs every property change inside the pipeline from the next rebuild on.
    pub fn set_verbose(&self, verbose: bool) {
        let changed = {
            let mut settings = lock(&self.inner.settings);
            std::mem::replace(&mut settings.verbose, verbose) != verbose
        };
        if changed {
            self.inner
                .notifier
                .emit(PlayerEvent::VerboseChanged(verbose));
        }
    }

    pub fn audio(&self) -> bool {
        lock(&self.inner.settings).audio
    }

    /// Enables audio output from the next rebuild on.
    pub fn set_audio(&self, audio: bool) {
        lock(&self.inner.settings).audio = audio;
    }

    pub fn volume(&self) -> f64 {
        lock(&self.inner.settings).volume
    }

    pub fn set_volume(&self, volume: f64) {
        debug!("volume set to {:.1} %", volume * 100.0);
        lock(&self.inner.settings).volume = volume;
        self.inner.apply_to_playbin("volume", volume);
    }

    pub fn mute(&self) -> bool {
        lock(&self.inner.settings).mute
    }

    pub fn set_mute(&self, mute: bool) {
        debug!("audio {}", if mute { "muted" } else { "unmuted" });
        lock(&self.inner.settings).mute = mute;
        self.inner.apply_to_playbin("mute", mute);
    }

    pub fn looping(&self) -> bool {
        lock(&self.inner.settings).looping
    }

    /// Restarts playback at end of stream instead of stopping.
    pub fn set_looping(&self, looping: bool) {
        lock(&self.inner.settings).looping = looping;
    }

    pub fn upload_video_format(&self) -> Option<String> {
        lock(&self.inner.settings).upload_video_format.clone()
    }

    /// Forces a raw video format in front of the upload element from the
    /// next rebuild on. `None` or an empty string removes the constraint.
    pub fn set_upload_video_format(&self, format: Option<&str>) {
        lock(&self.inner.settings).upload_video_format = format
            .filter(|format| !format.is_empty())
            .map(str::to_owned);
    }

    /// Network bandwidth hint in kbps.
    pub fn connection_speed(&self) -> u64 {
        lock(&self.inner.settings).connection_speed
    }

    pub fn set_connection_speed(&self, speed: u64) {
        lock(&self.inner.settings).connection_speed = speed;
        self.inner.apply_to_playbin("connection-speed", speed);
    }
}

impl Inner {
    fn target_initialized(&self) -> bool {
        lock(&self.sink)
            .as_ref()
            .is_some_and(|(target, _)| target.is_initialized())
    }

    fn target(&self) -> Option<RenderTarget> {
        lock(&self.sink).as_ref().map(|(target, _)| target.clone())
    }

    fn is_current(&self, pipeline: &gst::Pipeline) -> bool {
        lock(&self.engine).pipeline.as_ref() == Some(pipeline)
    }

    fn set_state(self: &Arc<Self>, state: PipelineState) {
        let initialized = self.target_initialized();

        let changed = {
            let mut settings = lock(&self.settings);
            let mut engine = lock(&self.engine);

            if let Some(pipeline) = engine.pipeline.clone() {
                let (_, current, pending) = pipeline.state(gst::ClockTime::ZERO);
                let playing = if pending == gst::State::VoidPending {
                    current == gst::State::Playing
                } else {
                    pending == gst::State::Playing
                };
                if playing && state == PipelineState::Play {
                    return;
                }

                if initialized {
                    match state {
                        PipelineState::Play => self.start_timer(&mut engine),
                        PipelineState::Pause => {
                            pipeline.debug_to_dot_file(gst::DebugGraphDetails::ALL, PAUSED_DOT_NAME);
                            Self::stop_timer(&mut engine);
                        }
                        PipelineState::Stop => Self::stop_timer(&mut engine),
                    }
                    self.request_state(&pipeline, state);
                } else {
                    debug!(%state, "render target not initialized, holding state");
                }
            }

            std::mem::replace(&mut settings.state, state) != state
        };

        if changed {
            self.notifier.emit(PlayerEvent::StateChanged(state));
        }
    }

    /// Changes the pipeline state from a GStreamer worker thread.
    ///
    /// Workers may run in any order, so each one applies the state stored
    /// when it runs rather than the one it was queued for.
    fn request_state(self: &Arc<Self>, pipeline: &gst::Pipeline, requested: PipelineState) {
        debug!(pipeline = %pipeline.name(), %requested, "requesting state");
        let weak = Arc::downgrade(self);
        pipeline.call_async(move |pipeline| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !inner.target_initialized() {
                return;
            }
            // Both locks stay held until the change is issued: a later
            // write cannot be overtaken, and a rebuild cannot revive a
            // pipeline it already shut down.
            let settings = lock(&inner.settings);
            let engine = lock(&inner.engine);
            if engine.pipeline.as_ref() != Some(pipeline) {
                return;
            }
            let target = settings.state.target();
            if let Err(err) = pipeline.set_state(target) {
                warn!(pipeline = %pipeline.name(), ?target, %err, "state change failed");
            }
        });
    }

    fn start_timer(self: &Arc<Self>, engine: &mut Engine) {
        if engine.timer.is_some() {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(self);
        let timer = glib::timeout_source_new(
            self.config.position_interval(),
            Some("gstplayer-position"),
            glib::Priority::DEFAULT,
            move || match weak.upgrade() {
                Some(inner) => {
                    inner.query_position();
                    glib::ControlFlow::Continue
                }
                None => glib::ControlFlow::Break,
            },
        );
        timer.attach(Some(&self.context));
        engine.timer = Some(timer);
    }

    fn stop_timer(engine: &mut Engine) {
        if let Some(timer) = engine.timer.take() {
            timer.destroy();
        }
    }

    fn update_position(&self, position: i64) {
        let changed = {
            let mut status = lock(&self.status);
            std::mem::replace(&mut status.position, position) != position
        };
        if changed {
            self.notifier.emit(PlayerEvent::PositionChanged(position));
        }
    }

    fn query_position(&self) {
        let pipeline = lock(&self.engine).pipeline.clone();
        let position = match pipeline {
            Some(pipeline) => match pipeline.query_position::<gst::ClockTime>() {
                Some(position) => to_msecs(position),
                None => return,
            },
            None => 0,
        };
        self.update_position(position);
    }

    fn set_position(&self, position: i64) -> Result<()> {
        if !lock(&self.status).seekable {
            info!("setting position is not available in this stream");
            return Err(Error::NotSeekable);
        }

        let mut position = position.clamp(0, to_msecs(gst::ClockTime::MAX));
        debug!(position, "set position");

        let pipeline = lock(&self.engine).pipeline.clone();
        match pipeline {
            Some(pipeline) => {
                let target = gst::ClockTime::from_mseconds(position.unsigned_abs());
                pipeline.seek_simple(gst::SeekFlags::FLUSH, target)?;
            }
            None => position = 0,
        }

        self.update_position(position);
        Ok(())
    }

    fn query_duration(&self) {
        let pipeline = lock(&self.engine).pipeline.clone();
        let mut events = Vec::new();

        let duration = match pipeline {
            Some(pipeline) => {
                let (_, current, _) = pipeline.state(gst::ClockTime::ZERO);
                if !matches!(current, gst::State::Paused | gst::State::Playing) {
                    return;
                }
                let Some(duration) = pipeline.query_duration::<gst::ClockTime>() else {
                    return;
                };
                let duration = to_msecs(duration);

                if duration > 0 {
                    let mut query = gst::query::Seeking::new(gst::Format::Time);
                    if pipeline.query(&mut query) {
                        let (seekable, _, _) = query.result();
                        let mut status = lock(&self.status);
                        if std::mem::replace(&mut status.seekable, seekable) != seekable {
                            events.push(PlayerEvent::SeekableChanged(seekable));
                        }
                    }
                }
                duration
            }
            None => 0,
        };

        {
            let mut status = lock(&self.status);
            if status.duration != duration {
                status.duration = duration;
                status.duration_dirty = false;
                debug!(duration, "duration changed");
                events.push(PlayerEvent::DurationChanged(duration));
            }
        }

        self.notifier.emit_all(events);
    }

    /// Sets a property on the playbin, if the pipeline is one.
    fn apply_to_playbin(&self, name: &str, value: impl Into<glib::Value>) {
        let Some(pipeline) = lock(&self.engine).pipeline.clone() else {
            return;
        };
        if pipeline.find_property(name).is_some() {
            pipeline.set_property(name, value);
        }
    }

    /// Stops and drops the current pipeline.
    fn teardown(&self) {
        let (pipeline, bus_watch, timer) = {
            let mut engine = lock(&self.engine);
            (
                engine.pipeline.take(),
                engine.bus_watch.take(),
                engine.timer.take(),
            )
        };

        if let Some(timer) = timer {
            timer.destroy();
        }
        if let Some(bus_watch) = bus_watch {
            bus_watch.destroy();
        }
        if let Some(pipeline) = pipeline {
            if let Err(err) = pipeline.set_state(gst::State::Null) {
                warn!(pipeline = %pipeline.name(), %err, "failed to stop pipeline");
            }
            debug!(pipeline = %pipeline.name(), "pipeline torn down");
        }
    }

    fn reset_status(&self) {
        let previous = std::mem::take(&mut *lock(&self.status));

        let mut events = Vec::new();
        if previous.position != 0 {
            events.push(PlayerEvent::PositionChanged(0));
        }
        if previous.duration != 0 {
            events.push(PlayerEvent::DurationChanged(0));
        }
        if previous.seekable {
            events.push(PlayerEvent::SeekableChanged(false));
        }
        self.notifier.emit_all(events);
    }

    /// Replaces the pipeline with one built from the current settings.
    fn update_pipeline(self: &Arc<Self>) -> Result<()> {
        if !self.ready.load(Ordering::SeqCst) {
            return Ok(());
        }

        let _rebuild = lock(&self.rebuild);

        self.teardown();
        self.reset_status();

        let settings = lock(&self.settings).clone();
        let Some(target) = self.target() else {
            debug!("no render target, not building a pipeline");
            return Ok(());
        };
        if settings.source.is_empty() {
            debug!("no source, not building a pipeline");
            return Ok(());
        }

        let pipeline = graph::build_pipeline(&self.config, &settings, &target)?;
        let bus_watch = self.watch_bus(&pipeline)?;

        if settings.verbose {
            pipeline.connect_deep_notify(None, |_, object, pspec| {
                if !pspec.flags().contains(glib::ParamFlags::READABLE) {
                    return;
                }
                let value = object.property_value(pspec.name());
                info!(
                    object = %object.path_string(),
                    property = pspec.name(),
                    ?value,
                    "property changed"
                );
            });
        }

        info!(pipeline = %pipeline.name(), source = %settings.source, "pipeline ready");
        {
            let mut engine = lock(&self.engine);
            engine.pipeline = Some(pipeline);
            engine.bus_watch = Some(bus_watch);
        }

        self.set_state(settings.state);
        Ok(())
    }

    fn watch_bus(self: &Arc<Self>, pipeline: &gst::Pipeline) -> Result<glib::Source> {
        let bus = pipeline
            .bus()
            .ok_or_else(|| Error::Other("Pipeline has no bus".to_owned()))?;

        let weak = Arc::downgrade(self);
        let weak_pipeline = pipeline.downgrade();
        let source = bus.create_watch(
            Some("gstplayer-bus"),
            glib::Priority::DEFAULT,
            move |_, msg| {
                let (Some(inner), Some(pipeline)) = (weak.upgrade(), weak_pipeline.upgrade())
                else {
                    return glib::ControlFlow::Break;
                };
                if !inner.is_current(&pipeline) {
                    return glib::ControlFlow::Break;
                }
                inner.handle_message(&pipeline, msg);
                glib::ControlFlow::Continue
            },
        );
        source.attach(Some(&self.context));
        Ok(source)
    }

    fn handle_message(self: &Arc<Self>, pipeline: &gst::Pipeline, msg: &gst::Message) {
        use gst::MessageView;

        match msg.view() {
            MessageView::Eos(..) => {
                let (source, stopped) = {
                    let mut settings = lock(&self.settings);
                    let stopped = !settings.looping
                        && std::mem::replace(&mut settings.state, PipelineState::Stop)
                            != PipelineState::Stop;
                    (settings.source.clone(), stopped)
                };
                info!(%source, "end of stream");

                if stopped {
                    self.notifier
                        .emit(PlayerEvent::StateChanged(PipelineState::Stop));
                }
                self.notifier.emit(PlayerEvent::EndOfStream);

                if let Err(err) = self.update_pipeline() {
                    error!(%err, "failed to rebuild pipeline after end of stream");
                    self.notifier.emit(PlayerEvent::Error {
                        message: err.to_string(),
                        debug: None,
                    });
                }
            }
            MessageView::DurationChanged(..) => {
                lock(&self.status).duration_dirty = true;
                self.query_duration();
            }
            MessageView::AsyncDone(..) => {
                if lock(&self.status).duration_dirty {
                    self.query_duration();
                }
            }
            MessageView::Latency(..) => {
                if let Err(err) = pipeline.recalculate_latency() {
                    warn!(%err, "failed to recalculate latency");
                }
            }
            MessageView::Error(err) => {
                let message = err.error().to_string();
                let debug_info = err.debug().map(|debug| debug.to_string());
                error!(
                    src = ?msg.src().map(|src| src.path_string()),
                    %message,
                    debug = debug_info.as_deref().unwrap_or(""),
                    "pipeline error"
                );
                self.notifier.emit(PlayerEvent::Error {
                    message,
                    debug: debug_info,
                });
            }
            MessageView::Element(element) => {
                let Some(structure) = element.structure() else {
                    return;
                };
                if structure.has_name("adaptive-streaming-statistics")
                    && structure.has_field("bitrate")
                {
                    if let Ok(uri) = structure.get::<&str>("uri") {
                        debug!(%uri, "switch source uri");
                        self.notifier.emit(PlayerEvent::StreamVariantSwitched {
                            uri: uri.to_owned(),
                        });
                    }
                }
            }
            _ => (),
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some((target, id)) = lock(&self.sink).take() {
            target.disconnect(id);
        }

        self.teardown();

        let main_loop = self.main_loop.clone();
        self.context.invoke(move || main_loop.quit());

        if let Some(thread) = lock(&self.thread).take() {
            // The last reference may go away inside a main loop callback.
            if thread.thread().id() != std::thread::current().id() && thread.join().is_err() {
                error!("player main loop thread panicked");
            }
        }
    }
}

/// Builder for a [`Player`] with initial values.
///
/// [`PlayerBuilder::build`] completes the player, so the pipeline is built
/// with all values in place.
#[derive(Debug, Default)]
#[must_use]
pub struct PlayerBuilder {
    config: PlayerConfig,
    source: Option<String>,
    sink: Option<RenderTarget>,
    state: Option<PipelineState>,
    verbose: bool,
    audio: Option<bool>,
    volume: Option<f64>,
    mute: bool,
    looping: bool,
    upload_video_format: Option<String>,
    connection_speed: Option<u64>,
}

impl PlayerBuilder {
    pub fn config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn sink(mut self, sink: RenderTarget) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn state(mut self, state: PipelineState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn audio(mut self, audio: bool) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn mute(mut self, mute: bool) -> Self {
        self.mute = mute;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn upload_video_format(mut self, format: impl Into<String>) -> Self {
        self.upload_video_format = Some(format.into());
        self
    }

    pub fn connection_speed(mut self, speed: u64) -> Self {
        self.connection_speed = Some(speed);
        self
    }

    /// Creates the player, applies the values and completes it.
    pub fn build(self) -> Result<Player> {
        let player = Player::new(self.config)?;

        {
            let mut settings = lock(&player.inner.settings);
            if let Some(source) = self.source {
                settings.source = source;
            }
            if let Some(state) = self.state {
                settings.state = state;
            }
            if let Some(audio) = self.audio {
                settings.audio = audio;
            }
            if let Some(volume) = self.volume {
                settings.volume = volume;
            }
            if let Some(speed) = self.connection_speed {
                settings.connection_speed = speed;
            }
            settings.verbose = self.verbose;
            settings.mute = self.mute;
            settings.looping = self.looping;
            settings.upload_video_format = self.upload_video_format.filter(|f| !f.is_empty());
        }
        // Not ready yet, so this only stores the target.
        player.set_sink(self.sink)?;

        player.complete()?;
        Ok(player)
    }
}
