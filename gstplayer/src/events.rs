// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Change notifications.
//!
//! Every observable change of a [`crate::Player`] is sent as a
//! [`PlayerEvent`] to all subscribers. Events are produced on the player's
//! main loop thread or on the caller's thread and are received wherever the
//! [`PlayerEvents`] stream is polled.

use std::sync::Mutex;

use futures::channel::mpsc;

use crate::state::PipelineState;

/// Stream of events returned by [`crate::Player::subscribe`].
pub type PlayerEvents = mpsc::UnboundedReceiver<PlayerEvent>;

/// A change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The requested playback state changed.
    StateChanged(PipelineState),

    /// Position in milliseconds.
    PositionChanged(i64),

    /// Duration in milliseconds.
    DurationChanged(i64),

    SeekableChanged(bool),

    SourceChanged(String),

    VerboseChanged(bool),

    /// The stream reached its end.
    EndOfStream,

    /// An element posted an error on the bus.
    Error {
        message: String,
        debug: Option<String>,
    },

    /// An adaptive demuxer switched to another variant.
    StreamVariantSwitched { uri: String },
}

/// Fan-out of events to every live subscriber.
#[derive(Debug, Default)]
pub(crate) struct Notifier {
    senders: Mutex<Vec<mpsc::UnboundedSender<PlayerEvent>>>,
}

impl Notifier {
    pub fn subscribe(&self) -> PlayerEvents {
        let (tx, rx) = mpsc::unbounded();
        if let Ok(mut senders) = self.senders.lock() {
            senders.push(tx);
        }
        rx
    }

    /// Sends `event` to all subscribers and forgets the ones that hung up.
    pub fn emit(&self, event: PlayerEvent) {
        tracing::trace!(?event, "emit");
        if let Ok(mut senders) = self.senders.lock() {
            senders.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
        }
    }

    pub fn emit_all(&self, events: impl IntoIterator<Item = PlayerEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}
