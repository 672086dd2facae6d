// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

//! Render targets.
//!
//! A [`RenderTarget`] describes where the player sends decoded video: the
//! factory of the render sink, properties to set on it and the upload element
//! placed in front of it. A target can be created *deferred*, for a surface
//! that is not ready to draw yet; the player holds back state changes until
//! [`RenderTarget::set_initialized`] is called.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use gst::prelude::*;
use gstreamer as gst;
use tracing::debug;

use crate::config::PlayerConfig;
use crate::{Error, Result};

/// Upload element used when none is given.
pub const DEFAULT_UPLOAD: &str = "videoconvert";

/// Handle returned by [`RenderTarget::connect_initialized_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

type InitializedCallback = Arc<dyn Fn(bool) + Send + Sync>;

struct Inner {
    factory: String,
    upload: String,
    properties: Vec<(String, String)>,
    initialized: Mutex<bool>,
    watchers: Mutex<Vec<(WatchId, InitializedCallback)>>,
    next_watch: AtomicU64,
}

/// Caller-supplied video render target.
///
/// Cloning is cheap and clones share the initialized flag.
#[derive(Clone)]
pub struct RenderTarget {
    inner: Arc<Inner>,
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("factory", &self.inner.factory)
            .field("upload", &self.inner.upload)
            .field("properties", &self.inner.properties)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl PartialEq for RenderTarget {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl RenderTarget {
    /// A target rendering through `factory`, ready to draw.
    pub fn new(factory: impl Into<String>) -> Self {
        Self::with_state(factory.into(), true)
    }

    /// A target rendering through `factory` that is not ready to draw yet.
    pub fn deferred(factory: impl Into<String>) -> Self {
        Self::with_state(factory.into(), false)
    }

    fn with_state(factory: String, initialized: bool) -> Self {
        RenderTarget {
            inner: Arc::new(Inner {
                factory,
                upload: DEFAULT_UPLOAD.to_owned(),
                properties: Vec::new(),
                initialized: Mutex::new(initialized),
                watchers: Mutex::new(Vec::new()),
                next_watch: AtomicU64::new(1),
            }),
        }
    }

    /// Replaces the upload element factory. An empty name means none.
    ///
    /// Must be called before the target is shared.
    pub fn with_upload(self, upload: impl Into<String>) -> Self {
        self.map_inner(|inner| inner.upload = upload.into())
    }

    /// Adds a property set on the render sink with
    /// [`gst::prelude::ObjectExt::set_property_from_str`].
    pub fn with_property(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map_inner(|inner| inner.properties.push((name.into(), value.into())))
    }

    fn map_inner(self, f: impl FnOnce(&mut Inner)) -> Self {
        match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                f(&mut inner);
                RenderTarget {
                    inner: Arc::new(inner),
                }
            }
            Err(shared) => {
                let mut inner = Inner {
                    factory: shared.factory.clone(),
                    upload: shared.upload.clone(),
                    properties: shared.properties.clone(),
                    initialized: Mutex::new(
                        shared.initialized.lock().map(|i| *i).unwrap_or(false),
                    ),
                    watchers: Mutex::new(Vec::new()),
                    next_watch: AtomicU64::new(1),
                };
                f(&mut inner);
                RenderTarget {
                    inner: Arc::new(inner),
                }
            }
        }
    }

    pub fn factory(&self) -> &str {
        &self.inner.factory
    }

    pub fn upload(&self) -> &str {
        &self.inner.upload
    }

    pub fn properties(&self) -> &[(String, String)] {
        &self.inner.properties
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.lock().map(|i| *i).unwrap_or(false)
    }

    /// Marks the target as ready (or not) to draw and notifies watchers when
    /// the value changes.
    pub fn set_initialized(&self, initialized: bool) {
        let changed = match self.inner.initialized.lock() {
            Ok(mut current) => std::mem::replace(&mut *current, initialized) != initialized,
            Err(_) => false,
        };
        if !changed {
            return;
        }

        debug!(factory = %self.inner.factory, initialized, "render target initialization changed");

        // Callbacks may call back into the target.
        let callbacks: Vec<InitializedCallback> = match self.inner.watchers.lock() {
            Ok(watchers) => watchers.iter().map(|(_, cb)| cb.clone()).collect(),
            Err(_) => return,
        };
        for callback in callbacks {
            callback(initialized);
        }
    }

    /// Calls `f` with the new value whenever the initialized flag changes.
    pub fn connect_initialized_changed<F>(&self, f: F) -> WatchId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = WatchId(self.inner.next_watch.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut watchers) = self.inner.watchers.lock() {
            watchers.push((id, Arc::new(f)));
        }
        id
    }

    pub fn disconnect(&self, id: WatchId) {
        if let Ok(mut watchers) = self.inner.watchers.lock() {
            watchers.retain(|(watch, _)| *watch != id);
        }
    }

    /// Creates the render sink element and applies the user properties and
    /// the sink tuning from `config`.
    pub(crate) fn make_element(&self, config: &PlayerConfig) -> Result<gst::Element> {
        let sink = gst::ElementFactory::make(&self.inner.factory)
            .build()
            .map_err(|_| Error::MissingElement(self.inner.factory.clone()))?;

        for (name, value) in &self.inner.properties {
            if sink.find_property(name).is_none() {
                return Err(Error::Other(format!(
                    "Render sink '{}' has no property '{}'",
                    self.inner.factory, name
                )));
            }
            sink.set_property_from_str(name, value);
        }

        if sink.find_property("sync").is_some() {
            sink.set_property("sync", config.sync);
        }
        if let Some(deadline) = config.processing_deadline_ms {
            if sink.find_property("processing-deadline").is_some() {
                let nanos = deadline.checked_mul(1_000_000).ok_or_else(|| {
                    Error::Other(format!("processing-deadline-ms {deadline} is out of range"))
                })?;
                sink.set_property("processing-deadline", nanos);
            }
        }
        if let Some(lateness) = config.max_lateness_ms {
            if sink.find_property("max-lateness").is_some() {
                // -1 means unlimited.
                let nanos = match lateness {
                    -1 => Some(-1),
                    0.. => lateness.checked_mul(1_000_000),
                    _ => None,
                }
                .ok_or_else(|| Error::Other(format!("max-lateness-ms {lateness} is out of range")))?;
                sink.set_property("max-lateness", nanos);
            }
        }

        Ok(sink)
    }
}
