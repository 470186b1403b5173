// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Composed publish/subscribe event emitter.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Events emitted by a serial adaptor.
#[derive(Debug, Clone)]
pub enum SerialEvent {
    /// Connection established.
    Open,
    /// Bytes received from the remote device.
    Data(Vec<u8>),
    /// Transport-level error reported by the link.
    Error(String),
    /// Connection closed.
    Closed,
}

impl SerialEvent {
    /// The subscription channel this event is delivered on.
    pub fn kind(&self) -> EventKind {
        match self {
            SerialEvent::Open => EventKind::Open,
            SerialEvent::Data(_) => EventKind::Data,
            SerialEvent::Error(_) => EventKind::Error,
            SerialEvent::Closed => EventKind::Closed,
        }
    }
}

/// Named subscription channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Data,
    Error,
    Closed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Open => "open",
            EventKind::Data => "data",
            EventKind::Error => "error",
            EventKind::Closed => "close",
        }
    }
}

type Listener = Arc<dyn Fn(&SerialEvent) + Send + Sync>;

/// Listener registry with synchronous, ordered dispatch.
///
/// Listeners registered for a channel are invoked in registration order, once
/// per emitted event of that kind. There is no unsubscribe: a registration
/// lives as long as the emitter.
#[derive(Default)]
pub struct EventEmitter {
    listeners: Mutex<HashMap<EventKind, Vec<Listener>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `kind`.
    pub fn on(&self, kind: EventKind, listener: impl Fn(&SerialEvent) + Send + Sync + 'static) {
        self.listeners
            .lock()
            .entry(kind)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Deliver `event` to every listener of its kind, in registration order.
    pub fn emit(&self, event: &SerialEvent) {
        // Snapshot so a listener may register further listeners.
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .get(&event.kind())
            .map(|v| v.to_vec())
            .unwrap_or_default();

        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, Vec::len)
    }
}
