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

//! The serial adaptor: connection lifecycle and event forwarding.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::capability::{LinkEvent, SerialLink, SerialPortCapability};
use crate::error::AdaptorError;
use crate::events::{EventEmitter, EventKind, SerialEvent};
use crate::state::ConnectionState;

/// Handle around one Bluetooth serial connection.
///
/// Owns the underlying link exclusively and re-emits its `data`/`error`/
/// `close` events on its own [`EventEmitter`]. Listeners may be registered at
/// any time, including before [`open`](Self::open), so the `open` event is
/// observable by anyone subscribed up front.
pub struct SerialAdaptor {
    address: String,
    capability: Arc<dyn SerialPortCapability>,
    emitter: Arc<EventEmitter>,
    link: AsyncMutex<Option<Box<dyn SerialLink>>>,
    state: Arc<Mutex<ConnectionState>>,
}

impl SerialAdaptor {
    /// Create an adaptor for `address` using the injected capability.
    /// Performs no I/O.
    pub fn new(address: impl Into<String>, capability: Arc<dyn SerialPortCapability>) -> Arc<Self> {
        Arc::new(Self {
            address: address.into(),
            capability,
            emitter: Arc::new(EventEmitter::new()),
            link: AsyncMutex::new(None),
            state: Arc::new(Mutex::new(ConnectionState::Idle)),
        })
    }

    /// Address of the remote serial device.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn require(&self, expected: ConnectionState, operation: &'static str) -> Result<(), AdaptorError> {
        let state = *self.state.lock();
        if state == expected {
            Ok(())
        } else {
            Err(AdaptorError::InvalidState { operation, state })
        }
    }

    fn transition(
        &self,
        from: ConnectionState,
        to: ConnectionState,
        operation: &'static str,
    ) -> Result<(), AdaptorError> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(AdaptorError::InvalidState {
                operation,
                state: *state,
            });
        }
        *state = to;
        Ok(())
    }

    /// Resolve a channel for the address, connect, and start event forwarding.
    ///
    /// On success the adaptor is `Open`, the `open` event has been emitted,
    /// and underlying `data`/`error`/`close` events are re-emitted under the
    /// same names. Discovery and connect failures surface as
    /// [`AdaptorError::Discovery`] and [`AdaptorError::Connect`] and return
    /// the adaptor to `Idle`.
    pub async fn open(&self) -> Result<(), AdaptorError> {
        self.transition(ConnectionState::Idle, ConnectionState::Opening, "open")?;

        let channel = match self.capability.find_channel(&self.address).await {
            Ok(channel) => channel,
            Err(e) => {
                *self.state.lock() = ConnectionState::Idle;
                return Err(AdaptorError::Discovery {
                    address: self.address.clone(),
                    reason: e.to_string(),
                });
            }
        };
        info!("Opening {} on channel {}", self.address, channel);

        let mut link = match self.capability.connect(&self.address, channel).await {
            Ok(link) => link,
            Err(e) => {
                *self.state.lock() = ConnectionState::Idle;
                return Err(AdaptorError::Connect {
                    address: self.address.clone(),
                    channel,
                    reason: e.to_string(),
                });
            }
        };

        match link.take_events() {
            Some(events) => {
                self.spawn_forwarder(events);
            }
            None => warn!("Link for {} has no event stream; nothing to forward", self.address),
        }

        *self.link.lock().await = Some(link);
        *self.state.lock() = ConnectionState::Open;
        self.emitter.emit(&SerialEvent::Open);
        Ok(())
    }

    /// Fire-and-forget open, preserving the legacy contract: any failure is
    /// reported only to the tracing sink and the caller gets no completion
    /// signal. Prefer [`open`](Self::open) unless that behavior is required.
    pub fn open_detached(self: Arc<Self>) {
        tokio::spawn(async move {
            if let Err(e) = self.open().await {
                error!("Error opening {}: {}", self.address, e);
            }
        });
    }

    /// Write bytes to the link. `&str` input arrives as its UTF-8 encoding.
    /// Requires the `Open` state.
    pub async fn write(&self, data: impl AsRef<[u8]>) -> Result<(), AdaptorError> {
        self.require(ConnectionState::Open, "write")?;

        let mut guard = self.link.lock().await;
        let link = guard.as_mut().ok_or(AdaptorError::InvalidState {
            operation: "write",
            state: ConnectionState::Closed,
        })?;

        link.write(data.as_ref())
            .await
            .map_err(|e| AdaptorError::Write {
                reason: e.to_string(),
            })
    }

    /// Write without a completion signal: failures are logged, never raised.
    pub fn write_detached(self: Arc<Self>, data: impl Into<Vec<u8>>) {
        let data = data.into();
        tokio::spawn(async move {
            if let Err(e) = self.write(&data).await {
                error!("Write to {} failed: {}", self.address, e);
            }
        });
    }

    /// Register a listener for received data. Listeners fire in registration
    /// order, once per `data` event; there is no unsubscribe.
    pub fn on_read(&self, callback: impl Fn(&[u8]) + Send + Sync + 'static) {
        self.emitter.on(EventKind::Data, move |event| {
            if let SerialEvent::Data(bytes) = event {
                callback(bytes);
            }
        });
    }

    /// Register a listener for any event channel (`open`/`data`/`error`/`close`).
    pub fn on_event(&self, kind: EventKind, callback: impl Fn(&SerialEvent) + Send + Sync + 'static) {
        self.emitter.on(kind, callback);
    }

    /// Close the link, propagating its outcome. Requires the `Open` state;
    /// a second close is an [`AdaptorError::InvalidState`].
    pub async fn close(&self) -> Result<(), AdaptorError> {
        self.transition(ConnectionState::Open, ConnectionState::Closed, "close")?;

        let mut guard = self.link.lock().await;
        match guard.take() {
            Some(mut link) => link.close().await.map_err(|e| AdaptorError::Close {
                reason: e.to_string(),
            }),
            None => Err(AdaptorError::InvalidState {
                operation: "close",
                state: ConnectionState::Closed,
            }),
        }
    }

    fn spawn_forwarder(&self, mut events: tokio::sync::mpsc::Receiver<LinkEvent>) {
        let emitter = self.emitter.clone();
        let state = self.state.clone();
        let address = self.address.clone();

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    LinkEvent::Data(bytes) => {
                        debug!("Forwarding {} bytes from {}", bytes.len(), address);
                        emitter.emit(&SerialEvent::Data(bytes));
                    }
                    LinkEvent::Error(reason) => {
                        emitter.emit(&SerialEvent::Error(reason));
                    }
                    LinkEvent::Closed => {
                        *state.lock() = ConnectionState::Closed;
                        emitter.emit(&SerialEvent::Closed);
                        break;
                    }
                }
            }
            debug!("Event forwarding for {} stopped", address);
        });
    }
}
