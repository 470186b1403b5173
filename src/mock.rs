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

//! Mock serial capability for tests and development without hardware.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::capability::{LinkEvent, SerialLink, SerialPortCapability};

const EVENT_BUFFER: usize = 32;

#[derive(Default)]
struct MockShared {
    writes: Mutex<Vec<Vec<u8>>>,
    closed: Mutex<bool>,
    event_tx: Mutex<Option<mpsc::Sender<LinkEvent>>>,
}

/// Configurable fake Bluetooth serial capability.
///
/// Reports a fixed channel from discovery and records every write. Failure
/// points are opt-in via the builder methods. Obtain a [`MockHandle`] before
/// handing the capability to an adaptor to drive and inspect the link.
pub struct MockSerialPort {
    channel: u8,
    discovery_error: Option<String>,
    connect_error: Option<String>,
    write_error: Option<String>,
    shared: Arc<MockShared>,
}

impl MockSerialPort {
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            discovery_error: None,
            connect_error: None,
            write_error: None,
            shared: Arc::new(MockShared::default()),
        }
    }

    /// Make discovery fail with `reason`.
    #[must_use]
    pub fn fail_discovery(mut self, reason: impl Into<String>) -> Self {
        self.discovery_error = Some(reason.into());
        self
    }

    /// Make connect fail with `reason`.
    #[must_use]
    pub fn fail_connect(mut self, reason: impl Into<String>) -> Self {
        self.connect_error = Some(reason.into());
        self
    }

    /// Make every write fail with `reason`.
    #[must_use]
    pub fn fail_writes(mut self, reason: impl Into<String>) -> Self {
        self.write_error = Some(reason.into());
        self
    }

    /// Test-side control over the (future) link.
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            shared: self.shared.clone(),
        }
    }
}

#[async_trait]
impl SerialPortCapability for MockSerialPort {
    async fn find_channel(&self, _address: &str) -> Result<u8> {
        match &self.discovery_error {
            Some(reason) => Err(anyhow!("{}", reason)),
            None => Ok(self.channel),
        }
    }

    async fn connect(&self, _address: &str, _channel: u8) -> Result<Box<dyn SerialLink>> {
        if let Some(reason) = &self.connect_error {
            return Err(anyhow!("{}", reason));
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        *self.shared.event_tx.lock() = Some(event_tx);

        Ok(Box::new(MockLink {
            shared: self.shared.clone(),
            write_error: self.write_error.clone(),
            events: Some(event_rx),
        }))
    }
}

struct MockLink {
    shared: Arc<MockShared>,
    write_error: Option<String>,
    events: Option<mpsc::Receiver<LinkEvent>>,
}

#[async_trait]
impl SerialLink for MockLink {
    fn take_events(&mut self) -> Option<mpsc::Receiver<LinkEvent>> {
        self.events.take()
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if let Some(reason) = &self.write_error {
            return Err(anyhow!("{}", reason));
        }
        self.shared.writes.lock().push(data.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        *self.shared.closed.lock() = true;
        // Dropping the sender ends the event stream.
        self.shared.event_tx.lock().take();
        Ok(())
    }
}

/// Drives and inspects the link behind a [`MockSerialPort`].
#[derive(Clone)]
pub struct MockHandle {
    shared: Arc<MockShared>,
}

impl MockHandle {
    /// Inject a `data` event, as if the remote device sent bytes.
    pub async fn push_data(&self, data: impl Into<Vec<u8>>) {
        self.send(LinkEvent::Data(data.into())).await;
    }

    /// Inject a transport error event.
    pub async fn push_error(&self, reason: impl Into<String>) {
        self.send(LinkEvent::Error(reason.into())).await;
    }

    /// Inject a remote close.
    pub async fn push_closed(&self) {
        self.send(LinkEvent::Closed).await;
    }

    async fn send(&self, event: LinkEvent) {
        let tx = self.shared.event_tx.lock().clone();
        if let Some(tx) = tx {
            let _ = tx.send(event).await;
        }
    }

    /// Everything written to the link so far.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.shared.writes.lock().clone()
    }

    /// Whether the link's close was invoked.
    pub fn is_closed(&self) -> bool {
        *self.shared.closed.lock()
    }
}
