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

//! Bluetooth serial capability seam.
//!
//! The adaptor never resolves its transport from ambient state; a capability
//! implementing these traits is injected at construction. The crate ships a
//! BlueZ-backed implementation ([`crate::bluez::BluezSerialPort`]) and a mock
//! for tests ([`crate::mock::MockSerialPort`]).

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Events produced by a live serial link.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// Bytes read from the link.
    Data(Vec<u8>),
    /// Transport error. The link usually closes afterwards.
    Error(String),
    /// The link is gone; no further events follow.
    Closed,
}

/// Discovery and connection for one class of serial transport.
#[async_trait]
pub trait SerialPortCapability: Send + Sync {
    /// Resolve the RFCOMM channel carrying the serial service of `address`.
    async fn find_channel(&self, address: &str) -> Result<u8>;

    /// Connect to `address` on `channel`, yielding an exclusively owned link.
    async fn connect(&self, address: &str, channel: u8) -> Result<Box<dyn SerialLink>>;
}

/// One live serial connection.
#[async_trait]
pub trait SerialLink: Send {
    /// Take the link's event stream. Yields `None` after the first call.
    fn take_events(&mut self) -> Option<mpsc::Receiver<LinkEvent>>;

    /// Write raw bytes to the link.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Close the link. The event stream ends with [`LinkEvent::Closed`].
    async fn close(&mut self) -> Result<()>;
}
