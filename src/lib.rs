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

//! Bluetooth serial adaptor.
//!
//! Wraps one RFCOMM/SPP connection behind an event-emitting handle: resolve a
//! channel for a device address, connect, forward the link's `data`/`error`/
//! `close` events, write, close. The Bluetooth capability is injected at
//! construction, so hosts can swap the BlueZ backend for the bundled mock.

pub mod adaptor;
pub mod bluez;
pub mod capability;
pub mod config;
pub mod error;
pub mod events;
pub mod mock;
pub mod state;

pub use adaptor::SerialAdaptor;
pub use capability::{LinkEvent, SerialLink, SerialPortCapability};
pub use config::AdaptorConfig;
pub use error::AdaptorError;
pub use events::{EventEmitter, EventKind, SerialEvent};
pub use state::ConnectionState;
