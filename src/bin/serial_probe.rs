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

//! Diagnostic probe for Bluetooth serial devices.
//!
//! Usage: cargo run --bin serial_probe -- <address> [message]

use anyhow::{bail, Result};
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use btserial_adaptor::bluez::BluezSerialPort;
use btserial_adaptor::{AdaptorConfig, ConnectionState, EventKind, SerialAdaptor, SerialEvent};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("btserial_adaptor=info".parse().unwrap()),
        )
        .init();

    let config = AdaptorConfig::load()?;

    let args: Vec<String> = env::args().collect();
    let address = match args.get(1) {
        Some(addr) => addr.clone(),
        None if !config.address.is_empty() => config.address.clone(),
        None => bail!("Usage: serial_probe <address> [message]"),
    };

    let mut capability = BluezSerialPort::new().await?;
    if let Some(channel) = config.channel {
        capability = capability.with_channel(channel);
    }

    let adaptor = SerialAdaptor::new(address, Arc::new(capability));

    adaptor.on_read(|bytes| {
        println!("<- {} bytes: {:02x?}", bytes.len(), bytes);
    });
    adaptor.on_event(EventKind::Error, |event| {
        if let SerialEvent::Error(reason) = event {
            eprintln!("Transport error: {}", reason);
        }
    });
    adaptor.on_event(EventKind::Closed, |_| {
        println!("Connection closed");
    });

    adaptor.open().await?;
    info!("Connected to {}", adaptor.address());

    let message = args.get(2).cloned().or(config.probe_message);
    if let Some(message) = message {
        println!("-> {}", message);
        adaptor.write(message.as_str()).await?;
    }

    println!("Listening. Press Ctrl-C to disconnect.");
    tokio::signal::ctrl_c().await?;

    if adaptor.state() == ConnectionState::Open {
        adaptor.close().await?;
    }
    info!("Disconnected");
    Ok(())
}
