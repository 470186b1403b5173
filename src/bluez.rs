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

//! BlueZ-backed serial port capability (RFCOMM/SPP client).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bluer::rfcomm::stream::{OwnedReadHalf, OwnedWriteHalf};
use bluer::rfcomm::{SocketAddr, Stream};
use bluer::{Adapter, Address};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::capability::{LinkEvent, SerialLink, SerialPortCapability};

/// Standard SPP UUID.
const SPP_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// Conventional RFCOMM channel for SPP services.
const DEFAULT_SPP_CHANNEL: u8 = 1;

const READ_BUF_SIZE: usize = 1024;
const EVENT_BUFFER: usize = 32;

/// Bluetooth serial capability over BlueZ.
pub struct BluezSerialPort {
    adapter: Adapter,
    preferred_channel: Option<u8>,
}

impl BluezSerialPort {
    /// Create the capability on the default Bluetooth adapter.
    pub async fn new() -> Result<Self> {
        info!("Initializing Bluetooth serial capability...");

        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;
        info!("Using Bluetooth adapter: {}", adapter.name());

        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }

        Ok(Self {
            adapter,
            preferred_channel: None,
        })
    }

    /// Use a fixed RFCOMM channel instead of the SPP default.
    #[must_use]
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.preferred_channel = Some(channel);
        self
    }
}

#[async_trait]
impl SerialPortCapability for BluezSerialPort {
    async fn find_channel(&self, address: &str) -> Result<u8> {
        let addr: Address = address
            .parse()
            .with_context(|| format!("invalid Bluetooth address: {}", address))?;
        let device = self.adapter.device(addr)?;

        // Note: bluer does not expose a per-service SDP channel query. SPP
        // devices publish on channel 1 by convention; a configured channel
        // overrides it. We still require the device to advertise the SPP UUID
        // so a missing serial service fails discovery instead of connect.
        let uuids = device.uuids().await?.unwrap_or_default();
        if !uuids.contains(&SPP_UUID) {
            return Err(anyhow!(
                "device {} does not advertise a serial port service",
                address
            ));
        }

        let channel = self.preferred_channel.unwrap_or(DEFAULT_SPP_CHANNEL);
        debug!("Resolved {} to RFCOMM channel {}", address, channel);
        Ok(channel)
    }

    async fn connect(&self, address: &str, channel: u8) -> Result<Box<dyn SerialLink>> {
        let addr: Address = address
            .parse()
            .with_context(|| format!("invalid Bluetooth address: {}", address))?;

        let stream = Stream::connect(SocketAddr::new(addr, channel))
            .await
            .with_context(|| format!("RFCOMM connect to {} channel {}", address, channel))?;
        info!("Connected to {} on channel {}", address, channel);

        let (reader, writer) = stream.into_split();
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(read_loop(reader, event_tx));

        Ok(Box::new(BluezLink {
            writer,
            events: Some(event_rx),
        }))
    }
}

/// Pump raw bytes from the socket into the link's event stream.
async fn read_loop(mut reader: OwnedReadHalf, event_tx: mpsc::Sender<LinkEvent>) {
    let mut buf = [0u8; READ_BUF_SIZE];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                info!("Connection closed by remote");
                let _ = event_tx.send(LinkEvent::Closed).await;
                break;
            }
            Ok(n) => {
                debug!("Received {} bytes", n);
                if event_tx.send(LinkEvent::Data(buf[..n].to_vec())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Read error: {}", e);
                let _ = event_tx.send(LinkEvent::Error(e.to_string())).await;
                let _ = event_tx.send(LinkEvent::Closed).await;
                break;
            }
        }
    }
}

struct BluezLink {
    writer: OwnedWriteHalf,
    events: Option<mpsc::Receiver<LinkEvent>>,
}

#[async_trait]
impl SerialLink for BluezLink {
    fn take_events(&mut self) -> Option<mpsc::Receiver<LinkEvent>> {
        self.events.take()
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
