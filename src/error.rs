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

//! Adaptor error taxonomy.

use thiserror::Error;

use crate::state::ConnectionState;

/// Errors surfaced by [`crate::SerialAdaptor`] operations.
#[derive(Debug, Error)]
pub enum AdaptorError {
    /// Channel resolution for the target address failed.
    #[error("channel discovery failed for {address}: {reason}")]
    Discovery { address: String, reason: String },

    /// The connect attempt on a resolved channel failed.
    #[error("connect to {address} on channel {channel} failed: {reason}")]
    Connect {
        address: String,
        channel: u8,
        reason: String,
    },

    /// The underlying link rejected a write.
    #[error("write failed: {reason}")]
    Write { reason: String },

    /// The underlying link failed to close cleanly.
    #[error("close failed: {reason}")]
    Close { reason: String },

    /// Operation attempted outside its valid lifecycle state.
    #[error("{operation} is not valid while the connection is {state}")]
    InvalidState {
        operation: &'static str,
        state: ConnectionState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_operation() {
        let err = AdaptorError::Discovery {
            address: "AA:BB:CC:DD:EE:FF".into(),
            reason: "no serial service".into(),
        };
        assert!(err.to_string().contains("AA:BB:CC:DD:EE:FF"));
        assert!(err.to_string().contains("no serial service"));

        let err = AdaptorError::InvalidState {
            operation: "write",
            state: ConnectionState::Idle,
        };
        assert_eq!(err.to_string(), "write is not valid while the connection is idle");
    }
}
