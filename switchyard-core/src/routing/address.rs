/*
 * Copyright (c) 2026. Switchyard contributors
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

/// A transport address, one variant per transport.
///
/// Fan-out sets are `HashSet<Address>`, so equality and hashing define
/// deduplication. The single exhaustive match in [`transport_kind`] replaces
/// per-transport downcasting at every dispatch and mirroring site.
///
/// [`transport_kind`]: Address::transport_kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    /// Another component in the same process, reachable over a channel.
    InProcess { channel_id: String },
    /// An MQTT broker topic.
    Mqtt { broker_uri: String, topic: String },
    /// An HTTP long-polling channel.
    Http {
        endpoint_url: String,
        channel_id: String,
    },
    /// A WebSocket endpoint.
    WebSocket {
        host: String,
        port: u16,
        path: String,
    },
}

/// Discriminant used to pick a stub factory for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    InProcess,
    Mqtt,
    Http,
    WebSocket,
}

impl Address {
    pub fn transport_kind(&self) -> TransportKind {
        match self {
            Address::InProcess { .. } => TransportKind::InProcess,
            Address::Mqtt { .. } => TransportKind::Mqtt,
            Address::Http { .. } => TransportKind::Http,
            Address::WebSocket { .. } => TransportKind::WebSocket,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::InProcess { channel_id } => write!(f, "inprocess:{channel_id}"),
            Address::Mqtt { broker_uri, topic } => write!(f, "mqtt:{broker_uri}/{topic}"),
            Address::Http {
                endpoint_url,
                channel_id,
            } => write!(f, "http:{endpoint_url}#{channel_id}"),
            Address::WebSocket { host, port, path } => write!(f, "ws:{host}:{port}{path}"),
        }
    }
}
