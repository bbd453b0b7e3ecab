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

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::trace;

use crate::message::{ImmutableMessage, RoutingError};
use crate::routing::{Address, TransportKind};
use crate::traits::{MessagingStubFactory, TransportStub};

/// Registry of stub factories, keyed by the transport an address belongs to.
///
/// This is the Messaging Stub Factory boundary: wire transports register a
/// factory per address variant, and the router asks here for a sender.
#[derive(Default)]
pub struct StubFactoryRegistry {
    factories: DashMap<TransportKind, Arc<dyn MessagingStubFactory>>,
}

impl StubFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, kind: TransportKind, factory: Arc<dyn MessagingStubFactory>) {
        self.factories.insert(kind, factory);
    }

    pub fn create(&self, address: &Address) -> Option<Arc<dyn TransportStub>> {
        self.factories
            .get(&address.transport_kind())
            .and_then(|factory| factory.create(address))
    }
}

/// In-memory transport: delivers messages over a bounded channel to another
/// component in the same process.
///
/// A full channel is a transient condition (`TransportRetryable`); a closed
/// channel means the receiver is gone (`TransportPermanent`).
#[derive(Debug)]
pub struct InProcessStub {
    channel_id: String,
    tx: mpsc::Sender<Arc<ImmutableMessage>>,
}

#[async_trait]
impl TransportStub for InProcessStub {
    async fn send(&self, message: Arc<ImmutableMessage>) -> Result<(), RoutingError> {
        use mpsc::error::TrySendError;
        match self.tx.try_send(message) {
            Ok(()) => {
                trace!(channel_id = %self.channel_id, "in-process send ok");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(RoutingError::TransportRetryable(format!(
                "in-process channel {} full",
                self.channel_id
            ))),
            Err(TrySendError::Closed(_)) => Err(RoutingError::TransportPermanent(format!(
                "in-process channel {} closed",
                self.channel_id
            ))),
        }
    }
}

/// Factory for [`InProcessStub`]s; owns the channel registry for every bound
/// in-process endpoint.
#[derive(Debug, Default)]
pub struct InProcessStubFactory {
    channels: DashMap<String, mpsc::Sender<Arc<ImmutableMessage>>>,
}

impl InProcessStubFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a channel id and returns the receiving half; messages sent to
    /// `Address::InProcess { channel_id }` arrive there.
    pub fn bind(
        &self,
        channel_id: impl Into<String>,
        capacity: usize,
    ) -> mpsc::Receiver<Arc<ImmutableMessage>> {
        let (tx, rx) = mpsc::channel(capacity);
        self.channels.insert(channel_id.into(), tx);
        rx
    }

    pub fn unbind(&self, channel_id: &str) {
        self.channels.remove(channel_id);
    }
}

impl MessagingStubFactory for InProcessStubFactory {
    fn create(&self, address: &Address) -> Option<Arc<dyn TransportStub>> {
        let Address::InProcess { channel_id } = address else {
            return None;
        };
        self.channels.get(channel_id).map(|tx| {
            Arc::new(InProcessStub {
                channel_id: channel_id.clone(),
                tx: tx.value().clone(),
            }) as Arc<dyn TransportStub>
        })
    }
}
