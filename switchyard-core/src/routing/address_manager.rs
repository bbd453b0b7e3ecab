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

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::message::{ImmutableMessage, MessageKind};
use crate::routing::{Address, MulticastReceiverRegistry, RoutingTable};
use crate::traits::MulticastAddressCalculator;

/// Resolves a message to its set of candidate transport addresses.
///
/// Unicast messages resolve through the routing table; multicast messages
/// fan out through the registered calculators plus the receiver registry.
/// The result is a set, so duplicate addresses collapse to one send.
pub struct AddressManager {
    routing_table: Arc<RoutingTable>,
    multicast_registry: Arc<MulticastReceiverRegistry>,
    calculators: RwLock<Vec<Arc<dyn MulticastAddressCalculator>>>,
}

impl AddressManager {
    pub fn new(
        routing_table: Arc<RoutingTable>,
        multicast_registry: Arc<MulticastReceiverRegistry>,
    ) -> Self {
        AddressManager {
            routing_table,
            multicast_registry,
            calculators: RwLock::new(Vec::new()),
        }
    }

    pub fn register_calculator(&self, calculator: Arc<dyn MulticastAddressCalculator>) {
        self.calculators.write().push(calculator);
    }

    /// The candidate addresses for a message; empty if no route is known
    /// (the router then decides the fallback).
    pub fn get_addresses(&self, message: &ImmutableMessage) -> HashSet<Address> {
        if message.kind() == MessageKind::Multicast {
            self.multicast_addresses(message)
        } else {
            self.routing_table
                .lookup_address(message.recipient())
                .into_iter()
                .collect()
        }
    }

    fn multicast_addresses(&self, message: &ImmutableMessage) -> HashSet<Address> {
        let mut addresses = HashSet::new();

        // Publications received from a remote transport are delivered locally
        // only; globally routable calculators would reflect them back out.
        let calculators = self.calculators.read().clone();
        for calculator in calculators {
            if !message.is_local() && calculator.creates_globally_routable_addresses() {
                continue;
            }
            addresses.extend(calculator.calculate(message));
        }

        if let Some(multicast_id) = message.multicast_id() {
            for subscriber in self.multicast_registry.receivers(&multicast_id) {
                if let Some(address) = self.routing_table.lookup_address(&subscriber) {
                    addresses.insert(address);
                } else {
                    trace!(
                        subscriber = %subscriber,
                        multicast_id = %multicast_id,
                        "multicast subscriber has no route, skipping"
                    );
                }
            }
        }
        addresses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MulticastId;
    use crate::message::MessageBuilder;

    struct FixedCalculator {
        addresses: Vec<Address>,
        global: bool,
    }

    impl MulticastAddressCalculator for FixedCalculator {
        fn creates_globally_routable_addresses(&self) -> bool {
            self.global
        }

        fn calculate(&self, _message: &ImmutableMessage) -> Vec<Address> {
            self.addresses.clone()
        }
    }

    fn mqtt(topic: &str) -> Address {
        Address::Mqtt {
            broker_uri: "tcp://broker:1883".into(),
            topic: topic.into(),
        }
    }

    fn manager() -> AddressManager {
        AddressManager::new(
            Arc::new(RoutingTable::new(0)),
            Arc::new(MulticastReceiverRegistry::new()),
        )
    }

    #[test]
    fn calculators_producing_the_same_address_dedupe() {
        let manager = manager();
        manager.register_calculator(Arc::new(FixedCalculator {
            addresses: vec![mqtt("shared")],
            global: true,
        }));
        manager.register_calculator(Arc::new(FixedCalculator {
            addresses: vec![mqtt("shared")],
            global: true,
        }));

        let message = MessageBuilder::multicast(&MulticastId::from("m1"))
            .sender("pub".into())
            .build()
            .unwrap();
        assert_eq!(manager.get_addresses(&message).len(), 1);
    }

    #[test]
    fn remote_publication_skips_global_calculators() {
        let manager = manager();
        manager.register_calculator(Arc::new(FixedCalculator {
            addresses: vec![mqtt("out")],
            global: true,
        }));
        manager.register_calculator(Arc::new(FixedCalculator {
            addresses: vec![Address::InProcess {
                channel_id: "local".into(),
            }],
            global: false,
        }));

        let message = MessageBuilder::multicast(&MulticastId::from("m1"))
            .sender("pub".into())
            .received_from_global()
            .build()
            .unwrap();
        let addresses = manager.get_addresses(&message);
        assert_eq!(addresses.len(), 1);
        assert!(addresses.contains(&Address::InProcess {
            channel_id: "local".into(),
        }));
    }
}
