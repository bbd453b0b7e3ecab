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

use dashmap::DashMap;
use tracing::trace;

use crate::common::{MulticastId, ParticipantId};

/// One multicast subscription: who subscribed, and through which provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReceiverEntry {
    subscriber: ParticipantId,
    provider: ParticipantId,
}

/// Mapping from multicast identifier to subscriber set.
///
/// Membership is a set: duplicate registration is idempotent, and removing a
/// non-existent entry is a no-op rather than an error.
#[derive(Debug, Default)]
pub struct MulticastReceiverRegistry {
    receivers: DashMap<MulticastId, HashSet<ReceiverEntry>>,
}

impl MulticastReceiverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_receiver(
        &self,
        multicast_id: &MulticastId,
        subscriber: &ParticipantId,
        provider: &ParticipantId,
    ) {
        let inserted = self
            .receivers
            .entry(multicast_id.clone())
            .or_default()
            .insert(ReceiverEntry {
                subscriber: subscriber.clone(),
                provider: provider.clone(),
            });
        trace!(
            multicast_id = %multicast_id,
            subscriber = %subscriber,
            inserted,
            "multicast receiver added"
        );
    }

    pub fn remove_receiver(
        &self,
        multicast_id: &MulticastId,
        subscriber: &ParticipantId,
        provider: &ParticipantId,
    ) {
        if let Some(mut entry) = self.receivers.get_mut(multicast_id) {
            entry.remove(&ReceiverEntry {
                subscriber: subscriber.clone(),
                provider: provider.clone(),
            });
        }
        self.receivers
            .remove_if(multicast_id, |_, set| set.is_empty());
    }

    /// The subscriber participant ids currently registered for a multicast.
    pub fn receivers(&self, multicast_id: &MulticastId) -> HashSet<ParticipantId> {
        self.receivers
            .get(multicast_id)
            .map(|entry| {
                entry
                    .iter()
                    .map(|receiver| receiver.subscriber.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
