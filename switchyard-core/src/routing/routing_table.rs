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

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::common::ParticipantId;
use crate::message::immutable_message::now_millis;
use crate::routing::Address;

/// One routing-table entry: the transport address for a participant plus the
/// metadata governing visibility, expiry, and overwrite rules.
#[derive(Debug, Clone)]
pub struct RoutingEntry {
    pub address: Address,
    pub is_globally_visible: bool,
    /// `None` means no expiry.
    pub expiry_date_ms: Option<u64>,
    /// Sticky entries are never evicted by the sweep and never overwritten
    /// unless the `put` explicitly allows updates.
    pub is_sticky: bool,
}

/// Authoritative mapping from participant id to transport address.
///
/// At most one entry exists per participant id. A `put` against an existing
/// entry without `allow_update` is rejected with the prior value preserved,
/// which guards against races between concurrently discovered routes. All
/// operations are safe under concurrent access from delivery tasks and the
/// cleanup sweep.
#[derive(Debug, Default)]
pub struct RoutingTable {
    entries: DashMap<ParticipantId, RoutingEntry>,
    grace_period_ms: u64,
}

impl RoutingTable {
    pub fn new(grace_period_ms: u64) -> Self {
        RoutingTable {
            entries: DashMap::new(),
            grace_period_ms,
        }
    }

    /// Inserts or replaces the route for a participant.
    ///
    /// Returns `true` if the entry was applied, `false` if an existing entry
    /// without `allow_update` blocked it.
    #[allow(clippy::fn_params_excessive_bools)]
    pub fn put(
        &self,
        participant_id: ParticipantId,
        address: Address,
        is_globally_visible: bool,
        expiry_date_ms: Option<u64>,
        is_sticky: bool,
        allow_update: bool,
    ) -> bool {
        let entry = RoutingEntry {
            address,
            is_globally_visible,
            expiry_date_ms,
            is_sticky,
        };
        match self.entries.entry(participant_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if !allow_update {
                    debug!(
                        participant_id = %participant_id,
                        sticky = occupied.get().is_sticky,
                        "rejecting route overwrite without allow_update"
                    );
                    return false;
                }
                occupied.insert(entry);
                true
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(entry);
                true
            }
        }
    }

    pub fn get(&self, participant_id: &ParticipantId) -> Option<RoutingEntry> {
        self.entries.get(participant_id).map(|e| e.value().clone())
    }

    pub fn lookup_address(&self, participant_id: &ParticipantId) -> Option<Address> {
        self.entries
            .get(participant_id)
            .map(|e| e.value().address.clone())
    }

    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.entries.contains_key(participant_id)
    }

    pub fn remove(&self, participant_id: &ParticipantId) -> Option<RoutingEntry> {
        self.entries.remove(participant_id).map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Purges non-sticky entries whose expiry plus the grace period has
    /// passed. Returns the number of purged entries.
    pub fn purge_expired(&self) -> usize {
        let now = now_millis();
        let grace = self.grace_period_ms;
        let before = self.entries.len();
        self.entries.retain(|participant_id, entry| {
            let keep = entry.is_sticky
                || entry
                    .expiry_date_ms
                    .map_or(true, |expiry| expiry.saturating_add(grace) > now);
            if !keep {
                trace!(participant_id = %participant_id, "purging expired routing entry");
            }
            keep
        });
        before - self.entries.len()
    }
}
