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

use std::fmt::Debug;

use async_trait::async_trait;

use crate::common::{MulticastId, ParticipantId};
use crate::message::RoutingError;
use crate::routing::Address;

/// Control-plane proxy to the enclosing process's router.
///
/// Child and library routers defer unresolved destinations to their parent
/// and mirror next-hop and multicast-receiver registrations to it so the
/// parent maintains a superset view. These are synchronous remote calls and
/// must never be made while holding a lock that dispatch workers also need.
#[async_trait]
pub trait ParentRouterProxy: Send + Sync + Debug {
    /// Asks the parent whether it knows a route for the participant.
    async fn resolve_next_hop(&self, participant_id: &ParticipantId)
        -> Result<bool, RoutingError>;

    async fn add_next_hop(
        &self,
        participant_id: &ParticipantId,
        address: &Address,
        is_globally_visible: bool,
    ) -> Result<(), RoutingError>;

    async fn add_multicast_receiver(
        &self,
        multicast_id: &MulticastId,
        subscriber: &ParticipantId,
        provider: &ParticipantId,
    ) -> Result<(), RoutingError>;

    async fn remove_multicast_receiver(
        &self,
        multicast_id: &MulticastId,
        subscriber: &ParticipantId,
        provider: &ParticipantId,
    ) -> Result<(), RoutingError>;

    /// The address remote peers should send replies to when requests are
    /// forwarded through this parent.
    fn reply_to_address(&self) -> Address;

    /// The parent's own transport address; cached by the child for every
    /// destination the parent resolves.
    fn address(&self) -> Address;
}
