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
use std::sync::Arc;

/// Stable logical identifier of an addressable endpoint (provider, proxy, or
/// internal service).
///
/// Participant ids are the keys of every routing directory, so they are kept
/// cheap to clone (`Arc<str>`) and hashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(Arc<str>);

impl ParticipantId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        ParticipantId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        ParticipantId::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        ParticipantId::new(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a multicast group: one-to-many delivery to dynamically
/// subscribed receivers.
///
/// On the wire a multicast recipient is encoded as a participant id of the
/// form `multicast/{id}`; see [`ImmutableMessage::multicast_id`].
///
/// [`ImmutableMessage::multicast_id`]: crate::message::ImmutableMessage::multicast_id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MulticastId(Arc<str>);

impl MulticastId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        MulticastId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wire form of the recipient participant id used for multicast messages.
    pub fn as_recipient(&self) -> ParticipantId {
        ParticipantId::new(format!("multicast/{}", self.0))
    }
}

impl From<&str> for MulticastId {
    fn from(id: &str) -> Self {
        MulticastId::new(id)
    }
}

impl fmt::Display for MulticastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
