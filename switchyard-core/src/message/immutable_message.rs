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

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use static_assertions::assert_impl_all;
use uuid::Uuid;

use crate::common::{MulticastId, ParticipantId};
use crate::message::RoutingError;

/// Header key carrying the serialized address replies should be sent to.
pub const REPLY_TO_HEADER: &str = "reply-to";

/// The kind of a message, deciding which routing stage interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A request expecting a correlated reply.
    Request,
    /// A fire-and-forget invocation; no reply expected.
    OneWay,
    /// A reply correlated to an earlier request.
    Reply,
    /// A publication fanned out to multicast subscribers.
    Multicast,
    /// Ends a multicast subscription; routed like a one-way.
    SubscriptionStop,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageKind::Request => "request",
            MessageKind::OneWay => "one-way",
            MessageKind::Reply => "reply",
            MessageKind::Multicast => "multicast",
            MessageKind::SubscriptionStop => "subscription-stop",
        };
        f.write_str(s)
    }
}

/// Absolute point in time (milliseconds since the Unix epoch) after which a
/// message or queued request must no longer be delivered.
///
/// `ExpiryDate::never()` (internally zero) never expires; this mirrors the
/// routing-table convention where an absent expiry means "no expiry".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExpiryDate(u64);

impl ExpiryDate {
    /// An expiry date that never elapses.
    pub const fn never() -> Self {
        ExpiryDate(0)
    }

    /// Absolute expiry in milliseconds since the Unix epoch.
    pub const fn from_absolute_millis(millis: u64) -> Self {
        ExpiryDate(millis)
    }

    /// Expiry relative to the current wall clock.
    pub fn from_relative_ttl(ttl: Duration) -> Self {
        ExpiryDate(now_millis().saturating_add(ttl.as_millis() as u64))
    }

    pub const fn millis(self) -> u64 {
        self.0
    }

    pub fn is_expired(self) -> bool {
        self.0 != 0 && now_millis() >= self.0
    }

    /// Time remaining until expiry. `None` for a never-expiring date,
    /// `Some(Duration::ZERO)` once elapsed.
    pub fn relative_from_now(self) -> Option<Duration> {
        if self.0 == 0 {
            return None;
        }
        Some(Duration::from_millis(self.0.saturating_sub(now_millis())))
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// An immutable message envelope.
///
/// Created once at the sending boundary via [`MessageBuilder`] and never
/// mutated afterwards; every routing stage only reads it. The payload is
/// opaque bytes; the core does not define any wire framing.
#[derive(Debug, Clone)]
pub struct ImmutableMessage {
    id: Uuid,
    sender: ParticipantId,
    recipient: ParticipantId,
    kind: MessageKind,
    expiry: ExpiryDate,
    headers: HashMap<String, String>,
    payload: Vec<u8>,
    /// Derived at build time: false for messages received from a remote
    /// transport, true for locally originated ones.
    is_local: bool,
}

impl ImmutableMessage {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sender(&self) -> &ParticipantId {
        &self.sender
    }

    pub fn recipient(&self) -> &ParticipantId {
        &self.recipient
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn expiry(&self) -> ExpiryDate {
        self.expiry
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn is_expired(&self) -> bool {
        self.expiry.is_expired()
    }

    /// The multicast id encoded in the recipient, for multicast messages.
    pub fn multicast_id(&self) -> Option<MulticastId> {
        if self.kind != MessageKind::Multicast {
            return None;
        }
        self.recipient
            .as_str()
            .strip_prefix("multicast/")
            .map(MulticastId::new)
    }
}

impl fmt::Display for ImmutableMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} from {} to {}",
            self.kind, self.id, self.sender, self.recipient
        )
    }
}

/// Builder for [`ImmutableMessage`].
///
/// Sender and recipient are required; everything else has a sensible default
/// (no expiry, empty payload, locally originated).
#[derive(Debug, Default)]
pub struct MessageBuilder {
    kind: Option<MessageKind>,
    sender: Option<ParticipantId>,
    recipient: Option<ParticipantId>,
    expiry: Option<ExpiryDate>,
    headers: HashMap<String, String>,
    payload: Vec<u8>,
    is_local: bool,
}

impl MessageBuilder {
    pub fn new(kind: MessageKind) -> Self {
        MessageBuilder {
            kind: Some(kind),
            is_local: true,
            ..Default::default()
        }
    }

    pub fn request() -> Self {
        Self::new(MessageKind::Request)
    }

    pub fn one_way() -> Self {
        Self::new(MessageKind::OneWay)
    }

    pub fn reply() -> Self {
        Self::new(MessageKind::Reply)
    }

    pub fn subscription_stop() -> Self {
        Self::new(MessageKind::SubscriptionStop)
    }

    /// A multicast publication addressed to the given multicast group.
    pub fn multicast(multicast_id: &MulticastId) -> Self {
        Self::new(MessageKind::Multicast).recipient(multicast_id.as_recipient())
    }

    pub fn sender(mut self, sender: ParticipantId) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn recipient(mut self, recipient: ParticipantId) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn expiry(mut self, expiry: ExpiryDate) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Expiry relative to now.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.expiry = Some(ExpiryDate::from_relative_ttl(ttl));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Marks the message as received from a remote transport rather than
    /// originated locally.
    pub fn received_from_global(mut self) -> Self {
        self.is_local = false;
        self
    }

    pub fn build(self) -> Result<ImmutableMessage, RoutingError> {
        let kind = self
            .kind
            .ok_or_else(|| RoutingError::MessageNotBuildable("missing message kind".into()))?;
        let sender = self
            .sender
            .ok_or_else(|| RoutingError::MessageNotBuildable("missing sender".into()))?;
        let recipient = self
            .recipient
            .ok_or_else(|| RoutingError::MessageNotBuildable("missing recipient".into()))?;
        Ok(ImmutableMessage {
            id: Uuid::new_v4(),
            sender,
            recipient,
            kind,
            expiry: self.expiry.unwrap_or_else(ExpiryDate::never),
            headers: self.headers,
            payload: self.payload,
            is_local: self.is_local,
        })
    }
}

// Ensures the envelope can cross task boundaries.
assert_impl_all!(ImmutableMessage: Send, Sync);
