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

use thiserror::Error;
use uuid::Uuid;

use crate::common::ParticipantId;
use crate::routing::Address;

/// Errors surfaced by the routing core.
///
/// Transport-level failures are classified as retryable or permanent;
/// retryable failures drive backoff inside the router and are never surfaced
/// directly, while every terminal failure is reported exactly once through
/// the caller-supplied failure callback. Synchronous calls surface a single
/// error type that disambiguates timeout, shutdown, and remote failure.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The message's TTL had already elapsed at submission, or elapsed while
    /// the message was queued. Never delivered, always reported.
    #[error("message {message_id} expired (expiry {expiry_ms} ms)")]
    MessageExpired { message_id: Uuid, expiry_ms: u64 },

    /// No route is known for the recipient and, for child/library routers,
    /// the parent router does not know it either.
    #[error("no route known for participant {0}")]
    UnresolvableDestination(ParticipantId),

    /// Transient transport failure (send buffer full, transport not yet
    /// ready). Drives retry with backoff up to the message's TTL.
    #[error("transient transport failure: {0}")]
    TransportRetryable(String),

    /// Permanent transport failure (malformed message, recipient explicitly
    /// rejected). Drives an immediate drop.
    #[error("permanent transport failure: {0}")]
    TransportPermanent(String),

    /// The stub factory registry has no transport for a resolved address.
    #[error("no messaging stub available for address {0}")]
    NoStubForAddress(Address),

    /// A synchronous call's TTL elapsed with no reply.
    #[error("request {request_reply_id} timed out after {timeout_ms} ms")]
    RequestTimeout {
        request_reply_id: String,
        timeout_ms: u64,
    },

    /// The operation was rejected or interrupted because the router or
    /// request/reply manager is shutting down.
    #[error("router is shut down")]
    Shutdown,

    /// A provider invocation failed; carries the original cause.
    #[error("provider invocation failed: {0}")]
    Invocation(#[source] anyhow::Error),

    /// A message could not be built or its payload could not be encoded.
    #[error("message not buildable: {0}")]
    MessageNotBuildable(String),
}

impl RoutingError {
    /// True for failures the router resolves locally through retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RoutingError::TransportRetryable(_))
    }
}

impl From<serde_json::Error> for RoutingError {
    fn from(err: serde_json::Error) -> Self {
        RoutingError::MessageNotBuildable(err.to_string())
    }
}

/// A closed delivery channel means the receiving side is gone for good.
impl<T> From<tokio::sync::mpsc::error::SendError<T>> for RoutingError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        RoutingError::TransportPermanent("channel closed".into())
    }
}
