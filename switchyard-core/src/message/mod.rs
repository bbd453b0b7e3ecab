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

//! Message envelope and payload types.
//!
//! An [`ImmutableMessage`] is created once at the sending boundary and read by
//! every routing stage afterwards; the payload is opaque bytes to the router
//! and only the request/reply manager interprets it.

pub use delayable::DelayableMessage;
pub use error::RoutingError;
pub use immutable_message::{
    ExpiryDate, ImmutableMessage, MessageBuilder, MessageKind, REPLY_TO_HEADER,
};
pub use request::{ContentWithExpiry, OneWayRequest, Reply, Request};

mod delayable;
mod error;
pub(crate) mod immutable_message;
mod request;
