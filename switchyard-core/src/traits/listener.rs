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

use crate::message::{ImmutableMessage, RoutingError};

/// Receives messages the router delivers locally.
///
/// The request/reply manager registers itself as the router's default
/// listener; multicast subscribers register per participant id.
#[async_trait]
pub trait MessageListener: Send + Sync {
    async fn on_message_arrived(&self, message: Arc<ImmutableMessage>);

    /// A transport reported an error for an inbound message.
    fn on_error(&self, message: Arc<ImmutableMessage>, cause: RoutingError);
}
