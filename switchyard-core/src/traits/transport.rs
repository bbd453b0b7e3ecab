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
use std::sync::Arc;

use async_trait::async_trait;

use crate::message::{ImmutableMessage, RoutingError};
use crate::routing::Address;

/// A transport-specific sender for one resolved address.
///
/// Implementations classify their failures: a
/// [`RoutingError::TransportRetryable`] drives the router's backoff, anything
/// else drops the message and reports it.
#[async_trait]
pub trait TransportStub: Send + Sync + Debug {
    async fn send(&self, message: Arc<ImmutableMessage>) -> Result<(), RoutingError>;
}

/// Produces transport stubs for the address variant it handles.
///
/// Returning `None` means this factory cannot reach the address (unknown
/// channel, unbound endpoint); the router treats that as a permanent failure.
pub trait MessagingStubFactory: Send + Sync {
    fn create(&self, address: &Address) -> Option<Arc<dyn TransportStub>>;
}
