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

#![forbid(unsafe_code)]
//! Switchyard Core Library
//!
//! This library provides the routing and request/reply correlation engine for
//! the Switchyard middleware: routing tables, multicast fan-out, the message
//! router with retry scheduling, and the TTL-bounded request/reply manager.

/// Common utilities: configuration, identifiers, and the runtime wiring.
pub(crate) mod common;

pub(crate) mod message;
pub(crate) mod routing;
pub(crate) mod rpc;
/// Collaborator trait seams consumed by the routing core.
pub(crate) mod traits;

/// Prelude module for convenient imports.
///
/// Re-exports the public surface of the routing core: the runtime,
/// configuration, message types, routing directories, and collaborator traits.
pub mod prelude {
    pub use async_trait::async_trait;

    pub use crate::common::{
        LimitsConfig, MulticastId, ParticipantId, RouteFailureHandler, RoutingConfig,
        SwitchyardApp, SwitchyardConfig, SwitchyardRuntime, TimeoutConfig,
    };
    pub use crate::message::{
        ContentWithExpiry, DelayableMessage, ExpiryDate, ImmutableMessage, MessageBuilder,
        MessageKind, OneWayRequest, Reply, Request, RoutingError, REPLY_TO_HEADER,
    };
    pub use crate::routing::{
        Address, AddressManager, InProcessStub, InProcessStubFactory, MessageRouter,
        MulticastReceiverRegistry, RoutingEntry, RoutingTable, StubFactoryRegistry, TransportKind,
    };
    pub use crate::rpc::{
        Directory, DirectoryListener, DispatchTable, Invocable, ProviderContainer, ReplyCaller,
        RequestReplyManager,
    };
    pub use crate::traits::{
        MessageListener, MessagingStubFactory, MulticastAddressCalculator, ParentRouterProxy,
        TransportStub,
    };
}
