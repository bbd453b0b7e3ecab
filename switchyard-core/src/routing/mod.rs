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

//! Message routing: address resolution, the routing table, multicast
//! receiver registry, and the delivery engine.

pub use address::{Address, TransportKind};
pub use address_manager::AddressManager;
pub use multicast_registry::MulticastReceiverRegistry;
pub use router::MessageRouter;
pub use routing_table::{RoutingEntry, RoutingTable};
pub use stubs::{InProcessStub, InProcessStubFactory, StubFactoryRegistry};

mod address;
mod address_manager;
mod multicast_registry;
mod router;
mod routing_table;
mod stubs;
