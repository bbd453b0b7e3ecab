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

//! Collaborator trait seams.
//!
//! The routing core consumes narrow interfaces from the excluded subsystems
//! (wire transports, discovery, the enclosing controller process); these
//! traits are that boundary.

pub use listener::MessageListener;
pub use multicast_calculator::MulticastAddressCalculator;
pub use parent_router::ParentRouterProxy;
pub use transport::{MessagingStubFactory, TransportStub};

mod listener;
mod multicast_calculator;
mod parent_router;
mod transport;
