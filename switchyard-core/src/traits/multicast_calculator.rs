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

use crate::message::ImmutableMessage;
use crate::routing::Address;

/// Pluggable, transport-specific calculator contributing addresses to a
/// multicast fan-out.
///
/// A calculator that creates globally routable addresses is skipped for
/// publications received from a remote transport, so global multicasts are
/// not reflected back outward.
pub trait MulticastAddressCalculator: Send + Sync {
    fn creates_globally_routable_addresses(&self) -> bool;

    fn calculate(&self, message: &ImmutableMessage) -> Vec<Address>;
}
