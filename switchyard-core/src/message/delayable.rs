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

use derive_new::new;

use crate::message::ImmutableMessage;
use crate::routing::Address;

/// A message inside the router's pending queue: the immutable envelope, the
/// resolved destination address, and the retry counter.
///
/// The not-before ordering lives in the router's delay queue deadline rather
/// than a stored field; a `DelayableMessage` is consumed once dispatch
/// succeeds, permanently fails, or the message's own TTL elapses.
#[derive(new, Debug, Clone)]
pub struct DelayableMessage {
    pub message: Arc<ImmutableMessage>,
    pub address: Address,
    pub retries: u32,
}
