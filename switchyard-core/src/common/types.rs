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

//! Defines common internal type aliases used within `switchyard-core`.

use std::sync::Arc;

use crate::message::{ImmutableMessage, RoutingError};

/// Caller-supplied callback invoked for every terminal routing failure:
/// retry exhaustion, permanent transport rejection, or expiry while queued.
///
/// The router reports each failure exactly once and never panics or errors
/// across the dispatch-worker boundary.
pub type RouteFailureHandler = Arc<dyn Fn(Arc<ImmutableMessage>, RoutingError) + Send + Sync>;
