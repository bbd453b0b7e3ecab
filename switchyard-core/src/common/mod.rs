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

//! Common utilities and structures used throughout the Switchyard core.

pub use config::{LimitsConfig, RoutingConfig, SwitchyardConfig, TimeoutConfig};
pub use ids::{MulticastId, ParticipantId};
pub use runtime::{SwitchyardApp, SwitchyardRuntime};
pub use types::RouteFailureHandler;

mod config;
mod ids;
mod runtime;
mod types;
