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
//! Switchyard
//!
//! Peer-to-peer RPC and publish/subscribe middleware routing core. This
//! crate is the public face of the engine implemented in `switchyard-core`:
//! launch a [`SwitchyardRuntime`] through [`SwitchyardApp`], register
//! providers and listeners, and route messages between participants across
//! in-process and wire transports.
//!
//! ```ignore
//! use switchyard::prelude::*;
//!
//! let runtime = SwitchyardApp::launch();
//! ```

pub use switchyard_core::prelude::*;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use switchyard_core::prelude::*;
}
