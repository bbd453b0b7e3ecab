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

//! Request/reply correlation: reply-caller and provider directories, the
//! invocation seam, and the TTL-bounded request/reply manager.

pub use directory::{Directory, DirectoryListener, ProviderContainer, ReplyCaller};
pub use invocable::{DispatchTable, Invocable};
pub use request_reply_manager::RequestReplyManager;

mod directory;
mod invocable;
mod request_reply_manager;
